use ratatui::layout::Rect;
use symptom_chat_core::{AssistantReply, ChatClient, ChatId, ClientError, Composer, MessageView};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Composer state
    pub composer: Composer,
    pub cursor: usize, // char index into the composer input

    // Transcript viewport
    pub scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Transport
    pub client: ChatClient,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        chat_id: ChatId,
        display_name: Option<String>,
        client: ChatClient,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            composer: Composer::new(chat_id, display_name),
            cursor: 0,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,
            animation_frame: 0,
            client,
            events,
        }
    }

    /// Fetch stored messages once at startup. Failures only cost the history.
    pub async fn load_history(&mut self) {
        let chat_id = self.composer.chat_id().clone();
        match self.client.get_chat(&chat_id).await {
            Ok(history) => {
                self.composer.load_history(&history);
                self.scroll_to_bottom();
            }
            Err(e) => warn!(error = %e, %chat_id, "could not load chat history"),
        }
    }

    /// Start a send if the composer accepts the input.
    ///
    /// The request runs on its own task and reports back with
    /// [`AppEvent::Reply`], so the UI keeps drawing while it is in flight.
    pub fn submit(&mut self) -> bool {
        let Some(pending) = self.composer.begin_send() else {
            return false;
        };

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let task = tokio::spawn(async move {
                client.send_message(&pending.chat_id, &pending.text).await
            });
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(ClientError::Interrupted(e.to_string())),
            };
            if events.send(AppEvent::Reply(result)).is_err() {
                info!("event loop closed before reply arrived");
            }
        });

        self.animation_frame = 0;
        self.scroll_to_bottom();
        true
    }

    pub fn receive_reply(&mut self, result: Result<AssistantReply, ClientError>) {
        self.composer.finish_send(result);
        self.clamp_cursor();
        self.scroll_to_bottom();
    }

    /// Keep the cursor inside the input after it is cleared by a reply.
    pub fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.composer.input().chars().count());
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.composer.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self) {
        let max = self.total_lines().saturating_sub(self.visible_height());
        self.scroll = (self.scroll + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    /// Scroll transcript to bottom so the newest entry is visible
    pub fn scroll_to_bottom(&mut self) {
        let total_lines = self.total_lines();
        let visible_height = self.visible_height();

        if total_lines > visible_height {
            self.scroll = total_lines.saturating_sub(visible_height);
        }
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    /// Estimated rendered height of the transcript, including wrapping.
    fn total_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for view in self.composer.views() {
            let lines = view.plain_text();
            if lines.is_empty() {
                total_lines = total_lines.saturating_add(1); // Empty text still takes one line
            }
            for line in lines {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add(char_count.max(1).div_ceil(wrap_width) as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after entry
        }

        if self.composer.is_sending() {
            total_lines = total_lines.saturating_add(1); // "Thinking..."
        }

        total_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symptom_chat_core::{ChatRole, PlainReply};
    use tokio::sync::mpsc;

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = ChatClient::new("http://127.0.0.1:1").unwrap();
        (App::new(ChatId::new("4"), Some("Sam".to_string()), client, tx), rx)
    }

    #[tokio::test]
    async fn test_submit_echoes_and_reports_back() {
        let (mut app, mut rx) = test_app();
        app.composer.set_input("hello");
        app.cursor = 5;

        assert!(app.submit());
        assert!(app.composer.is_sending());
        assert_eq!(
            app.composer.views(),
            &[MessageView::text(ChatRole::User, "user: hello")]
        );

        // nothing listens on port 1, so the task reports a transport error
        let Some(AppEvent::Reply(result)) = rx.recv().await else {
            panic!("expected a reply event");
        };
        assert!(result.is_err());

        app.receive_reply(result);
        assert!(!app.composer.is_sending());
        let Some(MessageView::Text { text, .. }) = app.composer.transcript().last() else {
            panic!("expected a text line");
        };
        assert!(text.starts_with("Assistant error: "));
    }

    #[tokio::test]
    async fn test_submit_ignores_blank_input() {
        let (mut app, _rx) = test_app();
        app.composer.set_input("   ");
        assert!(!app.submit());
        assert!(app.composer.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_scroll_follows_new_entries() {
        let (mut app, _rx) = test_app();
        app.chat_height = 3;
        app.chat_width = 40;

        for i in 0..5 {
            app.composer.set_input(format!("message {}", i));
            app.composer.begin_send();
            app.receive_reply(Ok(AssistantReply::Plain(PlainReply {
                assistant_text: Some("ok".to_string()),
                error_text: None,
            })));
        }

        // 10 entries, one line plus a separator each
        assert_eq!(app.scroll, 17);
        app.scroll_down();
        assert_eq!(app.scroll, 17);
        app.scroll_to_top();
        app.scroll_up();
        assert_eq!(app.scroll, 0);
    }

    #[tokio::test]
    async fn test_line_filling_the_width_takes_one_row() {
        let (mut app, _rx) = test_app();
        app.chat_height = 2;
        app.chat_width = 11;

        // "user: hello" is exactly 11 chars: one row plus the separator
        app.composer.set_input("hello");
        app.composer.begin_send();
        assert_eq!(app.total_lines(), 3);

        app.receive_reply(Ok(AssistantReply::Plain(PlainReply {
            assistant_text: Some("ok".to_string()),
            error_text: None,
        })));
        // 4 rows in a 2-row viewport
        assert_eq!(app.scroll, 2);
    }
}
