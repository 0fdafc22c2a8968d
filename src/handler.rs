use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => app.scroll_to_bottom(),
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply(result) => app.receive_reply(result),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Back to the composer
        KeyCode::Char('i') | KeyCode::Enter | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
        }

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..(app.chat_height / 2).max(1) {
                app.scroll_down();
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..(app.chat_height / 2).max(1) {
                app.scroll_up();
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            // The send gate and blank input are both checked by the composer
            app.submit();
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let cursor = app.cursor;
                app.composer.edit_input(|input| {
                    let byte_pos = char_to_byte_index(input, cursor);
                    input.remove(byte_pos);
                });
            }
        }
        KeyCode::Delete => {
            let cursor = app.cursor;
            if cursor < app.composer.input().chars().count() {
                app.composer.edit_input(|input| {
                    let byte_pos = char_to_byte_index(input, cursor);
                    input.remove(byte_pos);
                });
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.composer.input().chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.composer.input().chars().count();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.composer.set_input(String::new());
            app.cursor = 0;
        }
        KeyCode::Char(c) => {
            let cursor = app.cursor;
            app.composer.edit_input(|input| {
                let byte_pos = char_to_byte_index(input, cursor);
                input.insert(byte_pos, c);
            });
            app.cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            for _ in 0..3 {
                app.scroll_down();
            }
        }
        MouseEventKind::ScrollUp => {
            for _ in 0..3 {
                app.scroll_up();
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symptom_chat_core::{ChatClient, ChatId};
    use tokio::sync::mpsc;

    fn test_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let client = ChatClient::new("http://127.0.0.1:1").unwrap();
        App::new(ChatId::new("1"), None, client, tx)
    }

    fn press(app: &mut App, code: KeyCode) {
        let key = KeyEvent::new(code, KeyModifiers::NONE);
        handle_event(app, AppEvent::Key(key)).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        assert_eq!(char_to_byte_index("día", 2), 3);
        assert_eq!(char_to_byte_index("día", 10), 4);
    }

    #[test]
    fn test_typing_edits_composer_at_cursor() {
        let mut app = test_app();
        type_text(&mut app, "cogh");
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Char('u'));

        assert_eq!(app.composer.input(), "cough");
        assert_eq!(app.cursor, 3);
        assert!(app.composer.is_typing());
    }

    #[test]
    fn test_clearing_input_drops_typing_indicator() {
        let mut app = test_app();
        type_text(&mut app, "ab");
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);

        assert_eq!(app.composer.input(), "");
        assert_eq!(app.cursor, 0);
        assert!(!app.composer.is_typing());
    }

    #[test]
    fn test_enter_on_blank_input_does_nothing() {
        let mut app = test_app();
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);

        assert!(app.composer.transcript().is_empty());
        assert!(!app.composer.is_sending());
    }

    #[tokio::test]
    async fn test_enter_sends_and_closes_gate() {
        let mut app = test_app();
        type_text(&mut app, "headache");
        press(&mut app, KeyCode::Enter);

        assert!(app.composer.is_sending());
        assert_eq!(app.composer.transcript().len(), 1);

        // a second Enter while in flight is ignored
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.composer.transcript().len(), 1);
    }

    #[test]
    fn test_escape_then_quit() {
        let mut app = test_app();
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
