//! The composer: input text, the send gate, and the display list for one chat.
//!
//! A send is split in two so front ends can run the request on another task:
//! [`Composer::begin_send`] echoes the user message and closes the gate,
//! [`Composer::finish_send`] appends the reply and always reopens it.
//! [`Composer::send`] does both around a [`ChatTransport`] call.

use tracing::{debug, info, warn};

use crate::client::{ChatHistory, ChatTransport};
use crate::error::ClientError;
use crate::reply::AssistantReply;
use crate::state::{ChatId, ChatMessage, Transcript};
use crate::view::{self, MessageView};

/// Text accepted by [`Composer::begin_send`], ready to go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub chat_id: ChatId,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Composer {
    display_name: Option<String>,
    input: String,
    typing: bool,
    sending: bool,
    transcript: Transcript,
}

impl Composer {
    pub fn new(chat_id: ChatId, display_name: Option<String>) -> Self {
        Self {
            display_name: display_name.filter(|name| !name.trim().is_empty()),
            input: String::new(),
            typing: false,
            sending: false,
            transcript: Transcript::new(chat_id),
        }
    }

    pub fn chat_id(&self) -> &ChatId {
        self.transcript.chat_id()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn views(&self) -> &[MessageView] {
        self.transcript.entries()
    }

    /// True while the input holds something other than whitespace.
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// True while a request is in flight; the send control is disabled.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn can_send(&self) -> bool {
        !self.sending && !self.input.trim().is_empty()
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.refresh_typing();
    }

    /// Edit the input in place and refresh the typing indicator.
    pub fn edit_input(&mut self, edit: impl FnOnce(&mut String)) {
        edit(&mut self.input);
        self.refresh_typing();
    }

    fn refresh_typing(&mut self) {
        self.typing = !self.input.trim().is_empty();
    }

    /// Show previously stored messages above anything sent in this session.
    pub fn load_history(&mut self, history: &ChatHistory) {
        for stored in &history.messages {
            self.transcript
                .push(view::render_message(&stored.to_message()));
        }
        debug!(count = history.messages.len(), chat_id = %self.chat_id(), "history loaded");
    }

    /// Accept the current input for sending.
    ///
    /// Returns `None` without touching anything when the input is blank or a
    /// request is already in flight. Otherwise the user message is appended
    /// to the transcript and the send gate is closed.
    pub fn begin_send(&mut self) -> Option<PendingSend> {
        if self.sending {
            debug!("send ignored: request already in flight");
            return None;
        }

        let text = self.input.trim();
        if text.is_empty() {
            return None;
        }
        let text = text.to_string();

        self.transcript
            .push(view::render_message(&ChatMessage::user(text.as_str())));
        self.sending = true;
        info!(chat_id = %self.chat_id(), "message sent");

        Some(PendingSend {
            chat_id: self.chat_id().clone(),
            text,
        })
    }

    /// Append the outcome of a send and reopen the send gate.
    pub fn finish_send(&mut self, result: Result<AssistantReply, ClientError>) {
        let view = match result {
            Ok(reply) => {
                let view = view::render_reply(&reply, self.display_name());
                if reply.is_structured() {
                    self.input.clear();
                    self.typing = false;
                }
                view
            }
            Err(e) => {
                warn!(error = %e, chat_id = %self.chat_id(), "message request failed");
                view::render_transport_error(&e)
            }
        };

        self.transcript.push(view);
        self.sending = false;
    }

    /// Run a complete send against `transport`.
    ///
    /// Returns `false` when nothing was sent.
    pub async fn send<T: ChatTransport>(&mut self, transport: &T) -> bool {
        let Some(pending) = self.begin_send() else {
            return false;
        };
        let result = transport.send_message(&pending.chat_id, &pending.text).await;
        self.finish_send(result);
        true
    }
}
