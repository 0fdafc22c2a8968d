//! UI-agnostic conversation state
//!
//! These types are shared by every front end (the TUI and the one-shot CLI)
//! and don't depend on any specific UI framework.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::view::MessageView;

/// Opaque identifier of the conversation thread on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::System => "system",
        }
    }

    /// Unknown roles stored by the server are shown as system lines.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "user" => ChatRole::User,
            "assistant" => ChatRole::Assistant,
            _ => ChatRole::System,
        }
    }
}

/// Append-only display list for a single chat.
///
/// Entries are kept in arrival order and are never edited or removed once
/// pushed.
#[derive(Debug, Clone)]
pub struct Transcript {
    chat_id: ChatId,
    entries: Vec<MessageView>,
}

impl Transcript {
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            entries: Vec::new(),
        }
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    pub fn push(&mut self, view: MessageView) {
        self.entries.push(view);
    }

    pub fn entries(&self) -> &[MessageView] {
        &self.entries
    }

    pub fn last(&self) -> Option<&MessageView> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str_is_case_insensitive() {
        assert_eq!(ChatRole::from_str("User"), ChatRole::User);
        assert_eq!(ChatRole::from_str("ASSISTANT"), ChatRole::Assistant);
        assert_eq!(ChatRole::from_str("tool"), ChatRole::System);
    }

    #[test]
    fn test_transcript_keeps_arrival_order() {
        let mut transcript = Transcript::new(ChatId::new("7"));
        transcript.push(MessageView::text(ChatRole::User, "user: first"));
        transcript.push(MessageView::text(ChatRole::Assistant, "Assistant second"));

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.chat_id().as_str(), "7");
        assert_eq!(
            transcript.entries()[0],
            MessageView::text(ChatRole::User, "user: first")
        );
        assert_eq!(
            transcript.last(),
            Some(&MessageView::text(ChatRole::Assistant, "Assistant second"))
        );
    }
}
