//! Pure rendering of messages and replies into view descriptions.
//!
//! Nothing here touches a terminal. Front ends take a [`MessageView`] and
//! draw it however they like; tests assert on the description directly.

use std::fmt::Display;

use crate::reply::{AssistantReply, ParsedReply, PlainReply};
use crate::state::{ChatMessage, ChatRole};

pub const CONDITIONS_HEADING: &str = "Possible conditions";
pub const RECOMMENDATIONS_HEADING: &str = "Recommendations";

/// One entry of the display list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageView {
    Text { role: ChatRole, text: String },
    Card(CardView),
}

/// Structured assistant card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub conditions: CardSection,
    pub recommendations: Option<CardSection>,
    pub disclaimer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSection {
    pub heading: String,
    pub items: Vec<String>,
}

impl MessageView {
    pub fn text(role: ChatRole, text: impl Into<String>) -> Self {
        MessageView::Text {
            role,
            text: text.into(),
        }
    }

    /// Flatten the view into display lines.
    pub fn plain_text(&self) -> Vec<String> {
        match self {
            MessageView::Text { text, .. } => text.lines().map(str::to_string).collect(),
            MessageView::Card(card) => card.lines(),
        }
    }
}

impl CardView {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.conditions.lines();
        if let Some(recommendations) = &self.recommendations {
            lines.extend(recommendations.lines());
        }
        if let Some(disclaimer) = &self.disclaimer {
            lines.push(disclaimer.clone());
        }
        lines
    }
}

impl CardSection {
    fn new(heading: &str, items: Vec<String>) -> Self {
        Self {
            heading: heading.to_string(),
            items,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        std::iter::once(self.heading.clone())
            .chain(self.items.iter().map(|item| format!("- {}", item)))
            .collect()
    }
}

/// Render a stored or locally echoed message as `role: content`.
pub fn render_message(message: &ChatMessage) -> MessageView {
    MessageView::text(
        message.role,
        format!("{}: {}", message.role.as_str(), message.content),
    )
}

/// Render a decoded reply.
///
/// `display_name` is the configured user name; plain replies are addressed
/// to it (`"Sam, Take rest"`) and fall back to an `Assistant` label.
pub fn render_reply(reply: &AssistantReply, display_name: Option<&str>) -> MessageView {
    match reply {
        AssistantReply::Structured(parsed) => MessageView::Card(render_card(parsed)),
        AssistantReply::Plain(plain) => render_plain(plain, display_name),
    }
}

pub fn render_card(parsed: &ParsedReply) -> CardView {
    let conditions = parsed
        .possible_conditions
        .iter()
        .map(|condition| condition.display())
        .collect();

    let recommendations = if parsed.recommendations.is_empty() {
        None
    } else {
        Some(CardSection::new(
            RECOMMENDATIONS_HEADING,
            parsed.recommendations.clone(),
        ))
    };

    CardView {
        conditions: CardSection::new(CONDITIONS_HEADING, conditions),
        recommendations,
        disclaimer: parsed
            .disclaimer
            .as_ref()
            .map(|disclaimer| format!("Disclaimer: {}", disclaimer)),
    }
}

pub fn render_plain(plain: &PlainReply, display_name: Option<&str>) -> MessageView {
    let label = match display_name.filter(|name| !name.is_empty()) {
        Some(name) => format!("{},", name),
        None => "Assistant".to_string(),
    };
    MessageView::text(ChatRole::Assistant, format!("{} {}", label, plain.body()))
}

/// Render a transport or decode failure.
pub fn render_transport_error(error: &impl Display) -> MessageView {
    MessageView::text(ChatRole::Assistant, format!("Assistant error: {}", error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::Condition;

    fn flu_reply() -> AssistantReply {
        AssistantReply::Structured(ParsedReply {
            possible_conditions: vec![Condition::Label("Flu".to_string())],
            recommendations: vec!["Rest".to_string()],
            disclaimer: Some("Not medical advice".to_string()),
        })
    }

    #[test]
    fn test_user_echo() {
        let view = render_message(&ChatMessage::user("hello"));
        assert_eq!(view, MessageView::text(ChatRole::User, "user: hello"));
    }

    #[test]
    fn test_structured_card() {
        let MessageView::Card(card) = render_reply(&flu_reply(), None) else {
            panic!("expected a card");
        };

        assert_eq!(card.conditions.heading, "Possible conditions");
        assert_eq!(card.conditions.items, vec!["Flu"]);
        let recommendations = card.recommendations.as_ref().unwrap();
        assert_eq!(recommendations.heading, "Recommendations");
        assert_eq!(recommendations.items, vec!["Rest"]);
        assert!(card.disclaimer.as_ref().unwrap().contains("Not medical advice"));
    }

    #[test]
    fn test_card_omits_empty_sections() {
        let reply = AssistantReply::Structured(ParsedReply {
            possible_conditions: vec![Condition::Detailed {
                name: "Sinusitis".to_string(),
                reason: Some("facial pressure".to_string()),
            }],
            recommendations: Vec::new(),
            disclaimer: None,
        });

        let view = render_reply(&reply, Some("Sam"));
        assert_eq!(
            view.plain_text(),
            vec!["Possible conditions", "- Sinusitis: facial pressure"]
        );
    }

    #[test]
    fn test_card_lines_order() {
        let view = render_reply(&flu_reply(), None);
        assert_eq!(
            view.plain_text(),
            vec![
                "Possible conditions",
                "- Flu",
                "Recommendations",
                "- Rest",
                "Disclaimer: Not medical advice",
            ]
        );
    }

    #[test]
    fn test_plain_reply_labels() {
        let plain = AssistantReply::Plain(PlainReply {
            assistant_text: Some("Take rest".to_string()),
            error_text: None,
        });

        let MessageView::Text { text, .. } = render_reply(&plain, None) else {
            panic!("expected text");
        };
        assert_eq!(text, "Assistant Take rest");

        let MessageView::Text { text, .. } = render_reply(&plain, Some("Sam")) else {
            panic!("expected text");
        };
        assert_eq!(text, "Sam, Take rest");
        assert!(text.ends_with("Take rest"));

        let MessageView::Text { text, .. } = render_reply(&plain, Some("")) else {
            panic!("expected text");
        };
        assert_eq!(text, "Assistant Take rest");
    }

    #[test]
    fn test_empty_reply_says_no_response() {
        let view = render_reply(&AssistantReply::Plain(PlainReply::default()), None);
        assert_eq!(view, MessageView::text(ChatRole::Assistant, "Assistant No response"));
    }

    #[test]
    fn test_transport_error_line() {
        let view = render_transport_error(&"connection refused");
        let MessageView::Text { text, .. } = view else {
            panic!("expected text");
        };
        assert!(text.starts_with("Assistant error: "));
        assert!(text.ends_with("connection refused"));
    }
}
