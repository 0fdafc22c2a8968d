//! Decoding of the message endpoint's response body.
//!
//! The server answers `POST /api/chats/{id}/message` with either a `parsed`
//! object (conditions, recommendations, disclaimer) or plain `assistant` /
//! `error` strings. All key spellings and falsy values are resolved here so
//! that the rest of the client only ever sees [`AssistantReply`].

use serde::{de, Deserialize};
use serde_json::Value;

/// A decoded reply from the message endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantReply {
    Structured(ParsedReply),
    Plain(PlainReply),
}

/// Structured payload the server extracted from the model output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
    pub possible_conditions: Vec<Condition>,
    pub recommendations: Vec<String>,
    pub disclaimer: Option<String>,
}

/// One entry in the possible-conditions list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Label(String),
    Detailed {
        name: String,
        #[serde(default)]
        reason: Option<String>,
    },
}

/// Fallback reply carrying free text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlainReply {
    pub assistant_text: Option<String>,
    pub error_text: Option<String>,
}

#[derive(Deserialize)]
struct WireReply {
    #[serde(default)]
    parsed: Option<Value>,
    #[serde(default)]
    assistant: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct WireParsed {
    #[serde(default)]
    possible_conditions: Option<Vec<Condition>>,
    #[serde(default, rename = "possibleConditions")]
    possible_conditions_camel: Option<Vec<Condition>>,
    #[serde(default)]
    recommendations: Option<Vec<String>>,
    #[serde(default)]
    disclaimer: Option<String>,
}

impl AssistantReply {
    /// Decode a raw response body.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        Self::from_value(serde_json::from_str(body)?)
    }

    /// Decode an already-parsed JSON document. Anything but an object is
    /// rejected.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if !value.is_object() {
            return Err(de::Error::custom("expected a JSON object"));
        }
        let wire: WireReply = serde_json::from_value(value)?;
        Self::from_wire(wire)
    }

    /// Only an object `parsed` is structured; `true`, strings and arrays fall back to plain.
    fn from_wire(wire: WireReply) -> Result<Self, serde_json::Error> {
        match wire.parsed {
            Some(parsed @ Value::Object(_)) => {
                let parsed: WireParsed = serde_json::from_value(parsed)?;
                Ok(AssistantReply::Structured(parsed.into()))
            }
            _ => Ok(AssistantReply::Plain(PlainReply {
                assistant_text: non_empty_text(wire.assistant),
                error_text: non_empty_text(wire.error),
            })),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, AssistantReply::Structured(_))
    }
}

impl From<WireParsed> for ParsedReply {
    fn from(wire: WireParsed) -> Self {
        // snake_case wins when both spellings are present
        let possible_conditions = wire
            .possible_conditions
            .or(wire.possible_conditions_camel)
            .unwrap_or_default()
            .into_iter()
            .map(Condition::normalized)
            .collect();

        Self {
            possible_conditions,
            recommendations: wire.recommendations.unwrap_or_default(),
            disclaimer: wire.disclaimer.filter(|d| !d.is_empty()),
        }
    }
}

impl Condition {
    fn normalized(self) -> Self {
        match self {
            Condition::Detailed { name, reason } => Condition::Detailed {
                name,
                reason: reason.filter(|r| !r.is_empty()),
            },
            label => label,
        }
    }

    /// Display form: the bare label, or `name: reason`.
    pub fn display(&self) -> String {
        match self {
            Condition::Label(label) => label.clone(),
            Condition::Detailed {
                name,
                reason: Some(reason),
            } => format!("{}: {}", name, reason),
            Condition::Detailed { name, reason: None } => name.clone(),
        }
    }
}

impl PlainReply {
    /// Assistant text, else the server's error, else `"No response"`.
    pub fn body(&self) -> &str {
        self.assistant_text
            .as_deref()
            .or(self.error_text.as_deref())
            .unwrap_or("No response")
    }
}

/// Strings count only when non-empty; numbers and booleans are shown as-is.
fn non_empty_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
