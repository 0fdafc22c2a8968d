pub mod client;
pub mod composer;
pub mod config;
pub mod error;
pub mod reply;
pub mod state;
pub mod view;

// Re-export main types for convenience
pub use client::{ChatClient, ChatHistory, ChatSummary, ChatTransport, StoredMessage};
pub use composer::{Composer, PendingSend};
pub use config::Config;
pub use error::{ClientError, ConfigError};
pub use reply::{AssistantReply, Condition, ParsedReply, PlainReply};
pub use state::{ChatId, ChatMessage, ChatRole, Transcript};
pub use view::{CardSection, CardView, MessageView};
