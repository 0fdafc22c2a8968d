use thiserror::Error;

/// Errors raised while talking to the chat service.
///
/// Every variant is a transport-level failure: the server never produced a
/// usable JSON body. Failures the server reports inside a JSON body (an
/// `error` field on the message endpoint) are part of
/// [`crate::reply::PlainReply`] instead.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("request task failed: {0}")]
    Interrupted(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}
