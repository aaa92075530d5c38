//! Error handling module

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Token exchange rejected or answered with an unusable body
    #[error("Auth error: {0}")]
    Auth(String),

    /// Non-2xx answer from a data endpoint
    #[error("Upstream error: HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        BridgeError::MalformedResponse(msg.into())
    }

    /// HTTP status carried by the error, if the upstream answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            BridgeError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<url::ParseError> for BridgeError {
    fn from(e: url::ParseError) -> Self {
        BridgeError::Config(format!("invalid URL: {}", e))
    }
}
