//! Library error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MagicError>;

#[derive(Debug, Error)]
pub enum MagicError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Logger error: {0}")]
    Logger(String),

    #[error("Invalid time: {0}")]
    Time(String),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Timeout error: operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Task failed: {0}")]
    TaskFailed(String),
}

impl MagicError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn logger(msg: impl Into<String>) -> Self {
        Self::Logger(msg.into())
    }

    pub fn time(msg: impl Into<String>) -> Self {
        Self::Time(msg.into())
    }

    pub fn address(msg: impl Into<String>) -> Self {
        Self::Address(msg.into())
    }

    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }
}
