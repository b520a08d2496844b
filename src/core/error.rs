use std::io;
use thiserror::Error;

/// Errors raised while synchronizing with an NTP server
#[derive(Error, Debug)]
pub enum Error {
    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Attempt cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Error::Resolution(msg.into())
    }

    /// Creates a new malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedResponse(msg.into())
    }

    /// Creates a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether the retry loop should try again after this error.
    ///
    /// Every network-side failure is retryable; only cancellation and bad
    /// configuration are not.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Error::Cancelled | Error::Config(_))
    }
}
