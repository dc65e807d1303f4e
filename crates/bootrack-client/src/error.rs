//! Client error types.

use serde::Deserialize;

/// Errors returned by [`ClientApi`](crate::ClientApi) calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server rejected the request (4xx other than 404).
    #[error("request rejected ({status}, {code}): {message}")]
    Rejected {
        status: u16,
        /// Machine-readable code from the error envelope.
        code: String,
        message: String,
    },

    /// The server failed (5xx).
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The request never completed, or the body could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    /// A caller-supplied value cannot be sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias used throughout the client crate.
pub type Result<T> = std::result::Result<T, ClientError>;

/// The server's `{ "code": ..., "message": ... }` error body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub code: String,
    pub message: String,
}

impl ClientError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Maps a non-success status and its (optional) envelope to an error.
    pub(crate) fn from_status(status: u16, envelope: Option<ErrorEnvelope>) -> Self {
        let (code, message) = match envelope {
            Some(env) => (env.code, env.message),
            None => ("unknown".to_string(), format!("HTTP {status}")),
        };
        match status {
            404 => Self::NotFound(message),
            400..=499 => Self::Rejected {
                status,
                code,
                message,
            },
            _ => Self::Server { status, message },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Worth retrying unchanged: transport failures and 5xx.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Server { .. })
    }
}

/// Turns a 404 into `Ok(None)`.
pub(crate) fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}
