//! Error types for the request executor.
//!
//! # Design
//! Every failure is classified by the step that produced it: building the
//! client, resolving the path, encoding the body, the exchange itself, the
//! status check, or decoding the payload. Wrapping variants keep the
//! underlying cause reachable through `source()` so callers can inspect it.

use thiserror::Error;

/// Failure reported by a [`Transport`](crate::Transport) while performing an
/// exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The caller's cancellation token fired before the exchange completed.
    #[error("request cancelled")]
    Cancelled,

    /// The transport gave up waiting on the peer.
    #[error("timed out")]
    TimedOut,

    /// The method string is not a valid HTTP token.
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Connection, DNS or socket level failure, or a failed payload read.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Any other transport-specific failure (TLS, protocol, task panics).
    #[error("transport failure")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors returned by [`Client`](crate::Client).
#[derive(Debug, Error)]
pub enum Error {
    /// The base URL given at construction is not an absolute URL.
    #[error("invalid base URL: {0}")]
    InvalidAddress(#[source] url::ParseError),

    /// The per-call path could not be resolved against the base URL.
    #[error("invalid path: {0}")]
    InvalidPath(#[source] url::ParseError),

    /// The request body could not be serialized to JSON. Nothing was sent.
    #[error("failed to marshal body")]
    Encoding(#[source] serde_json::Error),

    /// The exchange itself failed, including cancellation.
    #[error("request failed")]
    Transport(#[from] TransportError),

    /// The server answered with a status of 300 or above.
    #[error("received non-2xx status: {0}")]
    UnexpectedStatus(u16),

    /// The response payload could not be deserialized into the destination.
    #[error("failed to decode response body")]
    Decoding(#[source] serde_json::Error),
}

impl Error {
    /// Status code carried by [`Error::UnexpectedStatus`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UnexpectedStatus(status) => Some(*status),
            _ => None,
        }
    }

    /// True when the call was abandoned because its token fired.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Transport(TransportError::Cancelled))
    }
}

/// A result which error type is always an [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;
