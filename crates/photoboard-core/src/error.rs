//! Error types for photoboard-core.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for photoboard operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from underlying system calls.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TCP connection to the endpoint could not be established.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// A bounded step did not finish in time.
    #[error("{stage} timed out")]
    Timeout { stage: &'static str },

    /// Peer closed the connection before the handshake finished.
    #[error("connection closed")]
    ConnectionClosed,

    /// Peer sent something the handshake cannot accept.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// Session identifier could not be written or read back.
    #[error("failed to persist session identifier to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External action reported failure.
    #[error("action error: {message}")]
    Action { message: String },

    /// Image decode, encode or geometry error.
    #[error("image error: {message}")]
    Image { message: String },

    /// Invalid or unreadable configuration.
    #[error("config error: {message}")]
    Config { message: String },
}

impl Error {
    /// Returns true if this error is transient and another cycle may succeed.
    ///
    /// Everything that can go wrong between opening the socket and sending the
    /// acknowledgment is transient, including persistence failures: the next
    /// handshake rewrites the identifier anyway.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::Connect { .. }
                | Error::Timeout { .. }
                | Error::ConnectionClosed
                | Error::Protocol { .. }
                | Error::Persist { .. }
        )
    }

    /// Returns true if this error is fatal and retrying won't help.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config { .. })
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Action {
            message: format!("http: {}", err),
        }
    }
}

/// Convenience result type for photoboard operations.
pub type Result<T> = std::result::Result<T, Error>;
