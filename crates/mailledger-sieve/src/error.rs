//! Error types for the ManageSieve library.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::types::ResponseCode;

/// Errors that can occur during ManageSieve operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Dialing the server failed.
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        /// Address that was dialed.
        address: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// Dialing the server did not complete in time.
    #[error("Connection attempt timed out after {0:?}")]
    Timeout(Duration),

    /// TLS handshake failed after STARTTLS.
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] io::Error),

    /// TLS configuration or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// I/O error on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed quoted string, capability line or response code.
    #[error("Parse error at position {position}: {message}")]
    Parse {
        /// Byte position within the offending line.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Framing violation or unexpected data from the server.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server returned NO.
    #[error("Server returned NO: {message}")]
    No {
        /// Response code, if the server sent one.
        code: Option<ResponseCode>,
        /// Human-readable message.
        message: String,
    },

    /// Server sent BYE and is closing the connection.
    #[error("Server sent BYE: {message}")]
    Bye {
        /// Response code, if the server sent one.
        code: Option<ResponseCode>,
        /// Human-readable message.
        message: String,
    },

    /// Argument cannot be encoded as a protocol string.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Creates a parse error at the given position.
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Returns true if the session can no longer be used after this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::Timeout(_)
                | Self::Handshake(_)
                | Self::Tls(_)
                | Self::Io(_)
                | Self::Bye { .. }
        )
    }

    /// Returns true if the server rejected the command with NO.
    ///
    /// The session stays usable; the caller may retry or issue another command.
    #[must_use]
    pub const fn is_command_failure(&self) -> bool {
        matches!(self, Self::No { .. })
    }

    /// Returns the response code carried by a NO or BYE response.
    #[must_use]
    pub const fn response_code(&self) -> Option<&ResponseCode> {
        match self {
            Self::No { code, .. } | Self::Bye { code, .. } => code.as_ref(),
            _ => None,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn no_is_recoverable() {
        let err = Error::No {
            code: Some(ResponseCode::QuotaMaxSize),
            message: "quota exceeded".to_string(),
        };
        assert!(err.is_command_failure());
        assert!(!err.is_fatal());
        assert_eq!(err.response_code(), Some(&ResponseCode::QuotaMaxSize));
        assert_eq!(err.to_string(), "Server returned NO: quota exceeded");
    }

    #[test]
    fn bye_is_fatal() {
        let err = Error::Bye {
            code: None,
            message: "shutting down".to_string(),
        };
        assert!(err.is_fatal());
        assert!(!err.is_command_failure());
        assert_eq!(err.response_code(), None);
    }

    #[test]
    fn parse_error_is_not_fatal() {
        let err = Error::parse(3, "unterminated quoted string");
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Parse error at position 3: unterminated quoted string"
        );
    }

    #[test]
    fn io_is_fatal() {
        let err = Error::from(io::Error::new(io::ErrorKind::UnexpectedEof, "closed"));
        assert!(err.is_fatal());
    }
}
