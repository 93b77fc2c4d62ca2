//! Server responses.

use super::ResponseCode;
use crate::{Error, Result};

/// Outcome carried by the terminal line of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed; the session remains usable.
    No,
    /// Server is closing the connection.
    Bye,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns the wire keyword for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bye => "BYE",
        }
    }
}

/// One complete server response: content lines followed by a status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Content lines preceding the status line, in arrival order.
    pub lines: Vec<String>,
    /// Outcome of the response.
    pub status: Status,
    /// Response code from the status line, if any.
    pub code: Option<ResponseCode>,
    /// Decoded human-readable message (empty if the server sent none).
    pub message: String,
}

impl Response {
    /// Returns true if the response completed with `OK`.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Converts a `NO` or `BYE` response into the matching error.
    ///
    /// Content lines of a failed response are discarded.
    pub fn into_result(self) -> Result<Self> {
        match self.status {
            Status::Ok => Ok(self),
            Status::No => Err(Error::No {
                code: self.code,
                message: self.message,
            }),
            Status::Bye => Err(Error::Bye {
                code: self.code,
                message: self.message,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn response(status: Status, message: &str) -> Response {
        Response {
            lines: vec!["\"a\"".to_string()],
            status,
            code: None,
            message: message.to_string(),
        }
    }

    #[test]
    fn ok_passes_through() {
        let resp = response(Status::Ok, "done").into_result().unwrap();
        assert_eq!(resp.message, "done");
        assert_eq!(resp.lines, vec!["\"a\""]);
    }

    #[test]
    fn no_becomes_command_error() {
        let err = response(Status::No, "quota exceeded")
            .into_result()
            .unwrap_err();
        assert!(matches!(err, Error::No { message, .. } if message == "quota exceeded"));
    }

    #[test]
    fn bye_becomes_session_terminated() {
        let err = response(Status::Bye, "shutting down")
            .into_result()
            .unwrap_err();
        assert!(matches!(err, Error::Bye { message, .. } if message == "shutting down"));
    }

    #[test]
    fn status_keywords() {
        assert_eq!(Status::Ok.as_str(), "OK");
        assert_eq!(Status::No.as_str(), "NO");
        assert_eq!(Status::Bye.as_str(), "BYE");
        assert!(Status::Ok.is_ok());
        assert!(!Status::Bye.is_ok());
    }
}
