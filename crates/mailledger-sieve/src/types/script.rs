//! Script types.

use std::fmt;

use crate::{Error, Result};

/// One entry of a LISTSCRIPTS response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Script {
    /// Script name, unique per account.
    pub name: String,
    /// Whether this is the active script. The server allows at most one.
    pub active: bool,
}

/// Name of a script stored on the server.
///
/// Names are sent as quoted strings, so they cannot be empty or contain
/// CR, LF or NUL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptName(String);

impl ScriptName {
    /// Creates a new script name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or contains CR, LF or NUL.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "Script name cannot be empty".into(),
            ));
        }
        validate_quotable("script name", &name)?;
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScriptName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ScriptName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Checks that a string can be sent as a protocol quoted string.
///
/// `what` names the argument in the error; the value itself is never
/// included since it may be a credential.
pub(crate) fn validate_quotable(what: &str, s: &str) -> Result<()> {
    match s.bytes().find(|b| matches!(b, b'\r' | b'\n' | 0)) {
        Some(b) => Err(Error::InvalidArgument(format!(
            "{what} contains forbidden byte {b:#04x}"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_regular_names() {
        let name = ScriptName::new("inbox-rules").unwrap();
        assert_eq!(name.as_str(), "inbox-rules");
        assert_eq!(name.to_string(), "inbox-rules");
    }

    #[test]
    fn accepts_quotes_and_spaces() {
        assert!(ScriptName::new("my \"quoted\" script").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            ScriptName::new(""),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_line_breaks() {
        assert!(ScriptName::new("evil\r\nLOGOUT").is_err());
        assert!(ScriptName::new("evil\nname").is_err());
        assert!(ScriptName::new("nul\0byte").is_err());
    }

    #[test]
    fn error_names_argument_not_value() {
        let err = validate_quotable("password", "hunter2\nsecret").unwrap_err();
        let text = err.to_string();
        assert_eq!(text, "Invalid argument: password contains forbidden byte 0x0a");
        assert!(!text.contains("hunter2"));
    }
}
