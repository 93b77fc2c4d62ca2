//! ManageSieve command builder.
//!
//! This module provides the command set of RFC 5804 §2 and its wire
//! serialization.

mod serialize;

use std::fmt;

use base64::Engine;

use crate::Result;
use crate::types::{ScriptName, validate_quotable};

pub use serialize::{literal_len, quote};

use serialize::{write_literal, write_number, write_quoted};

/// ManageSieve command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// AUTHENTICATE command (§2.1).
    Authenticate {
        /// SASL mechanism name.
        mechanism: String,
        /// Base64 initial response, if any.
        initial_response: Option<String>,
    },
    /// STARTTLS command (§2.2).
    StartTls,
    /// LOGOUT command (§2.3).
    Logout,
    /// CAPABILITY command (§2.4).
    Capability,
    /// HAVESPACE command (§2.5).
    HaveSpace {
        /// Script that would be stored.
        name: ScriptName,
        /// Script size in bytes.
        size: u64,
    },
    /// PUTSCRIPT command (§2.6).
    PutScript {
        /// Script to store.
        name: ScriptName,
        /// Script content; line endings are normalized on serialization.
        script: Vec<u8>,
    },
    /// LISTSCRIPTS command (§2.7).
    ListScripts,
    /// SETACTIVE command (§2.8). `None` deactivates every script.
    SetActive {
        /// Script to activate.
        name: Option<ScriptName>,
    },
    /// GETSCRIPT command (§2.9).
    GetScript {
        /// Script to fetch.
        name: ScriptName,
    },
    /// DELETESCRIPT command (§2.10).
    DeleteScript {
        /// Script to delete.
        name: ScriptName,
    },
    /// RENAMESCRIPT command (§2.11).
    RenameScript {
        /// Current name.
        from: ScriptName,
        /// New name.
        to: ScriptName,
    },
    /// CHECKSCRIPT command (§2.12).
    CheckScript {
        /// Script content; line endings are normalized on serialization.
        script: Vec<u8>,
    },
    /// NOOP command (§2.13).
    Noop {
        /// Tag the server echoes back in a TAG response code.
        tag: Option<String>,
    },
    /// UNAUTHENTICATE command (§2.14.1).
    Unauthenticate,
}

impl Command {
    /// Builds an AUTHENTICATE PLAIN command.
    ///
    /// The SASL PLAIN message uses the username as both the authorization
    /// and the authentication identity.
    #[must_use]
    pub fn authenticate_plain(username: &str, password: &str) -> Self {
        let message = format!("{username}\0{username}\0{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(message.as_bytes());
        Self::Authenticate {
            mechanism: "PLAIN".to_string(),
            initial_response: Some(encoded),
        }
    }

    /// Checks the free-form string arguments for CR, LF and NUL.
    ///
    /// Script names are checked when a [`ScriptName`] is built; the mechanism,
    /// initial response and NOOP tag are plain strings and are checked here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if
    /// an argument cannot be sent as a quoted string.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Authenticate {
                mechanism,
                initial_response,
            } => {
                validate_quotable("SASL mechanism", mechanism)?;
                if let Some(response) = initial_response {
                    validate_quotable("SASL initial response", response)?;
                }
                Ok(())
            }
            Self::Noop { tag: Some(tag) } => validate_quotable("NOOP tag", tag),
            _ => Ok(()),
        }
    }

    /// Returns the command verb.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Authenticate { .. } => "AUTHENTICATE",
            Self::StartTls => "STARTTLS",
            Self::Logout => "LOGOUT",
            Self::Capability => "CAPABILITY",
            Self::HaveSpace { .. } => "HAVESPACE",
            Self::PutScript { .. } => "PUTSCRIPT",
            Self::ListScripts => "LISTSCRIPTS",
            Self::SetActive { .. } => "SETACTIVE",
            Self::GetScript { .. } => "GETSCRIPT",
            Self::DeleteScript { .. } => "DELETESCRIPT",
            Self::RenameScript { .. } => "RENAMESCRIPT",
            Self::CheckScript { .. } => "CHECKSCRIPT",
            Self::Noop { .. } => "NOOP",
            Self::Unauthenticate => "UNAUTHENTICATE",
        }
    }

    /// Serializes the command to bytes, including the final CRLF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.verb().as_bytes());

        match self {
            Self::Authenticate {
                mechanism,
                initial_response,
            } => {
                buf.push(b' ');
                write_quoted(&mut buf, mechanism);
                if let Some(resp) = initial_response {
                    buf.push(b' ');
                    write_quoted(&mut buf, resp);
                }
            }
            Self::HaveSpace { name, size } => {
                buf.push(b' ');
                write_quoted(&mut buf, name.as_str());
                buf.push(b' ');
                write_number(&mut buf, *size);
            }
            Self::PutScript { name, script } => {
                buf.push(b' ');
                write_quoted(&mut buf, name.as_str());
                buf.push(b' ');
                write_literal(&mut buf, script);
            }
            Self::SetActive { name } => {
                buf.push(b' ');
                write_quoted(&mut buf, name.as_ref().map_or("", ScriptName::as_str));
            }
            Self::GetScript { name } | Self::DeleteScript { name } => {
                buf.push(b' ');
                write_quoted(&mut buf, name.as_str());
            }
            Self::RenameScript { from, to } => {
                buf.push(b' ');
                write_quoted(&mut buf, from.as_str());
                buf.push(b' ');
                write_quoted(&mut buf, to.as_str());
            }
            Self::CheckScript { script } => {
                buf.push(b' ');
                write_literal(&mut buf, script);
            }
            Self::Noop { tag } => {
                if let Some(tag) = tag {
                    buf.push(b' ');
                    write_quoted(&mut buf, tag);
                }
            }
            Self::StartTls
            | Self::Logout
            | Self::Capability
            | Self::ListScripts
            | Self::Unauthenticate => {}
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}

/// Renders the command for diagnostics.
///
/// Credentials are masked and literal payloads are shown as their header only.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = self.verb();
        match self {
            Self::Authenticate {
                mechanism,
                initial_response,
            } => {
                write!(f, "{verb} {}", quote(mechanism))?;
                if initial_response.is_some() {
                    write!(f, " \"***\"")?;
                }
                Ok(())
            }
            Self::HaveSpace { name, size } => write!(f, "{verb} {} {size}", quote(name.as_str())),
            Self::PutScript { name, script } => write!(
                f,
                "{verb} {} {{{}+}}",
                quote(name.as_str()),
                literal_len(script)
            ),
            Self::SetActive { name } => write!(
                f,
                "{verb} {}",
                quote(name.as_ref().map_or("", ScriptName::as_str))
            ),
            Self::GetScript { name } | Self::DeleteScript { name } => {
                write!(f, "{verb} {}", quote(name.as_str()))
            }
            Self::RenameScript { from, to } => write!(
                f,
                "{verb} {} {}",
                quote(from.as_str()),
                quote(to.as_str())
            ),
            Self::CheckScript { script } => write!(f, "{verb} {{{}+}}", literal_len(script)),
            Self::Noop { tag: Some(tag) } => write!(f, "{verb} {}", quote(tag)),
            Self::Noop { tag: None }
            | Self::StartTls
            | Self::Logout
            | Self::Capability
            | Self::ListScripts
            | Self::Unauthenticate => f.write_str(verb),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn name(s: &str) -> ScriptName {
        ScriptName::new(s).unwrap()
    }

    #[test]
    fn bare_verbs() {
        assert_eq!(Command::StartTls.serialize(), b"STARTTLS\r\n");
        assert_eq!(Command::Logout.serialize(), b"LOGOUT\r\n");
        assert_eq!(Command::Capability.serialize(), b"CAPABILITY\r\n");
        assert_eq!(Command::ListScripts.serialize(), b"LISTSCRIPTS\r\n");
        assert_eq!(Command::Unauthenticate.serialize(), b"UNAUTHENTICATE\r\n");
        assert_eq!(Command::Noop { tag: None }.serialize(), b"NOOP\r\n");
    }

    #[test]
    fn authenticate_plain() {
        let cmd = Command::authenticate_plain("user", "pass");
        // base64("user\0user\0pass")
        assert_eq!(
            cmd.serialize(),
            b"AUTHENTICATE \"PLAIN\" \"dXNlcgB1c2VyAHBhc3M=\"\r\n"
        );
    }

    #[test]
    fn authenticate_is_masked_in_display() {
        let cmd = Command::authenticate_plain("user", "secret");
        assert_eq!(cmd.to_string(), "AUTHENTICATE \"PLAIN\" \"***\"");
    }

    #[test]
    fn have_space() {
        let cmd = Command::HaveSpace {
            name: name("test3"),
            size: 4096,
        };
        assert_eq!(cmd.serialize(), b"HAVESPACE \"test3\" 4096\r\n");
    }

    #[test]
    fn put_script_uses_normalized_literal() {
        let cmd = Command::PutScript {
            name: name("rules"),
            script: b"keep;\n".to_vec(),
        };
        assert_eq!(cmd.serialize(), b"PUTSCRIPT \"rules\" {7+}\r\nkeep;\r\n\r\n");
        assert_eq!(cmd.to_string(), "PUTSCRIPT \"rules\" {7+}");
    }

    #[test]
    fn check_script() {
        let cmd = Command::CheckScript {
            script: b"stop;".to_vec(),
        };
        assert_eq!(cmd.serialize(), b"CHECKSCRIPT {5+}\r\nstop;\r\n");
    }

    #[test]
    fn set_active_and_deactivate() {
        let cmd = Command::SetActive {
            name: Some(name("rules")),
        };
        assert_eq!(cmd.serialize(), b"SETACTIVE \"rules\"\r\n");

        let cmd = Command::SetActive { name: None };
        assert_eq!(cmd.serialize(), b"SETACTIVE \"\"\r\n");
    }

    #[test]
    fn get_and_delete() {
        let cmd = Command::GetScript { name: name("rules") };
        assert_eq!(cmd.serialize(), b"GETSCRIPT \"rules\"\r\n");

        let cmd = Command::DeleteScript { name: name("rules") };
        assert_eq!(cmd.serialize(), b"DELETESCRIPT \"rules\"\r\n");
    }

    #[test]
    fn rename_escapes_names() {
        let cmd = Command::RenameScript {
            from: name("old"),
            to: name("new \"one\""),
        };
        assert_eq!(
            cmd.serialize(),
            b"RENAMESCRIPT \"old\" \"new \\\"one\\\"\"\r\n"
        );
    }

    #[test]
    fn noop_with_tag() {
        let cmd = Command::Noop {
            tag: Some("sync-1".to_string()),
        };
        assert_eq!(cmd.serialize(), b"NOOP \"sync-1\"\r\n");
        assert_eq!(cmd.to_string(), "NOOP \"sync-1\"");
    }

    #[test]
    fn validate_rejects_line_breaks_in_strings() {
        let cmd = Command::Noop {
            tag: Some("x\r\nLOGOUT".to_string()),
        };
        assert!(matches!(cmd.validate(), Err(crate::Error::InvalidArgument(_))));

        let cmd = Command::Authenticate {
            mechanism: "PLAIN\n".to_string(),
            initial_response: None,
        };
        assert!(cmd.validate().is_err());

        assert!(Command::authenticate_plain("user", "pass").validate().is_ok());
        assert!(Command::Noop { tag: None }.validate().is_ok());
    }
}
