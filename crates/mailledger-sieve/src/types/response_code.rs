//! Response codes (RFC 5804 §1.3).

use std::fmt;

/// Response code attached to an `OK`, `NO` or `BYE` response.
///
/// These give machine-readable detail about why a command completed the way
/// it did, e.g. `NO (QUOTA/MAXSIZE) "Script too large"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// AUTH-TOO-WEAK: the chosen SASL mechanism is not allowed by policy.
    AuthTooWeak,
    /// ENCRYPT-NEEDED: the command requires an encrypted connection.
    EncryptNeeded,
    /// QUOTA: a quota limit was exceeded.
    Quota,
    /// QUOTA/MAXSCRIPTS: the maximum number of scripts was exceeded.
    QuotaMaxScripts,
    /// QUOTA/MAXSIZE: the maximum script size was exceeded.
    QuotaMaxSize,
    /// REFERRAL: the account lives on another server.
    Referral(String),
    /// SASL: additional data from a successful authentication exchange.
    Sasl(String),
    /// TRANSITION-NEEDED: the user must change the password first.
    TransitionNeeded,
    /// TRYLATER: temporary server failure.
    TryLater,
    /// ACTIVE: the operation is not allowed on the active script.
    Active,
    /// NONEXISTENT: the referenced script does not exist.
    NonExistent,
    /// ALREADYEXISTS: the target script name is already in use.
    AlreadyExists,
    /// WARNINGS: the script was accepted but produced warnings.
    Warnings,
    /// TAG: echo of the tag sent with NOOP.
    Tag(String),
    /// Any code this client does not know about.
    Other {
        /// Code name as sent by the server.
        name: String,
        /// Optional argument following the name.
        argument: Option<String>,
    },
}

impl ResponseCode {
    /// Builds a response code from its name and optional argument.
    ///
    /// Names are matched ASCII case-insensitively. Codes that require an
    /// argument but arrive without one are kept as [`ResponseCode::Other`].
    #[must_use]
    pub fn from_parts(name: &str, argument: Option<String>) -> Self {
        let upper = name.to_ascii_uppercase();
        match (upper.as_str(), argument) {
            ("AUTH-TOO-WEAK", None) => Self::AuthTooWeak,
            ("ENCRYPT-NEEDED", None) => Self::EncryptNeeded,
            ("QUOTA", None) => Self::Quota,
            ("QUOTA/MAXSCRIPTS", None) => Self::QuotaMaxScripts,
            ("QUOTA/MAXSIZE", None) => Self::QuotaMaxSize,
            ("REFERRAL", Some(url)) => Self::Referral(url),
            ("SASL", Some(data)) => Self::Sasl(data),
            ("TRANSITION-NEEDED", None) => Self::TransitionNeeded,
            ("TRYLATER", None) => Self::TryLater,
            ("ACTIVE", None) => Self::Active,
            ("NONEXISTENT", None) => Self::NonExistent,
            ("ALREADYEXISTS", None) => Self::AlreadyExists,
            ("WARNINGS", None) => Self::Warnings,
            ("TAG", Some(tag)) => Self::Tag(tag),
            (_, argument) => Self::Other {
                name: name.to_string(),
                argument,
            },
        }
    }

    /// Returns true for any of the QUOTA codes.
    #[must_use]
    pub const fn is_quota(&self) -> bool {
        matches!(self, Self::Quota | Self::QuotaMaxScripts | Self::QuotaMaxSize)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthTooWeak => write!(f, "AUTH-TOO-WEAK"),
            Self::EncryptNeeded => write!(f, "ENCRYPT-NEEDED"),
            Self::Quota => write!(f, "QUOTA"),
            Self::QuotaMaxScripts => write!(f, "QUOTA/MAXSCRIPTS"),
            Self::QuotaMaxSize => write!(f, "QUOTA/MAXSIZE"),
            Self::Referral(url) => write!(f, "REFERRAL {url}"),
            Self::Sasl(data) => write!(f, "SASL {data:?}"),
            Self::TransitionNeeded => write!(f, "TRANSITION-NEEDED"),
            Self::TryLater => write!(f, "TRYLATER"),
            Self::Active => write!(f, "ACTIVE"),
            Self::NonExistent => write!(f, "NONEXISTENT"),
            Self::AlreadyExists => write!(f, "ALREADYEXISTS"),
            Self::Warnings => write!(f, "WARNINGS"),
            Self::Tag(tag) => write!(f, "TAG {tag:?}"),
            Self::Other {
                name,
                argument: Some(arg),
            } => write!(f, "{name} {arg}"),
            Self::Other {
                name,
                argument: None,
            } => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_without_argument() {
        assert_eq!(
            ResponseCode::from_parts("AUTH-TOO-WEAK", None),
            ResponseCode::AuthTooWeak
        );
        assert_eq!(
            ResponseCode::from_parts("quota/maxsize", None),
            ResponseCode::QuotaMaxSize
        );
        assert_eq!(
            ResponseCode::from_parts("NonExistent", None),
            ResponseCode::NonExistent
        );
    }

    #[test]
    fn codes_with_argument() {
        assert_eq!(
            ResponseCode::from_parts("TAG", Some("sync-1".to_string())),
            ResponseCode::Tag("sync-1".to_string())
        );
        assert_eq!(
            ResponseCode::from_parts("REFERRAL", Some("sieve://other.example.com".to_string())),
            ResponseCode::Referral("sieve://other.example.com".to_string())
        );
    }

    #[test]
    fn missing_argument_falls_back_to_other() {
        assert_eq!(
            ResponseCode::from_parts("TAG", None),
            ResponseCode::Other {
                name: "TAG".to_string(),
                argument: None
            }
        );
    }

    #[test]
    fn unknown_code_keeps_name() {
        let code = ResponseCode::from_parts("X-VENDOR", Some("42".to_string()));
        assert_eq!(code.to_string(), "X-VENDOR 42");
    }

    #[test]
    fn quota_family() {
        assert!(ResponseCode::Quota.is_quota());
        assert!(ResponseCode::QuotaMaxScripts.is_quota());
        assert!(!ResponseCode::TryLater.is_quota());
    }
}
