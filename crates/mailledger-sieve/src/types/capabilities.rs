//! Server capabilities (RFC 5804 §1.7).

use crate::Result;

/// Feature set advertised by the server.
///
/// A new value is decoded after connecting, after STARTTLS and after every
/// explicit CAPABILITY command. Each decode replaces the previous snapshot
/// entirely; fields are never merged across negotiations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Server implementation (`IMPLEMENTATION`).
    pub implementation: String,
    /// Supported SASL mechanisms (`SASL`), in advertised order.
    pub sasl_mechanisms: Vec<String>,
    /// Supported Sieve extensions (`SIEVE`), in advertised order.
    pub sieve_extensions: Vec<String>,
    /// Whether the bare `STARTTLS` capability was advertised.
    pub starttls: bool,
    /// Redirect limit per script execution (`MAXREDIRECTS`); 0 means no limit.
    pub max_redirects: u32,
    /// Supported notification methods (`NOTIFY`).
    pub notify_methods: Vec<String>,
    /// Negotiated language (`LANGUAGE`); empty means `i-default`.
    pub language: String,
    /// Authenticated user (`OWNER`); empty before authentication.
    pub owner: String,
    /// Protocol version (`VERSION`).
    pub version: String,
    /// Whether the bare `UNAUTHENTICATE` capability was advertised.
    pub unauthenticate: bool,
}

impl Capabilities {
    /// Decodes capabilities from the content lines of a capability response.
    ///
    /// # Errors
    ///
    /// Returns an error if any line is malformed or `MAXREDIRECTS` is not a number.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        crate::parser::parse_capabilities(lines)
    }

    /// Returns true if the server offers the given SASL mechanism.
    #[must_use]
    pub fn supports_sasl(&self, mechanism: &str) -> bool {
        self.sasl_mechanisms
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mechanism))
    }

    /// Returns true if the server supports the given Sieve extension.
    #[must_use]
    pub fn supports_extension(&self, extension: &str) -> bool {
        self.sieve_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    /// Returns the redirect limit, or `None` if the server imposes none.
    #[must_use]
    pub const fn max_redirects(&self) -> Option<u32> {
        match self.max_redirects {
            0 => None,
            n => Some(n),
        }
    }
}
