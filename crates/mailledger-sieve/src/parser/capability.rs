//! Capability response decoding.
//!
//! Each content line is `"KEY"` optionally followed by a space and `"VALUE"`.
//! Presence-only keys such as `STARTTLS` carry no value.

use std::collections::HashMap;

use super::lexer::Lexer;
use crate::types::Capabilities;
use crate::{Error, Result};

/// One decoded capability line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityLine {
    /// Capability name.
    pub key: String,
    /// Value, or `None` for a presence-only capability.
    pub value: Option<String>,
}

/// Parses a single capability line.
///
/// # Errors
///
/// Returns an error if the key or value is not a valid quoted string.
pub fn parse_capability_line(line: &str) -> Result<CapabilityLine> {
    let mut lexer = Lexer::new(line.trim());
    let key = lexer.read_quoted()?;

    let value = if lexer.is_eof() {
        None
    } else {
        lexer.skip_spaces();
        let value = lexer.read_quoted()?;
        Some(value)
    };
    lexer.expect_eof()?;

    Ok(CapabilityLine { key, value })
}

/// Decodes the content lines of a capability response.
///
/// Keys are matched case-sensitively; unknown keys are ignored and the last
/// occurrence of a duplicate key wins. `STARTTLS` and `UNAUTHENTICATE` are
/// only recognized in their presence-only form.
///
/// # Errors
///
/// Returns an error if any line is malformed or `MAXREDIRECTS` is not a
/// number. No partial result is returned.
pub fn parse_capabilities<S: AsRef<str>>(lines: &[S]) -> Result<Capabilities> {
    let mut values: HashMap<String, String> = HashMap::with_capacity(lines.len());
    let mut capabilities = Capabilities::default();

    for line in lines {
        let CapabilityLine { key, value } = parse_capability_line(line.as_ref())?;
        match value {
            None if key == "STARTTLS" => capabilities.starttls = true,
            None if key == "UNAUTHENTICATE" => capabilities.unauthenticate = true,
            value => {
                values.insert(key, value.unwrap_or_default());
            }
        }
    }

    for (key, value) in values {
        match key.as_str() {
            "IMPLEMENTATION" => capabilities.implementation = value,
            "SASL" => capabilities.sasl_mechanisms = split_list(&value),
            "SIEVE" => capabilities.sieve_extensions = split_list(&value),
            "MAXREDIRECTS" => {
                capabilities.max_redirects = value.trim().parse().map_err(|_| {
                    Error::Protocol(format!("MAXREDIRECTS is not a number: {value:?}"))
                })?;
            }
            "NOTIFY" => capabilities.notify_methods = split_list(&value),
            "LANGUAGE" => capabilities.language = value,
            "OWNER" => capabilities.owner = value,
            "VERSION" => capabilities.version = value,
            _ => {}
        }
    }

    Ok(capabilities)
}

fn split_list(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}
