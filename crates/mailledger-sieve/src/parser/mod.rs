//! Sans-I/O ManageSieve response parser.
//!
//! Everything here works on complete lines (CRLF stripped) and never touches
//! the network. The connection layer feeds lines in and reads literals when
//! a parser reports one.

mod capability;
mod lexer;
mod response;
mod script;

pub use capability::{CapabilityLine, parse_capabilities, parse_capability_line};
pub use lexer::Lexer;
pub use response::{
    StatusLine, StatusMessage, parse_literal_header, parse_status_line, status_keyword,
};
pub use script::{parse_script_body, parse_script_line, parse_script_list};

use crate::Result;

/// Decodes a complete protocol quoted string.
///
/// Surrounding whitespace is ignored; anything else outside the quotes is
/// an error.
///
/// # Errors
///
/// Returns a parse error if the input is not exactly one quoted string.
pub fn unquote(s: &str) -> Result<String> {
    let mut lexer = Lexer::new(s.trim());
    let value = lexer.read_quoted()?;
    lexer.expect_eof()?;
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::quote;
    use proptest::prelude::*;

    #[test]
    fn unquote_simple() {
        assert_eq!(unquote("\"done\"").unwrap(), "done");
        assert_eq!(unquote("  \"padded\"  ").unwrap(), "padded");
    }

    #[test]
    fn unquote_rejects_trailing_data() {
        assert!(unquote("\"a\" \"b\"").is_err());
        assert!(unquote("bare").is_err());
        assert!(unquote("").is_err());
    }

    proptest! {
        #[test]
        fn quote_then_unquote_is_identity(s in r"[^\r\n\x00]*") {
            prop_assert_eq!(unquote(&quote(&s)).unwrap(), s);
        }

        #[test]
        fn capability_decode_is_deterministic(
            implementation in "[a-zA-Z0-9 ]{0,20}",
            extensions in proptest::collection::vec("[a-z0-9.;-]{1,12}", 0..8),
            redirects in 0u32..1000,
            starttls in any::<bool>(),
        ) {
            let mut lines = vec![
                format!("\"IMPLEMENTATION\" {}", quote(&implementation)),
                format!("\"SIEVE\" {}", quote(&extensions.join(" "))),
                format!("\"MAXREDIRECTS\" \"{redirects}\""),
            ];
            if starttls {
                lines.push("\"STARTTLS\"".to_string());
            }

            let first = parse_capabilities(&lines).unwrap();
            let second = parse_capabilities(&lines).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.sieve_extensions, extensions);
            prop_assert_eq!(first.max_redirects, redirects);
            prop_assert_eq!(first.starttls, starttls);
        }
    }
}
