//! LISTSCRIPTS and GETSCRIPT response decoding.

use super::lexer::Lexer;
use super::response::parse_literal_header;
use crate::types::Script;
use crate::{Error, Result};

/// Parses one LISTSCRIPTS line: `"name"` optionally followed by ` ACTIVE`.
///
/// # Errors
///
/// Returns an error if the name is not a valid quoted string or anything
/// other than `ACTIVE` follows it.
pub fn parse_script_line(line: &str) -> Result<Script> {
    let mut lexer = Lexer::new(line.trim_end());
    let name = lexer.read_quoted()?;

    let active = if lexer.skip_spaces() {
        let position = lexer.position();
        let keyword = lexer.read_atom()?;
        if !keyword.eq_ignore_ascii_case("ACTIVE") {
            return Err(Error::parse(
                position,
                format!("Unexpected script flag: {keyword}"),
            ));
        }
        true
    } else {
        false
    };
    lexer.expect_eof()?;

    Ok(Script { name, active })
}

/// Decodes every line of a LISTSCRIPTS response.
///
/// # Errors
///
/// Fails on the first malformed line; no partial listing is returned.
pub fn parse_script_list<S: AsRef<str>>(lines: &[S]) -> Result<Vec<Script>> {
    lines
        .iter()
        .map(|line| parse_script_line(line.as_ref()))
        .collect()
}

/// Validates a GETSCRIPT response and returns the script body lines.
///
/// The first content line must be a bare literal header (`{n}` or `{n+}`),
/// and `n` must equal the byte length of the remaining lines joined with
/// CRLF, with or without one trailing CRLF.
///
/// # Errors
///
/// Returns a protocol error if the header is missing or malformed, or if the
/// declared length does not match the body.
pub fn parse_script_body(lines: &[String]) -> Result<&[String]> {
    let (header, body) = lines
        .split_first()
        .ok_or_else(|| Error::Protocol("GETSCRIPT response has no content".into()))?;

    let declared = parse_literal_header(header).ok_or_else(|| {
        Error::Protocol(format!("unexpected response content format: {header:?}"))
    })?;

    let joined = body.iter().map(String::len).sum::<usize>() + 2 * body.len().saturating_sub(1);
    if declared != joined && declared != joined + 2 {
        return Err(Error::Protocol(format!(
            "script literal declares {declared} bytes but {joined} were received"
        )));
    }

    Ok(body)
}
