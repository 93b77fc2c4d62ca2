//! Status line and literal header parsing.

use super::lexer::Lexer;
use crate::Result;
use crate::types::{ResponseCode, Status};

/// Message part of a status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    /// Message sent inline as a quoted string (empty if omitted).
    Text(String),
    /// Message follows as a literal of the given byte length.
    Literal(usize),
}

/// Parsed terminal line of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Outcome.
    pub status: Status,
    /// Response code, if present.
    pub code: Option<ResponseCode>,
    /// Message or pointer to a following literal.
    pub message: StatusMessage,
}

/// Splits off the status keyword if this line terminates a response.
///
/// Returns `None` for content lines. The keyword must be followed by a
/// space or the end of the line.
#[must_use]
pub fn status_keyword(line: &str) -> Option<(Status, &str)> {
    [Status::Ok, Status::No, Status::Bye]
        .into_iter()
        .find_map(|status| {
            let keyword = status.as_str();
            let head = line.get(..keyword.len())?;
            if !head.eq_ignore_ascii_case(keyword) {
                return None;
            }
            let rest = &line[keyword.len()..];
            (rest.is_empty() || rest.starts_with(' ')).then_some((status, rest))
        })
}

/// Parses a status line, or returns `None` if the line is content.
///
/// Grammar: `("OK" / "NO" / "BYE") [SP "(" code [SP arg] ")"] [SP string]`
/// where `string` is a quoted string or a literal header.
///
/// # Errors
///
/// Returns an error if the response code or message is malformed.
pub fn parse_status_line(line: &str) -> Option<Result<StatusLine>> {
    let (status, rest) = status_keyword(line)?;
    Some(parse_status_rest(status, rest))
}

fn parse_status_rest(status: Status, rest: &str) -> Result<StatusLine> {
    let mut lexer = Lexer::new(rest);
    lexer.skip_spaces();

    let code = if lexer.peek() == Some(b'(') {
        let code = parse_response_code(&mut lexer)?;
        lexer.skip_spaces();
        Some(code)
    } else {
        None
    };

    let message = match lexer.peek() {
        None => StatusMessage::Text(String::new()),
        Some(b'"') => {
            let text = lexer.read_quoted()?;
            lexer.skip_spaces();
            lexer.expect_eof()?;
            StatusMessage::Text(text)
        }
        Some(b'{') => match parse_literal_header(lexer.remaining()) {
            Some(len) => StatusMessage::Literal(len),
            None => return Err(lexer.error("Malformed literal header")),
        },
        Some(_) => return Err(lexer.error("Expected quoted string")),
    };

    Ok(StatusLine {
        status,
        code,
        message,
    })
}

/// Parses `"(" name [SP argument] ")"`.
fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.advance(); // Skip (

    let name = lexer.read_atom()?;
    let argument = if lexer.skip_spaces() && lexer.peek() != Some(b')') {
        let arg = if lexer.peek() == Some(b'"') {
            lexer.read_quoted()?
        } else {
            lexer.read_atom()?.to_string()
        };
        lexer.skip_spaces();
        Some(arg)
    } else {
        None
    };

    if lexer.advance() != Some(b')') {
        return Err(lexer.error("Expected ) after response code"));
    }

    Ok(ResponseCode::from_parts(name, argument))
}

/// Parses a line that consists solely of a literal header.
///
/// Matches `{123}` and the non-synchronizing form `{123+}`.
#[must_use]
pub fn parse_literal_header(line: &str) -> Option<usize> {
    let inner = line.strip_prefix('{')?.strip_suffix('}')?;
    let digits = inner.strip_suffix('+').unwrap_or(inner);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
