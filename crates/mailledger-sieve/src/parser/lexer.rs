//! Lexer for ManageSieve response lines.
//!
//! Works on a single line with the CRLF already stripped. Quoted strings use
//! protocol escaping: only `\"` and `\\` are valid escapes.

#![allow(clippy::missing_errors_doc)]

use crate::{Error, Result};

/// Cursor over one response line.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given line.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the current position in the line.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the unconsumed remainder of the line.
    #[must_use]
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Returns true if the whole line has been consumed.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peeks at the current byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Advances by one byte and returns it.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Skips any run of spaces. Returns true if at least one was skipped.
    pub fn skip_spaces(&mut self) -> bool {
        let start = self.pos;
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
        self.pos > start
    }

    /// Consumes exactly one space.
    pub fn expect_space(&mut self) -> Result<()> {
        match self.advance() {
            Some(b' ') => Ok(()),
            _ => Err(self.error("Expected space")),
        }
    }

    /// Fails unless the whole line has been consumed.
    pub fn expect_eof(&self) -> Result<()> {
        if self.is_eof() {
            Ok(())
        } else {
            Err(self.error(&format!("Unexpected trailing data: {}", self.remaining())))
        }
    }

    /// Reads a quoted string, returning its unescaped contents.
    pub fn read_quoted(&mut self) -> Result<String> {
        if self.peek() != Some(b'"') {
            return Err(self.error("Expected quoted string"));
        }
        self.advance();

        let mut result = Vec::new();

        loop {
            match self.advance() {
                Some(b'"') => break,
                Some(b'\\') => match self.advance() {
                    Some(c @ (b'"' | b'\\')) => result.push(c),
                    Some(c) => {
                        return Err(self.error(&format!("Invalid escape: \\{}", c as char)));
                    }
                    None => return Err(self.error("Unexpected end of line in quoted string")),
                },
                Some(b'\r' | b'\n') => {
                    return Err(self.error("Line break in quoted string"));
                }
                Some(c) => result.push(c),
                None => return Err(self.error("Unexpected end of line in quoted string")),
            }
        }

        String::from_utf8(result).map_err(|_| self.error("Invalid UTF-8 in quoted string"))
    }

    /// Reads an atom: a run of bytes up to a space, `(`, `)` or `"`.
    pub fn read_atom(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b' ' | b'(' | b')' | b'"') || b.is_ascii_control() {
                break;
            }
            self.pos += 1;
        }

        if self.pos == start {
            return Err(self.error("Expected atom"));
        }
        Ok(&self.input[start..self.pos])
    }

    /// Creates a parse error at the current position.
    pub fn error(&self, message: &str) -> Error {
        Error::parse(self.pos, message)
    }
}
