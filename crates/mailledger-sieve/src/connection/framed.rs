//! Framed I/O for the ManageSieve protocol.
//!
//! ManageSieve uses CRLF-terminated lines; a line consisting solely of
//! `{n}` or `{n+}` announces `n` raw bytes that follow. This module
//! provides buffered line reading, literal reading and command writing,
//! and assembles complete responses on top of them.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::parser::{StatusMessage, parse_literal_header, parse_status_line};
use crate::trace::TraceSink;
use crate::types::Response;
use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
pub const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Maximum literal size to prevent memory exhaustion.
pub const MAX_LITERAL_SIZE: usize = 16 * 1024 * 1024; // 16 MB

/// Framed connection for the ManageSieve protocol.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    line: BytesMut,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            line: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
        }
    }

    /// Reads one line with its terminator stripped.
    ///
    /// Lines end at LF; a CR directly before it is removed as well. A
    /// closed stream is reported as `UnexpectedEof`.
    pub async fn read_line(&mut self) -> Result<String> {
        self.line.clear();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }

            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                self.line.extend_from_slice(&buf[..pos]);
                self.reader.consume(pos + 1);
                break;
            }

            let len = buf.len();
            self.line.extend_from_slice(buf);
            self.reader.consume(len);

            if self.line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
        }

        if self.line.len() > MAX_LINE_LENGTH {
            return Err(Error::Protocol("line too long".to_string()));
        }
        if self.line.last() == Some(&b'\r') {
            self.line.truncate(self.line.len() - 1);
        }

        std::str::from_utf8(&self.line)
            .map(ToString::to_string)
            .map_err(|_| Error::Protocol("response line is not valid UTF-8".to_string()))
    }

    /// Reads exactly `len` bytes of literal data.
    pub async fn read_literal(&mut self, len: usize) -> Result<Vec<u8>> {
        // Validate literal size to prevent DoS via memory exhaustion
        if len > MAX_LITERAL_SIZE {
            return Err(Error::Protocol(format!(
                "literal too large: {len} bytes (max {MAX_LITERAL_SIZE})"
            )));
        }

        let mut literal = vec![0u8; len];
        self.reader.read_exact(&mut literal).await?;
        Ok(literal)
    }

    /// Reads one complete response.
    ///
    /// Content lines are collected until an `OK`, `NO` or `BYE` status line.
    /// Literals are read by length, so their content can never be mistaken
    /// for a status line. Every line read is handed to `sink`.
    pub async fn read_response(&mut self, sink: &dyn TraceSink) -> Result<Response> {
        let mut lines = Vec::new();

        loop {
            let line = self.read_line().await?;
            sink.trace(&format!("<<< {line}"));

            if let Some(status) = parse_status_line(&line) {
                let status = status?;
                let message = match status.message {
                    StatusMessage::Text(text) => text,
                    StatusMessage::Literal(len) => {
                        let text = self.read_literal_text(len, sink).await?;
                        self.expect_literal_end().await?;
                        text
                    }
                };
                return Ok(Response {
                    lines,
                    status: status.status,
                    code: status.code,
                    message,
                });
            }

            let literal = parse_literal_header(&line);
            lines.push(line);

            if let Some(len) = literal {
                let text = self.read_literal_text(len, sink).await?;
                let text = text.strip_suffix("\r\n").unwrap_or(&text);
                if !text.is_empty() {
                    lines.extend(text.split("\r\n").map(ToString::to_string));
                }
                self.expect_literal_end().await?;
            }
        }
    }

    async fn read_literal_text(&mut self, len: usize, sink: &dyn TraceSink) -> Result<String> {
        let data = self.read_literal(len).await?;
        let text = String::from_utf8(data)
            .map_err(|_| Error::Protocol("literal is not valid UTF-8".to_string()))?;
        for line in text.lines() {
            sink.trace(&format!("<<< {line}"));
        }
        Ok(text)
    }

    /// Consumes the CRLF that closes the line a literal was embedded in.
    async fn expect_literal_end(&mut self) -> Result<()> {
        let rest = self.read_line().await?;
        if rest.is_empty() {
            Ok(())
        } else {
            Err(Error::Protocol(format!(
                "unexpected data after literal: {rest:?}"
            )))
        }
    }

    /// Writes raw bytes and flushes.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    /// Returns true if bytes have been received but not yet consumed.
    #[must_use]
    pub fn has_buffered_data(&self) -> bool {
        !self.reader.buffer().is_empty()
    }

    /// Shuts down the write half of the stream.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.reader.get_mut().shutdown().await?;
        Ok(())
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// Consumes the framed stream and returns the inner stream.
    ///
    /// Note: Any buffered data will be lost. Check
    /// [`has_buffered_data`](Self::has_buffered_data) first.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;
    use crate::trace::NoopSink;
    use crate::trace::tests::RecordingSink;
    use crate::types::{ResponseCode, Status};

    #[tokio::test]
    async fn test_read_line_strips_terminators() {
        let mock = Builder::new().read(b"\"SIEVE\" \"fileinto\"\r\nOK\n").build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), "\"SIEVE\" \"fileinto\"");
        assert_eq!(framed.read_line().await.unwrap(), "OK");
    }

    #[tokio::test]
    async fn test_read_line_across_chunks() {
        let mock = Builder::new().read(b"\"IMPLEMEN").read(b"TATION\"\r\n").build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), "\"IMPLEMENTATION\"");
    }

    #[tokio::test]
    async fn test_read_line_eof() {
        let mock = Builder::new().read(b"partial").build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_line().await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[tokio::test]
    async fn test_read_line_rejects_invalid_utf8() {
        let mock = Builder::new().read(b"\xff\xfe\r\n").build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_line().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_line_length_limit() {
        // Create a line longer than MAX_LINE_LENGTH
        let long_line = "A".repeat(MAX_LINE_LENGTH + 100);
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let mut framed = FramedStream::new(mock);

        let result = framed.read_line().await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("line too long"));
    }

    #[tokio::test]
    async fn test_response_ok_with_content() {
        let mock = Builder::new()
            .read(b"\"IMPLEMENTATION\" \"Example\"\r\n")
            .read(b"\"VERSION\" \"1.0\"\r\n")
            .read(b"OK \"done\"\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response(&NoopSink).await.unwrap();
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.message, "done");
        assert_eq!(
            response.lines,
            vec!["\"IMPLEMENTATION\" \"Example\"", "\"VERSION\" \"1.0\""]
        );
    }

    #[tokio::test]
    async fn test_response_no() {
        let mock = Builder::new()
            .read(b"\"ignored\"\r\nNO \"quota exceeded\"\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response(&NoopSink).await.unwrap();
        assert_eq!(response.status, Status::No);
        let err = response.into_result().unwrap_err();
        assert!(matches!(err, Error::No { ref message, .. } if message == "quota exceeded"));
    }

    #[tokio::test]
    async fn test_response_bye_with_code() {
        let mock = Builder::new()
            .read(b"BYE (REFERRAL \"sieve://other.example.com\") \"shutting down\"\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response(&NoopSink).await.unwrap();
        assert_eq!(response.status, Status::Bye);
        assert_eq!(response.message, "shutting down");
        assert_eq!(
            response.code,
            Some(ResponseCode::Referral("sieve://other.example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn test_response_bare_ok() {
        let mock = Builder::new().read(b"OK\r\n").build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response(&NoopSink).await.unwrap();
        assert!(response.is_ok());
        assert!(response.message.is_empty());
        assert!(response.lines.is_empty());
    }

    #[tokio::test]
    async fn test_response_unquoted_message_is_parse_error() {
        let mock = Builder::new().read(b"OK done\r\n").build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_response(&NoopSink).await.unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[tokio::test]
    async fn test_response_with_literal() {
        // Script lines that look like status lines stay content.
        let script = "OK;\r\nNO\r\nkeep;\r\n";
        let mock = Builder::new()
            .read(format!("{{{}}}\r\n", script.len()).as_bytes())
            .read(script.as_bytes())
            .read(b"\r\nOK \"getscript done\"\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response(&NoopSink).await.unwrap();
        assert_eq!(response.message, "getscript done");
        assert_eq!(response.lines, vec!["{16}", "OK;", "NO", "keep;"]);
    }

    #[tokio::test]
    async fn test_response_with_empty_literal() {
        let mock = Builder::new().read(b"{0}\r\n\r\nOK\r\n").build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response(&NoopSink).await.unwrap();
        assert_eq!(response.lines, vec!["{0}"]);
    }

    #[tokio::test]
    async fn test_literal_must_end_line() {
        let mock = Builder::new().read(b"{4}\r\nkeepjunk\r\n").build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_response(&NoopSink).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_status_message_literal() {
        let mock = Builder::new()
            .read(b"NO {11}\r\n")
            .read(b"line 1: bad")
            .read(b"\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response(&NoopSink).await.unwrap();
        assert_eq!(response.status, Status::No);
        assert_eq!(response.message, "line 1: bad");
    }

    #[tokio::test]
    async fn test_literal_size_validation() {
        // Test that excessively large literals are rejected
        let literal_size = MAX_LITERAL_SIZE + 1;
        let header = format!("{{{literal_size}}}\r\n");

        let mock = Builder::new().read(header.as_bytes()).build();
        let mut framed = FramedStream::new(mock);

        let result = framed.read_response(&NoopSink).await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("literal too large")
        );
    }

    #[tokio::test]
    async fn test_eof_mid_response_discards_content() {
        let mock = Builder::new().read(b"\"SIEVE\" \"fileinto\"\r\n").build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_response(&NoopSink).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_response_lines_are_traced() {
        let mock = Builder::new().read(b"\"VERSION\" \"1.0\"\r\nOK\r\n").build();
        let mut framed = FramedStream::new(mock);
        let sink = RecordingSink::default();

        framed.read_response(&sink).await.unwrap();
        assert_eq!(sink.lines(), vec!["<<< \"VERSION\" \"1.0\"", "<<< OK"]);
    }

    #[tokio::test]
    async fn test_write_raw() {
        let mock = Builder::new().write(b"CAPABILITY\r\n").build();
        let mut framed = FramedStream::new(mock);

        framed.write_raw(b"CAPABILITY\r\n").await.unwrap();
    }

    #[tokio::test]
    async fn test_buffered_data() {
        let mock = Builder::new().read(b"OK\r\nextra\r\n").build();
        let mut framed = FramedStream::new(mock);

        assert!(!framed.has_buffered_data());
        framed.read_line().await.unwrap();
        assert!(framed.has_buffered_data());
        framed.read_line().await.unwrap();
        assert!(!framed.has_buffered_data());
    }
}
