//! Command serialization helpers.

use crate::crlf::ensure_crlf;

/// Writes a protocol quoted string, escaping `"` and `\`.
pub fn write_quoted(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(quote(s).as_bytes());
}

/// Returns `s` as a protocol quoted string.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Writes a decimal number argument.
pub fn write_number(buf: &mut Vec<u8>, n: u64) {
    buf.extend_from_slice(n.to_string().as_bytes());
}

/// Writes a non-synchronizing literal: `{n+}` CRLF followed by the payload.
///
/// The payload is CRLF-normalized first; `n` counts the normalized bytes.
pub fn write_literal(buf: &mut Vec<u8>, data: &[u8]) {
    let data = ensure_crlf(data);
    buf.extend_from_slice(format!("{{{}+}}\r\n", data.len()).as_bytes());
    buf.extend_from_slice(&data);
}

/// Returns the byte length a payload will have on the wire.
#[must_use]
pub fn literal_len(data: &[u8]) -> usize {
    ensure_crlf(data).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_plain() {
        let mut buf = Vec::new();
        write_quoted(&mut buf, "inbox-rules");
        assert_eq!(buf, b"\"inbox-rules\"");
    }

    #[test]
    fn quoted_escapes() {
        assert_eq!(quote(r#"a "b" \c"#), r#""a \"b\" \\c""#);
        assert_eq!(quote(""), "\"\"");
    }

    #[test]
    fn quoted_utf8() {
        assert_eq!(quote("règles"), "\"règles\"");
    }

    #[test]
    fn numbers() {
        let mut buf = Vec::new();
        write_number(&mut buf, 4096);
        assert_eq!(buf, b"4096");
    }

    #[test]
    fn literal_counts_normalized_bytes() {
        let mut buf = Vec::new();
        write_literal(&mut buf, b"keep;\nstop;\n");
        assert_eq!(buf, b"{14+}\r\nkeep;\r\nstop;\r\n");
        assert_eq!(literal_len(b"keep;\nstop;\n"), 14);
    }

    #[test]
    fn empty_literal() {
        let mut buf = Vec::new();
        write_literal(&mut buf, b"");
        assert_eq!(buf, b"{0+}\r\n");
    }
}
