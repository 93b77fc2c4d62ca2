//! Line ending normalization for script payloads.
//!
//! Literal lengths count transmitted bytes, so a script must be in its
//! final wire form before the `{n+}` header is computed.

/// Rewrites every line terminator in `data` to exactly one CRLF.
///
/// `LF`, `CR` and `CRLF` are each treated as a single terminator. All other
/// bytes are copied unchanged, and content without terminators is returned
/// as-is. Applying the function twice yields the same bytes as applying it
/// once.
#[must_use]
pub fn ensure_crlf(data: &[u8]) -> Vec<u8> {
    let extra = data.iter().filter(|&&b| b == b'\n' || b == b'\r').count();
    let mut out = Vec::with_capacity(data.len() + extra);

    let mut bytes = data.iter().copied().peekable();
    while let Some(b) = bytes.next() {
        match b {
            b'\r' => {
                bytes.next_if_eq(&b'\n');
                out.extend_from_slice(b"\r\n");
            }
            b'\n' => out.extend_from_slice(b"\r\n"),
            _ => out.push(b),
        }
    }

    out
}
