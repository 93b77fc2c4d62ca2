//! Wire-level diagnostics.
//!
//! Every line the client writes or reads is handed to a [`TraceSink`] as
//! `>>> <command>` or `<<< <line>`. Credentials are masked before they reach
//! the sink and literal payloads are reduced to their `{n+}` header.
//!
//! # Example
//!
//! ```ignore
//! use mailledger_sieve::{Config, TraceSink};
//! use std::sync::Arc;
//!
//! struct Stderr;
//!
//! impl TraceSink for Stderr {
//!     fn trace(&self, line: &str) {
//!         eprintln!("DEBUG: {line}");
//!     }
//! }
//!
//! let config = Config::builder("sieve.example.com").sink(Arc::new(Stderr)).build();
//! ```

/// Receiver for formatted wire trace lines.
pub trait TraceSink: Send + Sync {
    /// Called once per traced line, without a trailing newline.
    fn trace(&self, line: &str);
}

/// A sink that discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn trace(&self, _line: &str) {}
}

/// A sink that forwards lines to `tracing` at TRACE level.
///
/// Lines are emitted on the `mailledger_sieve::wire` target so they can be
/// enabled separately, e.g. `RUST_LOG=mailledger_sieve::wire=trace`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn trace(&self, line: &str) {
        tracing::trace!(target: "mailledger_sieve::wire", "{line}");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Sink that records lines for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub lines: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        pub fn lines(&self) -> Vec<String> {
            self.lines.lock().map(|l| l.clone()).unwrap_or_default()
        }
    }

    impl TraceSink for RecordingSink {
        fn trace(&self, line: &str) {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push(line.to_string());
            }
        }
    }

    #[test]
    fn noop_sink_accepts_lines() {
        NoopSink.trace(">>> CAPABILITY");
    }

    #[test]
    fn tracing_sink_accepts_lines() {
        TracingSink.trace("<<< OK");
    }

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::default();
        sink.trace("one");
        sink.trace("two");
        assert_eq!(sink.lines(), vec!["one", "two"]);
    }
}
