//! ManageSieve connection management.
//!
//! This module provides connection handling for ManageSieve servers, including:
//! - Configuration (host, port, dial timeout, TLS trust, trace sink)
//! - Plaintext stream with in-place STARTTLS upgrade
//! - Framed I/O with literal support
//! - The session client

mod client;
mod config;
mod framed;
mod stream;

pub use client::{Client, SessionState};
pub use config::{Config, ConfigBuilder, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};
pub use framed::{FramedStream, MAX_LINE_LENGTH, MAX_LITERAL_SIZE};
pub use stream::{SieveStream, TlsUpgrade, connect_plain, default_tls_config};
