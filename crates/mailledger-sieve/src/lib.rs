//! # mailledger-sieve
//!
//! An async ManageSieve client library implementing RFC 5804.
//!
//! ManageSieve is the protocol mail servers expose for uploading, listing,
//! activating and deleting the Sieve scripts that filter a user's mail.
//!
//! ## Features
//!
//! - **Full command set**: AUTHENTICATE (PLAIN), STARTTLS, CAPABILITY,
//!   HAVESPACE, PUTSCRIPT, LISTSCRIPTS, SETACTIVE, GETSCRIPT, DELETESCRIPT,
//!   RENAMESCRIPT, CHECKSCRIPT, NOOP, UNAUTHENTICATE, LOGOUT
//! - **STARTTLS via rustls**: in-place upgrade with capability renegotiation
//! - **Response codes**: QUOTA, NONEXISTENT, ACTIVE, WARNINGS, TAG and the
//!   rest of RFC 5804 §1.3 are decoded and carried by errors
//! - **Literal-aware reader**: script bodies are read by length, never by
//!   scanning for status lines
//! - **Sans-I/O parser**: protocol parsing separated from network I/O
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailledger_sieve::{Client, Config};
//!
//! #[tokio::main]
//! async fn main() -> mailledger_sieve::Result<()> {
//!     let config = Config::new("sieve.example.com");
//!     let mut client = Client::connect(&config).await?;
//!
//!     if client.capabilities().starttls {
//!         client.start_tls().await?;
//!     }
//!     client.login("user@example.com", "password").await?;
//!
//!     client.put_script("vacation", b"require \"vacation\";\nvacation \"Away\";\n").await?;
//!     client.set_active("vacation").await?;
//!
//!     let (scripts, _) = client.list_scripts().await?;
//!     for script in &scripts {
//!         println!("{}{}", script.name, if script.active { " (active)" } else { "" });
//!     }
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Session States
//!
//! ```text
//! ┌─────────────┐
//! │  Connected  │ ─── start_tls() ───→ TlsUpgraded
//! └─────────────┘
//!        │                                  │
//!        └────────── login() ───────────────┴───→ Authenticated
//!
//! logout() / close() / BYE / I/O error ───→ Closed
//! ```
//!
//! States are reported by [`Client::state`] but never enforced; the server
//! rejects commands that are invalid in the current state.
//!
//! ## Modules
//!
//! - [`command`]: ManageSieve command builders
//! - [`connection`]: Connection management and the session client
//! - [`crlf`]: Line ending normalization for script payloads
//! - [`parser`]: Sans-I/O response parser
//! - [`trace`]: Wire-level diagnostics
//! - [`types`]: Core ManageSieve types (capabilities, scripts, responses)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
pub mod crlf;
mod error;
pub mod parser;
pub mod trace;
pub mod types;

pub use command::Command;
pub use connection::{
    Client, Config, ConfigBuilder, SessionState, SieveStream, TlsUpgrade, DEFAULT_PORT,
};
pub use error::{Error, Result};
pub use trace::{NoopSink, TraceSink, TracingSink};
pub use types::{Capabilities, Response, ResponseCode, Script, ScriptName, Status};

/// ManageSieve protocol version supported.
pub const MANAGESIEVE_VERSION: &str = "ManageSieve 1.0 (RFC 5804)";
