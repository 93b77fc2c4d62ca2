//! ManageSieve session client.
//!
//! A [`Client`] owns one connection and runs one command at a time. Every
//! operation takes `&mut self` and completes only after the server's status
//! line has been read, so commands can never overlap.
//!
//! The session moves through [`SessionState`]s as commands succeed:
//!
//! - `Connected`: after the greeting, in cleartext
//! - `TlsUpgraded`: after STARTTLS
//! - `Authenticated`: after a successful login
//! - `Closed`: after LOGOUT, [`Client::close`], a BYE or an I/O failure
//!
//! States are tracked for the caller's benefit only. Nothing is refused
//! client-side; the server decides which commands are valid.

#![allow(clippy::missing_errors_doc)]

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use super::Config;
use super::framed::FramedStream;
use super::stream::{SieveStream, TlsUpgrade, connect_plain, default_tls_config};
use crate::command::Command;
use crate::parser::{parse_script_body, parse_script_list};
use crate::trace::TraceSink;
use crate::types::{
    Capabilities, Response, ResponseCode, Script, ScriptName, Status, validate_quotable,
};
use crate::{Error, Result};

/// Lifecycle of a ManageSieve session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Greeting received, connection in cleartext.
    Connected,
    /// STARTTLS completed.
    TlsUpgraded,
    /// Login succeeded.
    Authenticated,
    /// Connection released; every further command fails.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connected => "connected",
            Self::TlsUpgraded => "tls-upgraded",
            Self::Authenticated => "authenticated",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// ManageSieve client connection.
pub struct Client<S> {
    stream: Option<FramedStream<S>>,
    capabilities: Capabilities,
    state: SessionState,
    is_tls: bool,
    host: String,
    tls_config: Option<Arc<rustls::ClientConfig>>,
    sink: Arc<dyn TraceSink>,
}

// Manual Debug implementation since FramedStream doesn't implement Debug
impl<S> fmt::Debug for Client<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("state", &self.state)
            .field("is_tls", &self.is_tls)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl Client<SieveStream> {
    /// Dials the configured server and reads its greeting.
    ///
    /// The greeting carries the initial capabilities, which are decoded
    /// before this returns.
    pub async fn connect(config: &Config) -> Result<Self> {
        let stream = connect_plain(config).await?;
        Self::from_stream(stream, config).await
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client over an already connected stream and reads the greeting.
    pub async fn from_stream(stream: S, config: &Config) -> Result<Self> {
        let mut client = Self {
            stream: Some(FramedStream::new(stream)),
            capabilities: Capabilities::default(),
            state: SessionState::Connected,
            is_tls: false,
            host: config.host.clone(),
            tls_config: config.tls_config.clone(),
            sink: Arc::clone(&config.sink),
        };
        client.read_capabilities().await?;
        Ok(client)
    }

    /// Returns the most recently negotiated capabilities.
    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Returns the current session state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true once STARTTLS has completed.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        self.is_tls
    }

    /// Sends a command and reads its complete response.
    ///
    /// `NO` and `BYE` are returned as a [`Response`] rather than an error,
    /// so the caller can inspect the status, code and content lines. A `BYE`
    /// still closes the session.
    ///
    /// String arguments are checked with [`Command::validate`] before anything
    /// is sent.
    pub async fn execute(&mut self, command: &Command) -> Result<Response> {
        command.validate()?;
        self.send(command).await?;
        self.read_response().await
    }

    /// Upgrades the connection with STARTTLS and renegotiates capabilities.
    ///
    /// Returns the server's message for the STARTTLS command.
    pub async fn start_tls(&mut self) -> Result<String>
    where
        S: TlsUpgrade,
    {
        let response = self.command(&Command::StartTls).await?;

        let framed = self.stream.take().ok_or_else(not_connected)?;
        if framed.has_buffered_data() {
            self.release();
            return Err(Error::Protocol(
                "server sent data before the TLS handshake".to_string(),
            ));
        }

        let config = self.tls_config.clone().unwrap_or_else(default_tls_config);
        let stream = match framed.into_inner().upgrade_to_tls(&self.host, config).await {
            Ok(stream) => stream,
            Err(e) => {
                self.release();
                return Err(e);
            }
        };

        self.stream = Some(FramedStream::new(stream));
        self.is_tls = true;
        self.set_state(SessionState::TlsUpgraded);

        // The server re-advertises its capabilities unprompted. The cleartext
        // set no longer applies, even if the new one fails to decode.
        self.capabilities = Capabilities::default();
        self.read_capabilities().await?;
        Ok(response.message)
    }

    /// Authenticates with SASL PLAIN.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<String> {
        validate_quotable("username", username)?;
        validate_quotable("password", password)?;

        let response = self
            .command(&Command::authenticate_plain(username, password))
            .await?;
        self.set_state(SessionState::Authenticated);
        Ok(response.message)
    }

    /// Re-queries the server's capabilities and replaces the stored set.
    pub async fn capability(&mut self) -> Result<String> {
        self.send(&Command::Capability).await?;
        self.read_capabilities().await
    }

    /// Asks whether a script of `size` bytes named `name` would be accepted.
    ///
    /// A refusal is reported as [`Error::No`], usually with a quota response code.
    pub async fn have_space(&mut self, name: &str, size: u64) -> Result<String> {
        let name = ScriptName::new(name)?;
        let response = self.command(&Command::HaveSpace { name, size }).await?;
        Ok(response.message)
    }

    /// Lists the scripts stored for the authenticated user.
    pub async fn list_scripts(&mut self) -> Result<(Vec<Script>, String)> {
        let response = self.command(&Command::ListScripts).await?;
        let scripts = parse_script_list(&response.lines)?;
        Ok((scripts, response.message))
    }

    /// Uploads a script. Line endings are normalized to CRLF before sending.
    pub async fn put_script(&mut self, name: &str, script: &[u8]) -> Result<String> {
        let name = ScriptName::new(name)?;
        let command = Command::PutScript {
            name,
            script: script.to_vec(),
        };
        let response = self.command(&command).await?;
        Ok(response.message)
    }

    /// Downloads a script and returns its lines.
    pub async fn get_script(&mut self, name: &str) -> Result<(Vec<String>, String)> {
        let name = ScriptName::new(name)?;
        let response = self.command(&Command::GetScript { name }).await?;
        let body = parse_script_body(&response.lines)?.to_vec();
        Ok((body, response.message))
    }

    /// Makes `name` the active script. An empty name deactivates all scripts.
    pub async fn set_active(&mut self, name: &str) -> Result<String> {
        let name = if name.is_empty() {
            None
        } else {
            Some(ScriptName::new(name)?)
        };
        let response = self.command(&Command::SetActive { name }).await?;
        Ok(response.message)
    }

    /// Deactivates whichever script is active.
    pub async fn deactivate(&mut self) -> Result<String> {
        self.set_active("").await
    }

    /// Deletes a script. The server refuses to delete the active script.
    pub async fn delete_script(&mut self, name: &str) -> Result<String> {
        let name = ScriptName::new(name)?;
        let response = self.command(&Command::DeleteScript { name }).await?;
        Ok(response.message)
    }

    /// Renames a script.
    pub async fn rename_script(&mut self, from: &str, to: &str) -> Result<String> {
        let command = Command::RenameScript {
            from: ScriptName::new(from)?,
            to: ScriptName::new(to)?,
        };
        let response = self.command(&command).await?;
        Ok(response.message)
    }

    /// Asks the server to validate a script without storing it.
    pub async fn check_script(&mut self, script: &[u8]) -> Result<String> {
        let command = Command::CheckScript {
            script: script.to_vec(),
        };
        let response = self.command(&command).await?;
        Ok(response.message)
    }

    /// Sends NOOP, optionally with a tag the server echoes back.
    ///
    /// An echoed tag that differs from the one sent means the response stream
    /// is out of sync and is reported as a protocol error.
    pub async fn noop(&mut self, tag: Option<&str>) -> Result<String> {
        let command = Command::Noop {
            tag: tag.map(ToString::to_string),
        };
        let response = self.command(&command).await?;

        if let (Some(sent), Some(ResponseCode::Tag(echoed))) = (tag, &response.code)
            && sent != echoed
        {
            return Err(Error::Protocol(format!(
                "NOOP tag mismatch: sent {sent:?}, got {echoed:?}"
            )));
        }

        Ok(response.message)
    }

    /// Drops authentication and returns to the pre-login state.
    pub async fn unauthenticate(&mut self) -> Result<String> {
        let response = self.command(&Command::Unauthenticate).await?;
        let state = if self.is_tls {
            SessionState::TlsUpgraded
        } else {
            SessionState::Connected
        };
        self.set_state(state);
        Ok(response.message)
    }

    /// Ends the session and closes the connection.
    ///
    /// The server may answer with either `OK` or `BYE`; both count as success.
    pub async fn logout(&mut self) -> Result<String> {
        let response = self.execute(&Command::Logout).await?;
        match response.status {
            Status::Ok | Status::Bye => {
                self.close().await;
                Ok(response.message)
            }
            Status::No => response.into_result().map(|r| r.message),
        }
    }

    /// Releases the connection. Safe to call any number of times.
    pub async fn close(&mut self) {
        if let Some(mut framed) = self.stream.take()
            && let Err(e) = framed.shutdown().await
        {
            tracing::debug!(error = %e, "shutdown failed");
        }
        self.set_state(SessionState::Closed);
    }

    /// Sends a command and turns `NO`/`BYE` into errors.
    async fn command(&mut self, command: &Command) -> Result<Response> {
        self.execute(command).await?.into_result()
    }

    /// Reads a response that carries capabilities and stores them.
    async fn read_capabilities(&mut self) -> Result<String> {
        let response = self.read_response().await?.into_result()?;
        self.capabilities = Capabilities::parse(&response.lines)?;
        tracing::debug!(
            implementation = %self.capabilities.implementation,
            starttls = self.capabilities.starttls,
            "capabilities negotiated"
        );
        Ok(response.message)
    }

    async fn send(&mut self, command: &Command) -> Result<()> {
        let data = command.serialize();
        self.sink.trace(&format!(">>> {command}"));

        let framed = self.stream.as_mut().ok_or_else(not_connected)?;
        let result = framed.write_raw(&data).await;
        self.check(result)
    }

    async fn read_response(&mut self) -> Result<Response> {
        let sink = Arc::clone(&self.sink);
        let framed = self.stream.as_mut().ok_or_else(not_connected)?;
        let result = framed.read_response(sink.as_ref()).await;

        // Anything left of a response that could not be read would be taken
        // as the reply to the next command.
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "response unreadable, dropping connection");
                self.release();
                return Err(e);
            }
        };

        if response.status == Status::Bye {
            tracing::warn!(message = %response.message, "server closed the session");
            self.release();
        }
        Ok(response)
    }

    /// Releases the transport if `result` failed at the I/O level.
    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result
            && e.is_fatal()
        {
            tracing::debug!(error = %e, "connection lost");
            self.release();
        }
        result
    }

    fn release(&mut self) {
        self.stream = None;
        self.set_state(SessionState::Closed);
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            tracing::debug!(from = %self.state, to = %state, "session state changed");
            self.state = state;
        }
    }
}

fn not_connected() -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::NotConnected,
        "connection is closed",
    ))
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
    use tokio_test::io::{Builder, Mock};

    use super::*;
    use crate::trace::NoopSink;
    use crate::trace::tests::RecordingSink;

    const GREETING: &[u8] = b"\"IMPLEMENTATION\" \"Example Sieve\"\r\n\
\"SASL\" \"PLAIN\"\r\n\
\"SIEVE\" \"fileinto vacation\"\r\n\
\"STARTTLS\"\r\n\
\"VERSION\" \"1.0\"\r\n\
OK \"ready\"\r\n";

    impl TlsUpgrade for Mock {
        async fn upgrade_to_tls(
            self,
            _host: &str,
            _config: Arc<rustls::ClientConfig>,
        ) -> Result<Self> {
            Ok(self)
        }
    }

    fn config() -> Config {
        Config::builder("sieve.example.com")
            .sink(Arc::new(NoopSink))
            .build()
    }

    async fn connect(mock: Mock) -> Client<Mock> {
        Client::from_stream(mock, &config()).await.unwrap()
    }

    #[tokio::test]
    async fn test_greeting_sets_capabilities() {
        let mock = Builder::new().read(GREETING).build();
        let client = connect(mock).await;

        assert_eq!(client.state(), SessionState::Connected);
        assert!(!client.is_tls());
        let caps = client.capabilities();
        assert_eq!(caps.implementation, "Example Sieve");
        assert_eq!(caps.sasl_mechanisms, vec!["PLAIN"]);
        assert_eq!(caps.sieve_extensions, vec!["fileinto", "vacation"]);
        assert!(caps.starttls);
        assert_eq!(caps.version, "1.0");
    }

    #[tokio::test]
    async fn test_greeting_bye_fails() {
        let mock = Builder::new()
            .read(b"BYE \"too many connections\"\r\n")
            .build();
        let err = Client::from_stream(mock, &config()).await.unwrap_err();
        assert!(matches!(err, Error::Bye { ref message, .. } if message == "too many connections"));
    }

    #[tokio::test]
    async fn test_start_tls_renegotiates() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"STARTTLS\r\n")
            .read(b"OK \"Begin TLS negotiation now\"\r\n")
            .read(b"\"IMPLEMENTATION\" \"Example Sieve\"\r\n")
            .read(b"\"SASL\" \"PLAIN LOGIN\"\r\n\"VERSION\" \"1.0\"\r\nOK\r\n")
            .build();
        let mut client = connect(mock).await;

        let message = client.start_tls().await.unwrap();
        assert_eq!(message, "Begin TLS negotiation now");
        assert!(client.is_tls());
        assert_eq!(client.state(), SessionState::TlsUpgraded);

        let caps = client.capabilities();
        assert!(!caps.starttls);
        assert_eq!(caps.sasl_mechanisms, vec!["PLAIN", "LOGIN"]);
        // Replaced, not merged.
        assert!(caps.sieve_extensions.is_empty());
    }

    #[tokio::test]
    async fn test_start_tls_rejects_injected_data() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"STARTTLS\r\n")
            .read(b"OK\r\n\"SASL\" \"PLAIN\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let err = client.start_tls().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert_eq!(client.state(), SessionState::Closed);
        assert!(!client.is_tls());
    }

    #[tokio::test]
    async fn test_start_tls_refused() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"STARTTLS\r\n")
            .read(b"NO \"TLS unavailable\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let err = client.start_tls().await.unwrap_err();
        assert!(err.is_command_failure());
        assert_eq!(client.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_login() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"AUTHENTICATE \"PLAIN\" \"dXNlcgB1c2VyAHBhc3M=\"\r\n")
            .read(b"OK \"Logged in.\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let message = client.login("user", "pass").await.unwrap();
        assert_eq!(message, "Logged in.");
        assert_eq!(client.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_login_failure_keeps_session() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"AUTHENTICATE \"PLAIN\" \"dXNlcgB1c2VyAHBhc3M=\"\r\n")
            .read(b"NO (AUTH-TOO-WEAK) \"Authentication failed.\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let err = client.login("user", "pass").await.unwrap_err();
        assert!(err.is_command_failure());
        assert_eq!(err.response_code(), Some(&ResponseCode::AuthTooWeak));
        assert_eq!(client.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_login_rejects_nul() {
        let mock = Builder::new().read(GREETING).build();
        let mut client = connect(mock).await;

        let err = client.login("us\0er", "pass").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_capability_replaces_snapshot() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"CAPABILITY\r\n")
            .read(b"\"IMPLEMENTATION\" \"Example Sieve\"\r\n\"OWNER\" \"user\"\r\nOK \"Capability completed.\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let message = client.capability().await.unwrap();
        assert_eq!(message, "Capability completed.");
        assert_eq!(client.capabilities().owner, "user");
        assert!(!client.capabilities().starttls);
    }

    #[tokio::test]
    async fn test_list_scripts() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"LISTSCRIPTS\r\n")
            .read(b"\"inbox-rules\" ACTIVE\r\n\"archive\"\r\nOK \"Listscripts completed.\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let (scripts, message) = client.list_scripts().await.unwrap();
        assert_eq!(message, "Listscripts completed.");
        assert_eq!(
            scripts,
            vec![
                Script {
                    name: "inbox-rules".to_string(),
                    active: true,
                },
                Script {
                    name: "archive".to_string(),
                    active: false,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_list_scripts_malformed_line() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"LISTSCRIPTS\r\n")
            .read(b"\"good\"\r\nbad\r\nOK\r\n")
            .build();
        let mut client = connect(mock).await;

        let err = client.list_scripts().await.unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        // Only the exchange failed; the session is still usable.
        assert_eq!(client.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_get_script() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"GETSCRIPT \"rules\"\r\n")
            .read(b"{26}\r\nrequire \"fileinto\";\r\nkeep;")
            .read(b"\r\nOK \"Getscript completed.\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let (lines, message) = client.get_script("rules").await.unwrap();
        assert_eq!(lines, vec!["require \"fileinto\";", "keep;"]);
        assert_eq!(message, "Getscript completed.");
    }

    #[tokio::test]
    async fn test_get_script_nonexistent() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"GETSCRIPT \"missing\"\r\n")
            .read(b"NO (NONEXISTENT) \"There is no script by that name\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let err = client.get_script("missing").await.unwrap_err();
        assert_eq!(err.response_code(), Some(&ResponseCode::NonExistent));
    }

    #[tokio::test]
    async fn test_get_script_without_literal_header() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"GETSCRIPT \"rules\"\r\n")
            .read(b"keep;\r\nOK\r\n")
            .build();
        let mut client = connect(mock).await;

        let err = client.get_script("rules").await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_put_script() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"PUTSCRIPT \"rules\" {14+}\r\nkeep;\r\nstop;\r\n\r\n")
            .read(b"OK \"Putscript completed.\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let message = client.put_script("rules", b"keep;\nstop;\n").await.unwrap();
        assert_eq!(message, "Putscript completed.");
    }

    #[tokio::test]
    async fn test_put_script_rejects_bad_name() {
        let mock = Builder::new().read(GREETING).build();
        let mut client = connect(mock).await;

        let err = client.put_script("a\r\nLOGOUT", b"keep;").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(client.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_have_space_quota() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"HAVESPACE \"test3\" 4096\r\n")
            .read(b"NO (QUOTA/MAXSIZE) \"Quota exceeded\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let err = client.have_space("test3", 4096).await.unwrap_err();
        assert!(err.response_code().is_some_and(ResponseCode::is_quota));
    }

    #[tokio::test]
    async fn test_set_active_and_deactivate() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"SETACTIVE \"rules\"\r\n")
            .read(b"OK\r\n")
            .write(b"SETACTIVE \"\"\r\n")
            .read(b"OK\r\n")
            .build();
        let mut client = connect(mock).await;

        client.set_active("rules").await.unwrap();
        client.deactivate().await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_rename_check() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"RENAMESCRIPT \"old\" \"new\"\r\n")
            .read(b"OK\r\n")
            .write(b"DELETESCRIPT \"new\"\r\n")
            .read(b"NO (ACTIVE) \"You may not delete an active script\"\r\n")
            .write(b"CHECKSCRIPT {5+}\r\nkeep;\r\n")
            .read(b"OK (WARNINGS) \"line 1: consider stop\"\r\n")
            .build();
        let mut client = connect(mock).await;

        client.rename_script("old", "new").await.unwrap();

        let err = client.delete_script("new").await.unwrap_err();
        assert_eq!(err.response_code(), Some(&ResponseCode::Active));

        let message = client.check_script(b"keep;").await.unwrap();
        assert_eq!(message, "line 1: consider stop");
    }

    #[tokio::test]
    async fn test_noop_tag() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"NOOP \"sync-1\"\r\n")
            .read(b"OK (TAG \"sync-1\") \"Done\"\r\n")
            .write(b"NOOP \"sync-2\"\r\n")
            .read(b"OK (TAG \"sync-1\") \"Done\"\r\n")
            .write(b"NOOP\r\n")
            .read(b"OK\r\n")
            .build();
        let mut client = connect(mock).await;

        assert_eq!(client.noop(Some("sync-1")).await.unwrap(), "Done");

        let err = client.noop(Some("sync-2")).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));

        client.noop(None).await.unwrap();
    }

    #[tokio::test]
    async fn test_unauthenticate() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"AUTHENTICATE \"PLAIN\" \"dXNlcgB1c2VyAHBhc3M=\"\r\n")
            .read(b"OK\r\n")
            .write(b"UNAUTHENTICATE\r\n")
            .read(b"OK\r\n")
            .build();
        let mut client = connect(mock).await;

        client.login("user", "pass").await.unwrap();
        client.unauthenticate().await.unwrap();
        assert_eq!(client.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_logout_ok_closes() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"LOGOUT\r\n")
            .read(b"OK \"Logout completed.\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let message = client.logout().await.unwrap();
        assert_eq!(message, "Logout completed.");
        assert_eq!(client.state(), SessionState::Closed);

        let err = client.capability().await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::NotConnected));
    }

    #[tokio::test]
    async fn test_logout_bye_is_success() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"LOGOUT\r\n")
            .read(b"BYE \"Logging out\"\r\n")
            .build();
        let mut client = connect(mock).await;

        assert_eq!(client.logout().await.unwrap(), "Logging out");
        assert_eq!(client.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_bye_closes_session() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"LISTSCRIPTS\r\n")
            .read(b"BYE (TRYLATER) \"Server shutting down\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let err = client.list_scripts().await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.response_code(), Some(&ResponseCode::TryLater));
        assert_eq!(client.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_eof_closes_session() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"LISTSCRIPTS\r\n")
            .read(b"\"partial\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let err = client.list_scripts().await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(client.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_execute_returns_failures_as_responses() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"DELETESCRIPT \"rules\"\r\n")
            .read(b"NO (NONEXISTENT) \"No such script\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let command = Command::DeleteScript {
            name: ScriptName::new("rules").unwrap(),
        };
        let response = client.execute(&command).await.unwrap();
        assert_eq!(response.status, Status::No);
        assert_eq!(response.code, Some(ResponseCode::NonExistent));
        assert_eq!(response.message, "No such script");
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mock = Builder::new().read(GREETING).build();
        let mut client = connect(mock).await;

        client.close().await;
        client.close().await;
        assert_eq!(client.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_trace_masks_credentials() {
        let sink = Arc::new(RecordingSink::default());
        let config = Config::builder("sieve.example.com")
            .sink(sink.clone())
            .build();
        let mock = Builder::new()
            .read(b"OK\r\n")
            .write(b"AUTHENTICATE \"PLAIN\" \"dXNlcgB1c2VyAHBhc3M=\"\r\n")
            .read(b"OK\r\n")
            .build();
        let mut client = Client::from_stream(mock, &config).await.unwrap();

        client.login("user", "pass").await.unwrap();
        assert_eq!(
            sink.lines(),
            vec!["<<< OK", ">>> AUTHENTICATE \"PLAIN\" \"***\"", "<<< OK"]
        );
    }

    #[tokio::test]
    async fn test_start_tls_discards_cleartext_capabilities() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"STARTTLS\r\n")
            .read(b"OK\r\n")
            .read(b"\"SASL\" \"PLAIN\"\r\n\"MAXREDIRECTS\" \"many\"\r\nOK\r\n")
            .build();
        let mut client = connect(mock).await;

        let err = client.start_tls().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert_eq!(client.state(), SessionState::TlsUpgraded);
        assert!(!client.capabilities().starttls);
        assert_eq!(client.capabilities(), &Capabilities::default());
    }

    #[tokio::test]
    async fn test_login_error_hides_password() {
        let mock = Builder::new().read(GREETING).build();
        let mut client = connect(mock).await;

        let err = client.login("user", "hunter2\nsecret").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let text = err.to_string();
        assert!(text.contains("password"));
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("secret"));
    }

    #[tokio::test]
    async fn test_execute_validates_before_sending() {
        let mock = Builder::new().read(GREETING).build();
        let mut client = connect(mock).await;

        let command = Command::Noop {
            tag: Some("x\r\nLOGOUT".to_string()),
        };
        let err = client.execute(&command).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(client.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_unreadable_response_closes_session() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"GETSCRIPT \"rules\"\r\n")
            .read(b"{3}\r\n\xff\xfe\xfd\r\nOK \"Getscript completed.\"\r\n")
            .build();
        let mut client = connect(mock).await;

        let err = client.get_script("rules").await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert_eq!(client.state(), SessionState::Closed);

        // The rest of the GETSCRIPT response must not answer the next command.
        let err = client.noop(None).await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::NotConnected));
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::TlsUpgraded.to_string(), "tls-upgraded");
        assert_eq!(SessionState::Closed.to_string(), "closed");
    }
}
