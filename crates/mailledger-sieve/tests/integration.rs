//! Integration tests for the ManageSieve client.
//!
//! These tests use a mock stream to simulate ManageSieve server responses
//! without requiring a real server connection.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailledger_sieve::{
    Client, Config, Error, NoopSink, ResponseCode, Script, SessionState, TlsUpgrade,
};

/// Mock stream that plays back one server reply per client write.
///
/// The first reply (the greeting) is readable immediately. Each later reply
/// becomes readable after the client writes a command, or after the TLS
/// upgrade for the post-handshake capability block.
struct MockStream {
    replies: VecDeque<Vec<u8>>,
    readable: Vec<u8>,
    /// Captured commands sent by the client, shared with the test.
    sent: Arc<Mutex<Vec<u8>>>,
    /// Host the stream was upgraded for, if any.
    tls_host: Arc<Mutex<Option<String>>>,
}

impl MockStream {
    fn new(replies: &[&[u8]]) -> Self {
        let mut replies: VecDeque<Vec<u8>> = replies.iter().map(|r| r.to_vec()).collect();
        let readable = replies.pop_front().unwrap_or_default();
        Self {
            replies,
            readable,
            sent: Arc::new(Mutex::new(Vec::new())),
            tls_host: Arc::new(Mutex::new(None)),
        }
    }

    fn release_next(&mut self) {
        if let Some(reply) = self.replies.pop_front() {
            self.readable.extend_from_slice(&reply);
        }
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let to_read = self.readable.len().min(buf.remaining());
        buf.put_slice(&self.readable[..to_read]);
        self.readable.drain(..to_read);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        self.release_next();
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl TlsUpgrade for MockStream {
    async fn upgrade_to_tls(
        mut self,
        host: &str,
        _config: Arc<rustls::ClientConfig>,
    ) -> mailledger_sieve::Result<Self> {
        *self.tls_host.lock().unwrap() = Some(host.to_string());
        self.release_next();
        Ok(self)
    }
}

fn config() -> Config {
    Config::builder("sieve.example.com")
        .sink(Arc::new(NoopSink))
        .build()
}

fn sent_text(sent: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8(sent.lock().unwrap().clone()).unwrap()
}

const DOVECOT_GREETING: &[u8] = b"\"IMPLEMENTATION\" \"Dovecot Pigeonhole\"\r\n\
\"SIEVE\" \"fileinto reject envelope encoded-character vacation subaddress comparator-i;ascii-numeric relational regex imap4flags copy include variables body enotify environment mailbox date index ihave duplicate mime foreverypart extracttext vacation-seconds editheader imapflags notify imapsieve vnd.dovecot.imapsieve vnd.dovecot.pgp-encrypt\"\r\n\
\"NOTIFY\" \"mailto\"\r\n\
\"SASL\" \"\"\r\n\
\"STARTTLS\"\r\n\
\"VERSION\" \"1.0\"\r\n\
OK \"Dovecot ready.\"\r\n";

const POST_TLS_CAPABILITIES: &[u8] = b"\"IMPLEMENTATION\" \"Dovecot Pigeonhole\"\r\n\
\"SIEVE\" \"fileinto reject envelope vacation\"\r\n\
\"NOTIFY\" \"mailto\"\r\n\
\"SASL\" \"PLAIN LOGIN\"\r\n\
\"MAXREDIRECTS\" \"40\"\r\n\
\"VERSION\" \"1.0\"\r\n\
OK \"TLS negotiation successful.\"\r\n";

#[tokio::test]
async fn test_full_session() {
    let mock = MockStream::new(&[
        DOVECOT_GREETING,
        b"OK \"Begin TLS negotiation now.\"\r\n",
        POST_TLS_CAPABILITIES,
        b"OK \"Logged in.\"\r\n",
        b"\"IMPLEMENTATION\" \"Dovecot Pigeonhole\"\r\n\"OWNER\" \"user\"\r\n\"VERSION\" \"1.0\"\r\nOK \"Capability completed.\"\r\n",
        b"OK \"Putscript completed.\"\r\n",
        b"\"vacation\" ACTIVE\r\n\"rules\"\r\nOK \"Listscripts completed.\"\r\n",
        b"{7}\r\nkeep;\r\n\r\nOK \"Getscript completed.\"\r\n",
        b"OK \"Script is valid.\"\r\n",
        b"OK \"Havespace completed.\"\r\n",
        b"OK \"Renamescript completed.\"\r\n",
        b"OK \"Deletescript completed.\"\r\n",
        b"OK \"Logout completed.\"\r\n",
    ]);
    let sent = Arc::clone(&mock.sent);
    let tls_host = Arc::clone(&mock.tls_host);

    let mut client = Client::from_stream(mock, &config()).await.unwrap();
    assert_eq!(client.state(), SessionState::Connected);
    assert!(client.capabilities().starttls);
    assert_eq!(client.capabilities().sieve_extensions.len(), 31);
    assert!(client.capabilities().sasl_mechanisms.is_empty());

    client.start_tls().await.unwrap();
    assert_eq!(
        tls_host.lock().unwrap().as_deref(),
        Some("sieve.example.com")
    );
    assert!(client.is_tls());
    assert!(!client.capabilities().starttls);
    assert!(client.capabilities().supports_sasl("plain"));
    assert_eq!(client.capabilities().max_redirects(), Some(40));

    client.login("user", "pass").await.unwrap();
    assert_eq!(client.state(), SessionState::Authenticated);

    client.capability().await.unwrap();
    assert_eq!(client.capabilities().owner, "user");

    client
        .put_script("rules", b"require \"fileinto\";\rkeep;\n")
        .await
        .unwrap();

    let (scripts, _) = client.list_scripts().await.unwrap();
    assert_eq!(
        scripts,
        vec![
            Script {
                name: "vacation".to_string(),
                active: true,
            },
            Script {
                name: "rules".to_string(),
                active: false,
            },
        ]
    );

    let (lines, message) = client.get_script("rules").await.unwrap();
    assert_eq!(lines, vec!["keep;"]);
    assert_eq!(message, "Getscript completed.");

    assert_eq!(
        client.check_script(b"keep;").await.unwrap(),
        "Script is valid."
    );
    client.have_space("test3", 4096).await.unwrap();
    client.rename_script("rules", "filters").await.unwrap();
    client.delete_script("filters").await.unwrap();

    client.logout().await.unwrap();
    assert_eq!(client.state(), SessionState::Closed);

    assert_eq!(
        sent_text(&sent),
        "STARTTLS\r\n\
AUTHENTICATE \"PLAIN\" \"dXNlcgB1c2VyAHBhc3M=\"\r\n\
CAPABILITY\r\n\
PUTSCRIPT \"rules\" {28+}\r\nrequire \"fileinto\";\r\nkeep;\r\n\r\n\
LISTSCRIPTS\r\n\
GETSCRIPT \"rules\"\r\n\
CHECKSCRIPT {5+}\r\nkeep;\r\n\
HAVESPACE \"test3\" 4096\r\n\
RENAMESCRIPT \"rules\" \"filters\"\r\n\
DELETESCRIPT \"filters\"\r\n\
LOGOUT\r\n"
    );
}

#[tokio::test]
async fn test_command_failure_keeps_session() {
    let mock = MockStream::new(&[
        b"\"IMPLEMENTATION\" \"Example\"\r\n\"VERSION\" \"1.0\"\r\nOK\r\n",
        b"NO (QUOTA/MAXSCRIPTS) \"Too many scripts\"\r\n",
        b"OK\r\n",
    ]);

    let mut client = Client::from_stream(mock, &config()).await.unwrap();

    let err = client.put_script("extra", b"keep;").await.unwrap_err();
    assert!(err.is_command_failure());
    assert!(!err.is_fatal());
    assert_eq!(err.response_code(), Some(&ResponseCode::QuotaMaxScripts));

    client.noop(None).await.unwrap();
    assert_eq!(client.state(), SessionState::Connected);
}

#[tokio::test]
async fn test_bye_terminates_session() {
    let mock = MockStream::new(&[
        b"\"IMPLEMENTATION\" \"Example\"\r\n\"VERSION\" \"1.0\"\r\nOK\r\n",
        b"BYE \"shutting down\"\r\n",
    ]);

    let mut client = Client::from_stream(mock, &config()).await.unwrap();

    let err = client.list_scripts().await.unwrap_err();
    assert!(matches!(err, Error::Bye { ref message, .. } if message == "shutting down"));
    assert_eq!(client.state(), SessionState::Closed);

    let err = client.noop(None).await.unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::NotConnected));

    // Deferred cleanup after a fatal error is still fine.
    client.close().await;
    client.close().await;
}

#[tokio::test]
async fn test_starttls_requires_clean_buffer() {
    let greeting = b"\"IMPLEMENTATION\" \"Example\"\r\n\"STARTTLS\"\r\n\"VERSION\" \"1.0\"\r\nOK\r\n";
    // The server pipelines plaintext data behind its STARTTLS reply.
    let mock = MockStream::new(&[greeting, b"OK\r\n\"SASL\" \"PLAIN\"\r\nOK\r\n"]);
    let tls_host = Arc::clone(&mock.tls_host);

    let mut client = Client::from_stream(mock, &config()).await.unwrap();

    let err = client.start_tls().await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
    assert!(tls_host.lock().unwrap().is_none());
    assert_eq!(client.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_getscript_truncated_literal() {
    let mock = MockStream::new(&[
        b"\"IMPLEMENTATION\" \"Example\"\r\n\"VERSION\" \"1.0\"\r\nOK\r\n",
        b"{5}\r\nkeep;\r\nOK\r\n",
        b"{99+}\r\nOK\r\n",
    ]);

    let mut client = Client::from_stream(mock, &config()).await.unwrap();

    let (lines, _) = client.get_script("rules").await.unwrap();
    assert_eq!(lines, vec!["keep;"]);

    // The connection closes before the announced bytes arrive.
    let err = client.get_script("rules").await.unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
