//! Stream types for ManageSieve connections.

#![allow(clippy::missing_errors_doc)]

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use super::Config;
use crate::{Error, Result};

/// A stream that starts as plaintext and may be upgraded with STARTTLS.
pub enum SieveStream {
    /// Plaintext TCP stream.
    Plain(TcpStream),
    /// TLS-encrypted stream (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
}

impl SieveStream {
    /// Creates a new plaintext stream.
    pub const fn plain(stream: TcpStream) -> Self {
        Self::Plain(stream)
    }

    /// Returns true if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

/// A transport that can be wrapped in TLS in place.
///
/// The client calls this after a successful STARTTLS exchange. The returned
/// stream replaces the old one; `host` is the name the certificate is
/// verified against.
pub trait TlsUpgrade: Sized {
    /// Performs the TLS handshake over this stream.
    fn upgrade_to_tls(
        self,
        host: &str,
        config: Arc<rustls::ClientConfig>,
    ) -> impl Future<Output = Result<Self>> + Send;
}

impl TlsUpgrade for SieveStream {
    async fn upgrade_to_tls(self, host: &str, config: Arc<rustls::ClientConfig>) -> Result<Self> {
        match self {
            Self::Plain(tcp) => {
                let connector = TlsConnector::from(config);
                let server_name = ServerName::try_from(host.to_string())?;
                let tls = connector
                    .connect(server_name, tcp)
                    .await
                    .map_err(Error::Handshake)?;
                Ok(Self::Tls(Box::new(tls)))
            }
            Self::Tls(_) => Err(Error::Protocol("stream is already TLS".to_string())),
        }
    }
}

impl AsyncRead for SieveStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for SieveStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Creates a TLS client configuration trusting the webpki root certificates.
#[must_use]
pub fn default_tls_config() -> Arc<rustls::ClientConfig> {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}

/// Dials the configured server without TLS.
///
/// The connect is bounded by `config.connect_timeout`. ManageSieve always
/// starts in cleartext; encryption is negotiated later with STARTTLS.
pub async fn connect_plain(config: &Config) -> Result<SieveStream> {
    let address = config.address();
    let tcp = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&address))
        .await
        .map_err(|_| Error::Timeout(config.connect_timeout))?
        .map_err(|source| Error::Connect {
            address: address.clone(),
            source,
        })?;
    tracing::debug!(%address, "connected");
    Ok(SieveStream::plain(tcp))
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
    use std::time::Duration;

    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn test_default_tls_config() {
        let config = default_tls_config();
        assert!(config.alpn_protocols.is_empty());
    }

    #[tokio::test]
    async fn test_connect_plain() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let config = Config::builder("127.0.0.1").port(port).build();
        let stream = connect_plain(&config).await.unwrap();
        assert!(!stream.is_tls());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = Config::builder("127.0.0.1")
            .port(port)
            .connect_timeout(Duration::from_secs(5))
            .build();
        let err = connect_plain(&config).await.err().unwrap();
        assert!(matches!(err, Error::Connect { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_upgrade_rejects_invalid_host() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let config = Config::builder("127.0.0.1").port(port).build();
        let stream = connect_plain(&config).await.unwrap();
        let err = stream
            .upgrade_to_tls("not a hostname!", default_tls_config())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidDnsName(_)));
    }
}
