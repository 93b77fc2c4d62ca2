//! Connection configuration types.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::trace::{TraceSink, TracingSink};

/// IANA-assigned ManageSieve port.
pub const DEFAULT_PORT: u16 = 4190;

/// Default bound on the initial TCP connect.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// ManageSieve connection configuration.
///
/// Built once and passed to [`crate::Client::connect`]; nothing in it changes
/// while a session is running. The host doubles as the TLS server name for
/// STARTTLS.
#[derive(Clone)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Bound on the initial TCP connect. Commands themselves have no timeout.
    pub connect_timeout: Duration,
    /// TLS client configuration used for STARTTLS. `None` uses webpki roots.
    pub tls_config: Option<Arc<rustls::ClientConfig>>,
    /// Receiver for wire trace lines.
    pub sink: Arc<dyn TraceSink>,
}

impl Config {
    /// Creates a new configuration for port 4190 with default settings.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        ConfigBuilder::new(host).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }

    /// Returns the `host:port` address to dial.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Manual Debug implementation since trait objects don't implement Debug
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("connect_timeout", &self.connect_timeout)
            .field("custom_tls", &self.tls_config.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for connection configuration.
#[derive(Clone)]
pub struct ConfigBuilder {
    host: String,
    port: u16,
    connect_timeout: Duration,
    tls_config: Option<Arc<rustls::ClientConfig>>,
    sink: Option<Arc<dyn TraceSink>>,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            tls_config: None,
            sink: None,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Uses a custom TLS configuration for STARTTLS (e.g. a private CA).
    #[must_use]
    pub fn tls_config(mut self, config: Arc<rustls::ClientConfig>) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Sets the wire trace sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            host: self.host,
            port: self.port,
            connect_timeout: self.connect_timeout,
            tls_config: self.tls_config,
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
        }
    }
}

impl fmt::Debug for ConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigBuilder")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
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
    use super::*;
    use crate::trace::NoopSink;

    #[test]
    fn test_config_new() {
        let config = Config::new("sieve.example.com");
        assert_eq!(config.host, "sieve.example.com");
        assert_eq!(config.port, 4190);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(config.tls_config.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = Config::builder("sieve.example.com")
            .port(2000)
            .connect_timeout(Duration::from_secs(10))
            .sink(Arc::new(NoopSink))
            .build();

        assert_eq!(config.port, 2000);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.address(), "sieve.example.com:2000");
    }

    #[test]
    fn test_debug_hides_sink() {
        let config = Config::new("sieve.example.com");
        let debug = format!("{config:?}");
        assert!(debug.contains("sieve.example.com"));
        assert!(debug.contains("custom_tls: false"));
    }
}
