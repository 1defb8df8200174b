//! Transport abstraction for the handshake client.
//!
//! The client only needs "give me a connected byte stream". Production uses
//! [`TcpConnector`]; tests plug in scripted connectors that refuse, accept, or
//! hand out in-memory streams.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::trace;

use crate::constants::DEFAULT_CONNECT_TIMEOUT;
use crate::error::{Error, Result};

/// Any bidirectional async byte stream.
pub trait ByteStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> ByteStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Boxed stream handed from a connector to the client.
pub type BoxedStream = Box<dyn ByteStream>;

/// Remote host and port of the handshake server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Opens one connection per call.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `endpoint`. Any failure is reported as [`Error::Connect`]
    /// or [`Error::Timeout`].
    async fn connect(&self, endpoint: &Endpoint) -> Result<BoxedStream>;
}

/// Plain TCP connector with a connect timeout.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    connect_timeout: Duration,
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl TcpConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<BoxedStream> {
        let attempt = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
        let stream = tokio::time::timeout(self.connect_timeout, attempt)
            .await
            .map_err(|_| Error::Timeout { stage: "connect" })?
            .map_err(|source| Error::Connect {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if let Err(e) = stream.set_nodelay(true) {
            trace!(error = %e, "failed to set TCP_NODELAY");
        }

        Ok(Box::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn endpoint_display() {
        assert_eq!(Endpoint::new("photoboard.tech", 8008).to_string(), "photoboard.tech:8008");
        assert_eq!(Endpoint::new("::1", 9000).to_string(), "[::1]:9000");
    }

    #[tokio::test]
    async fn tcp_connector_reaches_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            sock.read_exact(&mut buf).await.unwrap();
            buf
        });

        let mut stream = TcpConnector::default()
            .connect(&Endpoint::new("127.0.0.1", port))
            .await
            .unwrap();
        stream.write_all(b"ping").await.unwrap();

        assert_eq!(&server.await.unwrap(), b"ping");
    }

    #[tokio::test]
    async fn tcp_connector_refused_is_connect_error() {
        // Grab a free port, then close the listener so nothing is there.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = TcpConnector::default()
            .connect(&Endpoint::new("127.0.0.1", port))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Connect { .. }));
        assert!(err.is_transient());
    }
}
