//! Mock transport for testing without real network.
//!
//! [`ScriptedConnector`] replays a list of connect results. Accepted
//! connections are usually in-memory duplex pipes created by
//! [`scripted_peer`], whose far end plays the server.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};
use tokio::task::JoinHandle;

use photoboard_core::error::{Error, Result};
use photoboard_core::transport::{BoxedStream, Connector, Endpoint};

/// One scripted connect result.
pub enum ConnectStep {
    /// Fail like a closed port.
    Refuse,
    /// Fail like an unreachable host.
    TimeOut,
    /// Hand out this stream.
    Accept(BoxedStream),
}

impl std::fmt::Debug for ConnectStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectStep::Refuse => f.write_str("Refuse"),
            ConnectStep::TimeOut => f.write_str("TimeOut"),
            ConnectStep::Accept(_) => f.write_str("Accept(..)"),
        }
    }
}

/// Connector that replays [`ConnectStep`]s and refuses once they run out.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    steps: Mutex<VecDeque<ConnectStep>>,
    attempts: AtomicUsize,
}

impl ScriptedConnector {
    pub fn new(steps: impl IntoIterator<Item = ConnectStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Number of connect calls so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Steps not yet consumed.
    pub fn remaining(&self) -> usize {
        self.steps.lock().unwrap().len()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<BoxedStream> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step.unwrap_or(ConnectStep::Refuse) {
            ConnectStep::Refuse => Err(Error::Connect {
                endpoint: endpoint.to_string(),
                source: std::io::ErrorKind::ConnectionRefused.into(),
            }),
            ConnectStep::TimeOut => Err(Error::Timeout { stage: "connect" }),
            ConnectStep::Accept(stream) => Ok(stream),
        }
    }
}

/// Everything the fake server received on one connection.
#[derive(Debug)]
pub struct PeerLog {
    handle: JoinHandle<Vec<u8>>,
}

impl PeerLog {
    /// Wait for the client side to close and return the received bytes.
    pub async fn received(self) -> Vec<u8> {
        self.handle.await.unwrap()
    }
}

/// Create an in-memory connection whose server end reads `CONN`, answers with
/// `reply` (or stays silent for `None`), and records everything it receives
/// until the client closes.
pub fn scripted_peer(reply: Option<&[u8]>) -> (BoxedStream, PeerLog) {
    let (client, mut server) = duplex(1024);
    let reply = reply.map(|r| r.to_vec());

    let handle = tokio::spawn(async move {
        let mut received = Vec::new();
        let mut token = [0u8; 4];
        if server.read_exact(&mut token).await.is_err() {
            return received;
        }
        received.extend_from_slice(&token);

        if let Some(reply) = reply {
            if server.write_all(&reply).await.is_err() {
                return received;
            }
        }

        let _ = server.read_to_end(&mut received).await;
        received
    });

    (Box::new(client), PeerLog { handle })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refuses_when_script_runs_out() {
        let connector = ScriptedConnector::new([ConnectStep::TimeOut]);
        let endpoint = Endpoint::new("127.0.0.1", 1);

        assert!(matches!(
            connector.connect(&endpoint).await.err().unwrap(),
            Error::Timeout { .. }
        ));
        assert!(matches!(
            connector.connect(&endpoint).await.err().unwrap(),
            Error::Connect { .. }
        ));
        assert_eq!(connector.attempts(), 2);
        assert_eq!(connector.remaining(), 0);
    }

    #[tokio::test]
    async fn peer_answers_and_records() {
        let (mut stream, log) = scripted_peer(Some(b"id-1"));

        stream.write_all(b"CONN").await.unwrap();
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"id-1");
        stream.write_all(b"OK").await.unwrap();
        drop(stream);

        assert_eq!(log.received().await, b"CONNOK");
    }
}
