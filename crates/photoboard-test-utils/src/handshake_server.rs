//! Loopback handshake server for integration tests.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// How the server answers one connection.
#[derive(Debug, Clone)]
pub enum ServerReply {
    /// Read `CONN`, send these bytes, record until the client closes.
    Identifier(Vec<u8>),
    /// Read `CONN` and never answer.
    Silent,
    /// Read `CONN` and hang up.
    Hangup,
}

impl ServerReply {
    pub fn identifier(id: &str) -> Self {
        ServerReply::Identifier(id.as_bytes().to_vec())
    }
}

/// Serves one connection per scripted reply, in order, then closes the
/// listener so further connects are refused.
#[derive(Debug)]
pub struct HandshakeServer {
    port: u16,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
    handle: JoinHandle<()>,
}

impl HandshakeServer {
    pub async fn start(replies: Vec<ServerReply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);

        let handle = tokio::spawn(async move {
            for reply in replies {
                let Ok((mut sock, _)) = listener.accept().await else {
                    return;
                };

                let mut seen = Vec::new();
                let mut token = [0u8; 4];
                if sock.read_exact(&mut token).await.is_ok() {
                    seen.extend_from_slice(&token);
                    match reply {
                        ServerReply::Identifier(id) => {
                            if sock.write_all(&id).await.is_ok() {
                                let _ = sock.read_to_end(&mut seen).await;
                            }
                        }
                        ServerReply::Silent => {
                            let _ = sock.read_to_end(&mut seen).await;
                        }
                        ServerReply::Hangup => {}
                    }
                }
                log.lock().unwrap().push(seen);
            }
        });

        Self {
            port,
            received,
            handle,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Bytes received per finished connection so far.
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap().clone()
    }

    /// Wait until every scripted connection has been served.
    pub async fn finished(self) -> Vec<Vec<u8>> {
        let Self {
            received, handle, ..
        } = self;
        handle.await.unwrap();
        received.lock().unwrap().clone()
    }
}
