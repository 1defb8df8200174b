//! Client side of the photoboard handshake.
//!
//! # Handshake Flow
//!
//! 1. [`Handshake::request_session`] sends `CONN` and reads one chunk of at
//!    most 40 bytes, which becomes the [`SessionId`].
//! 2. The caller persists the identifier.
//! 3. [`Handshake::acknowledge`] sends `OK` and shuts the write half down.
//!
//! Splitting the exchange lets the caller guarantee that `OK` is only ever
//! sent for an identifier that has already been stored.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::constants::{
    ACK_TOKEN, CONNECT_TOKEN, DEFAULT_RECV_TIMEOUT, DEFAULT_SEND_TIMEOUT, MAX_SESSION_ID_LEN,
};
use crate::error::{Error, Result};
use crate::protocol::SessionId;

/// Timeouts bounding each handshake step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeTimeouts {
    /// Bound on waiting for the identifier.
    pub recv: Duration,
    /// Bound on each token write and on the final shutdown.
    pub send: Duration,
}

impl Default for HandshakeTimeouts {
    fn default() -> Self {
        Self {
            recv: DEFAULT_RECV_TIMEOUT,
            send: DEFAULT_SEND_TIMEOUT,
        }
    }
}

/// One in-progress handshake over a connected byte stream.
#[derive(Debug)]
pub struct Handshake<S> {
    stream: S,
    timeouts: HandshakeTimeouts,
}

impl<S> Handshake<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a freshly connected stream.
    pub fn new(stream: S, timeouts: HandshakeTimeouts) -> Self {
        Self { stream, timeouts }
    }

    /// Send `CONN` and receive the session identifier.
    pub async fn request_session(&mut self) -> Result<SessionId> {
        self.write_token(CONNECT_TOKEN, "connect token send").await?;
        trace!("sent connect token");

        let mut buf = [0u8; MAX_SESSION_ID_LEN];
        let n = timeout(self.timeouts.recv, self.stream.read(&mut buf))
            .await
            .map_err(|_| Error::Timeout {
                stage: "session identifier receive",
            })??;

        if n == 0 {
            return Err(Error::ConnectionClosed);
        }

        let session_id = SessionId::new(buf[..n].to_vec())?;
        debug!(len = n, session_id = %session_id, "received session identifier");
        Ok(session_id)
    }

    /// Send `OK` and close the write half.
    pub async fn acknowledge(mut self) -> Result<()> {
        self.write_token(ACK_TOKEN, "acknowledgment send").await?;
        trace!("sent acknowledgment");

        timeout(self.timeouts.send, self.stream.shutdown())
            .await
            .map_err(|_| Error::Timeout { stage: "shutdown" })??;
        Ok(())
    }

    async fn write_token(&mut self, token: &[u8], stage: &'static str) -> Result<()> {
        let stream = &mut self.stream;
        timeout(self.timeouts.send, async move {
            stream.write_all(token).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| Error::Timeout { stage })??;
        Ok(())
    }
}
