//! The handshake loop.
//!
//! [`HandshakeClient`] connects, exchanges `CONN` for a session identifier,
//! persists it, acknowledges with `OK`, runs the configured action and starts
//! over. Every failure between opening the socket and sending `OK` is logged
//! and retried after the backoff delay; action failures are logged and do not
//! touch the stored identifier.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::action::{ActionReport, ExternalAction, build_action};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::handshake::{Handshake, HandshakeTimeouts};
use crate::protocol::SessionId;
use crate::session::{BackoffPolicy, ClientState};
use crate::store::{FileStore, IdentifierStore};
use crate::timing::{Clock, TokioClock};
use crate::transport::{Connector, Endpoint, TcpConnector};

/// How the post-handshake action went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// No action configured.
    Skipped,
    /// Action finished successfully.
    Succeeded(ActionReport),
    /// Action failed; the message has already been logged.
    Failed(String),
}

/// Result of one pass through the loop.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Handshake completed and the identifier was persisted.
    Completed {
        session_id: SessionId,
        action: ActionOutcome,
    },
    /// Connect or handshake failed; the client already slept `delay`.
    Failed { error: Error, delay: Duration },
    /// The loop cannot continue (attempts exhausted or fatal error).
    Stopped { error: Error },
}

/// Counters returned when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Successful handshakes.
    pub completed: u64,
    /// Failed connect or handshake attempts.
    pub failed: u64,
}

/// Single-threaded connect/handshake/act loop.
pub struct HandshakeClient {
    endpoint: Endpoint,
    connector: Arc<dyn Connector>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn IdentifierStore>,
    action: Option<Box<dyn ExternalAction>>,
    backoff: BackoffPolicy,
    timeouts: HandshakeTimeouts,
    action_delay: Duration,
    cycle_delay: Duration,
    state_tx: watch::Sender<ClientState>,
    summary: RunSummary,
}

impl std::fmt::Debug for HandshakeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeClient")
            .field("endpoint", &self.endpoint)
            .field("state", &*self.state_tx.borrow())
            .field("action", &self.action.as_ref().map(|a| a.name()))
            .field("backoff", &self.backoff)
            .field("summary", &self.summary)
            .finish()
    }
}

impl HandshakeClient {
    /// Create a client from explicit collaborators.
    ///
    /// Timing, endpoint and backoff come from `config`; its `actions` and
    /// `session_file` are ignored in favour of `store` and
    /// [`with_action`](Self::with_action).
    pub fn new(
        config: &ClientConfig,
        connector: Arc<dyn Connector>,
        clock: Arc<dyn Clock>,
        store: Arc<dyn IdentifierStore>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ClientState::Disconnected);
        Self {
            endpoint: config.endpoint(),
            connector,
            clock,
            store,
            action: None,
            backoff: config.backoff(),
            timeouts: config.handshake_timeouts(),
            action_delay: config.action_delay(),
            cycle_delay: config.cycle_delay(),
            state_tx,
            summary: RunSummary::default(),
        }
    }

    /// Create a production client: TCP, tokio timers, file persistence and
    /// the configured actions.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let action = build_action(&config.actions)?;
        let client = Self::new(
            config,
            Arc::new(TcpConnector::new(config.connect_timeout())),
            Arc::new(TokioClock),
            Arc::new(FileStore::new(config.session_file.clone())),
        );
        Ok(match action {
            Some(action) => client.with_action(action),
            None => client,
        })
    }

    /// Set the post-handshake action.
    pub fn with_action(mut self, action: Box<dyn ExternalAction>) -> Self {
        self.action = Some(action);
        self
    }

    /// Current state.
    pub fn state(&self) -> ClientState {
        *self.state_tx.borrow()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state_tx.subscribe()
    }

    /// Counters so far.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Run until attempts are exhausted or a fatal error occurs.
    ///
    /// With the default unbounded backoff this only returns on a fatal error;
    /// callers stop it by dropping the future.
    pub async fn run(&mut self) -> Result<RunSummary> {
        self.run_for(None).await
    }

    /// Run until `cycles` handshakes have completed (or forever for `None`).
    pub async fn run_for(&mut self, cycles: Option<u64>) -> Result<RunSummary> {
        info!(
            endpoint = %self.endpoint,
            max_retry_delay_ms = self.backoff.max_delay().as_millis() as u64,
            "handshake loop starting"
        );
        self.state_tx.send_replace(ClientState::Disconnected);

        while cycles.is_none_or(|limit| self.summary.completed < limit) {
            if let CycleOutcome::Stopped { error } = self.run_cycle().await {
                error!(error = %error, "handshake loop stopped");
                return Err(error);
            }
        }

        self.set_state(ClientState::Stopped);
        info!(
            completed = self.summary.completed,
            failed = self.summary.failed,
            "handshake loop finished"
        );
        Ok(self.summary)
    }

    /// One pass: connect, handshake, persist, acknowledge, act, wait.
    ///
    /// A failed connect or handshake sleeps the backoff delay before returning.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        match self.handshake_once().await {
            Ok(session_id) => {
                self.backoff.reset();
                self.summary.completed += 1;
                info!(session_id = %session_id, "handshake complete");

                let action = self.run_action(&session_id).await;
                self.set_state(ClientState::Disconnected);
                self.clock.sleep(self.cycle_delay).await;

                CycleOutcome::Completed { session_id, action }
            }
            Err(error) if error.is_fatal() => {
                self.set_state(ClientState::Stopped);
                CycleOutcome::Stopped { error }
            }
            Err(error) => {
                self.summary.failed += 1;
                self.set_state(ClientState::Disconnected);

                let delay = self.backoff.next_delay();
                let attempt = self.backoff.attempt();
                if !self.backoff.should_retry() {
                    warn!(
                        attempt,
                        elapsed_ms = self.backoff.elapsed().as_millis() as u64,
                        error = %error,
                        "giving up after repeated failures"
                    );
                    self.set_state(ClientState::Stopped);
                    return CycleOutcome::Stopped { error };
                }

                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    endpoint = %self.endpoint,
                    error = %error,
                    "attempt failed, retrying"
                );
                self.clock.sleep(delay).await;
                CycleOutcome::Failed { error, delay }
            }
        }
    }

    async fn handshake_once(&mut self) -> Result<SessionId> {
        self.set_state(ClientState::Connecting);
        let stream = self.connector.connect(&self.endpoint).await?;
        self.set_state(ClientState::Connected);
        debug!(endpoint = %self.endpoint, "connected");

        self.set_state(ClientState::Handshaking);
        let mut handshake = Handshake::new(stream, self.timeouts);
        let session_id = handshake.request_session().await?;

        // Stored before OK so an acknowledged identifier is always on disk.
        self.persist(&session_id).await?;
        handshake.acknowledge().await?;

        Ok(session_id)
    }

    /// Save on the blocking pool; file stores sync to disk.
    async fn persist(&self, session_id: &SessionId) -> Result<()> {
        let store = Arc::clone(&self.store);
        let session_id = session_id.clone();
        tokio::task::spawn_blocking(move || store.save(&session_id))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }

    async fn run_action(&self, session_id: &SessionId) -> ActionOutcome {
        let Some(action) = self.action.as_ref() else {
            return ActionOutcome::Skipped;
        };

        self.set_state(ClientState::Acting);
        self.clock.sleep(self.action_delay).await;

        match action.run(session_id).await {
            Ok(report) => {
                info!(action = %report.action, detail = %report.detail, "action finished");
                ActionOutcome::Succeeded(report)
            }
            Err(e) => {
                warn!(action = action.name(), error = %e, "action failed");
                ActionOutcome::Failed(e.to_string())
            }
        }
    }

    fn set_state(&self, next: ClientState) {
        let prev = *self.state_tx.borrow();
        if prev == next {
            return;
        }
        debug_assert!(
            prev.can_transition_to(next),
            "invalid transition {} -> {}",
            prev,
            next
        );
        debug!(from = %prev, to = %next, "state change");
        self.state_tx.send_replace(next);
    }
}
