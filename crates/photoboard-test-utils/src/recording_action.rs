//! Action that records its invocations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use photoboard_core::action::{ActionReport, ExternalAction};
use photoboard_core::error::{Error, Result};
use photoboard_core::protocol::SessionId;

/// Remembers every identifier it ran with. Can be told to fail.
///
/// Clones share state, so a test can keep one handle and give the other to
/// the client.
#[derive(Debug, Clone, Default)]
pub struct RecordingAction {
    calls: Arc<Mutex<Vec<SessionId>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// An action that fails every time until [`set_failing`](Self::set_failing)
    /// says otherwise.
    pub fn failing() -> Self {
        let action = Self::default();
        action.set_failing(true);
        action
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Identifiers the action ran with, oldest first.
    pub fn calls(&self) -> Vec<SessionId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExternalAction for RecordingAction {
    fn name(&self) -> &str {
        "recording"
    }

    async fn run(&self, session_id: &SessionId) -> Result<ActionReport> {
        self.calls.lock().unwrap().push(session_id.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Action {
                message: "recording action told to fail".into(),
            });
        }
        Ok(ActionReport::new(self.name(), session_id.to_string()))
    }
}
