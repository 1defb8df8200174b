//! Post-handshake actions.
//!
//! After a handshake the client may run one or more steps: capture a picture
//! with a local program, combine two pictures, upload pictures. Each step
//! reports success or failure back to the loop, which logs it and moves on.

mod combine;
mod command;
mod upload;

use async_trait::async_trait;
use tracing::debug;

use crate::config::ActionConfig;
use crate::error::Result;
use crate::protocol::SessionId;

pub use combine::CombineAction;
pub use command::CommandAction;
pub use upload::UploadAction;

/// What a finished action has to say about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    /// Action name, e.g. `upload`.
    pub action: String,
    /// Human-readable outcome.
    pub detail: String,
}

impl ActionReport {
    pub fn new(action: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            detail: detail.into(),
        }
    }
}

/// A step run after a successful handshake.
#[async_trait]
pub trait ExternalAction: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Run to completion.
    async fn run(&self, session_id: &SessionId) -> Result<ActionReport>;
}

/// Steps run in order, stopping at the first failure.
pub struct SequenceAction {
    steps: Vec<Box<dyn ExternalAction>>,
}

impl SequenceAction {
    pub fn new(steps: Vec<Box<dyn ExternalAction>>) -> Self {
        Self { steps }
    }
}

impl std::fmt::Debug for SequenceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.steps.iter().map(|s| s.name()).collect();
        f.debug_struct("SequenceAction").field("steps", &names).finish()
    }
}

#[async_trait]
impl ExternalAction for SequenceAction {
    fn name(&self) -> &str {
        "sequence"
    }

    async fn run(&self, session_id: &SessionId) -> Result<ActionReport> {
        let mut details = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            debug!(step = step.name(), "running action step");
            let report = step.run(session_id).await?;
            details.push(format!("{}: {}", report.action, report.detail));
        }
        Ok(ActionReport::new(self.name(), details.join("; ")))
    }
}

/// Build the configured steps. Returns `None` when nothing is configured.
pub fn build_action(configs: &[ActionConfig]) -> Result<Option<Box<dyn ExternalAction>>> {
    let mut steps: Vec<Box<dyn ExternalAction>> = Vec::with_capacity(configs.len());
    for config in configs {
        steps.push(build_step(config)?);
    }

    Ok(match steps.len() {
        0 => None,
        1 => steps.pop(),
        _ => Some(Box::new(SequenceAction::new(steps))),
    })
}

fn build_step(config: &ActionConfig) -> Result<Box<dyn ExternalAction>> {
    Ok(match config {
        ActionConfig::Upload {
            url,
            files,
            timeout_ms,
        } => Box::new(UploadAction::new(
            url.clone(),
            files.clone(),
            std::time::Duration::from_millis(*timeout_ms),
        )?),
        ActionConfig::Command {
            program,
            args,
            timeout_ms,
        } => Box::new(CommandAction::new(
            program.clone(),
            args.clone(),
            std::time::Duration::from_millis(*timeout_ms),
        )),
        ActionConfig::Combine {
            left,
            right,
            output,
        } => Box::new(CombineAction::new(left.clone(), right.clone(), output.clone())),
    })
}
