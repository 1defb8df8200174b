//! Local program action (picture capture).

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{ActionReport, ExternalAction};
use crate::constants::SESSION_ID_ENV;
use crate::error::{Error, Result};
use crate::protocol::SessionId;

/// Runs a program and waits for it to exit.
///
/// The session identifier is passed through the `PHOTOBOARD_SESSION_ID`
/// environment variable. A non-zero exit status is a failure.
#[derive(Debug, Clone)]
pub struct CommandAction {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAction {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }
}

#[async_trait]
impl ExternalAction for CommandAction {
    fn name(&self) -> &str {
        "command"
    }

    async fn run(&self, session_id: &SessionId) -> Result<ActionReport> {
        debug!(program = %self.program, args = ?self.args, "spawning action program");

        let child = Command::new(&self.program)
            .args(&self.args)
            .env(SESSION_ID_ENV, session_id.to_string_lossy())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Action {
                message: format!("failed to spawn {}: {}", self.program, e),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::Action {
                message: format!("{} did not finish within {:?}", self.program, self.timeout),
            })?
            .map_err(|e| Error::Action {
                message: format!("failed to wait for {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if !stderr.is_empty() {
                warn!(program = %self.program, stderr, "action program wrote to stderr");
            }
            return Err(Error::Action {
                message: format!("{} exited with {}", self.program, output.status),
            });
        }

        Ok(ActionReport::new(
            self.name(),
            format!("{} exited with {}", self.program, output.status),
        ))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandAction {
        CommandAction::new(
            "sh",
            vec!["-c".into(), script.into()],
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn success_reports_status() {
        let id = SessionId::try_from("abc").unwrap();
        let report = sh("exit 0").run(&id).await.unwrap();
        assert_eq!(report.action, "command");
    }

    #[tokio::test]
    async fn nonzero_exit_is_error() {
        let id = SessionId::try_from("abc").unwrap();
        let err = sh("echo boom >&2; exit 3").run(&id).await.unwrap_err();
        assert!(matches!(err, Error::Action { .. }));
    }

    #[tokio::test]
    async fn session_id_is_exported() {
        let id = SessionId::try_from("abc-123").unwrap();
        let action = sh("test \"$PHOTOBOARD_SESSION_ID\" = abc-123");
        action.run(&id).await.unwrap();
    }

    #[tokio::test]
    async fn missing_program_is_error() {
        let id = SessionId::try_from("abc").unwrap();
        let action = CommandAction::new(
            "/definitely/not/a/program",
            Vec::new(),
            Duration::from_secs(1),
        );
        assert!(action.run(&id).await.is_err());
    }

    #[tokio::test]
    async fn slow_program_times_out() {
        let id = SessionId::try_from("abc").unwrap();
        let action = CommandAction::new(
            "sh",
            vec!["-c".into(), "sleep 5".into()],
            Duration::from_millis(100),
        );
        let err = action.run(&id).await.unwrap_err();
        assert!(err.to_string().contains("did not finish"));
    }
}
