//! Image combine as a pipeline step.

use std::path::PathBuf;

use async_trait::async_trait;

use super::{ActionReport, ExternalAction};
use crate::combine::combine_files;
use crate::error::{Error, Result};
use crate::protocol::SessionId;

/// Runs [`combine_files`] on the blocking pool.
#[derive(Debug, Clone)]
pub struct CombineAction {
    left: PathBuf,
    right: PathBuf,
    output: PathBuf,
}

impl CombineAction {
    pub fn new(left: PathBuf, right: PathBuf, output: PathBuf) -> Self {
        Self {
            left,
            right,
            output,
        }
    }
}

#[async_trait]
impl ExternalAction for CombineAction {
    fn name(&self) -> &str {
        "combine"
    }

    async fn run(&self, _session_id: &SessionId) -> Result<ActionReport> {
        let (left, right, output) = (self.left.clone(), self.right.clone(), self.output.clone());
        let (width, height) =
            tokio::task::spawn_blocking(move || combine_files(&left, &right, &output))
                .await
                .map_err(|e| Error::Action {
                    message: format!("combine task failed: {}", e),
                })??;

        Ok(ActionReport::new(
            self.name(),
            format!("wrote {} ({}x{})", self.output.display(), width, height),
        ))
    }
}
