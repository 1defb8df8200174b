//! Multipart picture upload.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::{ActionReport, ExternalAction};
use crate::config::UploadFile;
use crate::error::{Error, Result};
use crate::protocol::SessionId;

/// POSTs local files as `multipart/form-data`, one part per file.
#[derive(Debug, Clone)]
pub struct UploadAction {
    client: reqwest::Client,
    url: String,
    files: Vec<UploadFile>,
}

impl UploadAction {
    pub fn new(url: impl Into<String>, files: Vec<UploadFile>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            files,
        })
    }

    async fn build_form(&self) -> Result<Form> {
        let mut form = Form::new();
        for file in &self.files {
            let bytes = tokio::fs::read(&file.path).await.map_err(|e| Error::Action {
                message: format!("failed to read {}: {}", file.path.display(), e),
            })?;
            let file_name = file
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.name.clone());
            let part = Part::bytes(bytes)
                .file_name(file_name)
                .mime_str(mime_for(&file.path))?;
            form = form.part(file.name.clone(), part);
        }
        Ok(form)
    }
}

#[async_trait]
impl ExternalAction for UploadAction {
    fn name(&self) -> &str {
        "upload"
    }

    async fn run(&self, session_id: &SessionId) -> Result<ActionReport> {
        let form = self.build_form().await?;
        debug!(url = %self.url, files = self.files.len(), session_id = %session_id, "uploading pictures");

        let response = self.client.post(&self.url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Action {
                message: format!("upload to {} returned {}", self.url, status),
            });
        }

        Ok(ActionReport::new(
            self.name(),
            format!("{} file(s) accepted with {}", self.files.len(), status),
        ))
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
