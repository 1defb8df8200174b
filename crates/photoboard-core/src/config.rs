//! Handshake client configuration.
//!
//! Values come from three layers, later layers winning:
//! built-in defaults, an optional TOML file, then CLI flags (applied by the
//! binary through the `with_*` builders).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACTION_TIMEOUT, DEFAULT_CAPTURE_PROGRAM, DEFAULT_COMBINE_LEFT, DEFAULT_COMBINE_OUTPUT,
    DEFAULT_COMBINE_RIGHT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_RECV_TIMEOUT, DEFAULT_RETRY_DELAY, DEFAULT_RETRY_JITTER, DEFAULT_SEND_TIMEOUT,
    DEFAULT_SESSION_FILE, DEFAULT_UPLOAD_DEPTH, DEFAULT_UPLOAD_PICTURE, DEFAULT_UPLOAD_URL,
};
use crate::error::{Error, Result};
use crate::handshake::HandshakeTimeouts;
use crate::session::BackoffPolicy;
use crate::transport::Endpoint;

/// Settings for the handshake loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Handshake server host.
    pub host: String,
    /// Handshake server port.
    pub port: u16,
    /// File holding the latest session identifier.
    pub session_file: PathBuf,
    pub connect_timeout_ms: u64,
    pub recv_timeout_ms: u64,
    pub send_timeout_ms: u64,
    /// Delay between failed attempts.
    pub retry_delay_ms: u64,
    /// Upper bound of random jitter added to `retry_delay_ms`.
    pub retry_jitter_ms: u64,
    /// Consecutive failures tolerated before the loop stops. Unset retries forever.
    pub max_attempts: Option<u32>,
    /// Pause between the handshake and the first action step.
    pub action_delay_ms: u64,
    /// Pause at the end of every successful cycle.
    pub cycle_delay_ms: u64,
    /// Steps run after each handshake, in order.
    pub actions: Vec<ActionConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            connect_timeout_ms: millis(DEFAULT_CONNECT_TIMEOUT),
            recv_timeout_ms: millis(DEFAULT_RECV_TIMEOUT),
            send_timeout_ms: millis(DEFAULT_SEND_TIMEOUT),
            retry_delay_ms: millis(DEFAULT_RETRY_DELAY),
            retry_jitter_ms: millis(DEFAULT_RETRY_JITTER),
            max_attempts: None,
            action_delay_ms: 0,
            cycle_delay_ms: 0,
            actions: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| Error::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject values the loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(config_err("host must not be empty"));
        }
        if self.port == 0 {
            return Err(config_err("port must be non-zero"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(config_err("connect_timeout_ms must be non-zero"));
        }
        if self.recv_timeout_ms == 0 {
            return Err(config_err("recv_timeout_ms must be non-zero"));
        }
        if self.send_timeout_ms == 0 {
            return Err(config_err("send_timeout_ms must be non-zero"));
        }
        if self.max_attempts == Some(0) {
            return Err(config_err("max_attempts must be at least 1"));
        }
        for action in &self.actions {
            action.validate()?;
        }
        Ok(())
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn handshake_timeouts(&self) -> HandshakeTimeouts {
        HandshakeTimeouts {
            recv: Duration::from_millis(self.recv_timeout_ms),
            send: Duration::from_millis(self.send_timeout_ms),
        }
    }

    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.retry_delay_ms),
            Duration::from_millis(self.retry_jitter_ms),
            self.max_attempts,
        )
    }

    pub fn action_delay(&self) -> Duration {
        Duration::from_millis(self.action_delay_ms)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Set the session file.
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    /// Set the retry delay and jitter.
    pub fn with_retry(mut self, delay: Duration, jitter: Duration) -> Self {
        self.retry_delay_ms = millis(delay);
        self.retry_jitter_ms = millis(jitter);
        self
    }

    /// Set the identifier receive timeout.
    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout_ms = millis(timeout);
        self
    }

    /// Set the consecutive failure limit.
    pub fn with_max_attempts(mut self, max: Option<u32>) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set the delay before actions.
    pub fn with_action_delay(mut self, delay: Duration) -> Self {
        self.action_delay_ms = millis(delay);
        self
    }

    /// Set the delay at the end of each cycle.
    pub fn with_cycle_delay(mut self, delay: Duration) -> Self {
        self.cycle_delay_ms = millis(delay);
        self
    }

    /// Replace the action steps.
    pub fn with_actions(mut self, actions: Vec<ActionConfig>) -> Self {
        self.actions = actions;
        self
    }
}

/// One post-handshake step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActionConfig {
    /// Multipart upload of local files.
    Upload {
        #[serde(default = "default_upload_url")]
        url: String,
        #[serde(default = "default_upload_files")]
        files: Vec<UploadFile>,
        #[serde(default = "default_action_timeout_ms")]
        timeout_ms: u64,
    },
    /// Run a local program and wait for it.
    Command {
        #[serde(default = "default_capture_program")]
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default = "default_action_timeout_ms")]
        timeout_ms: u64,
    },
    /// Split-and-recombine two local pictures.
    Combine {
        #[serde(default = "default_combine_left")]
        left: PathBuf,
        #[serde(default = "default_combine_right")]
        right: PathBuf,
        #[serde(default = "default_combine_output")]
        output: PathBuf,
    },
}

impl ActionConfig {
    /// Upload of the color and depth pictures to the picture server.
    pub fn default_upload() -> Self {
        ActionConfig::Upload {
            url: default_upload_url(),
            files: default_upload_files(),
            timeout_ms: default_action_timeout_ms(),
        }
    }

    /// Run of the capture program.
    pub fn default_capture() -> Self {
        ActionConfig::Command {
            program: default_capture_program(),
            args: Vec::new(),
            timeout_ms: default_action_timeout_ms(),
        }
    }

    /// Combine of the two color pictures.
    pub fn default_combine() -> Self {
        ActionConfig::Combine {
            left: default_combine_left(),
            right: default_combine_right(),
            output: default_combine_output(),
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionConfig::Upload { .. } => "upload",
            ActionConfig::Command { .. } => "command",
            ActionConfig::Combine { .. } => "combine",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            ActionConfig::Upload { url, files, .. } => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(config_err(format!("upload url must be http(s): {}", url)));
                }
                if files.is_empty() {
                    return Err(config_err("upload needs at least one file"));
                }
            }
            ActionConfig::Command { program, .. } => {
                if program.trim().is_empty() {
                    return Err(config_err("command program must not be empty"));
                }
            }
            ActionConfig::Combine { .. } => {}
        }
        Ok(())
    }
}

/// Form field name and the file sent under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFile {
    pub name: String,
    pub path: PathBuf,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

fn config_err(message: impl Into<String>) -> Error {
    Error::Config {
        message: message.into(),
    }
}

fn default_upload_url() -> String {
    DEFAULT_UPLOAD_URL.to_string()
}

fn default_upload_files() -> Vec<UploadFile> {
    vec![
        UploadFile::new("picture", DEFAULT_UPLOAD_PICTURE),
        UploadFile::new("depth", DEFAULT_UPLOAD_DEPTH),
    ]
}

fn default_action_timeout_ms() -> u64 {
    millis(DEFAULT_ACTION_TIMEOUT)
}

fn default_capture_program() -> String {
    DEFAULT_CAPTURE_PROGRAM.to_string()
}

fn default_combine_left() -> PathBuf {
    PathBuf::from(DEFAULT_COMBINE_LEFT)
}

fn default_combine_right() -> PathBuf {
    PathBuf::from(DEFAULT_COMBINE_RIGHT)
}

fn default_combine_output() -> PathBuf {
    PathBuf::from(DEFAULT_COMBINE_OUTPUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_client() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint(), Endpoint::new("photoboard.tech", 8008));
        assert_eq!(config.backoff().base(), Duration::from_secs(2));
        assert!(config.actions.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(ClientConfig::from_toml_str("").unwrap(), ClientConfig::default());
    }

    #[test]
    fn toml_overrides_and_actions() {
        let config = ClientConfig::from_toml_str(
            r#"
            host = "127.0.0.1"
            port = 9000
            retry_jitter_ms = 0
            max_attempts = 5

            [[actions]]
            kind = "command"
            args = ["--once"]

            [[actions]]
            kind = "combine"

            [[actions]]
            kind = "upload"
            url = "https://example.test/upload"
            files = [{ name = "picture", path = "/tmp/p.png" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint().to_string(), "127.0.0.1:9000");
        assert_eq!(config.max_attempts, Some(5));
        assert_eq!(config.retry_jitter_ms, 0);
        assert_eq!(config.actions.len(), 3);
        assert_eq!(
            config.actions[0],
            ActionConfig::Command {
                program: "photoboard".into(),
                args: vec!["--once".into()],
                timeout_ms: 120_000,
            }
        );
        assert_eq!(config.actions[1], ActionConfig::default_combine());
        assert_eq!(config.actions[2].kind(), "upload");
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = ClientConfig::from_toml_str("hots = \"typo\"").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn validation_errors() {
        assert!(ClientConfig::new().with_endpoint("", 8008).validate().is_err());
        assert!(ClientConfig::new().with_endpoint("h", 0).validate().is_err());
        assert!(
            ClientConfig::new()
                .with_recv_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(ClientConfig::new().with_max_attempts(Some(0)).validate().is_err());
        assert!(
            ClientConfig::new()
                .with_actions(vec![ActionConfig::Upload {
                    url: "ftp://nope".into(),
                    files: default_upload_files(),
                    timeout_ms: 1,
                }])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn zero_timeouts_rejected() {
        for toml in ["connect_timeout_ms = 0", "recv_timeout_ms = 0", "send_timeout_ms = 0"] {
            let err = ClientConfig::from_toml_str(toml).unwrap_err();
            assert!(err.is_fatal(), "{} accepted", toml);
            assert!(err.to_string().contains("must be non-zero"), "{}: {}", toml, err);
        }
    }

    #[test]
    fn builder_sets_durations() {
        let config = ClientConfig::new()
            .with_retry(Duration::from_millis(500), Duration::ZERO)
            .with_action_delay(Duration::from_secs(1))
            .with_cycle_delay(Duration::from_secs(3));

        assert_eq!(config.backoff().max_delay(), Duration::from_millis(500));
        assert_eq!(config.action_delay(), Duration::from_secs(1));
        assert_eq!(config.cycle_delay(), Duration::from_secs(3));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photoboard.toml");
        std::fs::write(&path, "port = 7000\n").unwrap();

        assert_eq!(ClientConfig::load(&path).unwrap().port, 7000);
        assert!(ClientConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
