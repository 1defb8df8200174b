//! Client CLI implementation.
//!
//! Provides command-line argument parsing using clap, and the layering of
//! flags over the optional TOML config file.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use photoboard_core::constants::{
    DEFAULT_ACTION_TIMEOUT, DEFAULT_COMBINE_LEFT, DEFAULT_COMBINE_OUTPUT, DEFAULT_COMBINE_RIGHT,
    DEFAULT_UPLOAD_DEPTH, DEFAULT_UPLOAD_PICTURE, DEFAULT_UPLOAD_URL,
};
use photoboard_core::{ActionConfig, ClientConfig, UploadFile};

/// Log output format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CliLogFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// Structured JSON output.
    Json,
}

impl From<CliLogFormat> for photoboard_core::LogFormat {
    fn from(fmt: CliLogFormat) -> Self {
        match fmt {
            CliLogFormat::Text => photoboard_core::LogFormat::Text,
            CliLogFormat::Json => photoboard_core::LogFormat::Json,
        }
    }
}

/// What to do after each successful handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    /// Nothing; just keep the identifier fresh.
    None,
    /// Upload the color and depth pictures.
    Upload,
    /// Run the capture program.
    Capture,
    /// Capture, combine the two color pictures, then upload.
    Pipeline,
}

impl ActionArg {
    /// The action steps this choice stands for.
    pub fn steps(self) -> Vec<ActionConfig> {
        match self {
            ActionArg::None => Vec::new(),
            ActionArg::Upload => vec![ActionConfig::default_upload()],
            ActionArg::Capture => vec![ActionConfig::default_capture()],
            ActionArg::Pipeline => vec![
                ActionConfig::default_capture(),
                ActionConfig::default_combine(),
                ActionConfig::Upload {
                    url: DEFAULT_UPLOAD_URL.to_string(),
                    files: vec![
                        UploadFile::new("picture", DEFAULT_COMBINE_OUTPUT),
                        UploadFile::new("depth", DEFAULT_UPLOAD_DEPTH),
                    ],
                    timeout_ms: DEFAULT_ACTION_TIMEOUT.as_millis() as u64,
                },
            ],
        }
    }
}

/// Photoboard handshake client.
#[derive(Debug, Parser)]
#[command(
    name = "photoboard-client",
    version,
    about = "Photoboard handshake client and picture tools"
)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log to file instead of stderr
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(long = "log-format", default_value = "text", global = true)]
    pub log_format: CliLogFormat,

    /// TOML config file
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the handshake loop
    Run(RunArgs),
    /// Combine the left half of one picture with the right half of another
    Combine(CombineArgs),
    /// Upload pictures once
    Upload(UploadArgs),
    /// Print the stored session identifier
    Session(SessionArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Handshake server host
    #[arg(long)]
    pub host: Option<String>,

    /// Handshake server port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// File holding the latest session identifier
    #[arg(long = "session-file", value_name = "PATH")]
    pub session_file: Option<PathBuf>,

    /// Delay between failed attempts
    #[arg(long = "retry-delay-ms", value_name = "MS")]
    pub retry_delay_ms: Option<u64>,

    /// How long to wait for the session identifier
    #[arg(long = "recv-timeout-ms", value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub recv_timeout_ms: Option<u64>,

    /// Pause after every successful cycle
    #[arg(long = "cycle-delay-ms", value_name = "MS")]
    pub cycle_delay_ms: Option<u64>,

    /// Action run after each handshake (overrides the config file)
    #[arg(long, value_enum)]
    pub action: Option<ActionArg>,

    /// Stop after this many successful handshakes
    #[arg(long, value_name = "N")]
    pub cycles: Option<u64>,
}

impl RunArgs {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(path) = &self.session_file {
            config = config.with_session_file(path.clone());
        }
        if let Some(ms) = self.retry_delay_ms {
            config.retry_delay_ms = ms;
        }
        if let Some(ms) = self.recv_timeout_ms {
            config = config.with_recv_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.cycle_delay_ms {
            config = config.with_cycle_delay(Duration::from_millis(ms));
        }
        if let Some(action) = self.action {
            config = config.with_actions(action.steps());
        }
        config
    }
}

#[derive(Debug, Clone, Args)]
pub struct CombineArgs {
    /// Picture providing the left half
    #[arg(long, default_value = DEFAULT_COMBINE_LEFT)]
    pub left: PathBuf,

    /// Picture providing the right half
    #[arg(long, default_value = DEFAULT_COMBINE_RIGHT)]
    pub right: PathBuf,

    /// Output picture
    #[arg(short = 'o', long, default_value = DEFAULT_COMBINE_OUTPUT)]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct UploadArgs {
    /// Upload endpoint
    #[arg(long, default_value = DEFAULT_UPLOAD_URL)]
    pub url: String,

    /// Color picture, sent as `picture`
    #[arg(long, default_value = DEFAULT_UPLOAD_PICTURE)]
    pub picture: PathBuf,

    /// Depth picture, sent as `depth`
    #[arg(long, default_value = DEFAULT_UPLOAD_DEPTH)]
    pub depth: PathBuf,
}

impl UploadArgs {
    pub fn files(&self) -> Vec<UploadFile> {
        vec![
            UploadFile::new("picture", &self.picture),
            UploadFile::new("depth", &self.depth),
        ]
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct SessionArgs {
    /// File holding the latest session identifier
    #[arg(long = "session-file", value_name = "PATH")]
    pub session_file: Option<PathBuf>,
}

impl Cli {
    /// Defaults, overlaid with the config file when one was given.
    pub fn base_config(&self) -> photoboard_core::Result<ClientConfig> {
        match &self.config {
            Some(path) => ClientConfig::load(path),
            None => Ok(ClientConfig::default()),
        }
    }

    /// Fully layered config for the `run` command: defaults, file, flags.
    pub fn run_config(&self, args: &RunArgs) -> photoboard_core::Result<ClientConfig> {
        let config = args.apply(self.base_config()?);
        config.validate()?;
        Ok(config)
    }
}
