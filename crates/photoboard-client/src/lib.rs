//! photoboard-client: command-line front end for the photoboard handshake
//! client.
//!
//! Provides:
//! - CLI argument parsing
//! - Layering of CLI flags over the TOML config

pub mod cli;

pub use cli::{
    ActionArg, Cli, CliLogFormat, CombineArgs, Commands, RunArgs, SessionArgs, UploadArgs,
};
