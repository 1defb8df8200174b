//! photoboard-core: handshake client and picture utilities for photoboard.
//!
//! This crate provides:
//! - The `CONN` / identifier / `OK` handshake over TCP
//! - A retrying handshake loop with an explicit state machine
//! - Persistence of the latest session identifier
//! - Post-handshake actions (capture command, image combine, upload)
//! - The split-and-recombine image utility
//! - Configuration, errors and logging

pub mod action;
pub mod client;
pub mod combine;
pub mod config;
pub mod constants;
pub mod error;
pub mod handshake;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod store;
pub mod timing;
pub mod transport;

pub use client::{ActionOutcome, CycleOutcome, HandshakeClient, RunSummary};
pub use config::{ActionConfig, ClientConfig, UploadFile};
pub use error::{Error, Result};
pub use logging::{LogFormat, init_logging};
pub use protocol::SessionId;
