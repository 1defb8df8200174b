//! Session state management for photoboard.
//!
//! This module provides:
//! - Constant-delay retry with bounded jitter
//! - The handshake client state machine

mod reconnect;
mod state;

pub use reconnect::BackoffPolicy;
pub use state::ClientState;
