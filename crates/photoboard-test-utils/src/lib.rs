//! photoboard-test-utils: Test infrastructure for photoboard.
//!
//! Provides:
//! - ScriptedConnector: connect results fed from a script, no network
//! - FakeClock: records sleeps instead of waiting
//! - RecordingAction: action that remembers what it was called with
//! - HandshakeServer: loopback TCP server speaking the handshake
//! - Image fixtures

mod fake_clock;
mod fixtures;
mod handshake_server;
mod mock_transport;
mod recording_action;

pub use fake_clock::FakeClock;
pub use fixtures::{BLUE, RED, write_solid_png};
pub use handshake_server::{HandshakeServer, ServerReply};
pub use mock_transport::{ConnectStep, PeerLog, ScriptedConnector, scripted_peer};
pub use recording_action::RecordingAction;
