//! Handshake client states.

use std::fmt;

/// Where the handshake loop currently is.
///
/// ```text
/// Disconnected -> Connecting -> Connected -> Handshaking -> Acting -> Disconnected
///                     |                          |
///                     +------ (failure) ---------+----> Disconnected
/// ```
///
/// Any state may move to `Stopped`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// Idle between attempts.
    Disconnected,
    /// Opening the TCP connection.
    Connecting,
    /// Socket is open, nothing sent yet.
    Connected,
    /// Exchanging `CONN` / identifier / `OK`.
    Handshaking,
    /// Running the post-handshake action.
    Acting,
    /// Loop has exited.
    Stopped,
}

impl ClientState {
    /// Check if `self -> next` is an edge of the state machine.
    pub fn can_transition_to(self, next: ClientState) -> bool {
        use ClientState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Handshaking)
                | (Connected, Disconnected)
                | (Handshaking, Acting)
                | (Handshaking, Disconnected)
                | (Acting, Disconnected)
                | (_, Stopped)
        ) && self != Stopped
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::Disconnected => "disconnected",
            ClientState::Connecting => "connecting",
            ClientState::Connected => "connected",
            ClientState::Handshaking => "handshaking",
            ClientState::Acting => "acting",
            ClientState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
