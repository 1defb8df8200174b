//! Protocol and configuration constants for photoboard.

use std::time::Duration;

// =============================================================================
// Protocol Constants
// =============================================================================

/// Token the client sends right after connecting.
pub const CONNECT_TOKEN: &[u8] = b"CONN";

/// Token the client sends after the identifier has been persisted.
pub const ACK_TOKEN: &[u8] = b"OK";

/// Upper bound on the identifier chunk read from the server.
pub const MAX_SESSION_ID_LEN: usize = 40;

// =============================================================================
// Endpoint Defaults
// =============================================================================

/// Default handshake server host.
pub const DEFAULT_HOST: &str = "photoboard.tech";

/// Default handshake server port.
pub const DEFAULT_PORT: u16 = 8008;

/// Default file holding the most recent session identifier.
pub const DEFAULT_SESSION_FILE: &str = "photoboard-session-id";

// =============================================================================
// Timing Constants
// =============================================================================

/// Delay between failed attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Upper bound of the random jitter added to the retry delay.
pub const DEFAULT_RETRY_JITTER: Duration = Duration::from_millis(250);

/// TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait for the server to send the identifier.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for sending tokens and closing the socket.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout applied to each external action step.
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(120);

// =============================================================================
// Action Defaults
// =============================================================================

/// Upload endpoint for captured pictures.
pub const DEFAULT_UPLOAD_URL: &str = "http://photoboard.tech/api/picture_server/";

/// Color picture sent as the `picture` form field.
pub const DEFAULT_UPLOAD_PICTURE: &str = "/home/root/photoboard-image-COLOR.png";

/// Depth picture sent as the `depth` form field.
pub const DEFAULT_UPLOAD_DEPTH: &str = "/home/root/photoboard-image-DEPTH.png";

/// Capture program run by the command action.
pub const DEFAULT_CAPTURE_PROGRAM: &str = "photoboard";

/// Environment variable carrying the identifier into spawned programs.
pub const SESSION_ID_ENV: &str = "PHOTOBOARD_SESSION_ID";

/// Image whose left half ends up in the combined picture.
pub const DEFAULT_COMBINE_LEFT: &str = "photoboard-image-COLOR1.png";

/// Image whose right half ends up in the combined picture.
pub const DEFAULT_COMBINE_RIGHT: &str = "photoboard-image-COLOR2.png";

/// Combined picture.
pub const DEFAULT_COMBINE_OUTPUT: &str = "photoboard-image-COLOR.png";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_fixed() {
        assert_eq!(CONNECT_TOKEN, b"CONN");
        assert_eq!(ACK_TOKEN, b"OK");
    }

    #[test]
    fn timeouts_are_nonzero() {
        assert!(!DEFAULT_RECV_TIMEOUT.is_zero());
        assert!(!DEFAULT_CONNECT_TIMEOUT.is_zero());
        assert!(DEFAULT_RETRY_JITTER < DEFAULT_RETRY_DELAY);
    }
}
