//! Wire-level types for the photoboard handshake.
//!
//! The protocol is three raw writes over TCP with no framing:
//!
//! ```text
//! client -> server   "CONN"
//! server -> client   <identifier, 1..=40 bytes, one read>
//! client -> server   "OK"
//! ```

use std::fmt;

use bytes::Bytes;

use crate::constants::MAX_SESSION_ID_LEN;
use crate::error::{Error, Result};

/// Opaque identifier issued by the server for one handshake.
///
/// Never empty and never longer than [`MAX_SESSION_ID_LEN`] bytes. The bytes
/// are kept exactly as received; no trimming or decoding happens.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(Bytes);

impl SessionId {
    /// Build an identifier from a received chunk.
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(Error::Protocol {
                message: "empty session identifier".into(),
            });
        }
        if bytes.len() > MAX_SESSION_ID_LEN {
            return Err(Error::Protocol {
                message: format!(
                    "session identifier is {} bytes, limit is {}",
                    bytes.len(),
                    MAX_SESSION_ID_LEN
                ),
            });
        }
        Ok(Self(bytes))
    }

    /// Raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identifier as text, replacing invalid UTF-8.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl TryFrom<&str> for SessionId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(Bytes::copy_from_slice(value.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            SessionId::new(Bytes::new()),
            Err(Error::Protocol { .. })
        ));
    }

    #[test]
    fn rejects_oversized() {
        let long = vec![b'a'; MAX_SESSION_ID_LEN + 1];
        assert!(SessionId::new(long).is_err());
    }

    #[test]
    fn keeps_bytes_verbatim() {
        let id = SessionId::try_from(" a1b2 \n").unwrap();
        assert_eq!(id.as_bytes(), b" a1b2 \n");
        assert_eq!(id.len(), 7);
    }

    #[test]
    fn display_is_lossy_utf8() {
        let id = SessionId::new(vec![b'o', b'k', 0xFF]).unwrap();
        assert_eq!(id.to_string(), "ok\u{FFFD}");
    }
}
