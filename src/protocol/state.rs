//! Per-connection state shared between the handshake, the decoders and the transport.

use crate::core::header::Identity;
use crate::error::{constants, ProtocolError, Result};
use rand_core::{OsRng, RngCore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the symmetric session key negotiated by the handshake.
pub const SESSION_KEY_LEN: usize = 32;

/// Whether traffic on this connection is protected by the session key.
///
/// Cloning yields another handle to the same flag, so a transport can hold one and read it
/// on every send. Only the handshake can set it, and it never resets.
#[derive(Debug, Clone, Default)]
pub struct EncryptionState {
    encrypted: Arc<AtomicBool>,
}

impl EncryptionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted.load(Ordering::Acquire)
    }

    /// Flip to encrypted. Returns `false` if the flag was already set.
    pub(crate) fn mark_encrypted(&self) -> bool {
        !self.encrypted.swap(true, Ordering::AcqRel)
    }
}

/// 32 random bytes, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    /// Draw a fresh key from the OS RNG.
    ///
    /// An unavailable RNG is reported as `CryptoFailure`.
    pub fn generate() -> Result<Self> {
        let mut key = Self([0u8; SESSION_KEY_LEN]);
        OsRng.try_fill_bytes(&mut key.0).map_err(|e| {
            ProtocolError::CryptoFailure(format!(
                "{}: {e}",
                constants::ERR_SESSION_KEY_GENERATION
            ))
        })?;
        Ok(key)
    }

    pub fn from_bytes(bytes: [u8; SESSION_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// Connection-scoped values learned while dispatching.
#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    pub encryption: EncryptionState,
    pub identity: Identity,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt the identity from an inbound header once the server has assigned a session.
    pub(crate) fn observe_identity(&mut self, identity: Identity) {
        if identity.is_assigned() && identity != self.identity {
            tracing::debug!(
                steam_id = %identity.steam_id,
                session_id = identity.session_id,
                "Session identity assigned"
            );
            self.identity = identity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::SteamId;

    #[test]
    fn test_encryption_flag_transitions_once() {
        let state = EncryptionState::new();
        let transport_view = state.clone();
        assert!(!transport_view.is_encrypted());
        assert!(state.mark_encrypted());
        assert!(!state.mark_encrypted());
        assert!(transport_view.is_encrypted());
    }

    #[test]
    fn test_session_keys_are_distinct() {
        let a = SessionKey::generate().unwrap();
        let b = SessionKey::generate().unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
        assert_eq!(format!("{a:?}"), "SessionKey(..)");
    }

    #[test]
    fn test_unassigned_identity_is_ignored() {
        let mut state = ConnectionState::new();
        state.observe_identity(Identity {
            steam_id: SteamId(5),
            session_id: 0,
        });
        assert_eq!(state.identity, Identity::default());

        let assigned = Identity {
            steam_id: SteamId(5),
            session_id: 7,
        };
        state.observe_identity(assigned);
        assert_eq!(state.identity, assigned);
    }
}
