//! Channel encryption handshake.
//!
//! The server opens every connection with an encryption request. The client answers with
//! a fresh 32-byte session key wrapped under the server's RSA public key (OAEP padding,
//! SHA-1 digest), followed by a CRC32 of the ciphertext and four reserved zero bytes. The
//! server then reports the outcome in an encryption result.
//!
//! ```text
//! Unencrypted --request--> AwaitingResult --result OK--> Encrypted
//!                                         --result !OK--> Failed
//! ```
//!
//! **Per-Connection State**
//! The session key and state live in a [`HandshakeCoordinator`] owned by one dispatcher.
//! The encrypted flag it flips is an [`EncryptionState`] handle the transport also holds.

use crate::config::HandshakeConfig;
use crate::core::reader::WireReader;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::callbacks::EventHandler;
use crate::protocol::message::{EMsg, EResult, OutboundMessage};
use crate::protocol::state::{EncryptionState, SessionKey};
use bytes::{BufMut, Bytes, BytesMut};
use rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPublicKey};
use sha1::Sha1;
use tracing::{debug, info, instrument, warn};

/// Protocol version written into the encryption response.
pub const CHANNEL_PROTOCOL_VERSION: u32 = 1;

const ENCRYPT_REQUEST_LEN: usize = 8;
const ENCRYPT_RESULT_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Unencrypted,
    AwaitingResult,
    Encrypted,
    Failed,
}

/// Fields of the server's encryption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptRequest {
    pub protocol_version: u32,
    pub universe: u32,
}

impl EncryptRequest {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut reader = WireReader::new("ChannelEncryptRequest", payload);
        reader.require(ENCRYPT_REQUEST_LEN)?;
        Ok(Self {
            protocol_version: reader.u32()?,
            universe: reader.u32()?,
        })
    }
}

/// Drives the three-message key exchange for one connection.
pub struct HandshakeCoordinator {
    public_key: RsaPublicKey,
    state: HandshakeState,
    session_key: Option<SessionKey>,
}

impl HandshakeCoordinator {
    pub fn new(public_key: RsaPublicKey) -> Self {
        Self {
            public_key,
            state: HandshakeState::Unencrypted,
            session_key: None,
        }
    }

    pub fn from_config(config: &HandshakeConfig) -> Result<Self> {
        Ok(Self::new(config.public_key()?))
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Size in bytes of the wrapped session key, taken from the configured modulus.
    pub fn modulus_size(&self) -> usize {
        self.public_key.size()
    }

    /// Hand the negotiated key to the symmetric layer. Only yields once, and only after the
    /// server accepted it.
    pub fn take_session_key(&mut self) -> Option<SessionKey> {
        match self.state {
            HandshakeState::Encrypted => self.session_key.take(),
            _ => None,
        }
    }

    /// Answer an encryption request with a freshly wrapped session key.
    ///
    /// The response goes out through `send`. The key is kept and the state advances only
    /// once `send` succeeds, so a failed send leaves the coordinator ready for another
    /// request.
    ///
    /// # Errors
    /// - `ProtocolError::ProtocolViolation` if the request is short or arrives after the
    ///   handshake already started
    /// - `ProtocolError::CryptoFailure` if the key cannot be generated or wrapped
    /// - whatever `send` returns
    #[instrument(skip(self, payload, send), fields(len = payload.len()))]
    pub fn handle_request<F>(&mut self, payload: &[u8], send: F) -> Result<()>
    where
        F: FnOnce(OutboundMessage) -> Result<()>,
    {
        if self.state != HandshakeState::Unencrypted {
            return Err(ProtocolError::ProtocolViolation(
                constants::ERR_UNEXPECTED_ENCRYPT_REQUEST.into(),
            ));
        }

        let request = EncryptRequest::parse(payload)?;
        let key = SessionKey::generate()?;
        let body = self.encode_response(&key)?;

        debug!(
            universe = request.universe,
            protocol_version = request.protocol_version,
            key_size = self.modulus_size(),
            "Sending encryption response"
        );

        send(OutboundMessage {
            kind: EMsg::CHANNEL_ENCRYPT_RESPONSE,
            job_id: 0,
            body,
            encrypted: false,
        })?;

        self.session_key = Some(key);
        self.state = HandshakeState::AwaitingResult;
        Ok(())
    }

    /// `{u32 version}{u32 key_size}{ciphertext}{u32 crc32}{u32 0}`
    fn encode_response(&self, key: &SessionKey) -> Result<Bytes> {
        let modulus = self.modulus_size();
        let ciphertext = self
            .public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha1>(), key.as_bytes())
            .map_err(|e| {
                ProtocolError::CryptoFailure(format!(
                    "{}: {e}",
                    constants::ERR_SESSION_KEY_ENCRYPTION
                ))
            })?;

        if ciphertext.len() != modulus {
            return Err(ProtocolError::CryptoFailure(
                constants::ERR_CIPHERTEXT_SIZE.into(),
            ));
        }

        let mut buf = BytesMut::with_capacity(8 + modulus + 8);
        buf.put_u32_le(CHANNEL_PROTOCOL_VERSION);
        buf.put_u32_le(modulus as u32);
        buf.put_slice(&ciphertext);
        buf.put_slice(&response_trailer(&ciphertext));
        Ok(buf.freeze())
    }

    /// Apply the server's verdict.
    ///
    /// # Errors
    /// - `ProtocolError::ProtocolViolation` if the result is short or no response is
    ///   outstanding
    /// - `ProtocolError::HandshakeRejected` for any result other than OK; the encrypted
    ///   flag stays clear and no callback fires
    #[instrument(skip_all)]
    pub fn handle_result<H: EventHandler>(
        &mut self,
        payload: &[u8],
        encryption: &EncryptionState,
        handler: &mut H,
    ) -> Result<()> {
        if self.state != HandshakeState::AwaitingResult {
            return Err(ProtocolError::ProtocolViolation(
                constants::ERR_UNEXPECTED_ENCRYPT_RESULT.into(),
            ));
        }

        let mut reader = WireReader::new("ChannelEncryptResult", payload);
        reader.require(ENCRYPT_RESULT_LEN)?;
        let result = EResult(reader.u32()?);

        if !result.is_ok() {
            self.state = HandshakeState::Failed;
            self.session_key = None;
            warn!(%result, "Server rejected channel encryption");
            return Err(ProtocolError::HandshakeRejected(result));
        }

        self.state = HandshakeState::Encrypted;
        encryption.mark_encrypted();
        info!("Channel encryption established");
        handler.on_handshake();
        Ok(())
    }
}

/// CRC32 of the ciphertext (little-endian) followed by four reserved zero bytes.
///
/// Only the server checks this CRC.
fn response_trailer(ciphertext: &[u8]) -> [u8; 8] {
    let mut trailer = [0u8; 8];
    trailer[..4].copy_from_slice(&crc32fast::hash(ciphertext).to_le_bytes());
    trailer
}

impl std::fmt::Debug for HandshakeCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeCoordinator")
            .field("state", &self.state)
            .field("modulus_size", &self.modulus_size())
            .finish()
    }
}
