//! # Error Types
//!
//! Error handling for the dispatch core.
//!
//! Every structural check on inbound data is an unconditional runtime validation that
//! surfaces as one of the variants below. Nothing is compiled out in release builds.
//!
//! ## Error Categories
//! - **Protocol violations**: short envelopes, unexpected cardinality, bad discriminators
//! - **Framing errors**: batch record lengths that do not sum to the batch payload
//! - **Decompression failures**: malformed container, wrong entry name/count, size mismatch
//! - **Crypto failures**: session key generation or RSA encryption errors
//! - **Handshake rejections**: the server answered the key exchange with a non-OK result
//!
//! Unhandled message kinds and events without a registered listener are deliberately
//! *not* errors; the dispatcher logs and counts them instead.
//!
//! ## Example Usage
//! ```rust
//! use steam_dispatch::error::{ProtocolError, Result};
//!
//! fn require_len(payload: &[u8], needed: usize) -> Result<()> {
//!     if payload.len() < needed {
//!         return Err(ProtocolError::ProtocolViolation(format!(
//!             "need {needed} bytes, got {}",
//!             payload.len()
//!         )));
//!     }
//!     Ok(())
//! }
//!
//! assert!(require_len(b"abc", 4).is_err());
//! ```

use crate::protocol::message::EResult;
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Handshake errors
    pub const ERR_UNEXPECTED_ENCRYPT_REQUEST: &str =
        "Encryption request received after the handshake already started";
    pub const ERR_UNEXPECTED_ENCRYPT_RESULT: &str =
        "Encryption result received without an outstanding encryption response";
    pub const ERR_SESSION_KEY_GENERATION: &str = "Failed to generate session key";
    pub const ERR_SESSION_KEY_ENCRYPTION: &str = "Failed to encrypt session key";
    pub const ERR_CIPHERTEXT_SIZE: &str = "Encrypted session key does not match modulus size";

    /// Batch errors
    pub const ERR_RECORD_HEADER_TRUNCATED: &str = "Trailing partial sub-envelope length";
    pub const ERR_RECORD_OVERRUN: &str = "Sub-envelope length overruns batch payload";
    pub const ERR_CONTAINER_OPEN: &str = "Failed to open compressed container";
    pub const ERR_CONTAINER_ENTRY_COUNT: &str = "Compressed container must hold exactly one entry";
    pub const ERR_CONTAINER_ENTRY_NAME: &str = "Compressed container entry is not named \"z\"";
    pub const ERR_CONTAINER_ENTRY_SIZE: &str =
        "Compressed container entry size does not match declared size";
    pub const ERR_CONTAINER_READ: &str = "Failed to inflate compressed container entry";
    pub const ERR_DECLARED_SIZE_LIMIT: &str = "Declared uncompressed size exceeds limit";
    pub const ERR_BATCH_NESTING: &str = "Batch nesting exceeds limit";

    /// Decoder errors
    pub const ERR_MISSING_NUL: &str = "Chat room name is not NUL-terminated";
    pub const ERR_PERSONA_CARDINALITY: &str = "Persona state must carry exactly one friend";
    pub const ERR_HEARTBEAT_INTERVAL: &str = "Logon succeeded with a non-positive heartbeat interval";

    /// Header errors
    pub const ERR_HEADER_CANARY: &str = "Extended header canary mismatch";
    pub const ERR_HEADER_SIZE: &str = "Extended header declares an unexpected size";
}

/// ProtocolError is the primary error type for all dispatch operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Framing error: {0}")]
    FramingError(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailure(String),

    #[error("Crypto failure: {0}")]
    CryptoFailure(String),

    #[error("Handshake rejected with result {0}")]
    HandshakeRejected(EResult),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Build a violation for an envelope shorter than its fixed layout.
    pub(crate) fn short(layout: &'static str, needed: usize, actual: usize) -> Self {
        ProtocolError::ProtocolViolation(format!(
            "{layout} requires {needed} bytes, envelope has {actual}"
        ))
    }
}

impl From<prost::DecodeError> for ProtocolError {
    fn from(err: prost::DecodeError) -> Self {
        ProtocolError::ProtocolViolation(format!("Malformed protobuf body: {err}"))
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
