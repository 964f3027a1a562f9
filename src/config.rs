//! # Configuration
//!
//! Loaded from TOML (`from_file`, `from_toml`) or built in code from the defaults. Missing
//! sections fall back to their defaults.
//!
//! ## Security Considerations
//! - The RSA public key used by the channel handshake is deployment configuration; no key
//!   is compiled into the library and the default configuration does not validate until
//!   one is supplied
//! - The batch size limit bounds allocations driven by a peer-declared size, and the
//!   nesting limit bounds how many of those allocations one envelope can stack up

use crate::error::{ProtocolError, Result};
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::Level;

/// Default limit on a compressed batch's declared size (16 MiB)
pub const MAX_BATCH_SIZE: usize = 16 * 1024 * 1024;

/// Default number of batches that may enclose one another
pub const DEFAULT_BATCH_NESTING: usize = 2;

/// Highest nesting limit accepted by validation
pub const MAX_BATCH_NESTING: usize = 8;

/// Smallest RSA modulus accepted for the channel handshake
pub const MIN_RSA_MODULUS_BITS: usize = 1024;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub handshake: HandshakeConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ProtocolError::ConfigError(format!(
                "Failed to open config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// The defaults with `mutator` applied.
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// One message per problem found across all sections; empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.handshake.validate());
        errors.extend(self.batch.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// [`validate`](Self::validate), with every message folded into one `ConfigError`.
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HandshakeConfig {
    /// SubjectPublicKeyInfo PEM (`-----BEGIN PUBLIC KEY-----`) of the server's RSA key
    pub public_key_pem: String,
}

impl HandshakeConfig {
    pub fn new(public_key_pem: impl Into<String>) -> Self {
        Self {
            public_key_pem: public_key_pem.into(),
        }
    }

    /// Parse the configured key.
    ///
    /// # Errors
    /// Returns `ProtocolError::ConfigError` if the PEM is missing, malformed, or the modulus
    /// is shorter than `MIN_RSA_MODULUS_BITS`
    pub fn public_key(&self) -> Result<RsaPublicKey> {
        if self.public_key_pem.trim().is_empty() {
            return Err(ProtocolError::ConfigError(
                "Handshake public key is not configured".to_string(),
            ));
        }

        let key = RsaPublicKey::from_public_key_pem(self.public_key_pem.trim()).map_err(|e| {
            ProtocolError::ConfigError(format!("Invalid handshake public key: {e}"))
        })?;

        let bits = key.size() * 8;
        if bits < MIN_RSA_MODULUS_BITS {
            return Err(ProtocolError::ConfigError(format!(
                "Handshake public key too short: {bits} bits (minimum: {MIN_RSA_MODULUS_BITS})"
            )));
        }
        Ok(key)
    }

    pub fn validate(&self) -> Vec<String> {
        match self.public_key() {
            Ok(_) => Vec::new(),
            Err(ProtocolError::ConfigError(msg)) => vec![msg],
            Err(e) => vec![e.to_string()],
        }
    }
}

/// Limits applied while expanding batches.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Largest declared uncompressed size accepted for a compressed batch
    #[serde(default = "default_max_uncompressed_size")]
    pub max_uncompressed_size: usize,

    /// How many batches may enclose one another. `1` accepts batches but not a batch
    /// inside a batch.
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
}

fn default_max_uncompressed_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_max_nesting_depth() -> usize {
    DEFAULT_BATCH_NESTING
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_uncompressed_size: MAX_BATCH_SIZE,
            max_nesting_depth: DEFAULT_BATCH_NESTING,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_uncompressed_size == 0 {
            errors.push("Batch size limit must be greater than 0".to_string());
        } else if self.max_uncompressed_size > u32::MAX as usize {
            errors.push(format!(
                "Batch size limit too large: {} bytes (declared sizes are 32-bit)",
                self.max_uncompressed_size
            ));
        }

        if self.max_nesting_depth == 0 {
            errors.push("Batch nesting depth must be at least 1".to_string());
        } else if self.max_nesting_depth > MAX_BATCH_NESTING {
            errors.push(format!(
                "Batch nesting depth too deep: {} (maximum: {MAX_BATCH_NESTING})",
                self.max_nesting_depth
            ));
        }

        errors
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name attached to the startup log line
    pub app_name: String,

    /// Filter used when `RUST_LOG` is unset
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// One JSON object per line instead of the human-readable format
    pub json_format: bool,

    /// Whether to include the event target (module path) in log lines
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("steam-dispatch"),
            log_level: Level::INFO,
            json_format: false,
            show_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// `tracing::Level` as a lowercase name.
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::Level;

    pub fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.as_str().to_ascii_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse::<Level>()
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {name}")))
    }
}
