//! Structured logging setup.
//!
//! The library itself only emits `tracing` events. Applications that do not bring their
//! own subscriber can call [`init_logging`] once at startup.

use crate::config::LoggingConfig;
use crate::error::{ProtocolError, Result};
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber built from `config`.
///
/// `RUST_LOG` takes precedence over the configured level when set. Calling this a
/// second time is harmless: the existing subscriber stays in place.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.as_str().to_lowercase()))
        .map_err(|e| ProtocolError::ConfigError(format!("Invalid log filter: {e}")))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.show_target);

    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    match installed {
        Ok(()) => tracing::info!(app = %config.app_name, "Logging initialized"),
        Err(_) => tracing::debug!("Global subscriber already installed, keeping it"),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LoggingConfig::default();
        init_logging(&config).unwrap();
        init_logging(&config).unwrap();
    }
}
