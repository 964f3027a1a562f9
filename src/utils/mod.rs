//! # Utility Modules
//!
//! Supporting utilities for compression, logging and metrics.
//!
//! ## Components
//! - **Compression**: single-entry zip containers with declared-size enforcement
//! - **Logging**: `tracing-subscriber` setup from configuration
//! - **Metrics**: Thread-safe dispatch counters
//!
//! ## Security
//! - Declared sizes are bounded before any allocation (decompression bomb protection)

pub mod compression;
pub mod logging;
pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
