//! # Service Boundary
//!
//! The two seams between the dispatch core and the surrounding connection: sending
//! outbound messages and running periodic work.
//!
//! ## Components
//! - **Transport**: `Transport` trait and a tokio channel adapter
//! - **Timer**: `IntervalTimer` trait and a cancellable tokio implementation

pub mod timer;
pub mod transport;

pub use timer::{IntervalTimer, TokioIntervalTimer};
pub use transport::{ChannelTransport, Transport};
