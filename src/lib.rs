//! # steam-dispatch
//!
//! Message-dispatch core for a client of the Steam connection-manager binary protocol.
//!
//! Inbound envelopes are parsed, batches are expanded, the one-time channel handshake is
//! performed and each decoded message is routed to an [`EventHandler`]. Replies the
//! protocol requires (encryption response, machine auth acknowledgement, heartbeats) are
//! handed to a [`Transport`]; the socket, the symmetric cipher and reconnect policy are
//! the caller's.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use steam_dispatch::{CallbackRegistry, ChannelTransport, ClientConfig, Dispatcher, TokioIntervalTimer};
//!
//! # async fn run(pem: String, frames: Vec<bytes::Bytes>) -> steam_dispatch::Result<()> {
//! let config = ClientConfig::default_with_overrides(|c| c.handshake.public_key_pem = pem);
//!
//! let mut callbacks = CallbackRegistry::new();
//! callbacks.set_log_on(|result, steam_id| println!("logged on as {steam_id}: {result}"));
//!
//! let (transport, _outbound) = ChannelTransport::new();
//! let timer = TokioIntervalTimer::current()?;
//! let mut dispatcher = Dispatcher::new(&config, callbacks, Arc::new(transport), Arc::new(timer))?;
//!
//! for frame in frames {
//!     dispatcher.handle_message(frame)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod utils;

pub use config::ClientConfig;
pub use error::{ProtocolError, Result};
pub use protocol::callbacks::{CallbackRegistry, EventHandler, EventKind, NoopHandler};
pub use protocol::dispatcher::Dispatcher;
pub use protocol::handshake::{HandshakeCoordinator, HandshakeState};
pub use protocol::message::{EMsg, EResult, Envelope, OutboundMessage, SteamId};
pub use protocol::state::{EncryptionState, SessionKey};
pub use service::{ChannelTransport, IntervalTimer, TokioIntervalTimer, Transport};
