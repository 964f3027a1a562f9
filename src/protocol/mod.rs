//! # Protocol Layer
//!
//! Message kinds, the channel handshake, batch expansion, per-kind decoders and the
//! dispatcher that ties them to application callbacks.
//!
//! ## Components
//! - **Message**: `EMsg`, `EResult` and the envelope types
//! - **Handshake**: RSA-OAEP session key exchange
//! - **Batch**: `Multi` unpacking, plain or zip-compressed
//! - **Decoders**: length-checked parsers for each routed kind
//! - **Callbacks**: `EventHandler` trait and the closure registry
//! - **Dispatcher**: routing, reply synthesis and heartbeat scheduling
//! - **State**: per-connection encryption flag, session key and identity
//!
//! ## Flow
//! ```text
//! raw bytes -> Header::parse -> Envelope -> Dispatcher::dispatch
//!     Multi               -> BatchUnpacker -> worklist
//!     ChannelEncrypt*     -> HandshakeCoordinator
//!     everything routed   -> decoders -> EventHandler
//! ```

pub mod batch;
pub mod callbacks;
pub mod decoders;
pub mod dispatcher;
pub mod handshake;
pub mod message;
pub mod state;
