//! # Core Wire Components
//!
//! Low-level envelope handling: header framing, bounds-checked field access and the
//! protobuf schemas this core reads.
//!
//! ## Components
//! - **Header**: the three envelope header shapes and their codec
//! - **Reader**: little-endian field reader that validates length before every access
//! - **Schema**: prost definitions of the protobuf bodies
//!
//! ## Security
//! - No fixed layout is reinterpreted in place; every field is read through a length check
//! - Protobuf bodies are decoded with prost, unknown fields are skipped

pub mod header;
pub mod reader;
pub mod schema;
