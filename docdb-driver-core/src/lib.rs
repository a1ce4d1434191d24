//! Core connection types for the docdb driver.
//!
//! This crate provides the types shared by every connection family
//! (`docdb-driver-http` today):
//!
//! ## Modules
//!
//! - `content_type`: Wire encodings and their MIME names
//! - `raw`: Undecoded payloads
//! - `context`: Immutable request context and server queue-time hints
//! - [`codec`]: The decoding policy (strict and lenient, JSON and MessagePack)
//! - `connection`: `Connection` and `Response` capability traits
//! - `error`: The driver error taxonomy

pub mod codec;
mod connection;
mod content_type;
mod context;
mod error;
mod raw;

pub use connection::*;
pub use content_type::*;
pub use context::*;
pub use error::*;
pub use raw::*;
