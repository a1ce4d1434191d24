//! HTTP transport layer for the docdb HTTP connection.
//!
//! This module provides the [`HyperTransport`] type, which handles HTTP
//! communication using hyper_util's legacy client. It supports:
//!
//! - HTTP/1.1 and HTTP/2 (prior knowledge) over plain TCP
//! - Connection pooling
//! - Tower service integration for middleware
//!
//! # Example
//!
//! ```ignore
//! use docdb_driver_http::transport::{HyperTransport, HyperTransportBuilder};
//! use std::time::Duration;
//!
//! // Create with default settings
//! let transport = HyperTransport::new()?;
//!
//! // Or use the builder for customization
//! let transport = HyperTransportBuilder::new()
//!     .http2_only(true)
//!     .pool_idle_timeout(Duration::from_secs(60))
//!     .build()?;
//! ```

mod body;
mod hyper;

pub use body::TransportBody;
pub use hyper::{HyperTransport, HyperTransportBuilder};
