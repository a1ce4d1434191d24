//! HTTP connection family for the docdb driver.
//!
//! This crate provides an HTTP implementation of the
//! [`Connection`](docdb_driver_core::Connection) trait, plus debug wrappers
//! that turn every decode into a strict one.
//!
//! ## Features
//!
//! - JSON and MessagePack bodies, chosen per connection
//! - Round-robin over several endpoints
//! - Context deadlines and server-side queue-time hints
//! - Strict decoding for development runs via
//!   [`new_connection_debug_wrapper`]
//!
//! ## Example
//!
//! ```ignore
//! use docdb_driver_http::{Connection, Context, HttpConnectionBuilder, Response};
//! use http::Method;
//!
//! let conn = HttpConnectionBuilder::new(["http://localhost:8529"])
//!     .timeout(Duration::from_secs(30))
//!     .build()?;
//!
//! let req = conn.new_request(Method::GET, "/_api/version")?;
//! let resp = conn.execute(&Context::background(), req).await?;
//! resp.check_status(&[200])?;
//!
//! let version: Version = resp.parse_body("")?;
//! println!("Server version: {}", version.version);
//! ```
//!
//! ## Queue-time hints
//!
//! ```ignore
//! use docdb_driver_http::{with_max_queue_time, with_queue_timeout};
//!
//! // Ask the server to drop the request if it sat in its queue for over 2s.
//! let ctx = with_queue_timeout(None, true);
//! let ctx = with_max_queue_time(Some(&ctx), Duration::from_secs(2));
//!
//! let resp = conn.execute(&ctx, req).await?;
//! ```
//!
//! ## Strict decoding
//!
//! ```ignore
//! use docdb_driver_http::{new_connection_debug_wrapper, ContentType};
//!
//! let conn = new_connection_debug_wrapper(conn, ContentType::Json);
//!
//! let resp = conn.execute(&Context::background(), req).await?;
//! // Fails with DriverError::Decode if the body has fields Version lacks.
//! let version: Version = resp.parse_body("")?;
//! ```

mod builder;
mod connection;
pub mod debug;
pub mod request;
pub mod response;
pub mod transport;

pub use builder::{ConnectionBuildError, HttpConnectionBuilder};
pub use connection::HttpConnection;

// Re-export from debug module
pub use debug::{
    ConnectionDebugWrapper, DebugResponse, ResponseDebugWrapper, new_connection_debug_wrapper,
};

// Re-export from request module
pub use request::{HttpRequest, QUEUE_TIME_HEADER};

// Re-export from response module
pub use response::{HttpResponse, IntoJsonResponse, JsonResponse, MessagePackResponse};

// Re-export transport types at the top level for convenience
pub use transport::{HyperTransport, HyperTransportBuilder, TransportBody};

// Re-export core types that users need
pub use docdb_driver_core::{
    Authentication, Connection, ContentType, Context, DriverError, Protocol, ProtocolSet,
    RawObject, Response, codec, max_queue_time, queue_timeout, with_max_queue_time,
    with_queue_timeout,
};
