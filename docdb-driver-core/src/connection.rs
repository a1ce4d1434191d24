//! Connection and response capability traits.
//!
//! A connection family (HTTP in `docdb-driver-http`) implements
//! [`Connection`] and [`Response`]. Decorators implement the same traits by
//! wrapping another implementation and delegating most calls to it.

use std::future::Future;

use base64::Engine;
use http::Method;
use serde::de::DeserializeOwned;

use crate::{Context, DriverError, RawObject};

/// A connection to one or more database endpoints.
///
/// Implementations must be safe to share between tasks; every method takes
/// `&self`.
///
/// # Example
///
/// ```ignore
/// use docdb_driver_core::{Connection, Context, Response};
/// use http::Method;
///
/// let req = conn.new_request(Method::GET, "/_api/version")?;
/// let resp = conn.execute(&Context::background(), req).await?;
/// resp.check_status(&[200])?;
/// let version: Version = resp.parse_body("")?;
/// ```
pub trait Connection: Send + Sync {
    /// Request type produced by [`new_request`](Self::new_request).
    type Request: Send;
    /// Response type produced by [`execute`](Self::execute).
    type Response: Response;
    /// Connection returned by [`set_authentication`](Self::set_authentication).
    type Authenticated: Connection;

    /// Create a request for `method` on `path`.
    fn new_request(&self, method: Method, path: &str) -> Result<Self::Request, DriverError>;

    /// Send a request and wait for its response.
    ///
    /// Cancellation and deadlines come from `ctx`.
    fn execute(
        &self,
        ctx: &Context,
        request: Self::Request,
    ) -> impl Future<Output = Result<Self::Response, DriverError>> + Send;

    /// Decode a raw payload with this connection's content type.
    fn unmarshal<T: DeserializeOwned>(&self, data: &RawObject) -> Result<T, DriverError>;

    /// The endpoints requests are sent to.
    fn endpoints(&self) -> Vec<String>;

    /// Replace the endpoints requests are sent to.
    fn update_endpoints(&self, endpoints: Vec<String>) -> Result<(), DriverError>;

    /// Return a connection that authenticates every request with
    /// `authentication`.
    fn set_authentication(
        &self,
        authentication: Authentication,
    ) -> Result<Self::Authenticated, DriverError>;

    /// Protocols this connection speaks.
    fn protocols(&self) -> ProtocolSet;
}

/// A response returned by [`Connection::execute`].
pub trait Response: Send + Sized {
    /// HTTP status code.
    fn status_code(&self) -> u16;

    /// The endpoint that produced this response.
    fn endpoint(&self) -> &str;

    /// Succeed if the status code is one of `valid`.
    ///
    /// Otherwise the error describes what the server sent back.
    fn check_status(&self, valid: &[u16]) -> Result<(), DriverError>;

    /// Value of a response header, if present.
    fn header(&self, key: &str) -> Option<&str>;

    /// Decode the body, or the top-level `field` of the body when `field` is
    /// not empty.
    fn parse_body<T: DeserializeOwned>(&self, field: &str) -> Result<T, DriverError>;

    /// Split an array body into one response per element.
    fn parse_array_body(&self) -> Result<Vec<Self>, DriverError>;
}

/// Credentials attached to every request of an authenticated connection.
#[derive(Clone, PartialEq, Eq)]
pub enum Authentication {
    /// HTTP basic authentication.
    Basic { username: String, password: String },
    /// A bearer JWT.
    Jwt(String),
    /// A pre-built `Authorization` header value.
    Raw(String),
}

impl Authentication {
    /// Create basic authentication.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Authentication::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Create JWT authentication.
    pub fn jwt(token: impl Into<String>) -> Self {
        Authentication::Jwt(token.into())
    }

    /// The `Authorization` header value for this authentication.
    pub fn header_value(&self) -> String {
        match self {
            Authentication::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                format!("Basic {}", encoded)
            }
            Authentication::Jwt(token) => format!("bearer {}", token),
            Authentication::Raw(value) => value.clone(),
        }
    }
}

impl std::fmt::Debug for Authentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authentication::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Authentication::Jwt(_) => f.write_str("Jwt(..)"),
            Authentication::Raw(_) => f.write_str("Raw(..)"),
        }
    }
}

/// A wire protocol a connection can speak.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Protocol {
    Http1,
    Http2,
}

/// The set of protocols a connection speaks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProtocolSet {
    protocols: Vec<Protocol>,
}

impl ProtocolSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a protocol; duplicates are ignored.
    pub fn with(mut self, protocol: Protocol) -> Self {
        if !self.protocols.contains(&protocol) {
            self.protocols.push(protocol);
            self.protocols.sort();
        }
        self
    }

    /// Whether `protocol` is in the set.
    pub fn contains(&self, protocol: Protocol) -> bool {
        self.protocols.contains(&protocol)
    }

    /// Whether the set contains exactly `protocol` and nothing else.
    pub fn contains_only(&self, protocol: Protocol) -> bool {
        self.protocols == [protocol]
    }

    /// Iterate over the protocols in the set.
    pub fn iter(&self) -> impl Iterator<Item = Protocol> + '_ {
        self.protocols.iter().copied()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}

impl FromIterator<Protocol> for ProtocolSet {
    fn from_iter<I: IntoIterator<Item = Protocol>>(iter: I) -> Self {
        iter.into_iter().fold(ProtocolSet::new(), ProtocolSet::with)
    }
}
