//! Connection builder for the HTTP connection.
//!
//! Provides a fluent API for configuring and building an [`HttpConnection`].

use std::time::Duration;

use docdb_driver_core::{Authentication, ContentType, DriverError};

use crate::connection::{HttpConnection, normalize_endpoint};
use crate::transport::{HyperTransport, HyperTransportBuilder};

/// Builder for creating an [`HttpConnection`].
///
/// # Example
///
/// ```ignore
/// use docdb_driver_http::{Authentication, HttpConnectionBuilder};
/// use std::time::Duration;
///
/// let conn = HttpConnectionBuilder::new(["http://db-1:8529", "http://db-2:8529"])
///     .use_msgpack()
///     .timeout(Duration::from_secs(30))
///     .authentication(Authentication::basic("root", ""))
///     .build()?;
/// ```
pub struct HttpConnectionBuilder {
    /// Endpoints requests are sent to, round-robin.
    endpoints: Vec<String>,
    /// Encoding of request and response bodies.
    content_type: ContentType,
    /// Timeout for calls whose context has no deadline.
    default_timeout: Option<Duration>,
    /// Credentials attached to every request.
    authentication: Option<Authentication>,
    /// Pre-built transport; overrides the transport options below.
    transport: Option<HyperTransport>,
    /// Options for the transport built when none is supplied.
    transport_builder: HyperTransportBuilder,
}

impl std::fmt::Debug for HttpConnectionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnectionBuilder")
            .field("endpoints", &self.endpoints)
            .field("content_type", &self.content_type)
            .field("default_timeout", &self.default_timeout)
            .field("authentication", &self.authentication)
            .field("transport", &self.transport.is_some())
            .field("transport_builder", &self.transport_builder)
            .finish()
    }
}

impl HttpConnectionBuilder {
    /// Create a new builder for the given endpoints.
    ///
    /// Endpoints are absolute `http://` URLs such as `http://localhost:8529`.
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
            content_type: ContentType::Json,
            default_timeout: None,
            authentication: None,
            transport: None,
            transport_builder: HyperTransportBuilder::new(),
        }
    }

    /// Set the body encoding.
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Use JSON bodies.
    ///
    /// This is the default encoding.
    pub fn use_json(self) -> Self {
        self.content_type(ContentType::Json)
    }

    /// Use MessagePack bodies.
    pub fn use_msgpack(self) -> Self {
        self.content_type(ContentType::MessagePack)
    }

    /// Set the timeout for calls.
    ///
    /// A context deadline that expires sooner takes precedence.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Authenticate every request.
    pub fn authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = Some(authentication);
        self
    }

    /// Use a pre-built transport.
    ///
    /// The transport options of this builder are ignored when a transport is
    /// supplied.
    pub fn transport(mut self, transport: HyperTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Speak HTTP/2 with prior knowledge.
    pub fn http2_only(mut self, enabled: bool) -> Self {
        self.transport_builder = self.transport_builder.http2_only(enabled);
        self
    }

    /// Set the connection pool idle timeout.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.transport_builder = self.transport_builder.pool_idle_timeout(timeout);
        self
    }

    /// Set the maximum number of idle connections per host.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.transport_builder = self.transport_builder.pool_max_idle_per_host(max);
        self
    }

    /// Set the TCP connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.transport_builder = self.transport_builder.connect_timeout(timeout);
        self
    }

    /// Build the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint is configured, an endpoint is not an
    /// absolute `http://` URL, or the transport cannot be created.
    pub fn build(self) -> Result<HttpConnection, ConnectionBuildError> {
        if self.endpoints.is_empty() {
            return Err(ConnectionBuildError::NoEndpoints);
        }

        let endpoints = self
            .endpoints
            .iter()
            .map(|endpoint| {
                normalize_endpoint(endpoint).map_err(|reason| ConnectionBuildError::InvalidEndpoint {
                    endpoint: endpoint.clone(),
                    reason,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => self
                .transport_builder
                .build()
                .map_err(ConnectionBuildError::Transport)?,
        };

        Ok(HttpConnection::new(
            transport,
            endpoints,
            self.content_type,
            self.default_timeout,
            self.authentication,
        ))
    }
}

/// Error type for connection building failures.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionBuildError {
    /// No endpoint was configured.
    #[error("no endpoints configured")]
    NoEndpoints,

    /// An endpoint is not an absolute `http://` URL.
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Failed to create the transport.
    #[error("failed to create transport: {0}")]
    Transport(#[source] DriverError),
}
