//! HTTP connection implementation.
//!
//! This module provides [`HttpConnection`], the [`Connection`] of the HTTP
//! family. Build one with [`HttpConnectionBuilder`](crate::HttpConnectionBuilder).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use bytes::Bytes;
use docdb_driver_core::{
    Authentication, Connection, ContentType, Context, DriverError, Protocol, ProtocolSet,
    RawObject, codec,
};
use http::{Method, header};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tokio::time::timeout;
use tower_service::Service;
#[cfg(feature = "tracing")]
use tracing::Instrument;

use crate::request::HttpRequest;
use crate::response::HttpResponse;
use crate::transport::{HyperTransport, TransportBody};

/// A connection to one or more database endpoints over HTTP.
///
/// Cloning is cheap: clones share the transport pool and the endpoint list.
///
/// # Example
///
/// ```ignore
/// use docdb_driver_http::{Connection, Context, HttpConnectionBuilder, Response};
/// use http::Method;
///
/// let conn = HttpConnectionBuilder::new(["http://localhost:8529"]).build()?;
/// let req = conn.new_request(Method::GET, "/_api/version")?;
/// let resp = conn.execute(&Context::background(), req).await?;
/// resp.check_status(&[200])?;
/// ```
#[derive(Clone)]
pub struct HttpConnection {
    transport: HyperTransport,
    endpoints: Arc<RwLock<Vec<String>>>,
    /// Round-robin cursor into `endpoints`.
    next: Arc<AtomicUsize>,
    content_type: ContentType,
    default_timeout: Option<Duration>,
    authentication: Option<Authentication>,
}

impl std::fmt::Debug for HttpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnection")
            .field("endpoints", &self.endpoints())
            .field("content_type", &self.content_type)
            .field("default_timeout", &self.default_timeout)
            .field("authentication", &self.authentication)
            .field("transport", &self.transport)
            .finish()
    }
}

impl HttpConnection {
    pub(crate) fn new(
        transport: HyperTransport,
        endpoints: Vec<String>,
        content_type: ContentType,
        default_timeout: Option<Duration>,
        authentication: Option<Authentication>,
    ) -> Self {
        Self {
            transport,
            endpoints: Arc::new(RwLock::new(endpoints)),
            next: Arc::new(AtomicUsize::new(0)),
            content_type,
            default_timeout,
            authentication,
        }
    }

    /// Content type used for request bodies and expected in responses.
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Timeout applied to calls whose context has no deadline.
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    fn next_endpoint(&self) -> Result<String, DriverError> {
        let endpoints = self.endpoints.read().unwrap_or_else(PoisonError::into_inner);
        if endpoints.is_empty() {
            return Err(DriverError::NoEndpoints);
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % endpoints.len();
        Ok(endpoints[index].clone())
    }

    /// The tighter of the context deadline and the default timeout.
    fn call_timeout(&self, ctx: &Context) -> Option<Duration> {
        match (ctx.remaining(), self.default_timeout) {
            (Some(remaining), Some(default)) => Some(remaining.min(default)),
            (remaining, default) => remaining.or(default),
        }
    }

    async fn send(
        &self,
        endpoint: String,
        request: http::Request<TransportBody>,
    ) -> Result<HttpResponse, DriverError> {
        let mut transport = self.transport.clone();
        std::future::poll_fn(|cx| transport.poll_ready(cx)).await?;
        let response = transport.call(request).await?;
        let (parts, body) = response.into_parts();

        let body: Bytes = body
            .collect()
            .await
            .map_err(|e| DriverError::Transport(format!("failed to read response body: {}", e)))?
            .to_bytes();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            status = parts.status.as_u16(),
            body_len = body.len(),
            "received response"
        );

        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(ContentType::from_mime)
            .unwrap_or(self.content_type);

        Ok(HttpResponse::new(
            content_type,
            parts.status.as_u16(),
            endpoint,
            parts.headers,
            body,
        ))
    }
}

impl Connection for HttpConnection {
    type Request = HttpRequest;
    type Response = HttpResponse;
    type Authenticated = HttpConnection;

    fn new_request(&self, method: Method, path: &str) -> Result<HttpRequest, DriverError> {
        HttpRequest::new(method, path, self.content_type)
    }

    async fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, DriverError> {
        let endpoint = self.next_endpoint()?;

        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!(
            "docdb.request",
            method = %request.method(),
            path = %request.path(),
            endpoint = %endpoint,
        );

        let http_request = request.into_http(&endpoint, ctx, self.authentication.as_ref())?;
        let call = self.send(endpoint, http_request);

        #[cfg(feature = "tracing")]
        let call = call.instrument(span);

        match self.call_timeout(ctx) {
            Some(t) => timeout(t, call)
                .await
                .map_err(|_| DriverError::DeadlineExceeded)?,
            None => call.await,
        }
    }

    fn unmarshal<T: DeserializeOwned>(&self, data: &RawObject) -> Result<T, DriverError> {
        codec::decode(self.content_type, data)
    }

    fn endpoints(&self) -> Vec<String> {
        self.endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_endpoints(&self, endpoints: Vec<String>) -> Result<(), DriverError> {
        if endpoints.is_empty() {
            return Err(DriverError::NoEndpoints);
        }
        let endpoints = endpoints
            .iter()
            .map(|e| {
                normalize_endpoint(e)
                    .map_err(|reason| DriverError::InvalidEndpoint(format!("{}: {}", e, reason)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        *self.endpoints.write().unwrap_or_else(PoisonError::into_inner) = endpoints;
        Ok(())
    }

    fn set_authentication(
        &self,
        authentication: Authentication,
    ) -> Result<HttpConnection, DriverError> {
        Ok(HttpConnection {
            authentication: Some(authentication),
            ..self.clone()
        })
    }

    fn protocols(&self) -> ProtocolSet {
        if self.transport.is_http2_only() {
            ProtocolSet::new().with(Protocol::Http2)
        } else {
            ProtocolSet::new().with(Protocol::Http1).with(Protocol::Http2)
        }
    }
}

/// Validate an endpoint and strip its trailing slash.
///
/// Endpoints must be absolute `http://` URLs with a host and no query.
pub(crate) fn normalize_endpoint(endpoint: &str) -> Result<String, String> {
    let url = url::Url::parse(endpoint).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme {}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(endpoint.trim_end_matches('/').to_string())
}
