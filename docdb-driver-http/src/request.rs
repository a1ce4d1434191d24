//! Request type for the HTTP connection.
//!
//! [`HttpRequest`] collects method, path, query, headers and body. It is
//! turned into an `http::Request` only when the connection sends it, which
//! is also when the queue-time hint of the [`Context`] becomes a header.

use std::time::Duration;

use bytes::Bytes;
use docdb_driver_core::{Authentication, ContentType, Context, DriverError, codec};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri};
use serde::Serialize;

use crate::transport::TransportBody;

/// Header asking the server to drop the request if it was queued longer than
/// the given number of seconds.
pub const QUEUE_TIME_HEADER: &str = "x-arango-queue-time-seconds";

/// A request that has not been sent yet.
///
/// # Example
///
/// ```ignore
/// let mut req = conn.new_request(Method::POST, "/_api/cursor")?;
/// req.set_query("waitForSync", "true")
///     .set_body(&serde_json::json!({ "query": "RETURN 1" }))?;
/// let resp = conn.execute(&ctx, req).await?;
/// ```
#[derive(Clone, Debug)]
pub struct HttpRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Bytes>,
    content_type: ContentType,
}

impl HttpRequest {
    /// Create a request for `method` on `path`.
    ///
    /// `path` must be absolute (start with `/`).
    pub fn new(
        method: Method,
        path: impl Into<String>,
        content_type: ContentType,
    ) -> Result<Self, DriverError> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(DriverError::InvalidRequest(format!(
                "path must start with '/': {}",
                path
            )));
        }
        Ok(Self {
            method,
            path,
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            content_type,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Add a query parameter. Repeated keys are sent repeatedly.
    pub fn set_query(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a request header, replacing any previous value.
    ///
    /// `Content-Type`, `Accept`, `Authorization` and the queue-time header are
    /// owned by the connection and overwritten when the request is sent.
    pub fn set_header(&mut self, key: &str, value: &str) -> Result<&mut Self, DriverError> {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| DriverError::InvalidRequest(format!("invalid header name {}: {}", key, e)))?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            DriverError::InvalidRequest(format!("invalid value for header {}: {}", key, e))
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Encode `body` with the connection's content type.
    pub fn set_body<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<&mut Self, DriverError> {
        self.body = Some(codec::encode(self.content_type, body)?);
        Ok(self)
    }

    /// Use already-encoded bytes as the body.
    pub fn set_raw_body(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    /// Build the `http::Request` sent to `endpoint`.
    pub fn into_http(
        self,
        endpoint: &str,
        ctx: &Context,
        authentication: Option<&Authentication>,
    ) -> Result<http::Request<TransportBody>, DriverError> {
        let uri = self.uri(endpoint)?;

        let mut builder = http::Request::builder().method(self.method).uri(uri);
        let Some(headers) = builder.headers_mut() else {
            return Err(DriverError::InvalidRequest("invalid request parts".to_string()));
        };
        headers.extend(self.headers);

        let mime = HeaderValue::from_static(self.content_type.mime());
        headers.insert(ACCEPT, mime.clone());
        if self.body.is_some() {
            headers.insert(CONTENT_TYPE, mime);
        }

        if let Some(auth) = authentication {
            let value = HeaderValue::from_str(&auth.header_value()).map_err(|e| {
                DriverError::InvalidRequest(format!("invalid authorization header: {}", e))
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        if let Some(queue_time) = ctx.queue_time_hint() {
            let value = HeaderValue::from_str(&queue_time_header_value(queue_time))
                .map_err(|e| DriverError::InvalidRequest(e.to_string()))?;
            headers.insert(HeaderName::from_static(QUEUE_TIME_HEADER), value);
        }

        let body = match self.body {
            Some(data) => TransportBody::full(data),
            None => TransportBody::empty(),
        };

        builder
            .body(body)
            .map_err(|e| DriverError::InvalidRequest(e.to_string()))
    }

    fn uri(&self, endpoint: &str) -> Result<Uri, DriverError> {
        let mut target = format!("{}{}", endpoint.trim_end_matches('/'), self.path);
        if !self.query.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.query)
                .finish();
            target.push('?');
            target.push_str(&query);
        }
        target
            .parse()
            .map_err(|e| DriverError::InvalidRequest(format!("invalid request uri {}: {}", target, e)))
    }
}

/// Format a queue time as fractional seconds.
pub fn queue_time_header_value(queue_time: Duration) -> String {
    queue_time.as_secs_f64().to_string()
}
