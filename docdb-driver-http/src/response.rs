//! Response types for the HTTP connection.
//!
//! This module contains the response side of the connection:
//! - [`JsonResponse`]: A response whose body is JSON
//! - [`MessagePackResponse`]: A response whose body is MessagePack
//! - [`HttpResponse`]: Either of the two, picked from the `Content-Type` header
//! - [`IntoJsonResponse`]: Recovers the JSON response from a response family

mod error_parser;
mod json;
mod msgpack;

use std::sync::Arc;

use bytes::Bytes;
use docdb_driver_core::{ContentType, DriverError, Response};
use http::HeaderMap;
use serde::de::DeserializeOwned;

pub use json::JsonResponse;
pub use msgpack::MessagePackResponse;

/// Status line and headers shared by a response and the elements split off
/// it by `parse_array_body`.
#[derive(Debug)]
pub(crate) struct ResponseHead {
    pub(crate) status: u16,
    pub(crate) endpoint: String,
    pub(crate) headers: HeaderMap,
}

impl ResponseHead {
    pub(crate) fn new(status: u16, endpoint: impl Into<String>, headers: HeaderMap) -> Arc<Self> {
        Arc::new(Self {
            status,
            endpoint: endpoint.into(),
            headers,
        })
    }

    pub(crate) fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }
}

/// A response whose concrete representation can be recovered as a
/// [`JsonResponse`].
///
/// Decorators that need the textual body use this instead of assuming a
/// concrete type; a response of another kind is handed back unchanged.
pub trait IntoJsonResponse: Response {
    /// Short name of the concrete representation, e.g. `"json"`.
    fn kind(&self) -> &'static str;

    /// Convert into the JSON representation, or return `self` if this
    /// response is of another kind.
    fn into_json_response(self) -> Result<JsonResponse, Self>;
}

/// A response from an [`HttpConnection`](crate::HttpConnection).
#[derive(Clone, Debug)]
pub enum HttpResponse {
    Json(JsonResponse),
    MessagePack(MessagePackResponse),
}

impl HttpResponse {
    /// Build a response of the representation matching `content_type`.
    pub fn new(
        content_type: ContentType,
        status: u16,
        endpoint: impl Into<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        match content_type {
            ContentType::Json => {
                HttpResponse::Json(JsonResponse::new(status, endpoint, headers, body))
            }
            ContentType::MessagePack => {
                HttpResponse::MessagePack(MessagePackResponse::new(status, endpoint, headers, body))
            }
        }
    }

    /// Content type of the body.
    pub fn content_type(&self) -> ContentType {
        match self {
            HttpResponse::Json(_) => ContentType::Json,
            HttpResponse::MessagePack(_) => ContentType::MessagePack,
        }
    }

    /// The undecoded body.
    pub fn raw_body(&self) -> &Bytes {
        match self {
            HttpResponse::Json(r) => r.raw_body(),
            HttpResponse::MessagePack(r) => r.raw_body(),
        }
    }
}

impl Response for HttpResponse {
    fn status_code(&self) -> u16 {
        match self {
            HttpResponse::Json(r) => r.status_code(),
            HttpResponse::MessagePack(r) => r.status_code(),
        }
    }

    fn endpoint(&self) -> &str {
        match self {
            HttpResponse::Json(r) => r.endpoint(),
            HttpResponse::MessagePack(r) => r.endpoint(),
        }
    }

    fn check_status(&self, valid: &[u16]) -> Result<(), DriverError> {
        match self {
            HttpResponse::Json(r) => r.check_status(valid),
            HttpResponse::MessagePack(r) => r.check_status(valid),
        }
    }

    fn header(&self, key: &str) -> Option<&str> {
        match self {
            HttpResponse::Json(r) => r.header(key),
            HttpResponse::MessagePack(r) => r.header(key),
        }
    }

    fn parse_body<T: DeserializeOwned>(&self, field: &str) -> Result<T, DriverError> {
        match self {
            HttpResponse::Json(r) => r.parse_body(field),
            HttpResponse::MessagePack(r) => r.parse_body(field),
        }
    }

    fn parse_array_body(&self) -> Result<Vec<Self>, DriverError> {
        match self {
            HttpResponse::Json(r) => Ok(r
                .parse_array_body()?
                .into_iter()
                .map(HttpResponse::Json)
                .collect()),
            HttpResponse::MessagePack(r) => Ok(r
                .parse_array_body()?
                .into_iter()
                .map(HttpResponse::MessagePack)
                .collect()),
        }
    }
}

impl IntoJsonResponse for HttpResponse {
    fn kind(&self) -> &'static str {
        self.content_type().as_str()
    }

    fn into_json_response(self) -> Result<JsonResponse, Self> {
        match self {
            HttpResponse::Json(r) => Ok(r),
            other => Err(other),
        }
    }
}

impl IntoJsonResponse for JsonResponse {
    fn kind(&self) -> &'static str {
        ContentType::Json.as_str()
    }

    fn into_json_response(self) -> Result<JsonResponse, Self> {
        Ok(self)
    }
}

impl IntoJsonResponse for MessagePackResponse {
    fn kind(&self) -> &'static str {
        ContentType::MessagePack.as_str()
    }

    fn into_json_response(self) -> Result<JsonResponse, Self> {
        Err(self)
    }
}
