//! MessagePack response.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use docdb_driver_core::{ContentType, DriverError, Response, codec};
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ResponseHead;
use super::error_parser::status_error;

/// A response whose body is MessagePack.
///
/// Bodies that are framed like JSON are decoded as JSON, since servers fall
/// back to JSON for some error responses.
#[derive(Clone, Debug)]
pub struct MessagePackResponse {
    head: Arc<ResponseHead>,
    body: Bytes,
}

impl MessagePackResponse {
    pub fn new(
        status: u16,
        endpoint: impl Into<String>,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            head: ResponseHead::new(status, endpoint, headers),
            body: body.into(),
        }
    }

    /// The undecoded body.
    pub fn raw_body(&self) -> &Bytes {
        &self.body
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }
}

impl Response for MessagePackResponse {
    fn status_code(&self) -> u16 {
        self.head.status
    }

    fn endpoint(&self) -> &str {
        &self.head.endpoint
    }

    fn check_status(&self, valid: &[u16]) -> Result<(), DriverError> {
        if valid.contains(&self.head.status) {
            return Ok(());
        }
        Err(status_error(
            self.head.status,
            valid,
            ContentType::MessagePack,
            &self.body,
        ))
    }

    fn header(&self, key: &str) -> Option<&str> {
        self.head.header(key)
    }

    fn parse_body<T: DeserializeOwned>(&self, field: &str) -> Result<T, DriverError> {
        if field.is_empty() {
            return codec::decode(ContentType::MessagePack, &self.body);
        }
        let mut fields: HashMap<String, Value> = codec::decode(ContentType::MessagePack, &self.body)?;
        let value = fields
            .remove(field)
            .ok_or_else(|| DriverError::FieldNotFound(field.to_string()))?;
        serde_json::from_value(value).map_err(|e| DriverError::decode::<T>(e.to_string()))
    }

    fn parse_array_body(&self) -> Result<Vec<Self>, DriverError> {
        let elements: Vec<Value> = codec::decode(ContentType::MessagePack, &self.body)?;
        elements
            .iter()
            .map(|element| {
                Ok(MessagePackResponse {
                    head: Arc::clone(&self.head),
                    body: codec::encode(ContentType::MessagePack, element)?,
                })
            })
            .collect()
    }
}
