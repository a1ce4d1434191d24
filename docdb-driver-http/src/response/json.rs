//! JSON response.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use docdb_driver_core::{ContentType, DriverError, Response, codec};
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;

use super::ResponseHead;
use super::error_parser::status_error;

/// A response whose body is JSON.
///
/// Decoding is lenient: fields of the body the target type does not know
/// are ignored.
#[derive(Clone, Debug)]
pub struct JsonResponse {
    head: Arc<ResponseHead>,
    body: Bytes,
}

impl JsonResponse {
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

    /// The raw value of a top-level field; decode errors name `T`.
    fn field<T>(&self, field: &str) -> Result<Bytes, DriverError> {
        let fields: HashMap<String, &RawValue> = serde_json::from_slice(&self.body)
            .map_err(|e| DriverError::decode::<T>(e.to_string()))?;
        let raw = fields
            .get(field)
            .ok_or_else(|| DriverError::FieldNotFound(field.to_string()))?;
        Ok(self.body.slice_ref(raw.get().as_bytes()))
    }
}

impl Response for JsonResponse {
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
            ContentType::Json,
            &self.body,
        ))
    }

    fn header(&self, key: &str) -> Option<&str> {
        self.head.header(key)
    }

    fn parse_body<T: DeserializeOwned>(&self, field: &str) -> Result<T, DriverError> {
        if field.is_empty() {
            return codec::decode(ContentType::Json, &self.body);
        }
        let value = self.field::<T>(field)?;
        codec::decode(ContentType::Json, &value)
    }

    fn parse_array_body(&self) -> Result<Vec<Self>, DriverError> {
        let elements: Vec<&RawValue> = serde_json::from_slice(&self.body)
            .map_err(|e| DriverError::decode::<Vec<Box<RawValue>>>(e.to_string()))?;
        Ok(elements
            .into_iter()
            .map(|raw| JsonResponse {
                head: Arc::clone(&self.head),
                body: self.body.slice_ref(raw.get().as_bytes()),
            })
            .collect())
    }
}
