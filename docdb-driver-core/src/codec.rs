//! Payload decoding policy.
//!
//! This module turns a raw payload plus a declared [`ContentType`] into a
//! typed value:
//! - [`decode_strict`]: rejects any field the target type does not declare
//! - [`decode`]: ignores unknown fields
//! - [`encode`]: serializes request bodies
//!
//! Both decoders apply the same content-type resolution
//! ([`effective_content_type`]): a payload declared as MessagePack whose first
//! and last bytes frame a JSON object or array is decoded as JSON, because
//! some binary-format responses carry plain JSON bodies.
//!
//! Strict decoding is single pass. The deserializer is wrapped with
//! `serde_ignored`, which records every key the target type skips while the
//! value is being built; a non-empty record fails the decode.

use bytes::Bytes;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use serde::Serialize;

use crate::raw::looks_like_json;
use crate::{ContentType, DriverError};

/// Resolve the content type actually used to decode `payload`.
///
/// Only a [`ContentType::MessagePack`] declaration is overridden, and only
/// when the payload has at least two bytes framed by `{`/`}` or `[`/`]`.
pub fn effective_content_type(declared: ContentType, payload: &[u8]) -> ContentType {
    match declared {
        ContentType::MessagePack if looks_like_json(payload) => ContentType::Json,
        other => other,
    }
}

/// Decode `payload` into `T`, failing on fields `T` does not declare.
///
/// On failure the error names `T`; the raw payload is reported through
/// `tracing` (when the `tracing` feature is on) and never stored in the
/// error.
///
/// # Example
///
/// ```
/// use docdb_driver_core::{codec, ContentType};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct Doc { a: i32 }
///
/// let doc: Doc = codec::decode_strict(ContentType::MessagePack, br#"{"a":1}"#).unwrap();
/// assert_eq!(doc.a, 1);
///
/// let err = codec::decode_strict::<Doc>(ContentType::Json, br#"{"a":1,"b":2}"#).unwrap_err();
/// assert!(err.to_string().contains("Doc"));
/// ```
pub fn decode_strict<T: DeserializeOwned>(
    declared: ContentType,
    payload: &[u8],
) -> Result<T, DriverError> {
    match effective_content_type(declared, payload) {
        ContentType::Json => decode_json_strict(payload),
        ContentType::MessagePack => decode_msgpack_strict(payload),
    }
}

/// Strict JSON decode, without content-type resolution.
pub fn decode_json_strict<T: DeserializeOwned>(payload: &[u8]) -> Result<T, DriverError> {
    let mut de = serde_json::Deserializer::from_slice(payload);
    let result = reject_unknown(&mut de).and_then(|value| {
        // Trailing data after the document
        de.end().map_err(|e| e.to_string())?;
        Ok(value)
    });
    result.map_err(|message| decode_failed::<T>(ContentType::Json, payload, message))
}

/// Strict MessagePack decode, without content-type resolution.
pub fn decode_msgpack_strict<T: DeserializeOwned>(payload: &[u8]) -> Result<T, DriverError> {
    let mut rest = payload;
    let result = {
        let mut de = rmp_serde::Deserializer::new(&mut rest);
        reject_unknown(&mut de)
    };
    let result = result.and_then(|value| {
        // Trailing data after the document
        if rest.is_empty() {
            Ok(value)
        } else {
            Err(format!("{} trailing bytes after the document", rest.len()))
        }
    });
    result.map_err(|message| decode_failed::<T>(ContentType::MessagePack, payload, message))
}

/// Decode `payload` into `T`, ignoring fields `T` does not declare.
///
/// This is the decoding a plain connection applies.
pub fn decode<T: DeserializeOwned>(declared: ContentType, payload: &[u8]) -> Result<T, DriverError> {
    match effective_content_type(declared, payload) {
        ContentType::Json => {
            serde_json::from_slice(payload).map_err(|e| DriverError::decode::<T>(e.to_string()))
        }
        ContentType::MessagePack => {
            rmp_serde::from_slice(payload).map_err(|e| DriverError::decode::<T>(e.to_string()))
        }
    }
}

/// Serialize `value` for a request body.
///
/// MessagePack structs are written as maps so field names reach the server.
pub fn encode<T: Serialize + ?Sized>(
    content_type: ContentType,
    value: &T,
) -> Result<Bytes, DriverError> {
    match content_type {
        ContentType::Json => serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| DriverError::Encode(format!("JSON encoding failed: {}", e))),
        ContentType::MessagePack => rmp_serde::to_vec_named(value)
            .map(Bytes::from)
            .map_err(|e| DriverError::Encode(format!("MessagePack encoding failed: {}", e))),
    }
}

fn reject_unknown<'de, D, T>(deserializer: D) -> Result<T, String>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let mut unknown = Vec::new();
    let value: T = serde_ignored::deserialize(deserializer, |path| unknown.push(path.to_string()))
        .map_err(|e| e.to_string())?;

    match unknown.as_slice() {
        [] => Ok(value),
        [field] => Err(format!("unknown field `{}`", field)),
        fields => Err(format!("unknown fields `{}`", fields.join("`, `"))),
    }
}

fn decode_failed<T>(content_type: ContentType, payload: &[u8], message: String) -> DriverError {
    #[cfg(feature = "tracing")]
    {
        let shown = match content_type {
            ContentType::Json => String::from_utf8_lossy(payload).into_owned(),
            ContentType::MessagePack => format!("{:02x?}", payload),
        };
        tracing::warn!(
            type_name = std::any::type_name::<T>(),
            %content_type,
            error = %message,
            payload = %shown,
            "strict decode failed"
        );
    }
    #[cfg(not(feature = "tracing"))]
    let _ = (content_type, payload);

    DriverError::decode::<T>(message)
}
