//! Error body parsing for responses with an unexpected status.
//!
//! Parses database error bodies into [`DriverError::Server`].

use docdb_driver_core::{ContentType, DriverError, codec};
use serde::Deserialize;

/// Build the error for a response whose status is not in `valid`.
///
/// Database error bodies have the format:
/// ```json
/// {
///   "error": true,
///   "code": 404,
///   "errorNum": 1202,
///   "errorMessage": "document not found"
/// }
/// ```
///
/// If the body is not such an error, falls back to
/// [`DriverError::UnexpectedStatus`].
pub(crate) fn status_error(
    status: u16,
    valid: &[u16],
    content_type: ContentType,
    body: &[u8],
) -> DriverError {
    match codec::decode::<ErrorBody>(content_type, body) {
        Ok(ErrorBody {
            error: true,
            error_num,
            error_message,
            ..
        }) => DriverError::Server {
            status,
            error_num,
            message: error_message,
        },
        _ => DriverError::UnexpectedStatus {
            status,
            expected: valid.to_vec(),
        },
    }
}

/// Database error body.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: bool,
    #[serde(default, rename = "errorNum")]
    error_num: i64,
    #[serde(default, rename = "errorMessage")]
    error_message: String,
}
