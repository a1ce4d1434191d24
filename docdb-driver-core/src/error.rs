//! Driver error types.
//!
//! This module provides [`DriverError`], the error type shared by every
//! connection family and the decoding policy.

/// Driver error variants.
///
/// Errors coming from the underlying connection are carried in
/// [`DriverError::Transport`] and surfaced to the caller unchanged.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// Transport-level error (connection refused, broken pipe, etc.).
    #[error("transport error: {0}")]
    Transport(String),

    /// A content type outside the set this driver speaks.
    #[error("unsupported content type {0}")]
    UnsupportedContentType(i32),

    /// A payload could not be decoded into the target type.
    ///
    /// Strict decoding also reports unknown fields through this variant.
    #[error("Struct: {type_name}, Error: {message}")]
    Decode {
        type_name: &'static str,
        message: String,
    },

    /// A request body could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// The connection returned a response of a kind the caller cannot handle.
    #[error("unexpected response kind: expected {expected}, got {actual}")]
    UnexpectedResponseKind {
        expected: &'static str,
        actual: &'static str,
    },

    /// The server answered with an error document.
    #[error("server error (status {status}, errorNum {error_num}): {message}")]
    Server {
        status: u16,
        error_num: i64,
        message: String,
    },

    /// The server answered with a status the caller did not accept.
    #[error("unexpected status code {status}, expected one of {expected:?}")]
    UnexpectedStatus { status: u16, expected: Vec<u16> },

    /// A named body field was requested but is not present.
    #[error("field {0} not found")]
    FieldNotFound(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An endpoint is not an absolute `http://` URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The connection has no endpoints to send to.
    #[error("no endpoints configured")]
    NoEndpoints,

    /// The context deadline passed before the response arrived.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl DriverError {
    /// Create a decode error for the target type `T`.
    pub fn decode<T: ?Sized>(message: impl Into<String>) -> Self {
        DriverError::Decode {
            type_name: std::any::type_name::<T>(),
            message: message.into(),
        }
    }

    /// Name of the target type for [`DriverError::Decode`].
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            DriverError::Decode { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DriverError::Server { status, .. } | DriverError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Returns whether this error indicates a transient condition that a
    /// higher layer may retry.
    ///
    /// This layer never retries on its own.
    ///
    /// # Example
    ///
    /// ```
    /// use docdb_driver_core::DriverError;
    ///
    /// assert!(DriverError::Transport("connection reset".into()).is_transient());
    /// assert!(DriverError::DeadlineExceeded.is_transient());
    /// assert!(!DriverError::FieldNotFound("result".into()).is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        match self {
            DriverError::Transport(_) | DriverError::DeadlineExceeded => true,
            DriverError::Server { status, .. } | DriverError::UnexpectedStatus { status, .. } => {
                matches!(status, 503 | 429)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collection;

    #[test]
    fn test_decode_names_target_type() {
        let err = DriverError::decode::<Collection>("unknown field `b`");
        let type_name = err.type_name().unwrap();
        assert!(type_name.ends_with("Collection"));
        assert_eq!(
            err.to_string(),
            format!("Struct: {}, Error: unknown field `b`", type_name)
        );
    }

    #[test]
    fn test_status_accessor() {
        let server = DriverError::Server {
            status: 404,
            error_num: 1202,
            message: "document not found".into(),
        };
        assert_eq!(server.status(), Some(404));

        let unexpected = DriverError::UnexpectedStatus {
            status: 500,
            expected: vec![200],
        };
        assert_eq!(unexpected.status(), Some(500));

        assert_eq!(DriverError::NoEndpoints.status(), None);
    }

    #[test]
    fn test_is_transient() {
        assert!(DriverError::Transport("reset".into()).is_transient());
        assert!(DriverError::DeadlineExceeded.is_transient());
        assert!(
            DriverError::UnexpectedStatus {
                status: 503,
                expected: vec![200],
            }
            .is_transient()
        );

        assert!(!DriverError::decode::<Collection>("bad").is_transient());
        assert!(!DriverError::UnsupportedContentType(9).is_transient());
        assert!(
            !DriverError::UnexpectedResponseKind {
                expected: "JsonResponse",
                actual: "MessagePackResponse",
            }
            .is_transient()
        );
        assert!(
            !DriverError::Server {
                status: 409,
                error_num: 1210,
                message: "unique constraint violated".into(),
            }
            .is_transient()
        );
    }
}
