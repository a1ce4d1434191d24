//! Undecoded payloads.

use bytes::Bytes;
use std::ops::Deref;

/// An undecoded response body or sub-field.
///
/// Cloning is cheap; the bytes are never mutated after creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RawObject(Bytes);

impl RawObject {
    /// Wrap the given bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        RawObject(bytes.into())
    }

    /// Borrow the payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume self and return the underlying bytes.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Whether the payload is framed like a JSON object or array.
    ///
    /// Only the first and last byte are inspected, and at least two bytes are
    /// required. No parse is attempted, so `{ not json }` still matches.
    pub fn looks_like_json(&self) -> bool {
        looks_like_json(&self.0)
    }
}

pub(crate) fn looks_like_json(data: &[u8]) -> bool {
    let [first, .., last] = data else {
        return false;
    };
    matches!((first, last), (b'{', b'}') | (b'[', b']'))
}

impl Deref for RawObject {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for RawObject {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for RawObject {
    fn from(bytes: Bytes) -> Self {
        RawObject(bytes)
    }
}

impl From<Vec<u8>> for RawObject {
    fn from(bytes: Vec<u8>) -> Self {
        RawObject(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for RawObject {
    fn from(bytes: &'static [u8]) -> Self {
        RawObject(Bytes::from_static(bytes))
    }
}

impl From<&'static str> for RawObject {
    fn from(s: &'static str) -> Self {
        RawObject(Bytes::from_static(s.as_bytes()))
    }
}

impl From<RawObject> for Bytes {
    fn from(raw: RawObject) -> Self {
        raw.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_json_object_and_array() {
        assert!(RawObject::from("{}").looks_like_json());
        assert!(RawObject::from("[]").looks_like_json());
        assert!(RawObject::from("{\"a\":1}").looks_like_json());
        assert!(RawObject::from("[1,2,3]").looks_like_json());
    }

    #[test]
    fn test_looks_like_json_only_checks_boundaries() {
        assert!(RawObject::from("{ not json }").looks_like_json());
        assert!(!RawObject::from("{\"a\":1]").looks_like_json());
        assert!(!RawObject::from("[1,2}").looks_like_json());
        assert!(!RawObject::from(" {} ").looks_like_json());
    }

    #[test]
    fn test_looks_like_json_needs_two_bytes() {
        assert!(!RawObject::from("").looks_like_json());
        assert!(!RawObject::from("{").looks_like_json());
        assert!(!RawObject::from("]").looks_like_json());
    }

    #[test]
    fn test_raw_object_deref_and_conversions() {
        let raw = RawObject::from(vec![1u8, 2, 3]);
        assert_eq!(raw.len(), 3);
        assert_eq!(raw.as_bytes(), &[1, 2, 3]);

        let bytes: Bytes = raw.clone().into();
        assert_eq!(RawObject::new(bytes), raw);
    }
}
