//! Wire encodings for request and response bodies.

use crate::DriverError;

/// The encoding used for a connection's request and response bodies.
///
/// Chosen once when a connection is constructed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Textual structured format (JSON).
    #[default]
    Json = 0,
    /// Compact binary format (MessagePack).
    MessagePack = 1,
}

impl ContentType {
    /// MIME type sent in `Content-Type` and `Accept` headers.
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::MessagePack => "application/x-msgpack",
        }
    }

    /// Short name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "json",
            ContentType::MessagePack => "msgpack",
        }
    }

    /// Parse a `Content-Type` header value.
    ///
    /// Parameters such as `charset` are ignored. Returns `None` for
    /// encodings this driver does not speak.
    pub fn from_mime(value: &str) -> Option<Self> {
        let essence = value.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case("application/json") {
            Some(ContentType::Json)
        } else if essence.eq_ignore_ascii_case("application/x-msgpack")
            || essence.eq_ignore_ascii_case("application/msgpack")
        {
            Some(ContentType::MessagePack)
        } else {
            None
        }
    }
}

impl TryFrom<i32> for ContentType {
    type Error = DriverError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ContentType::Json),
            1 => Ok(ContentType::MessagePack),
            other => Err(DriverError::UnsupportedContentType(other)),
        }
    }
}

impl From<ContentType> for i32 {
    fn from(ct: ContentType) -> Self {
        ct as i32
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
