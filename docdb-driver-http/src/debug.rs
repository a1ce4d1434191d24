//! Strict-decoding debug wrappers.
//!
//! [`ConnectionDebugWrapper`] wraps any [`Connection`] and behaves like it,
//! except that every decode it performs rejects fields the target type does
//! not declare. It is meant for development and test runs, where a server
//! response that grew a field should fail loudly instead of being silently
//! dropped.
//!
//! - [`ConnectionDebugWrapper::unmarshal`] decodes with
//!   [`codec::decode_strict`] and never calls the wrapped connection's own
//!   decoder.
//! - With [`ContentType::Json`], responses returned by `execute` are wrapped
//!   in a [`ResponseDebugWrapper`], whose whole-body
//!   [`parse_body`](ResponseDebugWrapper::parse_body) is strict as well.
//! - With [`ContentType::MessagePack`], responses are returned untouched.
//!
//! # Example
//!
//! ```ignore
//! use docdb_driver_http::{new_connection_debug_wrapper, ContentType, HttpConnectionBuilder};
//!
//! let conn = HttpConnectionBuilder::new(["http://localhost:8529"]).build()?;
//! let conn = new_connection_debug_wrapper(conn, ContentType::Json);
//!
//! let req = conn.new_request(Method::GET, "/_api/version")?;
//! let resp = conn.execute(&Context::background(), req).await?;
//! // Fails if the server sends a field `Version` does not declare.
//! let version: Version = resp.parse_body("")?;
//! ```

use docdb_driver_core::{
    Authentication, Connection, ContentType, Context, DriverError, ProtocolSet, RawObject,
    Response, codec,
};
use http::Method;
use serde::de::DeserializeOwned;

use crate::response::{IntoJsonResponse, JsonResponse};

/// Wrap `origin` so its decoding is strict.
///
/// `content_type` selects the decode path; it should match the content type
/// `origin` was built with.
pub fn new_connection_debug_wrapper<C>(origin: C, content_type: ContentType) -> ConnectionDebugWrapper<C>
where
    C: Connection,
{
    ConnectionDebugWrapper::new(origin, content_type)
}

/// A [`Connection`] that decodes strictly and delegates everything else.
#[derive(Clone, Debug)]
pub struct ConnectionDebugWrapper<C> {
    origin: C,
    content_type: ContentType,
}

impl<C> ConnectionDebugWrapper<C> {
    pub fn new(origin: C, content_type: ContentType) -> Self {
        Self {
            origin,
            content_type,
        }
    }

    /// The wrapped connection.
    pub fn origin(&self) -> &C {
        &self.origin
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Unwrap the wrapped connection.
    pub fn into_inner(self) -> C {
        self.origin
    }
}

impl<C> Connection for ConnectionDebugWrapper<C>
where
    C: Connection,
    C::Response: IntoJsonResponse,
{
    type Request = C::Request;
    type Response = DebugResponse<C::Response>;
    type Authenticated = C::Authenticated;

    fn new_request(&self, method: Method, path: &str) -> Result<C::Request, DriverError> {
        self.origin.new_request(method, path)
    }

    async fn execute(
        &self,
        ctx: &Context,
        request: C::Request,
    ) -> Result<DebugResponse<C::Response>, DriverError> {
        let response = self.origin.execute(ctx, request).await?;

        match self.content_type {
            ContentType::MessagePack => Ok(DebugResponse::Origin(response)),
            ContentType::Json => match response.into_json_response() {
                Ok(json) => Ok(DebugResponse::Strict(ResponseDebugWrapper::new(json))),
                Err(other) => {
                    let actual = other.kind();
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        expected = ContentType::Json.as_str(),
                        actual,
                        endpoint = other.endpoint(),
                        "unexpected response kind"
                    );
                    Err(DriverError::UnexpectedResponseKind {
                        expected: ContentType::Json.as_str(),
                        actual,
                    })
                }
            },
        }
    }

    fn unmarshal<T: DeserializeOwned>(&self, data: &RawObject) -> Result<T, DriverError> {
        codec::decode_strict(self.content_type, data)
    }

    fn endpoints(&self) -> Vec<String> {
        self.origin.endpoints()
    }

    fn update_endpoints(&self, endpoints: Vec<String>) -> Result<(), DriverError> {
        self.origin.update_endpoints(endpoints)
    }

    fn set_authentication(
        &self,
        authentication: Authentication,
    ) -> Result<C::Authenticated, DriverError> {
        self.origin.set_authentication(authentication)
    }

    fn protocols(&self) -> ProtocolSet {
        self.origin.protocols()
    }
}

/// A JSON response whose whole-body decode is strict.
///
/// Sub-field decodes and array splitting go to the wrapped response
/// unchanged.
#[derive(Clone, Debug)]
pub struct ResponseDebugWrapper {
    inner: JsonResponse,
}

impl ResponseDebugWrapper {
    pub fn new(inner: JsonResponse) -> Self {
        Self { inner }
    }

    /// The wrapped response.
    pub fn inner(&self) -> &JsonResponse {
        &self.inner
    }

    pub fn into_inner(self) -> JsonResponse {
        self.inner
    }

    pub fn status_code(&self) -> u16 {
        self.inner.status_code()
    }

    pub fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }

    pub fn check_status(&self, valid: &[u16]) -> Result<(), DriverError> {
        self.inner.check_status(valid)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.inner.header(key)
    }

    /// Decode the body or one of its top-level fields.
    ///
    /// An empty `field` decodes the raw body with
    /// [`codec::decode_json_strict`]; the wrapped response is not consulted.
    /// A named field is decoded by the wrapped response.
    pub fn parse_body<T: DeserializeOwned>(&self, field: &str) -> Result<T, DriverError> {
        if field.is_empty() {
            return codec::decode_json_strict(self.inner.raw_body());
        }
        self.inner.parse_body(field)
    }

    /// The wrapped response's array elements, not wrapped.
    pub fn parse_array_body(&self) -> Result<Vec<JsonResponse>, DriverError> {
        self.inner.parse_array_body()
    }
}

/// A response returned by [`ConnectionDebugWrapper::execute`].
#[derive(Clone, Debug)]
pub enum DebugResponse<R> {
    /// A JSON response with strict whole-body decoding.
    Strict(ResponseDebugWrapper),
    /// An element split off a strict response; decoded like the origin's.
    Json(JsonResponse),
    /// The origin's response, untouched.
    Origin(R),
}

impl<R> DebugResponse<R> {
    /// Whether whole-body decodes of this response are strict.
    pub fn is_strict(&self) -> bool {
        matches!(self, DebugResponse::Strict(_))
    }
}

impl<R: Response> Response for DebugResponse<R> {
    fn status_code(&self) -> u16 {
        match self {
            DebugResponse::Strict(r) => r.status_code(),
            DebugResponse::Json(r) => r.status_code(),
            DebugResponse::Origin(r) => r.status_code(),
        }
    }

    fn endpoint(&self) -> &str {
        match self {
            DebugResponse::Strict(r) => r.endpoint(),
            DebugResponse::Json(r) => r.endpoint(),
            DebugResponse::Origin(r) => r.endpoint(),
        }
    }

    fn check_status(&self, valid: &[u16]) -> Result<(), DriverError> {
        match self {
            DebugResponse::Strict(r) => r.check_status(valid),
            DebugResponse::Json(r) => r.check_status(valid),
            DebugResponse::Origin(r) => r.check_status(valid),
        }
    }

    fn header(&self, key: &str) -> Option<&str> {
        match self {
            DebugResponse::Strict(r) => r.header(key),
            DebugResponse::Json(r) => r.header(key),
            DebugResponse::Origin(r) => r.header(key),
        }
    }

    fn parse_body<T: DeserializeOwned>(&self, field: &str) -> Result<T, DriverError> {
        match self {
            DebugResponse::Strict(r) => r.parse_body(field),
            DebugResponse::Json(r) => r.parse_body(field),
            DebugResponse::Origin(r) => r.parse_body(field),
        }
    }

    fn parse_array_body(&self) -> Result<Vec<Self>, DriverError> {
        match self {
            DebugResponse::Strict(r) => Ok(r
                .parse_array_body()?
                .into_iter()
                .map(DebugResponse::Json)
                .collect()),
            DebugResponse::Json(r) => Ok(r
                .parse_array_body()?
                .into_iter()
                .map(DebugResponse::Json)
                .collect()),
            DebugResponse::Origin(r) => Ok(r
                .parse_array_body()?
                .into_iter()
                .map(DebugResponse::Origin)
                .collect()),
        }
    }
}

impl<R: IntoJsonResponse> IntoJsonResponse for DebugResponse<R> {
    fn kind(&self) -> &'static str {
        match self {
            DebugResponse::Strict(_) | DebugResponse::Json(_) => ContentType::Json.as_str(),
            DebugResponse::Origin(r) => r.kind(),
        }
    }

    fn into_json_response(self) -> Result<JsonResponse, Self> {
        match self {
            DebugResponse::Strict(r) => Ok(r.into_inner()),
            DebugResponse::Json(r) => Ok(r),
            DebugResponse::Origin(r) => r.into_json_response().map_err(DebugResponse::Origin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::HttpResponse;
    use docdb_driver_core::Protocol;
    use http::HeaderMap;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct OnlyA {
        a: i64,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct OnlyB {
        b: i64,
    }

    /// Connection that returns a canned outcome and counts decoder calls.
    #[derive(Clone, Debug)]
    struct MockConnection {
        outcome: Result<HttpResponse, DriverError>,
        endpoints: Arc<Mutex<Vec<String>>>,
        unmarshal_calls: Arc<AtomicUsize>,
        authentication: Option<Authentication>,
    }

    impl MockConnection {
        fn new(outcome: Result<HttpResponse, DriverError>) -> Self {
            Self {
                outcome,
                endpoints: Arc::new(Mutex::new(vec!["http://db:8529".into()])),
                unmarshal_calls: Arc::new(AtomicUsize::new(0)),
                authentication: None,
            }
        }
    }

    impl Connection for MockConnection {
        type Request = (Method, String);
        type Response = HttpResponse;
        type Authenticated = MockConnection;

        fn new_request(&self, method: Method, path: &str) -> Result<(Method, String), DriverError> {
            if path.is_empty() {
                return Err(DriverError::InvalidRequest("empty path".into()));
            }
            Ok((method, path.to_string()))
        }

        async fn execute(
            &self,
            _ctx: &Context,
            _request: (Method, String),
        ) -> Result<HttpResponse, DriverError> {
            self.outcome.clone()
        }

        fn unmarshal<T: DeserializeOwned>(&self, data: &RawObject) -> Result<T, DriverError> {
            self.unmarshal_calls.fetch_add(1, Ordering::SeqCst);
            codec::decode(ContentType::Json, data)
        }

        fn endpoints(&self) -> Vec<String> {
            self.endpoints.lock().unwrap().clone()
        }

        fn update_endpoints(&self, endpoints: Vec<String>) -> Result<(), DriverError> {
            if endpoints.is_empty() {
                return Err(DriverError::NoEndpoints);
            }
            *self.endpoints.lock().unwrap() = endpoints;
            Ok(())
        }

        fn set_authentication(
            &self,
            authentication: Authentication,
        ) -> Result<MockConnection, DriverError> {
            if authentication == Authentication::Raw(String::new()) {
                return Err(DriverError::InvalidRequest("empty authorization".into()));
            }
            Ok(MockConnection {
                authentication: Some(authentication),
                ..self.clone()
            })
        }

        fn protocols(&self) -> ProtocolSet {
            ProtocolSet::new().with(Protocol::Http1)
        }
    }

    fn json_response(status: u16, body: &'static str) -> HttpResponse {
        let mut headers = HeaderMap::new();
        headers.insert("x-arango-endpoint", "db-1".parse().unwrap());
        HttpResponse::new(
            ContentType::Json,
            status,
            "http://db:8529",
            headers,
            bytes::Bytes::from_static(body.as_bytes()),
        )
    }

    fn msgpack_response(value: &OnlyA) -> HttpResponse {
        HttpResponse::new(
            ContentType::MessagePack,
            200,
            "http://db:8529",
            HeaderMap::new(),
            bytes::Bytes::from(rmp_serde::to_vec_named(value).unwrap()),
        )
    }

    #[test]
    fn test_new_request_passes_through() {
        let origin = MockConnection::new(Err(DriverError::NoEndpoints));
        let wrapper = new_connection_debug_wrapper(origin.clone(), ContentType::Json);

        assert_eq!(
            wrapper.new_request(Method::GET, "/_api/version").unwrap(),
            origin.new_request(Method::GET, "/_api/version").unwrap()
        );
        assert_eq!(
            wrapper.new_request(Method::GET, "").unwrap_err(),
            origin.new_request(Method::GET, "").unwrap_err()
        );
    }

    #[test]
    fn test_endpoints_pass_through() {
        let origin = MockConnection::new(Err(DriverError::NoEndpoints));
        let wrapper = new_connection_debug_wrapper(origin.clone(), ContentType::Json);

        assert_eq!(wrapper.endpoints(), origin.endpoints());
        wrapper
            .update_endpoints(vec!["http://a:8529".into(), "http://b:8529".into()])
            .unwrap();
        assert_eq!(origin.endpoints(), vec!["http://a:8529", "http://b:8529"]);
        assert_eq!(
            wrapper.update_endpoints(Vec::new()).unwrap_err(),
            DriverError::NoEndpoints
        );
        assert_eq!(wrapper.protocols(), origin.protocols());
    }

    #[test]
    fn test_set_authentication_returns_origin_result() {
        let origin = MockConnection::new(Err(DriverError::NoEndpoints));
        let wrapper = new_connection_debug_wrapper(origin, ContentType::Json);

        let authed: MockConnection = wrapper
            .set_authentication(Authentication::basic("root", "pw"))
            .unwrap();
        assert_eq!(authed.authentication, Some(Authentication::basic("root", "pw")));

        let err = wrapper
            .set_authentication(Authentication::Raw(String::new()))
            .unwrap_err();
        assert_eq!(err, DriverError::InvalidRequest("empty authorization".into()));
    }

    #[tokio::test]
    async fn test_execute_error_is_returned_verbatim() {
        for content_type in [ContentType::Json, ContentType::MessagePack] {
            let origin = MockConnection::new(Err(DriverError::Transport("connection refused".into())));
            let wrapper = new_connection_debug_wrapper(origin, content_type);
            let req = wrapper.new_request(Method::GET, "/_api/version").unwrap();

            let err = wrapper.execute(&Context::background(), req).await.unwrap_err();
            assert_eq!(err, DriverError::Transport("connection refused".into()));
        }
    }

    #[tokio::test]
    async fn test_execute_json_wraps_response() {
        let origin = MockConnection::new(Ok(json_response(200, r#"{"a":1}"#)));
        let wrapper = new_connection_debug_wrapper(origin, ContentType::Json);
        let req = wrapper.new_request(Method::GET, "/doc").unwrap();

        let resp = wrapper.execute(&Context::background(), req).await.unwrap();
        assert!(resp.is_strict());
        assert_eq!(resp.status_code(), 200);
        assert_eq!(resp.endpoint(), "http://db:8529");
        assert_eq!(resp.header("x-arango-endpoint"), Some("db-1"));
        assert_eq!(resp.parse_body::<OnlyA>("").unwrap(), OnlyA { a: 1 });
    }

    #[tokio::test]
    async fn test_strict_response_rejects_unknown_field() {
        let origin = MockConnection::new(Ok(json_response(200, r#"{"a":1,"extra":true}"#)));
        let wrapper = new_connection_debug_wrapper(origin.clone(), ContentType::Json);
        let req = wrapper.new_request(Method::GET, "/doc").unwrap();

        let resp = wrapper.execute(&Context::background(), req).await.unwrap();
        let err = resp.parse_body::<OnlyA>("").unwrap_err();
        assert!(err.type_name().unwrap().ends_with("OnlyA"));
        assert!(err.to_string().contains("extra"));

        // The same body is accepted by the origin's own decoder.
        let lenient: OnlyA = origin.outcome.unwrap().parse_body("").unwrap();
        assert_eq!(lenient, OnlyA { a: 1 });
    }

    #[tokio::test]
    async fn test_strict_response_field_uses_native_parse() {
        let body = r#"{"error":false,"result":{"a":7,"_rev":"x"}}"#;
        let origin = MockConnection::new(Ok(json_response(200, body)));
        let wrapper = new_connection_debug_wrapper(origin, ContentType::Json);
        let req = wrapper.new_request(Method::GET, "/doc").unwrap();

        let resp = wrapper.execute(&Context::background(), req).await.unwrap();
        assert_eq!(resp.parse_body::<OnlyA>("result").unwrap(), OnlyA { a: 7 });
        assert_eq!(
            resp.parse_body::<OnlyA>("missing").unwrap_err(),
            DriverError::FieldNotFound("missing".into())
        );
    }

    #[tokio::test]
    async fn test_strict_response_check_status_passes_through() {
        let body = r#"{"error":true,"code":404,"errorNum":1202,"errorMessage":"document not found"}"#;
        let origin = MockConnection::new(Ok(json_response(404, body)));
        let expected = origin.outcome.clone().unwrap().check_status(&[200]).unwrap_err();
        let wrapper = new_connection_debug_wrapper(origin, ContentType::Json);
        let req = wrapper.new_request(Method::GET, "/doc").unwrap();

        let resp = wrapper.execute(&Context::background(), req).await.unwrap();
        assert_eq!(resp.check_status(&[200]).unwrap_err(), expected);
        assert!(resp.check_status(&[404]).is_ok());
    }

    #[tokio::test]
    async fn test_strict_response_array_elements_pass_through() {
        let origin = MockConnection::new(Ok(json_response(200, r#"[{"a":1,"x":0},{"a":2}]"#)));
        let wrapper = new_connection_debug_wrapper(origin, ContentType::Json);
        let req = wrapper.new_request(Method::GET, "/docs").unwrap();

        let resp = wrapper.execute(&Context::background(), req).await.unwrap();
        let elements = resp.parse_array_body().unwrap();
        assert_eq!(elements.len(), 2);
        assert!(elements.iter().all(|e| matches!(e, DebugResponse::Json(_))));
        // Elements decode with the wrapped response's own rules.
        assert_eq!(elements[0].parse_body::<OnlyA>("").unwrap(), OnlyA { a: 1 });
        assert_eq!(elements[1].status_code(), 200);
    }

    #[tokio::test]
    async fn test_execute_json_rejects_foreign_response_kind() {
        let origin = MockConnection::new(Ok(msgpack_response(&OnlyA { a: 1 })));
        let wrapper = new_connection_debug_wrapper(origin, ContentType::Json);
        let req = wrapper.new_request(Method::GET, "/doc").unwrap();

        let err = wrapper.execute(&Context::background(), req).await.unwrap_err();
        assert_eq!(
            err,
            DriverError::UnexpectedResponseKind {
                expected: "json",
                actual: "msgpack",
            }
        );
    }

    #[tokio::test]
    async fn test_execute_msgpack_passes_response_through() {
        let origin = MockConnection::new(Ok(msgpack_response(&OnlyA { a: 3 })));
        let wrapper = new_connection_debug_wrapper(origin, ContentType::MessagePack);
        let req = wrapper.new_request(Method::GET, "/doc").unwrap();

        let resp = wrapper.execute(&Context::background(), req).await.unwrap();
        assert!(matches!(resp, DebugResponse::Origin(HttpResponse::MessagePack(_))));
        assert_eq!(resp.parse_body::<OnlyA>("").unwrap(), OnlyA { a: 3 });

        // A JSON response is not re-wrapped either.
        let origin = MockConnection::new(Ok(json_response(200, r#"{"a":1,"b":2}"#)));
        let wrapper = new_connection_debug_wrapper(origin, ContentType::MessagePack);
        let req = wrapper.new_request(Method::GET, "/doc").unwrap();
        let resp = wrapper.execute(&Context::background(), req).await.unwrap();
        assert!(!resp.is_strict());
        assert_eq!(resp.parse_body::<OnlyA>("").unwrap(), OnlyA { a: 1 });
    }

    #[test]
    fn test_unmarshal_is_strict_and_bypasses_origin() {
        let origin = MockConnection::new(Err(DriverError::NoEndpoints));
        let wrapper = new_connection_debug_wrapper(origin.clone(), ContentType::MessagePack);
        let payload = RawObject::from(r#"{"a":1}"#);

        // JSON-framed payload under a MessagePack declaration is sniffed.
        let a: OnlyA = wrapper.unmarshal(&payload).unwrap();
        assert_eq!(a, OnlyA { a: 1 });

        let err = wrapper.unmarshal::<OnlyB>(&payload).unwrap_err();
        assert!(matches!(err, DriverError::Decode { .. }));
        assert!(err.type_name().unwrap().ends_with("OnlyB"));

        assert_eq!(origin.unmarshal_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unmarshal_msgpack_rejects_unknown_field() {
        #[derive(Serialize)]
        struct WithExtra {
            a: i64,
            extra: &'static str,
        }
        let origin = MockConnection::new(Err(DriverError::NoEndpoints));
        let wrapper = new_connection_debug_wrapper(origin, ContentType::MessagePack);
        let payload = RawObject::from(rmp_serde::to_vec_named(&WithExtra { a: 1, extra: "x" }).unwrap());

        let err = wrapper.unmarshal::<OnlyA>(&payload).unwrap_err();
        assert!(err.to_string().contains("extra"));
    }

    #[test]
    fn test_debug_response_into_json_response() {
        let strict: DebugResponse<HttpResponse> = DebugResponse::Strict(ResponseDebugWrapper::new(
            JsonResponse::new(200, "http://db:8529", HeaderMap::new(), "{}"),
        ));
        assert_eq!(strict.kind(), "json");
        assert!(strict.into_json_response().is_ok());

        let origin: DebugResponse<HttpResponse> =
            DebugResponse::Origin(msgpack_response(&OnlyA { a: 1 }));
        assert_eq!(origin.kind(), "msgpack");
        assert!(origin.into_json_response().is_err());
    }

    #[cfg(feature = "tracing")]
    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_foreign_response_kind_is_logged() {
        let origin = MockConnection::new(Ok(msgpack_response(&OnlyA { a: 1 })));
        let wrapper = new_connection_debug_wrapper(origin, ContentType::Json);
        let req = wrapper.new_request(Method::GET, "/doc").unwrap();

        assert!(wrapper.execute(&Context::background(), req).await.is_err());
        assert!(logs_contain("unexpected response kind"));
    }
}
