//! In-process database stand-in for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize, PartialEq)]
pub struct Version {
    pub server: String,
    pub version: String,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct VersionWithLicense {
    pub server: String,
    pub version: String,
    pub license: String,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct Document {
    #[serde(rename = "_key")]
    pub key: String,
    pub name: String,
}

async fn version() -> Json<serde_json::Value> {
    Json(json!({
        "server": "docdb",
        "version": "3.11.0",
        "license": "community",
    }))
}

async fn document(Path(key): Path<String>) -> impl IntoResponse {
    if key == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": true,
                "code": 404,
                "errorNum": 1202,
                "errorMessage": "document not found",
            })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "_key": key, "_rev": "_hV2", "name": "alice" })),
    )
}

async fn documents() -> Json<serde_json::Value> {
    Json(json!([
        { "_key": "a", "name": "alice" },
        { "_key": "b", "name": "bob" },
    ]))
}

async fn document_msgpack() -> impl IntoResponse {
    let doc = Document {
        key: "m".into(),
        name: "mallory".into(),
    };
    let body = rmp_serde::to_vec_named(&doc).unwrap_or_default();
    ([(header::CONTENT_TYPE, "application/x-msgpack")], body)
}

async fn echo_headers(headers: HeaderMap) -> Json<serde_json::Value> {
    let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    Json(json!({
        "queueTime": get("x-arango-queue-time-seconds"),
        "authorization": get("authorization"),
        "accept": get("accept"),
    }))
}

async fn slow() -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_millis(500)).await;
    Json(json!({}))
}

/// Start the server on an ephemeral port and return its endpoint.
pub async fn spawn_server() -> String {
    let app = Router::new()
        .route("/_api/version", get(version))
        .route("/_api/document", get(documents))
        .route("/_api/document/{key}", get(document))
        .route("/_api/msgpack/document", get(document_msgpack))
        .route("/_api/echo", get(echo_headers))
        .route("/_api/slow", get(slow));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
