//! Shared test helpers for Midas API integration tests
//!
//! Provides wiremock-based mock server setup for the Midas JSON web API.
//! Every API method is served from `POST /api/json?method=<name>`, so
//! mocks are told apart by their query parameters.

use midsync_core::domain::{Email, Session};
use midsync_midas::client::MidasClient;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

/// Session token used by every helper
pub const TOKEN: &str = "test-session-token";

/// Starts a mock server and returns a client pointing at it
pub async fn setup_midas_mock() -> (MockServer, MidasClient) {
    let server = MockServer::start().await;
    let client = MidasClient::new(server.uri());
    (server, client)
}

/// A session carrying [`TOKEN`]
pub fn session() -> Session {
    Session::new(TOKEN, Email::new("jane@example.org").unwrap())
}

/// Successful envelope around `data`
pub fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "stat": "ok",
        "code": "0",
        "message": "",
        "data": data
    }))
}

/// Failure envelope with `code` and `message`
pub fn fail(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "stat": "fail",
        "code": code.to_string(),
        "message": message,
        "data": ""
    }))
}

/// Matcher for a call to `api_method`
pub fn api(api_method: &str) -> MockBuilder {
    Mock::given(path("/api/json")).and(query_param("method", api_method))
}

/// Mounts `midas.folder.children` for folder `id`
pub async fn mount_children(
    server: &MockServer,
    id: &str,
    folders: serde_json::Value,
    items: serde_json::Value,
) {
    api("midas.folder.children")
        .and(query_param("id", id))
        .and(query_param("token", TOKEN))
        .respond_with(ok(serde_json::json!({ "folders": folders, "items": items })))
        .mount(server)
        .await;
}

/// Mounts `midas.item.download` for item `id` returning raw `content`
pub async fn mount_item_download(server: &MockServer, id: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path("/api/json"))
        .and(query_param("method", "midas.item.download"))
        .and(query_param("id", id))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(content.to_vec())
                .append_header("Content-Type", "application/octet-stream"),
        )
        .mount(server)
        .await;
}

/// Mounts both steps of the upload handshake, accepting any file
pub async fn mount_upload_handshake(server: &MockServer) {
    api("midas.upload.generatetoken")
        .respond_with(ok(serde_json::json!({ "token": "upload-token-1" })))
        .mount(server)
        .await;

    api("midas.upload.perform")
        .and(query_param("uploadtoken", "upload-token-1"))
        .respond_with(ok(serde_json::json!({ "item_id": "0", "name": "uploaded" })))
        .mount(server)
        .await;
}
