#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use menuforge_backend::BackendConfig;
use menuforge_gateway::GatewayConfig;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use menuforge_api::config::ServerConfig;
use menuforge_api::router::build_app_router;
use menuforge_api::state::AppState;

pub const USER_TOKEN: &str = "user-jwt";
pub const USER_ID: &str = "0b5c1a52-6f1e-4a52-9a43-2f5b8d6a7c11";

/// Build a test `ServerConfig` whose backend and gateway point at `server`.
///
/// The gateway is mounted under `/gw/v1` so both upstreams share one mock.
pub fn test_config(server: &MockServer, service_key: bool) -> ServerConfig {
    let mut backend = BackendConfig::new(server.uri(), "anon-key");
    if service_key {
        backend = backend.with_service_key("service-key");
    }
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        storage_bucket: "generated-images".to_string(),
        json_logs: false,
        backend,
        gateway: GatewayConfig::new(format!("{}/gw/v1", server.uri()), "gateway-key"),
    }
}

/// Build the full application router, mirroring `main.rs`.
pub fn build_test_app(server: &MockServer, service_key: bool) -> Router {
    let config = test_config(server, service_key);
    build_app_router(AppState::new(config.clone()), &config)
}

/// Accept [`USER_TOKEN`] at the auth API.
pub async fn mock_signed_in_user(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", format!("Bearer {USER_TOKEN}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": USER_ID, "email": "chef@example.com" })),
        )
        .mount(server)
        .await;
}

/// Serve the profile of [`USER_ID`] with the given organization and role.
pub async fn mock_profile(server: &MockServer, organization_id: Option<&str>, role: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{USER_ID}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": USER_ID,
            "organization_id": organization_id,
            "email": "chef@example.com",
            "full_name": null,
            "role": role,
            "created_at": "2026-01-01T00:00:00Z"
        }])))
        .mount(server)
        .await;
}

/// Answer image requests at the gateway with `url`.
pub async fn mock_image_response(server: &MockServer, url: &str) {
    Mock::given(method("POST"))
        .and(path("/gw/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "content": "",
                    "images": [{ "type": "image_url", "image_url": { "url": url } }]
                }
            }]
        })))
        .mount(server)
        .await;
}

/// Answer every admin settings lookup with "not set".
pub async fn mock_no_admin_settings(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/admin_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a JSON body, authenticated as [`USER_TOKEN`] when `authorized`.
pub async fn post_json(app: Router, uri: &str, body: Value, authorized: bool) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if authorized {
        builder = builder.header("authorization", format!("Bearer {USER_TOKEN}"));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
