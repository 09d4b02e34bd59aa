//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use gateway_adapter::AdapterConfig;
use secrecy::SecretString;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const EMPTY_LIST: &str = r#"{"list":[]}"#;

/// Every endpoint path, in registry order.
pub const ENDPOINTS: [&str; 6] = [
    "subscriptions",
    "applications",
    "application-key-mappings",
    "apis",
    "application-policies",
    "subscription-policies",
];

pub fn data_path(endpoint: &str) -> String {
    format!("/internal/data/v1/{}", endpoint)
}

/// Adapter config pointing at a mock control plane, retries off.
pub fn config_for(server: &MockServer) -> AdapterConfig {
    let mut config = AdapterConfig::default();
    config.control_plane.service_url = server.uri();
    config.control_plane.username = "admin".to_string();
    config.control_plane.password = SecretString::from("admin".to_string());
    config.retries.enabled = false;
    config.timeouts.request_secs = 5;
    config.timeouts.cycle_secs = 10;
    config
}

/// Mount a 200 response with `body` on one endpoint.
pub async fn mount_ok(server: &MockServer, endpoint: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(data_path(endpoint)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mount a response with the given status on one endpoint.
pub async fn mount_status(server: &MockServer, endpoint: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(data_path(endpoint)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mount a delayed 200 response on one endpoint.
pub async fn mount_slow(server: &MockServer, endpoint: &str, body: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(data_path(endpoint)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Mount an empty list on every endpoint not in `except`.
pub async fn mount_empty_except(server: &MockServer, except: &[&str]) {
    for endpoint in ENDPOINTS.iter().filter(|e| !except.contains(e)) {
        mount_ok(server, endpoint, EMPTY_LIST).await;
    }
}
