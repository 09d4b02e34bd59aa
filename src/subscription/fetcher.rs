//! Concurrent fetcher for the internal data API.
//!
//! # Responsibilities
//! - Build one GET per endpoint with the gateway query parameters and Basic auth
//! - Run every endpoint on its own task
//! - Retry retryable failures with backoff, bounded per request by a timeout
//! - Deliver exactly one [`FetchResult`] per endpoint to a shared channel
//!
//! # Design Decisions
//! - A failed endpoint never blocks or fails the others
//! - Each task races its work against the cycle's cancellation token;
//!   dropping the in-flight future aborts the HTTP call
//! - Certificate verification is an explicit configuration flag

use std::fs;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::{ControlPlaneConfig, RetryConfig, TimeoutConfig};
use crate::observability::metrics;
use crate::resilience::retries::{is_retryable_status, RetryPolicy};
use crate::subscription::auth::AccessToken;
use crate::subscription::registry::{CollectionKind, EndpointSpec};

const GATEWAY_LABEL_PARAM: &str = "gatewayLabel";
const TYPE_PARAM: &str = "type";

/// Why a single endpoint fetch failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build request: {0}")]
    RequestBuild(String),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("control plane responded with status {0}")]
    HttpStatus(u16),

    #[error("control plane rejected the credentials with status {0}")]
    Unauthorized(u16),

    #[error("failed to read response body: {0}")]
    BodyRead(#[source] reqwest::Error),

    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout(_) => true,
            FetchError::HttpStatus(status) => is_retryable_status(*status),
            FetchError::RequestBuild(_)
            | FetchError::Unauthorized(_)
            | FetchError::BodyRead(_)
            | FetchError::Cancelled => false,
        }
    }

    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            FetchError::RequestBuild(_) => "request_build",
            FetchError::Transport(_) => "transport",
            FetchError::Timeout(_) => "timeout",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::Unauthorized(_) => "unauthorized",
            FetchError::BodyRead(_) => "body_read",
            FetchError::Cancelled => "cancelled",
        }
    }
}

/// Errors building the control-plane HTTP client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to read CA bundle '{path}': {source}")]
    CaBundleRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CA bundle '{path}': {source}")]
    CaBundleInvalid {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Outcome of fetching one endpoint in one load cycle.
#[derive(Debug)]
pub struct FetchResult {
    pub endpoint: EndpointSpec,
    pub outcome: Result<Bytes, FetchError>,
}

impl FetchResult {
    /// The collection this result must be decoded into.
    pub fn shape(&self) -> CollectionKind {
        self.endpoint.shape
    }

    pub fn failed(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn payload(&self) -> Option<&Bytes> {
        self.outcome.as_ref().ok()
    }
}

/// HTTP fetcher bound to one control plane.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    base_url: String,
    query: Vec<(&'static str, String)>,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl Fetcher {
    /// Create a fetcher from configuration.
    pub fn new(
        control_plane: &ControlPlaneConfig,
        timeouts: &TimeoutConfig,
        retries: &RetryConfig,
    ) -> Result<Self, ClientError> {
        let request_timeout = Duration::from_secs(timeouts.request_secs);
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(request_timeout)
            .user_agent(concat!("gateway-adapter/", env!("CARGO_PKG_VERSION")));

        if control_plane.skip_tls_verification {
            tracing::debug!("TLS certificate verification disabled for the control-plane channel");
            builder = builder.danger_accept_invalid_certs(true);
        } else if let Some(path) = &control_plane.ca_cert_path {
            let pem = fs::read(path).map_err(|source| ClientError::CaBundleRead {
                path: path.clone(),
                source,
            })?;
            let cert =
                reqwest::Certificate::from_pem(&pem).map_err(|source| ClientError::CaBundleInvalid {
                    path: path.clone(),
                    source,
                })?;
            builder = builder.add_root_certificate(cert);
        }

        Ok(Self::with_client(
            builder.build()?,
            control_plane,
            RetryPolicy::from_config(retries),
            request_timeout,
        ))
    }

    /// Create a fetcher around an existing client.
    pub fn with_client(
        client: reqwest::Client,
        control_plane: &ControlPlaneConfig,
        retry: RetryPolicy,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: control_plane.service_url.clone(),
            query: vec![
                (GATEWAY_LABEL_PARAM, control_plane.gateway_label.clone()),
                (TYPE_PARAM, control_plane.connector_type.clone()),
            ],
            retry,
            request_timeout,
        }
    }

    /// Fetch every endpoint concurrently.
    ///
    /// Exactly one result per endpoint is sent on the returned channel, in
    /// completion order. Cancelling `cancel` aborts in-flight requests; their
    /// endpoints report [`FetchError::Cancelled`].
    pub fn fetch_all(
        &self,
        endpoints: &[EndpointSpec],
        token: &AccessToken,
        cancel: &CancellationToken,
    ) -> mpsc::Receiver<FetchResult> {
        let (tx, rx) = mpsc::channel(endpoints.len().max(1));

        for endpoint in endpoints.iter().copied() {
            let fetcher = self.clone();
            let token = token.clone();
            let cancel = cancel.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::warn!(endpoint = endpoint.name, "Fetch cancelled");
                        metrics::record_fetch_outcome(endpoint.name, "cancelled");
                        Err(FetchError::Cancelled)
                    }
                    outcome = fetcher.fetch_endpoint(&endpoint, &token) => outcome,
                };

                if tx.send(FetchResult { endpoint, outcome }).await.is_err() {
                    tracing::debug!(endpoint = endpoint.name, "Result collector dropped");
                }
            });
        }

        rx
    }

    /// Fetch one endpoint, retrying retryable failures.
    pub async fn fetch_endpoint(
        &self,
        endpoint: &EndpointSpec,
        token: &AccessToken,
    ) -> Result<Bytes, FetchError> {
        let url = endpoint.url(&self.base_url);
        let mut attempt = 1;

        loop {
            let start = Instant::now();
            let result = self.fetch_once(&url, token).await;
            metrics::record_fetch_duration(endpoint.name, start);

            match result {
                Ok(body) => {
                    metrics::record_fetch_outcome(endpoint.name, "success");
                    tracing::debug!(
                        endpoint = endpoint.name,
                        bytes = body.len(),
                        attempt,
                        "Fetched control-plane data"
                    );
                    return Ok(body);
                }
                Err(e) if e.is_retryable() && self.retry.allows_retry(attempt) => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(
                        endpoint = endpoint.name,
                        url = %url,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    metrics::record_fetch_outcome(endpoint.name, e.label());
                    tracing::error!(
                        endpoint = endpoint.name,
                        url = %url,
                        attempts = attempt,
                        error = %e,
                        "Failed to fetch control-plane data"
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str, token: &AccessToken) -> Result<Bytes, FetchError> {
        let auth = token
            .header_value()
            .map_err(|e| FetchError::RequestBuild(e.to_string()))?;

        let request = self
            .client
            .get(url)
            .query(&self.query)
            .header(AUTHORIZATION, auth)
            .build()
            .map_err(|e| FetchError::RequestBuild(e.to_string()))?;

        let response = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.request_timeout)
            } else {
                FetchError::Transport(e)
            }
        })?;

        match response.status() {
            StatusCode::OK => response.bytes().await.map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(self.request_timeout)
                } else {
                    FetchError::BodyRead(e)
                }
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(FetchError::Unauthorized(response.status().as_u16()))
            }
            status => Err(FetchError::HttpStatus(status.as_u16())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::auth::compute_token;
    use crate::subscription::registry::endpoints;
    use secrecy::SecretString;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_for(server: &MockServer, retry: RetryPolicy) -> Fetcher {
        let control_plane = ControlPlaneConfig {
            service_url: server.uri(),
            ..ControlPlaneConfig::default()
        };
        Fetcher::with_client(
            reqwest::Client::new(),
            &control_plane,
            retry,
            Duration::from_secs(5),
        )
    }

    fn token() -> AccessToken {
        compute_token("admin", &SecretString::from("admin".to_string()))
    }

    #[tokio::test]
    async fn test_request_carries_query_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/internal/data/v1/apis"))
            .and(query_param("gatewayLabel", "Production and Sandbox"))
            .and(query_param("type", "Envoy"))
            .and(header("authorization", "Basic YWRtaW46YWRtaW4="))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"list":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, RetryPolicy::none());
        let body = fetcher.fetch_endpoint(&endpoints()[3], &token()).await.unwrap();
        assert_eq!(&body[..], br#"{"list":[]}"#);
    }

    #[tokio::test]
    async fn test_non_200_is_http_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, RetryPolicy::none());
        let err = fetcher.fetch_endpoint(&endpoints()[0], &token()).await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(204)));
    }

    #[tokio::test]
    async fn test_forbidden_is_unauthorized_and_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let retry = RetryPolicy::from_config(&RetryConfig {
            base_delay_ms: 1,
            max_delay_ms: 1,
            ..RetryConfig::default()
        });
        let fetcher = fetcher_for(&server, retry);
        let err = fetcher.fetch_endpoint(&endpoints()[0], &token()).await.unwrap_err();
        assert!(matches!(err, FetchError::Unauthorized(403)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let control_plane = ControlPlaneConfig {
            service_url: "http://127.0.0.1:1".to_string(),
            ..ControlPlaneConfig::default()
        };
        let fetcher = Fetcher::with_client(
            reqwest::Client::new(),
            &control_plane,
            RetryPolicy::none(),
            Duration::from_secs(5),
        );

        let err = fetcher.fetch_endpoint(&endpoints()[0], &token()).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_all_reports_every_endpoint_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"list":[]}"#))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, RetryPolicy::none());
        let mut rx = fetcher.fetch_all(endpoints(), &token(), &CancellationToken::new());

        let mut seen = Vec::new();
        while let Some(result) = rx.recv().await {
            assert!(!result.failed());
            seen.push(result.shape());
        }
        seen.sort_by_key(|kind| kind.as_str());
        let mut expected = CollectionKind::ALL.to_vec();
        expected.sort_by_key(|kind| kind.as_str());
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"list":[]}"#)
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, RetryPolicy::none());
        let cancel = CancellationToken::new();
        let mut rx = fetcher.fetch_all(&endpoints()[..1], &token(), &cancel);

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result.outcome, Err(FetchError::Cancelled)));
    }
}
