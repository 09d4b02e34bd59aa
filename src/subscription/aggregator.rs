//! Result aggregation and shape dispatch.
//!
//! # Responsibilities
//! - Receive exactly one result per endpoint, in any order (join barrier)
//! - Decode each payload into the shape declared by its endpoint
//! - Enforce the cycle deadline
//! - Stop the cycle on the first credential rejection
//!
//! # State Transitions
//! ```text
//! FetchesInFlight(k) → FetchesInFlight(k+1): one result received
//! FetchesInFlight(N) → AllCollected: barrier released
//! deadline elapsed / Unauthorized → cycle token cancelled,
//!     remaining workers report Cancelled, barrier still waits for N
//! ```

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;
use crate::subscription::fetcher::{FetchError, FetchResult};
use crate::subscription::registry::CollectionKind;
use crate::subscription::snapshot::Collection;

/// Where an endpoint failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Fetch,
    Decode,
}

/// One endpoint that produced no data this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointFailure {
    pub endpoint: &'static str,
    pub collection: CollectionKind,
    pub stage: FailureStage,
    pub error: String,
}

/// Credential rejection observed during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub endpoint: &'static str,
    pub status: u16,
}

/// Everything collected from one cycle's results.
#[derive(Debug, Default)]
pub struct Collected {
    pub decoded: Vec<Collection>,
    pub failures: Vec<EndpointFailure>,
    pub rejection: Option<Rejection>,
    pub received: usize,
    pub deadline_exceeded: bool,
}

/// Join barrier over the per-endpoint result channel.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    expected: usize,
    deadline: Duration,
}

impl Aggregator {
    pub fn new(expected: usize, deadline: Duration) -> Self {
        Self { expected, deadline }
    }

    /// Wait for `expected` results and dispatch each by its declared shape.
    ///
    /// Cancels `cycle` when the deadline passes or the control plane rejects
    /// the credentials; the fetch tasks then report promptly so the barrier
    /// still completes with every result accounted for.
    pub async fn collect(
        &self,
        results: &mut mpsc::Receiver<FetchResult>,
        cycle: &CancellationToken,
    ) -> Collected {
        let mut collected = Collected::default();
        let deadline = tokio::time::sleep(self.deadline);
        tokio::pin!(deadline);

        while collected.received < self.expected {
            tokio::select! {
                maybe = results.recv() => {
                    let Some(result) = maybe else {
                        tracing::error!(
                            received = collected.received,
                            expected = self.expected,
                            "Result channel closed before every endpoint reported"
                        );
                        break;
                    };
                    collected.received += 1;
                    self.dispatch(result, &mut collected, cycle);
                }
                _ = &mut deadline, if !collected.deadline_exceeded => {
                    tracing::warn!(
                        deadline_secs = self.deadline.as_secs(),
                        received = collected.received,
                        expected = self.expected,
                        "Load cycle deadline exceeded, cancelling remaining fetches"
                    );
                    collected.deadline_exceeded = true;
                    cycle.cancel();
                }
            }
        }

        collected
    }

    fn dispatch(&self, result: FetchResult, collected: &mut Collected, cycle: &CancellationToken) {
        let endpoint = result.endpoint;

        let payload = match result.outcome {
            Ok(payload) => payload,
            Err(error) => {
                if let FetchError::Unauthorized(status) = error {
                    if collected.rejection.is_none() {
                        tracing::error!(
                            endpoint = endpoint.name,
                            status,
                            "Control plane rejected the credentials, cancelling load cycle"
                        );
                        collected.rejection = Some(Rejection {
                            endpoint: endpoint.name,
                            status,
                        });
                        cycle.cancel();
                    }
                }
                collected.failures.push(EndpointFailure {
                    endpoint: endpoint.name,
                    collection: endpoint.shape,
                    stage: FailureStage::Fetch,
                    error: error.to_string(),
                });
                return;
            }
        };

        match Collection::decode(endpoint.shape, &payload) {
            Ok(collection) => {
                tracing::debug!(
                    endpoint = endpoint.name,
                    items = collection.len(),
                    "Decoded control-plane collection"
                );
                collected.decoded.push(collection);
            }
            Err(e) => {
                metrics::record_decode_error(endpoint.name);
                tracing::error!(
                    endpoint = endpoint.name,
                    error = %e,
                    "Failed to decode control-plane response"
                );
                collected.failures.push(EndpointFailure {
                    endpoint: endpoint.name,
                    collection: endpoint.shape,
                    stage: FailureStage::Decode,
                    error: e.to_string(),
                });
            }
        }
    }
}
