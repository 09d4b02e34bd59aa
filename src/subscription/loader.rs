//! Load cycle orchestration.

use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::AdapterConfig;
use crate::observability::metrics;
use crate::subscription::aggregator::{Aggregator, EndpointFailure};
use crate::subscription::auth::compute_token;
use crate::subscription::fetcher::{ClientError, Fetcher};
use crate::subscription::registry::{self, CollectionKind};
use crate::subscription::snapshot::SnapshotStore;

/// Errors that abort a whole load cycle.
///
/// Individual endpoint failures never produce a `LoadError`; they are
/// reported in the [`CycleReport`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("control plane rejected the credentials (status {status} on /{endpoint})")]
    Unauthorized { endpoint: &'static str, status: u16 },

    #[error("load cycle cancelled")]
    Cancelled,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Outcome of one completed load cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// Collections replaced in the snapshot this cycle.
    pub published: Vec<CollectionKind>,
    /// Endpoints whose slot kept its previous value.
    pub failures: Vec<EndpointFailure>,
    /// Whether the cycle deadline cut outstanding fetches short.
    pub deadline_exceeded: bool,
    /// Populated slots in the snapshot after publishing.
    pub populated: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CycleReport {
    /// True when every endpoint was fetched and decoded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.deadline_exceeded
    }
}

/// Runs load cycles against the control plane and publishes into a store.
///
/// Cycles are serialised per store: a reload that arrives while a cycle is
/// running waits for it to finish, whichever loader started it.
#[derive(Debug, Default)]
pub struct SubscriptionLoader {
    store: SnapshotStore,
}

impl SubscriptionLoader {
    pub fn new(store: SnapshotStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Fetch every endpoint, wait for all of them, and publish the results.
    pub async fn load(
        &self,
        config: &AdapterConfig,
        shutdown: &CancellationToken,
    ) -> Result<CycleReport, LoadError> {
        let fetcher = Fetcher::new(&config.control_plane, &config.timeouts, &config.retries)?;
        self.load_with(&fetcher, config, shutdown).await
    }

    /// Run a cycle with a prepared fetcher.
    pub async fn load_with(
        &self,
        fetcher: &Fetcher,
        config: &AdapterConfig,
        shutdown: &CancellationToken,
    ) -> Result<CycleReport, LoadError> {
        let _cycle_guard = self.store.lock_cycle().await;
        let start = Instant::now();
        let control_plane = &config.control_plane;

        let token = compute_token(&control_plane.username, &control_plane.password);
        let endpoints = registry::endpoints();
        tracing::info!(
            service_url = %control_plane.service_url,
            endpoints = endpoints.len(),
            "Starting subscription data load cycle"
        );

        let cycle = shutdown.child_token();
        let mut results = fetcher.fetch_all(endpoints, &token, &cycle);
        let collected = Aggregator::new(
            endpoints.len(),
            Duration::from_secs(config.timeouts.cycle_secs),
        )
        .collect(&mut results, &cycle)
        .await;
        cycle.cancel();

        if let Some(rejection) = collected.rejection {
            metrics::record_cycle("unauthorized");
            return Err(LoadError::Unauthorized {
                endpoint: rejection.endpoint,
                status: rejection.status,
            });
        }
        if shutdown.is_cancelled() {
            metrics::record_cycle("cancelled");
            tracing::warn!("Load cycle cancelled by shutdown, nothing published");
            return Err(LoadError::Cancelled);
        }

        let snapshot = self.store.publish(&collected.decoded);
        for collection in &collected.decoded {
            metrics::record_collection_items(collection.kind(), collection.len());
        }
        metrics::record_populated_slots(snapshot.populated());

        let report = CycleReport {
            published: collected.decoded.iter().map(|c| c.kind()).collect(),
            failures: collected.failures,
            deadline_exceeded: collected.deadline_exceeded,
            populated: snapshot.populated(),
            elapsed: start.elapsed(),
        };
        metrics::record_cycle(if report.is_complete() { "complete" } else { "partial" });

        tracing::info!(
            published = report.published.len(),
            failed = report.failures.len(),
            populated = report.populated,
            elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "Subscription data load cycle finished"
        );

        Ok(report)
    }
}

/// Run one load cycle publishing into `store`.
///
/// Waits for any cycle already running against the same store.
pub async fn load_subscription_data(
    config: &AdapterConfig,
    store: &SnapshotStore,
    shutdown: &CancellationToken,
) -> Result<CycleReport, LoadError> {
    SubscriptionLoader::new(store.clone())
        .load(config, shutdown)
        .await
}
