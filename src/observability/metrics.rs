//! Metrics collection and exposition.
//!
//! # Metrics
//! - `adapter_fetch_total` (counter): fetch outcomes by endpoint, outcome
//! - `adapter_fetch_duration_seconds` (histogram): per-attempt latency by endpoint
//! - `adapter_decode_errors_total` (counter): payloads that failed to decode
//! - `adapter_collection_items` (gauge): items in each published collection
//! - `adapter_snapshot_populated_slots` (gauge): populated collections out of six
//! - `adapter_load_cycles_total` (counter): cycles by outcome
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; no-ops until a recorder is installed
//! - Prometheus exporter serves its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::subscription::registry::CollectionKind;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_fetch_outcome(endpoint: &'static str, outcome: &'static str) {
    counter!("adapter_fetch_total", "endpoint" => endpoint, "outcome" => outcome).increment(1);
}

pub fn record_fetch_duration(endpoint: &'static str, start: Instant) {
    histogram!("adapter_fetch_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_decode_error(endpoint: &'static str) {
    counter!("adapter_decode_errors_total", "endpoint" => endpoint).increment(1);
}

#[allow(clippy::cast_precision_loss)]
pub fn record_collection_items(kind: CollectionKind, items: usize) {
    gauge!("adapter_collection_items", "collection" => kind.as_str()).set(items as f64);
}

#[allow(clippy::cast_precision_loss)]
pub fn record_populated_slots(populated: usize) {
    gauge!("adapter_snapshot_populated_slots").set(populated as f64);
}

pub fn record_cycle(outcome: &'static str) {
    counter!("adapter_load_cycles_total", "outcome" => outcome).increment(1);
}
