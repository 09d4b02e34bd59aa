//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Fetcher, aggregator and loader produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging with endpoint and URL fields on every failure
//! - Credentials never reach a log line
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
