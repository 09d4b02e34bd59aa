//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Fetch of one endpoint:
//!     → per-request timeout (reqwest client timeout)
//!     → On failure: retries.rs (check if retryable, wait backoff.rs delay)
//!     → Whole cycle bounded by the cycle deadline in the aggregator
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every control-plane call has a deadline
//! - Retries are bounded per endpoint per cycle
//! - Jittered backoff prevents the six endpoints retrying in lockstep

pub mod backoff;
pub mod retries;
