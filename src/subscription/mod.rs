//! Control-plane subscription data subsystem.
//!
//! # Data Flow
//! ```text
//! load_subscription_data(config)
//!     → auth.rs (Basic token from configured credentials)
//!     → fetcher.rs (one task per registry.rs endpoint, in parallel)
//!     → mpsc channel (exactly one FetchResult per endpoint, any order)
//!     → aggregator.rs (join barrier, decode by declared shape)
//!     → snapshot.rs (atomic swap of the published snapshot)
//! ```
//!
//! # Design Decisions
//! - Payloads are decoded by the endpoint's declared `CollectionKind`,
//!   never by inspecting payload content
//! - Endpoint failures are logged and leave that collection at its
//!   previous value; only credential rejection fails a cycle
//! - Readers always see a complete snapshot, never a half-written one

pub mod aggregator;
pub mod auth;
pub mod fetcher;
pub mod loader;
pub mod registry;
pub mod snapshot;
pub mod types;

pub use loader::{load_subscription_data, CycleReport, LoadError, SubscriptionLoader};
pub use registry::{CollectionKind, EndpointSpec};
pub use snapshot::{Collection, SnapshotStore, SubscriptionSnapshot};
