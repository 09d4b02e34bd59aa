//! Gateway adapter library.
//!
//! Pulls subscription, application, key-mapping, API and policy data from
//! the control plane's internal data API and publishes it as an atomically
//! swapped snapshot for the rest of the gateway.

pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod subscription;

pub use config::schema::AdapterConfig;
pub use lifecycle::Shutdown;
pub use subscription::{load_subscription_data, CycleReport, LoadError, SnapshotStore, SubscriptionLoader};
