//! Published subscription snapshot.
//!
//! # Responsibilities
//! - Hold the six most recently decoded collections
//! - Publish new snapshots atomically (ArcSwap)
//! - Answer point lookups for downstream consumers
//!
//! # Design Decisions
//! - A snapshot is immutable once published; readers hold an `Arc` to a
//!   consistent point-in-time view
//! - Each slot is independently stale: a failed endpoint keeps the
//!   previous cycle's collection
//! - Unpopulated slots are `None`, distinct from an empty list

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use crate::subscription::registry::CollectionKind;
use crate::subscription::types::{
    Api, ApiList, Application, ApplicationKeyMapping, ApplicationKeyMappingList, ApplicationList,
    ApplicationPolicy, ApplicationPolicyList, Subscription, SubscriptionList, SubscriptionPolicy,
    SubscriptionPolicyList,
};

/// A decoded collection tagged with its kind.
#[derive(Debug, Clone)]
pub enum Collection {
    Subscriptions(Arc<SubscriptionList>),
    Applications(Arc<ApplicationList>),
    ApplicationKeyMappings(Arc<ApplicationKeyMappingList>),
    Apis(Arc<ApiList>),
    ApplicationPolicies(Arc<ApplicationPolicyList>),
    SubscriptionPolicies(Arc<SubscriptionPolicyList>),
}

impl Collection {
    /// Decode a payload into the collection declared by `kind`.
    pub fn decode(kind: CollectionKind, payload: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            CollectionKind::Subscriptions => {
                Collection::Subscriptions(Arc::new(serde_json::from_slice(payload)?))
            }
            CollectionKind::Applications => {
                Collection::Applications(Arc::new(serde_json::from_slice(payload)?))
            }
            CollectionKind::ApplicationKeyMappings => {
                Collection::ApplicationKeyMappings(Arc::new(serde_json::from_slice(payload)?))
            }
            CollectionKind::Apis => Collection::Apis(Arc::new(serde_json::from_slice(payload)?)),
            CollectionKind::ApplicationPolicies => {
                Collection::ApplicationPolicies(Arc::new(serde_json::from_slice(payload)?))
            }
            CollectionKind::SubscriptionPolicies => {
                Collection::SubscriptionPolicies(Arc::new(serde_json::from_slice(payload)?))
            }
        })
    }

    pub fn kind(&self) -> CollectionKind {
        match self {
            Collection::Subscriptions(_) => CollectionKind::Subscriptions,
            Collection::Applications(_) => CollectionKind::Applications,
            Collection::ApplicationKeyMappings(_) => CollectionKind::ApplicationKeyMappings,
            Collection::Apis(_) => CollectionKind::Apis,
            Collection::ApplicationPolicies(_) => CollectionKind::ApplicationPolicies,
            Collection::SubscriptionPolicies(_) => CollectionKind::SubscriptionPolicies,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Collection::Subscriptions(l) => l.len(),
            Collection::Applications(l) => l.len(),
            Collection::ApplicationKeyMappings(l) => l.len(),
            Collection::Apis(l) => l.len(),
            Collection::ApplicationPolicies(l) => l.len(),
            Collection::SubscriptionPolicies(l) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON rendering in the control plane's wire format.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Collection::Subscriptions(l) => serde_json::to_value(l.as_ref()),
            Collection::Applications(l) => serde_json::to_value(l.as_ref()),
            Collection::ApplicationKeyMappings(l) => serde_json::to_value(l.as_ref()),
            Collection::Apis(l) => serde_json::to_value(l.as_ref()),
            Collection::ApplicationPolicies(l) => serde_json::to_value(l.as_ref()),
            Collection::SubscriptionPolicies(l) => serde_json::to_value(l.as_ref()),
        }
    }
}

/// Point-in-time view of the six control-plane collections.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionSnapshot {
    pub subscriptions: Option<Arc<SubscriptionList>>,
    pub applications: Option<Arc<ApplicationList>>,
    pub application_key_mappings: Option<Arc<ApplicationKeyMappingList>>,
    pub apis: Option<Arc<ApiList>>,
    pub application_policies: Option<Arc<ApplicationPolicyList>>,
    pub subscription_policies: Option<Arc<SubscriptionPolicyList>>,
}

/// Per-collection population summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    pub collection: CollectionKind,
    pub populated: bool,
    pub items: usize,
}

impl SubscriptionSnapshot {
    /// Replace the slot matching the collection's kind.
    pub fn set(&mut self, collection: Collection) {
        match collection {
            Collection::Subscriptions(l) => self.subscriptions = Some(l),
            Collection::Applications(l) => self.applications = Some(l),
            Collection::ApplicationKeyMappings(l) => self.application_key_mappings = Some(l),
            Collection::Apis(l) => self.apis = Some(l),
            Collection::ApplicationPolicies(l) => self.application_policies = Some(l),
            Collection::SubscriptionPolicies(l) => self.subscription_policies = Some(l),
        }
    }

    /// The collection in the given slot, if populated.
    pub fn get(&self, kind: CollectionKind) -> Option<Collection> {
        match kind {
            CollectionKind::Subscriptions => {
                self.subscriptions.clone().map(Collection::Subscriptions)
            }
            CollectionKind::Applications => self.applications.clone().map(Collection::Applications),
            CollectionKind::ApplicationKeyMappings => self
                .application_key_mappings
                .clone()
                .map(Collection::ApplicationKeyMappings),
            CollectionKind::Apis => self.apis.clone().map(Collection::Apis),
            CollectionKind::ApplicationPolicies => self
                .application_policies
                .clone()
                .map(Collection::ApplicationPolicies),
            CollectionKind::SubscriptionPolicies => self
                .subscription_policies
                .clone()
                .map(Collection::SubscriptionPolicies),
        }
    }

    pub fn is_populated(&self, kind: CollectionKind) -> bool {
        match kind {
            CollectionKind::Subscriptions => self.subscriptions.is_some(),
            CollectionKind::Applications => self.applications.is_some(),
            CollectionKind::ApplicationKeyMappings => self.application_key_mappings.is_some(),
            CollectionKind::Apis => self.apis.is_some(),
            CollectionKind::ApplicationPolicies => self.application_policies.is_some(),
            CollectionKind::SubscriptionPolicies => self.subscription_policies.is_some(),
        }
    }

    /// Number of populated slots out of six.
    pub fn populated(&self) -> usize {
        CollectionKind::ALL
            .iter()
            .filter(|kind| self.is_populated(**kind))
            .count()
    }

    /// Kinds that have never been successfully loaded.
    pub fn missing(&self) -> Vec<CollectionKind> {
        CollectionKind::ALL
            .into_iter()
            .filter(|kind| !self.is_populated(*kind))
            .collect()
    }

    pub fn summary(&self) -> Vec<SlotSummary> {
        CollectionKind::ALL
            .into_iter()
            .map(|kind| {
                let collection = self.get(kind);
                SlotSummary {
                    collection: kind,
                    populated: collection.is_some(),
                    items: collection.map_or(0, |c| c.len()),
                }
            })
            .collect()
    }

    pub fn find_subscription(&self, api_id: i64, app_id: i64) -> Option<&Subscription> {
        self.subscriptions
            .as_deref()?
            .iter()
            .find(|s| s.api_id == api_id && s.app_id == app_id)
    }

    pub fn find_application(&self, id: i64) -> Option<&Application> {
        self.applications.as_deref()?.iter().find(|a| a.id == id)
    }

    pub fn find_key_mapping(&self, consumer_key: &str) -> Option<&ApplicationKeyMapping> {
        self.application_key_mappings
            .as_deref()?
            .iter()
            .find(|m| m.consumer_key == consumer_key)
    }

    pub fn find_api(&self, context: &str, version: &str) -> Option<&Api> {
        self.apis
            .as_deref()?
            .iter()
            .find(|a| a.context == context && a.version == version)
    }

    pub fn find_application_policy(&self, name: &str) -> Option<&ApplicationPolicy> {
        self.application_policies
            .as_deref()?
            .iter()
            .find(|p| p.name == name)
    }

    pub fn find_subscription_policy(&self, name: &str) -> Option<&SubscriptionPolicy> {
        self.subscription_policies
            .as_deref()?
            .iter()
            .find(|p| p.name == name)
    }
}

/// Shared, atomically swapped holder of the current snapshot.
///
/// Clones share both the snapshot and the cycle lock, so every load cycle
/// publishing into the same store runs one at a time.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<ArcSwap<SubscriptionSnapshot>>,
    cycle_lock: Arc<Mutex<()>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<SubscriptionSnapshot> {
        self.inner.load_full()
    }

    /// Wait until no other load cycle is running against this store.
    pub async fn lock_cycle(&self) -> MutexGuard<'_, ()> {
        self.cycle_lock.lock().await
    }

    /// Publish decoded collections on top of the current snapshot.
    ///
    /// Slots not present in `collections` keep their previous value.
    /// Returns the snapshot this call swapped in, even if another writer
    /// has published since.
    pub fn publish(&self, collections: &[Collection]) -> Arc<SubscriptionSnapshot> {
        if collections.is_empty() {
            return self.load();
        }

        let mut published = None;
        self.inner.rcu(|current| {
            let mut next = SubscriptionSnapshot::clone(current);
            for collection in collections {
                next.set(collection.clone());
            }
            let next = Arc::new(next);
            published = Some(Arc::clone(&next));
            next
        });

        published.unwrap_or_else(|| self.load())
    }
}
