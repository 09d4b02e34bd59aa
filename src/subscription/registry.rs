//! Endpoint registry.
//!
//! The fixed table of control-plane datasets fetched on every load cycle.
//! The set is closed: adding a dataset means adding a `CollectionKind`
//! variant, a snapshot slot and a registry entry together.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Path prefix of the control plane's internal data API.
pub const INTERNAL_DATA_PREFIX: &str = "/internal/data/v1/";

/// The shape a payload decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionKind {
    Subscriptions,
    Applications,
    ApplicationKeyMappings,
    Apis,
    ApplicationPolicies,
    SubscriptionPolicies,
}

impl CollectionKind {
    /// Every kind, in registry order.
    pub const ALL: [CollectionKind; 6] = [
        CollectionKind::Subscriptions,
        CollectionKind::Applications,
        CollectionKind::ApplicationKeyMappings,
        CollectionKind::Apis,
        CollectionKind::ApplicationPolicies,
        CollectionKind::SubscriptionPolicies,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Subscriptions => "subscriptions",
            CollectionKind::Applications => "applications",
            CollectionKind::ApplicationKeyMappings => "application-key-mappings",
            CollectionKind::Apis => "apis",
            CollectionKind::ApplicationPolicies => "application-policies",
            CollectionKind::SubscriptionPolicies => "subscription-policies",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown collection name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collection '{0}'")]
pub struct UnknownCollection(pub String);

impl FromStr for CollectionKind {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownCollection(s.to_string()))
    }
}

/// Static descriptor binding a dataset to its REST path and payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointSpec {
    /// Logical dataset name used in logs and metrics.
    pub name: &'static str,
    /// Path suffix below [`INTERNAL_DATA_PREFIX`].
    pub path: &'static str,
    /// Collection the payload decodes into.
    pub shape: CollectionKind,
}

impl EndpointSpec {
    const fn new(shape: CollectionKind, path: &'static str) -> Self {
        Self {
            name: path,
            path,
            shape,
        }
    }

    /// Full request URL below the given control-plane base URL.
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}{}{}",
            base_url.trim_end_matches('/'),
            INTERNAL_DATA_PREFIX,
            self.path
        )
    }
}

static ENDPOINTS: [EndpointSpec; 6] = [
    EndpointSpec::new(CollectionKind::Subscriptions, "subscriptions"),
    EndpointSpec::new(CollectionKind::Applications, "applications"),
    EndpointSpec::new(CollectionKind::ApplicationKeyMappings, "application-key-mappings"),
    EndpointSpec::new(CollectionKind::Apis, "apis"),
    EndpointSpec::new(CollectionKind::ApplicationPolicies, "application-policies"),
    EndpointSpec::new(CollectionKind::SubscriptionPolicies, "subscription-policies"),
];

/// The ordered list of endpoints fetched on every load cycle.
pub fn endpoints() -> &'static [EndpointSpec] {
    &ENDPOINTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_each_kind_has_exactly_one_endpoint() {
        let shapes: HashSet<_> = endpoints().iter().map(|e| e.shape).collect();
        assert_eq!(endpoints().len(), CollectionKind::ALL.len());
        assert_eq!(shapes.len(), CollectionKind::ALL.len());
    }

    #[test]
    fn test_paths_match_kind_names() {
        for endpoint in endpoints() {
            assert_eq!(endpoint.path, endpoint.shape.as_str());
        }
    }

    #[test]
    fn test_url_joins_prefix() {
        let apis = endpoints()[3];
        assert_eq!(
            apis.url("https://cp.example/"),
            "https://cp.example/internal/data/v1/apis"
        );
        assert_eq!(
            apis.url("https://cp.example"),
            "https://cp.example/internal/data/v1/apis"
        );
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(
            "application-key-mappings".parse::<CollectionKind>(),
            Ok(CollectionKind::ApplicationKeyMappings)
        );
        assert!("keys".parse::<CollectionKind>().is_err());
    }
}
