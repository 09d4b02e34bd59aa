//! Control-plane data types.
//!
//! Wire format of the internal data API. Every collection arrives as
//! `{"list": [...]}`; items may carry an `event` record when the payload is
//! an incremental notification instead of a full snapshot.
//!
//! Fields the control plane leaves out or sends as `null` decode to their
//! zero value. A missing `list` key or a wrongly typed field is a decode
//! error.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` as the field's zero value, the way the control plane's
/// own clients read these payloads.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Notification metadata attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "EventWire")]
pub struct Event {
    pub event_id: String,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub tenant_id: i32,
    pub tenant_domain: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventWire {
    event_id: Option<String>,
    timestamp: Option<i64>,
    time_stamp: Option<i64>,
    #[serde(rename = "type")]
    event_type: Option<String>,
    tenant_id: Option<i32>,
    tenant_domain: Option<String>,
}

impl From<EventWire> for Event {
    fn from(wire: EventWire) -> Self {
        Self {
            event_id: wire.event_id.unwrap_or_default(),
            timestamp: wire.timestamp.or(wire.time_stamp).unwrap_or_default(),
            event_type: wire.event_type.unwrap_or_default(),
            tenant_id: wire.tenant_id.unwrap_or_default(),
            tenant_domain: wire.tenant_domain.unwrap_or_default(),
        }
    }
}

/// Named list container shared by all six collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityList<T> {
    pub list: Vec<T>,
}

impl<T> EntityList<T> {
    pub fn new(list: Vec<T>) -> Self {
        Self { list }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.list.iter()
    }
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        Self { list: Vec::new() }
    }
}

// Items whose fields have a legacy key decode through a wire struct: the
// primary key wins when both are present, and either may be null.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SubscriptionWire")]
pub struct Subscription {
    pub subscription_id: i64,
    pub policy_id: String,
    pub api_id: i64,
    pub app_id: i64,
    pub subscription_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionWire {
    subscription_id: Option<i64>,
    policy_id: Option<String>,
    api_id: Option<i64>,
    app_id: Option<i64>,
    application_id: Option<i64>,
    subscription_state: Option<String>,
    event: Option<Event>,
}

impl From<SubscriptionWire> for Subscription {
    fn from(wire: SubscriptionWire) -> Self {
        Self {
            subscription_id: wire.subscription_id.unwrap_or_default(),
            policy_id: wire.policy_id.unwrap_or_default(),
            api_id: wire.api_id.unwrap_or_default(),
            app_id: wire.app_id.or(wire.application_id).unwrap_or_default(),
            subscription_state: wire.subscription_state.unwrap_or_default(),
            event: wire.event,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ApplicationWire")]
pub struct Application {
    pub uuid: String,
    pub id: i64,
    pub name: String,
    pub sub_name: String,
    pub policy: String,
    pub token_type: String,
    pub group_ids: Vec<String>,
    pub attributes: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationWire {
    uuid: Option<String>,
    id: Option<i64>,
    application_id: Option<i64>,
    name: Option<String>,
    application_name: Option<String>,
    sub_name: Option<String>,
    subscriber: Option<String>,
    policy: Option<String>,
    application_policy: Option<String>,
    token_type: Option<String>,
    group_ids: Option<Vec<Option<String>>>,
    attributes: Option<HashMap<String, Option<String>>>,
    event: Option<Event>,
}

impl From<ApplicationWire> for Application {
    fn from(wire: ApplicationWire) -> Self {
        Self {
            uuid: wire.uuid.unwrap_or_default(),
            id: wire.id.or(wire.application_id).unwrap_or_default(),
            name: wire.name.or(wire.application_name).unwrap_or_default(),
            sub_name: wire.sub_name.or(wire.subscriber).unwrap_or_default(),
            policy: wire.policy.or(wire.application_policy).unwrap_or_default(),
            token_type: wire.token_type.unwrap_or_default(),
            group_ids: wire
                .group_ids
                .unwrap_or_default()
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect(),
            attributes: wire
                .attributes
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, v.unwrap_or_default()))
                .collect(),
            event: wire.event,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationKeyMapping {
    #[serde(deserialize_with = "null_as_default")]
    pub application_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub consumer_key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub key_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub key_manager: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Api {
    #[serde(deserialize_with = "null_as_default")]
    pub api_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub provider: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub context: String,
    #[serde(deserialize_with = "null_as_default")]
    pub policy: String,
    #[serde(deserialize_with = "null_as_default")]
    pub api_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_default_version: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationPolicy {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub tenant_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub quota_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SubscriptionPolicyWire")]
pub struct SubscriptionPolicy {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub quota_type: String,
    #[serde(rename = "graphQLMaxComplexity")]
    pub graphql_max_complexity: i64,
    #[serde(rename = "graphQLMaxDepth")]
    pub graphql_max_depth: i64,
    pub rate_limit_count: i64,
    pub rate_limit_time_unit: String,
    pub stop_on_quota_reach: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionPolicyWire {
    id: Option<i64>,
    policy_id: Option<i64>,
    tenant_id: Option<i64>,
    name: Option<String>,
    quota_type: Option<String>,
    #[serde(rename = "graphQLMaxComplexity")]
    graphql_max_complexity: Option<i64>,
    #[serde(rename = "graphQLMaxDepth")]
    graphql_max_depth: Option<i64>,
    rate_limit_count: Option<i64>,
    rate_limit_time_unit: Option<String>,
    stop_on_quota_reach: Option<bool>,
    event: Option<Event>,
}

impl From<SubscriptionPolicyWire> for SubscriptionPolicy {
    fn from(wire: SubscriptionPolicyWire) -> Self {
        Self {
            id: wire.id.or(wire.policy_id).unwrap_or_default(),
            tenant_id: wire.tenant_id.unwrap_or_default(),
            name: wire.name.unwrap_or_default(),
            quota_type: wire.quota_type.unwrap_or_default(),
            graphql_max_complexity: wire.graphql_max_complexity.unwrap_or_default(),
            graphql_max_depth: wire.graphql_max_depth.unwrap_or_default(),
            rate_limit_count: wire.rate_limit_count.unwrap_or_default(),
            rate_limit_time_unit: wire.rate_limit_time_unit.unwrap_or_default(),
            stop_on_quota_reach: wire.stop_on_quota_reach.unwrap_or_default(),
            event: wire.event,
        }
    }
}

pub type SubscriptionList = EntityList<Subscription>;
pub type ApplicationList = EntityList<Application>;
pub type ApplicationKeyMappingList = EntityList<ApplicationKeyMapping>;
pub type ApiList = EntityList<Api>;
pub type ApplicationPolicyList = EntityList<ApplicationPolicy>;
pub type SubscriptionPolicyList = EntityList<SubscriptionPolicy>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_list() {
        let list: SubscriptionList = serde_json::from_str(
            r#"{"list":[{"subscriptionId":1,"policyId":"Gold","apiId":10,"appId":5,"subscriptionState":"ACTIVE"}]}"#,
        )
        .unwrap();

        assert_eq!(list.len(), 1);
        let sub = &list.list[0];
        assert_eq!(sub.subscription_id, 1);
        assert_eq!(sub.policy_id, "Gold");
        assert_eq!(sub.api_id, 10);
        assert_eq!(sub.app_id, 5);
        assert_eq!(sub.subscription_state, "ACTIVE");
        assert!(sub.event.is_none());
    }

    #[test]
    fn test_application_aliases_and_attributes() {
        let list: ApplicationList = serde_json::from_str(
            r#"{"list":[{
                "uuid":"3f1c",
                "applicationId":7,
                "applicationName":"DefaultApplication",
                "subscriber":"admin",
                "applicationPolicy":"Unlimited",
                "tokenType":"JWT",
                "groupIds":["g1"],
                "attributes":{"tier":"gold"}
            }]}"#,
        )
        .unwrap();

        let app = &list.list[0];
        assert_eq!(app.id, 7);
        assert_eq!(app.name, "DefaultApplication");
        assert_eq!(app.sub_name, "admin");
        assert_eq!(app.policy, "Unlimited");
        assert_eq!(app.group_ids, vec!["g1".to_string()]);
        assert_eq!(app.attributes.get("tier").map(String::as_str), Some("gold"));
    }

    #[test]
    fn test_embedded_event() {
        let list: ApiList = serde_json::from_str(
            r#"{"list":[{
                "apiId":3,"name":"PizzaShack","version":"1.0.0","context":"/pizzashack/1.0.0",
                "event":{"eventId":"e-1","timeStamp":1610000000,"type":"API_CREATE","tenantId":-1234,"tenantDomain":"carbon.super"}
            }]}"#,
        )
        .unwrap();

        let event = list.list[0].event.as_ref().unwrap();
        assert_eq!(event.event_id, "e-1");
        assert_eq!(event.timestamp, 1_610_000_000);
        assert_eq!(event.event_type, "API_CREATE");
        assert_eq!(event.tenant_id, -1234);
    }

    #[test]
    fn test_subscription_policy_graphql_fields() {
        let list: SubscriptionPolicyList = serde_json::from_str(
            r#"{"list":[{"policyId":2,"name":"Gold","graphQLMaxComplexity":50,"graphQLMaxDepth":7,"stopOnQuotaReach":true}]}"#,
        )
        .unwrap();

        let policy = &list.list[0];
        assert_eq!(policy.id, 2);
        assert_eq!(policy.graphql_max_complexity, 50);
        assert_eq!(policy.graphql_max_depth, 7);
        assert!(policy.stop_on_quota_reach);
    }

    #[test]
    fn test_missing_list_is_error() {
        assert!(serde_json::from_str::<ApiList>(r#"{"items":[]}"#).is_err());
        assert!(serde_json::from_str::<ApiList>(r#"{"list":{}}"#).is_err());
    }

    #[test]
    fn test_wrong_field_type_is_error() {
        assert!(serde_json::from_str::<SubscriptionList>(r#"{"list":[{"subscriptionId":"one"}]}"#).is_err());
    }

    #[test]
    fn test_null_fields_decode_to_zero_values() {
        let subs: SubscriptionList = serde_json::from_str(
            r#"{"list":[{"subscriptionId":1,"policyId":null,"apiId":null,"subscriptionState":"ACTIVE","event":null}]}"#,
        )
        .unwrap();
        assert_eq!(subs.list[0].policy_id, "");
        assert_eq!(subs.list[0].api_id, 0);
        assert!(subs.list[0].event.is_none());

        let apps: ApplicationList = serde_json::from_str(
            r#"{"list":[{"uuid":"a1","id":4,"name":null,"groupIds":null,"attributes":null}]}"#,
        )
        .unwrap();
        assert_eq!(apps.list[0].id, 4);
        assert!(apps.list[0].name.is_empty());
        assert!(apps.list[0].group_ids.is_empty());
        assert!(apps.list[0].attributes.is_empty());

        let apis: ApiList = serde_json::from_str(
            r#"{"list":[{"apiId":3,"context":null,"isDefaultVersion":null,"event":{"eventId":null,"tenantId":null}}]}"#,
        )
        .unwrap();
        assert_eq!(apis.list[0].context, "");
        assert!(!apis.list[0].is_default_version);
        assert_eq!(apis.list[0].event.as_ref().unwrap().tenant_id, 0);

        let mappings: ApplicationKeyMappingList =
            serde_json::from_str(r#"{"list":[{"applicationId":null,"consumerKey":"ck"}]}"#).unwrap();
        assert_eq!(mappings.list[0].application_id, 0);

        let policies: ApplicationPolicyList =
            serde_json::from_str(r#"{"list":[{"id":1,"quotaType":null}]}"#).unwrap();
        assert_eq!(policies.list[0].quota_type, "");
    }

    #[test]
    fn test_primary_key_wins_over_legacy_key() {
        let policies: SubscriptionPolicyList =
            serde_json::from_str(r#"{"list":[{"id":1,"policyId":9,"name":"Gold"}]}"#).unwrap();
        assert_eq!(policies.list[0].id, 1);

        let subs: SubscriptionList =
            serde_json::from_str(r#"{"list":[{"appId":5,"applicationId":6}]}"#).unwrap();
        assert_eq!(subs.list[0].app_id, 5);

        let apps: ApplicationList = serde_json::from_str(
            r#"{"list":[{"id":2,"applicationId":3,"name":"App","applicationName":"Legacy","subscriber":"admin"}]}"#,
        )
        .unwrap();
        assert_eq!(apps.list[0].id, 2);
        assert_eq!(apps.list[0].name, "App");
        assert_eq!(apps.list[0].sub_name, "admin");
    }

    #[test]
    fn test_event_accepts_both_timestamp_spellings() {
        let apis: ApiList = serde_json::from_str(
            r#"{"list":[{"apiId":1,"event":{"timestamp":10,"timeStamp":20}}]}"#,
        )
        .unwrap();
        assert_eq!(apis.list[0].event.as_ref().unwrap().timestamp, 10);
    }

    #[test]
    fn test_null_primary_falls_back_to_legacy_key() {
        let subs: SubscriptionList =
            serde_json::from_str(r#"{"list":[{"appId":null,"applicationId":6}]}"#).unwrap();
        assert_eq!(subs.list[0].app_id, 6);
    }

    #[test]
    fn test_null_items_inside_collections() {
        let apps: ApplicationList = serde_json::from_str(
            r#"{"list":[{"groupIds":["g1",null],"attributes":{"tier":null}}]}"#,
        )
        .unwrap();
        assert_eq!(apps.list[0].group_ids, vec!["g1".to_string(), String::new()]);
        assert_eq!(apps.list[0].attributes.get("tier").map(String::as_str), Some(""));
    }
}
