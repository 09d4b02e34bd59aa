//! Admin and readiness API tests.

use std::net::SocketAddr;
use std::sync::Arc;

use gateway_adapter::admin::{setup_admin_router, AdminState};
use gateway_adapter::subscription::types::{EntityList, Subscription};
use gateway_adapter::subscription::{Collection, CollectionKind, SnapshotStore};
use serde_json::Value;
use tokio::net::TcpListener;

const API_KEY: &str = "test-admin-key";

async fn start_admin(store: SnapshotStore) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = setup_admin_router(AdminState::new(store, API_KEY));
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

fn populate_all(store: &SnapshotStore) {
    let collections: Vec<Collection> = CollectionKind::ALL
        .into_iter()
        .map(|kind| Collection::decode(kind, br#"{"list":[]}"#).unwrap())
        .collect();
    store.publish(&collections);
}

#[tokio::test]
async fn test_live() {
    let addr = start_admin(SnapshotStore::new()).await;
    let res = reqwest::get(format!("http://{}/health/live", addr)).await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_reports_missing_collections() {
    let store = SnapshotStore::new();
    store.publish(&[Collection::Subscriptions(Arc::new(EntityList::new(vec![
        Subscription::default(),
    ])))]);
    let addr = start_admin(store).await;

    let res = reqwest::get(format!("http://{}/health/ready", addr)).await.unwrap();
    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["ready"], false);
    assert_eq!(body["populated"], 1);
    assert_eq!(body["total"], 6);
    assert_eq!(body["missing"].as_array().unwrap().len(), 5);
    assert_eq!(body["missing"][0], "applications");
}

#[tokio::test]
async fn test_ready_when_all_populated() {
    let store = SnapshotStore::new();
    populate_all(&store);
    let addr = start_admin(store).await;

    let res = reqwest::get(format!("http://{}/health/ready", addr)).await.unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_collections_require_api_key() {
    let addr = start_admin(SnapshotStore::new()).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("http://{}/admin/snapshot", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(format!("http://{}/admin/snapshot", addr))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn test_collection_dump() {
    let store = SnapshotStore::new();
    store.publish(&[Collection::Subscriptions(Arc::new(EntityList::new(vec![
        Subscription {
            subscription_id: 1,
            policy_id: "Gold".to_string(),
            ..Default::default()
        },
    ])))]);
    let addr = start_admin(store).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("http://{}/admin/collections/subscriptions", addr))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["list"][0]["subscriptionId"], 1);
    assert_eq!(body["list"][0]["policyId"], "Gold");

    let res = client
        .get(format!("http://{}/admin/collections/apis", addr))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let res = client
        .get(format!("http://{}/admin/collections/unknown", addr))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_snapshot_summary() {
    let store = SnapshotStore::new();
    populate_all(&store);
    let addr = start_admin(store).await;

    let res = reqwest::Client::new()
        .get(format!("http://{}/admin/snapshot", addr))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let slots = body.as_array().unwrap();
    assert_eq!(slots.len(), 6);
    assert_eq!(slots[3]["collection"], "apis");
    assert_eq!(slots[3]["populated"], true);
    assert_eq!(slots[3]["items"], 0);
}
