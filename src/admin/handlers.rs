use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::subscription::registry::CollectionKind;
use crate::subscription::snapshot::SlotSummary;

#[derive(Serialize)]
pub struct LiveStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    pub ready: bool,
    pub populated: usize,
    pub total: usize,
    pub missing: Vec<CollectionKind>,
}

pub async fn get_live() -> Json<LiveStatus> {
    Json(LiveStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
    })
}

/// 200 once every collection has been loaded at least once, 503 before.
pub async fn get_ready(State(state): State<AdminState>) -> (StatusCode, Json<Readiness>) {
    let snapshot = state.store.load();
    let missing = snapshot.missing();
    let readiness = Readiness {
        ready: missing.is_empty(),
        populated: snapshot.populated(),
        total: CollectionKind::ALL.len(),
        missing,
    };

    let status = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(readiness))
}

pub async fn get_snapshot(State(state): State<AdminState>) -> Json<Vec<SlotSummary>> {
    Json(state.store.load().summary())
}

pub async fn get_collection(
    State(state): State<AdminState>,
    Path(kind): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let kind: CollectionKind = kind.parse().map_err(|_| StatusCode::NOT_FOUND)?;
    let collection = state.store.load().get(kind).ok_or(StatusCode::NOT_FOUND)?;

    collection.to_json().map(Json).map_err(|e| {
        tracing::error!(collection = %kind, error = %e, "Failed to serialize collection");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
