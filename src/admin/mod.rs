//! Admin and readiness API.
//!
//! # Routes
//! - `GET /health/live`: process is up
//! - `GET /health/ready`: all six collections loaded (503 until then)
//! - `GET /admin/snapshot`: item counts per collection (Bearer)
//! - `GET /admin/collections/{kind}`: one collection as JSON (Bearer)

pub mod auth;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::{get_collection, get_live, get_ready, get_snapshot};
use crate::subscription::snapshot::SnapshotStore;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub store: SnapshotStore,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(store: SnapshotStore, api_key: &str) -> Self {
        Self {
            store,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    let protected = Router::new()
        .route("/admin/snapshot", get(get_snapshot))
        .route("/admin/collections/{kind}", get(get_collection))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .route("/health/live", get(get_live))
        .route("/health/ready", get(get_ready))
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the admin API until `shutdown` is cancelled.
pub async fn serve(
    addr: SocketAddr,
    state: AdminState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
