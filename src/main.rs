//! Gateway adapter (v1)
//!
//! Bootstraps the gateway's view of the control plane.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                   GATEWAY ADAPTER                     │
//!                 │                                                       │
//!   config file ──┼─▶ config ──▶ load cycle ──────────────────────┐       │
//!   SIGHUP      ──┼─▶ (reload)      │                             │       │
//!                 │                 ▼                             ▼       │
//!                 │        ┌─────────────────┐          ┌───────────────┐ │
//!                 │        │ fetcher (x6)    │──mpsc───▶│  aggregator   │ │
//!                 │        │ auth + retries  │          │ join barrier  │ │
//!                 │        └────────┬────────┘          └───────┬───────┘ │
//!                 │                 │                           │         │
//!                 │                 ▼                           ▼         │
//!   Control   ◀───┼──── GET /internal/data/v1/*          ┌─────────────┐ │
//!   Plane         │                                      │  snapshot   │ │
//!                 │                                      │  (ArcSwap)  │ │
//!                 │                                      └──────┬──────┘ │
//!                 │                                             │        │
//!   Admin     ◀───┼──── /health/ready, /admin/* ◀───────────────┘        │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use gateway_adapter::admin::{self, AdminState};
use gateway_adapter::config::{load_config, watcher::ConfigWatcher, AdapterConfig};
use gateway_adapter::lifecycle::{spawn_signal_router, Shutdown, Signals};
use gateway_adapter::observability::{logging, metrics};
use gateway_adapter::subscription::{LoadError, SnapshotStore, SubscriptionLoader};

#[derive(Parser)]
#[command(name = "gateway-adapter")]
#[command(about = "Loads control-plane subscription data for the gateway", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "adapter.toml")]
    config: PathBuf,

    /// Run a single load cycle and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut config = load_config(&args.config)?;

    logging::init_logging(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        "gateway-adapter starting"
    );
    tracing::info!(
        service_url = %config.control_plane.service_url,
        skip_tls_verification = config.control_plane.skip_tls_verification,
        request_timeout_secs = config.timeouts.request_secs,
        cycle_timeout_secs = config.timeouts.cycle_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let store = SnapshotStore::new();
    let loader = Arc::new(SubscriptionLoader::new(store.clone()));

    if config.admin.enabled && !args.once {
        let addr: SocketAddr = config.admin.bind_address.parse()?;
        let state = AdminState::new(store.clone(), &config.admin.api_key);
        let token = shutdown.token();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(addr, state, token).await {
                tracing::error!(error = %e, "Admin API stopped");
            }
        });
    }

    let (signal_task, mut reloads) = spawn_signal_router(Signals::install()?, shutdown.clone());

    run_cycle(&loader, &config, &shutdown).await;
    if args.once || shutdown.is_triggered() {
        signal_task.abort();
        tracing::info!("Shutdown complete");
        return Ok(());
    }

    let (watcher, mut config_updates) = ConfigWatcher::new(&args.config);
    let _watcher = match watcher.run() {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "Config watcher unavailable, reload only via SIGHUP");
            None
        }
    };

    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            Some(new_config) = config_updates.recv() => {
                config = new_config;
                run_cycle(&loader, &config, &shutdown).await;
            }
            Some(()) = reloads.recv() => {
                match load_config(&args.config) {
                    Ok(new_config) => config = new_config,
                    Err(e) => tracing::error!(
                        error = %e,
                        "Failed to reload config, keeping current configuration"
                    ),
                }
                run_cycle(&loader, &config, &shutdown).await;
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run_cycle(loader: &SubscriptionLoader, config: &AdapterConfig, shutdown: &Shutdown) {
    match loader.load(config, &shutdown.token()).await {
        Ok(report) if report.is_complete() => {
            tracing::info!(populated = report.populated, "Control-plane data fully loaded");
        }
        Ok(report) => {
            for failure in &report.failures {
                tracing::warn!(
                    endpoint = failure.endpoint,
                    stage = ?failure.stage,
                    error = %failure.error,
                    "Collection not refreshed this cycle"
                );
            }
        }
        Err(LoadError::Unauthorized { endpoint, status }) => {
            tracing::error!(
                endpoint,
                status,
                username = %config.control_plane.username,
                "Control plane rejected the configured credentials; update them to retry"
            );
        }
        Err(LoadError::Cancelled) => tracing::info!("Load cycle cancelled by shutdown"),
        Err(e) => tracing::error!(error = %e, "Load cycle failed"),
    }
}
