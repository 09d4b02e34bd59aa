//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal events
//! - Trigger shutdown from a dedicated task, so a load cycle the agent loop
//!   is awaiting is cancelled immediately
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers a config reload and a fresh load cycle, not shutdown

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// What the agent should do in response to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    Shutdown,
    Reload,
}

/// A stream of signal events.
pub trait SignalSource: Send + 'static {
    fn next(&mut self) -> impl Future<Output = SignalEvent> + Send;
}

/// Signal listeners installed for the lifetime of the agent.
#[cfg(unix)]
pub struct Signals {
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }
}

#[cfg(unix)]
impl SignalSource for Signals {
    async fn next(&mut self) -> SignalEvent {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => SignalEvent::Shutdown,
            _ = self.terminate.recv() => SignalEvent::Shutdown,
            _ = self.hangup.recv() => SignalEvent::Reload,
        }
    }
}

#[cfg(not(unix))]
pub struct Signals;

#[cfg(not(unix))]
impl Signals {
    pub fn install() -> std::io::Result<Self> {
        Ok(Self)
    }
}

#[cfg(not(unix))]
impl SignalSource for Signals {
    async fn next(&mut self) -> SignalEvent {
        let _ = tokio::signal::ctrl_c().await;
        SignalEvent::Shutdown
    }
}

/// Route signals from `source` on a background task.
///
/// A shutdown signal triggers `shutdown` directly, which cancels every
/// token derived from it, including the running load cycle. Reload
/// requests are forwarded on the returned channel. The task ends once
/// shutdown is triggered from any side.
pub fn spawn_signal_router<S: SignalSource>(
    mut source: S,
    shutdown: Shutdown,
) -> (JoinHandle<()>, mpsc::UnboundedReceiver<()>) {
    let (reload_tx, reload_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = shutdown.wait() => return,
                event = source.next() => event,
            };

            match event {
                SignalEvent::Shutdown => {
                    tracing::info!("Shutdown signal received, cancelling in-flight work");
                    shutdown.trigger();
                    return;
                }
                SignalEvent::Reload => {
                    tracing::info!("SIGHUP received, reloading configuration");
                    if reload_tx.send(()).is_err() {
                        tracing::debug!("Reload receiver dropped");
                    }
                }
            }
        }
    });

    (handle, reload_rx)
}
