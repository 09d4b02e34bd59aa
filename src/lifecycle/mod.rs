//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging/metrics → Start admin API → Initial load cycle
//!
//! Shutdown (shutdown.rs):
//!     Signal task triggers shutdown → in-flight load cycle cancelled
//!     → Stop admin API → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Reload config and run a new load cycle
//! ```
//!
//! # Design Decisions
//! - Cancellation tokens form a tree: shutdown → load cycle → fetch tasks
//! - A failed initial load is not fatal; the gateway starts with whatever
//!   collections arrived and the readiness endpoint reports the gap

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{spawn_signal_router, SignalEvent, SignalSource, Signals};
