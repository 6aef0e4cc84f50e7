//! # LogWriter — built-in event logger
//!
//! A subscriber that renders every lifecycle event through `tracing`,
//! giving hosts structured startup/shutdown diagnostics for free.
//!
//! ## Example output
//! ```text
//! INFO phase started phase="connect"
//! INFO task completed task="db-connect" duration_ms=48
//! WARN task timed out task="close-cache" timeout_ms=100
//! ERROR task failed task="close-cache" error="connection reset"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event logging subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::GlobalStart => {
                tracing::info!(seq = e.seq, "lifecycle run started");
            }
            EventKind::GlobalComplete => {
                tracing::info!(seq = e.seq, "lifecycle run complete");
            }
            EventKind::GlobalError => {
                tracing::error!(
                    phase = e.phase,
                    task = e.task.as_deref(),
                    error = e.error.as_deref(),
                    "lifecycle run aborted"
                );
            }
            EventKind::PhaseStart => {
                tracing::info!(phase = e.phase, "phase started");
            }
            EventKind::PhaseComplete => {
                tracing::info!(phase = e.phase, failures = e.failures, "phase complete");
            }
            EventKind::TaskStarting => {
                tracing::debug!(
                    task = e.task.as_deref(),
                    timeout_ms = e.timeout_ms,
                    "task starting"
                );
            }
            EventKind::TaskStopped => {
                tracing::info!(
                    task = e.task.as_deref(),
                    duration_ms = e.duration_ms,
                    "task completed"
                );
            }
            EventKind::TaskFailed => {
                tracing::error!(
                    task = e.task.as_deref(),
                    error = e.error.as_deref(),
                    duration_ms = e.duration_ms,
                    "task failed"
                );
            }
            EventKind::TimeoutHit => {
                tracing::warn!(
                    task = e.task.as_deref(),
                    timeout_ms = e.timeout_ms,
                    "task timed out"
                );
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(
                    subscriber = e.task.as_deref(),
                    reason = e.error.as_deref(),
                    "subscriber overflow"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
