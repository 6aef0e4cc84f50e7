//! # Timeout-bounded execution of a single task.
//!
//! Executes one task's action racing against its timer, publishes lifecycle
//! events to the [`Bus`], and logs every outcome.
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   task.run() → Ok(()) → publish TaskStopped
//!
//! Graceful cancellation:
//!   task.run() → Err(Canceled) → publish TaskStopped
//!
//! Failure:
//!   task.run() → Err(Fail) → publish TaskFailed
//!
//! Timeout:
//!   timer wins → cancel child token → publish TimeoutHit
//!                                   → publish TaskFailed (timeout)
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event: `TaskStopped` or
//!   `TaskFailed`.
//! - `Canceled` is treated as graceful exit → `TaskStopped`.
//! - `TimeoutHit` is published **in addition to** `TaskFailed` on timeout.
//! - Derives a **child token** per attempt; timeout cancels the child so a
//!   cooperative action actually stops instead of leaking. Child
//!   cancellation does not affect the parent.

use std::sync::Arc;
use std::time::Instant;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::phase::{TaskResult, TaskStatus};
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::TaskSpec;

/// Executes `spec`'s task once, bounded by its timeout.
///
/// The outcome is decided by whichever side of the race settles first:
/// the action (→ `Success`/`Failed`) or the timer (→ `TimedOut` with a
/// synthesized [`TaskError::Timeout`] naming the task and its bound).
pub(crate) async fn run_once(
    spec: &TaskSpec,
    parent: &CancellationToken,
    bus: &Bus,
) -> TaskResult {
    let task = spec.task();
    let name: Arc<str> = Arc::from(task.name());
    let timeout = spec.timeout();

    bus.publish(
        Event::new(EventKind::TaskStarting)
            .with_task(name.clone())
            .with_timeout(timeout),
    );
    tracing::debug!(task = %name, timeout_ms = timeout.as_millis() as u64, "task starting");

    let started = Instant::now();
    let child = parent.child_token();

    let res = match time::timeout(timeout, task.run(child.clone())).await {
        Ok(r) => r,
        Err(_elapsed) => {
            child.cancel();
            bus.publish(
                Event::new(EventKind::TimeoutHit)
                    .with_task(name.clone())
                    .with_timeout(timeout),
            );
            Err(TaskError::Timeout {
                task: name.to_string(),
                timeout,
            })
        }
    };

    let duration = started.elapsed();
    match res {
        Ok(()) | Err(TaskError::Canceled) => {
            bus.publish(
                Event::new(EventKind::TaskStopped)
                    .with_task(name.clone())
                    .with_duration(duration),
            );
            tracing::info!(
                task = %name,
                duration_ms = duration.as_millis() as u64,
                "task completed"
            );
            TaskResult {
                name,
                status: TaskStatus::Success,
                error: None,
                duration,
            }
        }
        Err(err @ TaskError::Timeout { .. }) => {
            bus.publish(
                Event::new(EventKind::TaskFailed)
                    .with_task(name.clone())
                    .with_error(err.to_string())
                    .with_duration(duration),
            );
            tracing::warn!(
                task = %name,
                timeout_ms = timeout.as_millis() as u64,
                "task timed out"
            );
            TaskResult {
                name,
                status: TaskStatus::TimedOut,
                error: Some(err),
                duration,
            }
        }
        Err(err) => {
            bus.publish(
                Event::new(EventKind::TaskFailed)
                    .with_task(name.clone())
                    .with_error(err.to_string())
                    .with_duration(duration),
            );
            tracing::error!(
                task = %name,
                error = %err,
                duration_ms = duration.as_millis() as u64,
                "task failed"
            );
            TaskResult {
                name,
                status: TaskStatus::Failed,
                error: Some(err),
                duration,
            }
        }
    }
}
