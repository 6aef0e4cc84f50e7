//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable) and the
//! common handle type [`TaskRef`], an `Arc<dyn Task>` suitable for sharing
//! across the orchestrator.
//!
//! A task receives a [`CancellationToken`] and should periodically check it
//! so that a timeout verdict actually stops the underlying work instead of
//! leaving it running in the background.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit of work.
///
/// A `Task` has a stable [`name`](Task::name) (unique within its phase) and
/// an async [`run`](Task::run) method that receives a [`CancellationToken`].
/// The token is cancelled when the task's timer wins the race; cooperative
/// implementations check it and exit promptly.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use phasor::{Task, TaskError};
///
/// struct CloseDb;
///
/// #[async_trait]
/// impl Task for CloseDb {
///     fn name(&self) -> &str { "close-db" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         // close the pool...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task until completion or cancellation.
    ///
    /// Implementations should check `ctx.is_cancelled()` and exit quickly
    /// once cancelled.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}
