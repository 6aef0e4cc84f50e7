//! # Registered task entry.
//!
//! [`TaskSpec`] bundles a task with its resolved per-attempt timeout. The
//! timeout is fixed at registration time (explicit value or the
//! orchestrator config default) so the executor never consults config
//! again.

use std::time::Duration;

use crate::tasks::task::TaskRef;

/// A task plus the timeout bound it races against.
///
/// Created by `add_task` before `run()`; consumed (invoked once) during the
/// run; not persisted afterward.
#[derive(Clone)]
pub struct TaskSpec {
    task: TaskRef,
    timeout: Duration,
}

impl TaskSpec {
    /// Creates a new spec with an already-resolved timeout.
    ///
    /// `timeout` must be positive; registration resolves zero/absent values
    /// to the config default before constructing the spec.
    pub fn new(task: TaskRef, timeout: Duration) -> Self {
        Self { task, timeout }
    }

    /// Returns a reference to the task.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Convenience: returns the task name.
    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Returns the per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
