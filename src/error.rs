//! Error types used by the orchestrators and tasks.
//!
//! Three enums cover the taxonomy:
//!
//! - [`TaskError`] — errors raised by individual task executions.
//! - [`RegistryError`] — synchronous programmer errors at registration time.
//! - [`RunError`] — errors surfaced by a startup run (fail-fast abort).
//!
//! All types provide `as_label` for stable snake_case identifiers in
//! logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by task execution.
///
/// A task either settles with an error of its own ([`TaskError::Fail`]),
/// loses the race against its timer ([`TaskError::Timeout`], synthesized by
/// the executor), or exits because its cancellation token fired
/// ([`TaskError::Canceled`], treated as a graceful stop).
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// Task did not settle within its configured window.
    #[error("task {task:?} timed out after {timeout:?}")]
    Timeout {
        /// Name of the task that exceeded its bound.
        task: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Task completed with an error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task exited after observing its cancellation token.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`] from any displayable error.
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// True for [`TaskError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::Timeout { .. })
    }
}

/// # Errors produced by task registration.
///
/// Both variants are programmer errors raised synchronously by
/// `add_task`/`remove_task`; neither can occur once a run is underway
/// (registration is rejected wholesale at that point).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The phase is not a member of the fixed phase sequence.
    #[error("unknown phase {phase:?}: not part of the fixed sequence")]
    UnknownPhase {
        /// Name of the offending phase descriptor.
        phase: &'static str,
    },

    /// Registration or removal was attempted after `run()` began.
    #[error("cannot modify tasks for phase {phase:?}: orchestrator already ran")]
    RegistrationAfterRun {
        /// Phase the caller tried to mutate.
        phase: &'static str,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::UnknownPhase { .. } => "unknown_phase",
            RegistryError::RegistrationAfterRun { .. } => "registration_after_run",
        }
    }
}

/// # Errors surfaced by a startup run.
///
/// Startup is fail-fast: the first non-success outcome aborts the run and
/// is returned to the caller wrapped with phase/task context. Shutdown has
/// no run-level error (it always proceeds to termination).
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum RunError {
    /// A phase aborted on its first failing task; no later phase executed.
    #[error("startup aborted in phase {phase:?} at task {task:?}: {source}")]
    PhaseAborted {
        /// Phase that aborted.
        phase: &'static str,
        /// Task whose outcome stopped the phase.
        task: String,
        /// The triggering task error.
        #[source]
        source: TaskError,
    },
}

impl RunError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::PhaseAborted { .. } => "phase_aborted",
        }
    }
}
