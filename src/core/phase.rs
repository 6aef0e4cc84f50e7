//! # Phase runner — the two execution policies.
//!
//! A phase's task set runs under one of two policies:
//!
//! - **Fail-fast sequential** (startup): tasks run one at a time in
//!   registration order; the first non-success outcome stops the phase, so
//!   the result set may be a strict prefix of the registered tasks.
//! - **Best-effort concurrent** (shutdown): all tasks start together and
//!   the runner waits for every one to settle; no task's failure stops
//!   another, and the phase always reports complete (with a failure count).
//!
//! Both policies publish `PhaseStart` before executing and `PhaseComplete`
//! after all attempted tasks have settled, and neither overlaps with the
//! next phase.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::core::runner::run_once;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::TaskSpec;

/// Verdict for one executed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The action settled first, successfully.
    Success,
    /// The action settled first, with an error.
    Failed,
    /// The timer fired first.
    TimedOut,
}

/// Outcome of one task execution.
#[derive(Debug, Clone)]
pub struct TaskResult {
    /// Task name.
    pub name: Arc<str>,
    /// Verdict of the race.
    pub status: TaskStatus,
    /// The error, for `Failed` and `TimedOut` verdicts.
    pub error: Option<TaskError>,
    /// Measured wall time until the verdict.
    pub duration: Duration,
}

impl TaskResult {
    /// True for the `Success` verdict.
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }

    fn panicked(name: Arc<str>) -> Self {
        Self {
            name,
            status: TaskStatus::Failed,
            error: Some(TaskError::fail("task panicked")),
            duration: Duration::ZERO,
        }
    }
}

/// Aggregated results of one executed phase.
#[derive(Debug, Clone)]
pub struct PhaseReport {
    /// Phase name.
    pub phase: &'static str,
    /// Results of all attempted tasks. Under fail-fast this may be a strict
    /// prefix of the registered tasks.
    pub results: Vec<TaskResult>,
}

impl PhaseReport {
    /// Number of tasks that did not succeed.
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    /// First non-success result, if any.
    pub fn first_failure(&self) -> Option<&TaskResult> {
        self.results.iter().find(|r| !r.is_success())
    }
}

/// Runs a phase sequentially, stopping at the first non-success outcome.
pub(crate) async fn run_fail_fast(
    phase: &'static str,
    specs: &[TaskSpec],
    parent: &CancellationToken,
    bus: &Bus,
) -> PhaseReport {
    bus.publish(Event::new(EventKind::PhaseStart).with_phase(phase));

    let mut results = Vec::with_capacity(specs.len());
    for spec in specs {
        let result = run_once(spec, parent, bus).await;
        let aborted = !result.is_success();
        results.push(result);
        if aborted {
            break;
        }
    }

    let report = PhaseReport { phase, results };
    bus.publish(
        Event::new(EventKind::PhaseComplete)
            .with_phase(phase)
            .with_failures(report.failure_count()),
    );
    report
}

/// Runs a phase concurrently, waiting for every task to settle.
///
/// Results are reported in registration order regardless of settle order.
/// A panicking task is recorded as a failed result rather than tearing the
/// phase down.
pub(crate) async fn run_best_effort(
    phase: &'static str,
    specs: Vec<TaskSpec>,
    parent: &CancellationToken,
    bus: &Bus,
) -> PhaseReport {
    bus.publish(Event::new(EventKind::PhaseStart).with_phase(phase));

    let count = specs.len();
    let mut set = JoinSet::new();
    for (idx, spec) in specs.into_iter().enumerate() {
        let parent = parent.clone();
        let bus = bus.clone();
        set.spawn(async move {
            let name: Arc<str> = Arc::from(spec.name());
            let attempt =
                std::panic::AssertUnwindSafe(run_once(&spec, &parent, &bus)).catch_unwind();
            let result = attempt
                .await
                .unwrap_or_else(|_| TaskResult::panicked(name));
            (idx, result)
        });
    }

    let mut slots: Vec<Option<TaskResult>> = (0..count).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, result)) => slots[idx] = Some(result),
            // Unreachable in practice: the spawned future catches panics
            // itself and is never aborted.
            Err(err) => tracing::error!(phase, error = %err, "phase worker join failed"),
        }
    }

    let report = PhaseReport {
        phase,
        results: slots.into_iter().flatten().collect(),
    };
    bus.publish(
        Event::new(EventKind::PhaseComplete)
            .with_phase(phase)
            .with_failures(report.failure_count()),
    );
    report
}
