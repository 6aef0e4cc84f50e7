//! # Lifecycle events emitted by the orchestrators.
//!
//! The [`EventKind`] enum classifies events across three levels:
//! - **Global events**: run boundaries (`GlobalStart`, `GlobalComplete`,
//!   `GlobalError`)
//! - **Phase events**: per-phase boundaries (`PhaseStart`, `PhaseComplete`)
//! - **Task events**: per-task execution (`TaskStarting`, `TaskStopped`,
//!   `TaskFailed`, `TimeoutHit`)
//!
//! The [`Event`] struct carries optional metadata: phase name, task name,
//! error text, timeout/duration, failure count.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore exact order when events are delivered
//! out of order across subscribers.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Global run events ===
    /// A run began (first thing emitted after the reentrancy guard passes).
    ///
    /// Sets: `at`, `seq`.
    GlobalStart,

    /// Every phase completed. For shutdown this precedes the grace delay
    /// and process termination.
    ///
    /// Sets: `at`, `seq`.
    GlobalComplete,

    /// Startup aborted: a phase stopped on its first failing task.
    ///
    /// Sets: `phase`, `task`, `error`, `at`, `seq`.
    GlobalError,

    // === Phase events ===
    /// A phase is about to execute its tasks.
    ///
    /// Sets: `phase`, `at`, `seq`.
    PhaseStart,

    /// All attempted tasks of a phase have settled. Under the fail-fast
    /// policy "attempted" may be a strict prefix of the registered tasks.
    ///
    /// Sets: `phase`, `failures`, `at`, `seq`.
    PhaseComplete,

    // === Task execution events ===
    /// A task's action is being invoked.
    ///
    /// Sets: `task`, `timeout_ms`, `at`, `seq`.
    TaskStarting,

    /// Task settled successfully (or exited gracefully on cancellation).
    ///
    /// Sets: `task`, `duration_ms`, `at`, `seq`.
    TaskStopped,

    /// Task settled with an error, or its timeout verdict was recorded.
    ///
    /// Sets: `task`, `error`, `duration_ms`, `at`, `seq`.
    TaskFailed,

    /// Task's timer won the race. Published in addition to `TaskFailed`.
    ///
    /// Sets: `task`, `timeout_ms`, `at`, `seq`.
    TimeoutHit,

    // === Notifier events ===
    /// A subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `error` (reason), `at`, `seq`.
    SubscriberOverflow,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Phase name, if applicable.
    pub phase: Option<&'static str>,
    /// Task (or subscriber) name, if applicable.
    pub task: Option<Arc<str>>,
    /// Human-readable error text.
    pub error: Option<Arc<str>>,
    /// Configured timeout in milliseconds (compact).
    pub timeout_ms: Option<u64>,
    /// Measured duration in milliseconds (compact).
    pub duration_ms: Option<u64>,
    /// Number of failed tasks in a completed phase.
    pub failures: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            phase: None,
            task: None,
            error: None,
            timeout_ms: None,
            duration_ms: None,
            failures: None,
        }
    }

    /// Attaches a phase name.
    #[inline]
    pub fn with_phase(mut self, phase: &'static str) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable error text.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Attaches a measured duration (stored as milliseconds).
    #[inline]
    pub fn with_duration(mut self, d: Duration) -> Self {
        self.duration_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Attaches a phase failure count.
    #[inline]
    pub fn with_failures(mut self, n: usize) -> Self {
        self.failures = Some(n);
        self
    }
}
