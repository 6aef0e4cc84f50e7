//! # Startup orchestrator: fail-fast ordered boot.
//!
//! [`Startup`] drives the fixed startup phase sequence end to end. Each
//! phase runs its tasks sequentially in registration order and aborts on
//! the first non-success outcome; an aborted phase aborts the whole run,
//! and the triggering error is returned to the caller, since later phases
//! assume earlier subsystems are healthy.
//!
//! ## State machine
//! ```text
//! Idle ──run()──► Running ──all phases ok──► Completed   (is_ready() == true)
//!                    │
//!                    └──any task fails/times out──► Failed (run() returns Err)
//! ```
//!
//! Repeated or reentrant `run()` calls log a warning and are no-ops.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use phasor::{Config, Startup, StartupPhase, TaskError, TaskFn, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let boot: Startup = Startup::new(Config::startup());
//!
//!     let load: TaskRef = TaskFn::arc("load-config", |_ctx: CancellationToken| async {
//!         Ok::<_, TaskError>(())
//!     });
//!     boot.add_task(StartupPhase::Configure, load, Some(Duration::from_millis(10)))?;
//!
//!     boot.run().await?;
//!     assert!(boot.is_ready());
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicU8, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::core::config::Config;
use crate::core::phase::run_fail_fast;
use crate::core::registry::Registry;
use crate::error::{RegistryError, RunError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::phases::{Phase, StartupPhase};
use crate::subscribers::{Subscribe, SubscriberSet, SubscriptionId};
use crate::tasks::{TaskRef, TaskSpec};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const COMPLETED: u8 = 2;
const FAILED: u8 = 3;

/// Orchestrates the ordered, fail-fast startup sequence.
///
/// Construct one instance in the application's composition root and pass it
/// by reference to collaborators that register tasks or subscribe to
/// events.
pub struct Startup<P: Phase = StartupPhase> {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    registry: Mutex<Registry<P>>,
    state: AtomicU8,
}

impl<P: Phase> Startup<P> {
    /// Creates a new startup orchestrator in the `Idle` state.
    pub fn new(cfg: Config) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            cfg,
            bus,
            subs: Arc::new(SubscriberSet::new()),
            registry: Mutex::new(Registry::new()),
            state: AtomicU8::new(IDLE),
        }
    }

    /// Registers a task at the end of the phase's list.
    ///
    /// `timeout` of `None` (or zero) uses the config default. Errors with
    /// [`RegistryError::UnknownPhase`] for a descriptor outside the fixed
    /// sequence and [`RegistryError::RegistrationAfterRun`] once `run()`
    /// has begun or finished.
    pub fn add_task(
        &self,
        phase: P,
        task: TaskRef,
        timeout: Option<Duration>,
    ) -> Result<(), RegistryError> {
        self.ensure_idle(phase)?;
        let spec = TaskSpec::new(task, self.cfg.resolve_timeout(timeout));
        self.registry().add(phase, spec)
    }

    /// Removes the first task with the given name from the phase.
    ///
    /// Returns whether a removal occurred; same run-state guard as
    /// [`Startup::add_task`].
    pub fn remove_task(&self, phase: P, name: &str) -> Result<bool, RegistryError> {
        self.ensure_idle(phase)?;
        self.registry().remove(phase, name)
    }

    /// Attaches an event handler; see [`SubscriberSet::subscribe`].
    pub fn subscribe(
        &self,
        filter: Option<EventKind>,
        handler: Arc<dyn Subscribe>,
    ) -> SubscriptionId {
        self.subs.subscribe(filter, handler)
    }

    /// Detaches an event handler; returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subs.unsubscribe(id)
    }

    /// True while a run is in flight.
    pub fn is_running(&self) -> bool {
        self.state.load(AtomicOrdering::Acquire) == RUNNING
    }

    /// True once every phase has completed successfully.
    pub fn is_ready(&self) -> bool {
        self.state.load(AtomicOrdering::Acquire) == COMPLETED
    }

    /// Runs the startup sequence.
    ///
    /// Phases execute in fixed order; within a phase, tasks run
    /// sequentially in registration order and the first non-success outcome
    /// aborts the run with [`RunError::PhaseAborted`]. Calling `run()`
    /// while running or after a prior outcome logs a warning and returns
    /// `Ok(())` without re-executing.
    pub async fn run(&self) -> Result<(), RunError> {
        if self
            .state
            .compare_exchange(
                IDLE,
                RUNNING,
                AtomicOrdering::AcqRel,
                AtomicOrdering::Acquire,
            )
            .is_err()
        {
            tracing::warn!("startup run() ignored: already running or finished");
            return Ok(());
        }

        self.spawn_listener();
        let phases = self.registry().take();
        let token = CancellationToken::new();

        self.bus.publish(Event::new(EventKind::GlobalStart));
        tracing::info!(phases = phases.len(), "startup sequence starting");

        for (phase, specs) in phases {
            let report = run_fail_fast(phase.name(), &specs, &token, &self.bus).await;
            if let Some(aborted) = report.first_failure() {
                let err = RunError::PhaseAborted {
                    phase: phase.name(),
                    task: aborted.name.to_string(),
                    source: aborted
                        .error
                        .clone()
                        .unwrap_or_else(|| TaskError::fail("unknown failure")),
                };
                self.bus.publish(
                    Event::new(EventKind::GlobalError)
                        .with_phase(phase.name())
                        .with_task(aborted.name.clone())
                        .with_error(err.to_string()),
                );
                self.state.store(FAILED, AtomicOrdering::Release);
                tracing::error!(
                    phase = phase.name(),
                    task = %aborted.name,
                    error = %err,
                    "startup aborted"
                );
                return Err(err);
            }
        }

        self.bus.publish(Event::new(EventKind::GlobalComplete));
        self.state.store(COMPLETED, AtomicOrdering::Release);
        tracing::info!("startup complete");
        Ok(())
    }

    /// Forwards bus events to the subscriber set.
    ///
    /// Overflow notices are redelivered directly through the set (a dropped
    /// notice never generates another). The task holds no sender, so it
    /// observes `Closed` and exits once the orchestrator is dropped.
    fn spawn_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        for notice in set.emit(&ev) {
                            set.emit(&notice);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event listener lagged behind the bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    fn ensure_idle(&self, phase: P) -> Result<(), RegistryError> {
        if self.state.load(AtomicOrdering::Acquire) != IDLE {
            return Err(RegistryError::RegistrationAfterRun {
                phase: phase.name(),
            });
        }
        Ok(())
    }

    fn registry(&self) -> MutexGuard<'_, Registry<P>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
