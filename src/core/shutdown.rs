//! # Shutdown orchestrator: best-effort graceful termination.
//!
//! [`Shutdown`] drives the fixed shutdown phase sequence end to end. Within
//! a phase all tasks start together and every one is waited for; no task's
//! failure stops another, and the next phase runs unconditionally because
//! shutdown must make forward progress under all circumstances. After the
//! last phase the orchestrator waits a short grace delay (letting buffered
//! diagnostics flush) and terminates the process with the supplied exit
//! code.
//!
//! ## State machine
//! ```text
//! Idle ──run(code)──► Running ──all phases settled──► Terminating ──► exit(code)
//! ```
//!
//! There is no failed terminal state: a phase that had task failures still
//! reports complete (with a failure count) and the sequence proceeds.
//! Reentrant `run()` calls log a warning and are no-ops, so process
//! termination is invoked at most once, ever.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use phasor::{Config, Shutdown, ShutdownPhase, TaskError, TaskFn, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut cfg = Config::shutdown();
//!     cfg.handle_signals = true;
//!
//!     let teardown: Arc<Shutdown> = Arc::new(Shutdown::new(cfg));
//!
//!     let close: TaskRef = TaskFn::arc("close-db", |_ctx: CancellationToken| async {
//!         Ok::<_, TaskError>(())
//!     });
//!     teardown
//!         .add_task(ShutdownPhase::Disconnect, close, None)
//!         .expect("registered before run");
//!
//!     // First SIGINT/SIGTERM triggers run(0); later signals are no-ops.
//!     teardown.spawn_signal_bridge();
//!
//!     // ... application work ...
//! }
//! ```

use std::sync::atomic::{AtomicU8, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::config::Config;
use crate::core::phase::run_best_effort;
use crate::core::registry::Registry;
use crate::core::signal::wait_for_shutdown_signal;
use crate::error::RegistryError;
use crate::events::{Bus, Event, EventKind};
use crate::phases::{Phase, ShutdownPhase};
use crate::subscribers::{Subscribe, SubscriberSet, SubscriptionId};
use crate::tasks::{TaskRef, TaskSpec};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const TERMINATING: u8 = 2;

/// Hook invoked with the exit code once the sequence has settled.
type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

/// Orchestrates the ordered, best-effort shutdown sequence and terminates
/// the process.
///
/// Construct one instance in the application's composition root; the
/// single-transition state machine guarantees at most one termination call
/// for the lifetime of the process.
pub struct Shutdown<P: Phase = ShutdownPhase> {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    registry: Mutex<Registry<P>>,
    state: AtomicU8,
    exit: ExitHook,
}

impl<P: Phase> Shutdown<P> {
    /// Creates a new shutdown orchestrator in the `Idle` state.
    ///
    /// The default exit hook is [`std::process::exit`].
    pub fn new(cfg: Config) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            cfg,
            bus,
            subs: Arc::new(SubscriberSet::new()),
            registry: Mutex::new(Registry::new()),
            state: AtomicU8::new(IDLE),
            exit: Arc::new(|code| std::process::exit(code)),
        }
    }

    /// Replaces the process-termination hook.
    ///
    /// For tests and embedders that must observe the exit code instead of
    /// exiting. The hook is still invoked at most once.
    #[must_use]
    pub fn with_exit_hook(mut self, hook: impl Fn(i32) + Send + Sync + 'static) -> Self {
        self.exit = Arc::new(hook);
        self
    }

    /// Registers a task at the end of the phase's list.
    ///
    /// `timeout` of `None` (or zero) uses the config default. Errors with
    /// [`RegistryError::UnknownPhase`] for a descriptor outside the fixed
    /// sequence and [`RegistryError::RegistrationAfterRun`] once `run()`
    /// has begun.
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
    /// [`Shutdown::add_task`].
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

    /// True once shutdown has started (running or terminating).
    pub fn is_running(&self) -> bool {
        self.state.load(AtomicOrdering::Acquire) != IDLE
    }

    /// Runs the shutdown sequence and terminates the process.
    ///
    /// Every phase runs to completion regardless of per-task failures; the
    /// process then terminates with `exit_code` after the configured grace
    /// delay. Calling `run()` while already running, or after termination
    /// has been initiated, logs a warning and is a no-op; termination is
    /// never invoked twice.
    pub async fn run(&self, exit_code: i32) {
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
            tracing::warn!(exit_code, "shutdown run() ignored: already in progress");
            return;
        }

        self.spawn_listener();
        let phases = self.registry().take();
        let token = CancellationToken::new();

        self.bus.publish(Event::new(EventKind::GlobalStart));
        tracing::info!(exit_code, phases = phases.len(), "shutdown sequence starting");

        let mut attempted = 0usize;
        let mut failures = 0usize;
        for (phase, specs) in phases {
            let report = run_best_effort(phase.name(), specs, &token, &self.bus).await;
            attempted += report.results.len();
            let failed = report.failure_count();
            if failed > 0 {
                tracing::warn!(
                    phase = phase.name(),
                    failures = failed,
                    "phase completed with failures"
                );
            }
            failures += failed;
        }

        self.bus.publish(Event::new(EventKind::GlobalComplete));
        tracing::info!(attempted, failures, exit_code, "shutdown sequence complete");

        self.state.store(TERMINATING, AtomicOrdering::Release);
        if self.cfg.grace > Duration::ZERO {
            time::sleep(self.cfg.grace).await;
        }
        (self.exit)(exit_code);
    }

    /// Spawns the signal bridge if [`Config::handle_signals`] is set.
    ///
    /// The first OS termination signal triggers `run(0)`; signals received
    /// while shutdown is already running hit the reentrancy guard and are
    /// no-ops.
    pub fn spawn_signal_bridge(self: &Arc<Self>) {
        if !self.cfg.handle_signals {
            tracing::debug!("signal bridge disabled by configuration");
            return;
        }
        let me = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match wait_for_shutdown_signal().await {
                    Ok(()) => {
                        tracing::info!("termination signal received");
                        me.run(0).await;
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "signal registration failed");
                        break;
                    }
                }
            }
        });
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
