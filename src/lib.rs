//! # phasor
//!
//! **Phasor** is a phased lifecycle orchestrator for Rust applications: a
//! pair of coordinators that manage ordered startup and graceful,
//! bounded-time shutdown.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   TaskSpec   │   │   TaskSpec   │   │   TaskSpec   │
//!     │ (phase slot) │   │ (phase slot) │   │ (phase slot) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator (Startup or Shutdown)                               │
//! │  - Registry (per-phase ordered task lists, drained at run())      │
//! │  - Bus (broadcast events)                                         │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! │  - run-state guard (Idle → Running → terminal, at most once)      │
//! └──────┬────────────────────────────────────────────────────┬───────┘
//!        ▼ per phase, in fixed order                          │
//!   ┌───────────────────────────────────────┐                 │
//!   │  Phase runner                         │                 │
//!   │  - fail-fast sequential  (startup)    │   Publishes:    │
//!   │  - best-effort concurrent (shutdown)  │   - PhaseStart  │
//!   └──────┬────────────────────────────────┘   - Task events │
//!          ▼ per task                           - PhaseComplete
//!   ┌───────────────────────────────────────┐                 │
//!   │  run_once: action ⟷ timer race        │                 │
//!   │  (timeout cancels the child token)    │                 │
//!   └───────────────────────────────────────┘                 ▼
//!                                              ┌────────────────────────┐
//!                                              │  bus listener          │
//!                                              │  → SubscriberSet       │
//!                                              │  → per-sub queues      │
//!                                              │  → sub.on_event()      │
//!                                              └────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! ```text
//! Startup:   Idle ─► Running ─► Completed            run() returns Ok
//!                        └─────► Failed              run() returns Err (fail-fast)
//!
//! Shutdown:  Idle ─► Running ─► Terminating ─► exit(code)
//!            (no failed terminal state: phases always proceed)
//! ```
//!
//! ## Features
//! | Area               | Description                                               | Key types / traits                  |
//! |--------------------|-----------------------------------------------------------|-------------------------------------|
//! | **Phases**         | Fixed, totally-ordered lifecycle stages.                  | [`Phase`], [`StartupPhase`], [`ShutdownPhase`] |
//! | **Tasks**          | Named, timeout-bounded, cancelable units of work.         | [`Task`], [`TaskFn`], [`TaskRef`]   |
//! | **Orchestration**  | Ordered phase execution with two policies.                | [`Startup`], [`Shutdown`]           |
//! | **Events**         | Global/phase/task lifecycle events with stable ordering.  | [`Event`], [`EventKind`]            |
//! | **Subscribers**    | Dynamic event handlers (logging, readiness, custom).      | [`Subscribe`], [`SubscriberSet`]    |
//! | **Errors**         | Typed errors for registration, execution, and runs.       | [`TaskError`], [`RegistryError`], [`RunError`] |
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
//!     let db: TaskRef = TaskFn::arc("db-connect", |ctx: CancellationToken| async move {
//!         if ctx.is_cancelled() {
//!             return Err(TaskError::Canceled);
//!         }
//!         // open the pool...
//!         Ok(())
//!     });
//!     boot.add_task(StartupPhase::Database, db, Some(Duration::from_secs(5)))?;
//!
//!     boot.run().await?;
//!     assert!(boot.is_ready());
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod phases;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{Config, PhaseReport, Shutdown, Startup, TaskResult, TaskStatus};
pub use error::{RegistryError, RunError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use phases::{Phase, ShutdownPhase, StartupPhase};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet, SubscriptionId};
pub use tasks::{Task, TaskFn, TaskRef, TaskSpec};
