//! Orchestrator core: registry, execution, and the two drivers.
//!
//! The public API from this module is [`Config`], the two orchestrators
//! [`Startup`] and [`Shutdown`], and the result types produced per phase.
//!
//! Internal modules:
//! - `runner`: executes one task racing its timeout, publishing events;
//! - `phase`: the two phase policies (fail-fast sequential, best-effort
//!   concurrent) and their report types;
//! - `registry`: per-phase ordered task lists, drained once per run;
//! - `startup` / `shutdown`: the drivers with their run-state guards;
//! - `signal`: cross-platform termination-signal waiting.

mod config;
mod phase;
mod registry;
mod runner;
mod shutdown;
mod signal;
mod startup;

pub use config::Config;
pub use phase::{PhaseReport, TaskResult, TaskStatus};
pub use shutdown::Shutdown;
pub use startup::Startup;
