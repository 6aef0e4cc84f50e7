//! # Orchestrator configuration.
//!
//! Provides [`Config`], the settings shared by both orchestrator kinds.
//!
//! ## Sentinel values
//! - a requested task timeout of `0` (or `None`) → use `default_timeout`
//! - `bus_capacity` is clamped to a minimum of 1 by the bus

use std::time::Duration;

/// Configuration for a lifecycle orchestrator.
///
/// ## Field semantics
/// - `default_timeout`: per-task timeout used when a task is registered
///   without an explicit one
/// - `bus_capacity`: event bus ring buffer size
/// - `grace`: pause between the last shutdown phase and process
///   termination, letting buffered diagnostics flush (shutdown only)
/// - `handle_signals`: whether the shutdown orchestrator reacts to OS
///   termination signals (shutdown only)
#[derive(Clone, Debug)]
pub struct Config {
    /// Default per-task timeout applied at registration.
    pub default_timeout: Duration,

    /// Capacity of the event bus broadcast ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events
    /// observe `Lagged` and skip older items. Minimum 1 (enforced by Bus).
    pub bus_capacity: usize,

    /// Delay between the final phase completing and process termination.
    pub grace: Duration,

    /// Trigger shutdown on the first OS termination signal.
    pub handle_signals: bool,
}

impl Config {
    /// Preset for a startup orchestrator: 10s default task timeout.
    pub fn startup() -> Self {
        Self {
            default_timeout: Duration::from_secs(10),
            bus_capacity: 1024,
            grace: Duration::ZERO,
            handle_signals: false,
        }
    }

    /// Preset for a shutdown orchestrator: 5s default task timeout and a
    /// short grace delay before termination.
    pub fn shutdown() -> Self {
        Self {
            default_timeout: Duration::from_secs(5),
            bus_capacity: 1024,
            grace: Duration::from_millis(200),
            handle_signals: false,
        }
    }

    /// Resolves a requested timeout against the default.
    ///
    /// `None` and `Some(0)` both mean "use the default".
    #[inline]
    pub fn resolve_timeout(&self, requested: Option<Duration>) -> Duration {
        match requested {
            Some(d) if d > Duration::ZERO => d,
            _ => self.default_timeout,
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::startup()
    }
}
