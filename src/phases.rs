//! Fixed phase sequences for startup and shutdown.
//!
//! A [`Phase`] is one ordered stage of a lifecycle run. The set of phases is
//! a plain ordered slice of typed descriptors ([`Phase::ALL`]), defined once
//! at compile time and never extended or reordered at runtime. Membership is
//! a simple lookup against that slice; there is no reflection or metadata
//! mechanism involved.
//!
//! The crate ships two built-in sequences, [`StartupPhase`] and
//! [`ShutdownPhase`]. Applications with different stage layouts can define
//! their own enum and implement [`Phase`] for it.

use std::fmt;

/// An element of a fixed, totally-ordered phase enumeration.
///
/// Implementors are small `Copy` enums. [`Phase::ALL`] is the execution
/// order: the orchestrator iterates it front to back, and phase `N + 1`
/// never begins until phase `N` has fully settled.
pub trait Phase: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// The complete phase sequence, in execution order.
    const ALL: &'static [Self];

    /// Stable, human-readable phase name (for logs and events).
    fn name(&self) -> &'static str;

    /// Position of this phase in [`Phase::ALL`].
    ///
    /// Returns `None` for a descriptor that is not part of the sequence.
    fn ordinal(&self) -> Option<usize> {
        Self::ALL.iter().position(|p| p == self)
    }

    /// True if this descriptor is a member of the fixed sequence.
    fn is_known(&self) -> bool {
        Self::ALL.contains(self)
    }
}

/// Built-in startup sequence.
///
/// Ordered for a typical networked application: configuration first,
/// storage next, then outbound connections, handler registration, cache
/// warmup, listener binding, and finally the readiness flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartupPhase {
    /// Load and validate configuration.
    Configure,
    /// Open database handles, run migrations.
    Database,
    /// Bring up caches and in-memory state.
    Cache,
    /// Establish outbound connections (gateways, brokers).
    Connect,
    /// Register handlers, routes, consumers.
    Register,
    /// Pre-fill caches, prime pools.
    Warmup,
    /// Mark the application ready for traffic.
    Ready,
}

impl Phase for StartupPhase {
    const ALL: &'static [Self] = &[
        StartupPhase::Configure,
        StartupPhase::Database,
        StartupPhase::Cache,
        StartupPhase::Connect,
        StartupPhase::Register,
        StartupPhase::Warmup,
        StartupPhase::Ready,
    ];

    fn name(&self) -> &'static str {
        match self {
            StartupPhase::Configure => "configure",
            StartupPhase::Database => "database",
            StartupPhase::Cache => "cache",
            StartupPhase::Connect => "connect",
            StartupPhase::Register => "register",
            StartupPhase::Warmup => "warmup",
            StartupPhase::Ready => "ready",
        }
    }
}

/// Built-in shutdown sequence.
///
/// Roughly the reverse of startup: stop taking new work, drain what is in
/// flight, drop external connections, flush buffers, release local
/// resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownPhase {
    /// Stop accepting new work (unbind listeners, pause consumers).
    StopAccepting,
    /// Drain in-flight work.
    Drain,
    /// Disconnect external clients and connections.
    Disconnect,
    /// Flush buffers, metrics, audit trails.
    Flush,
    /// Release local resources (files, locks, temp state).
    Release,
}

impl Phase for ShutdownPhase {
    const ALL: &'static [Self] = &[
        ShutdownPhase::StopAccepting,
        ShutdownPhase::Drain,
        ShutdownPhase::Disconnect,
        ShutdownPhase::Flush,
        ShutdownPhase::Release,
    ];

    fn name(&self) -> &'static str {
        match self {
            ShutdownPhase::StopAccepting => "stop_accepting",
            ShutdownPhase::Drain => "drain",
            ShutdownPhase::Disconnect => "disconnect",
            ShutdownPhase::Flush => "flush",
            ShutdownPhase::Release => "release",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_sequence_is_fixed() {
        assert_eq!(StartupPhase::ALL.len(), 7);
        assert_eq!(StartupPhase::Configure.ordinal(), Some(0));
        assert_eq!(StartupPhase::Ready.ordinal(), Some(6));
        assert!(StartupPhase::Connect.is_known());
    }

    #[test]
    fn shutdown_sequence_is_fixed() {
        assert_eq!(ShutdownPhase::ALL.len(), 5);
        assert_eq!(ShutdownPhase::StopAccepting.ordinal(), Some(0));
        assert_eq!(ShutdownPhase::Release.ordinal(), Some(4));
        assert_eq!(ShutdownPhase::Drain.name(), "drain");
    }

    #[test]
    fn rogue_descriptor_is_not_a_member() {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum Rogue {
            Known,
            Hidden,
        }

        impl Phase for Rogue {
            const ALL: &'static [Self] = &[Rogue::Known];

            fn name(&self) -> &'static str {
                match self {
                    Rogue::Known => "known",
                    Rogue::Hidden => "hidden",
                }
            }
        }

        assert!(Rogue::Known.is_known());
        assert!(!Rogue::Hidden.is_known());
        assert_eq!(Rogue::Hidden.ordinal(), None);
    }
}
