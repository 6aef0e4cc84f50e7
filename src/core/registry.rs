//! # Task registry — per-phase ordered task lists.
//!
//! The registry is a plain pre-run data structure: the hosting application
//! fills it during setup, the orchestrator drains it exactly once when
//! `run()` begins. It is single-writer by discipline: the orchestrator's
//! run-state guard rejects mutation once a run has started, so no
//! concurrent access ever reaches it.
//!
//! ## Rules
//! - Slot order is `P::ALL` order; task order within a slot is registration
//!   order.
//! - Task names are unique only within their phase; `remove` drops the
//!   first match by name.
//! - Membership of a phase descriptor is validated against `P::ALL`
//!   (`UnknownPhase` otherwise).

use crate::error::RegistryError;
use crate::phases::Phase;
use crate::tasks::TaskSpec;

/// Per-phase ordered collection of registered tasks.
pub(crate) struct Registry<P: Phase> {
    phases: Vec<(P, Vec<TaskSpec>)>,
}

impl<P: Phase> Registry<P> {
    /// Creates an empty registry with one slot per phase, in fixed order.
    pub(crate) fn new() -> Self {
        Self {
            phases: P::ALL.iter().map(|p| (*p, Vec::new())).collect(),
        }
    }

    /// Appends a task to the end of its phase's list.
    pub(crate) fn add(&mut self, phase: P, spec: TaskSpec) -> Result<(), RegistryError> {
        self.slot_mut(phase)?.push(spec);
        Ok(())
    }

    /// Removes the first task with the given name from the phase.
    ///
    /// Returns whether a removal occurred.
    pub(crate) fn remove(&mut self, phase: P, name: &str) -> Result<bool, RegistryError> {
        let slot = self.slot_mut(phase)?;
        match slot.iter().position(|s| s.name() == name) {
            Some(i) => {
                slot.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drains the registry for execution, leaving it empty.
    pub(crate) fn take(&mut self) -> Vec<(P, Vec<TaskSpec>)> {
        std::mem::take(&mut self.phases)
    }

    /// Total number of registered tasks across all phases.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.phases.iter().map(|(_, v)| v.len()).sum()
    }

    fn slot_mut(&mut self, phase: P) -> Result<&mut Vec<TaskSpec>, RegistryError> {
        self.phases
            .iter_mut()
            .find(|(p, _)| *p == phase)
            .map(|(_, slot)| slot)
            .ok_or(RegistryError::UnknownPhase {
                phase: phase.name(),
            })
    }
}
