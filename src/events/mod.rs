//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish lifecycle events emitted by the orchestrators, phase runners and
//! the timeout executor.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! Consumers subscribe through the orchestrator's
//! [`SubscriberSet`](crate::SubscriberSet), which is fed by a single bus
//! listener per orchestrator.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
