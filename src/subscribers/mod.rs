//! # Event subscribers (the notifier surface).
//!
//! This module provides the [`Subscribe`] trait, the dynamic
//! [`SubscriberSet`] fan-out, and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   runner / phase runner / driver ── publish(Event) ──► Bus
//!                                                         │
//!                                       orchestrator listener
//!                                                         │
//!                                              SubscriberSet::emit(&Event)
//!                                              ┌──────────┼──────────┐
//!                                              ▼          ▼          ▼
//!                                         [queue S1] [queue S2] [queue SN]
//!                                              │          │          │
//!                                         worker S1  worker S2  worker SN
//!                                              │          │          │
//!                                       sub.on_event(&Event) (per handler)
//! ```
//!
//! Handlers attach and detach at any time via
//! [`SubscriberSet::subscribe`]/[`unsubscribe`](SubscriberSet::unsubscribe);
//! emission never skips a live handler because of concurrent mutation.

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::{SubscriberSet, SubscriptionId};
pub use subscribe::Subscribe;
