//! # SubscriberSet: dynamic, non-blocking fan-out over subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`](crate::events::Event) to the
//! currently subscribed handlers **without awaiting** their processing.
//! Handlers may subscribe and unsubscribe at any time, including while
//! events are being emitted; emission iterates a lock-protected map and
//! never fails or skips live handlers because of concurrent mutation.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscription FIFO (queue order).
//! - Panics inside handlers are caught and logged (isolation).
//! - An unsubscribed handler stops receiving events; its worker drains the
//!   queue and exits.
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscriptions (use `Event::seq`).
//! - No retries on queue overflow (events are dropped for that
//!   subscription, with a warning and an overflow notice).
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        │                        (Arc-clone per subscription)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Opaque handle identifying one subscription.
///
/// Returned by [`SubscriberSet::subscribe`]; pass it back to
/// [`SubscriberSet::unsubscribe`] to detach the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Per-subscription channel with metadata.
struct SubscriberChannel {
    name: &'static str,
    filter: Option<EventKind>,
    sender: mpsc::Sender<Arc<Event>>,
    worker: JoinHandle<()>,
}

/// Dynamic fan-out with per-subscription bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: RwLock<HashMap<u64, SubscriberChannel>>,
    next_id: AtomicU64,
}

impl SubscriberSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Attaches a handler and spawns its worker.
    ///
    /// With `filter = Some(kind)` the handler receives only events of that
    /// kind; with `None` it receives everything. Must be called from within
    /// a tokio runtime.
    pub fn subscribe(
        &self,
        filter: Option<EventKind>,
        sub: Arc<dyn Subscribe>,
    ) -> SubscriptionId {
        let cap = sub.queue_capacity().max(1);
        let name = sub.name();
        let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);

        let worker = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let fut = sub.on_event(ev.as_ref());
                if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                    tracing::error!(
                        subscriber = sub.name(),
                        panic = ?panic,
                        "subscriber panicked while handling event"
                    );
                }
            }
        });

        let id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        self.write().insert(
            id,
            SubscriberChannel {
                name,
                filter,
                sender: tx,
                worker,
            },
        );
        SubscriptionId(id)
    }

    /// Detaches a subscription; returns whether it existed.
    ///
    /// The worker drains already-queued events and then exits.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.write().remove(&id.0).is_some()
    }

    /// Fan-out one event to all matching subscriptions (non-blocking).
    ///
    /// If a subscription's queue is **full** or its worker is **closed**,
    /// the event is dropped for it and a warning is logged. Each drop also
    /// yields a [`EventKind::SubscriberOverflow`] notice in the returned
    /// vec so the caller can redeliver it; a dropped notice never generates
    /// another notice.
    pub fn emit(&self, event: &Event) -> Vec<Event> {
        let ev = Arc::new(event.clone());
        let mut notices = Vec::new();
        for channel in self.read().values() {
            if channel.filter.is_some_and(|k| k != ev.kind) {
                continue;
            }
            let reason = match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "queue full",
                Err(mpsc::error::TrySendError::Closed(_)) => "worker closed",
            };
            tracing::warn!(
                subscriber = channel.name,
                kind = ?ev.kind,
                reason,
                "subscriber dropped event"
            );
            if ev.kind != EventKind::SubscriberOverflow {
                notices.push(
                    Event::new(EventKind::SubscriberOverflow)
                        .with_task(channel.name)
                        .with_error(reason),
                );
            }
        }
        notices
    }

    /// Graceful teardown: close all queues and await worker completion.
    pub async fn shutdown(&self) {
        let workers: Vec<JoinHandle<()>> = {
            let mut map = self.write();
            map.drain().map(|(_, ch)| ch.worker).collect()
        };
        for h in workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Number of subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<u64, SubscriberChannel>> {
        self.channels.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<u64, SubscriberChannel>> {
        self.channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SubscriberSet {
    fn default() -> Self {
        Self::new()
    }
}
