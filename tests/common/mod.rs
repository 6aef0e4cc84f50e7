#![allow(dead_code)] // each test binary uses a subset of these helpers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use phasor::{Event, EventKind, Subscribe, TaskError, TaskFn, TaskRef};

static TRACING: Once = Once::new();

/// Routes the crate's tracing output through the test harness capture so
/// failing tests show their logs.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Subscriber that forwards every event into an unbounded channel so tests
/// can assert on delivery order.
pub struct Forwarder {
    tx: mpsc::UnboundedSender<Event>,
}

#[async_trait]
impl Subscribe for Forwarder {
    async fn on_event(&self, event: &Event) {
        let _ = self.tx.send(event.clone());
    }

    fn name(&self) -> &'static str {
        "forwarder"
    }
}

pub fn forwarder() -> (Arc<Forwarder>, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(Forwarder { tx }), rx)
}

/// Drains the forwarder channel until one of the `stop` kinds arrives.
pub async fn collect_until(
    rx: &mut mpsc::UnboundedReceiver<Event>,
    stop: &[EventKind],
) -> Vec<Event> {
    let mut out = Vec::new();
    loop {
        let ev = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event stream stalled")
            .expect("event channel closed");
        let kind = ev.kind;
        out.push(ev);
        if stop.contains(&kind) {
            return out;
        }
    }
}

/// Global and phase events only, as `(kind, phase)` pairs.
pub fn outline(events: &[Event]) -> Vec<(EventKind, Option<&'static str>)> {
    events
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                EventKind::GlobalStart
                    | EventKind::GlobalComplete
                    | EventKind::GlobalError
                    | EventKind::PhaseStart
                    | EventKind::PhaseComplete
            )
        })
        .map(|e| (e.kind, e.phase))
        .collect()
}

/// Task that succeeds and counts its invocations.
pub fn counted_ok(name: &'static str, ran: Arc<AtomicUsize>) -> TaskRef {
    TaskFn::arc(name, move |_ctx: CancellationToken| {
        let ran = ran.clone();
        async move {
            ran.fetch_add(1, Ordering::SeqCst);
            Ok::<_, TaskError>(())
        }
    })
}

/// Task that fails with the given message and counts its invocations.
pub fn counted_fail(
    name: &'static str,
    error: &'static str,
    ran: Arc<AtomicUsize>,
) -> TaskRef {
    TaskFn::arc(name, move |_ctx: CancellationToken| {
        let ran = ran.clone();
        async move {
            ran.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(TaskError::fail(error))
        }
    })
}

/// Task whose action never settles on its own.
pub fn never_settles(name: &'static str) -> TaskRef {
    TaskFn::arc(name, |_ctx: CancellationToken| async {
        std::future::pending::<()>().await;
        Ok::<_, TaskError>(())
    })
}
