//! Shutdown orchestrator: partial-failure tolerance, idempotence, timeout
//! behavior, and single process-termination.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use common::{collect_until, counted_fail, counted_ok, forwarder, never_settles, outline};
use phasor::{
    Config, Event, EventKind, Phase, RegistryError, Shutdown, Subscribe, TaskError, TaskFn,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Teardown {
    StopAccepting,
    CloseResources,
}

impl Phase for Teardown {
    const ALL: &'static [Self] = &[Teardown::StopAccepting, Teardown::CloseResources];

    fn name(&self) -> &'static str {
        match self {
            Teardown::StopAccepting => "stop_accepting",
            Teardown::CloseResources => "close_resources",
        }
    }
}

/// Exit-hook recorder: collects every code the orchestrator tries to
/// terminate with.
fn exit_recorder() -> (Arc<Mutex<Vec<i32>>>, impl Fn(i32) + Send + Sync + 'static) {
    let codes: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = codes.clone();
    (codes, move |code| sink.lock().unwrap().push(code))
}

fn quiet_config() -> Config {
    let mut cfg = Config::shutdown();
    cfg.grace = Duration::ZERO;
    cfg
}

#[tokio::test(flavor = "current_thread")]
async fn partial_failure_still_reaches_every_phase_and_terminates() {
    common::init_tracing();
    let (codes, hook) = exit_recorder();
    let teardown: Shutdown<Teardown> = Shutdown::new(quiet_config()).with_exit_hook(hook);
    let (fwd, mut rx) = forwarder();
    teardown.subscribe(None, fwd);

    let stop = Arc::new(AtomicUsize::new(0));
    let db = Arc::new(AtomicUsize::new(0));
    let cache = Arc::new(AtomicUsize::new(0));

    teardown
        .add_task(Teardown::StopAccepting, counted_ok("unbind", stop.clone()), None)
        .unwrap();
    teardown
        .add_task(Teardown::CloseResources, counted_ok("close-db", db.clone()), None)
        .unwrap();
    teardown
        .add_task(
            Teardown::CloseResources,
            counted_fail("close-cache", "connection reset", cache.clone()),
            None,
        )
        .unwrap();

    teardown.run(7).await;

    // Every task attempted despite the failure.
    assert_eq!(stop.load(Ordering::SeqCst), 1);
    assert_eq!(db.load(Ordering::SeqCst), 1);
    assert_eq!(cache.load(Ordering::SeqCst), 1);

    // Termination still happened, once, with the supplied code.
    assert_eq!(*codes.lock().unwrap(), vec![7]);

    let events = collect_until(&mut rx, &[EventKind::GlobalComplete]).await;
    assert_eq!(
        outline(&events),
        vec![
            (EventKind::GlobalStart, None),
            (EventKind::PhaseStart, Some("stop_accepting")),
            (EventKind::PhaseComplete, Some("stop_accepting")),
            (EventKind::PhaseStart, Some("close_resources")),
            (EventKind::PhaseComplete, Some("close_resources")),
            (EventKind::GlobalComplete, None),
        ]
    );

    let report = events
        .iter()
        .find(|e| e.kind == EventKind::PhaseComplete && e.phase == Some("close_resources"))
        .unwrap();
    assert_eq!(report.failures, Some(1));
}

#[tokio::test(flavor = "current_thread")]
async fn second_run_while_in_flight_is_a_no_op() {
    common::init_tracing();
    let (codes, hook) = exit_recorder();
    let teardown: Arc<Shutdown<Teardown>> =
        Arc::new(Shutdown::new(quiet_config()).with_exit_hook(hook));

    let gate = Arc::new(Notify::new());
    let ran = Arc::new(AtomicUsize::new(0));
    {
        let gate = gate.clone();
        let ran = ran.clone();
        teardown
            .add_task(
                Teardown::StopAccepting,
                TaskFn::arc("wait-for-gate", move |_ctx: CancellationToken| {
                    let gate = gate.clone();
                    let ran = ran.clone();
                    async move {
                        ran.fetch_add(1, Ordering::SeqCst);
                        gate.notified().await;
                        Ok::<_, TaskError>(())
                    }
                }),
                None,
            )
            .unwrap();
    }

    let first = tokio::spawn({
        let teardown = teardown.clone();
        async move { teardown.run(0).await }
    });

    // Let the first run start and block on the gate.
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert!(teardown.is_running());
    assert_eq!(ran.load(Ordering::SeqCst), 1);

    // Second invocation: warning, no extra task execution, no termination.
    teardown.run(1).await;
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert!(codes.lock().unwrap().is_empty());

    gate.notify_one();
    first.await.unwrap();

    assert_eq!(*codes.lock().unwrap(), vec![0]);

    // And after termination has been initiated, still a no-op.
    teardown.run(2).await;
    assert_eq!(*codes.lock().unwrap(), vec![0]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn timed_out_task_does_not_stall_the_sequence() {
    common::init_tracing();
    let (codes, hook) = exit_recorder();
    let mut cfg = Config::shutdown();
    cfg.grace = Duration::ZERO;
    let teardown: Shutdown<Teardown> = Shutdown::new(cfg).with_exit_hook(hook);
    let (fwd, mut rx) = forwarder();
    teardown.subscribe(None, fwd);

    let next = Arc::new(AtomicUsize::new(0));
    teardown
        .add_task(
            Teardown::StopAccepting,
            never_settles("stuck-drain"),
            Some(Duration::from_millis(100)),
        )
        .unwrap();
    teardown
        .add_task(Teardown::CloseResources, counted_ok("next", next.clone()), None)
        .unwrap();

    let started = tokio::time::Instant::now();
    teardown.run(0).await;

    // The timeout verdict lands at ~100ms, not earlier, and the next
    // phase still runs.
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(next.load(Ordering::SeqCst), 1);
    assert_eq!(*codes.lock().unwrap(), vec![0]);

    let events = collect_until(&mut rx, &[EventKind::GlobalComplete]).await;
    assert!(events.iter().any(|e| e.kind == EventKind::TimeoutHit));
    let report = events
        .iter()
        .find(|e| e.kind == EventKind::PhaseComplete && e.phase == Some("stop_accepting"))
        .unwrap();
    assert_eq!(report.failures, Some(1));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn grace_delay_runs_before_termination() {
    common::init_tracing();
    let (codes, hook) = exit_recorder();
    let mut cfg = Config::shutdown();
    cfg.grace = Duration::from_millis(300);
    let teardown: Shutdown<Teardown> = Shutdown::new(cfg).with_exit_hook(hook);

    let started = tokio::time::Instant::now();
    teardown.run(0).await;

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(*codes.lock().unwrap(), vec![0]);
}

#[tokio::test(flavor = "current_thread")]
async fn registration_is_rejected_once_running() {
    common::init_tracing();
    let (_codes, hook) = exit_recorder();
    let teardown: Shutdown<Teardown> = Shutdown::new(quiet_config()).with_exit_hook(hook);
    teardown.run(0).await;

    let err = teardown
        .add_task(
            Teardown::StopAccepting,
            counted_ok("late", Arc::new(AtomicUsize::new(0))),
            None,
        )
        .expect_err("registration after run");
    assert_eq!(
        err,
        RegistryError::RegistrationAfterRun {
            phase: "stop_accepting"
        }
    );
}

#[tokio::test(flavor = "current_thread")]
async fn overflow_notices_reach_filtered_subscribers() {
    common::init_tracing();

    struct Stuck;

    #[async_trait]
    impl Subscribe for Stuck {
        async fn on_event(&self, _event: &Event) {
            std::future::pending::<()>().await;
        }

        fn name(&self) -> &'static str {
            "stuck"
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    let (_codes, hook) = exit_recorder();
    let teardown: Shutdown<Teardown> = Shutdown::new(quiet_config()).with_exit_hook(hook);

    // The stuck handler consumes one event and then blocks its worker, so
    // everything past its one-slot queue is dropped.
    teardown.subscribe(None, Arc::new(Stuck));
    let (fwd, mut rx) = forwarder();
    teardown.subscribe(Some(EventKind::SubscriberOverflow), fwd);

    teardown.run(0).await;

    let events = collect_until(&mut rx, &[EventKind::SubscriberOverflow]).await;
    let notice = events.last().unwrap();
    assert_eq!(notice.kind, EventKind::SubscriberOverflow);
    assert_eq!(notice.task.as_deref(), Some("stuck"));
    assert_eq!(notice.error.as_deref(), Some("queue full"));
}
