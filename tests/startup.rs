//! Startup orchestrator: ordering, fail-fast, guards, idempotence.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use common::{collect_until, counted_fail, counted_ok, forwarder, outline};
use phasor::{
    Config, EventKind, Phase, RegistryError, RunError, Startup, TaskError, TaskFn,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boot {
    Init,
    Connect,
    Ready,
}

impl Phase for Boot {
    const ALL: &'static [Self] = &[Boot::Init, Boot::Connect, Boot::Ready];

    fn name(&self) -> &'static str {
        match self {
            Boot::Init => "init",
            Boot::Connect => "connect",
            Boot::Ready => "ready",
        }
    }
}

fn sleepy_ok(name: &'static str, ms: u64) -> phasor::TaskRef {
    TaskFn::arc(name, move |_ctx: CancellationToken| async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok::<_, TaskError>(())
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn happy_path_emits_phases_in_fixed_order() {
    common::init_tracing();
    let boot: Startup<Boot> = Startup::new(Config::startup());
    let (fwd, mut rx) = forwarder();
    boot.subscribe(None, fwd);

    // Register out of phase order on purpose; execution order must not care.
    boot.add_task(Boot::Ready, sleepy_ok("mark-ready", 5), None)
        .unwrap();
    boot.add_task(Boot::Init, sleepy_ok("load-config", 10), None)
        .unwrap();
    boot.add_task(Boot::Connect, sleepy_ok("db-connect", 50), None)
        .unwrap();

    assert!(!boot.is_running());
    boot.run().await.expect("startup succeeds");
    assert!(boot.is_ready());
    assert!(!boot.is_running());

    let events = collect_until(&mut rx, &[EventKind::GlobalComplete]).await;
    assert_eq!(
        outline(&events),
        vec![
            (EventKind::GlobalStart, None),
            (EventKind::PhaseStart, Some("init")),
            (EventKind::PhaseComplete, Some("init")),
            (EventKind::PhaseStart, Some("connect")),
            (EventKind::PhaseComplete, Some("connect")),
            (EventKind::PhaseStart, Some("ready")),
            (EventKind::PhaseComplete, Some("ready")),
            (EventKind::GlobalComplete, None),
        ]
    );
}

#[tokio::test(flavor = "current_thread")]
async fn fail_fast_skips_rest_of_phase_and_later_phases() {
    common::init_tracing();
    let boot: Startup<Boot> = Startup::new(Config::startup());
    let (fwd, mut rx) = forwarder();
    boot.subscribe(None, fwd);

    let a = Arc::new(AtomicUsize::new(0));
    let b = Arc::new(AtomicUsize::new(0));
    let c = Arc::new(AtomicUsize::new(0));
    let later = Arc::new(AtomicUsize::new(0));

    boot.add_task(Boot::Connect, counted_ok("a", a.clone()), None)
        .unwrap();
    boot.add_task(
        Boot::Connect,
        counted_fail("b", "gateway refused", b.clone()),
        None,
    )
    .unwrap();
    boot.add_task(Boot::Connect, counted_ok("c", c.clone()), None)
        .unwrap();
    boot.add_task(Boot::Ready, counted_ok("later", later.clone()), None)
        .unwrap();

    let err = boot.run().await.expect_err("startup must abort");
    match err {
        RunError::PhaseAborted {
            phase,
            task,
            source,
        } => {
            assert_eq!(phase, "connect");
            assert_eq!(task, "b");
            assert!(
                matches!(source, TaskError::Fail { ref error } if error == "gateway refused")
            );
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(a.load(Ordering::SeqCst), 1);
    assert_eq!(b.load(Ordering::SeqCst), 1);
    assert_eq!(c.load(Ordering::SeqCst), 0);
    assert_eq!(later.load(Ordering::SeqCst), 0);
    assert!(!boot.is_ready());

    let events = collect_until(&mut rx, &[EventKind::GlobalError]).await;
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert!(!kinds.contains(&EventKind::GlobalComplete));
    assert_eq!(events.last().unwrap().task.as_deref(), Some("b"));

    // The aborting phase still reports complete for its attempted prefix.
    let connect_complete = events
        .iter()
        .find(|e| e.kind == EventKind::PhaseComplete && e.phase == Some("connect"))
        .expect("PhaseComplete(connect)");
    assert_eq!(connect_complete.failures, Some(1));
}

#[tokio::test(flavor = "current_thread")]
async fn repeated_run_is_a_warned_no_op() {
    common::init_tracing();
    let boot: Startup<Boot> = Startup::new(Config::startup());
    let ran = Arc::new(AtomicUsize::new(0));
    boot.add_task(Boot::Init, counted_ok("once", ran.clone()), None)
        .unwrap();

    // Two runs polled from the same task: the first CAS wins, the second
    // is a no-op even though the first is still in flight.
    let (first, second) = tokio::join!(boot.run(), boot.run());
    first.unwrap();
    second.unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 1);

    // And a run after completion is also a no-op.
    boot.run().await.unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert!(boot.is_ready());
}

#[tokio::test(flavor = "current_thread")]
async fn run_after_failure_stays_failed() {
    common::init_tracing();
    let boot: Startup<Boot> = Startup::new(Config::startup());
    let ran = Arc::new(AtomicUsize::new(0));
    boot.add_task(Boot::Init, counted_fail("bad", "boom", ran.clone()), None)
        .unwrap();

    assert!(boot.run().await.is_err());
    // Idempotent no-op, not an error, and no re-execution.
    boot.run().await.unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert!(!boot.is_ready());
}

#[tokio::test(flavor = "current_thread")]
async fn registration_is_rejected_after_run() {
    common::init_tracing();
    let boot: Startup<Boot> = Startup::new(Config::startup());
    boot.run().await.unwrap();

    let err = boot
        .add_task(Boot::Init, counted_ok("late", Arc::new(AtomicUsize::new(0))), None)
        .expect_err("registration after run");
    assert_eq!(err, RegistryError::RegistrationAfterRun { phase: "init" });

    let err = boot.remove_task(Boot::Init, "late").expect_err("removal after run");
    assert!(matches!(err, RegistryError::RegistrationAfterRun { .. }));
}

#[tokio::test(flavor = "current_thread")]
async fn remove_task_drops_first_registration_with_that_name() {
    common::init_tracing();
    let boot: Startup<Boot> = Startup::new(Config::startup());
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    boot.add_task(Boot::Init, counted_ok("dup", first.clone()), None)
        .unwrap();
    boot.add_task(Boot::Init, counted_ok("dup", second.clone()), None)
        .unwrap();

    assert!(boot.remove_task(Boot::Init, "dup").unwrap());
    assert!(!boot.remove_task(Boot::Init, "missing").unwrap());

    boot.run().await.unwrap();
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn unknown_phase_is_rejected_at_registration() {
    common::init_tracing();
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

    let boot: Startup<Rogue> = Startup::new(Config::startup());
    let err = boot
        .add_task(
            Rogue::Hidden,
            counted_ok("x", Arc::new(AtomicUsize::new(0))),
            None,
        )
        .expect_err("unknown phase");
    assert_eq!(err, RegistryError::UnknownPhase { phase: "hidden" });
}
