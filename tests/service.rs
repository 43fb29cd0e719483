mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{Collector, RecordingQueues, TransitionError, WAIT, recv, settle};
use feedvisor::{
    Config, Dispatcher, HandlerFn, NotificationService, NotifyError, QueueKind, ServiceState,
};
use tokio::sync::{mpsc, oneshot};

type Ev = TransitionError;

fn service(queues: &RecordingQueues) -> NotificationService<Ev> {
    NotificationService::new(Config::default(), Arc::new(queues.clone()))
}

fn mismatch(got: u64) -> Ev {
    TransitionError::SlotMismatch { expected: 1, got }
}

#[tokio::test]
async fn dispatch_to_unknown_feed_is_noop() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    let (tx, mut rx) = mpsc::unbounded_channel::<(&'static str, Ev)>();
    svc.register_feed("blocks").unwrap();
    svc.register_handler("blocks", "q1", Collector::arc("h", tx))
        .unwrap();
    svc.start().unwrap();

    assert_eq!(svc.dispatch("never-registered", mismatch(2)).await, 0);
    settle().await;

    assert!(queues.submissions().is_empty());
    assert!(rx.try_recv().is_err());
    svc.shutdown().await.unwrap();
}

#[tokio::test]
async fn single_handler_receives_event_on_its_queue() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    let (tx, mut rx) = mpsc::unbounded_channel::<(&'static str, Ev)>();

    svc.register_feed("blocks").unwrap();
    svc.register_handler("blocks", "q1", Collector::arc("H", tx))
        .unwrap();
    svc.start().unwrap();

    let evt = TransitionError::BlockSlotTooLow { slot: 9 };
    assert_eq!(svc.dispatch("blocks", evt.clone()).await, 1);
    assert_eq!(recv(&mut rx).await, ("H", evt));

    settle().await;
    assert_eq!(queues.submissions(), vec!["q1".to_string()]);
    svc.shutdown().await.unwrap();
}

#[tokio::test]
async fn each_binding_gets_exactly_one_submission() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    let (tx, mut rx) = mpsc::unbounded_channel::<(&'static str, Ev)>();

    svc.register_feed("blocks").unwrap();
    svc.register_handler("blocks", "q1", Collector::arc("H1", tx.clone()))
        .unwrap();
    svc.register_handler("blocks", "q2", Collector::arc("H2", tx))
        .unwrap();

    // Nothing is wired before start.
    assert_eq!(svc.dispatch("blocks", mismatch(0)).await, 0);
    settle().await;
    assert!(queues.submissions().is_empty());

    svc.start().unwrap();
    assert_eq!(svc.dispatch("blocks", mismatch(5)).await, 2);

    let mut got = vec![recv(&mut rx).await, recv(&mut rx).await];
    got.sort_by_key(|(name, _)| *name);
    assert_eq!(got, vec![("H1", mismatch(5)), ("H2", mismatch(5))]);

    settle().await;
    assert_eq!(queues.count("q1"), 1);
    assert_eq!(queues.count("q2"), 1);
    assert!(rx.try_recv().is_err());
    svc.shutdown().await.unwrap();
}

#[tokio::test]
async fn two_handlers_on_same_queue() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    let (tx, mut rx) = mpsc::unbounded_channel::<(&'static str, Ev)>();

    svc.register_feed("blocks").unwrap();
    svc.register_handler("blocks", "q1", Collector::arc("A", tx.clone()))
        .unwrap();
    svc.register_handler("blocks", "q1", Collector::arc("B", tx))
        .unwrap();
    svc.start().unwrap();

    svc.dispatch("blocks", TransitionError::ParentRootMismatch)
        .await;

    let mut names = vec![recv(&mut rx).await.0, recv(&mut rx).await.0];
    names.sort_unstable();
    assert_eq!(names, vec!["A", "B"]);
    settle().await;
    assert_eq!(queues.count("q1"), 2);
    svc.shutdown().await.unwrap();
}

#[tokio::test]
async fn handler_on_missing_feed_is_rejected() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    let (tx, _rx) = mpsc::unbounded_channel::<(&'static str, Ev)>();

    let err = svc
        .register_handler("missing-feed", "q1", Collector::arc("h", tx))
        .unwrap_err();

    assert_eq!(
        err,
        NotifyError::FeedNotFound {
            feed: "missing-feed".into()
        }
    );
    assert!(!err.is_fatal());
    assert_eq!(svc.handler_count("missing-feed"), 0);
    assert!(!svc.has_feed("missing-feed"));
}

#[tokio::test]
async fn register_feed_twice_keeps_one_feed() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);

    svc.register_feed("blocks").unwrap();
    svc.register_feed("blocks").unwrap();
    svc.register_feed("deposits").unwrap();

    assert_eq!(
        svc.feed_names(),
        vec!["blocks".to_string(), "deposits".to_string()]
    );
}

#[tokio::test]
async fn same_handler_twice_on_same_queue_is_rejected() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    let (tx, _rx) = mpsc::unbounded_channel::<(&'static str, Ev)>();
    let h = Collector::arc("indexer", tx);

    svc.register_feed("blocks").unwrap();
    svc.register_handler("blocks", "q1", h.clone()).unwrap();
    let err = svc.register_handler("blocks", "q1", h).unwrap_err();

    assert_eq!(
        err,
        NotifyError::DuplicateBinding {
            feed: "blocks".into(),
            queue: "q1".into(),
            handler: "indexer".into(),
        }
    );
    assert_eq!(svc.handler_count("blocks"), 1);
}

#[tokio::test]
async fn registration_after_start_is_fatal() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    let (tx, _rx) = mpsc::unbounded_channel::<(&'static str, Ev)>();
    svc.register_feed("blocks").unwrap();
    svc.start().unwrap();

    let err = svc.register_feed("late").unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(
        err,
        NotifyError::InvalidLifecycle {
            op: "register feed",
            state: ServiceState::Running,
        }
    );
    assert!(!svc.has_feed("late"));

    let err = svc
        .register_handler("blocks", "q1", Collector::arc("late", tx))
        .unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(svc.handler_count("blocks"), 0);

    svc.shutdown().await.unwrap();
}

#[tokio::test]
async fn lifecycle_transitions() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    assert_eq!(svc.state(), ServiceState::Stopped);
    assert!(svc.status().is_ok());

    svc.start().unwrap();
    assert_eq!(svc.state(), ServiceState::Running);
    assert!(matches!(
        svc.start(),
        Err(NotifyError::InvalidLifecycle { op: "start", .. })
    ));

    svc.stop().unwrap();
    svc.stop().unwrap();
    assert_eq!(svc.state(), ServiceState::Halted);
    assert!(svc.status().is_ok());

    // Halted is terminal.
    assert!(matches!(
        svc.start(),
        Err(NotifyError::InvalidLifecycle {
            state: ServiceState::Halted,
            ..
        })
    ));
    assert!(svc.register_feed("again").unwrap_err().is_fatal());
}

#[tokio::test]
async fn stop_before_start_halts() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    svc.register_feed("blocks").unwrap();

    svc.stop().unwrap();
    assert_eq!(svc.state(), ServiceState::Halted);
    assert!(svc.start().is_err());
    assert_eq!(svc.dispatch("blocks", mismatch(1)).await, 0);
}

#[tokio::test]
async fn no_submissions_after_stop() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    let (tx, mut rx) = mpsc::unbounded_channel::<(&'static str, Ev)>();
    svc.register_feed("blocks").unwrap();
    svc.register_handler("blocks", "q1", Collector::arc("H", tx))
        .unwrap();
    svc.start().unwrap();

    svc.dispatch("blocks", mismatch(1)).await;
    recv(&mut rx).await;
    assert_eq!(queues.count("q1"), 1);

    svc.stop().unwrap();
    for got in 2..6 {
        assert_eq!(svc.dispatch("blocks", mismatch(got)).await, 0);
    }
    settle().await;

    assert_eq!(queues.count("q1"), 1);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn stop_is_safe_after_listeners_exited() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    let (tx, _rx) = mpsc::unbounded_channel::<(&'static str, Ev)>();
    svc.register_feed("blocks").unwrap();
    svc.register_handler("blocks", "q1", Collector::arc("H", tx))
        .unwrap();
    svc.start().unwrap();
    assert_eq!(svc.listener_count(), 1);

    assert!(svc.close_feed("blocks"));
    assert!(!svc.close_feed("unknown"));
    tokio::time::timeout(WAIT, async {
        while svc.listener_count() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(svc.dispatch("blocks", mismatch(3)).await, 0);
    svc.stop().unwrap();
    svc.shutdown().await.unwrap();
    assert!(queues.submissions().is_empty());
}

#[tokio::test]
async fn shutdown_waits_for_listeners() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    let (tx, _rx) = mpsc::unbounded_channel::<(&'static str, Ev)>();
    svc.register_feed("blocks").unwrap();
    svc.register_feed("deposits").unwrap();
    svc.register_handler("blocks", "q1", Collector::arc("a", tx.clone()))
        .unwrap();
    svc.register_handler("deposits", "q2", Collector::arc("b", tx))
        .unwrap();
    svc.start().unwrap();
    assert_eq!(svc.listener_count(), 2);

    // Listeners have not been polled yet; only waiting lets them observe the signal.
    svc.shutdown().await.unwrap();
    assert_eq!(svc.state(), ServiceState::Halted);
    assert_eq!(svc.listener_count(), 0);
}

#[tokio::test]
async fn zero_grace_shutdown_only_signals() {
    let queues = RecordingQueues::default();
    let cfg = Config {
        grace: Duration::ZERO,
        ..Config::default()
    };
    let svc: NotificationService<Ev> = NotificationService::new(cfg, Arc::new(queues.clone()));
    let (tx, _rx) = mpsc::unbounded_channel::<(&'static str, Ev)>();
    svc.register_feed("blocks").unwrap();
    svc.register_handler("blocks", "q1", Collector::arc("a", tx))
        .unwrap();
    svc.start().unwrap();

    svc.shutdown().await.unwrap();
    assert_eq!(svc.state(), ServiceState::Halted);
    assert_eq!(svc.listener_count(), 1);

    tokio::time::timeout(WAIT, async {
        while svc.listener_count() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn run_until_shuts_down_on_trigger() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    let (tx, mut rx) = mpsc::unbounded_channel::<(&'static str, Ev)>();
    svc.register_feed("blocks").unwrap();
    svc.register_handler("blocks", "q1", Collector::arc("H", tx))
        .unwrap();
    svc.start().unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let driver = async {
        assert_eq!(svc.dispatch("blocks", mismatch(4)).await, 1);
        assert_eq!(recv(&mut rx).await, ("H", mismatch(4)));
        assert_eq!(svc.state(), ServiceState::Running);
        stop_tx.send(()).unwrap();
    };
    let trigger = async {
        let _ = stop_rx.await;
    };

    let (res, ()) = tokio::join!(svc.run_until(trigger), driver);
    res.unwrap();
    assert_eq!(svc.state(), ServiceState::Halted);
    assert_eq!(svc.listener_count(), 0);
}

#[tokio::test]
async fn run_until_returns_once_already_stopped() {
    let queues = RecordingQueues::default();
    let svc = service(&queues);
    svc.register_feed("blocks").unwrap();
    svc.start().unwrap();
    svc.stop().unwrap();

    tokio::time::timeout(WAIT, svc.run_until(std::future::pending::<()>()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(svc.state(), ServiceState::Halted);
}

#[tokio::test]
async fn serial_dispatcher_preserves_order() {
    let dispatcher = Dispatcher::new();
    let svc: NotificationService<u64> =
        NotificationService::new(Config::default(), dispatcher.clone());
    let (tx, mut rx) = mpsc::unbounded_channel::<u64>();

    svc.register_feed("heights").unwrap();
    svc.register_handler(
        "heights",
        "ordered",
        HandlerFn::arc("ordered", move |h: &u64| {
            let h = *h;
            let tx = tx.clone();
            async move {
                tokio::task::yield_now().await;
                let _ = tx.send(h);
            }
        }),
    )
    .unwrap();
    svc.start().unwrap();

    for h in 0..20u64 {
        assert_eq!(svc.dispatch("heights", h).await, 1);
    }
    let mut seen = Vec::new();
    for _ in 0..20 {
        seen.push(recv(&mut rx).await);
    }
    assert_eq!(seen, (0..20).collect::<Vec<_>>());

    svc.shutdown().await.unwrap();
    dispatcher.shutdown(WAIT).await.unwrap();
}

#[tokio::test]
async fn slow_handler_does_not_block_dispatch() {
    let dispatcher = Dispatcher::new();
    dispatcher.register_queue("slow", QueueKind::Serial);
    dispatcher.register_queue("fast", QueueKind::Concurrent { limit: 4 });
    let svc: NotificationService<Ev> =
        NotificationService::new(Config::default(), dispatcher.clone());
    let (tx, mut rx) = mpsc::unbounded_channel::<(&'static str, Ev)>();

    svc.register_feed("errors").unwrap();
    svc.register_handler(
        "errors",
        "slow",
        HandlerFn::arc("slow", |_: &Ev| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }),
    )
    .unwrap();
    svc.register_handler("errors", "fast", Collector::arc("fast", tx))
        .unwrap();
    svc.start().unwrap();

    let evt = TransitionError::ExceedsBlockDepositLimit { count: 17, limit: 16 };
    for _ in 0..3 {
        let delivered = tokio::time::timeout(WAIT, svc.dispatch("errors", evt.clone()))
            .await
            .unwrap();
        assert_eq!(delivered, 2);
    }
    for _ in 0..3 {
        assert_eq!(recv(&mut rx).await, ("fast", evt.clone()));
    }

    svc.shutdown().await.unwrap();
    assert!(
        dispatcher
            .shutdown(Duration::from_millis(50))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn burst_on_slow_serial_queue_is_fully_handled() {
    let dispatcher = Dispatcher::new();
    let svc: NotificationService<u64> =
        NotificationService::new(Config::default(), dispatcher.clone());
    let ran = Arc::new(AtomicUsize::new(0));

    svc.register_feed("blocks").unwrap();
    let counter = Arc::clone(&ran);
    svc.register_handler(
        "blocks",
        "store",
        HandlerFn::arc("store", move |_: &u64| {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }),
    )
    .unwrap();
    svc.start().unwrap();

    for h in 0..50u64 {
        assert_eq!(svc.dispatch("blocks", h).await, 1);
    }
    tokio::time::timeout(WAIT, async {
        while ran.load(Ordering::SeqCst) < 50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    svc.shutdown().await.unwrap();
    dispatcher.shutdown(WAIT).await.unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 50);
}
