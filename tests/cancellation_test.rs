use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use strand::{CancellationSource, CancellationToken, ContinuationTask, Error, ThreadPool};

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[test]
fn test_cancel_is_broadcast_to_every_token() {
    init_tracing();
    let source = CancellationSource::new();
    let tokens: Vec<CancellationToken> = (0..8).map(|_| source.token()).collect();

    assert!(tokens.iter().all(|t| !t.is_canceled()));

    source.cancel();

    assert!(tokens.iter().all(|t| t.is_canceled()));
    // A token issued after the fact observes the same state.
    assert!(source.token().is_canceled());
}

#[test]
fn test_cancel_observed_from_another_thread() {
    init_tracing();
    let source = CancellationSource::new();
    let token = source.token();

    let observer = thread::spawn(move || {
        while !token.is_canceled() {
            thread::sleep(Duration::from_millis(10));
        }
        true
    });

    thread::sleep(Duration::from_millis(100));
    source.cancel();

    assert!(observer.join().unwrap());
}

#[test]
fn test_cancel_before_dispatch_skips_the_work_unit() {
    init_tracing();
    let pool = Arc::new(ThreadPool::new(1));
    let source = CancellationSource::new();

    let executed = Arc::new(AtomicBool::new(false));
    let task = {
        let executed = executed.clone();
        ContinuationTask::with_token(
            pool.clone(),
            move || executed.store(true, Ordering::SeqCst),
            source.token(),
        )
    };

    // The task sits in the not-yet-started pool's queue; cancel wins.
    source.cancel();
    pool.start().unwrap();

    assert!(task.future().wait_for(Duration::from_secs(60)));
    pool.stop();

    assert!(matches!(task.future().take(), Err(Error::Canceled)));
    assert!(!executed.load(Ordering::SeqCst));

    // The canceled skip is an engine signal, not a fault.
    assert!(pool.pop_errors().is_empty());
}

#[test]
fn test_cancel_before_construction_avoids_the_pool_entirely() {
    init_tracing();
    // Never started: a skipped task must not need the pool at all.
    let pool = Arc::new(ThreadPool::new(1));
    let source = CancellationSource::new();
    source.cancel();

    let executed = Arc::new(AtomicBool::new(false));
    let task = {
        let executed = executed.clone();
        ContinuationTask::with_token(
            pool.clone(),
            move || executed.store(true, Ordering::SeqCst),
            source.token(),
        )
    };

    assert!(task.future().is_ready());
    assert!(matches!(task.future().take(), Err(Error::Canceled)));
    assert!(!executed.load(Ordering::SeqCst));
}

#[test]
fn test_cancel_during_execution_is_cooperative() {
    init_tracing();
    let pool = Arc::new(ThreadPool::new(1));
    pool.start().unwrap();

    let source = CancellationSource::new();
    let (started_tx, started_rx) = bounded::<()>(1);
    let observed = Arc::new(AtomicBool::new(false));

    let task = {
        let observed = observed.clone();
        ContinuationTask::cancelable(
            pool.clone(),
            move |token| {
                started_tx.send(()).unwrap();
                for _ in 0..600 {
                    if token.is_canceled() {
                        observed.store(true, Ordering::SeqCst);
                        return;
                    }
                    thread::sleep(Duration::from_millis(100));
                }
            },
            source.token(),
        )
    };

    started_rx.recv_timeout(Duration::from_secs(30)).unwrap();
    source.cancel();

    // The unit polls every 100ms; ten polls is ample.
    assert!(task.future().wait_for(Duration::from_millis(1000)));
    assert!(observed.load(Ordering::SeqCst));

    // The unit exited normally, so the engine must not have injected the
    // canceled error.
    assert!(task.future().take().is_ok());

    pool.stop();
}

#[test]
fn test_cancel_propagates_to_waiting_descendants() {
    init_tracing();
    let pool = Arc::new(ThreadPool::new(1));
    pool.start().unwrap();

    let source = CancellationSource::new();
    let (started_tx, started_rx) = bounded::<()>(1);
    let (release_tx, release_rx) = bounded::<()>(1);

    let root = ContinuationTask::with_token(
        pool.clone(),
        move || {
            started_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        },
        source.token(),
    );

    let child_ran = Arc::new(AtomicBool::new(false));
    let child = {
        let child_ran = child_ran.clone();
        root.continue_with(move || child_ran.store(true, Ordering::SeqCst))
    };
    let grandchild = child.continue_with(|| {});

    started_rx.recv_timeout(Duration::from_secs(30)).unwrap();
    source.cancel();
    release_tx.send(()).unwrap();

    // The root was already executing: it finishes normally.
    assert!(root.future().wait_for(Duration::from_secs(60)));
    assert!(root.future().take().is_ok());

    // The whole waiting subtree completes with the canceled error instead
    // of running.
    assert!(matches!(child.future().take(), Err(Error::Canceled)));
    assert!(matches!(grandchild.future().take(), Err(Error::Canceled)));
    assert!(!child_ran.load(Ordering::SeqCst));

    pool.stop();
    assert!(pool.pop_errors().is_empty());
}

#[test]
fn test_children_inherit_the_parent_token() {
    init_tracing();
    let pool = Arc::new(ThreadPool::new(1));
    let source = CancellationSource::new();

    // A fulfilled root propagates its token to children appended later.
    let root = ContinuationTask::fulfilled_with_token(pool.clone(), source.token());
    source.cancel();

    let executed = Arc::new(AtomicBool::new(false));
    let child = {
        let executed = executed.clone();
        root.continue_with(move || executed.store(true, Ordering::SeqCst))
    };

    // Dispatched immediately (the root is ready) and skipped immediately;
    // the never-started pool proves no worker was involved.
    assert!(matches!(child.future().take(), Err(Error::Canceled)));
    assert!(!executed.load(Ordering::SeqCst));
}
