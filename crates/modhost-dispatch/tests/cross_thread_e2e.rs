//! End-to-end thread-affinity tests for the dispatcher.
//!
//! The test thread plays the main thread (it owns the pump); a spawned
//! thread plays the background owner that ticks the dispatcher; further
//! spawned threads play producers. Verifies:
//!
//! 1. Local actions run on the owner thread, in FIFO order.
//! 2. Hand-off actions never run on the owner thread and all eventually
//!    run, in order, on the thread that pumps.
//! 3. Disposal from a producer thread silences both queues.

use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;

use modhost_dispatch::{Dispatcher, MainThreadPump};

type Log = Arc<Mutex<Vec<(usize, ThreadId)>>>;

fn record(log: &Log, tag: usize) {
    log.lock().push((tag, thread::current().id()));
}

#[test]
fn local_actions_run_on_the_owner_thread() {
    let pump = MainThreadPump::new();
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(pump.handle())));
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    for i in 0..3 {
        let log = Arc::clone(&log);
        dispatcher.enqueue_local(move || record(&log, i));
    }

    let owner = thread::spawn({
        let dispatcher = Arc::clone(&dispatcher);
        move || {
            dispatcher.tick(Duration::from_millis(16));
            thread::current().id()
        }
    });
    let owner_id = owner.join().unwrap();

    let entries = log.lock().clone();
    assert_eq!(entries.len(), 3);
    for (i, (tag, tid)) in entries.iter().enumerate() {
        assert_eq!(*tag, i);
        assert_eq!(*tid, owner_id);
    }
}

#[test]
fn handoff_actions_run_only_on_the_main_thread_in_order() {
    let pump = MainThreadPump::new();
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(pump.handle())));
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let main_id = thread::current().id();

    // Producer thread enqueues three main-thread actions.
    thread::spawn({
        let dispatcher = Arc::clone(&dispatcher);
        let log = Arc::clone(&log);
        move || {
            for i in 0..3 {
                let log = Arc::clone(&log);
                dispatcher.enqueue_main_thread(move || record(&log, i));
            }
        }
    })
    .join()
    .unwrap();

    // Owner thread ticks once; none of the three may run there.
    thread::spawn({
        let dispatcher = Arc::clone(&dispatcher);
        move || dispatcher.tick(Duration::from_millis(16))
    })
    .join()
    .unwrap();
    assert!(log.lock().is_empty(), "hand-off work ran off the main thread");

    // Main thread pumps: exactly one hand-off unit, draining all three.
    assert_eq!(pump.pump(), 1);

    let entries = log.lock().clone();
    assert_eq!(entries.len(), 3);
    for (i, (tag, tid)) in entries.iter().enumerate() {
        assert_eq!(*tag, i);
        assert_eq!(*tid, main_id);
    }
}

#[test]
fn dispose_from_another_thread_silences_both_queues() {
    let pump = MainThreadPump::new();
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(pump.handle())));
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    for i in 0..2 {
        let log2 = Arc::clone(&log);
        dispatcher.enqueue_local(move || record(&log2, i));
        let log2 = Arc::clone(&log);
        dispatcher.enqueue_main_thread(move || record(&log2, 10 + i));
    }

    thread::spawn({
        let dispatcher = Arc::clone(&dispatcher);
        move || dispatcher.dispose()
    })
    .join()
    .unwrap();

    dispatcher.tick(Duration::from_millis(16));
    pump.pump();

    assert!(log.lock().is_empty());
    assert!(dispatcher.is_disposed());
}

#[test]
fn interleaved_ticks_and_pumps_preserve_per_queue_fifo() {
    let pump = MainThreadPump::new();
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(pump.handle())));
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    for round in 0..4 {
        for i in 0..5 {
            let log = Arc::clone(&log);
            dispatcher.enqueue_main_thread(move || record(&log, round * 5 + i));
        }
        thread::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            move || dispatcher.tick(Duration::from_millis(16))
        })
        .join()
        .unwrap();
        pump.pump();
    }

    let tags: Vec<usize> = log.lock().iter().map(|(tag, _)| *tag).collect();
    assert_eq!(tags, (0..20).collect::<Vec<_>>());
}
