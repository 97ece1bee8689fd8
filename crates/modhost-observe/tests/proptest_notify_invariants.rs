//! Property-based invariant tests for notification delivery.
//!
//! Verifies structural guarantees that must hold for any subscriber count
//! and edit sequence:
//!
//! 1. K subscribers and M edits of the bound instance produce exactly
//!    K * M deliveries, each subscriber seeing every field in edit order.
//! 2. Edits interleaved across a bound instance and an unbound sibling
//!    notify for the bound edits only.
//! 3. Unbinding at any point silences every later edit.

use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;

use modhost_observe::ObserverRegistry;

#[derive(Debug, Clone, Default)]
struct Counters {
    a: u32,
    b: u32,
}

const FIELDS: [&str; 2] = ["a", "b"];

fn edit(settings: &modhost_observe::Shared<Counters>, field_idx: usize) {
    match field_idx {
        0 => settings.set("a", |s| s.a += 1),
        _ => settings.set("b", |s| s.b += 1),
    }
}

proptest! {
    #[test]
    fn every_subscriber_sees_every_edit_in_order(
        k in 0usize..6,
        edits in proptest::collection::vec(0usize..2, 0..24),
    ) {
        let registry = ObserverRegistry::new();
        let settings = registry.share(Counters::default());
        let watcher = registry.bind(&settings).unwrap();

        let logs: Vec<Arc<Mutex<Vec<&'static str>>>> =
            (0..k).map(|_| Arc::new(Mutex::new(Vec::new()))).collect();
        let _subs: Vec<_> = logs
            .iter()
            .map(|log| {
                let log = Arc::clone(log);
                watcher.subscribe(move |note| log.lock().push(note.field))
            })
            .collect();

        for &field_idx in &edits {
            edit(&settings, field_idx);
        }

        let expected: Vec<&'static str> =
            edits.iter().map(|&idx| FIELDS[idx]).collect();
        for log in &logs {
            prop_assert_eq!(&*log.lock(), &expected);
        }
    }

    #[test]
    fn sibling_edits_never_notify(
        plan in proptest::collection::vec((any::<bool>(), 0usize..2), 0..24),
    ) {
        let registry = ObserverRegistry::new();
        let bound = registry.share(Counters::default());
        let sibling = registry.share(Counters::default());
        let watcher = registry.bind(&bound).unwrap();

        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let _sub = watcher.subscribe(move |note| sink.lock().push(note.field));

        let mut expected = Vec::new();
        for &(on_bound, field_idx) in &plan {
            if on_bound {
                edit(&bound, field_idx);
                expected.push(FIELDS[field_idx]);
            } else {
                edit(&sibling, field_idx);
            }
        }

        prop_assert_eq!(&*log.lock(), &expected);
    }

    #[test]
    fn unbind_silences_all_later_edits(
        before in 0usize..12,
        after in 0usize..12,
    ) {
        let registry = ObserverRegistry::new();
        let settings = registry.share(Counters::default());
        let watcher = registry.bind(&settings).unwrap();

        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let _sub = watcher.subscribe(move |note| sink.lock().push(note.field));

        for _ in 0..before {
            edit(&settings, 0);
        }
        watcher.unbind();
        for _ in 0..after {
            edit(&settings, 1);
        }

        prop_assert_eq!(log.lock().len(), before);
    }
}
