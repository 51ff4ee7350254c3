//! Registry behavior under concurrent starts and stops.

mod fixtures;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::unbounded;

use hotbackup::SessionRegistry;

use fixtures::session::{operator, primary_harness, start_line};

#[test]
fn parallel_sessions_balance_the_count() {
    const WORKERS: usize = 8;
    let h = primary_harness();
    let coordinator = Arc::new(h.coordinator);
    let (tx, rx) = unbounded();

    thread::scope(|scope| {
        for worker in 0..WORKERS {
            let coordinator = Arc::clone(&coordinator);
            let tx = tx.clone();
            scope.spawn(move || {
                let started = coordinator
                    .start_backup(&operator(), &format!("worker-{worker}"), true)
                    .expect("start");
                tx.send(started.artifact).expect("send artifact");
            });
        }
    });
    drop(tx);

    assert_eq!(coordinator.active_sessions(), WORKERS);
    // Nothing wrote WAL between the starts, so they all shared one
    // checkpoint pass and one start position.
    assert_eq!(h.engine.checkpoint_passes(), 1);
    let artifacts: Vec<String> = rx.into_iter().collect();
    assert_eq!(artifacts.len(), WORKERS);
    for artifact in &artifacts {
        assert_eq!(start_line(artifact), start_line(&artifacts[0]));
    }

    thread::scope(|scope| {
        for artifact in &artifacts {
            let coordinator = Arc::clone(&coordinator);
            scope.spawn(move || {
                coordinator
                    .stop_backup(&operator(), artifact)
                    .expect("stop");
            });
        }
    });
    assert_eq!(coordinator.active_sessions(), 0);
}

#[test]
fn start_stop_storm_settles_at_zero() {
    const WORKERS: usize = 6;
    const ROUNDS: usize = 25;
    let h = primary_harness();
    let coordinator = Arc::new(h.coordinator);

    thread::scope(|scope| {
        for worker in 0..WORKERS {
            let coordinator = Arc::clone(&coordinator);
            scope.spawn(move || {
                for round in 0..ROUNDS {
                    let started = coordinator
                        .start_backup(&operator(), &format!("w{worker}-r{round}"), false)
                        .expect("start");
                    let stopped = coordinator
                        .stop_backup(&operator(), &started.artifact)
                        .expect("stop");
                    assert!(stopped.stop.lsn > started.session.label.start.lsn);
                }
            });
        }
    });

    assert_eq!(coordinator.active_sessions(), 0);
}

#[test]
fn sampled_counts_stay_within_live_sessions() {
    const WORKERS: usize = 4;
    const ROUNDS: usize = 20;
    let h = primary_harness();
    let coordinator = Arc::new(h.coordinator);
    let done = Arc::new(AtomicBool::new(false));

    thread::scope(|scope| {
        let sampler = {
            let registry = coordinator.registry().clone();
            let done = Arc::clone(&done);
            scope.spawn(move || {
                let mut max_seen = 0usize;
                while !done.load(Ordering::Acquire) {
                    max_seen = max_seen.max(registry.active());
                    thread::yield_now();
                }
                max_seen
            })
        };

        let workers: Vec<_> = (0..WORKERS)
            .map(|worker| {
                let coordinator = Arc::clone(&coordinator);
                scope.spawn(move || {
                    for round in 0..ROUNDS {
                        let started = coordinator
                            .start_backup(&operator(), &format!("s{worker}-{round}"), true)
                            .expect("start");
                        coordinator
                            .stop_backup(&operator(), &started.artifact)
                            .expect("stop");
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker");
        }
        done.store(true, Ordering::Release);

        // Each worker keeps at most one session open, so a sample above
        // WORKERS would mean a leaked or double-counted entry.
        let max_seen = sampler.join().expect("sampler");
        assert!(
            max_seen <= WORKERS,
            "sampled {max_seen} active sessions with only {WORKERS} workers"
        );
    });
    assert_eq!(coordinator.active_sessions(), 0);
}

#[test]
fn tokens_release_across_threads() {
    let registry = SessionRegistry::new();
    let (tx, rx) = unbounded();

    thread::scope(|scope| {
        let entry_registry = registry.clone();
        scope.spawn(move || {
            for _ in 0..16 {
                tx.send(entry_registry.enter()).expect("send token");
            }
        });

        let leave_registry = registry.clone();
        scope.spawn(move || {
            for token in rx {
                leave_registry.leave(token);
            }
        });
    });

    assert_eq!(registry.active(), 0);
}
