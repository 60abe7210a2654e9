//! Concurrency tests: claim races, a live producer against parked readers,
//! and a sustained interleaved push/pop run across every reader slot.

use std::sync::Barrier;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use spinel_fanout::{FanoutRing, MAX_CONSUMERS, RingConfig};

#[test]
fn concurrent_claims_hand_out_each_slot_once() {
    let ring = FanoutRing::<u64>::new(RingConfig::new(8));
    let start = Barrier::new(2 * MAX_CONSUMERS);
    let raced = Barrier::new(2 * MAX_CONSUMERS);
    let granted = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..2 * MAX_CONSUMERS {
            s.spawn(|| {
                start.wait();
                let claim = ring.attach();
                if claim.is_ok() {
                    granted.fetch_add(1, Ordering::Relaxed);
                }
                // No slot is released until every thread has attempted.
                raced.wait();
                drop(claim);
            });
        }
    });

    assert_eq!(granted.load(Ordering::Relaxed), MAX_CONSUMERS);
    // Every slot went back to the pool afterwards.
    let readers: Vec<_> = (0..MAX_CONSUMERS).map(|_| ring.attach().unwrap()).collect();
    drop(readers);
}

#[test]
fn wake_all_reaches_every_parked_reader() {
    let ring = FanoutRing::<u64>::new(RingConfig::new(8));
    let mut writer = ring.writer();

    thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let mut reader = ring.attach().unwrap();
                s.spawn(move || {
                    reader.wait_nonempty();
                    reader.try_pop()
                })
            })
            .collect();

        // Let both readers park, then publish one sample and broadcast.
        thread::sleep(Duration::from_millis(50));
        writer.push(99);
        writer.wake_readers();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(99));
        }
    });
}

/// Payload with the push sequence replicated across four lanes. A copy torn
/// by a concurrent overwrite would leave the lanes disagreeing, which the
/// ring must never let escape a successful pop.
type Tagged = [u64; 4];

#[test]
fn interleaved_push_pop_never_delivers_torn_or_reordered_samples() {
    const PUSHES: u64 = 200_000;

    let ring = FanoutRing::<Tagged>::new(RingConfig::new(32));
    let mut writer = ring.writer();
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        for _ in 0..MAX_CONSUMERS {
            let mut reader = ring.attach().unwrap();
            let done = &done;
            s.spawn(move || {
                let mut last: Option<u64> = None;
                let mut popped = 0u64;
                loop {
                    match reader.try_pop() {
                        Some(v) => {
                            assert!(
                                v[1] == v[0] && v[2] == v[0] && v[3] == v[0],
                                "torn sample escaped: {v:?}"
                            );
                            assert!(v[0] < PUSHES, "sample was never pushed: {v:?}");
                            if let Some(prev) = last {
                                assert!(v[0] > prev, "pop order went backwards");
                            }
                            last = Some(v[0]);
                            popped += 1;
                        }
                        None => {
                            if done.load(Ordering::Acquire) && reader.is_empty() {
                                break;
                            }
                            std::hint::spin_loop();
                        }
                    }
                }
                assert!(popped > 0, "reader starved completely");
                // Once the producer stops, every reader drains to the
                // newest sample regardless of how often it was lapped.
                assert_eq!(last, Some(PUSHES - 1));
            });
        }

        for seq in 0..PUSHES {
            writer.push([seq; 4]);
            if seq % 64 == 0 {
                writer.wake_readers();
            }
        }
        done.store(true, Ordering::Release);
        writer.wake_readers();
    });
}
