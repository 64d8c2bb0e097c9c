//! Tests for the runner's synchronization primitives used together

use prometheus_job_runner::{AbortSignal, CompletionLatch, ConcurrencyGate, FailureCounter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

#[test]
fn test_gate_counter_and_latch_compose() {
    let gate = ConcurrencyGate::new(2).unwrap();
    let failures = FailureCounter::new();
    let latch = CompletionLatch::new(10);
    let inside = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);

    thread::scope(|s| {
        for i in 0..10 {
            let permit = gate.acquire();
            let (failures, latch, inside, peak) = (&failures, &latch, &inside, &peak);
            s.spawn(move || {
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(1));
                if i % 3 == 0 {
                    failures.record_failure();
                }
                inside.fetch_sub(1, Ordering::SeqCst);
                drop(permit);
                latch.count_down();
            });
        }
        latch.wait();
    });

    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(failures.current_count(), 4);
    assert_eq!(latch.remaining(), 0);
    assert_eq!(gate.available(), 2);
}

#[test]
fn test_abort_signal_after_threshold() {
    let failures = FailureCounter::new();
    let signal = AbortSignal::new();

    for _ in 0..3 {
        failures.record_failure();
        if failures.exceeds(1) {
            signal.trip();
        }
    }

    assert!(signal.is_tripped());
    assert!(!signal.trip());
}
