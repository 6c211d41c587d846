//! Integration Test: Adaptive Delay Envelope
//!
//! Exercises the perturbation controller through the shadow-state API the
//! instrumentation layer uses: sweep coverage, volume-driven relaxation,
//! and race-driven collapse.

use krepis_sentinel::{AccessKind, DelayConfig, Epoch, LocationShadow, ThreadId};
use std::sync::Arc;
use std::time::Duration;

fn new_shadow() -> LocationShadow {
    LocationShadow::new(AccessKind::Write, Epoch::new(ThreadId(0), 1))
}

#[test]
fn test_sweep_covers_whole_envelope_then_wraps() {
    let shadow = new_shadow();

    for exp in 0..=7u32 {
        let delay = shadow.next_delay();
        assert_eq!(delay.duration, Duration::from_millis(1 << exp));
        assert_eq!(delay.sweep_complete, exp == 7, "at exponent {exp}");
    }

    let delay = shadow.next_delay();
    assert_eq!(delay.duration, Duration::from_millis(1));
    assert!(!delay.sweep_complete);
}

#[test]
fn test_access_volume_shortens_the_sweep() {
    let shadow = new_shadow();

    // 16 guarded accesses: the upper bound relaxes 7 -> 6 -> 5
    for _ in 0..16 {
        shadow.record_guarded_access();
    }
    assert_eq!(shadow.delay_snapshot().upper_bound, 5);

    // A full sweep now tops out at 2^5 = 32ms
    let mut longest = Duration::ZERO;
    loop {
        let delay = shadow.next_delay();
        longest = longest.max(delay.duration);
        if delay.sweep_complete {
            break;
        }
    }
    assert_eq!(longest, Duration::from_millis(32));
}

#[test]
fn test_confirmed_race_caps_all_future_delays() {
    let shadow = new_shadow();

    // Escalate a bit first
    for _ in 0..5 {
        shadow.next_delay();
    }

    shadow.confirm_race();
    assert!(shadow.race_confirmed());

    // Every delay from now on fits the collapsed envelope, and volume
    // cannot widen it again
    for _ in 0..32 {
        let delay = shadow.next_delay();
        assert!(delay.duration <= Duration::from_millis(4));
        shadow.record_guarded_access();
    }
    assert_eq!(shadow.delay_snapshot().upper_bound, 2);
}

#[test]
fn test_custom_envelope() {
    let shadow = LocationShadow::with_delay_config(
        AccessKind::Write,
        Epoch::new(ThreadId(0), 1),
        DelayConfig {
            lower_bound: 1,
            initial_upper_bound: 3,
            upper_bound_floor: 1,
            unit: Duration::from_micros(50),
        },
    );

    // Exponents sweep 1..=3, so delays are 100, 200, 400 microseconds,
    // then the envelope wraps
    let expected = [100u64, 200, 400, 100];
    for (i, micros) in expected.into_iter().enumerate() {
        let delay = shadow.next_delay();
        assert_eq!(delay.duration, Duration::from_micros(micros));
        assert_eq!(delay.sweep_complete, i == 2);
    }
}

#[test]
fn test_concurrent_sampling_stays_inside_envelope() {
    const THREADS: usize = 4;
    const SAMPLES: usize = 200;

    let shadow = Arc::new(new_shadow());

    std::thread::scope(|scope| {
        for _ in 0..THREADS {
            let shadow = Arc::clone(&shadow);
            scope.spawn(move || {
                for _ in 0..SAMPLES {
                    let delay = shadow.next_delay();
                    assert!(delay.duration >= Duration::from_millis(1));
                    assert!(delay.duration <= Duration::from_millis(128));
                }
            });
        }
    });

    let snap = shadow.delay_snapshot();
    assert!(snap.exponent >= snap.lower_bound && snap.exponent <= snap.upper_bound);
}

#[test]
fn test_marker_and_delay_state_are_independent() {
    let shadow = new_shadow();

    shadow.mark_unguarded_access();
    assert!(shadow.accessed_by_unguarded());

    // The diagnostic marker does not feed the envelope
    assert_eq!(shadow.delay_snapshot().guarded_accesses, 0);
    assert_eq!(shadow.delay_snapshot().upper_bound, 7);
}
