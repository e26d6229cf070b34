//! End-to-end driver sessions at high loop rates.

use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use spsc_ring::driver::{self, DriverConfig, DriverError};

#[test]
fn test_balanced_rates() {
    let config = DriverConfig {
        iterations: 5_000,
        producer_hz: 100_000,
        consumer_hz: 100_000,
        echo: false,
    };
    let report = driver::run::<512>(&config).unwrap();

    assert_eq!(report.produced, 5_000);
    assert_eq!(report.consumed, 5_000);
    // 5000 periods of 10 us at the producer
    assert!(report.elapsed.as_millis() >= 50);
    assert_eq!(report.producer_wakeups.samples, 5_000);
    assert!(report.consumer_wakeups.samples >= 5_000);
    assert!(report.throughput() > 0.0);
}

#[test]
fn test_fast_consumer_polls_empty() {
    let config = DriverConfig {
        iterations: 500,
        producer_hz: 10_000,
        consumer_hz: 200_000,
        echo: false,
    };
    let report = driver::run::<8>(&config).unwrap();

    assert_eq!(report.consumed, 500);
    assert!(report.empty_polls > 0);
}

#[test]
fn test_rejects_bad_rate() {
    let config = DriverConfig {
        consumer_hz: 0,
        ..DriverConfig::default()
    };
    let err = driver::run::<512>(&config).unwrap_err();
    assert!(matches!(err, DriverError::InvalidConfig { .. }));
    assert!(err.to_string().contains("consumer_hz"));
}

/// Runs `sessions` short sessions on a helper thread and reports how many
/// finished within `limit`.
fn sessions_within(sessions: usize, limit: Duration) -> usize {
    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        let config = DriverConfig {
            iterations: 200,
            producer_hz: 100_000,
            consumer_hz: 100_000,
            echo: false,
        };
        for _ in 0..sessions {
            let report = driver::run::<8>(&config).unwrap();
            if done_tx.send(report.consumed).is_err() {
                return;
            }
        }
    });

    let mut finished = 0;
    while finished < sessions {
        match done_rx.recv_timeout(limit) {
            Ok(consumed) => {
                assert_eq!(consumed, 200);
                finished += 1;
            }
            Err(_) => break,
        }
    }
    finished
}

#[test]
fn test_quiet_session_ignores_held_stdout() {
    // Nothing may touch stdout when echo is off.
    let stdout = io::stdout();
    let _held = stdout.lock();
    assert_eq!(sessions_within(3, Duration::from_secs(10)), 3);
}

#[cfg(feature = "tracing")]
#[test]
fn test_sessions_finish_with_tracing_enabled() {
    spsc_ring::trace::init_tracing();
    assert_eq!(sessions_within(30, Duration::from_secs(10)), 30);
}
