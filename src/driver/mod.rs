//! Periodic producer/consumer session over a `RingBuffer<u64, N>`
//!
//! Two fixed-rate threads:
//! - Producer pushes `0..iterations`, yielding and retrying while the ring is full
//! - Consumer polls once per period and checks every value arrives in order
//!
//! Both loops sleep to absolute deadlines (see [`clock`]), so their rates do
//! not drift with the work done per iteration.

pub mod clock;
mod config;
mod error;
mod report;

pub use clock::{LatenessSummary, PeriodicTimer, Timespec};
pub use config::{DriverConfig, MAX_LOOP_HZ};
pub use error::{DriverError, Result};
pub use report::DriverReport;

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

use crate::core::{Consumer, Producer, RingBuffer};
use crate::trace::{debug, info, warn};

#[derive(Debug, Default)]
struct ProducerStats {
    produced: u64,
    full_retries: u64,
    wakeups: LatenessSummary,
}

#[derive(Debug, Default)]
struct ConsumerStats {
    consumed: u64,
    empty_polls: u64,
    wakeups: LatenessSummary,
}

/// Raises the shared stop flag unless disarmed, so a failing or panicking
/// thread never leaves its peer waiting forever.
struct AbortOnExit<'a> {
    stop: &'a AtomicBool,
    armed: bool,
}

impl<'a> AbortOnExit<'a> {
    fn new(stop: &'a AtomicBool) -> Self {
        Self { stop, armed: true }
    }

    fn finish<T>(mut self, result: Result<T>) -> Result<T> {
        self.armed = result.is_err();
        result
    }
}

impl Drop for AbortOnExit<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.stop.store(true, Ordering::Release);
        }
    }
}

/// Runs one session on a ring of `N` slots and returns its statistics.
///
/// Fails with [`DriverError::Corruption`] as soon as the consumer sees a value
/// out of sequence.
pub fn run<const N: usize>(config: &DriverConfig) -> Result<DriverReport> {
    config.validate()?;

    let mut ring: RingBuffer<u64, N> = RingBuffer::new();
    let (producer, consumer) = ring.split();
    let stop = AtomicBool::new(false);

    info!(
        capacity = N,
        iterations = config.iterations,
        producer_hz = config.producer_hz,
        consumer_hz = config.consumer_hz,
        "starting session"
    );

    let start = Instant::now();
    let (produced, consumed) = thread::scope(|s| -> Result<(ProducerStats, ConsumerStats)> {
        let stop = &stop;

        let producer_handle = thread::Builder::new()
            .name("producer".into())
            .spawn_scoped(s, move || {
                let guard = AbortOnExit::new(stop);
                guard.finish(produce(producer, config, stop))
            })
            .map_err(|source| DriverError::Spawn {
                role: "producer",
                source,
            })?;

        let consumer_handle = match thread::Builder::new()
            .name("consumer".into())
            .spawn_scoped(s, move || {
                let guard = AbortOnExit::new(stop);
                guard.finish(consume(consumer, config, stop))
            }) {
            Ok(handle) => handle,
            Err(source) => {
                stop.store(true, Ordering::Release);
                let _ = producer_handle.join();
                return Err(DriverError::Spawn {
                    role: "consumer",
                    source,
                });
            }
        };

        let produced = join(producer_handle, "producer");
        let consumed = join(consumer_handle, "consumer");

        match (produced, consumed) {
            (Ok(p), Ok(c)) => Ok((p, c)),
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
            // Report the root cause, not the peer's abort
            (Err(pe), Err(ce)) => Err(if pe.is_aborted() { ce } else { pe }),
        }
    })?;

    let report = DriverReport {
        produced: produced.produced,
        consumed: consumed.consumed,
        full_retries: produced.full_retries,
        empty_polls: consumed.empty_polls,
        elapsed: start.elapsed(),
        producer_wakeups: produced.wakeups,
        consumer_wakeups: consumed.wakeups,
    };
    info!(
        consumed = report.consumed,
        full_retries = report.full_retries,
        "session finished"
    );
    Ok(report)
}

fn join<T>(handle: ScopedJoinHandle<'_, Result<T>>, role: &'static str) -> Result<T> {
    handle
        .join()
        .unwrap_or(Err(DriverError::ThreadPanicked { role }))
}

fn produce<const N: usize>(
    mut tx: Producer<'_, u64, N>,
    config: &DriverConfig,
    stop: &AtomicBool,
) -> Result<ProducerStats> {
    let mut timer = PeriodicTimer::new(config.producer_hz)?;
    let mut stats = ProducerStats::default();
    debug!(period_ns = timer.period_ns(), "producer running");

    for i in 0..config.iterations {
        timer.advance();

        // Ring full: let the consumer catch up
        while !tx.push(i) {
            if stop.load(Ordering::Acquire) {
                warn!(value = i, "producer stopped while ring full");
                return Err(DriverError::Aborted);
            }
            stats.full_retries += 1;
            thread::yield_now();
        }
        stats.produced += 1;

        if stop.load(Ordering::Acquire) {
            return Err(DriverError::Aborted);
        }
        timer.wait()?;
    }

    stats.wakeups = timer.summary();
    debug!(
        produced = stats.produced,
        full_retries = stats.full_retries,
        "producer done"
    );
    Ok(stats)
}

fn consume<const N: usize>(
    mut rx: Consumer<'_, u64, N>,
    config: &DriverConfig,
    stop: &AtomicBool,
) -> Result<ConsumerStats> {
    let mut timer = PeriodicTimer::new(config.consumer_hz)?;
    let mut stats = ConsumerStats::default();
    // Lock per echoed line, never across the loop
    let stdout = io::stdout();
    debug!(period_ns = timer.period_ns(), "consumer running");

    let mut expected = 0u64;
    let mut value = 0u64;

    while expected < config.iterations {
        if stop.load(Ordering::Acquire) {
            return Err(DriverError::Aborted);
        }
        timer.advance();

        if rx.pop(&mut value) {
            if value != expected {
                warn!(expected, actual = value, "out of sequence value");
                return Err(DriverError::Corruption {
                    expected,
                    actual: value,
                });
            }
            if config.echo {
                writeln!(stdout.lock(), "{}", value).map_err(DriverError::Output)?;
            }
            expected += 1;
            stats.consumed += 1;
        } else {
            stats.empty_polls += 1;
        }

        timer.wait()?;
    }

    if config.echo {
        stdout.lock().flush().map_err(DriverError::Output)?;
    }
    stats.wakeups = timer.summary();
    debug!(
        consumed = stats.consumed,
        empty_polls = stats.empty_polls,
        "consumer done"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast(iterations: u64) -> DriverConfig {
        DriverConfig {
            iterations,
            producer_hz: 200_000,
            consumer_hz: 200_000,
            echo: false,
        }
    }

    #[test]
    fn test_short_session_delivers_everything() {
        let report = run::<64>(&fast(2_000)).unwrap();
        assert_eq!(report.produced, 2_000);
        assert_eq!(report.consumed, 2_000);
        assert!(report.producer_wakeups.samples > 0);
    }

    #[test]
    fn test_slow_consumer_forces_full_retries() {
        let config = DriverConfig {
            iterations: 200,
            producer_hz: 1_000_000,
            consumer_hz: 20_000,
            echo: false,
        };
        let report = run::<4>(&config).unwrap();
        assert_eq!(report.consumed, 200);
        assert!(report.full_retries > 0);
    }

    #[test]
    fn test_invalid_config_is_rejected_before_start() {
        let config = DriverConfig {
            producer_hz: 0,
            ..fast(10)
        };
        assert!(matches!(
            run::<8>(&config),
            Err(DriverError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_abort_guard_sets_stop_on_error() {
        let stop = AtomicBool::new(false);
        let ok: Result<()> = AbortOnExit::new(&stop).finish(Ok(()));
        assert!(ok.is_ok());
        assert!(!stop.load(Ordering::Acquire));

        let failed: Result<()> = AbortOnExit::new(&stop).finish(Err(DriverError::Aborted));
        assert!(failed.is_err());
        assert!(stop.load(Ordering::Acquire));
    }

    #[test]
    fn test_producer_gives_up_when_peer_stops() {
        let mut ring: RingBuffer<u64, 2> = RingBuffer::new();
        let (tx, _rx) = ring.split();
        let stop = AtomicBool::new(true);
        // First push lands, then the raised flag ends the loop.
        let err = produce(tx, &fast(5), &stop).unwrap_err();
        assert!(err.is_aborted());
    }

    #[test]
    fn test_consumer_detects_out_of_sequence_value() {
        let mut ring: RingBuffer<u64, 8> = RingBuffer::new();
        let (mut tx, rx) = ring.split();
        assert!(tx.push(0));
        assert!(tx.push(2));
        let stop = AtomicBool::new(false);

        let err = consume(rx, &fast(3), &stop).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Corruption {
                expected: 1,
                actual: 2
            }
        ));
    }
}
