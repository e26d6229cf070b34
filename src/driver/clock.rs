//! Monotonic clock with absolute-deadline sleeps
//!
//! Periodic loops advance a deadline by a fixed period and sleep until it,
//! so time spent working does not push later wakeups back. On Linux this is
//! `clock_nanosleep(CLOCK_MONOTONIC, TIMER_ABSTIME)`; elsewhere it falls back
//! to `Instant` + `thread::sleep`.

use hdrhistogram::Histogram;

use super::error::{DriverError, Result};

pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Lateness above this is clamped when recorded (one minute).
const MAX_TRACKED_LATENESS_NS: u64 = 60 * NANOS_PER_SEC;

/// Point on the monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timespec {
    pub sec: i64,
    pub nsec: i64,
}

impl Timespec {
    pub const fn new(sec: i64, nsec: i64) -> Self {
        Self { sec, nsec }
    }

    /// Carries whole seconds out of `nsec` so that `nsec < 1e9`.
    pub fn normalize(&mut self) {
        while self.nsec >= NANOS_PER_SEC as i64 {
            self.nsec -= NANOS_PER_SEC as i64;
            self.sec += 1;
        }
    }

    pub fn add_nanos(&mut self, nanos: u64) {
        self.sec += (nanos / NANOS_PER_SEC) as i64;
        self.nsec += (nanos % NANOS_PER_SEC) as i64;
        self.normalize();
    }

    /// Signed distance `self - earlier` in nanoseconds.
    pub fn nanos_since(&self, earlier: &Timespec) -> i64 {
        (self.sec - earlier.sec) * NANOS_PER_SEC as i64 + (self.nsec - earlier.nsec)
    }
}

#[cfg(target_os = "linux")]
mod sys {
    use super::Timespec;
    use std::io;
    use std::ptr;

    pub fn now() -> io::Result<Timespec> {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `ts` is a valid, writable timespec.
        let rc = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Timespec::new(ts.tv_sec as i64, ts.tv_nsec as i64))
    }

    pub fn sleep_until(deadline: &Timespec) -> io::Result<()> {
        let ts = libc::timespec {
            tv_sec: deadline.sec as libc::time_t,
            tv_nsec: deadline.nsec as _,
        };
        loop {
            // SAFETY: `ts` is valid for the call, remaining-time output unused
            // with TIMER_ABSTIME.
            let rc = unsafe {
                libc::clock_nanosleep(
                    libc::CLOCK_MONOTONIC,
                    libc::TIMER_ABSTIME,
                    &ts,
                    ptr::null_mut(),
                )
            };
            match rc {
                0 => return Ok(()),
                // Absolute deadline: just sleep again
                libc::EINTR => continue,
                errno => return Err(io::Error::from_raw_os_error(errno)),
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod sys {
    use super::{Timespec, NANOS_PER_SEC};
    use std::io;
    use std::sync::OnceLock;
    use std::time::{Duration, Instant};

    fn origin() -> Instant {
        static ORIGIN: OnceLock<Instant> = OnceLock::new();
        *ORIGIN.get_or_init(Instant::now)
    }

    pub fn now() -> io::Result<Timespec> {
        let elapsed = origin().elapsed();
        Ok(Timespec::new(
            elapsed.as_secs() as i64,
            elapsed.subsec_nanos() as i64,
        ))
    }

    pub fn sleep_until(deadline: &Timespec) -> io::Result<()> {
        let remaining = deadline.nanos_since(&now()?);
        if remaining > 0 {
            let remaining = remaining as u64;
            std::thread::sleep(Duration::new(
                remaining / NANOS_PER_SEC,
                (remaining % NANOS_PER_SEC) as u32,
            ));
        }
        Ok(())
    }
}

/// Current monotonic time.
pub fn now() -> Result<Timespec> {
    sys::now().map_err(DriverError::Clock)
}

/// Sleeps until `deadline`; returns at once if it already passed.
pub fn sleep_until(deadline: &Timespec) -> Result<()> {
    sys::sleep_until(deadline).map_err(DriverError::Clock)
}

/// Wakeup lateness percentiles, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatenessSummary {
    pub samples: u64,
    pub p50_ns: u64,
    pub p99_ns: u64,
    pub max_ns: u64,
}

/// Fixed-rate loop pacing.
///
/// Call [`advance`](Self::advance) at the top of each iteration and
/// [`wait`](Self::wait) at the bottom.
pub struct PeriodicTimer {
    period_ns: u64,
    next_wake: Timespec,
    lateness: Histogram<u64>,
}

impl PeriodicTimer {
    /// `hz` must be in `1..=1e9`; the first deadline starts from now.
    pub fn new(hz: u64) -> Result<Self> {
        if hz == 0 || hz > NANOS_PER_SEC {
            return Err(DriverError::invalid(
                "hz",
                format!("{} Hz is outside 1..={}", hz, NANOS_PER_SEC),
            ));
        }
        let lateness = Histogram::new_with_bounds(1, MAX_TRACKED_LATENESS_NS, 3)?;

        Ok(Self {
            period_ns: NANOS_PER_SEC / hz,
            next_wake: now()?,
            lateness,
        })
    }

    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }

    pub fn deadline(&self) -> Timespec {
        self.next_wake
    }

    pub fn advance(&mut self) {
        self.next_wake.add_nanos(self.period_ns);
    }

    /// Sleeps until the current deadline and records how late the wakeup was.
    pub fn wait(&mut self) -> Result<()> {
        sleep_until(&self.next_wake)?;
        let late = now()?.nanos_since(&self.next_wake).max(0) as u64;
        self.lateness.saturating_record(late);
        Ok(())
    }

    pub fn summary(&self) -> LatenessSummary {
        if self.lateness.is_empty() {
            return LatenessSummary::default();
        }
        LatenessSummary {
            samples: self.lateness.len(),
            p50_ns: self.lateness.value_at_quantile(0.50),
            p99_ns: self.lateness.value_at_quantile(0.99),
            max_ns: self.lateness.max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_carries_seconds() {
        let mut ts = Timespec::new(3, 2_500_000_000);
        ts.normalize();
        assert_eq!(ts, Timespec::new(5, 500_000_000));

        let mut exact = Timespec::new(0, 1_000_000_000);
        exact.normalize();
        assert_eq!(exact, Timespec::new(1, 0));
    }

    #[test]
    fn test_add_nanos() {
        let mut ts = Timespec::new(10, 999_999_990);
        ts.add_nanos(20);
        assert_eq!(ts, Timespec::new(11, 10));

        ts.add_nanos(3 * NANOS_PER_SEC + 5);
        assert_eq!(ts, Timespec::new(14, 15));
    }

    #[test]
    fn test_nanos_since_is_signed() {
        let a = Timespec::new(2, 100);
        let b = Timespec::new(1, 999_999_900);
        assert_eq!(a.nanos_since(&b), 200);
        assert_eq!(b.nanos_since(&a), -200);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let first = now().unwrap();
        let second = now().unwrap();
        assert!(second >= first);
    }

    #[test]
    fn test_sleep_until_past_deadline_returns() {
        let mut past = now().unwrap();
        past.sec -= 1;
        sleep_until(&past).unwrap();
    }

    #[test]
    fn test_timer_paces_loop() {
        let mut timer = PeriodicTimer::new(10_000).unwrap();
        assert_eq!(timer.period_ns(), 100_000);

        let start = timer.deadline();
        for _ in 0..20 {
            timer.advance();
            timer.wait().unwrap();
        }
        let end = now().unwrap();
        // 20 periods of 100 us
        assert!(end.nanos_since(&start) >= 2_000_000);
        assert_eq!(timer.deadline().nanos_since(&start), 2_000_000);

        let summary = timer.summary();
        assert_eq!(summary.samples, 20);
        assert!(summary.p50_ns <= summary.max_ns);
    }

    #[test]
    fn test_timer_rejects_bad_rate() {
        assert!(PeriodicTimer::new(0).is_err());
        assert!(PeriodicTimer::new(NANOS_PER_SEC + 1).is_err());
    }
}
