//! Session statistics

use std::time::Duration;

use super::clock::LatenessSummary;

/// What a producer/consumer session did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverReport {
    /// Values accepted by `push`
    pub produced: u64,
    /// Values popped and verified in order
    pub consumed: u64,
    /// `push` attempts rejected because the ring was full
    pub full_retries: u64,
    /// Consumer wakeups that found the ring empty
    pub empty_polls: u64,
    pub elapsed: Duration,
    pub producer_wakeups: LatenessSummary,
    pub consumer_wakeups: LatenessSummary,
}

impl DriverReport {
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.consumed as f64 / secs
        } else {
            0.0
        }
    }

    pub fn print(&self) {
        println!("\n📊 Session Stats ({:.2}s)", self.elapsed.as_secs_f64());
        println!("   Produced:      {}", self.produced);
        println!(
            "   Consumed:      {} ({:.1}/sec)",
            self.consumed,
            self.throughput()
        );
        if self.full_retries > 0 {
            println!("   Full retries:  {} ⚠️", self.full_retries);
        }
        println!("   Empty polls:   {}", self.empty_polls);
        print_wakeups("Producer", &self.producer_wakeups);
        print_wakeups("Consumer", &self.consumer_wakeups);
    }
}

fn print_wakeups(role: &str, summary: &LatenessSummary) {
    println!(
        "   {} wake lateness: p50 {:.2} μs, p99 {:.2} μs, max {:.2} μs ({} samples)",
        role,
        summary.p50_ns as f64 / 1000.0,
        summary.p99_ns as f64 / 1000.0,
        summary.max_ns as f64 / 1000.0,
        summary.samples
    );
}
