//! SPSC Demo Binary
//!
//! Runs a fixed-rate producer and consumer over a 512-slot ring buffer.
//! The consumer checks that values arrive as an unbroken 0, 1, 2, ...
//! sequence and aborts on the first gap.
//!
//! Usage:
//!   cargo run --release --bin spsc_demo -- [OPTIONS]

use spsc_ring::driver::{self, DriverConfig};

/// Typical microcontroller queue size
const BUFFER_SIZE: usize = 1 << 9;

fn parse_args() -> DriverConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = DriverConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--iterations" | "-n" => {
                if i + 1 < args.len() {
                    config.iterations = args[i + 1].parse().unwrap_or(config.iterations);
                    i += 1;
                }
            }
            "--producer-hz" => {
                if i + 1 < args.len() {
                    config.producer_hz = args[i + 1].parse().unwrap_or(config.producer_hz);
                    i += 1;
                }
            }
            "--consumer-hz" => {
                if i + 1 < args.len() {
                    config.consumer_hz = args[i + 1].parse().unwrap_or(config.consumer_hz);
                    i += 1;
                }
            }
            "--hz" => {
                if i + 1 < args.len() {
                    if let Ok(hz) = args[i + 1].parse() {
                        config.producer_hz = hz;
                        config.consumer_hz = hz;
                    }
                    i += 1;
                }
            }
            "--quiet" | "-q" => {
                config.echo = false;
            }
            "--help" | "-h" => {
                println!("spsc_demo - periodic producer/consumer over a lock-free ring\n");
                println!("Usage: spsc_demo [OPTIONS]\n");
                println!("Options:");
                println!("  -n, --iterations <N>    Values to transfer (default: 1000000)");
                println!("      --producer-hz <HZ>  Producer loop rate (default: 100000)");
                println!("      --consumer-hz <HZ>  Consumer loop rate (default: 100000)");
                println!("      --hz <HZ>           Set both loop rates");
                println!("  -q, --quiet             Do not echo consumed values");
                println!("  -h, --help              Show this help");
                println!("\nSet RUST_LOG when built with --features tracing.");
                std::process::exit(0);
            }
            other => {
                eprintln!("⚠️  Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    config
}

fn main() {
    let config = parse_args();
    spsc_ring::trace::init_tracing();

    eprintln!("🚀 SPSC ring demo");
    eprintln!("   Capacity:    {} ({} usable)", BUFFER_SIZE, BUFFER_SIZE - 1);
    eprintln!("   Iterations:  {}", config.iterations);
    eprintln!(
        "   Loop rates:  producer {} Hz, consumer {} Hz",
        config.producer_hz, config.consumer_hz
    );

    match driver::run::<BUFFER_SIZE>(&config) {
        Ok(report) => {
            report.print();
            println!("\n✅ All {} values received in order", report.consumed);
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}
