//! spsc-ring - wait-free single-producer single-consumer ring buffer
//!
//! Architecture:
//! - `core`: fixed-capacity lock-free ring buffer and its role handles
//! - `driver`: periodic producer/consumer session with absolute-deadline
//!   wakeups and sequence checking
//! - `trace`: feature-gated diagnostic logging
//!
//! ```
//! use spsc_ring::RingBuffer;
//!
//! let mut ring: RingBuffer<u64, 8> = RingBuffer::new();
//! let (mut tx, mut rx) = ring.split();
//!
//! assert!(tx.push(42));
//! let mut out = 0;
//! assert!(rx.pop(&mut out));
//! assert_eq!(out, 42);
//! ```

pub mod core;
pub mod driver;
pub mod trace;

pub use crate::core::{Consumer, Producer, RingBuffer};
