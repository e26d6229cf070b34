//! Core module: wait-free SPSC ring buffer
//!
//! Prinsip desain:
//! - Lock-Free: Hanya atomic load/store, tidak ada Mutex/RwLock
//! - No-Allocation: Buffer dialokasikan sekali saat init
//! - Wait-Free: `push`/`pop` tidak pernah loop, block, atau retry

mod ring_buffer;

pub use ring_buffer::{Consumer, Producer, RingBuffer};
