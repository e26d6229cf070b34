//! Diagnostic logging untuk driver.
//!
//! Aktifkan dengan `--features tracing`. Tanpa feature ini semua macro di bawah
//! menjadi no-op, jadi loop producer/consumer tidak membayar biaya logging.
//! Ring buffer sendiri tidak pernah logging.

/// Pasang subscriber `tracing` dengan timestamp uptime dan nama thread.
///
/// Output ditulis ke stderr; stdout tetap milik value yang di-echo consumer.
/// Filter default `spsc_ring=debug`, bisa di-override lewat `RUST_LOG`.
/// Tidak melakukan apa-apa jika feature `tracing` tidak aktif.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spsc_ring=debug"));

    // Panggilan kedua (misalnya dari beberapa test) memakai subscriber pertama.
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_names(true)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .try_init();
}

#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, info, warn};

#[cfg(not(feature = "tracing"))]
macro_rules! debug_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! info_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use debug_noop as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use info_noop as info;
#[cfg(not(feature = "tracing"))]
pub(crate) use warn_noop as warn;
