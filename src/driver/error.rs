//! Error types for the producer/consumer driver

use std::io;

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, DriverError>;

/// Everything that can end a driver session early.
///
/// Full and empty ring conditions are not errors; they are handled by the
/// loops themselves.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Rejected configuration value
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidConfig {
        parameter: &'static str,
        message: String,
    },

    /// Reading the monotonic clock or sleeping on it failed
    #[error("Clock error: {0}")]
    Clock(#[source] io::Error),

    /// Producer or consumer thread could not be started
    #[error("Failed to spawn {role} thread: {source}")]
    Spawn {
        role: &'static str,
        #[source]
        source: io::Error,
    },

    /// Writing echoed values to stdout failed
    #[error("Output error: {0}")]
    Output(#[source] io::Error),

    /// Consumer saw a value out of sequence
    #[error("Data corrupted: expected {expected}, got {actual}")]
    Corruption { expected: u64, actual: u64 },

    /// Stopped because the peer thread failed
    #[error("Session aborted by peer thread")]
    Aborted,

    /// A worker thread panicked
    #[error("{role} thread panicked")]
    ThreadPanicked { role: &'static str },

    /// Wakeup histogram could not be created
    #[error("Histogram error: {0}")]
    Histogram(#[from] hdrhistogram::CreationError),
}

impl DriverError {
    pub(crate) fn invalid(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            parameter,
            message: message.into(),
        }
    }

    /// True for the secondary error a thread reports after its peer failed.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}
