//! Driver configuration

use super::error::{DriverError, Result};

/// Upper bound for a loop rate: one wakeup per nanosecond.
pub const MAX_LOOP_HZ: u64 = 1_000_000_000;

/// Producer/consumer session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Values pushed by the producer (`0..iterations`)
    pub iterations: u64,
    /// Producer loop rate in Hz
    pub producer_hz: u64,
    /// Consumer loop rate in Hz
    pub consumer_hz: u64,
    /// Print every consumed value to stdout
    pub echo: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            iterations: 1_000_000,
            producer_hz: 100_000,
            consumer_hz: 100_000,
            echo: true,
        }
    }
}

impl DriverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(DriverError::invalid("iterations", "must be at least 1"));
        }
        validate_hz("producer_hz", self.producer_hz)?;
        validate_hz("consumer_hz", self.consumer_hz)?;
        Ok(())
    }
}

fn validate_hz(parameter: &'static str, hz: u64) -> Result<()> {
    if hz == 0 || hz > MAX_LOOP_HZ {
        return Err(DriverError::invalid(
            parameter,
            format!("{} Hz is outside 1..={}", hz, MAX_LOOP_HZ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = DriverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.iterations, 1_000_000);
        assert_eq!(config.producer_hz, 100_000);
        assert!(config.echo);
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let config = DriverConfig {
            iterations: 0,
            ..DriverConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            DriverError::InvalidConfig {
                parameter: "iterations",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_out_of_range_rates() {
        let zero = DriverConfig {
            consumer_hz: 0,
            ..DriverConfig::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(DriverError::InvalidConfig {
                parameter: "consumer_hz",
                ..
            })
        ));

        let too_fast = DriverConfig {
            producer_hz: MAX_LOOP_HZ + 1,
            ..DriverConfig::default()
        };
        assert!(too_fast.validate().is_err());

        let fastest = DriverConfig {
            producer_hz: MAX_LOOP_HZ,
            consumer_hz: MAX_LOOP_HZ,
            ..DriverConfig::default()
        };
        assert!(fastest.validate().is_ok());
    }
}
