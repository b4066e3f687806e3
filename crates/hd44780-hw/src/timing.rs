//! Write-cycle timing parameters.
//!
//! All values are in clock ticks of the controller's clock domain.

use crate::{Error, Result};

/// Ticks the data and RS lines are held stable before Enable rises.
pub const SETUP_TICKS: u32 = 5;

/// Ticks Enable stays high.
pub const HOLD_TICKS: u32 = 20;

/// Default clock rate of the controller.
pub const DEFAULT_CLOCK_HZ: u32 = 50_000_000;

/// Worst-case recovery time after any write, in microseconds.
pub const DEFAULT_RECOVERY_US: u32 = 5_000;

/// Setup and hold phases of one write cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    setup_ticks: u32,
    hold_ticks: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            setup_ticks: SETUP_TICKS,
            hold_ticks: HOLD_TICKS,
        }
    }
}

impl Timing {
    /// Creates a timing configuration.
    ///
    /// Both phases need at least one tick so that every write produces a
    /// visible Enable pulse.
    pub fn new(setup_ticks: u32, hold_ticks: u32) -> Result<Self> {
        if setup_ticks == 0 {
            return Err(Error::InvalidTiming {
                name: "setup_ticks",
                value: setup_ticks,
            });
        }
        if hold_ticks == 0 {
            return Err(Error::InvalidTiming {
                name: "hold_ticks",
                value: hold_ticks,
            });
        }
        Ok(Self {
            setup_ticks,
            hold_ticks,
        })
    }

    /// Returns the setup phase length.
    pub fn setup_ticks(&self) -> u32 {
        self.setup_ticks
    }

    /// Returns the hold phase length (Enable pulse width).
    pub fn hold_ticks(&self) -> u32 {
        self.hold_ticks
    }
}

/// Converts a duration in microseconds to ticks at `clock_hz`, rounding up.
pub fn micros_to_ticks(micros: u32, clock_hz: u32) -> u32 {
    let ticks = (u64::from(micros) * u64::from(clock_hz)).div_ceil(1_000_000);
    u32::try_from(ticks).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing() {
        let timing = Timing::default();
        assert_eq!(timing.setup_ticks(), 5);
        assert_eq!(timing.hold_ticks(), 20);
    }

    #[test]
    fn test_zero_phase_rejected() {
        assert!(matches!(
            Timing::new(0, 20),
            Err(Error::InvalidTiming {
                name: "setup_ticks",
                value: 0
            })
        ));
        assert!(matches!(
            Timing::new(5, 0),
            Err(Error::InvalidTiming {
                name: "hold_ticks",
                ..
            })
        ));
        assert_eq!(Timing::new(1, 1).unwrap().hold_ticks(), 1);
    }

    #[test]
    fn test_micros_to_ticks() {
        assert_eq!(micros_to_ticks(DEFAULT_RECOVERY_US, DEFAULT_CLOCK_HZ), 250_000);
        assert_eq!(micros_to_ticks(1, 1_000_000), 1);
        // Partial ticks round up so the delay is never shorter than asked.
        assert_eq!(micros_to_ticks(1, 1_500_000), 2);
        assert_eq!(micros_to_ticks(0, DEFAULT_CLOCK_HZ), 0);
    }
}
