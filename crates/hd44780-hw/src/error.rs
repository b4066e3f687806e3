//! Error types for the HD44780 driver library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when building or running the driver.
#[derive(Error, Debug)]
pub enum Error {
    /// A timing parameter is outside its allowed range.
    #[error("Invalid timing: {name} must be nonzero, got {value}")]
    InvalidTiming { name: &'static str, value: u32 },

    /// Raw value does not fit in a 9-bit word.
    #[error("Word out of range (must be <= 0x1FF): {0:#05X}")]
    WordOutOfRange(u16),

    /// The run did not settle within the allowed number of ticks.
    #[error("Initialization did not complete within {budget} ticks")]
    TickBudgetExceeded { budget: u64 },

    /// A trace timestamp does not fit in the waveform's time unit.
    #[error("Timestamp overflow at tick {tick}")]
    TimestampOverflow { tick: u64 },

    /// Trace output I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
