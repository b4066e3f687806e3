//! Recovery delay classification.
//!
//! After Enable falls the display stays busy for a command-dependent time.
//! The controller asks a [`DelayClassifier`] how long to wait before it
//! accepts the next word.

use crate::timing::{micros_to_ticks, DEFAULT_CLOCK_HZ, DEFAULT_RECOVERY_US};
use crate::Word;

/// Maps a just-written word to the ticks the display needs to recover.
pub trait DelayClassifier {
    /// Returns the recovery time for `word`, in ticks.
    fn delay_for(&self, word: Word) -> u32;
}

impl<F> DelayClassifier for F
where
    F: Fn(Word) -> u32,
{
    fn delay_for(&self, word: Word) -> u32 {
        self(word)
    }
}

/// Applies the same worst-case delay to every word.
///
/// Clear and return-home are the slowest instructions on the HD44780; waiting
/// that long after every write is always safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantDelay {
    ticks: u32,
}

impl Default for ConstantDelay {
    fn default() -> Self {
        Self::from_micros(DEFAULT_RECOVERY_US, DEFAULT_CLOCK_HZ)
    }
}

impl ConstantDelay {
    /// Creates a classifier returning `ticks` for every word.
    pub const fn new(ticks: u32) -> Self {
        Self { ticks }
    }

    /// Creates a classifier from a duration at the given clock rate.
    pub fn from_micros(micros: u32, clock_hz: u32) -> Self {
        Self::new(micros_to_ticks(micros, clock_hz))
    }

    /// Returns the configured delay.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}

impl DelayClassifier for ConstantDelay {
    fn delay_for(&self, _word: Word) -> u32 {
        self.ticks
    }
}
