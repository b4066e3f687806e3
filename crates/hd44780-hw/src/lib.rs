//! HD44780 Write-Cycle Driver
//!
//! Clock-accurate model of a character LCD driver: a write-cycle state
//! machine enforcing setup, hold and recovery times on an 8-bit parallel bus,
//! and a sequencer replaying a fixed initialization table into it at
//! power-on.

pub mod controller;
pub mod delay;
pub mod error;
pub mod lcd;
pub mod sequencer;
pub mod timing;
pub mod trace;
pub mod word;

pub use controller::{BusController, BusInputs, ControllerState, Pins};
pub use delay::{ConstantDelay, DelayClassifier};
pub use error::{Error, Result};
pub use lcd::{Lcd, RunSummary};
pub use sequencer::{InitSequencer, InitTable};
pub use timing::Timing;
pub use trace::{Trace, WriteRecord};
pub use word::{Mode, Word};

/// Default tick budget for a full initialization replay, in ticks.
///
/// Generous enough for a full two-line greeting at the default timing.
pub const DEFAULT_TICK_BUDGET: u64 = 100_000_000;
