//! Write-cycle state machine.
//!
//! Sequences one bus write at a time:
//! - Setup: data and RS are driven from the latch, Enable low
//! - Hold: Enable high for the pulse width
//! - Recovery: Enable low again, new requests refused until the
//!   countdown loaded from the [`DelayClassifier`] has drained
//!
//! The controller is clocked in two phases. [`BusController::evaluate`]
//! computes the next registers from the current ones without mutating
//! anything, and [`BusController::commit`] installs them at the tick
//! boundary. [`BusController::tick`] does both for standalone use.

use tracing::{debug, trace};

use crate::delay::{ConstantDelay, DelayClassifier};
use crate::timing::Timing;
use crate::Word;

/// Phase of the write cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// Waiting for a request, or recovering from the previous write.
    #[default]
    Idle,
    /// Data and RS stable, Enable not yet raised.
    Setup,
    /// Enable raised.
    Hold,
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerState::Idle => write!(f, "idle"),
            ControllerState::Setup => write!(f, "setup"),
            ControllerState::Hold => write!(f, "hold"),
        }
    }
}

/// Request lines driven into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusInputs {
    /// Word to write when `start` is accepted.
    pub request: Word,
    /// Request strobe.
    pub start: bool,
}

/// Output lines of the controller for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pins {
    /// Parallel data lines D0-D7.
    pub data: u8,
    /// Register select (high for character data).
    pub rs: bool,
    /// Enable strobe.
    pub enable: bool,
    /// Handshake: a request presented now would be accepted.
    pub ready: bool,
}

impl Pins {
    /// Returns the word currently driven on the data and RS lines.
    pub fn word(&self) -> Word {
        if self.rs {
            Word::character(self.data)
        } else {
            Word::instruction(self.data)
        }
    }
}

/// Register contents of the controller.
///
/// Produced by [`BusController::evaluate`] and consumed by
/// [`BusController::commit`]; opaque to everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Registers {
    state: ControllerState,
    countdown: u32,
    latch: Word,
}

/// HD44780 write-cycle controller.
#[derive(Debug, Clone)]
pub struct BusController<D = ConstantDelay> {
    regs: Registers,
    timing: Timing,
    classifier: D,
}

impl<D: DelayClassifier> BusController<D> {
    /// Creates a controller in its power-on state: idle, no pending delay.
    pub fn new(timing: Timing, classifier: D) -> Self {
        Self {
            regs: Registers::default(),
            timing,
            classifier,
        }
    }

    /// Returns the current phase.
    pub fn state(&self) -> ControllerState {
        self.regs.state
    }

    /// Returns the remaining ticks of the current phase.
    pub fn countdown(&self) -> u32 {
        self.regs.countdown
    }

    /// Returns the word being (or last) written.
    pub fn latch(&self) -> Word {
        self.regs.latch
    }

    /// Returns true when the controller is idle with no recovery pending.
    pub fn is_settled(&self) -> bool {
        self.regs.state == ControllerState::Idle && self.regs.countdown == 0
    }

    /// Handshake output for the given `start` level.
    pub fn ready(&self, start: bool) -> bool {
        self.is_settled() && !start
    }

    /// Enable is high exactly while in the hold phase.
    pub fn enable(&self) -> bool {
        self.regs.state == ControllerState::Hold
    }

    /// Output lines for this tick.
    pub fn pins(&self, start: bool) -> Pins {
        Pins {
            data: self.regs.latch.data(),
            rs: self.regs.latch.mode().rs(),
            enable: self.enable(),
            ready: self.ready(start),
        }
    }

    /// Computes the registers for the next tick.
    pub fn evaluate(&self, inputs: BusInputs) -> Registers {
        let regs = self.regs;
        let ticked = regs.countdown.saturating_sub(1);
        let mut next = Registers {
            countdown: ticked,
            ..regs
        };

        match regs.state {
            ControllerState::Idle => {
                if inputs.start && regs.countdown == 0 {
                    next.state = ControllerState::Setup;
                    next.countdown = self.timing.setup_ticks();
                    next.latch = inputs.request;
                }
            }
            ControllerState::Setup => {
                if ticked == 0 {
                    next.state = ControllerState::Hold;
                    next.countdown = self.timing.hold_ticks();
                }
            }
            ControllerState::Hold => {
                if ticked == 0 {
                    next.state = ControllerState::Idle;
                    next.countdown = self.classifier.delay_for(regs.latch);
                }
            }
        }

        next
    }

    /// Installs registers computed by [`evaluate`](Self::evaluate).
    pub fn commit(&mut self, next: Registers) {
        match (self.regs.state, next.state) {
            (ControllerState::Idle, ControllerState::Setup) => {
                trace!("Accepted {} ({})", next.latch, next.latch.mode());
            }
            (ControllerState::Hold, ControllerState::Idle) => {
                debug!(
                    "Wrote {} ({}), recovering for {} ticks",
                    next.latch,
                    next.latch.mode(),
                    next.countdown
                );
            }
            (from, to) if from != to => trace!("Controller {} -> {}", from, to),
            _ => {}
        }
        self.regs = next;
    }

    /// Advances one tick and returns the outputs seen during it.
    pub fn tick(&mut self, inputs: BusInputs) -> Pins {
        let pins = self.pins(inputs.start);
        let next = self.evaluate(inputs);
        self.commit(next);
        pins
    }
}
