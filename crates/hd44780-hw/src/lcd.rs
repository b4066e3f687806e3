//! Top-level HD44780 driver.
//!
//! Connects an [`InitSequencer`] to a [`BusController`] and clocks both from
//! the same tick. Each tick first evaluates both components against the
//! current registers and only then commits, so neither sees the other's
//! next state early.

use tracing::debug;

use crate::controller::{BusController, Pins};
use crate::delay::{ConstantDelay, DelayClassifier};
use crate::sequencer::{InitSequencer, InitTable};
use crate::timing::Timing;
use crate::trace::Trace;
use crate::{Error, Result};

/// Outcome of [`Lcd::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks elapsed during the run.
    pub ticks: u64,
    /// Words issued from the init table.
    pub words: usize,
}

/// Character LCD driver replaying its init table at power-on.
#[derive(Debug, Clone)]
pub struct Lcd<D = ConstantDelay> {
    sequencer: InitSequencer,
    controller: BusController<D>,
    ticks: u64,
}

impl Lcd<ConstantDelay> {
    /// Creates a driver with the standard timing and worst-case delay.
    pub fn with_table(table: InitTable) -> Self {
        Self::new(table, Timing::default(), ConstantDelay::default())
    }
}

impl<D: DelayClassifier> Lcd<D> {
    /// Creates a driver in its power-on state.
    pub fn new(table: InitTable, timing: Timing, classifier: D) -> Self {
        Self {
            sequencer: InitSequencer::new(table),
            controller: BusController::new(timing, classifier),
            ticks: 0,
        }
    }

    /// Returns the number of ticks since power-on.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns the sequencer.
    pub fn sequencer(&self) -> &InitSequencer {
        &self.sequencer
    }

    /// Returns the bus controller.
    pub fn controller(&self) -> &BusController<D> {
        &self.controller
    }

    /// Pin levels for the current tick.
    pub fn pins(&self) -> Pins {
        self.controller.pins(self.sequencer.outputs().start)
    }

    /// Returns true once every table word has been handed to the controller.
    pub fn is_initialized(&self) -> bool {
        self.sequencer.is_complete()
    }

    /// Returns true once every word has been written and the last recovery
    /// delay has elapsed.
    pub fn is_settled(&self) -> bool {
        self.is_initialized() && self.controller.ready(self.sequencer.outputs().start)
    }

    /// Advances one tick and returns the pin levels seen during it.
    pub fn tick(&mut self) -> Pins {
        let inputs = self.sequencer.outputs();
        let pins = self.controller.pins(inputs.start);

        let controller_next = self.controller.evaluate(inputs);
        let sequencer_next = self.sequencer.evaluate(pins.ready);

        self.controller.commit(controller_next);
        self.sequencer.commit(sequencer_next);
        self.ticks += 1;

        pins
    }

    /// Ticks until settled, recording every tick into `trace`.
    ///
    /// Fails if more than `budget` ticks would be needed.
    pub fn run(&mut self, budget: u64, trace: &mut Trace) -> Result<RunSummary> {
        let started = self.ticks;

        while !self.is_settled() {
            if self.ticks - started >= budget {
                return Err(Error::TickBudgetExceeded { budget });
            }
            let tick = self.ticks;
            let pins = self.tick();
            trace.record(tick, pins);
        }
        // Settled levels, so the trace ends with the bus ready.
        trace.finish(self.ticks, self.pins());

        let summary = RunSummary {
            ticks: self.ticks - started,
            words: self.sequencer.cursor(),
        };
        debug!(
            "Run settled after {} ticks ({} words)",
            summary.ticks, summary.words
        );
        Ok(summary)
    }
}
