//! Table replay into the bus controller.

use tracing::info;

use super::table::InitTable;
use crate::controller::BusInputs;
use crate::Word;

/// Register contents of the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequencerRegisters {
    cursor: usize,
    request: Word,
    start: bool,
}

/// Feeds an [`InitTable`] to the controller one word at a time.
///
/// `start` is a registered output: it goes high for the tick after `ready`
/// was seen, together with the word to write, and drops again on the next
/// tick. The controller holds `ready` low while `start` is high, so a word is
/// never issued twice.
#[derive(Debug, Clone)]
pub struct InitSequencer {
    table: InitTable,
    regs: SequencerRegisters,
}

impl InitSequencer {
    /// Creates a sequencer positioned at the start of `table`.
    pub fn new(table: InitTable) -> Self {
        Self {
            table,
            regs: SequencerRegisters::default(),
        }
    }

    /// Returns the table being replayed.
    pub fn table(&self) -> &InitTable {
        &self.table
    }

    /// Returns the index of the next word to issue.
    pub fn cursor(&self) -> usize {
        self.regs.cursor
    }

    /// Returns true once every word has been issued.
    pub fn is_complete(&self) -> bool {
        self.regs.cursor >= self.table.len()
    }

    /// Request lines driven into the controller this tick.
    pub fn outputs(&self) -> BusInputs {
        BusInputs {
            request: self.regs.request,
            start: self.regs.start,
        }
    }

    /// Computes the registers for the next tick given the controller's `ready`.
    pub fn evaluate(&self, ready: bool) -> SequencerRegisters {
        let regs = self.regs;
        match self.table.get(regs.cursor) {
            Some(word) if ready => SequencerRegisters {
                cursor: regs.cursor + 1,
                request: word,
                start: true,
            },
            _ => SequencerRegisters {
                start: false,
                ..regs
            },
        }
    }

    /// Installs registers computed by [`evaluate`](Self::evaluate).
    pub fn commit(&mut self, next: SequencerRegisters) {
        let len = self.table.len();
        if self.regs.cursor < len && next.cursor == len {
            info!("Initialization sequence issued ({} words)", len);
        }
        self.regs = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(seq: &mut InitSequencer, ready: bool) -> BusInputs {
        let next = seq.evaluate(ready);
        seq.commit(next);
        seq.outputs()
    }

    #[test]
    fn test_power_on_state() {
        let seq = InitSequencer::new(InitTable::standard());
        assert_eq!(seq.cursor(), 0);
        assert!(!seq.is_complete());
        assert!(!seq.outputs().start);
    }

    #[test]
    fn test_waits_for_ready() {
        let mut seq = InitSequencer::new(InitTable::standard());
        for _ in 0..10 {
            assert!(!step(&mut seq, false).start);
        }
        assert_eq!(seq.cursor(), 0);

        let out = step(&mut seq, true);
        assert!(out.start);
        assert_eq!(out.request, Word::instruction(0x38));
        assert_eq!(seq.cursor(), 1);

        // Start lasts one tick; the request word stays on the lines.
        let out = step(&mut seq, false);
        assert!(!out.start);
        assert_eq!(out.request, Word::instruction(0x38));
    }

    #[test]
    fn test_issues_in_order_and_stops() {
        let table = InitTable::with_greeting(&["ok"]);
        let mut seq = InitSequencer::new(table.clone());

        let mut issued = Vec::new();
        for _ in 0..(table.len() + 5) {
            let out = step(&mut seq, true);
            if out.start {
                issued.push(out.request);
            }
        }
        assert_eq!(issued, table.words());
        assert!(seq.is_complete());
        assert_eq!(seq.cursor(), table.len());
    }

    #[test]
    fn test_empty_table_is_complete() {
        let mut seq = InitSequencer::new(InitTable::from_words([]));
        assert!(seq.is_complete());
        assert!(!step(&mut seq, true).start);
        assert_eq!(seq.cursor(), 0);
    }
}
