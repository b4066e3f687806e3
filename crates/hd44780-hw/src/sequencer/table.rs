//! Initialization table.
//!
//! Instruction codes follow the HD44780 datasheet:
//! - 0x38: function set, 8-bit bus, two lines, 5x8 font
//! - 0x0C: display on, cursor off, blink off
//! - 0x01: clear display
//! - 0x06: entry mode, increment, no shift
//! - 0x80: set DDRAM address 0x00 (first line)
//! - 0xC0: set DDRAM address 0x40 (second line)

use tracing::warn;

use crate::Word;

/// Function set: 8-bit bus, two lines, 5x8 font.
pub const FUNCTION_SET: u8 = 0x38;

/// Display on, cursor off, blink off.
pub const DISPLAY_ON: u8 = 0x0C;

/// Clear display.
pub const CLEAR_DISPLAY: u8 = 0x01;

/// Entry mode: cursor increments, display does not shift.
pub const ENTRY_MODE: u8 = 0x06;

/// Set DDRAM address to the start of the first line.
pub const FIRST_LINE: u8 = 0x80;

/// Set DDRAM address to the start of the second line.
pub const SECOND_LINE: u8 = 0xC0;

/// Characters per display line.
pub const LINE_CAPACITY: usize = 16;

/// Display lines addressable by the greeting.
pub const MAX_LINES: usize = 2;

/// Power-on instruction sequence.
pub const STANDARD_INIT: [u8; 5] = [
    FUNCTION_SET,
    DISPLAY_ON,
    CLEAR_DISPLAY,
    ENTRY_MODE,
    FIRST_LINE,
];

/// Fixed, ordered list of words replayed at power-on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitTable {
    words: Vec<Word>,
}

impl InitTable {
    /// The power-on instruction sequence without any text.
    pub fn standard() -> Self {
        Self::from_words(STANDARD_INIT.iter().copied().map(Word::instruction))
    }

    /// The power-on sequence followed by up to two lines of greeting text.
    ///
    /// Over-long lines are truncated and extra lines dropped; both are
    /// logged and neither is an error.
    pub fn with_greeting<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut table = Self::standard();

        if lines.len() > MAX_LINES {
            warn!(
                "Dropping {} greeting line(s), display has {} lines",
                lines.len() - MAX_LINES,
                MAX_LINES
            );
        }

        for (index, line) in lines.iter().take(MAX_LINES).enumerate() {
            // The standard sequence already leaves the cursor on line one.
            if index == 1 {
                table.words.push(Word::instruction(SECOND_LINE));
            }
            table.words.extend(encode_line(line.as_ref()));
        }

        table
    }

    /// Builds a table from arbitrary words.
    pub fn from_words(words: impl IntoIterator<Item = Word>) -> Self {
        Self {
            words: words.into_iter().collect(),
        }
    }

    /// Returns all words in replay order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Returns the word at `index`, if any.
    pub fn get(&self, index: usize) -> Option<Word> {
        self.words.get(index).copied()
    }

    /// Returns the number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if there is nothing to replay.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Encodes one line of text as character words, at most [`LINE_CAPACITY`].
pub fn encode_line(line: &str) -> Vec<Word> {
    let count = line.chars().count();
    if count > LINE_CAPACITY {
        warn!(
            "Truncating greeting line {:?} from {} to {} characters",
            line, count, LINE_CAPACITY
        );
    }

    line.chars()
        .take(LINE_CAPACITY)
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(code) => Word::character(code),
            Err(_) => {
                warn!("Character {:?} has no display code, using '?'", c);
                Word::character(b'?')
            }
        })
        .collect()
}
