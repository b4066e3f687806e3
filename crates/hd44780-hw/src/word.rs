//! Bus words.
//!
//! A word is the atomic unit written to the display: eight data bits plus the
//! register-select (RS) bit in bit 8.

use crate::{Error, Result};

/// Width of the parallel data bus.
pub const DATA_WIDTH: u32 = 8;

/// Bit position of the register-select flag inside a raw word.
const MODE_BIT: u16 = 1 << DATA_WIDTH;

/// Mask of all valid bits in a raw word.
pub const WORD_MASK: u16 = 0x1FF;

/// Register-select mode of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// RS low: the data byte is an instruction.
    #[default]
    Instruction,
    /// RS high: the data byte is a character code.
    Character,
}

impl Mode {
    /// Returns the level of the RS line for this mode.
    pub fn rs(&self) -> bool {
        matches!(self, Mode::Character)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Instruction => write!(f, "instr"),
            Mode::Character => write!(f, "char"),
        }
    }
}

/// A 9-bit bus word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Word(u16);

impl Word {
    /// Builds an instruction word.
    pub const fn instruction(code: u8) -> Self {
        Self(code as u16)
    }

    /// Builds a character word.
    pub const fn character(code: u8) -> Self {
        Self(MODE_BIT | code as u16)
    }

    /// Returns the raw 9-bit value.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns the eight data bits.
    pub const fn data(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Returns the register-select mode.
    pub fn mode(self) -> Mode {
        if self.0 & MODE_BIT != 0 {
            Mode::Character
        } else {
            Mode::Instruction
        }
    }
}

impl TryFrom<u16> for Word {
    type Error = Error;

    fn try_from(raw: u16) -> Result<Self> {
        if raw & !WORD_MASK != 0 {
            return Err(Error::WordOutOfRange(raw));
        }
        Ok(Self(raw))
    }
}

impl From<Word> for u16 {
    fn from(word: Word) -> Self {
        word.0
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#05X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_word() {
        let word = Word::instruction(0x38);
        assert_eq!(word.raw(), 0x038);
        assert_eq!(word.data(), 0x38);
        assert_eq!(word.mode(), Mode::Instruction);
        assert!(!word.mode().rs());
    }

    #[test]
    fn test_character_word() {
        let word = Word::character(b'A');
        assert_eq!(word.raw(), 0x141);
        assert_eq!(word.data(), b'A');
        assert_eq!(word.mode(), Mode::Character);
        assert!(word.mode().rs());
    }

    #[test]
    fn test_try_from_raw() {
        assert_eq!(Word::try_from(0x1FF).unwrap().data(), 0xFF);
        assert_eq!(Word::try_from(0x0C0).unwrap(), Word::instruction(0xC0));
        assert!(matches!(
            Word::try_from(0x200),
            Err(Error::WordOutOfRange(0x200))
        ));
        assert_eq!(u16::from(Word::character(b'A')), 0x141);
    }

    #[test]
    fn test_display() {
        assert_eq!(Word::instruction(0x01).to_string(), "0x001");
        assert_eq!(Word::character(b'n').to_string(), "0x16E");
        assert_eq!(Mode::Character.to_string(), "char");
    }
}
