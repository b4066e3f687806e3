//! Power-on initialization.
//!
//! Replays a fixed table of instructions and greeting characters through the
//! bus controller, one word per write cycle.

mod replay;

pub mod table;

pub use replay::{InitSequencer, SequencerRegisters};
pub use table::{encode_line, InitTable};
