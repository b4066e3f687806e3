//! Pin activity recording and waveform export.
//!
//! Samples are stored only when a pin changes, so the long recovery windows
//! between writes cost nothing.

use std::io::Write;

use crate::controller::Pins;
use crate::{Error, Result, Word};

/// Pin levels from `tick` onwards, until the next sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// First tick with these levels.
    pub tick: u64,
    /// Pin levels.
    pub pins: Pins,
}

/// One completed Enable pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRecord {
    /// Word on the bus while Enable was high.
    pub word: Word,
    /// First tick with Enable high.
    pub rise: u64,
    /// First tick with Enable low again.
    pub fall: u64,
}

impl WriteRecord {
    /// Enable pulse width in ticks.
    pub fn pulse_width(&self) -> u64 {
        self.fall - self.rise
    }
}

/// Change-only recording of the controller pins.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    samples: Vec<Sample>,
    end: u64,
}

impl Trace {
    /// Creates an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the pin levels seen during `tick`.
    pub fn record(&mut self, tick: u64, pins: Pins) {
        self.push(tick, pins);
        self.end = self.end.max(tick + 1);
    }

    /// Records the levels a run stopped on at `tick`, which was not clocked.
    ///
    /// Unlike [`Trace::record`] this ends the trace at `tick` itself.
    pub fn finish(&mut self, tick: u64, pins: Pins) {
        self.push(tick, pins);
        self.end = self.end.max(tick);
    }

    fn push(&mut self, tick: u64, pins: Pins) {
        if self.samples.last().map(|s| s.pins) != Some(pins) {
            self.samples.push(Sample { tick, pins });
        }
    }

    /// Returns the recorded changes in tick order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Returns the tick the trace ends at.
    ///
    /// This is one past the last recorded tick, or the tick passed to
    /// [`Trace::finish`].
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Returns every write whose Enable pulse has finished.
    pub fn writes(&self) -> Vec<WriteRecord> {
        let mut writes = Vec::new();
        let mut high: Option<Sample> = None;

        for sample in &self.samples {
            match (high, sample.pins.enable) {
                (None, true) => high = Some(*sample),
                (Some(rise), false) => {
                    writes.push(WriteRecord {
                        word: rise.pins.word(),
                        rise: rise.tick,
                        fall: sample.tick,
                    });
                    high = None;
                }
                _ => {}
            }
        }

        writes
    }

    /// Writes the trace as a Value Change Dump.
    ///
    /// One tick lasts one period of `clock_hz`. The timescale is the coarsest
    /// VCD unit in which that period is a whole number; other clock rates use
    /// 1 fs with each timestamp rounded from its own tick.
    pub fn write_vcd<W: Write>(&self, mut out: W, clock_hz: u32) -> Result<()> {
        if clock_hz == 0 {
            return Err(Error::InvalidTiming {
                name: "clock_hz",
                value: clock_hz,
            });
        }
        let timescale = Timescale::for_clock(clock_hz);

        writeln!(
            out,
            "$version {} {} $end",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(out, "$timescale {} $end", timescale.unit)?;
        writeln!(out, "$scope module lcd $end")?;
        writeln!(out, "$var wire 8 ! lcd_data [7:0] $end")?;
        writeln!(out, "$var wire 1 \" lcd_rs $end")?;
        writeln!(out, "$var wire 1 # lcd_en $end")?;
        writeln!(out, "$var wire 1 $ ready $end")?;
        writeln!(out, "$upscope $end")?;
        writeln!(out, "$enddefinitions $end")?;

        let mut prev: Option<Pins> = None;
        for sample in &self.samples {
            writeln!(out, "#{}", timescale.timestamp(sample.tick)?)?;
            let pins = sample.pins;
            if prev.is_none() {
                writeln!(out, "$dumpvars")?;
            }
            if prev.map(|p| p.data) != Some(pins.data) {
                writeln!(out, "b{:08b} !", pins.data)?;
            }
            if prev.map(|p| p.rs) != Some(pins.rs) {
                writeln!(out, "{}\"", u8::from(pins.rs))?;
            }
            if prev.map(|p| p.enable) != Some(pins.enable) {
                writeln!(out, "{}#", u8::from(pins.enable))?;
            }
            if prev.map(|p| p.ready) != Some(pins.ready) {
                writeln!(out, "{}$", u8::from(pins.ready))?;
            }
            if prev.is_none() {
                writeln!(out, "$end")?;
            }
            prev = Some(pins);
        }
        if self.samples.last().map_or(true, |s| s.tick < self.end) {
            writeln!(out, "#{}", timescale.timestamp(self.end)?)?;
        }

        out.flush()?;
        Ok(())
    }
}

/// VCD time units, coarsest first, with how many fit in one second.
const TIME_UNITS: [(&str, u64); 16] = [
    ("1s", 1),
    ("100ms", 10),
    ("10ms", 100),
    ("1ms", 1_000),
    ("100us", 10_000),
    ("10us", 100_000),
    ("1us", 1_000_000),
    ("100ns", 10_000_000),
    ("10ns", 100_000_000),
    ("1ns", 1_000_000_000),
    ("100ps", 10_000_000_000),
    ("10ps", 100_000_000_000),
    ("1ps", 1_000_000_000_000),
    ("100fs", 10_000_000_000_000),
    ("10fs", 100_000_000_000_000),
    ("1fs", 1_000_000_000_000_000),
];

/// Maps ticks of a clock onto a VCD time unit.
#[derive(Debug, Clone, Copy)]
struct Timescale {
    unit: &'static str,
    per_second: u64,
    clock_hz: u64,
}

impl Timescale {
    fn for_clock(clock_hz: u32) -> Self {
        let clock_hz = u64::from(clock_hz);
        let (unit, per_second) = TIME_UNITS
            .iter()
            .copied()
            .find(|(_, per_second)| per_second % clock_hz == 0)
            .unwrap_or(TIME_UNITS[TIME_UNITS.len() - 1]);
        Self {
            unit,
            per_second,
            clock_hz,
        }
    }

    /// Start of `tick` in units, rounded to the nearest unit.
    fn timestamp(&self, tick: u64) -> Result<u64> {
        let clock_hz = u128::from(self.clock_hz);
        let scaled = u128::from(tick)
            .checked_mul(u128::from(self.per_second))
            .and_then(|t| t.checked_add(clock_hz / 2))
            .ok_or(Error::TimestampOverflow { tick })?;
        u64::try_from(scaled / clock_hz).map_err(|_| Error::TimestampOverflow { tick })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pins(data: u8, rs: bool, enable: bool, ready: bool) -> Pins {
        Pins {
            data,
            rs,
            enable,
            ready,
        }
    }

    fn pulse_trace() -> Trace {
        let mut trace = Trace::new();
        trace.record(0, pins(0, false, false, true));
        trace.record(1, pins(0, false, false, false));
        for tick in 2..4 {
            trace.record(tick, pins(0x38, false, false, false));
        }
        for tick in 4..7 {
            trace.record(tick, pins(0x38, false, true, false));
        }
        for tick in 7..9 {
            trace.record(tick, pins(0x38, false, false, false));
        }
        trace.record(9, pins(0x38, false, false, true));
        trace
    }

    #[test]
    fn test_records_changes_only() {
        let trace = pulse_trace();
        let ticks: Vec<u64> = trace.samples().iter().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![0, 1, 2, 4, 7, 9]);
        assert_eq!(trace.end(), 10);
    }

    #[test]
    fn test_writes() {
        let writes = pulse_trace().writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].word, Word::instruction(0x38));
        assert_eq!(writes[0].rise, 4);
        assert_eq!(writes[0].fall, 7);
        assert_eq!(writes[0].pulse_width(), 3);
    }

    #[test]
    fn test_unfinished_pulse_not_reported() {
        let mut trace = Trace::new();
        trace.record(0, pins(b'x', true, false, false));
        trace.record(1, pins(b'x', true, true, false));
        assert!(trace.writes().is_empty());
    }

    #[test]
    fn test_vcd_output() {
        let mut out = Vec::new();
        pulse_trace().write_vcd(&mut out, 50_000_000).unwrap();
        let vcd = String::from_utf8(out).unwrap();

        // 20 ns per tick at 50 MHz.
        assert!(vcd.contains("$timescale 10ns $end"));
        assert!(vcd.contains("$var wire 8 ! lcd_data [7:0] $end"));
        assert!(vcd.contains("$enddefinitions $end"));
        assert!(vcd.contains("#8\n1#\n"));
        assert!(vcd.contains("#14\n0#\n"));
        assert!(vcd.contains("b00111000 !"));
        assert!(vcd.trim_end().ends_with("#20"));
    }

    #[test]
    fn test_vcd_slow_clock() {
        let mut trace = Trace::new();
        trace.record(0, pins(0, false, false, true));
        trace.record(20_000_000, pins(0x38, false, true, false));

        let mut out = Vec::new();
        trace.write_vcd(&mut out, 1).unwrap();
        let vcd = String::from_utf8(out).unwrap();
        assert!(vcd.contains("$timescale 1s $end"));
        assert!(vcd.contains("#20000000\n"));
        assert!(vcd.trim_end().ends_with("#20000001"));
    }

    #[test]
    fn test_vcd_clock_without_exact_unit() {
        // 3 MHz has no whole-unit period, so timestamps are in femtoseconds.
        let mut trace = Trace::new();
        trace.record(0, pins(0, false, false, true));
        trace.record(1, pins(0, false, false, false));
        trace.record(2_999_999, pins(0, false, false, true));

        let mut out = Vec::new();
        trace.write_vcd(&mut out, 3_000_000).unwrap();
        let vcd = String::from_utf8(out).unwrap();
        assert!(vcd.contains("$timescale 1fs $end"));
        assert!(vcd.contains("#333333333\n"));
        assert!(vcd.contains("#999999666666667\n"));
        // Exactly one second after 3,000,000 ticks.
        assert!(vcd.trim_end().ends_with("#1000000000000000"));
    }

    #[test]
    fn test_vcd_timestamp_overflow() {
        let mut trace = Trace::new();
        trace.record(0, pins(0, false, false, true));
        trace.record(1 << 60, pins(0, false, false, false));

        let result = trace.write_vcd(Vec::<u8>::new(), 3_000_000);
        assert!(matches!(
            result,
            Err(Error::TimestampOverflow { tick }) if tick == 1 << 60
        ));
    }

    #[test]
    fn test_finish_ends_at_tick() {
        let mut trace = pulse_trace();
        trace.finish(10, pins(0x38, false, false, false));
        assert_eq!(trace.end(), 10);
        assert_eq!(trace.samples().last().map(|s| s.tick), Some(10));

        let mut out = Vec::new();
        trace.write_vcd(&mut out, 50_000_000).unwrap();
        let vcd = String::from_utf8(out).unwrap();
        // The closing levels sit at the end time, which is not repeated.
        assert!(vcd.trim_end().ends_with("#20\n0$"));
        assert_eq!(vcd.matches("#20\n").count(), 1);
    }

    #[test]
    fn test_vcd_rejects_zero_clock() {
        let result = pulse_trace().write_vcd(Vec::<u8>::new(), 0);
        assert!(matches!(
            result,
            Err(Error::InvalidTiming {
                name: "clock_hz",
                ..
            })
        ));
    }
}
