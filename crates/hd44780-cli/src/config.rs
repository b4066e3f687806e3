//! Configuration management.

use anyhow::{Context, Result};
use hd44780_hw::timing::{DEFAULT_CLOCK_HZ, DEFAULT_RECOVERY_US, HOLD_TICKS, SETUP_TICKS};
use hd44780_hw::{ConstantDelay, Error, InitTable, Timing};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Write-cycle timing
    #[serde(default)]
    pub timing: TimingConfig,

    /// Display contents written after initialization
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Write-cycle timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Controller clock rate in Hz
    #[serde(default = "default_clock_hz")]
    pub clock_hz: u32,

    /// Ticks data is stable before Enable rises
    #[serde(default = "default_setup_ticks")]
    pub setup_ticks: u32,

    /// Ticks Enable stays high
    #[serde(default = "default_hold_ticks")]
    pub hold_ticks: u32,

    /// Recovery time after each write in microseconds
    #[serde(default = "default_recovery_us")]
    pub recovery_us: u32,

    /// Recovery time in ticks, overrides `recovery_us` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_ticks: Option<u32>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            clock_hz: default_clock_hz(),
            setup_ticks: default_setup_ticks(),
            hold_ticks: default_hold_ticks(),
            recovery_us: default_recovery_us(),
            recovery_ticks: None,
        }
    }
}

/// Display contents configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Greeting text, one entry per line (at most two, 16 characters each)
    #[serde(default)]
    pub greeting: Vec<String>,
}

// Default value functions
fn default_clock_hz() -> u32 {
    DEFAULT_CLOCK_HZ
}

fn default_setup_ticks() -> u32 {
    SETUP_TICKS
}

fn default_hold_ticks() -> u32 {
    HOLD_TICKS
}

fn default_recovery_us() -> u32 {
    DEFAULT_RECOVERY_US
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path.as_ref(), content).context("Failed to write configuration file")?;
        Ok(())
    }

    /// Serializes configuration to TOML text.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Returns the validated setup/hold timing.
    ///
    /// Also rejects a zero clock rate, which every tick/time conversion divides by.
    pub fn timing(&self) -> Result<Timing> {
        if self.timing.clock_hz == 0 {
            return Err(Error::InvalidTiming {
                name: "clock_hz",
                value: 0,
            })
            .context("Invalid timing configuration");
        }
        Timing::new(self.timing.setup_ticks, self.timing.hold_ticks)
            .context("Invalid timing configuration")
    }

    /// Returns the recovery delay policy.
    pub fn delay(&self) -> ConstantDelay {
        match self.timing.recovery_ticks {
            Some(ticks) => ConstantDelay::new(ticks),
            None => ConstantDelay::from_micros(self.timing.recovery_us, self.timing.clock_hz),
        }
    }

    /// Builds the initialization table.
    pub fn table(&self) -> InitTable {
        InitTable::with_greeting(&self.display.greeting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.timing.clock_hz, 50_000_000);
        assert_eq!(config.timing.setup_ticks, 5);
        assert_eq!(config.timing.hold_ticks, 20);
        assert_eq!(config.delay().ticks(), 250_000);
        assert!(config.display.greeting.is_empty());
        assert_eq!(config.table(), InitTable::standard());
    }

    #[test]
    fn test_shipped_default_file() {
        let config = Config::parse(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config.timing().unwrap(), Timing::default());
        assert_eq!(config.delay(), ConstantDelay::default());
        assert_eq!(config.table(), InitTable::standard());
    }

    #[test]
    fn test_partial_file() {
        let config = Config::parse(
            r#"
            [timing]
            clock_hz = 1000000
            hold_ticks = 8

            [display]
            greeting = ["Hello", "there"]
            "#,
        )
        .unwrap();
        assert_eq!(config.timing.setup_ticks, 5);
        assert_eq!(config.timing().unwrap().hold_ticks(), 8);
        assert_eq!(config.delay().ticks(), 5_000);
        assert_eq!(config.table().len(), 5 + 5 + 1 + 5);
    }

    #[test]
    fn test_recovery_ticks_override() {
        let config = Config::parse(
            r#"
            [timing]
            recovery_us = 1
            recovery_ticks = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.delay().ticks(), 42);
    }

    #[test]
    fn test_invalid_timing() {
        let config = Config::parse("[timing]\nsetup_ticks = 0\n").unwrap();
        let err = config.timing().unwrap_err();
        assert!(format!("{:#}", err).contains("setup_ticks"));
    }

    #[test]
    fn test_zero_clock_rejected() {
        let config = Config::parse("[timing]\nclock_hz = 0\n").unwrap();
        let err = config.timing().unwrap_err();
        assert!(format!("{:#}", err).contains("clock_hz"));
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidTiming {
                name: "clock_hz",
                value: 0
            })
        ));
    }

    #[test]
    fn test_malformed_file() {
        assert!(Config::parse("[timing]\nclock_hz = \"fast\"\n").is_err());
    }

    #[test]
    fn test_serialized_config_reloads() {
        let mut config = Config::default();
        config.display.greeting = vec!["hd44780".to_string()];
        config.timing.recovery_ticks = Some(10);

        let text = config.to_toml().unwrap();
        let reloaded = Config::parse(&text).unwrap();
        assert_eq!(reloaded.display.greeting, config.display.greeting);
        assert_eq!(reloaded.delay().ticks(), 10);
    }
}
