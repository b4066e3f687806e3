//! HD44780 Power-On Simulator
//!
//! CLI for replaying the LCD initialization table through the clock-accurate
//! write-cycle controller.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hd44780_hw::{Lcd, RunSummary, Trace, WriteRecord, DEFAULT_TICK_BUDGET};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;

#[derive(Parser)]
#[command(name = "hd44780sim")]
#[command(about = "Simulate the HD44780 power-on write sequence")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recovery delay after each write, in ticks
    #[arg(long, global = true)]
    recovery_ticks: Option<u32>,

    /// Greeting line (repeat for the second line)
    #[arg(long = "greeting", global = true)]
    greeting: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the initialization table
    Table,
    /// Replay the initialization table and list every write
    Run {
        /// Give up after this many ticks
        #[arg(long, default_value_t = DEFAULT_TICK_BUDGET)]
        max_ticks: u64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay the initialization table and dump a VCD waveform
    Vcd {
        /// Output file path
        #[arg(default_value = "lcd.vcd")]
        output: PathBuf,

        /// Give up after this many ticks
        #[arg(long, default_value_t = DEFAULT_TICK_BUDGET)]
        max_ticks: u64,
    },
    /// Print the effective configuration
    Config {
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// One write in the JSON report.
#[derive(Serialize)]
struct WriteReport {
    index: usize,
    word: u16,
    mode: String,
    data: u8,
    rise: u64,
    fall: u64,
}

/// JSON report of a full replay.
#[derive(Serialize)]
struct RunReport {
    ticks: u64,
    elapsed_us: f64,
    words: usize,
    writes: Vec<WriteReport>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive("info".parse()?)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Table => handle_table(&config),
        Commands::Run { max_ticks, json } => handle_run(&config, max_ticks, json),
        Commands::Vcd { output, max_ticks } => handle_vcd(&config, &output, max_ticks),
        Commands::Config { output } => handle_config(&config, output.as_deref()),
    }
}

/// Loads the configuration file, if any, and applies command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            info!("Loaded configuration from: {}", path.display());
            config
        }
        None => Config::default(),
    };

    if let Some(ticks) = cli.recovery_ticks {
        config.timing.recovery_ticks = Some(ticks);
    }
    if !cli.greeting.is_empty() {
        config.display.greeting = cli.greeting.clone();
    }

    Ok(config)
}

/// Replays the configured table into a fresh driver.
fn replay(config: &Config, max_ticks: u64) -> Result<(Trace, RunSummary)> {
    let mut lcd = Lcd::new(config.table(), config.timing()?, config.delay());
    let mut trace = Trace::new();
    let summary = lcd
        .run(max_ticks, &mut trace)
        .context("Initialization replay failed")?;
    Ok((trace, summary))
}

fn ticks_to_us(ticks: u64, clock_hz: u32) -> f64 {
    ticks as f64 * 1_000_000.0 / f64::from(clock_hz)
}

fn printable(write: &WriteRecord) -> String {
    let data = write.word.data();
    if write.word.mode().rs() && (0x20..0x7F).contains(&data) {
        format!("'{}'", data as char)
    } else {
        String::new()
    }
}

fn handle_table(config: &Config) -> Result<()> {
    let table = config.table();
    println!("Init table ({} words):", table.len());
    for (index, word) in table.words().iter().enumerate() {
        println!(
            "  {:>3}  {}  {:<5}  {:#04x}",
            index,
            word,
            word.mode(),
            word.data()
        );
    }
    Ok(())
}

fn handle_run(config: &Config, max_ticks: u64, json: bool) -> Result<()> {
    let (trace, RunSummary { ticks, words }) = replay(config, max_ticks)?;
    let writes = trace.writes();
    let clock_hz = config.timing.clock_hz;

    if json {
        let report = RunReport {
            ticks,
            elapsed_us: ticks_to_us(ticks, clock_hz),
            words,
            writes: writes
                .iter()
                .enumerate()
                .map(|(index, write)| WriteReport {
                    index,
                    word: u16::from(write.word),
                    mode: write.word.mode().to_string(),
                    data: write.word.data(),
                    rise: write.rise,
                    fall: write.fall,
                })
                .collect(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
        return Ok(());
    }

    println!("Writes:");
    for (index, write) in writes.iter().enumerate() {
        println!(
            "  {:>3}  tick {:>10}  {}  {:<5}  {:#04x} {}",
            index,
            write.rise,
            write.word,
            write.word.mode(),
            write.word.data(),
            printable(write)
        );
    }
    println!(
        "Settled after {} ticks ({:.1} us), {} words written",
        ticks,
        ticks_to_us(ticks, clock_hz),
        words
    );
    Ok(())
}

fn handle_vcd(config: &Config, output: &Path, max_ticks: u64) -> Result<()> {
    let (trace, RunSummary { ticks, words }) = replay(config, max_ticks)?;
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    trace
        .write_vcd(BufWriter::new(file), config.timing.clock_hz)
        .context("Failed to write VCD file")?;
    println!(
        "Wrote {} ({} words, {} ticks)",
        output.display(),
        words,
        ticks
    );
    Ok(())
}

fn handle_config(config: &Config, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            config.save(path)?;
            println!("Configuration saved to: {}", path.display());
        }
        None => print!("{}", config.to_toml()?),
    }
    Ok(())
}
