//! test-vectors - format 0x2b uplink test-vector generator
//!
//! ```text
//! $ echo "Vbat 3.3 Vbus 5.0 ." | test-vectors
//! Vbat 3.3 Vbus 5 .
//! 2b 03 34 cd 50 00
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use test_vectors::{Decoder, DriverConfig, Encoder, Mode, Summary, BANNER};

#[derive(Parser)]
#[command(name = "test-vectors")]
#[command(about = "Generate and check format 0x2b uplink test vectors")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Read from FILE instead of stdin
    #[arg(short, long, global = true, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Encode `key value ... .` records into hex vectors (default)
    Encode,
    /// Decode hex vectors back into record lines
    Decode,
}

impl Cli {
    fn config(&self) -> DriverConfig {
        let mode = match self.command {
            Some(Command::Decode) => Mode::Decode,
            Some(Command::Encode) | None => Mode::Encode,
        };
        DriverConfig {
            mode,
            input: self.input.clone(),
            banner: mode == Mode::Encode && self.input.is_none() && io::stdin().is_terminal(),
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn open_input(config: &DriverConfig) -> Result<Box<dyn BufRead>> {
    match &config.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn run(config: DriverConfig) -> Result<Summary> {
    let input = open_input(&config)?;
    let stdout = io::stdout().lock();

    let summary = match config.mode {
        Mode::Encode => {
            if config.banner {
                writeln!(io::stderr(), "{}", BANNER)?;
            }
            Encoder::new(input, stdout, io::stderr()).run()?
        }
        Mode::Decode => Decoder::new(input, stdout).run()?,
    };

    Ok(summary)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config();
    match run(config) {
        Ok(summary) => {
            info!(
                records = summary.records,
                unknown_keys = summary.unknown_keys,
                skipped_lines = summary.skipped_lines,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
