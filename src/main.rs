// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/mirrorpond-core

//! Command-line interface for mirrorpond-core.
//!
//! Carriers are binary PPM (P6) files — byte-aligned RGB with no lossy
//! recompression, so stego output survives a write/read cycle exactly.
//! Consent state and the append-only audit ledger live under
//! `.mirrorpond/` by default.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use mirrorpond_core::ledger::{LedgerEntry, OperationLedger};
use mirrorpond_core::raster::ppm;
use mirrorpond_core::ritual::{self, ConsentStateStore, JsonFileStore, RitualStep};
use mirrorpond_core::{decode, encode, BitDepth, IntegrityStatus, RgbImage};

#[derive(Parser, Debug)]
#[clap(
    name = "mirrorpond",
    version = env!("CARGO_PKG_VERSION"),
    about = "Hide a message, its metadata, and an integrity sidecar in the R/G/B bit planes of a PPM image."
)]
struct Cli {
    /// Suppress everything except errors and requested output.
    #[clap(long, global = true)]
    quiet: bool,
    /// Verbose logging (pipeline step traces).
    #[clap(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Consent state file.
    #[clap(long, global = true, default_value = ".mirrorpond/consent.json")]
    state: PathBuf,
    /// Append-only audit ledger (JSON lines).
    #[clap(long, global = true, default_value = ".mirrorpond/ledger.jsonl")]
    ledger: PathBuf,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed a message (and optional metadata) into a cover image.
    Encode {
        /// Cover image (binary PPM).
        #[clap(long)]
        cover: PathBuf,
        /// Output stego image.
        #[clap(long, short = 'o')]
        out: PathBuf,
        /// Message text.
        #[clap(long, short = 'm')]
        message: String,
        /// Metadata as an inline JSON object.
        #[clap(long)]
        meta: Option<String>,
        /// Metadata as a JSON file.
        #[clap(long, conflicts_with = "meta")]
        meta_file: Option<PathBuf>,
        /// Bits embedded per color sample.
        #[clap(long, default_value_t = 1, value_parser = parse_bpc)]
        bpc: u8,
    },
    /// Extract and verify the payload of a stego image.
    Decode {
        /// Stego image (binary PPM).
        image: PathBuf,
        /// Bits embedded per color sample.
        #[clap(long, default_value_t = 1, value_parser = parse_bpc)]
        bpc: u8,
    },
    /// Verify a stego image's sidecar without printing any payload.
    SidecarValidate {
        /// Stego image (binary PPM).
        image: PathBuf,
        /// Bits embedded per color sample.
        #[clap(long, default_value_t = 1, value_parser = parse_bpc)]
        bpc: u8,
    },
    /// Inspect or advance the consent gate.
    Ritual {
        #[clap(subcommand)]
        command: RitualCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RitualCommand {
    /// Print the current consent state.
    Status,
    /// Invoke a single ritual step (1-6).
    Invoke { step: u8 },
    /// Apply every remaining step in order.
    Auto,
    /// Close the gates (same as invoking step 1).
    Reset,
}

fn parse_bpc(s: &str) -> Result<u8, String> {
    let bits: u8 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    BitDepth::from_bits(bits)
        .map(|_| bits)
        .ok_or_else(|| format!("bits per channel must be 1 or 4, got {bits}"))
}

/// Audit ledger sink: one JSON line appended per completed operation.
/// Failures are logged and swallowed — a ledger problem never fails the
/// operation it records.
struct JsonlLedger {
    path: PathBuf,
}

impl JsonlLedger {
    fn append(&self, entry: &LedgerEntry) -> std::io::Result<()> {
        use std::io::Write;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(file, "{line}")
    }
}

impl OperationLedger for JsonlLedger {
    fn record(&self, entry: &LedgerEntry) {
        if let Err(e) = self.append(entry) {
            log::warn!("audit ledger write failed: {e}");
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        log::LevelFilter::Error
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env().filter_level(level).init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = JsonFileStore::new(&cli.state);
    let ledger = JsonlLedger { path: cli.ledger.clone() };

    match &cli.command {
        Command::Encode { cover, out, message, meta, meta_file, bpc } => {
            let metadata = load_metadata(meta.as_deref(), meta_file.as_deref())?;
            let depth = BitDepth::from_bits(*bpc).expect("bpc validated by clap");
            let cover_img = read_image(cover)?;

            let stego = encode(&cover_img, message, &metadata, depth, &store, &ledger)?;
            std::fs::write(out, ppm::write_ppm(&stego))?;
            if !cli.quiet {
                println!("wrote {}", out.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Decode { image, bpc } => {
            let depth = BitDepth::from_bits(*bpc).expect("bpc validated by clap");
            let img = read_image(image)?;

            let output = decode(&img, depth, &store, &ledger)?;
            let report = serde_json::json!({
                "message": output.message,
                "metadata": output.metadata,
                "integrity": output.integrity,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);

            if output.integrity.status == IntegrityStatus::IntegrityFailed {
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::SidecarValidate { image, bpc } => {
            let depth = BitDepth::from_bits(*bpc).expect("bpc validated by clap");
            let img = read_image(image)?;

            // Payload stays unprinted: only the verification result.
            let output = decode(&img, depth, &store, &ledger)?;
            println!("{}", serde_json::to_string_pretty(&output.integrity)?);

            if output.integrity.status == IntegrityStatus::IntegrityFailed {
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Ritual { command } => run_ritual(command, &store, cli.quiet),
    }
}

fn run_ritual(
    command: &RitualCommand,
    store: &JsonFileStore,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut state = store.load()?;
    match command {
        RitualCommand::Status => {
            println!("{}", serde_json::to_string_pretty(&state)?);
            return Ok(ExitCode::SUCCESS);
        }
        RitualCommand::Invoke { step } => {
            let step = RitualStep::from_index(*step)
                .ok_or_else(|| format!("no such ritual step: {step} (valid: 1-6)"))?;
            ritual::invoke_step(&mut state, step);
        }
        RitualCommand::Auto => ritual::invoke_auto(&mut state),
        RitualCommand::Reset => ritual::invoke_step(&mut state, RitualStep::Reset),
    }
    store.save(&state)?;
    if !quiet {
        println!("{}", serde_json::to_string_pretty(&state)?);
    }
    Ok(ExitCode::SUCCESS)
}

fn load_metadata(
    meta: Option<&str>,
    meta_file: Option<&std::path::Path>,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let text = match (meta, meta_file) {
        (Some(inline), None) => inline.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => "{}".to_string(),
        (Some(_), Some(_)) => unreachable!("clap forbids --meta with --meta-file"),
    };
    let value: serde_json::Value = serde_json::from_str(&text)?;
    if !value.is_object() {
        return Err("metadata must be a JSON object".into());
    }
    Ok(value)
}

fn read_image(path: &std::path::Path) -> Result<RgbImage, Box<dyn std::error::Error>> {
    let data = std::fs::read(path)?;
    Ok(ppm::read_ppm(&data)?)
}
