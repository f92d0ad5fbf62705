// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # pds4table CLI
//!
//! Command-line tool for PDS4 tables.
//!
//! ## Usage
//!
//! ```sh
//! # List the tables of a label with their columns
//! pds4table inspect tables product.xml
//!
//! # Dump features as JSON lines
//! pds4table dump product.xml --table points --limit 10
//!
//! # Hex dump raw fixed-width records
//! pds4table record product.xml 1 --count 3
//! ```
//!
//! Set `RUST_LOG=debug` for table-level logging.

mod cmd;
mod common;

use std::process;

use clap::{Parser, Subcommand};
use cmd::{DumpCmd, InspectCmd, RecordCmd};
use common::Result;

/// pds4table - PDS4 table toolkit
///
/// Read fixed-width and delimited tables described by a PDS4 label.
#[derive(Parser, Clone)]
#[command(name = "pds4table")]
#[command(about = "PDS4 fixed-width and delimited table toolkit", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Inspect tables (list, fields, definition)
    #[command(subcommand)]
    Inspect(InspectCmd),

    /// Print features as JSON lines
    Dump(DumpCmd),

    /// Hex dump raw records of a fixed-width table
    Record(RecordCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect(cmd) => cmd.run(),
        Commands::Dump(cmd) => cmd.run(),
        Commands::Record(cmd) => cmd.run(),
    }
}

fn main() {
    common::init_logging();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
