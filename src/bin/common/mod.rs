// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::path::Path;

use anyhow::{anyhow, Context as _};
use pds4table::{OpenOptions, Pds4Table, TableLayer};
use tracing_subscriber::EnvFilter;

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Install the log subscriber; `RUST_LOG` overrides the `warn` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse `KEY=VALUE` open options.
pub fn open_options(items: &[String]) -> Result<OpenOptions> {
    Ok(OpenOptions::from_strings(items)?)
}

/// Open every table of a label.
pub fn open_tables(label: &Path, options: &OpenOptions) -> Result<Vec<Pds4Table>> {
    Pds4Table::open_label(label, options)
        .with_context(|| format!("cannot open tables of {}", label.display()))
}

/// Open one table of a label, the first one when `name` is not given.
pub fn open_table(label: &Path, name: Option<&str>, options: &OpenOptions) -> Result<Pds4Table> {
    let tables = open_tables(label, options)?;
    select_table(tables, name).ok_or_else(|| match name {
        Some(name) => anyhow!("no table named '{name}' in {}", label.display()),
        None => anyhow!("no table in {}", label.display()),
    })
}

fn select_table(tables: Vec<Pds4Table>, name: Option<&str>) -> Option<Pds4Table> {
    match name {
        Some(name) => tables.into_iter().find(|t| t.name() == name),
        None => tables.into_iter().next(),
    }
}

/// Format a byte count for display.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
