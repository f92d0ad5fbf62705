// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record command - hex dump raw fixed-width records.

use std::path::PathBuf;

use anyhow::bail;
use clap::Args;

use crate::common::{open_table, Result};
use pds4table::{Pds4Table, TableLayer};

/// Bytes per dump line.
const LINE_WIDTH: usize = 16;

/// Hex dump records of a fixed-width table.
#[derive(Args, Clone, Debug)]
pub struct RecordCmd {
    /// PDS4 label
    #[arg(value_name = "LABEL")]
    label: PathBuf,

    /// First record (1-based FID)
    #[arg(value_name = "FID", default_value_t = 1)]
    fid: i64,

    /// Number of records
    #[arg(short = 'c', long, default_value_t = 1)]
    count: i64,

    /// Table name (first table if not specified)
    #[arg(short, long)]
    table: Option<String>,

    /// Show which field each byte range belongs to
    #[arg(long)]
    fields: bool,
}

impl RecordCmd {
    pub fn run(self) -> Result<()> {
        let table = open_table(&self.label, self.table.as_deref(), &Default::default())?;
        let mut table = match table {
            Pds4Table::FixedWidth(t) => t,
            Pds4Table::Delimited(t) => bail!("table {} is delimited, records have no fixed layout", t.name()),
        };

        let last = (self.fid + self.count - 1).min(table.base().record_count());
        for fid in self.fid..=last {
            let record = table.read_raw_record(fid)?;
            println!("=== Record {fid} ({} bytes) ===", record.len());
            if self.fields {
                for field in table.fields() {
                    println!(
                        "  {:>6}..{:<6} {:<24} {}",
                        field.offset,
                        field.end(),
                        field.name,
                        hex::encode(&record[field.offset..field.end()])
                    );
                }
            } else {
                for line in hex_lines(&record) {
                    println!("{line}");
                }
            }
        }
        Ok(())
    }
}

fn hex_lines(bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(LINE_WIDTH)
        .enumerate()
        .map(|(i, chunk)| {
            let text: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect();
            format!(
                "{:08x}  {:<width$}  |{text}|",
                i * LINE_WIDTH,
                hex::encode(chunk),
                width = LINE_WIDTH * 2
            )
        })
        .collect()
}
