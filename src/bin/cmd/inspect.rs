// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Inspect command - list tables, show columns and table definitions.

use std::path::PathBuf;

use clap::Subcommand;

use crate::common::{format_bytes, open_options, open_table, open_tables, Result};
use pds4table::{GeometryType, Pds4Table, TableLayer};

/// Inspect the tables of a label.
#[derive(Subcommand, Clone, Debug)]
pub enum InspectCmd {
    /// List every table with its encoding and record count
    Tables {
        /// PDS4 label
        #[arg(value_name = "LABEL")]
        label: PathBuf,

        /// Open options (KEY=VALUE)
        #[arg(short = 'o', long = "oo")]
        open_options: Vec<String>,
    },

    /// Show the columns of a table
    Fields {
        /// PDS4 label
        #[arg(value_name = "LABEL")]
        label: PathBuf,

        /// Table name (first table if not specified)
        #[arg(short, long)]
        table: Option<String>,

        /// Show raw columns, geometry columns included
        #[arg(long)]
        raw: bool,

        /// Open options (KEY=VALUE)
        #[arg(short = 'o', long = "oo")]
        open_options: Vec<String>,
    },

    /// Print the table definition XML
    Definition {
        /// PDS4 label
        #[arg(value_name = "LABEL")]
        label: PathBuf,

        /// Table name (first table if not specified)
        #[arg(short, long)]
        table: Option<String>,
    },
}

impl InspectCmd {
    pub fn run(self) -> Result<()> {
        match self {
            InspectCmd::Tables {
                label,
                open_options: opts,
            } => cmd_tables(label, opts),
            InspectCmd::Fields {
                label,
                table,
                raw,
                open_options: opts,
            } => cmd_fields(label, table, raw, opts),
            InspectCmd::Definition { label, table } => cmd_definition(label, table),
        }
    }
}

/// Cmd: List tables
fn cmd_tables(label: PathBuf, opts: Vec<String>) -> Result<()> {
    let tables = open_tables(&label, &open_options(&opts)?)?;

    println!("=== {} ===", label.display());
    println!("Tables: {}", tables.len());
    println!();

    for table in &tables {
        let defn = table.layer_defn();
        let size = std::fs::metadata(table.base().filename())
            .map(|m| format_bytes(m.len()))
            .unwrap_or_else(|_| "missing".to_string());
        println!("Table: {}", table.name());
        println!("  Kind: {}", table.kind().element_name());
        println!("  File: {} ({size})", table.base().filename().display());
        println!("  Records: {}", table.base().record_count());
        println!("  Fields: {}", defn.field_count());
        println!("  Geometry: {}", defn.geometry_type().vrt_name());
        if let Pds4Table::FixedWidth(t) = table {
            println!("  Record size: {}", t.record_size());
        }
        println!();
    }

    Ok(())
}

/// Cmd: Show columns
fn cmd_fields(label: PathBuf, table: Option<String>, raw: bool, opts: Vec<String>) -> Result<()> {
    let table = open_table(&label, table.as_deref(), &open_options(&opts)?)?;
    let defn = if raw {
        table.base().raw_defn()
    } else {
        table.layer_defn()
    };

    println!("=== {} ===", table.name());
    for (i, field) in defn.fields().iter().enumerate() {
        let data_type = table
            .field_metadata(&field.name)
            .map(|m| m.data_type.to_string())
            .unwrap_or_default();
        print!("  [{i}] {} | {}", field.name, field.field_type.as_str());
        if let Some(subtype) = field.subtype.as_str() {
            print!("({subtype})");
        }
        if !data_type.is_empty() {
            print!(" | {data_type}");
        }
        println!();
    }

    let columns = table.base().geom_column_names();
    if !raw && defn.geometry_type() != GeometryType::NONE {
        println!();
        println!("Geometry: {}", defn.geometry_type().vrt_name());
        for (role, name) in [
            ("WKT", columns.wkt),
            ("Latitude", columns.lat),
            ("Longitude", columns.long),
            ("Altitude", columns.alt),
        ] {
            if let Some(name) = name {
                println!("  {role}: {name}");
            }
        }
    }

    Ok(())
}

/// Cmd: Print table definition
fn cmd_definition(label: PathBuf, table: Option<String>) -> Result<()> {
    let table = open_table(&label, table.as_deref(), &Default::default())?;
    print!("{}", table.table_def().to_xml_string());
    Ok(())
}
