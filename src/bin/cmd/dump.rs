// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Dump command - print features as JSON lines.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail};
use clap::Args;
use serde_json::{json, Map, Value};

use crate::common::{open_options, open_table, Result};
use pds4table::geometry::to_wkt;
use pds4table::table::CompareOp;
use pds4table::{AttributeFilter, Envelope, Feature, FieldValue, TableLayer};

/// Print the features of a table.
#[derive(Args, Clone, Debug)]
pub struct DumpCmd {
    /// PDS4 label
    #[arg(value_name = "LABEL")]
    label: PathBuf,

    /// Table name (first table if not specified)
    #[arg(short, long)]
    table: Option<String>,

    /// Maximum number of features
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Attribute filter FIELD=VALUE
    #[arg(long = "where", value_name = "FIELD=VALUE")]
    where_eq: Option<String>,

    /// Spatial filter MINX,MINY,MAXX,MAXY
    #[arg(long, value_name = "MINX,MINY,MAXX,MAXY")]
    bbox: Option<String>,

    /// Only print the number of matching features
    #[arg(long)]
    count: bool,

    /// Open options (KEY=VALUE)
    #[arg(short = 'o', long = "oo")]
    open_options: Vec<String>,
}

impl DumpCmd {
    pub fn run(self) -> Result<()> {
        let mut table = open_table(&self.label, self.table.as_deref(), &open_options(&self.open_options)?)?;

        if let Some(expr) = &self.where_eq {
            let (field, value) = expr
                .split_once('=')
                .ok_or_else(|| anyhow!("filter must be FIELD=VALUE: {expr}"))?;
            let Some(defn) = table
                .layer_defn()
                .field_index(field)
                .and_then(|i| table.layer_defn().field(i))
            else {
                bail!("no field named '{field}' in table {}", table.name());
            };
            let value = FieldValue::from(value).coerce(defn.field_type, defn.subtype);
            table.set_attribute_filter(Some(AttributeFilter::compare(field, CompareOp::Eq, value)));
        }
        if let Some(bbox) = &self.bbox {
            table.set_spatial_filter(Some(parse_bbox(bbox)?));
        }

        if self.count {
            println!("{}", table.feature_count()?);
            return Ok(());
        }

        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        let mut written = 0;
        while let Some(feature) = table.next_feature()? {
            if self.limit.is_some_and(|limit| written >= limit) {
                break;
            }
            serde_json::to_writer(&mut out, &feature_to_json(&feature))?;
            writeln!(out)?;
            written += 1;
        }
        out.flush()?;
        Ok(())
    }
}

fn feature_to_json(feature: &Feature) -> Value {
    let mut properties = Map::new();
    for (field, value) in feature.defn().fields().iter().zip(feature.values()) {
        let value = match value {
            FieldValue::Null => Value::Null,
            FieldValue::Integer(v) => json!(v),
            FieldValue::Integer64(v) => json!(v),
            FieldValue::Real(v) => json!(v),
            other => other.to_text().map(Value::String).unwrap_or(Value::Null),
        };
        properties.insert(field.name.clone(), value);
    }
    json!({
        "fid": feature.fid(),
        "properties": properties,
        "geometry": feature.geometry().map(to_wkt),
    })
}

fn parse_bbox(text: &str) -> Result<Envelope> {
    let values = text
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| anyhow!("invalid bbox '{text}': {e}"))?;
    match values.as_slice() {
        [min_x, min_y, max_x, max_y] => Ok(Envelope::new(*min_x, *min_y, *max_x, *max_y)),
        _ => bail!("bbox needs four values: {text}"),
    }
}
