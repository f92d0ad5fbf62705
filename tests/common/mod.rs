// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pds4table::schema::{parse_document, write_label};
use pds4table::{
    Feature, FieldDefn, FieldType, FieldValue, GeometryType, LayerCreationOptions, OpenOptions,
    Pds4Table, TableLayer, TableType, XmlNode,
};

// ============================================================================
// Fixtures
// ============================================================================

/// Rows of the standard two-column character fixture.
pub const ROWS: [(i32, &str); 3] = [(1, "alpha"), (22, "beta"), (333, "gamma")];

/// Create a character table with an integer `n` and an 8-byte string `s`
/// holding [`ROWS`].
pub fn create_character_table(path: &Path) -> Pds4Table {
    let options = LayerCreationOptions::new(TableType::Character);
    let mut table = Pds4Table::create("rows", path, &options, None, GeometryType::NONE)
        .expect("create character table");
    table
        .create_field(&FieldDefn::new("n", FieldType::Integer))
        .expect("create n");
    table
        .create_field(&FieldDefn::new("s", FieldType::String).with_width(8))
        .expect("create s");
    for (n, s) in ROWS {
        let mut feature = new_feature(&table);
        feature.set_field(0, n);
        feature.set_field(1, s);
        table.create_feature(&mut feature).expect("create feature");
    }
    table
}

/// Empty feature in the table's public schema.
pub fn new_feature<T: TableLayer>(table: &T) -> Feature {
    Feature::new(Arc::clone(table.layer_defn()))
}

/// Parse a table definition fragment.
pub fn table_def(xml: &str) -> XmlNode {
    parse_document(xml).expect("valid table definition")
}

/// Write a label describing `table` next to its data file and return its path.
pub fn write_label_for<T: TableLayer>(table: &T, label_name: &str) -> PathBuf {
    let data_path = table.base().filename();
    let dir = data_path.parent().expect("data file has a directory");
    let file_name = data_path
        .file_name()
        .expect("data file has a name")
        .to_string_lossy()
        .into_owned();
    let label = dir.join(label_name);
    write_label(&label, &[(file_name, table.table_def())]).expect("write label");
    label
}

/// Reopen the single table of a label.
pub fn reopen(label: &Path, options: &OpenOptions) -> Pds4Table {
    let mut tables = Pds4Table::open_label(label, options).expect("open label");
    assert_eq!(tables.len(), 1, "label should declare one table");
    tables.remove(0)
}

// ============================================================================
// Assertions
// ============================================================================

/// Read every feature in FID order.
pub fn collect_features<T: TableLayer>(table: &mut T) -> Vec<Feature> {
    table.reset_reading();
    let mut features = Vec::new();
    while let Some(feature) = table.next_feature().expect("read feature") {
        features.push(feature);
    }
    features
}

/// Field values of a feature by name.
pub fn value<'a>(feature: &'a Feature, name: &str) -> &'a FieldValue {
    feature
        .field_by_name(name)
        .unwrap_or_else(|| panic!("feature has no field '{name}'"))
}

/// Assert that two reals are equal within a small tolerance.
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
