// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Editable layer and table rewrite tests.

mod common;

use std::fs;
use std::sync::Arc;

use common::{
    collect_features, create_character_table, new_feature, reopen, value, write_label_for, ROWS,
};
use pds4table::table::LineEnding;
use pds4table::{
    AttributeFilter, EditableLayer, Feature, FieldDefn, FieldType, FieldValue, GeometryType,
    LayerCreationOptions, OpenOptions, Pds4Table, SyncStats, TableLayer, TableType,
};

fn rows_file(flag_width: usize) -> String {
    ROWS.iter()
        .map(|(n, s)| format!("{n:>11}{s:<8}{:flag_width$}\r\n", ""))
        .collect()
}

// ============================================================================
// Rewrite after a schema change
// ============================================================================

#[test]
fn test_add_field_to_populated_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.dat");
    let mut layer = EditableLayer::new(create_character_table(&path));

    layer
        .create_field(&FieldDefn::new("flag", FieldType::Integer))
        .unwrap();
    assert!(layer.is_modified());
    assert_eq!(layer.layer_defn().field_count(), 3);
    assert_eq!(layer.inner().layer_defn().field_count(), 2);
    assert_eq!(fs::read(&path).unwrap().len(), 3 * 21);

    let stats = layer.sync_to_disk().unwrap();
    assert_eq!(
        stats,
        SyncStats {
            field_count: 3,
            feature_count: 3
        }
    );
    assert!(!layer.is_modified());
    assert!(!dir.path().join("rows.dat.tmp").exists());
    assert!(!dir.path().join("rows.dat.bak").exists());

    let data = fs::read_to_string(&path).unwrap();
    assert_eq!(data.len(), 3 * (11 + 8 + 11 + 2));
    assert_eq!(data, rows_file(11));

    let label = write_label_for(layer.inner(), "rows.xml");
    drop(layer);

    let mut table = reopen(&label, &OpenOptions::new());
    let names: Vec<_> = table
        .layer_defn()
        .fields()
        .iter()
        .map(|f| f.name.clone())
        .collect();
    assert_eq!(names, ["n", "s", "flag"]);
    let features = collect_features(&mut table);
    assert_eq!(features.len(), 3);
    for (feature, (n, s)) in features.iter().zip(ROWS) {
        assert_eq!(value(feature, "n").as_i64(), Some(i64::from(n)));
        assert_eq!(value(feature, "s"), &FieldValue::String(s.into()));
        assert!(value(feature, "flag").is_null());
    }
}

#[test]
fn test_buffered_rows_follow_schema_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.dat");
    let mut layer = EditableLayer::new(create_character_table(&path));
    layer
        .create_field(&FieldDefn::new("flag", FieldType::Integer))
        .unwrap();

    let mut feature = Feature::new(Arc::clone(layer.layer_defn()));
    feature.set_field(0, 4444);
    feature.set_field(1, "delta");
    feature.set_field(2, 1);
    layer.create_feature(&mut feature).unwrap();
    assert_eq!(feature.fid(), Some(4));
    assert_eq!(layer.feature_count().unwrap(), 4);
    assert_eq!(layer.inner().base().record_count(), 3);

    let mut second = layer.get_feature(2).unwrap();
    assert!(second.field(2).is_null());
    second.set_field(2, 7);
    layer.set_feature(&second).unwrap();

    let flags: Vec<_> = {
        layer.reset_reading();
        let mut flags = Vec::new();
        while let Some(f) = layer.next_feature().unwrap() {
            flags.push(f.field(2).as_i64());
        }
        flags
    };
    assert_eq!(flags, [None, Some(7), None, Some(1)]);

    layer.sync_to_disk().unwrap();
    assert_eq!(layer.inner().base().record_count(), 4);
    assert_eq!(layer.get_feature(2).unwrap().field(2), &FieldValue::Integer(7));
    let last = layer.get_feature(4).unwrap();
    assert_eq!(last.field(0), &FieldValue::Integer(4444));
    assert_eq!(last.field(1), &FieldValue::String("delta".into()));
}

#[test]
fn test_rename_field_rewrites_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("names.csv");
    let options = LayerCreationOptions::new(TableType::Delimited)
        .with_line_ending(LineEnding::Lf)
        .with_create_vrt(false);
    let mut table = Pds4Table::create("names", &path, &options, None, GeometryType::NONE).unwrap();
    table.create_field(&FieldDefn::new("id", FieldType::Integer)).unwrap();
    table.create_field(&FieldDefn::new("nm", FieldType::String)).unwrap();
    for (id, name) in [(1, "a"), (2, "b")] {
        let mut feature = new_feature(&table);
        feature.set_field(0, id);
        feature.set_field(1, name);
        table.create_feature(&mut feature).unwrap();
    }

    let mut layer = EditableLayer::new(table);
    layer.alter_field_name(1, "name").unwrap();
    assert!(layer.is_modified());
    assert!(layer.alter_field_name(5, "x").is_err());

    layer.sync_to_disk().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "id,name\n1,a\n2,b\n");
    assert_eq!(layer.inner().layer_defn().field_index("name"), Some(1));
}

// ============================================================================
// Delimited updates
// ============================================================================

#[test]
fn test_delimited_update_is_buffered_until_sync() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("d.csv");
    let options = LayerCreationOptions::new(TableType::Delimited)
        .with_line_ending(LineEnding::Lf)
        .with_create_vrt(false);
    let mut table = Pds4Table::create("d", &path, &options, None, GeometryType::NONE).unwrap();
    table.create_field(&FieldDefn::new("id", FieldType::Integer)).unwrap();
    table.create_field(&FieldDefn::new("v", FieldType::String)).unwrap();
    for (id, v) in [(1, "a"), (2, "b")] {
        let mut feature = new_feature(&table);
        feature.set_field(0, id);
        feature.set_field(1, v);
        table.create_feature(&mut feature).unwrap();
    }
    let label = write_label_for(&table, "d.xml");

    let mut layer = EditableLayer::new(table);
    let mut feature = layer.get_feature(2).unwrap();
    feature.set_field(1, "changed");
    layer.set_feature(&feature).unwrap();

    assert!(layer.is_modified());
    assert_eq!(fs::read_to_string(&path).unwrap(), "id,v\n1,a\n2,b\n");
    assert_eq!(
        layer.get_feature(2).unwrap().field(1),
        &FieldValue::String("changed".into())
    );

    let mut beyond = feature.clone();
    beyond.set_fid(Some(3));
    assert!(layer.set_feature(&beyond).is_err());

    let stats = layer.sync_to_disk().unwrap();
    assert_eq!(stats.feature_count, 2);
    assert_eq!(fs::read_to_string(&path).unwrap(), "id,v\n1,a\n2,changed\n");
    drop(layer);

    let mut table = reopen(&label, &OpenOptions::new());
    assert_eq!(
        table.get_feature(2).unwrap().field(1),
        &FieldValue::String("changed".into())
    );
}

// ============================================================================
// Write-through and failure handling
// ============================================================================

#[test]
fn test_empty_table_writes_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("w.dat");
    let options = LayerCreationOptions::new(TableType::Character);
    let table = Pds4Table::create("w", &path, &options, None, GeometryType::NONE).unwrap();

    let mut layer = EditableLayer::new(table);
    layer.create_field(&FieldDefn::new("n", FieldType::Integer)).unwrap();
    assert!(!layer.is_modified());
    assert_eq!(layer.inner().layer_defn().field_count(), 1);

    let mut feature = Feature::new(Arc::clone(layer.layer_defn()));
    feature.set_field(0, 5);
    layer.create_feature(&mut feature).unwrap();
    assert!(!layer.is_modified());
    assert_eq!(layer.inner().base().record_count(), 1);
    assert_eq!(fs::read(&path).unwrap().len(), 11 + 2);

    feature.set_field(0, 6);
    layer.set_feature(&feature).unwrap();
    assert!(!layer.is_modified());

    layer
        .create_field(&FieldDefn::new("late", FieldType::Real))
        .unwrap();
    assert!(layer.is_modified());
    assert!(layer
        .create_field(&FieldDefn::new("late", FieldType::Real))
        .is_err());

    assert_eq!(layer.sync_to_disk().unwrap().field_count, 2);
    assert_eq!(layer.sync_to_disk().unwrap(), SyncStats::new());
}

#[test]
fn test_failed_sync_keeps_original() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.dat");
    let mut layer = EditableLayer::new(create_character_table(&path));
    layer
        .create_field(&FieldDefn::new("flag", FieldType::Integer))
        .unwrap();
    let original = fs::read(&path).unwrap();

    let blocker = dir.path().join("rows.dat.tmp");
    fs::create_dir(&blocker).unwrap();
    assert!(layer.sync_to_disk().is_err());

    assert!(layer.is_modified());
    assert_eq!(fs::read(&path).unwrap(), original);
    assert_eq!(layer.inner().layer_defn().field_count(), 2);
    assert_eq!(layer.feature_count().unwrap(), 3);
    assert_eq!(
        layer.get_feature(3).unwrap().field(1),
        &FieldValue::String("gamma".into())
    );

    fs::remove_dir(&blocker).unwrap();
    let stats = layer.sync_to_disk().unwrap();
    assert_eq!(stats.feature_count, 3);
    assert_eq!(fs::read_to_string(&path).unwrap(), rows_file(11));
}

#[test]
fn test_filters_apply_to_edited_view() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.dat");
    let mut layer = EditableLayer::new(create_character_table(&path));
    layer
        .create_field(&FieldDefn::new("flag", FieldType::Integer))
        .unwrap();
    let mut feature = layer.get_feature(1).unwrap();
    feature.set_field(2, 1);
    layer.set_feature(&feature).unwrap();

    layer.set_attribute_filter(Some(AttributeFilter::IsNull("flag".into())));
    assert_eq!(layer.feature_count().unwrap(), 2);
    layer.set_attribute_filter(None);
    assert_eq!(layer.feature_count().unwrap(), 3);
}
