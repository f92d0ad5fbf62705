// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Fixed-width table integration tests.
//!
//! Tables are created through the public API, described by a label built
//! from their table definition, and reopened from that label.

mod common;

use std::fs;

use common::{collect_features, create_character_table, new_feature, reopen, table_def, value, write_label_for};
use pds4table::{
    DataType, FieldDefn, FieldMetadata, FieldType, FieldValue, FixedWidthTable, GeometryType,
    LayerCreationOptions, OpenOptions, Pds4Table, TableError, TableKind, TableLayer, TableType,
};

fn create_binary_pair(path: &std::path::Path) -> Pds4Table {
    let options = LayerCreationOptions::new(TableType::Binary);
    let mut table = Pds4Table::create("bin", path, &options, None, GeometryType::NONE).unwrap();
    table
        .create_field_with_metadata(
            &FieldDefn::new("count", FieldType::Integer64),
            Some(&FieldMetadata::new(DataType::parse("UnsignedLSB4"))),
        )
        .unwrap();
    table
        .create_field_with_metadata(
            &FieldDefn::new("value", FieldType::Real),
            Some(&FieldMetadata::new(DataType::parse("IEEE754LSBDouble"))),
        )
        .unwrap();
    table
}

#[test]
fn test_binary_record_exact_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bin.dat");
    let mut table = create_binary_pair(&path);

    let mut feature = new_feature(&table);
    feature.set_field(0, 42);
    feature.set_field(1, 3.5);
    table.create_feature(&mut feature).unwrap();
    assert_eq!(feature.fid(), Some(1));

    let bytes = fs::read(&path).unwrap();
    assert_eq!(
        bytes,
        vec![0x2A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x40]
    );

    let read = table.get_feature(1).unwrap();
    assert_eq!(read.field(0), &FieldValue::Integer64(42));
    assert_eq!(read.field(1), &FieldValue::Real(3.5));

    let def = table.table_def();
    assert_eq!(def.name, "Table_Binary");
    assert_eq!(def.value("Record_Binary.record_length"), Some("12"));
    assert_eq!(def.value("record_delimiter"), None);

    let label = write_label_for(&table, "bin.xml");
    let mut reopened = reopen(&label, &OpenOptions::new());
    assert_eq!(reopened.kind(), TableKind::Binary);
    assert_eq!(reopened.feature_count().unwrap(), 1);
    let read = reopened.get_feature(1).unwrap();
    assert_eq!(value(&read, "count"), &FieldValue::Integer64(42));
    assert_eq!(value(&read, "value"), &FieldValue::Real(3.5));
}

#[test]
fn test_set_feature_leaves_neighbours_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.dat");
    let mut table = create_character_table(&path);
    let record_size = match &table {
        Pds4Table::FixedWidth(t) => t.record_size(),
        Pds4Table::Delimited(_) => unreachable!("character table expected"),
    };
    assert_eq!(record_size, 11 + 8 + 2);

    let before = fs::read(&path).unwrap();
    assert_eq!(before.len(), 3 * record_size);

    let mut feature = table.get_feature(2).unwrap();
    feature.set_field(0, 9);
    feature.set_field(1, "z");
    table.set_feature(&feature).unwrap();

    let after = fs::read(&path).unwrap();
    assert_eq!(after.len(), before.len());
    assert_eq!(&after[..record_size], &before[..record_size]);
    assert_eq!(&after[2 * record_size..], &before[2 * record_size..]);
    assert_eq!(&after[record_size..2 * record_size], b"          9z       \r\n");

    let read = table.get_feature(2).unwrap();
    assert_eq!(read.field(0), &FieldValue::Integer(9));
    assert_eq!(read.field(1), &FieldValue::String("z".into()));
    assert_eq!(table.get_feature(1).unwrap().field(0), &FieldValue::Integer(1));
    assert_eq!(table.get_feature(3).unwrap().field(1), &FieldValue::String("gamma".into()));
}

#[test]
fn test_fid_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let mut table = create_character_table(&dir.path().join("rows.dat"));

    assert!(table.get_feature(0).unwrap_err().is_non_existing_feature());
    assert!(table.get_feature(4).unwrap_err().is_non_existing_feature());

    let mut feature = new_feature(&table);
    feature.set_fid(Some(7));
    assert!(table.set_feature(&feature).unwrap_err().is_non_existing_feature());
}

#[test]
fn test_unset_fields_read_back_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let mut table = create_character_table(&dir.path().join("rows.dat"));
    let mut feature = new_feature(&table);
    feature.set_field(0, 5);
    table.create_feature(&mut feature).unwrap();
    let read = table.get_feature(4).unwrap();
    assert_eq!(read.field(0), &FieldValue::Integer(5));
    assert!(read.field(1).is_null());

    let path = dir.path().join("bin.dat");
    let options = LayerCreationOptions::new(TableType::Binary);
    let mut binary = Pds4Table::create("bin", &path, &options, None, GeometryType::NONE).unwrap();
    let mut meta = FieldMetadata::new(DataType::parse("SignedMSB2"));
    meta.set_missing_constant("-999");
    binary
        .create_field_with_metadata(&FieldDefn::new("q", FieldType::Integer), Some(&meta))
        .unwrap();
    binary
        .create_field_with_metadata(
            &FieldDefn::new("value", FieldType::Real),
            Some(&FieldMetadata::new(DataType::parse("IEEE754LSBDouble"))),
        )
        .unwrap();
    let mut feature = new_feature(&binary);
    feature.set_field(1, -1.25);
    binary.create_feature(&mut feature).unwrap();

    assert_eq!(&fs::read(&path).unwrap()[..2], &[0xFC, 0x19]);
    let read = binary.get_feature(1).unwrap();
    assert!(read.field(0).is_null());
    assert_eq!(read.field(1), &FieldValue::Real(-1.25));
}

#[test]
fn test_binary_value_matching_fill_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bin.dat");
    let mut table = create_binary_pair(&path);

    let mut feature = new_feature(&table);
    feature.set_field(0, 0x2020_2020_i64);
    feature.set_field(1, f64::from_le_bytes([b' '; 8]));
    table.create_feature(&mut feature).unwrap();
    assert_eq!(fs::read(&path).unwrap(), vec![b' '; 12]);

    let read = table.get_feature(1).unwrap();
    assert_eq!(read.field(0), &FieldValue::Integer64(538_976_288));
    assert_eq!(read.field(1), &FieldValue::Real(f64::from_le_bytes([b' '; 8])));
}

#[test]
fn test_group_fields_from_label() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("g.dat"), b"07 1 2 3 4 5 6\r\n12 0 0 0 0 0 9\r\n").unwrap();
    let label = dir.path().join("g.xml");
    fs::write(
        &label,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Product_Observational xmlns="http://pds.nasa.gov/pds4/pds/v1">
  <Identification_Area><logical_identifier>urn:nasa:pds:test:g</logical_identifier></Identification_Area>
  <File_Area_Observational>
    <File><file_name>g.dat</file_name></File>
    <Table_Character>
      <local_identifier>grid</local_identifier>
      <offset unit="byte">0</offset>
      <records>2</records>
      <record_delimiter>Carriage-Return Line-Feed</record_delimiter>
      <Record_Character>
        <fields>1</fields><groups>1</groups>
        <record_length unit="byte">16</record_length>
        <Field_Character>
          <name>id</name><field_number>1</field_number>
          <field_location unit="byte">1</field_location>
          <data_type>ASCII_Integer</data_type><field_length unit="byte">2</field_length>
        </Field_Character>
        <Group_Field_Character>
          <repetitions>3</repetitions><fields>2</fields><groups>0</groups>
          <group_location unit="byte">3</group_location><group_length unit="byte">12</group_length>
          <Field_Character>
            <name>x</name><field_location unit="byte">1</field_location>
            <data_type>ASCII_Integer</data_type><field_length unit="byte">2</field_length>
          </Field_Character>
          <Field_Character>
            <name>y</name><field_location unit="byte">3</field_location>
            <data_type>ASCII_Integer</data_type><field_length unit="byte">2</field_length>
          </Field_Character>
        </Group_Field_Character>
      </Record_Character>
    </Table_Character>
  </File_Area_Observational>
</Product_Observational>
"#,
    )
    .unwrap();

    let mut table = reopen(&label, &OpenOptions::new());
    assert_eq!(table.name(), "grid");
    let names: Vec<_> = table.layer_defn().fields().iter().map(|f| f.name.clone()).collect();
    assert_eq!(names, ["id", "x_1", "y_1", "x_2", "y_2", "x_3", "y_3"]);

    let features = collect_features(&mut table);
    assert_eq!(features.len(), 2);
    assert_eq!(value(&features[0], "id"), &FieldValue::Integer(7));
    assert_eq!(value(&features[0], "y_2"), &FieldValue::Integer(4));
    assert_eq!(value(&features[1], "y_3"), &FieldValue::Integer(9));
}

#[test]
fn test_read_only_table_rejects_writes() {
    let dir = tempfile::tempdir().unwrap();
    let table = create_character_table(&dir.path().join("rows.dat"));
    let label = write_label_for(&table, "rows.xml");
    drop(table);

    let mut table = reopen(&label, &OpenOptions::new());
    assert_eq!(table.feature_count().unwrap(), 3);
    let feature = table.get_feature(1).unwrap();
    assert!(matches!(table.set_feature(&feature), Err(TableError::ReadOnly { .. })));
    let mut feature = new_feature(&table);
    assert!(matches!(table.create_feature(&mut feature), Err(TableError::ReadOnly { .. })));
}

#[test]
fn test_binary_type_rejected_in_character_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.dat");
    fs::write(&path, b"").unwrap();
    let def = table_def(
        "<Table_Character><offset>0</offset><records>0</records>\
         <record_delimiter>Line-Feed</record_delimiter>\
         <Record_Character><record_length>5</record_length>\
           <Field_Character><name>v</name><field_location>1</field_location>\
             <data_type>SignedMSB4</data_type><field_length>4</field_length></Field_Character>\
         </Record_Character></Table_Character>",
    );
    let err = FixedWidthTable::open("t", &def, &path, &OpenOptions::new()).unwrap_err();
    assert!(matches!(err, TableError::InvalidSchema { .. }));
}

#[test]
fn test_point_table_with_coordinate_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pts.dat");
    let options = LayerCreationOptions::from_strings(&["TABLE_TYPE=CHARACTER", "GEOM_COLUMNS=LONG_LAT"]).unwrap();
    let mut table = Pds4Table::create("pts", &path, &options, None, GeometryType::POINT).unwrap();
    table.create_field(&FieldDefn::new("name", FieldType::String).with_width(4)).unwrap();
    assert_eq!(table.layer_defn().field_count(), 1);

    let mut feature = new_feature(&table);
    feature.set_field(0, "p1");
    feature.set_geometry(Some(pds4table::Geometry::point(-120.5, 35.25)));
    table.create_feature(&mut feature).unwrap();

    let read = table.get_feature(1).unwrap();
    let point = read.geometry().and_then(|g| g.as_point()).copied().unwrap();
    common::assert_close(point.x, -120.5);
    common::assert_close(point.y, 35.25);

    let label = write_label_for(&table, "pts.xml");
    let mut reopened = reopen(&label, &OpenOptions::new().with_keep_geom_columns(true));
    assert_eq!(reopened.layer_defn().geometry_type(), GeometryType::POINT);
    let names: Vec<_> = reopened.layer_defn().fields().iter().map(|f| f.name.clone()).collect();
    assert_eq!(names, ["Latitude", "Longitude", "name"]);
    let read = reopened.get_feature(1).unwrap();
    assert_eq!(value(&read, "Latitude"), &FieldValue::Real(35.25));
}
