// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Fixed-width tables (`Table_Character` and `Table_Binary`).
//!
//! Every record is `record_size` bytes, line ending included. Record `fid`
//! starts at `offset + (fid - 1) * record_size`. Reads and writes go through
//! one scratch buffer owned by the table; writes start from a space-filled
//! buffer. Unset text columns read back as null. An unset binary column
//! holds its declared missing constant, or the fill bytes when it has none.

use std::collections::HashSet;
use std::fmt;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use super::base::{GeomSources, TableBase};
use super::options::{LayerCreationOptions, LineEnding, OpenOptions, TableType};
use super::{Capability, TableKind, TableLayer};
use crate::core::{Feature, FieldDefn, FieldType, FieldValue, Result, TableError};
use crate::encoding::{decode_binary, decode_text, encode_binary, encode_text, DataType, Decoded};
use crate::geometry::{GeometryType, SpatialRef};
use crate::schema::{expand_fixed_width, FieldMetadata, FixedLayout, FixedWidthField, XmlNode};

/// Largest accepted `record_length`.
pub const MAX_RECORD_LENGTH: usize = 1_000_000;

/// Width of a WKT column in a new fixed-width table.
const WKT_COLUMN_WIDTH: usize = 256;

/// Fixed-width table flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedSubtype {
    /// ASCII fields
    Character,
    /// Binary and ASCII fields
    Binary,
}

impl FixedSubtype {
    /// Suffix of the table, record and field element names.
    pub fn as_str(self) -> &'static str {
        match self {
            FixedSubtype::Character => "Character",
            FixedSubtype::Binary => "Binary",
        }
    }

    /// Check if a data type may appear in a record of this subtype.
    pub fn accepts(self, data_type: &DataType) -> bool {
        self == FixedSubtype::Binary || !data_type.is_binary()
    }

    fn default_data_type(self, field: &FieldDefn) -> (DataType, usize) {
        match self {
            FixedSubtype::Character => DataType::default_text(field.field_type, field.subtype, field.width),
            FixedSubtype::Binary => DataType::default_binary(field.field_type, field.subtype, field.width),
        }
    }
}

impl fmt::Display for FixedSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Character or Binary table.
#[derive(Debug)]
pub struct FixedWidthTable {
    base: TableBase,
    subtype: FixedSubtype,
    line_ending: Option<LineEnding>,
    record_size: usize,
    fields: Vec<FixedWidthField>,
    buffer: Vec<u8>,
}

impl FixedWidthTable {
    /// Open the table described by a `Table_Character` or `Table_Binary` element.
    pub fn open(name: &str, definition: &XmlNode, path: &Path, options: &OpenOptions) -> Result<Self> {
        let subtype = match definition.local_name() {
            "Table_Character" => FixedSubtype::Character,
            "Table_Binary" => FixedSubtype::Binary,
            other => {
                return Err(TableError::invalid_schema(
                    name,
                    format!("{other} is not a fixed-width table"),
                ))
            }
        };
        let mut table = Self::empty(TableBase::open(name, path, options)?, subtype, None);
        table.read_table_def(definition)?;
        table.base.setup_geom_field();
        debug!(
            context = "fixed_width_open",
            table = %name,
            subtype = %subtype,
            records = table.base.record_count(),
            record_size = table.record_size,
            "Opened fixed-width table"
        );
        Ok(table)
    }

    /// Create a new, empty table.
    pub fn create(
        name: &str,
        path: &Path,
        options: &LayerCreationOptions,
        srs: Option<&SpatialRef>,
        geometry_type: GeometryType,
    ) -> Result<Self> {
        let subtype = match options.table_type {
            TableType::Character => FixedSubtype::Character,
            TableType::Binary => FixedSubtype::Binary,
            TableType::Delimited => {
                return Err(TableError::unsupported("delimited layout for a fixed-width table"))
            }
        };
        let mut table = Self::empty(
            TableBase::create(name, path)?,
            subtype,
            options.effective_line_ending(),
        );
        table.base.set_column_names(options.columns.clone());
        table.initialize_new_layer(srs, false, geometry_type, options);
        Ok(table)
    }

    fn empty(base: TableBase, subtype: FixedSubtype, line_ending: Option<LineEnding>) -> Self {
        let record_size = line_ending.map_or(0, |le| le.as_bytes().len());
        Self {
            base,
            subtype,
            line_ending,
            record_size,
            fields: Vec::new(),
            buffer: vec![b' '; record_size],
        }
    }

    /// Table flavour.
    pub fn subtype(&self) -> FixedSubtype {
        self.subtype
    }

    /// Record size in bytes, line ending included.
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Record terminator.
    pub fn line_ending(&self) -> Option<LineEnding> {
        self.line_ending
    }

    /// Raw column layout.
    pub fn fields(&self) -> &[FixedWidthField] {
        &self.fields
    }

    fn line_ending_len(&self) -> usize {
        self.line_ending.map_or(0, |le| le.as_bytes().len())
    }

    fn read_table_def(&mut self, definition: &XmlNode) -> Result<()> {
        let table = self.base.name().to_string();
        let invalid = |reason: String| TableError::invalid_schema(&table, reason);

        let offset = non_negative(definition, "offset", &table)?.unwrap_or(0);
        let records = non_negative(definition, "records", &table)?
            .ok_or_else(|| invalid("missing records".to_string()))?;

        self.line_ending = match definition.value("record_delimiter") {
            Some(value) => Some(
                LineEnding::from_record_delimiter(value)
                    .ok_or_else(|| invalid(format!("unsupported record_delimiter '{value}'")))?,
            ),
            None if self.subtype == FixedSubtype::Character => {
                return Err(invalid("missing record_delimiter".to_string()))
            }
            None => None,
        };

        let record_tag = format!("Record_{}", self.subtype);
        let record = definition
            .child(&record_tag)
            .ok_or_else(|| invalid(format!("missing {record_tag}")))?;
        let record_size = non_negative(record, "record_length", &table)?
            .ok_or_else(|| invalid("missing record_length".to_string()))? as usize;
        let le_len = self.line_ending_len();
        if record_size <= le_len || record_size > MAX_RECORD_LENGTH {
            return Err(invalid(format!("invalid record_length {record_size}")));
        }

        let layout = FixedLayout {
            table: &table,
            subtype: self.subtype.as_str(),
            usable: record_size - le_len,
        };
        let fields = expand_fixed_width(record, &layout)?;

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(invalid(format!("duplicate field name '{}'", field.name)));
            }
            let (field_type, subtype) = field.meta.data_type.field_type(Some(field.length));
            self.base.add_raw_field(
                FieldDefn::new(field.name.clone(), field_type)
                    .with_subtype(subtype)
                    .with_width(field.length),
            );
        }

        self.base.offset = offset;
        self.base.feature_count = records as i64;
        self.record_size = record_size;
        self.buffer = vec![b' '; record_size];
        self.fields = fields;
        self.base.clear_header_dirty();
        Ok(())
    }

    /// Add the geometry columns of a new table.
    ///
    /// Point geometry over a geographic SRS (or `force_geographic`), or
    /// `GEOM_COLUMNS=LONG_LAT`, gets real Latitude/Longitude(/Altitude)
    /// columns; any other geometry gets a WKT string column.
    pub fn initialize_new_layer(
        &mut self,
        srs: Option<&SpatialRef>,
        force_geographic: bool,
        geometry_type: GeometryType,
        options: &LayerCreationOptions,
    ) {
        self.base.set_spatial_ref(srs.cloned());
        self.base.feature_count = 0;
        if geometry_type == GeometryType::NONE {
            return;
        }

        let columns = options.columns.clone();
        let mut sources = GeomSources::default();
        if options.uses_coordinate_columns(geometry_type, srs, force_geographic) {
            sources.lat = Some(self.append_default(FieldDefn::new(columns.lat_name(), FieldType::Real)));
            sources.long = Some(self.append_default(FieldDefn::new(columns.long_name(), FieldType::Real)));
            if geometry_type.has_z {
                sources.alt = Some(self.append_default(FieldDefn::new(columns.alt_name(), FieldType::Real)));
            }
        } else {
            sources.wkt = Some(self.append_default(
                FieldDefn::new(columns.wkt_name(), FieldType::String).with_width(WKT_COLUMN_WIDTH),
            ));
        }
        self.base.set_geom_sources(sources, geometry_type);
    }

    fn append_default(&mut self, field: FieldDefn) -> usize {
        let (data_type, length) = self.subtype.default_data_type(&field);
        self.append_field(field, FieldMetadata::new(data_type), length)
    }

    fn append_field(&mut self, mut field: FieldDefn, meta: FieldMetadata, length: usize) -> usize {
        let offset = self.fields.last().map_or(0, FixedWidthField::end);
        field.width = length;
        self.fields.push(FixedWidthField {
            name: field.name.clone(),
            offset,
            length,
            meta,
        });
        self.record_size = offset + length + self.line_ending_len();
        self.buffer.resize(self.record_size, b' ');
        self.base.add_raw_field(field)
    }

    fn record_position(&self, fid: i64) -> u64 {
        self.base.offset + (fid as u64 - 1) * self.record_size as u64
    }

    fn read_record(&mut self, fid: i64) -> Result<()> {
        let position = self.record_position(fid);
        let path = self.base.filename().to_path_buf();
        let file = self.base.file_mut()?;
        file.seek(SeekFrom::Start(position))
            .map_err(|e| TableError::io(&path, e))?;
        file.read_exact(&mut self.buffer)
            .map_err(|e| TableError::io(&path, e))
    }

    fn write_record(&mut self, fid: i64) -> Result<()> {
        let position = self.record_position(fid);
        let path = self.base.filename().to_path_buf();
        let file = self.base.file_mut()?;
        file.seek(SeekFrom::Start(position))
            .map_err(|e| TableError::io(&path, e))?;
        file.write_all(&self.buffer)
            .map_err(|e| TableError::io(&path, e))
    }

    /// Raw bytes of one record.
    pub fn read_raw_record(&mut self, fid: i64) -> Result<Vec<u8>> {
        self.base.check_fid(fid)?;
        self.read_record(fid)?;
        Ok(self.buffer.clone())
    }

    fn decode_record(&self, fid: i64) -> Feature {
        let mut raw = Feature::new(Arc::clone(self.base.raw_defn()));
        raw.set_fid(Some(fid));
        for (i, field) in self.fields.iter().enumerate() {
            let bytes = &self.buffer[field.offset..field.end()];
            let data_type = &field.meta.data_type;
            let missing = field.meta.missing_constant();
            let value = if data_type.is_binary() {
                match decode_binary(data_type, bytes) {
                    Ok(v) if is_missing_number(&v, missing) => FieldValue::Null,
                    Ok(v) => v,
                    Err(e) => {
                        warn!(context = "decode_record", fid, field = %field.name, error = %e, "Cannot decode binary field");
                        FieldValue::Null
                    }
                }
            } else {
                let text = String::from_utf8_lossy(bytes);
                let token = text.trim();
                if missing == Some(token) {
                    FieldValue::Null
                } else {
                    match decode_text(data_type, token) {
                        Decoded::Value(v) => v,
                        Decoded::Invalid => {
                            warn!(
                                context = "decode_record",
                                fid,
                                field = %field.name,
                                data_type = %data_type,
                                token = %token,
                                "Invalid value, read as null"
                            );
                            FieldValue::Null
                        }
                    }
                }
            };
            raw.set_field(i, value);
        }
        raw
    }

    fn encode_record(&mut self, raw: &Feature) {
        self.buffer.fill(b' ');
        for (i, field) in self.fields.iter().enumerate() {
            let value = raw.field(i);
            let slot = &mut self.buffer[field.offset..field.end()];
            if !value.is_null() {
                encode_field(self.subtype, field, value, slot);
            } else if let Some(missing) = field
                .meta
                .missing_constant()
                .filter(|_| field.meta.data_type.is_binary())
            {
                encode_field(self.subtype, field, &FieldValue::from(missing), slot);
            }
        }
        if let Some(le) = self.line_ending {
            let bytes = le.as_bytes();
            let start = self.buffer.len() - bytes.len();
            self.buffer[start..].copy_from_slice(bytes);
        }
    }

    fn field_position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    fn check_metadata(&self, field: &FixedWidthField, metadata: &FieldMetadata) -> Result<()> {
        let data_type = &metadata.data_type;
        if !self.subtype.accepts(data_type) {
            return Err(TableError::invalid_schema(
                self.base.name(),
                format!("binary data type {data_type} in a character table"),
            ));
        }
        if let Some(width) = data_type.binary_width() {
            if width != field.length {
                return Err(TableError::invalid_schema(
                    self.base.name(),
                    format!("{data_type} needs field_length {width}, '{}' has {}", field.name, field.length),
                ));
            }
        }
        Ok(())
    }
}

fn encode_field(subtype: FixedSubtype, field: &FixedWidthField, value: &FieldValue, slot: &mut [u8]) {
    let data_type = &field.meta.data_type;
    if data_type.is_binary() {
        match encode_binary(data_type, value, slot) {
            Ok(true) => {}
            Ok(false) => warn!(
                context = "encode_field",
                field = %field.name,
                value = %value,
                "Value has no binary representation, not written"
            ),
            Err(e) => warn!(context = "encode_field", field = %field.name, error = %e, "Cannot encode binary field"),
        }
        return;
    }
    if let DataType::Unsupported(tag) = data_type {
        warn!(context = "encode_field", field = %field.name, data_type = %tag, "Writing this data type is not supported");
        return;
    }

    let Some(text) = encode_text(data_type, value, Some(field.length), field.meta.field_format.as_ref()) else {
        warn!(
            context = "encode_field",
            field = %field.name,
            data_type = %data_type,
            value = %value,
            "Value cannot be written as this data type"
        );
        return;
    };

    let mut bytes = text.as_bytes();
    if bytes.len() > slot.len() {
        if subtype == FixedSubtype::Character && data_type.is_string() {
            let mut end = slot.len();
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            warn!(
                context = "encode_field",
                field = %field.name,
                length = field.length,
                "Value truncated to field length"
            );
            bytes = &bytes[..end];
        } else {
            warn!(
                context = "encode_field",
                field = %field.name,
                length = field.length,
                value = %text,
                "Value too wide for field, not written"
            );
            return;
        }
    }
    if data_type.is_numeric_text() {
        let start = slot.len() - bytes.len();
        slot[start..].copy_from_slice(bytes);
    } else {
        slot[..bytes.len()].copy_from_slice(bytes);
    }
}

fn is_missing_number(value: &FieldValue, missing: Option<&str>) -> bool {
    match (missing.and_then(|m| m.trim().parse::<f64>().ok()), value.as_f64()) {
        (Some(m), Some(v)) => m == v,
        _ => false,
    }
}

fn non_negative(node: &XmlNode, key: &str, table: &str) -> Result<Option<u64>> {
    match node.value(key) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<u64>().map(Some).map_err(|_| {
            TableError::invalid_schema(table, format!("invalid {key} '{raw}'"))
        }),
    }
}

impl TableLayer for FixedWidthTable {
    fn base(&self) -> &TableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut TableBase {
        &mut self.base
    }

    fn kind(&self) -> TableKind {
        match self.subtype {
            FixedSubtype::Character => TableKind::Character,
            FixedSubtype::Binary => TableKind::Binary,
        }
    }

    fn reset_reading(&mut self) {
        self.base.next_fid = 1;
    }

    fn next_raw_feature(&mut self) -> Result<Option<Feature>> {
        let fid = self.base.next_fid;
        if fid > self.base.record_count() {
            return Ok(None);
        }
        self.base.next_fid += 1;
        self.read_record(fid)?;
        Ok(Some(self.decode_record(fid)))
    }

    fn get_feature(&mut self, fid: i64) -> Result<Feature> {
        self.base.check_fid(fid)?;
        self.read_record(fid)?;
        let raw = self.decode_record(fid);
        Ok(self.base.add_geometry_from_fields(&raw))
    }

    fn set_feature(&mut self, feature: &Feature) -> Result<()> {
        self.base.require_update("set feature")?;
        let fid = feature.fid().ok_or_else(|| TableError::non_existing_feature(0))?;
        self.base.check_fid(fid)?;
        let raw = self.base.add_fields_from_geometry(feature);
        self.encode_record(&raw);
        self.write_record(fid)
    }

    fn create_feature(&mut self, feature: &mut Feature) -> Result<()> {
        self.base.require_update("create feature")?;
        self.base.feature_count += 1;
        let fid = self.base.feature_count;
        feature.set_fid(Some(fid));
        let raw = self.base.add_fields_from_geometry(feature);
        self.encode_record(&raw);
        if let Err(e) = self.write_record(fid) {
            self.base.feature_count -= 1;
            feature.set_fid(None);
            return Err(e);
        }
        self.base.mark_header_dirty();
        Ok(())
    }

    fn create_field_with_metadata(
        &mut self,
        field: &FieldDefn,
        metadata: Option<&FieldMetadata>,
    ) -> Result<()> {
        self.base.require_update("create field")?;
        if self.base.record_count() > 0 {
            return Err(TableError::non_empty_layer(self.base.name(), "create field"));
        }
        if self.field_position(&field.name).is_some() {
            return Err(TableError::invalid_schema(
                self.base.name(),
                format!("field '{}' already exists", field.name),
            ));
        }

        let (default_type, default_length) = self.subtype.default_data_type(field);
        let (meta, length) = match metadata {
            Some(m) if self.subtype.accepts(&m.data_type) => {
                let length = m.data_type.binary_width().unwrap_or_else(|| {
                    if default_type.is_binary() {
                        DataType::default_text(field.field_type, field.subtype, field.width).1
                    } else {
                        default_length
                    }
                });
                (m.clone(), length)
            }
            Some(m) => {
                warn!(
                    context = "create_field",
                    field = %field.name,
                    data_type = %m.data_type,
                    "Data type not allowed in this table, using the default"
                );
                let mut meta = m.clone();
                meta.data_type = default_type;
                (meta, default_length)
            }
            None => (FieldMetadata::new(default_type), default_length),
        };
        self.append_field(field.clone(), meta, length);
        Ok(())
    }

    fn field_metadata(&self, name: &str) -> Option<FieldMetadata> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.meta.clone())
    }

    fn set_field_metadata(&mut self, name: &str, metadata: &FieldMetadata) -> Result<()> {
        let index = self
            .field_position(name)
            .ok_or_else(|| TableError::field_not_found(name))?;
        let field = &self.fields[index];
        if field.meta.data_type != metadata.data_type {
            if self.base.record_count() > 0 {
                return Err(TableError::non_empty_layer(self.base.name(), "change data type"));
            }
            self.check_metadata(field, metadata)?;
            let (field_type, subtype) = metadata.data_type.field_type(Some(field.length));
            let defn = FieldDefn::new(name, field_type)
                .with_subtype(subtype)
                .with_width(field.length);
            self.base.replace_raw_field(index, defn);
        }
        self.fields[index].meta = metadata.clone();
        self.base.mark_header_dirty();
        Ok(())
    }

    fn table_def(&self) -> XmlNode {
        let mut record = XmlNode::new(format!("Record_{}", self.subtype))
            .child_node(XmlNode::with_text("fields", self.fields.len().to_string()))
            .child_node(XmlNode::with_text("groups", "0"))
            .child_node(
                XmlNode::with_text("record_length", self.record_size.to_string()).attr("unit", "byte"),
            );
        for (i, field) in self.fields.iter().enumerate() {
            record.push(field.to_xml(self.subtype.as_str(), i + 1));
        }

        let mut table = XmlNode::new(format!("Table_{}", self.subtype))
            .child_node(XmlNode::with_text("local_identifier", self.base.name()))
            .child_node(XmlNode::with_text("offset", self.base.offset.to_string()).attr("unit", "byte"))
            .child_node(XmlNode::with_text("records", self.base.record_count().to_string()));
        if let Some(le) = self.line_ending {
            table.push(XmlNode::with_text("record_delimiter", le.record_delimiter()));
        }
        table.push(record);
        table
    }

    fn test_capability(&self, capability: Capability) -> bool {
        let update = self.base.access().is_update();
        match capability {
            Capability::RandomRead | Capability::ZGeometries => true,
            Capability::FastFeatureCount => !self.base.filters().is_active(),
            Capability::SequentialWrite | Capability::RandomWrite => update,
            Capability::CreateField => update && self.base.record_count() == 0,
        }
    }

    fn create_for_rewrite(&self, path: &Path) -> Result<Self> {
        let mut table = Self::empty(
            TableBase::create(self.base.name(), path)?,
            self.subtype,
            self.line_ending,
        );
        table.base.set_spatial_ref(self.base.defn().spatial_ref().cloned());
        table.base.set_column_names(self.base.column_names().clone());

        let source = self.base.geom_sources();
        let mut sources = GeomSources::default();
        for (slot, index) in [
            (&mut sources.lat, source.lat),
            (&mut sources.long, source.long),
            (&mut sources.alt, source.alt),
            (&mut sources.wkt, source.wkt),
        ] {
            if let Some(i) = index {
                let defn = self.base.raw_defn().fields()[i].clone();
                let field = &self.fields[i];
                *slot = Some(table.append_field(defn, field.meta.clone(), field.length));
            }
        }
        table.base.set_geom_sources(sources, self.base.defn().geometry_type());
        debug!(
            context = "create_for_rewrite",
            table = %self.base.name(),
            path = %path.display(),
            "Created rewrite target"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_document;

    fn character_def(records: usize) -> XmlNode {
        parse_document(&format!(
            r#"<Table_Character>
                 <offset unit="byte">0</offset>
                 <records>{records}</records>
                 <record_delimiter>Carriage-Return Line-Feed</record_delimiter>
                 <Record_Character>
                   <fields>2</fields><groups>0</groups>
                   <record_length unit="byte">12</record_length>
                   <Field_Character><name>id</name><field_location>1</field_location>
                     <data_type>ASCII_Integer</data_type><field_length>4</field_length></Field_Character>
                   <Field_Character><name>label</name><field_location>5</field_location>
                     <data_type>ASCII_String</data_type><field_length>6</field_length></Field_Character>
                 </Record_Character>
               </Table_Character>"#
        ))
        .unwrap()
    }

    #[test]
    fn test_read_character_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dat");
        std::fs::write(&path, b"   1alpha \r\n  22      \r\n").unwrap();
        let mut table = FixedWidthTable::open("t", &character_def(2), &path, &OpenOptions::new()).unwrap();
        assert_eq!(table.kind(), TableKind::Character);
        assert_eq!(table.record_size(), 12);

        let first = table.get_feature(1).unwrap();
        assert_eq!(first.field(0), &FieldValue::Integer(1));
        assert_eq!(first.field(1), &FieldValue::String("alpha".into()));
        let second = table.get_feature(2).unwrap();
        assert_eq!(second.field(0), &FieldValue::Integer(22));
        assert!(second.field(1).is_null());
        assert!(table.get_feature(3).unwrap_err().is_non_existing_feature());
    }

    #[test]
    fn test_set_feature_requires_update() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dat");
        std::fs::write(&path, b"   1alpha \r\n").unwrap();
        let mut table = FixedWidthTable::open("t", &character_def(1), &path, &OpenOptions::new()).unwrap();
        let feature = table.get_feature(1).unwrap();
        assert!(matches!(
            table.set_feature(&feature),
            Err(TableError::ReadOnly { .. })
        ));
    }

    #[test]
    fn test_missing_record_delimiter_is_invalid() {
        let def = parse_document(
            "<Table_Character><offset>0</offset><records>0</records>\
             <Record_Character><record_length>4</record_length></Record_Character></Table_Character>",
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dat");
        std::fs::write(&path, b"").unwrap();
        let err = FixedWidthTable::open("t", &def, &path, &OpenOptions::new()).unwrap_err();
        assert!(matches!(err, TableError::InvalidSchema { .. }));
    }

    #[test]
    fn test_string_truncates_number_drops() {
        let mut buffer = vec![b' '; 4];
        let field = FixedWidthField {
            name: "s".into(),
            offset: 0,
            length: 4,
            meta: FieldMetadata::new(DataType::Utf8String),
        };
        encode_field(FixedSubtype::Character, &field, &FieldValue::from("abcdef"), &mut buffer);
        assert_eq!(&buffer, b"abcd");

        let mut buffer = vec![b' '; 4];
        encode_field(FixedSubtype::Binary, &field, &FieldValue::from("abcdef"), &mut buffer);
        assert_eq!(&buffer, b"    ");

        let field = FixedWidthField {
            name: "n".into(),
            offset: 0,
            length: 4,
            meta: FieldMetadata::new(DataType::AsciiInteger),
        };
        encode_field(FixedSubtype::Character, &field, &FieldValue::from(123456), &mut buffer);
        assert_eq!(&buffer, b"    ");
        encode_field(FixedSubtype::Character, &field, &FieldValue::from(42), &mut buffer);
        assert_eq!(&buffer, b"  42");
    }

    #[test]
    fn test_create_field_layout_and_table_def() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.dat");
        let options = LayerCreationOptions::new(TableType::Character);
        let mut table =
            FixedWidthTable::create("new", &path, &options, None, GeometryType::NONE).unwrap();
        table.create_field(&FieldDefn::new("n", FieldType::Integer)).unwrap();
        table.create_field(&FieldDefn::new("s", FieldType::String).with_width(8)).unwrap();
        assert_eq!(table.record_size(), 11 + 8 + 2);
        assert_eq!(table.fields()[1].offset, 11);

        let def = table.table_def();
        assert_eq!(def.name, "Table_Character");
        assert_eq!(def.value("record_delimiter"), Some("Carriage-Return Line-Feed"));
        assert_eq!(def.value("Record_Character.record_length"), Some("21"));

        let mut feature = Feature::new(Arc::clone(table.layer_defn()));
        feature.set_field(0, 7);
        table.create_feature(&mut feature).unwrap();
        assert_eq!(feature.fid(), Some(1));
        assert!(matches!(
            table.create_field(&FieldDefn::new("late", FieldType::Real)),
            Err(TableError::NonEmptyLayer { .. })
        ));
    }

    #[test]
    fn test_wkt_column_for_non_point_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.dat");
        let options = LayerCreationOptions::new(TableType::Binary);
        let table =
            FixedWidthTable::create("g", &path, &options, None, GeometryType::POINT).unwrap();
        assert_eq!(table.fields()[0].name, "WKT");
        assert_eq!(table.fields()[0].length, WKT_COLUMN_WIDTH);
        assert_eq!(table.layer_defn().field_count(), 0);
        assert_eq!(table.layer_defn().geometry_type(), GeometryType::POINT);
    }
}
