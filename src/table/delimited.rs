// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Delimited tables (`Table_Delimited`).
//!
//! One record per line, fields separated by a single delimiter character.
//! Values containing the delimiter are double-quoted, with embedded quotes
//! doubled. Tables created here start with a header line of column names;
//! `offset` points past it. Random access is a scan from the first record.
//!
//! The geometry columns of a new table are created by the caller (a
//! `create_field` with the column's name and type binds it) or, failing
//! that, appended by the first `create_feature`.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::base::{GeomSources, TableBase};
use super::options::{FieldDelimiter, LayerCreationOptions, LineEnding, OpenOptions, TableType};
use super::sidecar::{sidecar_path, write_sidecar};
use super::{Capability, TableKind, TableLayer};
use crate::core::{Feature, FieldDefn, FieldType, Result, TableError};
use crate::encoding::{decode_text, encode_text, DataType, Decoded};
use crate::geometry::{GeometryType, SpatialRef};
use crate::schema::{expand_delimited, DelimitedField, FieldMetadata, XmlNode};

/// A delimited table.
#[derive(Debug)]
pub struct DelimitedTable {
    base: TableBase,
    line_ending: LineEnding,
    delimiter: FieldDelimiter,
    fields: Vec<DelimitedField>,
    reader: Option<BufReader<File>>,
    header_written: bool,
    /// Geometry columns not created yet
    pending_geom: Vec<PendingColumn>,
    create_vrt: bool,
}

impl DelimitedTable {
    /// Open the table described by a `Table_Delimited` element.
    pub fn open(name: &str, definition: &XmlNode, path: &Path, options: &OpenOptions) -> Result<Self> {
        if definition.local_name() != "Table_Delimited" {
            return Err(TableError::invalid_schema(
                name,
                format!("{} is not a delimited table", definition.local_name()),
            ));
        }
        let base = TableBase::open(name, path, options)?;
        let create_vrt = options.access.is_update() && sidecar_path(path).exists();
        let mut table = Self::empty(base, LineEnding::default(), FieldDelimiter::default(), create_vrt);
        table.read_table_def(definition)?;
        table.header_written = table.base.offset > 0
            || std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
        table.base.setup_geom_field();
        debug!(
            context = "delimited_open",
            table = %name,
            records = table.base.record_count(),
            delimiter = table.delimiter.label_name(),
            "Opened delimited table"
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
        if options.table_type != TableType::Delimited {
            return Err(TableError::unsupported("fixed-width layout for a delimited table"));
        }
        let mut table = Self::empty(
            TableBase::create(name, path)?,
            options.effective_line_ending().unwrap_or_default(),
            options.field_delimiter,
            options.create_vrt,
        );
        table.base.set_column_names(options.columns.clone());
        table.initialize_new_layer(srs, false, geometry_type, options);
        Ok(table)
    }

    fn empty(base: TableBase, line_ending: LineEnding, delimiter: FieldDelimiter, create_vrt: bool) -> Self {
        Self {
            base,
            line_ending,
            delimiter,
            fields: Vec::new(),
            reader: None,
            header_written: false,
            pending_geom: Vec::new(),
            create_vrt,
        }
    }

    /// Field separator.
    pub fn delimiter(&self) -> FieldDelimiter {
        self.delimiter
    }

    /// Record terminator.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Raw column descriptors.
    pub fn fields(&self) -> &[DelimitedField] {
        &self.fields
    }

    fn read_table_def(&mut self, definition: &XmlNode) -> Result<()> {
        let table = self.base.name().to_string();
        let invalid = |reason: String| TableError::invalid_schema(&table, reason);

        let offset = match definition.value("offset") {
            None | Some("") => 0,
            Some(v) => v
                .parse::<u64>()
                .map_err(|_| invalid(format!("invalid offset '{v}'")))?,
        };
        let records = definition
            .value("records")
            .ok_or_else(|| invalid("missing records".to_string()))?;
        let records = records
            .parse::<i64>()
            .ok()
            .filter(|r| *r >= 0)
            .ok_or_else(|| invalid(format!("invalid records '{records}'")))?;

        let record_delimiter = definition.value("record_delimiter").unwrap_or_default();
        self.line_ending = LineEnding::from_record_delimiter(record_delimiter)
            .ok_or_else(|| invalid(format!("unsupported record_delimiter '{record_delimiter}'")))?;
        let field_delimiter = definition.value("field_delimiter").unwrap_or_default();
        self.delimiter = FieldDelimiter::from_label(field_delimiter)
            .ok_or_else(|| invalid(format!("unsupported field_delimiter '{field_delimiter}'")))?;

        let record = definition
            .child("Record_Delimited")
            .ok_or_else(|| invalid("missing Record_Delimited".to_string()))?;
        let fields = expand_delimited(record, &table)?;

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(invalid(format!("duplicate field name '{}'", field.name)));
            }
            let (field_type, subtype) = field.meta.data_type.field_type(field.maximum_field_length);
            let mut defn = FieldDefn::new(field.name.clone(), field_type).with_subtype(subtype);
            if let Some(width) = field.maximum_field_length {
                defn = defn.with_width(width);
            }
            self.base.add_raw_field(defn);
        }

        self.base.offset = offset;
        self.base.feature_count = records;
        self.fields = fields;
        self.base.clear_header_dirty();
        Ok(())
    }

    /// Declare the geometry columns of a new table.
    ///
    /// Point geometry over a geographic SRS (or `force_geographic`), or
    /// `GEOM_COLUMNS=LONG_LAT`, uses Latitude/Longitude(/Altitude) columns;
    /// any other geometry a WKT column. None is created yet.
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
        self.pending_geom = if options.uses_coordinate_columns(geometry_type, srs, force_geographic) {
            let mut pending = vec![
                PendingColumn::new(GeomRole::Lat, columns.lat_name()),
                PendingColumn::new(GeomRole::Long, columns.long_name()),
            ];
            if geometry_type.has_z {
                pending.push(PendingColumn::new(GeomRole::Alt, columns.alt_name()));
            }
            pending
        } else {
            vec![PendingColumn::new(GeomRole::Wkt, columns.wkt_name())]
        };
        self.base.set_geom_sources(GeomSources::default(), geometry_type);
    }

    fn append_field(&mut self, field: FieldDefn, metadata: Option<FieldMetadata>) -> usize {
        let meta = metadata.unwrap_or_else(|| {
            FieldMetadata::new(DataType::default_delimited(field.field_type, field.subtype))
        });
        self.fields.push(DelimitedField {
            name: field.name.clone(),
            maximum_field_length: (field.width > 0).then_some(field.width),
            meta,
        });
        self.base.add_raw_field(field)
    }

    fn add_pending_geom(&mut self) {
        for column in std::mem::take(&mut self.pending_geom) {
            let field_type = column.role.field_type();
            let index = match self.base.raw_defn().field_index(&column.name) {
                Some(existing) if self.base.raw_defn().fields()[existing].field_type == field_type => existing,
                Some(_) => {
                    warn!(
                        context = "add_pending_geom",
                        table = %self.base.name(),
                        column = %column.name,
                        "Geometry column name taken by a column of another type"
                    );
                    continue;
                }
                None => self.append_field(FieldDefn::new(column.name.clone(), field_type), column.meta),
            };
            self.bind_geom_column(column.role, index);
        }
    }

    fn bind_geom_column(&mut self, role: GeomRole, index: usize) {
        let mut sources = self.base.geom_sources();
        role.assign(&mut sources, index);
        let geometry_type = self.base.defn().geometry_type();
        self.base.set_geom_sources(sources, geometry_type);
    }

    fn open_reader(&self) -> Result<BufReader<File>> {
        let path = self.base.filename();
        let mut file = File::open(path).map_err(|e| TableError::io(path, e))?;
        file.seek(SeekFrom::Start(self.base.offset))
            .map_err(|e| TableError::io(path, e))?;
        Ok(BufReader::new(file))
    }

    /// Reader positioned on record `fid`, or `None` when the file ends first.
    fn open_reader_at(&self, fid: i64) -> Result<Option<BufReader<File>>> {
        let mut reader = self.open_reader()?;
        for _ in 1..fid {
            if Self::read_line(&mut reader, self.base.filename())?.is_none() {
                return Ok(None);
            }
        }
        Ok(Some(reader))
    }

    fn read_line(reader: &mut BufReader<File>, path: &Path) -> Result<Option<String>> {
        let mut bytes = Vec::new();
        let n = reader
            .read_until(b'\n', &mut bytes)
            .map_err(|e| TableError::io(path, e))?;
        if n == 0 {
            return Ok(None);
        }
        while matches!(bytes.last(), Some(b'\n' | b'\r')) {
            bytes.pop();
        }
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn decode_line(&self, fid: i64, line: &str) -> Feature {
        let tokens = split_line(line, self.delimiter.as_char());
        if tokens.len() != self.fields.len() {
            warn!(
                context = "decode_line",
                table = %self.base.name(),
                fid,
                expected = self.fields.len(),
                found = tokens.len(),
                "Token count does not match the field count"
            );
        }

        let mut raw = Feature::new(Arc::clone(self.base.raw_defn()));
        raw.set_fid(Some(fid));
        for (i, (field, token)) in self.fields.iter().zip(tokens.iter()).enumerate() {
            if field.meta.missing_constant() == Some(token.as_str()) {
                continue;
            }
            match decode_text(&field.meta.data_type, token) {
                Decoded::Value(v) => raw.set_field(i, v),
                Decoded::Invalid => warn!(
                    context = "decode_line",
                    fid,
                    field = %field.name,
                    data_type = %field.meta.data_type,
                    token = %token,
                    "Invalid value, read as null"
                ),
            }
        }
        raw
    }

    fn encode_line(&self, raw: &Feature) -> String {
        let delimiter = self.delimiter.as_char();
        let tokens: Vec<String> = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let value = raw.field(i);
                if value.is_null() {
                    return field.meta.missing_constant().unwrap_or_default().to_string();
                }
                if let DataType::Unsupported(tag) = &field.meta.data_type {
                    warn!(context = "encode_line", field = %field.name, data_type = %tag, "Writing this data type is not supported");
                    return String::new();
                }
                match encode_text(&field.meta.data_type, value, None, None) {
                    Some(text) => quote(&text, delimiter),
                    None => {
                        warn!(
                            context = "encode_line",
                            field = %field.name,
                            data_type = %field.meta.data_type,
                            value = %value,
                            "Value cannot be written as this data type"
                        );
                        String::new()
                    }
                }
            })
            .collect();
        tokens.join(&delimiter.to_string())
    }

    fn append_bytes(&mut self, bytes: &[u8]) -> Result<u64> {
        self.reader = None;
        let path = self.base.filename().to_path_buf();
        let file = self.base.file_mut()?;
        file.seek(SeekFrom::End(0)).map_err(|e| TableError::io(&path, e))?;
        file.write_all(bytes).map_err(|e| TableError::io(&path, e))?;
        file.stream_position().map_err(|e| TableError::io(&path, e))
    }

    fn write_header(&mut self) -> Result<()> {
        let delimiter = self.delimiter.as_char();
        let mut line = self
            .fields
            .iter()
            .map(|f| quote(&f.name, delimiter))
            .collect::<Vec<_>>()
            .join(&delimiter.to_string())
            .into_bytes();
        line.extend_from_slice(self.line_ending.as_bytes());
        self.base.offset = self.append_bytes(&line)?;
        self.header_written = true;
        Ok(())
    }

    fn write_sidecar_if_needed(&mut self) -> Result<()> {
        if self.base.is_header_dirty() && self.create_vrt {
            write_sidecar(&self.base)?;
            self.base.clear_header_dirty();
        }
        Ok(())
    }
}

/// Role of a geometry column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeomRole {
    Lat,
    Long,
    Alt,
    Wkt,
}

impl GeomRole {
    fn field_type(self) -> FieldType {
        match self {
            GeomRole::Wkt => FieldType::String,
            GeomRole::Lat | GeomRole::Long | GeomRole::Alt => FieldType::Real,
        }
    }

    fn assign(self, sources: &mut GeomSources, index: usize) {
        let slot = match self {
            GeomRole::Lat => &mut sources.lat,
            GeomRole::Long => &mut sources.long,
            GeomRole::Alt => &mut sources.alt,
            GeomRole::Wkt => &mut sources.wkt,
        };
        *slot = Some(index);
    }
}

#[derive(Debug, Clone)]
struct PendingColumn {
    role: GeomRole,
    name: String,
    meta: Option<FieldMetadata>,
}

impl PendingColumn {
    fn new(role: GeomRole, name: &str) -> Self {
        Self {
            role,
            name: name.to_string(),
            meta: None,
        }
    }
}

/// Split a line on `delimiter`, honouring double-quoted tokens.
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == delimiter {
            tokens.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    tokens.push(current);
    tokens
}

fn quote(text: &str, delimiter: char) -> String {
    if text.contains(delimiter) || text.contains('"') || text.contains(['\r', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

impl TableLayer for DelimitedTable {
    fn base(&self) -> &TableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut TableBase {
        &mut self.base
    }

    fn kind(&self) -> TableKind {
        TableKind::Delimited
    }

    fn reset_reading(&mut self) {
        self.base.next_fid = 1;
        self.reader = None;
    }

    fn next_raw_feature(&mut self) -> Result<Option<Feature>> {
        let fid = self.base.next_fid;
        if fid > self.base.record_count() {
            return Ok(None);
        }
        let reader = match self.reader.take() {
            Some(reader) => Some(reader),
            None => self.open_reader_at(fid)?,
        };
        let line = match reader {
            Some(mut reader) => {
                let line = Self::read_line(&mut reader, self.base.filename())?;
                self.reader = Some(reader);
                line
            }
            None => None,
        };
        let Some(line) = line else {
            warn!(
                context = "next_raw_feature",
                table = %self.base.name(),
                records = self.base.record_count(),
                read = fid - 1,
                "File ends before the declared record count"
            );
            self.base.next_fid = self.base.record_count() + 1;
            return Ok(None);
        };
        self.base.next_fid += 1;
        Ok(Some(self.decode_line(fid, &line)))
    }

    fn get_feature(&mut self, fid: i64) -> Result<Feature> {
        self.base.check_fid(fid)?;
        let mut reader = self
            .open_reader_at(fid)?
            .ok_or_else(|| TableError::non_existing_feature(fid))?;
        let line = Self::read_line(&mut reader, self.base.filename())?
            .ok_or_else(|| TableError::non_existing_feature(fid))?;
        let raw = self.decode_line(fid, &line);
        Ok(self.base.add_geometry_from_fields(&raw))
    }

    fn set_feature(&mut self, _feature: &Feature) -> Result<()> {
        Err(TableError::unsupported("set feature on a delimited table"))
    }

    fn create_feature(&mut self, feature: &mut Feature) -> Result<()> {
        self.base.require_update("create feature")?;
        self.add_pending_geom();
        if !self.header_written {
            self.write_header()?;
        }
        let raw = self.base.add_fields_from_geometry(feature);
        let mut line = self.encode_line(&raw).into_bytes();
        line.extend_from_slice(self.line_ending.as_bytes());
        self.append_bytes(&line)?;

        self.base.feature_count += 1;
        feature.set_fid(Some(self.base.feature_count));
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
        if self.fields.iter().any(|f| f.name == field.name) {
            return Err(TableError::invalid_schema(
                self.base.name(),
                format!("field '{}' already exists", field.name),
            ));
        }
        let metadata = metadata.map(|m| {
            let mut m = m.clone();
            if m.data_type.is_binary() {
                warn!(
                    context = "create_field",
                    field = %field.name,
                    data_type = %m.data_type,
                    "Binary data type in a delimited table, using the default"
                );
                m.data_type = DataType::default_delimited(field.field_type, field.subtype);
            }
            m.field_format = None;
            m
        });

        let pending = self
            .pending_geom
            .iter()
            .position(|c| c.name == field.name && c.role.field_type() == field.field_type);
        match pending {
            Some(p) => {
                let column = self.pending_geom.remove(p);
                let index = self.append_field(field.clone(), metadata.or(column.meta));
                self.bind_geom_column(column.role, index);
            }
            None => {
                self.append_field(field.clone(), metadata);
            }
        }
        Ok(())
    }

    fn field_metadata(&self, name: &str) -> Option<FieldMetadata> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.meta.clone())
    }

    fn set_field_metadata(&mut self, name: &str, metadata: &FieldMetadata) -> Result<()> {
        let index = self
            .fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| TableError::field_not_found(name))?;
        if self.fields[index].meta.data_type != metadata.data_type {
            if metadata.data_type.is_binary() {
                return Err(TableError::invalid_schema(
                    self.base.name(),
                    format!("binary data type {} in a delimited table", metadata.data_type),
                ));
            }
            if self.base.record_count() > 0 {
                return Err(TableError::non_empty_layer(self.base.name(), "change data type"));
            }
            let (field_type, subtype) = metadata
                .data_type
                .field_type(self.fields[index].maximum_field_length);
            self.base
                .replace_raw_field(index, FieldDefn::new(name, field_type).with_subtype(subtype));
        }
        self.fields[index].meta = metadata.clone();
        self.base.mark_header_dirty();
        Ok(())
    }

    fn table_def(&self) -> XmlNode {
        let mut record = XmlNode::new("Record_Delimited")
            .child_node(XmlNode::with_text("fields", self.fields.len().to_string()))
            .child_node(XmlNode::with_text("groups", "0"));
        for (i, field) in self.fields.iter().enumerate() {
            record.push(field.to_xml(i + 1));
        }
        XmlNode::new("Table_Delimited")
            .child_node(XmlNode::with_text("local_identifier", self.base.name()))
            .child_node(XmlNode::with_text("offset", self.base.offset.to_string()).attr("unit", "byte"))
            .child_node(XmlNode::with_text("parsing_standard_id", "PDS DSV 1"))
            .child_node(XmlNode::with_text("records", self.base.record_count().to_string()))
            .child_node(XmlNode::with_text("record_delimiter", self.line_ending.record_delimiter()))
            .child_node(XmlNode::with_text("field_delimiter", self.delimiter.label_name()))
            .child_node(record)
    }

    fn test_capability(&self, capability: Capability) -> bool {
        let update = self.base.access().is_update();
        match capability {
            Capability::RandomRead | Capability::ZGeometries => true,
            Capability::FastFeatureCount => !self.base.filters().is_active(),
            Capability::SequentialWrite => update,
            Capability::RandomWrite => false,
            Capability::CreateField => update && self.base.record_count() == 0,
        }
    }

    fn create_for_rewrite(&self, path: &Path) -> Result<Self> {
        let mut table = Self::empty(
            TableBase::create(self.base.name(), path)?,
            self.line_ending,
            self.delimiter,
            self.create_vrt || sidecar_path(self.base.filename()).exists(),
        );
        table.base.set_spatial_ref(self.base.defn().spatial_ref().cloned());
        table.base.set_column_names(self.base.column_names().clone());

        let source = self.base.geom_sources();
        for (role, index) in [
            (GeomRole::Lat, source.lat),
            (GeomRole::Long, source.long),
            (GeomRole::Alt, source.alt),
            (GeomRole::Wkt, source.wkt),
        ] {
            if let Some(i) = index {
                table.pending_geom.push(PendingColumn {
                    role,
                    name: self.fields[i].name.clone(),
                    meta: Some(self.fields[i].meta.clone()),
                });
            }
        }
        table
            .base
            .set_geom_sources(GeomSources::default(), self.base.defn().geometry_type());
        debug!(
            context = "create_for_rewrite",
            table = %self.base.name(),
            path = %path.display(),
            "Created rewrite target"
        );
        Ok(table)
    }

    fn close(&mut self) -> Result<()> {
        self.reader = None;
        self.write_sidecar_if_needed()
    }

    fn file_list(&self) -> Vec<PathBuf> {
        let mut files = vec![self.base.filename().to_path_buf()];
        let sidecar = sidecar_path(self.base.filename());
        if self.create_vrt || sidecar.exists() {
            files.push(sidecar);
        }
        files
    }
}

impl Drop for DelimitedTable {
    fn drop(&mut self) {
        if let Err(e) = self.write_sidecar_if_needed() {
            warn!(context = "delimited_drop", table = %self.base.name(), error = %e, "Cannot write sidecar");
        }
    }
}
