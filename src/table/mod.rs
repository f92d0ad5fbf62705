// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Table layers.
//!
//! PDS4 defines a closed set of table encodings. Each one implements
//! [`TableLayer`] and [`Pds4Table`] wraps them in a single enum selected once
//! at open or creation time:
//! - [`fixed_width::FixedWidthTable`] - `Table_Character` and `Table_Binary`
//! - [`delimited::DelimitedTable`] - `Table_Delimited`
//!
//! Shared behaviour (schema split, geometry synthesis, filters) lives in
//! [`base::TableBase`].

pub mod base;
pub mod delimited;
pub mod filter;
pub mod fixed_width;
pub mod options;
pub mod sidecar;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use base::{path_with_suffix, GeomSources, TableBase};
pub use delimited::DelimitedTable;
pub use filter::{AttributeFilter, CompareOp, FilterSet};
pub use fixed_width::{FixedSubtype, FixedWidthTable};
pub use options::{
    FieldDelimiter, GeomColumnNames, GeomColumns, LayerCreationOptions, LineEnding, OpenOptions,
    TableType,
};

use crate::core::{Feature, FeatureDefn, FieldDefn, Result, TableError};
use crate::geometry::{Envelope, GeometryType, SpatialRef};
use crate::schema::{read_label, tables_in_label, FieldMetadata, XmlNode};

/// Table encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Character,
    Binary,
    Delimited,
}

impl TableKind {
    /// Local name of the table element in a label.
    pub fn element_name(self) -> &'static str {
        match self {
            TableKind::Character => "Table_Character",
            TableKind::Binary => "Table_Binary",
            TableKind::Delimited => "Table_Delimited",
        }
    }

    /// Resolve a table element name.
    pub fn from_element(name: &str) -> Option<TableKind> {
        match name {
            "Table_Character" => Some(TableKind::Character),
            "Table_Binary" => Some(TableKind::Binary),
            "Table_Delimited" => Some(TableKind::Delimited),
            _ => None,
        }
    }
}

/// Optional operations a table may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `get_feature` by FID
    RandomRead,
    /// `feature_count` without a scan
    FastFeatureCount,
    /// `create_feature`
    SequentialWrite,
    /// `set_feature`
    RandomWrite,
    /// `create_field`
    CreateField,
    /// Geometries with Z
    ZGeometries,
}

/// Operations shared by all table encodings.
///
/// Features handed in and out are expressed in the public schema
/// ([`TableLayer::layer_defn`]); implementations convert to and from the raw
/// on-disk schema through [`TableBase`].
pub trait TableLayer {
    /// Shared state.
    fn base(&self) -> &TableBase;

    /// Shared state, mutable.
    fn base_mut(&mut self) -> &mut TableBase;

    /// Table encoding.
    fn kind(&self) -> TableKind;

    /// Rewind the sequential cursor to FID 1.
    fn reset_reading(&mut self);

    /// Next raw feature in FID order, ignoring filters.
    fn next_raw_feature(&mut self) -> Result<Option<Feature>>;

    /// Read one feature by FID.
    fn get_feature(&mut self, fid: i64) -> Result<Feature>;

    /// Overwrite an existing feature in place.
    fn set_feature(&mut self, feature: &Feature) -> Result<()>;

    /// Append a feature, assigning its FID.
    fn create_feature(&mut self, feature: &mut Feature) -> Result<()>;

    /// Append a column, optionally with label metadata to reuse.
    ///
    /// Only allowed while the table is empty and writable.
    fn create_field_with_metadata(
        &mut self,
        field: &FieldDefn,
        metadata: Option<&FieldMetadata>,
    ) -> Result<()>;

    /// Label metadata of a raw column.
    fn field_metadata(&self, name: &str) -> Option<FieldMetadata>;

    /// Replace the label metadata of a raw column.
    fn set_field_metadata(&mut self, name: &str, metadata: &FieldMetadata) -> Result<()>;

    /// Table definition element describing the current state.
    fn table_def(&self) -> XmlNode;

    /// Check if an optional operation is supported.
    fn test_capability(&self, capability: Capability) -> bool;

    /// Create an empty table at `path` with the same encoding and geometry
    /// columns as this one.
    fn create_for_rewrite(&self, path: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Persist derived state (companion files).
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Files owned by this table.
    fn file_list(&self) -> Vec<PathBuf> {
        vec![self.base().filename().to_path_buf()]
    }

    /// Move the data file, replacing any file already at `path`.
    fn rename_file_to(&mut self, path: &Path) -> Result<()> {
        self.reset_reading();
        self.base_mut().rename_file_to(path)
    }

    /// Table name.
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Public schema.
    fn layer_defn(&self) -> &Arc<FeatureDefn> {
        self.base().defn()
    }

    /// Append a column with default label metadata.
    fn create_field(&mut self, field: &FieldDefn) -> Result<()> {
        self.create_field_with_metadata(field, None)
    }

    /// Next feature passing the active filters.
    fn next_feature(&mut self) -> Result<Option<Feature>> {
        while let Some(raw) = self.next_raw_feature()? {
            let feature = self.base().add_geometry_from_fields(&raw);
            if self.base().filters().matches(&feature) {
                return Ok(Some(feature));
            }
        }
        Ok(None)
    }

    /// Number of features; a full scan when a filter is active.
    fn feature_count(&mut self) -> Result<i64> {
        if !self.base().filters().is_active() {
            return Ok(self.base().record_count());
        }
        self.reset_reading();
        let mut count = 0;
        while self.next_feature()?.is_some() {
            count += 1;
        }
        self.reset_reading();
        Ok(count)
    }

    /// Set or clear the attribute filter.
    fn set_attribute_filter(&mut self, filter: Option<AttributeFilter>) {
        self.base_mut().set_attribute_filter(filter);
    }

    /// Set or clear the spatial filter.
    fn set_spatial_filter(&mut self, envelope: Option<Envelope>) {
        self.base_mut().set_spatial_filter(envelope);
    }
}

/// Any PDS4 table.
#[derive(Debug)]
pub enum Pds4Table {
    FixedWidth(FixedWidthTable),
    Delimited(DelimitedTable),
}

macro_rules! delegate {
    ($self:expr, $table:ident => $body:expr) => {
        match $self {
            Pds4Table::FixedWidth($table) => $body,
            Pds4Table::Delimited($table) => $body,
        }
    };
}

impl Pds4Table {
    /// Open the table described by a `Table_*` element.
    pub fn open(name: &str, definition: &XmlNode, path: &Path, options: &OpenOptions) -> Result<Self> {
        match TableKind::from_element(definition.local_name()) {
            Some(TableKind::Character) | Some(TableKind::Binary) => Ok(Pds4Table::FixedWidth(
                FixedWidthTable::open(name, definition, path, options)?,
            )),
            Some(TableKind::Delimited) => Ok(Pds4Table::Delimited(DelimitedTable::open(
                name, definition, path, options,
            )?)),
            None => Err(TableError::unsupported(format!(
                "table element {}",
                definition.local_name()
            ))),
        }
    }

    /// Open every table of a product label.
    pub fn open_label(label_path: &Path, options: &OpenOptions) -> Result<Vec<Pds4Table>> {
        let root = read_label(label_path)?;
        tables_in_label(&root)
            .iter()
            .map(|entry| {
                Pds4Table::open(
                    &entry.name(),
                    &entry.definition,
                    &entry.data_path(label_path),
                    options,
                )
            })
            .collect()
    }

    /// Create a new, empty table.
    pub fn create(
        name: &str,
        path: &Path,
        options: &LayerCreationOptions,
        srs: Option<&SpatialRef>,
        geometry_type: GeometryType,
    ) -> Result<Self> {
        match options.table_type {
            TableType::Character | TableType::Binary => Ok(Pds4Table::FixedWidth(
                FixedWidthTable::create(name, path, options, srs, geometry_type)?,
            )),
            TableType::Delimited => Ok(Pds4Table::Delimited(DelimitedTable::create(
                name,
                path,
                options,
                srs,
                geometry_type,
            )?)),
        }
    }
}

impl TableLayer for Pds4Table {
    fn base(&self) -> &TableBase {
        delegate!(self, t => t.base())
    }

    fn base_mut(&mut self) -> &mut TableBase {
        delegate!(self, t => t.base_mut())
    }

    fn kind(&self) -> TableKind {
        delegate!(self, t => t.kind())
    }

    fn reset_reading(&mut self) {
        delegate!(self, t => t.reset_reading())
    }

    fn next_raw_feature(&mut self) -> Result<Option<Feature>> {
        delegate!(self, t => t.next_raw_feature())
    }

    fn get_feature(&mut self, fid: i64) -> Result<Feature> {
        delegate!(self, t => t.get_feature(fid))
    }

    fn set_feature(&mut self, feature: &Feature) -> Result<()> {
        delegate!(self, t => t.set_feature(feature))
    }

    fn create_feature(&mut self, feature: &mut Feature) -> Result<()> {
        delegate!(self, t => t.create_feature(feature))
    }

    fn create_field_with_metadata(
        &mut self,
        field: &FieldDefn,
        metadata: Option<&FieldMetadata>,
    ) -> Result<()> {
        delegate!(self, t => t.create_field_with_metadata(field, metadata))
    }

    fn field_metadata(&self, name: &str) -> Option<FieldMetadata> {
        delegate!(self, t => t.field_metadata(name))
    }

    fn set_field_metadata(&mut self, name: &str, metadata: &FieldMetadata) -> Result<()> {
        delegate!(self, t => t.set_field_metadata(name, metadata))
    }

    fn table_def(&self) -> XmlNode {
        delegate!(self, t => t.table_def())
    }

    fn test_capability(&self, capability: Capability) -> bool {
        delegate!(self, t => t.test_capability(capability))
    }

    fn create_for_rewrite(&self, path: &Path) -> Result<Self> {
        Ok(match self {
            Pds4Table::FixedWidth(t) => Pds4Table::FixedWidth(t.create_for_rewrite(path)?),
            Pds4Table::Delimited(t) => Pds4Table::Delimited(t.create_for_rewrite(path)?),
        })
    }

    fn close(&mut self) -> Result<()> {
        delegate!(self, t => t.close())
    }

    fn file_list(&self) -> Vec<PathBuf> {
        delegate!(self, t => t.file_list())
    }

    fn rename_file_to(&mut self, path: &Path) -> Result<()> {
        delegate!(self, t => t.rename_file_to(path))
    }
}
