// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # pds4table
//!
//! Schema-driven codec for PDS4 tables.
//!
//! A PDS4 product label describes the layout of each table in a flat data
//! file. This library maps that description onto the records of the file
//! and exposes them as features: typed attribute columns plus a geometry
//! synthesized from coordinate or WKT columns.
//!
//! ## Architecture
//!
//! - `core/` - Errors, field values, feature and schema types
//! - `encoding/` - Per-field codec for PDS4 data types (binary and text)
//! - `schema/` - Label XML model, field descriptors, group expansion
//! - `geometry/` - Geometry model and WKT reader/writer
//! - `table/` - Fixed-width and delimited table layers
//! - `rewriter/` - Editable layer and full-table rewrite
//!
//! ## Example: Reading a label
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use pds4table::{OpenOptions, Pds4Table, TableLayer};
//!
//! for mut table in Pds4Table::open_label("product.xml".as_ref(), &OpenOptions::default())? {
//!     while let Some(feature) = table.next_feature()? {
//!         println!("{:?}", feature.fid());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Adding a column to a populated table
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use pds4table::{EditableLayer, FieldDefn, FieldType, OpenOptions, Pds4Table};
//!
//! let options = OpenOptions::new().with_update(true);
//! let table = Pds4Table::open_label("product.xml".as_ref(), &options)?.remove(0);
//! let mut layer = EditableLayer::new(table);
//! layer.create_field(&FieldDefn::new("flag", FieldType::Integer))?;
//! layer.sync_to_disk()?;
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

pub use core::{
    index_map_by_name, Access, Feature, FeatureDefn, FieldDefn, FieldSubType, FieldType, FieldValue,
    Result, TableError,
};

// Field codec
pub mod encoding;

pub use encoding::{DataType, Endian};

// Label XML and field descriptors
pub mod schema;

pub use schema::{FieldMetadata, XmlNode};

// Geometry
pub mod geometry;

pub use geometry::{Envelope, Geometry, GeometryType, SpatialRef};

// Table layers
pub mod table;

pub use table::{
    AttributeFilter, Capability, DelimitedTable, FixedWidthTable, LayerCreationOptions, OpenOptions,
    Pds4Table, TableKind, TableLayer, TableType,
};

// Editing and rewrite
pub mod rewriter;

pub use rewriter::{EditableLayer, SyncStats};
