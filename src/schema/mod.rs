// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Table definition schemas.
//!
//! This module handles the label side of a PDS4 table:
//! - [`xml`] - XML document model and Pest parser
//! - [`field`] - Per-column descriptors and their label elements
//! - [`layout`] - Flattening of `Record_*` fields and repeated groups
//! - [`label`] - Finding `Table_*` elements in a product label

pub mod field;
pub mod label;
pub mod layout;
pub mod xml;

pub use field::{DelimitedField, FieldMetadata, FixedWidthField};
pub use label::{read_label, tables_in_label, write_label, TableEntry};
pub use layout::{expand_delimited, expand_fixed_width, FixedLayout};
pub use xml::{parse_document, XmlNode};
