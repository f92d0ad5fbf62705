// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Field descriptors.
//!
//! One descriptor per on-disk column. Fixed-width descriptors carry a byte
//! range within the record; delimited descriptors are purely positional.
//! Both can be written back as their label element.

use serde::{Deserialize, Serialize};

use super::xml::XmlNode;
use crate::encoding::{DataType, FieldFormat};

/// Column metadata shared by both table encodings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// PDS4 data type tag
    pub data_type: DataType,
    /// Physical unit
    pub unit: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// `Special_Constants` element, carried through unchanged
    pub special_constants: Option<XmlNode>,
    /// printf-style `field_format` (fixed-width only)
    pub field_format: Option<FieldFormat>,
}

impl FieldMetadata {
    /// Metadata with only a data type.
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            unit: None,
            description: None,
            special_constants: None,
            field_format: None,
        }
    }

    /// Read the optional elements shared by every field element.
    pub fn from_node(node: &XmlNode, data_type: DataType) -> Self {
        let non_empty = |key: &str| {
            node.value(key)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            data_type,
            unit: non_empty("unit"),
            description: non_empty("description"),
            special_constants: node.child("Special_Constants").cloned(),
            field_format: node.value("field_format").and_then(FieldFormat::parse),
        }
    }

    /// Sentinel text that stands for "no value".
    pub fn missing_constant(&self) -> Option<&str> {
        self.special_constants
            .as_ref()
            .and_then(|sc| sc.value("missing_constant"))
    }

    /// Set (or replace) the missing constant.
    pub fn set_missing_constant(&mut self, value: impl Into<String>) {
        let sc = self
            .special_constants
            .get_or_insert_with(|| XmlNode::new("Special_Constants"));
        sc.children.retain(|c| c.local_name() != "missing_constant");
        sc.children
            .insert(0, XmlNode::with_text("missing_constant", value));
    }

    fn append_tail(&self, node: &mut XmlNode, with_format: bool) {
        if with_format {
            if let Some(fmt) = &self.field_format {
                node.push(XmlNode::with_text("field_format", fmt.as_str()));
            }
        }
        if let Some(unit) = &self.unit {
            node.push(XmlNode::with_text("unit", unit));
        }
        if let Some(description) = &self.description {
            node.push(XmlNode::with_text("description", description));
        }
        if let Some(sc) = &self.special_constants {
            node.push(sc.clone());
        }
    }
}

/// A column of a Character or Binary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedWidthField {
    /// Column name, with group suffixes applied
    pub name: String,
    /// Zero-based byte offset within the record
    pub offset: usize,
    /// Byte length
    pub length: usize,
    /// Type and descriptive metadata
    pub meta: FieldMetadata,
}

impl FixedWidthField {
    /// End offset (exclusive) within the record.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Label element (`Field_Character` or `Field_Binary`).
    pub fn to_xml(&self, subtype: &str, field_number: usize) -> XmlNode {
        let mut node = XmlNode::new(format!("Field_{subtype}"))
            .child_node(XmlNode::with_text("name", &self.name))
            .child_node(XmlNode::with_text("field_number", field_number.to_string()))
            .child_node(
                XmlNode::with_text("field_location", (self.offset + 1).to_string())
                    .attr("unit", "byte"),
            )
            .child_node(XmlNode::with_text("data_type", self.meta.data_type.name()))
            .child_node(XmlNode::with_text("field_length", self.length.to_string()).attr("unit", "byte"));
        self.meta.append_tail(&mut node, true);
        node
    }
}

/// A column of a delimited table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelimitedField {
    /// Column name, with group suffixes applied
    pub name: String,
    /// Informational maximum length in bytes
    pub maximum_field_length: Option<usize>,
    /// Type and descriptive metadata
    pub meta: FieldMetadata,
}

impl DelimitedField {
    /// Label element (`Field_Delimited`).
    pub fn to_xml(&self, field_number: usize) -> XmlNode {
        let mut node = XmlNode::new("Field_Delimited")
            .child_node(XmlNode::with_text("name", &self.name))
            .child_node(XmlNode::with_text("field_number", field_number.to_string()))
            .child_node(XmlNode::with_text("data_type", self.meta.data_type.name()));
        if let Some(len) = self.maximum_field_length {
            node.push(XmlNode::with_text("maximum_field_length", len.to_string()).attr("unit", "byte"));
        }
        self.meta.append_tail(&mut node, false);
        node
    }
}
