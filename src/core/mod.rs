// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout pds4table.
//!
//! This module provides the foundational types for the library:
//! - [`TableError`] - Error handling
//! - [`FieldValue`] - Unified attribute value representation
//! - [`FeatureDefn`] / [`Feature`] - Schema and row model
//! - [`Access`] - Table access mode

pub mod error;
pub mod feature;
pub mod value;

pub use error::{Result, TableError};
pub use feature::{index_map_by_name, Feature, FeatureDefn, FieldDefn};
pub use value::{FieldSubType, FieldType, FieldValue};

/// Access mode a table is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Access {
    /// Reads only
    #[default]
    ReadOnly,
    /// Reads and writes
    Update,
}

/// Error returned when parsing an `Access` from string fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseAccessError {
    _private: (),
}

impl std::fmt::Display for ParseAccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid access mode, expected 'read' or 'update'")
    }
}

impl std::error::Error for ParseAccessError {}

impl std::str::FromStr for Access {
    type Err = ParseAccessError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" | "readonly" | "r" => Ok(Access::ReadOnly),
            "update" | "rw" | "w" => Ok(Access::Update),
            _ => Err(ParseAccessError { _private: () }),
        }
    }
}

impl Access {
    /// Check if writes are allowed.
    pub fn is_update(&self) -> bool {
        matches!(self, Access::Update)
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::ReadOnly => "read",
            Access::Update => "update",
        }
    }
}
