// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Attribute and spatial filters for sequential reads.
//!
//! When either filter is set, sequential reads skip features that do not
//! match and feature counts fall back to a full scan.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::core::{Feature, FieldValue};
use crate::geometry::Envelope;

/// Comparison operator of an attribute filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// Predicate over feature attributes.
#[derive(Clone)]
pub enum AttributeFilter {
    /// Compare a field with a constant; null fields never match
    Compare {
        field: String,
        op: CompareOp,
        value: FieldValue,
    },
    /// Field is null
    IsNull(String),
    /// Field is not null
    IsNotNull(String),
    /// Field text matches a regex
    Matches {
        field: String,
        pattern: Arc<regex::Regex>,
    },
    /// All filters match
    And(Vec<AttributeFilter>),
    /// Custom predicate
    Custom(Arc<dyn Fn(&Feature) -> bool + Send + Sync>),
}

impl fmt::Debug for AttributeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { field, op, value } => f
                .debug_struct("Compare")
                .field("field", field)
                .field("op", op)
                .field("value", value)
                .finish(),
            Self::IsNull(field) => f.debug_tuple("IsNull").field(field).finish(),
            Self::IsNotNull(field) => f.debug_tuple("IsNotNull").field(field).finish(),
            Self::Matches { field, pattern } => f
                .debug_struct("Matches")
                .field("field", field)
                .field("pattern", &pattern.as_str())
                .finish(),
            Self::And(filters) => f.debug_tuple("And").field(filters).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<fn>").finish(),
        }
    }
}

impl AttributeFilter {
    /// Check if a feature satisfies the filter.
    ///
    /// Unknown field names never match.
    pub fn matches(&self, feature: &Feature) -> bool {
        match self {
            AttributeFilter::Compare { field, op, value } => feature
                .field_by_name(field)
                .filter(|v| !v.is_null())
                .and_then(|v| v.compare(value))
                .is_some_and(|ord| op.accepts(ord)),
            AttributeFilter::IsNull(field) => feature.field_by_name(field).is_some_and(FieldValue::is_null),
            AttributeFilter::IsNotNull(field) => {
                feature.field_by_name(field).is_some_and(|v| !v.is_null())
            }
            AttributeFilter::Matches { field, pattern } => feature
                .field_by_name(field)
                .and_then(FieldValue::to_text)
                .is_some_and(|text| pattern.is_match(&text)),
            AttributeFilter::And(filters) => filters.iter().all(|f| f.matches(feature)),
            AttributeFilter::Custom(f) => f(feature),
        }
    }

    /// Create a comparison filter.
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<FieldValue>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Create a regex filter.
    pub fn regex(field: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        regex::Regex::new(pattern).map(|re| Self::Matches {
            field: field.into(),
            pattern: Arc::new(re),
        })
    }

    /// Create a custom filter from a function.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Feature) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }
}

/// Active filters of a table.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    /// Attribute predicate
    pub attribute: Option<AttributeFilter>,
    /// Features whose geometry envelope intersects this box
    pub spatial: Option<Envelope>,
}

impl FilterSet {
    /// Check if any filter is set.
    pub fn is_active(&self) -> bool {
        self.attribute.is_some() || self.spatial.is_some()
    }

    /// Check if a public feature passes every filter.
    ///
    /// With a spatial filter, features without geometry are rejected.
    pub fn matches(&self, feature: &Feature) -> bool {
        if let Some(env) = &self.spatial {
            let hit = feature
                .geometry()
                .and_then(|g| g.envelope())
                .is_some_and(|e| e.intersects(env));
            if !hit {
                return false;
            }
        }
        self.attribute.as_ref().map_or(true, |f| f.matches(feature))
    }
}
