// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Schema and feature model.
//!
//! A [`FeatureDefn`] is the ordered column list of a table (plus its
//! geometry type) and is shared between a table and the features it hands
//! out through an [`Arc`]. A [`Feature`] is one row: a FID, one
//! [`FieldValue`] per column and an optional geometry.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::{Result, TableError};
use super::value::{FieldSubType, FieldType, FieldValue};
use crate::geometry::{Geometry, GeometryType, SpatialRef};

/// Definition of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefn {
    /// Column name
    pub name: String,
    /// Engine type
    pub field_type: FieldType,
    /// Engine subtype
    #[serde(default)]
    pub subtype: FieldSubType,
    /// Declared width in characters or bytes, 0 when unspecified
    #[serde(default)]
    pub width: usize,
}

impl FieldDefn {
    /// Create a field definition with no width.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            subtype: FieldSubType::None,
            width: 0,
        }
    }

    /// Builder: set the subtype.
    pub fn with_subtype(mut self, subtype: FieldSubType) -> Self {
        self.subtype = subtype;
        self
    }

    /// Builder: set the width.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }
}

/// Ordered column list and geometry type of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDefn {
    name: String,
    fields: Vec<FieldDefn>,
    geometry_type: GeometryType,
    spatial_ref: Option<SpatialRef>,
}

impl FeatureDefn {
    /// Create an empty definition without geometry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            geometry_type: GeometryType::NONE,
            spatial_ref: None,
        }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All column definitions in order.
    pub fn fields(&self) -> &[FieldDefn] {
        &self.fields
    }

    /// Number of columns.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Get a column definition by index.
    pub fn field(&self, index: usize) -> Option<&FieldDefn> {
        self.fields.get(index)
    }

    /// Find a column by exact name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Append a column, returning its index.
    pub fn add_field(&mut self, field: FieldDefn) -> usize {
        self.fields.push(field);
        self.fields.len() - 1
    }

    /// Rename the column at `index`.
    pub fn rename_field(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self
            .fields
            .iter()
            .enumerate()
            .any(|(i, f)| i != index && f.name == name)
        {
            return Err(TableError::invalid_schema(
                self.name.clone(),
                format!("field '{name}' already exists"),
            ));
        }
        let field = self
            .fields
            .get_mut(index)
            .ok_or_else(|| TableError::field_not_found(format!("#{index}")))?;
        field.name = name;
        Ok(())
    }

    /// Geometry type, [`GeometryType::NONE`] when the table has no geometry.
    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    /// Set the geometry type.
    pub fn set_geometry_type(&mut self, geometry_type: GeometryType) {
        self.geometry_type = geometry_type;
    }

    /// Spatial reference of the geometry column.
    pub fn spatial_ref(&self) -> Option<&SpatialRef> {
        self.spatial_ref.as_ref()
    }

    /// Set the spatial reference.
    pub fn set_spatial_ref(&mut self, srs: Option<SpatialRef>) {
        self.spatial_ref = srs;
    }
}

/// One table row.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    defn: Arc<FeatureDefn>,
    fid: Option<i64>,
    values: Vec<FieldValue>,
    geometry: Option<Geometry>,
}

impl Feature {
    /// Create a feature with every field null.
    pub fn new(defn: Arc<FeatureDefn>) -> Self {
        let values = vec![FieldValue::Null; defn.field_count()];
        Self {
            defn,
            fid: None,
            values,
            geometry: None,
        }
    }

    /// Schema this feature follows.
    pub fn defn(&self) -> &Arc<FeatureDefn> {
        &self.defn
    }

    /// Feature id, `None` until the feature is stored.
    pub fn fid(&self) -> Option<i64> {
        self.fid
    }

    /// Set the feature id.
    pub fn set_fid(&mut self, fid: Option<i64>) {
        self.fid = fid;
    }

    /// Field values in column order.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Get a field value by index.
    pub fn field(&self, index: usize) -> &FieldValue {
        self.values.get(index).unwrap_or(&FieldValue::Null)
    }

    /// Get a field value by column name.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldValue> {
        self.defn.field_index(name).map(|i| &self.values[i])
    }

    /// Check whether the field at `index` holds a value.
    pub fn is_set(&self, index: usize) -> bool {
        !self.field(index).is_null()
    }

    /// Set a field, coercing the value to the column type.
    ///
    /// Out-of-range indices are ignored.
    pub fn set_field(&mut self, index: usize, value: impl Into<FieldValue>) {
        let Some(field) = self.defn.field(index) else {
            return;
        };
        let value = value.into().coerce(field.field_type, field.subtype);
        self.values[index] = value;
    }

    /// Set a field by column name.
    pub fn set_field_by_name(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        let index = self
            .defn
            .field_index(name)
            .ok_or_else(|| TableError::field_not_found(name))?;
        self.set_field(index, value);
        Ok(())
    }

    /// Reset a field to null.
    pub fn unset_field(&mut self, index: usize) {
        if let Some(v) = self.values.get_mut(index) {
            *v = FieldValue::Null;
        }
    }

    /// Geometry, if any.
    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    /// Set or clear the geometry.
    pub fn set_geometry(&mut self, geometry: Option<Geometry>) {
        self.geometry = geometry;
    }

    /// Take the geometry out of the feature.
    pub fn take_geometry(&mut self) -> Option<Geometry> {
        self.geometry.take()
    }

    /// Copy values from `source` through an index map.
    ///
    /// `map[i]` is the index in `self` receiving field `i` of `source`;
    /// `None` drops the field. Geometry and FID are copied as well.
    pub fn set_from_mapped(&mut self, source: &Feature, map: &[Option<usize>]) {
        for (i, target) in map.iter().enumerate() {
            if let Some(t) = target {
                self.set_field(*t, source.field(i).clone());
            }
        }
        self.geometry = source.geometry.clone();
        self.fid = source.fid;
    }
}

/// Build an index map from `source` fields to `target` fields by name.
pub fn index_map_by_name(source: &FeatureDefn, target: &FeatureDefn) -> Vec<Option<usize>> {
    source
        .fields()
        .iter()
        .map(|f| target.field_index(&f.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defn() -> Arc<FeatureDefn> {
        let mut d = FeatureDefn::new("t");
        d.add_field(FieldDefn::new("a", FieldType::Integer));
        d.add_field(FieldDefn::new("b", FieldType::String).with_width(8));
        Arc::new(d)
    }

    #[test]
    fn test_new_feature_is_null() {
        let f = Feature::new(defn());
        assert_eq!(f.values().len(), 2);
        assert!(f.values().iter().all(FieldValue::is_null));
        assert_eq!(f.fid(), None);
    }

    #[test]
    fn test_set_field_coerces() {
        let mut f = Feature::new(defn());
        f.set_field(0, "12");
        f.set_field(1, 3.5);
        assert_eq!(f.field(0), &FieldValue::Integer(12));
        assert_eq!(f.field(1), &FieldValue::String("3.5".into()));
        assert!(f.set_field_by_name("missing", 1).is_err());
        f.set_field(9, 1);
        assert!(f.field(9).is_null());
    }

    #[test]
    fn test_rename_rejects_duplicate() {
        let mut d = (*defn()).clone();
        assert!(d.rename_field(0, "b").is_err());
        d.rename_field(0, "c").unwrap();
        assert_eq!(d.field_index("c"), Some(0));
    }

    #[test]
    fn test_mapped_copy() {
        let source_defn = defn();
        let mut target_defn = FeatureDefn::new("u");
        target_defn.add_field(FieldDefn::new("b", FieldType::String));
        target_defn.add_field(FieldDefn::new("new", FieldType::Real));
        let target_defn = Arc::new(target_defn);

        let mut src = Feature::new(source_defn.clone());
        src.set_field(0, 1);
        src.set_field(1, "x");
        src.set_fid(Some(4));

        let map = index_map_by_name(&source_defn, &target_defn);
        assert_eq!(map, vec![None, Some(0)]);
        let mut dst = Feature::new(target_defn);
        dst.set_from_mapped(&src, &map);
        assert_eq!(dst.field(0), &FieldValue::String("x".into()));
        assert!(dst.field(1).is_null());
        assert_eq!(dst.fid(), Some(4));
    }
}
