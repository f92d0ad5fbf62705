// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Editable layer over a table.
//!
//! Fixed-width and delimited tables only accept new columns while empty
//! and delimited tables cannot update rows in place. [`EditableLayer`]
//! lifts those limits: edits the table cannot take directly are kept in
//! memory and applied by [`EditableLayer::sync_to_disk`], which rewrites the
//! whole table through [`synchronize`].
//!
//! While the schema is unchanged, writes the table supports go straight
//! through to it.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::synchronizer::{synchronize, SyncStats};
use crate::core::{index_map_by_name, Feature, FeatureDefn, FieldDefn, Result, TableError};
use crate::geometry::Envelope;
use crate::table::{AttributeFilter, Capability, FilterSet, TableLayer};

/// In-memory editing decorator.
#[derive(Debug)]
pub struct EditableLayer<T: TableLayer> {
    inner: T,
    defn: Arc<FeatureDefn>,
    /// Index in the table's public schema of each editable field
    source_map: Vec<Option<usize>>,
    /// Features changed or appended in memory, in the editable schema
    edited: BTreeMap<i64, Feature>,
    feature_count: i64,
    next_fid: i64,
    structure_modified: bool,
    filters: FilterSet,
}

impl<T: TableLayer> EditableLayer<T> {
    /// Wrap a table.
    pub fn new(inner: T) -> Self {
        let defn = Arc::clone(inner.layer_defn());
        let source_map = (0..defn.field_count()).map(Some).collect();
        let feature_count = inner.base().record_count();
        Self {
            inner,
            defn,
            source_map,
            edited: BTreeMap::new(),
            feature_count,
            next_fid: 1,
            structure_modified: false,
            filters: FilterSet::default(),
        }
    }

    /// Decorated table.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Unwrap the table, discarding unsynchronized edits.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current schema, pending changes included.
    pub fn layer_defn(&self) -> &Arc<FeatureDefn> {
        &self.defn
    }

    /// Check if edits are waiting for [`EditableLayer::sync_to_disk`].
    pub fn is_modified(&self) -> bool {
        self.structure_modified || !self.edited.is_empty()
    }

    fn inner_count(&self) -> i64 {
        self.inner.base().record_count()
    }

    fn writes_through(&self) -> bool {
        !self.structure_modified && self.edited.is_empty() && self.feature_count == self.inner_count()
    }

    /// Add a column.
    ///
    /// The column goes straight to the table while that is still possible;
    /// otherwise it is kept in memory until the next sync.
    pub fn create_field(&mut self, field: &FieldDefn) -> Result<()> {
        self.inner.base().require_update("create field")?;
        if self.defn.field_index(&field.name).is_some() {
            return Err(TableError::invalid_schema(
                self.defn.name(),
                format!("field '{}' already exists", field.name),
            ));
        }
        if self.writes_through() && self.inner.test_capability(Capability::CreateField) {
            self.inner.create_field(field)?;
            self.defn = Arc::clone(self.inner.layer_defn());
            self.source_map = (0..self.defn.field_count()).map(Some).collect();
            return Ok(());
        }
        Arc::make_mut(&mut self.defn).add_field(field.clone());
        self.source_map.push(None);
        self.structure_modified = true;
        self.remap_edited();
        debug!(context = "editable_create_field", field = %field.name, "Field added in memory");
        Ok(())
    }

    /// Rename the column at `index`.
    pub fn alter_field_name(&mut self, index: usize, name: &str) -> Result<()> {
        self.inner.base().require_update("rename field")?;
        if index >= self.defn.field_count() {
            return Err(TableError::field_not_found(format!("#{index}")));
        }
        Arc::make_mut(&mut self.defn).rename_field(index, name)?;
        self.structure_modified = true;
        self.remap_edited();
        Ok(())
    }

    fn remap_edited(&mut self) {
        for feature in self.edited.values_mut() {
            let mut remapped = Feature::new(Arc::clone(&self.defn));
            for (i, value) in feature.values().iter().enumerate() {
                remapped.set_field(i, value.clone());
            }
            remapped.set_geometry(feature.take_geometry());
            remapped.set_fid(feature.fid());
            *feature = remapped;
        }
    }

    fn from_table(&self, feature: &Feature) -> Feature {
        from_table(feature, &self.defn, &self.source_map)
    }

    fn to_editable(&self, feature: &Feature) -> Feature {
        if Arc::ptr_eq(feature.defn(), &self.defn) {
            return feature.clone();
        }
        let mut out = Feature::new(Arc::clone(&self.defn));
        out.set_from_mapped(feature, &index_map_by_name(feature.defn(), &self.defn));
        out
    }

    /// Rewind the sequential cursor.
    pub fn reset_reading(&mut self) {
        self.next_fid = 1;
        self.inner.reset_reading();
    }

    /// Next feature passing the active filters.
    pub fn next_feature(&mut self) -> Result<Option<Feature>> {
        loop {
            let fid = self.next_fid;
            if fid > self.feature_count {
                return Ok(None);
            }
            self.next_fid += 1;

            let stored = if fid <= self.inner_count() {
                self.inner
                    .next_raw_feature()?
                    .map(|raw| self.inner.base().add_geometry_from_fields(&raw))
            } else {
                None
            };
            let feature = match (self.edited.get(&fid), stored) {
                (Some(edited), _) => edited.clone(),
                (None, Some(feature)) => self.from_table(&feature),
                (None, None) => continue,
            };
            if self.filters.matches(&feature) {
                return Ok(Some(feature));
            }
        }
    }

    /// Read one feature by FID.
    pub fn get_feature(&mut self, fid: i64) -> Result<Feature> {
        if let Some(feature) = self.edited.get(&fid) {
            return Ok(feature.clone());
        }
        if fid < 1 || fid > self.inner_count() {
            return Err(TableError::non_existing_feature(fid));
        }
        let feature = self.inner.get_feature(fid)?;
        Ok(self.from_table(&feature))
    }

    /// Replace an existing feature.
    pub fn set_feature(&mut self, feature: &Feature) -> Result<()> {
        self.inner.base().require_update("set feature")?;
        let fid = feature.fid().ok_or_else(|| TableError::non_existing_feature(0))?;
        if fid < 1 || fid > self.feature_count {
            return Err(TableError::non_existing_feature(fid));
        }
        if !self.structure_modified
            && fid <= self.inner_count()
            && self.inner.test_capability(Capability::RandomWrite)
        {
            self.inner.set_feature(feature)?;
            self.edited.remove(&fid);
            return Ok(());
        }
        let edited = self.to_editable(feature);
        self.edited.insert(fid, edited);
        Ok(())
    }

    /// Append a feature, assigning its FID.
    pub fn create_feature(&mut self, feature: &mut Feature) -> Result<()> {
        self.inner.base().require_update("create feature")?;
        if self.writes_through() && self.inner.test_capability(Capability::SequentialWrite) {
            self.inner.create_feature(feature)?;
            self.feature_count = self.inner_count();
            return Ok(());
        }
        self.feature_count += 1;
        feature.set_fid(Some(self.feature_count));
        let edited = self.to_editable(feature);
        self.edited.insert(self.feature_count, edited);
        Ok(())
    }

    /// Number of features; a full scan when a filter is active.
    pub fn feature_count(&mut self) -> Result<i64> {
        if !self.filters.is_active() {
            return Ok(self.feature_count);
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
    pub fn set_attribute_filter(&mut self, filter: Option<AttributeFilter>) {
        self.filters.attribute = filter;
    }

    /// Set or clear the spatial filter.
    pub fn set_spatial_filter(&mut self, envelope: Option<Envelope>) {
        self.filters.spatial = envelope;
    }

    /// Apply pending edits by rewriting the table.
    ///
    /// Does nothing when no edit is pending. On failure the table on disk
    /// and the pending edits are left as they were.
    pub fn sync_to_disk(&mut self) -> Result<SyncStats> {
        if !self.is_modified() {
            return Ok(SyncStats::new());
        }
        let filters = std::mem::take(&mut self.filters);
        let result = {
            let defn = &self.defn;
            let source_map = &self.source_map;
            let edited = &self.edited;
            let feature_count = self.feature_count;
            synchronize(
                &mut self.inner,
                |source, target| create_fields(source, target, defn, source_map),
                |source, target| replay_features(source, target, defn, source_map, edited, feature_count),
            )
        };
        self.filters = filters;
        let stats = result?;

        self.defn = Arc::clone(self.inner.layer_defn());
        self.source_map = (0..self.defn.field_count()).map(Some).collect();
        self.edited.clear();
        self.structure_modified = false;
        self.feature_count = self.inner_count();
        self.reset_reading();
        Ok(stats)
    }
}

fn from_table(feature: &Feature, defn: &Arc<FeatureDefn>, source_map: &[Option<usize>]) -> Feature {
    let mut out = Feature::new(Arc::clone(defn));
    out.set_fid(feature.fid());
    out.set_geometry(feature.geometry().cloned());
    for (i, source) in source_map.iter().enumerate() {
        if let Some(j) = source {
            out.set_field(i, feature.field(*j).clone());
        }
    }
    out
}

fn create_fields<T: TableLayer>(
    source: &T,
    target: &mut T,
    defn: &FeatureDefn,
    source_map: &[Option<usize>],
) -> Result<u64> {
    let mut created = 0;
    for (i, field) in defn.fields().iter().enumerate() {
        if target.base().raw_defn().field_index(&field.name).is_some() {
            warn!(
                context = "create_fields",
                field = %field.name,
                "Field collides with a geometry column, skipped"
            );
            continue;
        }
        let original = source_map[i].and_then(|j| source.layer_defn().field(j));
        let metadata = original
            .filter(|o| o.field_type == field.field_type)
            .and_then(|o| source.field_metadata(&o.name));
        target.create_field_with_metadata(field, metadata.as_ref())?;
        created += 1;
    }
    Ok(created)
}

fn replay_features<T: TableLayer>(
    source: &mut T,
    target: &mut T,
    defn: &Arc<FeatureDefn>,
    source_map: &[Option<usize>],
    edited: &BTreeMap<i64, Feature>,
    feature_count: i64,
) -> Result<u64> {
    let source_filters = source.base_mut().take_filters();
    let result = copy_features(source, target, defn, source_map, edited, feature_count);
    source.base_mut().restore_filters(source_filters);
    result
}

fn copy_features<T: TableLayer>(
    source: &mut T,
    target: &mut T,
    defn: &Arc<FeatureDefn>,
    source_map: &[Option<usize>],
    edited: &BTreeMap<i64, Feature>,
    feature_count: i64,
) -> Result<u64> {
    let target_defn = Arc::clone(target.layer_defn());
    let map = index_map_by_name(defn, &target_defn);
    let source_count = source.base().record_count();
    source.reset_reading();

    let mut copied = 0;
    for fid in 1..=feature_count {
        let stored = if fid <= source_count {
            source
                .next_raw_feature()?
                .map(|raw| source.base().add_geometry_from_fields(&raw))
        } else {
            None
        };
        let feature = match (edited.get(&fid), stored) {
            (Some(edited), _) => edited.clone(),
            (None, Some(feature)) => from_table(&feature, defn, source_map),
            (None, None) => continue,
        };
        let mut out = Feature::new(Arc::clone(&target_defn));
        out.set_from_mapped(&feature, &map);
        out.set_fid(None);
        target.create_feature(&mut out)?;
        copied += 1;
    }
    source.reset_reading();
    Ok(copied)
}
