// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! State and behaviour shared by every table encoding.
//!
//! A table has two schemas. The raw schema mirrors the on-disk columns one
//! to one. The public schema is what callers see: the raw columns minus the
//! ones absorbed into geometry (latitude/longitude/altitude or a WKT
//! column), plus a geometry type. `field_map[i]` is the raw index of public
//! field `i`; it is rebuilt whenever the raw schema changes.

use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::filter::{AttributeFilter, FilterSet};
use super::options::{GeomColumnNames, OpenOptions};
use crate::core::{Access, Feature, FeatureDefn, FieldDefn, FieldType, Result, TableError};
use crate::geometry::{parse_wkt, to_wkt, Envelope, Geometry, GeometryType, SpatialRef};

/// Raw column indices that feed the geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeomSources {
    pub lat: Option<usize>,
    pub long: Option<usize>,
    pub alt: Option<usize>,
    pub wkt: Option<usize>,
}

impl GeomSources {
    fn contains(&self, index: usize) -> bool {
        [self.lat, self.long, self.alt, self.wkt].contains(&Some(index))
    }
}

/// Append `suffix` to a path (`a.dat` + `.tmp` = `a.dat.tmp`).
pub fn path_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

/// Shared table state.
#[derive(Debug)]
pub struct TableBase {
    name: String,
    filename: PathBuf,
    file: Option<File>,
    access: Access,
    creation: bool,
    /// Byte offset of the first record
    pub(crate) offset: u64,
    /// Number of records
    pub(crate) feature_count: i64,
    /// Next FID returned by sequential reads
    pub(crate) next_fid: i64,
    raw_defn: Arc<FeatureDefn>,
    defn: Arc<FeatureDefn>,
    field_map: Vec<usize>,
    geom: GeomSources,
    columns: GeomColumnNames,
    keep_geom_columns: bool,
    dirty_header: bool,
    filters: FilterSet,
}

impl TableBase {
    /// Open an existing data file.
    pub fn open(name: &str, path: &Path, options: &OpenOptions) -> Result<Self> {
        let file = fs::OpenOptions::new()
            .read(true)
            .write(options.access.is_update())
            .open(path)
            .map_err(|e| TableError::io(path, e))?;
        debug!(context = "table_open", path = %path.display(), access = options.access.as_str(), "Opened table file");
        let mut base = Self::with_file(name, path, file, options.access, false);
        base.columns = options.columns.clone();
        base.keep_geom_columns = options.keep_geom_columns;
        Ok(base)
    }

    /// Create (or truncate) a data file for a new table.
    pub fn create(name: &str, path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TableError::io(parent, e))?;
        }
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| TableError::io(path, e))?;
        debug!(context = "table_create", path = %path.display(), "Created table file");
        let mut base = Self::with_file(name, path, file, Access::Update, true);
        base.dirty_header = true;
        Ok(base)
    }

    fn with_file(name: &str, path: &Path, file: File, access: Access, creation: bool) -> Self {
        Self {
            name: name.to_string(),
            filename: path.to_path_buf(),
            file: Some(file),
            access,
            creation,
            offset: 0,
            feature_count: 0,
            next_fid: 1,
            raw_defn: Arc::new(FeatureDefn::new(name)),
            defn: Arc::new(FeatureDefn::new(name)),
            field_map: Vec::new(),
            geom: GeomSources::default(),
            columns: GeomColumnNames::default(),
            keep_geom_columns: false,
            dirty_header: false,
            filters: FilterSet::default(),
        }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current data file path.
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Access mode.
    pub fn access(&self) -> Access {
        self.access
    }

    /// Whether the table was created (not opened) by this instance.
    pub fn is_creation(&self) -> bool {
        self.creation
    }

    /// Fail unless the table is writable.
    pub fn require_update(&self, operation: &str) -> Result<()> {
        if self.access.is_update() {
            Ok(())
        } else {
            Err(TableError::read_only(&self.name, operation))
        }
    }

    /// Check `1 <= fid <= feature_count`.
    pub fn check_fid(&self, fid: i64) -> Result<()> {
        if fid >= 1 && fid <= self.feature_count {
            Ok(())
        } else {
            Err(TableError::non_existing_feature(fid))
        }
    }

    /// Open file handle.
    pub fn file_mut(&mut self) -> Result<&mut File> {
        let path = self.filename.clone();
        self.file.as_mut().ok_or_else(|| {
            TableError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotConnected, "table file is closed"),
            )
        })
    }

    /// Cached record count.
    pub fn record_count(&self) -> i64 {
        self.feature_count
    }

    /// On-disk schema.
    pub fn raw_defn(&self) -> &Arc<FeatureDefn> {
        &self.raw_defn
    }

    /// Caller-facing schema.
    pub fn defn(&self) -> &Arc<FeatureDefn> {
        &self.defn
    }

    /// Raw index of each public field.
    pub fn field_map(&self) -> &[usize] {
        &self.field_map
    }

    /// Raw columns feeding the geometry.
    pub fn geom_sources(&self) -> GeomSources {
        self.geom
    }

    /// Names of the columns currently feeding the geometry.
    pub fn geom_column_names(&self) -> GeomColumnNames {
        let name = |i: Option<usize>| i.and_then(|i| self.raw_defn.field(i)).map(|f| f.name.clone());
        GeomColumnNames {
            lat: name(self.geom.lat),
            long: name(self.geom.long),
            alt: name(self.geom.alt),
            wkt: name(self.geom.wkt),
        }
    }

    /// Column name overrides given at open or creation time.
    pub fn column_names(&self) -> &GeomColumnNames {
        &self.columns
    }

    /// Replace the column name overrides.
    pub fn set_column_names(&mut self, columns: GeomColumnNames) {
        self.columns = columns;
    }

    /// Whether geometry source columns stay visible as attributes.
    pub fn keeps_geom_columns(&self) -> bool {
        self.keep_geom_columns
    }

    /// Set the spatial reference of the geometry column.
    pub fn set_spatial_ref(&mut self, srs: Option<SpatialRef>) {
        Arc::make_mut(&mut self.defn).set_spatial_ref(srs);
    }

    /// Whether the table definition changed since it was last persisted.
    pub fn is_header_dirty(&self) -> bool {
        self.dirty_header
    }

    /// Flag the table definition as changed.
    pub fn mark_header_dirty(&mut self) {
        self.dirty_header = true;
    }

    /// Flag the table definition as persisted.
    pub fn clear_header_dirty(&mut self) {
        self.dirty_header = false;
    }

    /// Append a raw column (and its public counterpart), returning its raw index.
    pub fn add_raw_field(&mut self, field: FieldDefn) -> usize {
        let index = Arc::make_mut(&mut self.raw_defn).add_field(field.clone());
        Arc::make_mut(&mut self.defn).add_field(field);
        self.field_map.push(index);
        self.dirty_header = true;
        index
    }

    /// Replace the definition of an existing raw column.
    pub fn replace_raw_field(&mut self, index: usize, field: FieldDefn) {
        let mut raw = (*self.raw_defn).clone();
        let mut fields: Vec<FieldDefn> = raw.fields().to_vec();
        if index >= fields.len() {
            return;
        }
        fields[index] = field;
        raw = rebuild_defn(&raw, fields);
        self.raw_defn = Arc::new(raw);
        let geometry_type = self.defn.geometry_type();
        self.rebuild_public(geometry_type);
    }

    /// Resolve the geometry sources of an opened table.
    ///
    /// A WKT string column (override or `WKT`) wins; otherwise real
    /// latitude/longitude columns (overrides or `Latitude`/`Longitude`)
    /// give points, with Z when a real altitude column exists; otherwise the
    /// table has no geometry.
    pub fn setup_geom_field(&mut self) {
        let raw = Arc::clone(&self.raw_defn);
        let find = |name: &str, field_type: FieldType| {
            raw.field_index(name)
                .filter(|&i| raw.fields()[i].field_type == field_type)
        };

        let mut sources = GeomSources::default();
        let geometry_type = if let Some(wkt) = find(self.columns.wkt_name(), FieldType::String) {
            sources.wkt = Some(wkt);
            GeometryType::UNKNOWN
        } else if let (Some(lat), Some(long)) = (
            find(self.columns.lat_name(), FieldType::Real),
            find(self.columns.long_name(), FieldType::Real),
        ) {
            sources.lat = Some(lat);
            sources.long = Some(long);
            sources.alt = find(self.columns.alt_name(), FieldType::Real);
            if sources.alt.is_some() {
                GeometryType::POINT_25D
            } else {
                GeometryType::POINT
            }
        } else {
            GeometryType::NONE
        };

        for (option, wanted, field_type) in [
            ("WKT", &self.columns.wkt, FieldType::String),
            ("LAT", &self.columns.lat, FieldType::Real),
            ("LONG", &self.columns.long, FieldType::Real),
            ("ALT", &self.columns.alt, FieldType::Real),
        ] {
            if let Some(name) = wanted {
                if find(name, field_type).is_none() {
                    warn!(
                        context = "setup_geom_field",
                        table = %self.name,
                        option,
                        column = %name,
                        "Geometry column not found or has the wrong type"
                    );
                }
            }
        }

        self.geom = sources;
        self.rebuild_public(geometry_type);
    }

    /// Assign geometry sources for a new table.
    pub fn set_geom_sources(&mut self, sources: GeomSources, geometry_type: GeometryType) {
        self.geom = sources;
        self.rebuild_public(geometry_type);
    }

    fn rebuild_public(&mut self, geometry_type: GeometryType) {
        let mut defn = FeatureDefn::new(self.name.clone());
        defn.set_geometry_type(geometry_type);
        defn.set_spatial_ref(self.defn.spatial_ref().cloned());
        let mut map = Vec::with_capacity(self.raw_defn.field_count());
        for (i, field) in self.raw_defn.fields().iter().enumerate() {
            if self.keep_geom_columns || !self.geom.contains(i) {
                defn.add_field(field.clone());
                map.push(i);
            }
        }
        self.defn = Arc::new(defn);
        self.field_map = map;
    }

    /// Turn a raw feature into a public one, synthesizing its geometry.
    pub fn add_geometry_from_fields(&self, raw: &Feature) -> Feature {
        let mut feature = Feature::new(Arc::clone(&self.defn));
        feature.set_fid(raw.fid());
        for (i, &r) in self.field_map.iter().enumerate() {
            feature.set_field(i, raw.field(r).clone());
        }

        if let Some(wkt) = self.geom.wkt {
            if let Some(text) = raw.field(wkt).as_str() {
                match parse_wkt(text) {
                    Ok(geometry) => feature.set_geometry(Some(geometry)),
                    Err(e) => warn!(
                        context = "add_geometry_from_fields",
                        fid = raw.fid().unwrap_or(0),
                        error = %e,
                        "Cannot parse WKT column"
                    ),
                }
            }
        } else if let (Some(lat), Some(long)) = (self.geom.lat, self.geom.long) {
            if let (Some(y), Some(x)) = (raw.field(lat).as_f64(), raw.field(long).as_f64()) {
                let z = self.geom.alt.and_then(|a| raw.field(a).as_f64());
                let point = match z {
                    Some(z) => Geometry::point_z(x, y, z),
                    None => Geometry::point(x, y),
                };
                feature.set_geometry(Some(point));
            }
        }
        feature
    }

    /// Turn a public feature into a raw one, decomposing its geometry.
    pub fn add_fields_from_geometry(&self, public: &Feature) -> Feature {
        let mut raw = Feature::new(Arc::clone(&self.raw_defn));
        raw.set_fid(public.fid());

        if Arc::ptr_eq(public.defn(), &self.defn) || **public.defn() == *self.defn {
            for (i, &r) in self.field_map.iter().enumerate() {
                raw.set_field(r, public.field(i).clone());
            }
        } else {
            for (i, field) in public.defn().fields().iter().enumerate() {
                if let Some(j) = self.defn.field_index(&field.name) {
                    raw.set_field(self.field_map[j], public.field(i).clone());
                }
            }
        }

        if let Some(geometry) = public.geometry() {
            match (geometry.as_point(), self.geom.lat, self.geom.long) {
                (Some(c), Some(lat), Some(long)) => {
                    raw.set_field(long, c.x);
                    raw.set_field(lat, c.y);
                    if let Some(alt) = self.geom.alt {
                        raw.set_field(alt, c.z);
                    }
                }
                _ => match self.geom.wkt {
                    Some(wkt) => raw.set_field(wkt, to_wkt(geometry)),
                    None => warn!(
                        context = "add_fields_from_geometry",
                        table = %self.name,
                        geometry = %geometry.geometry_type(),
                        "Geometry cannot be stored in this table"
                    ),
                },
            }
        }
        raw
    }

    /// Active filters.
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Set or clear the attribute filter.
    pub fn set_attribute_filter(&mut self, filter: Option<AttributeFilter>) {
        self.filters.attribute = filter;
    }

    /// Set or clear the spatial filter.
    pub fn set_spatial_filter(&mut self, envelope: Option<Envelope>) {
        self.filters.spatial = envelope;
    }

    /// Remove all filters, returning them for [`TableBase::restore_filters`].
    pub fn take_filters(&mut self) -> FilterSet {
        std::mem::take(&mut self.filters)
    }

    /// Reinstall filters removed by [`TableBase::take_filters`].
    pub fn restore_filters(&mut self, filters: FilterSet) {
        self.filters = filters;
    }

    /// Close the file handle.
    pub fn close_file(&mut self) {
        self.file = None;
    }

    /// Open the file handle again with the table's access mode.
    pub fn reopen(&mut self) -> Result<()> {
        let file = fs::OpenOptions::new()
            .read(true)
            .write(self.access.is_update())
            .open(&self.filename)
            .map_err(|e| TableError::io(&self.filename, e))?;
        self.file = Some(file);
        Ok(())
    }

    /// Move the data file to `target`.
    ///
    /// A file already at `target` is moved to `<target>.bak` first and
    /// removed once the rename succeeded; on failure it is put back and the
    /// table stays on its old path.
    pub fn rename_file_to(&mut self, target: &Path) -> Result<()> {
        self.close_file();
        let backup = target.exists().then(|| path_with_suffix(target, ".bak"));

        if let Some(bak) = &backup {
            if let Err(e) = fs::rename(target, bak) {
                self.reopen()?;
                return Err(TableError::io(target, e));
            }
        }
        if let Err(e) = fs::rename(&self.filename, target) {
            if let Some(bak) = &backup {
                if let Err(restore) = fs::rename(bak, target) {
                    warn!(context = "rename_file_to", path = %bak.display(), error = %restore, "Cannot restore backup");
                }
            }
            self.reopen()?;
            return Err(TableError::io(target, e));
        }
        if let Some(bak) = &backup {
            if let Err(e) = fs::remove_file(bak) {
                warn!(context = "rename_file_to", path = %bak.display(), error = %e, "Cannot remove backup");
            }
        }
        debug!(context = "rename_file_to", from = %self.filename.display(), to = %target.display(), "Renamed table file");
        self.filename = target.to_path_buf();
        self.reopen()
    }
}

fn rebuild_defn(template: &FeatureDefn, fields: Vec<FieldDefn>) -> FeatureDefn {
    let mut defn = FeatureDefn::new(template.name());
    defn.set_geometry_type(template.geometry_type());
    defn.set_spatial_ref(template.spatial_ref().cloned());
    for field in fields {
        defn.add_field(field);
    }
    defn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldValue;

    fn base_with(fields: &[(&str, FieldType)], options: &OpenOptions) -> (tempfile::TempDir, TableBase) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dat");
        fs::write(&path, b"").unwrap();
        let mut base = TableBase::open("t", &path, options).unwrap();
        for (name, ty) in fields {
            base.add_raw_field(FieldDefn::new(*name, *ty));
        }
        base.setup_geom_field();
        (dir, base)
    }

    #[test]
    fn test_wkt_wins_over_lat_long() {
        let (_dir, base) = base_with(
            &[
                ("Latitude", FieldType::Real),
                ("Longitude", FieldType::Real),
                ("WKT", FieldType::String),
                ("v", FieldType::Integer),
            ],
            &OpenOptions::new(),
        );
        assert_eq!(base.defn().geometry_type(), GeometryType::UNKNOWN);
        assert_eq!(base.geom_sources().wkt, Some(2));
        let names: Vec<_> = base.defn().fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Latitude", "Longitude", "v"]);
    }

    #[test]
    fn test_lat_long_alt_and_keep() {
        let (_dir, base) = base_with(
            &[
                ("Latitude", FieldType::Real),
                ("Longitude", FieldType::Real),
                ("Altitude", FieldType::Real),
            ],
            &OpenOptions::new().with_keep_geom_columns(true),
        );
        assert_eq!(base.defn().geometry_type(), GeometryType::POINT_25D);
        assert_eq!(base.defn().field_count(), 3);
    }

    #[test]
    fn test_lat_long_must_be_real() {
        let (_dir, base) = base_with(
            &[("Latitude", FieldType::String), ("Longitude", FieldType::Real)],
            &OpenOptions::new(),
        );
        assert_eq!(base.defn().geometry_type(), GeometryType::NONE);
        assert_eq!(base.defn().field_count(), 2);
    }

    #[test]
    fn test_geometry_roundtrip_through_raw() {
        let (_dir, base) = base_with(
            &[
                ("name", FieldType::String),
                ("lon", FieldType::Real),
                ("lat", FieldType::Real),
            ],
            &OpenOptions::new().with_lat_long("lat", "lon"),
        );
        assert_eq!(base.field_map(), &[0]);

        let mut public = Feature::new(Arc::clone(base.defn()));
        public.set_field(0, "A");
        public.set_geometry(Some(Geometry::point(10.0, 20.0)));
        public.set_fid(Some(3));
        let raw = base.add_fields_from_geometry(&public);
        assert_eq!(raw.values(), &[
            FieldValue::String("A".into()),
            FieldValue::Real(10.0),
            FieldValue::Real(20.0)
        ]);

        let back = base.add_geometry_from_fields(&raw);
        assert_eq!(back, public);
    }

    #[test]
    fn test_null_coordinates_give_no_geometry() {
        let (_dir, base) = base_with(
            &[("Latitude", FieldType::Real), ("Longitude", FieldType::Real)],
            &OpenOptions::new(),
        );
        let mut raw = Feature::new(Arc::clone(base.raw_defn()));
        raw.set_field(0, 1.0);
        assert!(base.add_geometry_from_fields(&raw).geometry().is_none());
    }

    #[test]
    fn test_rename_with_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.tmp");
        let dst = dir.path().join("a.dat");
        fs::write(&src, b"new").unwrap();
        fs::write(&dst, b"old").unwrap();
        let mut base = TableBase::open("a", &src, &OpenOptions::new()).unwrap();
        base.rename_file_to(&dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"new");
        assert!(!src.exists());
        assert!(!path_with_suffix(&dst, ".bak").exists());
        assert_eq!(base.filename(), dst.as_path());
    }

    #[test]
    fn test_check_fid_and_read_only() {
        let (_dir, mut base) = base_with(&[], &OpenOptions::new());
        base.feature_count = 2;
        assert!(base.check_fid(1).is_ok());
        assert!(base.check_fid(0).unwrap_err().is_non_existing_feature());
        assert!(base.check_fid(3).is_err());
        assert!(matches!(
            base.require_update("write"),
            Err(TableError::ReadOnly { .. })
        ));
    }
}
