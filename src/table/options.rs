// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Open and creation options.
//!
//! Options can be built programmatically (`Default` plus `with_*`) or
//! parsed from `KEY=VALUE` strings. Keys are case-insensitive; unknown keys
//! are logged and ignored.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::core::{Access, Result, TableError};
use crate::geometry::{GeometryType, SpatialRef};

/// Record terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineEnding {
    /// `\r\n`
    #[default]
    Crlf,
    /// `\n`
    Lf,
}

impl LineEnding {
    /// Bytes written after each record.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Crlf => b"\r\n",
            LineEnding::Lf => b"\n",
        }
    }

    /// `record_delimiter` value in a label.
    pub fn record_delimiter(self) -> &'static str {
        match self {
            LineEnding::Crlf => "Carriage-Return Line-Feed",
            LineEnding::Lf => "Line-Feed",
        }
    }

    /// Parse a `record_delimiter` value.
    pub fn from_record_delimiter(value: &str) -> Option<LineEnding> {
        match value.trim() {
            v if v.eq_ignore_ascii_case("Carriage-Return Line-Feed") => Some(LineEnding::Crlf),
            v if v.eq_ignore_ascii_case("Line-Feed") => Some(LineEnding::Lf),
            _ => None,
        }
    }

    /// Parse a `LINE_ENDING` option value.
    pub fn from_option(value: &str) -> Option<LineEnding> {
        match value.to_ascii_uppercase().as_str() {
            "CRLF" => Some(LineEnding::Crlf),
            "LF" => Some(LineEnding::Lf),
            _ => None,
        }
    }
}

/// Field separator of a delimited table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldDelimiter {
    #[default]
    Comma,
    HorizontalTab,
    Semicolon,
    VerticalBar,
}

impl FieldDelimiter {
    /// The separator byte.
    pub fn as_char(self) -> char {
        match self {
            FieldDelimiter::Comma => ',',
            FieldDelimiter::HorizontalTab => '\t',
            FieldDelimiter::Semicolon => ';',
            FieldDelimiter::VerticalBar => '|',
        }
    }

    /// `field_delimiter` value in a label.
    pub fn label_name(self) -> &'static str {
        match self {
            FieldDelimiter::Comma => "Comma",
            FieldDelimiter::HorizontalTab => "Horizontal Tab",
            FieldDelimiter::Semicolon => "Semicolon",
            FieldDelimiter::VerticalBar => "Vertical Bar",
        }
    }

    /// Parse a `field_delimiter` value.
    pub fn from_label(value: &str) -> Option<FieldDelimiter> {
        let value = value.trim();
        [
            FieldDelimiter::Comma,
            FieldDelimiter::HorizontalTab,
            FieldDelimiter::Semicolon,
            FieldDelimiter::VerticalBar,
        ]
        .into_iter()
        .find(|d| d.label_name().eq_ignore_ascii_case(value))
    }

    /// Parse a `FIELD_DELIMITER` option value.
    pub fn from_option(value: &str) -> Option<FieldDelimiter> {
        match value.to_ascii_uppercase().as_str() {
            "COMMA" => Some(FieldDelimiter::Comma),
            "TAB" => Some(FieldDelimiter::HorizontalTab),
            "SEMICOLON" => Some(FieldDelimiter::Semicolon),
            "VERTICAL_BAR" => Some(FieldDelimiter::VerticalBar),
            _ => None,
        }
    }
}

/// How geometry is stored in a new table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeomColumns {
    /// Coordinate columns for points over a geographic SRS, WKT otherwise
    #[default]
    Auto,
    /// Always a WKT column
    Wkt,
    /// Always longitude/latitude(/altitude) columns
    LongLat,
}

/// Encoding of a new table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TableType {
    #[default]
    Delimited,
    Character,
    Binary,
}

impl TableType {
    /// Data file extension.
    pub fn extension(self) -> &'static str {
        match self {
            TableType::Delimited => "csv",
            TableType::Character | TableType::Binary => "dat",
        }
    }
}

/// Column names used as geometry sources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeomColumnNames {
    /// Latitude column override
    pub lat: Option<String>,
    /// Longitude column override
    pub long: Option<String>,
    /// Altitude column override
    pub alt: Option<String>,
    /// WKT column override
    pub wkt: Option<String>,
}

impl GeomColumnNames {
    /// Latitude column name.
    pub fn lat_name(&self) -> &str {
        self.lat.as_deref().unwrap_or("Latitude")
    }

    /// Longitude column name.
    pub fn long_name(&self) -> &str {
        self.long.as_deref().unwrap_or("Longitude")
    }

    /// Altitude column name.
    pub fn alt_name(&self) -> &str {
        self.alt.as_deref().unwrap_or("Altitude")
    }

    /// WKT column name.
    pub fn wkt_name(&self) -> &str {
        self.wkt.as_deref().unwrap_or("WKT")
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        let slot = match key {
            "LAT" => &mut self.lat,
            "LONG" => &mut self.long,
            "ALT" => &mut self.alt,
            "WKT" => &mut self.wkt,
            _ => return false,
        };
        *slot = Some(value.to_string());
        true
    }
}

/// Options for opening an existing table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenOptions {
    /// Access mode
    pub access: Access,
    /// Geometry column overrides
    pub columns: GeomColumnNames,
    /// Keep geometry source columns as attributes
    pub keep_geom_columns: bool,
}

impl OpenOptions {
    /// Read-only defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: open for update.
    pub fn with_update(mut self, update: bool) -> Self {
        self.access = if update { Access::Update } else { Access::ReadOnly };
        self
    }

    /// Builder: keep geometry source columns.
    pub fn with_keep_geom_columns(mut self, keep: bool) -> Self {
        self.keep_geom_columns = keep;
        self
    }

    /// Builder: override the latitude/longitude column names.
    pub fn with_lat_long(mut self, lat: impl Into<String>, long: impl Into<String>) -> Self {
        self.columns.lat = Some(lat.into());
        self.columns.long = Some(long.into());
        self
    }

    /// Builder: override the altitude column name.
    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.columns.alt = Some(alt.into());
        self
    }

    /// Builder: override the WKT column name.
    pub fn with_wkt(mut self, wkt: impl Into<String>) -> Self {
        self.columns.wkt = Some(wkt.into());
        self
    }

    /// Parse `KEY=VALUE` open options (`LAT`, `LONG`, `ALT`, `WKT`, `KEEP_GEOM_COLUMNS`).
    pub fn from_strings<S: AsRef<str>>(items: &[S]) -> Result<Self> {
        let mut options = Self::default();
        for (key, value) in split_pairs(items)? {
            if options.columns.set(&key, &value) {
                continue;
            }
            match key.as_str() {
                "KEEP_GEOM_COLUMNS" => options.keep_geom_columns = parse_bool(&key, &value)?,
                _ => warn!(context = "open_options", option = %key, "Unknown open option ignored"),
            }
        }
        Ok(options)
    }
}

/// Options for creating a new table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerCreationOptions {
    /// Record encoding
    pub table_type: TableType,
    /// Geometry storage strategy
    pub geom_columns: GeomColumns,
    /// Geometry column names
    pub columns: GeomColumnNames,
    /// Place the data file next to the label instead of a sub-directory
    pub same_directory: bool,
    /// Write a sidecar description for delimited tables
    pub create_vrt: bool,
    /// Record terminator; binary tables default to none
    pub line_ending: Option<LineEnding>,
    /// Separator for delimited tables
    pub field_delimiter: FieldDelimiter,
}

impl Default for LayerCreationOptions {
    fn default() -> Self {
        Self {
            table_type: TableType::Delimited,
            geom_columns: GeomColumns::Auto,
            columns: GeomColumnNames::default(),
            same_directory: false,
            create_vrt: true,
            line_ending: None,
            field_delimiter: FieldDelimiter::Comma,
        }
    }
}

impl LayerCreationOptions {
    /// Defaults for the given table type.
    pub fn new(table_type: TableType) -> Self {
        Self {
            table_type,
            ..Self::default()
        }
    }

    /// Builder: geometry storage strategy.
    pub fn with_geom_columns(mut self, geom_columns: GeomColumns) -> Self {
        self.geom_columns = geom_columns;
        self
    }

    /// Builder: geometry column names.
    pub fn with_columns(mut self, columns: GeomColumnNames) -> Self {
        self.columns = columns;
        self
    }

    /// Builder: record terminator.
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = Some(line_ending);
        self
    }

    /// Builder: field separator.
    pub fn with_field_delimiter(mut self, delimiter: FieldDelimiter) -> Self {
        self.field_delimiter = delimiter;
        self
    }

    /// Builder: sidecar generation.
    pub fn with_create_vrt(mut self, create_vrt: bool) -> Self {
        self.create_vrt = create_vrt;
        self
    }

    /// Builder: data file placement.
    pub fn with_same_directory(mut self, same_directory: bool) -> Self {
        self.same_directory = same_directory;
        self
    }

    /// Line ending a new table of this type uses.
    pub fn effective_line_ending(&self) -> Option<LineEnding> {
        match self.table_type {
            TableType::Binary => self.line_ending,
            TableType::Character | TableType::Delimited => {
                Some(self.line_ending.unwrap_or_default())
            }
        }
    }

    /// Whether a new table stores `geometry_type` in coordinate columns.
    ///
    /// `AUTO` picks them for points over a geographic SRS (or when
    /// `force_geographic` is set), `LONG_LAT` for any geometry, `WKT` never.
    pub fn uses_coordinate_columns(
        &self,
        geometry_type: GeometryType,
        srs: Option<&SpatialRef>,
        force_geographic: bool,
    ) -> bool {
        if geometry_type == GeometryType::NONE {
            return false;
        }
        match self.geom_columns {
            GeomColumns::LongLat => true,
            GeomColumns::Wkt => false,
            GeomColumns::Auto => {
                geometry_type.is_point()
                    && (force_geographic || srs.is_some_and(SpatialRef::is_geographic))
            }
        }
    }

    /// Parse `KEY=VALUE` creation options.
    pub fn from_strings<S: AsRef<str>>(items: &[S]) -> Result<Self> {
        let mut options = Self::default();
        for (key, value) in split_pairs(items)? {
            if options.columns.set(&key, &value) {
                continue;
            }
            match key.as_str() {
                "TABLE_TYPE" => {
                    options.table_type = match value.to_ascii_uppercase().as_str() {
                        "DELIMITED" => TableType::Delimited,
                        "CHARACTER" => TableType::Character,
                        "BINARY" => TableType::Binary,
                        _ => return Err(bad_value(&key, &value)),
                    }
                }
                "GEOM_COLUMNS" => {
                    options.geom_columns = match value.to_ascii_uppercase().as_str() {
                        "AUTO" => GeomColumns::Auto,
                        "WKT" => GeomColumns::Wkt,
                        "LONG_LAT" => GeomColumns::LongLat,
                        _ => return Err(bad_value(&key, &value)),
                    }
                }
                "SAME_DIRECTORY" => options.same_directory = parse_bool(&key, &value)?,
                "CREATE_VRT" => options.create_vrt = parse_bool(&key, &value)?,
                "LINE_ENDING" => {
                    options.line_ending =
                        Some(LineEnding::from_option(&value).ok_or_else(|| bad_value(&key, &value))?)
                }
                "FIELD_DELIMITER" => {
                    options.field_delimiter =
                        FieldDelimiter::from_option(&value).ok_or_else(|| bad_value(&key, &value))?
                }
                _ => warn!(context = "creation_options", option = %key, "Unknown creation option ignored"),
            }
        }
        Ok(options)
    }

    /// Data file path for a new table described by the label at `label_path`.
    ///
    /// With `SAME_DIRECTORY` the file is `<label dir>/<label stem>_<layer>.<ext>`;
    /// otherwise `<label dir>/<label stem>/<layer>.<ext>`.
    pub fn table_file_path(&self, label_path: &Path, layer: &str) -> PathBuf {
        let dir = label_path.parent().unwrap_or_else(|| Path::new(""));
        let stem = label_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self.table_type.extension();
        if self.same_directory {
            dir.join(format!("{stem}_{layer}.{ext}"))
        } else {
            dir.join(stem).join(format!("{layer}.{ext}"))
        }
    }
}

fn split_pairs<S: AsRef<str>>(items: &[S]) -> Result<Vec<(String, String)>> {
    items
        .iter()
        .map(|item| {
            let item = item.as_ref();
            item.split_once('=')
                .map(|(k, v)| (k.trim().to_ascii_uppercase(), v.trim().to_string()))
                .ok_or_else(|| TableError::unsupported(format!("option '{item}' is not KEY=VALUE")))
        })
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_uppercase().as_str() {
        "YES" | "TRUE" | "ON" | "1" => Ok(true),
        "NO" | "FALSE" | "OFF" | "0" => Ok(false),
        _ => Err(bad_value(key, value)),
    }
}

fn bad_value(key: &str, value: &str) -> TableError {
    TableError::unsupported(format!("{key}={value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_options_parse() {
        let opts = LayerCreationOptions::from_strings(&[
            "TABLE_TYPE=character",
            "GEOM_COLUMNS=LONG_LAT",
            "lat=lat_deg",
            "LINE_ENDING=LF",
            "CREATE_VRT=NO",
            "FIELD_DELIMITER=SEMICOLON",
            "BOGUS=1",
        ])
        .unwrap();
        assert_eq!(opts.table_type, TableType::Character);
        assert_eq!(opts.geom_columns, GeomColumns::LongLat);
        assert_eq!(opts.columns.lat_name(), "lat_deg");
        assert_eq!(opts.columns.long_name(), "Longitude");
        assert_eq!(opts.effective_line_ending(), Some(LineEnding::Lf));
        assert!(!opts.create_vrt);
        assert_eq!(opts.field_delimiter.as_char(), ';');
    }

    #[test]
    fn test_creation_options_errors() {
        assert!(LayerCreationOptions::from_strings(&["GEOM_COLUMNS=XYZ"]).is_err());
        assert!(LayerCreationOptions::from_strings(&["NOEQUALS"]).is_err());
    }

    #[test]
    fn test_line_ending_defaults() {
        assert_eq!(
            LayerCreationOptions::new(TableType::Binary).effective_line_ending(),
            None
        );
        assert_eq!(
            LayerCreationOptions::new(TableType::Character).effective_line_ending(),
            Some(LineEnding::Crlf)
        );
    }

    #[test]
    fn test_uses_coordinate_columns() {
        let geographic = SpatialRef::geographic("GEOGCS[\"Mars 2000\"]");
        let auto = LayerCreationOptions::default();
        assert!(auto.uses_coordinate_columns(GeometryType::POINT, Some(&geographic), false));
        assert!(!auto.uses_coordinate_columns(GeometryType::POINT, None, false));
        assert!(auto.uses_coordinate_columns(GeometryType::POINT_25D, None, true));
        assert!(!auto.uses_coordinate_columns(GeometryType::UNKNOWN, Some(&geographic), false));

        let long_lat = auto.clone().with_geom_columns(GeomColumns::LongLat);
        assert!(long_lat.uses_coordinate_columns(GeometryType::UNKNOWN, None, false));
        assert!(!long_lat.uses_coordinate_columns(GeometryType::NONE, None, false));
    }

    #[test]
    fn test_open_options() {
        let opts = OpenOptions::from_strings(&["WKT=geom", "KEEP_GEOM_COLUMNS=YES"]).unwrap();
        assert_eq!(opts.columns.wkt_name(), "geom");
        assert!(opts.keep_geom_columns);
        assert!(!opts.access.is_update());
    }

    #[test]
    fn test_label_values() {
        assert_eq!(
            LineEnding::from_record_delimiter("Carriage-Return Line-Feed"),
            Some(LineEnding::Crlf)
        );
        assert_eq!(
            FieldDelimiter::from_label("horizontal tab"),
            Some(FieldDelimiter::HorizontalTab)
        );
        assert_eq!(FieldDelimiter::from_label("Space"), None);
    }

    #[test]
    fn test_table_file_path() {
        let label = Path::new("/data/product.xml");
        let opts = LayerCreationOptions::new(TableType::Delimited);
        assert_eq!(
            opts.table_file_path(label, "pts"),
            PathBuf::from("/data/product/pts.csv")
        );
        let opts = LayerCreationOptions::new(TableType::Binary).with_same_directory(true);
        assert_eq!(
            opts.table_file_path(label, "pts"),
            PathBuf::from("/data/product_pts.dat")
        );
    }
}
