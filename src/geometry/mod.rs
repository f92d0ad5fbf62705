// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Geometry model for table features.
//!
//! Tables synthesize geometry either from coordinate columns (points) or
//! from a WKT text column (any geometry). This module provides:
//! - [`Geometry`] - Simple-features geometries with optional Z
//! - [`GeometryType`] - Declared geometry type of a layer
//! - [`Envelope`] - Bounding boxes for spatial filtering
//! - [`SpatialRef`] - Opaque spatial reference carried to sidecars
//! - [`wkt`] - WKT reader and writer

pub mod wkt;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use wkt::{parse_wkt, to_wkt};

/// Flat geometry kind, without dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    /// Layer has no geometry
    None,
    /// Layer geometry is not constrained
    Unknown,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

/// Declared geometry type of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeometryType {
    /// Flat kind
    pub kind: GeometryKind,
    /// Whether coordinates carry Z
    pub has_z: bool,
}

impl GeometryType {
    /// No geometry.
    pub const NONE: GeometryType = GeometryType::flat(GeometryKind::None);
    /// Any geometry.
    pub const UNKNOWN: GeometryType = GeometryType::flat(GeometryKind::Unknown);
    /// 2D point.
    pub const POINT: GeometryType = GeometryType::flat(GeometryKind::Point);
    /// Point with Z.
    pub const POINT_25D: GeometryType = GeometryType {
        kind: GeometryKind::Point,
        has_z: true,
    };

    /// Create a 2D geometry type.
    pub const fn flat(kind: GeometryKind) -> Self {
        Self { kind, has_z: false }
    }

    /// Drop the Z flag.
    pub const fn flatten(self) -> GeometryKind {
        self.kind
    }

    /// Check whether this is a point type (2D or 3D).
    pub fn is_point(self) -> bool {
        self.kind == GeometryKind::Point
    }

    /// Name used in sidecar descriptions (`wkbPoint`, `wkbPoint25D`, ...).
    pub fn vrt_name(self) -> String {
        let base = match self.kind {
            GeometryKind::None => return "wkbNone".to_string(),
            GeometryKind::Unknown => "wkbUnknown",
            GeometryKind::Point => "wkbPoint",
            GeometryKind::LineString => "wkbLineString",
            GeometryKind::Polygon => "wkbPolygon",
            GeometryKind::MultiPoint => "wkbMultiPoint",
            GeometryKind::MultiLineString => "wkbMultiLineString",
            GeometryKind::MultiPolygon => "wkbMultiPolygon",
            GeometryKind::GeometryCollection => "wkbGeometryCollection",
        };
        if self.has_z {
            format!("{base}25D")
        } else {
            base.to_string()
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.vrt_name())
    }
}

/// One coordinate tuple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Coord {
    /// Create a 2D coordinate.
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Create a 3D coordinate.
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

/// Simple-features geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    /// Exterior ring followed by interior rings
    Polygon(Vec<Vec<Coord>>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// Create a 2D point.
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Coord::xy(x, y))
    }

    /// Create a point with Z.
    pub fn point_z(x: f64, y: f64, z: f64) -> Self {
        Geometry::Point(Coord::xyz(x, y, z))
    }

    /// Get the point coordinate, if this is a point.
    pub fn as_point(&self) -> Option<&Coord> {
        match self {
            Geometry::Point(c) => Some(c),
            _ => None,
        }
    }

    /// Get the geometry type of this instance.
    pub fn geometry_type(&self) -> GeometryType {
        let kind = match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryKind::GeometryCollection,
        };
        GeometryType {
            kind,
            has_z: self.has_z(),
        }
    }

    /// Check whether any coordinate carries Z.
    pub fn has_z(&self) -> bool {
        let mut has_z = false;
        self.visit_coords(&mut |c| has_z |= c.z.is_some());
        has_z
    }

    /// Compute the 2D bounding box, `None` for empty geometries.
    pub fn envelope(&self) -> Option<Envelope> {
        let mut env: Option<Envelope> = None;
        self.visit_coords(&mut |c| match env {
            Some(ref mut e) => e.expand(c.x, c.y),
            None => env = Some(Envelope::new(c.x, c.y, c.x, c.y)),
        });
        env
    }

    fn visit_coords(&self, f: &mut dyn FnMut(&Coord)) {
        match self {
            Geometry::Point(c) => f(c),
            Geometry::LineString(cs) | Geometry::MultiPoint(cs) => cs.iter().for_each(f),
            Geometry::Polygon(rings) | Geometry::MultiLineString(rings) => {
                rings.iter().flatten().for_each(f)
            }
            Geometry::MultiPolygon(polys) => polys.iter().flatten().flatten().for_each(f),
            Geometry::GeometryCollection(geoms) => {
                for g in geoms {
                    g.visit_coords(f);
                }
            }
        }
    }
}

/// Axis-aligned 2D bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// Create an envelope from its corners.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Grow the envelope to include a point.
    pub fn expand(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Check whether two envelopes overlap (touching counts).
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

/// Spatial reference attached to a layer.
///
/// The codec never reprojects: it only needs to know whether coordinates
/// are geographic (to pick latitude/longitude columns) and the definition
/// text to copy into sidecar descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialRef {
    /// WKT (or any textual) definition
    pub definition: String,
    /// Whether coordinates are longitude/latitude
    pub geographic: bool,
}

impl SpatialRef {
    /// Create a geographic reference.
    pub fn geographic(definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            geographic: true,
        }
    }

    /// Create a projected reference.
    pub fn projected(definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            geographic: false,
        }
    }

    /// Check whether this reference is geographic.
    pub fn is_geographic(&self) -> bool {
        self.geographic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_type_names() {
        assert_eq!(GeometryType::POINT.vrt_name(), "wkbPoint");
        assert_eq!(GeometryType::POINT_25D.vrt_name(), "wkbPoint25D");
        assert_eq!(GeometryType::NONE.vrt_name(), "wkbNone");
        assert!(GeometryType::POINT_25D.is_point());
        assert!(!GeometryType::UNKNOWN.is_point());
    }

    #[test]
    fn test_point_type() {
        assert_eq!(Geometry::point(1.0, 2.0).geometry_type(), GeometryType::POINT);
        assert_eq!(
            Geometry::point_z(1.0, 2.0, 3.0).geometry_type(),
            GeometryType::POINT_25D
        );
    }

    #[test]
    fn test_envelope() {
        let line = Geometry::LineString(vec![Coord::xy(0.0, 5.0), Coord::xy(10.0, -1.0)]);
        let env = line.envelope().unwrap();
        assert_eq!(env, Envelope::new(0.0, -1.0, 10.0, 5.0));
        assert!(env.intersects(&Envelope::new(9.0, 4.0, 20.0, 20.0)));
        assert!(!env.intersects(&Envelope::new(11.0, 0.0, 20.0, 1.0)));
        assert!(Geometry::GeometryCollection(vec![]).envelope().is_none());
    }
}
