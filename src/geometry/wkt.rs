// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! WKT reader and writer using Pest.
//!
//! Reads the OGC and ISO spellings (`POINT Z (1 2 3)`, `POINT (1 2 3)`,
//! `POINTZ(1 2 3)`); M ordinates are accepted and discarded. Writes the ISO
//! spelling.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use super::{Coord, Geometry};
use crate::core::{Result, TableError};

/// Pest parser for WKT geometries.
#[derive(Parser)]
#[grammar = "geometry/wkt.pest"]
struct WktParser;

/// Which ordinates follow X and Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dim {
    /// Infer from the ordinate count (3 → Z, 4 → ZM)
    Implicit,
    Z,
    M,
    Zm,
}

/// Parse a WKT string into a geometry.
pub fn parse_wkt(text: &str) -> Result<Geometry> {
    let mut pairs = WktParser::parse(Rule::wkt, text)
        .map_err(|e| TableError::parse("wkt", format!("{e}")))?;
    let wkt = pairs
        .next()
        .ok_or_else(|| TableError::parse("wkt", "empty input"))?;
    let geometry = wkt
        .into_inner()
        .find(|p| p.as_rule() != Rule::EOI)
        .ok_or_else(|| TableError::parse("wkt", "no geometry"))?;
    build_geometry(geometry)
}

fn build_geometry(pair: Pair<Rule>) -> Result<Geometry> {
    let rule = pair.as_rule();
    let mut dim = Dim::Implicit;
    let mut items = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::dim => {
                dim = match inner.as_str().to_ascii_uppercase().as_str() {
                    "Z" => Dim::Z,
                    "M" => Dim::M,
                    _ => Dim::Zm,
                }
            }
            Rule::empty => {}
            _ => items.push(inner),
        }
    }

    match rule {
        Rule::point => {
            let coord = items
                .into_iter()
                .next()
                .ok_or_else(|| TableError::parse("wkt", "POINT without coordinates"))?;
            Ok(Geometry::Point(build_coord(coord, dim)?))
        }
        Rule::linestring => match items.into_iter().next() {
            Some(list) => Ok(Geometry::LineString(build_coord_list(list, dim)?)),
            None => Ok(Geometry::LineString(Vec::new())),
        },
        Rule::polygon => match items.into_iter().next() {
            Some(rings) => Ok(Geometry::Polygon(build_ring_list(rings, dim)?)),
            None => Ok(Geometry::Polygon(Vec::new())),
        },
        Rule::multilinestring => match items.into_iter().next() {
            Some(rings) => Ok(Geometry::MultiLineString(build_ring_list(rings, dim)?)),
            None => Ok(Geometry::MultiLineString(Vec::new())),
        },
        Rule::multipoint => items
            .into_iter()
            .map(|c| build_coord(c, dim))
            .collect::<Result<Vec<_>>>()
            .map(Geometry::MultiPoint),
        Rule::multipolygon => items
            .into_iter()
            .map(|r| build_ring_list(r, dim))
            .collect::<Result<Vec<_>>>()
            .map(Geometry::MultiPolygon),
        Rule::collection => items
            .into_iter()
            .map(build_geometry)
            .collect::<Result<Vec<_>>>()
            .map(Geometry::GeometryCollection),
        other => Err(TableError::parse(
            "wkt",
            format!("unexpected rule {other:?}"),
        )),
    }
}

fn build_ring_list(pair: Pair<Rule>, dim: Dim) -> Result<Vec<Vec<Coord>>> {
    pair.into_inner()
        .map(|list| build_coord_list(list, dim))
        .collect()
}

fn build_coord_list(pair: Pair<Rule>, dim: Dim) -> Result<Vec<Coord>> {
    pair.into_inner().map(|c| build_coord(c, dim)).collect()
}

fn build_coord(pair: Pair<Rule>, dim: Dim) -> Result<Coord> {
    let values = pair
        .into_inner()
        .map(|n| {
            n.as_str()
                .parse::<f64>()
                .map_err(|e| TableError::parse("wkt", format!("bad number '{}': {e}", n.as_str())))
        })
        .collect::<Result<Vec<f64>>>()?;
    let z = match (dim, values.len()) {
        (Dim::M, _) => None,
        (_, n) if n >= 3 => Some(values[2]),
        _ => None,
    };
    let expected_min = match dim {
        Dim::Implicit => 2,
        Dim::Z | Dim::M => 3,
        Dim::Zm => 4,
    };
    if values.len() < expected_min {
        return Err(TableError::parse(
            "wkt",
            format!("expected {expected_min} ordinates, got {}", values.len()),
        ));
    }
    Ok(Coord {
        x: values[0],
        y: values[1],
        z,
    })
}

/// Serialize a geometry as ISO WKT.
pub fn to_wkt(geometry: &Geometry) -> String {
    let has_z = geometry.has_z();
    let mut out = String::new();
    write_geometry(&mut out, geometry, has_z);
    out
}

fn write_geometry(out: &mut String, geometry: &Geometry, has_z: bool) {
    let tag = match geometry {
        Geometry::Point(_) => "POINT",
        Geometry::LineString(_) => "LINESTRING",
        Geometry::Polygon(_) => "POLYGON",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
    };
    out.push_str(tag);
    if has_z {
        out.push_str(" Z");
    }

    let is_empty = match geometry {
        Geometry::Point(_) => false,
        Geometry::LineString(c) | Geometry::MultiPoint(c) => c.is_empty(),
        Geometry::Polygon(r) | Geometry::MultiLineString(r) => r.is_empty(),
        Geometry::MultiPolygon(p) => p.is_empty(),
        Geometry::GeometryCollection(g) => g.is_empty(),
    };
    if is_empty {
        out.push_str(" EMPTY");
        return;
    }

    out.push(' ');
    match geometry {
        Geometry::Point(c) => {
            out.push('(');
            write_coord(out, c, has_z);
            out.push(')');
        }
        Geometry::LineString(coords) => write_coord_list(out, coords, has_z),
        Geometry::Polygon(rings) | Geometry::MultiLineString(rings) => {
            write_ring_list(out, rings, has_z)
        }
        Geometry::MultiPoint(coords) => {
            out.push('(');
            for (i, c) in coords.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push('(');
                write_coord(out, c, has_z);
                out.push(')');
            }
            out.push(')');
        }
        Geometry::MultiPolygon(polygons) => {
            out.push('(');
            for (i, rings) in polygons.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_ring_list(out, rings, has_z);
            }
            out.push(')');
        }
        Geometry::GeometryCollection(geoms) => {
            out.push('(');
            for (i, g) in geoms.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_geometry(out, g, g.has_z());
            }
            out.push(')');
        }
    }
}

fn write_ring_list(out: &mut String, rings: &[Vec<Coord>], has_z: bool) {
    out.push('(');
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_coord_list(out, ring, has_z);
    }
    out.push(')');
}

fn write_coord_list(out: &mut String, coords: &[Coord], has_z: bool) {
    out.push('(');
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_coord(out, c, has_z);
    }
    out.push(')');
}

fn write_coord(out: &mut String, c: &Coord, has_z: bool) {
    out.push_str(&format!("{} {}", c.x, c.y));
    if has_z {
        out.push_str(&format!(" {}", c.z.unwrap_or(0.0)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryType;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_wkt("POINT (10 20)").unwrap(), Geometry::point(10.0, 20.0));
        assert_eq!(parse_wkt("point(1.5 -2e1)").unwrap(), Geometry::point(1.5, -20.0));
    }

    #[test]
    fn test_parse_point_z_variants() {
        let expected = Geometry::point_z(1.0, 2.0, 3.0);
        assert_eq!(parse_wkt("POINT Z (1 2 3)").unwrap(), expected);
        assert_eq!(parse_wkt("POINTZ(1 2 3)").unwrap(), expected);
        assert_eq!(parse_wkt("POINT (1 2 3)").unwrap(), expected);
        assert_eq!(parse_wkt("POINT ZM (1 2 3 4)").unwrap(), expected);
        assert_eq!(
            parse_wkt("POINT M (1 2 3)").unwrap(),
            Geometry::point(1.0, 2.0)
        );
    }

    #[test]
    fn test_parse_polygon_with_hole() {
        let g = parse_wkt("POLYGON ((0 0,10 0,10 10,0 0),(1 1,2 1,2 2,1 1))").unwrap();
        match g {
            Geometry::Polygon(rings) => {
                assert_eq!(rings.len(), 2);
                assert_eq!(rings[0].len(), 4);
            }
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_multipoint_both_spellings() {
        let a = parse_wkt("MULTIPOINT ((1 2),(3 4))").unwrap();
        let b = parse_wkt("MULTIPOINT (1 2, 3 4)").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_collection_and_empty() {
        let g = parse_wkt("GEOMETRYCOLLECTION (POINT (1 2), LINESTRING EMPTY)").unwrap();
        assert_eq!(
            g,
            Geometry::GeometryCollection(vec![
                Geometry::point(1.0, 2.0),
                Geometry::LineString(vec![])
            ])
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_wkt("POINT (1)").is_err());
        assert!(parse_wkt("CIRCLE (1 2)").is_err());
        assert!(parse_wkt("").is_err());
        assert!(parse_wkt("POINT Z (1 2)").is_err());
    }

    #[test]
    fn test_write() {
        assert_eq!(to_wkt(&Geometry::point(10.0, 20.0)), "POINT (10 20)");
        assert_eq!(
            to_wkt(&Geometry::point_z(1.0, 2.5, 3.0)),
            "POINT Z (1 2.5 3)"
        );
        assert_eq!(
            to_wkt(&Geometry::MultiLineString(vec![])),
            "MULTILINESTRING EMPTY"
        );
    }

    #[test]
    fn test_write_then_read_polygon() {
        let text = "MULTIPOLYGON (((0 0,1 0,1 1,0 0)),((5 5,6 5,6 6,5 5)))";
        let g = parse_wkt(text).unwrap();
        assert_eq!(to_wkt(&g), text);
        assert_eq!(g.geometry_type().kind, crate::geometry::GeometryKind::MultiPolygon);
        assert_eq!(parse_wkt(&to_wkt(&g)).unwrap().geometry_type(), GeometryType {
            kind: crate::geometry::GeometryKind::MultiPolygon,
            has_z: false,
        });
    }
}
