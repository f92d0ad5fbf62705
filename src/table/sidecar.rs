// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Sidecar layer description for delimited tables.
//!
//! Generic CSV readers know nothing about the geometry columns of a PDS4
//! delimited table. The sidecar is an OGR VRT document next to the data
//! file that maps raw columns to attributes and to a point or WKT
//! geometry. It is derived data and is rewritten from the table state.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::base::TableBase;
use crate::core::{Result, TableError};
use crate::geometry::GeometryType;
use crate::schema::XmlNode;

/// Sidecar path of a data file (`table.csv` gives `table.vrt`).
pub fn sidecar_path(data_path: &Path) -> PathBuf {
    data_path.with_extension("vrt")
}

/// Build the sidecar document for a table.
pub fn build_sidecar(base: &TableBase) -> XmlNode {
    let data_path = base.filename();
    let file_name = data_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let src_layer = data_path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let defn = base.defn();
    let mut layer = XmlNode::new("OGRVRTLayer")
        .attr("name", base.name())
        .child_node(XmlNode::with_text("SrcDataSource", file_name).attr("relativeToVRT", "1"))
        .child_node(XmlNode::with_text("SrcLayer", src_layer));

    let geometry_type = defn.geometry_type();
    layer.push(XmlNode::with_text("GeometryType", geometry_type.vrt_name()));
    if geometry_type != GeometryType::NONE {
        if let Some(srs) = defn.spatial_ref() {
            layer.push(XmlNode::with_text("LayerSRS", &srs.definition));
        }
        let columns = base.geom_column_names();
        if let Some(wkt) = columns.wkt {
            layer.push(XmlNode::new("GeometryField").attr("encoding", "WKT").attr("field", wkt));
        } else if let (Some(lat), Some(long)) = (columns.lat, columns.long) {
            let mut geometry_field = XmlNode::new("GeometryField")
                .attr("encoding", "PointFromColumns")
                .attr("x", long)
                .attr("y", lat);
            if let Some(alt) = columns.alt {
                geometry_field = geometry_field.attr("z", alt);
            }
            layer.push(geometry_field);
        }
    }

    for field in defn.fields() {
        let mut node = XmlNode::new("Field")
            .attr("name", &field.name)
            .attr("type", field.field_type.as_str())
            .attr("src", &field.name);
        if let Some(subtype) = field.subtype.as_str() {
            node = node.attr("subtype", subtype);
        }
        layer.push(node);
    }

    XmlNode::new("OGRVRTDataSource").child_node(layer)
}

/// Write the sidecar of a table next to its data file.
pub fn write_sidecar(base: &TableBase) -> Result<PathBuf> {
    let path = sidecar_path(base.filename());
    fs::write(&path, build_sidecar(base).to_xml_string()).map_err(|e| TableError::io(&path, e))?;
    debug!(context = "write_sidecar", path = %path.display(), "Wrote sidecar description");
    Ok(path)
}
