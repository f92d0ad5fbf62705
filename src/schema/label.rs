// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Locating table definitions in a PDS4 product label.

use std::fs;
use std::path::{Path, PathBuf};

use super::xml::{parse_document, XmlNode};
use crate::core::{Result, TableError};

/// Table element names this codec understands.
pub const TABLE_ELEMENTS: [&str; 3] = ["Table_Character", "Table_Binary", "Table_Delimited"];

/// One table declared in a label.
#[derive(Debug, Clone, PartialEq)]
pub struct TableEntry {
    /// `File/file_name`, relative to the label directory
    pub file_name: String,
    /// The `Table_*` element
    pub definition: XmlNode,
}

impl TableEntry {
    /// Table name: `local_identifier`, `name`, or the data file stem.
    pub fn name(&self) -> String {
        self.definition
            .value("local_identifier")
            .or_else(|| self.definition.value("name"))
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                Path::new(&self.file_name)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| self.file_name.clone())
            })
    }

    /// Data file path resolved against the label location.
    pub fn data_path(&self, label_path: &Path) -> PathBuf {
        label_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&self.file_name)
    }
}

/// Read and parse a label file.
pub fn read_label(path: &Path) -> Result<XmlNode> {
    let text = fs::read_to_string(path).map_err(|e| TableError::io(path, e))?;
    parse_document(&text)
}

/// List every table of every `File_Area_Observational` in document order.
pub fn tables_in_label(root: &XmlNode) -> Vec<TableEntry> {
    let mut entries = Vec::new();
    for area in root.children_named("File_Area_Observational") {
        let Some(file_name) = area.value("File.file_name") else {
            continue;
        };
        for child in &area.children {
            if TABLE_ELEMENTS.contains(&child.local_name()) {
                entries.push(TableEntry {
                    file_name: file_name.to_string(),
                    definition: child.clone(),
                });
            }
        }
    }
    entries
}

/// Build a minimal `Product_Observational` label around table definitions.
///
/// Only the `File_Area_Observational` part is produced; identification and
/// observation areas are left to label tooling.
pub fn minimal_label(tables: &[(String, XmlNode)]) -> XmlNode {
    let mut root = XmlNode::new("Product_Observational")
        .attr("xmlns", "http://pds.nasa.gov/pds4/pds/v1");
    for (file_name, definition) in tables {
        root.push(
            XmlNode::new("File_Area_Observational")
                .child_node(XmlNode::new("File").child_node(XmlNode::with_text("file_name", file_name)))
                .child_node(definition.clone()),
        );
    }
    root
}

/// Write a minimal label to disk.
pub fn write_label(path: &Path, tables: &[(String, XmlNode)]) -> Result<()> {
    fs::write(path, minimal_label(tables).to_document_string()).map_err(|e| TableError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_in_label() {
        let root = parse_document(
            r#"<Product_Observational>
                 <Identification_Area/>
                 <File_Area_Observational>
                   <File><file_name>a.dat</file_name></File>
                   <Header/>
                   <Table_Character><local_identifier>first</local_identifier></Table_Character>
                   <Table_Binary/>
                 </File_Area_Observational>
                 <File_Area_Observational>
                   <File><file_name>sub/b.csv</file_name></File>
                   <Table_Delimited/>
                 </File_Area_Observational>
                 <File_Area_Observational><Table_Delimited/></File_Area_Observational>
               </Product_Observational>"#,
        )
        .unwrap();
        let tables = tables_in_label(&root);
        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0].name(), "first");
        assert_eq!(tables[1].name(), "a");
        assert_eq!(tables[2].definition.local_name(), "Table_Delimited");
        assert_eq!(
            tables[2].data_path(Path::new("/x/label.xml")),
            PathBuf::from("/x/sub/b.csv")
        );
    }

    #[test]
    fn test_minimal_label_roundtrip() {
        let def = XmlNode::new("Table_Delimited").child_node(XmlNode::with_text("records", "2"));
        let label = minimal_label(&[("t.csv".to_string(), def)]);
        let reparsed = parse_document(&label.to_document_string()).unwrap();
        let tables = tables_in_label(&reparsed);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].file_name, "t.csv");
        assert_eq!(tables[0].definition.value("records"), Some("2"));
    }
}
