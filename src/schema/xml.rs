// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Minimal XML document model using Pest.
//!
//! PDS4 table definitions are read from and written back to label XML.
//! This module handles:
//! - Parsing a document into an [`XmlNode`] tree (entities, CDATA, comments)
//! - Prefix-agnostic lookups (`pds:Field_Character` matches `Field_Character`)
//! - Serializing a tree with escaping and indentation

use std::fmt::Write as _;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use serde::{Deserialize, Serialize};

use crate::core::{Result, TableError};

/// Pest parser for XML documents.
#[derive(Parser)]
#[grammar = "schema/xml.pest"]
struct XmlParser;

/// One XML element with its attributes, text and child elements.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XmlNode {
    /// Qualified element name as written (may carry a prefix)
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Concatenated character data directly inside this element
    pub text: String,
    /// Child elements in document order
    pub children: Vec<XmlNode>,
}

/// Strip a namespace prefix from a qualified name.
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

impl XmlNode {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create an element holding only text.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Builder: add an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Builder: add a child element.
    pub fn child_node(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child element.
    pub fn push(&mut self, child: XmlNode) {
        self.children.push(child);
    }

    /// Element name without namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Find the first child element with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.local_name() == name)
    }

    /// Iterate child elements with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.local_name() == name)
    }

    /// Look up a node by a dotted path of local names (`"Record_Character.record_length"`).
    pub fn find(&self, path: &str) -> Option<&XmlNode> {
        path.split('.')
            .filter(|p| !p.is_empty())
            .try_fold(self, |node, part| node.child(part))
    }

    /// Trimmed text of the node at `path`, `None` when absent.
    pub fn value(&self, path: &str) -> Option<&str> {
        self.find(path).map(|n| n.text.trim())
    }

    /// Get an attribute value by local name.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| local_name(k) == key)
            .map(|(_, v)| v.as_str())
    }

    /// Serialize this element (and its subtree) as indented XML.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_indented(&mut out, 0);
        out
    }

    /// Serialize as a standalone document with an XML declaration.
    pub fn to_document_string(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.write_indented(&mut out, 0);
        out
    }

    fn write_indented(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}<{}", self.name);
        for (k, v) in &self.attributes {
            let _ = write!(out, " {k}=\"{}\"", escape(v, true));
        }
        let text = self.text.trim();
        if self.children.is_empty() && text.is_empty() {
            out.push_str("/>\n");
            return;
        }
        out.push('>');
        if self.children.is_empty() {
            out.push_str(&escape(text, false));
        } else {
            out.push('\n');
            if !text.is_empty() {
                let _ = writeln!(out, "{indent}  {}", escape(text, false));
            }
            for child in &self.children {
                child.write_indented(out, depth + 1);
            }
            out.push_str(&indent);
        }
        let _ = writeln!(out, "</{}>", self.name);
    }
}

/// Parse an XML document and return its root element.
pub fn parse_document(text: &str) -> Result<XmlNode> {
    let mut pairs = XmlParser::parse(Rule::document, text)
        .map_err(|e| TableError::parse("xml", format!("{e}")))?;
    let document = pairs
        .next()
        .ok_or_else(|| TableError::parse("xml", "empty document"))?;
    let root = document
        .into_inner()
        .find(|p| p.as_rule() == Rule::element)
        .ok_or_else(|| TableError::parse("xml", "no root element"))?;
    build_element(root)
}

fn build_element(pair: Pair<Rule>) -> Result<XmlNode> {
    let (line, col) = pair.line_col();
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| TableError::parse("xml", "element without name"))?;
    let mut node = XmlNode::new(name);

    for item in inner {
        match item.as_rule() {
            Rule::attribute => {
                let mut parts = item.into_inner();
                let key = parts.next().map(|p| p.as_str().to_string()).unwrap_or_default();
                let value = parts.next().map(|p| decode_entities(p.as_str())).unwrap_or_default();
                node.attributes.push((key, value));
            }
            Rule::element => node.children.push(build_element(item)?),
            Rule::text => node.text.push_str(&decode_entities(item.as_str())),
            Rule::cdata => {
                if let Some(body) = item.into_inner().next() {
                    node.text.push_str(body.as_str());
                }
            }
            Rule::name => {
                if item.as_str() != node.name {
                    return Err(TableError::parse(
                        "xml",
                        format!(
                            "line {line}, column {col}: element <{}> closed by </{}>",
                            node.name,
                            item.as_str()
                        ),
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(node)
}

/// Replace the predefined and numeric character entities.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let Some(end) = after.find(';') else {
            out.push_str(&rest[pos..]);
            return out;
        };
        let entity = &after[..end];
        let decoded = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => out.push(c),
            None => {
                out.push('&');
                out.push_str(entity);
                out.push(';');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
