// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record layout expansion.
//!
//! `Record_*` elements declare fields and (possibly nested) repeated groups.
//! These functions flatten them into one field list: group repetitions are
//! tiled within `group_length` and their fields renamed with `_1`, `_2`, ...
//! They only read the XML tree, so they can be tested on hand-built
//! fragments.

use super::field::{DelimitedField, FieldMetadata, FixedWidthField};
use super::xml::XmlNode;
use crate::core::{Result, TableError};
use crate::encoding::DataType;

/// Upper bound on `repetitions` of a single group.
pub const MAX_REPETITIONS: usize = 1000;

/// Record geometry a fixed-width layout must fit in.
#[derive(Debug, Clone, Copy)]
pub struct FixedLayout<'a> {
    /// Table name used in error messages
    pub table: &'a str,
    /// `Character` or `Binary`
    pub subtype: &'a str,
    /// Usable bytes of a record (record length minus line ending)
    pub usable: usize,
}

/// Flatten the fields of a `Record_Character` / `Record_Binary` element.
pub fn expand_fixed_width(record: &XmlNode, layout: &FixedLayout<'_>) -> Result<Vec<FixedWidthField>> {
    let mut fields = Vec::new();
    expand_fixed_level(record, layout, 0, layout.usable, "", &mut fields)?;
    Ok(fields)
}

fn expand_fixed_level(
    node: &XmlNode,
    layout: &FixedLayout<'_>,
    base: usize,
    limit: usize,
    suffix: &str,
    out: &mut Vec<FixedWidthField>,
) -> Result<()> {
    let field_tag = format!("Field_{}", layout.subtype);
    let group_tag = format!("Group_Field_{}", layout.subtype);
    let invalid = |reason: String| TableError::invalid_schema(layout.table, reason);

    for child in &node.children {
        if child.local_name() == field_tag {
            let name = required(child, "name", layout.table)?;
            let location = positive(child, "field_location", layout.table)?;
            let length = positive(child, "field_length", layout.table)?;
            let data_type = DataType::parse(required(child, "data_type", layout.table)?);

            let offset = base + location - 1;
            if offset + length > limit {
                return Err(invalid(format!(
                    "field '{name}{suffix}' at offset {offset} with length {length} exceeds {limit}"
                )));
            }
            if let Some(width) = data_type.binary_width() {
                if layout.subtype == "Character" {
                    return Err(invalid(format!(
                        "binary data type {data_type} in a character table"
                    )));
                }
                if width != length {
                    return Err(invalid(format!(
                        "field '{name}{suffix}': {data_type} needs field_length {width}, got {length}"
                    )));
                }
            }
            out.push(FixedWidthField {
                name: format!("{name}{suffix}"),
                offset,
                length,
                meta: FieldMetadata::from_node(child, data_type),
            });
        } else if child.local_name() == group_tag {
            let repetitions = repetitions(child, layout.table)?;
            let location = positive(child, "group_location", layout.table)?;
            let group_length = positive(child, "group_length", layout.table)?;
            if group_length % repetitions != 0 {
                return Err(invalid(format!(
                    "group_length {group_length} is not a multiple of repetitions {repetitions}"
                )));
            }
            let group_offset = base + location - 1;
            if group_offset + group_length > limit {
                return Err(invalid(format!(
                    "group at offset {group_offset} with length {group_length} exceeds {limit}"
                )));
            }
            let stride = group_length / repetitions;
            for i in 0..repetitions {
                let start = group_offset + i * stride;
                let suffix = format!("{suffix}_{}", i + 1);
                expand_fixed_level(child, layout, start, start + stride, &suffix, out)?;
            }
        }
    }
    Ok(())
}

/// Flatten the fields of a `Record_Delimited` element.
pub fn expand_delimited(record: &XmlNode, table: &str) -> Result<Vec<DelimitedField>> {
    let mut fields = Vec::new();
    expand_delimited_level(record, table, "", &mut fields)?;
    Ok(fields)
}

fn expand_delimited_level(
    node: &XmlNode,
    table: &str,
    suffix: &str,
    out: &mut Vec<DelimitedField>,
) -> Result<()> {
    for child in &node.children {
        match child.local_name() {
            "Field_Delimited" => {
                let name = required(child, "name", table)?;
                let data_type = DataType::parse(required(child, "data_type", table)?);
                let maximum_field_length = child
                    .value("maximum_field_length")
                    .and_then(|v| v.parse::<usize>().ok());
                out.push(DelimitedField {
                    name: format!("{name}{suffix}"),
                    maximum_field_length,
                    meta: FieldMetadata::from_node(child, data_type),
                });
            }
            "Group_Field_Delimited" => {
                let repetitions = repetitions(child, table)?;
                for i in 0..repetitions {
                    let suffix = format!("{suffix}_{}", i + 1);
                    expand_delimited_level(child, table, &suffix, out)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn required<'a>(node: &'a XmlNode, key: &str, table: &str) -> Result<&'a str> {
    node.value(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            TableError::invalid_schema(table, format!("missing {key} in {}", node.local_name()))
        })
}

fn positive(node: &XmlNode, key: &str, table: &str) -> Result<usize> {
    let raw = required(node, key, table)?;
    match raw.parse::<i64>() {
        Ok(v) if v > 0 => Ok(v as usize),
        _ => Err(TableError::invalid_schema(
            table,
            format!("invalid {key} '{raw}' in {}", node.local_name()),
        )),
    }
}

fn repetitions(node: &XmlNode, table: &str) -> Result<usize> {
    let n = positive(node, "repetitions", table)?;
    if n > MAX_REPETITIONS {
        return Err(TableError::invalid_schema(
            table,
            format!("repetitions {n} exceeds {MAX_REPETITIONS}"),
        ));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::xml::parse_document;

    fn layout(usable: usize) -> FixedLayout<'static> {
        FixedLayout {
            table: "t",
            subtype: "Character",
            usable,
        }
    }

    #[test]
    fn test_group_of_two_fields_three_times() {
        let record = parse_document(
            r#"<Record_Character>
                 <Field_Character><name>id</name><field_location>1</field_location>
                   <data_type>ASCII_Integer</data_type><field_length>4</field_length></Field_Character>
                 <Group_Field_Character>
                   <repetitions>3</repetitions><fields>2</fields><groups>0</groups>
                   <group_location>5</group_location><group_length>30</group_length>
                   <Field_Character><name>a</name><field_location>1</field_location>
                     <data_type>ASCII_Real</data_type><field_length>6</field_length></Field_Character>
                   <Field_Character><name>b</name><field_location>7</field_location>
                     <data_type>ASCII_Integer</data_type><field_length>4</field_length></Field_Character>
                 </Group_Field_Character>
               </Record_Character>"#,
        )
        .unwrap();
        let fields = expand_fixed_width(&record, &layout(34)).unwrap();
        let got: Vec<_> = fields.iter().map(|f| (f.name.as_str(), f.offset, f.length)).collect();
        assert_eq!(
            got,
            vec![
                ("id", 0, 4),
                ("a_1", 4, 6),
                ("b_1", 10, 4),
                ("a_2", 14, 6),
                ("b_2", 20, 4),
                ("a_3", 24, 6),
                ("b_3", 30, 4),
            ]
        );
    }

    #[test]
    fn test_group_length_not_divisible() {
        let record = parse_document(
            "<Record_Character><Group_Field_Character><repetitions>3</repetitions>\
             <group_location>1</group_location><group_length>10</group_length>\
             </Group_Field_Character></Record_Character>",
        )
        .unwrap();
        let err = expand_fixed_width(&record, &layout(10)).unwrap_err();
        assert!(err.to_string().contains("not a multiple"));
    }

    #[test]
    fn test_field_out_of_record() {
        let record = parse_document(
            "<Record_Character><Field_Character><name>x</name><field_location>5</field_location>\
             <data_type>ASCII_Integer</data_type><field_length>4</field_length></Field_Character>\
             </Record_Character>",
        )
        .unwrap();
        assert!(expand_fixed_width(&record, &layout(8)).is_ok());
        assert!(expand_fixed_width(&record, &layout(7)).is_err());
    }

    #[test]
    fn test_binary_length_must_match() {
        let record = parse_document(
            "<Record_Binary><Field_Binary><name>x</name><field_location>1</field_location>\
             <data_type>SignedMSB4</data_type><field_length>2</field_length></Field_Binary>\
             </Record_Binary>",
        )
        .unwrap();
        let layout = FixedLayout {
            table: "t",
            subtype: "Binary",
            usable: 8,
        };
        assert!(expand_fixed_width(&record, &layout).is_err());
    }

    #[test]
    fn test_repetitions_limit() {
        let record = parse_document(
            "<Record_Delimited><Group_Field_Delimited><repetitions>1001</repetitions>\
             </Group_Field_Delimited></Record_Delimited>",
        )
        .unwrap();
        assert!(expand_delimited(&record, "t").is_err());
    }

    #[test]
    fn test_delimited_nested_groups() {
        let record = parse_document(
            "<Record_Delimited><Field_Delimited><name>n</name><data_type>UTF8_String</data_type>\
             <maximum_field_length>8</maximum_field_length></Field_Delimited>\
             <Group_Field_Delimited><repetitions>2</repetitions>\
               <Group_Field_Delimited><repetitions>2</repetitions>\
                 <Field_Delimited><name>v</name><data_type>ASCII_Real</data_type></Field_Delimited>\
               </Group_Field_Delimited>\
             </Group_Field_Delimited></Record_Delimited>",
        )
        .unwrap();
        let fields = expand_delimited(&record, "t").unwrap();
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["n", "v_1_1", "v_1_2", "v_2_1", "v_2_2"]);
        assert_eq!(fields[0].maximum_field_length, Some(8));
    }
}
