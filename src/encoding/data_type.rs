// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! PDS4 field data types.
//!
//! Every table column declares one `data_type` tag. Tags fall into three
//! families: ASCII/UTF-8 text (decoded from a trimmed token), fixed-width
//! binary numerics (decoded from exactly `width` bytes in a declared byte
//! order), and tags this codec does not interpret (bit strings, complex
//! numbers), which are carried through as lossy text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{FieldSubType, FieldType};

/// Byte order of a binary numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endian {
    /// Least significant byte first
    Lsb,
    /// Most significant byte first
    Msb,
}

impl Endian {
    fn as_str(self) -> &'static str {
        match self {
            Endian::Lsb => "LSB",
            Endian::Msb => "MSB",
        }
    }
}

/// A PDS4 `data_type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    AsciiInteger,
    AsciiNonNegativeInteger,
    AsciiReal,
    AsciiBoolean,
    AsciiDateYmd,
    AsciiDateDoy,
    AsciiDateTimeYmd,
    AsciiDateTimeYmdUtc,
    AsciiDateTimeDoy,
    AsciiDateTimeDoyUtc,
    AsciiTime,
    Utf8String,
    /// Any other `ASCII_*` or `UTF8_*` string tag, kept verbatim
    Text(String),
    SignedByte,
    UnsignedByte,
    /// `Signed{LSB,MSB}{2,4,8}`
    SignedInt { width: u8, endian: Endian },
    /// `Unsigned{LSB,MSB}{2,4,8}`
    UnsignedInt { width: u8, endian: Endian },
    /// `IEEE754{LSB,MSB}{Single,Double}`, width 4 or 8
    Float { width: u8, endian: Endian },
    /// Tag this codec reads as lossy text and never writes
    Unsupported(String),
}

impl DataType {
    /// Parse a tag. Unknown tags map to [`DataType::Unsupported`].
    pub fn parse(tag: &str) -> DataType {
        let tag = tag.trim();
        match tag {
            "ASCII_Integer" => return DataType::AsciiInteger,
            "ASCII_NonNegative_Integer" => return DataType::AsciiNonNegativeInteger,
            "ASCII_Real" => return DataType::AsciiReal,
            "ASCII_Boolean" => return DataType::AsciiBoolean,
            "ASCII_Date_YMD" => return DataType::AsciiDateYmd,
            "ASCII_Date_DOY" => return DataType::AsciiDateDoy,
            "ASCII_Date_Time_YMD" => return DataType::AsciiDateTimeYmd,
            "ASCII_Date_Time_YMD_UTC" => return DataType::AsciiDateTimeYmdUtc,
            "ASCII_Date_Time_DOY" => return DataType::AsciiDateTimeDoy,
            "ASCII_Date_Time_DOY_UTC" => return DataType::AsciiDateTimeDoyUtc,
            "ASCII_Time" => return DataType::AsciiTime,
            "UTF8_String" => return DataType::Utf8String,
            "SignedByte" => return DataType::SignedByte,
            "UnsignedByte" => return DataType::UnsignedByte,
            _ => {}
        }

        if let Some(rest) = tag.strip_prefix("IEEE754") {
            let parsed = split_endian(rest).and_then(|(endian, size)| match size {
                "Single" => Some(DataType::Float { width: 4, endian }),
                "Double" => Some(DataType::Float { width: 8, endian }),
                _ => None,
            });
            if let Some(dt) = parsed {
                return dt;
            }
        }
        for (prefix, signed) in [("Signed", true), ("Unsigned", false)] {
            let Some(rest) = tag.strip_prefix(prefix) else {
                continue;
            };
            let width = split_endian(rest).and_then(|(endian, size)| match size {
                "2" => Some((2, endian)),
                "4" => Some((4, endian)),
                "8" => Some((8, endian)),
                _ => None,
            });
            if let Some((width, endian)) = width {
                return if signed {
                    DataType::SignedInt { width, endian }
                } else {
                    DataType::UnsignedInt { width, endian }
                };
            }
        }

        if (tag.starts_with("ASCII_") || tag.starts_with("UTF8_")) && !tag.contains("Numeric_Base") {
            return DataType::Text(tag.to_string());
        }
        DataType::Unsupported(tag.to_string())
    }

    /// The tag as written in a label.
    pub fn name(&self) -> String {
        match self {
            DataType::AsciiInteger => "ASCII_Integer".into(),
            DataType::AsciiNonNegativeInteger => "ASCII_NonNegative_Integer".into(),
            DataType::AsciiReal => "ASCII_Real".into(),
            DataType::AsciiBoolean => "ASCII_Boolean".into(),
            DataType::AsciiDateYmd => "ASCII_Date_YMD".into(),
            DataType::AsciiDateDoy => "ASCII_Date_DOY".into(),
            DataType::AsciiDateTimeYmd => "ASCII_Date_Time_YMD".into(),
            DataType::AsciiDateTimeYmdUtc => "ASCII_Date_Time_YMD_UTC".into(),
            DataType::AsciiDateTimeDoy => "ASCII_Date_Time_DOY".into(),
            DataType::AsciiDateTimeDoyUtc => "ASCII_Date_Time_DOY_UTC".into(),
            DataType::AsciiTime => "ASCII_Time".into(),
            DataType::Utf8String => "UTF8_String".into(),
            DataType::Text(tag) | DataType::Unsupported(tag) => tag.clone(),
            DataType::SignedByte => "SignedByte".into(),
            DataType::UnsignedByte => "UnsignedByte".into(),
            DataType::SignedInt { width, endian } => format!("Signed{}{width}", endian.as_str()),
            DataType::UnsignedInt { width, endian } => {
                format!("Unsigned{}{width}", endian.as_str())
            }
            DataType::Float { width, endian } => format!(
                "IEEE754{}{}",
                endian.as_str(),
                if *width == 4 { "Single" } else { "Double" }
            ),
        }
    }

    /// Byte width of a binary numeric type, `None` for text types.
    pub fn binary_width(&self) -> Option<usize> {
        match self {
            DataType::SignedByte | DataType::UnsignedByte => Some(1),
            DataType::SignedInt { width, .. }
            | DataType::UnsignedInt { width, .. }
            | DataType::Float { width, .. } => Some(usize::from(*width)),
            _ => None,
        }
    }

    /// Check if this is a binary numeric type.
    pub fn is_binary(&self) -> bool {
        self.binary_width().is_some()
    }

    /// Check if values are carried as free text (may be truncated on overflow).
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            DataType::Utf8String | DataType::Text(_) | DataType::Unsupported(_)
        )
    }

    /// Check if this is a numeric text type (right-aligned in character records).
    pub fn is_numeric_text(&self) -> bool {
        matches!(
            self,
            DataType::AsciiInteger | DataType::AsciiNonNegativeInteger | DataType::AsciiReal
        )
    }

    /// Engine field type and subtype for a column of this data type.
    ///
    /// `length` is the declared byte length when known: `ASCII_Integer`
    /// columns narrower than 10 characters fit a 32-bit integer.
    pub fn field_type(&self, length: Option<usize>) -> (FieldType, FieldSubType) {
        match self {
            DataType::AsciiBoolean => (FieldType::Integer, FieldSubType::Boolean),
            DataType::AsciiInteger | DataType::AsciiNonNegativeInteger => match length {
                Some(len) if len < 10 => (FieldType::Integer, FieldSubType::None),
                _ => (FieldType::Integer64, FieldSubType::None),
            },
            DataType::AsciiReal => (FieldType::Real, FieldSubType::None),
            DataType::AsciiDateYmd | DataType::AsciiDateDoy => (FieldType::Date, FieldSubType::None),
            DataType::AsciiDateTimeYmd
            | DataType::AsciiDateTimeYmdUtc
            | DataType::AsciiDateTimeDoy
            | DataType::AsciiDateTimeDoyUtc => (FieldType::DateTime, FieldSubType::None),
            DataType::AsciiTime => (FieldType::Time, FieldSubType::None),
            DataType::SignedByte | DataType::UnsignedByte => {
                (FieldType::Integer, FieldSubType::None)
            }
            DataType::SignedInt { width: 2, .. } => (FieldType::Integer, FieldSubType::Int16),
            DataType::UnsignedInt { width: 2, .. } | DataType::SignedInt { width: 4, .. } => {
                (FieldType::Integer, FieldSubType::None)
            }
            DataType::SignedInt { .. } | DataType::UnsignedInt { .. } => {
                (FieldType::Integer64, FieldSubType::None)
            }
            DataType::Float { width: 4, .. } => (FieldType::Real, FieldSubType::Float32),
            DataType::Float { .. } => (FieldType::Real, FieldSubType::None),
            DataType::Utf8String | DataType::Text(_) | DataType::Unsupported(_) => {
                (FieldType::String, FieldSubType::None)
            }
        }
    }

    /// Default text data type and width for a new column.
    ///
    /// Used by character records and, for non-numeric columns, by binary
    /// records. A non-zero `width` on the field definition overrides the
    /// default width for strings, integers and reals.
    pub fn default_text(field_type: FieldType, subtype: FieldSubType, width: usize) -> (DataType, usize) {
        let or = |default: usize| if width > 0 { width } else { default };
        match field_type {
            FieldType::String => (DataType::Utf8String, or(64)),
            FieldType::Integer if subtype == FieldSubType::Boolean => (DataType::AsciiBoolean, 1),
            FieldType::Integer => (DataType::AsciiInteger, or(11)),
            FieldType::Integer64 => (DataType::AsciiInteger, or(21)),
            FieldType::Real => (DataType::AsciiReal, or(25)),
            FieldType::DateTime => (DataType::AsciiDateTimeYmdUtc, 24),
            FieldType::Date => (DataType::AsciiDateYmd, 10),
            FieldType::Time => (DataType::AsciiTime, 12),
        }
    }

    /// Default data type and width for a new column of a binary record.
    pub fn default_binary(field_type: FieldType, subtype: FieldSubType, width: usize) -> (DataType, usize) {
        let lsb = Endian::Lsb;
        match (field_type, subtype) {
            (FieldType::Integer, FieldSubType::Boolean) => (DataType::UnsignedByte, 1),
            (FieldType::Integer, FieldSubType::Int16) => (DataType::SignedInt { width: 2, endian: lsb }, 2),
            (FieldType::Integer, _) => (DataType::SignedInt { width: 4, endian: lsb }, 4),
            (FieldType::Integer64, _) => (DataType::SignedInt { width: 8, endian: lsb }, 8),
            (FieldType::Real, FieldSubType::Float32) => (DataType::Float { width: 4, endian: lsb }, 4),
            (FieldType::Real, _) => (DataType::Float { width: 8, endian: lsb }, 8),
            _ => DataType::default_text(field_type, subtype, width),
        }
    }

    /// Data type for a new delimited column.
    pub fn default_delimited(field_type: FieldType, subtype: FieldSubType) -> DataType {
        match field_type {
            FieldType::Integer if subtype == FieldSubType::Boolean => DataType::AsciiBoolean,
            FieldType::Integer | FieldType::Integer64 => DataType::AsciiInteger,
            FieldType::Real => DataType::AsciiReal,
            FieldType::String => DataType::Utf8String,
            FieldType::Date => DataType::AsciiDateYmd,
            FieldType::Time => DataType::AsciiTime,
            FieldType::DateTime => DataType::AsciiDateTimeYmdUtc,
        }
    }
}

fn split_endian(rest: &str) -> Option<(Endian, &str)> {
    if let Some(size) = rest.strip_prefix("LSB") {
        Some((Endian::Lsb, size))
    } else {
        rest.strip_prefix("MSB").map(|size| (Endian::Msb, size))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for DataType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DataType::parse(s))
    }
}
