// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Binary numeric field codec.
//!
//! Values are read and written with `byteorder` in the byte order the data
//! type declares, independent of the host. Integers are clamped into the
//! range of the target type before writing.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::data_type::{DataType, Endian};
use crate::core::{FieldValue, Result, TableError};

/// Decode one binary field.
///
/// `bytes` must be exactly the width of `data_type`; anything else means
/// the record layout and the schema disagree.
pub fn decode_binary(data_type: &DataType, bytes: &[u8]) -> Result<FieldValue> {
    let width = data_type.binary_width().ok_or_else(|| {
        TableError::invariant_violation(format!("{data_type} is not a binary type"))
    })?;
    if bytes.len() != width {
        return Err(TableError::invariant_violation(format!(
            "{data_type} needs {width} bytes, got {}",
            bytes.len()
        )));
    }

    let value = match data_type {
        DataType::SignedByte => FieldValue::Integer(i32::from(bytes[0] as i8)),
        DataType::UnsignedByte => FieldValue::Integer(i32::from(bytes[0])),
        DataType::SignedInt { width, endian } => {
            let v = match endian {
                Endian::Lsb => read_signed::<LittleEndian>(bytes, *width),
                Endian::Msb => read_signed::<BigEndian>(bytes, *width),
            };
            if *width == 8 {
                FieldValue::Integer64(v)
            } else {
                FieldValue::Integer(v as i32)
            }
        }
        DataType::UnsignedInt { width, endian } => {
            let v = match endian {
                Endian::Lsb => read_unsigned::<LittleEndian>(bytes, *width),
                Endian::Msb => read_unsigned::<BigEndian>(bytes, *width),
            };
            match width {
                2 => FieldValue::Integer(v as i32),
                // Values above i64::MAX wrap: unsigned 64-bit is trusted to fit.
                _ => FieldValue::Integer64(v as i64),
            }
        }
        DataType::Float { width, endian } => {
            let v = match (width, endian) {
                (4, Endian::Lsb) => f64::from(LittleEndian::read_f32(bytes)),
                (4, Endian::Msb) => f64::from(BigEndian::read_f32(bytes)),
                (_, Endian::Lsb) => LittleEndian::read_f64(bytes),
                (_, Endian::Msb) => BigEndian::read_f64(bytes),
            };
            FieldValue::Real(v)
        }
        other => {
            return Err(TableError::invariant_violation(format!(
                "{other} is not a binary type"
            )))
        }
    };
    Ok(value)
}

fn read_signed<B: ByteOrder>(bytes: &[u8], width: u8) -> i64 {
    match width {
        2 => i64::from(B::read_i16(bytes)),
        4 => i64::from(B::read_i32(bytes)),
        _ => B::read_i64(bytes),
    }
}

fn read_unsigned<B: ByteOrder>(bytes: &[u8], width: u8) -> u64 {
    match width {
        2 => u64::from(B::read_u16(bytes)),
        4 => u64::from(B::read_u32(bytes)),
        _ => B::read_u64(bytes),
    }
}

/// Encode one binary field into `out`.
///
/// Returns `Ok(false)` when the value has no numeric interpretation (for
/// example unparseable text); `out` is then left untouched.
pub fn encode_binary(data_type: &DataType, value: &FieldValue, out: &mut [u8]) -> Result<bool> {
    let width = data_type.binary_width().ok_or_else(|| {
        TableError::invariant_violation(format!("{data_type} is not a binary type"))
    })?;
    if out.len() != width {
        return Err(TableError::invariant_violation(format!(
            "{data_type} needs {width} bytes, slot has {}",
            out.len()
        )));
    }

    match data_type {
        DataType::Float { width, endian } => {
            let Some(v) = value.as_f64() else {
                return Ok(false);
            };
            match (width, endian) {
                (4, Endian::Lsb) => LittleEndian::write_f32(out, v as f32),
                (4, Endian::Msb) => BigEndian::write_f32(out, v as f32),
                (_, Endian::Lsb) => LittleEndian::write_f64(out, v),
                (_, Endian::Msb) => BigEndian::write_f64(out, v),
            }
        }
        DataType::SignedByte => {
            let Some(v) = value.as_i64() else {
                return Ok(false);
            };
            out[0] = v.clamp(i64::from(i8::MIN), i64::from(i8::MAX)) as i8 as u8;
        }
        DataType::UnsignedByte => {
            let Some(v) = value.as_i64() else {
                return Ok(false);
            };
            out[0] = v.clamp(0, i64::from(u8::MAX)) as u8;
        }
        DataType::SignedInt { width, endian } => {
            let Some(v) = value.as_i64() else {
                return Ok(false);
            };
            match endian {
                Endian::Lsb => write_signed::<LittleEndian>(out, *width, v),
                Endian::Msb => write_signed::<BigEndian>(out, *width, v),
            }
        }
        DataType::UnsignedInt { width, endian } => {
            let Some(v) = value.as_i64() else {
                return Ok(false);
            };
            match endian {
                Endian::Lsb => write_unsigned::<LittleEndian>(out, *width, v),
                Endian::Msb => write_unsigned::<BigEndian>(out, *width, v),
            }
        }
        other => {
            return Err(TableError::invariant_violation(format!(
                "{other} is not a binary type"
            )))
        }
    }
    Ok(true)
}

fn write_signed<B: ByteOrder>(out: &mut [u8], width: u8, v: i64) {
    match width {
        2 => B::write_i16(out, v.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16),
        4 => B::write_i32(out, v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32),
        _ => B::write_i64(out, v),
    }
}

fn write_unsigned<B: ByteOrder>(out: &mut [u8], width: u8, v: i64) {
    match width {
        2 => B::write_u16(out, v.clamp(0, i64::from(u16::MAX)) as u16),
        4 => B::write_u32(out, v.clamp(0, i64::from(u32::MAX)) as u32),
        _ => B::write_u64(out, v.max(0) as u64),
    }
}
