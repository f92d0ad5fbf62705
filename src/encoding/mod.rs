// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Field value encoding/decoding.
//!
//! This module provides the per-field codec for PDS4 tables:
//! - [`data_type`] - PDS4 `data_type` tags and their engine type mapping
//! - [`binary`] - Fixed-width binary numerics in either byte order
//! - [`text`] - ASCII/UTF-8 tokens, dates and printf-style field formats

pub mod binary;
pub mod data_type;
pub mod text;

pub use binary::{decode_binary, encode_binary};
pub use data_type::{DataType, Endian};
pub use text::{decode_text, encode_text, format_real_to_width, Decoded, FieldFormat};
