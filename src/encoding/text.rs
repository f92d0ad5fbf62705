// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! ASCII and UTF-8 text field codec.
//!
//! Tokens are trimmed before decoding and an empty token is a null value.
//! Encoding produces the token only: fitting it into a fixed-width slot
//! (alignment, truncation, dropping) is the caller's business.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::data_type::DataType;
use crate::core::value::{parse_boolean_text, parse_date, parse_date_time, parse_integer_text, parse_time};
use crate::core::FieldValue;

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
const DATE_TIME_DOY_FORMAT: &str = "%Y-%jT%H:%M:%S%.3fZ";
const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_DOY_FORMAT: &str = "%Y-%j";
const TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Outcome of decoding one text token.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Decoded value (possibly null for an empty token)
    Value(FieldValue),
    /// Token is not valid for the data type
    Invalid,
}

/// Decode one text token.
///
/// The token is trimmed; an empty token decodes to null. Numeric and
/// temporal tokens that do not parse are reported as [`Decoded::Invalid`].
pub fn decode_text(data_type: &DataType, token: &str) -> Decoded {
    let token = token.trim();
    if token.is_empty() {
        return Decoded::Value(FieldValue::Null);
    }
    let value = match data_type {
        DataType::AsciiBoolean => Some(FieldValue::Integer(i32::from(parse_boolean_text(token)))),
        DataType::AsciiInteger | DataType::AsciiNonNegativeInteger => {
            parse_integer_text(token).map(FieldValue::Integer64)
        }
        DataType::AsciiReal => token.parse::<f64>().ok().map(FieldValue::Real),
        DataType::AsciiDateYmd => parse_date(token).map(FieldValue::Date),
        DataType::AsciiDateDoy => NaiveDate::parse_from_str(token, DATE_DOY_FORMAT)
            .ok()
            .or_else(|| parse_date(token))
            .map(FieldValue::Date),
        DataType::AsciiDateTimeYmd | DataType::AsciiDateTimeYmdUtc => {
            parse_date_time(token).map(FieldValue::DateTime)
        }
        DataType::AsciiDateTimeDoy | DataType::AsciiDateTimeDoyUtc => parse_doy_date_time(token)
            .or_else(|| parse_date_time(token))
            .map(FieldValue::DateTime),
        DataType::AsciiTime => parse_time(token).map(FieldValue::Time),
        _ => Some(FieldValue::String(token.to_string())),
    };
    value.map_or(Decoded::Invalid, Decoded::Value)
}

fn parse_doy_date_time(token: &str) -> Option<NaiveDateTime> {
    let token = token.strip_suffix('Z').unwrap_or(token);
    let (date, time) = token.split_once('T').unwrap_or((token, ""));
    let date = NaiveDate::parse_from_str(date, DATE_DOY_FORMAT).ok()?;
    let time = if time.is_empty() {
        NaiveTime::MIN
    } else {
        parse_time(time)?
    };
    Some(date.and_time(time))
}

/// Encode one value as a text token.
///
/// `width` is the slot width of a fixed-width field: `ASCII_Real` values
/// pick the largest precision that fits it. `format` is the declared
/// `field_format`, honoured for numeric and string types. Returns `None`
/// for null values and values with no representation in `data_type`.
pub fn encode_text(
    data_type: &DataType,
    value: &FieldValue,
    width: Option<usize>,
    format: Option<&FieldFormat>,
) -> Option<String> {
    if value.is_null() {
        return None;
    }
    match data_type {
        DataType::AsciiBoolean => value.as_bool().map(|b| if b { "1" } else { "0" }.to_string()),
        DataType::AsciiInteger | DataType::AsciiNonNegativeInteger => {
            let v = value.as_i64()?;
            Some(match format {
                Some(f) => f.format_integer(v),
                None => v.to_string(),
            })
        }
        DataType::AsciiReal => {
            let v = value.as_f64()?;
            Some(match (format, width) {
                (Some(f), _) => f.format_real(v),
                (None, Some(w)) => format_real_to_width(v, w),
                (None, None) => v.to_string(),
            })
        }
        DataType::AsciiDateYmd => date_of(value).map(|d| d.format(DATE_FORMAT).to_string()),
        DataType::AsciiDateDoy => date_of(value).map(|d| d.format(DATE_DOY_FORMAT).to_string()),
        DataType::AsciiDateTimeYmd | DataType::AsciiDateTimeYmdUtc => {
            date_time_of(value).map(|dt| dt.format(DATE_TIME_FORMAT).to_string())
        }
        DataType::AsciiDateTimeDoy | DataType::AsciiDateTimeDoyUtc => {
            date_time_of(value).map(|dt| dt.format(DATE_TIME_DOY_FORMAT).to_string())
        }
        DataType::AsciiTime => time_of(value).map(|t| t.format(TIME_FORMAT).to_string()),
        _ => {
            let text = value.to_text()?;
            Some(match format {
                Some(f) => f.format_string(&text),
                None => text,
            })
        }
    }
}

fn date_of(value: &FieldValue) -> Option<NaiveDate> {
    match value {
        FieldValue::Date(d) => Some(*d),
        FieldValue::DateTime(dt) => Some(dt.date()),
        FieldValue::String(s) => parse_date(s),
        _ => None,
    }
}

fn date_time_of(value: &FieldValue) -> Option<NaiveDateTime> {
    match value {
        FieldValue::DateTime(dt) => Some(*dt),
        FieldValue::Date(d) => Some(d.and_time(NaiveTime::MIN)),
        FieldValue::String(s) => parse_date_time(s),
        _ => None,
    }
}

fn time_of(value: &FieldValue) -> Option<NaiveTime> {
    match value {
        FieldValue::Time(t) => Some(*t),
        FieldValue::DateTime(dt) => Some(dt.time()),
        FieldValue::String(s) => parse_time(s),
        _ => None,
    }
}

/// Format a real so that it fits in `width` characters.
///
/// The shortest round-trip representation is used when it fits, then fixed
/// notation, then scientific notation, each with the largest precision that
/// fits. The result is still wider than `width` only when not even one
/// significant digit fits.
pub fn format_real_to_width(v: f64, width: usize) -> String {
    let plain = v.to_string();
    if plain.len() <= width {
        return plain;
    }
    if v.is_finite() && (v == 0.0 || v.abs() >= 1e-4) {
        for decimals in (0..=width.min(17)).rev() {
            let fixed = format!("{v:.decimals$}");
            if fixed.len() <= width {
                return fixed;
            }
        }
    }
    let mut precision = width.saturating_sub(2).min(17);
    loop {
        let sci = format!("{v:.precision$e}");
        if sci.len() <= width || precision == 0 {
            return sci;
        }
        precision -= 1;
    }
}

/// A printf-style `field_format` such as `%12.5f`, `%-10s` or `%8d`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFormat {
    raw: String,
    left: bool,
    zero_pad: bool,
    plus: bool,
    width: usize,
    precision: Option<usize>,
    conversion: char,
}

fn format_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^%([-+ 0#]*)(\d+)?(?:\.(\d+))?([diuoxXfFeEgGs])$").ok())
        .as_ref()
}

impl FieldFormat {
    /// Parse a format, `None` when it is not a single printf conversion.
    pub fn parse(text: &str) -> Option<FieldFormat> {
        let raw = text.trim();
        let caps = format_regex()?.captures(raw)?;
        let flags = caps.get(1).map_or("", |m| m.as_str());
        Some(FieldFormat {
            raw: raw.to_string(),
            left: flags.contains('-'),
            zero_pad: flags.contains('0'),
            plus: flags.contains('+'),
            width: caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0),
            precision: caps.get(3).and_then(|m| m.as_str().parse().ok()),
            conversion: caps.get(4).and_then(|m| m.as_str().chars().next()).unwrap_or('s'),
        })
    }

    /// The format as written in the label.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Declared minimum width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Format an integer.
    pub fn format_integer(&self, v: i64) -> String {
        match self.conversion {
            'x' => self.pad(format!("{v:x}"), true),
            'X' => self.pad(format!("{v:X}"), true),
            'o' => self.pad(format!("{v:o}"), true),
            'f' | 'F' | 'e' | 'E' | 'g' | 'G' => self.format_real(v as f64),
            's' => self.format_string(&v.to_string()),
            _ => self.pad(self.signed(v < 0, v.unsigned_abs().to_string()), true),
        }
    }

    /// Format a real.
    pub fn format_real(&self, v: f64) -> String {
        let p = self.precision.unwrap_or(6);
        let body = match self.conversion {
            'f' | 'F' => format!("{:.p$}", v.abs()),
            'e' => c_exponent(&format!("{:.p$e}", v.abs())),
            'E' => c_exponent(&format!("{:.p$e}", v.abs())).to_uppercase(),
            'g' | 'G' => {
                let g = general(v.abs(), p);
                if self.conversion == 'G' {
                    g.to_uppercase()
                } else {
                    g
                }
            }
            'd' | 'i' | 'u' => format!("{:.0}", v.abs().trunc()),
            's' => return self.format_string(&v.to_string()),
            _ => return self.format_integer(v as i64),
        };
        self.pad(self.signed(v.is_sign_negative() && v != 0.0, body), true)
    }

    /// Format a string (precision truncates).
    pub fn format_string(&self, s: &str) -> String {
        let s: String = match self.precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.to_string(),
        };
        self.pad(s, false)
    }

    fn signed(&self, negative: bool, body: String) -> String {
        if negative {
            format!("-{body}")
        } else if self.plus {
            format!("+{body}")
        } else {
            body
        }
    }

    fn pad(&self, s: String, numeric: bool) -> String {
        let len = s.chars().count();
        if len >= self.width {
            return s;
        }
        let fill = self.width - len;
        if self.left {
            format!("{s}{}", " ".repeat(fill))
        } else if numeric && self.zero_pad {
            let (sign, digits) = match s.chars().next() {
                Some(c @ ('-' | '+')) => (c.to_string(), &s[1..]),
                _ => (String::new(), s.as_str()),
            };
            format!("{sign}{}{digits}", "0".repeat(fill))
        } else {
            format!("{}{s}", " ".repeat(fill))
        }
    }
}

/// Rewrite Rust's `1.5e3` exponent into C's `1.5e+03`.
fn c_exponent(s: &str) -> String {
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s.to_string(),
    }
}

/// `%g` conversion of a non-negative value.
fn general(v: f64, precision: usize) -> String {
    let p = precision.max(1);
    if v == 0.0 {
        return "0".to_string();
    }
    let exp = v.log10().floor() as i32;
    let text = if exp < -4 || exp >= p as i32 {
        c_exponent(&format!("{:.*e}", p - 1, v))
    } else {
        let decimals = (p as i32 - 1 - exp).max(0) as usize;
        format!("{v:.decimals$}")
    };
    strip_trailing_zeros(&text)
}

fn strip_trailing_zeros(s: &str) -> String {
    let (mantissa, exp) = match s.find('e') {
        Some(i) => (&s[..i], &s[i..]),
        None => (s, ""),
    };
    if !mantissa.contains('.') {
        return s.to_string();
    }
    let trimmed = mantissa.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}{exp}")
}
