//! Stateless conversion between textual values and a fixed-width binary
//! encoding.
//!
//! Each supported primitive type encodes to a `u64`, suitable for map values
//! populated from external textual input (files, network). Unparseable input
//! maps to the reserved [`NULL_VALUE`] sentinel rather than an error, keeping
//! the hot insert path allocation- and branch-light; the map layer treats the
//! sentinel as a normal value. Decoding the sentinel yields the empty string.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Reserved encoding for unparseable or missing input.
pub const NULL_VALUE: u64 = i64::MAX as u64;

const DATE_FORMAT: &str = "%Y-%m-%d";
const US_DATE_FORMAT: &str = "%m/%d/%y";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Supported primitive types, for use when parsing data whose type is only
/// known at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Unsigned integer.
    Uint,
    /// Signed integer, encoded by bit pattern.
    Int,
    /// 32-bit float, stored in the low half.
    Float,
    /// 64-bit float.
    Double,
    /// Boolean; accepts `F`/`f`/`FALSE`/`false`/`0` as false, anything else
    /// non-empty as true.
    Bool,
    /// Up to seven raw bytes, NUL-terminated within the fixed width.
    Chars,
    /// Date in `%Y-%m-%d` format, encoded as a UTC timestamp.
    Date,
    /// Date in `%m/%d/%y` format.
    UsDate,
    /// Date-time in `%Y-%m-%dT%H:%M:%S` format.
    DateTime,
    /// IPv4 dotted quad packed into the low 32 bits.
    IpAddress,
}

/// Associates labels and types with their position in a tuple of parsed
/// data.
pub type Schema = Vec<(String, DataType)>;

/// Encodes `raw` according to `ty`. Unparseable input yields [`NULL_VALUE`].
pub fn encode(ty: DataType, raw: &str) -> u64 {
    match ty {
        DataType::Uint => encode_uint(raw),
        DataType::Int => encode_int(raw),
        DataType::Float => encode_float(raw),
        DataType::Double => encode_double(raw),
        DataType::Bool => encode_bool(raw),
        DataType::Chars => encode_chars(raw),
        DataType::Date => encode_date(raw),
        DataType::UsDate => encode_us_date(raw),
        DataType::DateTime => encode_date_time(raw),
        DataType::IpAddress => encode_ip_address(raw),
    }
}

/// Decodes `value` back to its textual form. The null sentinel decodes to
/// the empty string for every type.
pub fn decode(ty: DataType, value: u64) -> String {
    match ty {
        DataType::Uint => decode_uint(value),
        DataType::Int => decode_int(value),
        DataType::Float => decode_float(value),
        DataType::Double => decode_double(value),
        DataType::Bool => decode_bool(value),
        DataType::Chars => decode_chars(value),
        DataType::Date => decode_timestamp(value, DATE_FORMAT),
        DataType::UsDate => decode_timestamp(value, US_DATE_FORMAT),
        DataType::DateTime => decode_timestamp(value, DATE_TIME_FORMAT),
        DataType::IpAddress => decode_ip_address(value),
    }
}

pub fn encode_uint(raw: &str) -> u64 {
    raw.parse::<u64>().unwrap_or(NULL_VALUE)
}

pub fn encode_int(raw: &str) -> u64 {
    match raw.parse::<i64>() {
        Ok(v) => v as u64,
        Err(_) => NULL_VALUE,
    }
}

pub fn encode_float(raw: &str) -> u64 {
    match raw.parse::<f32>() {
        Ok(v) => u64::from(v.to_bits()),
        Err(_) => NULL_VALUE,
    }
}

pub fn encode_double(raw: &str) -> u64 {
    raw.parse::<f64>().map(f64::to_bits).unwrap_or(NULL_VALUE)
}

pub fn encode_bool(raw: &str) -> u64 {
    if raw.is_empty() {
        return NULL_VALUE;
    }
    match raw {
        "F" | "f" | "FALSE" | "false" | "0" => 0,
        _ => 1,
    }
}

pub fn encode_chars(raw: &str) -> u64 {
    let mut bytes = [0u8; 8];
    let len = raw.len().min(7);
    bytes[..len].copy_from_slice(&raw.as_bytes()[..len]);
    u64::from_le_bytes(bytes)
}

pub fn encode_ip_address(raw: &str) -> u64 {
    let mut value: u64 = 0;
    let mut octets = 0;
    for part in raw.split('.') {
        let Ok(octet) = part.parse::<u64>() else {
            return NULL_VALUE;
        };
        if octet > 255 {
            return NULL_VALUE;
        }
        value = (value << 8) + octet;
        octets += 1;
    }
    if octets == 4 {
        value
    } else {
        NULL_VALUE
    }
}

pub fn encode_date(raw: &str) -> u64 {
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => midnight_timestamp(date),
        Err(_) => NULL_VALUE,
    }
}

pub fn encode_us_date(raw: &str) -> u64 {
    match NaiveDate::parse_from_str(raw, US_DATE_FORMAT) {
        Ok(date) => midnight_timestamp(date),
        Err(_) => NULL_VALUE,
    }
}

pub fn encode_date_time(raw: &str) -> u64 {
    match NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT) {
        Ok(dt) => dt.and_utc().timestamp() as u64,
        Err(_) => NULL_VALUE,
    }
}

fn midnight_timestamp(date: NaiveDate) -> u64 {
    match date.and_hms_opt(0, 0, 0) {
        Some(dt) => dt.and_utc().timestamp() as u64,
        None => NULL_VALUE,
    }
}

pub fn decode_uint(value: u64) -> String {
    if value == NULL_VALUE {
        return String::new();
    }
    value.to_string()
}

pub fn decode_int(value: u64) -> String {
    if value == NULL_VALUE {
        return String::new();
    }
    (value as i64).to_string()
}

pub fn decode_float(value: u64) -> String {
    if value == NULL_VALUE {
        return String::new();
    }
    f32::from_bits(value as u32).to_string()
}

pub fn decode_double(value: u64) -> String {
    if value == NULL_VALUE {
        return String::new();
    }
    f64::from_bits(value).to_string()
}

pub fn decode_bool(value: u64) -> String {
    if value == NULL_VALUE {
        return String::new();
    }
    value.to_string()
}

pub fn decode_chars(value: u64) -> String {
    let bytes = value.to_le_bytes();
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}

pub fn decode_ip_address(value: u64) -> String {
    if value == NULL_VALUE {
        return String::new();
    }
    format!(
        "{}.{}.{}.{}",
        (value >> 24) & 0xff,
        (value >> 16) & 0xff,
        (value >> 8) & 0xff,
        value & 0xff
    )
}

fn decode_timestamp(value: u64, format: &str) -> String {
    if value == NULL_VALUE {
        return String::new();
    }
    match DateTime::from_timestamp(value as i64, 0) {
        Some(dt) => dt.format(format).to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests;
