//! Byte-level helpers shared by the record framer and header codecs.
//!
//! XPORT uses IBM mainframe byte order (big-endian) for every multi-byte
//! integer, and blank-padded (`0x20`) fixed-width ASCII for every string
//! field. This module centralizes both conventions plus the 16-byte
//! `ddMMMyy:hh:mm:ss` timestamp format so the header codecs never hand-roll
//! byte-order or padding logic themselves.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use chrono::NaiveDateTime;
use std::io::Cursor;

use crate::error::{Error, Result};

/// ASCII space, the universal pad byte for XPORT string fields.
pub const PAD: u8 = 0x20;

/// Packs a `u16` as two big-endian bytes.
#[must_use]
pub fn pack_u16(value: u16) -> [u8; 2] {
    let mut buf = [0u8; 2];
    Cursor::new(&mut buf[..])
        .write_u16::<BigEndian>(value)
        .expect("fixed 2-byte buffer");
    buf
}

/// Unpacks two big-endian bytes as a `u16`.
pub fn unpack_u16(bytes: [u8; 2]) -> u16 {
    Cursor::new(bytes)
        .read_u16::<BigEndian>()
        .expect("fixed 2-byte buffer")
}

/// Packs a `u32` as four big-endian bytes.
#[must_use]
pub fn pack_u32(value: u32) -> [u8; 4] {
    let mut buf = [0u8; 4];
    Cursor::new(&mut buf[..])
        .write_u32::<BigEndian>(value)
        .expect("fixed 4-byte buffer");
    buf
}

/// Unpacks four big-endian bytes as a `u32`.
pub fn unpack_u32(bytes: [u8; 4]) -> u32 {
    Cursor::new(bytes)
        .read_u32::<BigEndian>()
        .expect("fixed 4-byte buffer")
}

/// Encodes `s` as 7-bit ASCII, right-padded with [`PAD`] to exactly `width`
/// bytes.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `s` is not ASCII or is longer than
/// `width` bytes.
pub fn encode_ascii_padded(s: &str, width: usize) -> Result<Vec<u8>> {
    if !s.is_ascii() {
        return Err(Error::invalid_argument(format!(
            "value {s:?} must be ASCII"
        )));
    }
    if s.len() > width {
        return Err(Error::invalid_argument(format!(
            "value {s:?} exceeds the {width}-byte field width"
        )));
    }
    let mut buf = Vec::with_capacity(width);
    buf.extend_from_slice(s.as_bytes());
    buf.resize(width, PAD);
    Ok(buf)
}

/// Decodes a blank-padded ASCII field, stripping trailing [`PAD`] bytes.
///
/// Non-ASCII bytes are decoded lossily; the reader operates in tolerant
/// ([`crate::Strictness::Basic`]) mode and must not fail on wire content
/// written by another, possibly non-conforming, producer.
#[must_use]
pub fn decode_ascii_trimmed(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != PAD)
        .map_or(0, |i| i + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Decodes a blank-padded ASCII field, also stripping trailing NUL (`0x00`)
/// bytes.
///
/// The operating-system field in real-headers is written NUL-padded by SAS
/// (a documented idiosyncrasy) rather than blank-padded; this function
/// strips both.
#[must_use]
pub fn decode_ascii_trimmed_nul(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != PAD && b != 0)
        .map_or(0, |i| i + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Encodes `s` as 7-bit ASCII, right-padded with NUL (`0x00`) to exactly
/// `width` bytes. Used only for the real-header operating-system field.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `s` is not ASCII or is longer than
/// `width` bytes.
pub fn encode_ascii_padded_nul(s: &str, width: usize) -> Result<Vec<u8>> {
    if !s.is_ascii() {
        return Err(Error::invalid_argument(format!(
            "value {s:?} must be ASCII"
        )));
    }
    if s.len() > width {
        return Err(Error::invalid_argument(format!(
            "value {s:?} exceeds the {width}-byte field width"
        )));
    }
    let mut buf = Vec::with_capacity(width);
    buf.extend_from_slice(s.as_bytes());
    buf.resize(width, 0);
    Ok(buf)
}

/// A function that maps a two-digit year (`0..=99`) to a full calendar
/// year.
///
/// Defaults to the documented SAS pivot: `<60 -> 2000 + yy`,
/// `>=60 -> 1900 + yy`. Callers that need a different pivot (the pivot year
/// itself is not standardized) may supply their own function when
/// constructing a reader.
pub type YearPivot = fn(u8) -> i32;

/// The default two-digit-year pivot: `<60 -> 2000+yy`, `>=60 -> 1900+yy`.
#[must_use]
pub fn default_year_pivot(yy: u8) -> i32 {
    if yy < 60 { 2000 + i32::from(yy) } else { 1900 + i32::from(yy) }
}

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Formats a naive date-time into the fixed 16-byte `ddMMMyy:hh:mm:ss`
/// XPORT timestamp, e.g. `15JUN24:14:30:45`.
///
/// The two-digit year is taken modulo 100 from the full year; months use
/// uppercase English abbreviations independent of locale.
#[must_use]
pub fn format_sas_timestamp(dt: NaiveDateTime) -> String {
    use chrono::Datelike;
    use chrono::Timelike;

    let day = dt.day();
    let month = MONTHS[(dt.month0()) as usize];
    let yy = (dt.year().rem_euclid(100)) as u32;
    format!(
        "{day:02}{month}{yy:02}:{:02}:{:02}:{:02}",
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

/// Parses a fixed 16-byte `ddMMMyy:hh:mm:ss` XPORT timestamp.
///
/// Parsing requires this exact pattern; any deviation (wrong separators,
/// a month outside the 12 recognized abbreviations, non-digit numerics) is
/// rejected with [`Error::Malformed`]. `pivot` maps the two-digit year to a
/// full calendar year.
///
/// # Errors
///
/// Returns [`Error::Malformed`] if the 16-byte field does not match the
/// pattern exactly.
pub fn parse_sas_timestamp(raw: &str, pivot: YearPivot) -> Result<NaiveDateTime> {
    let bytes = raw.as_bytes();
    if bytes.len() != 16 {
        return Err(Error::malformed(format!(
            "date field must be 16 bytes, got {}",
            bytes.len()
        )));
    }
    let fail = || Error::malformed(format!("malformed SAS date/time: {raw:?}"));
    if !raw.is_ascii() {
        // A multi-byte UTF-8 char could straddle one of the fixed byte
        // offsets below and panic on a non-char-boundary slice.
        return Err(fail());
    }

    let dd: u32 = raw[0..2].parse().map_err(|_| fail())?;
    let mon = raw[2..5].to_ascii_uppercase();
    let month = MONTHS
        .iter()
        .position(|&m| m == mon)
        .ok_or_else(fail)?
        + 1;
    let yy: u8 = raw[5..7].parse().map_err(|_| fail())?;
    if &raw[7..8] != ":" || &raw[10..11] != ":" || &raw[13..14] != ":" {
        return Err(fail());
    }
    let hh: u32 = raw[8..10].parse().map_err(|_| fail())?;
    let mm: u32 = raw[11..13].parse().map_err(|_| fail())?;
    let ss: u32 = raw[14..16].parse().map_err(|_| fail())?;

    let year = pivot(yy);
    let date = chrono::NaiveDate::from_ymd_opt(year, month as u32, dd).ok_or_else(fail)?;
    let time = chrono::NaiveTime::from_hms_opt(hh, mm, ss).ok_or_else(fail)?;
    Ok(NaiveDateTime::new(date, time))
}
