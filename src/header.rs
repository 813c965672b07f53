//! Typed record parsers/serializers for the TS-140 headers: library/dataset
//! real-headers, second-headers, and NAMESTR header/records.

use crate::bytes::{
    PAD, decode_ascii_trimmed, decode_ascii_trimmed_nul, encode_ascii_padded,
    encode_ascii_padded_nul, format_sas_timestamp, parse_sas_timestamp,
};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::record::RECORD_LEN;
use crate::variable::{Justification, VarType};
use chrono::NaiveDateTime;

/// `"SASLIB  "`: the third 8-byte field of a library real-header.
pub const SYMBOL_SASLIB: &str = "SASLIB";
/// `"SASDATA "`: the third 8-byte field of a dataset real-header.
pub const SYMBOL_SASDATA: &str = "SASDATA";

/// The first two 8-byte fields of every real-header, fixed: `"SAS"` twice.
const SYMBOL_SAS: &str = "SAS";

/// The byte offset (within an 80-byte real-header) at which the 24-byte
/// "blanks" region starts.
const REAL_HEADER_BLANKS_OFFSET: usize = 40;
const REAL_HEADER_BLANKS_LEN: usize = 24;

/// Builds a real-header record (bytes: `symbol1` `symbol2` `symbol3`
/// `sasver` `os` 24-blanks `created-date`).
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `sasver` or `os` is not ASCII or
/// exceeds 8 bytes.
pub fn encode_real_header(symbol3: &str, sasver: &str, os: &str, created: NaiveDateTime) -> Result<[u8; RECORD_LEN]> {
    let mut rec = [PAD; RECORD_LEN];
    rec[0..8].copy_from_slice(&encode_ascii_padded(SYMBOL_SAS, 8)?);
    rec[8..16].copy_from_slice(&encode_ascii_padded(SYMBOL_SAS, 8)?);
    rec[16..24].copy_from_slice(&encode_ascii_padded(symbol3, 8)?);
    rec[24..32].copy_from_slice(&encode_ascii_padded(sasver, 8)?);
    rec[32..40].copy_from_slice(&encode_ascii_padded_nul(os, 8)?);
    // bytes 40..64 stay PAD (the blanks region).
    rec[64..80].copy_from_slice(format_sas_timestamp(created).as_bytes());
    Ok(rec)
}

/// A decoded real-header: source OS, SAS version, and creation timestamp.
#[derive(Debug, Clone)]
pub struct RealHeader {
    /// The source operating system (NUL-trimmed).
    pub os: String,
    /// The source SAS version.
    pub sas_version: String,
    /// The creation timestamp.
    pub created: NaiveDateTime,
}

/// Parses a real-header record.
///
/// Tolerates a non-blank first byte of the 24-byte "blanks" region (bytes
/// 40..64), a known off-by-one bug in the `%loc2xpt` SAS macro that leaves
/// a stray NUL there.
///
/// # Errors
///
/// Returns [`Error::Malformed`] if the blanks region (past the tolerated
/// first byte) is not all-blank, or if the embedded date is malformed.
pub fn decode_real_header(
    record: &[u8; RECORD_LEN],
    pivot: crate::bytes::YearPivot,
) -> Result<RealHeader> {
    let os = decode_ascii_trimmed_nul(&record[32..40]);
    let sas_version = decode_ascii_trimmed(&record[24..32]);

    let blanks = &record[REAL_HEADER_BLANKS_OFFSET..REAL_HEADER_BLANKS_OFFSET + REAL_HEADER_BLANKS_LEN];
    if !blanks[1..].iter().all(|&b| b == PAD) {
        return Err(Error::malformed(
            "real-header blanks region contains unexpected non-blank bytes",
        ));
    }

    let date_str = std::str::from_utf8(&record[64..80])
        .map_err(|_| Error::malformed("real-header date field is not valid ASCII"))?;
    let created = parse_sas_timestamp(date_str, pivot)?;

    Ok(RealHeader {
        os,
        sas_version,
        created,
    })
}

/// Builds the member-level real-header: like [`encode_real_header`], but the
/// second 8-byte field carries the dataset name instead of the literal
/// `"SAS"` symbol.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `name`, `sasver`, or `os` is not
/// ASCII or exceeds its field width.
pub fn encode_member_real_header(
    name: &str,
    sasver: &str,
    os: &str,
    created: NaiveDateTime,
) -> Result<[u8; RECORD_LEN]> {
    let mut rec = [PAD; RECORD_LEN];
    rec[8..16].copy_from_slice(&encode_ascii_padded(name, 8)?);
    rec[24..32].copy_from_slice(&encode_ascii_padded(sasver, 8)?);
    rec[32..40].copy_from_slice(&encode_ascii_padded_nul(os, 8)?);
    // bytes 0..8, 16..24 and 40..64 stay PAD.
    rec[64..80].copy_from_slice(format_sas_timestamp(created).as_bytes());
    Ok(rec)
}

/// A decoded member-level real-header: dataset name, source OS, SAS
/// version, and creation timestamp.
#[derive(Debug, Clone)]
pub struct MemberRealHeader {
    /// The dataset name.
    pub name: String,
    /// The source operating system (NUL-trimmed).
    pub os: String,
    /// The source SAS version.
    pub sas_version: String,
    /// The creation timestamp.
    pub created: NaiveDateTime,
}

/// Parses a member-level real-header record.
///
/// Applies the same `%loc2xpt` off-by-one tolerance as
/// [`decode_real_header`].
///
/// # Errors
///
/// Returns [`Error::Malformed`] if the blanks region (past the tolerated
/// first byte) is not all-blank, or if the embedded date is malformed.
pub fn decode_member_real_header(
    record: &[u8; RECORD_LEN],
    pivot: crate::bytes::YearPivot,
) -> Result<MemberRealHeader> {
    let name = decode_ascii_trimmed(&record[8..16]);
    let sas_version = decode_ascii_trimmed(&record[24..32]);
    let os = decode_ascii_trimmed_nul(&record[32..40]);

    let blanks = &record[REAL_HEADER_BLANKS_OFFSET..REAL_HEADER_BLANKS_OFFSET + REAL_HEADER_BLANKS_LEN];
    if !blanks[1..].iter().all(|&b| b == PAD) {
        return Err(Error::malformed(
            "member real-header blanks region contains unexpected non-blank bytes",
        ));
    }

    let date_str = std::str::from_utf8(&record[64..80])
        .map_err(|_| Error::malformed("member real-header date field is not valid ASCII"))?;
    let created = parse_sas_timestamp(date_str, pivot)?;

    Ok(MemberRealHeader {
        name,
        os,
        sas_version,
        created,
    })
}

/// Builds a second-header record (bytes: 16-byte modified date, 16 blanks,
/// 40-byte label, 8-byte type).
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `label` or `dataset_type` is not
/// ASCII or exceeds its field width.
pub fn encode_second_header(
    modified: NaiveDateTime,
    label: &str,
    dataset_type: &str,
) -> Result<[u8; RECORD_LEN]> {
    let mut rec = [PAD; RECORD_LEN];
    rec[0..16].copy_from_slice(format_sas_timestamp(modified).as_bytes());
    // bytes 16..32 stay PAD (16 blanks).
    rec[32..72].copy_from_slice(&encode_ascii_padded(label, 40)?);
    rec[72..80].copy_from_slice(&encode_ascii_padded(dataset_type, 8)?);
    Ok(rec)
}

/// A decoded second-header: modified timestamp, dataset label, dataset
/// type.
#[derive(Debug, Clone)]
pub struct SecondHeader {
    /// The last-modified timestamp.
    pub modified: NaiveDateTime,
    /// The dataset label.
    pub label: String,
    /// The dataset type.
    pub dataset_type: String,
}

/// Parses a second-header record.
///
/// # Errors
///
/// Returns [`Error::Malformed`] if the embedded date is malformed.
pub fn decode_second_header(
    record: &[u8; RECORD_LEN],
    pivot: crate::bytes::YearPivot,
) -> Result<SecondHeader> {
    let date_str = std::str::from_utf8(&record[0..16])
        .map_err(|_| Error::malformed("second-header date field is not valid ASCII"))?;
    let modified = parse_sas_timestamp(date_str, pivot)?;
    let label = decode_ascii_trimmed(&record[32..72]);
    let dataset_type = decode_ascii_trimmed(&record[72..80]);
    Ok(SecondHeader {
        modified,
        label,
        dataset_type,
    })
}

const NAMESTR_HEADER_COUNT_OFFSET: usize = 54;

/// Builds a NAMESTR header record, embedding `count` as four ASCII digits
/// at bytes 54..58.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `count` exceeds 9999.
pub fn encode_namestr_header(count: u16) -> Result<[u8; RECORD_LEN]> {
    if count > 9999 {
        return Err(Error::invalid_argument(
            "a dataset may declare at most 9999 variables",
        ));
    }
    let mut rec = [PAD; RECORD_LEN];
    rec[0..54].copy_from_slice(crate::record::NAMESTR_HEADER_PREFIX);
    let digits = format!("{count:04}");
    rec[NAMESTR_HEADER_COUNT_OFFSET..NAMESTR_HEADER_COUNT_OFFSET + 4]
        .copy_from_slice(digits.as_bytes());
    Ok(rec)
}

/// Parses the variable count out of a NAMESTR header record.
///
/// # Errors
///
/// Returns [`Error::Malformed`] if bytes 54..58 are not four ASCII digits.
pub fn decode_namestr_header(record: &[u8; RECORD_LEN]) -> Result<u16> {
    let digits = std::str::from_utf8(&record[NAMESTR_HEADER_COUNT_OFFSET..NAMESTR_HEADER_COUNT_OFFSET + 4])
        .map_err(|_| Error::malformed("NAMESTR header variable count is not ASCII"))?;
    digits
        .parse::<u16>()
        .map_err(|_| Error::malformed(format!("NAMESTR header variable count {digits:?} is not numeric")))
}

/// A decoded NAMESTR record (140 bytes), prior to becoming a
/// [`crate::Variable`].
#[derive(Debug, Clone)]
pub struct RawNamestr {
    /// NUMERIC or CHARACTER.
    pub var_type: VarType,
    /// Variable length in bytes.
    pub length: u16,
    /// 1-based column order.
    pub number: u32,
    /// Variable name.
    pub name: String,
    /// Variable label.
    pub label: String,
    /// Output format.
    pub output_format: Format,
    /// Input format.
    pub input_format: Format,
    /// Raw `nfj` justification code.
    pub justification: Justification,
    /// Byte offset within an observation.
    pub offset_in_observation: i32,
}

/// Packs a variable's metadata into a 140-byte NAMESTR record.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if any ASCII field exceeds its width.
pub fn encode_namestr(
    var_type: VarType,
    length: u16,
    number: u32,
    name: &str,
    label: &str,
    output_format: &Format,
    input_format: &Format,
    justification: Justification,
    offset_in_observation: i32,
) -> Result<[u8; crate::record::NAMESTR_LEN]> {
    let mut rec = [0u8; crate::record::NAMESTR_LEN];

    let ntype: i16 = match var_type {
        VarType::Numeric => 1,
        VarType::Character => 2,
    };
    rec[0..2].copy_from_slice(&ntype.to_be_bytes());
    // nhfun stays zero.
    rec[4..6].copy_from_slice(&(length as i16).to_be_bytes());
    rec[6..8].copy_from_slice(&(number as i16).to_be_bytes());
    rec[8..16].copy_from_slice(&encode_ascii_padded(name, 8)?);
    rec[16..56].copy_from_slice(&encode_ascii_padded(label, 40)?);
    rec[56..64].copy_from_slice(&encode_ascii_padded(output_format.name(), 8)?);
    rec[64..66].copy_from_slice(&(output_format.width() as i16).to_be_bytes());
    rec[66..68].copy_from_slice(&(output_format.digits() as i16).to_be_bytes());
    rec[68..70].copy_from_slice(&justification.to_nfj().to_be_bytes());
    // bytes 70..72 stay zero (pad).
    rec[72..80].copy_from_slice(&encode_ascii_padded(input_format.name(), 8)?);
    rec[80..82].copy_from_slice(&(input_format.width() as i16).to_be_bytes());
    rec[82..84].copy_from_slice(&(input_format.digits() as i16).to_be_bytes());
    rec[84..88].copy_from_slice(&offset_in_observation.to_be_bytes());
    // bytes 88..140 (reserved) stay zero.
    Ok(rec)
}

/// Unpacks a 140-byte NAMESTR record.
///
/// # Errors
///
/// Returns [`Error::Malformed`] if `ntype` is neither 1 nor 2, or if
/// `npos` is negative.
pub fn decode_namestr(bytes: &[u8; crate::record::NAMESTR_LEN]) -> Result<RawNamestr> {
    let ntype = i16::from_be_bytes([bytes[0], bytes[1]]);
    let var_type = match ntype {
        1 => VarType::Numeric,
        2 => VarType::Character,
        other => {
            return Err(Error::malformed(format!(
                "NAMESTR ntype must be 1 (NUMERIC) or 2 (CHARACTER), got {other}"
            )));
        }
    };
    let length = i16::from_be_bytes([bytes[4], bytes[5]]).max(0) as u16;
    let number = i16::from_be_bytes([bytes[6], bytes[7]]).max(0) as u32;
    let name = decode_ascii_trimmed(&bytes[8..16]);
    let label = decode_ascii_trimmed(&bytes[16..56]);
    let outfmt_name = decode_ascii_trimmed(&bytes[56..64]);
    let outfmt_width = i16::from_be_bytes([bytes[64], bytes[65]]).max(0) as u16;
    let outfmt_digits = i16::from_be_bytes([bytes[66], bytes[67]]).max(0) as u16;
    let nfj = i16::from_be_bytes([bytes[68], bytes[69]]);
    let infmt_name = decode_ascii_trimmed(&bytes[72..80]);
    let infmt_width = i16::from_be_bytes([bytes[80], bytes[81]]).max(0) as u16;
    let infmt_digits = i16::from_be_bytes([bytes[82], bytes[83]]).max(0) as u16;
    let npos = i32::from_be_bytes([bytes[84], bytes[85], bytes[86], bytes[87]]);
    if npos < 0 {
        return Err(Error::malformed("NAMESTR npos must be non-negative"));
    }

    Ok(RawNamestr {
        var_type,
        length,
        number,
        name,
        label,
        output_format: Format::new(outfmt_name, outfmt_width, outfmt_digits)?,
        input_format: Format::new(infmt_name, infmt_width, infmt_digits)?,
        justification: Justification::from_nfj(nfj),
        offset_in_observation: npos,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::default_year_pivot;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(14, 30, 45)
            .unwrap()
    }

    #[test]
    fn real_header_roundtrip() {
        let rec = encode_real_header(SYMBOL_SASDATA, "9.4", "linux", now()).unwrap();
        let parsed = decode_real_header(&rec, default_year_pivot).unwrap();
        assert_eq!(parsed.os, "linux");
        assert_eq!(parsed.sas_version, "9.4");
        assert_eq!(parsed.created, now());
    }

    #[test]
    fn real_header_tolerates_loc2xpt_off_by_one() {
        let mut rec = encode_real_header(SYMBOL_SASDATA, "9.4", "linux", now()).unwrap();
        rec[40] = 0; // stray NUL from the OS field bleeding over
        assert!(decode_real_header(&rec, default_year_pivot).is_ok());
    }

    #[test]
    fn real_header_rejects_other_nonblank_bytes() {
        let mut rec = encode_real_header(SYMBOL_SASDATA, "9.4", "linux", now()).unwrap();
        rec[41] = b'X';
        assert!(decode_real_header(&rec, default_year_pivot).is_err());
    }

    #[test]
    fn member_real_header_roundtrip() {
        let rec = encode_member_real_header("TEMP", "9.4", "linux", now()).unwrap();
        let parsed = decode_member_real_header(&rec, default_year_pivot).unwrap();
        assert_eq!(parsed.name, "TEMP");
        assert_eq!(parsed.os, "linux");
        assert_eq!(parsed.sas_version, "9.4");
        assert_eq!(parsed.created, now());
    }

    #[test]
    fn second_header_roundtrip() {
        let rec = encode_second_header(now(), "A label", "CLIN").unwrap();
        let parsed = decode_second_header(&rec, default_year_pivot).unwrap();
        assert_eq!(parsed.modified, now());
        assert_eq!(parsed.label, "A label");
        assert_eq!(parsed.dataset_type, "CLIN");
    }

    #[test]
    fn namestr_header_roundtrip() {
        let rec = encode_namestr_header(42).unwrap();
        assert_eq!(decode_namestr_header(&rec).unwrap(), 42);
    }

    #[test]
    fn namestr_header_rejects_too_many_variables() {
        assert!(encode_namestr_header(10_000).is_err());
    }

    #[test]
    fn namestr_record_roundtrip() {
        let rec = encode_namestr(
            VarType::Character,
            20,
            1,
            "CITY",
            "City name",
            &Format::unspecified(),
            &Format::unspecified(),
            Justification::Left,
            0,
        )
        .unwrap();
        let parsed = decode_namestr(&rec).unwrap();
        assert_eq!(parsed.var_type, VarType::Character);
        assert_eq!(parsed.length, 20);
        assert_eq!(parsed.name, "CITY");
        assert_eq!(parsed.label, "City name");
        assert_eq!(parsed.offset_in_observation, 0);
    }

    #[test]
    fn namestr_record_rejects_bad_ntype() {
        let mut rec = [0u8; crate::record::NAMESTR_LEN];
        rec[0..2].copy_from_slice(&3i16.to_be_bytes());
        assert!(decode_namestr(&rec).is_err());
    }

    #[test]
    fn namestr_record_rejects_negative_npos() {
        let mut rec = encode_namestr(
            VarType::Numeric,
            8,
            1,
            "X",
            "",
            &Format::unspecified(),
            &Format::unspecified(),
            Justification::Left,
            0,
        )
        .unwrap();
        rec[84..88].copy_from_slice(&(-1i32).to_be_bytes());
        assert!(decode_namestr(&rec).is_err());
    }
}
