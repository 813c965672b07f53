//! The streaming pull reader.
//!
//! Parses every header eagerly at construction, then yields one observation
//! at a time, resolving the record-boundary ambiguity between end-of-file
//! padding, a genuine run of missing values, and the start of a second
//! embedded dataset.

use std::collections::VecDeque;
use std::io::Read;

use crate::bytes::{self, PAD, YearPivot};
use crate::dataset::{DatasetDescription, DatasetSpec};
use crate::error::{Error, Result};
use crate::float::{self, Numeric};
use crate::header;
use crate::library::LibraryDescription;
use crate::missing::MissingValue;
use crate::record::{self, FileKind, RecordSource, MEMBER_HEADER, RECORD_LEN};
use crate::strictness::Strictness;
use crate::value::Value;
use crate::variable::{Variable, VariableSpec};

/// A fault latched by the reader once reported, so every subsequent call
/// re-raises it rather than re-attempting a read (fail-stop).
#[derive(Debug, Clone)]
enum LatchedFault {
    Malformed(String),
    MultipleDatasets,
    Io(String),
}

impl From<&Error> for LatchedFault {
    fn from(err: &Error) -> Self {
        match err {
            Error::Malformed { message } => Self::Malformed(message.clone()),
            Error::MultipleDatasets => Self::MultipleDatasets,
            Error::Io(e) => Self::Io(e.to_string()),
            other => Self::Malformed(other.to_string()),
        }
    }
}

impl From<LatchedFault> for Error {
    fn from(fault: LatchedFault) -> Self {
        match fault {
            LatchedFault::Malformed(message) => Error::malformed(message),
            LatchedFault::MultipleDatasets => Error::MultipleDatasets,
            LatchedFault::Io(message) => {
                Error::malformed(format!("repeating previously reported I/O failure: {message}"))
            }
        }
    }
}

/// One resolved variable: its [`Variable`] description plus its byte
/// offset and length within an observation.
#[derive(Debug, Clone)]
struct ResolvedVariable {
    variable: Variable,
    offset: usize,
}

/// A streaming pull reader over an XPORT byte source.
///
/// Every header is parsed eagerly at construction; [`Reader::next_observation`]
/// then yields observations one at a time without buffering the whole
/// dataset in memory.
pub struct Reader<R: Read> {
    description: LibraryDescription,
    variables: Vec<ResolvedVariable>,
    observation_length: usize,
    source: RecordSource<R>,
    /// The record currently being consumed, if any; `None` once the source
    /// is fully drained.
    cur: Option<[u8; RECORD_LEN]>,
    /// Position within `cur`; `RECORD_LEN` means `cur` is fully consumed.
    pos: usize,
    /// Records already pulled ahead of `cur` by a disambiguation probe,
    /// waiting to be consumed in order.
    probe_queue: VecDeque<[u8; RECORD_LEN]>,
    /// Set once a blank-run probe has confirmed more data follows, so we
    /// don't re-probe on every call while still inside that same record.
    confirmed_more_data: bool,
    fault: Option<LatchedFault>,
}

/// Recasts an out-of-range-field failure raised by a description
/// constructor as [`Error::Malformed`].
///
/// The description constructors are shared with the writer, where the same
/// failure is a caller mistake ([`Error::InvalidArgument`]). Decoded from a
/// byte stream, the identical failure is a corrupt input, not a caller
/// mistake, so the reader recasts it to keep §7's taxonomy consistent with
/// the fail-stop latch, which already re-raises any such fault as
/// `Malformed` on subsequent calls.
fn wire_error(err: Error) -> Error {
    match err {
        Error::InvalidArgument { message } => Error::malformed(message),
        other => other,
    }
}

impl<R: Read> Reader<R> {
    /// Builds a reader, parsing every header from `source` eagerly.
    ///
    /// `year_pivot` maps a two-digit year to a full calendar year when
    /// parsing embedded timestamps; pass [`bytes::default_year_pivot`] for
    /// the documented default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] for a recognized-but-unsupported V8
    /// XPORT or CPORT file, and [`Error::Malformed`] for anything
    /// structurally broken.
    pub fn new(source: R, year_pivot: YearPivot) -> Result<Self> {
        let mut source = RecordSource::new(source);

        let first = source
            .next_record()?
            .ok_or_else(|| Error::malformed("empty transport file"))?;
        #[cfg(feature = "tracing")]
        tracing::debug!(kind = ?record::classify(&first), "classified transport file");
        match record::classify(&first) {
            FileKind::V5 => {}
            FileKind::V8 => {
                return Err(Error::unsupported("SAS V8 XPORT files are not supported"));
            }
            FileKind::CPort => {
                return Err(Error::unsupported(
                    "SAS CPORT (compressed transport) files are not supported",
                ));
            }
            FileKind::Malformed => {
                return Err(Error::malformed(
                    "first record matches no recognized XPORT sentinel",
                ));
            }
        }

        let lib_real = Self::read_record(&mut source)?;
        let lib_real = header::decode_real_header(&lib_real, year_pivot)?;

        let lib_second = Self::read_record(&mut source)?;
        let lib_second = header::decode_second_header(&lib_second, year_pivot)?;

        let _member_header = Self::read_record(&mut source)?;
        let _descriptor_header = Self::read_record(&mut source)?;

        let ds_real = Self::read_record(&mut source)?;
        let ds_real = header::decode_member_real_header(&ds_real, year_pivot)?;

        let ds_second = Self::read_record(&mut source)?;
        let ds_second = header::decode_second_header(&ds_second, year_pivot)?;

        let namestr_header = Self::read_record(&mut source)?;
        let count = header::decode_namestr_header(&namestr_header)?;
        #[cfg(feature = "tracing")]
        tracing::trace!(variable_count = count, "parsed NAMESTR header");

        let namestr_bytes = source.read_exact_spanning(count as usize * record::NAMESTR_LEN)?;
        let mut variables = Vec::with_capacity(count as usize);
        for chunk in namestr_bytes.chunks_exact(record::NAMESTR_LEN) {
            let mut buf = [0u8; record::NAMESTR_LEN];
            buf.copy_from_slice(chunk);
            let raw = header::decode_namestr(&buf)?;
            let variable = Variable::new(
                VariableSpec {
                    name: raw.name,
                    number: raw.number,
                    var_type: raw.var_type,
                    length: raw.length,
                    label: raw.label,
                    output_format: raw.output_format,
                    justification: raw.justification,
                    input_format: raw.input_format,
                },
                Strictness::Basic,
            )
            .map_err(wire_error)?;
            variables.push(ResolvedVariable {
                variable,
                offset: raw.offset_in_observation as usize,
            });
        }

        // Skip zero-padding so the NAMESTR block aligns to 80 bytes.
        let consumed = count as usize * record::NAMESTR_LEN;
        let align_pad = consumed.next_multiple_of(RECORD_LEN) - consumed;
        if align_pad > 0 {
            source.read_exact_spanning(align_pad)?;
        }

        let _obs_header = Self::read_record(&mut source)?;

        let dataset = DatasetDescription::new(
            DatasetSpec {
                name: ds_real.name,
                label: ds_second.label,
                dataset_type: ds_second.dataset_type,
                source_os: ds_real.os,
                source_sas_version: ds_real.sas_version,
                variables: variables.iter().map(|r| r.variable.clone()).collect(),
                create_time: ds_real.created,
                modified_time: ds_second.modified,
            },
            Strictness::Basic,
        )
        .map_err(wire_error)?;
        let description = LibraryDescription::new(
            dataset,
            lib_real.os,
            lib_real.sas_version,
            lib_real.created,
            lib_second.modified,
        )
        .map_err(wire_error)?;

        let observation_length = variables
            .iter()
            .map(|r| r.offset + r.variable.length() as usize)
            .max()
            .unwrap_or(0);

        let cur = source.next_record()?;

        Ok(Self {
            description,
            variables,
            observation_length,
            source,
            cur,
            pos: 0,
            probe_queue: VecDeque::new(),
            confirmed_more_data: false,
            fault: None,
        })
    }

    fn read_record(source: &mut RecordSource<R>) -> Result<[u8; RECORD_LEN]> {
        source
            .next_record()?
            .ok_or_else(|| Error::malformed("unexpected end of file while reading headers"))
    }

    /// The parsed library/dataset description.
    #[must_use]
    pub fn description(&self) -> &LibraryDescription {
        &self.description
    }

    /// Releases the underlying byte source.
    ///
    /// Consumes the reader, so no further observations can be pulled from
    /// it afterward; this is enforced at compile time rather than by a
    /// runtime flag.
    pub fn close(self) -> R {
        self.source.into_inner()
    }

    /// Yields the next observation, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MultipleDatasets`] if a second embedded dataset is
    /// encountered, and [`Error::Malformed`] if the stream is truncated
    /// mid-observation. Once any fault has been reported, every subsequent
    /// call re-raises it (fail-stop).
    pub fn next_observation(&mut self) -> Result<Option<Vec<Value>>> {
        if let Some(fault) = self.fault.clone() {
            return Err(fault.into());
        }
        match self.next_observation_inner() {
            Ok(result) => Ok(result),
            Err(err) => {
                self.fault = Some(LatchedFault::from(&err));
                Err(err)
            }
        }
    }

    fn next_record_for_consumption(&mut self) -> Result<Option<[u8; RECORD_LEN]>> {
        if let Some(rec) = self.probe_queue.pop_front() {
            Ok(Some(rec))
        } else {
            self.source.next_record()
        }
    }

    fn next_observation_inner(&mut self) -> Result<Option<Vec<Value>>> {
        if self.observation_length == 0 {
            // A dataset with no variables has no observations to disambiguate.
            return Ok(None);
        }

        loop {
            if self.pos == RECORD_LEN {
                self.cur = self.next_record_for_consumption()?;
                self.pos = 0;
                self.confirmed_more_data = false;
            }

            let Some(rec) = self.cur else {
                return Ok(None);
            };

            if self.pos == 0 && rec == *MEMBER_HEADER {
                #[cfg(feature = "tracing")]
                tracing::debug!("second dataset detected at a fresh record boundary");
                return Err(Error::MultipleDatasets);
            }

            if self.pos > 0 && !self.confirmed_more_data {
                let rest_is_blank = rec[self.pos..].iter().all(|&b| b == PAD);
                if rest_is_blank {
                    match self.source.next_record()? {
                        None => return Ok(None),
                        Some(probe) if probe == *MEMBER_HEADER => {
                            #[cfg(feature = "tracing")]
                            tracing::debug!(
                                "second dataset detected via mid-record blank-run probe"
                            );
                            return Err(Error::MultipleDatasets);
                        }
                        Some(probe) => {
                            self.confirmed_more_data = true;
                            self.probe_queue.push_back(probe);
                        }
                    }
                }
            }

            break;
        }

        let bytes = self.read_observation_bytes()?;
        let values = self.decode_observation(&bytes)?;
        Ok(Some(values))
    }

    fn read_observation_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.observation_length);
        loop {
            let Some(rec) = self.cur else {
                return Err(Error::malformed("observation truncated"));
            };
            let avail = RECORD_LEN - self.pos;
            let needed = self.observation_length - out.len();
            let take = avail.min(needed);
            out.extend_from_slice(&rec[self.pos..self.pos + take]);
            self.pos += take;
            if out.len() == self.observation_length {
                return Ok(out);
            }
            match self.next_record_for_consumption()? {
                Some(next) => {
                    self.cur = Some(next);
                    self.pos = 0;
                    self.confirmed_more_data = false;
                }
                None => return Err(Error::malformed("observation truncated")),
            }
        }
    }

    fn decode_observation(&self, bytes: &[u8]) -> Result<Vec<Value>> {
        self.variables
            .iter()
            .map(|r| {
                let slot = &bytes[r.offset..r.offset + r.variable.length() as usize];
                match r.variable.var_type() {
                    crate::variable::VarType::Character => {
                        if slot.iter().all(|&b| b == PAD) {
                            Ok(Value::Missing(MissingValue::Standard))
                        } else {
                            Ok(Value::character(String::from_utf8_lossy(slot).into_owned()))
                        }
                    }
                    crate::variable::VarType::Numeric => {
                        let mut padded = [0u8; 8];
                        padded[..slot.len()].copy_from_slice(slot);
                        match float::decode(padded)? {
                            Numeric::Value(v) => Ok(Value::Number(v)),
                            Numeric::Missing(m) => Ok(Value::Missing(m)),
                        }
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use crate::variable::{Justification, VarType};
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn now() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(14, 30, 45)
            .unwrap()
    }

    /// Hand-assembles a minimal single-dataset V5 XPORT byte stream with one
    /// CHARACTER variable, for exercising the reader without the writer.
    fn build_file(observations: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(record::LIBRARY_HEADER);
        out.extend_from_slice(&header::encode_real_header(header::SYMBOL_SASLIB, "9.4", "linux", now()).unwrap());
        out.extend_from_slice(&header::encode_second_header(now(), "", "").unwrap());
        out.extend_from_slice(record::MEMBER_HEADER);
        out.extend_from_slice(record::MEMBER_HEADER_DATA);
        out.extend_from_slice(
            &header::encode_member_real_header("TEMP", "9.4", "linux", now()).unwrap(),
        );
        out.extend_from_slice(&header::encode_second_header(now(), "", "").unwrap());
        out.extend_from_slice(&header::encode_namestr_header(1).unwrap());
        let namestr = header::encode_namestr(
            VarType::Character,
            8,
            1,
            "CITY",
            "",
            &Format::unspecified(),
            &Format::unspecified(),
            Justification::Left,
            0,
        )
        .unwrap();
        out.extend_from_slice(&namestr);
        let pad = record::NAMESTR_LEN.next_multiple_of(RECORD_LEN) - record::NAMESTR_LEN;
        out.extend(std::iter::repeat_n(0u8, pad));
        out.extend_from_slice(record::OBS_HEADER);
        for obs in observations {
            out.extend_from_slice(obs);
        }
        let rem = out.len() % RECORD_LEN;
        if rem != 0 {
            out.extend(std::iter::repeat_n(PAD, RECORD_LEN - rem));
        }
        out
    }

    /// Like [`build_file`], but with a single CHARACTER variable of
    /// `length` bytes and no trailing alignment padding appended (the
    /// caller controls exactly what follows the observation bytes).
    fn build_file_with_length(length: u16, observations: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(record::LIBRARY_HEADER);
        out.extend_from_slice(&header::encode_real_header(header::SYMBOL_SASLIB, "9.4", "linux", now()).unwrap());
        out.extend_from_slice(&header::encode_second_header(now(), "", "").unwrap());
        out.extend_from_slice(record::MEMBER_HEADER);
        out.extend_from_slice(record::MEMBER_HEADER_DATA);
        out.extend_from_slice(
            &header::encode_member_real_header("TEMP", "9.4", "linux", now()).unwrap(),
        );
        out.extend_from_slice(&header::encode_second_header(now(), "", "").unwrap());
        out.extend_from_slice(&header::encode_namestr_header(1).unwrap());
        let namestr = header::encode_namestr(
            VarType::Character,
            length,
            1,
            "CITY",
            "",
            &Format::unspecified(),
            &Format::unspecified(),
            Justification::Left,
            0,
        )
        .unwrap();
        out.extend_from_slice(&namestr);
        let pad = record::NAMESTR_LEN.next_multiple_of(RECORD_LEN) - record::NAMESTR_LEN;
        out.extend(std::iter::repeat_n(0u8, pad));
        out.extend_from_slice(record::OBS_HEADER);
        for obs in observations {
            out.extend_from_slice(obs);
        }
        out
    }

    #[test]
    fn reads_single_observation_record_aligned() {
        let data = build_file(&[b"TEXT    "]);
        let mut reader = Reader::new(Cursor::new(data), bytes::default_year_pivot).unwrap();
        assert_eq!(reader.description().dataset().name(), "TEMP");
        let obs = reader.next_observation().unwrap().unwrap();
        assert_eq!(obs, vec![Value::character("TEXT    ")]);
        assert!(reader.next_observation().unwrap().is_none());
    }

    #[test]
    fn record_aligned_blank_observation_followed_by_eof_is_data_not_padding() {
        // One CHARACTER(80) variable: each observation exactly fills one
        // record, so a fully-blank observation sits at a fresh record
        // boundary. Per the disambiguation rules, the "mid-record blank
        // run" check never fires at a fresh record boundary, so this is
        // read as a genuine missing-value observation, not EOF padding.
        let blank_obs = [PAD; 80];
        let data = build_file_with_length(80, &[&blank_obs]);
        let mut reader = Reader::new(Cursor::new(data), bytes::default_year_pivot).unwrap();
        let obs = reader.next_observation().unwrap().unwrap();
        assert_eq!(obs, vec![Value::Missing(MissingValue::Standard)]);
        assert!(reader.next_observation().unwrap().is_none());
    }

    #[test]
    fn second_dataset_fails_multiple_datasets() {
        let mut data = build_file(&[b"TEXT    "]);
        // Truncate the trailing blank padding and append a second MEMBER
        // header to simulate a multi-dataset file.
        while data.len() % RECORD_LEN != 0 {
            data.push(PAD);
        }
        data.extend_from_slice(record::MEMBER_HEADER);
        let mut reader = Reader::new(Cursor::new(data), bytes::default_year_pivot).unwrap();
        let first = reader.next_observation().unwrap().unwrap();
        assert_eq!(first, vec![Value::character("TEXT    ")]);
        let err = reader.next_observation().unwrap_err();
        assert!(matches!(err, Error::MultipleDatasets));
        // Fail-stop: the same fault re-raises.
        let err2 = reader.next_observation().unwrap_err();
        assert!(matches!(err2, Error::MultipleDatasets));
    }

    #[test]
    fn blank_character_value_is_standard_missing() {
        let data = build_file(&[&[PAD; 8]]);
        let mut reader = Reader::new(Cursor::new(data), bytes::default_year_pivot).unwrap();
        let obs = reader.next_observation().unwrap().unwrap();
        assert_eq!(obs, vec![Value::Missing(MissingValue::Standard)]);
    }

    #[test]
    fn truncated_mid_observation_fails_malformed() {
        // A 160-byte observation (spans two records) with only one full
        // record supplied before a clean EOF.
        let data = build_file_with_length(160, &[&[0u8; RECORD_LEN]]);
        let mut reader = Reader::new(Cursor::new(data), bytes::default_year_pivot).unwrap();
        let err = reader.next_observation().unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
        // Fail-stop: the same fault re-raises.
        let err2 = reader.next_observation().unwrap_err();
        assert!(matches!(err2, Error::Malformed { .. }));
    }

    #[test]
    fn corrupt_namestr_length_surfaces_as_malformed_not_invalid_argument() {
        // A NUMERIC variable declaring a length of 20 fails
        // `Variable::new`'s range check (2..=8). Decoded from the wire this
        // must surface as `Malformed`, not the `InvalidArgument` that same
        // constructor raises for a writer caller's own bad input.
        let mut out = Vec::new();
        out.extend_from_slice(record::LIBRARY_HEADER);
        out.extend_from_slice(&header::encode_real_header(header::SYMBOL_SASLIB, "9.4", "linux", now()).unwrap());
        out.extend_from_slice(&header::encode_second_header(now(), "", "").unwrap());
        out.extend_from_slice(record::MEMBER_HEADER);
        out.extend_from_slice(record::MEMBER_HEADER_DATA);
        out.extend_from_slice(
            &header::encode_member_real_header("TEMP", "9.4", "linux", now()).unwrap(),
        );
        out.extend_from_slice(&header::encode_second_header(now(), "", "").unwrap());
        out.extend_from_slice(&header::encode_namestr_header(1).unwrap());
        let namestr = header::encode_namestr(
            VarType::Numeric,
            20,
            1,
            "X",
            "",
            &Format::unspecified(),
            &Format::unspecified(),
            Justification::Left,
            0,
        )
        .unwrap();
        out.extend_from_slice(&namestr);
        let pad = record::NAMESTR_LEN.next_multiple_of(RECORD_LEN) - record::NAMESTR_LEN;
        out.extend(std::iter::repeat_n(0u8, pad));
        out.extend_from_slice(record::OBS_HEADER);
        let rem = out.len() % RECORD_LEN;
        if rem != 0 {
            out.extend(std::iter::repeat_n(PAD, RECORD_LEN - rem));
        }

        let err = Reader::new(Cursor::new(out), bytes::default_year_pivot).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
    }

    #[test]
    fn rejects_v8_files() {
        let mut data = build_file(&[]);
        data[..RECORD_LEN].copy_from_slice(record::LIBV8_HEADER);
        let err = Reader::new(Cursor::new(data), bytes::default_year_pivot).unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
    }
}
