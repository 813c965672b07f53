//! The streaming push writer.
//!
//! Emits every header at construction, then accepts one observation at a
//! time, buffering each into a full observation's worth of bytes before
//! committing it to the sink so a rejected value never leaves a partial
//! observation on the wire.

use std::io::Write;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::bytes::PAD;
use crate::error::{Error, Result};
use crate::float;
use crate::header;
use crate::library::LibraryDescription;
use crate::missing::MissingValue;
use crate::record::{self, RecordSink, RECORD_LEN};
use crate::value::Value;
use crate::variable::{Variable, VarType};

fn sas_epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1960, 1, 1).expect("valid calendar date")
}

fn sas_epoch_datetime() -> NaiveDateTime {
    sas_epoch_date()
        .and_hms_opt(0, 0, 0)
        .expect("valid time of day")
}

#[derive(Debug, Clone)]
struct ResolvedVariable {
    variable: Variable,
    offset: usize,
}

/// A streaming push writer over an XPORT byte sink.
///
/// Every header is emitted eagerly at construction; [`Writer::append_observation`]
/// then accepts observations one at a time. [`Writer::close`] pads the final
/// partial record and releases the sink.
pub struct Writer<W: Write> {
    sink: Option<RecordSink<W>>,
    variables: Vec<ResolvedVariable>,
    observation_length: usize,
    closed: bool,
}

impl<W: Write> Writer<W> {
    /// Builds a writer, emitting every header from `description` eagerly.
    ///
    /// # Errors
    ///
    /// Returns an error if any header field fails to encode, or if writing
    /// to `sink` fails.
    pub fn new(sink: W, description: &LibraryDescription) -> Result<Self> {
        let mut sink = RecordSink::new(sink);
        let dataset = description.dataset();
        #[cfg(feature = "tracing")]
        tracing::debug!(dataset = dataset.name(), "emitting transport headers");

        sink.write_record(record::LIBRARY_HEADER)?;

        sink.write_record(&header::encode_real_header(
            header::SYMBOL_SASLIB,
            description.source_sas_version(),
            description.source_os(),
            description.create_time(),
        )?)?;
        sink.write_record(&header::encode_second_header(
            description.modified_time(),
            "",
            "",
        )?)?;

        sink.write_record(record::MEMBER_HEADER)?;
        sink.write_record(record::MEMBER_HEADER_DATA)?;

        sink.write_record(&header::encode_member_real_header(
            dataset.name(),
            dataset.source_sas_version(),
            dataset.source_os(),
            dataset.create_time(),
        )?)?;
        sink.write_record(&header::encode_second_header(
            dataset.modified_time(),
            dataset.label(),
            dataset.dataset_type(),
        )?)?;

        let count = u16::try_from(dataset.variables().len()).map_err(|_| {
            Error::invalid_argument("a dataset may declare at most 9999 variables")
        })?;
        sink.write_record(&header::encode_namestr_header(count)?)?;

        let mut variables = Vec::with_capacity(dataset.variables().len());
        let mut offset = 0usize;
        for variable in dataset.variables() {
            let namestr = header::encode_namestr(
                variable.var_type(),
                variable.length(),
                variable.number(),
                variable.name(),
                variable.label(),
                variable.output_format(),
                variable.input_format(),
                variable.justification(),
                offset as i32,
            )?;
            sink.write_bytes(&namestr)?;
            variables.push(ResolvedVariable {
                variable: variable.clone(),
                offset,
            });
            offset += variable.length() as usize;
        }

        let namestr_total = dataset.variables().len() * record::NAMESTR_LEN;
        let align_pad = namestr_total.next_multiple_of(RECORD_LEN) - namestr_total;
        if align_pad > 0 {
            sink.write_bytes(&vec![0u8; align_pad])?;
        }

        sink.write_record(record::OBS_HEADER)?;

        let observation_length = offset;
        #[cfg(feature = "tracing")]
        tracing::trace!(variable_count = variables.len(), observation_length, "headers written");

        Ok(Self {
            sink: Some(sink),
            variables,
            observation_length,
            closed: false,
        })
    }

    fn sink_mut(&mut self) -> Result<&mut RecordSink<W>> {
        self.sink
            .as_mut()
            .ok_or_else(|| Error::invalid_state("writer is closed"))
    }

    /// Appends one observation.
    ///
    /// `values` must have exactly one entry per variable, in declared
    /// order. `None` is shorthand for "null", valid only for NUMERIC
    /// variables (encoded as the standard missing value).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the writer is closed,
    /// [`Error::InvalidArgument`] on an arity mismatch or a value that does
    /// not fit its variable's type/length, and an I/O error if the write
    /// fails.
    pub fn append_observation(&mut self, values: &[Option<Value>]) -> Result<()> {
        if self.closed {
            return Err(Error::invalid_state("writer is closed"));
        }
        if values.len() < self.variables.len() {
            return Err(Error::invalid_argument(format!(
                "too few values: expected {}, got {}",
                self.variables.len(),
                values.len()
            )));
        }
        if values.len() > self.variables.len() {
            return Err(Error::invalid_argument(format!(
                "too many values: expected {}, got {}",
                self.variables.len(),
                values.len()
            )));
        }

        let mut buf = vec![0u8; self.observation_length];
        for (resolved, value) in self.variables.iter().zip(values) {
            let encoded = encode_value(resolved, value.as_ref())?;
            let length = resolved.variable.length() as usize;
            buf[resolved.offset..resolved.offset + length].copy_from_slice(&encoded);
        }

        self.sink_mut()?.write_bytes(&buf)?;
        Ok(())
    }

    /// Pads the final partial record with blanks and releases the sink.
    ///
    /// Idempotent calls after the first fail [`Error::InvalidState`].
    ///
    /// # Errors
    ///
    /// Returns an I/O error if flushing fails.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::invalid_state("writer is already closed"));
        }
        self.closed = true;
        let mut sink = self.sink.take().expect("sink present while not closed");
        sink.pad_to_boundary(PAD)?;
        sink.finish()?;
        #[cfg(feature = "tracing")]
        tracing::debug!("writer closed");
        Ok(())
    }
}

fn encode_value(resolved: &ResolvedVariable, value: Option<&Value>) -> Result<Vec<u8>> {
    let variable = &resolved.variable;
    let length = variable.length() as usize;

    match variable.var_type() {
        VarType::Character => {
            let s = match value {
                None => {
                    return Err(Error::invalid_argument(format!(
                        "CHARACTER variable {:?} requires a value; use an empty string for missing data",
                        variable.name()
                    )));
                }
                Some(Value::Missing(_)) => {
                    return Err(Error::invalid_argument(
                        "CHARACTER variables use the empty string for missing values",
                    ));
                }
                Some(Value::Character(s)) => s,
                Some(_) => {
                    return Err(Error::invalid_argument(format!(
                        "variable {:?} is CHARACTER and cannot accept a NUMERIC value",
                        variable.name()
                    )));
                }
            };
            if !s.is_ascii() {
                return Err(Error::invalid_argument(format!(
                    "CHARACTER value for {:?} must be ASCII",
                    variable.name()
                )));
            }
            if s.len() > length {
                return Err(Error::invalid_argument(format!(
                    "CHARACTER value for {:?} exceeds its declared length of {length}",
                    variable.name()
                )));
            }
            let mut out = Vec::with_capacity(length);
            out.extend_from_slice(s.as_bytes());
            out.resize(length, PAD);
            Ok(out)
        }
        VarType::Numeric => {
            let bytes = match value {
                None => float::encode_missing(MissingValue::Standard),
                Some(Value::Missing(m)) => float::encode_missing(*m),
                Some(Value::Number(v)) => float::encode_value(*v)?,
                Some(Value::Date(d)) => {
                    let days = (*d - sas_epoch_date()).num_days() as f64;
                    float::encode_value(days)?
                }
                Some(Value::Time(t)) => {
                    let seconds = f64::from(t.num_seconds_from_midnight());
                    float::encode_value(seconds)?
                }
                Some(Value::DateTime(dt)) => {
                    let seconds = (*dt - sas_epoch_datetime()).num_seconds() as f64;
                    float::encode_value(seconds)?
                }
                Some(Value::Character(_)) => {
                    return Err(Error::invalid_argument(format!(
                        "variable {:?} is NUMERIC and cannot accept a CHARACTER value",
                        variable.name()
                    )));
                }
            };
            Ok(bytes[..length].to_vec())
        }
    }
}
