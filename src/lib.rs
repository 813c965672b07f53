//! Pure Rust reader and writer for the SAS V5 Transport (XPORT) file format.
//!
//! XPORT (also called "Transport" or "TS-140", after the SAS technical
//! support document that defines it) is the wire format mandated by
//! regulatory submissions such as the FDA's: fixed 80-byte records,
//! big-endian IBM System/360 hexadecimal floating point, and blank-padded
//! ASCII strings. This crate reads and writes it without linking SAS or any
//! other proprietary runtime.
//!
//! # Quick start
//!
//! Reading:
//!
//! ```no_run
//! use std::fs::File;
//! use xport5::{Reader, default_year_pivot};
//!
//! # fn main() -> xport5::Result<()> {
//! let file = File::open("demographics.xpt")?;
//! let mut reader = Reader::new(file, default_year_pivot)?;
//! println!("dataset: {}", reader.description().dataset().name());
//! while let Some(observation) = reader.next_observation()? {
//!     println!("{observation:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Writing:
//!
//! ```no_run
//! use std::fs::File;
//! use chrono::Local;
//! use xport5::{DatasetDescription, DatasetSpec, LibraryDescription, Strictness, Writer};
//!
//! # fn main() -> xport5::Result<()> {
//! let now = Local::now().naive_local();
//! let dataset = DatasetDescription::new(
//!     DatasetSpec {
//!         name: "DEMO".to_string(),
//!         label: "Demographics".to_string(),
//!         dataset_type: String::new(),
//!         source_os: "linux".to_string(),
//!         source_sas_version: "9.4".to_string(),
//!         variables: vec![],
//!         create_time: now,
//!         modified_time: now,
//!     },
//!     Strictness::FdaSubmission,
//! )?;
//! let description = LibraryDescription::new(dataset, "linux", "9.4", now, now)?;
//! let file = File::create("demographics.xpt")?;
//! let mut writer = Writer::new(file, &description)?;
//! // writer.append_observation(&[...])? once per row, matching variable order
//! writer.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Strictness
//!
//! [`Strictness::FdaSubmission`] (the default used by most constructors)
//! additionally enforces ASCII-only text and the FDA's 200-byte CHARACTER
//! cap. [`Strictness::Basic`] checks only the structural constraints the
//! wire format itself demands; the reader always validates parsed metadata
//! at this level, since it must accept files written by producers that
//! never targeted a regulatory submission.
//!
//! # Non-goals
//!
//! This crate reads and writes exactly one dataset per library: a second
//! embedded dataset is reported as [`Error::MultipleDatasets`], never
//! silently read or merged. It does not implement SAS V8 XPORT, CPORT
//! (compressed transport), or any CDISC domain-specific metadata or
//! controlled-vocabulary validation beyond the wire format itself.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bytes;
mod dataset;
mod error;
mod float;
mod format;
mod header;
mod library;
mod missing;
mod reader;
mod record;
mod strictness;
mod value;
mod variable;
mod writer;

pub use bytes::{YearPivot, default_year_pivot};
pub use dataset::{DatasetDescription, DatasetSpec, MAX_VARIABLES};
pub use error::{Error, Result};
pub use format::Format;
pub use library::LibraryDescription;
pub use missing::MissingValue;
pub use reader::Reader;
pub use record::RECORD_LEN;
pub use strictness::Strictness;
pub use value::Value;
pub use variable::{Justification, VarType, Variable, VariableSpec};
pub use writer::Writer;
