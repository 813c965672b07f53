//! [`LibraryDescription`]: the top-level description of an XPORT library.

use chrono::NaiveDateTime;

use crate::dataset::DatasetDescription;
use crate::error::{Error, Result};

/// An immutable description of an XPORT library.
///
/// The on-disk format can embed more than one dataset per library, but this
/// crate's API exposes exactly one: a second embedded dataset is reported
/// as [`crate::Error::MultipleDatasets`] rather than silently read or
/// silently discarded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LibraryDescription {
    dataset: DatasetDescription,
    source_os: String,
    source_sas_version: String,
    create_time: NaiveDateTime,
    modified_time: NaiveDateTime,
}

impl LibraryDescription {
    /// Builds a new library description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `source_os` or
    /// `source_sas_version` is longer than 8 characters or is not ASCII.
    pub fn new(
        dataset: DatasetDescription,
        source_os: impl Into<String>,
        source_sas_version: impl Into<String>,
        create_time: NaiveDateTime,
        modified_time: NaiveDateTime,
    ) -> Result<Self> {
        let source_os = source_os.into();
        let source_sas_version = source_sas_version.into();
        for (field, value) in [
            ("source_os", &source_os),
            ("source_sas_version", &source_sas_version),
        ] {
            if value.len() > 8 {
                return Err(Error::invalid_argument(format!(
                    "{field} must be at most 8 characters"
                )));
            }
            if !value.is_ascii() {
                return Err(Error::invalid_argument(format!("{field} must be ASCII")));
            }
        }

        Ok(Self {
            dataset,
            source_os,
            source_sas_version,
            create_time,
            modified_time,
        })
    }

    /// The single dataset this library describes.
    #[must_use]
    pub fn dataset(&self) -> &DatasetDescription {
        &self.dataset
    }

    /// The library's source operating system.
    #[must_use]
    pub fn source_os(&self) -> &str {
        &self.source_os
    }

    /// The library's source SAS version.
    #[must_use]
    pub fn source_sas_version(&self) -> &str {
        &self.source_sas_version
    }

    /// The library creation timestamp.
    #[must_use]
    pub fn create_time(&self) -> NaiveDateTime {
        self.create_time
    }

    /// The library last-modified timestamp.
    #[must_use]
    pub fn modified_time(&self) -> NaiveDateTime {
        self.modified_time
    }
}
