//! [`DatasetDescription`]: an immutable description of one SAS dataset.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::{Error, Result};
use crate::strictness::Strictness;
use crate::variable::Variable;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,7}$").expect("valid regex"))
}

/// The maximum number of variables a dataset may declare.
pub const MAX_VARIABLES: usize = 9999;

/// An immutable description of one SAS dataset: its name, metadata, and
/// ordered column list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetDescription {
    name: String,
    label: String,
    dataset_type: String,
    source_os: String,
    source_sas_version: String,
    variables: Vec<Variable>,
    create_time: NaiveDateTime,
    modified_time: NaiveDateTime,
}

/// Fields needed to construct a [`DatasetDescription`].
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    /// See [`DatasetDescription::name`].
    pub name: String,
    /// See [`DatasetDescription::label`].
    pub label: String,
    /// See [`DatasetDescription::dataset_type`].
    pub dataset_type: String,
    /// See [`DatasetDescription::source_os`].
    pub source_os: String,
    /// See [`DatasetDescription::source_sas_version`].
    pub source_sas_version: String,
    /// See [`DatasetDescription::variables`].
    pub variables: Vec<Variable>,
    /// See [`DatasetDescription::create_time`].
    pub create_time: NaiveDateTime,
    /// See [`DatasetDescription::modified_time`].
    pub modified_time: NaiveDateTime,
}

impl DatasetDescription {
    /// Builds a new dataset description.
    ///
    /// Validation order, surfacing the first failure: dataset name pattern,
    /// label/type length and FDA-ASCII, `source_os`/`source_sas_version`
    /// length and ASCII, variable count `<= 9999`, and case-insensitive
    /// variable-name uniqueness (each [`Variable`] has already validated
    /// itself at construction).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] on the first failing check.
    pub fn new(spec: DatasetSpec, strictness: Strictness) -> Result<Self> {
        let DatasetSpec {
            name,
            label,
            dataset_type,
            source_os,
            source_sas_version,
            variables,
            create_time,
            modified_time,
        } = spec;

        if !name_pattern().is_match(&name) {
            return Err(Error::invalid_argument("dataset name is illegal for SAS"));
        }

        if label.len() > 40 {
            return Err(Error::invalid_argument(
                "dataset label must be at most 40 characters",
            ));
        }
        if strictness.is_fda() && !label.is_ascii() {
            return Err(Error::invalid_argument("dataset label must be ASCII"));
        }

        if dataset_type.len() > 8 {
            return Err(Error::invalid_argument(
                "dataset type must be at most 8 characters",
            ));
        }
        if strictness.is_fda() && !dataset_type.is_ascii() {
            return Err(Error::invalid_argument("dataset type must be ASCII"));
        }

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

        if variables.len() > MAX_VARIABLES {
            return Err(Error::invalid_argument(format!(
                "dataset must declare at most {MAX_VARIABLES} variables"
            )));
        }

        let mut seen = HashSet::with_capacity(variables.len());
        for v in &variables {
            let key = v.name().to_ascii_uppercase();
            if !seen.insert(key) {
                return Err(Error::invalid_argument(format!(
                    "multiple variables have the same name: {}",
                    v.name().to_ascii_uppercase()
                )));
            }
        }

        Ok(Self {
            name,
            label,
            dataset_type,
            source_os,
            source_sas_version,
            variables,
            create_time,
            modified_time,
        })
    }

    /// The dataset name, 1-8 chars matching `[A-Za-z_][A-Za-z0-9_]{0,7}`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dataset label, 0-40 characters.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The dataset type, 0-8 characters.
    #[must_use]
    pub fn dataset_type(&self) -> &str {
        &self.dataset_type
    }

    /// The source operating system, 0-8 ASCII characters.
    #[must_use]
    pub fn source_os(&self) -> &str {
        &self.source_os
    }

    /// The source SAS version, 0-8 ASCII characters.
    #[must_use]
    pub fn source_sas_version(&self) -> &str {
        &self.source_sas_version
    }

    /// The ordered column list.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The dataset creation timestamp.
    #[must_use]
    pub fn create_time(&self) -> NaiveDateTime {
        self.create_time
    }

    /// The dataset last-modified timestamp.
    #[must_use]
    pub fn modified_time(&self) -> NaiveDateTime {
        self.modified_time
    }

    /// The stride, in bytes, of one observation: the sum of all variable
    /// lengths.
    #[must_use]
    pub fn observation_stride(&self) -> usize {
        self.variables.iter().map(|v| v.length() as usize).sum()
    }
}
