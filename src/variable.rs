//! [`Variable`]: an immutable description of one dataset column.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::format::Format;
use crate::strictness::Strictness;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,7}$").expect("valid regex"))
}

/// The SAS storage type of a variable's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarType {
    /// An IBM-360 double, optionally a missing-value sentinel.
    Numeric,
    /// A fixed-width blank-padded ASCII string.
    Character,
}

/// The justification NAMESTR field (`nfj`).
///
/// The semantics of this field are undocumented by the format's owner; this
/// crate preserves it round-trip without assigning it further behavior (see
/// the open question in the design notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Justification {
    /// `nfj == 0`.
    #[default]
    Left,
    /// `nfj == 1`.
    Right,
    /// Any other `nfj` value.
    Unknown,
}

impl Justification {
    /// Decodes the raw `nfj` NAMESTR byte.
    #[must_use]
    pub fn from_nfj(nfj: i16) -> Self {
        match nfj {
            0 => Self::Left,
            1 => Self::Right,
            _ => Self::Unknown,
        }
    }

    /// Encodes back to the raw `nfj` NAMESTR byte.
    #[must_use]
    pub fn to_nfj(self) -> i16 {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::Unknown => -1,
        }
    }
}

/// An immutable description of one column in a dataset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    name: String,
    number: u32,
    var_type: VarType,
    length: u16,
    label: String,
    output_format: Format,
    justification: Justification,
    input_format: Format,
}

/// Fields needed to construct a [`Variable`]; grouped to keep
/// [`Variable::new`]'s signature manageable.
#[derive(Debug, Clone)]
pub struct VariableSpec {
    /// See [`Variable::name`].
    pub name: String,
    /// See [`Variable::number`].
    pub number: u32,
    /// See [`Variable::var_type`].
    pub var_type: VarType,
    /// See [`Variable::length`].
    pub length: u16,
    /// See [`Variable::label`].
    pub label: String,
    /// See [`Variable::output_format`].
    pub output_format: Format,
    /// See [`Variable::justification`].
    pub justification: Justification,
    /// See [`Variable::input_format`].
    pub input_format: Format,
}

impl Variable {
    /// Builds a new variable, validating per `strictness`.
    ///
    /// Validation order: name pattern, label length/ASCII-under-FDA, then
    /// length range (NUMERIC: 2..=8; CHARACTER: 1..=32767, or 1..=200 under
    /// FDA strictness).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] on the first failing check.
    pub fn new(spec: VariableSpec, strictness: Strictness) -> Result<Self> {
        let VariableSpec {
            name,
            number,
            var_type,
            length,
            label,
            output_format,
            justification,
            input_format,
        } = spec;

        if !name_pattern().is_match(&name) {
            return Err(Error::invalid_argument(
                "variable name is illegal for SAS",
            ));
        }

        if label.len() > 40 {
            return Err(Error::invalid_argument(
                "variable label must be at most 40 characters",
            ));
        }
        if strictness.is_fda() && !label.is_ascii() {
            return Err(Error::invalid_argument("variable label must be ASCII"));
        }

        match var_type {
            VarType::Numeric => {
                if !(2..=8).contains(&length) {
                    return Err(Error::invalid_argument(
                        "NUMERIC variable length must be between 2 and 8",
                    ));
                }
            }
            VarType::Character => {
                let max = if strictness.is_fda() { 200 } else { 32767 };
                if length == 0 || length as usize > max {
                    return Err(Error::invalid_argument(format!(
                        "CHARACTER variable length must be between 1 and {max}"
                    )));
                }
                if strictness.is_fda() && !label.is_ascii() {
                    return Err(Error::invalid_argument("variable label must be ASCII"));
                }
            }
        }

        Ok(Self {
            name,
            number,
            var_type,
            length,
            label,
            output_format,
            justification,
            input_format,
        })
    }

    /// The variable name, 1-8 chars matching `[A-Za-z_][A-Za-z0-9_]{0,7}`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 1-based column order.
    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Whether this is a NUMERIC or CHARACTER variable.
    #[must_use]
    pub fn var_type(&self) -> VarType {
        self.var_type
    }

    /// The on-wire byte length of this variable's value.
    #[must_use]
    pub fn length(&self) -> u16 {
        self.length
    }

    /// The variable label, 0-40 characters.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The output (display) format.
    #[must_use]
    pub fn output_format(&self) -> &Format {
        &self.output_format
    }

    /// The justification field.
    #[must_use]
    pub fn justification(&self) -> Justification {
        self.justification
    }

    /// The input format.
    #[must_use]
    pub fn input_format(&self) -> &Format {
        &self.input_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strictness::Strictness;

    fn spec(name: &str, var_type: VarType, length: u16) -> VariableSpec {
        VariableSpec {
            name: name.to_string(),
            number: 1,
            var_type,
            length,
            label: String::new(),
            output_format: Format::unspecified(),
            justification: Justification::Left,
            input_format: Format::unspecified(),
        }
    }

    #[test]
    fn accepts_valid_name() {
        assert!(Variable::new(spec("CITY", VarType::Character, 20), Strictness::Basic).is_ok());
        assert!(Variable::new(spec("_x9", VarType::Numeric, 8), Strictness::Basic).is_ok());
    }

    #[test]
    fn rejects_invalid_name() {
        assert!(Variable::new(spec("9CITY", VarType::Character, 20), Strictness::Basic).is_err());
        assert!(Variable::new(spec("", VarType::Character, 20), Strictness::Basic).is_err());
        assert!(
            Variable::new(spec("TOOLONGNAME", VarType::Character, 20), Strictness::Basic)
                .is_err()
        );
    }

    #[test]
    fn numeric_length_range() {
        assert!(Variable::new(spec("X", VarType::Numeric, 1), Strictness::Basic).is_err());
        assert!(Variable::new(spec("X", VarType::Numeric, 9), Strictness::Basic).is_err());
        assert!(Variable::new(spec("X", VarType::Numeric, 8), Strictness::Basic).is_ok());
    }

    #[test]
    fn character_length_cap_under_fda() {
        assert!(
            Variable::new(spec("X", VarType::Character, 201), Strictness::FdaSubmission).is_err()
        );
        assert!(
            Variable::new(spec("X", VarType::Character, 201), Strictness::Basic).is_ok()
        );
    }

    #[test]
    fn justification_roundtrip() {
        assert_eq!(Justification::from_nfj(0), Justification::Left);
        assert_eq!(Justification::from_nfj(1), Justification::Right);
        assert_eq!(Justification::from_nfj(42), Justification::Unknown);
        assert_eq!(Justification::Left.to_nfj(), 0);
        assert_eq!(Justification::Right.to_nfj(), 1);
    }
}
