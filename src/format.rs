//! [`Format`]: an immutable description of a SAS display or input format.

use crate::error::{Error, Result};

/// An immutable value describing a SAS display or input format (e.g. the
/// `DATE9.` format attached to a date variable).
///
/// Equality is structural. A `Format` is constructed once, by the caller or
/// by the reader, and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Format {
    name: String,
    width: u16,
    digits: u16,
}

impl Format {
    /// The distinguished "no format" sentinel: `("", 0, 0)`.
    #[must_use]
    pub fn unspecified() -> Self {
        Self {
            name: String::new(),
            width: 0,
            digits: 0,
        }
    }

    /// Builds a new format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is longer than 8 ASCII
    /// characters or is not ASCII.
    pub fn new(name: impl Into<String>, width: u16, digits: u16) -> Result<Self> {
        let name = name.into();
        if !name.is_ascii() {
            return Err(Error::invalid_argument("format name must be ASCII"));
        }
        if name.len() > 8 {
            return Err(Error::invalid_argument(
                "format name must be at most 8 characters",
            ));
        }
        Ok(Self {
            name,
            width,
            digits,
        })
    }

    /// The format name, 0-8 ASCII characters.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The format width.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// The format's decimal-digit count.
    #[must_use]
    pub fn digits(&self) -> u16 {
        self.digits
    }

    /// Whether this is the [`Format::unspecified`] sentinel.
    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        *self == Self::unspecified()
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::unspecified()
    }
}
