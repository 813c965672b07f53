//! The 28 SAS missing-value sentinels.

use crate::error::{Error, Result};

/// A SAS "missing value" sentinel for a NUMERIC slot.
///
/// SAS distinguishes 28 reasons a numeric value can be absent: the plain
/// `.` ("standard missing"), `._` ("underscore missing"), and `.A`
/// through `.Z` (26 "special missing" values a producer can use to encode
/// *why* a value is absent — e.g. "below detection limit" vs. "not
/// collected"). On the wire each is a single sentinel byte in the first
/// byte of an 8-byte NUMERIC slot, with the remaining seven bytes zero —
/// bit patterns that would otherwise be indistinguishable from small
/// positive IBM-360 floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MissingValue {
    /// The standard missing value, `.`.
    Standard,
    /// The underscore special missing value, `._`.
    Underscore,
    /// A letter-coded special missing value, `.A`..`.Z`.
    Letter(char),
}

impl MissingValue {
    /// The sentinel byte this value occupies in an IBM-360 slot's first
    /// byte.
    #[must_use]
    pub fn sentinel_byte(self) -> u8 {
        match self {
            Self::Standard => b'.',
            Self::Underscore => b'_',
            Self::Letter(c) => c as u8,
        }
    }

    /// Builds a [`MissingValue`] from a sentinel byte, or `None` if `byte`
    /// is not one of the 28 recognized sentinels.
    #[must_use]
    pub fn from_sentinel_byte(byte: u8) -> Option<Self> {
        match byte {
            b'.' => Some(Self::Standard),
            b'_' => Some(Self::Underscore),
            b'A'..=b'Z' => Some(Self::Letter(byte as char)),
            _ => None,
        }
    }

    /// Builds a special missing value `.A`..`.Z` from its letter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `letter` is not `A`..=`Z`.
    pub fn letter(letter: char) -> Result<Self> {
        if letter.is_ascii_uppercase() {
            Ok(Self::Letter(letter))
        } else {
            Err(Error::invalid_argument(format!(
                "special missing value letter must be A-Z, got {letter:?}"
            )))
        }
    }

    /// The string form: `"."` for [`MissingValue::Standard`], otherwise
    /// `"." + letter` (e.g. `"._"`, `".A"`).
    #[must_use]
    pub fn as_str(self) -> String {
        match self {
            Self::Standard => ".".to_string(),
            Self::Underscore => "._".to_string(),
            Self::Letter(c) => format!(".{c}"),
        }
    }
}

impl std::fmt::Display for MissingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str())
    }
}
