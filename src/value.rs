//! [`Value`]: one cell of an in-memory observation.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::missing::MissingValue;

/// One value in an observation, for either a NUMERIC or CHARACTER slot.
///
/// [`Reader::next_observation`](crate::Reader::next_observation) always
/// yields a concrete `Value` per variable (never a bare "null"; blank
/// CHARACTER content surfaces as `Value::Missing(MissingValue::Standard)`).
/// [`Writer::append_observation`](crate::Writer::append_observation) accepts
/// `Option<Value>` per variable, where `None` is shorthand for "null" —
/// valid only for NUMERIC slots, where it is encoded as the standard
/// missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A NUMERIC value.
    Number(f64),
    /// A missing-value sentinel, valid in a NUMERIC slot only.
    Missing(MissingValue),
    /// A CHARACTER value, ASCII, not trimmed of trailing blanks.
    Character(String),
    /// A local date, valid in a NUMERIC slot only; encoded on write as days
    /// since 1960-01-01.
    Date(NaiveDate),
    /// A local time, valid in a NUMERIC slot only; encoded on write as
    /// seconds since midnight.
    Time(NaiveTime),
    /// A local date-time, valid in a NUMERIC slot only; encoded on write as
    /// seconds since 1960-01-01T00:00:00.
    DateTime(NaiveDateTime),
}

impl Value {
    /// Shorthand for [`Value::Character`].
    #[must_use]
    pub fn character(s: impl Into<String>) -> Self {
        Self::Character(s.into())
    }
}
