//! Error types for xport5.
//!
//! This module defines the [`Error`] enum which represents all possible
//! errors that can occur while reading or writing SAS V5 Transport files.

/// The main error type for xport5 operations.
///
/// Every fallible operation in this crate returns a [`Result`] carrying one
/// of these variants; there is no exception-style control flow.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The byte stream is structurally broken: a missing header, a sentinel
    /// mismatch, an out-of-range field, a malformed date, a malformed
    /// numeric value, or an observation truncated mid-way. Always surfaces
    /// from the reader.
    #[error("malformed transport file: {message}")]
    Malformed {
        /// What was wrong with the stream.
        message: String,
    },

    /// The file is a recognized but unsupported SAS transport variant
    /// (V8 XPORT, CPORT).
    #[error("unsupported transport file: {message}")]
    Unsupported {
        /// Which variant, and why it is rejected.
        message: String,
    },

    /// The reader finished the first dataset in a file that contains more
    /// than one. Observations already returned from the completed dataset
    /// remain valid; the caller should not retry this reader.
    #[error(
        "file contains more than one dataset; only the first is supported, \
         previously returned observations remain valid"
    )]
    MultipleDatasets,

    /// Caller-supplied data violates a documented constraint (name, length,
    /// ASCII, type).
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// The violated constraint.
        message: String,
    },

    /// An operation was invoked on a reader/writer that has already been
    /// closed.
    #[error("invalid state: {message}")]
    InvalidState {
        /// What the caller attempted.
        message: String,
    },

    /// The underlying byte source or sink failed.
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a new [`Error::Malformed`] error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates a new [`Error::Unsupported`] error.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Creates a new [`Error::InvalidArgument`] error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a new [`Error::InvalidState`] error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
