//! Strictness modes for description validation.
//!
//! Modeled as a small closed enumeration rather than a class hierarchy:
//! validation functions take a [`Strictness`] as a parameter and branch on
//! it, instead of description types subclassing one another.

/// Controls how strictly [`crate::Variable`] and [`crate::DatasetDescription`]
/// validate their fields at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strictness {
    /// Enforce only the structural limits required for SAS to read the file
    /// back (name patterns, length ranges, variable counts). This is what
    /// the reader uses internally: it must accept any well-formed file a
    /// conforming writer could have produced, even one the current writer
    /// would refuse to emit.
    Basic,

    /// Everything [`Strictness::Basic`] enforces, plus ASCII-only type,
    /// label, and character values, and a 200-byte cap on CHARACTER length.
    /// This is the default strictness for the public write-side
    /// constructors, matching FDA electronic-submission conventions.
    #[default]
    FdaSubmission,
}

impl Strictness {
    /// Whether this mode enforces the FDA-submission-only rules (ASCII
    /// checks, 200-byte CHARACTER cap).
    #[must_use]
    pub fn is_fda(self) -> bool {
        matches!(self, Self::FdaSubmission)
    }
}
