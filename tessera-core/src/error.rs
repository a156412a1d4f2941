//! Failure classification shared by every error type in the crate.

use std::fmt;

/// Broad category of a failure.
///
/// Each concrete error exposes a `kind()` accessor so callers can report and
/// group failures without matching on every variant. Whether a failure ends
/// the store depends on the variant, not the kind; see
/// [`crate::StoreError::is_fatal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The backing store could not be opened or queried.
    StoreUnavailable,
    /// A query failed to compile against the store schema, for example
    /// because a table is absent.
    QueryPrepare,
    /// A required metadata entry does not exist.
    MetadataMissing,
    /// A metadata value did not decompose into four numeric fields.
    BoundsParse,
    /// Tile bytes were not a recognisable image.
    Decode,
    /// The graphics device refused a resource-creation call.
    GpuResource,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::StoreUnavailable => "store unavailable",
            Self::QueryPrepare => "query prepare error",
            Self::MetadataMissing => "metadata missing",
            Self::BoundsParse => "bounds parse error",
            Self::Decode => "decode error",
            Self::GpuResource => "gpu resource error",
        };
        f.write_str(label)
    }
}
