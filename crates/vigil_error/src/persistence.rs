//! Persistence error types.

/// Kinds of persistence errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PersistenceErrorKind {
    /// Failed to create the data directory
    #[display("Failed to create data directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to append a record
    #[display("Failed to append record: {}", _0)]
    AppendFailed(String),
    /// Failed to read back stored records
    #[display("Failed to read records: {}", _0)]
    ReadFailed(String),
    /// A stored record could not be serialized or deserialized
    #[display("Record serialization failed: {}", _0)]
    Serialization(String),
}

/// Persistence error with location tracking.
///
/// A persistence failure on a ledger write aborts the in-flight transition:
/// in-memory state is only ever an optimization over the ledger, never
/// authoritative on its own.
///
/// # Examples
///
/// ```
/// use vigil_error::{PersistenceError, PersistenceErrorKind};
///
/// let err = PersistenceError::new(PersistenceErrorKind::AppendFailed("disk full".into()));
/// assert!(format!("{}", err).contains("append"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Persistence Error: {} at line {} in {}", kind, line, file)]
pub struct PersistenceError {
    /// The kind of error that occurred
    pub kind: PersistenceErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PersistenceError {
    /// Create a new persistence error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PersistenceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
