//! Validation error types.

/// Kinds of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ValidationErrorKind {
    /// Arm duration must be strictly positive
    #[display("Arm duration must be positive, got {} seconds", _0)]
    NonPositiveDuration(i64),
    /// Schedule time is at or before the current time
    #[display("Cannot schedule in the past: {} is not after {}", when, now)]
    PastScheduleTime {
        /// Requested run time (RFC 3339)
        when: String,
        /// Current time at validation (RFC 3339)
        now: String,
    },
    /// A required field was empty
    #[display("Field must not be empty: {}", _0)]
    EmptyField(String),
}

/// Validation error with location tracking.
///
/// # Examples
///
/// ```
/// use vigil_error::{ValidationError, ValidationErrorKind};
///
/// let err = ValidationError::new(ValidationErrorKind::NonPositiveDuration(0));
/// assert!(format!("{}", err).contains("must be positive"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    /// The kind of error that occurred
    pub kind: ValidationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new validation error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
