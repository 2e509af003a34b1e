//! Top-level error wrapper types.

use crate::{
    ChannelError, ConfigError, DuplicateTaskError, PersistenceError, TaskError,
    UnauthorizedActionError, UnknownCommandError, ValidationError,
};

/// This is the foundation error enum for the Vigil workspace.
///
/// # Examples
///
/// ```
/// use vigil_error::{VigilError, ValidationError, ValidationErrorKind};
///
/// let validation = ValidationError::new(ValidationErrorKind::NonPositiveDuration(-5));
/// let err: VigilError = validation.into();
/// assert!(format!("{}", err).contains("Validation"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum VigilErrorKind {
    /// Input validation error
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Gated action attempted while denied
    #[from(UnauthorizedActionError)]
    Unauthorized(UnauthorizedActionError),
    /// Unrecognized command intent
    #[from(UnknownCommandError)]
    UnknownCommand(UnknownCommandError),
    /// Ledger, event, or task store failure
    #[from(PersistenceError)]
    Persistence(PersistenceError),
    /// Idempotency key collision
    #[from(DuplicateTaskError)]
    DuplicateTask(DuplicateTaskError),
    /// Task execution failure
    #[from(TaskError)]
    Task(TaskError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Adapter/channel error
    #[from(ChannelError)]
    Channel(ChannelError),
}

/// Vigil error with kind discrimination.
///
/// # Examples
///
/// ```
/// use vigil_error::{VigilResult, ConfigError};
///
/// fn might_fail() -> VigilResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Vigil Error: {}", _0)]
pub struct VigilError(Box<VigilErrorKind>);

impl VigilError {
    /// Create a new error from a kind.
    pub fn new(kind: VigilErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &VigilErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to VigilErrorKind
impl<T> From<T> for VigilError
where
    T: Into<VigilErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Vigil operations.
pub type VigilResult<T> = std::result::Result<T, VigilError>;
