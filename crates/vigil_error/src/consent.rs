//! Authorization error types.

/// Error raised when a gated action is attempted while consent is denied.
///
/// Carries the topic that failed the consent gate. Denial itself is not an
/// error condition (`is_action_allowed` returns `bool`); this type exists for
/// the execution paths that must refuse to proceed.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Unauthorized Action: topic '{}' denied at line {} in {}", topic, line, file)]
pub struct UnauthorizedActionError {
    /// The topic that failed the consent gate
    pub topic: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl UnauthorizedActionError {
    /// Create a new UnauthorizedActionError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_error::UnauthorizedActionError;
    ///
    /// let err = UnauthorizedActionError::new("device");
    /// assert_eq!(err.topic, "device");
    /// ```
    #[track_caller]
    pub fn new(topic: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            topic: topic.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
