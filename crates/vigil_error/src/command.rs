//! Command routing error types.

/// Error for inbound text that does not match any known command phrase.
///
/// Logged and reported to the caller; never fatal, and never forwarded to
/// the consent authority as a transition.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Unknown Command: '{}' from {} at line {} in {}", raw_text, source_channel, line, file)]
pub struct UnknownCommandError {
    /// The raw text that failed to parse
    pub raw_text: String,
    /// The channel the text arrived on
    pub source_channel: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl UnknownCommandError {
    /// Create a new UnknownCommandError at the current location.
    #[track_caller]
    pub fn new(raw_text: impl Into<String>, source_channel: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            raw_text: raw_text.into(),
            source_channel: source_channel.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
