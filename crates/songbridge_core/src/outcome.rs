use std::error::Error;
use std::fmt;

/// Outcome of a flow step or compound flow.
///
/// Every operation in the resilience layer returns this instead of raising:
/// expected failures (element missing after retries, content mismatch, absent
/// session file) travel the `Err` branch, and panics are reserved for
/// programmer errors.
pub type FlowResult<T> = Result<T, FlowError>;

/// A failed flow outcome: a human-readable message plus the root cause,
/// carried unchanged as outer flows add their own context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowError {
    message: String,
    cause: Option<String>,
}

impl FlowError {
    /// Creates a failure with a message and no distinct root cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a failure that wraps an underlying error without rewriting it.
    pub fn caused_by(message: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    /// The step-level message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The deepest recorded cause, falling back to the message itself.
    pub fn root_cause(&self) -> &str {
        self.cause.as_deref().unwrap_or(&self.message)
    }

    /// Replaces the message while keeping the original root cause.
    ///
    /// Used by outer flows that describe which step failed; the cause chain
    /// below stays intact.
    pub fn with_context(self, message: impl Into<String>) -> Self {
        let cause = self.cause.unwrap_or(self.message);
        Self {
            message: message.into(),
            cause: Some(cause),
        }
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) if cause != &self.message => {
                write!(f, "{}: {}", self.message, cause)
            }
            _ => write!(f, "{}", self.message),
        }
    }
}

impl Error for FlowError {}
