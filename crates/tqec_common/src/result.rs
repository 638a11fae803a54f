//! Common result and error types for the optimizer.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates a broken internal invariant (a bug in the optimizer), not a
/// problem with the input lattice. Input problems are reported through
/// [`DiagnosticSink`](tqec_diagnostics) or the optimizer's own error enum.
pub type TqecResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in the optimizer, not an input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal optimizer error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
