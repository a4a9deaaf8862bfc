//! Errors raised by native methods while they run

/// Result type returned by native method implementations
pub type CallResult<T> = Result<T, NativeError>;

/// Failure raised during a native method call.
///
/// The dispatch trampoline forwards every variant to the host runtime as an
/// exception; none of them are turned into a plain return value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NativeError {
    /// Type mismatch during conversion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Missing or invalid argument
    #[error("Argument error: {0}")]
    ArgumentError(String),

    /// Method panicked
    #[error("Method panicked: {0}")]
    Panic(String),

    /// Error raised by the method itself
    #[error("{0}")]
    Exception(String),
}

impl NativeError {
    /// Shorthand for a method-level exception
    pub fn exception(msg: impl Into<String>) -> Self {
        NativeError::Exception(msg.into())
    }
}

impl From<String> for NativeError {
    fn from(s: String) -> Self {
        NativeError::Exception(s)
    }
}

impl From<&str> for NativeError {
    fn from(s: &str) -> Self {
        NativeError::Exception(s.to_string())
    }
}
