//! Registration-time errors
//!
//! Errors raised while a method is running are `classbridge_sdk::NativeError`
//! and travel to the host as exceptions. The types here cover everything that
//! can go wrong while describing and registering classes.

use crate::host::HostError;

/// Result type for registration operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Programmer misuse of the registration API.
///
/// These are configuration mistakes, not data-dependent failures, and are
/// fatal to module startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    /// `initialize` called on a class that was already initialized
    #[error("class '{0}' is already initialized")]
    AlreadyInitialized(String),

    /// Method added after the class table was built
    #[error("cannot add method '{method}' to class '{class}' after initialize")]
    AddAfterInitialize {
        /// Class name
        class: String,
        /// Method name
        method: String,
    },

    /// Class copied after its table was handed to the host
    #[error("cannot copy class '{0}' after initialize")]
    CopyAfterInitialize(String),

    /// `shutdown` called on a class that holds no registration
    #[error("class '{0}' is not registered")]
    NotRegistered(String),

    /// Method flags name more than one visibility
    #[error("method '{method}' combines several visibilities: {flags}")]
    ConflictingVisibility {
        /// Method name
        method: String,
        /// Offending flags, formatted
        flags: String,
    },

    /// Method flagged static; bridged methods always run on an instance
    #[error("method '{0}' cannot be static: bridged methods need a native instance")]
    StaticMethod(String),

    /// Class flags are both abstract and final
    #[error("class '{0}' cannot be both abstract and final")]
    AbstractFinalClass(String),

    /// A required argument follows an optional one
    #[error("required argument '{argument}' of '{method}' follows an optional argument")]
    RequiredAfterOptional {
        /// Method name
        method: String,
        /// Argument name
        argument: String,
    },

    /// Extension started more than once, or changed after startup
    #[error("extension '{0}' has already been started")]
    AlreadyStarted(String),

    /// Extension shut down before it was started
    #[error("extension '{0}' is not running")]
    NotStarted(String),
}

/// Registration error
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    /// Misuse of the registration API
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// The host refused the class declaration
    #[error("host rejected class '{class}': {source}")]
    HostRejected {
        /// Class name
        class: String,
        /// Reason reported by the host
        #[source]
        source: HostError,
    },

    /// A class, method or argument name cannot be represented in the table
    #[error("invalid name {0:?}: names must be non-empty and free of NUL bytes")]
    InvalidName(String),
}

impl BridgeError {
    /// The usage error, if this is one
    pub fn as_usage(&self) -> Option<&UsageError> {
        match self {
            BridgeError::Usage(usage) => Some(usage),
            _ => None,
        }
    }
}

/// Reject names the host table cannot carry.
pub(crate) fn validate_name(name: &str) -> BridgeResult<()> {
    if name.is_empty() || name.contains('\0') {
        return Err(BridgeError::InvalidName(name.to_string()));
    }
    Ok(())
}
