//! Core error types for lifehook operations.
//!
//! All errors are explicit, typed, and recoverable - no panics allowed.

use thiserror::Error;

/// Result type alias for lifehook operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lifehook operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // Reconciliation target errors
    #[error("invalid reconciliation scope: {reason}")]
    InvalidScope { reason: String },

    // Remote read path
    #[error("failed to {operation} for scaling group '{group}': {reason}")]
    RemoteQuery {
        operation: String,
        group: String,
        reason: String,
    },

    // Remote write path
    #[error("failed to {operation} lifecycle hook '{hook}' for scaling group '{group}': {reason}")]
    RemoteMutation {
        operation: String,
        group: String,
        hook: String,
        reason: String,
    },

    // Domain validation
    #[error("invalid lifecycle hook '{name}': {reason}")]
    InvalidHook { name: String, reason: String },

    #[error("invalid value for {field}: '{value}'")]
    InvalidValue { field: String, value: String },

    // Object store
    #[error("object '{key}' not found")]
    ObjectNotFound { key: String },

    #[error("conflict updating '{key}': expected resource version {expected}, found {actual}")]
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    // Configuration
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Broad error families used for condition reporting and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or ambiguous reconciliation target.
    InvalidScope,
    /// Describe/list/get against the remote API failed.
    RemoteQuery,
    /// Create/update/delete against the remote API failed.
    RemoteMutation,
    /// Reading or writing the control object failed.
    Store,
    /// Settings could not be parsed.
    Config,
}

impl Error {
    /// Create an invalid scope error.
    pub fn invalid_scope(reason: impl Into<String>) -> Self {
        Self::InvalidScope {
            reason: reason.into(),
        }
    }

    /// Create a remote query error.
    pub fn remote_query(
        operation: impl Into<String>,
        group: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::RemoteQuery {
            operation: operation.into(),
            group: group.into(),
            reason: reason.into(),
        }
    }

    /// Create a remote mutation error.
    pub fn remote_mutation(
        operation: impl Into<String>,
        group: impl Into<String>,
        hook: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::RemoteMutation {
            operation: operation.into(),
            group: group.into(),
            hook: hook.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid hook error.
    pub fn invalid_hook(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHook {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an object not found error.
    pub fn object_not_found(key: impl Into<String>) -> Self {
        Self::ObjectNotFound { key: key.into() }
    }

    /// Create a resource version conflict error.
    pub fn conflict(key: impl Into<String>, expected: u64, actual: u64) -> Self {
        Self::Conflict {
            key: key.into(),
            expected,
            actual,
        }
    }

    /// Create an invalid config error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidScope { .. } | Self::InvalidHook { .. } | Self::InvalidValue { .. } => {
                ErrorKind::InvalidScope
            }
            Self::RemoteQuery { .. } => ErrorKind::RemoteQuery,
            Self::RemoteMutation { .. } => ErrorKind::RemoteMutation,
            Self::ObjectNotFound { .. } | Self::Conflict { .. } => ErrorKind::Store,
            Self::InvalidConfig { .. } => ErrorKind::Config,
        }
    }

    /// Whether re-running the pass later can succeed without operator action.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RemoteQuery { .. } | Self::RemoteMutation { .. } | Self::Conflict { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_mutation_display() {
        let err = Error::remote_mutation("create", "pool-a", "drain", "throttled");
        let text = err.to_string();
        assert!(text.contains("create"));
        assert!(text.contains("drain"));
        assert!(text.contains("pool-a"));
        assert!(text.contains("throttled"));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::invalid_scope("x").kind(), ErrorKind::InvalidScope);
        assert_eq!(Error::invalid_hook("h", "x").kind(), ErrorKind::InvalidScope);
        assert_eq!(
            Error::remote_query("describe lifecycle hooks", "g", "x").kind(),
            ErrorKind::RemoteQuery
        );
        assert_eq!(
            Error::remote_mutation("delete", "g", "h", "x").kind(),
            ErrorKind::RemoteMutation
        );
        assert_eq!(Error::conflict("ns/p", 1, 2).kind(), ErrorKind::Store);
        assert_eq!(Error::invalid_config("x").kind(), ErrorKind::Config);
    }

    #[test]
    fn test_only_remote_and_conflict_are_retryable() {
        assert!(Error::remote_query("list", "g", "x").is_retryable());
        assert!(Error::remote_mutation("update", "g", "h", "x").is_retryable());
        assert!(Error::conflict("ns/p", 3, 4).is_retryable());
        assert!(!Error::invalid_scope("both pools set").is_retryable());
        assert!(!Error::object_not_found("ns/p").is_retryable());
    }
}
