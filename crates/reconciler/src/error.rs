//! Errors reported by the remote scaling-group API.

use std::fmt;
use std::time::Duration;

/// Remote API error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No hook with that name exists on the group.
    HookNotFound { group: String, hook: String },
    /// The scaling group does not exist.
    GroupNotFound { group: String },
    /// Request rate exceeded.
    Throttled { reason: String },
    /// Credentials rejected.
    AccessDenied { reason: String },
    /// Network or protocol failure.
    Transport { reason: String },
    /// Request rejected as malformed.
    Validation { reason: String },
    /// Call exceeded its deadline.
    TimedOut { after: Duration },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HookNotFound { group, hook } => {
                write!(f, "no lifecycle hook '{hook}' found on group '{group}'")
            }
            Self::GroupNotFound { group } => {
                write!(f, "scaling group '{group}' not found")
            }
            Self::Throttled { reason } => {
                write!(f, "throttled: {reason}")
            }
            Self::AccessDenied { reason } => {
                write!(f, "access denied: {reason}")
            }
            Self::Transport { reason } => {
                write!(f, "transport error: {reason}")
            }
            Self::Validation { reason } => {
                write!(f, "validation error: {reason}")
            }
            Self::TimedOut { after } => {
                write!(f, "call timed out after {}ms", after.as_millis())
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Create a hook not found error.
    pub fn hook_not_found(group: impl Into<String>, hook: impl Into<String>) -> Self {
        Self::HookNotFound {
            group: group.into(),
            hook: hook.into(),
        }
    }

    /// Create a group not found error.
    pub fn group_not_found(group: impl Into<String>) -> Self {
        Self::GroupNotFound {
            group: group.into(),
        }
    }

    /// Create a throttled error.
    pub fn throttled(reason: impl Into<String>) -> Self {
        Self::Throttled {
            reason: reason.into(),
        }
    }

    /// Create an access denied error.
    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::AccessDenied {
            reason: reason.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Create a timeout error.
    pub const fn timed_out(after: Duration) -> Self {
        Self::TimedOut { after }
    }

    /// Whether the remote reported the hook as absent.
    pub const fn is_hook_not_found(&self) -> bool {
        matches!(self, Self::HookNotFound { .. })
    }
}
