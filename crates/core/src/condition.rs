//! Status conditions reported on the owning control object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition reporting whether every desired hook is registered and current.
pub const LIFECYCLE_HOOK_EXISTS: &str = "LifecycleHookExists";

/// Condition reporting whether the remote hook set could be observed.
pub const LIFECYCLE_HOOK_READY: &str = "LifecycleHookReady";

/// Condition reasons.
pub mod reasons {
    pub const CREATION_FAILED: &str = "LifecycleHookCreationFailed";
    pub const UPDATE_FAILED: &str = "LifecycleHookUpdateFailed";
    pub const DELETION_FAILED: &str = "LifecycleHookDeletionFailed";
    pub const NOT_FOUND: &str = "LifecycleHookNotFound";
}

/// Tri-state condition status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// How bad a non-true condition is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single observation about the control object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// A condition in the True state.
    pub fn true_condition(condition_type: impl Into<String>) -> Self {
        Self {
            condition_type: condition_type.into(),
            status: ConditionStatus::True,
            severity: None,
            reason: None,
            message: None,
            last_transition_time: Utc::now(),
        }
    }

    /// A condition in the False state.
    pub fn false_condition(
        condition_type: impl Into<String>,
        reason: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            condition_type: condition_type.into(),
            status: ConditionStatus::False,
            severity: Some(severity),
            reason: Some(reason.into()),
            message: Some(message.into()),
            last_transition_time: Utc::now(),
        }
    }

    /// A condition in the Unknown state.
    pub fn unknown_condition(
        condition_type: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            condition_type: condition_type.into(),
            status: ConditionStatus::Unknown,
            severity: None,
            reason: Some(reason.into()),
            message: Some(message.into()),
            last_transition_time: Utc::now(),
        }
    }

    fn same_state(&self, other: &Self) -> bool {
        self.status == other.status
            && self.severity == other.severity
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Conditions keyed by type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conditions(Vec<Condition>);

impl Conditions {
    /// Create an empty condition list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a condition by type.
    pub fn get(&self, condition_type: &str) -> Option<&Condition> {
        self.0.iter().find(|c| c.condition_type == condition_type)
    }

    /// Status of a condition, if present.
    pub fn status(&self, condition_type: &str) -> Option<ConditionStatus> {
        self.get(condition_type).map(|c| c.status)
    }

    /// Whether the condition is present and True.
    pub fn is_true(&self, condition_type: &str) -> bool {
        self.status(condition_type) == Some(ConditionStatus::True)
    }

    /// Insert or replace the condition of the same type.
    ///
    /// Setting an identical condition is a no-op. The transition time only
    /// moves when the status changes.
    pub fn set(&mut self, mut condition: Condition) {
        match self
            .0
            .iter_mut()
            .find(|c| c.condition_type == condition.condition_type)
        {
            Some(existing) if existing.same_state(&condition) => {}
            Some(existing) => {
                if existing.status == condition.status {
                    condition.last_transition_time = existing.last_transition_time;
                }
                *existing = condition;
            }
            None => self.0.push(condition),
        }
    }

    /// Iterate over all conditions.
    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no conditions are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Sink for condition updates on a control object.
///
/// Each mark is scoped to a single condition type and idempotent.
pub trait StatusReporter {
    /// Insert or replace a condition.
    fn set_condition(&mut self, condition: Condition);

    /// Mark a condition True.
    fn mark_true(&mut self, condition_type: &str) {
        self.set_condition(Condition::true_condition(condition_type));
    }

    /// Mark a condition False.
    fn mark_false(&mut self, condition_type: &str, reason: &str, severity: Severity, message: &str) {
        self.set_condition(Condition::false_condition(
            condition_type,
            reason,
            severity,
            message,
        ));
    }

    /// Mark a condition Unknown.
    fn mark_unknown(&mut self, condition_type: &str, reason: &str, message: &str) {
        self.set_condition(Condition::unknown_condition(condition_type, reason, message));
    }
}

impl StatusReporter for Conditions {
    fn set_condition(&mut self, condition: Condition) {
        self.set(condition);
    }
}
