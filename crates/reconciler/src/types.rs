//! Core types for the reconciler.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use lifehook_core::{Error, Hook, Result};

/// Desired hooks declared on the pool spec.
///
/// Order is preserved for processing but carries no meaning; names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredSet {
    hooks: Vec<Hook>,
}

impl DesiredSet {
    /// Build a desired set, rejecting duplicate names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScope`] naming every duplicated hook.
    pub fn new(hooks: Vec<Hook>) -> Result<Self> {
        let duplicates = hooks.iter().map(|h| h.name.as_str()).duplicates().join(", ");
        if duplicates.is_empty() {
            Ok(Self { hooks })
        } else {
            Err(Error::invalid_scope(format!(
                "duplicate lifecycle hook names: {duplicates}"
            )))
        }
    }

    /// Create an empty desired set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Iterate hooks in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Hook> {
        self.hooks.iter()
    }

    /// Look up a hook by name.
    pub fn get(&self, name: &str) -> Option<&Hook> {
        self.hooks.iter().find(|h| h.name == name)
    }

    /// Whether a hook with this name is desired.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Declared names, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name.as_str()).collect_vec()
    }

    /// Get the number of hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Check if the desired set is empty.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// Hooks currently registered on the remote scaling group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedSet {
    hooks: HashMap<String, Hook>,
}

impl ObservedSet {
    /// Create an empty observed set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a hook by name.
    pub fn get(&self, name: &str) -> Option<&Hook> {
        self.hooks.get(name)
    }

    /// Hooks that exist remotely but are not desired, sorted by name.
    pub fn orphans<'a>(&'a self, desired: &DesiredSet) -> Vec<&'a Hook> {
        self.hooks
            .values()
            .filter(|h| !desired.contains(&h.name))
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .collect_vec()
    }

    /// Observed names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.hooks.keys().map(String::as_str).sorted().collect_vec()
    }

    /// Get the number of hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Check if the observed set is empty.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl FromIterator<Hook> for ObservedSet {
    fn from_iter<I: IntoIterator<Item = Hook>>(iter: I) -> Self {
        Self {
            hooks: iter.into_iter().map(|h| (h.name.clone(), h)).collect(),
        }
    }
}

/// What happened to a single hook during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookAction {
    Created,
    Updated,
    Unchanged,
    Deleted,
    CreateFailed,
    UpdateFailed,
    DeleteFailed,
    DescribeFailed,
}

impl HookAction {
    /// Whether the action changed remote state.
    pub const fn is_mutation(self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::Deleted)
    }

    /// Whether the action failed.
    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::CreateFailed | Self::UpdateFailed | Self::DeleteFailed | Self::DescribeFailed
        )
    }
}

impl fmt::Display for HookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Deleted => "deleted",
            Self::CreateFailed => "create-failed",
            Self::UpdateFailed => "update-failed",
            Self::DeleteFailed => "delete-failed",
            Self::DescribeFailed => "describe-failed",
        };
        f.write_str(label)
    }
}

/// Per-hook outcome of a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOutcome {
    pub hook: String,
    pub action: HookAction,
    pub error: Option<Error>,
}

impl HookOutcome {
    /// A successful outcome.
    pub fn succeeded(hook: impl Into<String>, action: HookAction) -> Self {
        Self {
            hook: hook.into(),
            action,
            error: None,
        }
    }

    /// A failed outcome.
    pub fn failed(hook: impl Into<String>, action: HookAction, error: Error) -> Self {
        Self {
            hook: hook.into(),
            action,
            error: Some(error),
        }
    }
}

/// Result of one convergence pass.
///
/// Transient: only the conditions derived from it outlive the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileResult {
    /// Scaling group the pass ran against.
    pub group: String,
    /// Outcomes in the order they happened.
    pub outcomes: Vec<HookOutcome>,
    /// Number of hooks in the desired set.
    pub desired_count: usize,
    /// Error that aborted the pass, if any.
    pub error: Option<Error>,
}

impl ReconcileResult {
    /// Create a new reconcile result.
    pub fn new(
        group: impl Into<String>,
        outcomes: Vec<HookOutcome>,
        desired_count: usize,
        error: Option<Error>,
    ) -> Self {
        Self {
            group: group.into(),
            outcomes,
            desired_count,
            error,
        }
    }

    /// Check if the pass completed without error.
    pub const fn all_succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Whether the pass found nothing to change.
    pub fn converged(&self) -> bool {
        self.all_succeeded() && !self.outcomes.iter().any(|o| o.action.is_mutation())
    }

    /// Number of outcomes with the given action.
    pub fn count(&self, action: HookAction) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }

    /// Outcome recorded for a hook, if any.
    pub fn outcome(&self, hook: &str) -> Option<&HookOutcome> {
        self.outcomes.iter().find(|o| o.hook == hook)
    }

    /// Turn an aborted pass into its error.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the pass.
    pub fn into_result(self) -> Result<Self> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use lifehook_core::LifecycleTransition;

    fn hook(name: &str) -> Hook {
        Hook::new(name, LifecycleTransition::InstanceLaunching)
    }

    #[test]
    fn test_desired_set_rejects_duplicates() {
        let result = DesiredSet::new(vec![hook("a"), hook("b"), hook("a")]);
        assert!(matches!(result, Err(Error::InvalidScope { ref reason }) if reason.contains('a')));
    }

    #[test]
    fn test_desired_set_lookup() {
        let desired = DesiredSet::new(vec![hook("b"), hook("a")]).unwrap();
        assert_eq!(desired.len(), 2);
        assert!(desired.contains("a"));
        assert!(!desired.contains("c"));
        assert_eq!(desired.names(), vec!["b", "a"]);
    }

    #[test]
    fn test_orphans_are_sorted_and_exclude_desired() {
        let observed: ObservedSet = [hook("z"), hook("a"), hook("m")].into_iter().collect();
        let desired = DesiredSet::new(vec![hook("m")]).unwrap();

        let orphans = observed
            .orphans(&desired)
            .into_iter()
            .map(|h| h.name.as_str())
            .collect_vec();
        assert_eq!(orphans, vec!["a", "z"]);
    }

    #[test]
    fn test_result_converged_only_without_mutations() {
        let quiet = ReconcileResult::new(
            "workers",
            vec![HookOutcome::succeeded("a", HookAction::Unchanged)],
            1,
            None,
        );
        assert!(quiet.converged());

        let busy = ReconcileResult::new(
            "workers",
            vec![HookOutcome::succeeded("a", HookAction::Created)],
            1,
            None,
        );
        assert!(!busy.converged());
        assert!(busy.all_succeeded());
        assert_eq!(busy.count(HookAction::Created), 1);
    }

    #[test]
    fn test_into_result_surfaces_error() {
        let err = Error::remote_mutation("create", "workers", "a", "boom");
        let result = ReconcileResult::new(
            "workers",
            vec![HookOutcome::failed("a", HookAction::CreateFailed, err.clone())],
            2,
            Some(err.clone()),
        );
        assert_eq!(result.into_result(), Err(err));
    }
}
