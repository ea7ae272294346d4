//! Reconciler implementation.

use lifehook_core::{
    reasons, Error, Hook, Result, Severity, StatusReporter, LIFECYCLE_HOOK_EXISTS,
    LIFECYCLE_HOOK_READY,
};
use tracing::{debug, info, warn};

use crate::config::{LookupStrategy, ReconcilerConfig};
use crate::gateway::HookGateway;
use crate::scope::HookScope;
use crate::types::{HookAction, HookOutcome, ObservedSet, ReconcileResult};

/// K8s-style reconciler for the lifecycle hooks of one scaling group.
///
/// Holds no state between passes; every pass re-reads desired and observed
/// state and stops at the first failure.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a new reconciler.
    pub const fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Run one pass and fail if it aborted.
    ///
    /// # Errors
    ///
    /// Returns the remote error that aborted the pass. The matching condition
    /// has already been reported to `reporter`.
    pub async fn reconcile<G, R>(
        &self,
        scope: &HookScope,
        gateway: &G,
        reporter: &mut R,
    ) -> Result<ReconcileResult>
    where
        G: HookGateway + ?Sized,
        R: StatusReporter + ?Sized,
    {
        self.run(scope, gateway, reporter).await.into_result()
    }

    /// Run one pass, returning every per-hook outcome even when it aborted.
    pub async fn run<G, R>(&self, scope: &HookScope, gateway: &G, reporter: &mut R) -> ReconcileResult
    where
        G: HookGateway + ?Sized,
        R: StatusReporter + ?Sized,
    {
        let group = scope.group_name();
        info!(
            group,
            desired = scope.desired().len(),
            lookup = ?self.config.lookup,
            "Starting lifecycle hook reconciliation"
        );

        let mut outcomes = Vec::new();
        let error = self
            .converge(scope, gateway, reporter, &mut outcomes)
            .await
            .err();

        let result = ReconcileResult::new(group, outcomes, scope.desired().len(), error);

        match &result.error {
            None if result.converged() => info!(group, "Lifecycle hooks converged"),
            None => info!(
                group,
                created = result.count(HookAction::Created),
                updated = result.count(HookAction::Updated),
                deleted = result.count(HookAction::Deleted),
                "Lifecycle hook reconciliation complete"
            ),
            Some(e) => warn!(group, error = %e, "Lifecycle hook reconciliation aborted"),
        }

        result
    }

    /// Run one pass against the scope's machine pool and persist its status.
    ///
    /// Conditions are written back even when the pass fails; the pass error
    /// takes precedence over a status write error.
    ///
    /// # Errors
    ///
    /// Returns the pass error, or the store error if only the status write
    /// failed.
    pub async fn reconcile_scope<G>(&self, scope: &HookScope, gateway: &G) -> Result<ReconcileResult>
    where
        G: HookGateway + ?Sized,
    {
        let mut pool = scope.fetch_machine_pool().await?;
        let result = self.run(scope, gateway, &mut pool).await;

        let patched = scope.patch_status(&pool).await;
        if let Err(e) = &patched {
            warn!(
                object = %scope.machine_pool_key(),
                error = %e,
                "Failed to write lifecycle hook conditions"
            );
        }

        let result = result.into_result()?;
        patched.map(|_| result)
    }

    async fn converge<G, R>(
        &self,
        scope: &HookScope,
        gateway: &G,
        reporter: &mut R,
        outcomes: &mut Vec<HookOutcome>,
    ) -> Result<()>
    where
        G: HookGateway + ?Sized,
        R: StatusReporter + ?Sized,
    {
        let group = scope.group_name();
        let desired = scope.desired();

        let snapshot = match self.config.lookup {
            LookupStrategy::Snapshot => Some(observe(group, gateway, reporter, outcomes).await?),
            LookupStrategy::PerHook => None,
        };

        // Any failure here abandons the remaining hooks and skips pruning.
        for hook in desired.iter() {
            let outcome = ensure_hook(group, hook, snapshot.as_ref(), gateway, reporter).await;
            debug!(group, hook = %outcome.hook, action = %outcome.action, "Processed lifecycle hook");
            let error = outcome.error.clone();
            outcomes.push(outcome);
            if let Some(e) = error {
                return Err(e);
            }
        }

        let observed = match snapshot {
            Some(snapshot) => snapshot,
            None => observe(group, gateway, reporter, outcomes).await?,
        };

        for orphan in observed.orphans(desired) {
            info!(group, hook = %orphan.name, "Deleting lifecycle hook");
            if let Err(e) = gateway.delete_hook(group, &orphan.name).await {
                warn!(group, hook = %orphan.name, error = %e, "Failed to delete lifecycle hook");
                reporter.mark_false(
                    LIFECYCLE_HOOK_EXISTS,
                    reasons::DELETION_FAILED,
                    Severity::Error,
                    &e.to_string(),
                );
                outcomes.push(HookOutcome::failed(&orphan.name, HookAction::DeleteFailed, e.clone()));
                return Err(e);
            }
            outcomes.push(HookOutcome::succeeded(&orphan.name, HookAction::Deleted));
        }

        reporter.mark_true(LIFECYCLE_HOOK_READY);
        reporter.mark_true(LIFECYCLE_HOOK_EXISTS);
        Ok(())
    }
}

/// List the group's hooks, reporting a failure as an Unknown condition.
async fn observe<G, R>(
    group: &str,
    gateway: &G,
    reporter: &mut R,
    outcomes: &mut Vec<HookOutcome>,
) -> Result<ObservedSet>
where
    G: HookGateway + ?Sized,
    R: StatusReporter + ?Sized,
{
    gateway.list_hooks(group).await.map_err(|e| {
        report_query_failure(group, "*", &e, reporter);
        outcomes.push(HookOutcome::failed("*", HookAction::DescribeFailed, e.clone()));
        e
    })
}

/// Bring one desired hook in line, reporting any failure.
async fn ensure_hook<G, R>(
    group: &str,
    hook: &Hook,
    snapshot: Option<&ObservedSet>,
    gateway: &G,
    reporter: &mut R,
) -> HookOutcome
where
    G: HookGateway + ?Sized,
    R: StatusReporter + ?Sized,
{
    debug!(group, hook = %hook.name, "Checking for existing lifecycle hook");
    let existing = match snapshot {
        Some(observed) => observed.get(&hook.name).cloned(),
        None => match gateway.get_hook(group, &hook.name).await {
            Ok(existing) => existing,
            Err(e) => {
                report_query_failure(group, &hook.name, &e, reporter);
                return HookOutcome::failed(&hook.name, HookAction::DescribeFailed, e);
            }
        },
    };

    let Some(existing) = existing else {
        info!(group, hook = %hook.name, "Creating lifecycle hook");
        return match gateway.create_hook(group, hook).await {
            Ok(()) => HookOutcome::succeeded(&hook.name, HookAction::Created),
            Err(e) => {
                report_mutation_failure(group, &hook.name, reasons::CREATION_FAILED, &e, reporter);
                HookOutcome::failed(&hook.name, HookAction::CreateFailed, e)
            }
        };
    };

    if !gateway.needs_update(&existing, hook) {
        debug!(group, hook = %hook.name, "Lifecycle hook up to date");
        return HookOutcome::succeeded(&hook.name, HookAction::Unchanged);
    }

    info!(group, hook = %hook.name, "Updating lifecycle hook");
    match gateway.update_hook(group, hook).await {
        Ok(()) => HookOutcome::succeeded(&hook.name, HookAction::Updated),
        Err(e) => {
            report_mutation_failure(group, &hook.name, reasons::UPDATE_FAILED, &e, reporter);
            HookOutcome::failed(&hook.name, HookAction::UpdateFailed, e)
        }
    }
}

fn report_query_failure<R>(group: &str, hook: &str, error: &Error, reporter: &mut R)
where
    R: StatusReporter + ?Sized,
{
    warn!(group, hook, error = %error, "Failed to describe lifecycle hooks");
    reporter.mark_unknown(LIFECYCLE_HOOK_READY, reasons::NOT_FOUND, &error.to_string());
}

fn report_mutation_failure<R>(group: &str, hook: &str, reason: &str, error: &Error, reporter: &mut R)
where
    R: StatusReporter + ?Sized,
{
    warn!(group, hook, reason, error = %error, "Lifecycle hook mutation failed");
    reporter.mark_false(LIFECYCLE_HOOK_EXISTS, reason, Severity::Error, &error.to_string());
}

/// Builder for Reconciler.
#[derive(Debug, Clone, Default)]
pub struct ReconcilerBuilder {
    config: ReconcilerConfig,
}

impl ReconcilerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the lookup strategy.
    #[must_use]
    pub const fn lookup(mut self, lookup: LookupStrategy) -> Self {
        self.config.lookup = lookup;
        self
    }

    /// Build the reconciler.
    pub const fn build(self) -> Reconciler {
        Reconciler::new(self.config)
    }
}
