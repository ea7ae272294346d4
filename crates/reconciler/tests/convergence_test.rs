//! Integration tests for convergence passes.
//!
//! These tests verify that:
//! - Missing hooks are created, drifted hooks updated, orphans deleted
//! - A second pass over a converged group makes no remote mutation
//! - The first failure stops the pass before later hooks and pruning
//! - Failures are reported both as conditions and as returned errors

mod common;

use std::time::Duration;

use async_trait::async_trait;
use common::{gateway, init_tracing, launching, scope, terminating, GROUP};
use lifehook_core::{
    reasons, ConditionStatus, Conditions, Error, HeartbeatTimeout, Hook, LIFECYCLE_HOOK_EXISTS,
    LIFECYCLE_HOOK_READY,
};
use lifehook_reconciler::{
    ApiError, ApiOperation, AutoScalingHookGateway, GatewayConfig, HookAction, HookGateway,
    InMemoryScalingGroupApi, LookupStrategy, ObservedSet, Reconciler, ReconcilerBuilder,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// # GIVEN
/// One desired launching hook and an empty group
///
/// # WHEN
/// A pass runs
///
/// # THEN
/// Exactly one create, no updates or deletes, condition True
#[tokio::test]
async fn scenario_a_creates_missing_hook() -> TestResult {
    init_tracing();
    let gateway = gateway(&[]).await;
    let mut conditions = Conditions::new();

    let result = Reconciler::default()
        .reconcile(&scope(vec![launching("a")])?, &gateway, &mut conditions)
        .await?;

    let puts = gateway.api().calls_of(ApiOperation::Put).await;
    assert_eq!(puts.len(), 1);
    assert_eq!(puts.first().map(|c| c.hooks.clone()), Some(vec!["a".to_string()]));
    assert!(gateway.api().calls_of(ApiOperation::Delete).await.is_empty());
    assert_eq!(result.count(HookAction::Created), 1);
    assert_eq!(result.count(HookAction::Updated), 0);
    assert!(conditions.is_true(LIFECYCLE_HOOK_EXISTS));
    Ok(())
}

/// # GIVEN
/// Desired heartbeat 300s, existing heartbeat 600s
///
/// # WHEN
/// A pass runs
///
/// # THEN
/// One update carrying 300 seconds, nothing else
#[tokio::test]
async fn scenario_b_updates_drifted_heartbeat() -> TestResult {
    init_tracing();
    let existing = launching("a").with_heartbeat_timeout(HeartbeatTimeout::from_secs(600));
    let desired = launching("a").with_heartbeat_timeout(HeartbeatTimeout::from_secs(300));
    let gateway = gateway(&[existing]).await;
    let mut conditions = Conditions::new();

    let result = Reconciler::default()
        .reconcile(&scope(vec![desired])?, &gateway, &mut conditions)
        .await?;

    let puts = gateway.api().calls_of(ApiOperation::Put).await;
    assert_eq!(puts.len(), 1);
    assert_eq!(
        puts.first()
            .and_then(|c| c.payload.as_ref())
            .and_then(|w| w.heartbeat_timeout),
        Some(300)
    );
    assert_eq!(result.count(HookAction::Updated), 1);
    assert_eq!(result.count(HookAction::Created), 0);
    assert!(gateway.api().calls_of(ApiOperation::Delete).await.is_empty());
    Ok(())
}

/// # GIVEN
/// No desired hooks, one orphan on the group
///
/// # WHEN
/// A pass runs
///
/// # THEN
/// The orphan is deleted and nothing is created or updated
#[tokio::test]
async fn scenario_c_deletes_orphan() -> TestResult {
    init_tracing();
    let gateway = gateway(&[terminating("orphan")]).await;
    let mut conditions = Conditions::new();

    let result = Reconciler::default()
        .reconcile(&scope(vec![])?, &gateway, &mut conditions)
        .await?;

    let deletes = gateway.api().calls_of(ApiOperation::Delete).await;
    assert_eq!(deletes.len(), 1);
    assert_eq!(
        deletes.first().map(|c| c.hooks.clone()),
        Some(vec!["orphan".to_string()])
    );
    assert!(gateway.api().calls_of(ApiOperation::Put).await.is_empty());
    assert_eq!(result.count(HookAction::Deleted), 1);
    assert!(gateway.api().hook_names(GROUP).await.is_empty());
    assert!(conditions.is_true(LIFECYCLE_HOOK_EXISTS));
    Ok(())
}

/// # GIVEN
/// Desired hooks a and b on an empty group; creating a fails
///
/// # WHEN
/// A pass runs
///
/// # THEN
/// Only a is attempted, pruning never lists the group, condition False/CreationFailed
#[tokio::test]
async fn scenario_d_create_failure_stops_pass() -> TestResult {
    init_tracing();
    let gateway = gateway(&[]).await;
    gateway
        .api()
        .fail_on(ApiOperation::Put, Some("a"), ApiError::throttled("rate exceeded"))
        .await;
    let mut conditions = Conditions::new();

    let result = Reconciler::default()
        .run(&scope(vec![launching("a"), launching("b")])?, &gateway, &mut conditions)
        .await;

    let puts = gateway.api().calls_of(ApiOperation::Put).await;
    assert_eq!(puts.len(), 1);
    assert_eq!(puts.first().map(|c| c.hooks.clone()), Some(vec!["a".to_string()]));

    // Per-hook describes for "a" only; no describe-all for pruning.
    let describes = gateway.api().calls_of(ApiOperation::Describe).await;
    assert_eq!(describes.len(), 1);
    assert!(describes.iter().all(|c| !c.hooks.is_empty()));

    assert!(matches!(result.error, Some(Error::RemoteMutation { .. })));
    assert_eq!(result.count(HookAction::CreateFailed), 1);
    assert!(result.outcome("b").is_none());

    let condition = conditions.get(LIFECYCLE_HOOK_EXISTS);
    assert_eq!(condition.map(|c| c.status), Some(ConditionStatus::False));
    assert_eq!(
        condition.and_then(|c| c.reason.as_deref()),
        Some(reasons::CREATION_FAILED)
    );
    Ok(())
}

#[tokio::test]
async fn second_pass_is_a_no_op() -> TestResult {
    init_tracing();
    let desired = vec![
        launching("warm").with_heartbeat_timeout(HeartbeatTimeout::from_secs(300)),
        terminating("drain")
            .with_notification_target("arn:aws:sqs:us-east-1:123456789012:drain")
            .with_role("arn:aws:iam::123456789012:role/hooks")
            .with_notification_metadata("{\"cluster\":\"prod\"}"),
    ];
    let gateway = gateway(&[terminating("stale")]).await;
    let scope = scope(desired)?;
    let reconciler = Reconciler::default();
    let mut conditions = Conditions::new();

    let first = reconciler.reconcile(&scope, &gateway, &mut conditions).await?;
    assert!(!first.converged());

    gateway.api().clear_calls().await;
    let second = reconciler.reconcile(&scope, &gateway, &mut conditions).await?;

    assert!(second.converged());
    assert_eq!(second.count(HookAction::Unchanged), 2);
    assert!(gateway.api().calls_of(ApiOperation::Put).await.is_empty());
    assert!(gateway.api().calls_of(ApiOperation::Delete).await.is_empty());
    assert!(conditions.is_true(LIFECYCLE_HOOK_EXISTS));
    Ok(())
}

#[tokio::test]
async fn converges_to_exact_desired_names() -> TestResult {
    init_tracing();
    let gateway = gateway(&[launching("keep"), launching("old-1"), terminating("old-2")]).await;
    let mut conditions = Conditions::new();

    Reconciler::default()
        .reconcile(
            &scope(vec![launching("keep"), terminating("new")])?,
            &gateway,
            &mut conditions,
        )
        .await?;

    assert_eq!(
        gateway.api().hook_names(GROUP).await,
        vec!["keep".to_string(), "new".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn update_failure_stops_before_pruning() -> TestResult {
    init_tracing();
    let gateway = gateway(&[launching("a"), launching("orphan")]).await;
    gateway
        .api()
        .fail_on(ApiOperation::Put, Some("a"), ApiError::access_denied("denied"))
        .await;
    let mut conditions = Conditions::new();

    let result = Reconciler::default()
        .reconcile(&scope(vec![terminating("a")])?, &gateway, &mut conditions)
        .await;

    assert!(matches!(result, Err(Error::RemoteMutation { .. })));
    assert!(gateway.api().calls_of(ApiOperation::Delete).await.is_empty());
    assert_eq!(
        conditions
            .get(LIFECYCLE_HOOK_EXISTS)
            .and_then(|c| c.reason.as_deref()),
        Some(reasons::UPDATE_FAILED)
    );
    Ok(())
}

#[tokio::test]
async fn delete_failure_leaves_remaining_orphans() -> TestResult {
    init_tracing();
    let gateway = gateway(&[launching("orphan-a"), launching("orphan-b")]).await;
    gateway
        .api()
        .fail_on(ApiOperation::Delete, Some("orphan-a"), ApiError::transport("reset"))
        .await;
    let mut conditions = Conditions::new();

    let result = Reconciler::default()
        .run(&scope(vec![launching("wanted")])?, &gateway, &mut conditions)
        .await;

    assert!(matches!(result.error, Some(Error::RemoteMutation { .. })));
    assert_eq!(result.count(HookAction::Created), 1);
    assert_eq!(result.count(HookAction::DeleteFailed), 1);

    // Orphans are pruned in name order, so orphan-b is never attempted.
    assert_eq!(gateway.api().calls_of(ApiOperation::Delete).await.len(), 1);
    assert_eq!(
        gateway.api().hook_names(GROUP).await,
        vec![
            "orphan-a".to_string(),
            "orphan-b".to_string(),
            "wanted".to_string()
        ]
    );
    assert_eq!(
        conditions
            .get(LIFECYCLE_HOOK_EXISTS)
            .and_then(|c| c.reason.as_deref()),
        Some(reasons::DELETION_FAILED)
    );
    Ok(())
}

#[tokio::test]
async fn delete_of_already_absent_hook_succeeds() -> TestResult {
    init_tracing();
    let gateway = gateway(&[]).await;
    gateway.delete_hook(GROUP, "ghost").await?;
    Ok(())
}

/// Delegates to an inner gateway but cannot list the whole group.
struct ListFailingGateway(common::Gateway);

#[async_trait]
impl HookGateway for ListFailingGateway {
    async fn list_hooks(&self, group: &str) -> lifehook_core::Result<ObservedSet> {
        Err(Error::remote_query("describe lifecycle hooks", group, "connection reset"))
    }

    async fn get_hook(&self, group: &str, name: &str) -> lifehook_core::Result<Option<Hook>> {
        self.0.get_hook(group, name).await
    }

    async fn create_hook(&self, group: &str, hook: &Hook) -> lifehook_core::Result<()> {
        self.0.create_hook(group, hook).await
    }

    async fn update_hook(&self, group: &str, hook: &Hook) -> lifehook_core::Result<()> {
        self.0.update_hook(group, hook).await
    }

    async fn delete_hook(&self, group: &str, name: &str) -> lifehook_core::Result<()> {
        self.0.delete_hook(group, name).await
    }
}

#[tokio::test]
async fn list_failure_before_pruning_marks_ready_unknown() -> TestResult {
    init_tracing();
    let gateway = ListFailingGateway(gateway(&[launching("orphan")]).await);
    let mut conditions = Conditions::new();

    let result = Reconciler::default()
        .run(&scope(vec![launching("a")])?, &gateway, &mut conditions)
        .await;

    assert!(matches!(result.error, Some(Error::RemoteQuery { .. })));
    assert_eq!(result.count(HookAction::Created), 1);
    assert_eq!(result.count(HookAction::DescribeFailed), 1);
    assert_eq!(
        conditions.status(LIFECYCLE_HOOK_READY),
        Some(ConditionStatus::Unknown)
    );
    assert_eq!(conditions.get(LIFECYCLE_HOOK_EXISTS), None);
    assert!(gateway.0.api().calls_of(ApiOperation::Delete).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn snapshot_strategy_lists_once() -> TestResult {
    init_tracing();
    let gateway = gateway(&[
        launching("a").with_heartbeat_timeout(HeartbeatTimeout::from_secs(600)),
        launching("orphan"),
    ])
    .await;
    let reconciler = ReconcilerBuilder::new()
        .lookup(LookupStrategy::Snapshot)
        .build();
    let mut conditions = Conditions::new();

    let result = reconciler
        .reconcile(
            &scope(vec![
                launching("a").with_heartbeat_timeout(HeartbeatTimeout::from_secs(300)),
                launching("b"),
            ])?,
            &gateway,
            &mut conditions,
        )
        .await?;

    // One listing for the whole pass; the only named describe is the
    // existence check guarding the update of "a".
    let describes = gateway.api().calls_of(ApiOperation::Describe).await;
    assert_eq!(describes.iter().filter(|c| c.hooks.is_empty()).count(), 1);
    assert_eq!(
        describes
            .iter()
            .filter(|c| !c.hooks.is_empty())
            .map(|c| c.hooks.clone())
            .collect::<Vec<_>>(),
        vec![vec!["a".to_string()]]
    );

    assert_eq!(result.count(HookAction::Updated), 1);
    assert_eq!(result.count(HookAction::Created), 1);
    assert_eq!(result.count(HookAction::Deleted), 1);
    assert_eq!(
        gateway.api().hook_names(GROUP).await,
        vec!["a".to_string(), "b".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn snapshot_list_failure_makes_no_mutation() -> TestResult {
    init_tracing();
    let gateway = gateway(&[]).await;
    gateway
        .api()
        .fail_on(ApiOperation::Describe, None, ApiError::access_denied("expired token"))
        .await;
    let reconciler = ReconcilerBuilder::new()
        .lookup(LookupStrategy::Snapshot)
        .build();
    let mut conditions = Conditions::new();

    let result = reconciler
        .reconcile(&scope(vec![launching("a")])?, &gateway, &mut conditions)
        .await;

    assert!(matches!(result, Err(Error::RemoteQuery { .. })));
    assert!(gateway.api().calls_of(ApiOperation::Put).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn call_timeout_aborts_pass() -> TestResult {
    init_tracing();
    let api = InMemoryScalingGroupApi::new().with_latency(Duration::from_millis(200));
    api.add_group(GROUP).await;
    let gateway = AutoScalingHookGateway::with_config(
        api,
        GatewayConfig::default().call_timeout(Duration::from_millis(20)),
    );
    let mut conditions = Conditions::new();

    let result = Reconciler::default()
        .reconcile(&scope(vec![launching("a")])?, &gateway, &mut conditions)
        .await;

    assert!(matches!(result, Err(Error::RemoteQuery { ref reason, .. }) if reason.contains("timed out")));
    assert_eq!(
        conditions.status(LIFECYCLE_HOOK_READY),
        Some(ConditionStatus::Unknown)
    );
    Ok(())
}

#[tokio::test]
async fn recovers_on_next_pass_after_failure() -> TestResult {
    init_tracing();
    let gateway = gateway(&[]).await;
    gateway
        .api()
        .fail_on(ApiOperation::Put, None, ApiError::throttled("rate exceeded"))
        .await;
    let scope = scope(vec![launching("a"), launching("b")])?;
    let reconciler = Reconciler::default();
    let mut conditions = Conditions::new();

    assert!(reconciler.reconcile(&scope, &gateway, &mut conditions).await.is_err());
    assert_eq!(
        conditions.status(LIFECYCLE_HOOK_EXISTS),
        Some(ConditionStatus::False)
    );

    gateway.api().clear_failures().await;
    let result = reconciler.reconcile(&scope, &gateway, &mut conditions).await?;

    assert_eq!(result.count(HookAction::Created), 2);
    assert!(conditions.is_true(LIFECYCLE_HOOK_EXISTS));
    assert!(conditions.is_true(LIFECYCLE_HOOK_READY));
    Ok(())
}
