//! Remote scaling-group API seam and an in-memory implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::ApiError;
use crate::wire::WireHook;

/// Result type for remote API calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Lifecycle hook operations of the remote scaling-group API.
#[async_trait]
pub trait ScalingGroupApi: Send + Sync {
    /// Describe hooks on a group. An empty `names` slice describes all hooks.
    async fn describe_lifecycle_hooks(&self, group: &str, names: &[String])
        -> ApiResult<Vec<WireHook>>;

    /// Create or replace a hook.
    async fn put_lifecycle_hook(&self, group: &str, hook: WireHook) -> ApiResult<()>;

    /// Delete a hook by name.
    async fn delete_lifecycle_hook(&self, group: &str, name: &str) -> ApiResult<()>;
}

/// Remote operation kinds, for journaling and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    Describe,
    Put,
    Delete,
}

/// A call observed by [`InMemoryScalingGroupApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub operation: ApiOperation,
    pub group: String,
    /// Hook names the call targeted; empty for describe-all.
    pub hooks: Vec<String>,
    /// Payload of a put.
    pub payload: Option<WireHook>,
}

#[derive(Debug, Clone)]
struct FailureRule {
    operation: ApiOperation,
    hook: Option<String>,
    error: ApiError,
}

impl FailureRule {
    fn matches(&self, operation: ApiOperation, hooks: &[String]) -> bool {
        self.operation == operation
            && self
                .hook
                .as_ref()
                .is_none_or(|name| hooks.iter().any(|h| h == name))
    }
}

/// In-memory scaling-group API for testing.
///
/// Hooks are kept per group in name order. Every call is journaled before
/// failure rules are consulted, so failed attempts are observable too.
#[derive(Default)]
pub struct InMemoryScalingGroupApi {
    groups: RwLock<HashMap<String, BTreeMap<String, WireHook>>>,
    calls: RwLock<Vec<ApiCall>>,
    failures: RwLock<Vec<FailureRule>>,
    latency: Option<Duration>,
}

impl InMemoryScalingGroupApi {
    /// Create an API with no groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new API wrapped in an Arc.
    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Register an empty scaling group.
    pub async fn add_group(&self, group: impl Into<String>) {
        self.groups
            .write()
            .await
            .entry(group.into())
            .or_default();
    }

    /// Seed a hook directly, bypassing the journal.
    pub async fn seed_hook(&self, group: impl Into<String>, hook: WireHook) {
        self.groups
            .write()
            .await
            .entry(group.into())
            .or_default()
            .insert(hook.lifecycle_hook_name.clone(), hook);
    }

    /// Fail every `operation` call, or only those targeting `hook`.
    pub async fn fail_on(&self, operation: ApiOperation, hook: Option<&str>, error: ApiError) {
        self.failures.write().await.push(FailureRule {
            operation,
            hook: hook.map(str::to_string),
            error,
        });
    }

    /// Remove all failure rules.
    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Hooks currently stored on a group, in name order.
    pub async fn hooks(&self, group: &str) -> Vec<WireHook> {
        self.groups
            .read()
            .await
            .get(group)
            .map(|hooks| hooks.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Names of the hooks on a group, in name order.
    pub async fn hook_names(&self, group: &str) -> Vec<String> {
        self.groups
            .read()
            .await
            .get(group)
            .map(|hooks| hooks.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// All journaled calls.
    pub async fn calls(&self) -> Vec<ApiCall> {
        self.calls.read().await.clone()
    }

    /// Journaled calls of one kind.
    pub async fn calls_of(&self, operation: ApiOperation) -> Vec<ApiCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Forget journaled calls.
    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    async fn record(
        &self,
        operation: ApiOperation,
        group: &str,
        hooks: Vec<String>,
        payload: Option<WireHook>,
    ) -> ApiResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self
            .failures
            .read()
            .await
            .iter()
            .find(|rule| rule.matches(operation, &hooks))
            .map(|rule| rule.error.clone());

        self.calls.write().await.push(ApiCall {
            operation,
            group: group.to_string(),
            hooks,
            payload,
        });

        failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl ScalingGroupApi for InMemoryScalingGroupApi {
    async fn describe_lifecycle_hooks(
        &self,
        group: &str,
        names: &[String],
    ) -> ApiResult<Vec<WireHook>> {
        self.record(ApiOperation::Describe, group, names.to_vec(), None)
            .await?;

        let groups = self.groups.read().await;
        let hooks = groups
            .get(group)
            .ok_or_else(|| ApiError::group_not_found(group))?;

        Ok(hooks
            .values()
            .filter(|h| names.is_empty() || names.contains(&h.lifecycle_hook_name))
            .map(|h| WireHook {
                auto_scaling_group_name: Some(group.to_string()),
                ..h.clone()
            })
            .collect())
    }

    async fn put_lifecycle_hook(&self, group: &str, hook: WireHook) -> ApiResult<()> {
        self.record(
            ApiOperation::Put,
            group,
            vec![hook.lifecycle_hook_name.clone()],
            Some(hook.clone()),
        )
        .await?;

        let mut groups = self.groups.write().await;
        let hooks = groups
            .get_mut(group)
            .ok_or_else(|| ApiError::group_not_found(group))?;
        hooks.insert(hook.lifecycle_hook_name.clone(), hook);
        Ok(())
    }

    async fn delete_lifecycle_hook(&self, group: &str, name: &str) -> ApiResult<()> {
        self.record(ApiOperation::Delete, group, vec![name.to_string()], None)
            .await?;

        let mut groups = self.groups.write().await;
        let hooks = groups
            .get_mut(group)
            .ok_or_else(|| ApiError::group_not_found(group))?;
        hooks
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ApiError::hook_not_found(group, name))
    }
}
