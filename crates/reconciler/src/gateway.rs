//! Remote hook gateway: domain operations over the scaling-group API.

use std::future::Future;

use async_trait::async_trait;
use lifehook_core::{Error, Hook, Result};
use tracing::debug;

use crate::api::{ApiResult, ScalingGroupApi};
use crate::config::GatewayConfig;
use crate::error::ApiError;
use crate::types::ObservedSet;
use crate::wire::WireHook;

/// Whether `existing` must be rewritten to match `desired`.
///
/// Compares default result, heartbeat timeout, transition, notification
/// target, and metadata. Absent defaults compare equal to the remote defaults.
/// The role is not compared since the remote side may normalize or omit it,
/// and the name is the join key.
pub fn needs_update(existing: &Hook, desired: &Hook) -> bool {
    existing.effective_default_result() != desired.effective_default_result()
        || existing.effective_heartbeat_timeout() != desired.effective_heartbeat_timeout()
        || existing.lifecycle_transition != desired.lifecycle_transition
        || existing.notification_target_arn != desired.notification_target_arn
        || existing.notification_metadata != desired.notification_metadata
}

/// Domain-level hook operations scoped to a scaling group.
#[async_trait]
pub trait HookGateway: Send + Sync {
    /// All hooks on the group. Zero hooks is an empty set, not an error.
    async fn list_hooks(&self, group: &str) -> Result<ObservedSet>;

    /// The hook with this name, or None if the group has no such hook.
    async fn get_hook(&self, group: &str, name: &str) -> Result<Option<Hook>>;

    /// Register a hook. Must not be called for a name that already exists.
    async fn create_hook(&self, group: &str, hook: &Hook) -> Result<()>;

    /// Replace every mutable field of an existing hook. Fails if the group
    /// has no hook with that name.
    async fn update_hook(&self, group: &str, hook: &Hook) -> Result<()>;

    /// Remove a hook. A hook that is already gone counts as removed.
    async fn delete_hook(&self, group: &str, name: &str) -> Result<()>;

    /// Whether `existing` differs from `desired` on a compared field.
    fn needs_update(&self, existing: &Hook, desired: &Hook) -> bool {
        needs_update(existing, desired)
    }
}

/// [`HookGateway`] backed by a [`ScalingGroupApi`].
pub struct AutoScalingHookGateway<A: ScalingGroupApi> {
    api: A,
    config: GatewayConfig,
}

impl<A: ScalingGroupApi> AutoScalingHookGateway<A> {
    /// Create a gateway with default configuration.
    pub fn new(api: A) -> Self {
        Self::with_config(api, GatewayConfig::default())
    }

    /// Create a gateway with the given configuration.
    pub const fn with_config(api: A, config: GatewayConfig) -> Self {
        Self { api, config }
    }

    /// The underlying API client.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// The gateway configuration.
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn call<T, F>(&self, request: F) -> ApiResult<T>
    where
        F: Future<Output = ApiResult<T>> + Send,
    {
        match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .unwrap_or(Err(ApiError::timed_out(limit))),
            None => request.await,
        }
    }

    async fn put(&self, operation: &str, group: &str, hook: &Hook) -> Result<()> {
        let wire = WireHook::from(hook);
        self.call(self.api.put_lifecycle_hook(group, wire))
            .await
            .map_err(|e| Error::remote_mutation(operation, group, &hook.name, e.to_string()))
    }
}

fn decode(group: &str, operation: &str, wire: WireHook) -> Result<Hook> {
    Hook::try_from(wire).map_err(|e| Error::remote_query(operation, group, e.to_string()))
}

#[async_trait]
impl<A: ScalingGroupApi> HookGateway for AutoScalingHookGateway<A> {
    async fn list_hooks(&self, group: &str) -> Result<ObservedSet> {
        const OPERATION: &str = "describe lifecycle hooks";

        let hooks = self
            .call(self.api.describe_lifecycle_hooks(group, &[]))
            .await
            .map_err(|e| Error::remote_query(OPERATION, group, e.to_string()))?;

        debug!(group, count = hooks.len(), "Listed lifecycle hooks");
        hooks
            .into_iter()
            .map(|wire| decode(group, OPERATION, wire))
            .collect()
    }

    async fn get_hook(&self, group: &str, name: &str) -> Result<Option<Hook>> {
        let operation = format!("describe lifecycle hook '{name}'");
        let names = [name.to_string()];

        let hooks = self
            .call(self.api.describe_lifecycle_hooks(group, &names))
            .await
            .map_err(|e| Error::remote_query(&operation, group, e.to_string()))?;

        hooks
            .into_iter()
            .find(|wire| wire.lifecycle_hook_name == name)
            .map(|wire| decode(group, &operation, wire))
            .transpose()
    }

    async fn create_hook(&self, group: &str, hook: &Hook) -> Result<()> {
        self.put("create", group, hook).await
    }

    async fn update_hook(&self, group: &str, hook: &Hook) -> Result<()> {
        // Put is create-or-replace on the wire; an update must not create.
        let names = [hook.name.clone()];
        let existing = self
            .call(self.api.describe_lifecycle_hooks(group, &names))
            .await
            .map_err(|e| Error::remote_mutation("update", group, &hook.name, e.to_string()))?;

        if !existing.iter().any(|wire| wire.lifecycle_hook_name == hook.name) {
            return Err(Error::remote_mutation(
                "update",
                group,
                &hook.name,
                "lifecycle hook not found",
            ));
        }

        self.put("update", group, hook).await
    }

    async fn delete_hook(&self, group: &str, name: &str) -> Result<()> {
        match self.call(self.api.delete_lifecycle_hook(group, name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_hook_not_found() => {
                debug!(group, hook = name, "Lifecycle hook already absent");
                Ok(())
            }
            Err(e) => Err(Error::remote_mutation("delete", group, name, e.to_string())),
        }
    }
}
