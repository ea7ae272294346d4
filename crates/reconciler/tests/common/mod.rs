//! Shared fixtures for reconciler integration tests.

#![allow(dead_code)]

use lifehook_core::{
    AwsMachinePool, Hook, InMemoryObjectStore, LifecycleTransition, MachinePool,
};
use lifehook_reconciler::{
    AutoScalingHookGateway, HookScope, InMemoryScalingGroupApi, ScopeParams, WireHook,
};
use tracing_subscriber::EnvFilter;

pub const GROUP: &str = "workers";

pub type Gateway = AutoScalingHookGateway<InMemoryScalingGroupApi>;

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

pub fn launching(name: &str) -> Hook {
    Hook::new(name, LifecycleTransition::InstanceLaunching)
}

pub fn terminating(name: &str) -> Hook {
    Hook::new(name, LifecycleTransition::InstanceTerminating)
}

pub fn scope(hooks: Vec<Hook>) -> Result<HookScope, lifehook_core::Error> {
    HookScope::new(
        ScopeParams::new()
            .store(InMemoryObjectStore::new_arc())
            .machine_pool(MachinePool::new("default", "mp-0"))
            .aws_machine_pool(AwsMachinePool::new("default", GROUP, hooks)),
    )
}

/// A gateway over a fresh in-memory API whose group already holds `existing`.
pub async fn gateway(existing: &[Hook]) -> Gateway {
    let api = InMemoryScalingGroupApi::new();
    api.add_group(GROUP).await;
    for hook in existing {
        api.seed_hook(GROUP, WireHook::from(hook)).await;
    }
    AutoScalingHookGateway::new(api)
}
