//! K8s-style reconciliation of lifecycle hooks on a remote scaling group.
//!
//! This crate keeps the hooks registered on a scaling group in line with the
//! hooks declared on a machine pool:
//!
//! - **Desired State**: [`HookScope`] extracts the group name and declared hooks
//! - **Actual State**: [`HookGateway`] lists and describes the remote hooks
//! - **Diff**: each desired hook is created, updated, or left alone
//! - **Prune**: remote hooks that are no longer declared are deleted
//!
//! Every pass is level-triggered and stateless. The first failure aborts the
//! pass; it is reported both as a condition and as the returned error, and
//! the caller decides when to run the next pass.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use lifehook_core::{AwsMachinePool, InMemoryObjectStore, MachinePool};
//! use lifehook_reconciler::{
//!     AutoScalingHookGateway, HookScope, InMemoryScalingGroupApi, Reconciler, ScopeParams,
//! };
//!
//! #[tokio::main]
//! async fn main() -> lifehook_core::Result<()> {
//!     let store = InMemoryObjectStore::new_arc();
//!     let pool = store.insert(MachinePool::new("default", "mp-0")).await;
//!
//!     let scope = HookScope::new(
//!         ScopeParams::new()
//!             .store(store)
//!             .machine_pool(pool)
//!             .aws_machine_pool(AwsMachinePool::new("default", "workers", vec![])),
//!     )?;
//!
//!     let api = InMemoryScalingGroupApi::new();
//!     api.add_group("workers").await;
//!     let gateway = AutoScalingHookGateway::new(api);
//!     Reconciler::default().reconcile_scope(&scope, &gateway).await?;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod reconciler;
pub mod scope;
pub mod types;
pub mod wire;

// Re-export main types
pub use api::{ApiCall, ApiOperation, ApiResult, InMemoryScalingGroupApi, ScalingGroupApi};
pub use config::{GatewayConfig, LookupStrategy, ReconcilerConfig, Settings};
pub use error::ApiError;
pub use gateway::{needs_update, AutoScalingHookGateway, HookGateway};
pub use reconciler::{Reconciler, ReconcilerBuilder};
pub use scope::{HookScope, PoolKind, PoolVariant, ScopeParams};
pub use types::{DesiredSet, HookAction, HookOutcome, ObservedSet, ReconcileResult};
pub use wire::WireHook;
