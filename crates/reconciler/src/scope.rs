//! Desired-state accessor for one machine pool.

use std::fmt;
use std::sync::Arc;

use lifehook_core::{
    AwsMachinePool, AwsManagedMachinePool, Error, Hook, MachinePool, ObjectKey, ObjectStore,
    Result,
};
use tracing::debug;

use crate::types::DesiredSet;

/// Inputs to [`HookScope::new`].
#[derive(Default)]
pub struct ScopeParams {
    pub store: Option<Arc<dyn ObjectStore>>,
    pub machine_pool: Option<MachinePool>,
    pub aws_machine_pool: Option<AwsMachinePool>,
    pub aws_managed_machine_pool: Option<AwsManagedMachinePool>,
}

impl ScopeParams {
    /// Create empty params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the object store handle.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the owning machine pool.
    #[must_use]
    pub fn machine_pool(mut self, pool: MachinePool) -> Self {
        self.machine_pool = Some(pool);
        self
    }

    /// Set the self-managed infrastructure pool.
    #[must_use]
    pub fn aws_machine_pool(mut self, pool: AwsMachinePool) -> Self {
        self.aws_machine_pool = Some(pool);
        self
    }

    /// Set the provider-managed infrastructure pool.
    #[must_use]
    pub fn aws_managed_machine_pool(mut self, pool: AwsManagedMachinePool) -> Self {
        self.aws_managed_machine_pool = Some(pool);
        self
    }
}

/// The infrastructure pool backing a scope. Exactly one is ever present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolVariant {
    Unmanaged(AwsMachinePool),
    Managed(AwsManagedMachinePool),
}

impl PoolVariant {
    fn from_params(
        unmanaged: Option<AwsMachinePool>,
        managed: Option<AwsManagedMachinePool>,
    ) -> Result<Self> {
        match (unmanaged, managed) {
            (Some(pool), None) => Ok(Self::Unmanaged(pool)),
            (None, Some(pool)) => Ok(Self::Managed(pool)),
            (None, None) => Err(Error::invalid_scope(
                "either AwsMachinePool or AwsManagedMachinePool is required",
            )),
            (Some(_), Some(_)) => Err(Error::invalid_scope(
                "AwsMachinePool and AwsManagedMachinePool cannot be set at the same time",
            )),
        }
    }

    fn into_parts(self) -> (PoolKind, String, Vec<Hook>) {
        match self {
            Self::Unmanaged(pool) => (
                PoolKind::Unmanaged,
                pool.metadata.name,
                pool.spec.lifecycle_hooks,
            ),
            Self::Managed(pool) => (
                PoolKind::Managed,
                pool.metadata.name,
                pool.spec.lifecycle_hooks,
            ),
        }
    }
}

/// Which pool variant a scope was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    Unmanaged,
    Managed,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmanaged => f.write_str("AwsMachinePool"),
            Self::Managed => f.write_str("AwsManagedMachinePool"),
        }
    }
}

/// Reconciliation target: a scaling group and the hooks it should carry.
pub struct HookScope {
    store: Arc<dyn ObjectStore>,
    machine_pool_key: ObjectKey,
    pool_kind: PoolKind,
    group_name: String,
    desired: DesiredSet,
}

impl HookScope {
    /// Build a scope from params.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScope`] when the store or machine pool is
    /// missing, when not exactly one infrastructure pool is given, or when the
    /// declared hooks are invalid or share a name.
    pub fn new(params: ScopeParams) -> Result<Self> {
        let store = params
            .store
            .ok_or_else(|| Error::invalid_scope("object store is required"))?;
        let machine_pool = params
            .machine_pool
            .ok_or_else(|| Error::invalid_scope("MachinePool is required"))?;
        let variant =
            PoolVariant::from_params(params.aws_machine_pool, params.aws_managed_machine_pool)?;

        let (pool_kind, group_name, hooks) = variant.into_parts();
        if group_name.is_empty() {
            return Err(Error::invalid_scope(format!(
                "{pool_kind} has no name to derive the scaling group from"
            )));
        }

        hooks
            .iter()
            .try_for_each(Hook::validate)
            .map_err(|e| Error::invalid_scope(e.to_string()))?;
        let desired = DesiredSet::new(hooks)?;

        debug!(
            group = %group_name,
            kind = %pool_kind,
            hooks = desired.len(),
            "Built lifecycle hook scope"
        );

        Ok(Self {
            store,
            machine_pool_key: machine_pool.metadata.key(),
            pool_kind,
            group_name,
            desired,
        })
    }

    /// Scaling group the hooks belong to.
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// Hooks declared on the pool spec.
    pub const fn desired(&self) -> &DesiredSet {
        &self.desired
    }

    /// Key of the machine pool that receives conditions.
    pub const fn machine_pool_key(&self) -> &ObjectKey {
        &self.machine_pool_key
    }

    /// Which pool variant the scope was built from.
    pub const fn pool_kind(&self) -> PoolKind {
        self.pool_kind
    }

    /// Read the current machine pool from the store.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn fetch_machine_pool(&self) -> Result<MachinePool> {
        self.store.get_machine_pool(&self.machine_pool_key).await
    }

    /// Write the machine pool's conditions back to the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the pool changed since it was read.
    pub async fn patch_status(&self, pool: &MachinePool) -> Result<MachinePool> {
        self.store.update_machine_pool_status(pool).await
    }
}

impl fmt::Debug for HookScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookScope")
            .field("machine_pool_key", &self.machine_pool_key)
            .field("pool_kind", &self.pool_kind)
            .field("group_name", &self.group_name)
            .field("desired", &self.desired)
            .finish_non_exhaustive()
    }
}
