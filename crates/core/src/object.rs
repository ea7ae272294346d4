//! Control objects and the store that holds them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::condition::{Condition, Conditions, StatusReporter};
use crate::error::{Error, Result};
use crate::hook::Hook;

/// Namespaced reference to a control object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    /// Create a new key.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Object metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    /// Bumped by the store on every write; used for optimistic concurrency.
    #[serde(default)]
    pub resource_version: u64,
}

impl ObjectMeta {
    /// Create metadata for a new object.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            resource_version: 0,
        }
    }

    /// The key addressing this object.
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(&self.namespace, &self.name)
    }
}

/// Status of a machine pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachinePoolStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

/// Generic machine pool owning the infrastructure pool; carries the conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachinePool {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: MachinePoolStatus,
}

impl MachinePool {
    /// Create a machine pool with empty status.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            status: MachinePoolStatus::default(),
        }
    }

    /// Conditions reported on this pool.
    pub const fn conditions(&self) -> &Conditions {
        &self.status.conditions
    }
}

impl StatusReporter for MachinePool {
    fn set_condition(&mut self, condition: Condition) {
        self.status.conditions.set(condition);
    }
}

/// Spec shared by both infrastructure pool variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSpec {
    #[serde(default, rename = "lifecycleHooks")]
    pub lifecycle_hooks: Vec<Hook>,
}

/// Self-managed infrastructure pool backed by a scaling group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsMachinePool {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PoolSpec,
}

impl AwsMachinePool {
    /// Create a pool with the given hooks.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, hooks: Vec<Hook>) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            spec: PoolSpec {
                lifecycle_hooks: hooks,
            },
        }
    }
}

/// Provider-managed infrastructure pool backed by a scaling group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsManagedMachinePool {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PoolSpec,
}

impl AwsManagedMachinePool {
    /// Create a pool with the given hooks.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, hooks: Vec<Hook>) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            spec: PoolSpec {
                lifecycle_hooks: hooks,
            },
        }
    }
}

/// Trait for control object storage backends.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read a machine pool by key.
    async fn get_machine_pool(&self, key: &ObjectKey) -> Result<MachinePool>;

    /// Write the status of a machine pool.
    ///
    /// The write is rejected unless `pool.metadata.resource_version` matches
    /// the stored version. Returns the stored object with its new version.
    async fn update_machine_pool_status(&self, pool: &MachinePool) -> Result<MachinePool>;
}

/// In-memory object store for testing and embedding.
#[derive(Default)]
pub struct InMemoryObjectStore {
    pools: RwLock<HashMap<ObjectKey, MachinePool>>,
}

impl InMemoryObjectStore {
    /// Create a new in-memory object store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new in-memory object store wrapped in an Arc.
    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Insert or overwrite a machine pool, returning it with its stored version.
    pub async fn insert(&self, mut pool: MachinePool) -> MachinePool {
        let mut pools = self.pools.write().await;
        let key = pool.metadata.key();
        pool.metadata.resource_version = pools
            .get(&key)
            .map_or(1, |p| p.metadata.resource_version.saturating_add(1));
        pools.insert(key, pool.clone());
        pool
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_machine_pool(&self, key: &ObjectKey) -> Result<MachinePool> {
        let pools = self.pools.read().await;
        pools
            .get(key)
            .cloned()
            .ok_or_else(|| Error::object_not_found(key.to_string()))
    }

    async fn update_machine_pool_status(&self, pool: &MachinePool) -> Result<MachinePool> {
        let key = pool.metadata.key();
        let mut pools = self.pools.write().await;
        let stored = pools
            .get_mut(&key)
            .ok_or_else(|| Error::object_not_found(key.to_string()))?;

        if stored.metadata.resource_version != pool.metadata.resource_version {
            return Err(Error::conflict(
                key.to_string(),
                pool.metadata.resource_version,
                stored.metadata.resource_version,
            ));
        }

        stored.status = pool.status.clone();
        stored.metadata.resource_version = stored.metadata.resource_version.saturating_add(1);
        tracing::debug!(
            object = %key,
            resource_version = stored.metadata.resource_version,
            "Machine pool status updated"
        );
        Ok(stored.clone())
    }
}
