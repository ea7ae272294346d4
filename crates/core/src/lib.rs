//! Core types for lifecycle hook reconciliation.
//!
//! - **Hooks**: the [`Hook`] value and its enums, limits, and validation
//! - **Conditions**: status conditions and the [`StatusReporter`] sink
//! - **Objects**: machine pool control objects and the [`ObjectStore`] seam
//! - **Errors**: the shared [`Error`] taxonomy

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod condition;
pub mod error;
pub mod hook;
pub mod object;

pub use condition::{
    reasons, Condition, ConditionStatus, Conditions, Severity, StatusReporter,
    LIFECYCLE_HOOK_EXISTS, LIFECYCLE_HOOK_READY,
};
pub use error::{Error, ErrorKind, Result};
pub use hook::{
    DefaultResult, HeartbeatTimeout, Hook, LifecycleTransition, DEFAULT_HEARTBEAT_TIMEOUT,
    MAX_HEARTBEAT_TIMEOUT, MAX_NAME_LEN, MAX_NOTIFICATION_METADATA_LEN, MIN_HEARTBEAT_TIMEOUT,
};
pub use object::{
    AwsMachinePool, AwsManagedMachinePool, InMemoryObjectStore, MachinePool, MachinePoolStatus,
    ObjectKey, ObjectMeta, ObjectStore, PoolSpec,
};
