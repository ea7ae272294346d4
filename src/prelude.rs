//! Prelude module - common imports for lifehook
//!
//! Import this module to get the types needed to run a pass:
//! ```rust
//! use lifehook::prelude::*;
//! ```

// Re-export error types
pub use lifehook_core::{Error, ErrorKind};

// Re-export domain types
pub use lifehook_core::{
    AwsMachinePool, AwsManagedMachinePool, Conditions, DefaultResult, HeartbeatTimeout, Hook,
    LifecycleTransition, MachinePool, ObjectStore, StatusReporter, LIFECYCLE_HOOK_EXISTS,
    LIFECYCLE_HOOK_READY,
};

// Re-export the reconciliation surface
pub use lifehook_reconciler::{
    AutoScalingHookGateway, HookGateway, HookScope, ReconcileResult, Reconciler,
    ReconcilerBuilder, ScalingGroupApi, ScopeParams, Settings,
};
