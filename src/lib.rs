//! # lifehook
//!
//! Declarative reconciliation of lifecycle hooks on remote scaling groups.
//!
//! This library re-exports the lifehook workspace crates for convenience:
//!
//! - [`lifehook_core`]: hooks, conditions, machine pool objects, errors
//! - [`lifehook_reconciler`]: scope, remote gateway, convergence engine

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub use lifehook_core;
pub use lifehook_reconciler;

pub mod prelude;
