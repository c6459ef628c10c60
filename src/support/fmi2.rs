//! Binding to FMI 2.0 model-exchange units.
//!
//! An FMU ships a precompiled shared library exporting the `fmi2*` C API.
//! This module loads that library, holds its entry points in an owned
//! capability table, and drives one component through the protocol's
//! lifecycle:
//!
//! ```text
//! Unloaded -> Loaded -> Instantiated -> ExperimentConfigured
//!          -> Initializing -> ContinuousTime -> Released
//! ```
//!
//! - [`Fmi2Library`]: function pointers resolved with [`libloading`].
//! - [`Fmi2Api`]: the capability table trait, one method per native call.
//! - [`Instance`]: owns the component handle and enforces the lifecycle.
//! - [`ModelLocation`] / [`Platform`]: the FMU directory layout.
//!
//! Calls made out of lifecycle order are rejected before reaching the unit.
//! Any status other than `fmi2OK` during a lifecycle transition is fatal.

mod api;
mod error;
mod instance;
mod library;
mod lifecycle;
mod platform;
mod status;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{
    CallbackFunctions, Component, ExperimentArgs, Fmi2Api, InstantiateArgs, UnitKind,
    ValueReference,
};
pub use error::Fmi2Error;
pub use instance::Instance;
pub use library::Fmi2Library;
pub use lifecycle::LifecycleState;
pub use platform::{ModelLocation, Os, Platform, PointerWidth};
pub use status::Status;
