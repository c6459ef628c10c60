use std::{ffi::NulError, path::PathBuf};

use thiserror::Error;

use super::{LifecycleState, Status};

/// Errors raised while loading, instantiating, or initializing an FMU.
///
/// All of these are fatal: the unit cannot be used after any of them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Fmi2Error {
    /// The shared library could not be opened.
    #[error("failed to load FMU binary {}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// A required FMI 2.0 symbol is not exported by the library.
    #[error("cannot retrieve '{name}'")]
    SymbolResolution {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },

    /// `fmi2Instantiate` returned a null component.
    #[error("fmi2Instantiate failed")]
    Instantiation,

    /// A lifecycle call answered with something other than `fmi2OK`.
    #[error("{operation} failed: {status}")]
    Protocol {
        operation: &'static str,
        status: Status,
    },

    /// A lifecycle call was attempted from the wrong state.
    ///
    /// Detected before any native call is made.
    #[error("{operation} is not allowed in state {state:?}")]
    OutOfOrder {
        operation: &'static str,
        state: LifecycleState,
    },

    /// A string passed to the unit contains an interior nul byte.
    #[error("string passed to the FMU contains a nul byte")]
    InvalidString(#[from] NulError),
}
