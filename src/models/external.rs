//! Models backed by externally supplied simulation code.
//!
//! These models wrap native binaries that follow a standard co-simulation or
//! model-exchange interface, so they can take part in Twine systems next to
//! models written in Rust.

pub mod fmu;
