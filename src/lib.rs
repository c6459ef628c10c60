//! # Twine FMU
//!
//! FMI 2.0 model-exchange units (FMUs) as differentiable models for
//! [Twine](https://github.com/isentropic-dev/twine).
//!
//! An FMU is loaded from its extracted directory, instantiated, and driven
//! into continuous-time mode once. It is then evaluated as a plain function
//! of its inputs, with a forward Jacobian and an adjoint built on the unit's
//! directional derivatives.
//!
//! ## Crate layout
//!
//! - [`models`]: [`twine_core::Model`] implementations, starting with
//!   [`models::external::fmu`].
//! - [`support`]: Supporting utilities used by models, such as the FMI 2.0
//!   binding in [`support::fmi2`].
//!
//! ## Utility code lifecycle
//!
//! Modules in [`support`] are part of the public API because they're useful,
//! but their APIs are not stable. Breaking changes may occur as needed.
//!
//! Utility code in this crate follows a natural progression as needs emerge:
//!
//! 1. **Model-specific**: Starts in a model's internal `core` module
//! 2. **Domain-specific**: If useful across models in a domain (e.g., `external`),
//!    it moves to a domain-level support module
//! 3. **Crate-level**: If useful across multiple domains or potentially useful
//!    outside this crate, it moves to [`support`]
//! 4. **Standalone**: If broadly useful and stable, it may become its own crate
//!    (and be removed from here in a future release)
//!
//! Note: Only utilities at the crate-level (in [`support`]) are part of the public API.
//! Model-specific and domain-specific utility code remains private.

pub mod models;
pub mod support;
