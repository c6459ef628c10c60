//! FMI 2.0 model-exchange units as differentiable Twine models.
//!
//! [`FmuFunction`] evaluates the unit's outputs from its inputs, with both
//! split into a differentiable and a non-differentiable partition.
//! [`FmuFunction::jacobian`] and [`FmuFunction::reverse`] borrow the function
//! and expose its forward Jacobian and its adjoint as models of their own.
//!
//! The unit is initialized once, at construction. Admissible units are
//! therefore those whose outputs are fully determined by the differentiable
//! inputs set on each call.
//!
//! Non-differentiable inputs and outputs are declared but inert: they are
//! never passed to the unit, and their outputs and adjoints are zero.
//!
//! The computational core is in the internal `core` module.

pub(crate) mod core;

mod adjoint;
mod jacobian;

#[cfg(test)]
mod test_support;

pub use self::core::{
    ConfigError, EvalError, Experiment, FmuConfig, FmuError, Partition, Sparsity, VariableMap,
};
pub use adjoint::{AdjointInput, AdjointOutput, FmuAdjoint};
pub use jacobian::FmuJacobian;

use std::{path::Path, sync::Arc};

use log::debug;
use nalgebra::DVector;
use twine_core::Model;

use crate::support::fmi2::{
    Fmi2Api, Fmi2Library, LifecycleState, ModelLocation, Platform, ValueReference,
};

use self::core::{Evaluator, check_len};

/// Inputs of an [`FmuFunction`], one vector per partition.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimalInput {
    pub xd: DVector<f64>,
    pub xn: DVector<f64>,
}

/// Outputs of an [`FmuFunction`], one vector per partition.
///
/// `yn` is always zero.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimalOutput {
    pub yd: DVector<f64>,
    pub yn: DVector<f64>,
}

/// An FMU bound as a function from its inputs to its outputs.
///
/// Evaluation is sequential: the type is `Send` but not `Sync`.
pub struct FmuFunction<A: Fmi2Api = Fmi2Library> {
    name: String,
    guid: String,
    resource_location: String,
    evaluator: Evaluator<A>,
}

impl FmuFunction {
    /// Loads the FMU extracted at `path` and initializes one instance.
    ///
    /// `id_in` and `id_out` each hold two value reference lists: the
    /// differentiable variables followed by the non-differentiable ones.
    /// The binary is looked up under `path` for the host [`Platform`].
    ///
    /// # Errors
    ///
    /// Returns [`FmuError::Config`] for malformed partitions, before the
    /// binary is loaded, and [`FmuError::Unit`] if loading, instantiation,
    /// or initialization fails.
    pub fn new(
        name: &str,
        path: impl AsRef<Path>,
        id_in: Vec<Vec<ValueReference>>,
        id_out: Vec<Vec<ValueReference>>,
        guid: &str,
        config: FmuConfig,
    ) -> Result<Self, FmuError> {
        let variables = VariableMap::new(id_in, id_out)?;
        let location = ModelLocation::new(path.as_ref(), name, Platform::host());
        let library = Fmi2Library::load(
            location.binary_path(),
            config.provides_directional_derivative,
        )?;

        Self::with_api(
            Arc::new(library),
            name,
            guid,
            &location.resource_uri(),
            variables,
            &config,
        )
    }
}

impl<A: Fmi2Api> FmuFunction<A> {
    /// Initializes one instance from an already resolved unit.
    ///
    /// # Errors
    ///
    /// Returns [`FmuError::Unit`] if instantiation or initialization fails.
    pub fn with_api(
        api: Arc<A>,
        name: &str,
        guid: &str,
        resource_location: &str,
        variables: VariableMap,
        config: &FmuConfig,
    ) -> Result<Self, FmuError> {
        debug!(
            "binding FMU {name} with {} differentiable inputs and {} differentiable outputs",
            variables.n_xd(),
            variables.n_yd()
        );
        let evaluator = Evaluator::new(api, name, guid, resource_location, variables, config)?;

        Ok(Self {
            name: name.to_owned(),
            guid: guid.to_owned(),
            resource_location: resource_location.to_owned(),
            evaluator,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// The `file:` URI of the resources directory handed to the unit.
    #[must_use]
    pub fn resource_location(&self) -> &str {
        &self.resource_location
    }

    #[must_use]
    pub fn variables(&self) -> &VariableMap {
        self.evaluator.variables()
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.evaluator.state()
    }

    /// Whether [`FmuFunction::jacobian`] and [`FmuFunction::reverse`] can be
    /// evaluated: the config enables directional derivatives and the unit
    /// exports them.
    #[must_use]
    pub fn provides_directional_derivative(&self) -> bool {
        self.evaluator.provides_directional_derivative()
    }

    /// Shape of input slot `index`: 0 is differentiable, 1 non-differentiable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PartitionIndex`] for any other index.
    pub fn sparsity_in(&self, index: usize) -> Result<Sparsity, ConfigError> {
        Ok(self.variables().sparsity_in(Partition::try_from(index)?))
    }

    /// Shape of output slot `index`: 0 is differentiable, 1 non-differentiable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PartitionIndex`] for any other index.
    pub fn sparsity_out(&self, index: usize) -> Result<Sparsity, ConfigError> {
        Ok(self.variables().sparsity_out(Partition::try_from(index)?))
    }

    /// Frees the unit ahead of drop. Later evaluations fail.
    pub fn release(&mut self) {
        self.evaluator.release();
    }

    /// The forward Jacobian of the differentiable outputs.
    ///
    /// Evaluating it fails with [`EvalError::DirectionalDerivativeUnsupported`]
    /// unless the unit provides directional derivatives.
    #[must_use]
    pub fn jacobian(&self) -> FmuJacobian<'_, A> {
        FmuJacobian::new(self)
    }

    /// The adjoint model for `n_adj` simultaneous directions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AdjointDirections`] unless `n_adj` is 1.
    pub fn reverse(&self, n_adj: usize) -> Result<FmuAdjoint<'_, A>, ConfigError> {
        if n_adj != 1 {
            return Err(ConfigError::AdjointDirections(n_adj));
        }
        Ok(FmuAdjoint::new(self))
    }
}

impl<A: Fmi2Api> Model for FmuFunction<A> {
    type Input = PrimalInput;
    type Output = PrimalOutput;
    type Error = EvalError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let variables = self.variables();
        check_len(
            "xn",
            variables.inputs(Partition::NonDifferentiable).len(),
            input.xn.len(),
        )?;

        let mut yd = DVector::zeros(variables.n_yd());
        self.evaluator.eval(input.xd.as_slice(), Some(yd.as_mut_slice()))?;

        Ok(PrimalOutput {
            yd,
            yn: DVector::zeros(variables.outputs(Partition::NonDifferentiable).len()),
        })
    }
}
