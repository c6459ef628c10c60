//! Evaluation of an initialized FMU: primal values, Jacobians, and adjoints.
//!
//! The unit only exposes a forward directional derivative, so both
//! derivative modes sweep unit seeds over the differentiable inputs, one
//! column at a time. An adjoint therefore costs as many native calls as a
//! full Jacobian, regardless of the number of outputs.

mod adjoint;
mod config;
mod error;
mod jacobian;
mod partition;
mod workspace;

#[cfg(test)]
mod test_support;

pub use config::{Experiment, FmuConfig};
pub use error::{ConfigError, EvalError, FmuError};
pub use partition::{Partition, Sparsity, VariableMap};
pub use workspace::Workspace;

use std::{cell::Cell, sync::Arc};

use log::{error, warn};

use crate::support::fmi2::{Fmi2Api, Fmi2Error, Instance, LifecycleState};

/// An FMU driven into continuous-time mode, ready for repeated evaluation.
///
/// Non-differentiable inputs and outputs are part of the variable map but
/// are never forwarded to or read from the unit.
pub struct Evaluator<A: Fmi2Api> {
    instance: Instance<A>,
    variables: VariableMap,
    directional_derivative: bool,
    unusable: Cell<bool>,
}

impl<A: Fmi2Api> Evaluator<A> {
    /// Instantiates and initializes the unit.
    ///
    /// # Errors
    ///
    /// Returns the first [`Fmi2Error`] raised while instantiating or
    /// initializing. Any component created before the failure is freed.
    pub fn new(
        api: Arc<A>,
        name: &str,
        guid: &str,
        resource_location: &str,
        variables: VariableMap,
        config: &FmuConfig,
    ) -> Result<Self, Fmi2Error> {
        let directional_derivative =
            config.provides_directional_derivative && api.provides_directional_derivative();
        let instance = Instance::instantiate(api, name, guid, resource_location)?
            .initialize(config.experiment.args())?;

        Ok(Self {
            instance,
            variables,
            directional_derivative,
            unusable: Cell::new(false),
        })
    }

    #[must_use]
    pub fn variables(&self) -> &VariableMap {
        &self.variables
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.instance.state()
    }

    #[must_use]
    pub fn provides_directional_derivative(&self) -> bool {
        self.directional_derivative
    }

    /// Frees the unit. Later evaluations fail with [`EvalError::Unit`].
    pub fn release(&mut self) {
        self.instance.release();
    }

    /// Evaluates the unit at `xd`, writing differentiable outputs to `yd` if given.
    ///
    /// # Errors
    ///
    /// Set and get failures are fatal and leave the evaluator unusable.
    pub fn eval(&self, xd: &[f64], yd: Option<&mut [f64]>) -> Result<(), EvalError> {
        self.ensure_usable()?;
        check_len("xd", self.variables.n_xd(), xd.len())?;
        if let Some(yd) = &yd {
            check_len("yd", self.variables.n_yd(), yd.len())?;
        }

        self.set_inputs(xd)?;

        if let Some(yd) = yd {
            let status = self
                .instance
                .get_real(self.variables.outputs(Partition::Differentiable), yd)
                .map_err(|err| self.fatal(err.into()))?;
            if !status.is_ok() {
                return Err(self.fatal(EvalError::GetReal { status }));
            }
        }

        Ok(())
    }

    fn ensure_usable(&self) -> Result<(), EvalError> {
        if self.unusable.get() {
            Err(EvalError::Unusable)
        } else {
            Ok(())
        }
    }

    /// Checks everything a derivative sweep needs before touching the unit.
    fn prepare_sweep(&self, xd: &[f64], workspace: &Workspace) -> Result<(), EvalError> {
        self.ensure_usable()?;
        if !self.directional_derivative {
            return Err(EvalError::DirectionalDerivativeUnsupported);
        }
        check_len("xd", self.variables.n_xd(), xd.len())?;
        check_len("seed", self.variables.n_xd(), workspace.seed.len())?;
        check_len("sensitivity", self.variables.n_yd(), workspace.sensitivity.len())
    }

    fn set_inputs(&self, xd: &[f64]) -> Result<(), EvalError> {
        let status = self
            .instance
            .set_real(self.variables.inputs(Partition::Differentiable), xd)
            .map_err(|err| self.fatal(err.into()))?;
        if status.is_ok() {
            Ok(())
        } else {
            Err(self.fatal(EvalError::SetReal { status }))
        }
    }

    /// Computes the directional derivative for the current seed into the
    /// workspace sensitivity.
    fn directional_derivative(
        &self,
        column: usize,
        workspace: &mut Workspace,
    ) -> Result<(), EvalError> {
        let status = self
            .instance
            .get_directional_derivative(
                self.variables.outputs(Partition::Differentiable),
                self.variables.inputs(Partition::Differentiable),
                &workspace.seed,
                &mut workspace.sensitivity,
            )
            .map_err(|err| self.fatal(err.into()))?;

        if status.is_ok() {
            Ok(())
        } else {
            warn!("fmi2GetDirectionalDerivative failed for column {column}: {status}");
            Err(EvalError::DirectionalDerivative { column, status })
        }
    }

    /// Marks the evaluator unusable and passes the error through.
    fn fatal(&self, err: EvalError) -> EvalError {
        error!("fatal FMU evaluation error: {err}");
        self.unusable.set(true);
        err
    }
}

pub(super) fn check_len(
    name: &'static str,
    expected: usize,
    found: usize,
) -> Result<(), EvalError> {
    if expected == found {
        Ok(())
    } else {
        Err(EvalError::Dimension {
            name,
            expected,
            found,
        })
    }
}
