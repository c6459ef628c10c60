use std::cell::RefCell;

use nalgebra::{DMatrix, DVector};
use twine_core::Model;

use crate::support::fmi2::{Fmi2Api, Fmi2Library};

use super::{EvalError, FmuFunction, core::Workspace};

/// Forward Jacobian of an [`FmuFunction`], mapping `xd` to `d yd / d xd`.
///
/// The result has one row per differentiable output and one column per
/// differentiable input.
pub struct FmuJacobian<'a, A: Fmi2Api = Fmi2Library> {
    derivative_of: &'a FmuFunction<A>,
    workspace: RefCell<Workspace>,
}

impl<'a, A: Fmi2Api> FmuJacobian<'a, A> {
    pub(super) fn new(derivative_of: &'a FmuFunction<A>) -> Self {
        Self {
            derivative_of,
            workspace: RefCell::new(Workspace::for_variables(derivative_of.variables())),
        }
    }

    /// The function this Jacobian differentiates.
    #[must_use]
    pub fn derivative_of(&self) -> &'a FmuFunction<A> {
        self.derivative_of
    }
}

impl<A: Fmi2Api> Model for FmuJacobian<'_, A> {
    type Input = DVector<f64>;
    type Output = DMatrix<f64>;
    type Error = EvalError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let variables = self.derivative_of.variables();
        let mut jac = DMatrix::zeros(variables.n_yd(), variables.n_xd());

        self.derivative_of.evaluator.eval_jac(
            input.as_slice(),
            jac.as_mut_slice(),
            &mut self.workspace.borrow_mut(),
        )?;

        Ok(jac)
    }
}
