use std::cell::RefCell;

use nalgebra::DVector;
use twine_core::Model;

use crate::support::fmi2::{Fmi2Api, Fmi2Library};

use super::{
    EvalError, FmuFunction, Partition,
    core::{Workspace, check_len},
};

/// Inputs of an [`FmuAdjoint`]: the primal point, the primal outputs at that
/// point, and the output adjoint seeds.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjointInput {
    pub xd: DVector<f64>,
    pub xn: DVector<f64>,
    pub yd: DVector<f64>,
    pub yn: DVector<f64>,
    pub adj_yd: DVector<f64>,
    pub adj_yn: DVector<f64>,
}

/// Input adjoints produced by an [`FmuAdjoint`].
///
/// `adj_xn` is always zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjointOutput {
    pub adj_xd: DVector<f64>,
    pub adj_xn: DVector<f64>,
}

/// Reverse-mode derivative of an [`FmuFunction`] for a single direction.
///
/// Computes `adj_xd = (d yd / d xd)^T adj_yd`. Each call costs one
/// directional derivative per differentiable input.
pub struct FmuAdjoint<'a, A: Fmi2Api = Fmi2Library> {
    derivative_of: &'a FmuFunction<A>,
    workspace: RefCell<Workspace>,
}

impl<'a, A: Fmi2Api> FmuAdjoint<'a, A> {
    pub(super) fn new(derivative_of: &'a FmuFunction<A>) -> Self {
        Self {
            derivative_of,
            workspace: RefCell::new(Workspace::for_variables(derivative_of.variables())),
        }
    }

    /// The function this adjoint differentiates.
    #[must_use]
    pub fn derivative_of(&self) -> &'a FmuFunction<A> {
        self.derivative_of
    }
}

impl<A: Fmi2Api> Model for FmuAdjoint<'_, A> {
    type Input = AdjointInput;
    type Output = AdjointOutput;
    type Error = EvalError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let variables = self.derivative_of.variables();
        let n_xn = variables.inputs(Partition::NonDifferentiable).len();
        let n_yn = variables.outputs(Partition::NonDifferentiable).len();
        check_len("xn", n_xn, input.xn.len())?;
        check_len("yd", variables.n_yd(), input.yd.len())?;
        check_len("yn", n_yn, input.yn.len())?;
        check_len("adj_yn", n_yn, input.adj_yn.len())?;

        let mut adj_xd = DVector::zeros(variables.n_xd());
        self.derivative_of.evaluator.eval_adj(
            input.xd.as_slice(),
            input.adj_yd.as_slice(),
            adj_xd.as_mut_slice(),
            &mut self.workspace.borrow_mut(),
        )?;

        Ok(AdjointOutput {
            adj_xd,
            adj_xn: DVector::zeros(n_xn),
        })
    }
}
