use crate::support::fmi2::Fmi2Api;

use super::{EvalError, Evaluator, Workspace, check_len};

impl<A: Fmi2Api> Evaluator<A> {
    /// Computes the adjoint `adj_xd = J^T adj_yd` at `xd`.
    ///
    /// Column `i` of the Jacobian is recovered from a unit seed and reduced
    /// against `adj_yd` straight away, so the Jacobian is never stored.
    ///
    /// # Errors
    ///
    /// A failed directional derivative aborts the sweep with the recoverable
    /// [`EvalError::DirectionalDerivative`], leaving `adj_xd` partially
    /// accumulated. Failing to set the inputs is fatal.
    pub fn eval_adj(
        &self,
        xd: &[f64],
        adj_yd: &[f64],
        adj_xd: &mut [f64],
        workspace: &mut Workspace,
    ) -> Result<(), EvalError> {
        self.prepare_sweep(xd, workspace)?;
        check_len("adj_yd", self.variables.n_yd(), adj_yd.len())?;
        check_len("adj_xd", self.variables.n_xd(), adj_xd.len())?;

        self.set_inputs(xd)?;

        adj_xd.fill(0.0);
        workspace.seed.fill(0.0);
        for (i, adj) in adj_xd.iter_mut().enumerate() {
            workspace.seed[i] = 1.0;
            self.directional_derivative(i, workspace)?;
            *adj += workspace
                .sensitivity
                .iter()
                .zip(adj_yd)
                .map(|(s, a)| s * a)
                .sum::<f64>();
            workspace.seed[i] = 0.0;
        }

        Ok(())
    }
}
