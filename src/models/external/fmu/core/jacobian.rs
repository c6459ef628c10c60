use crate::support::fmi2::Fmi2Api;

use super::{EvalError, Evaluator, Workspace, check_len};

impl<A: Fmi2Api> Evaluator<A> {
    /// Computes the dense Jacobian of the differentiable outputs with respect
    /// to the differentiable inputs at `xd`.
    ///
    /// `jac` is column-major with `n_yd` rows and `n_xd` columns: column `i`
    /// occupies `jac[i * n_yd..(i + 1) * n_yd]`. Columns are computed in
    /// increasing order, each from a seed with a single unit entry.
    ///
    /// # Errors
    ///
    /// A failed directional derivative aborts the sweep with the recoverable
    /// [`EvalError::DirectionalDerivative`]; earlier columns are already
    /// written. Failing to set the inputs is fatal.
    pub fn eval_jac(
        &self,
        xd: &[f64],
        jac: &mut [f64],
        workspace: &mut Workspace,
    ) -> Result<(), EvalError> {
        self.prepare_sweep(xd, workspace)?;
        let n_xd = self.variables.n_xd();
        let n_yd = self.variables.n_yd();
        check_len("jac", n_xd * n_yd, jac.len())?;

        self.set_inputs(xd)?;

        workspace.seed.fill(0.0);
        for i in 0..n_xd {
            workspace.seed[i] = 1.0;
            self.directional_derivative(i, workspace)?;
            jac[i * n_yd..(i + 1) * n_yd].copy_from_slice(&workspace.sensitivity);
            workspace.seed[i] = 0.0;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, dmatrix};

    use crate::{
        models::external::fmu::core::{EvalError, Workspace, test_support::evaluator},
        support::fmi2::{Status, test_support::LinearUnit},
    };

    fn jacobian(unit: LinearUnit, xd: &[f64]) -> (DMatrix<f64>, usize) {
        let (unit, evaluator) = evaluator(unit);
        let mut workspace = Workspace::for_variables(evaluator.variables());
        let variables = evaluator.variables();
        let mut jac = DMatrix::zeros(variables.n_yd(), variables.n_xd());

        evaluator
            .eval_jac(xd, jac.as_mut_slice(), &mut workspace)
            .expect("jacobian should succeed");
        (jac, unit.seeds().len())
    }

    #[test]
    fn diagonal_unit_gives_diagonal_jacobian() {
        let (jac, calls) = jacobian(LinearUnit::diagonal(&[0, 1, 2], &[10, 11, 12], 2.5), &[
            1.0, 2.0, 3.0,
        ]);

        assert_relative_eq!(jac, DMatrix::from_diagonal_element(3, 3, 2.5));
        assert_eq!(calls, 3);
    }

    #[test]
    fn columns_follow_input_order_for_rectangular_units() {
        let gain = dmatrix![
            1.0, 2.0, 3.0;
            -4.0, 5.0, -6.0
        ];
        let unit = LinearUnit::new(&[5, 3, 8], &[20, 21], gain.clone());
        let (jac, _) = jacobian(unit, &[0.5, 0.25, -1.0]);

        assert_relative_eq!(jac, gain);
    }

    #[test]
    fn exactly_one_seed_entry_is_active_per_call() {
        let (unit, evaluator) = evaluator(LinearUnit::diagonal(&[0, 1, 2, 3], &[10, 11, 12, 13], 1.0));
        let mut workspace = Workspace::for_variables(evaluator.variables());
        let mut jac = vec![0.0; 16];

        evaluator.eval_jac(&[0.0; 4], &mut jac, &mut workspace).unwrap();

        let seeds = unit.seeds();
        assert_eq!(seeds.len(), 4);
        for (i, seed) in seeds.iter().enumerate() {
            let mut expected = vec![0.0; 4];
            expected[i] = 1.0;
            assert_eq!(seed, &expected);
        }
        assert!(workspace.seed.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn no_differentiable_inputs_gives_empty_jacobian() {
        let unit = LinearUnit::new(&[], &[10, 11], DMatrix::zeros(2, 0));
        let (jac, calls) = jacobian(unit, &[]);

        assert_eq!(jac.shape(), (2, 0));
        assert_eq!(calls, 0);
    }

    #[test]
    fn failed_column_aborts_the_sweep_and_keeps_the_unit() {
        let unit = LinearUnit::diagonal(&[0, 1, 2], &[10, 11, 12], 4.0).failing_derivative_at(1);
        let (unit, evaluator) = evaluator(unit);
        let mut workspace = Workspace::for_variables(evaluator.variables());
        let mut jac = vec![0.0; 9];

        let error = evaluator
            .eval_jac(&[1.0, 1.0, 1.0], &mut jac, &mut workspace)
            .unwrap_err();

        assert!(matches!(
            error,
            EvalError::DirectionalDerivative {
                column: 1,
                status: Status::Error
            }
        ));
        assert!(error.is_recoverable());
        assert_eq!(unit.seeds().len(), 2);
        assert_eq!(&jac[..3], &[4.0, 0.0, 0.0]);
        assert_eq!(unit.free_count(), 0);

        let mut yd = [0.0; 3];
        evaluator.eval(&[1.0, 2.0, 3.0], Some(&mut yd)).unwrap();
        assert_eq!(yd, [4.0, 8.0, 12.0]);
    }

    #[test]
    fn requires_directional_derivatives() {
        let unit = LinearUnit::diagonal(&[0], &[10], 1.0).without_directional_derivative();
        let (unit, evaluator) = evaluator(unit);
        let calls_before = unit.calls().len();
        let mut workspace = Workspace::for_variables(evaluator.variables());

        let result = evaluator.eval_jac(&[1.0], &mut [0.0], &mut workspace);

        assert!(matches!(result, Err(EvalError::DirectionalDerivativeUnsupported)));
        assert_eq!(unit.calls().len(), calls_before);
    }

    #[test]
    fn mis_sized_output_is_rejected() {
        let (_unit, evaluator) = evaluator(LinearUnit::diagonal(&[0, 1], &[10, 11], 1.0));
        let mut workspace = Workspace::for_variables(evaluator.variables());

        let result = evaluator.eval_jac(&[1.0, 2.0], &mut [0.0; 3], &mut workspace);
        assert!(matches!(
            result,
            Err(EvalError::Dimension {
                name: "jac",
                expected: 4,
                found: 3
            })
        ));
    }
}
