use thiserror::Error;

use crate::support::fmi2::{Fmi2Error, Status};

/// Invalid construction or derivative requests.
///
/// Always raised before any native resource is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The input index lists are not `[differentiable, non-differentiable]`.
    #[error("expected two input lists: differentiable and non-differentiable, got {0}")]
    InputPartitions(usize),

    /// The output index lists are not `[differentiable, non-differentiable]`.
    #[error("expected two output lists: differentiable and non-differentiable, got {0}")]
    OutputPartitions(usize),

    /// A partition index other than 0 or 1.
    #[error("partition index {0} out of range")]
    PartitionIndex(usize),

    /// Reverse mode was requested with other than exactly one adjoint direction.
    #[error("reverse mode supports exactly one adjoint direction, got {0}")]
    AdjointDirections(usize),
}

/// Errors raised while constructing an [`FmuFunction`](super::super::FmuFunction).
#[derive(Debug, Error)]
pub enum FmuError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Unit(#[from] Fmi2Error),
}

/// Errors raised while evaluating an FMU.
///
/// Use [`EvalError::is_recoverable`] to tell a failed derivative probe,
/// after which the unit remains usable, from fatal set/get failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvalError {
    /// Setting the differentiable inputs failed. Fatal.
    #[error("fmi2SetReal failed: {status}")]
    SetReal { status: Status },

    /// Reading the differentiable outputs failed. Fatal.
    #[error("fmi2GetReal failed: {status}")]
    GetReal { status: Status },

    /// A directional derivative probe failed. Recoverable.
    ///
    /// Columns before `column` have been computed; the rest were not attempted.
    #[error("fmi2GetDirectionalDerivative failed for column {column}: {status}")]
    DirectionalDerivative { column: usize, status: Status },

    /// Derivatives were requested from a unit without directional derivatives.
    #[error("the FMU does not provide directional derivatives")]
    DirectionalDerivativeUnsupported,

    /// An argument or buffer does not match the declared partition sizes.
    #[error("{name} has length {found}, expected {expected}")]
    Dimension {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    /// A previous fatal error left the unit in an unknown state.
    #[error("FMU is unusable after an earlier fatal error")]
    Unusable,

    /// The unit rejected the call at the binding level. Fatal.
    #[error(transparent)]
    Unit(#[from] Fmi2Error),
}

impl EvalError {
    /// Returns `true` if the unit is still usable after this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DirectionalDerivative { .. }
                | Self::DirectionalDerivativeUnsupported
                | Self::Dimension { .. }
        )
    }
}
