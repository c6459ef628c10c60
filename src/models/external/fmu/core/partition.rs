use crate::support::fmi2::ValueReference;

use super::ConfigError;

/// Which half of the inputs or outputs a query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Index 0: variables taking part in Jacobian and adjoint evaluation.
    Differentiable,
    /// Index 1: declared, but never passed to or read from the unit.
    NonDifferentiable,
}

impl TryFrom<usize> for Partition {
    type Error = ConfigError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Self::Differentiable),
            1 => Ok(Self::NonDifferentiable),
            other => Err(ConfigError::PartitionIndex(other)),
        }
    }
}

/// Shape of one input or output slot.
///
/// Every slot of an FMU function is a dense column vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sparsity {
    pub nrow: usize,
    pub ncol: usize,
}

impl Sparsity {
    /// A fully dense `nrow x ncol` pattern.
    #[must_use]
    pub fn dense(nrow: usize, ncol: usize) -> Self {
        Self { nrow, ncol }
    }

    /// Number of structural nonzeros.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.nrow * self.ncol
    }
}

/// Value references split into differentiable and non-differentiable parts.
///
/// The order of each list fixes the order of the corresponding vector
/// entries and Jacobian rows/columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableMap {
    xd: Vec<ValueReference>,
    xn: Vec<ValueReference>,
    yd: Vec<ValueReference>,
    yn: Vec<ValueReference>,
}

impl VariableMap {
    /// Builds the map from `[differentiable, non-differentiable]` lists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InputPartitions`] or
    /// [`ConfigError::OutputPartitions`] unless each side has exactly two lists.
    pub fn new(
        id_in: Vec<Vec<ValueReference>>,
        id_out: Vec<Vec<ValueReference>>,
    ) -> Result<Self, ConfigError> {
        let [xd, xn] = <[_; 2]>::try_from(id_in)
            .map_err(|lists: Vec<_>| ConfigError::InputPartitions(lists.len()))?;
        let [yd, yn] = <[_; 2]>::try_from(id_out)
            .map_err(|lists: Vec<_>| ConfigError::OutputPartitions(lists.len()))?;
        Ok(Self { xd, xn, yd, yn })
    }

    #[must_use]
    pub fn inputs(&self, partition: Partition) -> &[ValueReference] {
        match partition {
            Partition::Differentiable => &self.xd,
            Partition::NonDifferentiable => &self.xn,
        }
    }

    #[must_use]
    pub fn outputs(&self, partition: Partition) -> &[ValueReference] {
        match partition {
            Partition::Differentiable => &self.yd,
            Partition::NonDifferentiable => &self.yn,
        }
    }

    /// Dense column shape of an input slot.
    #[must_use]
    pub fn sparsity_in(&self, partition: Partition) -> Sparsity {
        Sparsity::dense(self.inputs(partition).len(), 1)
    }

    /// Dense column shape of an output slot.
    #[must_use]
    pub fn sparsity_out(&self, partition: Partition) -> Sparsity {
        Sparsity::dense(self.outputs(partition).len(), 1)
    }

    /// Number of differentiable inputs.
    #[must_use]
    pub fn n_xd(&self) -> usize {
        self.xd.len()
    }

    /// Number of differentiable outputs.
    #[must_use]
    pub fn n_yd(&self) -> usize {
        self.yd.len()
    }
}
