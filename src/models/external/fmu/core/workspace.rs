use super::VariableMap;

/// Scratch buffers for one derivative sweep.
///
/// The seed has one entry per differentiable input and the sensitivity one
/// entry per differentiable output. Nothing is carried between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub(super) seed: Vec<f64>,
    pub(super) sensitivity: Vec<f64>,
}

impl Workspace {
    /// Allocates buffers sized for `variables`.
    #[must_use]
    pub fn for_variables(variables: &VariableMap) -> Self {
        Self {
            seed: vec![0.0; variables.n_xd()],
            sensitivity: vec![0.0; variables.n_yd()],
        }
    }
}
