use std::sync::Arc;

use crate::support::fmi2::test_support::LinearUnit;

use super::{Evaluator, FmuConfig, VariableMap};

/// Variable map declaring every input and output of `unit` as differentiable.
pub(super) fn variables(unit: &LinearUnit) -> VariableMap {
    VariableMap::new(
        vec![unit.inputs().to_vec(), vec![]],
        vec![unit.outputs().to_vec(), vec![]],
    )
    .expect("two partitions per side")
}

/// Initialized evaluator over `unit`, with directional derivatives enabled.
pub(super) fn evaluator(unit: LinearUnit) -> (Arc<LinearUnit>, Evaluator<LinearUnit>) {
    let unit = Arc::new(unit);
    let config = FmuConfig {
        provides_directional_derivative: true,
        ..FmuConfig::default()
    };
    let evaluator = Evaluator::new(
        Arc::clone(&unit),
        "linear",
        "{8c4e810f-3df3-4a00-8276-176fa3c9f000}",
        "file:/fmus/linear/resources/",
        variables(&unit),
        &config,
    )
    .expect("linear unit should initialize");
    (unit, evaluator)
}
