use std::sync::Arc;

use crate::support::fmi2::test_support::LinearUnit;

use super::{FmuConfig, FmuFunction, VariableMap};

/// Function over `unit` with every unit variable differentiable, plus one
/// non-differentiable input (200) and two non-differentiable outputs (300, 301).
pub(super) fn function(unit: LinearUnit) -> (Arc<LinearUnit>, FmuFunction<LinearUnit>) {
    let unit = Arc::new(unit);
    let variables = VariableMap::new(
        vec![unit.inputs().to_vec(), vec![200]],
        vec![unit.outputs().to_vec(), vec![300, 301]],
    )
    .expect("two partitions per side");
    let config = FmuConfig {
        provides_directional_derivative: true,
        ..FmuConfig::default()
    };

    let function = FmuFunction::with_api(
        Arc::clone(&unit),
        "linear",
        "{8c4e810f-3df3-4a00-8276-176fa3c9f000}",
        "file:/fmus/linear/resources/",
        variables,
        &config,
    )
    .expect("linear unit should initialize");
    (unit, function)
}
