use uom::si::{f64::Time, time::second};

use crate::support::fmi2::ExperimentArgs;

/// Options for binding an FMU as a Twine model.
#[derive(Debug, Clone, Copy, Default)]
pub struct FmuConfig {
    /// Whether the unit implements `fmi2GetDirectionalDerivative`.
    ///
    /// Jacobian and adjoint evaluation are only available when this is set.
    pub provides_directional_derivative: bool,

    /// Experiment passed to `fmi2SetupExperiment` during initialization.
    pub experiment: Experiment,
}

/// Experiment setup applied once, before initialization mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Experiment {
    /// Relative tolerance, or `None` to leave the unit's default in place.
    pub tolerance: Option<f64>,

    /// Start time of the experiment.
    pub start_time: Time,

    /// Stop time of the experiment, if defined.
    pub stop_time: Option<Time>,
}

impl Default for Experiment {
    fn default() -> Self {
        Self {
            tolerance: None,
            start_time: Time::new::<second>(0.0),
            stop_time: Some(Time::new::<second>(1.0)),
        }
    }
}

impl Experiment {
    /// Converts this experiment into raw `fmi2SetupExperiment` arguments.
    pub(super) fn args(&self) -> ExperimentArgs {
        ExperimentArgs {
            tolerance: self.tolerance,
            start_time: self.start_time.get::<second>(),
            stop_time: self.stop_time.map(|t| t.get::<second>()),
        }
    }
}
