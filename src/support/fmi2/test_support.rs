use std::{
    ffi::c_void,
    ptr::NonNull,
    sync::{Mutex, MutexGuard},
};

use nalgebra::DMatrix;

use super::{
    Status, ValueReference,
    api::{CallbackFunctions, Component, ExperimentArgs, Fmi2Api, InstantiateArgs, UnitKind},
};

/// Native operations a [`LinearUnit`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Instantiate,
    SetupExperiment,
    EnterInitializationMode,
    ExitInitializationMode,
    EnterContinuousTimeMode,
    SetReal,
    GetReal,
}

/// One recorded native call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Instantiate,
    FreeInstance,
    SetupExperiment(ExperimentArgs),
    EnterInitializationMode,
    ExitInitializationMode,
    EnterContinuousTimeMode,
    SetReal(Vec<f64>),
    SetBoolean,
    GetReal,
    GetDirectionalDerivative { seed: Vec<f64> },
}

/// Arguments observed by `fmi2Instantiate`.
#[derive(Debug, Clone)]
pub(crate) struct Instantiated {
    pub(crate) instance_name: String,
    pub(crate) guid: String,
    pub(crate) resource_location: String,
    pub(crate) kind: UnitKind,
    pub(crate) visible: bool,
    pub(crate) logging_on: bool,
    pub(crate) heap_callbacks_only: bool,
}

#[derive(Debug, Default)]
struct UnitState {
    x: Vec<f64>,
    calls: Vec<Call>,
    instantiated: Option<Instantiated>,
}

/// In-memory unit computing `y = gain * x`.
///
/// Inputs and outputs are addressed by value reference in declaration
/// order. Every call is recorded, and any step can be made to fail with
/// [`Status::Error`].
#[derive(Debug)]
pub(crate) struct LinearUnit {
    inputs: Vec<ValueReference>,
    outputs: Vec<ValueReference>,
    gain: DMatrix<f64>,
    failing: Option<Step>,
    failing_column: Option<usize>,
    directional_derivative: bool,
    state: Mutex<UnitState>,
}

impl LinearUnit {
    pub(crate) fn new(
        inputs: &[ValueReference],
        outputs: &[ValueReference],
        gain: DMatrix<f64>,
    ) -> Self {
        assert_eq!(gain.shape(), (outputs.len(), inputs.len()));
        Self {
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            gain,
            failing: None,
            failing_column: None,
            directional_derivative: true,
            state: Mutex::new(UnitState {
                x: vec![0.0; inputs.len()],
                ..UnitState::default()
            }),
        }
    }

    /// A unit with `k` on the diagonal of its gain.
    pub(crate) fn diagonal(inputs: &[ValueReference], outputs: &[ValueReference], k: f64) -> Self {
        let gain = DMatrix::from_diagonal_element(outputs.len(), inputs.len(), k);
        Self::new(inputs, outputs, gain)
    }

    pub(crate) fn failing_at(mut self, step: Step) -> Self {
        self.failing = Some(step);
        self
    }

    /// Fails directional derivatives seeded on `column`.
    pub(crate) fn failing_derivative_at(mut self, column: usize) -> Self {
        self.failing_column = Some(column);
        self
    }

    pub(crate) fn without_directional_derivative(mut self) -> Self {
        self.directional_derivative = false;
        self
    }

    pub(crate) fn inputs(&self) -> &[ValueReference] {
        &self.inputs
    }

    pub(crate) fn outputs(&self) -> &[ValueReference] {
        &self.outputs
    }

    pub(crate) fn gain(&self) -> &DMatrix<f64> {
        &self.gain
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub(crate) fn instantiated_with(&self) -> Option<Instantiated> {
        self.lock().instantiated.clone()
    }

    pub(crate) fn free_count(&self) -> usize {
        self.count(|call| matches!(call, Call::FreeInstance))
    }

    pub(crate) fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    /// Seeds passed to every directional derivative call, in call order.
    pub(crate) fn seeds(&self) -> Vec<Vec<f64>> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::GetDirectionalDerivative { seed } => Some(seed.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, UnitState> {
        self.state.lock().expect("unit state poisoned")
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    fn status_for(&self, step: Step) -> Status {
        if self.failing == Some(step) {
            Status::Error
        } else {
            Status::Ok
        }
    }

    fn output_row(&self, vr: ValueReference) -> Option<usize> {
        self.outputs.iter().position(|&out| out == vr)
    }

    fn input_column(&self, vr: ValueReference) -> Option<usize> {
        self.inputs.iter().position(|&input| input == vr)
    }
}

impl Fmi2Api for LinearUnit {
    fn provides_directional_derivative(&self) -> bool {
        self.directional_derivative
    }

    unsafe fn instantiate(
        &self,
        args: &InstantiateArgs<'_>,
        callbacks: *const CallbackFunctions,
    ) -> Option<Component> {
        // SAFETY: Callers pass a valid callback table.
        let callbacks = unsafe { &*callbacks };
        let heap_callbacks_only = callbacks.logger.is_none()
            && callbacks.step_finished.is_none()
            && callbacks.allocate_memory.is_some()
            && callbacks.free_memory.is_some()
            && callbacks.component_environment.is_null();

        let mut state = self.lock();
        state.calls.push(Call::Instantiate);
        state.instantiated = Some(Instantiated {
            instance_name: args.instance_name.to_string_lossy().into_owned(),
            guid: args.guid.to_string_lossy().into_owned(),
            resource_location: args.resource_location.to_string_lossy().into_owned(),
            kind: args.kind,
            visible: args.visible,
            logging_on: args.logging_on,
            heap_callbacks_only,
        });

        if self.failing == Some(Step::Instantiate) {
            None
        } else {
            Component::from_raw(NonNull::<c_void>::dangling().as_ptr())
        }
    }

    unsafe fn free_instance(&self, _component: Component) {
        self.record(Call::FreeInstance);
    }

    unsafe fn setup_experiment(&self, _component: Component, args: ExperimentArgs) -> Status {
        self.record(Call::SetupExperiment(args));
        self.status_for(Step::SetupExperiment)
    }

    unsafe fn enter_initialization_mode(&self, _component: Component) -> Status {
        self.record(Call::EnterInitializationMode);
        self.status_for(Step::EnterInitializationMode)
    }

    unsafe fn exit_initialization_mode(&self, _component: Component) -> Status {
        self.record(Call::ExitInitializationMode);
        self.status_for(Step::ExitInitializationMode)
    }

    unsafe fn enter_continuous_time_mode(&self, _component: Component) -> Status {
        self.record(Call::EnterContinuousTimeMode);
        self.status_for(Step::EnterContinuousTimeMode)
    }

    unsafe fn set_real(
        &self,
        _component: Component,
        vrs: &[ValueReference],
        values: &[f64],
    ) -> Status {
        self.record(Call::SetReal(values.to_vec()));
        if self.failing == Some(Step::SetReal) {
            return Status::Error;
        }

        let mut state = self.lock();
        for (&vr, &value) in vrs.iter().zip(values) {
            let Some(column) = self.input_column(vr) else {
                return Status::Error;
            };
            state.x[column] = value;
        }
        Status::Ok
    }

    unsafe fn set_boolean(
        &self,
        _component: Component,
        _vrs: &[ValueReference],
        _values: &[bool],
    ) -> Status {
        self.record(Call::SetBoolean);
        Status::Ok
    }

    unsafe fn get_real(
        &self,
        _component: Component,
        vrs: &[ValueReference],
        values: &mut [f64],
    ) -> Status {
        self.record(Call::GetReal);
        if self.failing == Some(Step::GetReal) {
            return Status::Error;
        }

        let state = self.lock();
        for (&vr, value) in vrs.iter().zip(values.iter_mut()) {
            let Some(row) = self.output_row(vr) else {
                return Status::Error;
            };
            *value = self
                .gain
                .row(row)
                .iter()
                .zip(&state.x)
                .map(|(g, x)| g * x)
                .sum();
        }
        Status::Ok
    }

    unsafe fn get_directional_derivative(
        &self,
        _component: Component,
        unknowns: &[ValueReference],
        knowns: &[ValueReference],
        seed: &[f64],
        sensitivity: &mut [f64],
    ) -> Status {
        self.record(Call::GetDirectionalDerivative {
            seed: seed.to_vec(),
        });
        if !self.directional_derivative {
            return Status::Error;
        }
        let seeded = |column: usize| seed.get(column).is_some_and(|&s| s != 0.0);
        if self.failing_column.is_some_and(seeded) {
            return Status::Error;
        }

        for (&unknown, out) in unknowns.iter().zip(sensitivity.iter_mut()) {
            let Some(row) = self.output_row(unknown) else {
                return Status::Error;
            };
            let mut sum = 0.0;
            for (&known, &s) in knowns.iter().zip(seed) {
                let Some(column) = self.input_column(known) else {
                    return Status::Error;
                };
                sum += self.gain[(row, column)] * s;
            }
            *out = sum;
        }
        Status::Ok
    }
}
