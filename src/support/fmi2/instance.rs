//! Ownership of one unit component and its lifecycle.

use std::{ffi::CString, sync::Arc};

use log::debug;

use super::{
    Fmi2Error, LifecycleState, Status,
    api::{CallbackFunctions, Component, ExperimentArgs, Fmi2Api, InstantiateArgs, UnitKind},
    ValueReference,
};

/// One instantiated unit, driven through the FMI 2.0 lifecycle.
///
/// The instance exclusively owns its component handle and frees it exactly
/// once, either through [`Instance::release`] or on drop, whichever happens
/// first. Every native call goes through the owned handle, and none are made
/// before instantiation or after release.
///
/// Access is strictly sequential: the type is `Send` but not `Sync`.
pub struct Instance<A: Fmi2Api> {
    api: Arc<A>,
    component: Option<Component>,
    state: LifecycleState,
    // Units may keep the callback pointer, so it lives as long as the component.
    _callbacks: Box<CallbackFunctions>,
}

impl<A: Fmi2Api> Instance<A> {
    /// Instantiates a model-exchange component.
    ///
    /// The unit receives heap-only callbacks and is created invisible with
    /// logging disabled.
    ///
    /// # Errors
    ///
    /// Returns [`Fmi2Error::InvalidString`] if an argument contains a nul byte
    /// and [`Fmi2Error::Instantiation`] if the unit returns a null component.
    pub fn instantiate(
        api: Arc<A>,
        name: &str,
        guid: &str,
        resource_location: &str,
    ) -> Result<Self, Fmi2Error> {
        let instance_name = CString::new(name)?;
        let guid = CString::new(guid)?;
        let resource_location = CString::new(resource_location)?;
        let callbacks = Box::new(CallbackFunctions::heap_only());

        let args = InstantiateArgs {
            instance_name: &instance_name,
            kind: UnitKind::ModelExchange,
            guid: &guid,
            resource_location: &resource_location,
            visible: false,
            logging_on: false,
        };

        // SAFETY: `callbacks` is boxed and moves into the returned instance,
        // which frees the component before dropping the box.
        let component = unsafe { api.instantiate(&args, &raw const *callbacks) }
            .ok_or(Fmi2Error::Instantiation)?;
        debug!("instantiated FMU component '{name}'");

        Ok(Self {
            api,
            component: Some(component),
            state: LifecycleState::Instantiated,
            _callbacks: callbacks,
        })
    }

    /// Drives a freshly instantiated unit into continuous-time mode.
    ///
    /// Runs, in order and exactly once: setup experiment, enter initialization
    /// mode, exit initialization mode, enter continuous-time mode. The unit is
    /// never returned to initialization mode afterwards, so units whose state
    /// is not fully determined by the real inputs set on each call are not
    /// supported.
    ///
    /// # Errors
    ///
    /// Returns the first [`Fmi2Error::Protocol`] encountered. The instance is
    /// consumed and its component freed, so no later transition runs.
    pub fn initialize(mut self, experiment: ExperimentArgs) -> Result<Self, Fmi2Error> {
        self.setup_experiment(experiment)?;
        self.enter_initialization_mode()?;
        self.enter_continuous_time_mode()?;
        Ok(self)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The capability table this instance calls through.
    #[must_use]
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    fn setup_experiment(&mut self, args: ExperimentArgs) -> Result<(), Fmi2Error> {
        let from = LifecycleState::Instantiated;
        self.transition(from, "fmi2SetupExperiment", |api, component| {
            // SAFETY: `transition` only hands out the live component.
            let status = unsafe { api.setup_experiment(component, args) };
            check("fmi2SetupExperiment", status)
        })
    }

    fn enter_initialization_mode(&mut self) -> Result<(), Fmi2Error> {
        let from = LifecycleState::ExperimentConfigured;
        self.transition(from, "fmi2EnterInitializationMode", |api, component| {
            // SAFETY: `transition` only hands out the live component.
            let status = unsafe { api.enter_initialization_mode(component) };
            check("fmi2EnterInitializationMode", status)
        })
    }

    fn enter_continuous_time_mode(&mut self) -> Result<(), Fmi2Error> {
        let from = LifecycleState::Initializing;
        self.transition(from, "fmi2ExitInitializationMode", |api, component| {
            // SAFETY: `transition` only hands out the live component.
            let status = unsafe { api.exit_initialization_mode(component) };
            check("fmi2ExitInitializationMode", status)?;
            // SAFETY: As above.
            let status = unsafe { api.enter_continuous_time_mode(component) };
            check("fmi2EnterContinuousTimeMode", status)
        })
    }

    /// Runs `step` if the instance is in state `from`, then advances one state.
    fn transition(
        &mut self,
        from: LifecycleState,
        operation: &'static str,
        step: impl FnOnce(&A, Component) -> Result<(), Fmi2Error>,
    ) -> Result<(), Fmi2Error> {
        let out_of_order = Fmi2Error::OutOfOrder {
            operation,
            state: self.state,
        };
        let (Some(component), Some(to)) = (self.component, from.next()) else {
            return Err(out_of_order);
        };
        if self.state != from {
            return Err(out_of_order);
        }

        step(&*self.api, component)?;
        debug!("FMU lifecycle {from:?} -> {to:?}");
        self.state = to;
        Ok(())
    }

    /// The component, if evaluation calls are currently valid.
    fn evaluating(&self, operation: &'static str) -> Result<Component, Fmi2Error> {
        match self.component {
            Some(component) if self.state.accepts_evaluation() => Ok(component),
            _ => Err(Fmi2Error::OutOfOrder {
                operation,
                state: self.state,
            }),
        }
    }

    /// Sets real variables with `fmi2SetReal`.
    ///
    /// # Errors
    ///
    /// Returns [`Fmi2Error::OutOfOrder`] outside continuous-time mode.
    ///
    /// # Panics
    ///
    /// Panics if `vrs` and `values` differ in length.
    pub fn set_real(&self, vrs: &[ValueReference], values: &[f64]) -> Result<Status, Fmi2Error> {
        assert_eq!(vrs.len(), values.len(), "one value per value reference");
        let component = self.evaluating("fmi2SetReal")?;
        // SAFETY: The component is live and the lengths match.
        Ok(unsafe { self.api.set_real(component, vrs, values) })
    }

    /// Sets boolean variables with `fmi2SetBoolean`.
    ///
    /// # Errors
    ///
    /// Returns [`Fmi2Error::OutOfOrder`] outside continuous-time mode.
    ///
    /// # Panics
    ///
    /// Panics if `vrs` and `values` differ in length.
    pub fn set_boolean(
        &self,
        vrs: &[ValueReference],
        values: &[bool],
    ) -> Result<Status, Fmi2Error> {
        assert_eq!(vrs.len(), values.len(), "one value per value reference");
        let component = self.evaluating("fmi2SetBoolean")?;
        // SAFETY: The component is live and the lengths match.
        Ok(unsafe { self.api.set_boolean(component, vrs, values) })
    }

    /// Reads real variables with `fmi2GetReal`.
    ///
    /// # Errors
    ///
    /// Returns [`Fmi2Error::OutOfOrder`] outside continuous-time mode.
    ///
    /// # Panics
    ///
    /// Panics if `vrs` and `values` differ in length.
    pub fn get_real(
        &self,
        vrs: &[ValueReference],
        values: &mut [f64],
    ) -> Result<Status, Fmi2Error> {
        assert_eq!(vrs.len(), values.len(), "one value per value reference");
        let component = self.evaluating("fmi2GetReal")?;
        // SAFETY: The component is live and the lengths match.
        Ok(unsafe { self.api.get_real(component, vrs, values) })
    }

    /// Computes `sensitivity = d(unknowns)/d(knowns) * seed` with
    /// `fmi2GetDirectionalDerivative`.
    ///
    /// # Errors
    ///
    /// Returns [`Fmi2Error::OutOfOrder`] outside continuous-time mode.
    ///
    /// # Panics
    ///
    /// Panics if `seed` or `sensitivity` do not match their reference lists.
    pub fn get_directional_derivative(
        &self,
        unknowns: &[ValueReference],
        knowns: &[ValueReference],
        seed: &[f64],
        sensitivity: &mut [f64],
    ) -> Result<Status, Fmi2Error> {
        assert_eq!(knowns.len(), seed.len(), "one seed per known");
        assert_eq!(unknowns.len(), sensitivity.len(), "one sensitivity per unknown");
        let component = self.evaluating("fmi2GetDirectionalDerivative")?;
        // SAFETY: The component is live and the lengths match.
        Ok(unsafe {
            self.api
                .get_directional_derivative(component, unknowns, knowns, seed, sensitivity)
        })
    }

    /// Frees the component if one exists.
    ///
    /// Safe to call any number of times; only the first call reaches the unit.
    pub fn release(&mut self) {
        if let Some(component) = self.component.take() {
            // SAFETY: `take` guarantees the component is freed at most once.
            unsafe { self.api.free_instance(component) };
            debug!("released FMU component");
        }
        self.state = LifecycleState::Released;
    }
}

impl<A: Fmi2Api> Drop for Instance<A> {
    fn drop(&mut self) {
        self.release();
    }
}

// SAFETY: FMI 2.0 components may be used from any thread as long as calls
// are not concurrent. `Instance` is not `Sync` and all calls need `&self`
// or `&mut self` on the single owner.
unsafe impl<A: Fmi2Api + Send + Sync> Send for Instance<A> {}

fn check(operation: &'static str, status: Status) -> Result<(), Fmi2Error> {
    if status.is_ok() {
        Ok(())
    } else {
        Err(Fmi2Error::Protocol { operation, status })
    }
}
