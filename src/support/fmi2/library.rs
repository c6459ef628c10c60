//! Function pointer table resolved from an FMU shared library.

use std::{
    ffi::{c_char, c_double, c_int, c_void},
    path::Path,
};

use libloading::Library;
use log::debug;

use super::{
    Fmi2Error, Status,
    api::{
        CallbackFunctions, Component, ExperimentArgs, FMI2_FALSE, FMI2_TRUE, Fmi2Api,
        InstantiateArgs, UnitKind, ValueReference,
    },
};

type InstantiateFn = unsafe extern "C" fn(
    instance_name: *const c_char,
    kind: UnitKind,
    guid: *const c_char,
    resource_location: *const c_char,
    functions: *const CallbackFunctions,
    visible: c_int,
    logging_on: c_int,
) -> *mut c_void;
type FreeInstanceFn = unsafe extern "C" fn(component: *mut c_void);
type SetupExperimentFn = unsafe extern "C" fn(
    component: *mut c_void,
    tolerance_defined: c_int,
    tolerance: c_double,
    start_time: c_double,
    stop_time_defined: c_int,
    stop_time: c_double,
) -> c_int;
type ModeFn = unsafe extern "C" fn(component: *mut c_void) -> c_int;
type SetRealFn = unsafe extern "C" fn(
    component: *mut c_void,
    vr: *const ValueReference,
    nvr: usize,
    value: *const c_double,
) -> c_int;
type SetBooleanFn = unsafe extern "C" fn(
    component: *mut c_void,
    vr: *const ValueReference,
    nvr: usize,
    value: *const c_int,
) -> c_int;
type GetRealFn = unsafe extern "C" fn(
    component: *mut c_void,
    vr: *const ValueReference,
    nvr: usize,
    value: *mut c_double,
) -> c_int;
type GetDirectionalDerivativeFn = unsafe extern "C" fn(
    component: *mut c_void,
    unknown_refs: *const ValueReference,
    n_unknown: usize,
    known_refs: *const ValueReference,
    n_known: usize,
    dv_known: *const c_double,
    dv_unknown: *mut c_double,
) -> c_int;

/// FMI 2.0 entry points of one loaded shared library.
///
/// Every pointer is resolved once in [`Fmi2Library::load`] and never changes.
/// The [`Library`] is stored alongside so the pointers stay callable for as
/// long as this value lives.
pub struct Fmi2Library {
    instantiate: InstantiateFn,
    free_instance: FreeInstanceFn,
    setup_experiment: SetupExperimentFn,
    enter_initialization_mode: ModeFn,
    exit_initialization_mode: ModeFn,
    enter_continuous_time_mode: ModeFn,
    set_real: SetRealFn,
    set_boolean: SetBooleanFn,
    get_real: GetRealFn,
    get_directional_derivative: Option<GetDirectionalDerivativeFn>,
    // Dropped last; the pointers above point into it.
    _library: Library,
}

impl Fmi2Library {
    /// Loads the shared library at `path` and resolves the FMI 2.0 symbols.
    ///
    /// `fmi2GetDirectionalDerivative` is only looked up when
    /// `provides_directional_derivative` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Fmi2Error::Load`] if the library cannot be opened and
    /// [`Fmi2Error::SymbolResolution`] if a required symbol is missing.
    pub fn load(
        path: impl AsRef<Path>,
        provides_directional_derivative: bool,
    ) -> Result<Self, Fmi2Error> {
        let path = path.as_ref();
        debug!("loading FMU binary {}", path.display());

        // SAFETY: Loading runs the library's initializers. FMU binaries are
        // trusted to be well-behaved shared libraries.
        let library = unsafe { Library::new(path) }.map_err(|source| Fmi2Error::Load {
            path: path.to_path_buf(),
            source,
        })?;

        // SAFETY: Each type alias matches the signature in fmi2FunctionTypes.h.
        unsafe {
            let get_directional_derivative = if provides_directional_derivative {
                Some(resolve(&library, "fmi2GetDirectionalDerivative")?)
            } else {
                None
            };

            Ok(Self {
                instantiate: resolve(&library, "fmi2Instantiate")?,
                free_instance: resolve(&library, "fmi2FreeInstance")?,
                setup_experiment: resolve(&library, "fmi2SetupExperiment")?,
                enter_initialization_mode: resolve(&library, "fmi2EnterInitializationMode")?,
                exit_initialization_mode: resolve(&library, "fmi2ExitInitializationMode")?,
                enter_continuous_time_mode: resolve(&library, "fmi2EnterContinuousTimeMode")?,
                set_real: resolve(&library, "fmi2SetReal")?,
                set_boolean: resolve(&library, "fmi2SetBoolean")?,
                get_real: resolve(&library, "fmi2GetReal")?,
                get_directional_derivative,
                _library: library,
            })
        }
    }
}

/// Looks up `name` and copies the function pointer out of the symbol.
///
/// # Safety
///
/// `T` must be the exact function pointer type of the exported symbol, and
/// the returned pointer must not outlive `library`.
unsafe fn resolve<T: Copy>(library: &Library, name: &'static str) -> Result<T, Fmi2Error> {
    // SAFETY: Forwarded to the caller.
    let symbol = unsafe { library.get::<T>(name.as_bytes()) }
        .map_err(|source| Fmi2Error::SymbolResolution { name, source })?;
    Ok(*symbol)
}

fn fmi2_boolean(value: bool) -> c_int {
    if value { FMI2_TRUE } else { FMI2_FALSE }
}

impl Fmi2Api for Fmi2Library {
    fn provides_directional_derivative(&self) -> bool {
        self.get_directional_derivative.is_some()
    }

    unsafe fn instantiate(
        &self,
        args: &InstantiateArgs<'_>,
        callbacks: *const CallbackFunctions,
    ) -> Option<Component> {
        // SAFETY: Strings are nul-terminated and borrowed for the call;
        // the caller keeps `callbacks` alive.
        let raw = unsafe {
            (self.instantiate)(
                args.instance_name.as_ptr(),
                args.kind,
                args.guid.as_ptr(),
                args.resource_location.as_ptr(),
                callbacks,
                fmi2_boolean(args.visible),
                fmi2_boolean(args.logging_on),
            )
        };
        Component::from_raw(raw)
    }

    unsafe fn free_instance(&self, component: Component) {
        // SAFETY: The caller guarantees `component` is live.
        unsafe { (self.free_instance)(component.as_ptr()) }
    }

    unsafe fn setup_experiment(&self, component: Component, args: ExperimentArgs) -> Status {
        // SAFETY: The caller guarantees `component` is live.
        let raw = unsafe {
            (self.setup_experiment)(
                component.as_ptr(),
                fmi2_boolean(args.tolerance.is_some()),
                args.tolerance.unwrap_or(0.0),
                args.start_time,
                fmi2_boolean(args.stop_time.is_some()),
                args.stop_time.unwrap_or(0.0),
            )
        };
        Status::from_raw(raw)
    }

    unsafe fn enter_initialization_mode(&self, component: Component) -> Status {
        // SAFETY: The caller guarantees `component` is live.
        Status::from_raw(unsafe { (self.enter_initialization_mode)(component.as_ptr()) })
    }

    unsafe fn exit_initialization_mode(&self, component: Component) -> Status {
        // SAFETY: The caller guarantees `component` is live.
        Status::from_raw(unsafe { (self.exit_initialization_mode)(component.as_ptr()) })
    }

    unsafe fn enter_continuous_time_mode(&self, component: Component) -> Status {
        // SAFETY: The caller guarantees `component` is live.
        Status::from_raw(unsafe { (self.enter_continuous_time_mode)(component.as_ptr()) })
    }

    unsafe fn set_real(
        &self,
        component: Component,
        vrs: &[ValueReference],
        values: &[f64],
    ) -> Status {
        debug_assert_eq!(vrs.len(), values.len());
        // SAFETY: Both slices hold `vrs.len()` elements.
        Status::from_raw(unsafe {
            (self.set_real)(component.as_ptr(), vrs.as_ptr(), vrs.len(), values.as_ptr())
        })
    }

    unsafe fn set_boolean(
        &self,
        component: Component,
        vrs: &[ValueReference],
        values: &[bool],
    ) -> Status {
        debug_assert_eq!(vrs.len(), values.len());
        let values: Vec<c_int> = values.iter().copied().map(fmi2_boolean).collect();
        // SAFETY: Both buffers hold `vrs.len()` elements.
        Status::from_raw(unsafe {
            (self.set_boolean)(component.as_ptr(), vrs.as_ptr(), vrs.len(), values.as_ptr())
        })
    }

    unsafe fn get_real(
        &self,
        component: Component,
        vrs: &[ValueReference],
        values: &mut [f64],
    ) -> Status {
        debug_assert_eq!(vrs.len(), values.len());
        // SAFETY: Both slices hold `vrs.len()` elements.
        Status::from_raw(unsafe {
            (self.get_real)(
                component.as_ptr(),
                vrs.as_ptr(),
                vrs.len(),
                values.as_mut_ptr(),
            )
        })
    }

    unsafe fn get_directional_derivative(
        &self,
        component: Component,
        unknowns: &[ValueReference],
        knowns: &[ValueReference],
        seed: &[f64],
        sensitivity: &mut [f64],
    ) -> Status {
        let Some(get_directional_derivative) = self.get_directional_derivative else {
            return Status::Error;
        };
        debug_assert_eq!(knowns.len(), seed.len());
        debug_assert_eq!(unknowns.len(), sensitivity.len());
        // SAFETY: Seed and sensitivity match the reference list lengths.
        Status::from_raw(unsafe {
            get_directional_derivative(
                component.as_ptr(),
                unknowns.as_ptr(),
                unknowns.len(),
                knowns.as_ptr(),
                knowns.len(),
                seed.as_ptr(),
                sensitivity.as_mut_ptr(),
            )
        })
    }
}
