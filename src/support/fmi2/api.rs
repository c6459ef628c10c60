//! Raw FMI 2.0 types and the capability table over the native calls.

use std::{
    ffi::{CStr, c_char, c_int, c_uint, c_void},
    ptr::{self, NonNull},
};

use super::Status;

/// Identifier of one scalar variable inside a unit (`fmi2ValueReference`).
pub type ValueReference = c_uint;

/// `fmi2Boolean` is a C `int`.
pub(crate) const FMI2_TRUE: c_int = 1;
pub(crate) const FMI2_FALSE: c_int = 0;

/// Opaque handle to one instantiated unit (`fmi2Component`).
///
/// A component is only meaningful to the [`Fmi2Api`] that created it,
/// and only between instantiation and `fmi2FreeInstance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component(NonNull<c_void>);

impl Component {
    /// Wraps a raw handle, returning `None` for null.
    #[must_use]
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// Returns the raw handle.
    #[must_use]
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Interface kind requested at instantiation (`fmi2Type`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    ModelExchange = 0,
    CoSimulation = 1,
}

/// Logger callback; variadic in the FMI headers.
pub type LoggerFn = unsafe extern "C" fn(
    environment: *mut c_void,
    instance_name: *const c_char,
    status: c_int,
    category: *const c_char,
    message: *const c_char,
    ...
);
pub type AllocateMemoryFn = unsafe extern "C" fn(nobj: usize, size: usize) -> *mut c_void;
pub type FreeMemoryFn = unsafe extern "C" fn(obj: *mut c_void);
pub type StepFinishedFn = unsafe extern "C" fn(environment: *mut c_void, status: c_int);

/// Callback table handed to `fmi2Instantiate` (`fmi2CallbackFunctions`).
///
/// A unit may keep the pointer it receives, so the table must stay at a
/// fixed address until the component is freed.
#[repr(C)]
pub struct CallbackFunctions {
    pub logger: Option<LoggerFn>,
    pub allocate_memory: Option<AllocateMemoryFn>,
    pub free_memory: Option<FreeMemoryFn>,
    pub step_finished: Option<StepFinishedFn>,
    pub component_environment: *mut c_void,
}

impl CallbackFunctions {
    /// Heap allocation through the C allocator and nothing else.
    #[must_use]
    pub fn heap_only() -> Self {
        Self {
            logger: None,
            allocate_memory: Some(libc::calloc as AllocateMemoryFn),
            free_memory: Some(libc::free as FreeMemoryFn),
            step_finished: None,
            component_environment: ptr::null_mut(),
        }
    }
}

/// Raw arguments of `fmi2SetupExperiment`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExperimentArgs {
    pub tolerance: Option<f64>,
    pub start_time: f64,
    pub stop_time: Option<f64>,
}

/// Arguments of `fmi2Instantiate` other than the callback table.
#[derive(Debug, Clone, Copy)]
pub struct InstantiateArgs<'a> {
    pub instance_name: &'a CStr,
    pub kind: UnitKind,
    pub guid: &'a CStr,
    pub resource_location: &'a CStr,
    pub visible: bool,
    pub logging_on: bool,
}

/// Capability table of the FMI 2.0 operations this crate drives.
///
/// [`Fmi2Library`](super::Fmi2Library) implements it over function pointers
/// resolved from a shared library. [`Instance`](super::Instance) is the only
/// caller and upholds the safety contracts below.
pub trait Fmi2Api {
    /// Whether `fmi2GetDirectionalDerivative` is available.
    fn provides_directional_derivative(&self) -> bool;

    /// Calls `fmi2Instantiate`; `None` means the unit returned null.
    ///
    /// # Safety
    ///
    /// `callbacks` must stay valid and pinned until the returned component
    /// is passed to [`Fmi2Api::free_instance`].
    unsafe fn instantiate(
        &self,
        args: &InstantiateArgs<'_>,
        callbacks: *const CallbackFunctions,
    ) -> Option<Component>;

    /// Calls `fmi2FreeInstance`.
    ///
    /// # Safety
    ///
    /// `component` must come from this api's `instantiate` and must not have
    /// been freed. It must not be used afterwards.
    unsafe fn free_instance(&self, component: Component);

    /// Calls `fmi2SetupExperiment`.
    ///
    /// # Safety
    ///
    /// `component` must be live (see [`Fmi2Api::free_instance`]).
    unsafe fn setup_experiment(&self, component: Component, args: ExperimentArgs) -> Status;

    /// Calls `fmi2EnterInitializationMode`.
    ///
    /// # Safety
    ///
    /// `component` must be live.
    unsafe fn enter_initialization_mode(&self, component: Component) -> Status;

    /// Calls `fmi2ExitInitializationMode`.
    ///
    /// # Safety
    ///
    /// `component` must be live.
    unsafe fn exit_initialization_mode(&self, component: Component) -> Status;

    /// Calls `fmi2EnterContinuousTimeMode`.
    ///
    /// # Safety
    ///
    /// `component` must be live.
    unsafe fn enter_continuous_time_mode(&self, component: Component) -> Status;

    /// Calls `fmi2SetReal`.
    ///
    /// # Safety
    ///
    /// `component` must be live and `vrs.len() == values.len()`.
    unsafe fn set_real(
        &self,
        component: Component,
        vrs: &[ValueReference],
        values: &[f64],
    ) -> Status;

    /// Calls `fmi2SetBoolean`.
    ///
    /// # Safety
    ///
    /// `component` must be live and `vrs.len() == values.len()`.
    unsafe fn set_boolean(
        &self,
        component: Component,
        vrs: &[ValueReference],
        values: &[bool],
    ) -> Status;

    /// Calls `fmi2GetReal`.
    ///
    /// # Safety
    ///
    /// `component` must be live and `vrs.len() == values.len()`.
    unsafe fn get_real(
        &self,
        component: Component,
        vrs: &[ValueReference],
        values: &mut [f64],
    ) -> Status;

    /// Calls `fmi2GetDirectionalDerivative`, computing
    /// `sensitivity = d(unknowns)/d(knowns) * seed`.
    ///
    /// Returns [`Status::Error`] without a native call if the capability is absent.
    ///
    /// # Safety
    ///
    /// `component` must be live, `seed.len() == knowns.len()` and
    /// `sensitivity.len() == unknowns.len()`.
    unsafe fn get_directional_derivative(
        &self,
        component: Component,
        unknowns: &[ValueReference],
        knowns: &[ValueReference],
        seed: &[f64],
        sensitivity: &mut [f64],
    ) -> Status;
}
