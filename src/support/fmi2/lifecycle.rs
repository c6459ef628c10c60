/// Position of a unit in the FMI 2.0 model-exchange lifecycle.
///
/// States only ever advance, one step at a time, in declaration order.
/// `Unloaded` and `Loaded` describe the library before any component exists;
/// an [`Instance`](super::Instance) starts at `Instantiated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    Unloaded,
    Loaded,
    Instantiated,
    ExperimentConfigured,
    Initializing,
    ContinuousTime,
    Released,
}

impl LifecycleState {
    /// The state reached by the one transition allowed from `self`.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Unloaded => Some(Self::Loaded),
            Self::Loaded => Some(Self::Instantiated),
            Self::Instantiated => Some(Self::ExperimentConfigured),
            Self::ExperimentConfigured => Some(Self::Initializing),
            Self::Initializing => Some(Self::ContinuousTime),
            Self::ContinuousTime => Some(Self::Released),
            Self::Released => None,
        }
    }

    /// Whether set/get and directional derivative calls are valid.
    #[must_use]
    pub fn accepts_evaluation(self) -> bool {
        self == Self::ContinuousTime
    }
}
