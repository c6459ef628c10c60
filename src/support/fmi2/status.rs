use std::{ffi::c_int, fmt};

/// Return status of an FMI 2.0 function call (`fmi2Status`).
///
/// Only [`Status::Ok`] counts as success anywhere in this crate.
/// The remaining codes are kept distinct so errors can report exactly what
/// the unit answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    Warning,
    Discard,
    Error,
    Fatal,
    Pending,
    /// A value outside the codes defined by FMI 2.0.
    Unknown(c_int),
}

impl Status {
    /// Decodes a raw `fmi2Status` value.
    #[must_use]
    pub fn from_raw(raw: c_int) -> Self {
        match raw {
            0 => Self::Ok,
            1 => Self::Warning,
            2 => Self::Discard,
            3 => Self::Error,
            4 => Self::Fatal,
            5 => Self::Pending,
            other => Self::Unknown(other),
        }
    }

    /// Returns `true` only for [`Status::Ok`].
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("fmi2OK"),
            Self::Warning => f.write_str("fmi2Warning"),
            Self::Discard => f.write_str("fmi2Discard"),
            Self::Error => f.write_str("fmi2Error"),
            Self::Fatal => f.write_str("fmi2Fatal"),
            Self::Pending => f.write_str("fmi2Pending"),
            Self::Unknown(raw) => write!(f, "unknown status {raw}"),
        }
    }
}
