//! FMU directory layout for a given host platform.

use std::path::{Path, PathBuf};

/// Operating system family, as far as FMU binary layout is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Windows,
    MacOs,
    /// Linux and every other Unix-like system.
    Linux,
}

/// Pointer width of the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerWidth {
    Bits32,
    Bits64,
}

/// Explicit platform descriptor used to locate an FMU binary.
///
/// Every mapping is a pure function of the descriptor, so paths for any
/// platform can be computed on any host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: Os,
    pub pointer_width: PointerWidth,
}

impl Platform {
    /// The platform this crate was compiled for.
    #[must_use]
    pub fn host() -> Self {
        let os = if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "macos") {
            Os::MacOs
        } else {
            Os::Linux
        };
        let pointer_width = if cfg!(target_pointer_width = "32") {
            PointerWidth::Bits32
        } else {
            PointerWidth::Bits64
        };
        Self { os, pointer_width }
    }

    /// Name of the `binaries/` subdirectory for this platform.
    #[must_use]
    pub fn binaries_dir(self) -> &'static str {
        match (self.os, self.pointer_width) {
            (Os::Windows, PointerWidth::Bits32) => "win32",
            (Os::Windows, PointerWidth::Bits64) => "win64",
            (Os::MacOs, PointerWidth::Bits32) => "darwin32",
            (Os::MacOs, PointerWidth::Bits64) => "darwin64",
            (Os::Linux, PointerWidth::Bits32) => "linux32",
            (Os::Linux, PointerWidth::Bits64) => "linux64",
        }
    }

    /// Shared library file extension, including the dot.
    #[must_use]
    pub fn library_suffix(self) -> &'static str {
        match self.os {
            Os::Windows => ".dll",
            Os::MacOs => ".dylib",
            Os::Linux => ".so",
        }
    }
}

/// Where an unpacked FMU keeps its binary and resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLocation {
    base: PathBuf,
    model_name: String,
    platform: Platform,
}

impl ModelLocation {
    #[must_use]
    pub fn new(base: impl Into<PathBuf>, model_name: impl Into<String>, platform: Platform) -> Self {
        Self {
            base: base.into(),
            model_name: model_name.into(),
            platform,
        }
    }

    /// Unpacked FMU root directory.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `<base>/binaries/<platform>/<model_name><suffix>`
    #[must_use]
    pub fn binary_path(&self) -> PathBuf {
        let file_name = format!("{}{}", self.model_name, self.platform.library_suffix());
        self.base
            .join("binaries")
            .join(self.platform.binaries_dir())
            .join(file_name)
    }

    /// `file:<base>/resources/`, as handed to `fmi2Instantiate`.
    #[must_use]
    pub fn resource_uri(&self) -> String {
        format!("file:{}/resources/", self.base.display())
    }
}
