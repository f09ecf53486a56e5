//! Target platform description used for path resolution.

/// Operating system families with distinct bundle layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    MacOs,
    Windows,
    Linux,
    Other,
}

/// OS plus the one architecture detail that changes the search order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: TargetOs,
    /// Apple Silicon bundles ship a dedicated `daemon-arm64` directory.
    pub arm64: bool,
}

impl Platform {
    pub const fn new(os: TargetOs, arm64: bool) -> Self {
        Self { os, arm64 }
    }

    /// The platform this binary was compiled for.
    pub const fn current() -> Self {
        let os = if cfg!(target_os = "macos") {
            TargetOs::MacOs
        } else if cfg!(target_os = "windows") {
            TargetOs::Windows
        } else if cfg!(target_os = "linux") {
            TargetOs::Linux
        } else {
            TargetOs::Other
        };
        Self {
            os,
            arm64: cfg!(target_arch = "aarch64"),
        }
    }
}
