//! Filesystem-backed daemon binary resolution.

use std::path::{Path, PathBuf};

use mtgac_core::paths::{Platform, daemon_search_paths};
use mtgac_core::ports::{BinaryLocator, LocateError};
use tracing::debug;

/// [`BinaryLocator`] that checks the platform search paths on disk.
///
/// The search is anchored at the directory of the running executable unless
/// an explicit directory is supplied.
#[derive(Debug, Clone)]
pub struct FsBinaryLocator {
    exec_dir: Option<PathBuf>,
    platform: Platform,
}

impl Default for FsBinaryLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl FsBinaryLocator {
    pub const fn new() -> Self {
        Self {
            exec_dir: None,
            platform: Platform::current(),
        }
    }

    /// Anchor the search at `dir` instead of the current executable's directory.
    #[must_use]
    pub fn with_exec_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exec_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub const fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Every candidate path in search order.
    pub fn search_paths(&self) -> Result<Vec<PathBuf>, LocateError> {
        let exec_dir = self.exec_dir()?;
        Ok(daemon_search_paths(&exec_dir, self.platform))
    }

    fn exec_dir(&self) -> Result<PathBuf, LocateError> {
        if let Some(dir) = &self.exec_dir {
            return Ok(dir.clone());
        }
        let exe = std::env::current_exe().map_err(|e| LocateError::ExecutableDir(e.to_string()))?;
        exe.parent().map(Path::to_path_buf).ok_or_else(|| {
            LocateError::ExecutableDir(format!("{} has no parent directory", exe.display()))
        })
    }
}

impl BinaryLocator for FsBinaryLocator {
    fn locate(&self, configured: Option<&Path>) -> Result<PathBuf, LocateError> {
        if let Some(path) = configured {
            if path.exists() {
                debug!(path = %path.display(), "Using configured daemon binary");
                return Ok(path.to_path_buf());
            }
            return Err(LocateError::ConfiguredNotFound(path.to_path_buf()));
        }

        let searched = self.search_paths()?;
        for candidate in &searched {
            if candidate.exists() {
                debug!(path = %candidate.display(), "Found daemon binary");
                return Ok(candidate.clone());
            }
            debug!(path = %candidate.display(), "Daemon binary not at candidate path");
        }

        Err(LocateError::NotFound { searched })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use mtgac_core::paths::TargetOs;
    use tempfile::tempdir;

    use super::*;

    fn linux_locator(exec_dir: &Path) -> FsBinaryLocator {
        FsBinaryLocator::new()
            .with_exec_dir(exec_dir)
            .with_platform(Platform::new(TargetOs::Linux, false))
    }

    #[test]
    fn test_configured_path_used_verbatim() {
        let dir = tempdir().unwrap();
        let binary = dir.path().join("custom-daemon");
        fs::write(&binary, b"").unwrap();

        let locator = linux_locator(dir.path());
        assert_eq!(locator.locate(Some(&binary)).unwrap(), binary);
    }

    #[test]
    fn test_configured_path_missing() {
        let dir = tempdir().unwrap();
        let binary = dir.path().join("missing");

        let err = linux_locator(dir.path()).locate(Some(&binary)).unwrap_err();
        assert_eq!(err, LocateError::ConfiguredNotFound(binary));
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let root = tempdir().unwrap();
        let exec_dir = root.path().join("bin");

        // Both the bundled and the dev fallback locations exist
        let bundled = exec_dir.join("daemon").join("mtga-tracker-daemon");
        let dev = root.path().join("resources/daemon/mtga-tracker-daemon");
        for path in [&bundled, &dev] {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"").unwrap();
        }

        assert_eq!(linux_locator(&exec_dir).locate(None).unwrap(), bundled);
    }

    #[test]
    fn test_dev_fallback_found() {
        let root = tempdir().unwrap();
        let exec_dir = root.path().join("target").join("debug");
        let dev = root
            .path()
            .join("target")
            .join("resources/daemon/mtga-tracker-daemon");
        fs::create_dir_all(dev.parent().unwrap()).unwrap();
        fs::write(&dev, b"").unwrap();

        assert_eq!(linux_locator(&exec_dir).locate(None).unwrap(), dev);
    }

    #[test]
    fn test_not_found_lists_every_candidate() {
        let root = tempdir().unwrap();
        let locator = linux_locator(root.path());

        match locator.locate(None) {
            Err(LocateError::NotFound { searched }) => {
                assert_eq!(searched, locator.search_paths().unwrap());
                assert_eq!(searched.len(), 3);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
