//! Binary locator port.
//!
//! Resolves the daemon executable. Candidate generation is pure and lives
//! in [`crate::paths`]; implementations only decide which candidate exists.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while resolving the daemon executable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    /// An explicit path was configured but nothing exists there.
    #[error("configured binary not found: {}", .0.display())]
    ConfiguredNotFound(PathBuf),

    /// The directory of the running executable could not be determined.
    #[error("failed to determine executable directory: {0}")]
    ExecutableDir(String),

    /// None of the platform candidates exist.
    #[error("daemon binary not found in any search path: {searched:?}")]
    NotFound { searched: Vec<PathBuf> },
}

/// Port for resolving the daemon executable path.
pub trait BinaryLocator: Send + Sync {
    /// Resolve the executable.
    ///
    /// When `configured` is set it is used verbatim and must exist; otherwise
    /// the platform search paths are tried in order.
    fn locate(&self, configured: Option<&Path>) -> Result<PathBuf, LocateError>;
}
