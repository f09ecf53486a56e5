//! Path candidates for the bundled daemon executable.
//!
//! Everything here is pure: callers pass the executable directory and the
//! target platform, so the search order can be tested for every OS from any
//! host. Existence checks belong to the `BinaryLocator` implementation.

mod daemon;
mod platform;

pub use daemon::{DAEMON_BINARY_NAME, daemon_binary_name, daemon_search_paths};
pub use platform::{Platform, TargetOs};
