//! Daemon executable name and search order.

use std::path::{Path, PathBuf};

use super::platform::{Platform, TargetOs};

/// Base name of the tracker daemon executable.
pub const DAEMON_BINARY_NAME: &str = "mtga-tracker-daemon";

/// File name of the daemon executable on `os`.
pub fn daemon_binary_name(os: TargetOs) -> String {
    match os {
        TargetOs::Windows => format!("{DAEMON_BINARY_NAME}.exe"),
        _ => DAEMON_BINARY_NAME.to_string(),
    }
}

/// Candidate locations for the daemon, in the order they should be tried.
///
/// Bundled locations come first (inside `.app/Contents/Resources` on macOS,
/// next to the executable elsewhere), followed by the development layouts
/// where the daemon sits in a `resources/daemon` directory near the build
/// output.
pub fn daemon_search_paths(exec_dir: &Path, platform: Platform) -> Vec<PathBuf> {
    let bin = daemon_binary_name(platform.os);
    let mut paths = Vec::with_capacity(5);

    match platform.os {
        TargetOs::MacOs => {
            // exec_dir is Contents/MacOS
            let resources = exec_dir.parent().unwrap_or(exec_dir).join("Resources");
            if platform.arm64 {
                paths.push(resources.join("daemon-arm64").join(&bin));
            }
            paths.push(resources.join("daemon").join(&bin));
        }
        TargetOs::Windows | TargetOs::Linux => {
            paths.push(exec_dir.join("daemon").join(&bin));
        }
        TargetOs::Other => {}
    }

    let parent = exec_dir.parent().unwrap_or(exec_dir);
    paths.push(parent.join("resources").join("daemon").join(&bin));
    paths.push(exec_dir.join("resources").join("daemon").join(&bin));

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_name_per_os() {
        assert_eq!(daemon_binary_name(TargetOs::Linux), "mtga-tracker-daemon");
        assert_eq!(daemon_binary_name(TargetOs::MacOs), "mtga-tracker-daemon");
        assert_eq!(
            daemon_binary_name(TargetOs::Windows),
            "mtga-tracker-daemon.exe"
        );
    }

    #[test]
    fn test_macos_arm64_prefers_arm_bundle() {
        let exec_dir = Path::new("/Applications/MTGA.app/Contents/MacOS");
        let paths = daemon_search_paths(exec_dir, Platform::new(TargetOs::MacOs, true));

        assert_eq!(
            paths,
            vec![
                PathBuf::from(
                    "/Applications/MTGA.app/Contents/Resources/daemon-arm64/mtga-tracker-daemon"
                ),
                PathBuf::from("/Applications/MTGA.app/Contents/Resources/daemon/mtga-tracker-daemon"),
                PathBuf::from("/Applications/MTGA.app/Contents/resources/daemon/mtga-tracker-daemon"),
                PathBuf::from(
                    "/Applications/MTGA.app/Contents/MacOS/resources/daemon/mtga-tracker-daemon"
                ),
            ]
        );
    }

    #[test]
    fn test_macos_intel_skips_arm_bundle() {
        let exec_dir = Path::new("/Applications/MTGA.app/Contents/MacOS");
        let paths = daemon_search_paths(exec_dir, Platform::new(TargetOs::MacOs, false));

        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| !p.to_string_lossy().contains("daemon-arm64")));
    }

    #[test]
    fn test_linux_search_order() {
        let exec_dir = Path::new("/opt/mtgac/bin");
        let paths = daemon_search_paths(exec_dir, Platform::new(TargetOs::Linux, false));

        assert_eq!(
            paths,
            vec![
                PathBuf::from("/opt/mtgac/bin/daemon/mtga-tracker-daemon"),
                PathBuf::from("/opt/mtgac/resources/daemon/mtga-tracker-daemon"),
                PathBuf::from("/opt/mtgac/bin/resources/daemon/mtga-tracker-daemon"),
            ]
        );
    }

    #[test]
    fn test_windows_uses_exe_suffix() {
        let exec_dir = Path::new("install");
        let paths = daemon_search_paths(exec_dir, Platform::new(TargetOs::Windows, false));

        assert_eq!(paths.len(), 3);
        assert!(
            paths
                .iter()
                .all(|p| p.file_name().unwrap() == "mtga-tracker-daemon.exe")
        );
        assert_eq!(paths[0], Path::new("install").join("daemon").join("mtga-tracker-daemon.exe"));
    }

    #[test]
    fn test_other_os_only_dev_fallbacks() {
        let paths = daemon_search_paths(
            Path::new("/usr/local/bin"),
            Platform::new(TargetOs::Other, false),
        );
        assert_eq!(paths.len(), 2);
    }
}
