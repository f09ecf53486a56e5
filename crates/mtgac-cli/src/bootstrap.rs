//! CLI bootstrap - the composition root.
//!
//! Settings are layered: built-in defaults, then the optional JSON settings
//! file, then command-line/environment overrides. The result is validated
//! once and every handler sees the same effective settings.

use std::path::Path;
use std::sync::Arc;

use mtgac_core::ports::{BinaryLocator, HealthProbe};
use mtgac_core::{DaemonSettings, SupervisorConfig, validate_settings};
use mtgac_runtime::{FsBinaryLocator, HttpHealthProbe, Supervisor};
use tracing::debug;

use crate::error::CliError;
use crate::parser::Cli;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Effective, validated daemon settings.
    pub settings: DaemonSettings,
}

impl CliConfig {
    /// Layer defaults, the settings file and command-line overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut settings = DaemonSettings::with_defaults();
        if let Some(path) = &cli.config {
            settings.merge(&load_settings_file(path)?);
        }
        settings.merge(&cli.overrides());
        validate_settings(&settings)?;
        Ok(Self { settings })
    }
}

/// Read a JSON settings file. Unknown fields are rejected.
pub fn load_settings_file(path: &Path) -> Result<DaemonSettings, CliError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    let settings = serde_json::from_str(&raw)
        .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), "Loaded settings file");
    Ok(settings)
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    pub settings: DaemonSettings,
    pub locator: Arc<dyn BinaryLocator>,
    pub probe: Arc<dyn HealthProbe>,
}

impl CliContext {
    /// Supervisor configuration derived from the effective settings.
    pub fn supervisor_config(&self) -> SupervisorConfig {
        self.settings.to_config()
    }

    /// Build a supervisor sharing this context's locator and probe.
    pub fn supervisor(&self, config: SupervisorConfig) -> Supervisor {
        Supervisor::new(config, Arc::clone(&self.locator), Arc::clone(&self.probe))
    }
}

/// Bootstrap the CLI application.
pub fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let probe = HttpHealthProbe::new().map_err(|e| CliError::Config(e.to_string()))?;
    Ok(CliContext {
        settings: config.settings,
        locator: Arc::new(FsBinaryLocator::new()),
        probe: Arc::new(probe),
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::NamedTempFile;

    use super::*;

    fn settings_file(contents: &str) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), contents).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file_or_flags() {
        let cli = Cli::parse_from(["mtgac", "config"]);
        let config = CliConfig::from_cli(&cli).unwrap();
        assert_eq!(config.settings, DaemonSettings::with_defaults());
    }

    #[test]
    fn test_flags_override_file() {
        let file = settings_file(r#"{"port": 12000, "max_restart_attempts": 2}"#);
        let cli = Cli::parse_from([
            "mtgac",
            "--config",
            file.path().to_str().unwrap(),
            "--port",
            "12001",
            "config",
        ]);
        let settings = CliConfig::from_cli(&cli).unwrap().settings;

        assert_eq!(settings.port, Some(12001));
        assert_eq!(settings.max_restart_attempts, Some(2));
        assert_eq!(settings.auto_restart, Some(true));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let cli = Cli::parse_from(["mtgac", "--port", "80", "config"]);
        let err = CliConfig::from_cli(&cli).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_unknown_setting_rejected() {
        let file = settings_file(r#"{"prot": 12000}"#);
        let err = load_settings_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("unknown field `prot`"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_settings_file(Path::new("/nonexistent/mtgac.json")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let file = settings_file("{ port: ");
        let err = load_settings_file(file.path()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
