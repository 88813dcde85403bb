//! `forma.toml` loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use forma_core::UserId;
use forma_progress::ProgressConfig;
use forma_session::SessionConfig;
use serde::{Deserialize, Serialize};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "forma.toml";

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Storage root
    pub data_dir: PathBuf,
    /// Owner of everything created from this CLI; generated and kept in the
    /// data directory when unset
    pub user: Option<UserId>,
    /// Progress tracker settings
    pub progress: ProgressConfig,
    /// Session engine settings
    pub session: SessionConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".forma"),
            user: None,
            progress: ProgressConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load from an explicit path, else `forma.toml` in the working
    /// directory, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from_file(config_path);
        }

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::load_from_file(Path::new(DEFAULT_CONFIG_FILE));
        }

        Ok(Self::default())
    }

    /// Load from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_progress::NoTargetPolicy;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
data_dir = "/var/lib/forma"

[progress]
no_target = "zero"
"#
        )
        .unwrap();

        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/forma"));
        assert_eq!(config.progress.no_target, NoTargetPolicy::Zero);
        assert!(config.progress.clamp_at_zero);
        assert!(config.session.allow_unplanned_exercises);
        assert_eq!(config.user, None);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data_dir = [").unwrap();
        let err = CliConfig::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
