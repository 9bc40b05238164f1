//! CLI configuration file.
//!
//! Looked up in order: `$PVW_CONFIG`, `./provwatch.toml`, then
//! `<config dir>/provwatch/config.toml`. A missing file yields defaults;
//! a present but unparseable file is an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Keys accepted in `provwatch.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default output format: `pretty`, `text`, or `json`. Flags and the
    /// `FORMAT` env var win over this.
    #[serde(default)]
    pub format: Option<String>,

    /// Bound for the pre-snapshot event queue used by `pvw watch`.
    #[serde(default)]
    pub queue_cap: Option<usize>,
}

impl CliConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(explicit) = env::var("PVW_CONFIG") {
        paths.push(PathBuf::from(explicit));
    }
    paths.push(PathBuf::from("provwatch.toml"));
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("provwatch/config.toml"));
    }
    paths
}

/// Load the first config file found, or defaults when none exists.
pub fn load_config() -> Result<CliConfig> {
    for path in candidate_paths() {
        if path.exists() {
            return CliConfig::load_from(&path);
        }
    }
    Ok(CliConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_all_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "format = \"json\"\nqueue_cap = 64").unwrap();
        let config = CliConfig::load_from(file.path()).unwrap();
        assert_eq!(config.format.as_deref(), Some("json"));
        assert_eq!(config.queue_cap, Some(64));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = CliConfig::load_from(file.path()).unwrap();
        assert!(config.format.is_none());
        assert!(config.queue_cap.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "format = [not toml").unwrap();
        let err = CliConfig::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
