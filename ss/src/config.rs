//! Configuration for sheetstore

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the sheet store directory
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Range used by `show` when none is given
    #[serde(default = "default_range")]
    pub default_range: String,
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sheetstore")
}

fn default_range() -> String {
    crate::DEFAULT_RANGE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            default_range: default_range(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            return Ok(config);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("sheetstore").join("config.yml")),
            Some(PathBuf::from("sheetstore.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Config::default())
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        let config = Config {
            store_path: temp.path().join("sheets"),
            default_range: "A:F".to_string(),
        };
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.store_path, temp.path().join("sheets"));
        assert_eq!(loaded.default_range, "A:F");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("store_path: /tmp/sheets\n").unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/sheets"));
        assert_eq!(config.default_range, "A:Z");
    }
}
