use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, RetailerError};

/// Project configuration file name.
pub const PROJECT_CONFIG_FILE: &str = "retailer.json";

/// Represents the source of a configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Default built-in value
    Default,
    /// From global config (~/.config/retailer/config.json or RETAILER_HOME)
    Global,
    /// From project retailer.json
    Project,
    /// From environment variable
    Environment(String),
    /// Programmatically set
    Command,
}

impl ConfigSource {
    pub fn as_str(&self) -> &str {
        match self {
            ConfigSource::Default => "default",
            ConfigSource::Global => "global",
            ConfigSource::Project => "project",
            ConfigSource::Environment(var) => var,
            ConfigSource::Command => "command",
        }
    }
}

/// Raw configuration data as loaded from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<HashMap<String, serde_json::Value>>,
}

/// Loads configuration from files and the environment
#[derive(Debug)]
pub struct ConfigLoader {
    use_environment: bool,
}

impl ConfigLoader {
    pub fn new(use_environment: bool) -> Self {
        Self { use_environment }
    }

    /// Get a RETAILER_* environment variable
    pub fn get_retailer_env(&self, var: &str) -> Option<String> {
        if !self.use_environment {
            return None;
        }

        env::var(var).ok().filter(|s| !s.is_empty())
    }

    /// Get the retailer home directory (global config lives here)
    pub fn get_retailer_home(&self) -> PathBuf {
        if let Some(home) = self.get_retailer_env("RETAILER_HOME") {
            return PathBuf::from(home);
        }

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "retailer") {
            proj_dirs.config_dir().to_path_buf()
        } else if let Some(home_dir) = directories::BaseDirs::new() {
            home_dir.home_dir().join(".retailer")
        } else {
            PathBuf::from(".retailer")
        }
    }

    /// Get the default cache directory
    pub fn get_cache_dir(&self) -> PathBuf {
        if let Some(cache) = self.get_retailer_env("RETAILER_CACHE_DIR") {
            return PathBuf::from(cache);
        }

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "retailer") {
            proj_dirs.cache_dir().to_path_buf()
        } else {
            self.get_retailer_home().join("cache")
        }
    }

    /// Load configuration from a JSON file; a missing file is empty config
    pub fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<RawConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(RawConfig::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| RetailerError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: RawConfig = serde_json::from_str(&contents)
            .map_err(|e| RetailerError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        Ok(config)
    }

    pub fn load_global_config(&self) -> Result<RawConfig> {
        self.load_config_file(self.get_retailer_home().join("config.json"))
    }

    pub fn load_project_config<P: AsRef<Path>>(&self, project_dir: P) -> Result<RawConfig> {
        self.load_config_file(project_dir.as_ref().join(PROJECT_CONFIG_FILE))
    }

    /// Name of the environment variable for a key: "foo-bar" -> "RETAILER_FOO_BAR"
    pub fn env_var_name(key: &str) -> String {
        format!("RETAILER_{}", key.replace('-', "_").to_uppercase())
    }

    /// Get a configuration value from its environment variable
    pub fn get_env_config(&self, key: &str) -> Option<String> {
        self.get_retailer_env(&Self::env_var_name(key))
    }

    pub fn get_env_u64(&self, key: &str) -> Option<u64> {
        self.get_env_config(key).and_then(|val| val.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_source_as_str() {
        assert_eq!(ConfigSource::Default.as_str(), "default");
        assert_eq!(ConfigSource::Project.as_str(), "project");
        assert_eq!(
            ConfigSource::Environment("RETAILER_VENDOR".to_string()).as_str(),
            "RETAILER_VENDOR"
        );
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(ConfigLoader::env_var_name("vendor"), "RETAILER_VENDOR");
        assert_eq!(
            ConfigLoader::env_var_name("parts-repository-url"),
            "RETAILER_PARTS_REPOSITORY_URL"
        );
    }

    #[test]
    fn test_env_disabled() {
        let loader = ConfigLoader::new(false);
        assert_eq!(loader.get_retailer_env("HOME"), None);
        assert_eq!(loader.get_env_config("vendor"), None);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(false);

        let raw = loader.load_project_config(temp_dir.path()).unwrap();
        assert!(raw.config.is_none());
    }

    #[test]
    fn test_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(PROJECT_CONFIG_FILE), "{ nope").unwrap();

        let loader = ConfigLoader::new(false);
        let err = loader.load_project_config(temp_dir.path()).unwrap_err();
        assert!(matches!(err, RetailerError::Config(_)));
    }
}
