use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::source::{ConfigLoader, ConfigSource, RawConfig};
use crate::error::{Result, RetailerError};
use crate::resolver::PackageSource;
use crate::util::Vendor;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Vendor prefix of canonical solution package names
    #[serde(rename = "vendor", skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,

    // Package sources handed to the dry run
    #[serde(rename = "solutions-repository-url", skip_serializing_if = "Option::is_none")]
    pub solutions_repository_url: Option<String>,

    #[serde(rename = "parts-repository-url", skip_serializing_if = "Option::is_none")]
    pub parts_repository_url: Option<String>,

    #[serde(rename = "public-repository-url", skip_serializing_if = "Option::is_none")]
    pub public_repository_url: Option<String>,

    // Dry run
    #[serde(rename = "composer-binary", skip_serializing_if = "Option::is_none")]
    pub composer_binary: Option<PathBuf>,

    #[serde(rename = "dry-run-timeout", default = "default_dry_run_timeout")]
    pub dry_run_timeout: u64,

    // Parts catalogue cache
    #[serde(rename = "catalogue-ttl", default = "default_catalogue_ttl")]
    pub catalogue_ttl: u64,

    #[serde(rename = "cache-dir", skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    #[serde(rename = "http-timeout", default = "default_http_timeout")]
    pub http_timeout: u64,

    // Internal tracking
    #[serde(skip)]
    base_dir: Option<PathBuf>,

    #[serde(skip)]
    sources: HashMap<String, ConfigSource>,
}

fn default_public_repository_url() -> Option<String> {
    Some("https://repo.packagist.org".to_string())
}

fn default_dry_run_timeout() -> u64 {
    120
}

fn default_catalogue_ttl() -> u64 {
    900 // 15 minutes
}

fn default_http_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vendor: None,
            solutions_repository_url: None,
            parts_repository_url: None,
            public_repository_url: default_public_repository_url(),
            composer_binary: None,
            dry_run_timeout: default_dry_run_timeout(),
            catalogue_ttl: default_catalogue_ttl(),
            cache_dir: None,
            http_timeout: default_http_timeout(),
            base_dir: None,
            sources: HashMap::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        let mut config = Self::default();
        config.base_dir = Some(base_dir.as_ref().to_path_buf());
        config
    }

    /// Build configuration from all sources (defaults, global, project, env)
    pub fn build<P: AsRef<Path>>(project_dir: Option<P>, use_environment: bool) -> Result<Self> {
        let loader = ConfigLoader::new(use_environment);
        let mut config = Self::default();

        if let Some(ref dir) = project_dir {
            config.base_dir = Some(dir.as_ref().to_path_buf());
        }

        for key in Self::config_keys() {
            config.sources.insert(key.to_string(), ConfigSource::Default);
        }

        // 1. Global config
        let global_config = loader.load_global_config()?;
        config.merge_raw_config(global_config, ConfigSource::Global)?;

        // 2. Project retailer.json
        if let Some(project_dir) = &project_dir {
            let project_config = loader.load_project_config(project_dir)?;
            config.merge_raw_config(project_config, ConfigSource::Project)?;
        }

        // 3. Environment overrides
        if use_environment {
            config.apply_env_overrides(&loader);
        }

        if config.cache_dir.is_none() {
            config.cache_dir = Some(loader.get_cache_dir());
        }

        Ok(config)
    }

    /// Set a value programmatically (e.g. from a command line flag)
    pub fn set(&mut self, key: &str, value: serde_json::Value) -> Result<()> {
        self.merge_config_value(key, value, ConfigSource::Command)
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Get the source of a configuration value
    pub fn get_source(&self, key: &str) -> Option<&ConfigSource> {
        self.sources.get(key)
    }

    /// The validated vendor prefix
    pub fn vendor(&self) -> Result<Vendor> {
        match self.vendor.as_deref() {
            Some(vendor) => Vendor::new(vendor),
            None => Err(RetailerError::Config(
                "\"vendor\" is not configured".to_string(),
            )),
        }
    }

    /// Configured package sources, in resolution order: solutions, parts, public.
    ///
    /// Unset sources are left out; a set but malformed URL is an error.
    pub fn package_sources(&self) -> Result<Vec<PackageSource>> {
        let candidates = [
            ("solutions", &self.solutions_repository_url),
            ("parts", &self.parts_repository_url),
            ("public", &self.public_repository_url),
        ];

        let mut sources = Vec::new();
        for (name, url) in candidates {
            if let Some(url) = url {
                validate_url(name, url)?;
                sources.push(PackageSource::composer(name, url.as_str()));
            }
        }
        Ok(sources)
    }

    /// Cache directory (resolved against the base directory if relative)
    pub fn get_cache_dir(&self, loader: &ConfigLoader) -> PathBuf {
        match self.cache_dir {
            Some(ref cache_dir) => self.resolve_path(cache_dir),
            None => loader.get_cache_dir(),
        }
    }

    pub fn composer_binary(&self) -> Option<PathBuf> {
        self.composer_binary.as_ref().map(|path| {
            // Bare names are looked up on PATH
            if path.components().count() == 1 {
                path.clone()
            } else {
                self.resolve_path(path)
            }
        })
    }

    pub fn dry_run_timeout(&self) -> Duration {
        Duration::from_secs(self.dry_run_timeout)
    }

    pub fn catalogue_ttl(&self) -> Duration {
        Duration::from_secs(self.catalogue_ttl)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(ref base) = self.base_dir {
            base.join(path)
        } else {
            path.to_path_buf()
        }
    }

    fn merge_raw_config(&mut self, raw: RawConfig, source: ConfigSource) -> Result<()> {
        if let Some(config_map) = raw.config {
            for (key, value) in config_map {
                self.merge_config_value(&key, value, source.clone())?;
            }
        }
        Ok(())
    }

    fn merge_config_value(
        &mut self,
        key: &str,
        value: serde_json::Value,
        source: ConfigSource,
    ) -> Result<()> {
        match key {
            "vendor" => {
                if let Some(s) = value.as_str() {
                    Vendor::new(s)?;
                    self.vendor = Some(s.to_string());
                    self.sources.insert(key.to_string(), source);
                }
            }
            "solutions-repository-url" => {
                self.solutions_repository_url = optional_string(&value);
                self.sources.insert(key.to_string(), source);
            }
            "parts-repository-url" => {
                self.parts_repository_url = optional_string(&value);
                self.sources.insert(key.to_string(), source);
            }
            "public-repository-url" => {
                // `false` disables the public source
                self.public_repository_url = optional_string(&value);
                self.sources.insert(key.to_string(), source);
            }
            "composer-binary" => {
                self.composer_binary = optional_string(&value).map(PathBuf::from);
                self.sources.insert(key.to_string(), source);
            }
            "dry-run-timeout" => {
                if let Some(n) = value.as_u64() {
                    self.dry_run_timeout = n;
                    self.sources.insert(key.to_string(), source);
                }
            }
            "catalogue-ttl" => {
                if let Some(n) = value.as_u64() {
                    self.catalogue_ttl = n;
                    self.sources.insert(key.to_string(), source);
                }
            }
            "cache-dir" => {
                if let Some(s) = value.as_str() {
                    self.cache_dir = Some(PathBuf::from(s));
                    self.sources.insert(key.to_string(), source);
                }
            }
            "http-timeout" => {
                if let Some(n) = value.as_u64() {
                    self.http_timeout = n;
                    self.sources.insert(key.to_string(), source);
                }
            }
            _ => {
                log::debug!("Ignoring unknown config key \"{}\" from {}", key, source.as_str());
            }
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self, loader: &ConfigLoader) {
        for key in [
            "vendor",
            "solutions-repository-url",
            "parts-repository-url",
            "public-repository-url",
            "composer-binary",
            "cache-dir",
        ] {
            if let Some(value) = loader.get_env_config(key) {
                let source = ConfigSource::Environment(ConfigLoader::env_var_name(key));
                if let Err(e) = self.merge_config_value(key, serde_json::Value::String(value), source) {
                    log::warn!("Ignoring {}: {}", ConfigLoader::env_var_name(key), e);
                }
            }
        }

        for key in ["dry-run-timeout", "catalogue-ttl", "http-timeout"] {
            if let Some(n) = loader.get_env_u64(key) {
                let source = ConfigSource::Environment(ConfigLoader::env_var_name(key));
                if let Err(e) = self.merge_config_value(key, serde_json::Value::from(n), source) {
                    log::warn!("Ignoring {}: {}", ConfigLoader::env_var_name(key), e);
                }
            }
        }
    }

    fn config_keys() -> &'static [&'static str] {
        &[
            "vendor",
            "solutions-repository-url",
            "parts-repository-url",
            "public-repository-url",
            "composer-binary",
            "dry-run-timeout",
            "catalogue-ttl",
            "cache-dir",
            "http-timeout",
        ]
    }
}

fn optional_string(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn validate_url(name: &str, value: &str) -> Result<()> {
    let url = url::Url::parse(value)
        .map_err(|e| RetailerError::Config(format!("Invalid {} repository URL \"{}\": {}", name, value, e)))?;

    match url.scheme() {
        "http" | "https" | "file" => Ok(()),
        scheme => Err(RetailerError::Config(format!(
            "Unsupported scheme \"{}\" in {} repository URL \"{}\"",
            scheme, name, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.vendor, None);
        assert_eq!(config.catalogue_ttl, 900);
        assert_eq!(config.dry_run_timeout, 120);
        assert_eq!(config.http_timeout, 30);
        assert_eq!(
            config.public_repository_url.as_deref(),
            Some("https://repo.packagist.org")
        );
    }

    #[test]
    fn test_vendor_required() {
        let config = Config::default();
        assert!(matches!(config.vendor(), Err(RetailerError::Config(_))));
    }

    #[test]
    fn test_set_validates_vendor() {
        let mut config = Config::default();
        assert!(config.set("vendor", json!("ab")).is_err());
        config.set("vendor", json!("retailer")).unwrap();

        assert_eq!(config.vendor().unwrap().as_str(), "retailer");
        assert_eq!(config.get_source("vendor"), Some(&ConfigSource::Command));
    }

    #[test]
    fn test_package_sources() {
        let mut config = Config::default();
        config.set("solutions-repository-url", json!("https://shop.test/solutions")).unwrap();
        config.set("public-repository-url", json!(false)).unwrap();

        let sources = config.package_sources().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "solutions");
        assert_eq!(sources[0].url, "https://shop.test/solutions");
    }

    #[test]
    fn test_package_sources_rejects_bad_url() {
        let mut config = Config::default();
        config.set("parts-repository-url", json!("not a url")).unwrap();
        assert!(matches!(config.package_sources(), Err(RetailerError::Config(_))));

        config.set("parts-repository-url", json!("ftp://parts.test")).unwrap();
        assert!(config.package_sources().is_err());
    }

    #[test]
    fn test_composer_binary_resolution() {
        let mut config = Config::with_base_dir("/project");
        assert_eq!(config.composer_binary(), None);

        config.set("composer-binary", json!("composer")).unwrap();
        assert_eq!(config.composer_binary(), Some(PathBuf::from("composer")));

        config.set("composer-binary", json!("bin/composer.phar")).unwrap();
        assert_eq!(
            config.composer_binary(),
            Some(PathBuf::from("/project/bin/composer.phar"))
        );
    }

    #[test]
    fn test_unknown_key_ignored() {
        let mut config = Config::default();
        config.set("no-such-key", json!(1)).unwrap();
    }
}
