//! Interface to the external dependency resolver used for dry runs.

mod composer;

pub use composer::ComposerProcessResolver;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::composition::Manifest;
use crate::solution::Stability;

/// Name of the throwaway root package submitted for a dry run.
pub const DRY_RUN_PACKAGE_NAME: &str = "retailer/dry-run";

/// A named package repository the resolver may pull candidates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSource {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub url: String,
}

impl PackageSource {
    /// A Composer (packages.json) repository.
    pub fn composer(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_type: "composer".to_string(),
            url: url.into(),
        }
    }
}

/// Input to a dry run.
#[derive(Debug, Clone, PartialEq)]
pub struct DryRunRequest {
    pub sources: Vec<PackageSource>,
    pub require: IndexMap<String, String>,
    /// Per-package stability flags, only for packages below stable
    pub minimum_stability_per_package: IndexMap<String, Stability>,
    pub minimum_stability: Stability,
    pub ignore_platform_reqs: bool,
    pub prefer_stable: bool,
}

impl DryRunRequest {
    /// Build a request with relaxed platform checks and the loosest stability.
    pub fn from_manifest(manifest: &Manifest, sources: Vec<PackageSource>) -> Self {
        let minimum_stability_per_package = manifest
            .required_parts
            .values()
            .filter(|part| !part.stability.is_stable())
            .map(|part| (part.package_name.clone(), part.stability))
            .collect();

        Self {
            sources,
            require: manifest.composer_require.clone(),
            minimum_stability_per_package,
            minimum_stability: Stability::LOOSEST,
            ignore_platform_reqs: true,
            prefer_stable: true,
        }
    }

    /// Root `composer.json` equivalent of this request.
    ///
    /// Per-package stability is expressed as `@stability` flags on the
    /// constraint. The default public repository is disabled; only the listed
    /// sources are consulted.
    pub fn to_composer_json(&self) -> serde_json::Value {
        let require: serde_json::Map<String, serde_json::Value> = self
            .require
            .iter()
            .map(|(package_name, range)| {
                let constraint = match self.minimum_stability_per_package.get(package_name) {
                    Some(stability) => format!("{}@{}", range, stability),
                    None => range.clone(),
                };
                (package_name.clone(), serde_json::Value::String(constraint))
            })
            .collect();

        let mut repositories: Vec<serde_json::Value> = self
            .sources
            .iter()
            .map(|source| json!({ "type": source.source_type, "url": source.url }))
            .collect();
        repositories.push(json!({ "packagist.org": false }));

        json!({
            "name": DRY_RUN_PACKAGE_NAME,
            "type": "project",
            "require": require,
            "repositories": repositories,
            "minimum-stability": self.minimum_stability.to_string(),
            "prefer-stable": self.prefer_stable,
            "config": {
                "platform-check": !self.ignore_platform_reqs,
            },
        })
    }
}

/// Why a dry run did not pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DryRunError {
    #[error("dependencies cannot be resolved: {0}")]
    Unsatisfiable(String),

    #[error("dependency resolver unavailable: {0}")]
    Unavailable(String),
}

/// External package-dependency resolver.
#[async_trait]
pub trait DependencyResolver: Send + Sync {
    fn name(&self) -> &str;

    /// Check that `request` resolves, without installing anything.
    async fn dry_run(&self, request: &DryRunRequest) -> Result<(), DryRunError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::PartRequirement;

    fn manifest() -> Manifest {
        let mut manifest = Manifest::default();
        manifest
            .composer_require
            .insert("retailer/blog".to_string(), "*".to_string());
        manifest
            .composer_require
            .insert("parts/seo".to_string(), "^1.0".to_string());
        manifest.required_parts.insert(
            "parts/seo".to_string(),
            PartRequirement::new("parts/seo")
                .with_version_range("^1.0")
                .with_stability(Stability::Beta),
        );
        manifest
    }

    #[test]
    fn test_from_manifest() {
        let request = DryRunRequest::from_manifest(
            &manifest(),
            vec![PackageSource::composer("solutions", "https://example.com/solutions")],
        );

        assert_eq!(request.require.len(), 2);
        assert_eq!(request.minimum_stability, Stability::Dev);
        assert_eq!(
            request.minimum_stability_per_package.get("parts/seo"),
            Some(&Stability::Beta)
        );
        assert!(request.ignore_platform_reqs);
        assert!(request.prefer_stable);
    }

    #[test]
    fn test_to_composer_json() {
        let request = DryRunRequest::from_manifest(
            &manifest(),
            vec![PackageSource::composer("solutions", "https://example.com/solutions")],
        );
        let json = request.to_composer_json();

        assert_eq!(json["name"], DRY_RUN_PACKAGE_NAME);
        assert_eq!(json["require"]["retailer/blog"], "*");
        assert_eq!(json["require"]["parts/seo"], "^1.0@beta");
        assert_eq!(json["repositories"][0]["url"], "https://example.com/solutions");
        assert_eq!(json["repositories"][1]["packagist.org"], false);
        assert_eq!(json["minimum-stability"], "dev");
        assert_eq!(json["prefer-stable"], true);
        assert_eq!(json["config"]["platform-check"], false);
    }
}
