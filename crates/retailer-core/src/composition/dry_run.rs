use std::sync::Arc;

use serde::Serialize;

use super::Manifest;
use crate::config::Config;
use crate::error::Result;
use crate::resolver::{
    ComposerProcessResolver, DependencyResolver, DryRunError, DryRunRequest, PackageSource,
};

/// Result of submitting a manifest to the external resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DryRunOutcome {
    Passed,
    Failed { message: String },
    Skipped { reason: String },
}

impl DryRunOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, DryRunOutcome::Failed { .. })
    }
}

/// Checks manifests against the external dependency resolver.
///
/// A validator without a resolver, or without package sources, skips every
/// dry run; local resolution never depends on it.
#[derive(Clone)]
pub struct DryRunValidator {
    resolver: Option<Arc<dyn DependencyResolver>>,
    sources: Vec<PackageSource>,
    disabled_reason: String,
}

impl DryRunValidator {
    pub fn new(resolver: Arc<dyn DependencyResolver>, sources: Vec<PackageSource>) -> Self {
        Self {
            resolver: Some(resolver),
            sources,
            disabled_reason: String::new(),
        }
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            resolver: None,
            sources: Vec::new(),
            disabled_reason: reason.into(),
        }
    }

    /// Validator driving the configured composer binary.
    ///
    /// Missing settings give a disabled validator; malformed repository URLs
    /// are a configuration error.
    pub fn from_config(config: &Config) -> Result<Self> {
        let sources = config.package_sources()?;

        let Some(binary) = config.composer_binary() else {
            return Ok(Self::disabled("\"composer-binary\" is not configured"));
        };

        let resolver = ComposerProcessResolver::new(binary, config.dry_run_timeout());
        Ok(Self::new(Arc::new(resolver), sources))
    }

    pub fn is_enabled(&self) -> bool {
        self.resolver.is_some()
    }

    pub async fn validate(&self, manifest: &Manifest) -> DryRunOutcome {
        let Some(resolver) = &self.resolver else {
            return DryRunOutcome::Skipped {
                reason: self.disabled_reason.clone(),
            };
        };

        if self.sources.is_empty() {
            return DryRunOutcome::Skipped {
                reason: "no package sources configured".to_string(),
            };
        }

        if manifest.is_empty() {
            return DryRunOutcome::Passed;
        }

        let request = DryRunRequest::from_manifest(manifest, self.sources.clone());
        log::debug!(
            "Dry run of {} packages with {}",
            request.require.len(),
            resolver.name()
        );

        match resolver.dry_run(&request).await {
            Ok(()) => DryRunOutcome::Passed,
            Err(DryRunError::Unsatisfiable(message)) => {
                log::warn!("Dry run failed: {}", message);
                DryRunOutcome::Failed { message }
            }
            Err(DryRunError::Unavailable(reason)) => {
                log::warn!("Dry run skipped: {}", reason);
                DryRunOutcome::Skipped { reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::StubResolver;

    fn manifest() -> Manifest {
        let mut manifest = Manifest::default();
        manifest
            .composer_require
            .insert("retailer/blog".to_string(), "*".to_string());
        manifest
    }

    fn sources() -> Vec<PackageSource> {
        vec![PackageSource::composer("solutions", "https://shop.test/solutions")]
    }

    #[tokio::test]
    async fn test_passed() {
        let resolver = StubResolver::new(Ok(()));
        let validator = DryRunValidator::new(resolver.clone(), sources());

        assert_eq!(validator.validate(&manifest()).await, DryRunOutcome::Passed);
        let requests = resolver.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].ignore_platform_reqs);
    }

    #[tokio::test]
    async fn test_unsatisfiable_is_failure() {
        let resolver = StubResolver::new(Err(DryRunError::Unsatisfiable("conflict".to_string())));
        let validator = DryRunValidator::new(resolver, sources());

        let outcome = validator.validate(&manifest()).await;
        assert!(outcome.is_failed());
        assert_eq!(
            outcome,
            DryRunOutcome::Failed {
                message: "conflict".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unavailable_is_skipped() {
        let resolver = StubResolver::new(Err(DryRunError::Unavailable("timed out".to_string())));
        let validator = DryRunValidator::new(resolver, sources());

        assert!(matches!(
            validator.validate(&manifest()).await,
            DryRunOutcome::Skipped { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_settings_skip() {
        let validator = DryRunValidator::from_config(&Config::default()).unwrap();
        assert!(!validator.is_enabled());
        assert!(matches!(
            validator.validate(&manifest()).await,
            DryRunOutcome::Skipped { .. }
        ));

        let resolver = StubResolver::new(Ok(()));
        let validator = DryRunValidator::new(resolver.clone(), Vec::new());
        assert!(matches!(
            validator.validate(&manifest()).await,
            DryRunOutcome::Skipped { .. }
        ));
        assert!(resolver.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_manifest_passes() {
        let resolver = StubResolver::new(Err(DryRunError::Unsatisfiable("never".to_string())));
        let validator = DryRunValidator::new(resolver, sources());
        assert_eq!(validator.validate(&Manifest::default()).await, DryRunOutcome::Passed);
    }
}
