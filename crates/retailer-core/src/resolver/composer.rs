use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{DependencyResolver, DryRunError, DryRunRequest};

/// Runs `composer update --dry-run` against a generated root package.
pub struct ComposerProcessResolver {
    binary: PathBuf,
    timeout: Duration,
}

impl ComposerProcessResolver {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    fn arguments(request: &DryRunRequest) -> Vec<&'static str> {
        let mut args = vec![
            "update",
            "--dry-run",
            "--no-install",
            "--no-scripts",
            "--no-plugins",
            "--no-interaction",
            "--no-progress",
        ];
        if request.ignore_platform_reqs {
            args.push("--ignore-platform-reqs");
        }
        if request.prefer_stable {
            args.push("--prefer-stable");
        }
        args
    }
}

#[async_trait]
impl DependencyResolver for ComposerProcessResolver {
    fn name(&self) -> &str {
        "composer"
    }

    async fn dry_run(&self, request: &DryRunRequest) -> Result<(), DryRunError> {
        let work_dir = tempfile::tempdir()
            .map_err(|e| DryRunError::Unavailable(format!("failed to create work directory: {}", e)))?;

        let manifest = serde_json::to_vec_pretty(&request.to_composer_json())
            .map_err(|e| DryRunError::Unavailable(format!("failed to encode composer.json: {}", e)))?;
        tokio::fs::write(work_dir.path().join("composer.json"), manifest)
            .await
            .map_err(|e| DryRunError::Unavailable(format!("failed to write composer.json: {}", e)))?;

        log::debug!(
            "Running {} dry run for {} packages in {}",
            self.binary.display(),
            request.require.len(),
            work_dir.path().display()
        );

        let mut command = Command::new(&self.binary);
        command
            .args(Self::arguments(request))
            .current_dir(work_dir.path())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                return Err(DryRunError::Unavailable(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
            Ok(Err(e)) => {
                return Err(DryRunError::Unavailable(format!(
                    "failed to run {}: {}",
                    self.binary.display(),
                    e
                )))
            }
            Ok(Ok(output)) => output,
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr.trim().to_string()
        };

        Err(DryRunError::Unsatisfiable(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::Manifest;

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let resolver = ComposerProcessResolver::new(
            "/nonexistent/retailer-test/composer",
            Duration::from_secs(5),
        );
        let request = DryRunRequest::from_manifest(&Manifest::default(), Vec::new());

        let err = resolver.dry_run(&request).await.unwrap_err();
        assert!(matches!(err, DryRunError::Unavailable(_)));
    }

    #[test]
    fn test_arguments() {
        let request = DryRunRequest::from_manifest(&Manifest::default(), Vec::new());
        let args = ComposerProcessResolver::arguments(&request);

        assert_eq!(args[0], "update");
        assert!(args.contains(&"--dry-run"));
        assert!(args.contains(&"--ignore-platform-reqs"));
        assert!(args.contains(&"--prefer-stable"));
    }
}
