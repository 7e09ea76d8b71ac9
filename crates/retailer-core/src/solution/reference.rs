use serde::{Deserialize, Serialize};
use std::fmt;

use super::{PseudoId, Stability};
use crate::store::PostId;

/// Version range used when a reference does not declare one.
pub const DEFAULT_VERSION_RANGE: &str = "*";

/// A reference from one solution to another (required or excluded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionRef {
    /// Canonical `"{slug} #{post_id}"` reference
    pub pseudo_id: PseudoId,
    /// Canonical package name of the referenced solution (`vendor/slug`)
    pub package_name: String,
    /// Version constraint (e.g. "*", "^1.0")
    pub version_range: String,
    /// Minimum stability accepted for the referenced solution
    pub stability: Stability,
    /// Record id of the referenced solution
    pub managed_post_id: PostId,
}

impl SolutionRef {
    pub fn new(pseudo_id: PseudoId, package_name: impl Into<String>) -> Self {
        let managed_post_id = pseudo_id.post_id();
        Self {
            pseudo_id,
            package_name: package_name.into(),
            version_range: DEFAULT_VERSION_RANGE.to_string(),
            stability: Stability::default(),
            managed_post_id,
        }
    }

    pub fn with_version_range(mut self, version_range: impl Into<String>) -> Self {
        self.version_range = version_range.into();
        self
    }

    pub fn with_stability(mut self, stability: Stability) -> Self {
        self.stability = stability;
        self
    }

    /// Key under which this reference is stored in a solution's maps.
    pub fn key(&self) -> String {
        self.pseudo_id.to_string()
    }
}

impl fmt::Display for SolutionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {}", self.package_name, self.pseudo_id, self.version_range)
    }
}

/// A requirement on a lower-level part package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRequirement {
    pub package_name: String,
    pub version_range: String,
    pub stability: Stability,
}

impl PartRequirement {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            version_range: DEFAULT_VERSION_RANGE.to_string(),
            stability: Stability::default(),
        }
    }

    pub fn with_version_range(mut self, version_range: impl Into<String>) -> Self {
        self.version_range = version_range.into();
        self
    }

    pub fn with_stability(mut self, stability: Stability) -> Self {
        self.stability = stability;
        self
    }
}

/// Required/excluded solution entry as stored on a record, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSolutionRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pseudo_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_post_id: Option<PostId>,
}

impl RawSolutionRef {
    pub fn new(pseudo_id: impl Into<String>) -> Self {
        Self {
            pseudo_id: Some(pseudo_id.into()),
            ..Default::default()
        }
    }

    pub fn with_version_range(mut self, version_range: impl Into<String>) -> Self {
        self.version_range = Some(version_range.into());
        self
    }

    pub fn with_package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = Some(package_name.into());
        self
    }
}

/// Required part entry as stored on a record, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPartRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<String>,
}

impl RawPartRef {
    pub fn new(package_name: impl Into<String>, version_range: impl Into<String>) -> Self {
        Self {
            package_name: Some(package_name.into()),
            version_range: Some(version_range.into()),
            stability: None,
        }
    }
}

/// Trimmed, non-empty version range or the default.
pub(crate) fn version_range_or_default(range: Option<&str>) -> String {
    match range.map(str::trim) {
        Some(range) if !range.is_empty() => range.to_string(),
        _ => DEFAULT_VERSION_RANGE.to_string(),
    }
}
