use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::solution::{PartRequirement, SolutionContext};
use crate::store::PostId;

/// How a solution entered the composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredSolutionKind {
    Purchased,
    Manual,
}

/// One directly selected solution that survived resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredSolutionEntry {
    #[serde(rename = "type")]
    pub kind: RequiredSolutionKind,
    pub slug: String,
    pub managed_post_id: PostId,
    pub package_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchased_solution_id: Option<PostId>,
    #[serde(default)]
    pub context: SolutionContext,
}

/// The package manifest produced for a composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub required_solutions: Vec<RequiredSolutionEntry>,
    /// Package name -> version range, solutions first then parts
    pub composer_require: IndexMap<String, String>,
    pub required_parts: IndexMap<String, PartRequirement>,
}

impl Manifest {
    pub fn is_empty(&self) -> bool {
        self.composer_require.is_empty()
    }

    /// Package names of the directly selected solutions.
    pub fn solution_packages(&self) -> Vec<&str> {
        self.required_solutions
            .iter()
            .map(|entry| entry.package_name.as_str())
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::Stability;

    #[test]
    fn test_manifest_shape() {
        let mut manifest = Manifest::default();
        manifest.required_solutions.push(RequiredSolutionEntry {
            kind: RequiredSolutionKind::Manual,
            slug: "blog".to_string(),
            managed_post_id: 1,
            package_name: "retailer/blog".to_string(),
            purchased_solution_id: None,
            context: SolutionContext::at(5),
        });
        manifest
            .composer_require
            .insert("retailer/blog".to_string(), "*".to_string());
        manifest.required_parts.insert(
            "parts/seo".to_string(),
            PartRequirement::new("parts/seo").with_stability(Stability::Beta),
        );

        let value: serde_json::Value = serde_json::from_str(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(value["required_solutions"][0]["type"], "manual");
        assert_eq!(value["required_solutions"][0]["managed_post_id"], 1);
        assert_eq!(value["required_solutions"][0]["context"]["timestamp"], 5);
        assert!(value["required_solutions"][0].get("purchased_solution_id").is_none());
        assert_eq!(value["composer_require"]["retailer/blog"], "*");
        assert_eq!(value["required_parts"]["parts/seo"]["stability"], "beta");
        assert_eq!(manifest.solution_packages(), vec!["retailer/blog"]);
    }
}
