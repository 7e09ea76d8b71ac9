use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{PartRequirement, SolutionRef};
use crate::store::PostId;

/// Publication state of a solution record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Draft,
    Private,
}

impl Visibility {
    /// All visibilities with their display labels.
    pub fn labels() -> &'static [(Visibility, &'static str)] {
        &[
            (Visibility::Public, "Public"),
            (Visibility::Draft, "Draft"),
            (Visibility::Private, "Private"),
        ]
    }

    pub fn label(&self) -> &'static str {
        Self::labels()
            .iter()
            .find(|(visibility, _)| visibility == self)
            .map(|(_, label)| *label)
            .unwrap_or("Unknown")
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Public
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Draft => write!(f, "draft"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// A purchasable solution.
///
/// Solutions are immutable once built and are shared as `Arc<Solution>`.
/// To change one, start a new [`SolutionBuilder`](super::SolutionBuilder)
/// from it with `SolutionBuilder::from_solution`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub(super) name: String,
    pub(super) slug: String,
    #[serde(rename = "type")]
    pub(super) solution_type: String,
    pub(super) description: Option<String>,
    pub(super) homepage: Option<String>,
    pub(super) license: Option<String>,
    pub(super) keywords: IndexSet<String>,
    pub(super) categories: IndexSet<String>,
    pub(super) managed_post_id: PostId,
    pub(super) visibility: Visibility,
    pub(super) package_name: String,
    pub(super) required_parts: IndexMap<String, PartRequirement>,
    pub(super) required_solutions: IndexMap<String, SolutionRef>,
    pub(super) excluded_solutions: IndexMap<String, SolutionRef>,
}

impl Solution {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn solution_type(&self) -> &str {
        &self.solution_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    pub fn keywords(&self) -> &IndexSet<String> {
        &self.keywords
    }

    pub fn categories(&self) -> &IndexSet<String> {
        &self.categories
    }

    /// Backing record id, `0` when the solution is not backed by a record.
    pub fn managed_post_id(&self) -> PostId {
        self.managed_post_id
    }

    pub fn is_managed(&self) -> bool {
        self.managed_post_id > 0
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Canonical `vendor/slug` package name.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn required_parts(&self) -> &IndexMap<String, PartRequirement> {
        &self.required_parts
    }

    /// Required solutions keyed by pseudo ID.
    pub fn required_solutions(&self) -> &IndexMap<String, SolutionRef> {
        &self.required_solutions
    }

    /// Excluded solutions keyed by pseudo ID.
    pub fn excluded_solutions(&self) -> &IndexMap<String, SolutionRef> {
        &self.excluded_solutions
    }

    pub fn requires(&self, package_name: &str) -> bool {
        self.required_solutions
            .values()
            .any(|reference| reference.package_name == package_name)
    }

    pub fn excludes(&self, package_name: &str) -> bool {
        self.excluded_solutions
            .values()
            .any(|reference| reference.package_name == package_name)
    }

    /// `"{name} ({package_name})"`, used in log lines.
    pub fn identity(&self) -> String {
        format!("{} ({})", self.name, self.package_name)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.package_name)
    }
}
