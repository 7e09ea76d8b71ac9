use indexmap::{IndexMap, IndexSet};

use super::reference::version_range_or_default;
use super::{
    PartRequirement, PseudoId, RawPartRef, RawSolutionRef, Solution, SolutionRef, Stability,
    Visibility, PSEUDO_ID_DELIMITER,
};
use crate::error::{Result, RetailerError};
use crate::store::{PostId, PostStore, SolutionPost};
use crate::util::{split_package_name, Vendor};

/// Solution type assigned when a record does not declare one.
pub const DEFAULT_SOLUTION_TYPE: &str = "regular";

/// Builder for [`Solution`].
///
/// Map-valued setters merge into what is already set: entries are keyed by
/// pseudo ID (or part name) and a later entry with the same key replaces the
/// earlier one. This is how defaults and overrides from different sources are
/// layered.
#[derive(Debug, Clone, Default)]
pub struct SolutionBuilder {
    name: String,
    slug: String,
    solution_type: Option<String>,
    description: Option<String>,
    homepage: Option<String>,
    license: Option<String>,
    keywords: IndexSet<String>,
    categories: IndexSet<String>,
    managed_post_id: PostId,
    visibility: Visibility,
    vendor: Option<Vendor>,
    package_name: Option<String>,
    required_parts: IndexMap<String, PartRequirement>,
    required_solutions: IndexMap<String, SolutionRef>,
    excluded_solutions: IndexMap<String, SolutionRef>,
}

impl SolutionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing solution, keeping its canonical package name.
    pub fn from_solution(solution: &Solution) -> Self {
        Self {
            name: solution.name.clone(),
            slug: solution.slug.clone(),
            solution_type: Some(solution.solution_type.clone()),
            description: solution.description.clone(),
            homepage: solution.homepage.clone(),
            license: solution.license.clone(),
            keywords: solution.keywords.clone(),
            categories: solution.categories.clone(),
            managed_post_id: solution.managed_post_id,
            visibility: solution.visibility,
            vendor: None,
            package_name: Some(solution.package_name.clone()),
            required_parts: solution.required_parts.clone(),
            required_solutions: solution.required_solutions.clone(),
            excluded_solutions: solution.excluded_solutions.clone(),
        }
    }

    /// Copy the scalar fields of a store record.
    ///
    /// Required/excluded solutions and parts are left alone; they need
    /// normalizing first (see [`RefNormalizer`]).
    pub fn with_post(mut self, post: &SolutionPost) -> Self {
        self.name = post.name.clone();
        self.slug = post.slug.clone();
        self.solution_type = post.solution_type.clone();
        self.description = post.description.clone();
        self.homepage = post.homepage.clone();
        self.license = post.license.clone();
        self.keywords = post.keywords.iter().cloned().collect();
        self.categories = post.categories.iter().cloned().collect();
        self.managed_post_id = post.id;
        self.visibility = post.visibility;
        self
    }

    pub fn with_vendor(mut self, vendor: Vendor) -> Self {
        self.vendor = Some(vendor);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the slug. The canonical package name is recomputed from it on build.
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self.package_name = None;
        self
    }

    pub fn with_type(mut self, solution_type: impl Into<String>) -> Self {
        self.solution_type = Some(solution_type.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.extend(categories.into_iter().map(Into::into));
        self
    }

    pub fn with_managed_post_id(mut self, post_id: PostId) -> Self {
        self.managed_post_id = post_id;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_required_parts(mut self, parts: impl IntoIterator<Item = PartRequirement>) -> Self {
        for part in parts {
            self.required_parts.insert(part.package_name.clone(), part);
        }
        self
    }

    pub fn with_required_solutions(mut self, refs: impl IntoIterator<Item = SolutionRef>) -> Self {
        for reference in refs {
            self.required_solutions.insert(reference.key(), reference);
        }
        self
    }

    pub fn with_excluded_solutions(mut self, refs: impl IntoIterator<Item = SolutionRef>) -> Self {
        for reference in refs {
            self.excluded_solutions.insert(reference.key(), reference);
        }
        self
    }

    /// Build the immutable solution.
    ///
    /// Fails when the slug is unusable or no canonical package name can be
    /// computed (no vendor configured).
    pub fn build(self) -> Result<Solution> {
        let slug = self.slug.trim().to_string();

        if slug.is_empty() {
            return Err(RetailerError::InvalidPackageName(format!(
                "solution \"{}\" has no slug",
                self.name
            )));
        }

        if slug.contains(PSEUDO_ID_DELIMITER) {
            return Err(RetailerError::InvalidPackageName(format!(
                "slug \"{}\" contains the reserved sequence \"{}\"",
                slug, PSEUDO_ID_DELIMITER
            )));
        }

        let package_name = match self.package_name {
            Some(package_name) => package_name,
            None => self
                .vendor
                .as_ref()
                .ok_or_else(|| {
                    RetailerError::Config(format!(
                        "no vendor configured, cannot name solution \"{}\"",
                        slug
                    ))
                })?
                .package_name(&slug),
        };

        let name = if self.name.trim().is_empty() {
            slug.clone()
        } else {
            self.name
        };

        Ok(Solution {
            name,
            slug,
            solution_type: self
                .solution_type
                .unwrap_or_else(|| DEFAULT_SOLUTION_TYPE.to_string()),
            description: self.description,
            homepage: self.homepage,
            license: self.license,
            keywords: self.keywords,
            categories: self.categories,
            managed_post_id: self.managed_post_id,
            visibility: self.visibility,
            package_name,
            required_parts: self.required_parts,
            required_solutions: self.required_solutions,
            excluded_solutions: self.excluded_solutions,
        })
    }
}

/// Turns raw record entries into canonical references.
///
/// Malformed entries are logged with the owning solution's identity and
/// dropped; they never fail the whole solution.
pub struct RefNormalizer<'a> {
    vendor: &'a Vendor,
    store: &'a dyn PostStore,
}

impl<'a> RefNormalizer<'a> {
    pub fn new(vendor: &'a Vendor, store: &'a dyn PostStore) -> Self {
        Self { vendor, store }
    }

    /// Normalize raw required/excluded solution entries into a map keyed by
    /// pseudo ID. Duplicate pseudo IDs: the last entry wins.
    pub fn solution_refs(&self, owner: &str, raw: &[RawSolutionRef]) -> IndexMap<String, SolutionRef> {
        let mut refs = IndexMap::new();
        for entry in raw {
            if let Some(reference) = self.solution_ref(owner, entry) {
                refs.insert(reference.key(), reference);
            }
        }
        refs
    }

    /// Normalize raw required parts into a map keyed by part package name.
    /// Duplicate parts: the last entry wins.
    pub fn part_refs(&self, owner: &str, raw: &[RawPartRef]) -> IndexMap<String, PartRequirement> {
        let mut parts = IndexMap::new();
        for entry in raw {
            let package_name = entry
                .package_name
                .as_deref()
                .map(|name| name.trim().to_lowercase())
                .unwrap_or_default();

            if split_package_name(&package_name).is_none() {
                log::error!(
                    "Dropping required part {:?} of {}: not a vendor/name package name",
                    entry.package_name,
                    owner
                );
                continue;
            }

            let part = PartRequirement::new(package_name.clone())
                .with_version_range(version_range_or_default(entry.version_range.as_deref()))
                .with_stability(entry.stability.as_deref().map(Stability::parse).unwrap_or_default());
            parts.insert(package_name, part);
        }
        parts
    }

    fn solution_ref(&self, owner: &str, raw: &RawSolutionRef) -> Option<SolutionRef> {
        let Some(pseudo_id) = raw.pseudo_id.as_deref().and_then(PseudoId::parse) else {
            log::error!(
                "Dropping solution reference of {}: invalid pseudo ID {:?}",
                owner,
                raw.pseudo_id
            );
            return None;
        };

        if let Some(post_id) = raw.managed_post_id.filter(|id| *id != 0) {
            if post_id != pseudo_id.post_id() {
                log::error!(
                    "Dropping solution reference of {}: pseudo ID \"{}\" points to post #{} but managed post is #{}",
                    owner,
                    pseudo_id,
                    pseudo_id.post_id(),
                    post_id
                );
                return None;
            }
        }

        let explicit_name = raw
            .package_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let package_name = match explicit_name {
            Some(name) => name.to_lowercase(),
            None => match self.store.get(pseudo_id.post_id()) {
                Some(post) if !post.slug.trim().is_empty() => self.vendor.package_name(&post.slug),
                _ => {
                    log::error!(
                        "Dropping solution reference of {}: no solution record for \"{}\"",
                        owner,
                        pseudo_id
                    );
                    return None;
                }
            },
        };

        Some(
            SolutionRef::new(pseudo_id, package_name)
                .with_version_range(version_range_or_default(raw.version_range.as_deref()))
                .with_stability(raw.stability.as_deref().map(Stability::parse).unwrap_or_default()),
        )
    }
}
