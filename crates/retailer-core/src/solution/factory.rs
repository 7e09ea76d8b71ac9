use std::sync::Arc;

use super::{PseudoId, RefNormalizer, Solution, SolutionBuilder};
use crate::error::{Result, RetailerError};
use crate::store::{PostId, PostStore, SolutionPost};
use crate::util::Vendor;

/// Builds [`Solution`]s from Post Store records.
///
/// Lookups here are not limited by any repository filter; the flattening
/// resolver relies on that to pull in required solutions that the source
/// repository would not list.
#[derive(Clone)]
pub struct SolutionFactory {
    store: Arc<dyn PostStore>,
    vendor: Vendor,
}

impl SolutionFactory {
    pub fn new(store: Arc<dyn PostStore>, vendor: Vendor) -> Self {
        Self { store, vendor }
    }

    pub fn vendor(&self) -> &Vendor {
        &self.vendor
    }

    pub fn store(&self) -> &Arc<dyn PostStore> {
        &self.store
    }

    /// Canonical package name for a slug under the configured vendor.
    pub fn package_name(&self, slug: &str) -> String {
        self.vendor.package_name(slug)
    }

    /// Build a solution from a store record, normalizing its raw references.
    pub fn from_post(&self, post: &SolutionPost) -> Result<Solution> {
        let owner = format!("{} ({})", post.name, self.package_name(&post.slug));
        let normalizer = RefNormalizer::new(&self.vendor, self.store.as_ref());

        let required_parts = normalizer.part_refs(&owner, &post.required_parts);
        let required_solutions = normalizer.solution_refs(&owner, &post.required_solutions);
        let excluded_solutions = normalizer.solution_refs(&owner, &post.excluded_solutions);

        SolutionBuilder::new()
            .with_vendor(self.vendor.clone())
            .with_post(post)
            .with_required_parts(required_parts.into_values())
            .with_required_solutions(required_solutions.into_values())
            .with_excluded_solutions(excluded_solutions.into_values())
            .build()
    }

    pub fn from_post_id(&self, id: PostId) -> Result<Solution> {
        let post = self
            .store
            .get(id)
            .ok_or(RetailerError::SolutionNotFound { id })?;
        self.from_post(&post)
    }

    /// Resolve a pseudo ID. The record id is authoritative; a stale slug is
    /// only logged.
    pub fn from_pseudo_id(&self, pseudo_id: &PseudoId) -> Result<Solution> {
        let solution = self.from_post_id(pseudo_id.post_id())?;
        if solution.slug() != pseudo_id.slug() {
            log::debug!(
                "Pseudo ID \"{}\" resolved to post #{} with slug \"{}\"",
                pseudo_id,
                pseudo_id.post_id(),
                solution.slug()
            );
        }
        Ok(solution)
    }
}
