use std::sync::Arc;

use super::traits::{SolutionMap, SolutionRepository};

/// Overlay of several repositories.
///
/// Sources are read in order; a later source's solution replaces an earlier
/// one with the same package name. The merged set is sorted by package name.
pub struct MultiRepository {
    name: String,
    sources: Vec<Arc<dyn SolutionRepository>>,
}

impl MultiRepository {
    pub fn new(sources: Vec<Arc<dyn SolutionRepository>>) -> Self {
        let name = sources
            .iter()
            .map(|source| source.name())
            .collect::<Vec<_>>()
            .join(" + ");
        Self { name, sources }
    }
}

impl SolutionRepository for MultiRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn all(&self) -> SolutionMap {
        let mut merged = SolutionMap::new();
        for source in &self.sources {
            for (package_name, solution) in source.all() {
                if merged.insert(package_name.clone(), solution).is_some() {
                    log::trace!("{} overrides {} from an earlier source", source.name(), package_name);
                }
            }
        }
        merged.sort_keys();
        merged
    }

    fn reinitialize(&self) {
        for source in &self.sources {
            source.reinitialize();
        }
    }
}
