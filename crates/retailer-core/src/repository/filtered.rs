use std::sync::Arc;

use super::traits::{SolutionMap, SolutionPredicate, SolutionRepository};

/// Lazy filtered view over another repository.
///
/// The predicate runs on every read, so changes in the source (after a
/// `reinitialize`, or an in-memory insert) show through. Output is sorted by
/// package name.
pub struct FilteredRepository {
    name: String,
    source: Arc<dyn SolutionRepository>,
    predicate: SolutionPredicate,
}

impl FilteredRepository {
    pub fn new(source: Arc<dyn SolutionRepository>, predicate: SolutionPredicate) -> Self {
        Self {
            name: format!("{} (filtered)", source.name()),
            source,
            predicate,
        }
    }
}

impl SolutionRepository for FilteredRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn all(&self) -> SolutionMap {
        let mut solutions: SolutionMap = self
            .source
            .all()
            .into_iter()
            .filter(|(_, solution)| (self.predicate)(solution))
            .collect();
        solutions.sort_keys();
        solutions
    }

    fn reinitialize(&self) {
        self.source.reinitialize();
    }
}
