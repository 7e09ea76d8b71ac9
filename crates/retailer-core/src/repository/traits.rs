use std::sync::Arc;

use indexmap::IndexMap;

use super::{FilteredRepository, InMemoryRepository};
use crate::solution::Solution;

/// Solutions keyed by canonical package name.
pub type SolutionMap = IndexMap<String, Arc<Solution>>;

/// Shared predicate used by lazy repository views.
pub type SolutionPredicate = Arc<dyn Fn(&Solution) -> bool + Send + Sync>;

/// Repository interface - read-only, ordered solution source
pub trait SolutionRepository: Send + Sync {
    /// Get a unique name for this repository
    fn name(&self) -> &str;

    /// Every solution, keyed by canonical package name
    fn all(&self) -> SolutionMap;

    /// Drop any memoized state so the next `all()` re-reads the source
    fn reinitialize(&self) {}

    /// Find a solution by package name
    fn get(&self, package_name: &str) -> Option<Arc<Solution>> {
        self.all().get(package_name).cloned()
    }

    /// First solution satisfying `predicate`, in repository order
    fn first_where(&self, predicate: &dyn Fn(&Solution) -> bool) -> Option<Arc<Solution>> {
        self.all().into_values().find(|solution| predicate(solution))
    }

    fn contains(&self, predicate: &dyn Fn(&Solution) -> bool) -> bool {
        self.first_where(predicate).is_some()
    }

    /// Snapshot of the solutions satisfying `predicate`.
    ///
    /// Unlike [`RepositoryExt::with_filter`], later changes to this
    /// repository are not reflected in the returned copy.
    fn matching(&self, predicate: &dyn Fn(&Solution) -> bool) -> InMemoryRepository {
        let solutions = self
            .all()
            .into_iter()
            .filter(|(_, solution)| predicate(solution))
            .collect();
        InMemoryRepository::from_map(format!("{} (snapshot)", self.name()), solutions)
    }

    /// Get the number of solutions in the repository
    fn count(&self) -> usize {
        self.all().len()
    }

    fn package_names(&self) -> Vec<String> {
        self.all().into_keys().collect()
    }
}

/// Lazy views over shared repositories.
pub trait RepositoryExt {
    /// A view applying `predicate` each time it is read.
    fn with_filter<F>(&self, predicate: F) -> FilteredRepository
    where
        F: Fn(&Solution) -> bool + Send + Sync + 'static;
}

impl RepositoryExt for Arc<dyn SolutionRepository> {
    fn with_filter<F>(&self, predicate: F) -> FilteredRepository
    where
        F: Fn(&Solution) -> bool + Send + Sync + 'static,
    {
        FilteredRepository::new(Arc::clone(self), Arc::new(predicate))
    }
}
