use std::sync::{Arc, RwLock};

use super::traits::{SolutionMap, SolutionRepository};
use crate::solution::SolutionFactory;
use crate::store::PostQuery;

/// Repository backed by the Post Store.
///
/// The solution set is loaded on first access and memoized;
/// [`reinitialize`](SolutionRepository::reinitialize) drops the memo.
pub struct PostStoreRepository {
    name: String,
    factory: SolutionFactory,
    query: PostQuery,
    solutions: RwLock<Option<SolutionMap>>,
}

impl PostStoreRepository {
    pub fn new(factory: SolutionFactory) -> Self {
        Self::with_query(factory, PostQuery::new())
    }

    /// Only load the records matching `query`.
    pub fn with_query(factory: SolutionFactory, query: PostQuery) -> Self {
        Self {
            name: "post store".to_string(),
            factory,
            query,
            solutions: RwLock::new(None),
        }
    }

    pub fn factory(&self) -> &SolutionFactory {
        &self.factory
    }

    fn load(&self) -> SolutionMap {
        let ids = self.factory.store().query(&self.query);
        log::debug!("Loading {} solution records from the post store", ids.len());

        let mut solutions = SolutionMap::new();
        for id in ids {
            match self.factory.from_post_id(id) {
                Ok(solution) => {
                    if let Some(previous) = solutions.get(solution.package_name()) {
                        log::warn!(
                            "Solution post #{} overrides post #{} for package {}",
                            id,
                            previous.managed_post_id(),
                            solution.package_name()
                        );
                    }
                    solutions.insert(solution.package_name().to_string(), Arc::new(solution));
                }
                Err(e) => log::error!("Skipping solution post #{}: {}", id, e),
            }
        }
        solutions
    }
}

impl SolutionRepository for PostStoreRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn all(&self) -> SolutionMap {
        if let Some(solutions) = self
            .solutions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
        {
            log::trace!("Using memoized solutions of {}", self.name);
            return solutions.clone();
        }

        let solutions = self.load();
        *self
            .solutions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(solutions.clone());
        solutions
    }

    fn reinitialize(&self) {
        *self
            .solutions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::Visibility;
    use crate::store::{MemoryPostStore, PostStore, SolutionPost};
    use crate::test_fixtures::{fixture_factory, fixture_store};

    #[test]
    fn test_loads_store_records() {
        let repository = PostStoreRepository::new(fixture_factory(Arc::new(fixture_store())));

        assert_eq!(
            repository.package_names(),
            vec![
                "retailer/blog",
                "retailer/edd",
                "retailer/ecommerce",
                "retailer/presentation"
            ]
        );
    }

    #[test]
    fn test_query_limits_records() {
        let factory = fixture_factory(Arc::new(fixture_store()));
        let repository = PostStoreRepository::with_query(factory, PostQuery::new().with_ids([3, 4]));

        assert_eq!(
            repository.package_names(),
            vec!["retailer/ecommerce", "retailer/presentation"]
        );
    }

    #[test]
    fn test_memoized_until_reinitialized() {
        let store = Arc::new(fixture_store());
        let repository = PostStoreRepository::new(fixture_factory(store.clone()));
        assert_eq!(repository.count(), 4);

        store.insert(SolutionPost::new(5, "hosting").with_visibility(Visibility::Private));
        assert_eq!(repository.count(), 4);

        repository.reinitialize();
        assert_eq!(repository.count(), 5);
        assert!(repository.get("retailer/hosting").is_some());
    }

    #[test]
    fn test_empty_store() {
        let store: Arc<dyn PostStore> = Arc::new(MemoryPostStore::new());
        let repository = PostStoreRepository::new(fixture_factory(store));
        assert_eq!(repository.count(), 0);
    }
}
