pub mod catalogue;
pub mod composition;
pub mod config;
pub mod error;
pub mod http;
pub mod repository;
pub mod resolver;
pub mod solution;
pub mod store;
pub mod util;

pub use catalogue::{PartInfo, PartsCatalogue};
pub use composition::{
    Composition, CompositionAssembler, CompositionReport, CompositionStatus, CompositionWarning,
    DryRunOutcome, DryRunValidator, Manifest, Resolution,
};
pub use config::Config;
pub use error::{Result, RetailerError};
pub use repository::{
    ExclusionRepository, FilteredRepository, FlatteningRepository, InMemoryRepository,
    MultiRepository, PostStoreRepository, RepositoryExt, SolutionMap, SolutionRepository,
};
pub use resolver::{ComposerProcessResolver, DependencyResolver, DryRunError, DryRunRequest};
pub use solution::{PseudoId, Solution, SolutionBuilder, SolutionContext, SolutionFactory};
pub use store::{MemoryPostStore, PostId, PostStore, PurchaseStore, SolutionPost};
pub use util::Vendor;

#[cfg(test)]
pub(crate) mod test_fixtures {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::resolver::{DependencyResolver, DryRunError, DryRunRequest};
    use crate::solution::{RawPartRef, RawSolutionRef, SolutionBuilder, SolutionFactory};
    use crate::store::{MemoryPostStore, PostStore, PurchaseStatus, PurchasedSolution, SolutionPost};
    use crate::util::Vendor;

    pub fn vendor() -> Vendor {
        Vendor::new("retailer").unwrap()
    }

    pub fn solution(slug: &str) -> SolutionBuilder {
        SolutionBuilder::new().with_vendor(vendor()).with_slug(slug)
    }

    /// blog #1, edd #2, ecommerce #3 (requires edd, excludes blog) and
    /// presentation #4 (requires blog, excludes ecommerce).
    pub fn fixture_store() -> MemoryPostStore {
        let store = MemoryPostStore::new();
        store.insert(SolutionPost::new(1, "blog").with_name("Blog"));
        store.insert(SolutionPost::new(2, "edd").with_name("Easy Digital Downloads"));
        store.insert(
            SolutionPost::new(3, "ecommerce")
                .with_name("E-commerce")
                .with_required_solutions(vec![RawSolutionRef::new("edd #2").with_version_range("^2.0")])
                .with_excluded_solutions(vec![RawSolutionRef::new("blog #1")])
                .with_required_parts(vec![RawPartRef::new("parts/cart", "^1.0")]),
        );
        store.insert(
            SolutionPost::new(4, "presentation")
                .with_name("Presentation")
                .with_required_solutions(vec![RawSolutionRef::new("blog #1").with_version_range("^1.0")])
                .with_excluded_solutions(vec![RawSolutionRef::new("ecommerce #3")])
                .with_required_parts(vec![RawPartRef::new("parts/slides", "^2.0")]),
        );

        store.insert_purchase(PurchasedSolution::new(10, 3).with_status(PurchaseStatus::Active));
        store.insert_purchase(PurchasedSolution::new(11, 4));
        store.insert_purchase(PurchasedSolution::new(12, 1).with_status(PurchaseStatus::Inactive));
        store
    }

    pub fn fixture_factory(store: Arc<dyn PostStore>) -> SolutionFactory {
        SolutionFactory::new(store, vendor())
    }

    /// Resolver returning a fixed result and recording every request.
    pub struct StubResolver {
        result: Result<(), DryRunError>,
        pub requests: Mutex<Vec<DryRunRequest>>,
    }

    impl StubResolver {
        pub fn new(result: Result<(), DryRunError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl DependencyResolver for StubResolver {
        fn name(&self) -> &str {
            "stub"
        }

        async fn dry_run(&self, request: &DryRunRequest) -> Result<(), DryRunError> {
            self.requests.lock().unwrap().push(request.clone());
            self.result.clone()
        }
    }
}
