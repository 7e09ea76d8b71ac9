//! Solution repositories and the resolution decorators layered on them.

mod exclusion;
mod filtered;
mod flattening;
mod memory;
mod multi;
mod post_store;
mod traits;

pub use exclusion::{priority_order, resolve_exclusions, ExclusionOutcome, ExclusionRepository};
pub use filtered::FilteredRepository;
pub use flattening::{flatten, FlatteningRepository};
pub use memory::InMemoryRepository;
pub use multi::MultiRepository;
pub use post_store::PostStoreRepository;
pub use traits::{RepositoryExt, SolutionMap, SolutionPredicate, SolutionRepository};
