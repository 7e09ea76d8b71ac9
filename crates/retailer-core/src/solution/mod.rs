//! Solutions: the resolvable unit, its references and the builder that
//! normalizes raw record data into it.

mod builder;
mod context;
mod factory;
mod pseudo_id;
mod reference;
mod solution;
mod stability;

pub use builder::{RefNormalizer, SolutionBuilder, DEFAULT_SOLUTION_TYPE};
pub use context::{merge_priority, PriorityContext, SolutionContext};
pub use factory::SolutionFactory;
pub use pseudo_id::{PseudoId, PSEUDO_ID_DELIMITER};
pub use reference::{
    PartRequirement, RawPartRef, RawSolutionRef, SolutionRef, DEFAULT_VERSION_RANGE,
};
pub use solution::{Solution, Visibility};
pub use stability::Stability;
