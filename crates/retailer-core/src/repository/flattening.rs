use std::collections::VecDeque;
use std::sync::Arc;

use super::traits::{SolutionMap, SolutionRepository};
use crate::solution::SolutionFactory;

/// Close `working` over required solutions.
///
/// Every required solution reachable from the working set is resolved
/// through `factory` (not limited to whatever filtered the initial set) and
/// added once. The result is sorted by package name.
pub fn flatten(mut working: SolutionMap, factory: &SolutionFactory) -> SolutionMap {
    let mut pending: VecDeque<_> = working.values().cloned().collect();

    while let Some(solution) = pending.pop_front() {
        for reference in solution.required_solutions().values() {
            if working.contains_key(&reference.package_name) {
                continue;
            }

            let required = match factory.from_pseudo_id(&reference.pseudo_id) {
                Ok(required) => Arc::new(required),
                Err(e) => {
                    log::error!(
                        "Could not resolve required solution \"{}\" of {}: {}",
                        reference.pseudo_id,
                        solution.identity(),
                        e
                    );
                    continue;
                }
            };

            // The record may carry a different name than the reference declared
            if working.contains_key(required.package_name()) {
                continue;
            }

            log::debug!("{} pulls in {}", solution.package_name(), required.package_name());
            working.insert(required.package_name().to_string(), Arc::clone(&required));
            pending.push_back(required);
        }
    }

    working.sort_keys();
    working
}

/// Decorator adding every transitively required solution to its source.
pub struct FlatteningRepository {
    name: String,
    source: Arc<dyn SolutionRepository>,
    factory: SolutionFactory,
}

impl FlatteningRepository {
    pub fn new(source: Arc<dyn SolutionRepository>, factory: SolutionFactory) -> Self {
        Self {
            name: format!("{} (flattened)", source.name()),
            source,
            factory,
        }
    }
}

impl SolutionRepository for FlatteningRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn all(&self) -> SolutionMap {
        flatten(self.source.all(), &self.factory)
    }

    fn reinitialize(&self) {
        self.source.reinitialize();
    }
}
