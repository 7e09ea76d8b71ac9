use std::sync::Arc;

use indexmap::IndexMap;

use super::flattening::FlatteningRepository;
use super::traits::{SolutionMap, SolutionRepository};
use crate::solution::{PriorityContext, Solution, SolutionFactory};

/// Order solutions for exclusion processing: declared priority descending,
/// then solutions without a priority in their working-set order.
pub fn priority_order(working: &SolutionMap, priority: &PriorityContext) -> Vec<Arc<Solution>> {
    let mut ordered: Vec<(Arc<Solution>, Option<i64>)> = working
        .values()
        .map(|solution| {
            let rank = priority
                .get(solution.package_name())
                .and_then(|context| context.priority());
            (Arc::clone(solution), rank)
        })
        .collect();

    // Stable; `None` compares lowest so it lands last
    ordered.sort_by(|a, b| b.1.cmp(&a.1));
    ordered.into_iter().map(|(solution, _)| solution).collect()
}

/// Result of exclusion processing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExclusionOutcome {
    /// Surviving solutions, sorted by package name
    pub kept: SolutionMap,
    /// Excluded package name -> package name of the solution that excluded it
    pub excluded: IndexMap<String, String>,
}

/// Apply mutual exclusions to a working set.
///
/// Solutions are visited once, in [`priority_order`]. A solution that has
/// already been excluded is skipped and its own exclusions are ignored. Only
/// targets present in the working set are excluded; a solution excluding
/// itself is ignored.
pub fn resolve_exclusions(working: &SolutionMap, priority: &PriorityContext) -> ExclusionOutcome {
    let mut excluded: IndexMap<String, String> = IndexMap::new();

    for solution in priority_order(working, priority) {
        if excluded.contains_key(solution.package_name()) {
            log::debug!(
                "{} is excluded, ignoring its exclusions",
                solution.package_name()
            );
            continue;
        }

        for reference in solution.excluded_solutions().values() {
            let target = &reference.package_name;
            if target == solution.package_name() || !working.contains_key(target) {
                continue;
            }
            if !excluded.contains_key(target) {
                log::debug!("{} excludes {}", solution.package_name(), target);
                excluded.insert(target.clone(), solution.package_name().to_string());
            }
        }
    }

    let mut kept: SolutionMap = working
        .iter()
        .filter(|(package_name, _)| !excluded.contains_key(*package_name))
        .map(|(package_name, solution)| (package_name.clone(), Arc::clone(solution)))
        .collect();
    kept.sort_keys();

    ExclusionOutcome { kept, excluded }
}

/// Decorator removing mutually excluded solutions from its source.
///
/// The source is flattened first so exclusions see every transitively
/// required solution, not just the ones the source lists.
pub struct ExclusionRepository {
    name: String,
    source: FlatteningRepository,
    priority: PriorityContext,
}

impl ExclusionRepository {
    pub fn new(source: Arc<dyn SolutionRepository>, factory: SolutionFactory) -> Self {
        let source = FlatteningRepository::new(source, factory);
        Self {
            name: format!("{} (exclusions applied)", source.name()),
            source,
            priority: PriorityContext::new(),
        }
    }

    pub fn with_priority(mut self, priority: PriorityContext) -> Self {
        self.priority = priority;
        self
    }

    pub fn priority(&self) -> &PriorityContext {
        &self.priority
    }

    /// Surviving solutions together with what was excluded and by whom.
    pub fn outcome(&self) -> ExclusionOutcome {
        resolve_exclusions(&self.source.all(), &self.priority)
    }
}

impl SolutionRepository for ExclusionRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn all(&self) -> SolutionMap {
        self.outcome().kept
    }

    fn reinitialize(&self) {
        self.source.reinitialize();
    }
}
