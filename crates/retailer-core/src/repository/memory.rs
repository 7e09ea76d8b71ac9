use std::sync::{Arc, RwLock};

use super::traits::{SolutionMap, SolutionRepository};
use crate::solution::Solution;

/// Repository over solutions held in memory.
#[derive(Debug)]
pub struct InMemoryRepository {
    name: String,
    solutions: RwLock<SolutionMap>,
}

impl InMemoryRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_map(name, SolutionMap::new())
    }

    pub fn from_map(name: impl Into<String>, solutions: SolutionMap) -> Self {
        Self {
            name: name.into(),
            solutions: RwLock::new(solutions),
        }
    }

    pub fn from_solutions(
        name: impl Into<String>,
        solutions: impl IntoIterator<Item = Arc<Solution>>,
    ) -> Self {
        let solutions = solutions
            .into_iter()
            .map(|solution| (solution.package_name().to_string(), solution))
            .collect();
        Self::from_map(name, solutions)
    }

    pub fn with_solution(self, solution: Solution) -> Self {
        self.add(solution);
        self
    }

    /// Add or replace a solution; a replaced package keeps its position.
    pub fn add(&self, solution: impl Into<Arc<Solution>>) {
        let solution = solution.into();
        self.solutions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(solution.package_name().to_string(), solution);
    }

    pub fn remove(&self, package_name: &str) -> Option<Arc<Solution>> {
        self.solutions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .shift_remove(package_name)
    }
}

impl SolutionRepository for InMemoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn all(&self) -> SolutionMap {
        self.solutions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::solution;

    #[test]
    fn test_add_keeps_position() {
        let repository = InMemoryRepository::new("test")
            .with_solution(solution("blog").build().unwrap())
            .with_solution(solution("edd").build().unwrap());

        repository.add(solution("blog").with_description("updated").build().unwrap());

        assert_eq!(repository.package_names(), vec!["retailer/blog", "retailer/edd"]);
        assert_eq!(
            repository.get("retailer/blog").unwrap().description(),
            Some("updated")
        );
    }

    #[test]
    fn test_remove() {
        let repository = InMemoryRepository::new("test").with_solution(solution("blog").build().unwrap());
        assert!(repository.remove("retailer/blog").is_some());
        assert_eq!(repository.count(), 0);
        assert!(repository.remove("retailer/blog").is_none());
    }
}
