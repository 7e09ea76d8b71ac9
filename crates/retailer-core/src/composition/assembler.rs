use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use super::{
    Composition, CompositionStatus, DryRunOutcome, DryRunValidator, Manifest,
    RequiredSolutionEntry, RequiredSolutionKind,
};
use crate::catalogue::PartsCatalogue;
use crate::error::RetailerError;
use crate::repository::{
    priority_order, ExclusionRepository, InMemoryRepository, SolutionMap, SolutionRepository,
};
use crate::solution::{
    merge_priority, PartRequirement, PriorityContext, Solution, SolutionContext, SolutionFactory,
    DEFAULT_VERSION_RANGE,
};
use crate::store::{PostId, PurchaseStatus, PurchaseStore};

/// Non-fatal problem found while assembling a composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompositionWarning {
    UnresolvedReference { reference: String, reason: String },
    InactivePurchase { purchased_solution_id: PostId, status: PurchaseStatus },
    ExcludedSolution { package_name: String, excluded_by: String },
    UnknownPart { package_name: String },
    CatalogueUnavailable { reason: String },
    DryRunFailed { message: String },
    DryRunSkipped { reason: String },
}

impl fmt::Display for CompositionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositionWarning::UnresolvedReference { reference, reason } => {
                write!(f, "{} could not be resolved: {}", reference, reason)
            }
            CompositionWarning::InactivePurchase {
                purchased_solution_id,
                status,
            } => write!(
                f,
                "purchased solution #{} is {} and was skipped",
                purchased_solution_id, status
            ),
            CompositionWarning::ExcludedSolution {
                package_name,
                excluded_by,
            } => write!(f, "{} is excluded by {}", package_name, excluded_by),
            CompositionWarning::UnknownPart { package_name } => {
                write!(f, "part {} is not in the parts catalogue", package_name)
            }
            CompositionWarning::CatalogueUnavailable { reason } => {
                write!(f, "parts catalogue unavailable: {}", reason)
            }
            CompositionWarning::DryRunFailed { message } => write!(f, "dry run failed: {}", message),
            CompositionWarning::DryRunSkipped { reason } => write!(f, "dry run skipped: {}", reason),
        }
    }
}

/// Local resolution of a composition, before any dry run.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub manifest: Manifest,
    /// Surviving solutions, sorted by package name
    pub solutions: SolutionMap,
    /// Excluded package name -> package name of the excluding solution
    pub excluded: IndexMap<String, String>,
    pub priority: PriorityContext,
    pub warnings: Vec<CompositionWarning>,
}

/// Full assembly result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionReport {
    pub composition_id: PostId,
    pub status: CompositionStatus,
    pub manifest: Manifest,
    pub solutions: Vec<String>,
    pub warnings: Vec<CompositionWarning>,
    pub dry_run: DryRunOutcome,
}

impl CompositionReport {
    /// The manifest did not pass the dry run and should be looked at.
    pub fn needs_review(&self) -> bool {
        self.dry_run.is_failed()
    }

    /// Status the composition should move to given this report.
    ///
    /// Drafts and inactive compositions are left alone. A failed dry run
    /// marks the composition not ready; a passing one promotes a not-ready
    /// composition back to ready.
    pub fn suggested_status(&self) -> CompositionStatus {
        match self.status {
            CompositionStatus::Draft | CompositionStatus::Inactive => self.status,
            _ if self.needs_review() => CompositionStatus::NotReady,
            CompositionStatus::NotReady if self.dry_run == DryRunOutcome::Passed => {
                CompositionStatus::Ready
            }
            status => status,
        }
    }
}

struct Selection {
    kind: RequiredSolutionKind,
    solution: Arc<Solution>,
    purchased_solution_id: Option<PostId>,
    context: SolutionContext,
}

/// Turns a composition into its package manifest.
#[derive(Clone)]
pub struct CompositionAssembler {
    factory: SolutionFactory,
    purchases: Arc<dyn PurchaseStore>,
}

impl CompositionAssembler {
    pub fn new(factory: SolutionFactory, purchases: Arc<dyn PurchaseStore>) -> Self {
        Self { factory, purchases }
    }

    /// Resolve the composition locally: flatten, apply exclusions, aggregate
    /// parts and build the manifest.
    pub fn resolve(&self, composition: &Composition) -> Resolution {
        let mut warnings = Vec::new();
        let selections = self.selections(composition, &mut warnings);

        let mut priority = PriorityContext::new();
        for selection in &selections {
            merge_priority(&mut priority, selection.solution.package_name(), &selection.context);
        }

        let base: Arc<dyn SolutionRepository> = Arc::new(InMemoryRepository::from_solutions(
            format!("composition #{}", composition.id),
            selections.iter().map(|selection| Arc::clone(&selection.solution)),
        ));
        let outcome = ExclusionRepository::new(base, self.factory.clone())
            .with_priority(priority.clone())
            .outcome();

        for (package_name, excluded_by) in &outcome.excluded {
            warnings.push(CompositionWarning::ExcludedSolution {
                package_name: package_name.clone(),
                excluded_by: excluded_by.clone(),
            });
        }

        let manifest = build_manifest(&selections, &outcome.kept, &priority);
        log::debug!(
            "Composition #{} resolved to {} solutions and {} parts",
            composition.id,
            outcome.kept.len(),
            manifest.required_parts.len()
        );

        Resolution {
            manifest,
            solutions: outcome.kept,
            excluded: outcome.excluded,
            priority,
            warnings,
        }
    }

    /// Resolve, check parts against the catalogue (when given) and dry run.
    ///
    /// Nothing here rejects the composition; problems end up as warnings.
    pub async fn assemble(
        &self,
        composition: &Composition,
        validator: &DryRunValidator,
        catalogue: Option<&PartsCatalogue>,
    ) -> CompositionReport {
        let Resolution {
            manifest,
            solutions,
            mut warnings,
            ..
        } = self.resolve(composition);

        if let Some(catalogue) = catalogue {
            match catalogue.parts().await {
                Ok(parts) => {
                    for package_name in manifest.required_parts.keys() {
                        if !parts.contains_key(package_name) {
                            log::warn!("Required part {} is not in the parts catalogue", package_name);
                            warnings.push(CompositionWarning::UnknownPart {
                                package_name: package_name.clone(),
                            });
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Could not load parts catalogue: {}", e);
                    warnings.push(CompositionWarning::CatalogueUnavailable {
                        reason: e.to_string(),
                    });
                }
            }
        }

        let dry_run = validator.validate(&manifest).await;
        match &dry_run {
            DryRunOutcome::Passed => {}
            DryRunOutcome::Failed { message } => warnings.push(CompositionWarning::DryRunFailed {
                message: message.clone(),
            }),
            DryRunOutcome::Skipped { reason } => warnings.push(CompositionWarning::DryRunSkipped {
                reason: reason.clone(),
            }),
        }

        CompositionReport {
            composition_id: composition.id,
            status: composition.status,
            manifest,
            solutions: solutions.into_keys().collect(),
            warnings,
            dry_run,
        }
    }

    fn selections(
        &self,
        composition: &Composition,
        warnings: &mut Vec<CompositionWarning>,
    ) -> Vec<Selection> {
        let mut selections = Vec::new();

        for reference in &composition.purchased_solutions {
            let id = reference.purchased_solution_id;
            let label = format!("purchased solution #{}", id);

            let Some(purchase) = self.purchases.purchased_solution(id) else {
                let reason = RetailerError::PurchasedSolutionNotFound { id }.to_string();
                log::error!("Composition #{}: {}", composition.id, reason);
                warnings.push(CompositionWarning::UnresolvedReference {
                    reference: label,
                    reason,
                });
                continue;
            };

            if !purchase.status.is_resolvable() {
                log::warn!(
                    "Composition #{}: skipping {} with status {}",
                    composition.id,
                    label,
                    purchase.status
                );
                warnings.push(CompositionWarning::InactivePurchase {
                    purchased_solution_id: id,
                    status: purchase.status,
                });
                continue;
            }

            match self.factory.from_post_id(purchase.solution_id) {
                Ok(solution) => selections.push(Selection {
                    kind: RequiredSolutionKind::Purchased,
                    solution: Arc::new(solution),
                    purchased_solution_id: Some(id),
                    context: reference.context.clone(),
                }),
                Err(e) => {
                    log::error!("Composition #{}: {} could not be resolved: {}", composition.id, label, e);
                    warnings.push(CompositionWarning::UnresolvedReference {
                        reference: label,
                        reason: e.to_string(),
                    });
                }
            }
        }

        for reference in &composition.manual_solutions {
            match self.factory.from_pseudo_id(&reference.pseudo_id) {
                Ok(solution) => selections.push(Selection {
                    kind: RequiredSolutionKind::Manual,
                    solution: Arc::new(solution),
                    purchased_solution_id: None,
                    context: reference.context.clone(),
                }),
                Err(e) => {
                    log::error!(
                        "Composition #{}: solution \"{}\" could not be resolved: {}",
                        composition.id,
                        reference.pseudo_id,
                        e
                    );
                    warnings.push(CompositionWarning::UnresolvedReference {
                        reference: reference.pseudo_id.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        selections
    }
}

/// Aggregate parts and version ranges over the surviving solutions.
///
/// `priority_order` is walked in reverse, lowest priority first, and later
/// writes overwrite earlier ones. The highest-priority declaration of a part
/// or range is therefore the one kept; walking it forwards would keep the
/// lowest.
fn build_manifest(selections: &[Selection], kept: &SolutionMap, priority: &PriorityContext) -> Manifest {
    let mut required_parts: IndexMap<String, PartRequirement> = IndexMap::new();
    let mut ranges: IndexMap<String, String> = IndexMap::new();

    for solution in priority_order(kept, priority).iter().rev() {
        for part in solution.required_parts().values() {
            required_parts.insert(part.package_name.clone(), part.clone());
        }
        for reference in solution.required_solutions().values() {
            if kept.contains_key(&reference.package_name) {
                ranges.insert(reference.package_name.clone(), reference.version_range.clone());
            }
        }
    }
    required_parts.sort_keys();

    let mut composer_require: IndexMap<String, String> = kept
        .keys()
        .map(|package_name| {
            let range = ranges
                .get(package_name)
                .cloned()
                .unwrap_or_else(|| DEFAULT_VERSION_RANGE.to_string());
            (package_name.clone(), range)
        })
        .collect();
    for (package_name, part) in &required_parts {
        composer_require
            .entry(package_name.clone())
            .or_insert_with(|| part.version_range.clone());
    }

    let required_solutions = selections
        .iter()
        .filter(|selection| kept.contains_key(selection.solution.package_name()))
        .map(|selection| RequiredSolutionEntry {
            kind: selection.kind,
            slug: selection.solution.slug().to_string(),
            managed_post_id: selection.solution.managed_post_id(),
            package_name: selection.solution.package_name().to_string(),
            purchased_solution_id: selection.purchased_solution_id,
            context: selection.context.clone(),
        })
        .collect();

    Manifest {
        required_solutions,
        composer_require,
        required_parts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{DryRunError, PackageSource};
    use crate::solution::{PseudoId, RawPartRef};
    use crate::store::{MemoryPostStore, SolutionPost};
    use crate::test_fixtures::{fixture_factory, fixture_store, StubResolver};

    fn assembler() -> CompositionAssembler {
        let store = Arc::new(fixture_store());
        CompositionAssembler::new(fixture_factory(store.clone()), store)
    }

    fn manual(pairs: &[(&str, u64, Option<i64>)]) -> Composition {
        let mut composition = Composition::new(1, "Site").with_status(CompositionStatus::Ready);
        for (slug, id, timestamp) in pairs {
            let context = match timestamp {
                Some(timestamp) => SolutionContext::at(*timestamp),
                None => SolutionContext::new(),
            };
            composition = composition.with_manual(PseudoId::new(*slug, *id), context);
        }
        composition
    }

    fn names(resolution: &Resolution) -> Vec<&str> {
        resolution.solutions.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_resolve_without_priority() {
        let resolution = assembler().resolve(&manual(&[("ecommerce", 3, None), ("presentation", 4, None)]));

        assert_eq!(names(&resolution), vec!["retailer/edd", "retailer/presentation"]);
        assert_eq!(resolution.excluded["retailer/blog"], "retailer/ecommerce");
        assert_eq!(resolution.excluded["retailer/ecommerce"], "retailer/presentation");
        assert_eq!(resolution.manifest.solution_packages(), vec!["retailer/presentation"]);
        // ecommerce did not survive, so its "^2.0" on edd does not apply
        assert_eq!(resolution.manifest.composer_require["retailer/edd"], "*");
    }

    #[test]
    fn test_resolve_presentation_newer() {
        let resolution = assembler().resolve(&manual(&[
            ("ecommerce", 3, Some(100)),
            ("presentation", 4, Some(200)),
        ]));

        assert_eq!(
            names(&resolution),
            vec!["retailer/blog", "retailer/edd", "retailer/presentation"]
        );
        assert_eq!(resolution.manifest.composer_require["retailer/blog"], "^1.0");
        assert_eq!(resolution.priority["retailer/presentation"].priority(), Some(200));
    }

    #[test]
    fn test_composer_require_lists_solutions_then_parts() {
        let resolution = assembler().resolve(&manual(&[("presentation", 4, None)]));

        let keys: Vec<&str> = resolution
            .manifest
            .composer_require
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["retailer/blog", "retailer/presentation", "parts/slides"]);
        assert_eq!(resolution.manifest.required_parts["parts/slides"].version_range, "^2.0");
    }

    #[test]
    fn test_purchased_and_inactive() {
        let composition = Composition::new(2, "Shop")
            .with_purchased(10, SolutionContext::at(50))
            .with_purchased(12, SolutionContext::new())
            .with_purchased(99, SolutionContext::new());

        let resolution = assembler().resolve(&composition);

        assert_eq!(names(&resolution), vec!["retailer/ecommerce", "retailer/edd"]);
        let entry = &resolution.manifest.required_solutions[0];
        assert_eq!(entry.kind, RequiredSolutionKind::Purchased);
        assert_eq!(entry.purchased_solution_id, Some(10));
        assert_eq!(entry.managed_post_id, 3);

        assert!(resolution.warnings.contains(&CompositionWarning::InactivePurchase {
            purchased_solution_id: 12,
            status: PurchaseStatus::Inactive,
        }));
        assert!(resolution.warnings.iter().any(|warning| matches!(
            warning,
            CompositionWarning::UnresolvedReference { reference, .. } if reference == "purchased solution #99"
        )));
    }

    #[test]
    fn test_unresolved_manual_reference() {
        let resolution = assembler().resolve(&manual(&[("ghost", 99, None), ("blog", 1, None)]));

        assert_eq!(names(&resolution), vec!["retailer/blog"]);
        assert!(matches!(
            &resolution.warnings[0],
            CompositionWarning::UnresolvedReference { reference, .. } if reference == "ghost #99"
        ));
    }

    #[test]
    fn test_part_conflict_highest_priority_wins() {
        let store = Arc::new(MemoryPostStore::new());
        store.insert(
            SolutionPost::new(1, "x").with_required_parts(vec![RawPartRef::new("parts/p", "^1.0")]),
        );
        store.insert(
            SolutionPost::new(2, "y").with_required_parts(vec![RawPartRef::new("parts/p", "^2.0")]),
        );
        let assembler = CompositionAssembler::new(fixture_factory(store.clone()), store);

        let resolution = assembler.resolve(&manual(&[("x", 1, Some(10)), ("y", 2, Some(20))]));
        assert_eq!(resolution.manifest.required_parts["parts/p"].version_range, "^2.0");
        assert_eq!(resolution.manifest.composer_require["parts/p"], "^2.0");

        let resolution = assembler.resolve(&manual(&[("x", 1, Some(30)), ("y", 2, Some(20))]));
        assert_eq!(resolution.manifest.required_parts["parts/p"].version_range, "^1.0");
    }

    #[test]
    fn test_empty_composition() {
        let resolution = assembler().resolve(&Composition::new(3, "Empty"));
        assert!(resolution.solutions.is_empty());
        assert!(resolution.manifest.is_empty());
        assert!(resolution.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_assemble_dry_run_failure_needs_review() {
        let resolver = StubResolver::new(Err(DryRunError::Unsatisfiable("conflict".to_string())));
        let validator = DryRunValidator::new(
            resolver,
            vec![PackageSource::composer("solutions", "https://shop.test/solutions")],
        );

        let report = assembler()
            .assemble(&manual(&[("blog", 1, None)]), &validator, None)
            .await;

        assert!(report.needs_review());
        assert_eq!(report.suggested_status(), CompositionStatus::NotReady);
        assert_eq!(report.solutions, vec!["retailer/blog"]);
        assert!(report.warnings.contains(&CompositionWarning::DryRunFailed {
            message: "conflict".to_string()
        }));
    }

    #[tokio::test]
    async fn test_assemble_skipped_dry_run() {
        let validator = DryRunValidator::disabled("not configured");

        let report = assembler()
            .assemble(&manual(&[("blog", 1, None)]), &validator, None)
            .await;

        assert!(!report.needs_review());
        assert_eq!(report.suggested_status(), CompositionStatus::Ready);
        assert_eq!(
            report.warnings,
            vec![CompositionWarning::DryRunSkipped {
                reason: "not configured".to_string()
            }]
        );
    }

    #[test]
    fn test_suggested_status() {
        let report = CompositionReport {
            composition_id: 1,
            status: CompositionStatus::NotReady,
            manifest: Manifest::default(),
            solutions: Vec::new(),
            warnings: Vec::new(),
            dry_run: DryRunOutcome::Passed,
        };
        assert_eq!(report.suggested_status(), CompositionStatus::Ready);

        let draft = CompositionReport {
            status: CompositionStatus::Draft,
            dry_run: DryRunOutcome::Failed {
                message: "conflict".to_string(),
            },
            ..report
        };
        assert_eq!(draft.suggested_status(), CompositionStatus::Draft);
    }

    #[test]
    fn test_warning_display() {
        let warning = CompositionWarning::ExcludedSolution {
            package_name: "retailer/blog".to_string(),
            excluded_by: "retailer/ecommerce".to_string(),
        };
        assert_eq!(warning.to_string(), "retailer/blog is excluded by retailer/ecommerce");
    }
}
