//! Compositions: a customer's selection of solutions and its assembly into
//! a package manifest.

mod assembler;
mod dry_run;
mod manifest;

pub use assembler::{CompositionAssembler, CompositionReport, CompositionWarning, Resolution};
pub use dry_run::{DryRunOutcome, DryRunValidator};
pub use manifest::{Manifest, RequiredSolutionEntry, RequiredSolutionKind};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::solution::{PseudoId, SolutionContext};
use crate::store::PostId;

/// Lifecycle state of a composition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionStatus {
    #[default]
    Draft,
    NotReady,
    Ready,
    Active,
    Inactive,
}

impl CompositionStatus {
    /// All statuses with their display labels.
    pub fn labels() -> &'static [(CompositionStatus, &'static str)] {
        &[
            (CompositionStatus::Draft, "Draft"),
            (CompositionStatus::NotReady, "Not Ready"),
            (CompositionStatus::Ready, "Ready"),
            (CompositionStatus::Active, "Active"),
            (CompositionStatus::Inactive, "Inactive"),
        ]
    }

    pub fn label(&self) -> &'static str {
        Self::labels()
            .iter()
            .find(|(status, _)| status == self)
            .map(|(_, label)| *label)
            .unwrap_or("Unknown")
    }
}

impl fmt::Display for CompositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositionStatus::Draft => write!(f, "draft"),
            CompositionStatus::NotReady => write!(f, "not_ready"),
            CompositionStatus::Ready => write!(f, "ready"),
            CompositionStatus::Active => write!(f, "active"),
            CompositionStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// A solution the customer purchased, referenced by purchase record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchasedSolutionRef {
    pub purchased_solution_id: PostId,
    #[serde(default)]
    pub context: SolutionContext,
}

/// A solution added to the composition by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualSolutionRef {
    pub pseudo_id: PseudoId,
    #[serde(default)]
    pub context: SolutionContext,
}

/// Customer-facing aggregate of selected solutions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Composition {
    pub id: PostId,
    pub name: String,
    pub owner_user_ids: IndexSet<u64>,
    pub status: CompositionStatus,
    pub purchased_solutions: Vec<PurchasedSolutionRef>,
    pub manual_solutions: Vec<ManualSolutionRef>,
}

impl Composition {
    pub fn new(id: PostId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_status(mut self, status: CompositionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_owner(mut self, user_id: u64) -> Self {
        self.owner_user_ids.insert(user_id);
        self
    }

    pub fn with_purchased(mut self, purchased_solution_id: PostId, context: SolutionContext) -> Self {
        self.purchased_solutions.push(PurchasedSolutionRef {
            purchased_solution_id,
            context,
        });
        self
    }

    pub fn with_manual(mut self, pseudo_id: PseudoId, context: SolutionContext) -> Self {
        self.manual_solutions.push(ManualSolutionRef { pseudo_id, context });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.purchased_solutions.is_empty() && self.manual_solutions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&CompositionStatus::NotReady).unwrap(),
            "\"not_ready\""
        );
        assert_eq!(CompositionStatus::NotReady.label(), "Not Ready");
        assert_eq!(CompositionStatus::NotReady.to_string(), "not_ready");
        assert_eq!(CompositionStatus::default(), CompositionStatus::Draft);
    }

    #[test]
    fn test_composition_from_json() {
        let composition = Composition::from_json(
            r#"{
                "id": 5,
                "name": "My site",
                "owner_user_ids": [7, 7, 8],
                "status": "ready",
                "purchased_solutions": [{"purchased_solution_id": 10, "context": {"timestamp": 100}}],
                "manual_solutions": [{"pseudo_id": "blog #1"}]
            }"#,
        )
        .unwrap();

        assert_eq!(composition.owner_user_ids.len(), 2);
        assert_eq!(composition.status, CompositionStatus::Ready);
        assert_eq!(composition.purchased_solutions[0].context.priority(), Some(100));
        assert_eq!(composition.manual_solutions[0].pseudo_id, PseudoId::new("blog", 1));
        assert_eq!(composition.manual_solutions[0].context.priority(), None);
    }

    #[test]
    fn test_composition_rejects_bad_pseudo_id() {
        assert!(Composition::from_json(r#"{"manual_solutions": [{"pseudo_id": "blog"}]}"#).is_err());
    }

    #[test]
    fn test_builder_helpers() {
        let composition = Composition::new(1, "Site")
            .with_owner(3)
            .with_manual(PseudoId::new("blog", 1), SolutionContext::new());
        assert!(!composition.is_empty());
        assert!(Composition::new(2, "Empty").is_empty());
    }
}
