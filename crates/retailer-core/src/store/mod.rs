//! Post Store contract: read-only access to solution and purchase records.

mod memory;

pub use memory::MemoryPostStore;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::solution::{RawPartRef, RawSolutionRef, Visibility};

/// Integer record id. `0` means "no record".
pub type PostId = u64;

/// A solution record as held by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolutionPost {
    pub id: PostId,
    pub name: String,
    pub slug: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub solution_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    pub keywords: Vec<String>,
    pub categories: Vec<String>,
    pub visibility: Visibility,
    pub required_parts: Vec<RawPartRef>,
    pub required_solutions: Vec<RawSolutionRef>,
    pub excluded_solutions: Vec<RawSolutionRef>,
}

impl SolutionPost {
    pub fn new(id: PostId, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id,
            name: slug.clone(),
            slug,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_type(mut self, solution_type: impl Into<String>) -> Self {
        self.solution_type = Some(solution_type.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_required_parts(mut self, parts: Vec<RawPartRef>) -> Self {
        self.required_parts = parts;
        self
    }

    pub fn with_required_solutions(mut self, refs: Vec<RawSolutionRef>) -> Self {
        self.required_solutions = refs;
        self
    }

    pub fn with_excluded_solutions(mut self, refs: Vec<RawSolutionRef>) -> Self {
        self.excluded_solutions = refs;
        self
    }
}

/// Query criteria for [`PostStore::query`]. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub ids: Vec<PostId>,
    pub exclude_ids: Vec<PostId>,
    pub slugs: Vec<String>,
    pub visibility: Vec<Visibility>,
    pub types: Vec<String>,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
}

impl PostQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(mut self, ids: impl IntoIterator<Item = PostId>) -> Self {
        self.ids.extend(ids);
        self
    }

    pub fn excluding_ids(mut self, ids: impl IntoIterator<Item = PostId>) -> Self {
        self.exclude_ids.extend(ids);
        self
    }

    pub fn with_slugs<S: Into<String>>(mut self, slugs: impl IntoIterator<Item = S>) -> Self {
        self.slugs.extend(slugs.into_iter().map(Into::into));
        self
    }

    pub fn with_visibility(mut self, visibility: impl IntoIterator<Item = Visibility>) -> Self {
        self.visibility.extend(visibility);
        self
    }

    pub fn with_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn with_categories<S: Into<String>>(mut self, categories: impl IntoIterator<Item = S>) -> Self {
        self.categories.extend(categories.into_iter().map(Into::into));
        self
    }

    pub fn with_keywords<S: Into<String>>(mut self, keywords: impl IntoIterator<Item = S>) -> Self {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    /// Whether a record satisfies every non-empty criterion.
    pub fn matches(&self, post: &SolutionPost) -> bool {
        if !self.ids.is_empty() && !self.ids.contains(&post.id) {
            return false;
        }
        if self.exclude_ids.contains(&post.id) {
            return false;
        }
        if !self.slugs.is_empty() && !self.slugs.iter().any(|slug| *slug == post.slug) {
            return false;
        }
        if !self.visibility.is_empty() && !self.visibility.contains(&post.visibility) {
            return false;
        }
        if !self.types.is_empty() {
            let Some(solution_type) = post.solution_type.as_deref() else {
                return false;
            };
            if !self.types.iter().any(|t| t == solution_type) {
                return false;
            }
        }
        if !self.categories.is_empty() && !self.categories.iter().any(|c| post.categories.contains(c)) {
            return false;
        }
        if !self.keywords.is_empty() && !self.keywords.iter().any(|k| post.keywords.contains(k)) {
            return false;
        }
        true
    }
}

/// Read-only access to solution records.
pub trait PostStore: Send + Sync {
    /// Fetch one record by id.
    fn get(&self, id: PostId) -> Option<SolutionPost>;

    /// Ids of the records matching `query`, in store order.
    fn query(&self, query: &PostQuery) -> Vec<PostId>;
}

/// Lifecycle state of a purchase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    #[default]
    Ready,
    Active,
    Inactive,
    Invalid,
}

impl PurchaseStatus {
    /// Only ready and active purchases contribute solutions to a composition.
    pub fn is_resolvable(&self) -> bool {
        matches!(self, PurchaseStatus::Ready | PurchaseStatus::Active)
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseStatus::Ready => write!(f, "ready"),
            PurchaseStatus::Active => write!(f, "active"),
            PurchaseStatus::Inactive => write!(f, "inactive"),
            PurchaseStatus::Invalid => write!(f, "invalid"),
        }
    }
}

/// A customer's purchase of one solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasedSolution {
    pub id: PostId,
    pub solution_id: PostId,
    #[serde(default)]
    pub customer_id: PostId,
    #[serde(default)]
    pub status: PurchaseStatus,
}

impl PurchasedSolution {
    pub fn new(id: PostId, solution_id: PostId) -> Self {
        Self {
            id,
            solution_id,
            customer_id: 0,
            status: PurchaseStatus::default(),
        }
    }

    pub fn with_status(mut self, status: PurchaseStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_customer(mut self, customer_id: PostId) -> Self {
        self.customer_id = customer_id;
        self
    }
}

/// Read-only access to purchase records.
pub trait PurchaseStore: Send + Sync {
    fn purchased_solution(&self, id: PostId) -> Option<PurchasedSolution>;
}
