//! In-memory Post Store, loadable from a JSON document.

use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use serde::Deserialize;

use super::{PostId, PostQuery, PostStore, PurchaseStore, PurchasedSolution, SolutionPost};
use crate::error::Result;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreDocument {
    solutions: Vec<SolutionPost>,
    purchased_solutions: Vec<PurchasedSolution>,
}

/// Records held in memory, in insertion order.
///
/// Document shape:
///
/// ```json
/// {
///   "solutions": [ { "id": 1, "slug": "blog", "required_solutions": [] } ],
///   "purchased_solutions": [ { "id": 10, "solution_id": 1, "status": "active" } ]
/// }
/// ```
#[derive(Debug, Default)]
pub struct MemoryPostStore {
    posts: RwLock<IndexMap<PostId, SolutionPost>>,
    purchases: RwLock<IndexMap<PostId, PurchasedSolution>>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: StoreDocument = serde_json::from_str(json)?;
        let store = Self::new();
        for post in document.solutions {
            store.insert(post);
        }
        for purchase in document.purchased_solutions {
            store.insert_purchase(purchase);
        }
        Ok(store)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Insert or replace a record.
    pub fn insert(&self, post: SolutionPost) {
        write(&self.posts).insert(post.id, post);
    }

    pub fn remove(&self, id: PostId) -> Option<SolutionPost> {
        write(&self.posts).shift_remove(&id)
    }

    pub fn insert_purchase(&self, purchase: PurchasedSolution) {
        write(&self.purchases).insert(purchase.id, purchase);
    }

    pub fn len(&self) -> usize {
        read(&self.posts).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.posts).is_empty()
    }
}

// A poisoned lock still holds consistent data: every write is a single insert/remove.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl PostStore for MemoryPostStore {
    fn get(&self, id: PostId) -> Option<SolutionPost> {
        read(&self.posts).get(&id).cloned()
    }

    fn query(&self, query: &PostQuery) -> Vec<PostId> {
        read(&self.posts)
            .values()
            .filter(|post| query.matches(post))
            .map(|post| post.id)
            .collect()
    }
}

impl PurchaseStore for MemoryPostStore {
    fn purchased_solution(&self, id: PostId) -> Option<PurchasedSolution> {
        read(&self.purchases).get(&id).cloned()
    }
}
