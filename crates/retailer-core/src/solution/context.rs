use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-package priority signals, keyed by canonical package name.
pub type PriorityContext = IndexMap<String, SolutionContext>;

/// Context attached to a solution selection (purchase, manual addition).
///
/// `timestamp` is the recency signal used to order exclusion processing; any
/// other fields are carried through untouched into the manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolutionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(timestamp: i64) -> Self {
        Self {
            timestamp: Some(timestamp),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Priority used by exclusion processing; `None` sorts after every declared priority.
    pub fn priority(&self) -> Option<i64> {
        self.timestamp
    }
}

/// Record `context` for `package_name`, keeping the more recent timestamp on collision.
pub fn merge_priority(priority: &mut PriorityContext, package_name: &str, context: &SolutionContext) {
    match priority.get_mut(package_name) {
        Some(existing) if existing.priority() >= context.priority() => {}
        Some(existing) => *existing = context.clone(),
        None => {
            priority.insert(package_name.to_string(), context.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_serde_keeps_extra_fields() {
        let context: SolutionContext = serde_json::from_value(serde_json::json!({
            "timestamp": 1700000000,
            "order_id": 77
        }))
        .unwrap();

        assert_eq!(context.priority(), Some(1700000000));
        assert_eq!(context.extra.get("order_id"), Some(&serde_json::json!(77)));

        let value = serde_json::to_value(&context).unwrap();
        assert_eq!(value["order_id"], 77);
        assert_eq!(value["timestamp"], 1700000000);
    }

    #[test]
    fn test_merge_priority_keeps_most_recent() {
        let mut priority = PriorityContext::new();
        merge_priority(&mut priority, "vendor/a", &SolutionContext::at(10));
        merge_priority(&mut priority, "vendor/a", &SolutionContext::at(5));
        assert_eq!(priority["vendor/a"].priority(), Some(10));

        merge_priority(&mut priority, "vendor/a", &SolutionContext::at(20));
        assert_eq!(priority["vendor/a"].priority(), Some(20));

        merge_priority(&mut priority, "vendor/b", &SolutionContext::new());
        assert_eq!(priority["vendor/b"].priority(), None);
    }
}
