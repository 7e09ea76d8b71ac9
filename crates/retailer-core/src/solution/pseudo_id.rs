use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RetailerError;
use crate::store::PostId;

/// Separates the slug from the record id in a pseudo ID. Must never appear in a slug.
pub const PSEUDO_ID_DELIMITER: &str = " #";

/// Reference to one specific solution record: `"{slug} #{post_id}"`.
///
/// The record id keeps references unique even when two records share a slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PseudoId {
    slug: String,
    post_id: PostId,
}

impl PseudoId {
    pub fn new(slug: impl Into<String>, post_id: PostId) -> Self {
        Self {
            slug: slug.into(),
            post_id,
        }
    }

    /// Parse `"{slug} #{post_id}"`.
    ///
    /// Returns `None` when the delimiter is missing, the slug is empty, or the
    /// trailing segment is not a positive integer.
    ///
    /// ```
    /// use retailer_core::solution::PseudoId;
    ///
    /// let id = PseudoId::parse("ecommerce #12").unwrap();
    /// assert_eq!(id.slug(), "ecommerce");
    /// assert_eq!(id.post_id(), 12);
    ///
    /// assert!(PseudoId::parse("ecommerce").is_none());
    /// assert!(PseudoId::parse("ecommerce #").is_none());
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        let (slug, id) = value.rsplit_once(PSEUDO_ID_DELIMITER)?;

        if slug.trim().is_empty() || id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let post_id: PostId = id.parse().ok()?;
        if post_id == 0 {
            return None;
        }

        Some(Self::new(slug, post_id))
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }
}

impl fmt::Display for PseudoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.slug, PSEUDO_ID_DELIMITER, self.post_id)
    }
}

impl FromStr for PseudoId {
    type Err = RetailerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| RetailerError::InvalidPseudoId(s.to_string()))
    }
}

impl TryFrom<String> for PseudoId {
    type Error = RetailerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PseudoId> for String {
    fn from(id: PseudoId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for (slug, id) in [("blog", 1), ("e-commerce", 42), ("has#hash", 7), ("two words", 99)] {
            let encoded = PseudoId::new(slug, id).to_string();
            let parsed = PseudoId::parse(&encoded).unwrap();
            assert_eq!(parsed.slug(), slug);
            assert_eq!(parsed.post_id(), id);
        }
    }

    #[test]
    fn test_missing_delimiter() {
        assert!(PseudoId::parse("blog").is_none());
        assert!(PseudoId::parse("blog#12").is_none());
        assert!(PseudoId::parse("").is_none());
    }

    #[test]
    fn test_bad_record_id() {
        assert!(PseudoId::parse("blog #").is_none());
        assert!(PseudoId::parse("blog #abc").is_none());
        assert!(PseudoId::parse("blog #-3").is_none());
        assert!(PseudoId::parse("blog #0").is_none());
        assert!(PseudoId::parse(" #12").is_none());
    }

    #[test]
    fn test_splits_on_last_delimiter() {
        let parsed = PseudoId::parse("odd #slug #5").unwrap();
        assert_eq!(parsed.slug(), "odd #slug");
        assert_eq!(parsed.post_id(), 5);
    }

    #[test]
    fn test_from_str_error() {
        let err = "nope".parse::<PseudoId>().unwrap_err();
        assert!(matches!(err, RetailerError::InvalidPseudoId(_)));
    }

    #[test]
    fn test_serde_as_string() {
        let id = PseudoId::new("blog", 3);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"blog #3\"");
        let parsed: PseudoId = serde_json::from_str("\"blog #3\"").unwrap();
        assert_eq!(parsed, id);
        assert!(serde_json::from_str::<PseudoId>("\"blog\"").is_err());
    }
}
