//! Parts catalogue: the list of part packages available in the parts
//! repository, fetched over HTTP and cached on disk.

mod cache;

pub use cache::{CacheMetadata, CatalogueCache};

use std::path::Path;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::{Config, ConfigLoader};
use crate::error::{Result, RetailerError};
use crate::http::{HttpClient, HttpClientConfig};

const CATALOGUE_KEY: &str = "packages.json";

/// One part package offered by the parts repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
    pub versions: Vec<String>,
}

pub type PartMap = IndexMap<String, PartInfo>;

/// Parse a Composer `packages.json` document into parts, sorted by name.
///
/// Both the inline `{"name": {"version": {...}}}` layout and the
/// `{"name": [{"version": ...}]}` layout are accepted.
pub fn parse_packages_json(content: &[u8]) -> Result<PartMap> {
    let document: serde_json::Value = serde_json::from_slice(content)?;
    let packages = document
        .get("packages")
        .and_then(|packages| packages.as_object())
        .ok_or_else(|| RetailerError::Config("packages.json has no \"packages\" object".to_string()))?;

    let mut parts = PartMap::new();
    for (name, versions) in packages {
        let releases: Vec<(String, &serde_json::Value)> = match versions {
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(version, release)| (version.clone(), release))
                .collect(),
            serde_json::Value::Array(list) => list
                .iter()
                .filter_map(|release| {
                    let version = release.get("version")?.as_str()?.to_string();
                    Some((version, release))
                })
                .collect(),
            _ => continue,
        };

        let latest = releases.last().map(|(_, release)| *release);
        let field = |key: &str| {
            latest
                .and_then(|release| release.get(key))
                .and_then(|value| value.as_str())
                .map(str::to_string)
        };

        parts.insert(
            name.to_lowercase(),
            PartInfo {
                name: name.to_lowercase(),
                description: field("description"),
                package_type: field("type"),
                versions: releases.iter().map(|(version, _)| version.clone()).collect(),
            },
        );
    }

    parts.sort_keys();
    Ok(parts)
}

struct Loaded {
    at: Instant,
    parts: PartMap,
}

/// Cached view of the parts repository.
///
/// Content younger than the TTL is served from memory or disk. A failed
/// refresh falls back to the stale disk copy, then to the stale in-memory
/// copy; it only fails when neither exists.
pub struct PartsCatalogue {
    url: String,
    client: HttpClient,
    cache: CatalogueCache,
    ttl: Duration,
    loaded: RwLock<Option<Loaded>>,
}

impl PartsCatalogue {
    pub fn new(url: impl Into<String>, client: HttpClient, cache_dir: &Path, ttl: Duration) -> Self {
        let url = url.into();
        Self {
            cache: CatalogueCache::new(cache_dir, &url),
            url,
            client,
            ttl,
            loaded: RwLock::new(None),
        }
    }

    /// Catalogue for the configured parts repository, if one is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(base_url) = config.parts_repository_url.as_deref() else {
            return Ok(None);
        };

        let client = HttpClient::with_config(HttpClientConfig::new().with_timeout(config.http_timeout()))
            .map_err(|e| RetailerError::Http(e.into()))?;
        let cache_dir = config.get_cache_dir(&ConfigLoader::new(false));

        Ok(Some(Self::new(
            packages_json_url(base_url),
            client,
            &cache_dir,
            config.catalogue_ttl(),
        )))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Available parts, refreshing when the cached copy is older than the TTL.
    pub async fn parts(&self) -> Result<PartMap> {
        if let Some(loaded) = self.loaded.read().await.as_ref() {
            if loaded.at.elapsed() < self.ttl {
                log::trace!("Using in-memory parts catalogue");
                return Ok(loaded.parts.clone());
            }
        }

        let cached = self.read_cache();
        if let Some((content, metadata)) = &cached {
            if metadata.is_fresh(self.ttl) {
                log::trace!("Using cached parts catalogue from {}", self.cache.root().display());
                let parts = parse_packages_json(content)?;
                self.remember(&parts).await;
                return Ok(parts);
            }
        }

        self.fetch(cached).await
    }

    /// Fetch regardless of cache age.
    pub async fn refresh(&self) -> Result<PartMap> {
        let cached = self.read_cache();
        self.fetch(cached).await
    }

    pub async fn contains(&self, package_name: &str) -> Result<bool> {
        Ok(self.parts().await?.contains_key(package_name))
    }

    fn read_cache(&self) -> Option<(Vec<u8>, CacheMetadata)> {
        self.cache.read(CATALOGUE_KEY).unwrap_or_else(|e| {
            log::warn!("Failed to read parts catalogue cache: {}", e);
            None
        })
    }

    async fn fetch(&self, cached: Option<(Vec<u8>, CacheMetadata)>) -> Result<PartMap> {
        let last_modified = cached
            .as_ref()
            .and_then(|(_, metadata)| metadata.last_modified.as_deref());

        log::debug!("Fetching parts catalogue from {}", self.url);
        let fetched = self.client.get_if_modified(&self.url, last_modified).await;

        let parts = match (fetched, cached) {
            (Ok(Some(fetched)), cached) => match parse_packages_json(&fetched.body) {
                Ok(parts) => {
                    let metadata = CacheMetadata::fetched_now(fetched.last_modified);
                    if let Err(e) = self.cache.write(CATALOGUE_KEY, &fetched.body, &metadata) {
                        log::warn!("Failed to write parts catalogue cache: {}", e);
                    }
                    parts
                }
                Err(e) => match cached {
                    Some((content, _)) => {
                        log::warn!("Invalid parts catalogue from {}, using stale cache: {}", self.url, e);
                        parse_packages_json(&content)?
                    }
                    None => return self.stale_in_memory(e).await,
                },
            },
            (Ok(None), Some((content, metadata))) => {
                log::debug!("Parts catalogue not modified");
                let metadata = CacheMetadata::fetched_now(metadata.last_modified);
                if let Err(e) = self.cache.write_metadata(CATALOGUE_KEY, &metadata) {
                    log::warn!("Failed to update parts catalogue cache: {}", e);
                }
                parse_packages_json(&content)?
            }
            (Ok(None), None) => {
                let err = RetailerError::Config(format!(
                    "{} answered 304 Not Modified without a cached copy",
                    self.url
                ));
                return self.stale_in_memory(err).await;
            }
            (Err(e), Some((content, _))) => {
                log::warn!("Network error fetching parts catalogue, using stale cache: {}", e);
                parse_packages_json(&content)?
            }
            (Err(e), None) => return self.stale_in_memory(e.into()).await,
        };

        self.remember(&parts).await;
        Ok(parts)
    }

    /// Previously loaded parts regardless of age, or `err` if none were loaded.
    async fn stale_in_memory(&self, err: RetailerError) -> Result<PartMap> {
        match self.loaded.read().await.as_ref() {
            Some(loaded) => {
                log::warn!("Parts catalogue unavailable, using in-memory copy: {}", err);
                Ok(loaded.parts.clone())
            }
            None => Err(err),
        }
    }

    async fn remember(&self, parts: &PartMap) {
        *self.loaded.write().await = Some(Loaded {
            at: Instant::now(),
            parts: parts.clone(),
        });
    }
}

/// `packages.json` location for a repository base URL.
pub fn packages_json_url(base_url: &str) -> String {
    if base_url.ends_with(".json") {
        base_url.to_string()
    } else {
        format!("{}/packages.json", base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PACKAGES: &str = r#"{
        "packages": {
            "parts/seo": {
                "1.0.0": {"name": "parts/seo", "version": "1.0.0", "description": "SEO basics", "type": "wordpress-plugin"},
                "1.1.0": {"name": "parts/seo", "version": "1.1.0", "description": "SEO tools", "type": "wordpress-plugin"}
            },
            "parts/cart": [
                {"name": "parts/cart", "version": "2.0.0"}
            ]
        }
    }"#;

    const UNREACHABLE: &str = "http://127.0.0.1:9/packages.json";

    fn catalogue(cache_dir: &Path) -> PartsCatalogue {
        let client = HttpClient::with_config(
            HttpClientConfig::new()
                .with_max_retries(0)
                .with_connect_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        PartsCatalogue::new(UNREACHABLE, client, cache_dir, Duration::from_secs(900))
    }

    fn seed(cache_dir: &Path, metadata: CacheMetadata) {
        CatalogueCache::new(cache_dir, UNREACHABLE)
            .write(CATALOGUE_KEY, PACKAGES.as_bytes(), &metadata)
            .unwrap();
    }

    #[test]
    fn test_parse_packages_json() {
        let parts = parse_packages_json(PACKAGES.as_bytes()).unwrap();

        assert_eq!(parts.keys().collect::<Vec<_>>(), vec!["parts/cart", "parts/seo"]);
        assert_eq!(parts["parts/seo"].versions, vec!["1.0.0", "1.1.0"]);
        assert_eq!(parts["parts/seo"].description.as_deref(), Some("SEO tools"));
        assert_eq!(parts["parts/cart"].versions, vec!["2.0.0"]);
        assert!(parse_packages_json(b"{}").is_err());
    }

    #[test]
    fn test_packages_json_url() {
        assert_eq!(packages_json_url("https://parts.test/"), "https://parts.test/packages.json");
        assert_eq!(
            packages_json_url("https://parts.test/packages.json"),
            "https://parts.test/packages.json"
        );
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_network() {
        let temp_dir = TempDir::new().unwrap();
        seed(temp_dir.path(), CacheMetadata::fetched_now(None));

        let catalogue = catalogue(temp_dir.path());
        assert!(catalogue.contains("parts/seo").await.unwrap());
        assert!(!catalogue.contains("parts/unknown").await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_cache_kept_on_network_failure() {
        let temp_dir = TempDir::new().unwrap();
        seed(
            temp_dir.path(),
            CacheMetadata {
                fetched_at: Some(chrono::Utc::now() - chrono::Duration::hours(2)),
                last_modified: None,
            },
        );

        let catalogue = catalogue(temp_dir.path());
        let parts = catalogue.parts().await.unwrap();
        assert_eq!(parts.len(), 2);

        let parts = catalogue.refresh().await.unwrap();
        assert_eq!(parts.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_copy_kept_when_cache_and_network_fail() {
        let temp_dir = TempDir::new().unwrap();
        seed(temp_dir.path(), CacheMetadata::fetched_now(None));

        let catalogue = catalogue(temp_dir.path());
        assert_eq!(catalogue.parts().await.unwrap().len(), 2);

        CatalogueCache::new(temp_dir.path(), UNREACHABLE)
            .remove(CATALOGUE_KEY)
            .unwrap();

        let parts = catalogue.refresh().await.unwrap();
        assert_eq!(parts.keys().collect::<Vec<_>>(), vec!["parts/cart", "parts/seo"]);
    }

    #[tokio::test]
    async fn test_unreadable_cache_is_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let cache = CatalogueCache::new(temp_dir.path(), UNREACHABLE);
        std::fs::create_dir_all(cache.root().join(CATALOGUE_KEY)).unwrap();

        let catalogue = catalogue(temp_dir.path());
        let err = catalogue.parts().await.unwrap_err();
        assert!(matches!(err, RetailerError::Http(_)));
    }

    #[tokio::test]
    async fn test_no_cache_and_no_network() {
        let temp_dir = TempDir::new().unwrap();
        let catalogue = catalogue(temp_dir.path());

        let err = catalogue.parts().await.unwrap_err();
        assert!(matches!(err, RetailerError::Http(_)));
    }

    #[test]
    fn test_from_config_without_parts_repository() {
        assert!(PartsCatalogue::from_config(&Config::default()).unwrap().is_none());
    }
}
