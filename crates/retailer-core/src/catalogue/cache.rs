//! File cache for catalogue documents, with fetch metadata stored alongside.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

fn sanitize_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new("[^a-z0-9._]").unwrap())
}

/// Metadata stored next to each cached document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When the content was last fetched (or confirmed unchanged)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
    /// HTTP Last-Modified header value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl CacheMetadata {
    pub fn fetched_now(last_modified: Option<String>) -> Self {
        Self {
            fetched_at: Some(Utc::now()),
            last_modified,
        }
    }

    /// Time since the last fetch; `None` when never fetched or clock skew.
    pub fn age(&self) -> Option<Duration> {
        let fetched_at = self.fetched_at?;
        (Utc::now() - fetched_at).to_std().ok()
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age().is_some_and(|age| age < ttl)
    }
}

/// Cache directory for one catalogue URL
///
/// Each entry is two files:
/// - `<key>` - the cached document
/// - `<key>.meta` - JSON [`CacheMetadata`]
pub struct CatalogueCache {
    root: PathBuf,
    read_only: bool,
}

impl CatalogueCache {
    pub fn new(cache_dir: &Path, url: &str) -> Self {
        Self {
            root: cache_dir.join("catalogue").join(Self::sanitize_url(url)),
            read_only: false,
        }
    }

    fn sanitize_url(url: &str) -> String {
        let url = url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .to_lowercase();
        sanitize_regex().replace_all(&url, "-").into_owned()
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn get_path(&self, key: &str) -> PathBuf {
        let key = sanitize_regex().replace_all(&key.to_lowercase(), "-").into_owned();
        self.root.join(key)
    }

    fn meta_key(key: &str) -> String {
        format!("{}.meta", key)
    }

    /// Read cached content with metadata
    pub fn read(&self, key: &str) -> io::Result<Option<(Vec<u8>, CacheMetadata)>> {
        let content = match fs::read(self.get_path(key)) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(Some((content, self.read_metadata(key)?.unwrap_or_default())))
    }

    pub fn read_metadata(&self, key: &str) -> io::Result<Option<CacheMetadata>> {
        match fs::read(self.get_path(&Self::meta_key(key))) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes).unwrap_or_default())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write content with metadata
    pub fn write(&self, key: &str, content: &[u8], metadata: &CacheMetadata) -> io::Result<()> {
        if self.read_only {
            return Ok(());
        }

        fs::create_dir_all(&self.root)?;
        fs::write(self.get_path(key), content)?;
        self.write_metadata(key, metadata)
    }

    pub fn write_metadata(&self, key: &str, metadata: &CacheMetadata) -> io::Result<()> {
        if self.read_only {
            return Ok(());
        }

        let bytes = serde_json::to_vec(metadata)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::create_dir_all(&self.root)?;
        fs::write(self.get_path(&Self::meta_key(key)), bytes)
    }

    pub fn remove(&self, key: &str) -> io::Result<()> {
        for path in [self.get_path(key), self.get_path(&Self::meta_key(key))] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
