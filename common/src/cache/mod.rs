use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::AppError;

/// One persisted answer, keyed by the hash of its search query.
///
/// Entries are immutable once written; invalidation is external deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAnswer {
    pub search_query: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// Content-addressed, append-only answer store: one JSON file per key
/// under a flat cache root. Best-effort by contract — a read or write
/// failure degrades to a miss or a no-op, never an error for the caller.
#[derive(Clone, Debug)]
pub struct AnswerCache {
    root: PathBuf,
}

impl AnswerCache {
    /// Open the cache at `root`, creating the directory if needed.
    /// Failure here is a configuration problem and is not swallowed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Full SHA-256 hex of the search query. No truncation: the key space
    /// is unbounded across runs and a short fragment invites collisions.
    pub fn cache_key(search_query: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(search_query.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, search_query: &str) -> PathBuf {
        self.root
            .join(format!("{}.json", Self::cache_key(search_query)))
    }

    /// Look up a previously computed answer. A corrupt or unreadable
    /// entry logs and behaves as a miss.
    pub async fn get(&self, search_query: &str) -> Option<String> {
        let path = self.entry_path(search_query);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read cache entry; treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<CachedAnswer>(&raw) {
            Ok(entry) => {
                debug!(search_query, "cache hit");
                Some(entry.answer)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed cache entry; treating as miss");
                None
            }
        }
    }

    /// Persist an answer. Caching is an optimization: failures are logged
    /// and swallowed so they can never fail a row.
    pub async fn put(&self, search_query: &str, answer: &str) {
        let entry = CachedAnswer {
            search_query: search_query.to_string(),
            answer: answer.to_string(),
            created_at: Utc::now(),
        };

        let serialized = match serde_json::to_string(&entry) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!(search_query, error = %e, "failed to serialize cache entry");
                return;
            }
        };

        let path = self.entry_path(search_query);
        if let Err(e) = tokio::fs::write(&path, serialized).await {
            warn!(path = %path.display(), error = %e, "failed to write cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_an_answer() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnswerCache::new(dir.path()).unwrap();

        assert!(cache.get("acme corp industry").await.is_none());
        cache.put("acme corp industry", "Heavy machinery").await;
        assert_eq!(
            cache.get("acme corp industry").await.as_deref(),
            Some("Heavy machinery")
        );
    }

    #[tokio::test]
    async fn distinct_queries_map_to_distinct_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnswerCache::new(dir.path()).unwrap();

        cache.put("alpha", "one").await;
        cache.put("beta", "two").await;

        assert_eq!(cache.get("alpha").await.as_deref(), Some("one"));
        assert_eq!(cache.get("beta").await.as_deref(), Some("two"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn malformed_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnswerCache::new(dir.path()).unwrap();

        let path = dir
            .path()
            .join(format!("{}.json", AnswerCache::cache_key("broken")));
        std::fs::write(&path, "{ not valid json").unwrap();

        assert!(cache.get("broken").await.is_none());
    }

    #[test]
    fn cache_key_is_stable_and_full_length() {
        let a = AnswerCache::cache_key("acme corp industry");
        let b = AnswerCache::cache_key("acme corp industry");
        assert_eq!(a, b);
        // Full SHA-256 hex digest, not a truncated fragment.
        assert_eq!(a.len(), 64);
        assert_ne!(a, AnswerCache::cache_key("beta llc industry"));
    }
}
