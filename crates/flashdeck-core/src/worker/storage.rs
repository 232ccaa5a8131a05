//! Named cache buckets of URL to response entries.
//!
//! Buckets are kept in creation order so lookups across all buckets find the
//! oldest match first. With a backing directory, every bucket is persisted as
//! one JSON file and reloaded on `open`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{Response, StorageError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        format_age(self.age_minutes())
    }
}

fn format_age(minutes: i64) -> String {
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// On-disk form of one bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheBucket {
    name: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    entries: BTreeMap<String, CachedData<Response>>,
}

impl CacheBucket {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            created_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }
}

/// Listing entry for one bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSummary {
    pub name: String,
    pub entries: usize,
    /// Age of the most recently stored entry, if any
    pub last_updated: Option<String>,
}

pub struct CacheStorage {
    dir: Option<PathBuf>,
    buckets: RwLock<Vec<CacheBucket>>,
}

impl CacheStorage {
    /// Storage that lives only as long as this value
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            buckets: RwLock::new(Vec::new()),
        }
    }

    /// Open (or create) storage persisted under `dir`
    pub fn open(dir: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&dir)?;

        let mut buckets = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_bucket(&path) {
                Ok(bucket) => buckets.push(bucket),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable cache bucket");
                }
            }
        }
        buckets.sort_by_key(|b: &CacheBucket| b.created_at);
        debug!(dir = %dir.display(), count = buckets.len(), "Cache storage opened");

        Ok(Self {
            dir: Some(dir),
            buckets: RwLock::new(buckets),
        })
    }

    fn read_bucket(path: &Path) -> Result<CacheBucket, StorageError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// File for a bucket. Bytes outside `[A-Za-z0-9._-]` are percent-encoded
    /// so distinct names never share a file.
    fn bucket_path(dir: &Path, name: &str) -> PathBuf {
        let mut file = String::with_capacity(name.len());
        for byte in name.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.') {
                file.push(char::from(byte));
            } else {
                file.push_str(&format!("%{:02X}", byte));
            }
        }
        dir.join(format!("{}.json", file))
    }

    fn persist(&self, bucket: &CacheBucket) -> Result<(), StorageError> {
        if let Some(ref dir) = self.dir {
            let contents = serde_json::to_string(bucket)?;
            std::fs::write(Self::bucket_path(dir, &bucket.name), contents)?;
        }
        Ok(())
    }

    /// Create the bucket if it does not exist yet
    pub async fn open_bucket(&self, name: &str) -> Result<(), StorageError> {
        let mut buckets = self.buckets.write().await;
        if buckets.iter().any(|b| b.name == name) {
            return Ok(());
        }
        let bucket = CacheBucket::new(name);
        self.persist(&bucket)?;
        buckets.push(bucket);
        debug!(cache = name, "Cache bucket created");
        Ok(())
    }

    pub async fn has(&self, name: &str) -> bool {
        self.buckets.read().await.iter().any(|b| b.name == name)
    }

    /// Bucket names in creation order
    pub async fn keys(&self) -> Vec<String> {
        self.buckets
            .read()
            .await
            .iter()
            .map(|b| b.name.clone())
            .collect()
    }

    /// Delete a bucket and all its entries. Returns false if it did not exist.
    pub async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let mut buckets = self.buckets.write().await;
        let Some(pos) = buckets.iter().position(|b| b.name == name) else {
            return Ok(false);
        };
        if let Some(ref dir) = self.dir {
            let path = Self::bucket_path(dir, name);
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        buckets.remove(pos);
        Ok(true)
    }

    /// Look up a key across all buckets, oldest bucket first
    pub async fn match_request(&self, key: &str) -> Option<Response> {
        self.buckets
            .read()
            .await
            .iter()
            .find_map(|b| b.entries.get(key))
            .map(|cached| cached.data.clone())
    }

    /// Look up a key in a single bucket
    pub async fn match_in(&self, name: &str, key: &str) -> Option<Response> {
        self.buckets
            .read()
            .await
            .iter()
            .find(|b| b.name == name)
            .and_then(|b| b.entries.get(key))
            .map(|cached| cached.data.clone())
    }

    /// Store a response, creating the bucket if needed. Memory is only
    /// updated once the bucket has been written, so a failed write leaves
    /// no trace.
    pub async fn put(&self, name: &str, key: &str, response: Response) -> Result<(), StorageError> {
        let mut buckets = self.buckets.write().await;
        let pos = buckets.iter().position(|b| b.name == name);
        let mut updated = match pos {
            Some(pos) => buckets[pos].clone(),
            None => CacheBucket::new(name),
        };
        updated
            .entries
            .insert(key.to_string(), CachedData::new(response));
        self.persist(&updated)?;

        match pos {
            Some(pos) => buckets[pos] = updated,
            None => buckets.push(updated),
        }
        debug!(cache = name, key = key, "Response cached");
        Ok(())
    }

    /// Keys stored in one bucket
    pub async fn entry_keys(&self, name: &str) -> Vec<String> {
        self.buckets
            .read()
            .await
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn summaries(&self) -> Vec<BucketSummary> {
        self.buckets
            .read()
            .await
            .iter()
            .map(|b| BucketSummary {
                name: b.name.clone(),
                entries: b.entries.len(),
                last_updated: b
                    .entries
                    .values()
                    .max_by_key(|e| e.cached_at)
                    .map(|e| e.age_display()),
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
