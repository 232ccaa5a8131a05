//! Durable storage of the current card index.
//!
//! The index is kept as a string under a fixed key in a small key/value
//! store. Reading never fails: anything unusable restores to the first card.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Key the current index is stored under
pub const POSITION_KEY: &str = "cardIndex";

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

pub trait PositionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPositionStore {
    values: HashMap<String, String>,
}

impl MemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PositionStore for MemoryPositionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Key/value store persisted as a JSON object
#[derive(Debug)]
pub struct FilePositionStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePositionStore {
    /// Open the store in `data_dir`. A missing or corrupt file starts empty.
    pub fn open(data_dir: PathBuf) -> Self {
        let path = data_dir.join(STORAGE_FILE);
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt storage file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, values }
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl PositionStore for FilePositionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

/// Parse a leading decimal integer, ignoring leading whitespace and any
/// trailing garbage ("12px" is 12, "px12" is nothing).
fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Saved index if it is usable for a deck of `max` cards, else 0
pub fn restore_position(store: &impl PositionStore, max: usize) -> usize {
    let Some(raw) = store.get(POSITION_KEY) else {
        return 0;
    };
    match parse_leading_int(&raw) {
        Some(index) if index >= 0 && (index as u64) < max as u64 => index as usize,
        _ => {
            debug!(saved = %raw, max = max, "Saved position unusable, starting at 0");
            0
        }
    }
}

/// Persist the index. Failures are logged; navigation carries on.
pub fn save_position(store: &mut impl PositionStore, index: usize) {
    if let Err(e) = store.set(POSITION_KEY, &index.to_string()) {
        warn!(index = index, error = %e, "Failed to save position");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(raw: &str) -> MemoryPositionStore {
        let mut store = MemoryPositionStore::new();
        store.set(POSITION_KEY, raw).unwrap();
        store
    }

    #[test]
    fn test_round_trip() {
        let mut store = MemoryPositionStore::new();
        save_position(&mut store, 4);
        assert_eq!(store.get(POSITION_KEY).as_deref(), Some("4"));
        assert_eq!(restore_position(&store, 5), 4);
        assert_eq!(restore_position(&store, 10), 4);
    }

    #[test]
    fn test_out_of_range_restores_zero() {
        let mut store = MemoryPositionStore::new();
        save_position(&mut store, 4);
        assert_eq!(restore_position(&store, 4), 0);
        assert_eq!(restore_position(&store, 0), 0);
        assert_eq!(restore_position(&store_with("-1"), 5), 0);
    }

    #[test]
    fn test_absent_or_corrupt_restores_zero() {
        assert_eq!(restore_position(&MemoryPositionStore::new(), 5), 0);
        assert_eq!(restore_position(&store_with("abc"), 5), 0);
        assert_eq!(restore_position(&store_with(""), 5), 0);
        assert_eq!(restore_position(&store_with("99999999999999999999999"), 5), 0);
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("3"), Some(3));
        assert_eq!(parse_leading_int(" 3"), Some(3));
        assert_eq!(parse_leading_int("3px"), Some(3));
        assert_eq!(parse_leading_int("-2"), Some(-2));
        assert_eq!(parse_leading_int("px3"), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("flashdeck-position-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let mut store = FilePositionStore::open(dir.clone());
        assert_eq!(store.get(POSITION_KEY), None);
        save_position(&mut store, 7);

        let reopened = FilePositionStore::open(dir.clone());
        assert_eq!(restore_position(&reopened, 8), 7);

        std::fs::write(dir.join(STORAGE_FILE), "garbage").unwrap();
        let corrupt = FilePositionStore::open(dir.clone());
        assert_eq!(restore_position(&corrupt, 8), 0);

        let _ = std::fs::remove_dir_all(dir);
    }
}
