//! File-based result cache with TTL
//!
//! Each entry is one pretty-printed JSON document in the cache directory; a
//! `cache_index.json` maps the normalized key to the current entry file.
//!
//! # Features
//!
//! - Time-bounded entries (expired entries are misses, removed only by sweeps)
//! - Last write wins per key; superseded files are reclaimed by [`CacheManager::clear_expired`]
//! - Corrupt or missing files degrade to cache misses
//! - Atomic writes via temp file + rename
//!
//! Single-process, single-writer: there is no locking across processes.
//!
//! # Example
//!
//! ```no_run
//! use blogmate::cache::CacheManager;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), blogmate::error::CacheError> {
//! let mut cache = CacheManager::open(Path::new(".cache"), chrono::Duration::hours(24))?;
//! cache.save("롱패딩", &vec![1, 2, 3], serde_json::Map::new())?;
//! let restored: Option<Vec<i32>> = cache.load("롱패딩");
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::utils::error::CacheError;
use crate::utils::{normalize_keyword, normalize_whitespace, sanitize_filename};

/// Index file name inside the cache directory
pub const INDEX_FILE: &str = "cache_index.json";

/// Suffix of interrupted atomic writes
const TEMP_SUFFIX: &str = ".json.tmp";

/// `{stem}_{%Y%m%dT%H%M%S%3f}_{uuid8}.json`, as written by `entry_file_name`
fn is_entry_file_name(name: &str) -> bool {
    static ENTRY_NAME: OnceLock<Regex> = OnceLock::new();

    let re = ENTRY_NAME.get_or_init(|| {
        Regex::new(r"^.+_\d{8}T\d{9}_[0-9a-f]{8}\.json$").expect("Invalid regex pattern")
    });
    re.is_match(name)
}

// ============================================================================
// Persisted types
// ============================================================================

/// One cached document as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub seed_keyword: String,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub result: T,
}

/// Index record pointing at the current entry file for a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Entry file name inside the cache directory
    pub file: String,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IndexRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    /// Bytes used by entry files, orphans included
    pub total_size_bytes: u64,
    pub cache_dir: PathBuf,
}

/// Listing row for a cached key
#[derive(Debug, Clone, Serialize)]
pub struct CachedKeyword {
    pub keyword: String,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
}

// ============================================================================
// Cache Manager
// ============================================================================

/// Manages cache entry files and their index
pub struct CacheManager {
    /// Directory for entry files and the index
    cache_dir: PathBuf,

    /// Default entry lifetime
    ttl: Duration,

    index: BTreeMap<String, IndexRecord>,
}

impl CacheManager {
    /// Open (and create if needed) a cache directory
    ///
    /// An unreadable index is replaced by an empty one.
    pub fn open(cache_dir: &Path, ttl: Duration) -> Result<Self, CacheError> {
        fs::create_dir_all(cache_dir).map_err(|e| CacheError::io(cache_dir, e))?;

        let index = Self::read_index(&cache_dir.join(INDEX_FILE));
        tracing::debug!(dir = %cache_dir.display(), entries = index.len(), "Cache opened");

        Ok(Self {
            cache_dir: cache_dir.to_path_buf(),
            ttl,
            index,
        })
    }

    fn read_index(path: &Path) -> BTreeMap<String, IndexRecord> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cache index unreadable, starting empty");
                return BTreeMap::new();
            }
        };

        match serde_json::from_reader(BufReader::new(file)) {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cache index corrupt, starting empty");
                BTreeMap::new()
            }
        }
    }

    /// Get cache directory
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Default entry lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Serialize `value` to `path` through a temp file and rename
    fn write_atomic<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), CacheError> {
        let temp_path = path.with_extension("json.tmp");

        let file = File::create(&temp_path).map_err(|e| CacheError::io(&temp_path, e))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, value)?;

        fs::rename(&temp_path, path).map_err(|e| CacheError::io(path, e))?;
        Ok(())
    }

    fn persist_index(&self) -> Result<(), CacheError> {
        self.write_atomic(&self.cache_dir.join(INDEX_FILE), &self.index)
    }

    fn entry_file_name(key: &str, now: DateTime<Utc>) -> String {
        let stem = sanitize_filename(key);
        let unique = uuid::Uuid::new_v4().simple().to_string();
        format!("{stem}_{}_{}.json", now.format("%Y%m%dT%H%M%S%3f"), &unique[..8])
    }

    /// Store `payload` under `key` with the default TTL
    pub fn save<T: Serialize>(
        &mut self,
        key: &str,
        payload: &T,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<PathBuf, CacheError> {
        self.save_at(key, payload, metadata, self.ttl, Utc::now())
    }

    /// Store `payload` under `key`, expiring `ttl` after `now`
    ///
    /// Replaces any existing index record for the key; the previous file is
    /// left for the next sweep.
    pub fn save_at<T: Serialize>(
        &mut self,
        key: &str,
        payload: &T,
        metadata: serde_json::Map<String, serde_json::Value>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<PathBuf, CacheError> {
        let normalized = normalize_keyword(key);
        if normalized.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        let entry = CacheEntry {
            seed_keyword: normalize_whitespace(key),
            cached_at: now,
            expires_at: now + ttl,
            metadata,
            result: payload,
        };

        let file_name = Self::entry_file_name(&normalized, now);
        let path = self.cache_dir.join(&file_name);
        self.write_atomic(&path, &entry)?;

        self.index.insert(
            normalized.clone(),
            IndexRecord {
                file: file_name,
                cached_at: entry.cached_at,
                expires_at: entry.expires_at,
            },
        );
        self.persist_index()?;

        tracing::debug!(key = %normalized, path = %path.display(), "Cache entry saved");
        Ok(path)
    }

    /// Load the payload stored under `key`, if live
    pub fn load<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        self.load_at(key, Utc::now())
    }

    /// Load the payload stored under `key` as of `now`
    pub fn load_at<T: DeserializeOwned>(&mut self, key: &str, now: DateTime<Utc>) -> Option<T> {
        self.load_entry_at(key, now).map(|entry| entry.result)
    }

    /// Load the full entry stored under `key` as of `now`
    ///
    /// Expired entries are misses but stay on disk. A record whose file has
    /// vanished is dropped from the index.
    pub fn load_entry_at<T: DeserializeOwned>(
        &mut self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry<T>> {
        let normalized = normalize_keyword(key);
        let record = self.index.get(&normalized)?.clone();

        if record.is_expired_at(now) {
            tracing::debug!(key = %normalized, expires_at = %record.expires_at, "Cache entry expired");
            return None;
        }

        let path = self.cache_dir.join(&record.file);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(key = %normalized, path = %path.display(), error = %e, "Cache file missing, repairing index");
                self.index.remove(&normalized);
                if let Err(e) = self.persist_index() {
                    tracing::warn!(error = %e, "Failed to persist repaired cache index");
                }
                return None;
            }
        };

        match serde_json::from_reader(BufReader::new(file)) {
            Ok(entry) => {
                tracing::debug!(key = %normalized, "Cache hit");
                Some(entry)
            }
            Err(e) => {
                tracing::warn!(key = %normalized, path = %path.display(), error = %e, "Cache file corrupt, treating as miss");
                None
            }
        }
    }

    /// Live index record exists for `key`
    pub fn is_cached(&self, key: &str) -> bool {
        self.index
            .get(&normalize_keyword(key))
            .is_some_and(|r| !r.is_expired_at(Utc::now()) && self.cache_dir.join(&r.file).exists())
    }

    /// Remove expired entries
    pub fn clear_expired(&mut self) -> Result<usize, CacheError> {
        self.clear_expired_at(Utc::now())
    }

    /// Remove entries expired as of `now`; returns how many were removed
    ///
    /// Also deletes orphaned entry files and leftover temp files, and drops
    /// records whose file is gone. Those are logged but not counted. Files
    /// not named like cache entries are never touched.
    pub fn clear_expired_at(&mut self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let expired: Vec<String> = self
            .index
            .iter()
            .filter(|(_, record)| record.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            if let Some(record) = self.index.remove(key) {
                self.remove_file(&record.file)?;
            }
        }

        let dangling: Vec<String> = self
            .index
            .iter()
            .filter(|(_, record)| !self.cache_dir.join(&record.file).exists())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &dangling {
            self.index.remove(key);
        }

        let mut orphans = 0;
        for name in self.entry_files()? {
            if !self.index.values().any(|r| r.file == name) {
                self.remove_file(&name)?;
                orphans += 1;
            }
        }
        let temps = self.remove_temp_files()?;

        self.persist_index()?;

        tracing::info!(
            expired = expired.len(),
            orphans = orphans,
            temps = temps,
            dangling = dangling.len(),
            "Cleared expired cache entries"
        );
        Ok(expired.len())
    }

    /// Delete every entry file and reset the index; returns files deleted
    pub fn clear_all(&mut self) -> Result<usize, CacheError> {
        let files = self.entry_files()?;
        for name in &files {
            self.remove_file(name)?;
        }
        let temps = self.remove_temp_files()?;

        self.index.clear();
        self.persist_index()?;

        tracing::info!(deleted = files.len(), temps = temps, "Cleared cache");
        Ok(files.len())
    }

    /// Cache statistics
    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let now = Utc::now();
        let expired_entries = self.index.values().filter(|r| r.is_expired_at(now)).count();

        let mut total_size_bytes = 0;
        for name in self.entry_files()? {
            let path = self.cache_dir.join(&name);
            if let Ok(meta) = fs::metadata(&path) {
                total_size_bytes += meta.len();
            }
        }

        Ok(CacheStats {
            total_entries: self.index.len(),
            valid_entries: self.index.len() - expired_entries,
            expired_entries,
            total_size_bytes,
            cache_dir: self.cache_dir.clone(),
        })
    }

    /// Every indexed key with its timestamps
    pub fn list_cached_keywords(&self) -> Vec<CachedKeyword> {
        let now = Utc::now();
        self.index
            .iter()
            .map(|(keyword, record)| CachedKeyword {
                keyword: keyword.clone(),
                cached_at: record.cached_at,
                expires_at: record.expires_at,
                expired: record.is_expired_at(now),
            })
            .collect()
    }

    /// Entry file names in the cache directory
    fn entry_files(&self) -> Result<Vec<String>, CacheError> {
        self.files_matching(is_entry_file_name)
    }

    fn remove_temp_files(&self) -> Result<usize, CacheError> {
        let temps = self.files_matching(|name| name.ends_with(TEMP_SUFFIX))?;
        for name in &temps {
            self.remove_file(name)?;
        }
        Ok(temps.len())
    }

    fn files_matching(&self, keep: impl Fn(&str) -> bool) -> Result<Vec<String>, CacheError> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.cache_dir).map_err(|e| CacheError::io(&self.cache_dir, e))? {
            let entry = entry.map_err(|e| CacheError::io(&self.cache_dir, e))?;
            if let Some(name) = entry.file_name().to_str() {
                if keep(name) {
                    files.push(name.to_string());
                }
            }
        }

        files.sort();
        Ok(files)
    }

    fn remove_file(&self, name: &str) -> Result<(), CacheError> {
        let path = self.cache_dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(&path, e)),
        }
    }
}
