//! # Level Cache
//!
//! Best-of cache of approximations keyed by `(shape_id, branch_factor, level)`.
//!
//! ## Features
//!
//! - **Best-of replacement**: an entry is only replaced by a strictly better
//!   approximation, so the stored value never gets worse
//! - **Idempotent puts**: putting the same value twice changes nothing
//! - **Atomic persistence**: [`LevelCache::flush`] replaces the cache file in
//!   one rename
//! - **Strict reload**: [`LevelCache::restore`] rejects a damaged file instead
//!   of silently starting over
//!
//! ## Example
//!
//! ```rust
//! use sphere_cache::{Approximation, LevelCache, Sphere};
//! use glam::DVec3;
//!
//! let cache = LevelCache::open("spheres.json");
//! let coarse = Approximation::new(vec![Sphere::new(DVec3::ZERO, 2.0)], 0.5, 0.5, 0.5);
//! let tight = Approximation::new(vec![Sphere::new(DVec3::ZERO, 1.0)], 0.1, 0.1, 0.1);
//!
//! assert!(cache.put("arm", 8, 0, coarse.clone()));
//! assert!(cache.put("arm", 8, 0, tight.clone()));
//! assert!(!cache.put("arm", 8, 0, coarse));
//! assert_eq!(cache.get("arm", 8, 0).unwrap(), tight);
//! ```

mod store;

#[cfg(test)]
mod tests;

pub use store::CacheTable;

use crate::approximation::Approximation;
use crate::error::{SpherizeError, SpherizeResult};
use crate::lock;
use crate::selection::select_cached_level;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Thread-safe best-of cache bound to a file.
#[derive(Debug)]
pub struct LevelCache {
    path: PathBuf,
    table: Mutex<CacheTable>,
}

impl LevelCache {
    /// Creates an empty cache that will be written to `path`.
    ///
    /// An existing file at `path` is not read; it is overwritten on flush.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: Mutex::new(CacheTable::new()),
        }
    }

    /// Loads the cache previously flushed to `path`.
    ///
    /// A missing file gives an empty cache.
    ///
    /// # Errors
    ///
    /// [`SpherizeError::CorruptCache`] if the file is truncated, malformed or
    /// holds invalid values; [`SpherizeError::Io`] if it cannot be read.
    pub fn restore(path: impl Into<PathBuf>) -> SpherizeResult<Self> {
        let path = path.into();
        let table = store::read(&path)?.unwrap_or_default();
        info!(path = %path.display(), shapes = table.len(), "restored sphere cache");
        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    /// Builds a cache from its JSON form.
    pub fn from_json(path: impl Into<PathBuf>, json: &str) -> SpherizeResult<Self> {
        let path = path.into();
        let table = store::decode(json.as_bytes(), &path)?;
        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    /// Renders the cache in its on-disk JSON form.
    pub fn to_json(&self) -> SpherizeResult<String> {
        let bytes = store::encode(&self.snapshot())
            .map_err(|err| SpherizeError::corrupt(&self.path, err.to_string()))?;
        String::from_utf8(bytes).map_err(|err| SpherizeError::corrupt(&self.path, err.to_string()))
    }

    /// File the cache is flushed to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if an entry exists for the key.
    pub fn contains(&self, shape_id: &str, branch_factor: u32, level: u32) -> bool {
        lock(&self.table)
            .get(shape_id)
            .and_then(|branches| branches.get(&branch_factor))
            .is_some_and(|levels| levels.contains_key(&level))
    }

    /// Returns a copy of the entry for the key.
    ///
    /// # Errors
    ///
    /// [`SpherizeError::NotFound`] if there is no entry.
    pub fn get(&self, shape_id: &str, branch_factor: u32, level: u32) -> SpherizeResult<Approximation> {
        lock(&self.table)
            .get(shape_id)
            .and_then(|branches| branches.get(&branch_factor))
            .and_then(|levels| levels.get(&level))
            .cloned()
            .ok_or_else(|| not_found(shape_id, branch_factor, level))
    }

    /// Returns a copy of every cached level for `(shape_id, branch_factor)`.
    pub fn levels(&self, shape_id: &str, branch_factor: u32) -> BTreeMap<u32, Approximation> {
        lock(&self.table)
            .get(shape_id)
            .and_then(|branches| branches.get(&branch_factor))
            .cloned()
            .unwrap_or_default()
    }

    /// Applies the cached level-selection policy.
    ///
    /// Walks down from `level` over the cached levels and returns the first
    /// non-empty one, falling back to the exact entry at `level`.
    ///
    /// # Errors
    ///
    /// [`SpherizeError::NotFound`] if neither exists.
    pub fn select(&self, shape_id: &str, branch_factor: u32, level: u32) -> SpherizeResult<Approximation> {
        let table = lock(&self.table);
        table
            .get(shape_id)
            .and_then(|branches| branches.get(&branch_factor))
            .and_then(|levels| select_cached_level(levels, level))
            .cloned()
            .ok_or_else(|| not_found(shape_id, branch_factor, level))
    }

    /// Inserts `approx` if the key is empty or `approx` is strictly better
    /// than the stored value.
    ///
    /// Values the cache file cannot hold (non-finite or negative metrics,
    /// non-finite spheres) are refused so a flushed file always restores.
    ///
    /// Returns true if the stored value changed.
    pub fn put(&self, shape_id: &str, branch_factor: u32, level: u32, approx: Approximation) -> bool {
        if let Some(problem) = store::invalid_value(&approx) {
            warn!(shape_id, branch_factor, level, problem, "approximation not cached");
            return false;
        }

        let mut table = lock(&self.table);
        let levels = table
            .entry(shape_id.to_string())
            .or_default()
            .entry(branch_factor)
            .or_default();

        let improves = levels
            .get(&level)
            .map_or(true, |current| approx.is_better_than(current));
        if improves {
            debug!(shape_id, branch_factor, level, mean_error = approx.mean_error, "cache updated");
            levels.insert(level, approx);
        }
        improves
    }

    /// Number of cached entries across all keys.
    pub fn len(&self) -> usize {
        lock(&self.table)
            .values()
            .flat_map(|branches| branches.values())
            .map(|levels| levels.len())
            .sum()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deep copy of the whole table.
    pub fn snapshot(&self) -> CacheTable {
        lock(&self.table).clone()
    }

    /// Writes the whole cache to its file, replacing it atomically.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn flush(&self) -> SpherizeResult<()> {
        let table = self.snapshot();
        let bytes = store::encode(&table)
            .map_err(|err| SpherizeError::corrupt(&self.path, err.to_string()))?;
        store::write_atomic(&self.path, &bytes)?;
        info!(shapes = table.len(), bytes = bytes.len(), "flushed sphere cache");
        Ok(())
    }
}

fn not_found(shape_id: &str, branch_factor: u32, level: u32) -> SpherizeError {
    SpherizeError::NotFound {
        shape_id: shape_id.to_string(),
        branch_factor,
        level,
    }
}
