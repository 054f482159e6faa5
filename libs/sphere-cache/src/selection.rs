//! # Level Selection
//!
//! Picks the approximation to return for a requested level. Both policies
//! walk down from the requested level toward level 0 and return the first
//! non-empty approximation; when every candidate is empty the exact level is
//! returned as-is (empty). Quality never enters into it.
//!
//! The uncached policy works on the fresh engine output, clamping the request
//! to the last level produced. The cached policy walks the levels stored for
//! one `(shape_id, branch_factor)` and skips any missing level.

use crate::approximation::Approximation;
use std::collections::BTreeMap;

/// Selects a level from freshly computed output.
///
/// Returns `None` only when `levels` is empty.
///
/// # Example
///
/// ```rust
/// use sphere_cache::selection::select_level;
/// use sphere_cache::{Approximation, Sphere};
/// use glam::DVec3;
///
/// let coarse = Approximation::single(Sphere::new(DVec3::ZERO, 1.0));
/// let levels = vec![coarse.clone(), Approximation::empty()];
/// assert_eq!(select_level(&levels, 1), Some(&coarse));
/// ```
pub fn select_level(levels: &[Approximation], level: u32) -> Option<&Approximation> {
    let last = levels.len().checked_sub(1)?;
    let start = (level as usize).min(last);
    levels[..=start]
        .iter()
        .rev()
        .find(|approx| !approx.is_empty())
        .or(levels.get(start))
}

/// Selects a level from the cached levels of one `(shape_id, branch_factor)`.
///
/// Returns `None` when no non-empty level at or below `level` is cached and
/// `level` itself is absent.
pub fn select_cached_level(
    levels: &BTreeMap<u32, Approximation>,
    level: u32,
) -> Option<&Approximation> {
    levels
        .range(..=level)
        .rev()
        .map(|(_, approx)| approx)
        .find(|approx| !approx.is_empty())
        .or_else(|| levels.get(&level))
}
