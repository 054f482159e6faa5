//! # Approximations
//!
//! The result of one spherization at one detail level: a set of spheres and
//! three error metrics describing how tightly they cover the shape.
//!
//! ## Quality Order
//!
//! An approximation is better than another when its `mean_error` is lower, or
//! the mean errors tie and its `worst_error` is lower. The order only drives
//! cache replacement; level selection never looks at it.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A sphere primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    /// Center x coordinate
    pub x: f64,
    /// Center y coordinate
    pub y: f64,
    /// Center z coordinate
    pub z: f64,
    /// Radius
    pub radius: f64,
}

impl Sphere {
    /// Creates a sphere from its center and radius.
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self {
            x: center.x,
            y: center.y,
            z: center.z,
            radius,
        }
    }

    /// Returns the center as a vector.
    #[inline]
    pub fn center(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

/// Spheres covering a shape at one detail level, with error metrics.
///
/// Errors are non-negative and lower is better. An empty primitive list is a
/// valid value: the engine found nothing to cover at that level.
///
/// ## Example
///
/// ```rust
/// use sphere_cache::{Approximation, Sphere};
/// use glam::DVec3;
///
/// let tight = Approximation::new(vec![Sphere::new(DVec3::ZERO, 1.0)], 0.1, 0.0, 0.3);
/// let loose = Approximation::new(vec![Sphere::new(DVec3::ZERO, 2.0)], 0.5, 0.2, 0.9);
/// assert!(tight.is_better_than(&loose));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approximation {
    /// Spheres, in no particular order
    pub primitives: Vec<Sphere>,
    /// Mean per-sphere error
    pub mean_error: f64,
    /// Smallest per-sphere error
    pub best_error: f64,
    /// Largest per-sphere error
    pub worst_error: f64,
}

impl Approximation {
    /// Creates an approximation.
    pub fn new(primitives: Vec<Sphere>, mean_error: f64, best_error: f64, worst_error: f64) -> Self {
        Self {
            primitives,
            mean_error,
            best_error,
            worst_error,
        }
    }

    /// An exact, single-sphere approximation with zero error.
    pub fn single(sphere: Sphere) -> Self {
        Self::new(vec![sphere], 0.0, 0.0, 0.0)
    }

    /// An approximation with no spheres.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0.0, 0.0, 0.0)
    }

    /// Returns true if there are no spheres.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Returns the number of spheres.
    #[inline]
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Translates every sphere center by `delta`. Radii and errors are
    /// unchanged.
    pub fn offset(&mut self, delta: DVec3) {
        for sphere in &mut self.primitives {
            sphere.x += delta.x;
            sphere.y += delta.y;
            sphere.z += delta.z;
        }
    }

    /// Compares by `(mean_error, worst_error)`; `Less` means better.
    pub fn quality_cmp(&self, other: &Self) -> Ordering {
        self.mean_error
            .total_cmp(&other.mean_error)
            .then_with(|| self.worst_error.total_cmp(&other.worst_error))
    }

    /// Returns true if `self` is strictly better than `other`.
    #[inline]
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.quality_cmp(other) == Ordering::Less
    }
}
