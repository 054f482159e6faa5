//! # Bounding Tree Engine
//!
//! A simple sphere-tree builder over mesh vertices.
//!
//! ## Algorithm Steps
//!
//! 1. Level 0 is one cell holding every vertex
//! 2. Each following level splits every cell into up to `branch_factor`
//!    cells: the largest splittable cell is cut at the median of its longest
//!    axis until the cell count is reached
//! 3. Every cell is covered by one sphere centered on its bounding box, with
//!    the distance to the farthest point as radius
//!
//! A cell with fewer than `2 * min_samples` points is never cut, so every cell
//! keeps at least `min_samples` points.
//!
//! ## Error Metric
//!
//! A sphere's error is its radius minus the mean distance of its points to the
//! center: zero when every point lies on the sphere, growing with the empty
//! volume it covers. The approximation reports the mean, minimum and maximum
//! over its spheres.

use crate::approximation::{Approximation, Sphere};
use crate::engine::ComputationEngine;
use crate::error::EngineError;
use crate::params::{EngineParams, Method};
use glam::DVec3;
use rayon::prelude::*;
use sphere_mesh::{Mesh, MeshError};
use tracing::debug;

/// Reference [`ComputationEngine`] building bounding-sphere hierarchies.
///
/// Every method is served by the same median-split hierarchy. `Method::Medial`
/// additionally insists on a closed mesh, so open meshes go through the
/// repair fallback first.
///
/// ## Example
///
/// ```rust
/// use sphere_cache::engine::{BoundingTreeEngine, ComputationEngine};
/// use sphere_cache::EngineParams;
/// use sphere_mesh::primitives::create_sphere;
///
/// let mesh = create_sphere(1.0, 16).unwrap();
/// let params = EngineParams { depth: 2, ..EngineParams::default() };
/// let levels = BoundingTreeEngine.compute(&mesh, &params).unwrap();
/// assert_eq!(levels.len(), 3);
/// assert_eq!(levels[0].len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundingTreeEngine;

impl ComputationEngine for BoundingTreeEngine {
    fn is_suitable(&self, method: Method, mesh: &Mesh) -> bool {
        if mesh.triangle_count() == 0 {
            return false;
        }
        match method {
            Method::Medial => mesh.is_watertight(),
            Method::Grid | Method::Spawn | Method::Hubbard | Method::Octree => true,
        }
    }

    fn compute(&self, mesh: &Mesh, params: &EngineParams) -> Result<Vec<Approximation>, EngineError> {
        if mesh.vertex_count() == 0 {
            return Err(MeshError::empty("no vertices to cover").into());
        }
        if params.branch_factor == 0 {
            return Err(EngineError::Failed("branch factor must be positive".to_string()));
        }
        let branch = params.branch_factor as usize;
        let min_samples = params.min_samples.max(1) as usize;

        let mut cells: Vec<Vec<DVec3>> = vec![mesh.vertices().to_vec()];
        let mut levels = Vec::with_capacity(params.depth as usize + 1);

        for level in 0..=params.depth {
            if level > 0 {
                cells = cells
                    .par_iter()
                    .flat_map_iter(|cell| split_cell(cell, branch, min_samples))
                    .collect();
            }

            let covered: Vec<(Sphere, f64)> = cells.par_iter().map(|cell| bounding_sphere(cell)).collect();
            let approx = summarize(covered);
            debug!(
                level,
                spheres = approx.len(),
                mean_error = approx.mean_error,
                "built bounding tree level"
            );
            levels.push(approx);
        }

        Ok(levels)
    }
}

/// Cuts a cell into at most `branch` cells of at least `min_samples` points.
fn split_cell(cell: &[DVec3], branch: usize, min_samples: usize) -> Vec<Vec<DVec3>> {
    let mut groups = vec![cell.to_vec()];

    while groups.len() < branch {
        let Some(largest) = groups
            .iter()
            .enumerate()
            .filter(|(_, g)| g.len() >= 2 * min_samples)
            .max_by_key(|(_, g)| g.len())
            .map(|(i, _)| i)
        else {
            break;
        };

        let mut group = groups.swap_remove(largest);
        let axis = longest_axis(&group);
        group.sort_by(|a, b| a[axis].total_cmp(&b[axis]));
        let upper = group.split_off(group.len() / 2);
        groups.push(group);
        groups.push(upper);
    }

    groups
}

fn longest_axis(points: &[DVec3]) -> usize {
    let (min, max) = bounds(points);
    let extent = max - min;
    if extent.x >= extent.y && extent.x >= extent.z {
        0
    } else if extent.y >= extent.z {
        1
    } else {
        2
    }
}

fn bounds(points: &[DVec3]) -> (DVec3, DVec3) {
    points.iter().fold(
        (DVec3::splat(f64::INFINITY), DVec3::splat(f64::NEG_INFINITY)),
        |(min, max), &p| (min.min(p), max.max(p)),
    )
}

/// Sphere covering every point of the cell, with its error.
fn bounding_sphere(points: &[DVec3]) -> (Sphere, f64) {
    let (min, max) = bounds(points);
    let center = (min + max) * 0.5;

    let (radius, total) = points.iter().fold((0.0_f64, 0.0), |(radius, total), p| {
        let d = p.distance(center);
        (radius.max(d), total + d)
    });
    let mean = total / points.len().max(1) as f64;

    (Sphere::new(center, radius), (radius - mean).max(0.0))
}

fn summarize(covered: Vec<(Sphere, f64)>) -> Approximation {
    if covered.is_empty() {
        return Approximation::empty();
    }

    let count = covered.len() as f64;
    let (sum, best, worst) = covered.iter().fold(
        (0.0, f64::INFINITY, 0.0_f64),
        |(sum, best, worst), (_, error)| (sum + error, best.min(*error), worst.max(*error)),
    );
    let primitives = covered.into_iter().map(|(sphere, _)| sphere).collect();

    Approximation::new(primitives, sum / count, best, worst)
}
