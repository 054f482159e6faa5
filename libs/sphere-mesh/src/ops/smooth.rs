//! # Smoothing
//!
//! HC-Laplacian smoothing (Vollmer, Mencl and Müller). Each iteration moves
//! vertices to the average of their neighbors, then pushes them back toward
//! a blend of their original and previous positions to limit shrinkage.

use crate::mesh::Mesh;
use config::constants::{SMOOTHING_ALPHA, SMOOTHING_BETA, SMOOTHING_ITERATIONS};
use glam::DVec3;

/// Smooths a mesh in place with the default HC-Laplacian settings.
pub fn smooth(mesh: &mut Mesh) {
    smooth_hc(mesh, SMOOTHING_ITERATIONS, SMOOTHING_ALPHA, SMOOTHING_BETA);
}

/// Smooths a mesh in place with HC-Laplacian smoothing.
///
/// * `alpha` - weight of the original position in the correction target
/// * `beta` - weight of a vertex's own correction versus its neighbors'
///
/// Isolated vertices are left untouched. Topology never changes.
pub fn smooth_hc(mesh: &mut Mesh, iterations: usize, alpha: f64, beta: f64) {
    let neighbors = mesh.vertex_neighbors();
    let original: Vec<DVec3> = mesh.vertices().to_vec();
    let mut correction = vec![DVec3::ZERO; original.len()];

    for _ in 0..iterations {
        let previous: Vec<DVec3> = mesh.vertices().to_vec();
        let positions = mesh.vertices_mut();

        for (i, adjacent) in neighbors.iter().enumerate() {
            if adjacent.is_empty() {
                continue;
            }
            let average = mean(adjacent.iter().map(|&n| previous[n as usize]));
            positions[i] = average;
            correction[i] = average - (alpha * original[i] + (1.0 - alpha) * previous[i]);
        }

        for (i, adjacent) in neighbors.iter().enumerate() {
            if adjacent.is_empty() {
                continue;
            }
            let neighbor_correction = mean(adjacent.iter().map(|&n| correction[n as usize]));
            positions[i] -= beta * correction[i] + (1.0 - beta) * neighbor_correction;
        }
    }
}

fn mean(values: impl ExactSizeIterator<Item = DVec3>) -> DVec3 {
    let count = values.len().max(1) as f64;
    values.sum::<DVec3>() / count
}
