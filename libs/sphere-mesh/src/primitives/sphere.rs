//! # Sphere Primitive
//!
//! Generates a closed sphere mesh using latitude/longitude tessellation.

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;
use glam::DVec3;
use std::f64::consts::PI;

/// Creates a sphere mesh centered at the origin.
///
/// Rings sit at polar angle `PI * (i + 0.5) / rings` with `rings =
/// (segments + 1) / 2`; there are no pole vertices, the first and last rings
/// are closed with triangle fans.
///
/// # Example
///
/// ```rust
/// use sphere_mesh::primitives::create_sphere;
///
/// let mesh = create_sphere(5.0, 16).unwrap();
/// assert!(mesh.is_watertight());
/// ```
pub fn create_sphere(radius: f64, segments: u32) -> MeshResult<Mesh> {
    if radius <= 0.0 {
        return Err(MeshError::degenerate(format!(
            "Sphere radius must be positive: {}",
            radius
        )));
    }

    if segments < 3 {
        return Err(MeshError::degenerate(format!(
            "Sphere segments must be at least 3: {}",
            segments
        )));
    }

    let num_rings = (segments + 1) / 2;
    let mut mesh = Mesh::with_capacity((num_rings * segments) as usize, 0);
    let mut rings: Vec<Vec<u32>> = Vec::with_capacity(num_rings as usize);

    for i in 0..num_rings {
        let phi = PI * (i as f64 + 0.5) / num_rings as f64;
        let ring_radius = radius * phi.sin();
        let z = radius * phi.cos();

        let ring = (0..segments)
            .map(|j| {
                let theta = 2.0 * PI * j as f64 / segments as f64;
                mesh.add_vertex(DVec3::new(
                    ring_radius * theta.cos(),
                    ring_radius * theta.sin(),
                    z,
                ))
            })
            .collect();
        rings.push(ring);
    }

    let first = &rings[0];
    for j in 1..segments as usize - 1 {
        mesh.add_triangle(first[0], first[j], first[j + 1]);
    }

    for pair in rings.windows(2) {
        let (ring_a, ring_b) = (&pair[0], &pair[1]);
        for j in 0..segments as usize {
            let j_next = (j + 1) % segments as usize;
            mesh.add_triangle(ring_a[j], ring_b[j], ring_b[j_next]);
            mesh.add_triangle(ring_a[j], ring_b[j_next], ring_a[j_next]);
        }
    }

    let last = &rings[rings.len() - 1];
    for j in 1..segments as usize - 1 {
        mesh.add_triangle(last[0], last[j + 1], last[j]);
    }

    Ok(mesh)
}
