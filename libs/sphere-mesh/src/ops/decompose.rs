//! # Convex Decomposition
//!
//! Approximate convex decomposition: every edge-connected component of the
//! mesh is replaced by its convex hull.

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;
use crate::ops::hull::convex_hull;
use tracing::debug;

/// Decomposes a mesh into convex pieces, one per connected component.
///
/// Components too flat to have a hull (fewer than four non-coplanar points)
/// are skipped.
///
/// # Errors
///
/// Fails if the mesh has no triangles or no component yields a hull.
///
/// # Example
///
/// ```rust
/// use sphere_mesh::ops::convex_decomposition;
/// use sphere_mesh::primitives::create_box;
/// use sphere_mesh::Mesh;
/// use glam::DVec3;
///
/// let a = create_box(DVec3::ONE, false).unwrap();
/// let mut b = a.clone();
/// b.translate(DVec3::new(3.0, 0.0, 0.0));
///
/// let pieces = convex_decomposition(&Mesh::concatenate([&a, &b])).unwrap();
/// assert_eq!(pieces.len(), 2);
/// ```
pub fn convex_decomposition(mesh: &Mesh) -> MeshResult<Vec<Mesh>> {
    if mesh.triangle_count() == 0 {
        return Err(MeshError::empty("cannot decompose a mesh without triangles"));
    }

    let components = mesh.connected_components();
    let total = components.len();
    let pieces: Vec<Mesh> = components
        .iter()
        .filter_map(|component| match convex_hull(component.vertices()) {
            Ok(piece) => Some(piece),
            Err(err) => {
                debug!(%err, "skipping component without a convex hull");
                None
            }
        })
        .collect();

    debug!(components = total, pieces = pieces.len(), "convex decomposition");

    if pieces.is_empty() {
        return Err(MeshError::degenerate("no component has a convex hull"));
    }
    Ok(pieces)
}
