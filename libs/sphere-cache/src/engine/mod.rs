//! # Engine Interfaces
//!
//! The two collaborators a spherization job calls out to:
//!
//! - [`ComputationEngine`]: turns a mesh into approximations for levels
//!   `0..=depth`, coarsest first
//! - [`ShapeRepair`]: the repair, decomposition and smoothing passes the
//!   fallback chain uses when the engine rejects a mesh
//!
//! Both are shared across worker threads and must be reentrant.

pub mod bounding_tree;

pub use bounding_tree::BoundingTreeEngine;

use crate::approximation::Approximation;
use crate::error::EngineError;
use crate::params::{EngineParams, Method};
use sphere_mesh::{ops, Mesh, MeshResult};

/// Produces sphere approximations for a mesh.
pub trait ComputationEngine: Send + Sync {
    /// Returns true if `method` can run on `mesh` without preprocessing.
    fn is_suitable(&self, method: Method, mesh: &Mesh) -> bool;

    /// Computes approximations for levels `0..=params.depth`.
    ///
    /// # Errors
    ///
    /// Any [`EngineError`]; the caller decides whether to retry.
    fn compute(&self, mesh: &Mesh, params: &EngineParams) -> Result<Vec<Approximation>, EngineError>;
}

/// Mesh preprocessing used by the fallback chain.
pub trait ShapeRepair: Send + Sync {
    /// Repairs the mesh and reduces its resolution.
    fn repair_and_simplify(&self, mesh: &Mesh, leaves: u32, ratio: f64) -> MeshResult<Mesh>;

    /// Splits the mesh into convex pieces.
    fn decompose(&self, mesh: &Mesh) -> MeshResult<Vec<Mesh>>;

    /// Smooths the mesh in place.
    fn smooth(&self, mesh: &mut Mesh);
}

/// [`ShapeRepair`] backed by the `sphere-mesh` passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshRepair;

impl ShapeRepair for MeshRepair {
    fn repair_and_simplify(&self, mesh: &Mesh, leaves: u32, ratio: f64) -> MeshResult<Mesh> {
        ops::repair_and_simplify(mesh, leaves, ratio)
    }

    fn decompose(&self, mesh: &Mesh) -> MeshResult<Vec<Mesh>> {
        ops::convex_decomposition(mesh)
    }

    fn smooth(&self, mesh: &mut Mesh) {
        ops::smooth(mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use sphere_mesh::primitives::{create_box, create_sphere};

    #[test]
    fn test_mesh_repair_simplifies() {
        let sphere = create_sphere(1.0, 32).unwrap();
        let repaired = MeshRepair.repair_and_simplify(&sphere, 1000, 0.2).unwrap();
        assert!(repaired.vertex_count() < sphere.vertex_count());
    }

    #[test]
    fn test_mesh_repair_decomposes_components() {
        let mut both = create_box(DVec3::ONE, true).unwrap();
        let mut other = create_box(DVec3::ONE, true).unwrap();
        other.translate(DVec3::new(5.0, 0.0, 0.0));
        both.merge(&other);

        let pieces = MeshRepair.decompose(&both).unwrap();
        assert_eq!(pieces.len(), 2);
    }

    #[test]
    fn test_mesh_repair_is_object_safe() {
        let repair: Box<dyn ShapeRepair> = Box::new(MeshRepair);
        let mut cube = create_box(DVec3::ONE, true).unwrap();
        repair.smooth(&mut cube);
        assert_eq!(cube.triangle_count(), 12);
    }
}
