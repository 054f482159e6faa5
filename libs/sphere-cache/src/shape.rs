//! Shapes accepted by the orchestrator.

use glam::DVec3;
use sphere_mesh::Mesh;

/// A shape to spherize.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A triangle mesh; goes through the engine and its fallbacks.
    Mesh(Mesh),
    /// An analytic sphere; approximated exactly by itself at every level.
    Sphere {
        /// Center in shape coordinates
        center: DVec3,
        /// Radius
        radius: f64,
    },
}

impl Shape {
    /// Creates an analytic sphere.
    pub fn sphere(center: DVec3, radius: f64) -> Self {
        Self::Sphere { center, radius }
    }
}

impl From<Mesh> for Shape {
    fn from(mesh: Mesh) -> Self {
        Self::Mesh(mesh)
    }
}
