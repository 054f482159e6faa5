//! # Sphere Mesh
//!
//! Triangle mesh representation and the preprocessing passes a shape goes
//! through before it is approximated by spheres.
//!
//! ## Architecture
//!
//! ```text
//! Mesh → repair_and_simplify → smooth ─┐
//!    └─→ convex_decomposition → concat ─┴→ sphere-tree engine
//! ```
//!
//! ## Algorithms
//!
//! - **Repair**: vertex welding and degenerate triangle removal
//! - **Simplification**: uniform-grid vertex clustering
//! - **Decomposition**: per-component QuickHull
//! - **Smoothing**: HC-Laplacian
//!
//! ## Usage
//!
//! ```rust
//! use sphere_mesh::{ops, primitives::create_sphere};
//!
//! let mesh = create_sphere(1.0, 32).unwrap();
//! let mut repaired = ops::repair_and_simplify(&mesh, 1000, 0.2).unwrap();
//! ops::smooth(&mut repaired);
//! assert!(repaired.triangle_count() > 0);
//! ```

pub mod error;
pub mod mesh;
pub mod ops;
pub mod primitives;

pub use error::{MeshError, MeshResult};
pub use mesh::Mesh;
