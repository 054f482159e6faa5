//! # Primitives
//!
//! Closed mesh generators for analytic shapes. Used to build test fixtures and
//! to tessellate primitive collision shapes before spherization.

pub mod cuboid;
pub mod sphere;

pub use cuboid::create_box;
pub use sphere::create_sphere;
