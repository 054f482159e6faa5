//! # Mesh Operations
//!
//! Preprocessing passes applied to a shape before spherization: repair and
//! simplification, convex decomposition, and smoothing.

pub mod decompose;
pub mod hull;
pub mod repair;
pub mod smooth;

pub use decompose::convex_decomposition;
pub use hull::convex_hull;
pub use repair::{cluster_simplify, remove_degenerate, repair_and_simplify, weld_vertices};
pub use smooth::{smooth, smooth_hc};
