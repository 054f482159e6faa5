//! # Convex Hull
//!
//! QuickHull for 3D convex hulls, used by the convex decomposition pass.

mod quickhull;

pub use quickhull::convex_hull;
