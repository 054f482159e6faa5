//! # Configuration Constants
//!
//! Centralized constants for the sphere cache pipeline. Worker pool sizing,
//! spherization defaults, mesh preprocessing parameters and cache file
//! settings are defined here.
//!
//! ## Categories
//!
//! - **Precision**: Floating-point comparison tolerances
//! - **Dispatcher**: Worker pool bounds
//! - **Spherization**: Branch factor, depth and engine tuning defaults
//! - **Preprocessing**: Repair, simplification and smoothing parameters
//! - **Cache**: On-disk cache file defaults

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Epsilon for floating-point comparisons.
///
/// # Example
///
/// ```rust
/// use config::constants::EPSILON;
///
/// fn approximately_equal(a: f64, b: f64) -> bool {
///     (a - b).abs() < EPSILON
/// }
///
/// assert!(approximately_equal(1.0, 1.0 + 1e-11));
/// ```
pub const EPSILON: f64 = 1e-10;

/// Epsilon for vertex deduplication.
///
/// Slightly larger tolerance used when welding nearly-identical vertices
/// during mesh repair and convex hull construction.
///
/// # Example
///
/// ```rust
/// use config::constants::VERTEX_MERGE_EPSILON;
///
/// fn vertices_should_merge(v1: [f64; 3], v2: [f64; 3]) -> bool {
///     let dx = v1[0] - v2[0];
///     let dy = v1[1] - v2[1];
///     let dz = v1[2] - v2[2];
///     (dx * dx + dy * dy + dz * dz).sqrt() < VERTEX_MERGE_EPSILON
/// }
/// ```
pub const VERTEX_MERGE_EPSILON: f64 = 1e-8;

// =============================================================================
// DISPATCHER CONSTANTS
// =============================================================================

/// Default number of worker threads used by the task dispatcher.
///
/// # Example
///
/// ```rust
/// use config::constants::{DEFAULT_WORKER_COUNT, MAX_WORKER_COUNT, MIN_WORKER_COUNT};
///
/// assert!((MIN_WORKER_COUNT..=MAX_WORKER_COUNT).contains(&DEFAULT_WORKER_COUNT));
/// ```
pub const DEFAULT_WORKER_COUNT: usize = 8;

/// Smallest accepted worker pool size.
pub const MIN_WORKER_COUNT: usize = 1;

/// Largest accepted worker pool size.
///
/// Each worker may hold a full copy of a mesh while it is being repaired, so
/// the pool is capped well below "one thread per task".
pub const MAX_WORKER_COUNT: usize = 256;

/// Smallest worker count chosen when the caller does not set one.
pub const MIN_DEFAULT_WORKER_COUNT: usize = 4;

/// Largest worker count chosen when the caller does not set one.
pub const MAX_DEFAULT_WORKER_COUNT: usize = 16;

// =============================================================================
// SPHERIZATION CONSTANTS
// =============================================================================

/// Default branch factor (target spheres per subdivision).
pub const DEFAULT_BRANCH_FACTOR: u32 = 8;

/// Default requested detail level.
///
/// Level 0 is the single coarsest approximation, so depth 1 yields two levels.
pub const DEFAULT_DEPTH: u32 = 1;

/// Maximum detail level accepted by parameter validation.
///
/// The reference engine produces up to `branch^depth` spheres per level, so
/// the depth is capped to keep the worst case bounded.
///
/// # Example
///
/// ```rust
/// use config::constants::{DEFAULT_DEPTH, MAX_DEPTH};
///
/// assert!(DEFAULT_DEPTH <= MAX_DEPTH);
/// ```
pub const MAX_DEPTH: u32 = 8;

/// Default number of tester levels used by the sphere-tree engine.
pub const DEFAULT_TESTER_LEVELS: u32 = 2;

/// Default number of cover points sampled over the surface.
pub const DEFAULT_NUM_COVER: u32 = 5000;

/// Default minimum number of cover points per sphere.
pub const DEFAULT_MIN_COVER: u32 = 5;

/// Default number of initial spheres seeded by the medial method.
pub const DEFAULT_INIT_SPHERES: u32 = 1000;

/// Default minimum number of spheres kept by the medial method.
pub const DEFAULT_MIN_SPHERES: u32 = 200;

/// Default error reduction factor between levels.
pub const DEFAULT_ERROR_FACTOR: u32 = 2;

/// Default maximum optimisation level.
pub const DEFAULT_MAX_OPT_LEVEL: u32 = 1;

/// Default balance excess allowed during optimisation.
pub const DEFAULT_BALANCE_EXCESS: f64 = 0.05;

/// Default number of samples per sphere used to evaluate error.
pub const DEFAULT_NUM_SAMPLES: u32 = 500;

/// Default minimum number of samples required before a cell is split.
///
/// # Example
///
/// ```rust
/// use config::constants::{DEFAULT_MIN_SAMPLES, DEFAULT_NUM_SAMPLES};
///
/// assert!(DEFAULT_MIN_SAMPLES <= DEFAULT_NUM_SAMPLES);
/// ```
pub const DEFAULT_MIN_SAMPLES: u32 = 1;

// =============================================================================
// PREPROCESSING CONSTANTS
// =============================================================================

/// Default leaf budget for the manifold repair pass.
///
/// Controls the resolution of the vertex clustering grid: the grid has roughly
/// this many cells.
pub const DEFAULT_MANIFOLD_LEAVES: u32 = 1000;

/// Default fraction of vertices kept by the simplification pass.
///
/// # Example
///
/// ```rust
/// use config::constants::DEFAULT_SIMPLIFICATION_RATIO;
///
/// assert!(DEFAULT_SIMPLIFICATION_RATIO > 0.0 && DEFAULT_SIMPLIFICATION_RATIO <= 1.0);
/// ```
pub const DEFAULT_SIMPLIFICATION_RATIO: f64 = 0.2;

/// Number of HC-Laplacian smoothing iterations.
pub const SMOOTHING_ITERATIONS: usize = 100;

/// Weight of the original position in HC-Laplacian smoothing.
pub const SMOOTHING_ALPHA: f64 = 0.1;

/// Weight of the per-vertex correction in HC-Laplacian smoothing.
pub const SMOOTHING_BETA: f64 = 0.5;

// =============================================================================
// CACHE CONSTANTS
// =============================================================================

/// Default file name of the persisted sphere cache.
pub const DEFAULT_CACHE_FILE: &str = "sphere_database.json";

/// Indentation used when writing the cache file.
pub const CACHE_JSON_INDENT: &[u8] = b"    ";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Returns the number of worker threads to use when no explicit count is set.
///
/// Uses the detected parallelism clamped into
/// `MIN_DEFAULT_WORKER_COUNT..=MAX_DEFAULT_WORKER_COUNT`, and falls back to
/// [`DEFAULT_WORKER_COUNT`] when detection fails.
///
/// # Example
///
/// ```rust
/// use config::constants::{default_worker_count, MAX_DEFAULT_WORKER_COUNT, MIN_DEFAULT_WORKER_COUNT};
///
/// let workers = default_worker_count();
/// assert!((MIN_DEFAULT_WORKER_COUNT..=MAX_DEFAULT_WORKER_COUNT).contains(&workers));
/// ```
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(DEFAULT_WORKER_COUNT)
        .clamp(MIN_DEFAULT_WORKER_COUNT, MAX_DEFAULT_WORKER_COUNT)
}
