//! # Sphere Cache
//!
//! Parallel spherization of 3D shapes with a leveled, best-of result cache.
//!
//! A spherization approximates a shape by spheres at several detail levels,
//! level 0 being the coarsest. Requests are computed on a bounded worker pool,
//! one task per shape, and the results are kept per
//! `(shape_id, branch_factor, level)` in a cache that only ever improves and
//! is written to disk once at shutdown.
//!
//! ## Architecture
//!
//! ```text
//! request ─→ Orchestrator ─cached?─→ LevelCache ─→ select level ─→ caller
//!                 │                      ▲
//!                 └─→ Dispatcher ─→ spherize_shape ─→ ComputationEngine
//!                                        │
//!                                        └─→ ShapeRepair (fallbacks)
//! ```
//!
//! ## Modules
//!
//! - [`approximation`]: spheres and error metrics
//! - [`params`]: request parameters and runtime configuration
//! - [`engine`]: engine and repair traits, reference implementations
//! - [`spherize`]: the per-shape job and its fallback chain
//! - [`dispatcher`]: named tasks on a rayon pool
//! - [`cache`]: the best-of level cache and its JSON file
//! - [`selection`]: level-selection policies
//! - [`orchestrator`]: the front end tying it together
//!
//! ## Usage
//!
//! ```rust
//! use sphere_cache::{Orchestrator, OrchestratorConfig, Shape, SpherizeParams};
//! use sphere_mesh::primitives::create_sphere;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = OrchestratorConfig::new(dir.path().join("spheres.json")).with_workers(2);
//!
//! let orchestrator = Orchestrator::with_defaults(config).unwrap();
//! let mesh = create_sphere(1.0, 24).unwrap();
//! orchestrator.request("ball", Shape::Mesh(mesh), &SpherizeParams::new(8, 1)).unwrap();
//!
//! let level = orchestrator.resolve("ball", 8, 1, true).unwrap();
//! assert!(!level.is_empty());
//! orchestrator.close().unwrap();
//! ```

pub mod approximation;
pub mod cache;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod params;
pub mod selection;
pub mod shape;
pub mod spherize;

pub use approximation::{Approximation, Sphere};
pub use cache::{CacheTable, LevelCache};
pub use dispatcher::{CancelToken, Dispatcher, TaskHandle, TaskOutcome};
pub use engine::{BoundingTreeEngine, ComputationEngine, MeshRepair, ShapeRepair};
pub use error::{EngineError, SpherizeError, SpherizeResult};
pub use orchestrator::Orchestrator;
pub use params::{
    DispatcherConfig, EngineParams, Method, OrchestratorConfig, Pose, PreprocessParams,
    SpherizeParams,
};
pub use shape::Shape;
pub use spherize::spherize_shape;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the guard if a previous holder panicked.
///
/// Every critical section in this crate leaves its table consistent, so a
/// poisoned lock carries no broken state.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
