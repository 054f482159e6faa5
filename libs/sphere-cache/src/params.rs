//! # Parameters and Configuration
//!
//! Typed configuration for a spherization request, the dispatcher and the
//! orchestrator. Defaults come from the `config` crate; every struct
//! deserializes with missing fields filled from its `Default`.
//!
//! ## Example
//!
//! ```rust
//! use sphere_cache::{Method, SpherizeParams};
//!
//! let params = SpherizeParams::new(8, 2).with_method(Method::Grid);
//! assert!(params.validate().is_ok());
//! assert_eq!(params.engine.branch_factor, 8);
//! ```

use crate::error::{SpherizeError, SpherizeResult};
use config::constants::{
    default_worker_count, DEFAULT_BALANCE_EXCESS, DEFAULT_BRANCH_FACTOR, DEFAULT_CACHE_FILE,
    DEFAULT_DEPTH, DEFAULT_ERROR_FACTOR, DEFAULT_INIT_SPHERES, DEFAULT_MANIFOLD_LEAVES,
    DEFAULT_MAX_OPT_LEVEL, DEFAULT_MIN_COVER, DEFAULT_MIN_SAMPLES, DEFAULT_MIN_SPHERES,
    DEFAULT_NUM_COVER, DEFAULT_NUM_SAMPLES, DEFAULT_SIMPLIFICATION_RATIO, DEFAULT_TESTER_LEVELS,
    MAX_DEPTH, MAX_WORKER_COUNT, MIN_WORKER_COUNT,
};
use glam::{DMat4, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};
use sphere_mesh::Mesh;
use std::fmt;
use std::path::PathBuf;

// =============================================================================
// ENGINE PARAMETERS
// =============================================================================

/// Sphere-tree construction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Medial-axis approximation; needs a closed mesh
    #[default]
    Medial,
    /// Regular grid
    Grid,
    /// Sphere spawning
    Spawn,
    /// Hubbard's medial-axis method
    Hubbard,
    /// Octree subdivision
    Octree,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Medial => "medial",
            Method::Grid => "grid",
            Method::Spawn => "spawn",
            Method::Hubbard => "hubbard",
            Method::Octree => "octree",
        };
        f.write_str(name)
    }
}

/// Parameters handed to the computation engine.
///
/// Most fields are tuning knobs for a medial sphere-tree engine and are passed
/// through untouched; the reference engine reads `depth`, `branch_factor`,
/// `method` and `min_samples`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// Deepest level produced (levels `0..=depth`)
    pub depth: u32,
    /// Target number of children per sphere
    pub branch_factor: u32,
    /// Construction method
    pub method: Method,
    /// Levels of the surface tester
    pub tester_levels: u32,
    /// Cover points sampled over the surface
    pub num_cover: u32,
    /// Minimum cover points per sphere
    pub min_cover: u32,
    /// Initial spheres for the medial method
    pub init_spheres: u32,
    /// Minimum spheres kept by the medial method
    pub min_spheres: u32,
    /// Error reduction factor between levels
    pub error_factor: u32,
    /// Grow spheres to cover neighbours
    pub expand: bool,
    /// Merge overlapping spheres
    pub merge: bool,
    /// Burst spheres that cover too much
    pub burst: bool,
    /// Run the optimisation pass
    pub optimise: bool,
    /// Maximum optimisation level
    pub max_opt_level: u32,
    /// Allowed imbalance between children
    pub balance_excess: f64,
    /// Verify the final tree
    pub verify: bool,
    /// Samples per sphere used for error evaluation
    pub num_samples: u32,
    /// Minimum samples before a cell is split
    pub min_samples: u32,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            branch_factor: DEFAULT_BRANCH_FACTOR,
            method: Method::default(),
            tester_levels: DEFAULT_TESTER_LEVELS,
            num_cover: DEFAULT_NUM_COVER,
            min_cover: DEFAULT_MIN_COVER,
            init_spheres: DEFAULT_INIT_SPHERES,
            min_spheres: DEFAULT_MIN_SPHERES,
            error_factor: DEFAULT_ERROR_FACTOR,
            expand: true,
            merge: true,
            burst: false,
            optimise: true,
            max_opt_level: DEFAULT_MAX_OPT_LEVEL,
            balance_excess: DEFAULT_BALANCE_EXCESS,
            verify: true,
            num_samples: DEFAULT_NUM_SAMPLES,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

// =============================================================================
// PREPROCESSING PARAMETERS
// =============================================================================

/// Parameters of the repair and simplification fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessParams {
    /// Leaf budget of the repair grid
    pub manifold_leaves: u32,
    /// Fraction of vertices kept by simplification
    pub simplification_ratio: f64,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self {
            manifold_leaves: DEFAULT_MANIFOLD_LEAVES,
            simplification_ratio: DEFAULT_SIMPLIFICATION_RATIO,
        }
    }
}

// =============================================================================
// POSE
// =============================================================================

/// Optional placement applied to a shape before spherization.
///
/// Applied as rotate, then translate, then scale. `orientation` holds roll,
/// pitch and yaw in radians about the static X, Y and Z axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    /// Per-axis scale
    pub scale: Option<DVec3>,
    /// Translation
    pub position: Option<DVec3>,
    /// Roll, pitch, yaw
    pub orientation: Option<DVec3>,
}

impl Pose {
    /// Returns true if the pose leaves a shape unchanged.
    pub fn is_identity(&self) -> bool {
        self.scale.is_none() && self.position.is_none() && self.orientation.is_none()
    }

    /// The combined transform.
    pub fn matrix(&self) -> DMat4 {
        let rotation = self
            .orientation
            .map(|rpy| DQuat::from_euler(EulerRot::ZYX, rpy.z, rpy.y, rpy.x))
            .unwrap_or(DQuat::IDENTITY);
        let translation = self.position.unwrap_or(DVec3::ZERO);
        let scale = self.scale.unwrap_or(DVec3::ONE);
        DMat4::from_scale(scale) * DMat4::from_rotation_translation(rotation, translation)
    }

    /// Transforms a single point.
    pub fn apply_point(&self, point: DVec3) -> DVec3 {
        self.matrix().transform_point3(point)
    }

    /// Transforms a mesh in place.
    pub fn apply(&self, mesh: &mut Mesh) {
        if !self.is_identity() {
            mesh.transform(&self.matrix());
        }
    }

    /// Largest absolute scale component, used to scale radii.
    pub fn max_scale(&self) -> f64 {
        self.scale.map(|s| s.abs().max_element()).unwrap_or(1.0)
    }
}

// =============================================================================
// REQUEST PARAMETERS
// =============================================================================

/// Everything a single spherization request needs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpherizeParams {
    /// Engine parameters, including `branch_factor` and `depth`
    pub engine: EngineParams,
    /// Fallback preprocessing parameters
    pub preprocess: PreprocessParams,
    /// Placement of the shape
    pub pose: Pose,
}

impl SpherizeParams {
    /// Creates parameters for a branch factor and requested depth.
    pub fn new(branch_factor: u32, depth: u32) -> Self {
        Self {
            engine: EngineParams {
                branch_factor,
                depth,
                ..EngineParams::default()
            },
            ..Self::default()
        }
    }

    /// Sets the construction method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.engine.method = method;
        self
    }

    /// Sets the pose.
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    /// Sets the preprocessing parameters.
    pub fn with_preprocess(mut self, preprocess: PreprocessParams) -> Self {
        self.preprocess = preprocess;
        self
    }

    /// Branch factor of the request.
    #[inline]
    pub fn branch_factor(&self) -> u32 {
        self.engine.branch_factor
    }

    /// Requested level.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.engine.depth
    }

    /// Checks that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`SpherizeError::InvalidParams`] naming the first bad field.
    pub fn validate(&self) -> SpherizeResult<()> {
        let engine = &self.engine;
        if engine.branch_factor < 1 {
            return Err(invalid("branch_factor must be at least 1"));
        }
        if engine.depth > MAX_DEPTH {
            return Err(invalid(format!(
                "depth {} exceeds the maximum of {}",
                engine.depth, MAX_DEPTH
            )));
        }
        if engine.min_samples < 1 {
            return Err(invalid("min_samples must be at least 1"));
        }
        if !(engine.balance_excess.is_finite() && engine.balance_excess >= 0.0) {
            return Err(invalid("balance_excess must be a non-negative number"));
        }
        if self.preprocess.manifold_leaves == 0 {
            return Err(invalid("manifold_leaves must be positive"));
        }
        let ratio = self.preprocess.simplification_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(invalid(format!(
                "simplification_ratio must be in (0, 1], got {}",
                ratio
            )));
        }
        if let Some(scale) = self.pose.scale {
            if !scale.is_finite() || scale.cmpeq(DVec3::ZERO).any() {
                return Err(invalid("pose scale must be finite and non-zero"));
            }
        }
        Ok(())
    }
}

// =============================================================================
// RUNTIME CONFIGURATION
// =============================================================================

/// Dispatcher configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Number of worker threads
    pub workers: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: default_worker_count(),
        }
    }
}

impl DispatcherConfig {
    /// Creates a configuration with a fixed worker count.
    pub fn with_workers(workers: usize) -> Self {
        Self { workers }
    }

    /// Checks the worker count is within range.
    pub fn validate(&self) -> SpherizeResult<()> {
        if !(MIN_WORKER_COUNT..=MAX_WORKER_COUNT).contains(&self.workers) {
            return Err(invalid(format!(
                "workers must be in {}..={}, got {}",
                MIN_WORKER_COUNT, MAX_WORKER_COUNT, self.workers
            )));
        }
        Ok(())
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Cache file written at shutdown
    pub cache_path: PathBuf,
    /// Worker pool settings
    pub dispatcher: DispatcherConfig,
    /// Reload a previously flushed cache instead of starting empty
    pub reload: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            dispatcher: DispatcherConfig::default(),
            reload: false,
        }
    }
}

impl OrchestratorConfig {
    /// Creates a configuration writing to `cache_path`.
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            ..Self::default()
        }
    }

    /// Sets the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.dispatcher.workers = workers;
        self
    }

    /// Enables or disables reloading the cache file.
    pub fn with_reload(mut self, reload: bool) -> Self {
        self.reload = reload;
        self
    }

    /// Checks every value is in range.
    pub fn validate(&self) -> SpherizeResult<()> {
        if self.cache_path.as_os_str().is_empty() {
            return Err(invalid("cache_path must not be empty"));
        }
        self.dispatcher.validate()
    }
}

fn invalid(message: impl Into<String>) -> SpherizeError {
    SpherizeError::InvalidParams(message.into())
}
