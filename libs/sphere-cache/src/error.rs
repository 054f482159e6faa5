//! # Error Types
//!
//! Errors surfaced by the dispatcher, the level cache and the orchestrator,
//! plus the engine-side error consumed by the fallback chain.
//!
//! ## Error Policy
//!
//! - Unsuitability and engine failures are recovered locally by the repair and
//!   decomposition fallbacks
//! - Once the fallbacks are exhausted the failure is fatal for that shape only
//! - [`SpherizeError`] is `Clone` so a single task outcome can be handed to
//!   every caller waiting on it

use crate::params::Method;
use sphere_mesh::MeshError;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors returned to callers of the dispatcher, cache and orchestrator.
///
/// ## Example
///
/// ```rust
/// use sphere_cache::SpherizeError;
///
/// let err = SpherizeError::NotFound {
///     shape_id: "link0".to_string(),
///     branch_factor: 8,
///     level: 1,
/// };
/// assert!(err.to_string().contains("link0"));
/// ```
#[derive(Error, Debug, Clone)]
pub enum SpherizeError {
    /// A result was requested for a task name that was never submitted.
    #[error("Unknown task: {name}")]
    UnknownTask {
        /// Task name that was looked up
        name: String,
    },

    /// The engine failed after the repair and decomposition fallbacks.
    #[error("Computation failed for '{shape_id}': {reason}")]
    ComputationFailure {
        /// Shape whose computation failed
        shape_id: String,
        /// Chain of failures that led here
        reason: String,
    },

    /// The engine produced zero levels.
    #[error("No spherization levels were generated for '{shape_id}'")]
    EmptyResult {
        /// Shape whose computation came back empty
        shape_id: String,
    },

    /// No cache entry exists for the key and no coarser fallback applies.
    #[error("No cached spherization for '{shape_id}' (branch {branch_factor}, level {level})")]
    NotFound {
        /// Shape identifier
        shape_id: String,
        /// Branch factor of the key
        branch_factor: u32,
        /// Level of the key
        level: u32,
    },

    /// The task was cancelled before its work completed.
    #[error("Task '{name}' was cancelled")]
    Cancelled {
        /// Task name
        name: String,
    },

    /// A configuration or parameter value is out of range.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// The worker pool could not be started.
    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),

    /// A persisted cache file is truncated or malformed.
    #[error("Corrupt cache file {}: {reason}", path.display())]
    CorruptCache {
        /// File that failed to load
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Reading or writing the cache file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: Arc<io::Error>,
    },
}

impl SpherizeError {
    /// Creates a computation failure error.
    pub fn computation(shape_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ComputationFailure {
            shape_id: shape_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an I/O error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a corrupt cache error.
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptCache {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by a computation engine.
///
/// These never reach callers directly; the fallback chain either recovers from
/// them or wraps them into [`SpherizeError::ComputationFailure`].
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// The shape cannot be handled by the requested method.
    #[error("Shape is unsuitable for the {method} method")]
    Unsuitable {
        /// Requested method
        method: Method,
    },

    /// The engine ran and failed.
    #[error("Engine failed: {0}")]
    Failed(String),

    /// A mesh operation inside the engine failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

// =============================================================================
// RESULT TYPE ALIAS
// =============================================================================

/// Result type alias for dispatcher, cache and orchestrator operations.
pub type SpherizeResult<T> = Result<T, SpherizeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SpherizeError::computation("gripper", "engine failed twice");
        assert!(err.to_string().contains("gripper"));
        assert!(err.to_string().contains("engine failed twice"));

        let err = SpherizeError::corrupt("/tmp/cache.json", "EOF while parsing");
        assert!(err.to_string().contains("/tmp/cache.json"));
    }

    #[test]
    fn test_engine_error_wraps_mesh_error() {
        let err: EngineError = MeshError::degenerate("flat").into();
        assert!(err.to_string().contains("flat"));
    }

    #[test]
    fn test_errors_are_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<SpherizeError>();
        assert_traits::<EngineError>();
    }
}
