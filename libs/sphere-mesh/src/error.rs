//! # Mesh Errors
//!
//! Error types for mesh preprocessing operations.

use thiserror::Error;

/// Errors that can occur while repairing, decomposing or building meshes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// The mesh has no vertices or no triangles to work with.
    #[error("Empty mesh: {message}")]
    EmptyMesh { message: String },

    /// Degenerate geometry (collinear, coplanar or zero-sized input).
    #[error("Degenerate geometry: {message}")]
    DegenerateGeometry { message: String },

    /// Invalid mesh topology (out-of-range indices and similar).
    #[error("Invalid topology: {message}")]
    InvalidTopology { message: String },

    /// Invalid preprocessing parameter.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },
}

impl MeshError {
    /// Creates an empty mesh error.
    pub fn empty(message: impl Into<String>) -> Self {
        Self::EmptyMesh {
            message: message.into(),
        }
    }

    /// Creates a degenerate geometry error.
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            message: message.into(),
        }
    }

    /// Creates an invalid topology error.
    pub fn invalid_topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}

/// Result type alias for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeshError::degenerate("all points are coplanar");
        assert!(err.to_string().contains("Degenerate geometry"));
        assert!(err.to_string().contains("coplanar"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MeshError>();
    }
}
