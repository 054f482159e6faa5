//! # Config Crate
//!
//! Centralized configuration constants for the sphere cache pipeline.
//! All magic numbers and tunable parameters are defined here to ensure
//! consistency across crates and easy configuration management.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{DEFAULT_BRANCH_FACTOR, DEFAULT_DEPTH, EPSILON};
//!
//! // Use EPSILON for floating-point comparisons
//! let value: f64 = 0.00000000001; // 1e-11, smaller than EPSILON (1e-10)
//! assert!(value.abs() < EPSILON);
//!
//! // Use spherization defaults when a caller leaves them unset
//! let branch: Option<u32> = None;
//! assert_eq!(branch.unwrap_or(DEFAULT_BRANCH_FACTOR), 8);
//! assert_eq!(DEFAULT_DEPTH, 1);
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **Validated Ranges**: Every tunable has documented bounds next to its default
//! - **Well-Documented**: Every constant has clear documentation

pub mod constants;
