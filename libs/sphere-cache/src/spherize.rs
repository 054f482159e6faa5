//! # Spherization Job
//!
//! The unit of work the orchestrator hands to the dispatcher.
//!
//! ## Pipeline
//!
//! ```text
//! shape ─→ pose ─→ center ─→ suitable? ──no──→ repair ─→ suitable? ──no──→ decompose
//!                                │                           │                 │
//!                                └────────────yes────────────┴───────yes───────┴─→ compute
//!
//! compute ─err─→ repair ─→ compute ─err─→ ComputationFailure
//! ```
//!
//! Every approximation is offset back by the centering vector before it is
//! returned, so callers see spheres in posed shape coordinates.

use crate::approximation::{Approximation, Sphere};
use crate::dispatcher::CancelToken;
use crate::engine::{ComputationEngine, ShapeRepair};
use crate::error::{SpherizeError, SpherizeResult};
use crate::params::{PreprocessParams, SpherizeParams};
use crate::shape::Shape;
use sphere_mesh::{Mesh, MeshResult};
use tracing::{debug, info, instrument, warn};

/// Spherizes one shape, running the fallback chain as needed.
///
/// Returns one approximation per level, `0..=params.depth()`, as produced by
/// the engine.
///
/// # Errors
///
/// - [`SpherizeError::Cancelled`] if `cancel` fires between stages
/// - [`SpherizeError::ComputationFailure`] if a repair pass fails or the
///   engine fails again after the retry
#[instrument(skip_all, fields(shape_id = %shape_id, branch = params.branch_factor(), depth = params.depth()))]
pub fn spherize_shape(
    shape_id: &str,
    shape: &Shape,
    params: &SpherizeParams,
    engine: &dyn ComputationEngine,
    repair: &dyn ShapeRepair,
    cancel: &CancelToken,
) -> SpherizeResult<Vec<Approximation>> {
    let mesh = match shape {
        Shape::Sphere { center, radius } => {
            let sphere = Sphere::new(
                params.pose.apply_point(*center),
                radius * params.pose.max_scale(),
            );
            debug!("analytic sphere, skipping computation");
            return Ok(vec![Approximation::single(sphere); params.depth() as usize + 1]);
        }
        Shape::Mesh(mesh) => mesh,
    };

    if mesh.triangle_count() == 0 {
        return Err(SpherizeError::computation(shape_id, "mesh has no triangles"));
    }

    let mut mesh = mesh.clone();
    params.pose.apply(&mut mesh);
    let center = mesh.bounds_center();
    mesh.translate(-center);

    let method = params.engine.method;
    if !engine.is_suitable(method, &mesh) {
        check_cancelled(shape_id, cancel)?;
        info!(%method, "mesh unsuitable, repairing");
        mesh = repair_pass(repair, &mesh, &params.preprocess)
            .map_err(|err| SpherizeError::computation(shape_id, format!("repair failed: {}", err)))?;
    }

    if !engine.is_suitable(method, &mesh) {
        check_cancelled(shape_id, cancel)?;
        info!(%method, "repaired mesh still unsuitable, decomposing");
        let pieces = repair.decompose(&mesh).map_err(|err| {
            SpherizeError::computation(shape_id, format!("decomposition failed: {}", err))
        })?;
        mesh = Mesh::concatenate(&pieces);
    }

    check_cancelled(shape_id, cancel)?;
    let mut levels = match engine.compute(&mesh, &params.engine) {
        Ok(levels) => levels,
        Err(first) => {
            warn!(error = %first, "computation failed, retrying on repaired mesh");
            check_cancelled(shape_id, cancel)?;
            let repaired = repair_pass(repair, &mesh, &params.preprocess).map_err(|err| {
                SpherizeError::computation(
                    shape_id,
                    format!("{}; repair before retry failed: {}", first, err),
                )
            })?;
            engine.compute(&repaired, &params.engine).map_err(|second| {
                SpherizeError::computation(shape_id, format!("{}; retry failed: {}", first, second))
            })?
        }
    };

    for approx in &mut levels {
        approx.offset(center);
    }
    debug!(levels = levels.len(), "spherization finished");
    Ok(levels)
}

/// Repair and simplify, then smooth.
fn repair_pass(repair: &dyn ShapeRepair, mesh: &Mesh, preprocess: &PreprocessParams) -> MeshResult<Mesh> {
    let mut repaired = repair.repair_and_simplify(
        mesh,
        preprocess.manifold_leaves,
        preprocess.simplification_ratio,
    )?;
    repair.smooth(&mut repaired);
    Ok(repaired)
}

fn check_cancelled(shape_id: &str, cancel: &CancelToken) -> SpherizeResult<()> {
    if cancel.is_cancelled() {
        return Err(SpherizeError::Cancelled {
            name: shape_id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BoundingTreeEngine, MeshRepair};
    use crate::params::{Method, Pose};
    use approx::assert_relative_eq;
    use glam::DVec3;
    use sphere_mesh::primitives::create_sphere;

    #[test]
    fn test_analytic_sphere_shortcut() {
        let params = SpherizeParams::new(8, 2).with_pose(Pose {
            scale: Some(DVec3::new(1.0, 3.0, 2.0)),
            position: Some(DVec3::X),
            orientation: None,
        });
        let shape = Shape::sphere(DVec3::ZERO, 0.5);
        let levels = spherize_shape(
            "ball",
            &shape,
            &params,
            &BoundingTreeEngine,
            &MeshRepair,
            &CancelToken::default(),
        )
        .unwrap();

        assert_eq!(levels.len(), 3);
        for level in &levels {
            assert_eq!(level.len(), 1);
            assert_eq!(level.mean_error, 0.0);
            assert_relative_eq!(level.primitives[0].radius, 1.5);
            assert_relative_eq!(level.primitives[0].x, 1.0);
        }
    }

    #[test]
    fn test_results_in_posed_coordinates() {
        let mut mesh = create_sphere(1.0, 16).unwrap();
        mesh.translate(DVec3::new(10.0, 0.0, 0.0));
        let params = SpherizeParams::new(8, 1)
            .with_method(Method::Grid)
            .with_pose(Pose {
                position: Some(DVec3::new(0.0, 5.0, 0.0)),
                ..Pose::default()
            });

        let levels = spherize_shape(
            "offset",
            &Shape::Mesh(mesh),
            &params,
            &BoundingTreeEngine,
            &MeshRepair,
            &CancelToken::default(),
        )
        .unwrap();

        let root = levels[0].primitives[0].center();
        assert_relative_eq!(root.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(root.y, 5.0, epsilon = 1e-9);
        assert_relative_eq!(root.z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cancelled_before_compute() {
        let cancel = CancelToken::default();
        cancel.cancel();
        let mesh = create_sphere(1.0, 8).unwrap();
        let result = spherize_shape(
            "gone",
            &Shape::Mesh(mesh),
            &SpherizeParams::new(8, 1),
            &BoundingTreeEngine,
            &MeshRepair,
            &cancel,
        );
        assert!(matches!(result, Err(SpherizeError::Cancelled { .. })));
    }

    #[test]
    fn test_empty_mesh_fails() {
        let result = spherize_shape(
            "nothing",
            &Shape::Mesh(Mesh::new()),
            &SpherizeParams::default(),
            &BoundingTreeEngine,
            &MeshRepair,
            &CancelToken::default(),
        );
        assert!(matches!(
            result,
            Err(SpherizeError::ComputationFailure { .. })
        ));
    }
}
