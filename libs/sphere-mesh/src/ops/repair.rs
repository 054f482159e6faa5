//! # Repair and Simplification
//!
//! Cleans a triangle soup into an indexed mesh and reduces its resolution by
//! vertex clustering.
//!
//! ## Passes
//!
//! - **Weld**: merge vertices closer than a tolerance
//! - **Degenerate removal**: drop collapsed, zero-area and duplicate triangles,
//!   then compact unreferenced vertices
//! - **Clustering**: snap vertices to a uniform grid over the bounding box and
//!   replace each occupied cell by the mean of its vertices

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;
use config::constants::{EPSILON, VERTEX_MERGE_EPSILON};
use glam::DVec3;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Smallest grid resolution used by clustering; one cell per axis would
/// collapse every shape to a point.
const MIN_CELLS_PER_AXIS: u32 = 2;

/// Repairs a mesh and simplifies it to a lower resolution.
///
/// `leaves` bounds the clustering grid: it has at most about `leaves` cells in
/// total. `ratio` is the fraction of vertices the simplification aims to keep.
///
/// # Errors
///
/// Fails on an empty input, on out-of-range parameters, and when repair leaves
/// no triangles behind.
///
/// # Example
///
/// ```rust
/// use sphere_mesh::ops::repair_and_simplify;
/// use sphere_mesh::primitives::create_sphere;
///
/// let sphere = create_sphere(1.0, 32).unwrap();
/// let simplified = repair_and_simplify(&sphere, 1000, 0.2).unwrap();
/// assert!(simplified.vertex_count() < sphere.vertex_count());
/// ```
pub fn repair_and_simplify(mesh: &Mesh, leaves: u32, ratio: f64) -> MeshResult<Mesh> {
    if leaves == 0 {
        return Err(MeshError::invalid_parameter("leaves must be positive"));
    }
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(MeshError::invalid_parameter(format!(
            "ratio must be in (0, 1]: {}",
            ratio
        )));
    }
    if mesh.triangle_count() == 0 {
        return Err(MeshError::empty("cannot repair a mesh without triangles"));
    }

    let repaired = remove_degenerate(&weld_vertices(mesh, VERTEX_MERGE_EPSILON));

    let max_cells = (leaves as f64).cbrt().ceil() as u32;
    let target_vertices = (repaired.vertex_count() as f64 * ratio).max(1.0);
    // Clustering a surface keeps roughly cells^2 vertices
    let cells = (target_vertices.sqrt().ceil() as u32).clamp(MIN_CELLS_PER_AXIS, max_cells.max(MIN_CELLS_PER_AXIS));

    let simplified = cluster_simplify(&repaired, cells);
    debug!(
        before = mesh.vertex_count(),
        after = simplified.vertex_count(),
        cells,
        "repaired and simplified mesh"
    );

    if simplified.triangle_count() == 0 {
        return Err(MeshError::degenerate(
            "simplification collapsed every triangle",
        ));
    }
    Ok(simplified)
}

/// Merges vertices that fall within `tolerance` of each other.
///
/// Vertices are bucketed on a grid of `tolerance`-sized cells; the first
/// vertex seen in a cell becomes the representative.
pub fn weld_vertices(mesh: &Mesh, tolerance: f64) -> Mesh {
    let scale = 1.0 / tolerance.max(EPSILON);
    let mut cells: HashMap<[i64; 3], u32> = HashMap::new();
    let mut welded = Mesh::with_capacity(mesh.vertex_count(), mesh.triangle_count());

    let remap: Vec<u32> = mesh
        .vertices()
        .iter()
        .map(|&v| {
            let key = (v * scale).round().to_array().map(|c| c as i64);
            *cells.entry(key).or_insert_with(|| welded.add_vertex(v))
        })
        .collect();

    for tri in mesh.triangles() {
        welded.add_triangle(
            remap[tri[0] as usize],
            remap[tri[1] as usize],
            remap[tri[2] as usize],
        );
    }
    welded
}

/// Drops collapsed, zero-area and duplicate triangles and compacts the
/// vertex buffer to the vertices still referenced.
pub fn remove_degenerate(mesh: &Mesh) -> Mesh {
    let mut seen: HashSet<[u32; 3]> = HashSet::new();
    let mut remap: Vec<Option<u32>> = vec![None; mesh.vertex_count()];
    let mut cleaned = Mesh::with_capacity(mesh.vertex_count(), mesh.triangle_count());

    for tri in mesh.triangles() {
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            continue;
        }
        if mesh.triangle_area(tri) < EPSILON {
            continue;
        }
        let mut key = *tri;
        key.sort_unstable();
        if !seen.insert(key) {
            continue;
        }

        let mapped = tri.map(|v| {
            *remap[v as usize].get_or_insert_with(|| cleaned.add_vertex(mesh.vertex(v)))
        });
        cleaned.add_triangle(mapped[0], mapped[1], mapped[2]);
    }
    cleaned
}

/// Simplifies a mesh by vertex clustering on a `cells`³ grid.
pub fn cluster_simplify(mesh: &Mesh, cells: u32) -> Mesh {
    if mesh.is_empty() {
        return Mesh::new();
    }

    let cells = cells.max(1);
    let (min, max) = mesh.bounding_box();
    let extent = max - min;
    let cell_size = DVec3::select(
        extent.cmpgt(DVec3::splat(EPSILON)),
        extent / cells as f64,
        DVec3::ONE,
    );

    let mut cell_index: HashMap<[u32; 3], u32> = HashMap::new();
    let mut sums: Vec<(DVec3, u32)> = Vec::new();
    let remap: Vec<u32> = mesh
        .vertices()
        .iter()
        .map(|&v| {
            let key = ((v - min) / cell_size)
                .floor()
                .to_array()
                .map(|c| (c.max(0.0) as u32).min(cells - 1));
            let slot = *cell_index.entry(key).or_insert_with(|| {
                sums.push((DVec3::ZERO, 0));
                (sums.len() - 1) as u32
            });
            let entry = &mut sums[slot as usize];
            entry.0 += v;
            entry.1 += 1;
            slot
        })
        .collect();

    let mut clustered = Mesh::with_capacity(sums.len(), mesh.triangle_count());
    for (sum, count) in &sums {
        clustered.add_vertex(*sum / *count as f64);
    }
    for tri in mesh.triangles() {
        clustered.add_triangle(
            remap[tri[0] as usize],
            remap[tri[1] as usize],
            remap[tri[2] as usize],
        );
    }

    remove_degenerate(&clustered)
}
