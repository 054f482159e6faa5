//! # Mesh Data Structure
//!
//! Core triangle mesh representation used as the input shape for
//! spherization.

use crate::error::{MeshError, MeshResult};
use config::constants::VERTEX_MERGE_EPSILON;
use glam::{DMat4, DVec3};
use std::collections::HashMap;

/// A triangle mesh with vertices and indices.
///
/// All geometry calculations use f64.
///
/// # Example
///
/// ```rust
/// use sphere_mesh::Mesh;
/// use glam::DVec3;
///
/// let mut mesh = Mesh::new();
/// mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
/// mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
/// mesh.add_vertex(DVec3::new(0.0, 1.0, 0.0));
/// mesh.add_triangle(0, 1, 2);
/// assert_eq!(mesh.triangle_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions
    vertices: Vec<DVec3>,
    /// Triangle indices (3 indices per triangle)
    triangles: Vec<[u32; 3]>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    /// Creates a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Builds a mesh from raw vertex and triangle buffers.
    ///
    /// Fails if any triangle references a vertex that does not exist.
    pub fn from_parts(vertices: Vec<DVec3>, triangles: Vec<[u32; 3]>) -> MeshResult<Self> {
        let count = vertices.len() as u32;
        if let Some(bad) = triangles.iter().find(|t| t.iter().any(|&i| i >= count)) {
            return Err(MeshError::invalid_topology(format!(
                "triangle {:?} references a vertex outside 0..{}",
                bad, count
            )));
        }
        Ok(Self {
            vertices,
            triangles,
        })
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns true if the mesh has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, position: DVec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        index
    }

    /// Adds a triangle by vertex indices.
    pub fn add_triangle(&mut self, v0: u32, v1: u32, v2: u32) {
        self.triangles.push([v0, v1, v2]);
    }

    /// Returns a reference to the vertices.
    #[inline]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// Returns a mutable reference to the vertices.
    #[inline]
    pub fn vertices_mut(&mut self) -> &mut [DVec3] {
        &mut self.vertices
    }

    /// Returns a reference to the triangles.
    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Returns the vertex at the given index.
    #[inline]
    pub fn vertex(&self, index: u32) -> DVec3 {
        self.vertices[index as usize]
    }

    /// Returns the triangle at the given index.
    #[inline]
    pub fn triangle(&self, index: usize) -> [u32; 3] {
        self.triangles[index]
    }

    /// Computes the axis-aligned bounding box.
    ///
    /// Returns (min, max) corners of the bounding box.
    pub fn bounding_box(&self) -> (DVec3, DVec3) {
        if self.vertices.is_empty() {
            return (DVec3::ZERO, DVec3::ZERO);
        }

        let mut min = self.vertices[0];
        let mut max = self.vertices[0];

        for v in &self.vertices[1..] {
            min = min.min(*v);
            max = max.max(*v);
        }

        (min, max)
    }

    /// Returns the midpoint of the bounding box.
    pub fn bounds_center(&self) -> DVec3 {
        let (min, max) = self.bounding_box();
        (min + max) / 2.0
    }

    /// Transforms all vertices by a 4x4 matrix.
    pub fn transform(&mut self, matrix: &DMat4) {
        for v in &mut self.vertices {
            *v = matrix.transform_point3(*v);
        }
    }

    /// Translates the mesh by a vector.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// mesh.translate(DVec3::new(10.0, 0.0, 0.0));
    /// ```
    pub fn translate(&mut self, offset: DVec3) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Merges another mesh into this one.
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len() as u32;

        self.vertices.extend_from_slice(&other.vertices);

        for tri in &other.triangles {
            self.triangles
                .push([tri[0] + offset, tri[1] + offset, tri[2] + offset]);
        }
    }

    /// Concatenates several meshes into one.
    pub fn concatenate<'a>(meshes: impl IntoIterator<Item = &'a Mesh>) -> Mesh {
        let mut result = Mesh::new();
        for mesh in meshes {
            result.merge(mesh);
        }
        result
    }

    /// Validates the mesh for correctness.
    ///
    /// Checks:
    /// - All triangle indices are valid
    /// - No degenerate triangles (repeated index or zero area)
    pub fn validate(&self) -> bool {
        let vertex_count = self.vertices.len() as u32;

        for tri in &self.triangles {
            if tri[0] >= vertex_count || tri[1] >= vertex_count || tri[2] >= vertex_count {
                return false;
            }

            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return false;
            }

            if self.triangle_area(tri) < VERTEX_MERGE_EPSILON {
                return false;
            }
        }

        true
    }

    /// Returns the area of a triangle given by vertex indices.
    pub(crate) fn triangle_area(&self, tri: &[u32; 3]) -> f64 {
        let v0 = self.vertices[tri[0] as usize];
        let v1 = self.vertices[tri[1] as usize];
        let v2 = self.vertices[tri[2] as usize];
        (v1 - v0).cross(v2 - v0).length() / 2.0
    }

    /// Returns true if every edge is shared by exactly two triangles.
    ///
    /// An empty mesh is not considered closed.
    pub fn is_watertight(&self) -> bool {
        if self.triangles.is_empty() {
            return false;
        }

        let mut edge_count: HashMap<(u32, u32), usize> = HashMap::new();
        for tri in &self.triangles {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let key = if a < b { (a, b) } else { (b, a) };
                *edge_count.entry(key).or_insert(0) += 1;
            }
        }

        edge_count.values().all(|&count| count == 2)
    }

    /// Builds the vertex adjacency list from the triangle edges.
    ///
    /// Neighbors are sorted and deduplicated.
    pub fn vertex_neighbors(&self) -> Vec<Vec<u32>> {
        let mut neighbors = vec![Vec::new(); self.vertices.len()];
        for tri in &self.triangles {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                neighbors[a as usize].push(b);
                neighbors[b as usize].push(a);
            }
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        neighbors
    }

    /// Splits the mesh into its edge-connected components.
    ///
    /// Vertices not referenced by any triangle are dropped.
    pub fn connected_components(&self) -> Vec<Mesh> {
        let neighbors = self.vertex_neighbors();
        let mut component_of = vec![usize::MAX; self.vertices.len()];
        let mut component_count = 0;

        for tri in &self.triangles {
            let seed = tri[0] as usize;
            if component_of[seed] != usize::MAX {
                continue;
            }

            let mut stack = vec![seed];
            component_of[seed] = component_count;
            while let Some(v) = stack.pop() {
                for &n in &neighbors[v] {
                    if component_of[n as usize] == usize::MAX {
                        component_of[n as usize] = component_count;
                        stack.push(n as usize);
                    }
                }
            }
            component_count += 1;
        }

        let mut components = vec![Mesh::new(); component_count];
        let mut remap: Vec<Option<u32>> = vec![None; self.vertices.len()];

        for tri in &self.triangles {
            let component = component_of[tri[0] as usize];
            let mesh = &mut components[component];
            let mut mapped = [0u32; 3];
            for (slot, &v) in mapped.iter_mut().zip(tri.iter()) {
                *slot = match remap[v as usize] {
                    Some(index) => index,
                    None => {
                        let index = mesh.add_vertex(self.vertices[v as usize]);
                        remap[v as usize] = Some(index);
                        index
                    }
                };
            }
            mesh.add_triangle(mapped[0], mapped[1], mapped[2]);
        }

        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{create_box, create_sphere};

    #[test]
    fn test_mesh_new() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_mesh_from_parts_rejects_bad_index() {
        let result = Mesh::from_parts(vec![DVec3::ZERO], vec![[0, 1, 2]]);
        assert!(matches!(result, Err(MeshError::InvalidTopology { .. })));
    }

    #[test]
    fn test_mesh_bounding_box_and_center() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(DVec3::new(-1.0, -2.0, -3.0));
        mesh.add_vertex(DVec3::new(5.0, 6.0, 7.0));
        let (min, max) = mesh.bounding_box();
        assert_eq!(min, DVec3::new(-1.0, -2.0, -3.0));
        assert_eq!(max, DVec3::new(5.0, 6.0, 7.0));
        assert_eq!(mesh.bounds_center(), DVec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_mesh_validate_invalid_index() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(DVec3::ZERO);
        mesh.add_triangle(0, 1, 2);
        assert!(!mesh.validate());
    }

    #[test]
    fn test_mesh_merge_offsets_indices() {
        let mut mesh1 = Mesh::new();
        mesh1.add_vertex(DVec3::ZERO);
        mesh1.add_vertex(DVec3::X);
        mesh1.add_vertex(DVec3::Y);
        mesh1.add_triangle(0, 1, 2);

        let mut mesh2 = mesh1.clone();
        mesh2.translate(DVec3::Z);

        mesh1.merge(&mesh2);
        assert_eq!(mesh1.vertex_count(), 6);
        assert_eq!(mesh1.triangle_count(), 2);
        assert_eq!(mesh1.triangle(1), [3, 4, 5]);
    }

    #[test]
    fn test_box_is_watertight() {
        let mesh = create_box(DVec3::splat(2.0), true).unwrap();
        assert!(mesh.is_watertight());
    }

    #[test]
    fn test_sphere_is_watertight() {
        let mesh = create_sphere(1.0, 12).unwrap();
        assert!(mesh.is_watertight());
    }

    #[test]
    fn test_single_triangle_is_open() {
        let mesh = Mesh::from_parts(vec![DVec3::ZERO, DVec3::X, DVec3::Y], vec![[0, 1, 2]]).unwrap();
        assert!(!mesh.is_watertight());
    }

    #[test]
    fn test_connected_components_splits_disjoint_boxes() {
        let a = create_box(DVec3::splat(1.0), false).unwrap();
        let mut b = create_box(DVec3::splat(1.0), false).unwrap();
        b.translate(DVec3::new(5.0, 0.0, 0.0));
        let merged = Mesh::concatenate([&a, &b]);

        let parts = merged.connected_components();
        assert_eq!(parts.len(), 2);
        for part in &parts {
            assert_eq!(part.vertex_count(), 8);
            assert_eq!(part.triangle_count(), 12);
            assert!(part.is_watertight());
        }
    }

    #[test]
    fn test_transform_applies_matrix() {
        let mut mesh = create_box(DVec3::splat(2.0), true).unwrap();
        mesh.transform(&DMat4::from_translation(DVec3::new(1.0, 0.0, 0.0)));
        let (min, max) = mesh.bounding_box();
        assert_eq!(min, DVec3::new(0.0, -1.0, -1.0));
        assert_eq!(max, DVec3::new(2.0, 1.0, 1.0));
    }
}
