//! # QuickHull
//!
//! 3D convex hull over a point set.
//!
//! ## Algorithm Steps
//!
//! 1. Pick the farthest pair among the six axis extremes
//! 2. Grow it to a tetrahedron (farthest from line, then from plane)
//! 3. Give every remaining point to the first facet it lies in front of
//! 4. While some facet owns points: take its farthest point, remove every
//!    facet that point can see, and stitch the horizon to the point
//! 5. Emit the surviving facets as a mesh

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;
use config::constants::{EPSILON, VERTEX_MERGE_EPSILON};
use glam::DVec3;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Computes the convex hull of a set of 3D points.
///
/// # Arguments
///
/// * `points` - Points to compute hull of (at least 4 non-coplanar)
///
/// # Example
///
/// ```rust
/// use sphere_mesh::ops::hull::convex_hull;
/// use glam::DVec3;
///
/// let points = vec![
///     DVec3::new(0.0, 0.0, 0.0),
///     DVec3::new(1.0, 0.0, 0.0),
///     DVec3::new(0.0, 1.0, 0.0),
///     DVec3::new(0.0, 0.0, 1.0),
/// ];
/// let hull = convex_hull(&points).unwrap();
/// assert_eq!(hull.triangle_count(), 4);
/// ```
pub fn convex_hull(points: &[DVec3]) -> MeshResult<Mesh> {
    let unique = dedup_points(points);
    if unique.len() < 4 {
        return Err(MeshError::degenerate(format!(
            "Convex hull requires at least 4 unique points, got {}",
            unique.len()
        )));
    }

    let mut builder = HullBuilder::new(&unique)?;
    builder.expand();
    Ok(builder.into_mesh())
}

/// A triangular facet with its outward plane and the points in front of it.
#[derive(Debug, Clone)]
struct Facet {
    corners: [usize; 3],
    normal: DVec3,
    offset: f64,
    outside: Vec<usize>,
}

impl Facet {
    /// Builds a facet whose normal points away from `interior`.
    fn facing_away(a: usize, b: usize, c: usize, interior: DVec3, points: &[DVec3]) -> Self {
        let facet = Self::new([a, b, c], points);
        let centroid = (points[a] + points[b] + points[c]) / 3.0;
        if facet.normal.dot(interior - centroid) > 0.0 {
            Self::new([a, c, b], points)
        } else {
            facet
        }
    }

    fn new(corners: [usize; 3], points: &[DVec3]) -> Self {
        let [a, b, c] = corners.map(|i| points[i]);
        let normal = (b - a).cross(c - a).normalize_or_zero();
        Self {
            corners,
            normal,
            offset: normal.dot(a),
            outside: Vec::new(),
        }
    }

    fn height(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.offset
    }

    fn sees(&self, point: DVec3) -> bool {
        self.height(point) > EPSILON
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.corners;
        [(a, b), (b, c), (c, a)]
    }
}

/// Incremental hull state over a deduplicated point set.
struct HullBuilder<'a> {
    points: &'a [DVec3],
    facets: Vec<Facet>,
    interior: DVec3,
}

impl<'a> HullBuilder<'a> {
    fn new(points: &'a [DVec3]) -> MeshResult<Self> {
        let [p0, p1, p2, p3] = initial_simplex(points)?;
        let interior = (points[p0] + points[p1] + points[p2] + points[p3]) / 4.0;

        let mut facets = vec![
            Facet::facing_away(p0, p1, p2, interior, points),
            Facet::facing_away(p0, p2, p3, interior, points),
            Facet::facing_away(p0, p3, p1, interior, points),
            Facet::facing_away(p1, p3, p2, interior, points),
        ];

        let seeds = [p0, p1, p2, p3];
        let rest = (0..points.len()).filter(|i| !seeds.contains(i));
        assign_outside(&mut facets, rest, points);

        Ok(Self {
            points,
            facets,
            interior,
        })
    }

    fn expand(&mut self) {
        // Each round absorbs one point, so the point count bounds the work.
        for _ in 0..self.points.len() {
            let Some(apex) = self.next_apex() else {
                break;
            };
            let apex_point = self.points[apex];

            let (visible, kept): (Vec<Facet>, Vec<Facet>) = self
                .facets
                .drain(..)
                .partition(|facet| facet.sees(apex_point));
            self.facets = kept;

            let horizon = horizon_edges(&visible);
            let orphans = visible
                .into_iter()
                .flat_map(|facet| facet.outside)
                .filter(|&p| p != apex)
                .collect::<Vec<_>>();

            let first_new = self.facets.len();
            for (a, b) in horizon {
                self.facets
                    .push(Facet::facing_away(a, b, apex, self.interior, self.points));
            }
            assign_outside(&mut self.facets[first_new..], orphans, self.points);
        }
    }

    /// Farthest outside point of the first facet that still owns points.
    fn next_apex(&self) -> Option<usize> {
        let facet = self.facets.iter().find(|f| !f.outside.is_empty())?;
        facet.outside.iter().copied().max_by(|&a, &b| {
            facet
                .height(self.points[a])
                .total_cmp(&facet.height(self.points[b]))
        })
    }

    fn into_mesh(self) -> Mesh {
        let used: BTreeSet<usize> = self.facets.iter().flat_map(|f| f.corners).collect();
        let mut mesh = Mesh::with_capacity(used.len(), self.facets.len());
        let remap: HashMap<usize, u32> = used
            .into_iter()
            .map(|i| (i, mesh.add_vertex(self.points[i])))
            .collect();

        for facet in &self.facets {
            let [a, b, c] = facet.corners.map(|i| remap[&i]);
            mesh.add_triangle(a, b, c);
        }
        mesh
    }
}

/// Hands each point to the first facet that sees it; points no facet sees
/// are inside the hull and dropped.
fn assign_outside(facets: &mut [Facet], candidates: impl IntoIterator<Item = usize>, points: &[DVec3]) {
    for index in candidates {
        if let Some(facet) = facets.iter_mut().find(|f| f.sees(points[index])) {
            facet.outside.push(index);
        }
    }
}

/// Edges bordering exactly one visible facet, in that facet's winding.
fn horizon_edges(visible: &[Facet]) -> Vec<(usize, usize)> {
    let mut counts: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for facet in visible {
        for (a, b) in facet.edges() {
            *counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }

    visible
        .iter()
        .flat_map(Facet::edges)
        .filter(|&(a, b)| counts[&(a.min(b), a.max(b))] == 1)
        .collect()
}

/// Picks four well-spread, non-coplanar points.
fn initial_simplex(points: &[DVec3]) -> MeshResult<[usize; 4]> {
    let mut extremes = [0usize; 6];
    for (i, p) in points.iter().enumerate() {
        for axis in 0..3 {
            if p[axis] < points[extremes[axis * 2]][axis] {
                extremes[axis * 2] = i;
            }
            if p[axis] > points[extremes[axis * 2 + 1]][axis] {
                extremes[axis * 2 + 1] = i;
            }
        }
    }

    let mut pair = (0, 1);
    let mut widest = -1.0;
    for (i, &a) in extremes.iter().enumerate() {
        for &b in &extremes[i + 1..] {
            let d = points[a].distance_squared(points[b]);
            if d > widest {
                widest = d;
                pair = (a, b);
            }
        }
    }
    let (p0, p1) = pair;
    if p0 == p1 || widest <= EPSILON {
        return Err(MeshError::degenerate("All points coincide"));
    }

    let axis = (points[p1] - points[p0]).normalize();
    let p2 = farthest_by(points, &[p0, p1], |p| {
        let v = p - points[p0];
        (v - v.dot(axis) * axis).length()
    })
    .ok_or_else(|| MeshError::degenerate("All points are collinear"))?;

    let normal = (points[p1] - points[p0])
        .cross(points[p2] - points[p0])
        .normalize();
    let p3 = farthest_by(points, &[p0, p1, p2], |p| normal.dot(p - points[p0]).abs())
        .ok_or_else(|| MeshError::degenerate("All points are coplanar"))?;

    Ok([p0, p1, p2, p3])
}

/// Index maximizing `metric`, skipping `exclude`; `None` if no point scores
/// above tolerance.
fn farthest_by(points: &[DVec3], exclude: &[usize], metric: impl Fn(DVec3) -> f64) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(i, _)| !exclude.contains(i))
        .map(|(i, p)| (i, metric(*p)))
        .filter(|&(_, score)| score > EPSILON)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

fn dedup_points(points: &[DVec3]) -> Vec<DVec3> {
    let mut unique: Vec<DVec3> = Vec::with_capacity(points.len());
    for p in points {
        if !unique.iter().any(|u| u.distance(*p) < VERTEX_MERGE_EPSILON) {
            unique.push(*p);
        }
    }
    unique
}
