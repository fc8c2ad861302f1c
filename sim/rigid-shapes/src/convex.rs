//! Convex polyhedra and the separating-axis / clipping machinery built on them.
//!
//! A polyhedron is a vertex list plus faces given as vertex-index loops,
//! counter-clockwise when seen from outside. From those the constructor
//! derives outward face normals, the set of unique edge directions used for
//! edge-edge separating axes, and per-edge face adjacency used to clip
//! incident faces against the reference face's neighbours.
//!
//! # Contact generation
//!
//! ```text
//! find_separating_axis      faces of A, faces of B, edge(A) x edge(B)
//!          │                 minimal overlap wins, any gap => disjoint
//!          ▼
//! clip_against_hull         pick B's face most aligned with the axis
//!          │
//!          ▼
//! clip_face_against_hull    clip it against the planes around A's
//!                           reference face, keep points below that face
//! ```

use rigid_types::math::{Quat, Vec3, Vec3Ext, ALMOST_EPSILON};
use rigid_types::{Aabb, Result, RigidError};
use smallvec::SmallVec;
use tracing::warn;

/// Vertex-index loop describing one face.
pub type Face = SmallVec<[usize; 4]>;

/// Polygon produced while clipping, in world coordinates.
pub type ClipPolygon = SmallVec<[Vec3; 8]>;

/// Clipped points may sit this far outside the reference face and still be
/// kept, so resting manifolds survive round-off.
pub const CLIP_DEPTH_TOLERANCE: f64 = 1e-6;

/// A manifold point produced by hull clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPoint {
    /// Point on the incident face, in world coordinates.
    pub point: Vec3,
    /// World normal of the reference face.
    pub normal: Vec3,
    /// Signed distance to the reference face; negative means penetrating.
    pub depth: f64,
}

/// Closest surface point to a query point, in local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    /// The closest point on the surface.
    pub point: Vec3,
    /// Index of the face the point lies on.
    pub face: usize,
    /// Whether the query point was inside the polyhedron.
    pub inside: bool,
}

/// A convex polyhedron.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexPolyhedron {
    vertices: Vec<Vec3>,
    faces: Vec<Face>,
    face_normals: Vec<Vec3>,
    unique_edges: Vec<Vec3>,
    unique_axes: Option<Vec<Vec3>>,
    edge_neighbors: Vec<SmallVec<[Option<usize>; 4]>>,
    bounding_sphere_radius: f64,
}

impl ConvexPolyhedron {
    /// Build a polyhedron from vertices and counter-clockwise faces.
    ///
    /// A face whose winding points into the shape is reversed with a warning.
    pub fn new(vertices: Vec<Vec3>, faces: Vec<Vec<usize>>) -> Result<Self> {
        if vertices.len() < 4 {
            return Err(RigidError::invalid_shape(format!(
                "convex polyhedron needs at least 4 vertices, got {}",
                vertices.len()
            )));
        }
        if faces.len() < 4 {
            return Err(RigidError::invalid_shape(format!(
                "convex polyhedron needs at least 4 faces, got {}",
                faces.len()
            )));
        }
        if vertices.iter().any(|v| !v.iter().all(|c| c.is_finite())) {
            return Err(RigidError::invalid_shape("convex vertex is not finite"));
        }

        let mut faces: Vec<Face> = faces.into_iter().map(Face::from_vec).collect();
        for (i, face) in faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(RigidError::invalid_shape(format!(
                    "face {i} has fewer than 3 vertices"
                )));
            }
            if let Some(&bad) = face.iter().find(|&&v| v >= vertices.len()) {
                return Err(RigidError::invalid_shape(format!(
                    "face {i} references vertex {bad} out of {}",
                    vertices.len()
                )));
            }
        }

        let centroid = vertices.iter().sum::<Vec3>() / vertices.len() as f64;
        let mut face_normals = Vec::with_capacity(faces.len());
        for (i, face) in faces.iter_mut().enumerate() {
            let n = newell_normal(&vertices, face);
            let len = n.norm();
            if len < 1e-12 {
                return Err(RigidError::invalid_shape(format!("face {i} is degenerate")));
            }
            let mut n = n / len;
            if n.dot(&(vertices[face[0]] - centroid)) < 0.0 {
                warn!(face = i, "face normal points into the shape, reversing winding");
                face.reverse();
                n = -n;
            }
            face_normals.push(n);
        }

        let unique_edges = compute_unique_edges(&vertices, &faces);
        let edge_neighbors = compute_edge_neighbors(&faces);
        let bounding_sphere_radius = vertices.iter().map(Vec3::norm).fold(0.0, f64::max);

        Ok(Self {
            vertices,
            faces,
            face_normals,
            unique_edges,
            unique_axes: None,
            edge_neighbors,
            bounding_sphere_radius,
        })
    }

    /// Restrict face-normal separating axes to this reduced set (local space).
    #[must_use]
    pub fn with_unique_axes(mut self, axes: Vec<Vec3>) -> Self {
        self.unique_axes = Some(axes);
        self
    }

    /// Local vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Faces as vertex-index loops.
    #[must_use]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Outward unit normals, one per face.
    #[must_use]
    pub fn face_normals(&self) -> &[Vec3] {
        &self.face_normals
    }

    /// Unit edge directions with duplicates and opposites removed.
    #[must_use]
    pub fn unique_edges(&self) -> &[Vec3] {
        &self.unique_edges
    }

    /// Reduced set of face-normal axes, if one was supplied.
    #[must_use]
    pub fn unique_axes(&self) -> Option<&[Vec3]> {
        self.unique_axes.as_deref()
    }

    /// Radius of the origin-centered sphere enclosing every vertex.
    #[must_use]
    pub fn bounding_sphere_radius(&self) -> f64 {
        self.bounding_sphere_radius
    }

    /// Face adjacent to `face` across its edge `edge` (vertex `edge` to `edge + 1`).
    #[must_use]
    pub fn edge_neighbor(&self, face: usize, edge: usize) -> Option<usize> {
        self.edge_neighbors
            .get(face)
            .and_then(|edges| edges.get(edge).copied().flatten())
    }

    /// Plane constant `d` such that `n . x + d = 0` on face `i`.
    #[must_use]
    pub fn plane_constant_of_face(&self, i: usize) -> f64 {
        -self.face_normals[i].dot(&self.vertices[self.faces[i][0]])
    }

    /// Vertices transformed into world coordinates.
    #[must_use]
    pub fn world_vertices(&self, position: &Vec3, quaternion: &Quat) -> Vec<Vec3> {
        self.vertices
            .iter()
            .map(|v| quaternion * v + position)
            .collect()
    }

    /// Face normals rotated into world coordinates.
    #[must_use]
    pub fn world_face_normals(&self, quaternion: &Quat) -> Vec<Vec3> {
        self.face_normals.iter().map(|n| quaternion * n).collect()
    }

    /// Mean of the vertices.
    #[must_use]
    pub fn average_point_local(&self) -> Vec3 {
        self.vertices.iter().sum::<Vec3>() / self.vertices.len() as f64
    }

    /// Bounding box in local coordinates.
    #[must_use]
    pub fn local_aabb(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter(), None, 0.0)
    }

    /// Bounding box of the posed polyhedron.
    #[must_use]
    pub fn calculate_world_aabb(&self, position: &Vec3, quaternion: &Quat) -> Aabb {
        let mut aabb = Aabb::empty();
        for v in &self.vertices {
            aabb.extend_point(&(quaternion * v + position));
        }
        aabb
    }

    /// Principal moments approximated by the local bounding box.
    #[must_use]
    pub fn calculate_local_inertia(&self, mass: f64) -> Vec3 {
        box_inertia(&(self.local_aabb().half_extents()), mass)
    }

    /// Enclosed volume.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let c = self.average_point_local();
        let mut six_volume = 0.0;
        for face in &self.faces {
            let a = self.vertices[face[0]] - c;
            for k in 1..face.len() - 1 {
                let b = self.vertices[face[k]] - c;
                let d = self.vertices[face[k + 1]] - c;
                six_volume += a.dot(&b.cross(&d));
            }
        }
        (six_volume / 6.0).abs()
    }

    /// Whether a local point is inside or on the surface.
    #[must_use]
    pub fn point_is_inside(&self, point: &Vec3) -> bool {
        self.faces.iter().zip(&self.face_normals).all(|(face, n)| {
            n.dot(&(point - self.vertices[face[0]])) <= 0.0
        })
    }

    /// Interval `(min, max)` of the posed polyhedron projected on a world axis.
    #[must_use]
    pub fn project(&self, axis: &Vec3, position: &Vec3, quaternion: &Quat) -> (f64, f64) {
        let local_axis = quaternion.inverse_transform_vector(axis);
        let add = position.dot(axis);
        let mut min = f64::MAX;
        let mut max = -f64::MAX;
        for v in &self.vertices {
            let val = v.dot(&local_axis);
            min = min.min(val);
            max = max.max(val);
        }
        (min + add, max + add)
    }

    /// Overlap depth of the two posed hulls along `axis`, or `None` if the
    /// axis separates them. Projections that only touch count as separated.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn test_separating_axis(
        &self,
        other: &Self,
        pos_a: &Vec3,
        quat_a: &Quat,
        pos_b: &Vec3,
        quat_b: &Quat,
        axis: &Vec3,
    ) -> Option<f64> {
        let (min_a, max_a) = self.project(axis, pos_a, quat_a);
        let (min_b, max_b) = other.project(axis, pos_b, quat_b);
        if max_a <= min_b || max_b <= min_a {
            return None;
        }
        let d0 = max_a - min_b;
        let d1 = max_b - min_a;
        Some(d0.min(d1))
    }

    /// Axis of minimum penetration between the two posed hulls, pointing
    /// from B towards A. Returns `None` if some axis separates them.
    #[must_use]
    pub fn find_separating_axis(
        &self,
        other: &Self,
        pos_a: &Vec3,
        quat_a: &Quat,
        pos_b: &Vec3,
        quat_b: &Quat,
    ) -> Option<Vec3> {
        let mut best: Option<(f64, Vec3)> = None;
        let mut consider = |axis: Vec3| -> bool {
            match self.test_separating_axis(other, pos_a, quat_a, pos_b, quat_b, &axis) {
                None => false,
                Some(depth) => {
                    if best.map_or(true, |(d, _)| depth < d) {
                        best = Some((depth, axis));
                    }
                    true
                }
            }
        };

        let axes_a = self.unique_axes.as_deref().unwrap_or(&self.face_normals);
        for n in axes_a {
            if !consider(quat_a * n) {
                return None;
            }
        }
        let axes_b = other.unique_axes.as_deref().unwrap_or(&other.face_normals);
        for n in axes_b {
            if !consider(quat_b * n) {
                return None;
            }
        }

        for e0 in &self.unique_edges {
            let world_edge0 = quat_a * e0;
            for e1 in &other.unique_edges {
                let cross = world_edge0.cross(&(quat_b * e1));
                if cross.almost_zero(ALMOST_EPSILON) {
                    continue;
                }
                if !consider(cross.normalize()) {
                    return None;
                }
            }
        }

        let (_, mut target) = best?;
        if (pos_b - pos_a).dot(&target) > 0.0 {
            target = -target;
        }
        Some(target)
    }

    /// Clip B's face most aligned with `separating_normal` against this hull.
    ///
    /// `separating_normal` must point from B towards A, as returned by
    /// [`find_separating_axis`](Self::find_separating_axis).
    #[allow(clippy::too_many_arguments)]
    pub fn clip_against_hull(
        &self,
        pos_a: &Vec3,
        quat_a: &Quat,
        hull_b: &Self,
        pos_b: &Vec3,
        quat_b: &Quat,
        separating_normal: &Vec3,
        min_dist: f64,
        max_dist: f64,
        out: &mut Vec<ClipPoint>,
    ) {
        let mut closest = None;
        let mut dmax = -f64::MAX;
        for (i, n) in hull_b.face_normals.iter().enumerate() {
            let d = (quat_b * n).dot(separating_normal);
            if d > dmax {
                dmax = d;
                closest = Some(i);
            }
        }
        let Some(face_b) = closest else {
            return;
        };

        let world_verts_b: ClipPolygon = hull_b.faces[face_b]
            .iter()
            .map(|&i| quat_b * hull_b.vertices[i] + pos_b)
            .collect();

        self.clip_face_against_hull(
            separating_normal,
            pos_a,
            quat_a,
            &world_verts_b,
            min_dist,
            max_dist,
            out,
        );
    }

    /// Clip a world-space polygon against the reference face of this hull
    /// (the face most anti-parallel to `separating_normal`) and the planes of
    /// the faces around it, then keep the points at or below the reference face.
    #[allow(clippy::too_many_arguments)]
    pub fn clip_face_against_hull(
        &self,
        separating_normal: &Vec3,
        pos_a: &Vec3,
        quat_a: &Quat,
        world_verts_b: &[Vec3],
        min_dist: f64,
        max_dist: f64,
        out: &mut Vec<ClipPoint>,
    ) {
        let mut closest = None;
        let mut dmin = f64::MAX;
        for (i, n) in self.face_normals.iter().enumerate() {
            let d = (quat_a * n).dot(separating_normal);
            if d < dmin {
                dmin = d;
                closest = Some(i);
            }
        }
        let Some(ref_face) = closest else {
            return;
        };

        let face = &self.faces[ref_face];
        let mut polygon: ClipPolygon = world_verts_b.iter().copied().collect();

        for k in 0..face.len() {
            let a = self.vertices[face[k]];
            let b = self.vertices[face[(k + 1) % face.len()]];

            let local_normal = match self.edge_neighbor(ref_face, k) {
                Some(adjacent) => self.face_normals[adjacent],
                None => (b - a).cross(&self.face_normals[ref_face]).normalize(),
            };
            let plane_normal = quat_a * local_normal;
            let plane_point = quat_a * a + pos_a;
            let plane_constant = -plane_normal.dot(&plane_point);

            polygon = Self::clip_face_against_plane(&polygon, &plane_normal, plane_constant);
            if polygon.is_empty() {
                return;
            }
        }

        let ref_normal = quat_a * self.face_normals[ref_face];
        let ref_point = quat_a * self.vertices[face[0]] + pos_a;
        let ref_constant = -ref_normal.dot(&ref_point);

        for point in polygon {
            let mut depth = ref_normal.dot(&point) + ref_constant;
            if depth <= min_dist {
                depth = min_dist;
            }
            if depth <= max_dist && depth <= CLIP_DEPTH_TOLERANCE {
                out.push(ClipPoint {
                    point,
                    normal: ref_normal,
                    depth,
                });
            }
        }
    }

    /// Sutherland-Hodgman step: keep the part of `input` on the negative side
    /// of the plane `n . x + d = 0`.
    #[must_use]
    pub fn clip_face_against_plane(
        input: &[Vec3],
        plane_normal: &Vec3,
        plane_constant: f64,
    ) -> ClipPolygon {
        let mut out = ClipPolygon::new();
        let Some(&last_vertex) = input.last() else {
            return out;
        };
        if input.len() < 2 {
            return out;
        }

        let mut first = last_vertex;
        let mut n_dot_first = plane_normal.dot(&first) + plane_constant;
        for &last in input {
            let n_dot_last = plane_normal.dot(&last) + plane_constant;
            if n_dot_first < 0.0 {
                if n_dot_last < 0.0 {
                    out.push(last);
                } else {
                    out.push(first.lerp(&last, n_dot_first / (n_dot_first - n_dot_last)));
                }
            } else if n_dot_last < 0.0 {
                out.push(first.lerp(&last, n_dot_first / (n_dot_first - n_dot_last)));
                out.push(last);
            }
            first = last;
            n_dot_first = n_dot_last;
        }
        out
    }

    /// Closest point on face `face_index` to a local point.
    #[must_use]
    pub fn closest_point_on_face(&self, face_index: usize, point: &Vec3) -> Vec3 {
        let face = &self.faces[face_index];
        let n = self.face_normals[face_index];
        let v0 = self.vertices[face[0]];
        let projected = point - n * n.dot(&(point - v0));

        let inside = (0..face.len()).all(|k| {
            let a = self.vertices[face[k]];
            let b = self.vertices[face[(k + 1) % face.len()]];
            (b - a).cross(&(projected - a)).dot(&n) >= 0.0
        });
        if inside {
            return projected;
        }

        let mut best = v0;
        let mut best_dist = f64::MAX;
        for k in 0..face.len() {
            let a = self.vertices[face[k]];
            let b = self.vertices[face[(k + 1) % face.len()]];
            let candidate = closest_point_on_segment(&a, &b, point);
            let dist = (candidate - point).norm_squared();
            if dist < best_dist {
                best_dist = dist;
                best = candidate;
            }
        }
        best
    }

    /// Closest surface point to a local point.
    ///
    /// For a point inside the hull this is the projection onto the nearest
    /// face plane.
    #[must_use]
    pub fn closest_surface_point(&self, point: &Vec3) -> SurfacePoint {
        let mut max_signed = -f64::MAX;
        let mut max_face = 0;
        for (i, (face, n)) in self.faces.iter().zip(&self.face_normals).enumerate() {
            let s = n.dot(&(point - self.vertices[face[0]]));
            if s > max_signed {
                max_signed = s;
                max_face = i;
            }
        }

        if max_signed <= 0.0 {
            return SurfacePoint {
                point: point - self.face_normals[max_face] * max_signed,
                face: max_face,
                inside: true,
            };
        }

        let mut best = SurfacePoint {
            point: *point,
            face: 0,
            inside: false,
        };
        let mut best_dist = f64::MAX;
        for i in 0..self.faces.len() {
            let candidate = self.closest_point_on_face(i, point);
            let dist = (candidate - point).norm_squared();
            if dist < best_dist {
                best_dist = dist;
                best = SurfacePoint {
                    point: candidate,
                    face: i,
                    inside: false,
                };
            }
        }
        best
    }
}

/// Closest point to `p` on the segment `a -> b`.
#[must_use]
pub fn closest_point_on_segment(a: &Vec3, b: &Vec3, p: &Vec3) -> Vec3 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= f64::EPSILON {
        return *a;
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// Principal moments of a solid box with the given half extents.
#[must_use]
pub fn box_inertia(half_extents: &Vec3, mass: f64) -> Vec3 {
    let e = half_extents * 2.0;
    Vec3::new(
        mass / 12.0 * (e.y * e.y + e.z * e.z),
        mass / 12.0 * (e.x * e.x + e.z * e.z),
        mass / 12.0 * (e.y * e.y + e.x * e.x),
    )
}

fn newell_normal(vertices: &[Vec3], face: &[usize]) -> Vec3 {
    let mut n = Vec3::zeros();
    for k in 0..face.len() {
        let a = vertices[face[k]];
        let b = vertices[face[(k + 1) % face.len()]];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

fn compute_unique_edges(vertices: &[Vec3], faces: &[Face]) -> Vec<Vec3> {
    let mut edges: Vec<Vec3> = Vec::new();
    for face in faces {
        for k in 0..face.len() {
            let edge = vertices[face[(k + 1) % face.len()]] - vertices[face[k]];
            let len = edge.norm();
            if len < 1e-12 {
                continue;
            }
            let edge = edge / len;
            let known = edges.iter().any(|e| {
                e.almost_equals(&edge, ALMOST_EPSILON) || e.is_anti_parallel_to(&edge, ALMOST_EPSILON)
            });
            if !known {
                edges.push(edge);
            }
        }
    }
    edges
}

fn compute_edge_neighbors(faces: &[Face]) -> Vec<SmallVec<[Option<usize>; 4]>> {
    faces
        .iter()
        .enumerate()
        .map(|(fi, face)| {
            (0..face.len())
                .map(|k| {
                    let a = face[k];
                    let b = face[(k + 1) % face.len()];
                    faces.iter().enumerate().find_map(|(gi, other)| {
                        (gi != fi && other.contains(&a) && other.contains(&b)).then_some(gi)
                    })
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::BoxShape;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    fn unit_cube() -> ConvexPolyhedron {
        BoxShape::new(Vec3::repeat(0.5)).unwrap().convex().clone()
    }

    fn tetrahedron() -> ConvexPolyhedron {
        ConvexPolyhedron::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            vec![vec![0, 2, 1], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_cube_derived_data() {
        let cube = unit_cube();
        assert_eq!(cube.faces().len(), 6);
        assert_eq!(cube.unique_edges().len(), 3);
        assert_relative_eq!(cube.volume(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(cube.bounding_sphere_radius(), 0.75_f64.sqrt(), epsilon = 1e-12);
        for (face, n) in cube.faces().iter().zip(cube.face_normals()) {
            let c = face.iter().map(|&i| cube.vertices()[i]).sum::<Vec3>() / 4.0;
            assert_relative_eq!(c.normalize(), *n, epsilon = 1e-12);
        }
        for f in 0..6 {
            for e in 0..4 {
                assert!(cube.edge_neighbor(f, e).is_some());
            }
        }
    }

    #[test]
    fn test_inward_winding_is_fixed() {
        let tetra = ConvexPolyhedron::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            vec![vec![0, 1, 2], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]],
        )
        .unwrap();
        let centroid = tetra.average_point_local();
        for (face, n) in tetra.faces().iter().zip(tetra.face_normals()) {
            assert!(n.dot(&(tetra.vertices()[face[0]] - centroid)) > 0.0);
        }
        assert_relative_eq!(tetra.volume(), 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(tetrahedron().volume(), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_input_rejected() {
        assert!(ConvexPolyhedron::new(vec![Vec3::zeros(); 3], vec![]).is_err());
        let err = ConvexPolyhedron::new(
            vec![Vec3::zeros(), Vec3::x(), Vec3::y(), Vec3::z()],
            vec![vec![0, 1, 9], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]],
        )
        .unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_point_is_inside() {
        let cube = unit_cube();
        assert!(cube.point_is_inside(&Vec3::zeros()));
        assert!(cube.point_is_inside(&Vec3::new(0.5, 0.0, 0.0)));
        assert!(!cube.point_is_inside(&Vec3::new(0.6, 0.0, 0.0)));
    }

    #[test]
    fn test_separating_axis_for_disjoint_cubes() {
        let cube = unit_cube();
        let q = Quat::identity();
        let axis = cube.find_separating_axis(
            &cube,
            &Vec3::zeros(),
            &q,
            &Vec3::new(1.5, 0.0, 0.0),
            &q,
        );
        assert!(axis.is_none());
    }

    #[test]
    fn test_touching_cubes_are_separated() {
        let cube = unit_cube();
        let q = Quat::identity();
        let pos_b = Vec3::new(0.0, 0.0, 1.0);
        assert!(cube
            .test_separating_axis(&cube, &Vec3::zeros(), &q, &pos_b, &q, &Vec3::z())
            .is_none());
        assert!(cube
            .find_separating_axis(&cube, &Vec3::zeros(), &q, &pos_b, &q)
            .is_none());
    }

    #[test]
    fn test_clip_keeps_points_within_tolerance() {
        let cube = unit_cube();
        let q = Quat::identity();
        let square = |z: f64| {
            [
                Vec3::new(-0.25, -0.25, z),
                Vec3::new(0.25, -0.25, z),
                Vec3::new(0.25, 0.25, z),
                Vec3::new(-0.25, 0.25, z),
            ]
        };

        let mut out = Vec::new();
        let jittered = square(0.5 + 0.5 * CLIP_DEPTH_TOLERANCE);
        cube.clip_face_against_hull(&-Vec3::z(), &Vec3::zeros(), &q, &jittered, -100.0, 100.0, &mut out);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|p| p.depth > 0.0));

        out.clear();
        let above = square(0.5 + 1e-3);
        cube.clip_face_against_hull(&-Vec3::z(), &Vec3::zeros(), &q, &above, -100.0, 100.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_stacked_cubes_clip_to_four_points() {
        let cube = unit_cube();
        let q = Quat::identity();
        let pos_a = Vec3::zeros();
        let pos_b = Vec3::new(0.0, 0.0, 0.9);

        let axis = cube
            .find_separating_axis(&cube, &pos_a, &q, &pos_b, &q)
            .unwrap();
        assert_relative_eq!(axis, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-12);

        let mut out = Vec::new();
        cube.clip_against_hull(&pos_a, &q, &cube, &pos_b, &q, &axis, -100.0, 100.0, &mut out);
        assert_eq!(out.len(), 4);
        for p in &out {
            assert_relative_eq!(p.depth, -0.1, epsilon = 1e-9);
            assert_relative_eq!(p.normal, Vec3::z(), epsilon = 1e-12);
            assert_relative_eq!(p.point.z, 0.4, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rotated_cube_on_cube() {
        let cube = unit_cube();
        let qa = Quat::identity();
        let qb = Quat::from_axis_angle(&Vec3::z_axis(), FRAC_PI_4);
        let pos_b = Vec3::new(0.0, 0.0, 0.95);

        let axis = cube
            .find_separating_axis(&cube, &Vec3::zeros(), &qa, &pos_b, &qb)
            .unwrap();
        let mut out = Vec::new();
        cube.clip_against_hull(&Vec3::zeros(), &qa, &cube, &pos_b, &qb, &axis, -100.0, 100.0, &mut out);

        // The rotated square's corners stick out of A's top face, so the
        // clipped manifold is an octagon.
        assert_eq!(out.len(), 8);
        assert!(out.iter().all(|p| p.depth <= CLIP_DEPTH_TOLERANCE));
    }

    #[test]
    fn test_clip_face_against_plane() {
        let square = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ];
        let clipped = ConvexPolyhedron::clip_face_against_plane(&square, &Vec3::x(), 0.0);
        assert_eq!(clipped.len(), 4);
        assert!(clipped.iter().all(|p| p.x <= 1e-12));

        let none = ConvexPolyhedron::clip_face_against_plane(&square, &Vec3::x(), 2.0);
        assert!(none.is_empty());
    }

    #[test]
    fn test_closest_surface_point() {
        let cube = unit_cube();
        let outside = cube.closest_surface_point(&Vec3::new(2.0, 0.0, 0.0));
        assert!(!outside.inside);
        assert_relative_eq!(outside.point, Vec3::new(0.5, 0.0, 0.0), epsilon = 1e-12);

        let corner = cube.closest_surface_point(&Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(corner.point, Vec3::repeat(0.5), epsilon = 1e-12);

        let inside = cube.closest_surface_point(&Vec3::new(0.0, 0.0, 0.4));
        assert!(inside.inside);
        assert_relative_eq!(inside.point, Vec3::new(0.0, 0.0, 0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_projection() {
        let cube = unit_cube();
        let (min, max) = cube.project(&Vec3::x(), &Vec3::new(3.0, 0.0, 0.0), &Quat::identity());
        assert_relative_eq!(min, 2.5);
        assert_relative_eq!(max, 3.5);
    }
}
