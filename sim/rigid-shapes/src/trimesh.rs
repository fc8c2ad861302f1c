//! Triangle meshes.
//!
//! Vertices are stored unscaled; a per-mesh non-uniform [`scale`](Trimesh::scale)
//! is applied whenever a vertex is read. The octree indexes the unscaled
//! triangle boxes, so queries divide the query box by the scale first.

use std::f64::consts::TAU;

use hashbrown::HashSet;
use rigid_types::math::{Quat, Vec3};
use rigid_types::{Aabb, Result, RigidError, Transform};

use crate::convex::box_inertia;
use crate::octree::{Octree, DEFAULT_MAX_DEPTH};

/// An indexed triangle mesh.
#[derive(Debug, Clone)]
pub struct Trimesh {
    vertices: Vec<Vec3>,
    indices: Vec<[usize; 3]>,
    normals: Vec<Vec3>,
    edges: Vec<[usize; 2]>,
    scale: Vec3,
    aabb: Aabb,
    bounding_sphere_radius: f64,
    tree: Octree,
}

impl PartialEq for Trimesh {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices && self.indices == other.indices && self.scale == other.scale
    }
}

impl Trimesh {
    /// Build a mesh from vertices and counter-clockwise triangles.
    pub fn new(vertices: Vec<Vec3>, indices: Vec<[usize; 3]>) -> Result<Self> {
        if indices.is_empty() {
            return Err(RigidError::invalid_shape("trimesh has no triangles"));
        }
        if vertices.iter().any(|v| !v.iter().all(|c| c.is_finite())) {
            return Err(RigidError::invalid_shape("trimesh vertex is not finite"));
        }
        if let Some((t, tri)) = indices
            .iter()
            .enumerate()
            .find(|(_, tri)| tri.iter().any(|&i| i >= vertices.len()))
        {
            return Err(RigidError::invalid_shape(format!(
                "triangle {t} references {tri:?} but the mesh has {} vertices",
                vertices.len()
            )));
        }

        let mut mesh = Self {
            vertices,
            indices,
            normals: Vec::new(),
            edges: Vec::new(),
            scale: Vec3::repeat(1.0),
            aabb: Aabb::default(),
            bounding_sphere_radius: 0.0,
            tree: Octree::new(Aabb::default(), DEFAULT_MAX_DEPTH),
        };
        mesh.update_edges();
        mesh.update_derived();
        Ok(mesh)
    }

    /// A torus around local Z. `arc` limits the sweep around the main ring.
    pub fn torus(
        radius: f64,
        tube: f64,
        radial_segments: usize,
        tubular_segments: usize,
        arc: f64,
    ) -> Result<Self> {
        if radial_segments < 3 || tubular_segments < 3 {
            return Err(RigidError::invalid_shape("torus needs at least 3 segments each way"));
        }
        let mut vertices = Vec::with_capacity((radial_segments + 1) * (tubular_segments + 1));
        for j in 0..=radial_segments {
            for i in 0..=tubular_segments {
                let u = i as f64 / tubular_segments as f64 * arc;
                let v = j as f64 / radial_segments as f64 * TAU;
                let ring = radius + tube * v.cos();
                vertices.push(Vec3::new(ring * u.cos(), ring * u.sin(), tube * v.sin()));
            }
        }

        let stride = tubular_segments + 1;
        let mut indices = Vec::with_capacity(2 * radial_segments * tubular_segments);
        for j in 1..=radial_segments {
            for i in 1..=tubular_segments {
                let a = stride * j + i - 1;
                let b = stride * (j - 1) + i - 1;
                let c = stride * (j - 1) + i;
                let d = stride * j + i;
                indices.push([a, b, d]);
                indices.push([b, c, d]);
            }
        }
        Self::new(vertices, indices)
    }

    /// Non-uniform scale applied to every vertex.
    #[must_use]
    pub fn scale(&self) -> &Vec3 {
        &self.scale
    }

    /// Change the scale and rebuild normals, bounds and the octree.
    pub fn set_scale(&mut self, scale: Vec3) -> Result<()> {
        if scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(RigidError::invalid_shape(format!(
                "trimesh scale must be finite and non-zero, got {scale:?}"
            )));
        }
        self.scale = scale;
        self.update_derived();
        Ok(())
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Triangle vertex indices.
    #[must_use]
    pub fn indices(&self) -> &[[usize; 3]] {
        &self.indices
    }

    /// Unique undirected edges as vertex index pairs.
    #[must_use]
    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Scaled vertex in local coordinates.
    #[must_use]
    pub fn vertex(&self, i: usize) -> Vec3 {
        self.vertices[i].component_mul(&self.scale)
    }

    /// Scaled vertex in world coordinates.
    #[must_use]
    pub fn world_vertex(&self, i: usize, position: &Vec3, quaternion: &Quat) -> Vec3 {
        quaternion * self.vertex(i) + position
    }

    /// The three scaled corners of triangle `t`.
    #[must_use]
    pub fn triangle_vertices(&self, t: usize) -> [Vec3; 3] {
        self.indices[t].map(|i| self.vertex(i))
    }

    /// Local unit normal of triangle `t` (zero for a degenerate triangle).
    #[must_use]
    pub fn normal(&self, t: usize) -> &Vec3 {
        &self.normals[t]
    }

    /// Local bounds of the scaled mesh.
    #[must_use]
    pub fn local_aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// Distance from the local origin to the farthest scaled vertex.
    #[must_use]
    pub fn bounding_sphere_radius(&self) -> f64 {
        self.bounding_sphere_radius
    }

    /// Signed volume enclosed by the mesh (positive for outward winding).
    #[must_use]
    pub fn volume(&self) -> f64 {
        (0..self.indices.len())
            .map(|t| {
                let [a, b, c] = self.triangle_vertices(t);
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum()
    }

    /// Principal moments, from the local bounding box.
    #[must_use]
    pub fn calculate_local_inertia(&self, mass: f64) -> Vec3 {
        box_inertia(&self.aabb.half_extents(), mass)
    }

    /// Bounding box at a world pose.
    #[must_use]
    pub fn calculate_world_aabb(&self, position: &Vec3, quaternion: &Quat) -> Aabb {
        let mut aabb = Aabb::empty();
        for i in 0..self.vertices.len() {
            aabb.extend_point(&self.world_vertex(i, position, quaternion));
        }
        aabb
    }

    /// Append the triangles whose octree node overlaps a scaled local box.
    /// Candidates still need an exact test.
    pub fn triangles_in_aabb(&self, local: &Aabb, result: &mut Vec<usize>) {
        let a = local.lower_bound.component_div(&self.scale);
        let b = local.upper_bound.component_div(&self.scale);
        let unscaled = Aabb::from_points([a, b].iter(), None, 0.0);
        self.tree.aabb_query(&unscaled, result);
    }

    /// Append the triangles that may cross the world segment `from -> to`
    /// for a mesh posed at `frame`.
    pub fn triangles_along_segment(
        &self,
        from: &Vec3,
        to: &Vec3,
        frame: &Transform,
        result: &mut Vec<usize>,
    ) {
        let local = [frame.point_to_local_frame(from), frame.point_to_local_frame(to)];
        self.triangles_in_aabb(&Aabb::from_points(local.iter(), None, 0.0), result);
    }

    fn update_edges(&mut self) {
        let mut seen = HashSet::new();
        for tri in &self.indices {
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                seen.insert([a.min(b), a.max(b)]);
            }
        }
        let mut edges: Vec<[usize; 2]> = seen.into_iter().collect();
        edges.sort_unstable();
        self.edges = edges;
    }

    fn update_derived(&mut self) {
        self.normals = (0..self.indices.len())
            .map(|t| {
                let [a, b, c] = self.triangle_vertices(t);
                (b - a)
                    .cross(&(c - a))
                    .try_normalize(1e-12)
                    .unwrap_or_else(Vec3::zeros)
            })
            .collect();

        let mut aabb = Aabb::empty();
        let mut radius2: f64 = 0.0;
        for i in 0..self.vertices.len() {
            let v = self.vertex(i);
            aabb.extend_point(&v);
            radius2 = radius2.max(v.norm_squared());
        }
        self.aabb = aabb;
        self.bounding_sphere_radius = radius2.sqrt();

        let unscaled_root = Aabb::from_points(self.vertices.iter(), None, 0.0);
        self.tree.reset(unscaled_root);
        for (t, tri) in self.indices.iter().enumerate() {
            let tri_aabb = Aabb::from_points(tri.iter().map(|&i| &self.vertices[i]), None, 0.0);
            self.tree.insert(&tri_aabb, t);
        }
        self.tree.remove_empty_nodes();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Closed cube of half extent 1, two triangles per face.
    fn cube_mesh() -> Trimesh {
        let v = vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ];
        let quads = [
            [3, 2, 1, 0],
            [4, 5, 6, 7],
            [5, 4, 0, 1],
            [2, 3, 7, 6],
            [0, 4, 7, 3],
            [1, 2, 6, 5],
        ];
        let indices = quads
            .iter()
            .flat_map(|q| [[q[0], q[1], q[2]], [q[0], q[2], q[3]]])
            .collect();
        Trimesh::new(v, indices).unwrap()
    }

    #[test]
    fn test_cube_mesh_volume_and_edges() {
        let mesh = cube_mesh();
        assert_eq!(mesh.triangle_count(), 12);
        assert_relative_eq!(mesh.volume(), 8.0, epsilon = 1e-12);
        // 12 cube edges plus one diagonal per face.
        assert_eq!(mesh.edges().len(), 18);
        assert_relative_eq!(*mesh.normal(2), Vec3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_scale_rebuilds_bounds() {
        let mut mesh = cube_mesh();
        mesh.set_scale(Vec3::new(2.0, 1.0, 0.5)).unwrap();
        assert_relative_eq!(mesh.volume(), 8.0, epsilon = 1e-12);
        assert_eq!(mesh.local_aabb().upper_bound, Vec3::new(2.0, 1.0, 0.5));
        assert!(mesh.set_scale(Vec3::new(1.0, 0.0, 1.0)).is_err());
    }

    #[test]
    fn test_triangles_in_aabb_respects_scale() {
        let mut mesh = cube_mesh();
        mesh.set_scale(Vec3::repeat(3.0)).unwrap();

        let mut result = Vec::new();
        let top = Aabb::new(Vec3::new(-0.5, -0.5, 2.9), Vec3::new(0.5, 0.5, 3.1));
        mesh.triangles_in_aabb(&top, &mut result);
        assert!(result.contains(&2) && result.contains(&3));

        result.clear();
        let outside = Aabb::new(Vec3::repeat(10.0), Vec3::repeat(11.0));
        mesh.triangles_in_aabb(&outside, &mut result);
        assert!(result.is_empty());
    }

    #[test]
    fn test_segment_candidates() {
        let mesh = cube_mesh();
        let frame = Transform::from_position(Vec3::new(0.0, 0.0, 10.0));
        let mut result = Vec::new();
        mesh.triangles_along_segment(
            &Vec3::new(0.2, 0.2, 20.0),
            &Vec3::new(0.2, 0.2, 0.0),
            &frame,
            &mut result,
        );
        assert!(result.contains(&2));
    }

    #[test]
    fn test_torus_counts() {
        let torus = Trimesh::torus(1.0, 0.5, 8, 6, TAU).unwrap();
        assert_eq!(torus.vertex_count(), 9 * 7);
        assert_eq!(torus.triangle_count(), 2 * 8 * 6);
        assert_relative_eq!(torus.local_aabb().upper_bound.z, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let err = Trimesh::new(vec![Vec3::zeros(); 3], vec![[0, 1, 3]]).unwrap_err();
        assert!(err.is_shape_error());
    }
}
