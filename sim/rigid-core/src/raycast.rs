//! Ray casting against bodies.
//!
//! A [`Ray`] is a world segment `from -> to` with filtering options. The
//! world narrows candidates with a broadphase AABB query and then hands
//! them to [`Ray::intersect_bodies`], which walks every shape of every
//! candidate and reports hits into a [`RaycastResult`].
//!
//! # Supported Shapes
//!
//! - Sphere: analytic quadratic, both crossings reported
//! - Plane: segment-plane crossing
//! - Box, `ConvexPolyhedron`, Cylinder: per-face plane hit plus a point in
//!   polygon test
//! - `Heightfield`: the cell pillars under the ray's local bounding box
//! - `Trimesh`: octree candidates along the segment, then Möller–Trumbore
//!
//! Particles have no extent and are never hit.
//!
//! # Modes
//!
//! | Mode      | Behavior                                         |
//! |-----------|--------------------------------------------------|
//! | `Closest` | keep the hit nearest to `from`                   |
//! | `Any`     | stop at the first hit                            |
//! | `All`     | call back on every hit until the callback aborts |

// Allow many_single_char_names - standard notation for Möller-Trumbore
#![allow(clippy::many_single_char_names)]

use rigid_shapes::{ConvexPolyhedron, Heightfield, Plane, Shape, ShapeGeometry, Trimesh};
use rigid_types::math::{Quat, Vec3};
use rigid_types::{Aabb, BodyId, ShapeId, Transform};
use smallvec::SmallVec;

use crate::body::Body;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What to do with the hits along a ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RayMode {
    /// Keep the nearest hit.
    #[default]
    Closest,
    /// Stop at the first hit found.
    Any,
    /// Report every hit.
    All,
}

/// A world-space segment with query options.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ray {
    /// Start point.
    pub from: Vec3,
    /// End point.
    pub to: Vec3,
    /// Hit handling.
    pub mode: RayMode,
    /// Ignore faces whose normal points along the ray.
    pub skip_backfaces: bool,
    /// Ignore bodies and shapes with collision response turned off.
    pub check_collision_response: bool,
    /// Filter group tested against body and shape masks.
    pub collision_filter_group: u32,
    /// Filter mask tested against body and shape groups.
    pub collision_filter_mask: u32,
    /// Tolerance for parallel rays and polygon edges.
    pub precision: f64,
}

impl Ray {
    /// Ray from `from` to `to` with default options.
    #[must_use]
    pub fn new(from: Vec3, to: Vec3) -> Self {
        Self {
            from,
            to,
            mode: RayMode::Closest,
            skip_backfaces: false,
            check_collision_response: true,
            collision_filter_group: u32::MAX,
            collision_filter_mask: u32::MAX,
            precision: 1e-4,
        }
    }

    /// Set the hit mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RayMode) -> Self {
        self.mode = mode;
        self
    }

    /// Skip faces whose normal points along the ray.
    #[must_use]
    pub fn with_skip_backfaces(mut self, skip: bool) -> Self {
        self.skip_backfaces = skip;
        self
    }

    /// Set the collision filter group and mask.
    #[must_use]
    pub fn with_collision_filter(mut self, group: u32, mask: u32) -> Self {
        self.collision_filter_group = group;
        self.collision_filter_mask = mask;
        self
    }

    /// Whether to skip bodies and shapes that do not respond to collisions.
    #[must_use]
    pub fn with_check_collision_response(mut self, check: bool) -> Self {
        self.check_collision_response = check;
        self
    }

    /// Segment length.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.to - self.from).norm()
    }

    /// Unit direction, or zero for a degenerate ray.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        (self.to - self.from)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vec3::zeros)
    }

    /// World bounding box of the segment.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points([self.from, self.to].iter(), None, 0.0)
    }

    /// Intersect the bodies at `candidates` (slots into `bodies`).
    ///
    /// `on_hit` is called for every hit in [`RayMode::All`] and may call
    /// [`RaycastResult::abort`]. Returns whether anything was hit.
    pub fn intersect_bodies<F>(
        &self,
        bodies: &[Body],
        candidates: &[usize],
        result: &mut RaycastResult,
        mut on_hit: F,
    ) -> bool
    where
        F: FnMut(&mut RaycastResult),
    {
        result.reset(self);
        let direction = self.direction();
        let length = self.length();
        if length <= 0.0 {
            return false;
        }
        let mut cast = Cast {
            ray: self,
            direction,
            length,
            result,
            on_hit: &mut on_hit,
            triangles: Vec::new(),
        };
        for &slot in candidates {
            let Some(body) = bodies.get(slot) else {
                continue;
            };
            cast.body(body);
            if cast.result.should_stop {
                break;
            }
        }
        cast.result.has_hit
    }

    fn accepts(&self, group: u32, mask: u32, response: bool) -> bool {
        group & self.collision_filter_mask != 0
            && self.collision_filter_group & mask != 0
            && (response || !self.check_collision_response)
    }
}

/// Outcome of a ray query.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RaycastResult {
    /// Ray start.
    pub ray_from_world: Vec3,
    /// Ray end.
    pub ray_to_world: Vec3,
    /// Surface normal at the hit.
    pub hit_normal_world: Vec3,
    /// Hit point.
    pub hit_point_world: Vec3,
    /// Whether anything was hit.
    pub has_hit: bool,
    /// Shape that was hit.
    pub shape: Option<ShapeId>,
    /// Body that was hit.
    pub body: Option<BodyId>,
    /// Face or triangle index, for polyhedra and meshes.
    pub hit_face_index: Option<usize>,
    /// Distance from `ray_from_world` to the hit point.
    pub distance: f64,
    /// Set to end the query early.
    pub should_stop: bool,
}

impl Default for RaycastResult {
    fn default() -> Self {
        Self {
            ray_from_world: Vec3::zeros(),
            ray_to_world: Vec3::zeros(),
            hit_normal_world: Vec3::zeros(),
            hit_point_world: Vec3::zeros(),
            has_hit: false,
            shape: None,
            body: None,
            hit_face_index: None,
            distance: -1.0,
            should_stop: false,
        }
    }
}

impl RaycastResult {
    /// Empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the query after the current hit.
    pub fn abort(&mut self) {
        self.should_stop = true;
    }

    fn reset(&mut self, ray: &Ray) {
        *self = Self {
            ray_from_world: ray.from,
            ray_to_world: ray.to,
            ..Self::default()
        };
    }
}

/// Everything one hit carries.
struct Hit {
    point: Vec3,
    normal: Vec3,
    face: Option<usize>,
}

struct Cast<'r, F> {
    ray: &'r Ray,
    direction: Vec3,
    length: f64,
    result: &'r mut RaycastResult,
    on_hit: &'r mut F,
    triangles: Vec<usize>,
}

impl<F: FnMut(&mut RaycastResult)> Cast<'_, F> {
    fn body(&mut self, body: &Body) {
        if !self.ray.accepts(
            body.collision_filter_group,
            body.collision_filter_mask,
            body.collision_response,
        ) {
            return;
        }
        for attached in body.shapes() {
            let shape = &attached.shape;
            if !self.ray.accepts(
                shape.collision_filter_group,
                shape.collision_filter_mask,
                shape.collision_response,
            ) {
                continue;
            }
            let frame = body.shape_transform(attached);
            if self.distance_to_line(&frame.position) > shape.bounding_sphere_radius() {
                continue;
            }
            self.shape(body.id(), shape, &frame);
            if self.result.should_stop {
                return;
            }
        }
    }

    fn distance_to_line(&self, point: &Vec3) -> f64 {
        let rel = point - self.ray.from;
        (rel - self.direction * rel.dot(&self.direction)).norm()
    }

    fn shape(&mut self, body: BodyId, shape: &Shape, frame: &Transform) {
        let mut hits: Vec<Hit> = Vec::new();
        match &shape.geometry {
            ShapeGeometry::Sphere(s) => self.sphere(&frame.position, s.radius, &mut hits),
            ShapeGeometry::Plane(_) => self.plane(frame, &mut hits),
            ShapeGeometry::Box(b) => self.convex(b.convex(), frame, &mut hits),
            ShapeGeometry::ConvexPolyhedron(hull) => self.convex(hull, frame, &mut hits),
            ShapeGeometry::Cylinder(c) => self.convex(c.convex(), frame, &mut hits),
            ShapeGeometry::Heightfield(hf) => self.heightfield(hf, frame, &mut hits),
            ShapeGeometry::Trimesh(mesh) => self.trimesh(mesh, frame, &mut hits),
            ShapeGeometry::Particle(_) => {}
        }
        for hit in hits {
            self.report(body, shape.id, hit);
            if self.result.should_stop {
                return;
            }
        }
    }

    /// Record one hit according to the ray mode.
    fn report(&mut self, body: BodyId, shape: ShapeId, hit: Hit) {
        if self.ray.skip_backfaces && hit.normal.dot(&self.direction) > 0.0 {
            return;
        }
        let distance = (hit.point - self.ray.from).norm();
        if self.ray.mode == RayMode::Closest && self.result.has_hit && distance >= self.result.distance
        {
            return;
        }
        self.result.hit_point_world = hit.point;
        self.result.hit_normal_world = hit.normal;
        self.result.hit_face_index = hit.face;
        self.result.distance = distance;
        self.result.body = Some(body);
        self.result.shape = Some(shape);
        self.result.has_hit = true;
        match self.ray.mode {
            RayMode::Closest => {}
            RayMode::Any => self.result.should_stop = true,
            RayMode::All => (self.on_hit)(&mut *self.result),
        }
    }

    fn on_segment(&self, t: f64) -> bool {
        (0.0..=self.length).contains(&t)
    }

    fn sphere(&self, center: &Vec3, radius: f64, hits: &mut Vec<Hit>) {
        let oc = self.ray.from - center;
        let b = oc.dot(&self.direction);
        let c = oc.norm_squared() - radius * radius;
        let discriminant = b * b - c;
        if !(discriminant >= 0.0) {
            return;
        }
        let root = discriminant.sqrt();
        let roots = if root == 0.0 {
            [Some(-b), None]
        } else {
            [Some(-b - root), Some(-b + root)]
        };
        for t in roots.into_iter().flatten() {
            if !self.on_segment(t) {
                continue;
            }
            let point = self.ray.from + self.direction * t;
            let normal = (point - center)
                .try_normalize(f64::EPSILON)
                .unwrap_or(-self.direction);
            hits.push(Hit {
                point,
                normal,
                face: None,
            });
        }
    }

    fn plane(&self, frame: &Transform, hits: &mut Vec<Hit>) {
        let normal = Plane::world_normal(&frame.quaternion);
        let denom = normal.dot(&self.direction);
        if denom.abs() < self.ray.precision {
            return;
        }
        let t = (frame.position - self.ray.from).dot(&normal) / denom;
        if !self.on_segment(t) {
            return;
        }
        hits.push(Hit {
            point: self.ray.from + self.direction * t,
            normal,
            face: None,
        });
    }

    /// Nearest face crossing of a convex hull.
    fn convex(&self, hull: &ConvexPolyhedron, frame: &Transform, hits: &mut Vec<Hit>) {
        if let Some(hit) = self.convex_hit(hull, &frame.position, &frame.quaternion) {
            hits.push(hit);
        }
    }

    fn convex_hit(&self, hull: &ConvexPolyhedron, position: &Vec3, quaternion: &Quat) -> Option<Hit> {
        let mut best: Option<(f64, Hit)> = None;
        for (i, face) in hull.faces().iter().enumerate() {
            let normal = quaternion * hull.face_normals()[i];
            let denom = normal.dot(&self.direction);
            if denom.abs() < self.ray.precision {
                continue;
            }
            if self.ray.skip_backfaces && denom > 0.0 {
                continue;
            }
            let on_face = position + quaternion * hull.vertices()[face[0]];
            let t = (on_face - self.ray.from).dot(&normal) / denom;
            if !self.on_segment(t) || best.as_ref().is_some_and(|(d, _)| t >= *d) {
                continue;
            }
            let point = self.ray.from + self.direction * t;
            let corners: SmallVec<[Vec3; 8]> = face
                .iter()
                .map(|&v| position + quaternion * hull.vertices()[v])
                .collect();
            if point_in_polygon(&point, &normal, &corners, self.ray.precision) {
                best = Some((
                    t,
                    Hit {
                        point,
                        normal,
                        face: Some(i),
                    },
                ));
            }
        }
        best.map(|(_, hit)| hit)
    }

    fn heightfield(&self, hf: &Heightfield, frame: &Transform, hits: &mut Vec<Hit>) {
        let local_from = frame.point_to_local_frame(&self.ray.from);
        let local_to = frame.point_to_local_frame(&self.ray.to);
        let local = Aabb::from_points([local_from, local_to].iter(), None, 0.0);
        if local.lower_bound.z > hf.max_value() {
            return;
        }
        let Some(range) = hf.cell_range_for_aabb(&local) else {
            return;
        };
        let mut best: Option<(f64, Hit)> = None;
        for (xi, yi) in range.cells() {
            if !hf.aabb_at_index(xi, yi).overlaps(&local) {
                continue;
            }
            for upper in [false, true] {
                let Ok(pillar) = hf.convex_triangle_pillar(xi, yi, upper) else {
                    continue;
                };
                let origin = frame.point_to_world_frame(&pillar.offset);
                if let Some(hit) = self.convex_hit(&pillar.convex, &origin, &frame.quaternion) {
                    let distance = (hit.point - self.ray.from).norm();
                    if best.as_ref().map_or(true, |(d, _)| distance < *d) {
                        best = Some((distance, Hit { face: None, ..hit }));
                    }
                }
            }
        }
        hits.extend(best.map(|(_, hit)| hit));
    }

    fn trimesh(&mut self, mesh: &Trimesh, frame: &Transform, hits: &mut Vec<Hit>) {
        self.triangles.clear();
        mesh.triangles_along_segment(&self.ray.from, &self.ray.to, frame, &mut self.triangles);
        self.triangles.sort_unstable();
        self.triangles.dedup();
        for &t in &self.triangles {
            let [a, b, c] = mesh
                .triangle_vertices(t)
                .map(|v| frame.point_to_world_frame(&v));
            let Some(distance) =
                ray_triangle_intersection(&self.ray.from, &self.direction, &a, &b, &c)
            else {
                continue;
            };
            if !self.on_segment(distance) {
                continue;
            }
            let Some(normal) = (b - a).cross(&(c - a)).try_normalize(f64::EPSILON) else {
                continue;
            };
            hits.push(Hit {
                point: self.ray.from + self.direction * distance,
                normal,
                face: Some(t),
            });
        }
        hits.sort_by(|x, y| {
            let dx = (x.point - self.ray.from).norm_squared();
            let dy = (y.point - self.ray.from).norm_squared();
            dx.total_cmp(&dy)
        });
    }
}

/// Whether `point`, on the plane of a convex polygon with `normal`, lies
/// inside it. Corners run counter-clockwise about `normal`.
fn point_in_polygon(point: &Vec3, normal: &Vec3, corners: &[Vec3], tolerance: f64) -> bool {
    let Some(mut prev) = corners.last().copied() else {
        return false;
    };
    for &corner in corners {
        let edge = corner - prev;
        if edge.cross(&(point - prev)).dot(normal) < -tolerance * edge.norm() {
            return false;
        }
        prev = corner;
    }
    true
}

/// Möller–Trumbore ray-triangle intersection. Returns the distance along
/// the unit `dir`, for hits from either side.
fn ray_triangle_intersection(origin: &Vec3, dir: &Vec3, v0: &Vec3, v1: &Vec3, v2: &Vec3) -> Option<f64> {
    const EPSILON: f64 = 1e-10;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = dir.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    Some(f * edge2.dot(&q))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cast(ray: &Ray, bodies: &[Body]) -> RaycastResult {
        let mut result = RaycastResult::new();
        let all: Vec<usize> = (0..bodies.len()).collect();
        ray.intersect_bodies(bodies, &all, &mut result, |_| {});
        result
    }

    fn at(shape: Shape, position: Vec3) -> Body {
        Body::fixed().with_shape(shape).with_position(position)
    }

    fn down_z(x: f64, y: f64) -> Ray {
        Ray::new(Vec3::new(x, y, 10.0), Vec3::new(x, y, -10.0))
    }

    #[test]
    fn test_sphere_closest_is_entry_point() {
        let bodies = vec![at(Shape::sphere(1.0).unwrap(), Vec3::zeros())];
        let result = cast(&down_z(0.0, 0.0), &bodies);
        assert!(result.has_hit);
        assert_relative_eq!(result.hit_point_world, Vec3::z(), epsilon = 1e-12);
        assert_relative_eq!(result.hit_normal_world, Vec3::z(), epsilon = 1e-12);
        assert_relative_eq!(result.distance, 9.0, epsilon = 1e-12);
        assert_eq!(result.body, Some(bodies[0].id()));
    }

    #[test]
    fn test_sphere_all_reports_both_crossings() {
        let bodies = vec![at(Shape::sphere(1.0).unwrap(), Vec3::zeros())];
        let ray = down_z(0.0, 0.0).with_mode(RayMode::All);
        let mut points = Vec::new();
        let mut result = RaycastResult::new();
        ray.intersect_bodies(&bodies, &[0], &mut result, |r| points.push(r.hit_point_world.z));
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(points[1], -1.0, epsilon = 1e-12);

        let front_only = down_z(0.0, 0.0)
            .with_mode(RayMode::All)
            .with_skip_backfaces(true);
        let mut count = 0;
        front_only.intersect_bodies(&bodies, &[0], &mut result, |_| count += 1);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_ray_stops_short_of_sphere() {
        let bodies = vec![at(Shape::sphere(1.0).unwrap(), Vec3::zeros())];
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, 2.0));
        assert!(!cast(&ray, &bodies).has_hit);
    }

    #[test]
    fn test_plane_hit_and_backface() {
        let bodies = vec![at(Shape::plane(), Vec3::zeros())];
        let result = cast(&down_z(3.0, -2.0), &bodies);
        assert!(result.has_hit);
        assert_relative_eq!(result.hit_point_world, Vec3::new(3.0, -2.0, 0.0), epsilon = 1e-12);

        let upward = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0))
            .with_skip_backfaces(true);
        assert!(!cast(&upward, &bodies).has_hit);

        let parallel = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(5.0, 0.0, 1.0));
        assert!(!cast(&parallel, &bodies).has_hit);
    }

    #[test]
    fn test_box_top_face() {
        let bodies = vec![at(Shape::cuboid(Vec3::new(1.0, 2.0, 0.5)).unwrap(), Vec3::new(0.0, 0.0, 1.0))];
        let result = cast(&down_z(0.5, 1.5), &bodies);
        assert!(result.has_hit);
        assert_relative_eq!(result.hit_point_world, Vec3::new(0.5, 1.5, 1.5), epsilon = 1e-12);
        assert_relative_eq!(result.hit_normal_world, Vec3::z(), epsilon = 1e-12);
        assert!(result.hit_face_index.is_some());

        assert!(!cast(&down_z(1.5, 0.0), &bodies).has_hit);
    }

    #[test]
    fn test_closest_picks_nearer_body() {
        let bodies = vec![
            at(Shape::sphere(0.5).unwrap(), Vec3::new(0.0, 0.0, -3.0)),
            at(Shape::sphere(0.5).unwrap(), Vec3::new(0.0, 0.0, 3.0)),
        ];
        let result = cast(&down_z(0.0, 0.0), &bodies);
        assert_eq!(result.body, Some(bodies[1].id()));
        assert_relative_eq!(result.hit_point_world.z, 3.5, epsilon = 1e-12);
    }

    #[test]
    fn test_any_stops_at_first_hit() {
        let bodies = vec![
            at(Shape::sphere(0.5).unwrap(), Vec3::new(0.0, 0.0, -3.0)),
            at(Shape::sphere(0.5).unwrap(), Vec3::new(0.0, 0.0, 3.0)),
        ];
        let ray = down_z(0.0, 0.0).with_mode(RayMode::Any);
        let result = cast(&ray, &bodies);
        assert!(result.has_hit);
        assert!(result.should_stop);
        assert_eq!(result.body, Some(bodies[0].id()));
    }

    #[test]
    fn test_abort_from_callback() {
        let bodies = vec![
            at(Shape::sphere(0.5).unwrap(), Vec3::new(0.0, 0.0, -3.0)),
            at(Shape::sphere(0.5).unwrap(), Vec3::new(0.0, 0.0, 3.0)),
        ];
        let ray = down_z(0.0, 0.0).with_mode(RayMode::All);
        let mut calls = 0;
        let mut result = RaycastResult::new();
        ray.intersect_bodies(&bodies, &[0, 1], &mut result, |r| {
            calls += 1;
            r.abort();
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_filters_and_response() {
        let ghost = at(Shape::sphere(1.0).unwrap(), Vec3::zeros()).with_collision_response(false);
        assert!(!cast(&down_z(0.0, 0.0), &[ghost.clone()]).has_hit);
        let ray = down_z(0.0, 0.0).with_check_collision_response(false);
        assert!(cast(&ray, &[ghost]).has_hit);

        let grouped = at(Shape::sphere(1.0).unwrap(), Vec3::zeros()).with_collision_filter(2, u32::MAX);
        let ray = down_z(0.0, 0.0).with_collision_filter(1, 1);
        assert!(!cast(&ray, &[grouped]).has_hit);
    }

    #[test]
    fn test_heightfield_surface() {
        let field = Shape::heightfield(vec![vec![1.0; 4]; 4], 1.0).unwrap();
        let bodies = vec![at(field, Vec3::zeros())];
        let result = cast(&down_z(1.3, 1.6), &bodies);
        assert!(result.has_hit);
        assert_relative_eq!(result.hit_point_world, Vec3::new(1.3, 1.6, 1.0), epsilon = 1e-9);
        assert_relative_eq!(result.hit_normal_world, Vec3::z(), epsilon = 1e-9);

        assert!(!cast(&down_z(7.0, 7.0), &bodies).has_hit);
    }

    #[test]
    fn test_trimesh_triangle() {
        let mesh = Shape::trimesh(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();
        let bodies = vec![at(mesh, Vec3::new(0.0, 0.0, 2.0))];
        let result = cast(&down_z(0.0, 0.0), &bodies);
        assert!(result.has_hit);
        assert_relative_eq!(result.hit_point_world, Vec3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
        assert_eq!(result.hit_face_index, Some(0));

        assert!(!cast(&down_z(0.9, 0.9), &bodies).has_hit);
    }

    #[test]
    fn test_particle_is_never_hit() {
        let bodies = vec![at(Shape::particle(), Vec3::zeros())];
        assert!(!cast(&down_z(0.0, 0.0), &bodies).has_hit);
    }
}
