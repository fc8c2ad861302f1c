//! The [`Shape`] wrapper shared by bodies, the narrowphase and ray casting.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rigid_types::math::{Quat, Vec3};
use rigid_types::{Aabb, Material, Result, ShapeId};

use crate::{BoxShape, ConvexPolyhedron, Cylinder, Heightfield, Particle, Plane, Sphere, Trimesh};

/// Shape kinds, ordered by collision dispatch priority.
///
/// A pair routine always receives the shape with the smaller tag first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeKind {
    /// [`Sphere`].
    Sphere,
    /// [`Plane`].
    Plane,
    /// [`BoxShape`].
    Box,
    /// [`ConvexPolyhedron`].
    ConvexPolyhedron,
    /// [`Heightfield`].
    Heightfield,
    /// [`Particle`].
    Particle,
    /// [`Cylinder`].
    Cylinder,
    /// [`Trimesh`].
    Trimesh,
}

impl ShapeKind {
    /// Bit tag; the dispatch key of a pair is the OR of both tags.
    #[must_use]
    pub const fn tag(self) -> u32 {
        match self {
            Self::Sphere => 1,
            Self::Plane => 2,
            Self::Box => 4,
            Self::ConvexPolyhedron => 16,
            Self::Heightfield => 32,
            Self::Particle => 64,
            Self::Cylinder => 128,
            Self::Trimesh => 256,
        }
    }
}

/// Geometry of a shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    /// A sphere.
    Sphere(Sphere),
    /// An infinite plane.
    Plane(Plane),
    /// A box.
    Box(BoxShape),
    /// A convex polyhedron.
    ConvexPolyhedron(ConvexPolyhedron),
    /// A heightfield.
    Heightfield(Heightfield),
    /// A point.
    Particle(Particle),
    /// A cylinder or cone.
    Cylinder(Cylinder),
    /// A triangle mesh.
    Trimesh(Trimesh),
}

/// A collision shape with its filtering and material settings.
///
/// The pose of a shape is owned by the body it is attached to.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Process-unique id.
    pub id: ShapeId,
    /// Geometry.
    pub geometry: ShapeGeometry,
    /// Group bits this shape belongs to.
    pub collision_filter_group: u32,
    /// Groups this shape collides with.
    pub collision_filter_mask: u32,
    /// Whether contacts generate a solver response. Without it contacts are
    /// still detected and reported.
    pub collision_response: bool,
    /// Optional per-shape material; overrides the body material.
    pub material: Option<Material>,
}

impl Shape {
    /// Wrap a geometry with default filtering (group 1, all mask bits).
    #[must_use]
    pub fn new(geometry: ShapeGeometry) -> Self {
        Self {
            id: ShapeId::next(),
            geometry,
            collision_filter_group: 1,
            collision_filter_mask: u32::MAX,
            collision_response: true,
            material: None,
        }
    }

    /// A sphere shape.
    pub fn sphere(radius: f64) -> Result<Self> {
        Ok(Self::new(ShapeGeometry::Sphere(Sphere::new(radius)?)))
    }

    /// A plane shape.
    #[must_use]
    pub fn plane() -> Self {
        Self::new(ShapeGeometry::Plane(Plane::new()))
    }

    /// A box shape.
    pub fn cuboid(half_extents: Vec3) -> Result<Self> {
        Ok(Self::new(ShapeGeometry::Box(BoxShape::new(half_extents)?)))
    }

    /// A convex polyhedron shape.
    pub fn convex(vertices: Vec<Vec3>, faces: Vec<Vec<usize>>) -> Result<Self> {
        Ok(Self::new(ShapeGeometry::ConvexPolyhedron(
            ConvexPolyhedron::new(vertices, faces)?,
        )))
    }

    /// A cylinder shape.
    pub fn cylinder(
        radius_top: f64,
        radius_bottom: f64,
        height: f64,
        segments: usize,
    ) -> Result<Self> {
        Ok(Self::new(ShapeGeometry::Cylinder(Cylinder::new(
            radius_top,
            radius_bottom,
            height,
            segments,
        )?)))
    }

    /// A heightfield shape.
    pub fn heightfield(data: Vec<Vec<f64>>, element_size: f64) -> Result<Self> {
        Ok(Self::new(ShapeGeometry::Heightfield(Heightfield::new(
            data,
            element_size,
        )?)))
    }

    /// A particle shape.
    #[must_use]
    pub fn particle() -> Self {
        Self::new(ShapeGeometry::Particle(Particle::new()))
    }

    /// A triangle mesh shape.
    pub fn trimesh(vertices: Vec<Vec3>, indices: Vec<[usize; 3]>) -> Result<Self> {
        Ok(Self::new(ShapeGeometry::Trimesh(Trimesh::new(vertices, indices)?)))
    }

    /// Set collision group and mask.
    #[must_use]
    pub fn with_collision_filter(mut self, group: u32, mask: u32) -> Self {
        self.collision_filter_group = group;
        self.collision_filter_mask = mask;
        self
    }

    /// Enable or disable the contact response.
    #[must_use]
    pub fn with_collision_response(mut self, response: bool) -> Self {
        self.collision_response = response;
        self
    }

    /// Attach a material.
    #[must_use]
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    /// The kind of geometry.
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match &self.geometry {
            ShapeGeometry::Sphere(_) => ShapeKind::Sphere,
            ShapeGeometry::Plane(_) => ShapeKind::Plane,
            ShapeGeometry::Box(_) => ShapeKind::Box,
            ShapeGeometry::ConvexPolyhedron(_) => ShapeKind::ConvexPolyhedron,
            ShapeGeometry::Heightfield(_) => ShapeKind::Heightfield,
            ShapeGeometry::Particle(_) => ShapeKind::Particle,
            ShapeGeometry::Cylinder(_) => ShapeKind::Cylinder,
            ShapeGeometry::Trimesh(_) => ShapeKind::Trimesh,
        }
    }

    /// The polyhedron behind a box, convex or cylinder shape.
    #[must_use]
    pub fn as_convex(&self) -> Option<&ConvexPolyhedron> {
        match &self.geometry {
            ShapeGeometry::Box(b) => Some(b.convex()),
            ShapeGeometry::ConvexPolyhedron(c) => Some(c),
            ShapeGeometry::Cylinder(c) => Some(c.convex()),
            _ => None,
        }
    }

    /// Radius of a sphere around the local origin enclosing the shape.
    #[must_use]
    pub fn bounding_sphere_radius(&self) -> f64 {
        match &self.geometry {
            ShapeGeometry::Sphere(s) => s.radius,
            ShapeGeometry::Plane(_) => f64::MAX,
            ShapeGeometry::Box(b) => b.bounding_sphere_radius(),
            ShapeGeometry::ConvexPolyhedron(c) => c.bounding_sphere_radius(),
            ShapeGeometry::Heightfield(h) => h.bounding_sphere_radius(),
            ShapeGeometry::Particle(_) => 0.0,
            ShapeGeometry::Cylinder(c) => c.convex().bounding_sphere_radius(),
            ShapeGeometry::Trimesh(t) => t.bounding_sphere_radius(),
        }
    }

    /// Enclosed volume. Planes and heightfields report `f64::MAX`.
    #[must_use]
    pub fn volume(&self) -> f64 {
        match &self.geometry {
            ShapeGeometry::Sphere(s) => s.volume(),
            ShapeGeometry::Plane(_) => f64::MAX,
            ShapeGeometry::Box(b) => b.volume(),
            ShapeGeometry::ConvexPolyhedron(c) => c.volume(),
            ShapeGeometry::Heightfield(h) => h.volume(),
            ShapeGeometry::Particle(_) => 0.0,
            ShapeGeometry::Cylinder(c) => c.volume(),
            ShapeGeometry::Trimesh(t) => t.volume().abs(),
        }
    }

    /// Principal moments of inertia for a given mass, about the shape origin.
    #[must_use]
    pub fn calculate_local_inertia(&self, mass: f64) -> Vec3 {
        match &self.geometry {
            ShapeGeometry::Sphere(s) => s.calculate_local_inertia(mass),
            ShapeGeometry::Plane(_) | ShapeGeometry::Heightfield(_) | ShapeGeometry::Particle(_) => {
                Vec3::zeros()
            }
            ShapeGeometry::Box(b) => b.calculate_local_inertia(mass),
            ShapeGeometry::ConvexPolyhedron(c) => c.calculate_local_inertia(mass),
            ShapeGeometry::Cylinder(c) => c.calculate_local_inertia(mass),
            ShapeGeometry::Trimesh(t) => t.calculate_local_inertia(mass),
        }
    }

    /// Bounding box at a world pose.
    #[must_use]
    pub fn calculate_world_aabb(&self, position: &Vec3, quaternion: &Quat) -> Aabb {
        match &self.geometry {
            ShapeGeometry::Sphere(s) => s.calculate_world_aabb(position, quaternion),
            ShapeGeometry::Plane(p) => p.calculate_world_aabb(position, quaternion),
            ShapeGeometry::Box(b) => b.calculate_world_aabb(position, quaternion),
            ShapeGeometry::ConvexPolyhedron(c) => c.calculate_world_aabb(position, quaternion),
            ShapeGeometry::Heightfield(h) => h.calculate_world_aabb(position, quaternion),
            ShapeGeometry::Particle(p) => p.calculate_world_aabb(position, quaternion),
            ShapeGeometry::Cylinder(c) => c.calculate_world_aabb(position, quaternion),
            ShapeGeometry::Trimesh(t) => t.calculate_world_aabb(position, quaternion),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_follow_dispatch_order() {
        let kinds = [
            ShapeKind::Sphere,
            ShapeKind::Plane,
            ShapeKind::Box,
            ShapeKind::ConvexPolyhedron,
            ShapeKind::Heightfield,
            ShapeKind::Particle,
            ShapeKind::Cylinder,
            ShapeKind::Trimesh,
        ];
        for pair in kinds.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].tag() < pair[1].tag());
        }
    }

    #[test]
    fn test_defaults_and_builders() {
        let s = Shape::sphere(1.0)
            .unwrap()
            .with_collision_filter(2, 4)
            .with_collision_response(false);
        assert_eq!(s.kind(), ShapeKind::Sphere);
        assert_eq!((s.collision_filter_group, s.collision_filter_mask), (2, 4));
        assert!(!s.collision_response);
        assert!(s.as_convex().is_none());

        let b = Shape::cuboid(Vec3::repeat(0.5)).unwrap();
        assert_eq!(b.collision_filter_mask, u32::MAX);
        assert!(b.as_convex().is_some());
        assert_ne!(s.id, b.id);
    }

    #[test]
    fn test_plane_is_unbounded() {
        let p = Shape::plane();
        assert_eq!(p.bounding_sphere_radius(), f64::MAX);
        assert_eq!(p.calculate_local_inertia(1.0), Vec3::zeros());
    }
}
