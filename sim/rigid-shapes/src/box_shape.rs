//! Boxes.

use rigid_types::math::{Quat, Vec3};
use rigid_types::{Aabb, Result, RigidError};

use crate::convex::{box_inertia, ConvexPolyhedron};

/// A box centered on its local origin, with a cached polyhedron used by the
/// convex collision routines.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxShape {
    half_extents: Vec3,
    convex: ConvexPolyhedron,
}

impl BoxShape {
    /// Create a box from its half extents, which must all be positive.
    pub fn new(half_extents: Vec3) -> Result<Self> {
        if half_extents.iter().any(|h| !h.is_finite() || *h <= 0.0) {
            return Err(RigidError::invalid_shape(format!(
                "box half extents must be positive, got {half_extents:?}"
            )));
        }
        let (x, y, z) = (half_extents.x, half_extents.y, half_extents.z);
        let vertices = vec![
            Vec3::new(-x, -y, -z),
            Vec3::new(x, -y, -z),
            Vec3::new(x, y, -z),
            Vec3::new(-x, y, -z),
            Vec3::new(-x, -y, z),
            Vec3::new(x, -y, z),
            Vec3::new(x, y, z),
            Vec3::new(-x, y, z),
        ];
        let faces = vec![
            vec![3, 2, 1, 0],
            vec![4, 5, 6, 7],
            vec![5, 4, 0, 1],
            vec![2, 3, 7, 6],
            vec![0, 4, 7, 3],
            vec![1, 2, 6, 5],
        ];
        let convex = ConvexPolyhedron::new(vertices, faces)?
            .with_unique_axes(vec![Vec3::x(), Vec3::y(), Vec3::z()]);
        Ok(Self {
            half_extents,
            convex,
        })
    }

    /// Half extents.
    #[must_use]
    pub fn half_extents(&self) -> &Vec3 {
        &self.half_extents
    }

    /// The cached polyhedron.
    #[must_use]
    pub fn convex(&self) -> &ConvexPolyhedron {
        &self.convex
    }

    /// Enclosed volume.
    #[must_use]
    pub fn volume(&self) -> f64 {
        8.0 * self.half_extents.x * self.half_extents.y * self.half_extents.z
    }

    /// Principal moments of a solid box.
    #[must_use]
    pub fn calculate_local_inertia(&self, mass: f64) -> Vec3 {
        box_inertia(&self.half_extents, mass)
    }

    /// Distance from the center to a corner.
    #[must_use]
    pub fn bounding_sphere_radius(&self) -> f64 {
        self.half_extents.norm()
    }

    /// The six face-center offsets `+x, +y, +z, -x, -y, -z`, each scaled by
    /// the half extent on its axis and rotated into world orientation.
    #[must_use]
    pub fn side_normals(&self, quaternion: &Quat) -> [Vec3; 6] {
        let e = self.half_extents;
        [
            Vec3::new(e.x, 0.0, 0.0),
            Vec3::new(0.0, e.y, 0.0),
            Vec3::new(0.0, 0.0, e.z),
            Vec3::new(-e.x, 0.0, 0.0),
            Vec3::new(0.0, -e.y, 0.0),
            Vec3::new(0.0, 0.0, -e.z),
        ]
        .map(|s| quaternion * s)
    }

    /// Corners at a world pose.
    #[must_use]
    pub fn world_corners(&self, position: &Vec3, quaternion: &Quat) -> [Vec3; 8] {
        Aabb::from_center(Vec3::zeros(), self.half_extents)
            .corners()
            .map(|c| quaternion * c + position)
    }

    /// Bounding box at a world pose.
    #[must_use]
    pub fn calculate_world_aabb(&self, position: &Vec3, quaternion: &Quat) -> Aabb {
        Aabb::from_points(self.world_corners(position, quaternion).iter(), None, 0.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_box_properties() {
        let b = BoxShape::new(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_relative_eq!(b.volume(), 48.0);
        assert_relative_eq!(b.convex().volume(), 48.0, epsilon = 1e-9);
        assert_relative_eq!(
            b.calculate_local_inertia(12.0),
            Vec3::new(4.0 * 4.0 + 36.0, 4.0 + 36.0, 16.0 + 4.0)
        );
        assert_eq!(b.convex().unique_axes().map(<[Vec3]>::len), Some(3));
    }

    #[test]
    fn test_rotated_aabb_grows() {
        let b = BoxShape::new(Vec3::repeat(1.0)).unwrap();
        let q = Quat::from_axis_angle(&Vec3::z_axis(), FRAC_PI_4);
        let aabb = b.calculate_world_aabb(&Vec3::zeros(), &q);
        assert_relative_eq!(aabb.upper_bound.x, 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(aabb.upper_bound.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_side_normals() {
        let b = BoxShape::new(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        let sides = b.side_normals(&Quat::identity());
        assert_eq!(sides[1], Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(sides[5], Vec3::new(0.0, 0.0, -3.0));
    }

    #[test]
    fn test_zero_extent_rejected() {
        assert!(BoxShape::new(Vec3::new(1.0, 0.0, 1.0)).is_err());
    }
}
