//! Infinite planes.
//!
//! A plane passes through its body-local origin with normal along local +Z.
//! Everything below it counts as solid.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rigid_types::math::{Quat, Vec3};
use rigid_types::Aabb;

/// An infinite plane with local normal +Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plane;

impl Plane {
    /// Create a plane.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// World-space normal for an orientation.
    #[must_use]
    pub fn world_normal(quaternion: &Quat) -> Vec3 {
        quaternion * Vec3::z()
    }

    /// Bounding box at a world pose.
    ///
    /// Unbounded, except that an axis-aligned normal caps the box at the
    /// plane on that side.
    #[must_use]
    pub fn calculate_world_aabb(&self, position: &Vec3, quaternion: &Quat) -> Aabb {
        let normal = Self::world_normal(quaternion);
        let mut aabb = Aabb::everything();
        for axis in 0..3 {
            if normal[axis] == 1.0 {
                aabb.upper_bound[axis] = position[axis];
            } else if normal[axis] == -1.0 {
                aabb.lower_bound[axis] = position[axis];
            }
        }
        aabb
    }
}
