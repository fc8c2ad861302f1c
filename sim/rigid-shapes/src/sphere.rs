//! Spheres.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rigid_types::math::{Quat, Vec3};
use rigid_types::{Aabb, Result, RigidError};

/// A sphere centered on its local origin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sphere {
    /// Radius.
    pub radius: f64,
}

impl Sphere {
    /// Create a sphere. The radius must be finite and non-negative.
    pub fn new(radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(RigidError::invalid_shape(format!(
                "sphere radius must be non-negative, got {radius}"
            )));
        }
        Ok(Self { radius })
    }

    /// Enclosed volume.
    #[must_use]
    pub fn volume(&self) -> f64 {
        4.0 / 3.0 * std::f64::consts::PI * self.radius.powi(3)
    }

    /// Principal moments of a solid sphere.
    #[must_use]
    pub fn calculate_local_inertia(&self, mass: f64) -> Vec3 {
        Vec3::repeat(2.0 * mass * self.radius * self.radius / 5.0)
    }

    /// Bounding box at a world pose. Orientation does not matter.
    #[must_use]
    pub fn calculate_world_aabb(&self, position: &Vec3, _quaternion: &Quat) -> Aabb {
        Aabb::from_center(*position, Vec3::repeat(self.radius))
    }
}
