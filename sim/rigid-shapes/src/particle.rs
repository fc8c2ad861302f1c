//! Point particles.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rigid_types::math::{Quat, Vec3};
use rigid_types::Aabb;

/// A single point with no extent, volume or rotational inertia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Particle;

impl Particle {
    /// Create a particle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Degenerate box at the particle's position.
    #[must_use]
    pub fn calculate_world_aabb(&self, position: &Vec3, _quaternion: &Quat) -> Aabb {
        Aabb::new(*position, *position)
    }
}
