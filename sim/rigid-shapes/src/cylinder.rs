//! Cylinders and cones, approximated as convex polyhedra.
//!
//! The axis runs along local Z from `-height / 2` (bottom) to `+height / 2`
//! (top). A zero radius on one end collapses that ring into an apex, which
//! turns the cylinder into a cone.

use std::f64::consts::TAU;

use rigid_types::math::{Quat, Vec3};
use rigid_types::{Aabb, Result, RigidError};

use crate::convex::ConvexPolyhedron;

/// A (possibly truncated) cylinder with `segments` side faces.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    radius_top: f64,
    radius_bottom: f64,
    height: f64,
    segments: usize,
    convex: ConvexPolyhedron,
}

impl Cylinder {
    /// Build a cylinder. At least one radius must be positive and at least
    /// three segments are required.
    pub fn new(radius_top: f64, radius_bottom: f64, height: f64, segments: usize) -> Result<Self> {
        if segments < 3 {
            return Err(RigidError::invalid_shape(format!(
                "cylinder needs at least 3 segments, got {segments}"
            )));
        }
        if !height.is_finite() || height <= 0.0 {
            return Err(RigidError::invalid_shape(format!(
                "cylinder height must be positive, got {height}"
            )));
        }
        for r in [radius_top, radius_bottom] {
            if !r.is_finite() || r < 0.0 {
                return Err(RigidError::invalid_shape(format!(
                    "cylinder radius must be non-negative, got {r}"
                )));
            }
        }
        if radius_top == 0.0 && radius_bottom == 0.0 {
            return Err(RigidError::invalid_shape("cylinder has two zero radii"));
        }

        let half = height * 0.5;
        let mut vertices = Vec::with_capacity(2 * segments);
        let bottom = ring(&mut vertices, radius_bottom, -half, segments);
        let top = ring(&mut vertices, radius_top, half, segments);

        let mut faces = Vec::with_capacity(segments + 2);
        for i in 0..segments {
            let j = (i + 1) % segments;
            let mut face = vec![bottom[i], bottom[j], top[j], top[i]];
            face.dedup();
            if face.first() == face.last() {
                face.pop();
            }
            faces.push(face);
        }
        if radius_top > 0.0 {
            faces.push(top.clone());
        }
        if radius_bottom > 0.0 {
            faces.push(bottom.iter().rev().copied().collect());
        }

        let convex = ConvexPolyhedron::new(vertices, faces)?;
        Ok(Self {
            radius_top,
            radius_bottom,
            height,
            segments,
            convex,
        })
    }

    /// Radius at `+height / 2`.
    #[must_use]
    pub fn radius_top(&self) -> f64 {
        self.radius_top
    }

    /// Radius at `-height / 2`.
    #[must_use]
    pub fn radius_bottom(&self) -> f64 {
        self.radius_bottom
    }

    /// Length along local Z.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Number of side faces.
    #[must_use]
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// The polyhedron used for collision.
    #[must_use]
    pub fn convex(&self) -> &ConvexPolyhedron {
        &self.convex
    }

    /// Volume of the polyhedral approximation.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.convex.volume()
    }

    /// Principal moments, from the local bounding box.
    #[must_use]
    pub fn calculate_local_inertia(&self, mass: f64) -> Vec3 {
        self.convex.calculate_local_inertia(mass)
    }

    /// Bounding box at a world pose.
    #[must_use]
    pub fn calculate_world_aabb(&self, position: &Vec3, quaternion: &Quat) -> Aabb {
        self.convex.calculate_world_aabb(position, quaternion)
    }
}

/// Push one ring of vertices and return their indices. A zero radius
/// produces a single apex vertex shared by every slot.
fn ring(vertices: &mut Vec<Vec3>, radius: f64, z: f64, segments: usize) -> Vec<usize> {
    if radius == 0.0 {
        vertices.push(Vec3::new(0.0, 0.0, z));
        return vec![vertices.len() - 1; segments];
    }
    (0..segments)
        .map(|i| {
            let theta = TAU * i as f64 / segments as f64;
            vertices.push(Vec3::new(radius * theta.cos(), radius * theta.sin(), z));
            vertices.len() - 1
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cylinder_topology() {
        let c = Cylinder::new(1.0, 1.0, 2.0, 8).unwrap();
        assert_eq!(c.convex().vertices().len(), 16);
        assert_eq!(c.convex().faces().len(), 10);

        let normals = c.convex().face_normals();
        assert!(normals.iter().any(|n| (n - Vec3::z()).norm() < 1e-12));
        assert!(normals.iter().any(|n| (n + Vec3::z()).norm() < 1e-12));
    }

    #[test]
    fn test_volume_approaches_cylinder() {
        let c = Cylinder::new(1.0, 1.0, 1.0, 64).unwrap();
        assert_relative_eq!(c.volume(), std::f64::consts::PI, max_relative = 1e-2);
    }

    #[test]
    fn test_cone_has_apex() {
        let cone = Cylinder::new(0.0, 1.0, 1.0, 6).unwrap();
        assert_eq!(cone.convex().vertices().len(), 7);
        assert_eq!(cone.convex().faces().len(), 7);
        assert!(cone.convex().faces()[..6].iter().all(|f| f.len() == 3));
    }

    #[test]
    fn test_invalid_cylinders() {
        assert!(Cylinder::new(1.0, 1.0, 1.0, 2).is_err());
        assert!(Cylinder::new(0.0, 0.0, 1.0, 8).is_err());
        assert!(Cylinder::new(1.0, 1.0, 0.0, 8).is_err());
    }
}
