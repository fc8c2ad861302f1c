//! Math primitives shared by every layer of the simulator.
//!
//! Vectors, quaternions and matrices are plain `nalgebra` types. This module
//! adds the handful of operations the simulator needs on top of them:
//!
//! - [`Transform`] - a rigid frame (position + orientation) with the four
//!   point/vector conversions between local and world space
//! - [`JacobianElement`] - one body's half of a constraint row
//! - [`Vec3Ext`] - tangent basis construction and tolerant comparisons
//! - quaternion integration and fast renormalization
//! - 3x3 solves that fail loudly on singular input

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Result, RigidError};

/// Three-component vector used for positions, velocities and forces.
pub type Vec3 = Vector3<f64>;

/// Unit quaternion used for orientations.
pub type Quat = UnitQuaternion<f64>;

/// 3x3 matrix used for inertia tensors.
pub type Mat3 = Matrix3<f64>;

/// Default tolerance for the `almost_*` comparisons.
pub const ALMOST_EPSILON: f64 = 1e-6;

/// Determinant magnitude below which a 3x3 matrix counts as singular.
pub const SINGULAR_EPSILON: f64 = 1e-12;

/// A rigid frame: translation followed by rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform {
    /// Origin of the frame in world coordinates.
    pub position: Vec3,
    /// Orientation of the frame.
    pub quaternion: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Create a transform from a position and orientation.
    #[must_use]
    pub const fn new(position: Vec3, quaternion: Quat) -> Self {
        Self {
            position,
            quaternion,
        }
    }

    /// The identity frame.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Vec3::zeros(),
            quaternion: Quat::identity(),
        }
    }

    /// A pure translation.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            quaternion: Quat::identity(),
        }
    }

    /// Express a world point in this frame.
    #[must_use]
    pub fn point_to_local_frame(&self, world_point: &Vec3) -> Vec3 {
        self.quaternion
            .inverse_transform_vector(&(world_point - self.position))
    }

    /// Express a local point in world coordinates.
    #[must_use]
    pub fn point_to_world_frame(&self, local_point: &Vec3) -> Vec3 {
        self.quaternion * local_point + self.position
    }

    /// Rotate a world direction into this frame.
    #[must_use]
    pub fn vector_to_local_frame(&self, world_vector: &Vec3) -> Vec3 {
        self.quaternion.inverse_transform_vector(world_vector)
    }

    /// Rotate a local direction into world coordinates.
    #[must_use]
    pub fn vector_to_world_frame(&self, local_vector: &Vec3) -> Vec3 {
        self.quaternion * local_vector
    }

    /// Compose a child frame expressed in this frame into world coordinates.
    #[must_use]
    pub fn compose(&self, offset: &Vec3, orientation: &Quat) -> Self {
        Self {
            position: self.point_to_world_frame(offset),
            quaternion: self.quaternion * orientation,
        }
    }
}

/// One body's half of a scalar constraint row: `G = [spatial, rotational]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JacobianElement {
    /// Linear part, multiplies the body's linear velocity.
    pub spatial: Vec3,
    /// Angular part, multiplies the body's angular velocity.
    pub rotational: Vec3,
}

impl JacobianElement {
    /// Create an element from its two parts.
    #[must_use]
    pub const fn new(spatial: Vec3, rotational: Vec3) -> Self {
        Self {
            spatial,
            rotational,
        }
    }

    /// Dot product with another jacobian element.
    #[must_use]
    pub fn multiply_element(&self, other: &Self) -> f64 {
        self.spatial.dot(&other.spatial) + self.rotational.dot(&other.rotational)
    }

    /// Dot product with a (linear, angular) vector pair.
    #[must_use]
    pub fn multiply_vectors(&self, spatial: &Vec3, rotational: &Vec3) -> f64 {
        self.spatial.dot(spatial) + self.rotational.dot(rotational)
    }

    /// Zero both parts.
    pub fn reset(&mut self) {
        self.spatial = Vec3::zeros();
        self.rotational = Vec3::zeros();
    }
}

/// Extra vector operations used by collision and constraint code.
pub trait Vec3Ext {
    /// Two unit vectors that, together with the normalized receiver, form a
    /// right-handed orthonormal basis. A zero receiver yields X and Y.
    fn tangents(&self) -> (Vec3, Vec3);

    /// Whether every component is within `precision` of zero.
    fn almost_zero(&self, precision: f64) -> bool;

    /// Whether every component is within `precision` of `other`.
    fn almost_equals(&self, other: &Vec3, precision: f64) -> bool;

    /// Whether the receiver is the negation of `other` within `precision`.
    fn is_anti_parallel_to(&self, other: &Vec3, precision: f64) -> bool;
}

impl Vec3Ext for Vec3 {
    fn tangents(&self) -> (Vec3, Vec3) {
        let norm = self.norm();
        if norm > 0.0 {
            let n = self / norm;
            let reference = if n.x.abs() < 0.9 {
                Vec3::x()
            } else {
                Vec3::y()
            };
            let t1 = n.cross(&reference).normalize();
            let t2 = n.cross(&t1);
            (t1, t2)
        } else {
            (Vec3::x(), Vec3::y())
        }
    }

    fn almost_zero(&self, precision: f64) -> bool {
        self.x.abs() <= precision && self.y.abs() <= precision && self.z.abs() <= precision
    }

    fn almost_equals(&self, other: &Vec3, precision: f64) -> bool {
        (self - other).almost_zero(precision)
    }

    fn is_anti_parallel_to(&self, other: &Vec3, precision: f64) -> bool {
        (self + other).almost_zero(precision)
    }
}

/// Advance an orientation by one explicit Euler step of `q' = 0.5 * w * q`.
///
/// The angular velocity is masked component-wise by `angular_factor`. The
/// result is generally not unit length; see [`normalize_fast`].
#[must_use]
pub fn integrate_quaternion(
    q: &Quaternion<f64>,
    angular_velocity: &Vec3,
    dt: f64,
    angular_factor: &Vec3,
) -> Quaternion<f64> {
    let ax = angular_velocity.x * angular_factor.x;
    let ay = angular_velocity.y * angular_factor.y;
    let az = angular_velocity.z * angular_factor.z;
    let (bx, by, bz, bw) = (q.i, q.j, q.k, q.w);
    let half_dt = dt * 0.5;

    Quaternion::new(
        bw + half_dt * (-ax * bx - ay * by - az * bz),
        bx + half_dt * (ax * bw + ay * bz - az * by),
        by + half_dt * (ay * bw + az * bx - ax * bz),
        bz + half_dt * (az * bw + ax * by - ay * bx),
    )
}

/// Approximate renormalization with a single Newton step.
///
/// Accurate when the input is already close to unit length, which is the
/// case right after [`integrate_quaternion`] with a small timestep.
#[must_use]
pub fn normalize_fast(q: &Quaternion<f64>) -> Quaternion<f64> {
    let f = (3.0 - q.norm_squared()) * 0.5;
    *q * f
}

/// Solve `m * x = b`, failing on a singular matrix.
pub fn solve_mat3(m: &Mat3, b: &Vec3) -> Result<Vec3> {
    if m.determinant().abs() < SINGULAR_EPSILON {
        return Err(RigidError::singular("3x3 solve"));
    }
    m.lu()
        .solve(b)
        .filter(|x| x.iter().all(|c| c.is_finite()))
        .ok_or_else(|| RigidError::singular("3x3 solve"))
}

/// Invert `m`, failing on a singular matrix.
pub fn invert_mat3(m: &Mat3) -> Result<Mat3> {
    if m.determinant().abs() < SINGULAR_EPSILON {
        return Err(RigidError::singular("3x3 inverse"));
    }
    m.try_inverse()
        .ok_or_else(|| RigidError::singular("3x3 inverse"))
}

/// Component-wise minimum of two vectors.
#[must_use]
pub fn component_min(a: &Vec3, b: &Vec3) -> Vec3 {
    Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z))
}

/// Component-wise maximum of two vectors.
#[must_use]
pub fn component_max(a: &Vec3, b: &Vec3) -> Vec3 {
    Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z))
}
