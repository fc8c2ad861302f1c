//! Core types for the rigid-body simulator.
//!
//! This crate provides the foundational value types every other layer builds on:
//!
//! - [`math`] - vector/quaternion/matrix aliases, [`Transform`], [`JacobianElement`]
//! - [`Aabb`] - axis-aligned bounding boxes with frame conversions and ray tests
//! - [`BodyId`], [`ShapeId`], [`ConstraintId`], [`MaterialId`], [`EquationId`] - process-unique ids
//! - [`Material`], [`ContactMaterial`], [`ContactMaterialTable`] - surface parameters
//! - [`WorldConfig`], [`SolverConfig`], [`BroadphaseConfig`] - world configuration
//! - [`RigidError`] - the error type shared by all crates
//!
//! # Design Philosophy
//!
//! These types are **pure data** plus small, allocation-free operations. They
//! carry no simulation state, so they can be shared between the shape,
//! constraint and world crates without dependency cycles.
//!
//! # Coordinate System
//!
//! Right-handed. Gravity is configurable; the presets use -Y as "down".
//! Planes, cylinders and heightfields use their local +Z as the "up" axis.
//!
//! # Example
//!
//! ```
//! use rigid_types::{Aabb, Transform};
//! use rigid_types::math::Vec3;
//!
//! let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
//! let frame = Transform::from_position(Vec3::new(5.0, 0.0, 0.0));
//!
//! let world = aabb.to_world_frame(&frame);
//! assert_eq!(world.lower_bound.x, 4.0);
//! assert!(!world.overlaps(&aabb));
//! ```

#![doc(html_root_url = "https://docs.rs/rigid-types/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod aabb;
mod config;
mod error;
mod ids;
mod material;
pub mod math;

pub use aabb::Aabb;
pub use config::{
    Axis, BroadphaseConfig, ContactDefaults, SolverConfig, WorldConfig, STANDARD_GRAVITY,
};
pub use error::RigidError;
pub use ids::{BodyId, ConstraintId, EquationId, MaterialId, ShapeId};
pub use material::{ContactMaterial, ContactMaterialTable, Material};
pub use math::{JacobianElement, Transform};

/// Result type for simulator operations.
pub type Result<T> = std::result::Result<T, RigidError>;
