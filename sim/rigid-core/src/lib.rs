//! Rigid-body world: bodies, collision detection, events, ray casting and
//! the fixed-step loop.
//!
//! This crate builds on [`rigid_types`] for ids, math and configuration,
//! [`rigid_shapes`] for collision geometry and [`rigid_constraint`] for
//! equation rows and solvers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          World                               │
//! │  Owns: bodies, constraints, contact materials, event queue  │
//! │  Runs: step / step_with_interpolation, ray casts, queries   │
//! └──────┬──────────────────┬──────────────────────┬────────────┘
//!        │                  │                      │
//!        ▼                  ▼                      ▼
//! ┌─────────────┐   ┌───────────────┐    ┌──────────────────┐
//! │ Broadphase  │ → │  NarrowPhase  │ →  │ Solver (GS/split)│
//! │ naive, SAP, │   │ contact and   │    │ contact, friction│
//! │ grid        │   │ friction rows │    │ and joint rows   │
//! └─────────────┘   └───────────────┘    └──────────────────┘
//! ```
//!
//! After solving, the world damps and integrates every body, advances the
//! sleep state machines and diffs contact state into begin/end events.
//!
//! # Quick Start
//!
//! ```
//! use rigid_core::{Body, World};
//! use rigid_shapes::Shape;
//! use rigid_types::math::Vec3;
//! use rigid_types::WorldConfig;
//!
//! let mut world = World::new(WorldConfig::earth()).unwrap();
//! let ball = world
//!     .add_body(
//!         Body::new(1.0)
//!             .with_shape(Shape::sphere(0.5).unwrap())
//!             .with_position(Vec3::new(0.0, 10.0, 0.0)),
//!     )
//!     .unwrap();
//!
//! for _ in 0..60 {
//!     world.step(1.0 / 60.0).unwrap();
//! }
//! assert!(world.body(ball).unwrap().position.y < 10.0);
//! ```
//!
//! # Events
//!
//! Stepping queues [`WorldEvent`]s instead of calling back into user code:
//!
//! ```
//! use rigid_core::{Body, World, WorldEvent};
//!
//! let mut world = World::default();
//! world.add_body(Body::new(1.0)).unwrap();
//! world.step(0.1).unwrap();
//! let steps = world
//!     .drain_events()
//!     .filter(|e| *e == WorldEvent::PostStep)
//!     .count();
//! assert_eq!(steps, 1);
//! ```

#![doc(html_root_url = "https://docs.rs/rigid-core/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,
)]

pub mod body;
pub mod broad_phase;
pub mod collision_matrix;
mod events;
pub mod narrow_phase;
mod overlap;
pub mod raycast;
mod world;

pub use body::{Body, BodyShape, BodyType, SleepState, SleepTransition};
pub use broad_phase::{
    broadphase_from_config, Broadphase, GridBroadphase, NaiveBroadphase, SapBroadphase,
};
pub use collision_matrix::{ArrayCollisionMatrix, CollisionMatrix, ObjectCollisionMatrix};
pub use events::WorldEvent;
pub use narrow_phase::{NarrowPhase, ShapeOverlap, StepContext};
pub use overlap::OverlapKeeper;
pub use raycast::{Ray, RayMode, RaycastResult};
pub use world::World;

// Re-export key types from rigid-types for convenience
pub use rigid_types::{
    Aabb, BodyId, ConstraintId, ContactMaterial, MaterialId, RigidError, ShapeId, WorldConfig,
};
