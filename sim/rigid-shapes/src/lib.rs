//! Collision shapes for the rigid-body simulator.
//!
//! Every shape is expressed in its own local frame and posed by the body
//! that owns it:
//!
//! - [`Sphere`], [`Plane`], [`Particle`] - analytic primitives
//! - [`BoxShape`], [`Cylinder`] - primitives backed by a cached [`ConvexPolyhedron`]
//! - [`ConvexPolyhedron`] - general convex hulls with separating-axis and clipping support
//! - [`Heightfield`] - regular height grids, collided through per-cell convex pillars
//! - [`Trimesh`] - indexed triangle meshes with an [`Octree`] over triangles
//!
//! [`Shape`] wraps a geometry with collision filtering and an optional material.
//!
//! # Example
//!
//! ```
//! use rigid_shapes::{Shape, ShapeKind};
//! use rigid_types::math::{Quat, Vec3};
//!
//! let shape = Shape::cuboid(Vec3::new(1.0, 2.0, 3.0)).unwrap();
//! assert_eq!(shape.kind(), ShapeKind::Box);
//!
//! let aabb = shape.calculate_world_aabb(&Vec3::zeros(), &Quat::identity());
//! assert_eq!(aabb.upper_bound, Vec3::new(1.0, 2.0, 3.0));
//! ```

#![doc(html_root_url = "https://docs.rs/rigid-shapes/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
)]

mod box_shape;
pub mod convex;
mod cylinder;
pub mod heightfield;
pub mod octree;
mod particle;
mod plane;
mod shape;
mod sphere;
mod trimesh;

pub use box_shape::BoxShape;
pub use convex::{ClipPoint, ConvexPolyhedron, SurfacePoint};
pub use cylinder::Cylinder;
pub use heightfield::{CellRange, Heightfield, Pillar};
pub use octree::Octree;
pub use particle::Particle;
pub use plane::Plane;
pub use shape::{Shape, ShapeGeometry, ShapeKind};
pub use sphere::Sphere;
pub use trimesh::Trimesh;
