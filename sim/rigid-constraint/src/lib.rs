//! Velocity-level constraints and the iterative solvers for the rigid-body
//! simulator.
//!
//! # Equations
//!
//! Every interaction is broken into scalar [`Equation`] rows:
//!
//! - contact (non-penetration, restitution aware)
//! - friction (one row per tangent direction)
//! - rotational (two axes held at a target angle)
//! - rotational motor (drives a relative angular speed)
//! - cone (one axis kept inside a cone around another)
//!
//! Each row is stabilized with SPOOK parameters derived from a stiffness, a
//! relaxation time (in steps) and the timestep.
//!
//! # Joints
//!
//! A [`Constraint`] bundles a fixed number of rows into a user-facing joint:
//! distance, point-to-point, cone-twist, hinge (with motor) and lock.
//!
//! # Solvers
//!
//! - [`GsSolver`]: projected Gauss-Seidel with early exit on convergence
//! - [`SplitSolver`]: partitions rows into islands and runs a [`GsSolver`]
//!   on each
//!
//! Solvers work on [`SolverBody`] views, so this crate does not depend on the
//! world's body type.
//!
//! # Example
//!
//! ```
//! use rigid_constraint::{Equation, EquationKind, GsSolver, Solver, SolverBody};
//! use rigid_types::math::Vec3;
//!
//! // Two unit spheres approaching each other along X.
//! let mut bodies = vec![
//!     SolverBody::dynamic(Vec3::new(-0.5, 0.0, 0.0), 1.0, 0.4),
//!     SolverBody::dynamic(Vec3::new(0.5, 0.0, 0.0), 1.0, 0.4),
//! ];
//! bodies[0].velocity.x = 1.0;
//! bodies[1].velocity.x = -1.0;
//!
//! let mut contact = Equation::contact(0, 1, 1e6);
//! contact.kind = EquationKind::Contact {
//!     ri: Vec3::new(0.5, 0.0, 0.0),
//!     rj: Vec3::new(-0.5, 0.0, 0.0),
//!     ni: Vec3::x(),
//!     restitution: 0.0,
//! };
//!
//! let mut equations = vec![contact];
//! GsSolver::default().solve(1.0 / 60.0, &mut bodies, &mut equations);
//! assert!(bodies[0].velocity.x < 1.0);
//! assert!(equations[0].multiplier > 0.0);
//! ```

#![doc(html_root_url = "https://docs.rs/rigid-constraint/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
)]

pub mod equation;
mod islands;
mod joint;
pub mod solver;

pub use equation::{
    Equation, EquationKind, DEFAULT_MAX_FORCE, DEFAULT_RELAXATION, DEFAULT_STIFFNESS,
};
pub use islands::{find_islands, Island, SplitSolver};
pub use joint::{ConeTwistParams, Constraint, ConstraintEquations, ConstraintKind};
pub use solver::{GsSolver, GsSolverStats, Solver, SolverBody};

/// Build the solver selected by `config`.
#[must_use]
pub fn solver_from_config(config: &rigid_types::SolverConfig) -> Box<dyn Solver> {
    if config.split_islands {
        Box::new(SplitSolver::from_config(config.clone()))
    } else {
        Box::new(GsSolver::new(config.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rigid_types::math::Vec3;
    use rigid_types::{BodyId, SolverConfig};

    #[test]
    fn test_solver_selection() {
        let mut bodies = vec![
            SolverBody::dynamic(Vec3::zeros(), 1.0, 1.0),
            SolverBody::dynamic(Vec3::x(), 1.0, 1.0),
        ];
        let mut equations = vec![Equation::contact(0, 1, DEFAULT_MAX_FORCE)];

        // The split solver reports islands, the plain solver reports sweeps.
        let mut split = solver_from_config(&SolverConfig::default().split());
        assert_eq!(split.solve(1.0 / 60.0, &mut bodies, &mut equations), 1);
        let mut plain = solver_from_config(&SolverConfig::default());
        assert_eq!(plain.solve(1.0 / 60.0, &mut bodies, &mut equations), 1);
    }

    #[test]
    fn test_joint_rows_feed_the_solver() {
        let a = BodyId::new(10);
        let b = BodyId::new(11);
        let mut joint = Constraint::point_to_point(a, Vec3::x(), b, -Vec3::x()).unwrap();
        let pose_a = rigid_types::Transform::identity();
        let pose_b = rigid_types::Transform::from_position(Vec3::new(2.0, 0.0, 0.0));
        joint.update(0, &pose_a, 1, &pose_b, 1.0 / 60.0);

        let mut bodies = vec![
            SolverBody::dynamic(pose_a.position, 1.0, 1.0),
            SolverBody::dynamic(pose_b.position, 1.0, 1.0),
        ];
        bodies[1].velocity = Vec3::new(0.0, 1.0, 0.0);
        let mut rows: Vec<Equation> = joint.equations().to_vec();
        GsSolver::new(SolverConfig::default().with_iterations(50)).solve(
            1.0 / 60.0,
            &mut bodies,
            &mut rows,
        );
        // The pinned point moves with both bodies, so B drags A along.
        assert!(bodies[0].velocity.y > 0.0);
        assert!(bodies[1].velocity.y < 1.0);
    }
}
