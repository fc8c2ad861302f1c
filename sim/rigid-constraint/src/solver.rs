//! Projected Gauss-Seidel solver over scalar equations.
//!
//! # Algorithm
//!
//! ```text
//! for each row j:   B_j = compute_b(h),  invC_j = 1 / compute_c()
//! repeat up to `iterations` sweeps:
//!     for each row j:
//!         Δλ = invC_j (B_j - G W_λ - eps λ_j)
//!         clamp λ_j + Δλ into [min_force, max_force]
//!         apply Δλ to both bodies' vlambda / wlambda
//!     stop once (Σ|Δλ|)² < tolerance²
//! v += vlambda ∘ linear_factor,  w += wlambda ∘ angular_factor
//! multiplier_j = λ_j / h
//! ```
//!
//! Bodies are passed as a slice of [`SolverBody`] views. Static and sleeping
//! bodies carry zero solve mass, so impulses never move them.

use rigid_types::math::{Mat3, Vec3};
use rigid_types::SolverConfig;
use tracing::{trace, warn};

use crate::equation::Equation;

/// The part of a body the solver reads and writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverBody {
    /// Center of mass in world coordinates.
    pub position: Vec3,
    /// Linear velocity.
    pub velocity: Vec3,
    /// Angular velocity.
    pub angular_velocity: Vec3,
    /// Accumulated force.
    pub force: Vec3,
    /// Accumulated torque.
    pub torque: Vec3,
    /// Inverse mass used while solving (zero for static or sleeping bodies).
    pub inv_mass_solve: f64,
    /// World inverse inertia used while solving.
    pub inv_inertia_world_solve: Mat3,
    /// Per-axis mask on linear velocity updates.
    pub linear_factor: Vec3,
    /// Per-axis mask on angular velocity updates.
    pub angular_factor: Vec3,
    /// Linear velocity accumulated from impulses during a solve.
    pub vlambda: Vec3,
    /// Angular velocity accumulated from impulses during a solve.
    pub wlambda: Vec3,
    /// Whether island traversal continues through this body. Static and
    /// sleeping bodies end an island instead of joining two.
    pub propagates: bool,
}

impl SolverBody {
    /// A body that never moves.
    #[must_use]
    pub fn fixed(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            force: Vec3::zeros(),
            torque: Vec3::zeros(),
            inv_mass_solve: 0.0,
            inv_inertia_world_solve: Mat3::zeros(),
            linear_factor: Vec3::repeat(1.0),
            angular_factor: Vec3::repeat(1.0),
            vlambda: Vec3::zeros(),
            wlambda: Vec3::zeros(),
            propagates: false,
        }
    }

    /// A free body with isotropic inertia `inertia`.
    #[must_use]
    pub fn dynamic(position: Vec3, mass: f64, inertia: f64) -> Self {
        Self {
            inv_mass_solve: if mass > 0.0 { 1.0 / mass } else { 0.0 },
            inv_inertia_world_solve: if inertia > 0.0 {
                Mat3::identity() / inertia
            } else {
                Mat3::zeros()
            },
            propagates: true,
            ..Self::fixed(position)
        }
    }

    /// Velocity of a world point rigidly attached to the body.
    #[must_use]
    pub fn velocity_at_world_point(&self, point: &Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(&(point - self.position))
    }
}

/// A solver that resolves equations into body velocity changes.
pub trait Solver: std::fmt::Debug {
    /// Solve `equations` for one step of length `dt`, updating body
    /// velocities and equation multipliers.
    ///
    /// Returns the number of sweeps for iterative solvers, or the number of
    /// islands for island-splitting solvers.
    fn solve(&mut self, dt: f64, bodies: &mut [SolverBody], equations: &mut [Equation]) -> usize;
}

/// Statistics from the last solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GsSolverStats {
    /// Sweeps performed.
    pub iterations: usize,
    /// Rows solved.
    pub equations: usize,
    /// Rows skipped for a non-finite right-hand side or effective mass.
    pub skipped: usize,
}

/// Gauss-Seidel solver with early exit on convergence.
#[derive(Debug, Clone, Default)]
pub struct GsSolver {
    config: SolverConfig,
    active: Vec<usize>,
    rhs: Vec<f64>,
    inv_c: Vec<f64>,
    lambda: Vec<f64>,
    all_bodies: Vec<usize>,
    last_stats: GsSolverStats,
}

impl GsSolver {
    /// Create a solver with the given configuration.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Maximum sweeps per solve.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.config.iterations
    }

    /// Statistics from the last solve.
    #[must_use]
    pub fn last_stats(&self) -> &GsSolverStats {
        &self.last_stats
    }

    /// Solve the rows `equation_slots` over the bodies `body_slots`.
    ///
    /// Only the listed bodies have their solver velocities reset and folded
    /// back; every body referenced by a listed row must be listed or have
    /// zero solve mass.
    pub fn solve_subset(
        &mut self,
        h: f64,
        bodies: &mut [SolverBody],
        equations: &mut [Equation],
        equation_slots: &[usize],
        body_slots: &[usize],
    ) -> usize {
        self.active.clear();
        self.rhs.clear();
        self.inv_c.clear();
        self.lambda.clear();
        let mut skipped = 0;

        for &i in equation_slots {
            let eq = &mut equations[i];
            if !eq.enabled {
                continue;
            }
            let b = eq.compute_b(h, bodies);
            let c = eq.compute_c(bodies);
            if !b.is_finite() || !c.is_finite() || c <= 0.0 {
                warn!(equation = %eq.id, rhs = b, c, "skipping equation with non-finite right-hand side");
                eq.multiplier = 0.0;
                skipped += 1;
                continue;
            }
            self.active.push(i);
            self.rhs.push(b);
            self.inv_c.push(1.0 / c);
            self.lambda.push(0.0);
        }

        self.last_stats = GsSolverStats {
            iterations: 0,
            equations: self.active.len(),
            skipped,
        };
        if self.active.is_empty() {
            return 0;
        }

        for &s in body_slots {
            bodies[s].vlambda = Vec3::zeros();
            bodies[s].wlambda = Vec3::zeros();
        }

        let tolerance_squared = self.config.tolerance * self.config.tolerance;
        let mut iterations = 0;
        while iterations < self.config.iterations {
            let mut delta_total = 0.0;
            for (k, &i) in self.active.iter().enumerate() {
                let eq = &equations[i];
                let lambda_j = self.lambda[k];
                let gw_lambda = eq.compute_gw_lambda(bodies);
                let mut delta = self.inv_c[k] * (self.rhs[k] - gw_lambda - eq.eps * lambda_j);

                if lambda_j + delta < eq.min_force {
                    delta = eq.min_force - lambda_j;
                } else if lambda_j + delta > eq.max_force {
                    delta = eq.max_force - lambda_j;
                }
                self.lambda[k] += delta;
                delta_total += delta.abs();
                eq.add_to_wlambda(delta, bodies);
            }
            iterations += 1;
            if delta_total * delta_total < tolerance_squared {
                break;
            }
        }

        for &s in body_slots {
            let b = &mut bodies[s];
            b.velocity += b.vlambda.component_mul(&b.linear_factor);
            b.angular_velocity += b.wlambda.component_mul(&b.angular_factor);
        }

        let inv_dt = 1.0 / h;
        for (k, &i) in self.active.iter().enumerate() {
            equations[i].multiplier = self.lambda[k] * inv_dt;
        }

        self.last_stats.iterations = iterations;
        trace!(
            iterations,
            equations = self.active.len(),
            "gauss-seidel solve finished"
        );
        iterations
    }
}

impl Solver for GsSolver {
    fn solve(&mut self, dt: f64, bodies: &mut [SolverBody], equations: &mut [Equation]) -> usize {
        let slots: Vec<usize> = (0..equations.len()).collect();
        let mut all_bodies = std::mem::take(&mut self.all_bodies);
        all_bodies.clear();
        all_bodies.extend(0..bodies.len());
        let iterations = self.solve_subset(dt, bodies, equations, &slots, &all_bodies);
        self.all_bodies = all_bodies;
        iterations
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::equation::{EquationKind, DEFAULT_MAX_FORCE};
    use approx::assert_relative_eq;

    fn contact(ni: Vec3, ri: Vec3, rj: Vec3) -> Equation {
        let mut eq = Equation::contact(0, 1, DEFAULT_MAX_FORCE);
        eq.kind = EquationKind::Contact {
            ri,
            rj,
            ni,
            restitution: 0.0,
        };
        eq.set_spook_params(1e7, 3.0, 1.0 / 60.0);
        eq
    }

    #[test]
    fn test_satisfied_contact_needs_no_impulse() {
        let mut bodies = vec![
            SolverBody::dynamic(Vec3::new(-0.5, 0.0, 0.0), 1.0, 0.4),
            SolverBody::dynamic(Vec3::new(0.5, 0.0, 0.0), 1.0, 0.4),
        ];
        let mut eqs = vec![contact(Vec3::x(), Vec3::x() * 0.5, -Vec3::x() * 0.5)];
        let mut solver = GsSolver::new(SolverConfig::default());

        let iterations = solver.solve(1.0 / 60.0, &mut bodies, &mut eqs);
        assert_eq!(iterations, 1);
        assert_eq!(eqs[0].multiplier, 0.0);
        assert_eq!(bodies[0].velocity, Vec3::zeros());
    }

    #[test]
    fn test_approaching_bodies_are_stopped() {
        let mut bodies = vec![
            SolverBody::dynamic(Vec3::new(-0.5, 0.0, 0.0), 1.0, 0.4),
            SolverBody::dynamic(Vec3::new(0.5, 0.0, 0.0), 1.0, 0.4),
        ];
        bodies[0].velocity = Vec3::new(1.0, 0.0, 0.0);
        bodies[1].velocity = Vec3::new(-1.0, 0.0, 0.0);
        let mut eqs = vec![contact(Vec3::x(), Vec3::x() * 0.5, -Vec3::x() * 0.5)];
        let mut solver = GsSolver::new(SolverConfig::default().with_iterations(50));

        solver.solve(1.0 / 60.0, &mut bodies, &mut eqs);
        let closing = bodies[0].velocity.x - bodies[1].velocity.x;
        assert!(closing.abs() < 0.2, "closing speed {closing}");
        assert!(eqs[0].multiplier > 0.0);
        assert_relative_eq!(bodies[0].velocity.x, -bodies[1].velocity.x, epsilon = 1e-12);
    }

    #[test]
    fn test_separating_bodies_are_left_alone() {
        let mut bodies = vec![
            SolverBody::dynamic(Vec3::new(-0.5, 0.0, 0.0), 1.0, 0.4),
            SolverBody::dynamic(Vec3::new(0.5, 0.0, 0.0), 1.0, 0.4),
        ];
        bodies[0].velocity = Vec3::new(-1.0, 0.0, 0.0);
        let mut eqs = vec![contact(Vec3::x(), Vec3::x() * 0.5, -Vec3::x() * 0.5)];
        GsSolver::default().solve(1.0 / 60.0, &mut bodies, &mut eqs);
        assert_eq!(bodies[0].velocity, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(eqs[0].multiplier, 0.0);
    }

    #[test]
    fn test_static_body_does_not_move() {
        let mut bodies = vec![
            SolverBody::fixed(Vec3::zeros()),
            SolverBody::dynamic(Vec3::new(0.0, 1.0, 0.0), 1.0, 0.4),
        ];
        bodies[1].velocity = Vec3::new(0.0, -2.0, 0.0);
        let mut eqs = vec![contact(Vec3::y(), Vec3::zeros(), -Vec3::y())];
        GsSolver::new(SolverConfig::default().with_iterations(30)).solve(
            1.0 / 60.0,
            &mut bodies,
            &mut eqs,
        );
        assert_eq!(bodies[0].velocity, Vec3::zeros());
        assert!(bodies[1].velocity.y > -0.2);
    }

    #[test]
    fn test_non_finite_rows_are_skipped() {
        let mut bodies = vec![
            SolverBody::dynamic(Vec3::zeros(), 1.0, 0.4),
            SolverBody::dynamic(Vec3::x(), 1.0, 0.4),
        ];
        let mut eqs = vec![contact(Vec3::new(f64::NAN, 0.0, 0.0), Vec3::zeros(), Vec3::zeros())];
        let mut solver = GsSolver::default();
        assert_eq!(solver.solve(1.0 / 60.0, &mut bodies, &mut eqs), 0);
        assert_eq!(solver.last_stats().skipped, 1);
        assert_eq!(bodies[0].velocity, Vec3::zeros());
    }

    #[test]
    fn test_disabled_rows_are_ignored() {
        let mut bodies = vec![
            SolverBody::dynamic(Vec3::new(-0.5, 0.0, 0.0), 1.0, 0.4),
            SolverBody::dynamic(Vec3::new(0.5, 0.0, 0.0), 1.0, 0.4),
        ];
        bodies[0].velocity = Vec3::new(1.0, 0.0, 0.0);
        let mut eqs = vec![contact(Vec3::x(), Vec3::x() * 0.5, -Vec3::x() * 0.5)];
        eqs[0].enabled = false;
        GsSolver::default().solve(1.0 / 60.0, &mut bodies, &mut eqs);
        assert_eq!(bodies[0].velocity, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_linear_factor_masks_response() {
        let mut bodies = vec![
            SolverBody::fixed(Vec3::zeros()),
            SolverBody::dynamic(Vec3::new(0.0, 1.0, 0.0), 1.0, 0.4),
        ];
        bodies[1].velocity = Vec3::new(0.0, -2.0, 0.0);
        bodies[1].linear_factor = Vec3::new(1.0, 0.0, 1.0);
        let mut eqs = vec![contact(Vec3::y(), Vec3::zeros(), -Vec3::y())];
        GsSolver::default().solve(1.0 / 60.0, &mut bodies, &mut eqs);
        assert_eq!(bodies[1].velocity.y, -2.0);
    }
}
