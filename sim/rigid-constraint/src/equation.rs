//! Scalar constraint rows.
//!
//! Every contact, friction direction and joint axis is one [`Equation`]: a
//! row `G = [G_a, G_b]` acting on the velocities of two bodies, a force
//! range, and SPOOK stabilization parameters.
//!
//! # SPOOK
//!
//! For stiffness `k`, relaxation `d` (in timesteps) and timestep `h`:
//!
//! ```text
//! a   = 4 / (h (1 + 4d))
//! b   = 4d / (1 + 4d)
//! eps = 4 / (h² k (1 + 4d))
//!
//! B = -a g - b G W - h G M⁻¹ f        right-hand side
//! C = G M⁻¹ Gᵀ + eps                  effective mass (regularized)
//! ```
//!
//! `g` is the position error, `G W` the constraint velocity and `G M⁻¹ f`
//! the velocity the external forces would add over the step.

use rigid_types::math::Vec3;
use rigid_types::{EquationId, JacobianElement, ShapeId};

use crate::solver::SolverBody;

/// Default force bound of joint rows.
pub const DEFAULT_MAX_FORCE: f64 = 1e6;

/// Default SPOOK stiffness.
pub const DEFAULT_STIFFNESS: f64 = 1e7;

/// Default SPOOK relaxation for joint rows.
pub const DEFAULT_RELAXATION: f64 = 4.0;

/// What a row constrains, with the world-space data it needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EquationKind {
    /// Non-penetration along `ni`, pointing out of body A. Also used with
    /// bilateral bounds for distance and point-to-point joints.
    Contact {
        /// Contact point on A, relative to A's center.
        ri: Vec3,
        /// Contact point on B, relative to B's center.
        rj: Vec3,
        /// Contact normal.
        ni: Vec3,
        /// Coefficient of restitution.
        restitution: f64,
    },
    /// Zero relative velocity along tangent `t`.
    Friction {
        /// Contact point on A, relative to A's center.
        ri: Vec3,
        /// Contact point on B, relative to B's center.
        rj: Vec3,
        /// Tangent direction.
        t: Vec3,
    },
    /// Keeps the angle between `axis_a` and `axis_b` at `max_angle`.
    Rotational {
        /// World axis on A.
        axis_a: Vec3,
        /// World axis on B.
        axis_b: Vec3,
        /// Target angle between the axes.
        max_angle: f64,
    },
    /// Drives `axis_a . w_a - axis_b . w_b` towards `target_velocity`.
    RotationalMotor {
        /// World axis on A.
        axis_a: Vec3,
        /// World axis on B.
        axis_b: Vec3,
        /// Target relative angular speed.
        target_velocity: f64,
    },
    /// Keeps `axis_b` within `angle` of `axis_a`.
    Cone {
        /// World axis on A.
        axis_a: Vec3,
        /// World axis on B.
        axis_b: Vec3,
        /// Cone half angle.
        angle: f64,
    },
}

/// One scalar constraint row between two bodies, addressed by solver slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equation {
    /// Process-unique id.
    pub id: EquationId,
    /// Row type and geometry.
    pub kind: EquationKind,
    /// Slot of body A in the solver body slice.
    pub body_a: usize,
    /// Slot of body B in the solver body slice.
    pub body_b: usize,
    /// Shape on A that produced a contact row.
    pub shape_a: Option<ShapeId>,
    /// Shape on B that produced a contact row.
    pub shape_b: Option<ShapeId>,
    /// Lower bound of the accumulated impulse.
    pub min_force: f64,
    /// Upper bound of the accumulated impulse.
    pub max_force: f64,
    /// SPOOK `a`.
    pub a: f64,
    /// SPOOK `b`.
    pub b: f64,
    /// SPOOK `eps`.
    pub eps: f64,
    /// Row on body A.
    pub jacobian_a: JacobianElement,
    /// Row on body B.
    pub jacobian_b: JacobianElement,
    /// Disabled rows are ignored by the solvers.
    pub enabled: bool,
    /// Last solved impulse divided by the timestep.
    pub multiplier: f64,
}

impl Equation {
    /// Create a row with the default SPOOK parameters for a 1/60 s step.
    #[must_use]
    pub fn new(
        kind: EquationKind,
        body_a: usize,
        body_b: usize,
        min_force: f64,
        max_force: f64,
    ) -> Self {
        let mut eq = Self {
            id: EquationId::next(),
            kind,
            body_a,
            body_b,
            shape_a: None,
            shape_b: None,
            min_force,
            max_force,
            a: 0.0,
            b: 0.0,
            eps: 0.0,
            jacobian_a: JacobianElement::default(),
            jacobian_b: JacobianElement::default(),
            enabled: true,
            multiplier: 0.0,
        };
        eq.set_spook_params(DEFAULT_STIFFNESS, DEFAULT_RELAXATION, 1.0 / 60.0);
        eq
    }

    /// A unilateral contact row with force range `[0, max_force]`.
    #[must_use]
    pub fn contact(body_a: usize, body_b: usize, max_force: f64) -> Self {
        Self::new(
            EquationKind::Contact {
                ri: Vec3::zeros(),
                rj: Vec3::zeros(),
                ni: Vec3::zeros(),
                restitution: 0.0,
            },
            body_a,
            body_b,
            0.0,
            max_force,
        )
    }

    /// A friction row with force range `[-slip_force, slip_force]`.
    #[must_use]
    pub fn friction(body_a: usize, body_b: usize, slip_force: f64) -> Self {
        Self::new(
            EquationKind::Friction {
                ri: Vec3::zeros(),
                rj: Vec3::zeros(),
                t: Vec3::zeros(),
            },
            body_a,
            body_b,
            -slip_force,
            slip_force,
        )
    }

    /// A bilateral rotational row keeping the axes perpendicular.
    #[must_use]
    pub fn rotational(body_a: usize, body_b: usize, max_force: f64) -> Self {
        Self::new(
            EquationKind::Rotational {
                axis_a: Vec3::x(),
                axis_b: Vec3::y(),
                max_angle: std::f64::consts::FRAC_PI_2,
            },
            body_a,
            body_b,
            -max_force,
            max_force,
        )
    }

    /// A bilateral motor row with zero target velocity.
    #[must_use]
    pub fn rotational_motor(body_a: usize, body_b: usize, max_force: f64) -> Self {
        Self::new(
            EquationKind::RotationalMotor {
                axis_a: Vec3::x(),
                axis_b: Vec3::y(),
                target_velocity: 0.0,
            },
            body_a,
            body_b,
            -max_force,
            max_force,
        )
    }

    /// A cone row with force range `[-max_force, 0]`.
    #[must_use]
    pub fn cone(body_a: usize, body_b: usize, max_force: f64) -> Self {
        Self::new(
            EquationKind::Cone {
                axis_a: Vec3::x(),
                axis_b: Vec3::y(),
                angle: 0.0,
            },
            body_a,
            body_b,
            -max_force,
            0.0,
        )
    }

    /// Recompute `a`, `b` and `eps` from stiffness, relaxation and timestep.
    pub fn set_spook_params(&mut self, stiffness: f64, relaxation: f64, h: f64) {
        let d = relaxation;
        let k = stiffness;
        self.a = 4.0 / (h * (1.0 + 4.0 * d));
        self.b = (4.0 * d) / (1.0 + 4.0 * d);
        self.eps = 4.0 / (h * h * k * (1.0 + 4.0 * d));
    }

    /// Set both force bounds.
    pub fn set_force_range(&mut self, min_force: f64, max_force: f64) {
        self.min_force = min_force;
        self.max_force = max_force;
    }

    /// `G q`, the spatial rows applied to the body positions.
    #[must_use]
    pub fn compute_gq(&self, bodies: &[SolverBody]) -> f64 {
        let zero = Vec3::zeros();
        self.jacobian_a
            .multiply_vectors(&bodies[self.body_a].position, &zero)
            + self
                .jacobian_b
                .multiply_vectors(&bodies[self.body_b].position, &zero)
    }

    /// `G W`, the current constraint velocity.
    #[must_use]
    pub fn compute_gw(&self, bodies: &[SolverBody]) -> f64 {
        let bi = &bodies[self.body_a];
        let bj = &bodies[self.body_b];
        self.jacobian_a
            .multiply_vectors(&bi.velocity, &bi.angular_velocity)
            + self
                .jacobian_b
                .multiply_vectors(&bj.velocity, &bj.angular_velocity)
    }

    /// `G W_lambda`, the constraint velocity from solver impulses so far.
    #[must_use]
    pub fn compute_gw_lambda(&self, bodies: &[SolverBody]) -> f64 {
        let bi = &bodies[self.body_a];
        let bj = &bodies[self.body_b];
        self.jacobian_a.multiply_vectors(&bi.vlambda, &bi.wlambda)
            + self.jacobian_b.multiply_vectors(&bj.vlambda, &bj.wlambda)
    }

    /// `G M⁻¹ f`, the constraint acceleration from external forces.
    #[must_use]
    pub fn compute_gi_mf(&self, bodies: &[SolverBody]) -> f64 {
        let bi = &bodies[self.body_a];
        let bj = &bodies[self.body_b];
        let i_mf_i = bi.force * bi.inv_mass_solve;
        let i_mf_j = bj.force * bj.inv_mass_solve;
        let i_it_i = bi.inv_inertia_world_solve * bi.torque;
        let i_it_j = bj.inv_inertia_world_solve * bj.torque;
        self.jacobian_a.multiply_vectors(&i_mf_i, &i_it_i)
            + self.jacobian_b.multiply_vectors(&i_mf_j, &i_it_j)
    }

    /// `G M⁻¹ Gᵀ`, the inverse effective mass of the row.
    #[must_use]
    pub fn compute_gi_mgt(&self, bodies: &[SolverBody]) -> f64 {
        let bi = &bodies[self.body_a];
        let bj = &bodies[self.body_b];
        let ga = &self.jacobian_a;
        let gb = &self.jacobian_b;
        bi.inv_mass_solve * ga.spatial.norm_squared()
            + bj.inv_mass_solve * gb.spatial.norm_squared()
            + ga.rotational.dot(&(bi.inv_inertia_world_solve * ga.rotational))
            + gb.rotational.dot(&(bj.inv_inertia_world_solve * gb.rotational))
    }

    /// `G M⁻¹ Gᵀ + eps`.
    #[must_use]
    pub fn compute_c(&self, bodies: &[SolverBody]) -> f64 {
        self.compute_gi_mgt(bodies) + self.eps
    }

    /// Apply an impulse increment to both bodies' solver velocities.
    pub fn add_to_wlambda(&self, delta_lambda: f64, bodies: &mut [SolverBody]) {
        let bi = &mut bodies[self.body_a];
        bi.vlambda += self.jacobian_a.spatial * (bi.inv_mass_solve * delta_lambda);
        bi.wlambda += bi.inv_inertia_world_solve * self.jacobian_a.rotational * delta_lambda;

        let bj = &mut bodies[self.body_b];
        bj.vlambda += self.jacobian_b.spatial * (bj.inv_mass_solve * delta_lambda);
        bj.wlambda += bj.inv_inertia_world_solve * self.jacobian_b.rotational * delta_lambda;
    }

    /// Rebuild the jacobian from the row geometry and return the right-hand
    /// side `B` for timestep `h`.
    ///
    /// Must run before [`compute_c`](Self::compute_c) in a solve, since `C`
    /// reads the jacobian written here.
    pub fn compute_b(&mut self, h: f64, bodies: &[SolverBody]) -> f64 {
        match self.kind {
            EquationKind::Contact {
                ri,
                rj,
                ni,
                restitution,
            } => {
                let bi = &bodies[self.body_a];
                let bj = &bodies[self.body_b];
                let rixn = ri.cross(&ni);
                let rjxn = rj.cross(&ni);
                self.jacobian_a = JacobianElement::new(-ni, -rixn);
                self.jacobian_b = JacobianElement::new(ni, rjxn);

                let penetration = bj.position + rj - bi.position - ri;
                let g = ni.dot(&penetration);

                let e_plus_one = restitution + 1.0;
                let gw = e_plus_one * bj.velocity.dot(&ni) - e_plus_one * bi.velocity.dot(&ni)
                    + bj.angular_velocity.dot(&rjxn)
                    - bi.angular_velocity.dot(&rixn);
                let gi_mf = self.compute_gi_mf(bodies);
                -g * self.a - gw * self.b - h * gi_mf
            }
            EquationKind::Friction { ri, rj, t } => {
                let rixt = ri.cross(&t);
                let rjxt = rj.cross(&t);
                self.jacobian_a = JacobianElement::new(-t, -rixt);
                self.jacobian_b = JacobianElement::new(t, rjxt);
                let gw = self.compute_gw(bodies);
                let gi_mf = self.compute_gi_mf(bodies);
                -gw * self.b - h * gi_mf
            }
            EquationKind::Rotational {
                axis_a,
                axis_b,
                max_angle: angle,
            }
            | EquationKind::Cone {
                axis_a,
                axis_b,
                angle,
            } => {
                self.jacobian_a = JacobianElement::new(Vec3::zeros(), axis_b.cross(&axis_a));
                self.jacobian_b = JacobianElement::new(Vec3::zeros(), axis_a.cross(&axis_b));
                let g = angle.cos() - axis_a.dot(&axis_b);
                let gw = self.compute_gw(bodies);
                let gi_mf = self.compute_gi_mf(bodies);
                -g * self.a - gw * self.b - h * gi_mf
            }
            EquationKind::RotationalMotor {
                axis_a,
                axis_b,
                target_velocity,
            } => {
                self.jacobian_a = JacobianElement::new(Vec3::zeros(), axis_a);
                self.jacobian_b = JacobianElement::new(Vec3::zeros(), -axis_b);
                let gw = self.compute_gw(bodies) - target_velocity;
                let gi_mf = self.compute_gi_mf(bodies);
                -gw * self.b - h * gi_mf
            }
        }
    }

    /// Relative velocity of the contact points along the normal, positive
    /// when the bodies approach. `None` for non-contact rows.
    #[must_use]
    pub fn impact_velocity_along_normal(&self, bodies: &[SolverBody]) -> Option<f64> {
        let EquationKind::Contact { ri, rj, ni, .. } = self.kind else {
            return None;
        };
        let bi = &bodies[self.body_a];
        let bj = &bodies[self.body_b];
        let vi = bi.velocity_at_world_point(&(bi.position + ri));
        let vj = bj.velocity_at_world_point(&(bj.position + rj));
        Some(ni.dot(&(vi - vj)))
    }

    /// Contact normal, for contact rows.
    #[must_use]
    pub fn contact_normal(&self) -> Option<Vec3> {
        match self.kind {
            EquationKind::Contact { ni, .. } => Some(ni),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_bodies(xa: f64, xb: f64) -> Vec<SolverBody> {
        vec![
            SolverBody::dynamic(Vec3::new(xa, 0.0, 0.0), 1.0, 2.5),
            SolverBody::dynamic(Vec3::new(xb, 0.0, 0.0), 1.0, 2.5),
        ]
    }

    fn touching_contact() -> Equation {
        let mut eq = Equation::contact(0, 1, DEFAULT_MAX_FORCE);
        eq.kind = EquationKind::Contact {
            ri: Vec3::new(0.5, 0.0, 0.0),
            rj: Vec3::new(-0.5, 0.0, 0.0),
            ni: Vec3::x(),
            restitution: 0.0,
        };
        eq
    }

    #[test]
    fn test_spook_params() {
        let mut eq = Equation::contact(0, 1, 1.0);
        eq.set_spook_params(1e7, 3.0, 0.01);
        assert_relative_eq!(eq.a, 4.0 / (0.01 * 13.0));
        assert_relative_eq!(eq.b, 12.0 / 13.0);
        assert_relative_eq!(eq.eps, 4.0 / (1e-4 * 1e7 * 13.0));
    }

    #[test]
    fn test_resting_contact_has_zero_rhs() {
        let bodies = unit_bodies(-0.5, 0.5);
        let mut eq = touching_contact();
        assert_eq!(eq.compute_b(1.0 / 60.0, &bodies), 0.0);
        assert_eq!(eq.jacobian_a.spatial, -Vec3::x());
        assert_relative_eq!(eq.compute_gi_mgt(&bodies), 2.0);
    }

    #[test]
    fn test_penetration_pushes_apart() {
        let bodies = unit_bodies(-0.4, 0.4);
        let mut eq = touching_contact();
        // g = n . (xj + rj - xi - ri) = -0.2
        assert!(eq.compute_b(1.0 / 60.0, &bodies) > 0.0);
    }

    #[test]
    fn test_add_to_wlambda_is_equal_and_opposite() {
        let mut bodies = unit_bodies(-0.5, 0.5);
        let mut eq = touching_contact();
        eq.compute_b(1.0 / 60.0, &bodies);
        eq.add_to_wlambda(2.0, &mut bodies);
        assert_eq!(bodies[0].vlambda, Vec3::new(-2.0, 0.0, 0.0));
        assert_eq!(bodies[1].vlambda, Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(eq.compute_gw_lambda(&bodies), 4.0);
    }

    #[test]
    fn test_impact_velocity() {
        let mut bodies = unit_bodies(-0.5, 0.5);
        bodies[0].velocity = Vec3::new(1.0, 0.0, 0.0);
        bodies[1].velocity = Vec3::new(-1.0, 0.0, 0.0);
        let eq = touching_contact();
        assert_relative_eq!(eq.impact_velocity_along_normal(&bodies).unwrap(), 2.0);
        assert!(Equation::friction(0, 1, 1.0)
            .impact_velocity_along_normal(&bodies)
            .is_none());
    }

    #[test]
    fn test_rotational_row_error() {
        let bodies = unit_bodies(0.0, 1.0);
        let mut eq = Equation::rotational(0, 1, DEFAULT_MAX_FORCE);
        // Perpendicular axes satisfy the default 90 degree target.
        assert_relative_eq!(eq.compute_b(0.01, &bodies), 0.0, epsilon = 1e-12);

        eq.kind = EquationKind::Rotational {
            axis_a: Vec3::x(),
            axis_b: Vec3::new(1.0, 1.0, 0.0).normalize(),
            max_angle: std::f64::consts::FRAC_PI_2,
        };
        assert!(eq.compute_b(0.01, &bodies).abs() > 0.0);
    }
}
