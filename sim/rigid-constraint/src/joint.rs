//! User constraints (joints) built from equation rows.
//!
//! A [`Constraint`] owns a fixed set of [`Equation`]s. Each step the world
//! calls [`Constraint::update`] with the current body poses, which rewrites
//! the world-space anchors and axes of every row. The row count per kind
//! never changes after construction:
//!
//! | kind             | rows                                          |
//! |------------------|-----------------------------------------------|
//! | `Distance`       | 1 (bilateral contact row along the center line) |
//! | `PointToPoint`   | 3 (bilateral contact rows along world X, Y, Z) |
//! | `ConeTwist`      | 5 (point-to-point + cone + twist)             |
//! | `Hinge`          | 6 (point-to-point + 2 rotational + motor)     |
//! | `Lock`           | 6 (point-to-point + 3 rotational)             |
//!
//! Pivots and axes are given in each body's local frame.

use rigid_types::math::{Vec3, Vec3Ext};
use rigid_types::{BodyId, ConstraintId, Result, RigidError, Transform};
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::equation::{
    Equation, EquationKind, DEFAULT_MAX_FORCE, DEFAULT_RELAXATION, DEFAULT_STIFFNESS,
};

/// Rows owned by a constraint.
pub type ConstraintEquations = SmallVec<[Equation; 6]>;

/// Index of the motor row in a hinge.
const HINGE_MOTOR_ROW: usize = 5;

/// Joint type and its local-frame parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConstraintKind {
    /// Keeps the body centers at a fixed distance.
    Distance {
        /// Target distance.
        distance: f64,
    },
    /// Ball joint: pins a point of A to a point of B.
    PointToPoint {
        /// Pivot in A's frame.
        pivot_a: Vec3,
        /// Pivot in B's frame.
        pivot_b: Vec3,
    },
    /// Ball joint whose axes stay within a cone and a twist limit.
    ConeTwist {
        /// Pivot in A's frame.
        pivot_a: Vec3,
        /// Pivot in B's frame.
        pivot_b: Vec3,
        /// Cone axis in A's frame.
        axis_a: Vec3,
        /// Cone axis in B's frame.
        axis_b: Vec3,
        /// Cone half angle.
        angle: f64,
        /// Twist limit.
        twist_angle: f64,
    },
    /// Single rotational degree of freedom about a shared axis.
    Hinge {
        /// Pivot in A's frame.
        pivot_a: Vec3,
        /// Pivot in B's frame.
        pivot_b: Vec3,
        /// Hinge axis in A's frame.
        axis_a: Vec3,
        /// Hinge axis in B's frame.
        axis_b: Vec3,
        /// Whether the motor row is active.
        motor_enabled: bool,
    },
    /// Removes all relative motion.
    Lock {
        /// Pivot in A's frame.
        pivot_a: Vec3,
        /// Pivot in B's frame.
        pivot_b: Vec3,
        /// World X, Y, Z at construction, in A's frame.
        axes_a: [Vec3; 3],
        /// World X, Y, Z at construction, in B's frame.
        axes_b: [Vec3; 3],
    },
}

impl ConstraintKind {
    /// Number of equation rows this kind owns.
    #[must_use]
    pub fn num_equations(&self) -> usize {
        match self {
            Self::Distance { .. } => 1,
            Self::PointToPoint { .. } => 3,
            Self::ConeTwist { .. } => 5,
            Self::Hinge { .. } | Self::Lock { .. } => 6,
        }
    }

    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Distance { .. } => "distance",
            Self::PointToPoint { .. } => "point-to-point",
            Self::ConeTwist { .. } => "cone-twist",
            Self::Hinge { .. } => "hinge",
            Self::Lock { .. } => "lock",
        }
    }
}

/// Parameters of a cone-twist joint, in the bodies' local frames.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConeTwistParams {
    /// Pivot in A's frame.
    pub pivot_a: Vec3,
    /// Pivot in B's frame.
    pub pivot_b: Vec3,
    /// Cone axis in A's frame.
    pub axis_a: Vec3,
    /// Cone axis in B's frame.
    pub axis_b: Vec3,
    /// Cone half angle.
    pub angle: f64,
    /// Twist limit.
    pub twist_angle: f64,
}

impl Default for ConeTwistParams {
    fn default() -> Self {
        Self {
            pivot_a: Vec3::zeros(),
            pivot_b: Vec3::zeros(),
            axis_a: Vec3::x(),
            axis_b: Vec3::x(),
            angle: 0.0,
            twist_angle: 0.0,
        }
    }
}

/// A user constraint between two bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    id: ConstraintId,
    body_a: BodyId,
    body_b: BodyId,
    kind: ConstraintKind,
    collide_connected: bool,
    enabled: bool,
    stiffness: f64,
    relaxation: f64,
    equations: ConstraintEquations,
}

fn unit_axis(axis: &Vec3, what: &str) -> Result<Vec3> {
    let norm = axis.norm();
    if !norm.is_finite() || norm <= 0.0 {
        return Err(RigidError::invalid_constraint(format!(
            "{what} must be a non-zero finite vector"
        )));
    }
    Ok(axis / norm)
}

fn contact_row(max_force: f64) -> Equation {
    let mut eq = Equation::contact(0, 0, max_force);
    eq.set_force_range(-max_force, max_force);
    eq
}

fn point_to_point_rows(max_force: f64) -> ConstraintEquations {
    (0..3).map(|_| contact_row(max_force)).collect()
}

impl Constraint {
    fn build(
        body_a: BodyId,
        body_b: BodyId,
        kind: ConstraintKind,
        equations: ConstraintEquations,
    ) -> Result<Self> {
        if body_a == body_b {
            return Err(RigidError::invalid_constraint(format!(
                "{} constraint connects {body_a} to itself",
                kind.name()
            )));
        }
        debug_assert_eq!(equations.len(), kind.num_equations());
        Ok(Self {
            id: ConstraintId::next(),
            body_a,
            body_b,
            kind,
            collide_connected: true,
            enabled: true,
            stiffness: DEFAULT_STIFFNESS,
            relaxation: DEFAULT_RELAXATION,
            equations,
        })
    }

    /// Keep the centers of A and B `distance` apart.
    pub fn distance(body_a: BodyId, body_b: BodyId, distance: f64) -> Result<Self> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(RigidError::invalid_constraint(format!(
                "distance must be finite and non-negative, got {distance}"
            )));
        }
        let equations = std::iter::once(contact_row(DEFAULT_MAX_FORCE)).collect();
        Self::build(body_a, body_b, ConstraintKind::Distance { distance }, equations)
    }

    /// Pin `pivot_a` (in A's frame) to `pivot_b` (in B's frame).
    pub fn point_to_point(
        body_a: BodyId,
        pivot_a: Vec3,
        body_b: BodyId,
        pivot_b: Vec3,
    ) -> Result<Self> {
        Self::build(
            body_a,
            body_b,
            ConstraintKind::PointToPoint { pivot_a, pivot_b },
            point_to_point_rows(DEFAULT_MAX_FORCE),
        )
    }

    /// A ball joint limited to a cone around the joint axis and a twist angle.
    pub fn cone_twist(body_a: BodyId, body_b: BodyId, params: ConeTwistParams) -> Result<Self> {
        let axis_a = unit_axis(&params.axis_a, "cone axis A")?;
        let axis_b = unit_axis(&params.axis_b, "cone axis B")?;
        let mut equations = point_to_point_rows(DEFAULT_MAX_FORCE);

        // Cone and twist rows only push back towards the limit.
        let cone = Equation::cone(0, 0, DEFAULT_MAX_FORCE);
        let mut twist = Equation::rotational(0, 0, DEFAULT_MAX_FORCE);
        twist.set_force_range(-DEFAULT_MAX_FORCE, 0.0);
        equations.push(cone);
        equations.push(twist);

        Self::build(
            body_a,
            body_b,
            ConstraintKind::ConeTwist {
                pivot_a: params.pivot_a,
                pivot_b: params.pivot_b,
                axis_a,
                axis_b,
                angle: params.angle,
                twist_angle: params.twist_angle,
            },
            equations,
        )
    }

    /// A hinge about `axis_a` (in A's frame) / `axis_b` (in B's frame).
    ///
    /// The motor row starts disabled.
    pub fn hinge(
        body_a: BodyId,
        pivot_a: Vec3,
        axis_a: Vec3,
        body_b: BodyId,
        pivot_b: Vec3,
        axis_b: Vec3,
    ) -> Result<Self> {
        let axis_a = unit_axis(&axis_a, "hinge axis A")?;
        let axis_b = unit_axis(&axis_b, "hinge axis B")?;
        let mut equations = point_to_point_rows(DEFAULT_MAX_FORCE);
        equations.push(Equation::rotational(0, 0, DEFAULT_MAX_FORCE));
        equations.push(Equation::rotational(0, 0, DEFAULT_MAX_FORCE));
        let mut motor = Equation::rotational_motor(0, 0, DEFAULT_MAX_FORCE);
        motor.enabled = false;
        equations.push(motor);

        Self::build(
            body_a,
            body_b,
            ConstraintKind::Hinge {
                pivot_a,
                pivot_b,
                axis_a,
                axis_b,
                motor_enabled: false,
            },
            equations,
        )
    }

    /// Lock B to A in their current relative pose.
    ///
    /// The pivot is the midpoint of the two centers.
    pub fn lock(
        body_a: BodyId,
        pose_a: &Transform,
        body_b: BodyId,
        pose_b: &Transform,
    ) -> Result<Self> {
        let halfway = (pose_a.position + pose_b.position) * 0.5;
        let pivot_a = pose_a.point_to_local_frame(&halfway);
        let pivot_b = pose_b.point_to_local_frame(&halfway);
        let world = [Vec3::x(), Vec3::y(), Vec3::z()];
        let axes_a = world.map(|v| pose_a.vector_to_local_frame(&v));
        let axes_b = world.map(|v| pose_b.vector_to_local_frame(&v));

        let mut equations = point_to_point_rows(DEFAULT_MAX_FORCE);
        for _ in 0..3 {
            equations.push(Equation::rotational(0, 0, DEFAULT_MAX_FORCE));
        }
        Self::build(
            body_a,
            body_b,
            ConstraintKind::Lock {
                pivot_a,
                pivot_b,
                axes_a,
                axes_b,
            },
            equations,
        )
    }

    /// Set the force bound of every row.
    ///
    /// Bilateral rows get `[-max_force, max_force]`, cone and twist rows
    /// `[-max_force, 0]`.
    #[must_use]
    pub fn with_max_force(mut self, max_force: f64) -> Self {
        let one_sided = matches!(self.kind, ConstraintKind::ConeTwist { .. });
        for (i, eq) in self.equations.iter_mut().enumerate() {
            if one_sided && i >= 3 {
                eq.set_force_range(-max_force, 0.0);
            } else {
                eq.set_force_range(-max_force, max_force);
            }
        }
        self
    }

    /// Whether the connected bodies still collide with each other.
    ///
    /// Every kind starts out colliding, lock and cone-twist included. Pass
    /// `false` to drop the pair from the broadphase while the constraint is
    /// registered, which is usually wanted for joints whose bodies overlap.
    #[must_use]
    pub fn with_collide_connected(mut self, collide_connected: bool) -> Self {
        self.collide_connected = collide_connected;
        self
    }

    /// SPOOK stiffness and relaxation applied to every row on update.
    #[must_use]
    pub fn with_spook(mut self, stiffness: f64, relaxation: f64) -> Self {
        self.stiffness = stiffness;
        self.relaxation = relaxation;
        self
    }

    /// Unique id.
    #[must_use]
    pub fn id(&self) -> ConstraintId {
        self.id
    }

    /// First body.
    #[must_use]
    pub fn body_a(&self) -> BodyId {
        self.body_a
    }

    /// Second body.
    #[must_use]
    pub fn body_b(&self) -> BodyId {
        self.body_b
    }

    /// Joint type and parameters.
    #[must_use]
    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    /// Whether contacts between the connected bodies are generated.
    #[must_use]
    pub fn collide_connected(&self) -> bool {
        self.collide_connected
    }

    /// Whether the constraint takes part in solving.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether this constraint connects `a` and `b`, in either order.
    #[must_use]
    pub fn connects(&self, a: BodyId, b: BodyId) -> bool {
        (self.body_a == a && self.body_b == b) || (self.body_a == b && self.body_b == a)
    }

    /// The rows, in construction order.
    #[must_use]
    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    /// Mutable rows, for writing back solver multipliers.
    pub fn equations_mut(&mut self) -> &mut [Equation] {
        &mut self.equations
    }

    /// Enable every row. A hinge motor row follows the motor state.
    pub fn enable(&mut self) {
        self.enabled = true;
        let is_hinge = self.kind_is_hinge();
        let motor_enabled = self.motor_enabled();
        for (i, eq) in self.equations.iter_mut().enumerate() {
            eq.enabled = !is_hinge || i != HINGE_MOTOR_ROW || motor_enabled;
        }
    }

    /// Disable every row.
    pub fn disable(&mut self) {
        self.enabled = false;
        for eq in &mut self.equations {
            eq.enabled = false;
        }
    }

    fn kind_is_hinge(&self) -> bool {
        matches!(self.kind, ConstraintKind::Hinge { .. })
    }

    /// Whether the hinge motor is active. Always false for other kinds.
    #[must_use]
    pub fn motor_enabled(&self) -> bool {
        matches!(
            self.kind,
            ConstraintKind::Hinge {
                motor_enabled: true,
                ..
            }
        )
    }

    /// Turn the hinge motor on. No effect on other kinds.
    pub fn enable_motor(&mut self) {
        self.set_motor_state(true);
    }

    /// Turn the hinge motor off. No effect on other kinds.
    pub fn disable_motor(&mut self) {
        self.set_motor_state(false);
    }

    fn set_motor_state(&mut self, on: bool) {
        if let ConstraintKind::Hinge { motor_enabled, .. } = &mut self.kind {
            *motor_enabled = on;
            self.equations[HINGE_MOTOR_ROW].enabled = on && self.enabled;
        }
    }

    /// Target relative angular speed of the hinge motor.
    pub fn set_motor_speed(&mut self, speed: f64) {
        if !self.kind_is_hinge() {
            return;
        }
        if let EquationKind::RotationalMotor {
            target_velocity, ..
        } = &mut self.equations[HINGE_MOTOR_ROW].kind
        {
            *target_velocity = speed;
        }
    }

    /// Current hinge motor speed, if this is a hinge.
    #[must_use]
    pub fn motor_speed(&self) -> Option<f64> {
        if !self.kind_is_hinge() {
            return None;
        }
        match self.equations[HINGE_MOTOR_ROW].kind {
            EquationKind::RotationalMotor {
                target_velocity, ..
            } => Some(target_velocity),
            _ => None,
        }
    }

    /// Torque bound of the hinge motor.
    pub fn set_motor_max_force(&mut self, max_force: f64) {
        if self.kind_is_hinge() {
            self.equations[HINGE_MOTOR_ROW].set_force_range(-max_force, max_force);
        }
    }

    /// Rewrite every row from the current body poses.
    ///
    /// `slot_a` / `slot_b` are the bodies' positions in the solver body
    /// slice for this step.
    pub fn update(
        &mut self,
        slot_a: usize,
        pose_a: &Transform,
        slot_b: usize,
        pose_b: &Transform,
        dt: f64,
    ) {
        for eq in &mut self.equations {
            eq.body_a = slot_a;
            eq.body_b = slot_b;
            eq.set_spook_params(self.stiffness, self.relaxation, dt);
        }

        match self.kind {
            ConstraintKind::Distance { distance } => {
                let delta = pose_b.position - pose_a.position;
                let norm = delta.norm();
                let ni = if norm > 0.0 { delta / norm } else { Vec3::x() };
                self.equations[0].kind = EquationKind::Contact {
                    ri: ni * (distance * 0.5),
                    rj: -ni * (distance * 0.5),
                    ni,
                    restitution: 0.0,
                };
            }
            ConstraintKind::PointToPoint { pivot_a, pivot_b } => {
                self.update_pivots(&pivot_a, pose_a, &pivot_b, pose_b);
            }
            ConstraintKind::ConeTwist {
                pivot_a,
                pivot_b,
                axis_a,
                axis_b,
                angle,
                twist_angle,
            } => {
                self.update_pivots(&pivot_a, pose_a, &pivot_b, pose_b);
                self.equations[3].kind = EquationKind::Cone {
                    axis_a: pose_a.vector_to_world_frame(&axis_a),
                    axis_b: pose_b.vector_to_world_frame(&axis_b),
                    angle,
                };
                let (twist_a, _) = axis_a.tangents();
                let (twist_b, _) = axis_b.tangents();
                self.equations[4].kind = EquationKind::Rotational {
                    axis_a: pose_a.vector_to_world_frame(&twist_a),
                    axis_b: pose_b.vector_to_world_frame(&twist_b),
                    max_angle: twist_angle,
                };
            }
            ConstraintKind::Hinge {
                pivot_a,
                pivot_b,
                axis_a,
                axis_b,
                motor_enabled,
            } => {
                self.update_pivots(&pivot_a, pose_a, &pivot_b, pose_b);
                let world_a = pose_a.vector_to_world_frame(&axis_a);
                let world_b = pose_b.vector_to_world_frame(&axis_b);
                let (t1, t2) = world_a.tangents();
                for (row, tangent) in [(3, t1), (4, t2)] {
                    if let EquationKind::Rotational { axis_a, axis_b, .. } =
                        &mut self.equations[row].kind
                    {
                        *axis_a = tangent;
                        *axis_b = world_b;
                    }
                }
                if motor_enabled {
                    if let EquationKind::RotationalMotor { axis_a, axis_b, .. } =
                        &mut self.equations[HINGE_MOTOR_ROW].kind
                    {
                        *axis_a = world_a;
                        *axis_b = world_b;
                    }
                }
            }
            ConstraintKind::Lock {
                pivot_a,
                pivot_b,
                axes_a,
                axes_b,
            } => {
                self.update_pivots(&pivot_a, pose_a, &pivot_b, pose_b);
                // (xA, yB), (yA, zB), (zA, xB): each pair stays perpendicular.
                for i in 0..3 {
                    self.equations[3 + i].kind = EquationKind::Rotational {
                        axis_a: pose_a.vector_to_world_frame(&axes_a[i]),
                        axis_b: pose_b.vector_to_world_frame(&axes_b[(i + 1) % 3]),
                        max_angle: std::f64::consts::FRAC_PI_2,
                    };
                }
            }
        }
    }

    fn update_pivots(
        &mut self,
        pivot_a: &Vec3,
        pose_a: &Transform,
        pivot_b: &Vec3,
        pose_b: &Transform,
    ) {
        let ri = pose_a.vector_to_world_frame(pivot_a);
        let rj = pose_b.vector_to_world_frame(pivot_b);
        for (eq, ni) in self.equations[..3]
            .iter_mut()
            .zip([Vec3::x(), Vec3::y(), Vec3::z()])
        {
            eq.kind = EquationKind::Contact {
                ri,
                rj,
                ni,
                restitution: 0.0,
            };
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::solver::SolverBody;
    use approx::assert_relative_eq;
    use rigid_types::math::Quat;

    const DT: f64 = 1.0 / 60.0;

    fn ids() -> (BodyId, BodyId) {
        (BodyId::new(1), BodyId::new(2))
    }

    fn bodies_at(a: &Transform, b: &Transform) -> Vec<SolverBody> {
        vec![
            SolverBody::dynamic(a.position, 1.0, 1.0),
            SolverBody::dynamic(b.position, 1.0, 1.0),
        ]
    }

    fn assert_at_rest(constraint: &mut Constraint, a: &Transform, b: &Transform) {
        constraint.update(0, a, 1, b, DT);
        let bodies = bodies_at(a, b);
        for eq in constraint.equations_mut().iter_mut().filter(|eq| eq.enabled) {
            assert_relative_eq!(eq.compute_b(DT, &bodies), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_row_counts() {
        let (a, b) = ids();
        let pose_a = Transform::identity();
        let pose_b = Transform::from_position(Vec3::x());
        assert_eq!(Constraint::distance(a, b, 1.0).unwrap().equations().len(), 1);
        let p2p = Constraint::point_to_point(a, Vec3::zeros(), b, Vec3::zeros()).unwrap();
        assert_eq!(p2p.equations().len(), 3);
        let cone = Constraint::cone_twist(a, b, ConeTwistParams::default()).unwrap();
        assert_eq!(cone.equations().len(), 5);
        let hinge =
            Constraint::hinge(a, Vec3::zeros(), Vec3::z(), b, Vec3::zeros(), Vec3::z()).unwrap();
        assert_eq!(hinge.equations().len(), 6);
        let lock = Constraint::lock(a, &pose_a, b, &pose_b).unwrap();
        assert_eq!(lock.equations().len(), lock.kind().num_equations());
    }

    #[test]
    fn test_every_kind_collides_until_opted_out() {
        let (a, b) = ids();
        let pose_a = Transform::identity();
        let pose_b = Transform::from_position(Vec3::x());
        let all = [
            Constraint::distance(a, b, 1.0).unwrap(),
            Constraint::point_to_point(a, Vec3::zeros(), b, Vec3::zeros()).unwrap(),
            Constraint::cone_twist(a, b, ConeTwistParams::default()).unwrap(),
            Constraint::hinge(a, Vec3::zeros(), Vec3::z(), b, Vec3::zeros(), Vec3::z()).unwrap(),
            Constraint::lock(a, &pose_a, b, &pose_b).unwrap(),
        ];
        for constraint in all {
            assert!(constraint.collide_connected(), "{}", constraint.kind().name());
            assert!(!constraint.with_collide_connected(false).collide_connected());
        }
    }

    #[test]
    fn test_invalid_constraints() {
        let (a, b) = ids();
        assert!(Constraint::distance(a, a, 1.0).is_err());
        assert!(Constraint::distance(a, b, -1.0).is_err());
        assert!(
            Constraint::hinge(a, Vec3::zeros(), Vec3::zeros(), b, Vec3::zeros(), Vec3::z())
                .is_err()
        );
        let params = ConeTwistParams {
            axis_b: Vec3::new(f64::NAN, 0.0, 0.0),
            ..ConeTwistParams::default()
        };
        assert!(Constraint::cone_twist(a, b, params).is_err());
    }

    #[test]
    fn test_distance_row_measures_center_distance() {
        let (a, b) = ids();
        let pose_a = Transform::identity();
        let pose_b = Transform::from_position(Vec3::new(0.0, 3.0, 0.0));
        let mut c = Constraint::distance(a, b, 2.0).unwrap();
        c.update(0, &pose_a, 1, &pose_b, DT);

        let eq = &c.equations()[0];
        assert_eq!(eq.min_force, -DEFAULT_MAX_FORCE);
        match eq.kind {
            EquationKind::Contact { ri, rj, ni, .. } => {
                assert_relative_eq!(ni, Vec3::y());
                assert_relative_eq!(ri, Vec3::y());
                assert_relative_eq!(rj, -Vec3::y());
            }
            other => panic!("unexpected row {other:?}"),
        }

        let mut at_target = Constraint::distance(a, b, 3.0).unwrap();
        assert_at_rest(&mut at_target, &pose_a, &pose_b);
    }

    #[test]
    fn test_point_to_point_rotates_pivots() {
        let (a, b) = ids();
        let pose_a = Transform::new(
            Vec3::zeros(),
            Quat::from_axis_angle(&Vec3::z_axis(), std::f64::consts::FRAC_PI_2),
        );
        let pose_b = Transform::from_position(Vec3::new(0.0, 2.0, 0.0));
        let mut c = Constraint::point_to_point(a, Vec3::x(), b, -Vec3::y()).unwrap();
        c.update(0, &pose_a, 1, &pose_b, DT);
        match c.equations()[1].kind {
            EquationKind::Contact { ri, ni, .. } => {
                assert_relative_eq!(ri, Vec3::y(), epsilon = 1e-12);
                assert_eq!(ni, Vec3::y());
            }
            other => panic!("unexpected row {other:?}"),
        }
        assert_at_rest(&mut c, &pose_a, &pose_b);
    }

    #[test]
    fn test_hinge_motor_toggles() {
        let (a, b) = ids();
        let mut c = Constraint::hinge(
            a,
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::z(),
            b,
            Vec3::new(-0.5, 0.0, 0.0),
            Vec3::z(),
        )
        .unwrap();
        assert!(!c.motor_enabled());
        assert!(!c.equations()[HINGE_MOTOR_ROW].enabled);

        c.enable_motor();
        c.set_motor_speed(2.0);
        c.set_motor_max_force(10.0);
        assert_eq!(c.motor_speed(), Some(2.0));
        let motor = &c.equations()[HINGE_MOTOR_ROW];
        assert!(motor.enabled);
        assert_eq!((motor.min_force, motor.max_force), (-10.0, 10.0));

        let pose_a = Transform::identity();
        let pose_b = Transform::from_position(Vec3::x());
        c.update(0, &pose_a, 1, &pose_b, DT);
        match c.equations()[HINGE_MOTOR_ROW].kind {
            EquationKind::RotationalMotor { axis_a, axis_b, .. } => {
                assert_eq!(axis_a, Vec3::z());
                assert_eq!(axis_b, Vec3::z());
            }
            other => panic!("unexpected row {other:?}"),
        }

        c.disable_motor();
        assert!(!c.equations()[HINGE_MOTOR_ROW].enabled);
    }

    #[test]
    fn test_hinge_at_rest() {
        let (a, b) = ids();
        let mut c = Constraint::hinge(
            a,
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::z(),
            b,
            Vec3::new(-0.5, 0.0, 0.0),
            Vec3::z(),
        )
        .unwrap();
        let pose_a = Transform::identity();
        let pose_b = Transform::from_position(Vec3::x());
        assert_at_rest(&mut c, &pose_a, &pose_b);
    }

    #[test]
    fn test_lock_at_rest() {
        let (a, b) = ids();
        let pose_a = Transform::identity();
        let pose_b = Transform::new(
            Vec3::new(2.0, 0.0, 0.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 0.3),
        );
        let mut c = Constraint::lock(a, &pose_a, b, &pose_b).unwrap();
        match c.kind() {
            ConstraintKind::Lock { pivot_a, .. } => {
                assert_relative_eq!(*pivot_a, Vec3::x(), epsilon = 1e-12);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_at_rest(&mut c, &pose_a, &pose_b);
    }

    #[test]
    fn test_cone_twist_rows_push_one_way() {
        let (a, b) = ids();
        let c = Constraint::cone_twist(a, b, ConeTwistParams::default())
            .unwrap()
            .with_max_force(50.0);
        let eqs = c.equations();
        assert_eq!((eqs[0].min_force, eqs[0].max_force), (-50.0, 50.0));
        assert_eq!((eqs[3].min_force, eqs[3].max_force), (-50.0, 0.0));
        assert_eq!((eqs[4].min_force, eqs[4].max_force), (-50.0, 0.0));
    }

    #[test]
    fn test_disable_and_enable() {
        let (a, b) = ids();
        let mut c =
            Constraint::hinge(a, Vec3::zeros(), Vec3::z(), b, Vec3::zeros(), Vec3::z()).unwrap();
        c.disable();
        assert!(!c.is_enabled());
        assert!(c.equations().iter().all(|eq| !eq.enabled));
        c.enable();
        assert!(c.equations()[..5].iter().all(|eq| eq.enabled));
        assert!(!c.equations()[HINGE_MOTOR_ROW].enabled);
        assert!(c.connects(b, a));
    }
}
