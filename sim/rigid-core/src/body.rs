//! Rigid bodies.
//!
//! A [`Body`] owns its shapes (each with a local offset and orientation),
//! its mass properties and its motion state. Mass properties are derived
//! from the shapes whenever they change:
//!
//! - a single centered shape uses its own inertia
//! - anything else uses the inertia of the box bounding all shapes in the
//!   body frame
//!
//! # Sleep state machine
//!
//! ```text
//!            speed < limit               idle > time limit
//!   Awake ─────────────────▶ Sleepy ─────────────────────▶ Sleeping
//!     ▲                        │                              │
//!     └──── speed > limit ─────┘◀──── wake_up / contact ──────┘
//! ```

use rigid_shapes::convex::box_inertia;
use rigid_shapes::Shape;
use rigid_types::math::{integrate_quaternion, invert_mat3, normalize_fast, Mat3, Quat, Vec3};
use rigid_types::{Aabb, BodyId, Material, Result, RigidError, ShapeId, Transform};
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a body takes part in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BodyType {
    /// Moved by forces and contacts.
    #[default]
    Dynamic,
    /// Never moves; infinite mass.
    Static,
    /// Moved only by its velocity; infinite mass.
    Kinematic,
}

/// Sleep state of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SleepState {
    /// Simulated normally.
    #[default]
    Awake,
    /// Slow enough to fall asleep if it stays slow.
    Sleepy,
    /// Frozen until woken.
    Sleeping,
}

/// A change of [`SleepState`] reported by [`Body::sleep_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SleepTransition {
    /// Became sleepy.
    Sleepy,
    /// Fell asleep.
    Sleeping,
    /// Sped up again while sleepy.
    Awake,
}

/// A shape attached to a body, with its pose in the body frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyShape {
    /// The collision shape.
    pub shape: Shape,
    /// Offset from the body origin.
    pub offset: Vec3,
    /// Orientation relative to the body.
    pub orientation: Quat,
}

/// A rigid body.
///
/// Positions are of the center of mass. Pose and velocity fields are public;
/// call [`Body::mark_aabb_dirty`] after teleporting a body by hand, or use
/// [`Body::set_position`] and [`Body::set_quaternion`] which do it for you.
#[derive(Debug, Clone)]
pub struct Body {
    id: BodyId,
    body_type: BodyType,
    sleep_state: SleepState,

    mass: f64,
    inv_mass: f64,
    inertia: Vec3,
    inv_inertia: Vec3,
    inv_inertia_local: Mat3,
    isotropic: bool,
    inv_inertia_world: Mat3,
    inv_mass_solve: f64,
    inv_inertia_world_solve: Mat3,
    fixed_rotation: bool,

    /// Center of mass in world coordinates.
    pub position: Vec3,
    /// Orientation.
    pub quaternion: Quat,
    /// Linear velocity.
    pub velocity: Vec3,
    /// Angular velocity.
    pub angular_velocity: Vec3,
    /// Force accumulated for the next step.
    pub force: Vec3,
    /// Torque accumulated for the next step.
    pub torque: Vec3,

    previous_position: Vec3,
    previous_quaternion: Quat,
    interpolated_position: Vec3,
    interpolated_quaternion: Quat,

    /// Fraction of linear velocity lost per second, in `[0, 1]`.
    pub linear_damping: f64,
    /// Fraction of angular velocity lost per second, in `[0, 1]`.
    pub angular_damping: f64,
    /// Per-axis mask on linear motion.
    pub linear_factor: Vec3,
    /// Per-axis mask on angular motion.
    pub angular_factor: Vec3,

    /// Whether this body may fall asleep.
    pub allow_sleep: bool,
    /// Speed below which the body counts as idle.
    pub sleep_speed_limit: f64,
    /// Idle seconds before falling asleep.
    pub sleep_time_limit: f64,
    time_last_sleepy: f64,
    pub(crate) wake_up_after_narrowphase: bool,

    /// Group bits this body belongs to.
    pub collision_filter_group: u32,
    /// Groups this body collides with.
    pub collision_filter_mask: u32,
    /// Whether contacts with this body produce a solver response.
    pub collision_response: bool,
    /// Body material, used when a shape has none.
    pub material: Option<Material>,

    shapes: Vec<BodyShape>,
    bounding_radius: f64,
    aabb: Aabb,
    aabb_pose: Option<(Vec3, Quat)>,
    aabb_needs_update: bool,
}

impl Body {
    /// Create a body of the given mass at the origin.
    ///
    /// A zero mass makes the body static.
    #[must_use]
    pub fn new(mass: f64) -> Self {
        let body_type = if mass > 0.0 {
            BodyType::Dynamic
        } else {
            BodyType::Static
        };
        let mut body = Self {
            id: BodyId::next(),
            body_type,
            sleep_state: SleepState::Awake,
            mass,
            inv_mass: 0.0,
            inertia: Vec3::zeros(),
            inv_inertia: Vec3::zeros(),
            inv_inertia_local: Mat3::zeros(),
            isotropic: true,
            inv_inertia_world: Mat3::zeros(),
            inv_mass_solve: 0.0,
            inv_inertia_world_solve: Mat3::zeros(),
            fixed_rotation: false,
            position: Vec3::zeros(),
            quaternion: Quat::identity(),
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            force: Vec3::zeros(),
            torque: Vec3::zeros(),
            previous_position: Vec3::zeros(),
            previous_quaternion: Quat::identity(),
            interpolated_position: Vec3::zeros(),
            interpolated_quaternion: Quat::identity(),
            linear_damping: 0.01,
            angular_damping: 0.01,
            linear_factor: Vec3::repeat(1.0),
            angular_factor: Vec3::repeat(1.0),
            allow_sleep: true,
            sleep_speed_limit: 0.1,
            sleep_time_limit: 1.0,
            time_last_sleepy: 0.0,
            wake_up_after_narrowphase: false,
            collision_filter_group: 1,
            collision_filter_mask: u32::MAX,
            collision_response: true,
            material: None,
            shapes: Vec::new(),
            bounding_radius: 0.0,
            aabb: Aabb::empty(),
            aabb_pose: None,
            aabb_needs_update: true,
        };
        body.update_mass_properties();
        body
    }

    /// A static body at the origin.
    #[must_use]
    pub fn fixed() -> Self {
        Self::new(0.0)
    }

    /// A kinematic body at the origin.
    #[must_use]
    pub fn kinematic() -> Self {
        Self::new(0.0).with_type(BodyType::Kinematic)
    }

    /// Set the position, also resetting the previous and interpolated pose.
    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_position(position);
        self
    }

    /// Set the orientation, also resetting the previous and interpolated pose.
    #[must_use]
    pub fn with_quaternion(mut self, quaternion: Quat) -> Self {
        self.set_quaternion(quaternion);
        self
    }

    /// Set the linear velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the angular velocity.
    #[must_use]
    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Attach a shape at the body origin.
    #[must_use]
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.add_shape(shape, Vec3::zeros(), Quat::identity());
        self
    }

    /// Attach a shape at an offset.
    #[must_use]
    pub fn with_shape_at(mut self, shape: Shape, offset: Vec3, orientation: Quat) -> Self {
        self.add_shape(shape, offset, orientation);
        self
    }

    /// Override the body type.
    #[must_use]
    pub fn with_type(mut self, body_type: BodyType) -> Self {
        self.set_type(body_type);
        self
    }

    /// Set linear and angular damping.
    #[must_use]
    pub fn with_damping(mut self, linear: f64, angular: f64) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Set the body material.
    #[must_use]
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    /// Set the collision filter.
    #[must_use]
    pub fn with_collision_filter(mut self, group: u32, mask: u32) -> Self {
        self.collision_filter_group = group;
        self.collision_filter_mask = mask;
        self
    }

    /// Enable or disable the contact response.
    #[must_use]
    pub fn with_collision_response(mut self, response: bool) -> Self {
        self.collision_response = response;
        self
    }

    /// Enable or disable sleeping for this body.
    #[must_use]
    pub fn with_sleep(mut self, allow_sleep: bool) -> Self {
        self.allow_sleep = allow_sleep;
        self
    }

    /// Set the sleep thresholds.
    #[must_use]
    pub fn with_sleep_limits(mut self, speed_limit: f64, time_limit: f64) -> Self {
        self.sleep_speed_limit = speed_limit;
        self.sleep_time_limit = time_limit;
        self
    }

    /// Lock or unlock rotation.
    #[must_use]
    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self.update_mass_properties();
        self
    }

    /// Set per-axis masks on linear and angular motion.
    #[must_use]
    pub fn with_factors(mut self, linear: Vec3, angular: Vec3) -> Self {
        self.linear_factor = linear;
        self.angular_factor = angular;
        self
    }

    /// Process-unique id.
    #[must_use]
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Body type.
    #[must_use]
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Change the body type and refresh mass properties.
    pub fn set_type(&mut self, body_type: BodyType) {
        self.body_type = body_type;
        self.update_mass_properties();
    }

    /// Whether the body is dynamic.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// Whether the body is static.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    /// Whether the body is kinematic.
    #[must_use]
    pub fn is_kinematic(&self) -> bool {
        self.body_type == BodyType::Kinematic
    }

    /// Sleep state.
    #[must_use]
    pub fn sleep_state(&self) -> SleepState {
        self.sleep_state
    }

    /// Whether the body is asleep.
    #[must_use]
    pub fn is_sleeping(&self) -> bool {
        self.sleep_state == SleepState::Sleeping
    }

    /// Configured mass. Only dynamic bodies use it.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Inverse mass; zero unless dynamic.
    #[must_use]
    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    /// Principal moments of inertia in the body frame.
    #[must_use]
    pub fn inertia(&self) -> &Vec3 {
        &self.inertia
    }

    /// Inverse principal moments; zero on locked axes.
    #[must_use]
    pub fn inv_inertia(&self) -> &Vec3 {
        &self.inv_inertia
    }

    /// Inverse inertia tensor in world coordinates.
    #[must_use]
    pub fn inv_inertia_world(&self) -> &Mat3 {
        &self.inv_inertia_world
    }

    /// Inverse mass seen by the solver: zero while sleeping or kinematic.
    #[must_use]
    pub fn inv_mass_solve(&self) -> f64 {
        self.inv_mass_solve
    }

    /// World inverse inertia seen by the solver.
    #[must_use]
    pub fn inv_inertia_world_solve(&self) -> &Mat3 {
        &self.inv_inertia_world_solve
    }

    /// Whether rotation is locked.
    #[must_use]
    pub fn fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    /// Change the mass and refresh mass properties.
    ///
    /// Dynamic and static bodies switch type when crossing zero; kinematic
    /// bodies keep their type.
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
        if self.body_type != BodyType::Kinematic {
            self.body_type = if mass > 0.0 {
                BodyType::Dynamic
            } else {
                BodyType::Static
            };
        }
        self.update_mass_properties();
    }

    /// Lock or unlock rotation.
    pub fn set_fixed_rotation(&mut self, fixed: bool) {
        self.fixed_rotation = fixed;
        self.update_mass_properties();
    }

    /// Teleport the body, discarding interpolation history.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.previous_position = position;
        self.interpolated_position = position;
        self.aabb_needs_update = true;
    }

    /// Reorient the body, discarding interpolation history.
    pub fn set_quaternion(&mut self, quaternion: Quat) {
        self.quaternion = quaternion;
        self.previous_quaternion = quaternion;
        self.interpolated_quaternion = quaternion;
        self.aabb_needs_update = true;
        self.update_inertia_world(true);
    }

    /// Pose at the start of the last integration.
    #[must_use]
    pub fn previous_position(&self) -> &Vec3 {
        &self.previous_position
    }

    /// Orientation at the start of the last integration.
    #[must_use]
    pub fn previous_quaternion(&self) -> &Quat {
        &self.previous_quaternion
    }

    /// Position blended between the last two steps, for rendering.
    #[must_use]
    pub fn interpolated_position(&self) -> &Vec3 {
        &self.interpolated_position
    }

    /// Orientation blended between the last two steps, for rendering.
    #[must_use]
    pub fn interpolated_quaternion(&self) -> &Quat {
        &self.interpolated_quaternion
    }

    /// Blend the previous and current pose by `t` in `[0, 1]`.
    pub(crate) fn interpolate(&mut self, t: f64) {
        self.interpolated_position = self.previous_position.lerp(&self.position, t);
        let q = self
            .previous_quaternion
            .try_slerp(&self.quaternion, t, 1e-9)
            .unwrap_or_else(|| self.previous_quaternion.nlerp(&self.quaternion, t));
        self.interpolated_quaternion = q;
    }

    /// Current pose.
    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.quaternion)
    }

    /// Shapes attached to this body.
    #[must_use]
    pub fn shapes(&self) -> &[BodyShape] {
        &self.shapes
    }

    /// A shape by id.
    #[must_use]
    pub fn shape(&self, id: ShapeId) -> Option<&BodyShape> {
        self.shapes.iter().find(|s| s.shape.id == id)
    }

    /// Attach a shape and refresh mass properties and bounds.
    pub fn add_shape(&mut self, shape: Shape, offset: Vec3, orientation: Quat) -> ShapeId {
        let id = shape.id;
        self.shapes.push(BodyShape {
            shape,
            offset,
            orientation,
        });
        self.shapes_changed();
        id
    }

    /// Detach a shape by id.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| s.shape.id == id)?;
        let removed = self.shapes.remove(index);
        self.shapes_changed();
        Some(removed.shape)
    }

    fn shapes_changed(&mut self) {
        self.update_mass_properties();
        self.update_bounding_radius();
        self.aabb_needs_update = true;
    }

    /// World pose of an attached shape.
    #[must_use]
    pub fn shape_transform(&self, shape: &BodyShape) -> Transform {
        self.transform().compose(&shape.offset, &shape.orientation)
    }

    /// Radius of a sphere around the body origin enclosing every shape.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        self.bounding_radius
    }

    /// Recompute [`bounding_radius`](Self::bounding_radius).
    pub fn update_bounding_radius(&mut self) {
        self.bounding_radius = self
            .shapes
            .iter()
            .map(|s| s.offset.norm() + s.shape.bounding_sphere_radius())
            .fold(0.0, f64::max);
    }

    /// Recompute inverse mass and inertia from the mass and the shapes.
    pub fn update_mass_properties(&mut self) {
        self.inv_mass = if self.is_dynamic() && self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        };

        let single_centered = match self.shapes.as_slice() {
            [only] => only.offset == Vec3::zeros() && only.orientation == Quat::identity(),
            _ => false,
        };
        let mass = if self.is_dynamic() { self.mass } else { 0.0 };
        let inertia = if mass <= 0.0 || self.shapes.is_empty() {
            Vec3::zeros()
        } else if single_centered {
            self.shapes[0].shape.calculate_local_inertia(mass)
        } else {
            let mut local = Aabb::empty();
            for s in &self.shapes {
                local.extend(&s.shape.calculate_world_aabb(&s.offset, &s.orientation));
            }
            box_inertia(&local.half_extents(), mass)
        };
        self.set_principal_inertia(inertia);
    }

    fn set_principal_inertia(&mut self, inertia: Vec3) {
        self.inertia = inertia;
        self.inv_inertia = if self.fixed_rotation {
            Vec3::zeros()
        } else {
            inertia.map(|i| if i > 0.0 && i.is_finite() { 1.0 / i } else { 0.0 })
        };
        self.inv_inertia_local = Mat3::from_diagonal(&self.inv_inertia);
        self.isotropic =
            self.inv_inertia.x == self.inv_inertia.y && self.inv_inertia.y == self.inv_inertia.z;
        self.update_inertia_world(true);
    }

    /// Use a full local inertia tensor instead of the shape-derived one.
    ///
    /// Fails on a singular tensor.
    pub fn set_local_inertia_tensor(&mut self, tensor: &Mat3) -> Result<()> {
        let inverse = invert_mat3(tensor)?;
        self.inertia = tensor.diagonal();
        if self.fixed_rotation {
            self.inv_inertia = Vec3::zeros();
            self.inv_inertia_local = Mat3::zeros();
        } else {
            self.inv_inertia = inverse.diagonal();
            self.inv_inertia_local = inverse;
        }
        self.isotropic = self.inv_inertia_local == Mat3::identity() * self.inv_inertia_local[(0, 0)];
        self.update_inertia_world(true);
        Ok(())
    }

    /// Rotate the local inverse inertia into the world frame.
    ///
    /// Isotropic bodies are rotation invariant and skip the work unless
    /// `force` is set.
    pub fn update_inertia_world(&mut self, force: bool) {
        if self.isotropic && !force {
            return;
        }
        let r = self.quaternion.to_rotation_matrix();
        self.inv_inertia_world = r.matrix() * self.inv_inertia_local * r.matrix().transpose();
    }

    /// Refresh the inverse mass and inertia the solver sees.
    pub fn update_solve_mass_properties(&mut self) {
        if self.sleep_state == SleepState::Sleeping || self.body_type == BodyType::Kinematic {
            self.inv_mass_solve = 0.0;
            self.inv_inertia_world_solve = Mat3::zeros();
        } else {
            self.inv_mass_solve = self.inv_mass;
            self.inv_inertia_world_solve = self.inv_inertia_world;
        }
    }

    /// Current world bounds, cached until the pose or shapes change.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        if self.aabb_is_stale() {
            self.compute_aabb()
        } else {
            self.aabb
        }
    }

    /// Refresh the cached bounds if the body moved.
    pub fn update_aabb(&mut self) {
        if self.aabb_is_stale() {
            self.aabb = self.compute_aabb();
            self.aabb_pose = Some((self.position, self.quaternion));
            self.aabb_needs_update = false;
        }
    }

    /// Force the next [`update_aabb`](Self::update_aabb) to recompute.
    pub fn mark_aabb_dirty(&mut self) {
        self.aabb_needs_update = true;
    }

    fn aabb_is_stale(&self) -> bool {
        self.aabb_needs_update || self.aabb_pose != Some((self.position, self.quaternion))
    }

    fn compute_aabb(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for s in &self.shapes {
            let frame = self.shape_transform(s);
            aabb.extend(&s.shape.calculate_world_aabb(&frame.position, &frame.quaternion));
        }
        aabb
    }

    /// World point to body frame.
    #[must_use]
    pub fn point_to_local_frame(&self, world_point: &Vec3) -> Vec3 {
        self.transform().point_to_local_frame(world_point)
    }

    /// Body-frame point to world.
    #[must_use]
    pub fn point_to_world_frame(&self, local_point: &Vec3) -> Vec3 {
        self.transform().point_to_world_frame(local_point)
    }

    /// World vector to body frame.
    #[must_use]
    pub fn vector_to_local_frame(&self, world_vector: &Vec3) -> Vec3 {
        self.transform().vector_to_local_frame(world_vector)
    }

    /// Body-frame vector to world.
    #[must_use]
    pub fn vector_to_world_frame(&self, local_vector: &Vec3) -> Vec3 {
        self.transform().vector_to_world_frame(local_vector)
    }

    /// Velocity of a world point rigidly attached to the body.
    #[must_use]
    pub fn velocity_at_world_point(&self, world_point: &Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(&(world_point - self.position))
    }

    /// Add a force at a point relative to the center of mass (world axes).
    ///
    /// Only dynamic bodies are affected; a sleeping body wakes up.
    pub fn apply_force(&mut self, force: &Vec3, relative_point: &Vec3) {
        if !self.is_dynamic() {
            return;
        }
        self.wake_up();
        self.force += force;
        self.torque += relative_point.cross(force);
    }

    /// Like [`apply_force`](Self::apply_force), with force and point in the
    /// body frame.
    pub fn apply_local_force(&mut self, local_force: &Vec3, local_point: &Vec3) {
        let force = self.vector_to_world_frame(local_force);
        let point = self.vector_to_world_frame(local_point);
        self.apply_force(&force, &point);
    }

    /// Add a torque.
    pub fn apply_torque(&mut self, torque: &Vec3) {
        if !self.is_dynamic() {
            return;
        }
        self.wake_up();
        self.torque += torque;
    }

    /// Change velocity instantly by an impulse at a point relative to the
    /// center of mass (world axes).
    pub fn apply_impulse(&mut self, impulse: &Vec3, relative_point: &Vec3) {
        if !self.is_dynamic() {
            return;
        }
        self.wake_up();
        self.velocity += impulse * self.inv_mass;
        let angular = relative_point.cross(impulse);
        self.angular_velocity += self.inv_inertia_world * angular;
    }

    /// Like [`apply_impulse`](Self::apply_impulse), in the body frame.
    pub fn apply_local_impulse(&mut self, local_impulse: &Vec3, local_point: &Vec3) {
        let impulse = self.vector_to_world_frame(local_impulse);
        let point = self.vector_to_world_frame(local_point);
        self.apply_impulse(&impulse, &point);
    }

    /// Wake the body. Returns whether it was asleep.
    pub fn wake_up(&mut self) -> bool {
        let was_sleeping = self.sleep_state == SleepState::Sleeping;
        self.sleep_state = SleepState::Awake;
        self.wake_up_after_narrowphase = false;
        was_sleeping
    }

    /// Put the body to sleep, zeroing its velocities and forces.
    pub fn sleep(&mut self) {
        self.sleep_state = SleepState::Sleeping;
        self.velocity = Vec3::zeros();
        self.angular_velocity = Vec3::zeros();
        self.wake_up_after_narrowphase = false;
    }

    /// Advance the sleep state machine at world time `time`.
    pub fn sleep_tick(&mut self, time: f64) -> Option<SleepTransition> {
        if !self.allow_sleep || self.body_type == BodyType::Static {
            return None;
        }
        let speed_squared =
            self.velocity.norm_squared() + self.angular_velocity.norm_squared();
        let limit_squared = self.sleep_speed_limit * self.sleep_speed_limit;
        match self.sleep_state {
            SleepState::Awake if speed_squared < limit_squared => {
                self.sleep_state = SleepState::Sleepy;
                self.time_last_sleepy = time;
                Some(SleepTransition::Sleepy)
            }
            SleepState::Sleepy if speed_squared > limit_squared => {
                self.sleep_state = SleepState::Awake;
                Some(SleepTransition::Awake)
            }
            SleepState::Sleepy if time - self.time_last_sleepy > self.sleep_time_limit => {
                self.sleep();
                Some(SleepTransition::Sleeping)
            }
            _ => None,
        }
    }

    /// Zero accumulated force and torque.
    pub fn clear_forces(&mut self) {
        self.force = Vec3::zeros();
        self.torque = Vec3::zeros();
    }

    /// Semi-implicit Euler step.
    ///
    /// Velocities are updated from the accumulated force and torque first,
    /// then the pose from the new velocities. Static and sleeping bodies
    /// only record their pose as the previous one.
    ///
    /// If the new state is not finite the body is put back at its previous
    /// pose with zero velocity and `false` is returned.
    pub fn integrate(&mut self, dt: f64, quat_normalize: bool, quat_normalize_fast: bool) -> bool {
        self.previous_position = self.position;
        self.previous_quaternion = self.quaternion;

        if self.body_type == BodyType::Static || self.sleep_state == SleepState::Sleeping {
            return true;
        }

        let lf = self.linear_factor;
        let af = self.angular_factor;
        self.velocity += (self.force * self.inv_mass * dt).component_mul(&lf);
        let angular_accel = self.inv_inertia_world * self.torque.component_mul(&af);
        self.angular_velocity += (angular_accel * dt).component_mul(&af);

        self.position += self.velocity * dt;

        let q = integrate_quaternion(self.quaternion.quaternion(), &self.angular_velocity, dt, &af);
        self.quaternion = if quat_normalize {
            if quat_normalize_fast {
                Quat::new_unchecked(normalize_fast(&q))
            } else {
                Quat::new_normalize(q)
            }
        } else {
            Quat::new_unchecked(q)
        };

        self.aabb_needs_update = true;
        self.update_inertia_world(false);

        if self.state_is_finite() {
            return true;
        }
        warn!(body = %self.id, "non-finite state after integration, restoring previous pose");
        self.position = self.previous_position;
        self.quaternion = self.previous_quaternion;
        self.velocity = Vec3::zeros();
        self.angular_velocity = Vec3::zeros();
        self.update_inertia_world(true);
        false
    }

    /// Whether pose and velocities are all finite.
    #[must_use]
    pub fn state_is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.quaternion.coords.iter().all(|v| v.is_finite())
            && self.velocity.iter().all(|v| v.is_finite())
            && self.angular_velocity.iter().all(|v| v.is_finite())
    }

    /// Check the body's settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.mass >= 0.0 && self.mass.is_finite()) {
            return Err(RigidError::invalid_config(format!(
                "{}: mass must be finite and non-negative, got {}",
                self.id, self.mass
            )));
        }
        if !(0.0..=1.0).contains(&self.linear_damping) || !(0.0..=1.0).contains(&self.angular_damping)
        {
            return Err(RigidError::invalid_config(format!(
                "{}: damping must lie in [0, 1]",
                self.id
            )));
        }
        if !self.state_is_finite() {
            return Err(RigidError::diverged(format!("{} has a non-finite state", self.id)));
        }
        Ok(())
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::new(1.0)
    }
}
