//! The simulation world.
//!
//! A [`World`] owns the bodies, the user constraints, the contact material
//! table and every per-step scratch structure. One call to [`World::step`]
//! runs the whole pipeline:
//!
//! ```text
//! gravity → broadphase → strip jointed pairs → tick collision state
//!         → narrowphase → wake-ups → gather equations → solve
//!         → damping → PreStep → integrate → PostStep
//!         → sleep tick → begin/end contact diff
//! ```
//!
//! Bodies live in a dense vector. Equations address them by slot, and the
//! slot of a body shifts down by one when an earlier body is removed; ids
//! never change.

use hashbrown::HashMap;
use rigid_constraint::{solver_from_config, Constraint, Equation, Solver, SolverBody};
use rigid_types::math::Vec3;
use rigid_types::{
    Aabb, BodyId, ConstraintId, ContactDefaults, ContactMaterial, ContactMaterialTable,
    MaterialId, Result, RigidError, ShapeId, WorldConfig,
};
use tracing::{debug, trace, warn};

use crate::body::{Body, BodyShape, SleepState, SleepTransition};
use crate::broad_phase::{broadphase_from_config, Broadphase};
use crate::collision_matrix::{CollisionMatrix, Key, ObjectCollisionMatrix};
use crate::events::WorldEvent;
use crate::narrow_phase::{NarrowPhase, StepContext};
use crate::overlap::OverlapKeeper;
use crate::raycast::{Ray, RayMode, RaycastResult};

/// The simulation world containing all bodies and constraints.
#[derive(Debug)]
pub struct World {
    /// World configuration.
    config: WorldConfig,
    /// Bodies in insertion order.
    bodies: Vec<Body>,
    /// Body id to slot in `bodies`.
    slots: HashMap<BodyId, usize>,
    /// User constraints in insertion order.
    constraints: Vec<Constraint>,
    /// Pair-specific contact parameters.
    contact_materials: ContactMaterialTable,
    /// Used when no pair-specific entry exists.
    default_contact_material: ContactMaterial,
    broadphase: Box<dyn Broadphase>,
    narrowphase: NarrowPhase,
    solver: Box<dyn Solver>,
    /// Pairs that produced a contact this step.
    collision_matrix: ObjectCollisionMatrix,
    /// Pairs that produced a contact last step.
    collision_matrix_previous: ObjectCollisionMatrix,
    body_overlaps: OverlapKeeper<BodyId>,
    shape_overlaps: OverlapKeeper<(ShapeId, BodyId)>,
    /// Events queued since the last drain.
    events: Vec<WorldEvent>,
    /// Simulated time.
    time: f64,
    /// Fixed steps taken.
    step_number: u64,
    /// Unsimulated time carried between interpolating steps.
    accumulator: f64,

    // Scratch reused across steps.
    pairs: Vec<(usize, usize)>,
    solver_bodies: Vec<SolverBody>,
    equations: Vec<Equation>,
    joint_owners: Vec<usize>,
}

impl Default for World {
    fn default() -> Self {
        Self::build(WorldConfig::default())
    }
}

impl World {
    /// Create an empty world.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: WorldConfig) -> Self {
        let default_contact_material = contact_material_from(MaterialId::next(), &config.contact);
        let broadphase = broadphase_from_config(&config);
        let solver = solver_from_config(&config.solver);
        debug!(
            broadphase = broadphase.name(),
            gravity = ?config.gravity,
            "world created"
        );
        Self {
            config,
            bodies: Vec::new(),
            slots: HashMap::new(),
            constraints: Vec::new(),
            contact_materials: ContactMaterialTable::new(),
            default_contact_material,
            broadphase,
            narrowphase: NarrowPhase::new(),
            solver,
            collision_matrix: ObjectCollisionMatrix::new(),
            collision_matrix_previous: ObjectCollisionMatrix::new(),
            body_overlaps: OverlapKeeper::new(),
            shape_overlaps: OverlapKeeper::new(),
            events: Vec::new(),
            time: 0.0,
            step_number: 0,
            accumulator: 0.0,
            pairs: Vec::new(),
            solver_bodies: Vec::new(),
            equations: Vec::new(),
            joint_owners: Vec::new(),
        }
    }

    /// The world configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Gravitational acceleration.
    #[must_use]
    pub fn gravity(&self) -> Vec3 {
        self.config.gravity
    }

    /// Change the gravitational acceleration.
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = gravity;
    }

    /// Simulated time in seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of fixed steps taken.
    #[must_use]
    pub fn step_number(&self) -> u64 {
        self.step_number
    }

    /// Number of bodies.
    #[must_use]
    pub fn num_objects(&self) -> usize {
        self.bodies.len()
    }

    // =========================================================================
    // Body Management
    // =========================================================================

    /// Add a body and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the body fails validation or is already in the
    /// world.
    pub fn add_body(&mut self, mut body: Body) -> Result<BodyId> {
        body.validate()?;
        let id = body.id();
        if self.slots.contains_key(&id) {
            return Err(RigidError::invalid_config(format!(
                "{id} is already in the world"
            )));
        }
        body.update_aabb();
        let slot = self.bodies.len();
        self.bodies.push(body);
        self.slots.insert(id, slot);
        self.broadphase.body_added(slot);
        self.events.push(WorldEvent::BodyAdded(id));
        debug!(body = %id, slot, "body added");
        Ok(id)
    }

    /// Remove a body and hand it back.
    ///
    /// Later bodies move down one slot. Constraints attached to the body
    /// stay registered and are skipped until removed.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let Some(slot) = self.slots.remove(&id) else {
            warn!(body = %id, "remove_body: body is not in the world");
            return None;
        };
        let body = self.bodies.remove(slot);
        for (s, b) in self.bodies.iter().enumerate().skip(slot) {
            self.slots.insert(b.id(), s);
        }
        self.broadphase.body_removed(slot);
        // Pooled rows hold slots that are now stale.
        self.narrowphase.recycle();
        self.events.push(WorldEvent::BodyRemoved(id));
        debug!(body = %id, slot, "body removed");
        Some(body)
    }

    /// A body by id.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.slots.get(&id).map(|&slot| &self.bodies[slot])
    }

    /// A mutable body by id.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        let slot = *self.slots.get(&id)?;
        self.broadphase.mark_dirty();
        Some(&mut self.bodies[slot])
    }

    /// All bodies, by slot.
    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Current slot of a body.
    #[must_use]
    pub fn body_slot(&self, id: BodyId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    /// A shape by id, with the id of the body it is attached to.
    #[must_use]
    pub fn shape_by_id(&self, id: ShapeId) -> Option<(BodyId, &BodyShape)> {
        self.bodies
            .iter()
            .find_map(|b| b.shape(id).map(|s| (b.id(), s)))
    }

    // =========================================================================
    // Constraint Management
    // =========================================================================

    /// Register a constraint.
    ///
    /// # Errors
    ///
    /// Returns [`RigidError::UnknownBody`] if either body is not in the world.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ConstraintId> {
        for body in [constraint.body_a(), constraint.body_b()] {
            if !self.slots.contains_key(&body) {
                return Err(RigidError::UnknownBody(body));
            }
        }
        let id = constraint.id();
        debug!(constraint = %id, kind = constraint.kind().name(), "constraint added");
        self.constraints.push(constraint);
        Ok(id)
    }

    /// Unregister a constraint and hand it back.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Option<Constraint> {
        let Some(index) = self.constraints.iter().position(|c| c.id() == id) else {
            warn!(constraint = %id, "remove_constraint: constraint is not in the world");
            return None;
        };
        Some(self.constraints.remove(index))
    }

    /// A constraint by id.
    #[must_use]
    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.id() == id)
    }

    /// A mutable constraint by id.
    pub fn constraint_mut(&mut self, id: ConstraintId) -> Option<&mut Constraint> {
        self.constraints.iter_mut().find(|c| c.id() == id)
    }

    /// All constraints.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    // =========================================================================
    // Contact Materials
    // =========================================================================

    /// Register contact parameters for a material pair, replacing any
    /// previous entry for the same pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid.
    pub fn add_contact_material(&mut self, contact_material: ContactMaterial) -> Result<()> {
        contact_material.validate()?;
        self.contact_materials.insert(contact_material);
        Ok(())
    }

    /// Drop the entry for a material pair.
    pub fn remove_contact_material(
        &mut self,
        a: MaterialId,
        b: MaterialId,
    ) -> Option<ContactMaterial> {
        self.contact_materials.remove(a, b)
    }

    /// The entry for a material pair, in either order.
    #[must_use]
    pub fn contact_material(&self, a: MaterialId, b: MaterialId) -> Option<&ContactMaterial> {
        self.contact_materials.get(a, b)
    }

    /// Parameters used for pairs without an entry.
    #[must_use]
    pub fn default_contact_material(&self) -> &ContactMaterial {
        &self.default_contact_material
    }

    /// Replace the fallback contact parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid.
    pub fn set_default_contact_material(&mut self, contact_material: ContactMaterial) -> Result<()> {
        contact_material.validate()?;
        self.default_contact_material = contact_material;
        Ok(())
    }

    // =========================================================================
    // Force Application
    // =========================================================================

    /// Zero the force and torque accumulators of every body.
    pub fn clear_forces(&mut self) {
        for body in &mut self.bodies {
            body.clear_forces();
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Contact rows of the last step.
    #[must_use]
    pub fn contacts(&self) -> &[Equation] {
        self.narrowphase.contacts()
    }

    /// Friction rows of the last step.
    #[must_use]
    pub fn friction_equations(&self) -> &[Equation] {
        self.narrowphase.friction_equations()
    }

    /// Ids of bodies whose AABB overlaps `aabb`, in slot order.
    pub fn aabb_query(&mut self, aabb: &Aabb) -> Vec<BodyId> {
        for body in &mut self.bodies {
            body.update_aabb();
        }
        let mut slots = Vec::new();
        self.broadphase.aabb_query(&self.bodies, aabb, &mut slots);
        slots.sort_unstable();
        slots.dedup();
        slots.into_iter().map(|s| self.bodies[s].id()).collect()
    }

    /// Nearest hit along the ray. Returns whether anything was hit.
    pub fn raycast_closest(&mut self, ray: &Ray, result: &mut RaycastResult) -> bool {
        let ray = ray.clone().with_mode(RayMode::Closest);
        self.raycast(&ray, result, |_| {})
    }

    /// Stop at the first hit found. Returns whether anything was hit.
    pub fn raycast_any(&mut self, ray: &Ray, result: &mut RaycastResult) -> bool {
        let ray = ray.clone().with_mode(RayMode::Any);
        self.raycast(&ray, result, |_| {})
    }

    /// Call `on_hit` for every hit; it may [`abort`](RaycastResult::abort)
    /// the cast. Returns whether anything was hit.
    pub fn raycast_all<F>(&mut self, ray: &Ray, on_hit: F) -> bool
    where
        F: FnMut(&mut RaycastResult),
    {
        let ray = ray.clone().with_mode(RayMode::All);
        let mut result = RaycastResult::new();
        self.raycast(&ray, &mut result, on_hit)
    }

    fn raycast<F>(&mut self, ray: &Ray, result: &mut RaycastResult, on_hit: F) -> bool
    where
        F: FnMut(&mut RaycastResult),
    {
        for body in &mut self.bodies {
            body.update_aabb();
        }
        let mut candidates = Vec::new();
        self.broadphase
            .aabb_query(&self.bodies, &ray.aabb(), &mut candidates);
        candidates.sort_unstable();
        candidates.dedup();
        ray.intersect_bodies(&self.bodies, &candidates, result, on_hit)
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Take the events queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, WorldEvent> {
        self.events.drain(..)
    }

    // =========================================================================
    // Simulation Control
    // =========================================================================

    /// Advance by one fixed step of `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`RigidError::InvalidTimestep`] if `dt` is not a positive
    /// finite number.
    pub fn step(&mut self, dt: f64) -> Result<()> {
        check_timestep(dt)?;
        self.internal_step(dt);
        Ok(())
    }

    /// Advance by wall-clock time `elapsed` in fixed steps of `dt`, then
    /// interpolate every body between its last two poses.
    ///
    /// At most `max_substeps` fixed steps run per call (at least one). Time
    /// the cap leaves unsimulated is dropped. Returns the number of steps
    /// taken.
    ///
    /// # Errors
    ///
    /// Returns [`RigidError::InvalidTimestep`] if `dt` is not positive and
    /// finite or `elapsed` is negative or not finite.
    pub fn step_with_interpolation(
        &mut self,
        dt: f64,
        elapsed: f64,
        max_substeps: u32,
    ) -> Result<u32> {
        check_timestep(dt)?;
        if !(elapsed >= 0.0 && elapsed.is_finite()) {
            return Err(RigidError::InvalidTimestep(elapsed));
        }

        self.accumulator += elapsed;
        let cap = max_substeps.max(1);
        let mut substeps = 0;
        while self.accumulator >= dt && substeps < cap {
            self.internal_step(dt);
            self.accumulator -= dt;
            substeps += 1;
        }
        if self.accumulator >= dt {
            debug!(
                backlog = self.accumulator,
                cap, "substep cap reached, dropping backlog"
            );
        }
        self.accumulator %= dt;

        let t = self.accumulator / dt;
        for body in &mut self.bodies {
            body.interpolate(t);
        }
        Ok(substeps)
    }

    /// Swap the current and previous collision matrices and clear the
    /// current one.
    pub fn collision_matrix_tick(&mut self) {
        std::mem::swap(&mut self.collision_matrix, &mut self.collision_matrix_previous);
        self.collision_matrix.reset();
    }

    fn internal_step(&mut self, dt: f64) {
        let gravity = self.config.gravity;
        for body in &mut self.bodies {
            if body.is_dynamic() {
                body.force += gravity * body.mass();
            }
            body.update_aabb();
        }

        self.pairs.clear();
        self.broadphase.collision_pairs(&self.bodies, &mut self.pairs);
        self.strip_jointed_pairs();

        self.collision_matrix_tick();
        self.body_overlaps.tick();
        self.shape_overlaps.tick();

        self.narrowphase.recycle();
        let context = StepContext {
            dt,
            gravity: gravity.norm(),
            friction_reduction: self.config.friction_reduction,
            materials: &self.contact_materials,
            default_material: &self.default_contact_material,
        };
        self.narrowphase
            .get_contacts(&self.pairs, &self.bodies, &context);
        self.record_contacts();

        for body in &mut self.bodies {
            if body.wake_up_after_narrowphase && body.wake_up() {
                self.events.push(WorldEvent::WakeUp(body.id()));
            }
        }

        self.solve(dt);

        for body in &mut self.bodies {
            if !body.is_dynamic() {
                continue;
            }
            body.velocity *= (1.0 - body.linear_damping).powf(dt);
            body.angular_velocity *= (1.0 - body.angular_damping).powf(dt);
        }
        self.events.push(WorldEvent::PreStep);

        let normalize = self.step_number % (u64::from(self.config.quat_normalize_skip) + 1) == 0;
        let fast = self.config.quat_normalize_fast;
        for body in &mut self.bodies {
            body.integrate(dt, normalize, fast);
            body.clear_forces();
        }
        self.broadphase.mark_dirty();

        self.time += dt;
        self.step_number += 1;
        self.events.push(WorldEvent::PostStep);

        if self.config.allow_sleep {
            for body in &mut self.bodies {
                match body.sleep_tick(self.time) {
                    Some(SleepTransition::Sleepy) => self.events.push(WorldEvent::Sleepy(body.id())),
                    Some(SleepTransition::Sleeping) => self.events.push(WorldEvent::Sleep(body.id())),
                    Some(SleepTransition::Awake) | None => {}
                }
            }
        }

        self.emit_overlap_events();
        trace!(
            step = self.step_number,
            pairs = self.pairs.len(),
            contacts = self.narrowphase.contacts().len(),
            "step done"
        );
    }

    /// Drop pairs held together by a constraint that disables collisions.
    fn strip_jointed_pairs(&mut self) {
        if self.constraints.iter().all(Constraint::collide_connected) {
            return;
        }
        let bodies = &self.bodies;
        let constraints = &self.constraints;
        self.pairs.retain(|&(i, j)| {
            let (a, b) = (bodies[i].id(), bodies[j].id());
            !constraints
                .iter()
                .any(|c| !c.collide_connected() && c.connects(a, b))
        });
    }

    /// Wake-up flags, collide events and overlap bookkeeping for the rows
    /// the narrowphase just produced.
    fn record_contacts(&mut self) {
        for eq in self.narrowphase.contacts() {
            let (i, j) = (eq.body_a, eq.body_b);
            let wake_i = wakes(&self.bodies[i], &self.bodies[j]);
            let wake_j = wakes(&self.bodies[j], &self.bodies[i]);
            if wake_i {
                self.bodies[i].wake_up_after_narrowphase = true;
            }
            if wake_j {
                self.bodies[j].wake_up_after_narrowphase = true;
            }

            let a = Key::new(self.bodies[i].id(), i);
            let b = Key::new(self.bodies[j].id(), j);
            if !self.collision_matrix.get(a, b) {
                self.collision_matrix.set(a, b, true);
                if !self.collision_matrix_previous.get(a, b) {
                    self.events.push(WorldEvent::Collide {
                        body_a: a.id,
                        body_b: b.id,
                        shape_a: eq.shape_a,
                        shape_b: eq.shape_b,
                        contact: eq.id,
                    });
                }
            }

            self.body_overlaps.set(a.id, b.id);
            if let (Some(sa), Some(sb)) = (eq.shape_a, eq.shape_b) {
                self.shape_overlaps.set((sa, a.id), (sb, b.id));
            }
        }

        for overlap in self.narrowphase.overlaps() {
            let a = self.bodies[overlap.body_a].id();
            let b = self.bodies[overlap.body_b].id();
            self.body_overlaps.set(a, b);
            self.shape_overlaps
                .set((overlap.shape_a, a), (overlap.shape_b, b));
        }
    }

    /// Gather contact, friction and joint rows, solve them and write the
    /// velocities and multipliers back.
    fn solve(&mut self, dt: f64) {
        self.solver_bodies.clear();
        for body in &mut self.bodies {
            body.update_solve_mass_properties();
            let mut sb = SolverBody::fixed(body.position);
            sb.velocity = body.velocity;
            sb.angular_velocity = body.angular_velocity;
            sb.force = body.force;
            sb.torque = body.torque;
            sb.inv_mass_solve = body.inv_mass_solve();
            sb.inv_inertia_world_solve = *body.inv_inertia_world_solve();
            sb.linear_factor = body.linear_factor;
            sb.angular_factor = body.angular_factor;
            sb.propagates = body.is_dynamic() && !body.is_sleeping();
            self.solver_bodies.push(sb);
        }

        self.equations.clear();
        self.equations
            .extend_from_slice(self.narrowphase.friction_equations());
        self.equations.extend_from_slice(self.narrowphase.contacts());

        self.joint_owners.clear();
        for (index, constraint) in self.constraints.iter_mut().enumerate() {
            if !constraint.is_enabled() {
                continue;
            }
            let (Some(&sa), Some(&sb)) = (
                self.slots.get(&constraint.body_a()),
                self.slots.get(&constraint.body_b()),
            ) else {
                trace!(constraint = %constraint.id(), "skipping constraint on a removed body");
                continue;
            };
            let (pose_a, pose_b) = (self.bodies[sa].transform(), self.bodies[sb].transform());
            constraint.update(sa, &pose_a, sb, &pose_b, dt);
            self.equations.extend_from_slice(constraint.equations());
            self.joint_owners.push(index);
        }

        if self.equations.is_empty() {
            return;
        }
        let iterations = self
            .solver
            .solve(dt, &mut self.solver_bodies, &mut self.equations);
        trace!(equations = self.equations.len(), iterations, "solved");

        for (body, sb) in self.bodies.iter_mut().zip(&self.solver_bodies) {
            if body.is_dynamic() {
                body.velocity = sb.velocity;
                body.angular_velocity = sb.angular_velocity;
            }
        }

        let friction_len = self.narrowphase.friction_equations().len();
        let contact_len = self.narrowphase.contacts().len();
        let (friction_rows, rest) = self.equations.split_at(friction_len);
        let (contact_rows, mut joint_rows) = rest.split_at(contact_len);
        copy_multipliers(self.narrowphase.friction_equations_mut(), friction_rows);
        copy_multipliers(self.narrowphase.contacts_mut(), contact_rows);
        for &index in &self.joint_owners {
            let rows = self.constraints[index].equations_mut();
            let (solved, later) = joint_rows.split_at(rows.len());
            copy_multipliers(rows, solved);
            joint_rows = later;
        }
    }

    fn emit_overlap_events(&mut self) {
        let mut begun = Vec::new();
        let mut ended = Vec::new();
        self.body_overlaps.diff(&mut begun, &mut ended);
        for (body_a, body_b) in begun.drain(..) {
            self.events.push(WorldEvent::BeginContact { body_a, body_b });
        }
        for (body_a, body_b) in ended.drain(..) {
            self.events.push(WorldEvent::EndContact { body_a, body_b });
        }

        let mut shapes_begun = Vec::new();
        let mut shapes_ended = Vec::new();
        self.shape_overlaps.diff(&mut shapes_begun, &mut shapes_ended);
        for ((shape_a, body_a), (shape_b, body_b)) in shapes_begun {
            self.events.push(WorldEvent::BeginShapeContact {
                shape_a,
                shape_b,
                body_a,
                body_b,
            });
        }
        for ((shape_a, body_a), (shape_b, body_b)) in shapes_ended {
            self.events.push(WorldEvent::EndShapeContact {
                shape_a,
                shape_b,
                body_a,
                body_b,
            });
        }
    }

    /// Check the configuration and every body for invalid or non-finite
    /// state.
    ///
    /// # Errors
    ///
    /// Returns [`RigidError::Diverged`] for non-finite body state, or the
    /// first validation error found.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        for body in &self.bodies {
            if !body.state_is_finite() {
                return Err(RigidError::diverged(format!(
                    "{} has non-finite state at t={}",
                    body.id(),
                    self.time
                )));
            }
            body.validate()?;
        }
        Ok(())
    }
}

fn check_timestep(dt: f64) -> Result<()> {
    if dt > 0.0 && dt.is_finite() {
        Ok(())
    } else {
        Err(RigidError::InvalidTimestep(dt))
    }
}

fn contact_material_from(id: MaterialId, defaults: &ContactDefaults) -> ContactMaterial {
    ContactMaterial::world_default(id)
        .with_friction(defaults.friction)
        .with_restitution(defaults.restitution)
        .with_contact_spook(defaults.contact_stiffness, defaults.contact_relaxation)
        .with_friction_spook(defaults.friction_stiffness, defaults.friction_relaxation)
}

/// Whether touching `other` wakes the sleeping `sleeper`.
fn wakes(sleeper: &Body, other: &Body) -> bool {
    sleeper.is_dynamic()
        && sleeper.allow_sleep
        && sleeper.is_sleeping()
        && !other.is_static()
        && other.sleep_state() == SleepState::Awake
        && other.velocity.norm_squared() + other.angular_velocity.norm_squared()
            >= 2.0 * other.sleep_speed_limit * other.sleep_speed_limit
}

fn copy_multipliers(dst: &mut [Equation], src: &[Equation]) {
    for (d, s) in dst.iter_mut().zip(src) {
        d.multiplier = s.multiplier;
    }
}
