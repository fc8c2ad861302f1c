//! Narrowphase: exact contacts for the body pairs the broadphase kept.
//!
//! Every shape of one body is tested against every shape of the other. A
//! shape pair is dispatched on its two [`ShapeKind`]s with the lower kind
//! first, so each combination has a single routine and the contact normal
//! points out of the lower kind's body:
//!
//! | Lower kind | Higher kind | Method |
//! |------------|-------------|--------|
//! | sphere | sphere, plane, box | closed form |
//! | sphere | convex, cylinder | closest surface point |
//! | sphere | heightfield | sphere vs. nearby triangle pillars |
//! | sphere | trimesh | closest point on nearby triangles |
//! | plane | box, convex, cylinder, trimesh | vertices behind the plane |
//! | box, convex, cylinder | box, convex, cylinder | separating axis, then face clipping |
//! | box, convex, cylinder | heightfield | convex vs. nearby triangle pillars |
//! | sphere, plane, box, convex, cylinder, heightfield | particle | point containment |
//!
//! Cylinder sorts after heightfield and particle, so those two pairs run
//! with the cylinder first. Any other combination is logged once and yields
//! no contacts.
//!
//! Each contact row gets two friction rows along tangents of its normal.
//! With friction reduction enabled, the contacts of one shape pair share a
//! single friction pair placed at their average point.
//!
//! Pairs of a kinematic body with a static or kinematic body are only
//! tested for overlap: they produce [`ShapeOverlap`] records and no rows.

mod convex;
mod heightfield;
mod particle;
mod sphere;
mod trimesh;

use hashbrown::HashSet;
use rigid_constraint::{Equation, EquationKind};
use rigid_shapes::{ClipPoint, Shape, ShapeGeometry, ShapeKind};
use rigid_types::math::{Quat, Vec3, Vec3Ext};
use rigid_types::{ContactMaterial, ContactMaterialTable, EquationId, Material, ShapeId};
use tracing::{trace, warn};

use crate::body::Body;

/// Impulse bound of contact rows.
pub const CONTACT_MAX_FORCE: f64 = 1e6;

/// Free list of equation rows carried from one step to the next.
///
/// Rows are checked out while contacts are generated and handed back in
/// bulk at the start of the next step. A reused row keeps its storage but
/// gets a fresh id and has every field rewritten.
#[derive(Debug, Clone, Default)]
pub struct EquationPool {
    free: Vec<Equation>,
}

impl EquationPool {
    /// An empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows ready for reuse.
    #[must_use]
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// Whether no row is available.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Move every row of `used` into the pool.
    pub fn recycle(&mut self, used: &mut Vec<Equation>) {
        self.free.append(used);
    }

    /// Check out a row, reusing a pooled one when available.
    pub fn checkout(
        &mut self,
        kind: EquationKind,
        body_a: usize,
        body_b: usize,
        min_force: f64,
        max_force: f64,
    ) -> Equation {
        let Some(mut eq) = self.free.pop() else {
            return Equation::new(kind, body_a, body_b, min_force, max_force);
        };
        eq.id = EquationId::next();
        eq.kind = kind;
        eq.body_a = body_a;
        eq.body_b = body_b;
        eq.shape_a = None;
        eq.shape_b = None;
        eq.set_force_range(min_force, max_force);
        eq.jacobian_a.reset();
        eq.jacobian_b.reset();
        eq.enabled = true;
        eq.multiplier = 0.0;
        eq
    }
}

/// Inputs shared by every pair in one step.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Timestep used for SPOOK parameters.
    pub dt: f64,
    /// Gravity magnitude, used to estimate normal force for friction bounds.
    pub gravity: f64,
    /// Average each shape pair's contacts into one friction pair.
    pub friction_reduction: bool,
    /// Registered contact materials.
    pub materials: &'a ContactMaterialTable,
    /// Fallback when no registered entry matches.
    pub default_material: &'a ContactMaterial,
}

/// Overlap found for a test-only pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeOverlap {
    /// Slot of the first body.
    pub body_a: usize,
    /// Slot of the second body.
    pub body_b: usize,
    /// Shape on the first body.
    pub shape_a: ShapeId,
    /// Shape on the second body.
    pub shape_b: ShapeId,
}

/// One side of a shape pair, posed in the world.
///
/// For heightfield pillars `position` is the pillar origin while `shape`
/// stays the heightfield, so contacts still report the heightfield.
#[derive(Clone, Copy)]
pub(crate) struct Posed<'a> {
    pub body: &'a Body,
    pub slot: usize,
    pub shape: &'a Shape,
    pub position: Vec3,
    pub quaternion: Quat,
}

impl<'a> Posed<'a> {
    /// Shape material, falling back to the body material.
    fn material(&self) -> Option<&'a Material> {
        self.shape.material.as_ref().or(self.body.material.as_ref())
    }

    fn responds(&self) -> bool {
        self.body.collision_response && self.shape.collision_response
    }

    /// Same body and shape at another pose.
    pub fn at(&self, position: Vec3) -> Self {
        Self { position, ..*self }
    }
}

/// State threaded through one shape-pair routine.
pub(crate) struct PairContext<'n> {
    contacts: &'n mut Vec<Equation>,
    pool: &'n mut EquationPool,
    /// Scratch buffer for clipped manifold points.
    pub clip: &'n mut Vec<ClipPoint>,
    /// Scratch buffer for trimesh triangle candidates.
    pub triangles: &'n mut Vec<usize>,
    /// Contact material resolved for this shape pair.
    pub material: ContactMaterial,
    pub dt: f64,
    /// Report overlap only; create no rows.
    pub test_only: bool,
}

impl PairContext<'_> {
    /// Push a contact row between world points on `a` and `b`, with `normal`
    /// pointing out of `a`.
    pub fn contact(
        &mut self,
        a: &Posed<'_>,
        b: &Posed<'_>,
        normal: &Vec3,
        point_a: &Vec3,
        point_b: &Vec3,
    ) {
        let restitution = self
            .material
            .effective_restitution(a.material(), b.material());
        let kind = EquationKind::Contact {
            ri: point_a - a.body.position,
            rj: point_b - b.body.position,
            ni: *normal,
            restitution,
        };
        let mut eq = self
            .pool
            .checkout(kind, a.slot, b.slot, 0.0, CONTACT_MAX_FORCE);
        eq.shape_a = Some(a.shape.id);
        eq.shape_b = Some(b.shape.id);
        eq.set_spook_params(
            self.material.contact_equation_stiffness,
            self.material.contact_equation_relaxation,
            self.dt,
        );
        eq.enabled = a.responds() && b.responds();
        self.contacts.push(eq);
    }

    /// Number of contacts pushed so far in this step.
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }
}

/// Contact generation with pooled equation storage.
#[derive(Debug, Default)]
pub struct NarrowPhase {
    contacts: Vec<Equation>,
    friction: Vec<Equation>,
    contact_pool: EquationPool,
    friction_pool: EquationPool,
    overlaps: Vec<ShapeOverlap>,
    unsupported: HashSet<(ShapeKind, ShapeKind)>,
    clip: Vec<ClipPoint>,
    triangles: Vec<usize>,
}

impl NarrowPhase {
    /// An empty narrowphase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Contact rows from the last call to [`get_contacts`](Self::get_contacts).
    #[must_use]
    pub fn contacts(&self) -> &[Equation] {
        &self.contacts
    }

    /// Mutable contact rows, for writing solver results back.
    pub fn contacts_mut(&mut self) -> &mut [Equation] {
        &mut self.contacts
    }

    /// Friction rows from the last call to [`get_contacts`](Self::get_contacts).
    #[must_use]
    pub fn friction_equations(&self) -> &[Equation] {
        &self.friction
    }

    /// Mutable friction rows.
    pub fn friction_equations_mut(&mut self) -> &mut [Equation] {
        &mut self.friction
    }

    /// Overlaps found for test-only pairs.
    #[must_use]
    pub fn overlaps(&self) -> &[ShapeOverlap] {
        &self.overlaps
    }

    /// Rows waiting in the contact pool.
    #[must_use]
    pub fn pooled_contacts(&self) -> usize {
        self.contact_pool.len()
    }

    /// Hand the previous step's rows back to the pools.
    pub fn recycle(&mut self) {
        self.contact_pool.recycle(&mut self.contacts);
        self.friction_pool.recycle(&mut self.friction);
        self.overlaps.clear();
    }

    /// Generate contact and friction rows for `pairs` of body slots.
    pub fn get_contacts(
        &mut self,
        pairs: &[(usize, usize)],
        bodies: &[Body],
        step: &StepContext<'_>,
    ) {
        for &(i, j) in pairs {
            self.body_pair(i, j, bodies, step);
        }
        trace!(
            pairs = pairs.len(),
            contacts = self.contacts.len(),
            friction = self.friction.len(),
            "narrowphase done"
        );
    }

    fn body_pair(&mut self, i: usize, j: usize, bodies: &[Body], step: &StepContext<'_>) {
        let (bi, bj) = (&bodies[i], &bodies[j]);
        let test_only = (bi.is_kinematic() && (bj.is_static() || bj.is_kinematic()))
            || (bi.is_static() && bj.is_kinematic());

        let body_material = match (&bi.material, &bj.material) {
            (Some(ma), Some(mb)) => step.materials.get(ma.id, mb.id),
            _ => None,
        };

        for si in bi.shapes() {
            let fi = bi.shape_transform(si);
            for sj in bj.shapes() {
                let (sa, sb) = (&si.shape, &sj.shape);
                if sa.collision_filter_group & sb.collision_filter_mask == 0
                    || sb.collision_filter_group & sa.collision_filter_mask == 0
                {
                    continue;
                }
                let fj = bj.shape_transform(sj);
                let reach = sa.bounding_sphere_radius() + sb.bounding_sphere_radius();
                if (fi.position - fj.position).norm() > reach {
                    continue;
                }

                let shape_material = match (&sa.material, &sb.material) {
                    (Some(ma), Some(mb)) => step.materials.get(ma.id, mb.id),
                    _ => None,
                };
                let material = *shape_material
                    .or(body_material)
                    .unwrap_or(step.default_material);

                let a = Posed {
                    body: bi,
                    slot: i,
                    shape: sa,
                    position: fi.position,
                    quaternion: fi.quaternion,
                };
                let b = Posed {
                    body: bj,
                    slot: j,
                    shape: sb,
                    position: fj.position,
                    quaternion: fj.quaternion,
                };
                self.shape_pair(a, b, material, test_only, step);
            }
        }
    }

    fn shape_pair(
        &mut self,
        a: Posed<'_>,
        b: Posed<'_>,
        material: ContactMaterial,
        test_only: bool,
        step: &StepContext<'_>,
    ) {
        let (a, b) = if a.shape.kind() <= b.shape.kind() {
            (a, b)
        } else {
            (b, a)
        };
        let start = self.contacts.len();
        let mut ctx = PairContext {
            contacts: &mut self.contacts,
            pool: &mut self.contact_pool,
            clip: &mut self.clip,
            triangles: &mut self.triangles,
            material,
            dt: step.dt,
            test_only,
        };

        match dispatch(&mut ctx, &a, &b) {
            None => self.warn_unsupported(a.shape.kind(), b.shape.kind()),
            Some(true) if test_only => self.overlaps.push(ShapeOverlap {
                body_a: a.slot,
                body_b: b.slot,
                shape_a: a.shape.id,
                shape_b: b.shape.id,
            }),
            Some(_) => {}
        }

        if !test_only && self.contacts.len() > start {
            self.add_friction(start, &a, &b, &material, step);
        }
    }

    fn warn_unsupported(&mut self, ka: ShapeKind, kb: ShapeKind) {
        if self.unsupported.insert((ka, kb)) {
            warn!(?ka, ?kb, "no collision routine for shape pair, skipping");
        }
    }

    /// Friction rows for the contacts pushed since `start`, all from one
    /// shape pair.
    fn add_friction(
        &mut self,
        start: usize,
        a: &Posed<'_>,
        b: &Posed<'_>,
        material: &ContactMaterial,
        step: &StepContext<'_>,
    ) {
        let mu = material.effective_friction(a.material(), b.material());
        if mu <= 0.0 {
            return;
        }
        let inv_mass_sum = a.body.inv_mass() + b.body.inv_mass();
        let reduced_mass = if inv_mass_sum > 0.0 {
            1.0 / inv_mass_sum
        } else {
            0.0
        };
        let slip = mu * step.gravity * reduced_mass;

        let new = &self.contacts[start..];
        if step.friction_reduction {
            let Some(last) = new.last().copied() else {
                return;
            };
            let Some((ri, rj, ni)) = contact_geometry(&last) else {
                return;
            };
            let (ri, rj, ni) = if new.len() == 1 {
                (ri, rj, ni)
            } else {
                average_contacts(new, last.body_a).unwrap_or((ri, rj, ni))
            };
            self.push_friction_pair(&last, ri, rj, &ni, slip, material, step.dt);
        } else {
            for k in start..self.contacts.len() {
                let contact = self.contacts[k];
                if let Some((ri, rj, ni)) = contact_geometry(&contact) {
                    self.push_friction_pair(&contact, ri, rj, &ni, slip, material, step.dt);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push_friction_pair(
        &mut self,
        contact: &Equation,
        ri: Vec3,
        rj: Vec3,
        normal: &Vec3,
        slip: f64,
        material: &ContactMaterial,
        dt: f64,
    ) {
        let (t1, t2) = normal.tangents();
        for t in [t1, t2] {
            let mut eq = self.friction_pool.checkout(
                EquationKind::Friction { ri, rj, t },
                contact.body_a,
                contact.body_b,
                -slip,
                slip,
            );
            eq.shape_a = contact.shape_a;
            eq.shape_b = contact.shape_b;
            eq.set_spook_params(
                material.friction_equation_stiffness,
                material.friction_equation_relaxation,
                dt,
            );
            eq.enabled = contact.enabled;
            self.friction.push(eq);
        }
    }
}

fn contact_geometry(eq: &Equation) -> Option<(Vec3, Vec3, Vec3)> {
    match eq.kind {
        EquationKind::Contact { ri, rj, ni, .. } => Some((ri, rj, ni)),
        _ => None,
    }
}

/// Average point offsets and normal of `contacts`, expressed for `body_a`
/// as the first body.
fn average_contacts(contacts: &[Equation], body_a: usize) -> Option<(Vec3, Vec3, Vec3)> {
    let mut normal = Vec3::zeros();
    let mut ri_sum = Vec3::zeros();
    let mut rj_sum = Vec3::zeros();
    for eq in contacts {
        let (ri, rj, ni) = contact_geometry(eq)?;
        if eq.body_a == body_a {
            normal += ni;
            ri_sum += ri;
            rj_sum += rj;
        } else {
            normal -= ni;
            ri_sum += rj;
            rj_sum += ri;
        }
    }
    #[allow(clippy::cast_precision_loss)]
    let inv_n = 1.0 / contacts.len() as f64;
    let normal = normal.try_normalize(f64::EPSILON)?;
    Some((ri_sum * inv_n, rj_sum * inv_n, normal))
}

/// Run the routine for an ordered shape pair.
///
/// `None` when no routine exists; otherwise whether the shapes overlap.
fn dispatch(c: &mut PairContext<'_>, a: &Posed<'_>, b: &Posed<'_>) -> Option<bool> {
    use ShapeGeometry as G;

    let hit = match (&a.shape.geometry, &b.shape.geometry) {
        // =====================================================================
        // Sphere
        // =====================================================================
        (G::Sphere(s), G::Sphere(t)) => sphere::sphere_sphere(c, a, s.radius, b, t.radius),
        (G::Sphere(s), G::Plane(_)) => sphere::sphere_plane(c, a, s.radius, b),
        (G::Sphere(s), G::Box(cuboid)) => {
            sphere::sphere_box(c, a, s.radius, b, cuboid.half_extents())
        }
        (G::Sphere(s), G::ConvexPolyhedron(hull)) => sphere::sphere_convex(c, a, s.radius, b, hull),
        (G::Sphere(s), G::Cylinder(cyl)) => {
            sphere::sphere_convex(c, a, s.radius, b, cyl.convex())
        }
        (G::Sphere(s), G::Heightfield(hf)) => {
            heightfield::sphere_heightfield(c, a, s.radius, b, hf)
        }
        (G::Sphere(s), G::Particle(_)) => particle::sphere_particle(c, a, s.radius, b),
        (G::Sphere(s), G::Trimesh(mesh)) => trimesh::sphere_trimesh(c, a, s.radius, b, mesh),

        // =====================================================================
        // Plane
        // =====================================================================
        (G::Plane(_), G::Box(_) | G::ConvexPolyhedron(_) | G::Cylinder(_)) => {
            convex::plane_convex(c, a, b, b.shape.as_convex()?)
        }
        (G::Plane(_), G::Particle(_)) => particle::plane_particle(c, a, b),
        (G::Plane(_), G::Trimesh(mesh)) => trimesh::plane_trimesh(c, a, b, mesh),

        // =====================================================================
        // Convex (box, polyhedron, cylinder)
        // =====================================================================
        (
            G::Box(_) | G::ConvexPolyhedron(_) | G::Cylinder(_),
            G::Box(_) | G::ConvexPolyhedron(_) | G::Cylinder(_),
        ) => convex::convex_convex(c, a, a.shape.as_convex()?, b, b.shape.as_convex()?),
        (G::Box(_) | G::ConvexPolyhedron(_), G::Heightfield(hf)) => {
            heightfield::convex_heightfield(c, a, a.shape.as_convex()?, b, hf)
        }
        (G::Heightfield(hf), G::Cylinder(cyl)) => {
            heightfield::convex_heightfield(c, b, cyl.convex(), a, hf)
        }

        // =====================================================================
        // Particle
        // =====================================================================
        (G::Box(_) | G::ConvexPolyhedron(_), G::Particle(_)) => {
            particle::convex_particle(c, a, a.shape.as_convex()?, b)
        }
        (G::Particle(_), G::Cylinder(cyl)) => particle::convex_particle(c, b, cyl.convex(), a),
        (G::Heightfield(hf), G::Particle(_)) => heightfield::heightfield_particle(c, a, hf, b),

        _ => return None,
    };
    Some(hit)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rigid_shapes::Shape;
    use rigid_types::MaterialId;

    pub(crate) struct Harness {
        pub table: ContactMaterialTable,
        pub default_material: ContactMaterial,
        pub gravity: f64,
        pub friction_reduction: bool,
    }

    impl Default for Harness {
        fn default() -> Self {
            Self {
                table: ContactMaterialTable::new(),
                default_material: ContactMaterial::world_default(MaterialId::new(0)),
                gravity: 9.82,
                friction_reduction: false,
            }
        }
    }

    impl Harness {
        pub(crate) fn run(&self, bodies: &[Body]) -> NarrowPhase {
            let mut np = NarrowPhase::new();
            self.run_with(&mut np, bodies);
            np
        }

        pub(crate) fn run_with(&self, np: &mut NarrowPhase, bodies: &[Body]) {
            let step = StepContext {
                dt: 1.0 / 60.0,
                gravity: self.gravity,
                friction_reduction: self.friction_reduction,
                materials: &self.table,
                default_material: &self.default_material,
            };
            np.recycle();
            np.get_contacts(&[(0, 1)], bodies, &step);
        }
    }

    /// Dynamic body at `position` with one shape.
    pub(crate) fn body(shape: Shape, position: Vec3) -> Body {
        Body::new(1.0).with_shape(shape).with_position(position)
    }

    pub(crate) fn contact(np: &NarrowPhase, k: usize) -> (Vec3, Vec3, Vec3) {
        contact_geometry(&np.contacts()[k]).unwrap()
    }

    /// World contact points on body A and body B of row `k`.
    pub(crate) fn world_points(np: &NarrowPhase, bodies: &[Body], k: usize) -> (Vec3, Vec3) {
        let eq = &np.contacts()[k];
        let (ri, rj, _) = contact_geometry(eq).unwrap();
        (
            bodies[eq.body_a].position + ri,
            bodies[eq.body_b].position + rj,
        )
    }

    fn two_spheres(distance: f64) -> Vec<Body> {
        vec![
            body(Shape::sphere(1.0).unwrap(), Vec3::new(-distance / 2.0, 0.0, 0.0)),
            body(Shape::sphere(1.0).unwrap(), Vec3::new(distance / 2.0, 0.0, 0.0)),
        ]
    }

    #[test]
    fn test_two_unit_spheres() {
        let bodies = two_spheres(1.0);
        let np = Harness::default().run(&bodies);
        assert_eq!(np.contacts().len(), 1);
        let eq = &np.contacts()[0];
        let (ri, rj, ni) = contact(&np, 0);
        assert_relative_eq!(ni, Vec3::x(), epsilon = 1e-12);
        assert_relative_eq!(ri, Vec3::x(), epsilon = 1e-12);
        assert_relative_eq!(rj, -Vec3::x(), epsilon = 1e-12);
        assert_eq!(eq.min_force, 0.0);
        assert_eq!(eq.max_force, CONTACT_MAX_FORCE);
        assert_eq!((eq.body_a, eq.body_b), (0, 1));
        assert_eq!(np.friction_equations().len(), 2);
    }

    #[test]
    fn test_touching_spheres_do_not_collide() {
        assert!(Harness::default().run(&two_spheres(2.0)).contacts().is_empty());
        assert_eq!(Harness::default().run(&two_spheres(1.999)).contacts().len(), 1);
    }

    #[test]
    fn test_friction_bounds_and_tangents() {
        let bodies = two_spheres(1.5);
        let np = Harness::default().run(&bodies);
        let (_, _, ni) = contact(&np, 0);
        // mu 0.3, reduced mass 0.5
        let slip = 0.3 * 9.82 * 0.5;
        for eq in np.friction_equations() {
            assert_relative_eq!(eq.max_force, slip, epsilon = 1e-12);
            assert_relative_eq!(eq.min_force, -slip, epsilon = 1e-12);
            let EquationKind::Friction { t, .. } = eq.kind else {
                panic!("expected friction row");
            };
            assert_relative_eq!(t.dot(&ni), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_friction_makes_no_rows() {
        let mut harness = Harness::default();
        harness.default_material = harness.default_material.with_friction(0.0);
        let np = harness.run(&two_spheres(1.5));
        assert_eq!(np.contacts().len(), 1);
        assert!(np.friction_equations().is_empty());
    }

    #[test]
    fn test_material_products_override() {
        let slick = Material::new("ice").with_friction(0.1).with_restitution(0.5);
        let mut bodies = two_spheres(1.5);
        bodies[0].material = Some(slick.clone());
        bodies[1].material = Some(slick);
        let np = Harness::default().run(&bodies);
        let EquationKind::Contact { restitution, .. } = np.contacts()[0].kind else {
            panic!("expected contact row");
        };
        assert_relative_eq!(restitution, 0.25, epsilon = 1e-12);
        let slip = 0.1 * 0.1 * 9.82 * 0.5;
        assert_relative_eq!(np.friction_equations()[0].max_force, slip, epsilon = 1e-12);
    }

    #[test]
    fn test_registered_contact_material_is_used() {
        let rubber = Material::new("rubber");
        let mut harness = Harness::default();
        harness.table.insert(
            ContactMaterial::new(rubber.id, rubber.id)
                .with_restitution(0.9)
                .with_contact_spook(1e5, 2.0),
        );
        let mut bodies = two_spheres(1.5);
        bodies[0].material = Some(rubber.clone());
        bodies[1].material = Some(rubber);
        let np = harness.run(&bodies);
        let eq = &np.contacts()[0];
        let EquationKind::Contact { restitution, .. } = eq.kind else {
            panic!("expected contact row");
        };
        assert_relative_eq!(restitution, 0.9);
        let mut expected = Equation::contact(0, 1, CONTACT_MAX_FORCE);
        expected.set_spook_params(1e5, 2.0, 1.0 / 60.0);
        assert_relative_eq!(eq.eps, expected.eps);
    }

    #[test]
    fn test_collision_response_disables_rows() {
        let mut bodies = two_spheres(1.5);
        bodies[1].collision_response = false;
        let np = Harness::default().run(&bodies);
        assert!(!np.contacts()[0].enabled);
        assert!(np.friction_equations().iter().all(|eq| !eq.enabled));
    }

    #[test]
    fn test_shape_filters() {
        let mut bodies = two_spheres(1.5);
        bodies[0] = Body::new(1.0)
            .with_shape(Shape::sphere(1.0).unwrap().with_collision_filter(1, 4))
            .with_position(Vec3::new(-0.75, 0.0, 0.0));
        assert!(Harness::default().run(&bodies).contacts().is_empty());
    }

    #[test]
    fn test_kinematic_static_pair_is_test_only() {
        let bodies = vec![
            Body::kinematic()
                .with_shape(Shape::sphere(1.0).unwrap())
                .with_position(Vec3::new(0.0, 0.0, 0.5)),
            Body::fixed().with_shape(Shape::plane()),
        ];
        let np = Harness::default().run(&bodies);
        assert!(np.contacts().is_empty());
        assert_eq!(np.overlaps().len(), 1);
        let overlap = np.overlaps()[0];
        assert_eq!((overlap.body_a, overlap.body_b), (0, 1));
    }

    #[test]
    fn test_pool_reuses_rows_with_new_ids() {
        let bodies = two_spheres(1.5);
        let harness = Harness::default();
        let mut np = NarrowPhase::new();
        harness.run_with(&mut np, &bodies);
        let first = np.contacts()[0].id;
        np.recycle();
        assert_eq!(np.pooled_contacts(), 1);
        harness.run_with(&mut np, &bodies);
        assert_eq!(np.pooled_contacts(), 0);
        assert_ne!(np.contacts()[0].id, first);
        assert_eq!(np.contacts().len(), 1);
    }

    #[test]
    fn test_unsupported_pair_gives_nothing() {
        let bodies = vec![
            Body::fixed().with_shape(Shape::plane()),
            body(Shape::plane(), Vec3::zeros()),
        ];
        let mut np = Harness::default().run(&bodies);
        assert!(np.contacts().is_empty());
        assert_eq!(np.unsupported.len(), 1);
        Harness::default().run_with(&mut np, &bodies);
        assert_eq!(np.unsupported.len(), 1);
    }

    #[test]
    fn test_friction_reduction_averages_box_on_plane() {
        let bodies = vec![
            Body::fixed().with_shape(Shape::plane()),
            body(
                Shape::cuboid(Vec3::new(1.0, 1.0, 1.0)).unwrap(),
                Vec3::new(0.0, 0.0, 0.9),
            ),
        ];
        let harness = Harness {
            friction_reduction: true,
            ..Harness::default()
        };
        let np = harness.run(&bodies);
        assert_eq!(np.contacts().len(), 4);
        assert_eq!(np.friction_equations().len(), 2);
        let EquationKind::Friction { ri, rj, .. } = np.friction_equations()[0].kind else {
            panic!("expected friction row");
        };
        // Average of the four corners is under the box center.
        assert_relative_eq!(ri, Vec3::zeros(), epsilon = 1e-9);
        assert_relative_eq!(rj, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-9);

        let plain = Harness::default().run(&bodies);
        assert_eq!(plain.friction_equations().len(), 8);
    }

    #[test]
    fn test_average_flips_reversed_contacts() {
        let mut forward = Equation::contact(0, 1, 1.0);
        forward.kind = EquationKind::Contact {
            ri: Vec3::x(),
            rj: Vec3::y(),
            ni: Vec3::z(),
            restitution: 0.0,
        };
        let mut reversed = Equation::contact(1, 0, 1.0);
        reversed.kind = EquationKind::Contact {
            ri: Vec3::y(),
            rj: Vec3::x(),
            ni: -Vec3::z(),
            restitution: 0.0,
        };
        let (ri, rj, ni) = average_contacts(&[forward, reversed], 0).unwrap();
        assert_relative_eq!(ri, Vec3::x());
        assert_relative_eq!(rj, Vec3::y());
        assert_relative_eq!(ni, Vec3::z());
    }
}
