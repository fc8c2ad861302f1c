//! Point particles against planes, spheres and convex hulls.
//!
//! A particle has no extent, so every routine reports the particle
//! position as the point on the particle side.

use rigid_shapes::{ConvexPolyhedron, Plane};
use rigid_types::math::Vec3;

use super::{PairContext, Posed};

pub(crate) fn plane_particle(c: &mut PairContext<'_>, plane: &Posed<'_>, particle: &Posed<'_>) -> bool {
    let n = Plane::world_normal(&plane.quaternion);
    let depth = n.dot(&(particle.position - plane.position));
    if depth > 0.0 {
        return false;
    }
    if c.test_only {
        return true;
    }
    c.contact(
        plane,
        particle,
        &n,
        &(particle.position - n * depth),
        &particle.position,
    );
    true
}

pub(crate) fn sphere_particle(
    c: &mut PairContext<'_>,
    sphere: &Posed<'_>,
    radius: f64,
    particle: &Posed<'_>,
) -> bool {
    let delta = particle.position - sphere.position;
    if delta.norm_squared() > radius * radius {
        return false;
    }
    if c.test_only {
        return true;
    }
    let ni = delta.try_normalize(f64::EPSILON).unwrap_or_else(Vec3::x);
    c.contact(
        sphere,
        particle,
        &ni,
        &(sphere.position + ni * radius),
        &particle.position,
    );
    true
}

/// Contact only when the particle is inside the hull; the normal is the
/// nearest face normal.
pub(crate) fn convex_particle(
    c: &mut PairContext<'_>,
    solid: &Posed<'_>,
    hull: &ConvexPolyhedron,
    particle: &Posed<'_>,
) -> bool {
    let local = solid
        .quaternion
        .inverse_transform_vector(&(particle.position - solid.position));
    let closest = hull.closest_surface_point(&local);
    if !closest.inside {
        return false;
    }
    if c.test_only {
        return true;
    }
    let ni = solid.quaternion * hull.face_normals()[closest.face];
    c.contact(
        solid,
        particle,
        &ni,
        &(solid.position + solid.quaternion * closest.point),
        &particle.position,
    );
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::super::tests::{body, contact, world_points, Harness};
    use crate::body::Body;
    use approx::assert_relative_eq;
    use rigid_shapes::Shape;
    use rigid_types::math::Vec3;

    fn particle(position: Vec3) -> Body {
        body(Shape::particle(), position)
    }

    #[test]
    fn test_particle_below_plane() {
        let ground = Body::fixed().with_shape(Shape::plane());
        let bodies = vec![ground.clone(), particle(Vec3::new(1.0, 2.0, -0.2))];
        let np = Harness::default().run(&bodies);
        assert_eq!(np.contacts().len(), 1);
        let (_, _, ni) = contact(&np, 0);
        assert_relative_eq!(ni, Vec3::z());
        let (pa, pb) = world_points(&np, &bodies, 0);
        assert_relative_eq!(pa, Vec3::new(1.0, 2.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(pb, Vec3::new(1.0, 2.0, -0.2), epsilon = 1e-12);

        let above = vec![ground, particle(Vec3::new(0.0, 0.0, 0.1))];
        assert!(Harness::default().run(&above).contacts().is_empty());
    }

    #[test]
    fn test_particle_inside_sphere() {
        let bodies = vec![
            body(Shape::sphere(1.0).unwrap(), Vec3::zeros()),
            particle(Vec3::new(0.0, 0.6, 0.0)),
        ];
        let np = Harness::default().run(&bodies);
        assert_eq!(np.contacts().len(), 1);
        let (_, _, ni) = contact(&np, 0);
        assert_relative_eq!(ni, Vec3::y(), epsilon = 1e-12);
        let (pa, _) = world_points(&np, &bodies, 0);
        assert_relative_eq!(pa, Vec3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_particle_inside_box_uses_nearest_face() {
        let cube = body(Shape::cuboid(Vec3::repeat(1.0)).unwrap(), Vec3::zeros());
        let bodies = vec![cube.clone(), particle(Vec3::new(0.9, 0.1, 0.0))];
        let np = Harness::default().run(&bodies);
        assert_eq!(np.contacts().len(), 1);
        let (_, _, ni) = contact(&np, 0);
        assert_relative_eq!(ni, Vec3::x(), epsilon = 1e-12);
        let (pa, _) = world_points(&np, &bodies, 0);
        assert_relative_eq!(pa, Vec3::new(1.0, 0.1, 0.0), epsilon = 1e-12);

        let outside = vec![cube, particle(Vec3::new(1.1, 0.0, 0.0))];
        assert!(Harness::default().run(&outside).contacts().is_empty());
    }

    #[test]
    fn test_particle_inside_cylinder() {
        // The cylinder sorts after the particle, so it ends up as body B.
        let bodies = vec![
            particle(Vec3::new(0.0, 0.0, 0.4)),
            body(Shape::cylinder(1.0, 1.0, 1.0, 8).unwrap(), Vec3::zeros()),
        ];
        let np = Harness::default().run(&bodies);
        assert_eq!(np.contacts().len(), 1);
        let eq = &np.contacts()[0];
        assert_eq!((eq.body_a, eq.body_b), (1, 0));
        let (_, _, ni) = contact(&np, 0);
        assert_relative_eq!(ni, Vec3::z(), epsilon = 1e-9);
    }
}
