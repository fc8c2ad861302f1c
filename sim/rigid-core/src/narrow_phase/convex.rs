//! Convex hulls against planes and other hulls.

use rigid_shapes::{ConvexPolyhedron, Plane};

use super::{PairContext, Posed};

/// Clip distances for the manifold: generous enough to keep every clipped
/// point of a resting contact.
const CLIP_MIN: f64 = -100.0;
const CLIP_MAX: f64 = 100.0;

/// One contact per hull vertex at or behind the plane.
pub(crate) fn plane_convex(
    c: &mut PairContext<'_>,
    plane: &Posed<'_>,
    b: &Posed<'_>,
    hull: &ConvexPolyhedron,
) -> bool {
    let n = Plane::world_normal(&plane.quaternion);
    let mut hit = false;
    for v in hull.vertices() {
        let world = b.position + b.quaternion * v;
        let depth = n.dot(&(world - plane.position));
        if depth > 0.0 {
            continue;
        }
        if c.test_only {
            return true;
        }
        hit = true;
        c.contact(plane, b, &n, &(world - n * depth), &world);
    }
    hit
}

/// Separating axis test, then clip B's incident face against A.
pub(crate) fn convex_convex(
    c: &mut PairContext<'_>,
    a: &Posed<'_>,
    hull_a: &ConvexPolyhedron,
    b: &Posed<'_>,
    hull_b: &ConvexPolyhedron,
) -> bool {
    let Some(axis) =
        hull_a.find_separating_axis(hull_b, &a.position, &a.quaternion, &b.position, &b.quaternion)
    else {
        return false;
    };

    let mut points = std::mem::take(c.clip);
    points.clear();
    hull_a.clip_against_hull(
        &a.position,
        &a.quaternion,
        hull_b,
        &b.position,
        &b.quaternion,
        &axis,
        CLIP_MIN,
        CLIP_MAX,
        &mut points,
    );

    let hit = !points.is_empty();
    if !c.test_only {
        let ni = -axis;
        for p in &points {
            c.contact(a, b, &ni, &(p.point - p.normal * p.depth), &p.point);
        }
    }
    *c.clip = points;
    hit
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::super::tests::{body, contact, world_points, Harness};
    use crate::body::Body;
    use approx::assert_relative_eq;
    use rigid_shapes::Shape;
    use rigid_types::math::{Quat, Vec3};

    fn cube(position: Vec3) -> Body {
        body(Shape::cuboid(Vec3::repeat(0.5)).unwrap(), position)
    }

    #[test]
    fn test_box_resting_on_plane() {
        let bodies = vec![
            Body::fixed().with_shape(Shape::plane()),
            cube(Vec3::new(0.0, 0.0, 0.45)),
        ];
        let np = Harness::default().run(&bodies);
        assert_eq!(np.contacts().len(), 4);
        for k in 0..4 {
            let (_, _, ni) = contact(&np, k);
            assert_relative_eq!(ni, Vec3::z());
            let (pa, pb) = world_points(&np, &bodies, k);
            assert_relative_eq!(pa.z, 0.0, epsilon = 1e-12);
            assert_relative_eq!(pb.z, -0.05, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tilted_box_touches_with_one_corner() {
        let q = Quat::from_euler_angles(0.3, 0.4, 0.0);
        let tilted = cube(Vec3::new(0.0, 0.0, 0.6)).with_quaternion(q);
        let lowest = tilted
            .shapes()
            .first()
            .and_then(|s| s.shape.as_convex())
            .unwrap()
            .vertices()
            .iter()
            .map(|v| (q * v).z + 0.6)
            .fold(f64::MAX, f64::min);
        assert!(lowest < 0.0);
        let bodies = vec![Body::fixed().with_shape(Shape::plane()), tilted];
        let np = Harness::default().run(&bodies);
        assert!(!np.contacts().is_empty());
        assert!(np.contacts().len() < 4);
    }

    #[test]
    fn test_stacked_boxes_make_face_manifold() {
        let top = body(Shape::cuboid(Vec3::repeat(0.4)).unwrap(), Vec3::new(0.0, 0.0, 0.85));
        let bodies = vec![cube(Vec3::zeros()), top];
        let np = Harness::default().run(&bodies);
        assert_eq!(np.contacts().len(), 4);
        for k in 0..4 {
            let (_, _, ni) = contact(&np, k);
            assert_relative_eq!(ni, Vec3::z(), epsilon = 1e-9);
            let (pa, pb) = world_points(&np, &bodies, k);
            // Points sit on A's top face and B's bottom face.
            assert_relative_eq!(pa.z, 0.5, epsilon = 1e-9);
            assert_relative_eq!(pb.z, 0.45, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_separated_boxes() {
        let bodies = vec![cube(Vec3::zeros()), cube(Vec3::new(0.0, 0.0, 1.05))];
        assert!(Harness::default().run(&bodies).contacts().is_empty());
    }

    #[test]
    fn test_touching_boxes_make_no_contact() {
        let bodies = vec![cube(Vec3::zeros()), cube(Vec3::new(0.0, 0.0, 1.0))];
        assert!(Harness::default().run(&bodies).contacts().is_empty());
    }

    #[test]
    fn test_cylinder_standing_on_box() {
        let cylinder = body(Shape::cylinder(0.4, 0.4, 1.0, 12).unwrap(), Vec3::new(0.0, 0.0, 0.95));
        let bodies = vec![cube(Vec3::zeros()), cylinder];
        let np = Harness::default().run(&bodies);
        assert!(np.contacts().len() >= 3);
        for k in 0..np.contacts().len() {
            let (_, _, ni) = contact(&np, k);
            assert_relative_eq!(ni, Vec3::z(), epsilon = 1e-9);
        }
    }
}
