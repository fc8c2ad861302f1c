//! Sphere against sphere, plane, box and convex hulls.

use rigid_shapes::{ConvexPolyhedron, Plane};
use rigid_types::math::Vec3;

use super::{PairContext, Posed};

pub(crate) fn sphere_sphere(
    c: &mut PairContext<'_>,
    a: &Posed<'_>,
    radius_a: f64,
    b: &Posed<'_>,
    radius_b: f64,
) -> bool {
    let delta = b.position - a.position;
    let reach = radius_a + radius_b;
    if delta.norm_squared() >= reach * reach {
        return false;
    }
    if c.test_only {
        return true;
    }
    let ni = delta.try_normalize(f64::EPSILON).unwrap_or_else(Vec3::x);
    c.contact(
        a,
        b,
        &ni,
        &(a.position + ni * radius_a),
        &(b.position - ni * radius_b),
    );
    true
}

pub(crate) fn sphere_plane(
    c: &mut PairContext<'_>,
    a: &Posed<'_>,
    radius: f64,
    b: &Posed<'_>,
) -> bool {
    let n = Plane::world_normal(&b.quaternion);
    let height = n.dot(&(a.position - b.position));
    if height > radius {
        return false;
    }
    if c.test_only {
        return true;
    }
    let ni = -n;
    c.contact(
        a,
        b,
        &ni,
        &(a.position + ni * radius),
        &(a.position - n * height),
    );
    true
}

/// Closest point on the box surface in the box frame. A center inside the
/// box is pushed out through the nearest face.
pub(crate) fn sphere_box(
    c: &mut PairContext<'_>,
    a: &Posed<'_>,
    radius: f64,
    b: &Posed<'_>,
    half: &Vec3,
) -> bool {
    let local = b
        .quaternion
        .inverse_transform_vector(&(a.position - b.position));
    let inside = (0..3).all(|k| local[k].abs() <= half[k]);

    let (surface, local_normal) = if inside {
        let mut axis = 0;
        let mut gap = f64::MAX;
        for k in 0..3 {
            let g = half[k] - local[k].abs();
            if g < gap {
                gap = g;
                axis = k;
            }
        }
        let sign = if local[axis] < 0.0 { -1.0 } else { 1.0 };
        let mut surface = local;
        surface[axis] = sign * half[axis];
        let mut normal = Vec3::zeros();
        normal[axis] = sign;
        (surface, normal)
    } else {
        let clamped = local.zip_map(half, |v, h| v.clamp(-h, h));
        let diff = local - clamped;
        let dist2 = diff.norm_squared();
        if dist2 >= radius * radius {
            return false;
        }
        (clamped, diff / dist2.sqrt())
    };

    if c.test_only {
        return true;
    }
    let ni = -(b.quaternion * local_normal);
    c.contact(
        a,
        b,
        &ni,
        &(a.position + ni * radius),
        &(b.position + b.quaternion * surface),
    );
    true
}

/// Sphere against any convex hull, including heightfield pillars.
pub(crate) fn sphere_convex(
    c: &mut PairContext<'_>,
    a: &Posed<'_>,
    radius: f64,
    b: &Posed<'_>,
    hull: &ConvexPolyhedron,
) -> bool {
    let local = b
        .quaternion
        .inverse_transform_vector(&(a.position - b.position));
    let closest = hull.closest_surface_point(&local);
    let face_normal = hull.face_normals()[closest.face];

    let local_normal = if closest.inside {
        face_normal
    } else {
        let diff = local - closest.point;
        if diff.norm_squared() >= radius * radius {
            return false;
        }
        diff.try_normalize(f64::EPSILON).unwrap_or(face_normal)
    };

    if c.test_only {
        return true;
    }
    let ni = -(b.quaternion * local_normal);
    c.contact(
        a,
        b,
        &ni,
        &(a.position + ni * radius),
        &(b.position + b.quaternion * closest.point),
    );
    true
}
