//! Triangle meshes against spheres and planes.

use rigid_shapes::{Plane, Trimesh};
use rigid_types::math::Vec3;
use rigid_types::Aabb;
use smallvec::SmallVec;

use super::{PairContext, Posed};

/// Closest points closer than this are the same contact; shared edges and
/// vertices would otherwise report one point per adjacent triangle.
const MERGE_DISTANCE: f64 = 1e-9;

/// Closest point to `p` on the triangle `(a, b, c)`, by Voronoi region.
pub(crate) fn closest_point_on_triangle(p: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

pub(crate) fn sphere_trimesh(
    c: &mut PairContext<'_>,
    sphere: &Posed<'_>,
    radius: f64,
    mesh_side: &Posed<'_>,
    mesh: &Trimesh,
) -> bool {
    let q = mesh_side.quaternion;
    let local = q.inverse_transform_vector(&(sphere.position - mesh_side.position));

    let mut candidates = std::mem::take(c.triangles);
    candidates.clear();
    mesh.triangles_in_aabb(&Aabb::from_center(local, Vec3::repeat(radius)), &mut candidates);
    candidates.sort_unstable();
    candidates.dedup();

    let mut seen: SmallVec<[Vec3; 8]> = SmallVec::new();
    let mut hit = false;
    for &t in &candidates {
        let [v0, v1, v2] = mesh.triangle_vertices(t);
        let closest = closest_point_on_triangle(&local, &v0, &v1, &v2);
        let diff = local - closest;
        if diff.norm_squared() >= radius * radius {
            continue;
        }
        if seen
            .iter()
            .any(|p| (p - closest).norm_squared() < MERGE_DISTANCE * MERGE_DISTANCE)
        {
            continue;
        }
        hit = true;
        if c.test_only {
            break;
        }
        seen.push(closest);

        let local_normal = diff
            .try_normalize(f64::EPSILON)
            .unwrap_or(*mesh.normal(t));
        let ni = -(q * local_normal);
        c.contact(
            sphere,
            mesh_side,
            &ni,
            &(sphere.position + ni * radius),
            &(mesh_side.position + q * closest),
        );
    }

    *c.triangles = candidates;
    hit
}

/// One contact per mesh vertex at or behind the plane.
pub(crate) fn plane_trimesh(
    c: &mut PairContext<'_>,
    plane: &Posed<'_>,
    mesh_side: &Posed<'_>,
    mesh: &Trimesh,
) -> bool {
    let n = Plane::world_normal(&plane.quaternion);
    let mut hit = false;
    for i in 0..mesh.vertex_count() {
        let world = mesh.world_vertex(i, &mesh_side.position, &mesh_side.quaternion);
        let depth = n.dot(&(world - plane.position));
        if depth > 0.0 {
            continue;
        }
        if c.test_only {
            return true;
        }
        hit = true;
        c.contact(plane, mesh_side, &n, &(world - n * depth), &world);
    }
    hit
}
