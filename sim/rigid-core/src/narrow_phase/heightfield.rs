//! Heightfields, handled as the convex pillars under each triangle.
//!
//! The other shape is brought into the heightfield frame to pick the cells
//! it can reach. Each cell contributes two pillars, which go through the
//! sphere and convex routines unchanged.

use rigid_shapes::{ConvexPolyhedron, Heightfield};
use rigid_types::Transform;

use super::convex::convex_convex;
use super::particle::convex_particle;
use super::sphere::sphere_convex;
use super::{PairContext, Posed};

/// Contacts per cell after which the sphere routine stops looking.
const MAX_SPHERE_CONTACTS_PER_CELL: usize = 2;

/// Visit both pillars of every cell within `radius` of `other`.
///
/// `visit` gets the pillar polyhedron, the heightfield side posed at the
/// pillar origin and the cell index. Returning `true` ends the scan.
fn for_each_pillar(
    hf: &Heightfield,
    field: &Posed<'_>,
    other: &Posed<'_>,
    radius: f64,
    mut visit: impl FnMut(&ConvexPolyhedron, &Posed<'_>, (usize, usize)) -> bool,
) {
    let frame = Transform::new(field.position, field.quaternion);
    let local = frame.point_to_local_frame(&other.position);
    let Some(range) = hf.cell_range_around(local.x, local.y, radius) else {
        return;
    };
    let (min, max) = hf.rect_min_max(range.x0, range.y0, range.x1, range.y1);
    if local.z - radius > max || local.z + radius < min {
        return;
    }

    for cell in range.cells() {
        for upper in [false, true] {
            let Ok(pillar) = hf.convex_triangle_pillar(cell.0, cell.1, upper) else {
                continue;
            };
            let origin = frame.point_to_world_frame(&pillar.offset);
            let reach = pillar.convex.bounding_sphere_radius() + radius;
            if (other.position - origin).norm_squared() >= reach * reach {
                continue;
            }
            if visit(&pillar.convex, &field.at(origin), cell) {
                return;
            }
        }
    }
}

pub(crate) fn sphere_heightfield(
    c: &mut PairContext<'_>,
    a: &Posed<'_>,
    radius: f64,
    field: &Posed<'_>,
    hf: &Heightfield,
) -> bool {
    let mut hit = false;
    let mut cell_start = (usize::MAX, usize::MAX, c.contact_count());
    for_each_pillar(hf, field, a, radius, |hull, pillar, cell| {
        if (cell_start.0, cell_start.1) != cell {
            cell_start = (cell.0, cell.1, c.contact_count());
        }
        if sphere_convex(c, a, radius, pillar, hull) {
            hit = true;
            if c.test_only {
                return true;
            }
        }
        c.contact_count() - cell_start.2 > MAX_SPHERE_CONTACTS_PER_CELL
    });
    hit
}

/// `a` is any convex shape; the heightfield always ends up as body B.
pub(crate) fn convex_heightfield(
    c: &mut PairContext<'_>,
    a: &Posed<'_>,
    hull: &ConvexPolyhedron,
    field: &Posed<'_>,
    hf: &Heightfield,
) -> bool {
    let mut hit = false;
    let radius = hull.bounding_sphere_radius();
    for_each_pillar(hf, field, a, radius, |pillar_hull, pillar, _| {
        if convex_convex(c, a, hull, pillar, pillar_hull) {
            hit = true;
            return c.test_only;
        }
        false
    });
    hit
}

/// A particle inside the pillar under its own position.
pub(crate) fn heightfield_particle(
    c: &mut PairContext<'_>,
    field: &Posed<'_>,
    hf: &Heightfield,
    particle: &Posed<'_>,
) -> bool {
    let frame = Transform::new(field.position, field.quaternion);
    let local = frame.point_to_local_frame(&particle.position);
    let Some((xi, yi)) = hf.index_of_position(local.x, local.y, false) else {
        return false;
    };
    if local.z > hf.max_value() {
        return false;
    }
    let mut hit = false;
    for upper in [false, true] {
        let Ok(pillar) = hf.convex_triangle_pillar(xi, yi, upper) else {
            continue;
        };
        let origin = frame.point_to_world_frame(&pillar.offset);
        if convex_particle(c, &field.at(origin), &pillar.convex, particle) {
            hit = true;
            if c.test_only {
                break;
            }
        }
    }
    hit
}
