//! Uniform grid broadphase.
//!
//! The region `[min, max]` is split into `nx * ny * nz` bins. Each body is
//! dropped into every bin its bounds touch (bounds outside the region are
//! clamped to the border bins), then pairs are tested within each bin.
//! Planes are binned by the distance from each bin center to the plane.

use rigid_shapes::{Plane, ShapeGeometry};
use rigid_types::math::Vec3;
use rigid_types::Aabb;

use super::{
    aabb_query_linear, intersection_test, make_pairs_unique, need_broadphase_collision,
    Broadphase,
};
use crate::body::Body;

/// Uniform grid broadphase.
#[derive(Debug, Clone)]
pub struct GridBroadphase {
    min: Vec3,
    max: Vec3,
    nx: usize,
    ny: usize,
    nz: usize,
    bins: Vec<Vec<usize>>,
    use_bounding_boxes: bool,
}

impl GridBroadphase {
    /// Create a grid over `[min, max]` with the given bin counts.
    ///
    /// Counts must be positive and the region non-empty; the world
    /// configuration validates both.
    #[must_use]
    pub fn new(min: Vec3, max: Vec3, nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            min,
            max,
            nx: nx.max(1),
            ny: ny.max(1),
            nz: nz.max(1),
            bins: vec![Vec::new(); nx.max(1) * ny.max(1) * nz.max(1)],
            use_bounding_boxes: false,
        }
    }

    /// Compare world AABBs instead of bounding spheres.
    #[must_use]
    pub fn with_bounding_boxes(mut self, enabled: bool) -> Self {
        self.use_bounding_boxes = enabled;
        self
    }

    /// Number of bins.
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    fn bin_size(&self) -> Vec3 {
        (self.max - self.min).component_div(&self.counts())
    }

    #[allow(clippy::cast_precision_loss)]
    fn counts(&self) -> Vec3 {
        Vec3::new(self.nx as f64, self.ny as f64, self.nz as f64)
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.ny + y) * self.nz + z
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn cell_span(&self, lower: f64, upper: f64, axis: usize) -> (usize, usize) {
        let n = [self.nx, self.ny, self.nz][axis];
        let mult = self.counts()[axis] / (self.max[axis] - self.min[axis]);
        let last = (n - 1) as f64;
        let lo = ((lower - self.min[axis]) * mult).floor().clamp(0.0, last);
        let hi = ((upper - self.min[axis]) * mult).ceil().clamp(0.0, last);
        (lo as usize, hi as usize)
    }

    fn add_box(&mut self, lower: &Vec3, upper: &Vec3, slot: usize) {
        let (x0, x1) = self.cell_span(lower.x, upper.x, 0);
        let (y0, y1) = self.cell_span(lower.y, upper.y, 1);
        let (z0, z1) = self.cell_span(lower.z, upper.z, 2);
        for x in x0..=x1 {
            for y in y0..=y1 {
                for z in z0..=z1 {
                    let idx = self.index(x, y, z);
                    self.bins[idx].push(slot);
                }
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn add_plane(&mut self, position: &Vec3, normal: &Vec3, slot: usize) {
        let size = self.bin_size();
        let bin_radius = size.norm() * 0.5;
        for x in 0..self.nx {
            for y in 0..self.ny {
                for z in 0..self.nz {
                    let center = self.min
                        + Vec3::new(
                            (x as f64 + 0.5) * size.x,
                            (y as f64 + 0.5) * size.y,
                            (z as f64 + 0.5) * size.z,
                        );
                    if (center - position).dot(normal) < bin_radius {
                        let idx = self.index(x, y, z);
                        self.bins[idx].push(slot);
                    }
                }
            }
        }
    }

    fn insert(&mut self, slot: usize, body: &Body) {
        match body.shapes() {
            [] => {}
            [only] => {
                let frame = body.shape_transform(only);
                match &only.shape.geometry {
                    ShapeGeometry::Sphere(s) => {
                        let r = Vec3::repeat(s.radius);
                        self.add_box(&(frame.position - r), &(frame.position + r), slot);
                    }
                    ShapeGeometry::Plane(_) => {
                        let normal = Plane::world_normal(&frame.quaternion);
                        self.add_plane(&frame.position, &normal, slot);
                    }
                    _ => {
                        let aabb = body.aabb();
                        self.add_box(&aabb.lower_bound, &aabb.upper_bound, slot);
                    }
                }
            }
            _ => {
                let aabb = body.aabb();
                self.add_box(&aabb.lower_bound, &aabb.upper_bound, slot);
            }
        }
    }
}

impl Broadphase for GridBroadphase {
    fn collision_pairs(&mut self, bodies: &[Body], pairs: &mut Vec<(usize, usize)>) {
        for bin in &mut self.bins {
            bin.clear();
        }
        for (slot, body) in bodies.iter().enumerate() {
            self.insert(slot, body);
        }

        let start = pairs.len();
        for bin in &self.bins {
            for (k, &i) in bin.iter().enumerate() {
                for &j in &bin[..k] {
                    let (bi, bj) = (&bodies[i], &bodies[j]);
                    if need_broadphase_collision(bi, bj)
                        && intersection_test(bi, bj, self.use_bounding_boxes)
                    {
                        pairs.push((i, j));
                    }
                }
            }
        }

        let mut found = pairs.split_off(start);
        make_pairs_unique(&mut found);
        pairs.extend(found);
    }

    fn aabb_query(&mut self, bodies: &[Body], aabb: &Aabb, result: &mut Vec<usize>) {
        aabb_query_linear(bodies, aabb, result);
    }

    fn name(&self) -> &'static str {
        "grid"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::broad_phase::tests::sphere_at;
    use rigid_shapes::Shape;

    fn grid() -> GridBroadphase {
        GridBroadphase::new(Vec3::repeat(-10.0), Vec3::repeat(10.0), 4, 4, 4)
    }

    #[test]
    fn test_bin_count() {
        assert_eq!(grid().num_bins(), 64);
    }

    #[test]
    fn test_pair_spanning_bins_reported_once() {
        // Both spheres straddle the x = 0 bin border.
        let bodies = vec![sphere_at(-0.2, 1.0, 1.0), sphere_at(0.3, 1.0, 1.0)];
        let mut pairs = Vec::new();
        grid().collision_pairs(&bodies, &mut pairs);
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn test_bodies_outside_region_clamp_to_border() {
        let bodies = vec![sphere_at(50.0, 0.0, 0.0), sphere_at(51.0, 0.0, 0.0)];
        let mut pairs = Vec::new();
        grid().collision_pairs(&bodies, &mut pairs);
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn test_plane_meets_body_above_it() {
        let ground = Body::fixed().with_shape(Shape::plane());
        let bodies = vec![ground, sphere_at(3.0, -4.0, 0.5)];
        let mut pairs = Vec::new();
        grid().collision_pairs(&bodies, &mut pairs);
        assert_eq!(pairs, vec![(0, 1)]);
    }
}
