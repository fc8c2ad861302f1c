//! All-pairs broadphase.

use rigid_types::Aabb;

use super::{aabb_query_linear, intersection_test, need_broadphase_collision, Broadphase};
use crate::body::Body;

/// Tests every pair of bodies.
#[derive(Debug, Clone, Default)]
pub struct NaiveBroadphase {
    use_bounding_boxes: bool,
}

impl NaiveBroadphase {
    /// Create a naive broadphase using bounding spheres.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare world AABBs instead of bounding spheres.
    #[must_use]
    pub fn with_bounding_boxes(mut self, enabled: bool) -> Self {
        self.use_bounding_boxes = enabled;
        self
    }
}

impl Broadphase for NaiveBroadphase {
    fn collision_pairs(&mut self, bodies: &[Body], pairs: &mut Vec<(usize, usize)>) {
        for i in 0..bodies.len() {
            for j in 0..i {
                let (bi, bj) = (&bodies[i], &bodies[j]);
                if need_broadphase_collision(bi, bj)
                    && intersection_test(bi, bj, self.use_bounding_boxes)
                {
                    pairs.push((i, j));
                }
            }
        }
    }

    fn aabb_query(&mut self, bodies: &[Body], aabb: &Aabb, result: &mut Vec<usize>) {
        aabb_query_linear(bodies, aabb, result);
    }

    fn name(&self) -> &'static str {
        "naive"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::broad_phase::tests::{sphere_at, sphere_row};
    use rigid_types::math::Vec3;

    #[test]
    fn test_neighbors_only() {
        let bodies = sphere_row(4);
        let mut pairs = Vec::new();
        NaiveBroadphase::new().collision_pairs(&bodies, &mut pairs);
        assert_eq!(pairs, vec![(1, 0), (2, 1), (3, 2)]);
    }

    #[test]
    fn test_aabb_query() {
        let mut bodies = vec![sphere_at(0.0, 0.0, 0.0), sphere_at(10.0, 0.0, 0.0)];
        for b in &mut bodies {
            b.update_aabb();
        }
        let mut result = Vec::new();
        let query = Aabb::new(Vec3::new(8.5, -0.5, -0.5), Vec3::new(9.5, 0.5, 0.5));
        NaiveBroadphase::new().aabb_query(&bodies, &query, &mut result);
        assert_eq!(result, vec![1]);
    }
}
