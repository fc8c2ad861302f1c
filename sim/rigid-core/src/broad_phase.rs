//! Broadphase: cheap culling of body pairs before exact collision tests.
//!
//! Three algorithms share one trait:
//!
//! | Broadphase | Pair search | Best for |
//! |------------|-------------|----------|
//! | [`NaiveBroadphase`] | every pair, O(n²) | small scenes |
//! | [`SapBroadphase`] | sorted sweep along one axis | scenes spread along an axis |
//! | [`GridBroadphase`] | uniform bins over a fixed region | bounded, evenly filled scenes |
//!
//! All of them apply the same two filters before the overlap test:
//!
//! 1. collision groups and masks must accept each other
//! 2. at least one body must be neither static nor sleeping
//!
//! The overlap test itself compares bounding spheres, or world AABBs when
//! the world is configured with `use_bounding_boxes`.
//!
//! Pairs are reported as body slots `(i, j)` into the world's body list.

mod grid;
mod naive;
mod sap;

pub use grid::GridBroadphase;
pub use naive::NaiveBroadphase;
pub use sap::SapBroadphase;

use rigid_types::{Aabb, BroadphaseConfig, WorldConfig};

use crate::body::Body;

/// A broadphase algorithm.
pub trait Broadphase: std::fmt::Debug {
    /// Append the candidate pairs for this step to `pairs`.
    fn collision_pairs(&mut self, bodies: &[Body], pairs: &mut Vec<(usize, usize)>);

    /// Append the slots of bodies whose AABB overlaps `aabb`.
    fn aabb_query(&mut self, bodies: &[Body], aabb: &Aabb, result: &mut Vec<usize>);

    /// A body was appended at `slot`.
    fn body_added(&mut self, _slot: usize) {}

    /// The body at `slot` was removed; later slots shift down by one.
    fn body_removed(&mut self, _slot: usize) {}

    /// Bodies moved since the last query.
    fn mark_dirty(&mut self) {}

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

/// Build the broadphase selected by `config`.
#[must_use]
pub fn broadphase_from_config(config: &WorldConfig) -> Box<dyn Broadphase> {
    let use_boxes = config.use_bounding_boxes;
    match &config.broadphase {
        BroadphaseConfig::Naive => Box::new(NaiveBroadphase::new().with_bounding_boxes(use_boxes)),
        BroadphaseConfig::SweepAndPrune { axis } => {
            Box::new(SapBroadphase::new(*axis).with_bounding_boxes(use_boxes))
        }
        BroadphaseConfig::Grid {
            min,
            max,
            nx,
            ny,
            nz,
        } => Box::new(GridBroadphase::new(*min, *max, *nx, *ny, *nz).with_bounding_boxes(use_boxes)),
    }
}

/// Whether two bodies are allowed to collide at all.
///
/// False when the collision filters reject each other, or when neither body
/// can move (static or sleeping).
#[must_use]
pub fn need_broadphase_collision(a: &Body, b: &Body) -> bool {
    if a.collision_filter_group & b.collision_filter_mask == 0
        || b.collision_filter_group & a.collision_filter_mask == 0
    {
        return false;
    }
    let a_inert = a.is_static() || a.is_sleeping();
    let b_inert = b.is_static() || b.is_sleeping();
    !(a_inert && b_inert)
}

/// Bounding volume overlap test.
#[must_use]
pub fn intersection_test(a: &Body, b: &Body, use_bounding_boxes: bool) -> bool {
    if use_bounding_boxes {
        a.aabb().overlaps(&b.aabb())
    } else {
        let r = a.bounding_radius() + b.bounding_radius();
        (a.position - b.position).norm_squared() < r * r
    }
}

/// Order each pair as `(min, max)`, then sort and drop duplicates.
pub fn make_pairs_unique(pairs: &mut Vec<(usize, usize)>) {
    for pair in pairs.iter_mut() {
        if pair.0 > pair.1 {
            *pair = (pair.1, pair.0);
        }
    }
    pairs.sort_unstable();
    pairs.dedup();
}

fn aabb_query_linear(bodies: &[Body], aabb: &Aabb, result: &mut Vec<usize>) {
    for (slot, body) in bodies.iter().enumerate() {
        if body.aabb().overlaps(aabb) {
            result.push(slot);
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::cast_precision_loss
)]
pub(crate) mod tests {
    use super::*;
    use rigid_shapes::Shape;
    use rigid_types::math::Vec3;

    pub(crate) fn sphere_at(x: f64, y: f64, z: f64) -> Body {
        Body::new(1.0)
            .with_shape(Shape::sphere(1.0).unwrap())
            .with_position(Vec3::new(x, y, z))
    }

    /// Unit spheres along X, 1.5 apart: only neighbors overlap.
    pub(crate) fn sphere_row(n: usize) -> Vec<Body> {
        (0..n)
            .map(|i| sphere_at(i as f64 * 1.5, 0.0, 0.0))
            .collect()
    }

    pub(crate) fn all_pairs(bp: &mut dyn Broadphase, bodies: &[Body]) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        bp.collision_pairs(bodies, &mut pairs);
        make_pairs_unique(&mut pairs);
        pairs
    }

    #[test]
    fn test_filters_reject_each_other() {
        let a = sphere_at(0.0, 0.0, 0.0).with_collision_filter(1, 2);
        let b = sphere_at(0.5, 0.0, 0.0).with_collision_filter(2, 2);
        assert!(!need_broadphase_collision(&a, &b));
        let b = b.with_collision_filter(2, 1);
        assert!(need_broadphase_collision(&a, &b));
    }

    #[test]
    fn test_static_and_sleeping_pairs_are_skipped() {
        let ground = Body::fixed().with_shape(Shape::plane());
        let mut sleeper = sphere_at(0.0, 0.0, 0.5);
        assert!(need_broadphase_collision(&ground, &sleeper));
        sleeper.sleep();
        assert!(!need_broadphase_collision(&ground, &sleeper));
        assert!(!need_broadphase_collision(&ground, &Body::fixed()));
    }

    #[test]
    fn test_sphere_and_box_tests_differ() {
        // Diagonal neighbors: boxes overlap, spheres do not.
        let a = sphere_at(0.0, 0.0, 0.0);
        let b = sphere_at(1.5, 1.5, 0.0);
        assert!(!intersection_test(&a, &b, false));
        assert!(intersection_test(&a, &b, true));
    }

    #[test]
    fn test_make_pairs_unique() {
        let mut pairs = vec![(2, 1), (1, 2), (0, 3), (3, 0), (1, 2)];
        make_pairs_unique(&mut pairs);
        assert_eq!(pairs, vec![(0, 3), (1, 2)]);
    }

    #[test]
    fn test_all_broadphases_agree() {
        let mut bodies = sphere_row(6);
        bodies.push(sphere_at(3.0, 1.2, 0.0));
        for b in &mut bodies {
            b.update_aabb();
        }
        let mut naive = NaiveBroadphase::new();
        let mut sap = SapBroadphase::new(None);
        let mut grid = GridBroadphase::new(Vec3::repeat(-10.0), Vec3::repeat(20.0), 6, 6, 6);
        for slot in 0..bodies.len() {
            sap.body_added(slot);
        }

        let expected = all_pairs(&mut naive, &bodies);
        assert!(expected.contains(&(0, 1)));
        assert!(!expected.contains(&(0, 2)));
        assert_eq!(all_pairs(&mut sap, &bodies), expected);
        assert_eq!(all_pairs(&mut grid, &bodies), expected);
    }

    #[test]
    fn test_from_config() {
        let config = WorldConfig::default().with_broadphase(BroadphaseConfig::default_grid());
        assert_eq!(broadphase_from_config(&config).name(), "grid");
        let config = WorldConfig::fast();
        assert_eq!(broadphase_from_config(&config).name(), "sap");
        assert_eq!(broadphase_from_config(&WorldConfig::default()).name(), "naive");
    }
}
