//! Sweep-and-prune along a single axis.
//!
//! Bodies are kept in a list sorted by the lower bound of their world AABB
//! on the sweep axis. Bodies move little between steps, so the list stays
//! nearly sorted and insertion sort brings it back in close to linear time.
//! The sweep stops scanning partners once a lower bound passes the current
//! body's upper bound.

use rigid_types::{Aabb, Axis};
use tracing::trace;

use super::{intersection_test, need_broadphase_collision, Broadphase};
use crate::body::Body;

/// Sweep-and-prune broadphase.
#[derive(Debug, Clone)]
pub struct SapBroadphase {
    /// Body slots sorted by AABB lower bound on `axis`.
    axis_list: Vec<usize>,
    fixed_axis: Option<Axis>,
    axis: Axis,
    dirty: bool,
    use_bounding_boxes: bool,
}

impl Default for SapBroadphase {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SapBroadphase {
    /// Create a sweep-and-prune broadphase. `None` re-picks the axis of
    /// largest positional variance every step.
    #[must_use]
    pub fn new(axis: Option<Axis>) -> Self {
        Self {
            axis_list: Vec::new(),
            fixed_axis: axis,
            axis: axis.unwrap_or(Axis::X),
            dirty: true,
            use_bounding_boxes: false,
        }
    }

    /// Compare world AABBs instead of bounding spheres.
    #[must_use]
    pub fn with_bounding_boxes(mut self, enabled: bool) -> Self {
        self.use_bounding_boxes = enabled;
        self
    }

    /// The current sweep axis.
    #[must_use]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Tracked body slots in sweep order.
    #[must_use]
    pub fn axis_list(&self) -> &[usize] {
        &self.axis_list
    }

    /// Axis along which body centers are most spread out.
    #[must_use]
    pub fn auto_detect_axis(bodies: &[Body]) -> Axis {
        if bodies.is_empty() {
            return Axis::X;
        }
        #[allow(clippy::cast_precision_loss)]
        let inv_n = 1.0 / bodies.len() as f64;
        let mut sum = [0.0; 3];
        let mut sum_sq = [0.0; 3];
        for body in bodies {
            for k in 0..3 {
                let c = body.position[k];
                sum[k] += c;
                sum_sq[k] += c * c;
            }
        }
        let var = |k: usize| sum_sq[k] - sum[k] * sum[k] * inv_n;
        let (vx, vy, vz) = (var(0), var(1), var(2));
        if vx > vy {
            if vx > vz {
                Axis::X
            } else {
                Axis::Z
            }
        } else if vy > vz {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    fn sort_list(&mut self, bodies: &[Body]) {
        let k = self.axis.index();
        let lower = |slot: usize| bodies[slot].aabb().lower_bound[k];
        let list = &mut self.axis_list;
        for i in 1..list.len() {
            let v = list[i];
            let key = lower(v);
            let mut j = i;
            while j > 0 && lower(list[j - 1]) > key {
                list[j] = list[j - 1];
                j -= 1;
            }
            list[j] = v;
        }
    }

    fn prepare(&mut self, bodies: &[Body]) {
        if self.fixed_axis.is_none() {
            let axis = Self::auto_detect_axis(bodies);
            if axis != self.axis {
                trace!(from = ?self.axis, to = ?axis, "sweep axis changed");
                self.axis = axis;
                self.dirty = true;
            }
        }
        if self.dirty {
            self.sort_list(bodies);
            self.dirty = false;
        }
    }
}

impl Broadphase for SapBroadphase {
    fn collision_pairs(&mut self, bodies: &[Body], pairs: &mut Vec<(usize, usize)>) {
        self.prepare(bodies);

        let k = self.axis.index();
        let n = self.axis_list.len();
        for i in 0..n {
            let si = self.axis_list[i];
            let bi = &bodies[si];
            let upper = bi.aabb().upper_bound[k];
            for &sj in &self.axis_list[i + 1..] {
                let bj = &bodies[sj];
                if !need_broadphase_collision(bi, bj) {
                    continue;
                }
                if bj.aabb().lower_bound[k] > upper {
                    break;
                }
                if intersection_test(bi, bj, self.use_bounding_boxes) {
                    pairs.push((si, sj));
                }
            }
        }
    }

    fn aabb_query(&mut self, bodies: &[Body], aabb: &Aabb, result: &mut Vec<usize>) {
        self.prepare(bodies);
        let k = self.axis.index();
        for &slot in &self.axis_list {
            let body_aabb = bodies[slot].aabb();
            if body_aabb.lower_bound[k] > aabb.upper_bound[k] {
                break;
            }
            if body_aabb.overlaps(aabb) {
                result.push(slot);
            }
        }
    }

    fn body_added(&mut self, slot: usize) {
        self.axis_list.push(slot);
        self.dirty = true;
    }

    fn body_removed(&mut self, slot: usize) {
        self.axis_list.retain(|&s| s != slot);
        for s in &mut self.axis_list {
            if *s > slot {
                *s -= 1;
            }
        }
        self.dirty = true;
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn name(&self) -> &'static str {
        "sap"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::broad_phase::tests::{all_pairs, sphere_at};
    use rigid_types::math::Vec3;

    fn tracked(bodies: &[Body], axis: Option<Axis>) -> SapBroadphase {
        let mut sap = SapBroadphase::new(axis);
        for slot in 0..bodies.len() {
            sap.body_added(slot);
        }
        sap
    }

    #[test]
    fn test_auto_axis_follows_spread() {
        let bodies: Vec<Body> = [0.0, 5.0, 10.0]
            .iter()
            .map(|&z| sphere_at(0.1, 0.0, z))
            .collect();
        assert_eq!(SapBroadphase::auto_detect_axis(&bodies), Axis::Z);

        let mut sap = tracked(&bodies, None);
        let _ = all_pairs(&mut sap, &bodies);
        assert_eq!(sap.axis(), Axis::Z);
    }

    #[test]
    fn test_fixed_axis_is_kept() {
        let bodies: Vec<Body> = [0.0, 5.0].iter().map(|&z| sphere_at(0.0, 0.0, z)).collect();
        let mut sap = tracked(&bodies, Some(Axis::Y));
        let _ = all_pairs(&mut sap, &bodies);
        assert_eq!(sap.axis(), Axis::Y);
    }

    #[test]
    fn test_list_sorted_by_lower_bound() {
        let bodies = vec![
            sphere_at(9.0, 0.0, 0.0),
            sphere_at(1.0, 0.0, 0.0),
            sphere_at(4.0, 0.0, 0.0),
        ];
        let mut sap = tracked(&bodies, Some(Axis::X));
        let _ = all_pairs(&mut sap, &bodies);
        assert_eq!(sap.axis_list(), &[1, 2, 0]);
    }

    #[test]
    fn test_removal_shifts_slots() {
        let bodies = vec![
            sphere_at(0.0, 0.0, 0.0),
            sphere_at(1.0, 0.0, 0.0),
            sphere_at(2.0, 0.0, 0.0),
        ];
        let mut sap = tracked(&bodies, Some(Axis::X));
        sap.body_removed(0);
        let remaining = &bodies[1..];
        assert_eq!(all_pairs(&mut sap, remaining), vec![(0, 1)]);
    }

    #[test]
    fn test_aabb_query_prunes() {
        let bodies = vec![sphere_at(0.0, 0.0, 0.0), sphere_at(20.0, 0.0, 0.0)];
        let mut sap = tracked(&bodies, Some(Axis::X));
        let mut result = Vec::new();
        let query = Aabb::from_center(Vec3::new(19.0, 0.0, 0.0), Vec3::repeat(0.5));
        sap.aabb_query(&bodies, &query, &mut result);
        assert_eq!(result, vec![1]);
    }
}
