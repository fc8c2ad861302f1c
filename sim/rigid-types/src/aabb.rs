//! Axis-aligned bounding boxes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::math::{component_max, component_min, Transform, Vec3};

/// An axis-aligned bounding box given by its two extreme corners.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner.
    pub lower_bound: Vec3,
    /// Maximum corner.
    pub upper_bound: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }
}

impl Aabb {
    /// Create a box from its corners.
    #[must_use]
    pub const fn new(lower_bound: Vec3, upper_bound: Vec3) -> Self {
        Self {
            lower_bound,
            upper_bound,
        }
    }

    /// Create a box centered at `center` with the given half extents.
    #[must_use]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// A box that contains nothing and absorbs the first `extend`.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec3::repeat(f64::MAX), Vec3::repeat(-f64::MAX))
    }

    /// A box that contains everything.
    #[must_use]
    pub fn everything() -> Self {
        Self::new(Vec3::repeat(-f64::MAX), Vec3::repeat(f64::MAX))
    }

    /// Smallest box containing `points` after mapping them through `frame`,
    /// grown by `skin` on every side.
    ///
    /// Returns an empty box for an empty point list.
    #[must_use]
    pub fn from_points<'a, I>(points: I, frame: Option<&Transform>, skin: f64) -> Self
    where
        I: IntoIterator<Item = &'a Vec3>,
    {
        let mut aabb = Self::empty();
        for p in points {
            let p = frame.map_or(*p, |f| f.point_to_world_frame(p));
            aabb.lower_bound = component_min(&aabb.lower_bound, &p);
            aabb.upper_bound = component_max(&aabb.upper_bound, &p);
        }
        if skin > 0.0 && aabb.is_valid() {
            aabb.lower_bound -= Vec3::repeat(skin);
            aabb.upper_bound += Vec3::repeat(skin);
        }
        aabb
    }

    /// Whether the lower bound does not exceed the upper bound on any axis.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lower_bound.x <= self.upper_bound.x
            && self.lower_bound.y <= self.upper_bound.y
            && self.lower_bound.z <= self.upper_bound.z
    }

    /// Grow this box to also contain `other`.
    pub fn extend(&mut self, other: &Self) {
        self.lower_bound = component_min(&self.lower_bound, &other.lower_bound);
        self.upper_bound = component_max(&self.upper_bound, &other.upper_bound);
    }

    /// Grow this box to contain a point.
    pub fn extend_point(&mut self, point: &Vec3) {
        self.lower_bound = component_min(&self.lower_bound, point);
        self.upper_bound = component_max(&self.upper_bound, point);
    }

    /// Whether the two boxes intersect. Touching boxes overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.lower_bound.x <= other.upper_bound.x
            && self.upper_bound.x >= other.lower_bound.x
            && self.lower_bound.y <= other.upper_bound.y
            && self.upper_bound.y >= other.lower_bound.y
            && self.lower_bound.z <= other.upper_bound.z
            && self.upper_bound.z >= other.lower_bound.z
    }

    /// Whether `other` lies entirely inside this box.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.lower_bound.x <= other.lower_bound.x
            && self.upper_bound.x >= other.upper_bound.x
            && self.lower_bound.y <= other.lower_bound.y
            && self.upper_bound.y >= other.upper_bound.y
            && self.lower_bound.z <= other.lower_bound.z
            && self.upper_bound.z >= other.upper_bound.z
    }

    /// Whether a point lies inside or on the box.
    #[must_use]
    pub fn contains_point(&self, p: &Vec3) -> bool {
        p.x >= self.lower_bound.x
            && p.x <= self.upper_bound.x
            && p.y >= self.lower_bound.y
            && p.y <= self.upper_bound.y
            && p.z >= self.lower_bound.z
            && p.z <= self.upper_bound.z
    }

    /// Volume of the box.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let e = self.upper_bound - self.lower_bound;
        e.x * e.y * e.z
    }

    /// Half extents of the box.
    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        (self.upper_bound - self.lower_bound) * 0.5
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.upper_bound + self.lower_bound) * 0.5
    }

    /// The eight corners of the box.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        let l = self.lower_bound;
        let u = self.upper_bound;
        [
            Vec3::new(l.x, l.y, l.z),
            Vec3::new(u.x, l.y, l.z),
            Vec3::new(u.x, u.y, l.z),
            Vec3::new(l.x, u.y, u.z),
            Vec3::new(u.x, u.y, u.z),
            Vec3::new(l.x, u.y, l.z),
            Vec3::new(l.x, l.y, u.z),
            Vec3::new(u.x, l.y, u.z),
        ]
    }

    /// Bounding box, in `frame`'s local coordinates, of this world box.
    #[must_use]
    pub fn to_local_frame(&self, frame: &Transform) -> Self {
        let local = self.corners().map(|c| frame.point_to_local_frame(&c));
        Self::from_points(local.iter(), None, 0.0)
    }

    /// Bounding box, in world coordinates, of this box expressed in `frame`.
    #[must_use]
    pub fn to_world_frame(&self, frame: &Transform) -> Self {
        Self::from_points(self.corners().iter(), Some(frame), 0.0)
    }

    /// Slab test against the ray starting at `from` along unit `direction`.
    ///
    /// Only the forward half-line is considered.
    #[must_use]
    pub fn overlaps_ray(&self, from: &Vec3, direction: &Vec3) -> bool {
        let inv = Vec3::new(1.0 / direction.x, 1.0 / direction.y, 1.0 / direction.z);

        let t1 = (self.lower_bound.x - from.x) * inv.x;
        let t2 = (self.upper_bound.x - from.x) * inv.x;
        let t3 = (self.lower_bound.y - from.y) * inv.y;
        let t4 = (self.upper_bound.y - from.y) * inv.y;
        let t5 = (self.lower_bound.z - from.z) * inv.z;
        let t6 = (self.upper_bound.z - from.z) * inv.z;

        // f64::min/max drop a NaN operand, which is what 0 * inf produces
        // when the origin sits on a slab face of a zero direction component.
        let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

        if tmax < 0.0 {
            return false;
        }
        tmin <= tmax
    }
}
