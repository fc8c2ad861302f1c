//! Heightfields over a regular grid.
//!
//! Heights are sampled at `data[xi][yi]` and live along local +Z; sample
//! `(xi, yi)` sits at local `(xi * element_size, yi * element_size)`. Each
//! grid cell is split along its anti-diagonal into a lower and an upper
//! triangle:
//!
//! ```text
//!   (xi, yi+1) ●───────● (xi+1, yi+1)
//!              │ ╲  up │
//!              │   ╲   │
//!              │ low ╲ │
//!       (xi, yi) ●───────● (xi+1, yi)
//! ```
//!
//! Collision treats each triangle as a closed convex "pillar" that extends
//! from the triangle down to one unit below the lowest sample, so the convex
//! routines can be reused unchanged. Pillars are built lazily and cached per
//! cell; changing a sample invalidates the cells that touch it.

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use rigid_types::math::{Quat, Vec3};
use rigid_types::{Aabb, Result, RigidError, Transform};

use crate::convex::ConvexPolyhedron;

/// A triangle pillar and the local offset of its polyhedron.
#[derive(Debug, Clone, PartialEq)]
pub struct Pillar {
    /// Polyhedron, centered near its own origin.
    pub convex: ConvexPolyhedron,
    /// Position of the polyhedron origin in heightfield-local coordinates.
    pub offset: Vec3,
}

/// Inclusive range of cells `[x0, x1) x [y0, y1)` to visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    /// First cell column.
    pub x0: usize,
    /// One past the last cell column.
    pub x1: usize,
    /// First cell row.
    pub y0: usize,
    /// One past the last cell row.
    pub y1: usize,
}

impl CellRange {
    /// Every `(xi, yi)` cell in the range.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.x0..self.x1).flat_map(move |xi| (self.y0..self.y1).map(move |yi| (xi, yi)))
    }
}

type PillarKey = (usize, usize, bool);

/// A grid of height samples.
#[derive(Debug, Clone)]
pub struct Heightfield {
    data: Vec<Vec<f64>>,
    element_size: f64,
    min_value: f64,
    max_value: f64,
    bounding_sphere_radius: f64,
    pillars: RefCell<HashMap<PillarKey, Rc<Pillar>>>,
}

impl PartialEq for Heightfield {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.element_size == other.element_size
    }
}

impl Heightfield {
    /// Build a heightfield from `data[xi][yi]` samples spaced `element_size` apart.
    pub fn new(data: Vec<Vec<f64>>, element_size: f64) -> Result<Self> {
        if !element_size.is_finite() || element_size <= 0.0 {
            return Err(RigidError::invalid_shape(format!(
                "heightfield element size must be positive, got {element_size}"
            )));
        }
        if data.len() < 2 {
            return Err(RigidError::invalid_shape(
                "heightfield needs at least 2 columns",
            ));
        }
        let rows = data[0].len();
        if rows < 2 {
            return Err(RigidError::invalid_shape("heightfield needs at least 2 rows"));
        }
        if data.iter().any(|column| column.len() != rows) {
            return Err(RigidError::invalid_shape(
                "heightfield columns have different lengths",
            ));
        }
        if data.iter().flatten().any(|h| !h.is_finite()) {
            return Err(RigidError::invalid_shape("heightfield sample is not finite"));
        }

        let mut field = Self {
            data,
            element_size,
            min_value: 0.0,
            max_value: 0.0,
            bounding_sphere_radius: 0.0,
            pillars: RefCell::new(HashMap::new()),
        };
        field.update();
        Ok(field)
    }

    /// Recompute min/max and the bounding radius, and drop every cached pillar.
    /// Call after editing samples in bulk through [`data_mut`](Self::data_mut).
    pub fn update(&mut self) {
        let (min, max) = self
            .data
            .iter()
            .flatten()
            .fold((f64::MAX, -f64::MAX), |(lo, hi), &h| (lo.min(h), hi.max(h)));
        self.min_value = min;
        self.max_value = max;
        self.bounding_sphere_radius = Vec3::new(
            self.data.len() as f64 * self.element_size,
            self.size_y() as f64 * self.element_size,
            max.abs().max(min.abs()),
        )
        .norm();
        self.pillars.get_mut().clear();
    }

    /// Samples as `data[xi][yi]`.
    #[must_use]
    pub fn data(&self) -> &[Vec<f64>] {
        &self.data
    }

    /// Mutable samples. [`update`](Self::update) must be called afterwards.
    pub fn data_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.data
    }

    /// Sample count along local X.
    #[must_use]
    pub fn size_x(&self) -> usize {
        self.data.len()
    }

    /// Sample count along local Y.
    #[must_use]
    pub fn size_y(&self) -> usize {
        self.data[0].len()
    }

    /// Spacing between samples.
    #[must_use]
    pub fn element_size(&self) -> f64 {
        self.element_size
    }

    /// Lowest sample.
    #[must_use]
    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    /// Highest sample.
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Radius of a sphere around the local origin enclosing the field.
    #[must_use]
    pub fn bounding_sphere_radius(&self) -> f64 {
        self.bounding_sphere_radius
    }

    /// Sample at an index, if in range.
    #[must_use]
    pub fn height_at_index(&self, xi: usize, yi: usize) -> Option<f64> {
        self.data.get(xi).and_then(|column| column.get(yi)).copied()
    }

    /// Set one sample, invalidating the pillars of the cells that use it.
    pub fn set_height_value_at_index(&mut self, xi: usize, yi: usize, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(RigidError::invalid_shape("heightfield sample is not finite"));
        }
        let Some(slot) = self.data.get_mut(xi).and_then(|column| column.get_mut(yi)) else {
            return Err(RigidError::invalid_shape(format!(
                "heightfield index ({xi}, {yi}) out of range"
            )));
        };
        *slot = value;

        let old_min = self.min_value;
        let (min, max) = self
            .data
            .iter()
            .flatten()
            .fold((f64::MAX, -f64::MAX), |(lo, hi), &h| (lo.min(h), hi.max(h)));
        self.min_value = min;
        self.max_value = max;

        let pillars = self.pillars.get_mut();
        if min == old_min {
            for cx in xi.saturating_sub(1)..=xi {
                for cy in yi.saturating_sub(1)..=yi {
                    pillars.remove(&(cx, cy, false));
                    pillars.remove(&(cx, cy, true));
                }
            }
        } else {
            // Every pillar floor hangs off the minimum.
            pillars.clear();
        }
        Ok(())
    }

    /// Enclosed volume, reported as unbounded.
    #[must_use]
    pub fn volume(&self) -> f64 {
        f64::MAX
    }

    /// Bounds in local coordinates, from sample extents and min/max height.
    #[must_use]
    pub fn local_aabb(&self) -> Aabb {
        Aabb::new(
            Vec3::new(0.0, 0.0, self.min_value),
            Vec3::new(
                (self.size_x() - 1) as f64 * self.element_size,
                (self.size_y() - 1) as f64 * self.element_size,
                self.max_value,
            ),
        )
    }

    /// Bounding box at a world pose.
    #[must_use]
    pub fn calculate_world_aabb(&self, position: &Vec3, quaternion: &Quat) -> Aabb {
        self.local_aabb()
            .to_world_frame(&Transform::new(*position, *quaternion))
    }

    /// Cell containing local `(x, y)`.
    ///
    /// With `clamp`, positions outside the grid map to the nearest edge cell;
    /// otherwise they yield `None`.
    #[must_use]
    pub fn index_of_position(&self, x: f64, y: f64, clamp: bool) -> Option<(usize, usize)> {
        let xi = (x / self.element_size).floor();
        let yi = (y / self.element_size).floor();
        let max_x = (self.size_x() - 2) as f64;
        let max_y = (self.size_y() - 2) as f64;
        if clamp {
            return Some((xi.clamp(0.0, max_x) as usize, yi.clamp(0.0, max_y) as usize));
        }
        if xi < 0.0 || yi < 0.0 || xi > max_x || yi > max_y || xi.is_nan() || yi.is_nan() {
            return None;
        }
        Some((xi as usize, yi as usize))
    }

    /// Cells that can touch a local disc of `radius` around `(x, y)`, padded
    /// by one cell and clamped to the grid. `None` when the range is empty.
    #[must_use]
    pub fn cell_range_around(&self, x: f64, y: f64, radius: f64) -> Option<CellRange> {
        let es = self.element_size;
        let clamp = |v: f64, n: usize| -> usize { v.clamp(0.0, (n - 1) as f64) as usize };
        let range = CellRange {
            x0: clamp(((x - radius) / es).floor() - 1.0, self.size_x()),
            x1: clamp(((x + radius) / es).ceil() + 1.0, self.size_x()),
            y0: clamp(((y - radius) / es).floor() - 1.0, self.size_y()),
            y1: clamp(((y + radius) / es).ceil() + 1.0, self.size_y()),
        };
        (range.x0 < range.x1 && range.y0 < range.y1).then_some(range)
    }

    /// Cells whose footprint overlaps a local box, padded by one cell.
    #[must_use]
    pub fn cell_range_for_aabb(&self, local: &Aabb) -> Option<CellRange> {
        let c = local.center();
        let h = local.half_extents();
        self.cell_range_around(c.x, c.y, h.x.max(h.y))
    }

    /// Corners of a triangle of cell `(xi, yi)`, in local coordinates.
    #[must_use]
    pub fn triangle(&self, xi: usize, yi: usize, upper: bool) -> [Vec3; 3] {
        let es = self.element_size;
        let d = &self.data;
        let p = |x: usize, y: usize| Vec3::new(x as f64 * es, y as f64 * es, d[x][y]);
        if upper {
            [p(xi + 1, yi + 1), p(xi, yi + 1), p(xi + 1, yi)]
        } else {
            [p(xi, yi), p(xi + 1, yi), p(xi, yi + 1)]
        }
    }

    /// Which triangle of which cell a local `(x, y)` falls in.
    #[must_use]
    pub fn triangle_at(&self, x: f64, y: f64, edge_clamp: bool) -> Option<(usize, usize, bool)> {
        let (xi, yi) = self.index_of_position(x, y, edge_clamp)?;
        let fx = x / self.element_size;
        let fy = y / self.element_size;
        let lower_dist2 = (fx - xi as f64).powi(2) + (fy - yi as f64).powi(2);
        let upper_dist2 = (fx - (xi + 1) as f64).powi(2) + (fy - (yi + 1) as f64).powi(2);
        Some((xi, yi, lower_dist2 > upper_dist2))
    }

    /// Interpolated height at local `(x, y)`.
    #[must_use]
    pub fn height_at(&self, x: f64, y: f64, edge_clamp: bool) -> Option<f64> {
        let (xi, yi, upper) = self.triangle_at(x, y, edge_clamp)?;
        let [a, b, c] = self.triangle(xi, yi, upper);
        let (wa, wb, wc) = barycentric_weights(x, y, &a, &b, &c);
        Some(a.z * wa + b.z * wb + c.z * wc)
    }

    /// Smallest and largest sample in the inclusive index rectangle.
    #[must_use]
    pub fn rect_min_max(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> (f64, f64) {
        let x1 = x1.min(self.size_x() - 1);
        let y1 = y1.min(self.size_y() - 1);
        let mut min = f64::MAX;
        let mut max = -f64::MAX;
        for column in &self.data[x0.min(x1)..=x1] {
            for &h in &column[y0.min(y1)..=y1] {
                min = min.min(h);
                max = max.max(h);
            }
        }
        (min, max)
    }

    /// Local bounds of cell `(xi, yi)`.
    #[must_use]
    pub fn aabb_at_index(&self, xi: usize, yi: usize) -> Aabb {
        let es = self.element_size;
        let (min, max) = self.rect_min_max(xi, yi, xi + 1, yi + 1);
        Aabb::new(
            Vec3::new(xi as f64 * es, yi as f64 * es, min),
            Vec3::new((xi + 1) as f64 * es, (yi + 1) as f64 * es, max),
        )
    }

    /// The pillar under one triangle of cell `(xi, yi)`, built on first use.
    ///
    /// `xi` and `yi` must address a cell, i.e. be at most `size - 2`.
    pub fn convex_triangle_pillar(&self, xi: usize, yi: usize, upper: bool) -> Result<Rc<Pillar>> {
        if xi + 1 >= self.size_x() || yi + 1 >= self.size_y() {
            return Err(RigidError::invalid_shape(format!(
                "heightfield cell ({xi}, {yi}) out of range"
            )));
        }
        let key = (xi, yi, upper);
        if let Some(pillar) = self.pillars.borrow().get(&key) {
            return Ok(Rc::clone(pillar));
        }
        let pillar = Rc::new(self.build_pillar(xi, yi, upper)?);
        self.pillars.borrow_mut().insert(key, Rc::clone(&pillar));
        Ok(pillar)
    }

    /// Number of cached pillars.
    #[must_use]
    pub fn cached_pillar_count(&self) -> usize {
        self.pillars.borrow().len()
    }

    fn build_pillar(&self, xi: usize, yi: usize, upper: bool) -> Result<Pillar> {
        let es = self.element_size;
        let d = &self.data;
        let (min4, _) = self.rect_min_max(xi, yi, xi + 1, yi + 1);
        let h = (min4 - self.min_value) / 2.0 + self.min_value;
        let floor = self.min_value - 1.0 - h;

        let (offset, top) = if upper {
            (
                Vec3::new((xi as f64 + 0.75) * es, (yi as f64 + 0.75) * es, h),
                [
                    (0.25, 0.25, d[xi + 1][yi + 1]),
                    (-0.75, 0.25, d[xi][yi + 1]),
                    (0.25, -0.75, d[xi + 1][yi]),
                ],
            )
        } else {
            (
                Vec3::new((xi as f64 + 0.25) * es, (yi as f64 + 0.25) * es, h),
                [
                    (-0.25, -0.25, d[xi][yi]),
                    (0.75, -0.25, d[xi + 1][yi]),
                    (-0.25, 0.75, d[xi][yi + 1]),
                ],
            )
        };

        let mut vertices = Vec::with_capacity(6);
        for &(u, v, z) in &top {
            vertices.push(Vec3::new(u * es, v * es, z - h));
        }
        for &(u, v, _) in &top {
            vertices.push(Vec3::new(u * es, v * es, floor));
        }
        let faces = vec![
            vec![0, 1, 2],
            vec![5, 4, 3],
            vec![0, 2, 5, 3],
            vec![1, 0, 3, 4],
            vec![4, 5, 2, 1],
        ];
        Ok(Pillar {
            convex: ConvexPolyhedron::new(vertices, faces)?,
            offset,
        })
    }
}

/// Barycentric weights of `(x, y)` with respect to the XY projection of a triangle.
fn barycentric_weights(x: f64, y: f64, a: &Vec3, b: &Vec3, c: &Vec3) -> (f64, f64, f64) {
    let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    let wa = ((b.y - c.y) * (x - c.x) + (c.x - b.x) * (y - c.y)) / det;
    let wb = ((c.y - a.y) * (x - c.x) + (a.x - c.x) * (y - c.y)) / det;
    (wa, wb, 1.0 - wa - wb)
}
