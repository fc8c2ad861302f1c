//! Octree over element bounding boxes.
//!
//! Used by [`Trimesh`](crate::Trimesh) to answer "which triangles overlap
//! this box" without visiting every triangle. Each element lives in exactly
//! one node: the deepest node whose box fully contains the element's box.
//!
//! ```text
//!            root
//!   ┌────┬────┼────┬────┐ ... 8 children, created on demand
//!  n0   n1   n2   n3   ...
//! ```
//!
//! Nodes are subdivided lazily during insertion and pruned afterwards by
//! [`Octree::remove_empty_nodes`], so sparse meshes do not pay for a full tree.

use rigid_types::math::Vec3;
use rigid_types::Aabb;

/// Default maximum subdivision depth.
pub const DEFAULT_MAX_DEPTH: usize = 8;

#[derive(Debug, Clone)]
struct OctreeNode {
    aabb: Aabb,
    data: Vec<usize>,
    children: Vec<OctreeNode>,
}

impl OctreeNode {
    fn new(aabb: Aabb) -> Self {
        Self {
            aabb,
            data: Vec::new(),
            children: Vec::new(),
        }
    }

    fn insert(&mut self, aabb: &Aabb, element: usize, level: usize, max_depth: usize) -> bool {
        if !self.aabb.contains(aabb) {
            return false;
        }

        if level < max_depth {
            let subdivided = if self.children.is_empty() {
                self.subdivide();
                true
            } else {
                false
            };

            for child in &mut self.children {
                if child.insert(aabb, element, level + 1, max_depth) {
                    return true;
                }
            }

            // No child took it; drop the children we just created.
            if subdivided {
                self.children.clear();
            }
        }

        self.data.push(element);
        true
    }

    fn subdivide(&mut self) {
        let l = self.aabb.lower_bound;
        let u = self.aabb.upper_bound;
        let half = (u - l) * 0.5;

        self.children.reserve(8);
        for i in 0..8_u8 {
            let offset = Vec3::new(
                if i & 1 == 0 { 0.0 } else { half.x },
                if i & 2 == 0 { 0.0 } else { half.y },
                if i & 4 == 0 { 0.0 } else { half.z },
            );
            let lower = l + offset;
            self.children.push(Self::new(Aabb::new(lower, lower + half)));
        }
    }

    fn remove_empty_nodes(&mut self) {
        for child in &mut self.children {
            child.remove_empty_nodes();
        }
        self.children
            .retain(|child| !child.children.is_empty() || !child.data.is_empty());
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

/// An octree storing element indices keyed by their bounding boxes.
#[derive(Debug, Clone)]
pub struct Octree {
    root: OctreeNode,
    max_depth: usize,
}

impl Octree {
    /// Create an empty tree covering `aabb`.
    #[must_use]
    pub fn new(aabb: Aabb, max_depth: usize) -> Self {
        Self {
            root: OctreeNode::new(aabb),
            max_depth,
        }
    }

    /// Box covered by the root node.
    #[must_use]
    pub fn aabb(&self) -> &Aabb {
        &self.root.aabb
    }

    /// Maximum subdivision depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Drop every element and child, and re-root the tree at `aabb`.
    pub fn reset(&mut self, aabb: Aabb) {
        self.root = OctreeNode::new(aabb);
    }

    /// Insert an element. Returns `false` if `aabb` is not inside the root.
    pub fn insert(&mut self, aabb: &Aabb, element: usize) -> bool {
        self.root.insert(aabb, element, 0, self.max_depth)
    }

    /// Collect every element stored in a node overlapping `aabb`.
    ///
    /// Elements are appended to `result`; callers still need an exact test.
    pub fn aabb_query(&self, aabb: &Aabb, result: &mut Vec<usize>) {
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if !node.aabb.overlaps(aabb) {
                continue;
            }
            result.extend_from_slice(&node.data);
            stack.extend(node.children.iter());
        }
    }

    /// Prune subtrees that hold no elements.
    pub fn remove_empty_nodes(&mut self) {
        self.root.remove_empty_nodes();
    }

    /// Number of nodes, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.root.count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn cube(min: f64, max: f64) -> Aabb {
        Aabb::new(Vec3::repeat(min), Vec3::repeat(max))
    }

    #[test]
    fn test_insert_outside_root_fails() {
        let mut tree = Octree::new(cube(0.0, 1.0), 4);
        assert!(!tree.insert(&cube(0.5, 1.5), 0));
        assert!(tree.insert(&cube(0.1, 0.2), 1));
    }

    #[test]
    fn test_query_returns_overlapping_elements() {
        let mut tree = Octree::new(cube(0.0, 8.0), DEFAULT_MAX_DEPTH);
        tree.insert(&cube(0.1, 0.2), 0);
        tree.insert(&cube(7.0, 7.5), 1);
        tree.insert(&cube(3.0, 5.0), 2);
        tree.remove_empty_nodes();

        let mut result = Vec::new();
        tree.aabb_query(&cube(0.0, 0.5), &mut result);
        assert!(result.contains(&0));
        assert!(!result.contains(&1));

        result.clear();
        tree.aabb_query(&cube(-1.0, 9.0), &mut result);
        result.sort_unstable();
        assert_eq!(result, vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_empty_nodes_prunes() {
        let mut tree = Octree::new(cube(0.0, 8.0), 3);
        tree.insert(&cube(0.1, 0.2), 0);
        let before = tree.node_count();
        tree.remove_empty_nodes();
        assert!(tree.node_count() < before);

        let mut result = Vec::new();
        tree.aabb_query(&cube(0.0, 1.0), &mut result);
        assert_eq!(result, vec![0]);
    }
}
