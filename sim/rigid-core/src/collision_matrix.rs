//! Which body pairs touched during a step.
//!
//! The world keeps two matrices, one for the current step and one for the
//! previous, and swaps them at the start of every step. A contact between
//! a pair absent from the previous matrix is a first contact.

use hashbrown::HashSet;
use rigid_types::BodyId;

/// Symmetric boolean relation over body pairs.
pub trait CollisionMatrix: std::fmt::Debug {
    /// Whether the pair is marked.
    fn get(&self, a: Key, b: Key) -> bool;
    /// Mark or unmark a pair.
    fn set(&mut self, a: Key, b: Key, value: bool);
    /// Unmark every pair.
    fn reset(&mut self);
}

/// How a matrix addresses a body: by id or by slot in the body list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    /// Body id.
    pub id: BodyId,
    /// Slot in the world's body list.
    pub slot: usize,
}

impl Key {
    /// Key for a body at `slot`.
    #[must_use]
    pub const fn new(id: BodyId, slot: usize) -> Self {
        Self { id, slot }
    }
}

/// Dense lower-triangular matrix indexed by body slot.
///
/// Memory grows with the square of the body count; resize it whenever
/// bodies are added or removed.
#[derive(Debug, Clone, Default)]
pub struct ArrayCollisionMatrix {
    cells: Vec<bool>,
}

impl ArrayCollisionMatrix {
    /// A matrix for `n` bodies.
    #[must_use]
    pub fn new(n: usize) -> Self {
        let mut m = Self::default();
        m.set_num_objects(n);
        m
    }

    /// Resize for `n` bodies, clearing every pair.
    pub fn set_num_objects(&mut self, n: usize) {
        self.cells.clear();
        self.cells.resize(n * n.saturating_sub(1) / 2, false);
    }

    fn index(a: usize, b: usize) -> Option<usize> {
        let (i, j) = if a > b { (a, b) } else { (b, a) };
        (i != j).then(|| i * (i - 1) / 2 + j)
    }
}

impl CollisionMatrix for ArrayCollisionMatrix {
    fn get(&self, a: Key, b: Key) -> bool {
        Self::index(a.slot, b.slot)
            .and_then(|i| self.cells.get(i).copied())
            .unwrap_or(false)
    }

    fn set(&mut self, a: Key, b: Key, value: bool) {
        if let Some(cell) = Self::index(a.slot, b.slot).and_then(|i| self.cells.get_mut(i)) {
            *cell = value;
        }
    }

    fn reset(&mut self) {
        self.cells.fill(false);
    }
}

/// Sparse matrix keyed by body id pair. Unaffected by slot changes.
#[derive(Debug, Clone, Default)]
pub struct ObjectCollisionMatrix {
    pairs: HashSet<(BodyId, BodyId)>,
}

impl ObjectCollisionMatrix {
    /// An empty matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Number of marked pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pair is marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl CollisionMatrix for ObjectCollisionMatrix {
    fn get(&self, a: Key, b: Key) -> bool {
        self.pairs.contains(&Self::key(a.id, b.id))
    }

    fn set(&mut self, a: Key, b: Key, value: bool) {
        let key = Self::key(a.id, b.id);
        if value {
            self.pairs.insert(key);
        } else {
            self.pairs.remove(&key);
        }
    }

    fn reset(&mut self) {
        self.pairs.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn keys() -> [Key; 3] {
        [
            Key::new(BodyId::new(7), 0),
            Key::new(BodyId::new(3), 1),
            Key::new(BodyId::new(9), 2),
        ]
    }

    fn exercise(m: &mut dyn CollisionMatrix) {
        let [a, b, c] = keys();
        assert!(!m.get(a, b));
        m.set(b, a, true);
        assert!(m.get(a, b));
        assert!(!m.get(a, c));
        m.set(c, b, true);
        m.set(a, b, false);
        assert!(!m.get(b, a));
        assert!(m.get(b, c));
        m.reset();
        assert!(!m.get(b, c));
    }

    #[test]
    fn test_array_matrix() {
        exercise(&mut ArrayCollisionMatrix::new(3));
    }

    #[test]
    fn test_object_matrix() {
        exercise(&mut ObjectCollisionMatrix::new());
    }

    #[test]
    fn test_array_matrix_ignores_self_pairs_and_out_of_range() {
        let [a, ..] = keys();
        let mut m = ArrayCollisionMatrix::new(2);
        m.set(a, a, true);
        assert!(!m.get(a, a));
        let far = Key::new(BodyId::new(1), 10);
        m.set(a, far, true);
        assert!(!m.get(a, far));
    }
}
