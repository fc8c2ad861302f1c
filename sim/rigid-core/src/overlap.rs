//! Overlap bookkeeping for begin and end contact events.
//!
//! Each step records the set of overlapping pairs. Comparing it with the
//! previous step's set yields the pairs that started and stopped touching.

/// Sorted sets of unordered pairs for the current and previous step.
#[derive(Debug, Clone)]
pub struct OverlapKeeper<K> {
    current: Vec<(K, K)>,
    previous: Vec<(K, K)>,
}

impl<K> Default for OverlapKeeper<K> {
    fn default() -> Self {
        Self {
            current: Vec::new(),
            previous: Vec::new(),
        }
    }
}

impl<K: Ord + Copy> OverlapKeeper<K> {
    /// An empty keeper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: K, b: K) -> (K, K) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Record that `a` and `b` overlap this step.
    pub fn set(&mut self, a: K, b: K) {
        let key = Self::key(a, b);
        if let Err(pos) = self.current.binary_search(&key) {
            self.current.insert(pos, key);
        }
    }

    /// Whether `a` and `b` overlap this step.
    #[must_use]
    pub fn contains(&self, a: K, b: K) -> bool {
        self.current.binary_search(&Self::key(a, b)).is_ok()
    }

    /// Start a new step: the current set becomes the previous one.
    pub fn tick(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
        self.current.clear();
    }

    /// Pairs overlapping this step.
    #[must_use]
    pub fn current(&self) -> &[(K, K)] {
        &self.current
    }

    /// Append pairs new this step to `additions` and pairs gone since the
    /// previous step to `removals`.
    pub fn diff(&self, additions: &mut Vec<(K, K)>, removals: &mut Vec<(K, K)>) {
        let (a, b) = (&self.current, &self.previous);
        let (mut i, mut j) = (0, 0);
        while i < a.len() || j < b.len() {
            match (a.get(i), b.get(j)) {
                (Some(x), Some(y)) if x == y => {
                    i += 1;
                    j += 1;
                }
                (Some(x), Some(y)) if x < y => {
                    additions.push(*x);
                    i += 1;
                }
                (Some(x), None) => {
                    additions.push(*x);
                    i += 1;
                }
                (_, Some(y)) => {
                    removals.push(*y);
                    j += 1;
                }
                (None, None) => break,
            }
        }
    }
}
