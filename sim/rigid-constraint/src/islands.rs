//! Island splitting.
//!
//! Bodies connected through equations form an island. Islands share no
//! equations, so each can be solved on its own and the iteration budget is
//! spent where the coupling actually is.
//!
//! # Algorithm
//!
//! Breadth-first traversal over the body/equation adjacency graph:
//!
//! 1. Pick an unvisited body that propagates (awake, not static) as a root
//! 2. Visit every equation touching a dequeued body, and enqueue the other
//!    body if it propagates
//! 3. Static and sleeping bodies are never enqueued, so they join every
//!    island that touches them without merging those islands
//!
//! ```text
//!   A ─ B ─ [ground] ─ C ─ D      =>   {A, B | ground}   {C, D | ground}
//! ```
//!
//! Equations inside an island keep their original relative order, so an
//! island solve reproduces the full solve on disjoint systems.

use std::collections::VecDeque;

use rigid_types::SolverConfig;
use smallvec::SmallVec;
use tracing::trace;

use crate::equation::Equation;
use crate::solver::{GsSolver, Solver, SolverBody};

/// One connected component of the equation graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Island {
    /// Propagating body slots in traversal order.
    pub bodies: Vec<usize>,
    /// Equation slots in ascending order.
    pub equations: Vec<usize>,
}

impl Island {
    /// Number of bodies in this island.
    #[must_use]
    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Number of equations in this island.
    #[must_use]
    pub fn num_equations(&self) -> usize {
        self.equations.len()
    }
}

/// Partition enabled equations into islands.
///
/// Bodies that touch no equation form no island.
#[must_use]
pub fn find_islands(bodies: &[SolverBody], equations: &[Equation]) -> Vec<Island> {
    let mut builder = IslandBuilder::default();
    let mut islands = Vec::new();
    builder.build(bodies, equations, |island| islands.push(island.clone()));
    islands
}

#[derive(Debug, Clone, Default)]
struct IslandBuilder {
    adjacency: Vec<SmallVec<[usize; 8]>>,
    visited: Vec<bool>,
    equation_seen: Vec<bool>,
    queue: VecDeque<usize>,
    island: Island,
}

impl IslandBuilder {
    fn build<F>(&mut self, bodies: &[SolverBody], equations: &[Equation], mut visit: F) -> usize
    where
        F: FnMut(&Island),
    {
        self.adjacency.clear();
        self.adjacency.resize_with(bodies.len(), SmallVec::new);
        for (i, eq) in equations.iter().enumerate() {
            if !eq.enabled {
                continue;
            }
            self.adjacency[eq.body_a].push(i);
            if eq.body_b != eq.body_a {
                self.adjacency[eq.body_b].push(i);
            }
        }

        self.visited.clear();
        self.visited.resize(bodies.len(), false);
        self.equation_seen.clear();
        self.equation_seen.resize(equations.len(), false);

        let mut count = 0;
        for root in 0..bodies.len() {
            if self.visited[root] || !bodies[root].propagates {
                continue;
            }
            self.island.bodies.clear();
            self.island.equations.clear();

            self.visited[root] = true;
            self.queue.push_back(root);
            while let Some(node) = self.queue.pop_front() {
                self.island.bodies.push(node);
                for &e in &self.adjacency[node] {
                    if !self.equation_seen[e] {
                        self.equation_seen[e] = true;
                        self.island.equations.push(e);
                    }
                    let eq = &equations[e];
                    let other = if eq.body_a == node { eq.body_b } else { eq.body_a };
                    if !self.visited[other] && bodies[other].propagates {
                        self.visited[other] = true;
                        self.queue.push_back(other);
                    }
                }
            }

            if self.island.equations.is_empty() {
                continue;
            }
            self.island.equations.sort_unstable();
            visit(&self.island);
            count += 1;
        }
        count
    }
}

/// Solves each island separately with an inner [`GsSolver`].
#[derive(Debug, Clone, Default)]
pub struct SplitSolver {
    inner: GsSolver,
    builder: IslandBuilder,
}

impl SplitSolver {
    /// Wrap a Gauss-Seidel solver.
    #[must_use]
    pub fn new(inner: GsSolver) -> Self {
        Self {
            inner,
            builder: IslandBuilder::default(),
        }
    }

    /// Build the inner solver from a configuration.
    #[must_use]
    pub fn from_config(config: SolverConfig) -> Self {
        Self::new(GsSolver::new(config))
    }

    /// The solver used per island.
    #[must_use]
    pub fn inner(&self) -> &GsSolver {
        &self.inner
    }
}

impl Solver for SplitSolver {
    fn solve(&mut self, dt: f64, bodies: &mut [SolverBody], equations: &mut [Equation]) -> usize {
        for eq in equations.iter_mut() {
            eq.multiplier = 0.0;
        }

        // Islands are collected first; the inner solve needs the bodies mutably.
        let mut islands: SmallVec<[Island; 4]> = SmallVec::new();
        let count = self
            .builder
            .build(bodies, equations, |island| islands.push(island.clone()));

        let mut max_iterations = 0;
        for island in &islands {
            let used =
                self.inner
                    .solve_subset(dt, bodies, equations, &island.equations, &island.bodies);
            max_iterations = max_iterations.max(used);
        }
        trace!(islands = count, max_iterations, "split solve finished");
        count
    }
}
