//! Configuration types for a simulation world.
//!
//! This module provides the knobs that control how a world steps: gravity,
//! sleeping, quaternion renormalization, which broadphase and solver to use,
//! and the default contact parameters.

use crate::math::Vec3;
use crate::{Result, RigidError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Standard gravitational acceleration used by the presets (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.82;

/// Main configuration for a world.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    /// Gravitational acceleration applied to every dynamic body.
    pub gravity: Vec3,
    /// Whether bodies may fall asleep.
    pub allow_sleep: bool,
    /// Renormalize orientations every `quat_normalize_skip + 1` steps.
    pub quat_normalize_skip: u32,
    /// Use the one-step approximate renormalization.
    pub quat_normalize_fast: bool,
    /// Average same-pair contacts into a single friction pair.
    pub friction_reduction: bool,
    /// Broadphase selection.
    pub broadphase: BroadphaseConfig,
    /// Solver selection.
    pub solver: SolverConfig,
    /// Parameters of the default contact material.
    pub contact: ContactDefaults,
    /// Maximum fixed substeps per call to the interpolating step.
    pub max_substeps: u32,
    /// Pre-test broadphase pairs with AABBs instead of bounding spheres.
    pub use_bounding_boxes: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::zeros(),
            allow_sleep: false,
            quat_normalize_skip: 0,
            quat_normalize_fast: false,
            friction_reduction: false,
            broadphase: BroadphaseConfig::default(),
            solver: SolverConfig::default(),
            contact: ContactDefaults::default(),
            max_substeps: 10,
            use_bounding_boxes: false,
        }
    }
}

impl WorldConfig {
    /// Earth gravity along -Y with sleeping enabled.
    #[must_use]
    pub fn earth() -> Self {
        Self {
            gravity: Vec3::new(0.0, -STANDARD_GRAVITY, 0.0),
            allow_sleep: true,
            ..Default::default()
        }
    }

    /// Cheap settings for large scenes: SAP, fewer iterations, fast
    /// renormalization every other step.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            gravity: Vec3::new(0.0, -STANDARD_GRAVITY, 0.0),
            allow_sleep: true,
            quat_normalize_skip: 1,
            quat_normalize_fast: true,
            friction_reduction: true,
            broadphase: BroadphaseConfig::SweepAndPrune { axis: None },
            solver: SolverConfig::fast(),
            ..Default::default()
        }
    }

    /// Accurate settings: more iterations, tighter tolerance, exact
    /// renormalization every step.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            gravity: Vec3::new(0.0, -STANDARD_GRAVITY, 0.0),
            solver: SolverConfig::high_accuracy(),
            ..Default::default()
        }
    }

    /// Set the gravity vector.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Enable or disable sleeping.
    #[must_use]
    pub fn with_sleep(mut self, allow_sleep: bool) -> Self {
        self.allow_sleep = allow_sleep;
        self
    }

    /// Set the broadphase.
    #[must_use]
    pub fn with_broadphase(mut self, broadphase: BroadphaseConfig) -> Self {
        self.broadphase = broadphase;
        self
    }

    /// Set the solver configuration.
    #[must_use]
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Enable or disable friction reduction.
    #[must_use]
    pub fn with_friction_reduction(mut self, enabled: bool) -> Self {
        self.friction_reduction = enabled;
        self
    }

    /// Set the quaternion renormalization policy.
    #[must_use]
    pub fn with_quat_normalization(mut self, skip: u32, fast: bool) -> Self {
        self.quat_normalize_skip = skip;
        self.quat_normalize_fast = fast;
        self
    }

    /// Pre-test broadphase pairs with AABBs instead of bounding spheres.
    #[must_use]
    pub fn with_bounding_boxes(mut self, enabled: bool) -> Self {
        self.use_bounding_boxes = enabled;
        self
    }

    /// Set the default contact parameters.
    #[must_use]
    pub fn with_contact(mut self, contact: ContactDefaults) -> Self {
        self.contact = contact;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(RigidError::invalid_config("gravity must be finite"));
        }
        if self.max_substeps == 0 {
            return Err(RigidError::invalid_config("max_substeps must be at least 1"));
        }
        self.broadphase.validate()?;
        self.solver.validate()?;
        self.contact.validate()?;
        Ok(())
    }
}

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis.
    Y,
    /// Z axis.
    Z,
}

impl Axis {
    /// Get all three axes.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::X, Self::Y, Self::Z]
    }

    /// Component index into a vector.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// Which broadphase algorithm a world uses.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BroadphaseConfig {
    /// Test every pair.
    #[default]
    Naive,
    /// Sweep-and-prune along one axis; `None` picks the axis of largest
    /// positional variance each step.
    SweepAndPrune {
        /// Fixed sweep axis.
        axis: Option<Axis>,
    },
    /// Uniform bin grid over a fixed region.
    Grid {
        /// Minimum corner of the gridded region.
        min: Vec3,
        /// Maximum corner of the gridded region.
        max: Vec3,
        /// Bins along X.
        nx: usize,
        /// Bins along Y.
        ny: usize,
        /// Bins along Z.
        nz: usize,
    },
}

impl BroadphaseConfig {
    /// A 10x10x10 grid over the cube `[-100, 100]³`.
    #[must_use]
    pub fn default_grid() -> Self {
        Self::Grid {
            min: Vec3::repeat(-100.0),
            max: Vec3::repeat(100.0),
            nx: 10,
            ny: 10,
            nz: 10,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if let Self::Grid {
            min,
            max,
            nx,
            ny,
            nz,
        } = self
        {
            if *nx == 0 || *ny == 0 || *nz == 0 {
                return Err(RigidError::invalid_config(
                    "grid broadphase needs at least one bin along each axis",
                ));
            }
            if !(max.x > min.x && max.y > min.y && max.z > min.z) {
                return Err(RigidError::invalid_config(
                    "grid broadphase region must have positive size",
                ));
            }
        }
        Ok(())
    }
}

/// Configuration for the constraint solver.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverConfig {
    /// Maximum Gauss-Seidel sweeps per step.
    pub iterations: usize,
    /// Stop once the summed absolute impulse change falls below this.
    pub tolerance: f64,
    /// Partition into islands and solve each independently.
    pub split_islands: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            tolerance: 1e-7,
            split_islands: false,
        }
    }
}

impl SolverConfig {
    /// Create a high-accuracy solver configuration.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            iterations: 40,
            tolerance: 1e-10,
            split_islands: false,
        }
    }

    /// Create a fast solver configuration.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            iterations: 5,
            tolerance: 1e-5,
            split_islands: true,
        }
    }

    /// Set the iteration cap.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enable island splitting.
    #[must_use]
    pub fn split(mut self) -> Self {
        self.split_islands = true;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(RigidError::invalid_config(
                "solver iterations must be at least 1",
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(RigidError::invalid_config(
                "solver tolerance must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Parameters of the world's default contact material.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactDefaults {
    /// Default friction coefficient.
    pub friction: f64,
    /// Default restitution.
    pub restitution: f64,
    /// SPOOK stiffness of contact equations.
    pub contact_stiffness: f64,
    /// SPOOK relaxation of contact equations.
    pub contact_relaxation: f64,
    /// SPOOK stiffness of friction equations.
    pub friction_stiffness: f64,
    /// SPOOK relaxation of friction equations.
    pub friction_relaxation: f64,
}

impl Default for ContactDefaults {
    fn default() -> Self {
        Self {
            friction: 0.3,
            restitution: 0.0,
            contact_stiffness: 1e7,
            contact_relaxation: 3.0,
            friction_stiffness: 1e7,
            friction_relaxation: 3.0,
        }
    }
}

impl ContactDefaults {
    /// Validate the parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.friction.is_finite() || self.friction < 0.0 {
            return Err(RigidError::invalid_config(
                "default friction must be finite and non-negative",
            ));
        }
        if !self.restitution.is_finite() || self.restitution < 0.0 {
            return Err(RigidError::invalid_config(
                "default restitution must be finite and non-negative",
            ));
        }
        if self.contact_stiffness <= 0.0
            || self.contact_relaxation <= 0.0
            || self.friction_stiffness <= 0.0
            || self.friction_relaxation <= 0.0
        {
            return Err(RigidError::invalid_config(
                "SPOOK stiffness and relaxation must be positive",
            ));
        }
        Ok(())
    }
}
