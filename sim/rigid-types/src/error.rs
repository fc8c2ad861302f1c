//! Error types for simulator operations.

use thiserror::Error;

use crate::BodyId;

/// Errors that can occur while building or stepping a simulation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RigidError {
    /// Invalid world, solver or broadphase configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// Invalid shape constructor arguments.
    #[error("invalid shape: {reason}")]
    InvalidShape {
        /// Description of what's wrong with the shape.
        reason: String,
    },

    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// A 3x3 solve or inverse hit a singular matrix.
    #[error("singular matrix in {context}")]
    SingularMatrix {
        /// Which operation attempted the solve.
        context: String,
    },

    /// Invalid constraint construction.
    #[error("invalid constraint: {reason}")]
    InvalidConstraint {
        /// Description of the problem.
        reason: String,
    },

    /// Body id not registered with the world.
    #[error("unknown body: {0}")]
    UnknownBody(BodyId),

    /// Simulation state went non-finite.
    #[error("simulation diverged: {reason}")]
    Diverged {
        /// Description of what went wrong.
        reason: String,
    },
}

impl RigidError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an invalid shape error.
    #[must_use]
    pub fn invalid_shape(reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            reason: reason.into(),
        }
    }

    /// Create a singular matrix error.
    #[must_use]
    pub fn singular(context: impl Into<String>) -> Self {
        Self::SingularMatrix {
            context: context.into(),
        }
    }

    /// Create an invalid constraint error.
    #[must_use]
    pub fn invalid_constraint(reason: impl Into<String>) -> Self {
        Self::InvalidConstraint {
            reason: reason.into(),
        }
    }

    /// Create a diverged error.
    #[must_use]
    pub fn diverged(reason: impl Into<String>) -> Self {
        Self::Diverged {
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. } | Self::InvalidTimestep(_))
    }

    /// Check if this is a shape construction error.
    #[must_use]
    pub fn is_shape_error(&self) -> bool {
        matches!(self, Self::InvalidShape { .. })
    }

    /// Check if this is a numerical degeneracy error.
    #[must_use]
    pub fn is_singular(&self) -> bool {
        matches!(self, Self::SingularMatrix { .. })
    }

    /// Check if this is a divergence error.
    #[must_use]
    pub fn is_diverged(&self) -> bool {
        matches!(self, Self::Diverged { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RigidError::InvalidTimestep(-0.5);
        assert!(err.to_string().contains("-0.5"));

        let err = RigidError::UnknownBody(BodyId::new(7));
        assert_eq!(err.to_string(), "unknown body: Body(7)");

        let err = RigidError::invalid_shape("sphere radius cannot be negative");
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_error_predicates() {
        assert!(RigidError::invalid_config("grid").is_config_error());
        assert!(RigidError::InvalidTimestep(0.0).is_config_error());
        assert!(RigidError::invalid_shape("x").is_shape_error());
        assert!(RigidError::singular("inverse").is_singular());
        assert!(RigidError::diverged("nan").is_diverged());
        assert!(!RigidError::diverged("nan").is_config_error());
    }
}
