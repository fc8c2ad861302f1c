//! Surface materials and the pairwise contact parameters between them.
//!
//! A [`Material`] is a named tag that can be attached to a body or a shape.
//! The simulator looks up a [`ContactMaterial`] for every colliding pair of
//! materials to decide friction, restitution and how stiff the resulting
//! contact and friction equations are.
//!
//! # Resolution order
//!
//! ```text
//! shape-pair contact material  ->  body-pair contact material  ->  world default
//! ```
//!
//! If both sides carry a material that defines its own friction (or
//! restitution), the product of the two overrides the contact material's
//! value for that quantity.

use hashbrown::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{MaterialId, Result, RigidError};

/// A named surface material.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material {
    /// Unique id used to key contact materials.
    pub id: MaterialId,
    /// Human readable name.
    pub name: String,
    /// Per-material friction coefficient, if any.
    pub friction: Option<f64>,
    /// Per-material restitution, if any.
    pub restitution: Option<f64>,
}

impl Material {
    /// Create a material with a fresh id and no per-material coefficients.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: MaterialId::next(),
            name: name.into(),
            friction: None,
            restitution: None,
        }
    }

    /// Set the per-material friction coefficient.
    #[must_use]
    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = Some(friction);
        self
    }

    /// Set the per-material restitution.
    #[must_use]
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = Some(restitution);
        self
    }
}

/// Contact parameters for a pair of materials.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactMaterial {
    /// The two materials this entry applies to, in either order.
    pub materials: (MaterialId, MaterialId),
    /// Coulomb friction coefficient.
    pub friction: f64,
    /// Coefficient of restitution.
    pub restitution: f64,
    /// SPOOK stiffness for contact equations.
    pub contact_equation_stiffness: f64,
    /// SPOOK relaxation (in timesteps) for contact equations.
    pub contact_equation_relaxation: f64,
    /// SPOOK stiffness for friction equations.
    pub friction_equation_stiffness: f64,
    /// SPOOK relaxation (in timesteps) for friction equations.
    pub friction_equation_relaxation: f64,
}

impl ContactMaterial {
    /// Create a contact material with the standard defaults
    /// (friction 0.3, restitution 0.3, stiffness 1e7, relaxation 3).
    #[must_use]
    pub fn new(a: MaterialId, b: MaterialId) -> Self {
        Self {
            materials: (a, b),
            friction: 0.3,
            restitution: 0.3,
            contact_equation_stiffness: 1e7,
            contact_equation_relaxation: 3.0,
            friction_equation_stiffness: 1e7,
            friction_equation_relaxation: 3.0,
        }
    }

    /// The fallback used when no pair-specific entry exists:
    /// friction 0.3, no restitution.
    #[must_use]
    pub fn world_default(default_material: MaterialId) -> Self {
        Self::new(default_material, default_material).with_restitution(0.0)
    }

    /// Set the friction coefficient.
    #[must_use]
    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    /// Set the restitution.
    #[must_use]
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set stiffness and relaxation for contact equations.
    #[must_use]
    pub fn with_contact_spook(mut self, stiffness: f64, relaxation: f64) -> Self {
        self.contact_equation_stiffness = stiffness;
        self.contact_equation_relaxation = relaxation;
        self
    }

    /// Set stiffness and relaxation for friction equations.
    #[must_use]
    pub fn with_friction_spook(mut self, stiffness: f64, relaxation: f64) -> Self {
        self.friction_equation_stiffness = stiffness;
        self.friction_equation_relaxation = relaxation;
        self
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.friction.is_finite() || self.friction < 0.0 {
            return Err(RigidError::invalid_config(
                "contact material friction must be finite and non-negative",
            ));
        }
        if !self.restitution.is_finite() || self.restitution < 0.0 {
            return Err(RigidError::invalid_config(
                "contact material restitution must be finite and non-negative",
            ));
        }
        for (name, value) in [
            ("contact stiffness", self.contact_equation_stiffness),
            ("contact relaxation", self.contact_equation_relaxation),
            ("friction stiffness", self.friction_equation_stiffness),
            ("friction relaxation", self.friction_equation_relaxation),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(RigidError::invalid_config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Friction after applying per-material overrides.
    #[must_use]
    pub fn effective_friction(&self, a: Option<&Material>, b: Option<&Material>) -> f64 {
        match (a.and_then(|m| m.friction), b.and_then(|m| m.friction)) {
            (Some(fa), Some(fb)) if fa >= 0.0 && fb >= 0.0 => fa * fb,
            _ => self.friction,
        }
    }

    /// Restitution after applying per-material overrides.
    #[must_use]
    pub fn effective_restitution(&self, a: Option<&Material>, b: Option<&Material>) -> f64 {
        match (a.and_then(|m| m.restitution), b.and_then(|m| m.restitution)) {
            (Some(ra), Some(rb)) if ra >= 0.0 && rb >= 0.0 => ra * rb,
            _ => self.restitution,
        }
    }
}

/// Lookup table from an unordered material pair to its contact material.
#[derive(Debug, Clone, Default)]
pub struct ContactMaterialTable {
    entries: HashMap<(MaterialId, MaterialId), ContactMaterial>,
}

impl ContactMaterialTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: MaterialId, b: MaterialId) -> (MaterialId, MaterialId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Insert or replace the entry for the contact material's pair.
    ///
    /// Returns the entry that was replaced, if any.
    pub fn insert(&mut self, contact_material: ContactMaterial) -> Option<ContactMaterial> {
        let (a, b) = contact_material.materials;
        self.entries.insert(Self::key(a, b), contact_material)
    }

    /// Remove the entry for a pair.
    pub fn remove(&mut self, a: MaterialId, b: MaterialId) -> Option<ContactMaterial> {
        self.entries.remove(&Self::key(a, b))
    }

    /// Look up the entry for a pair, in either order.
    #[must_use]
    pub fn get(&self, a: MaterialId, b: MaterialId) -> Option<&ContactMaterial> {
        self.entries.get(&Self::key(a, b))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
