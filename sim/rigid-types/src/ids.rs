//! Process-unique identifiers for bodies, shapes, constraints and materials.
//!
//! Every id type draws from its own monotonic counter, so an id is never
//! reused for the lifetime of the process. Ids are stable across world
//! storage changes (body removal, slot compaction), which is what the
//! collision matrix and overlap bookkeeping key on.

use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $counter:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(pub u64);

        static $counter: AtomicU64 = AtomicU64::new(0);

        impl $name {
            /// Wrap a raw id value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Allocate the next id from the process-wide counter.
            #[must_use]
            pub fn next() -> Self {
                Self($counter.fetch_add(1, Ordering::Relaxed))
            }

            /// Get the raw id value.
            #[must_use]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a rigid body.
    BodyId,
    NEXT_BODY_ID,
    "Body"
);

define_id!(
    /// Unique identifier for a collision shape.
    ShapeId,
    NEXT_SHAPE_ID,
    "Shape"
);

define_id!(
    /// Unique identifier for a user constraint (joint).
    ConstraintId,
    NEXT_CONSTRAINT_ID,
    "Constraint"
);

define_id!(
    /// Unique identifier for a surface material.
    MaterialId,
    NEXT_MATERIAL_ID,
    "Material"
);

define_id!(
    /// Unique identifier for a solver equation.
    EquationId,
    NEXT_EQUATION_ID,
    "Equation"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let a = BodyId::next();
        let b = BodyId::next();
        assert!(b > a);

        let s1 = ShapeId::next();
        let s2 = ShapeId::next();
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(BodyId::new(3).to_string(), "Body(3)");
        assert_eq!(ShapeId::new(4).to_string(), "Shape(4)");
        assert_eq!(MaterialId::from(5).raw(), 5);
    }
}
