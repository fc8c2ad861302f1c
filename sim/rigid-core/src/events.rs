//! World events.
//!
//! The world queues events while stepping; drain them with
//! [`World::drain_events`](crate::World::drain_events).

use rigid_types::{BodyId, EquationId, ShapeId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Something that happened in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WorldEvent {
    /// A body was added.
    BodyAdded(BodyId),
    /// A body was removed.
    BodyRemoved(BodyId),
    /// Contacts are solved and damping applied; integration comes next.
    PreStep,
    /// Integration finished and time advanced.
    PostStep,
    /// First contact between two bodies after a step without one. Emitted
    /// once per pair and step, with the contact row that triggered it.
    Collide {
        /// First body of the contact.
        body_a: BodyId,
        /// Second body of the contact.
        body_b: BodyId,
        /// Shape of the first body.
        shape_a: Option<ShapeId>,
        /// Shape of the second body.
        shape_b: Option<ShapeId>,
        /// The contact row.
        contact: EquationId,
    },
    /// Two bodies started overlapping.
    BeginContact {
        /// One body.
        body_a: BodyId,
        /// The other body.
        body_b: BodyId,
    },
    /// Two bodies stopped overlapping.
    EndContact {
        /// One body.
        body_a: BodyId,
        /// The other body.
        body_b: BodyId,
    },
    /// Two shapes started overlapping.
    BeginShapeContact {
        /// One shape.
        shape_a: ShapeId,
        /// The other shape.
        shape_b: ShapeId,
        /// Owner of `shape_a`.
        body_a: BodyId,
        /// Owner of `shape_b`.
        body_b: BodyId,
    },
    /// Two shapes stopped overlapping.
    EndShapeContact {
        /// One shape.
        shape_a: ShapeId,
        /// The other shape.
        shape_b: ShapeId,
        /// Owner of `shape_a`.
        body_a: BodyId,
        /// Owner of `shape_b`.
        body_b: BodyId,
    },
    /// A body became sleepy.
    Sleepy(BodyId),
    /// A body fell asleep.
    Sleep(BodyId),
    /// A sleeping body woke up.
    WakeUp(BodyId),
}

impl WorldEvent {
    /// Bodies the event is about.
    #[must_use]
    pub fn bodies(&self) -> (Option<BodyId>, Option<BodyId>) {
        match *self {
            Self::BodyAdded(b)
            | Self::BodyRemoved(b)
            | Self::Sleepy(b)
            | Self::Sleep(b)
            | Self::WakeUp(b) => (Some(b), None),
            Self::PreStep | Self::PostStep => (None, None),
            Self::Collide { body_a, body_b, .. }
            | Self::BeginContact { body_a, body_b }
            | Self::EndContact { body_a, body_b }
            | Self::BeginShapeContact { body_a, body_b, .. }
            | Self::EndShapeContact { body_a, body_b, .. } => (Some(body_a), Some(body_b)),
        }
    }

    /// Whether the event involves `body`.
    #[must_use]
    pub fn involves(&self, body: BodyId) -> bool {
        let (a, b) = self.bodies();
        a == Some(body) || b == Some(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_involves() {
        let a = BodyId::new(1);
        let b = BodyId::new(2);
        let event = WorldEvent::BeginContact { body_a: a, body_b: b };
        assert!(event.involves(a));
        assert!(event.involves(b));
        assert!(!WorldEvent::PreStep.involves(a));
        assert!(!WorldEvent::WakeUp(a).involves(b));
    }
}
