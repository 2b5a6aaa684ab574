use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::layer::LayerMask;
use crate::core::physics::PhysicsBody;

/// One entity found by a point probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeHit {
    pub entity: EntityId,
}

/// Geometric queries the frame needs from whatever owns the colliders.
///
/// Both queries see positions set by teleports made since the last step.
pub trait SpatialQuery {
    /// Every entity whose collider contains `point` and whose layer is in `mask`.
    /// Colliders with no scene entity (synthesized tiles) are never reported.
    fn probe_point(&self, point: Vec2, mask: LayerMask) -> Vec<ProbeHit>;

    /// Whether `body`'s collider overlaps the axis-aligned box.
    fn overlaps_box(&self, body: &PhysicsBody, center: Vec2, half_extents: Vec2) -> bool;
}
