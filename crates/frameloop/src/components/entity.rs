use glam::Vec2;
use crate::api::types::EntityId;
use crate::components::layer::{Capability, PhysicsLayer, Zone};
use crate::components::sprite::SpriteComponent;
use crate::core::physics::PhysicsBody;

/// Marks an entity the frame created for itself. Synthetic entities are
/// invisible to sensors and terrain probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synthetic {
    /// Ghost proxy duplicating a crossing body.
    Ghost { owner: EntityId },
    /// Collider mirroring a block across the wrap.
    Mirror { source: EntityId },
}

/// Fat entity: a single struct with optional components.
/// Designed for simplicity and rapid prototyping over ECS purity.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// Human-readable name.
    pub tag: String,
    /// Whether this entity is active (inactive entities are skipped).
    pub active: bool,
    /// What the entity's collider is for.
    pub capability: Capability,
    /// Which side of the frame boundary the entity lives on.
    pub zone: Zone,
    /// Position in world space.
    pub pos: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    /// Scale (world-space size).
    pub scale: Vec2,
    /// Sprite component (optional; entities without sprites are invisible).
    pub sprite: Option<SpriteComponent>,
    /// Physics body (optional).
    pub body: Option<PhysicsBody>,
    /// Set on entities synthesized by the frame.
    pub synthetic: Option<Synthetic>,
}

impl Entity {
    /// Create a new entity with the given ID at the origin.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            tag: String::new(),
            active: true,
            capability: Capability::Prop,
            zone: Zone::Outside,
            pos: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            sprite: None,
            body: None,
            synthetic: None,
        }
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = capability;
        self
    }

    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_sprite(mut self, sprite: SpriteComponent) -> Self {
        self.sprite = Some(sprite);
        self
    }

    pub fn with_body(mut self, body: PhysicsBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_synthetic(mut self, synthetic: Synthetic) -> Self {
        self.synthetic = Some(synthetic);
        self
    }

    /// Physics layer implied by capability and zone.
    pub fn layer(&self) -> PhysicsLayer {
        PhysicsLayer::of(self.capability, self.zone)
    }

    /// Whether the frame created this entity.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic.is_some()
    }

    /// Whether this entity can be tracked across the frame boundary.
    pub fn is_trackable(&self) -> bool {
        self.active
            && self.synthetic.is_none()
            && self.body.is_some()
            && matches!(
                self.capability,
                Capability::Actor | Capability::Prop | Capability::Block
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_follows_zone() {
        let e = Entity::new(EntityId(1)).with_capability(Capability::Block);
        assert_eq!(e.layer(), PhysicsLayer::OutsideBlock);
        let e = e.with_zone(Zone::Inside);
        assert_eq!(e.layer(), PhysicsLayer::InsideBlock);
    }

    #[test]
    fn synthetic_entities_are_not_trackable() {
        let ghost = Entity::new(EntityId(2)).with_synthetic(Synthetic::Ghost { owner: EntityId(1) });
        assert!(ghost.is_synthetic());
        assert!(!ghost.is_trackable());
    }
}
