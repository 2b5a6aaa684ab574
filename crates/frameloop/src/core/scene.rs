use std::collections::BTreeMap;

use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::entity::Entity;

/// Entity storage keyed by id. Iteration runs in id order so sensor polls and
/// boundary scans see bodies in the same order every tick.
#[derive(Debug, Default)]
pub struct Scene {
    entities: BTreeMap<EntityId, Entity>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, replacing any previous entity with the same id.
    pub fn spawn(&mut self, entity: Entity) {
        if let Some(old) = self.entities.insert(entity.id, entity) {
            log::warn!("entity {} respawned over a live entity", old.id);
        }
    }

    /// Remove an entity by ID. Returns the removed entity if found.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Whether an entity with this ID is alive.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// World position of a live entity.
    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.get(id).map(|e| e.pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// Entities the frame may track across its boundary.
    pub fn trackable(&self) -> impl Iterator<Item = &Entity> {
        self.iter().filter(|e| e.is_trackable())
    }

    /// Find the first entity with the given tag.
    pub fn find_by_tag(&self, tag: &str) -> Option<&Entity> {
        self.iter().find(|e| e.tag == tag)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
