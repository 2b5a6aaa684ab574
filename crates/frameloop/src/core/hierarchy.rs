// core/hierarchy.rs
//
// Parent/child attachment by EntityId. A child sits at a fixed world-space
// offset from its parent and copies its rotation; propagation writes both the
// entity transform and the physics body, so attached colliders follow their
// source exactly.
//
// Usage:
//   ctx.hierarchy.attach(ghost_id, body_id, Vec2::new(-10.0, 0.0));
//   ctx.step_physics();  // propagates after syncing body positions

use std::collections::HashMap;
use glam::Vec2;
use crate::api::types::EntityId;
use crate::core::physics::PhysicsWorld;
use crate::core::scene::Scene;

#[derive(Debug, Clone, Default)]
struct Node {
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    offset: Vec2,
}

/// Attachment graph between scene entities.
#[derive(Debug, Default)]
pub struct Hierarchy {
    nodes: HashMap<EntityId, Node>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `child` to `parent` at `offset`. Re-attaching moves the child.
    pub fn attach(&mut self, child: EntityId, parent: EntityId, offset: Vec2) {
        self.detach(child);

        let node = self.nodes.entry(child).or_default();
        node.parent = Some(parent);
        node.offset = offset;

        let parent_node = self.nodes.entry(parent).or_default();
        if !parent_node.children.contains(&child) {
            parent_node.children.push(child);
        }
    }

    /// Detach `child` from its parent. Its own children stay attached to it.
    pub fn detach(&mut self, child: EntityId) {
        let Some(old_parent) = self.nodes.get(&child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(&old_parent) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
        self.collect_empty(child);
        self.collect_empty(old_parent);
    }

    /// Forget `id` entirely. Its children become roots.
    pub fn remove(&mut self, id: EntityId) {
        self.detach(id);
        if let Some(node) = self.nodes.remove(&id) {
            for child in node.children {
                if let Some(child_node) = self.nodes.get_mut(&child) {
                    child_node.parent = None;
                }
                self.collect_empty(child);
            }
        }
    }

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn offset(&self, id: EntityId) -> Option<Vec2> {
        self.nodes.get(&id).filter(|n| n.parent.is_some()).map(|n| n.offset)
    }

    pub fn children(&self, id: EntityId) -> &[EntityId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// All entities below `id`, depth first.
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack: Vec<EntityId> = self.children(id).to_vec();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend_from_slice(self.children(next));
        }
        out
    }

    /// Move every attached entity to its parent's position plus offset.
    pub fn propagate(&self, scene: &mut Scene, physics: &mut PhysicsWorld) {
        let roots: Vec<EntityId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent.is_none() && !n.children.is_empty())
            .map(|(&id, _)| id)
            .collect();
        for root in roots {
            self.propagate_from(root, scene, physics);
        }
    }

    /// Propagate below a single entity, e.g. right after it was teleported.
    pub fn propagate_from(&self, id: EntityId, scene: &mut Scene, physics: &mut PhysicsWorld) {
        let Some((pos, rot)) = scene.get(id).map(|e| (e.pos, e.rotation)) else {
            return;
        };
        for &child in self.children(id) {
            let offset = self.nodes.get(&child).map(|n| n.offset).unwrap_or(Vec2::ZERO);
            let world_pos = pos + offset;
            if let Some(entity) = scene.get_mut(child) {
                entity.pos = world_pos;
                entity.rotation = rot;
                if let Some(body) = &entity.body {
                    physics.teleport(body, world_pos);
                    physics.set_rotation(body, rot);
                }
            }
            self.propagate_from(child, scene, physics);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn collect_empty(&mut self, id: EntityId) {
        if self
            .nodes
            .get(&id)
            .is_some_and(|n| n.parent.is_none() && n.children.is_empty())
        {
            self.nodes.remove(&id);
        }
    }
}
