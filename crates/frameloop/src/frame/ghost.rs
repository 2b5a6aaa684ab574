use std::collections::BTreeMap;

use glam::Vec2;

use crate::api::game::EngineContext;
use crate::api::types::EntityId;
use crate::components::entity::{Entity, Synthetic};
use crate::core::physics::{BodyDesc, ColliderMaterial};
use crate::frame::membership::{GhostLayout, MembershipTable};

#[derive(Debug)]
struct GhostSet {
    layout: GhostLayout,
    ghosts: Vec<EntityId>,
}

/// Duplicates of bodies straddling the wrap, kept attached to their source.
#[derive(Debug, Default)]
pub struct GhostProxies {
    sets: BTreeMap<EntityId, GhostSet>,
}

impl GhostProxies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring ghost sets in line with the membership table: drop sets whose
    /// owner is gone or no longer needs that layout, then create missing ones.
    pub fn sync(&mut self, table: &MembershipTable, size: Vec2, ctx: &mut EngineContext) {
        let stale: Vec<EntityId> = self
            .sets
            .iter()
            .filter(|(owner, set)| {
                !ctx.scene.contains(**owner)
                    || table.get(**owner).and_then(|m| m.ghost_layout()) != Some(set.layout)
            })
            .map(|(owner, _)| *owner)
            .collect();
        for owner in stale {
            self.release(owner, ctx);
        }

        for (owner, set) in &self.sets {
            follow_source(*owner, &set.ghosts, ctx);
        }

        for (owner, membership) in table.iter() {
            let Some(layout) = membership.ghost_layout() else { continue };
            if self.sets.contains_key(&owner) {
                continue;
            }
            if let Some(ghosts) = spawn_set(owner, layout, size, ctx) {
                self.sets.insert(owner, GhostSet { layout, ghosts });
            }
        }
    }

    /// Destroy every ghost.
    pub fn clear(&mut self, ctx: &mut EngineContext) {
        let owners: Vec<EntityId> = self.sets.keys().copied().collect();
        for owner in owners {
            self.release(owner, ctx);
        }
    }

    /// Ghosts currently owned by `owner`.
    pub fn ghosts_of(&self, owner: EntityId) -> &[EntityId] {
        self.sets
            .get(&owner)
            .map(|s| s.ghosts.as_slice())
            .unwrap_or(&[])
    }

    pub fn layout_of(&self, owner: EntityId) -> Option<GhostLayout> {
        self.sets.get(&owner).map(|s| s.layout)
    }

    /// Total number of ghosts.
    pub fn len(&self) -> usize {
        self.sets.values().map(|s| s.ghosts.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    fn release(&mut self, owner: EntityId, ctx: &mut EngineContext) {
        if let Some(set) = self.sets.remove(&owner) {
            for ghost in set.ghosts {
                ctx.despawn(ghost);
            }
        }
    }
}

/// Keep ghosts on their source's layer and mask after the source was moved
/// between zones.
fn follow_source(owner: EntityId, ghosts: &[EntityId], ctx: &mut EngineContext) {
    let Some(source) = ctx.scene.get(owner) else { return };
    let zone = source.zone;
    let mask = source.sprite.as_ref().map(|s| s.mask);
    for &ghost in ghosts {
        if ctx.scene.get(ghost).is_some_and(|g| g.zone != zone) {
            ctx.set_zone(ghost, zone);
        }
        if let Some(mask) = mask {
            ctx.set_mask(ghost, mask);
        }
    }
}

fn spawn_set(
    owner: EntityId,
    layout: GhostLayout,
    size: Vec2,
    ctx: &mut EngineContext,
) -> Option<Vec<EntityId>> {
    let source = ctx.scene.get(owner)?;
    let body = source.body?;
    let shape = ctx.physics.collider_shape(&body)?;
    let template = Entity::new(owner)
        .with_tag(format!("{}:ghost", source.tag))
        .with_capability(source.capability)
        .with_zone(source.zone)
        .with_rotation(source.rotation)
        .with_scale(source.scale)
        .with_synthetic(Synthetic::Ghost { owner });
    let template = match &source.sprite {
        Some(sprite) => template.with_sprite(sprite.clone()),
        None => template,
    };
    let origin = source.pos;

    let offsets = layout.offsets(size);
    let mut ghosts = Vec::with_capacity(offsets.len());
    for offset in offsets {
        let id = ctx.next_id();
        let mut entity = template.clone();
        entity.id = id;
        let desc = BodyDesc::kinematic(shape)
            .with_position(origin + offset)
            .with_rotation(template.rotation);
        ctx.spawn_with_body(entity, desc, ColliderMaterial::default());
        ctx.attach(id, owner, offset);
        ghosts.push(id);
    }
    log::debug!("{owner} got {} ghost(s) ({layout:?})", ghosts.len());
    Some(ghosts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Direction;
    use crate::components::layer::{PhysicsLayer, Zone};
    use crate::core::physics::ColliderDesc;

    const SIZE: Vec2 = Vec2::new(10.0, 6.0);

    fn setup() -> (EngineContext, EntityId, EntityId) {
        let mut ctx = EngineContext::new();
        let actor = ctx.next_id();
        let body = ctx.next_id();
        ctx.spawn_with_body(
            Entity::new(body).with_tag("crate"),
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.4 })
                .with_position(Vec2::new(4.6, 0.0)),
            ColliderMaterial::default(),
        );
        (ctx, actor, body)
    }

    #[test]
    fn ring_for_entering_outside() {
        let (mut ctx, actor, body) = setup();
        let mut table = MembershipTable::new(actor, SIZE);
        table.on_interior_stay(body, false);
        table.on_edge_stay(body, Direction::Right, true);

        let mut ghosts = GhostProxies::new();
        ghosts.sync(&table, SIZE, &mut ctx);

        assert_eq!(ghosts.len(), 8);
        assert_eq!(ghosts.layout_of(body), Some(GhostLayout::Ring));
        assert_eq!(ctx.scene.len(), 9);
        let positions: Vec<Vec2> = ghosts
            .ghosts_of(body)
            .iter()
            .map(|g| ctx.scene.get(*g).unwrap().pos)
            .collect();
        assert!(positions.contains(&Vec2::new(4.6 - 10.0, 0.0)));
        assert!(ghosts
            .ghosts_of(body)
            .iter()
            .all(|g| ctx.scene.get(*g).unwrap().is_synthetic()));

        // Sync is idempotent while the layout holds.
        ghosts.sync(&table, SIZE, &mut ctx);
        assert_eq!(ctx.scene.len(), 9);
    }

    #[test]
    fn ghosts_follow_source_zone() {
        let (mut ctx, actor, body) = setup();
        let mut table = MembershipTable::new(actor, SIZE);
        table.on_interior_stay(body, false);
        table.on_edge_stay(body, Direction::Right, true);

        let mut ghosts = GhostProxies::new();
        ghosts.sync(&table, SIZE, &mut ctx);
        assert!(ghosts
            .ghosts_of(body)
            .iter()
            .all(|g| ctx.scene.get(*g).unwrap().zone == Zone::Outside));

        // Source raised after its ghosts were made.
        ctx.set_zone(body, Zone::Inside);
        ghosts.sync(&table, SIZE, &mut ctx);

        for g in ghosts.ghosts_of(body) {
            let ghost = ctx.scene.get(*g).unwrap();
            assert_eq!(ghost.zone, Zone::Inside);
            let bits = ctx.physics.layer_bits(&ghost.body.unwrap());
            assert_eq!(bits, PhysicsLayer::InsideProp.bit());
        }
    }

    #[test]
    fn single_for_entering_inside() {
        let (mut ctx, actor, body) = setup();
        let mut table = MembershipTable::new(actor, SIZE);
        table.on_edge_stay(body, Direction::Up, true);
        table.on_interior_stay(body, true);

        let mut ghosts = GhostProxies::new();
        ghosts.sync(&table, SIZE, &mut ctx);

        assert_eq!(ghosts.len(), 1);
        let ghost = ghosts.ghosts_of(body)[0];
        assert_eq!(ctx.scene.get(ghost).unwrap().pos, Vec2::new(4.6, -6.0));
    }

    #[test]
    fn reconcile_drops_finished_sets() {
        let (mut ctx, actor, body) = setup();
        let mut table = MembershipTable::new(actor, SIZE);
        table.on_interior_stay(body, false);
        table.on_edge_stay(body, Direction::Right, true);

        let mut ghosts = GhostProxies::new();
        ghosts.sync(&table, SIZE, &mut ctx);
        table.on_interior_exit(body, true);
        ghosts.sync(&table, SIZE, &mut ctx);

        assert!(ghosts.is_empty());
        assert_eq!(ctx.scene.len(), 1);
        assert_eq!(ctx.physics.body_count(), 1);
    }

    #[test]
    fn owner_despawn_takes_ghosts_along() {
        let (mut ctx, actor, body) = setup();
        let mut table = MembershipTable::new(actor, SIZE);
        table.on_interior_stay(body, false);
        table.on_edge_stay(body, Direction::Right, true);

        let mut ghosts = GhostProxies::new();
        ghosts.sync(&table, SIZE, &mut ctx);
        ctx.despawn(body);
        table.prune_stale(|id| ctx.scene.contains(id));
        ghosts.sync(&table, SIZE, &mut ctx);

        assert!(ghosts.is_empty());
        assert!(ctx.scene.is_empty());
        assert_eq!(ctx.physics.body_count(), 0);
    }

    #[test]
    fn clear_destroys_everything() {
        let (mut ctx, actor, body) = setup();
        let mut table = MembershipTable::new(actor, SIZE);
        table.on_interior_stay(body, false);
        table.on_edge_stay(body, Direction::Right, true);

        let mut ghosts = GhostProxies::new();
        ghosts.sync(&table, SIZE, &mut ctx);
        ghosts.clear(&mut ctx);

        assert!(ghosts.is_empty());
        assert_eq!(ctx.scene.len(), 1);
    }
}
