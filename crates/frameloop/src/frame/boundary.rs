//! Synthesized terrain that makes the frame's edges meet.
//!
//! On activation a (w+2)×(h+2) grid of samples around the frozen bounds is
//! probed against outside terrain and blocks. Solid hits become tiles on the
//! inside and outside surfaces; blocks in the edge band get a mirrored
//! collider one frame size away.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::api::game::EngineContext;
use crate::api::types::EntityId;
use crate::components::entity::{Entity, Synthetic};
use crate::components::layer::{Capability, LayerMask, PhysicsLayer, Zone};
use crate::components::tilemap::{cell_of, TileSurface};
use crate::core::physics::{BodyDesc, ColliderMaterial};
use crate::core::query::SpatialQuery;
use crate::frame::region::FrameBounds;

/// Layers the scan probes.
const SCAN_MASK: LayerMask = LayerMask(
    (1 << PhysicsLayer::OutsideTerrain as u32) | (1 << PhysicsLayer::OutsideBlock as u32),
);

/// Wrap shift for grid sample `(i, j)` of a `w`×`h` frame. Columns win over
/// rows.
pub fn shift(i: i32, j: i32, w: i32, h: i32) -> Option<Vec2> {
    if i <= 1 {
        Some(Vec2::new(w as f32, 0.0))
    } else if i >= w {
        Some(Vec2::new(-w as f32, 0.0))
    } else if j <= 1 {
        Some(Vec2::new(0.0, h as f32))
    } else if j >= h {
        Some(Vec2::new(0.0, -h as f32))
    } else {
        None
    }
}

fn in_edge_band(i: i32, j: i32, w: i32, h: i32) -> bool {
    i <= 1 || i >= w || j <= 1 || j >= h
}

/// Owns the two tile surfaces and the mirrored block colliders.
#[derive(Debug)]
pub struct BoundaryBuilder {
    inside: TileSurface,
    outside: TileSurface,
    /// Source block → its mirror.
    mirrors: BTreeMap<EntityId, EntityId>,
    built: bool,
}

impl Default for BoundaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundaryBuilder {
    pub fn new() -> Self {
        Self {
            inside: TileSurface::new(Zone::Inside),
            outside: TileSurface::new(Zone::Outside),
            mirrors: BTreeMap::new(),
            built: false,
        }
    }

    pub fn inside_surface(&self) -> &TileSurface {
        &self.inside
    }

    pub fn outside_surface(&self) -> &TileSurface {
        &self.outside
    }

    pub fn mirror_of(&self, source: EntityId) -> Option<EntityId> {
        self.mirrors.get(&source).copied()
    }

    pub fn mirror_count(&self) -> usize {
        self.mirrors.len()
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Scan around `bounds` and synthesize tiles and mirrors.
    pub fn build(&mut self, bounds: &FrameBounds, ctx: &mut EngineContext) {
        if self.built {
            log::warn!("frame boundary already built; ignoring duplicate build");
            return;
        }
        self.built = true;

        let size = bounds.size();
        let (w, h) = (size.x.round() as i32, size.y.round() as i32);

        for i in 0..=w + 1 {
            for j in 0..=h + 1 {
                let corner = (i == 0 || i == w + 1) && (j == 0 || j == h + 1);
                if corner {
                    continue;
                }
                let sample = bounds.min + Vec2::new(i as f32 - 0.5, j as f32 - 0.5);
                for hit in ctx.physics.probe_point(sample, SCAN_MASK) {
                    let Some(entity) = ctx.scene.get(hit.entity) else { continue };
                    if entity.is_synthetic() {
                        continue;
                    }
                    if entity.capability == Capability::Block {
                        if in_edge_band(i, j, w, h) {
                            if let Some(offset) = shift(i, j, w, h) {
                                self.mirror(hit.entity, offset, ctx);
                            }
                        }
                        continue;
                    }
                    self.place_tiles(bounds, sample, i, j, w, h, ctx);
                }
            }
        }

        log::debug!(
            "frame boundary built: {} inside tile(s), {} outside tile(s), {} mirror(s)",
            self.inside.len(),
            self.outside.len(),
            self.mirrors.len()
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn place_tiles(
        &mut self,
        bounds: &FrameBounds,
        s: Vec2,
        i: i32,
        j: i32,
        w: i32,
        h: i32,
        ctx: &mut EngineContext,
    ) {
        let physics = &mut ctx.physics;

        if (1..=w).contains(&i) && (1..=h).contains(&j) {
            self.inside.place(cell_of(s), physics);
        }

        if let Some(offset) = shift(i, j, w, h) {
            let wrapped = s + offset;
            if bounds.contains(wrapped) {
                self.outside.place(cell_of(wrapped), physics);
            } else {
                self.inside.place(cell_of(s), physics);
            }
        }

        if (i == 1 || i == w) && (j <= 1 || j >= h) {
            let mut p = s;
            if j <= 1 {
                p.y += h as f32;
            }
            if j >= h {
                p.y -= h as f32;
            }
            if j == 1 || j == h {
                self.inside.place(cell_of(p), physics);
            } else {
                self.outside.place(cell_of(p), physics);
            }
        }
    }

    fn mirror(&mut self, source: EntityId, offset: Vec2, ctx: &mut EngineContext) {
        if self.mirrors.contains_key(&source) {
            return;
        }
        let Some(block) = ctx.scene.get(source) else { return };
        let Some(shape) = block.body.and_then(|b| ctx.physics.collider_shape(&b)) else {
            return;
        };
        let tag = format!("{}:mirror", block.tag);
        let (pos, rotation) = (block.pos, block.rotation);

        let entity = Entity::new(ctx.next_id())
            .with_tag(tag)
            .with_capability(Capability::Block)
            .with_zone(Zone::Inside)
            .with_synthetic(Synthetic::Mirror { source });
        let desc = BodyDesc::kinematic(shape)
            .with_position(pos + offset)
            .with_rotation(rotation);
        let id = ctx.spawn_with_body(entity, desc, ColliderMaterial::default());
        ctx.attach(id, source, offset);
        self.mirrors.insert(source, id);
    }

    /// Remove every tile and mirror.
    pub fn teardown(&mut self, ctx: &mut EngineContext) {
        self.inside.clear(&mut ctx.physics);
        self.outside.clear(&mut ctx.physics);
        for (_, mirror) in std::mem::take(&mut self.mirrors) {
            ctx.despawn(mirror);
        }
        self.built = false;
    }

    /// Forget mirrors whose source block was destroyed.
    pub fn prune(&mut self, ctx: &mut EngineContext) {
        let orphaned: Vec<(EntityId, EntityId)> = self
            .mirrors
            .iter()
            .filter(|(source, _)| !ctx.scene.contains(**source))
            .map(|(&s, &m)| (s, m))
            .collect();
        for (source, mirror) in orphaned {
            self.mirrors.remove(&source);
            ctx.despawn(mirror);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::physics::ColliderDesc;
    use glam::{IVec2, UVec2};

    fn ground(ctx: &mut EngineContext, pos: Vec2, half: Vec2) -> EntityId {
        let id = ctx.next_id();
        ctx.spawn_with_body(
            Entity::new(id)
                .with_tag("ground")
                .with_capability(Capability::Terrain),
            BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width: half.x,
                half_height: half.y,
            })
            .with_position(pos),
            ColliderMaterial::default(),
        )
    }

    #[test]
    fn shift_prefers_columns() {
        assert_eq!(shift(1, 0, 3, 3), Some(Vec2::new(3.0, 0.0)));
        assert_eq!(shift(3, 4, 3, 3), Some(Vec2::new(-3.0, 0.0)));
        assert_eq!(shift(2, 0, 3, 3), Some(Vec2::new(0.0, 3.0)));
        assert_eq!(shift(2, 3, 3, 3), Some(Vec2::new(0.0, -3.0)));
        assert_eq!(shift(3, 3, 6, 6), None);
    }

    #[test]
    fn bottom_left_sample_wraps_vertically() {
        let mut ctx = EngineContext::new();
        ground(&mut ctx, Vec2::new(-0.5, -1.5), Vec2::splat(0.5));
        let bounds = FrameBounds::around(Vec2::ZERO, UVec2::new(3, 3));

        let mut builder = BoundaryBuilder::new();
        builder.build(&bounds, &mut ctx);

        let outside: Vec<IVec2> = builder.outside_surface().cells().collect();
        assert_eq!(outside, vec![IVec2::new(-1, 1)]);
        assert!(builder.inside_surface().contains(IVec2::new(-1, -2)));
        assert_eq!(builder.inside_surface().len(), 1);
    }

    #[test]
    fn floor_under_frame_fills_both_surfaces() {
        let mut ctx = EngineContext::new();
        // Solid floor covering y in [-4, -3], wider than the frame.
        ground(&mut ctx, Vec2::new(0.0, -3.5), Vec2::new(8.0, 0.5));
        let bounds = FrameBounds::around(Vec2::ZERO, UVec2::new(10, 6));

        let mut builder = BoundaryBuilder::new();
        builder.build(&bounds, &mut ctx);

        // Bottom sample row wraps to the top row inside the frame.
        for x in -4..4 {
            assert!(builder.outside_surface().contains(IVec2::new(x, 2)));
        }
        assert!(!builder.inside_surface().is_empty());
        assert_eq!(builder.mirror_count(), 0);
    }

    #[test]
    fn build_twice_is_a_no_op() {
        let mut ctx = EngineContext::new();
        ground(&mut ctx, Vec2::new(-0.5, -1.5), Vec2::splat(0.5));
        let bounds = FrameBounds::around(Vec2::ZERO, UVec2::new(3, 3));

        let mut builder = BoundaryBuilder::new();
        builder.build(&bounds, &mut ctx);
        let bodies = ctx.physics.body_count();
        builder.build(&bounds, &mut ctx);

        assert_eq!(ctx.physics.body_count(), bodies);
        assert_eq!(builder.inside_surface().len(), 1);
        assert_eq!(builder.outside_surface().len(), 1);
    }

    #[test]
    fn blocks_on_the_edge_get_one_mirror() {
        let mut ctx = EngineContext::new();
        let block = ctx.next_id();
        ctx.spawn_with_body(
            Entity::new(block)
                .with_tag("crate")
                .with_capability(Capability::Block),
            BodyDesc::dynamic(ColliderDesc::Cuboid {
                half_width: 0.5,
                half_height: 0.5,
            })
            .with_position(Vec2::new(5.25, 0.5)),
            ColliderMaterial::default(),
        );
        let bounds = FrameBounds::around(Vec2::ZERO, UVec2::new(10, 6));

        let mut builder = BoundaryBuilder::new();
        builder.build(&bounds, &mut ctx);

        assert_eq!(builder.mirror_count(), 1);
        assert!(builder.inside_surface().is_empty());
        assert!(builder.outside_surface().is_empty());
        let mirror = builder.mirror_of(block).unwrap();
        let e = ctx.scene.get(mirror).unwrap();
        assert_eq!(e.pos, Vec2::new(-4.75, 0.5));
        assert_eq!(e.layer(), PhysicsLayer::InsideBlock);
        assert_eq!(ctx.hierarchy.parent(mirror), Some(block));
    }

    #[test]
    fn teardown_is_total_and_prune_forgets_orphans() {
        let mut ctx = EngineContext::new();
        ground(&mut ctx, Vec2::new(0.0, -3.5), Vec2::new(8.0, 0.5));
        let block = ctx.next_id();
        ctx.spawn_with_body(
            Entity::new(block).with_capability(Capability::Block),
            BodyDesc::dynamic(ColliderDesc::Cuboid {
                half_width: 0.5,
                half_height: 0.5,
            })
            .with_position(Vec2::new(-5.25, 0.5)),
            ColliderMaterial::default(),
        );
        let before = ctx.physics.body_count();
        let bounds = FrameBounds::around(Vec2::ZERO, UVec2::new(10, 6));

        let mut builder = BoundaryBuilder::new();
        builder.build(&bounds, &mut ctx);
        assert_eq!(builder.mirror_count(), 1);

        ctx.despawn(block);
        builder.prune(&mut ctx);
        assert_eq!(builder.mirror_count(), 0);

        builder.teardown(&mut ctx);
        assert!(builder.inside_surface().is_empty());
        assert!(builder.outside_surface().is_empty());
        assert!(!builder.is_built());
        assert_eq!(ctx.physics.body_count(), before - 1);
    }
}
