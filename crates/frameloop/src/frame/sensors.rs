//! The five trigger volumes around the frame and the per-tick stay/exit
//! stream they produce.

use std::collections::BTreeSet;

use glam::Vec2;

use crate::api::types::{Direction, EntityId};
use crate::core::query::SpatialQuery;
use crate::core::scene::Scene;
use crate::frame::config::FrameConfig;
use crate::frame::region::FrameBounds;

/// Which volume reported an overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    Interior,
    Edge(Direction),
}

impl Sensor {
    /// Poll order. Later sensors win ties, so left/right beat top/bottom.
    pub const ALL: [Sensor; 5] = [
        Sensor::Interior,
        Sensor::Edge(Direction::Up),
        Sensor::Edge(Direction::Down),
        Sensor::Edge(Direction::Right),
        Sensor::Edge(Direction::Left),
    ];

    fn index(self) -> usize {
        match self {
            Sensor::Interior => 0,
            Sensor::Edge(Direction::Up) => 1,
            Sensor::Edge(Direction::Down) => 2,
            Sensor::Edge(Direction::Right) => 3,
            Sensor::Edge(Direction::Left) => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Stay,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorEvent {
    pub sensor: Sensor,
    pub body: EntityId,
    pub kind: ContactKind,
}

/// Boxes of the five sensors for one frame rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorLayout {
    boxes: [(Vec2, Vec2); 5],
}

impl SensorLayout {
    /// Interior: the frame shrunk by `interior_inset`. Top and bottom bands
    /// overhang the corners by half the inset; side bands span the full height
    /// plus one band on each end.
    pub fn new(bounds: &FrameBounds, config: &FrameConfig) -> Self {
        let c = bounds.center();
        let size = bounds.size();
        let band = config.edge_band;
        let inset = config.interior_inset;

        let interior = (c, (size - Vec2::splat(inset)) * 0.5);
        let horizontal_half = Vec2::new((size.x + inset) * 0.5, band * 0.5);
        let vertical_half = Vec2::new(band * 0.5, (size.y + 2.0 * band) * 0.5);

        let up = (Vec2::new(c.x, bounds.max.y + band * 0.5), horizontal_half);
        let down = (Vec2::new(c.x, bounds.min.y - band * 0.5), horizontal_half);
        let right = (Vec2::new(bounds.max.x + band * 0.5, c.y), vertical_half);
        let left = (Vec2::new(bounds.min.x - band * 0.5, c.y), vertical_half);

        Self {
            boxes: [interior, up, down, right, left],
        }
    }

    /// Centre and half extents of a sensor box.
    pub fn sensor_box(&self, sensor: Sensor) -> (Vec2, Vec2) {
        self.boxes[sensor.index()]
    }
}

/// Remembers last tick's overlaps so it can report exits.
#[derive(Debug, Default)]
pub struct SensorRig {
    previous: [BTreeSet<EntityId>; 5],
}

impl SensorRig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlap every trackable body against the sensors. Stays come first in
    /// poll order, then exits in poll order. Bodies that vanished since the
    /// last poll are dropped without an exit.
    pub fn poll<Q: SpatialQuery>(
        &mut self,
        layout: &SensorLayout,
        scene: &Scene,
        query: &Q,
    ) -> Vec<SensorEvent> {
        let candidates: Vec<_> = scene
            .trackable()
            .filter_map(|e| e.body.map(|b| (e.id, b)))
            .collect();

        let mut stays = Vec::new();
        let mut exits = Vec::new();

        for sensor in Sensor::ALL {
            let (center, half) = layout.sensor_box(sensor);
            let current: BTreeSet<EntityId> = candidates
                .iter()
                .filter(|(_, body)| query.overlaps_box(body, center, half))
                .map(|(id, _)| *id)
                .collect();

            let previous = &mut self.previous[sensor.index()];
            for &body in &current {
                stays.push(SensorEvent {
                    sensor,
                    body,
                    kind: ContactKind::Stay,
                });
            }
            for &body in previous.difference(&current) {
                if scene.contains(body) {
                    exits.push(SensorEvent {
                        sensor,
                        body,
                        kind: ContactKind::Exit,
                    });
                }
            }
            *previous = current;
        }

        stays.extend(exits);
        stays
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::game::EngineContext;
    use crate::components::entity::Entity;
    use crate::core::physics::{BodyDesc, ColliderDesc, ColliderMaterial};
    use glam::UVec2;

    fn layout() -> SensorLayout {
        let bounds = FrameBounds::around(Vec2::ZERO, UVec2::new(10, 6));
        SensorLayout::new(&bounds, &FrameConfig::default())
    }

    fn spawn_ball(ctx: &mut EngineContext, pos: Vec2) -> EntityId {
        let id = ctx.next_id();
        ctx.spawn_with_body(
            Entity::new(id),
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.4 }).with_position(pos),
            ColliderMaterial::default(),
        )
    }

    #[test]
    fn layout_matches_frame_edges() {
        let l = layout();
        let (c, h) = l.sensor_box(Sensor::Interior);
        assert_eq!(c, Vec2::ZERO);
        assert!((h - Vec2::new(4.9, 2.9)).length() < 1e-5);

        let (c, h) = l.sensor_box(Sensor::Edge(Direction::Right));
        assert_eq!(c, Vec2::new(5.5, 0.0));
        assert_eq!(h, Vec2::new(0.5, 4.0));

        let (c, h) = l.sensor_box(Sensor::Edge(Direction::Down));
        assert_eq!(c, Vec2::new(0.0, -3.5));
        assert!((h - Vec2::new(5.1, 0.5)).length() < 1e-5);
    }

    #[test]
    fn stays_then_exits() {
        let mut ctx = EngineContext::new();
        let a = spawn_ball(&mut ctx, Vec2::new(4.8, 0.0));
        let mut rig = SensorRig::new();
        let l = layout();

        let events = rig.poll(&l, &ctx.scene, &ctx.physics);
        assert_eq!(
            events,
            vec![
                SensorEvent { sensor: Sensor::Interior, body: a, kind: ContactKind::Stay },
                SensorEvent {
                    sensor: Sensor::Edge(Direction::Right),
                    body: a,
                    kind: ContactKind::Stay
                },
            ]
        );

        ctx.teleport(a, Vec2::new(5.9, 0.0));
        let events = rig.poll(&l, &ctx.scene, &ctx.physics);
        assert_eq!(
            events,
            vec![
                SensorEvent {
                    sensor: Sensor::Edge(Direction::Right),
                    body: a,
                    kind: ContactKind::Stay
                },
                SensorEvent { sensor: Sensor::Interior, body: a, kind: ContactKind::Exit },
            ]
        );
    }

    #[test]
    fn despawned_bodies_do_not_exit() {
        let mut ctx = EngineContext::new();
        let a = spawn_ball(&mut ctx, Vec2::ZERO);
        let mut rig = SensorRig::new();
        let l = layout();

        assert_eq!(rig.poll(&l, &ctx.scene, &ctx.physics).len(), 1);
        ctx.despawn(a);
        assert!(rig.poll(&l, &ctx.scene, &ctx.physics).is_empty());
    }
}
