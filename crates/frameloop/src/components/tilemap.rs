//! Sparse tile surfaces synthesized by the looping frame.
//!
//! A surface is a set of unit cells on one zone's surface layer. Each occupied
//! cell owns a fixed unit-cuboid collider centred on `cell + 0.5`, so a cell
//! covers `[x, x+1) × [y, y+1)` in world units.

use std::collections::HashMap;

use glam::{IVec2, Vec2};

use crate::components::layer::{Capability, PhysicsLayer, Zone};
use crate::core::physics::{PhysicsBody, PhysicsWorld};

/// Cell containing a world-space point.
pub fn cell_of(point: Vec2) -> IVec2 {
    point.floor().as_ivec2()
}

/// A set of synthesized tiles on one zone's surface layer.
#[derive(Debug)]
pub struct TileSurface {
    zone: Zone,
    tiles: HashMap<IVec2, PhysicsBody>,
}

impl TileSurface {
    pub fn new(zone: Zone) -> Self {
        Self {
            zone,
            tiles: HashMap::new(),
        }
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Physics layer every tile of this surface lives on.
    pub fn layer(&self) -> PhysicsLayer {
        PhysicsLayer::of(Capability::Surface, self.zone)
    }

    /// Place a tile at `cell`. Returns `false` if the cell was already occupied.
    pub fn place(&mut self, cell: IVec2, physics: &mut PhysicsWorld) -> bool {
        if self.tiles.contains_key(&cell) {
            return false;
        }
        let body = physics.create_tile(cell, self.layer());
        self.tiles.insert(cell, body);
        true
    }

    pub fn contains(&self, cell: IVec2) -> bool {
        self.tiles.contains_key(&cell)
    }

    /// Occupied cells, in no particular order.
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.tiles.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Remove every tile and its collider.
    pub fn clear(&mut self, physics: &mut PhysicsWorld) {
        for (_, body) in self.tiles.drain() {
            physics.remove_body(&body);
        }
    }
}
