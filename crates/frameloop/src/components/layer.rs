/// Which side of the frame boundary a body currently lives on.
///
/// Outside is the regular world. Inside bodies only collide with other inside
/// geometry (synthesized surfaces, mirrored blocks) while the frame is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Zone {
    #[default]
    Outside = 0,
    Inside = 1,
}

/// What a collider is for. Combined with a [`Zone`] it selects a [`PhysicsLayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Capability {
    /// The externally-controlled actor.
    Actor = 0,
    /// Any other dynamic body that can loop.
    #[default]
    Prop = 1,
    /// Movable block; mirrored across the wrap when it straddles an edge.
    Block = 2,
    /// Static level terrain.
    Terrain = 3,
    /// Synthesized wrap tiles.
    Surface = 4,
    /// Level triggers (fans, buttons, goal).
    Trigger = 5,
}

/// Concrete physics layer. One bit per layer in collision groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PhysicsLayer {
    OutsideActor = 0,
    InsideActor = 1,
    OutsideProp = 2,
    InsideProp = 3,
    OutsideBlock = 4,
    InsideBlock = 5,
    OutsideTerrain = 6,
    InsideTerrain = 7,
    OutsideSurface = 8,
    InsideSurface = 9,
    OutsideTrigger = 10,
    InsideTrigger = 11,
}

/// Capability × Zone lookup, indexed `[capability][zone]`.
const LAYER_TABLE: [[PhysicsLayer; 2]; 6] = [
    [PhysicsLayer::OutsideActor, PhysicsLayer::InsideActor],
    [PhysicsLayer::OutsideProp, PhysicsLayer::InsideProp],
    [PhysicsLayer::OutsideBlock, PhysicsLayer::InsideBlock],
    [PhysicsLayer::OutsideTerrain, PhysicsLayer::InsideTerrain],
    [PhysicsLayer::OutsideSurface, PhysicsLayer::InsideSurface],
    [PhysicsLayer::OutsideTrigger, PhysicsLayer::InsideTrigger],
];

impl PhysicsLayer {
    /// Total number of physics layers.
    pub const COUNT: usize = 12;

    /// Resolve the layer for a capability in a zone.
    pub const fn of(capability: Capability, zone: Zone) -> Self {
        LAYER_TABLE[capability as usize][zone as usize]
    }

    /// The zone half of this layer.
    pub fn zone(self) -> Zone {
        if self as u8 % 2 == 0 {
            Zone::Outside
        } else {
            Zone::Inside
        }
    }

    /// Membership bit of this layer.
    pub fn bit(self) -> u32 {
        1 << self as u32
    }

    /// Layers this layer collides with: everything sharing its zone.
    pub fn filter(self) -> LayerMask {
        match self.zone() {
            Zone::Outside => LayerMask::OUTSIDE,
            Zone::Inside => LayerMask::INSIDE,
        }
    }
}

/// A set of physics layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    /// All outside layers (even bits).
    pub const OUTSIDE: LayerMask = LayerMask(0b0101_0101_0101);
    /// All inside layers (odd bits).
    pub const INSIDE: LayerMask = LayerMask(0b1010_1010_1010);

    pub fn with(self, layer: PhysicsLayer) -> Self {
        LayerMask(self.0 | layer.bit())
    }

    pub fn contains(self, layer: PhysicsLayer) -> bool {
        self.0 & layer.bit() != 0
    }

    /// Whether any layer of `bits` is in this mask.
    pub fn intersects_bits(self, bits: u32) -> bool {
        self.0 & bits != 0
    }
}
