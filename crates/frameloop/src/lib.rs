pub mod api;
pub mod core;
pub mod components;
pub mod input;
pub mod frame;

// Re-export key types at crate root for convenience
pub use api::error::FrameError;
pub use api::game::{Game, GameConfig, EngineContext};
pub use api::types::{Direction, EntityId};
pub use components::entity::{Entity, Synthetic};
pub use components::layer::{Capability, LayerMask, PhysicsLayer, Zone};
pub use components::sprite::{AtlasId, MaskInteraction, SpriteComponent};
pub use components::tilemap::TileSurface;
pub use core::hierarchy::Hierarchy;
pub use core::scene::Scene;
pub use core::physics::{
    PhysicsWorld, PhysicsBody, BodyDesc, BodyType,
    ColliderDesc, ColliderMaterial, CollisionPair,
};
pub use core::query::{ProbeHit, SpatialQuery};
pub use input::queue::{InputEvent, InputQueue};

pub use frame::{
    ActorStatus, FrameBounds, FrameConfig, FrameListener, FrameLoop, FrameLoopBuilder,
    Membership,
};
