use glam::Vec2;
use crate::api::types::EntityId;
use crate::components::entity::Entity;
use crate::components::layer::Zone;
use crate::components::sprite::MaskInteraction;
use crate::core::hierarchy::Hierarchy;
use crate::core::physics::{BodyDesc, ColliderMaterial, CollisionPair, PhysicsWorld};
use crate::core::scene::Scene;
use crate::input::queue::InputQueue;

/// Configuration for the engine, provided by the game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Gravity vector for physics simulation. The world is Y-up,
    /// so the default points down the negative Y axis.
    pub gravity: Vec2,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            gravity: Vec2::new(0.0, -30.0),
        }
    }
}

/// The core contract every game must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Setup initial state, spawn entities, configure the scene.
    fn init(&mut self, ctx: &mut EngineContext);

    /// The game loop tick. Apply forces, check win conditions, spawn/despawn entities.
    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue);
}

/// Mutable access to engine state, passed to Game::init and Game::update.
pub struct EngineContext {
    pub scene: Scene,
    pub physics: PhysicsWorld,
    pub hierarchy: Hierarchy,
    next_id: u32,
    collision_events: Vec<CollisionPair>,
}

impl EngineContext {
    /// Create an EngineContext with zero gravity.
    pub fn new() -> Self {
        Self::with_gravity(Vec2::ZERO)
    }

    /// Create an EngineContext with a custom gravity vector.
    pub fn with_gravity(gravity: Vec2) -> Self {
        Self {
            scene: Scene::new(),
            physics: PhysicsWorld::new(gravity),
            hierarchy: Hierarchy::new(),
            next_id: 1,
            collision_events: Vec::new(),
        }
    }

    /// Create an EngineContext from a game's configuration.
    pub fn from_config(config: &GameConfig) -> Self {
        let mut ctx = Self::with_gravity(config.gravity);
        ctx.physics.set_dt(config.fixed_dt);
        ctx
    }

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Spawn an entity without a physics body.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.scene.spawn(entity);
        id
    }

    /// Spawn an entity with a physics body. Returns the EntityId.
    /// The entity's position is set from the BodyDesc and its layer from
    /// its capability and zone.
    pub fn spawn_with_body(
        &mut self,
        entity: Entity,
        desc: BodyDesc,
        material: ColliderMaterial,
    ) -> EntityId {
        let id = entity.id;
        let body = self.physics.create_body(id, &desc, material, entity.layer());
        let entity = entity
            .with_pos(desc.position)
            .with_rotation(desc.rotation)
            .with_body(body);
        self.scene.spawn(entity);
        id
    }

    /// Despawn an entity and everything attached below it, cleaning up
    /// physics bodies.
    pub fn despawn(&mut self, id: EntityId) {
        for child in self.hierarchy.descendants(id) {
            self.despawn_single(child);
        }
        self.despawn_single(id);
    }

    fn despawn_single(&mut self, id: EntityId) {
        self.hierarchy.remove(id);
        if let Some(entity) = self.scene.despawn(id) {
            if let Some(body) = &entity.body {
                self.physics.remove_body(body);
            }
        }
    }

    /// Attach `child` to `parent` at a fixed offset and snap it into place.
    pub fn attach(&mut self, child: EntityId, parent: EntityId, offset: Vec2) {
        self.hierarchy.attach(child, parent, offset);
        self.hierarchy
            .propagate_from(parent, &mut self.scene, &mut self.physics);
    }

    /// Set the linear velocity of an entity's physics body.
    pub fn set_velocity(&mut self, id: EntityId, vel: Vec2) {
        if let Some(entity) = self.scene.get(id) {
            if let Some(body) = &entity.body {
                self.physics.set_velocity(body, vel);
            }
        }
    }

    /// Get the linear velocity of an entity's physics body.
    pub fn velocity(&self, id: EntityId) -> Vec2 {
        self.scene
            .get(id)
            .and_then(|e| e.body.as_ref())
            .map(|body| self.physics.velocity(body))
            .unwrap_or(Vec2::ZERO)
    }

    /// Move an entity instantly, keeping its velocity. Attached entities follow.
    pub fn teleport(&mut self, id: EntityId, pos: Vec2) {
        let Some(entity) = self.scene.get_mut(id) else { return };
        entity.pos = pos;
        if let Some(body) = &entity.body {
            self.physics.teleport(body, pos);
        }
        self.hierarchy
            .propagate_from(id, &mut self.scene, &mut self.physics);
    }

    /// Move an entity into `zone`, switching its physics layer accordingly.
    pub fn set_zone(&mut self, id: EntityId, zone: Zone) {
        let Some(entity) = self.scene.get_mut(id) else { return };
        entity.zone = zone;
        if let Some(body) = &entity.body {
            self.physics.set_layer(body, entity.layer());
        }
    }

    /// Set the sprite mask interaction of an entity, if it has a sprite.
    pub fn set_mask(&mut self, id: EntityId, mask: MaskInteraction) {
        if let Some(sprite) = self.scene.get_mut(id).and_then(|e| e.sprite.as_mut()) {
            sprite.mask = mask;
        }
    }

    /// Get collision events from the most recent physics step.
    pub fn collisions(&self) -> &[CollisionPair] {
        &self.collision_events
    }

    /// Step the physics simulation, sync positions back to entities and
    /// re-seat attached entities on their parents.
    pub fn step_physics(&mut self) {
        self.collision_events.clear();
        self.physics.step_into(&mut self.collision_events);

        // Sync Rapier body positions back to entity positions
        for entity in self.scene.iter_mut() {
            if let Some(body) = &entity.body {
                let (pos, rot) = self.physics.body_position(body);
                entity.pos = pos;
                entity.rotation = rot;
            }
        }

        self.hierarchy.propagate(&mut self.scene, &mut self.physics);
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}
