use glam::{IVec2, Vec2};
use rapier2d::parry::query::intersection_test;
use rapier2d::parry::shape::Cuboid;
use rapier2d::prelude::*;
use std::sync::Mutex;

use crate::api::types::EntityId;
use crate::components::layer::{LayerMask, PhysicsLayer};
use crate::core::query::{ProbeHit, SpatialQuery};

/// `user_data` marker for synthesized tile bodies, which have no scene entity.
const TILE_USER_DATA: u128 = u128::MAX;

// ---------------------------------------------------------------------------
// Conversion helpers (private): glam ↔ nalgebra
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn na_to_vec2(v: &nalgebra::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn na_iso_to_pos_rot(iso: &nalgebra::Isometry2<f32>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    let rot = iso.rotation.angle();
    (pos, rot)
}

fn layer_groups(layer: PhysicsLayer) -> InteractionGroups {
    InteractionGroups::new(
        Group::from_bits_truncate(layer.bit()),
        Group::from_bits_truncate(layer.filter().0),
    )
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
    KinematicPositionBased,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
            BodyType::KinematicPositionBased => RigidBodyType::KinematicPositionBased,
        }
    }
}

/// Shape description for a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderDesc {
    Ball { radius: f32 },
    Cuboid { half_width: f32, half_height: f32 },
    CapsuleY { half_height: f32, radius: f32 },
}

impl ColliderDesc {
    fn build_collider(&self) -> ColliderBuilder {
        match *self {
            ColliderDesc::Ball { radius } => ColliderBuilder::ball(radius),
            ColliderDesc::Cuboid { half_width, half_height } => {
                ColliderBuilder::cuboid(half_width, half_height)
            }
            ColliderDesc::CapsuleY { half_height, radius } => {
                ColliderBuilder::capsule_y(half_height, radius)
            }
        }
    }
}

/// Physical material properties for a collider.
#[derive(Debug, Clone, Copy)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 0.5,
            density: 1.0,
        }
    }
}

/// Builder for describing a rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub gravity_scale: f32,
    pub fixed_rotation: bool,
    pub sensor: bool,
    pub collider: ColliderDesc,
}

impl BodyDesc {
    /// Create a dynamic body description with the given collider shape.
    pub fn dynamic(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            gravity_scale: 1.0,
            fixed_rotation: false,
            sensor: false,
            collider,
        }
    }

    /// Create a fixed (static) body description with the given collider shape.
    pub fn fixed(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Fixed,
            gravity_scale: 0.0,
            fixed_rotation: true,
            ..Self::dynamic(collider)
        }
    }

    /// Create a position-driven kinematic body. Used for bodies pinned to a parent.
    pub fn kinematic(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::KinematicPositionBased,
            gravity_scale: 0.0,
            fixed_rotation: true,
            ..Self::dynamic(collider)
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.velocity = vel;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    /// Sensors report collisions without a contact response.
    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }
}

/// Handle pair stored on an Entity, referencing Rapier internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody {
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
}

/// A collision event between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    /// `true` when the collision just started, `false` when it ended.
    pub started: bool,
}

impl CollisionPair {
    /// Whether this pair involves both entities, in either order.
    pub fn involves(&self, a: EntityId, b: EntityId) -> bool {
        (self.entity_a == a && self.entity_b == b) || (self.entity_a == b && self.entity_b == a)
    }
}

// ---------------------------------------------------------------------------
// WASM-safe event collector (no crossbeam)
// ---------------------------------------------------------------------------

struct DirectEventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain_collisions(&self) -> Vec<CollisionEvent> {
        self.collisions
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let Ok(mut events) = self.collisions.lock() {
            events.push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps all Rapier2D boilerplate into a single, easy-to-use struct.
pub struct PhysicsWorld {
    gravity: nalgebra::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub(crate) bodies: RigidBodySet,
    pub(crate) colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    event_collector: DirectEventCollector,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity vector.
    /// The world is Y-up: use negative Y for downward gravity.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: vec2_to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: DirectEventCollector::new(),
        }
    }

    /// Set the integration timestep.
    pub fn set_dt(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
    }

    /// Create a rigid body + collider on `layer` and return handles.
    /// The EntityId is stored in the body's `user_data` for collision lookups.
    pub fn create_body(
        &mut self,
        entity_id: EntityId,
        desc: &BodyDesc,
        material: ColliderMaterial,
        layer: PhysicsLayer,
    ) -> PhysicsBody {
        self.insert_body(entity_id.0 as u128, desc, material, layer)
    }

    /// Create a fixed unit tile collider centred on `cell + 0.5`.
    pub fn create_tile(&mut self, cell: IVec2, layer: PhysicsLayer) -> PhysicsBody {
        let desc = BodyDesc::fixed(ColliderDesc::Cuboid {
            half_width: 0.5,
            half_height: 0.5,
        })
        .with_position(cell.as_vec2() + Vec2::splat(0.5));
        self.insert_body(TILE_USER_DATA, &desc, ColliderMaterial::default(), layer)
    }

    fn insert_body(
        &mut self,
        user_data: u128,
        desc: &BodyDesc,
        material: ColliderMaterial,
        layer: PhysicsLayer,
    ) -> PhysicsBody {
        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(vec2_to_na(desc.position))
            .rotation(desc.rotation)
            .linvel(vec2_to_na(desc.velocity))
            .gravity_scale(desc.gravity_scale)
            .locked_axes(if desc.fixed_rotation {
                LockedAxes::ROTATION_LOCKED
            } else {
                LockedAxes::empty()
            })
            .user_data(user_data)
            .build();

        let body_handle = self.bodies.insert(rb);

        let collider = desc
            .collider
            .build_collider()
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .sensor(desc.sensor)
            .collision_groups(layer_groups(layer))
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();

        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        PhysicsBody {
            body_handle,
            collider_handle,
        }
    }

    /// Remove a body and all its colliders from the simulation.
    pub fn remove_body(&mut self, body: &PhysicsBody) {
        self.bodies.remove(
            body.body_handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Step the simulation and collect collision events into the provided Vec.
    pub fn step_into(&mut self, collision_events: &mut Vec<CollisionPair>) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );

        // Drain collision events and resolve entity IDs from user_data
        for event in self.event_collector.drain_collisions() {
            let (h1, h2, started) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };

            let entity_a = self.collider_to_entity(h1);
            let entity_b = self.collider_to_entity(h2);

            if let (Some(a), Some(b)) = (entity_a, entity_b) {
                collision_events.push(CollisionPair {
                    entity_a: a,
                    entity_b: b,
                    started,
                });
            }
        }
    }

    /// Set the linear velocity of a body directly.
    pub fn set_velocity(&mut self, body: &PhysicsBody, vel: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_linvel(vec2_to_na(vel), true);
        }
    }

    /// Get the current linear velocity of a body.
    pub fn velocity(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Move a body instantly, keeping its velocity. Kinematic bodies have
    /// their pending target overwritten too, so they do not sweep back.
    pub fn teleport(&mut self, body: &PhysicsBody, pos: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_translation(vec2_to_na(pos), true);
        }
    }

    /// Set the rotation of a body instantly.
    pub fn set_rotation(&mut self, body: &PhysicsBody, rotation: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_rotation(Rotation::new(rotation), true);
        }
    }

    /// Get the current position and rotation of a body.
    pub fn body_position(&self, body: &PhysicsBody) -> (Vec2, f32) {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_iso_to_pos_rot(rb.position()))
            .unwrap_or((Vec2::ZERO, 0.0))
    }

    /// Move a body's collider onto another layer.
    pub fn set_layer(&mut self, body: &PhysicsBody, layer: PhysicsLayer) {
        if let Some(collider) = self.colliders.get_mut(body.collider_handle) {
            collider.set_collision_groups(layer_groups(layer));
        }
    }

    /// Layer bits the body's collider is a member of.
    pub fn layer_bits(&self, body: &PhysicsBody) -> u32 {
        self.colliders
            .get(body.collider_handle)
            .map(|c| c.collision_groups().memberships.bits())
            .unwrap_or(0)
    }

    /// Number of rigid bodies in the simulation.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Query the collider shape of a physics body.
    /// Returns `None` if the collider no longer exists or has an unsupported shape.
    pub fn collider_shape(&self, body: &PhysicsBody) -> Option<ColliderDesc> {
        let collider = self.colliders.get(body.collider_handle)?;
        let shape = collider.shape();
        if let Some(ball) = shape.as_ball() {
            Some(ColliderDesc::Ball { radius: ball.radius })
        } else if let Some(cuboid) = shape.as_cuboid() {
            Some(ColliderDesc::Cuboid {
                half_width: cuboid.half_extents.x,
                half_height: cuboid.half_extents.y,
            })
        } else if let Some(capsule) = shape.as_capsule() {
            Some(ColliderDesc::CapsuleY {
                half_height: capsule.half_height(),
                radius: capsule.radius,
            })
        } else {
            None
        }
    }

    // -- private helpers --

    /// World pose of a collider read through its parent body, so teleports
    /// made since the last step are already visible to queries.
    fn collider_pose(&self, collider: &Collider) -> nalgebra::Isometry2<f32> {
        match (
            collider.parent().and_then(|h| self.bodies.get(h)),
            collider.position_wrt_parent(),
        ) {
            (Some(rb), Some(rel)) => rb.position() * rel,
            _ => *collider.position(),
        }
    }

    fn collider_to_entity(&self, collider_handle: ColliderHandle) -> Option<EntityId> {
        let collider = self.colliders.get(collider_handle)?;
        let body_handle = collider.parent()?;
        let body = self.bodies.get(body_handle)?;
        if body.user_data == TILE_USER_DATA {
            return None;
        }
        Some(EntityId(body.user_data as u32))
    }
}

impl SpatialQuery for PhysicsWorld {
    fn probe_point(&self, point: Vec2, mask: LayerMask) -> Vec<ProbeHit> {
        let pt = nalgebra::Point2::new(point.x, point.y);
        let mut hits = Vec::new();
        for (handle, collider) in self.colliders.iter() {
            if !mask.intersects_bits(collider.collision_groups().memberships.bits()) {
                continue;
            }
            if !collider.shape().contains_point(&self.collider_pose(collider), &pt) {
                continue;
            }
            if let Some(entity) = self.collider_to_entity(handle) {
                hits.push(ProbeHit { entity });
            }
        }
        hits
    }

    fn overlaps_box(&self, body: &PhysicsBody, center: Vec2, half_extents: Vec2) -> bool {
        let Some(collider) = self.colliders.get(body.collider_handle) else {
            return false;
        };
        let probe = Cuboid::new(vec2_to_na(half_extents));
        let probe_pos = nalgebra::Isometry2::new(vec2_to_na(center), 0.0);
        let pose = self.collider_pose(collider);
        intersection_test(&probe_pos, &probe, &pose, collider.shape()).unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
