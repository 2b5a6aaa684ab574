use glam::{UVec2, Vec2};

use crate::api::error::FrameError;
use crate::api::game::EngineContext;
use crate::api::types::EntityId;
use crate::components::layer::Zone;
use crate::components::sprite::MaskInteraction;
use crate::frame::boundary::BoundaryBuilder;
use crate::frame::config::FrameConfig;
use crate::frame::ghost::GhostProxies;
use crate::frame::membership::{Crossing, MembershipTable};
use crate::frame::region::{FrameBounds, Region};
use crate::frame::sensors::{ContactKind, Sensor, SensorLayout, SensorRig};
use crate::input::queue::{InputEvent, InputQueue};

/// Level actors that react to the frame switching on and off.
pub trait FrameListener {
    fn on_frame_active(&mut self, ctx: &mut EngineContext);
    fn on_frame_inactive(&mut self, ctx: &mut EngineContext);
}

/// What the game knows about the controlled actor this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActorStatus {
    pub grounded: bool,
    pub crouching: bool,
}

/// Wires a [`FrameLoop`] to its actor and listeners.
pub struct FrameLoopBuilder {
    config: FrameConfig,
    actor: Option<EntityId>,
    listeners: Vec<Box<dyn FrameListener>>,
}

impl FrameLoopBuilder {
    pub fn actor(mut self, actor: EntityId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn listener(mut self, listener: impl FrameListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Validate the wiring against the scene and start inactive, anchored on
    /// the actor.
    pub fn build(self, ctx: &EngineContext) -> Result<FrameLoop, FrameError> {
        self.config.validate()?;
        let actor = self.actor.ok_or(FrameError::MissingActor)?;
        let actor_pos = ctx
            .scene
            .get(actor)
            .map(|e| e.pos)
            .ok_or(FrameError::ActorNotSpawned(actor))?;

        let [width, height] = self.config.size;
        let size = UVec2::new(width, height);
        let mut region = Region::new(size, actor_pos);
        region.track(actor_pos, false, &self.config);

        Ok(FrameLoop {
            members: MembershipTable::new(actor, size.as_vec2()),
            config: self.config,
            actor,
            region,
            sensors: SensorRig::new(),
            ghosts: GhostProxies::new(),
            boundary: BoundaryBuilder::new(),
            listeners: self.listeners,
            prev_active: false,
        })
    }
}

/// The looping frame: a rectangle that wraps bodies across its edges while
/// active and follows the actor while inactive.
pub struct FrameLoop {
    config: FrameConfig,
    actor: EntityId,
    region: Region,
    sensors: SensorRig,
    members: MembershipTable,
    ghosts: GhostProxies,
    boundary: BoundaryBuilder,
    listeners: Vec<Box<dyn FrameListener>>,
    prev_active: bool,
}

impl FrameLoop {
    pub fn builder(config: FrameConfig) -> FrameLoopBuilder {
        FrameLoopBuilder {
            config,
            actor: None,
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn actor(&self) -> EntityId {
        self.actor
    }

    /// Region width and height in tiles.
    pub fn size(&self) -> UVec2 {
        self.region.size()
    }

    /// Bounds frozen for the current activation.
    pub fn bounds(&self) -> Option<FrameBounds> {
        self.region.frozen()
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn is_active(&self) -> bool {
        self.region.is_active()
    }

    pub fn is_usable(&self) -> bool {
        self.region.is_usable()
    }

    pub fn membership(&self) -> &MembershipTable {
        &self.members
    }

    pub fn ghosts(&self) -> &GhostProxies {
        &self.ghosts
    }

    pub fn boundary(&self) -> &BoundaryBuilder {
        &self.boundary
    }

    /// Ask the frame to start. Ignored while unusable; flips in toggle mode.
    pub fn request_start(&mut self) {
        if !self.region.usable {
            log::debug!("frame start ignored: not usable");
            return;
        }
        if self.config.toggle {
            self.region.active = !self.region.active;
        } else {
            self.region.active = true;
        }
    }

    /// Ask the frame to stop. Ignored in toggle mode.
    pub fn request_stop(&mut self) {
        if !self.config.toggle {
            self.region.active = false;
        }
    }

    /// Run one simulation tick. Call once per fixed step from `Game::update`.
    pub fn tick(&mut self, ctx: &mut EngineContext, input: &InputQueue, status: ActorStatus) {
        for event in input.frame_requests() {
            match event {
                InputEvent::FrameStart => self.request_start(),
                _ => self.request_stop(),
            }
        }
        self.region.active &= self.region.usable;
        let active = self.region.active;
        // Contacts were produced under last tick's state: on an activation
        // tick they are pre-activation contacts, settled by `activate`.
        let sensing = self.prev_active;

        let layout = SensorLayout::new(&self.region.rect(), &self.config);
        for event in self.sensors.poll(&layout, &ctx.scene, &ctx.physics) {
            let crossing = match (event.sensor, event.kind) {
                (Sensor::Interior, ContactKind::Stay) => {
                    self.members.on_interior_stay(event.body, sensing)
                }
                (Sensor::Interior, ContactKind::Exit) => {
                    self.members.on_interior_exit(event.body, sensing)
                }
                (Sensor::Edge(dir), ContactKind::Stay) => {
                    self.members.on_edge_stay(event.body, dir, sensing)
                }
                (Sensor::Edge(dir), ContactKind::Exit) => {
                    self.members.on_edge_exit(event.body, dir, sensing)
                }
            };
            if let Some((body, shift)) = crossing.as_ref().and_then(Crossing::shift) {
                if let Some(pos) = ctx.scene.position(body) {
                    ctx.teleport(body, pos + shift);
                }
            }
        }

        self.members.prune_stale(|id| ctx.scene.contains(id));
        self.clamp_fall_speed(ctx);

        if active {
            let size = self.region.size().as_vec2();
            self.ghosts.sync(&self.members, size, ctx);
        }
        self.boundary.prune(ctx);

        if status.grounded {
            self.region.usable = true;
        }

        if !active {
            if let Some(pos) = ctx.scene.position(self.actor) {
                self.region.track(pos, status.crouching, &self.config);
            }
        }

        if active && !self.prev_active {
            self.activate(ctx);
        } else if !active && self.prev_active {
            self.deactivate(ctx);
        }

        self.prev_active = self.region.active;
    }

    fn clamp_fall_speed(&self, ctx: &mut EngineContext) {
        let terminal = self.config.terminal_fall_speed;
        for (id, membership) in self.members.iter() {
            if !membership.is_inside() {
                continue;
            }
            let v = ctx.velocity(id);
            if v.y < -terminal {
                ctx.set_velocity(id, Vec2::new(v.x, -terminal));
            }
        }
    }

    fn activate(&mut self, ctx: &mut EngineContext) {
        let bounds = self.region.freeze();
        let raised = self
            .members
            .enter_frame(&bounds, |id| ctx.scene.position(id));
        for id in raised {
            ctx.set_mask(id, MaskInteraction::VisibleInsideMask);
            if id != self.actor {
                ctx.set_zone(id, Zone::Inside);
            }
        }

        // Proxies follow the zones just raised and the settled layouts.
        let size = self.region.size().as_vec2();
        self.ghosts.sync(&self.members, size, ctx);

        self.boundary.build(&bounds, ctx);
        log::info!(
            "frame active at {:?}..{:?} ({} tracked)",
            bounds.min,
            bounds.max,
            self.members.len()
        );

        for listener in &mut self.listeners {
            listener.on_frame_active(ctx);
        }
    }

    fn deactivate(&mut self, ctx: &mut EngineContext) {
        self.boundary.teardown(ctx);
        self.ghosts.clear(ctx);

        let bounds = self.region.rect();
        for lowered in self.members.leave_frame() {
            ctx.set_mask(lowered.body, MaskInteraction::VisibleOutsideMask);
            if lowered.body != self.actor {
                ctx.set_zone(lowered.body, Zone::Outside);
            }
            if lowered.was_crossing {
                if let Some(pos) = ctx.scene.position(lowered.body) {
                    ctx.teleport(lowered.body, bounds.wrap_into(pos));
                }
            }
        }

        self.region.release();
        self.region.usable = false;
        log::info!("frame inactive");

        for listener in &mut self.listeners {
            listener.on_frame_inactive(ctx);
        }
    }
}
