use frameloop::*;
use glam::Vec2;

use crate::listeners::{Button, Fan, Goal};

const GROUND_HALF_W: f32 = 30.0;
const GROUND_HALF_H: f32 = 5.0;

const PLAYER_RADIUS: f32 = 0.4;
const PLAYER_START: Vec2 = Vec2::new(0.0, 0.5);
const RUN_SPEED: f32 = 6.0;
const JUMP_SPEED: f32 = 12.0;
/// Vertical speed below which the player counts as standing.
const GROUNDED_EPSILON: f32 = 0.05;

const BALL_START: Vec2 = Vec2::new(2.0, 0.5);
const CRATE_START: Vec2 = Vec2::new(8.0, 0.5);

const FAN_POS: Vec2 = Vec2::new(-12.0, 1.5);
const FAN_HALF: Vec2 = Vec2::new(1.0, 1.5);
const FAN_LIFT: f32 = 8.0;

const BUTTON_POS: Vec2 = Vec2::new(-6.0, 0.25);
const BUTTON_HALF: Vec2 = Vec2::new(0.5, 0.25);

const GOAL_POS: Vec2 = Vec2::new(20.0, 1.0);

pub const KEY_LEFT: u32 = 37;
pub const KEY_JUMP: u32 = 38;
pub const KEY_RIGHT: u32 = 39;
pub const KEY_CROUCH: u32 = 40;

/// Frame tunables shipped with the level.
pub const FRAME_JSON: &str = r#"{
    "size": [10, 6],
    "y_offset": 1.0,
    "crouch_y_offset": -2.0,
    "terminal_fall_speed": 15.0
}"#;

#[derive(Debug, Clone, Copy, Default)]
struct Held {
    left: bool,
    right: bool,
    jump: bool,
    crouch: bool,
}

/// A single flat level with a ball, a crate, a fan, a floor button and a goal.
pub struct LoopStage {
    frame: Option<FrameLoop>,
    player: Option<EntityId>,
    ball: Option<EntityId>,
    crate_id: Option<EntityId>,
    fan: Option<EntityId>,
    button: Option<EntityId>,
    goal: Option<EntityId>,
    held: Held,
    button_pressed: bool,
    goal_reached: bool,
}

impl LoopStage {
    pub fn new() -> Self {
        Self {
            frame: None,
            player: None,
            ball: None,
            crate_id: None,
            fan: None,
            button: None,
            goal: None,
            held: Held::default(),
            button_pressed: false,
            goal_reached: false,
        }
    }

    pub fn frame(&self) -> Option<&FrameLoop> {
        self.frame.as_ref()
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn ball(&self) -> Option<EntityId> {
        self.ball
    }

    pub fn crate_id(&self) -> Option<EntityId> {
        self.crate_id
    }

    pub fn fan(&self) -> Option<EntityId> {
        self.fan
    }

    pub fn button(&self) -> Option<EntityId> {
        self.button
    }

    pub fn goal(&self) -> Option<EntityId> {
        self.goal
    }

    pub fn button_pressed(&self) -> bool {
        self.button_pressed
    }

    pub fn goal_reached(&self) -> bool {
        self.goal_reached
    }

    fn build_ground(ctx: &mut EngineContext) {
        let id = ctx.next_id();
        let pos = Vec2::new(0.0, -GROUND_HALF_H);
        let entity = Entity::new(id)
            .with_tag("ground")
            .with_capability(Capability::Terrain);
        let desc = BodyDesc::fixed(ColliderDesc::Cuboid {
            half_width: GROUND_HALF_W,
            half_height: GROUND_HALF_H,
        })
        .with_position(pos);
        ctx.spawn_with_body(entity, desc, ColliderMaterial::default());
    }

    fn spawn_ball(
        ctx: &mut EngineContext,
        tag: &str,
        capability: Capability,
        pos: Vec2,
    ) -> EntityId {
        let id = ctx.next_id();
        let entity = Entity::new(id)
            .with_tag(tag)
            .with_capability(capability)
            .with_scale(Vec2::splat(PLAYER_RADIUS * 2.0))
            .with_sprite(SpriteComponent::default());
        let desc = BodyDesc::dynamic(ColliderDesc::Ball {
            radius: PLAYER_RADIUS,
        })
        .with_position(pos)
        .with_fixed_rotation(capability == Capability::Actor);
        ctx.spawn_with_body(entity, desc, ColliderMaterial::default())
    }

    fn spawn_crate(ctx: &mut EngineContext) -> EntityId {
        let id = ctx.next_id();
        let entity = Entity::new(id)
            .with_tag("crate")
            .with_capability(Capability::Block)
            .with_sprite(SpriteComponent {
                col: 1.0,
                ..SpriteComponent::default()
            });
        let desc = BodyDesc::dynamic(ColliderDesc::Cuboid {
            half_width: 0.5,
            half_height: 0.5,
        })
        .with_position(CRATE_START);
        let material = ColliderMaterial {
            restitution: 0.0,
            friction: 0.8,
            density: 2.0,
        };
        ctx.spawn_with_body(entity, desc, material)
    }

    fn spawn_trigger(ctx: &mut EngineContext, tag: &str, pos: Vec2, half: Vec2) -> EntityId {
        let id = ctx.next_id();
        let entity = Entity::new(id)
            .with_tag(tag)
            .with_capability(Capability::Trigger)
            .with_sprite(SpriteComponent {
                col: 2.0,
                ..SpriteComponent::default()
            });
        let desc = BodyDesc::fixed(ColliderDesc::Cuboid {
            half_width: half.x,
            half_height: half.y,
        })
        .with_position(pos)
        .with_sensor(true);
        ctx.spawn_with_body(entity, desc, ColliderMaterial::default())
    }

    fn build_frame(&self, ctx: &EngineContext) -> Result<FrameLoop, FrameError> {
        let config = FrameConfig::from_json(FRAME_JSON)?;
        let mut builder = FrameLoop::builder(config);
        if let Some(player) = self.player {
            builder = builder.actor(player);
        }
        if let Some(fan) = self.fan {
            builder = builder.listener(Fan::new(fan));
        }
        if let Some(goal) = self.goal {
            builder = builder.listener(Goal::new(goal));
        }
        if let Some(button) = self.button {
            builder = builder.listener(Button::new(button));
        }
        builder.build(ctx)
    }

    fn read_keys(&mut self, input: &InputQueue) {
        for event in input.iter() {
            let (key_code, down) = match *event {
                InputEvent::KeyDown { key_code } => (key_code, true),
                InputEvent::KeyUp { key_code } => (key_code, false),
                _ => continue,
            };
            match key_code {
                KEY_LEFT => self.held.left = down,
                KEY_RIGHT => self.held.right = down,
                KEY_JUMP => self.held.jump = down,
                KEY_CROUCH => self.held.crouch = down,
                _ => {}
            }
        }
    }

    fn drive_player(&mut self, ctx: &mut EngineContext) -> ActorStatus {
        let Some(player) = self.player else {
            return ActorStatus::default();
        };
        let v = ctx.velocity(player);
        let grounded = v.y.abs() < GROUNDED_EPSILON;

        let mut vx = 0.0;
        if self.held.left {
            vx -= RUN_SPEED;
        }
        if self.held.right {
            vx += RUN_SPEED;
        }
        let vy = if self.held.jump && grounded {
            JUMP_SPEED
        } else {
            v.y
        };
        ctx.set_velocity(player, Vec2::new(vx, vy));

        ActorStatus {
            grounded,
            crouching: self.held.crouch && grounded,
        }
    }

    /// Bodies in the trigger's zone that overlap `half` around the trigger.
    fn bodies_in(ctx: &EngineContext, trigger: EntityId, half: Vec2) -> Vec<EntityId> {
        let Some(t) = ctx.scene.get(trigger) else {
            return Vec::new();
        };
        let (zone, center) = (t.zone, t.pos);
        ctx.scene
            .trackable()
            .filter(|e| e.zone == zone)
            .filter_map(|e| e.body.map(|b| (e.id, b)))
            .filter(|(_, body)| ctx.physics.overlaps_box(body, center, half))
            .map(|(id, _)| id)
            .collect()
    }

    fn apply_fan(&self, ctx: &mut EngineContext) {
        let Some(fan) = self.fan else { return };
        for id in Self::bodies_in(ctx, fan, FAN_HALF) {
            let v = ctx.velocity(id);
            if v.y < FAN_LIFT {
                ctx.set_velocity(id, Vec2::new(v.x, FAN_LIFT));
            }
        }
    }

    fn check_button(&mut self, ctx: &EngineContext) {
        let Some(button) = self.button else { return };
        let pressed = !Self::bodies_in(ctx, button, BUTTON_HALF).is_empty();
        if pressed && !self.button_pressed {
            log::info!("button {} pressed", button);
        }
        self.button_pressed = pressed;
    }

    fn check_goal(&mut self, ctx: &EngineContext) {
        if self.goal_reached {
            return;
        }
        let (Some(player), Some(goal)) = (self.player, self.goal) else {
            return;
        };
        if ctx
            .collisions()
            .iter()
            .any(|pair| pair.started && pair.involves(player, goal))
        {
            self.goal_reached = true;
            log::info!("goal reached");
        }
    }
}

impl Default for LoopStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for LoopStage {
    fn init(&mut self, ctx: &mut EngineContext) {
        Self::build_ground(ctx);
        self.player = Some(Self::spawn_ball(ctx, "player", Capability::Actor, PLAYER_START));
        self.ball = Some(Self::spawn_ball(ctx, "ball", Capability::Prop, BALL_START));
        self.crate_id = Some(Self::spawn_crate(ctx));
        self.fan = Some(Self::spawn_trigger(ctx, "fan", FAN_POS, FAN_HALF));
        self.button = Some(Self::spawn_trigger(ctx, "button", BUTTON_POS, BUTTON_HALF));
        self.goal = Some(Self::spawn_trigger(ctx, "goal", GOAL_POS, Vec2::new(0.5, 1.0)));

        match self.build_frame(ctx) {
            Ok(frame) => self.frame = Some(frame),
            Err(err) => log::error!("looping frame disabled: {err}"),
        }
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        self.read_keys(input);
        let status = self.drive_player(ctx);

        if let Some(frame) = self.frame.as_mut() {
            frame.tick(ctx, input, status);
        }

        self.apply_fan(ctx);
        self.check_button(ctx);
        self.check_goal(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::StageRunner;

    fn runner() -> StageRunner<LoopStage> {
        StageRunner::new(LoopStage::new())
    }

    fn mask_of(ctx: &EngineContext, id: EntityId) -> MaskInteraction {
        ctx.scene.get(id).unwrap().sprite.as_ref().unwrap().mask
    }

    #[test]
    fn init_spawns_level_and_frame() {
        let r = runner();
        let stage = r.game();
        assert!(stage.frame().is_some());
        assert!(stage.player().is_some());
        assert!(r.ctx().scene.find_by_tag("ground").is_some());
        assert_eq!(r.ctx().scene.len(), 7);
        assert_eq!(r.ctx().physics.body_count(), 7);

        let frame = stage.frame().unwrap();
        assert_eq!(frame.size(), glam::UVec2::new(10, 6));
        assert!(!frame.is_active());
        assert!(frame.is_usable());
    }

    #[test]
    fn frame_edges_switch_listeners() {
        let mut r = runner();
        r.run(30);

        r.push_input(InputEvent::FrameStart);
        r.tick();
        let stage = r.game();
        let (fan, goal, button) = (
            stage.fan().unwrap(),
            stage.goal().unwrap(),
            stage.button().unwrap(),
        );
        assert!(stage.frame().unwrap().is_active());
        assert_eq!(r.ctx().scene.get(fan).unwrap().zone, Zone::Inside);
        assert_eq!(mask_of(r.ctx(), fan), MaskInteraction::VisibleInsideMask);
        assert_eq!(r.ctx().scene.get(goal).unwrap().zone, Zone::Outside);
        assert_eq!(mask_of(r.ctx(), goal), MaskInteraction::VisibleInsideMask);
        assert_eq!(r.ctx().scene.get(button).unwrap().zone, Zone::Inside);

        r.push_input(InputEvent::FrameStop);
        r.tick();
        let frame = r.game().frame().unwrap();
        assert!(!frame.is_active());
        assert!(!frame.is_usable());
        assert_eq!(r.ctx().scene.get(fan).unwrap().zone, Zone::Outside);
        assert_eq!(mask_of(r.ctx(), goal), MaskInteraction::VisibleOutsideMask);
        assert_eq!(mask_of(r.ctx(), button), MaskInteraction::VisibleOutsideMask);
    }

    #[test]
    fn pushed_ball_wraps_across_the_frame() {
        let mut r = runner();
        r.run(30);

        // A weightless ball at mid height, clear of the synthesized floor.
        let ball = {
            let ctx = r.ctx_mut();
            let id = ctx.next_id();
            let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.4 })
                .with_position(Vec2::new(2.0, 2.5))
                .with_gravity_scale(0.0);
            ctx.spawn_with_body(
                Entity::new(id)
                    .with_tag("floater")
                    .with_sprite(SpriteComponent::default()),
                desc,
                ColliderMaterial::default(),
            )
        };
        r.tick();

        r.push_input(InputEvent::FrameStart);
        r.tick();
        assert!(r.game().frame().unwrap().is_active());
        assert_eq!(r.ctx().scene.get(ball).unwrap().zone, Zone::Inside);

        let mut wrapped = false;
        let mut last_x = r.ctx().scene.get(ball).unwrap().pos.x;
        for _ in 0..120 {
            r.ctx_mut().set_velocity(ball, Vec2::new(5.0, 0.0));
            r.tick();
            let x = r.ctx().scene.get(ball).unwrap().pos.x;
            if x - last_x < -8.0 {
                wrapped = true;
                break;
            }
            last_x = x;
        }
        assert!(wrapped, "ball never wrapped, last x = {last_x}");
    }

    #[test]
    fn held_keys_drive_the_player() {
        let mut r = runner();
        r.run(10);
        let player = r.game().player().unwrap();
        let start = r.ctx().scene.get(player).unwrap().pos.x;

        r.push_input(InputEvent::KeyDown { key_code: KEY_LEFT });
        r.run(20);
        let moved = r.ctx().scene.get(player).unwrap().pos.x;
        assert!(moved < start - 1.0, "player did not run left: {moved}");

        r.push_input(InputEvent::KeyUp { key_code: KEY_LEFT });
        r.tick();
        assert!(r.ctx().velocity(player).x.abs() < 1e-3);
    }
}
