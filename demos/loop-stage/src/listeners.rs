use frameloop::*;

fn move_to(ctx: &mut EngineContext, id: EntityId, zone: Zone, mask: MaskInteraction) {
    ctx.set_zone(id, zone);
    ctx.set_mask(id, mask);
}

/// Wind column. Its trigger follows the frame so it only lifts bodies on
/// its own side of the wrap.
pub struct Fan {
    id: EntityId,
}

impl Fan {
    pub fn new(id: EntityId) -> Self {
        Self { id }
    }
}

impl FrameListener for Fan {
    fn on_frame_active(&mut self, ctx: &mut EngineContext) {
        move_to(ctx, self.id, Zone::Inside, MaskInteraction::VisibleInsideMask);
    }

    fn on_frame_inactive(&mut self, ctx: &mut EngineContext) {
        move_to(ctx, self.id, Zone::Outside, MaskInteraction::VisibleOutsideMask);
    }
}

/// Level exit. Stays reachable from the outside; only its sprite is clipped
/// to the frame while active.
pub struct Goal {
    id: EntityId,
}

impl Goal {
    pub fn new(id: EntityId) -> Self {
        Self { id }
    }
}

impl FrameListener for Goal {
    fn on_frame_active(&mut self, ctx: &mut EngineContext) {
        ctx.set_mask(self.id, MaskInteraction::VisibleInsideMask);
    }

    fn on_frame_inactive(&mut self, ctx: &mut EngineContext) {
        ctx.set_mask(self.id, MaskInteraction::VisibleOutsideMask);
    }
}

/// Floor switch pressed by bodies sharing its zone.
pub struct Button {
    id: EntityId,
}

impl Button {
    pub fn new(id: EntityId) -> Self {
        Self { id }
    }
}

impl FrameListener for Button {
    fn on_frame_active(&mut self, ctx: &mut EngineContext) {
        move_to(ctx, self.id, Zone::Inside, MaskInteraction::VisibleInsideMask);
        log::debug!("button {} now pressable from inside the frame", self.id);
    }

    fn on_frame_inactive(&mut self, ctx: &mut EngineContext) {
        move_to(ctx, self.id, Zone::Outside, MaskInteraction::VisibleOutsideMask);
    }
}
