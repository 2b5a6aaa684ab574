use frameloop::{EngineContext, Game, InputEvent, InputQueue};

/// Headless game runner: one fixed step per `tick`.
pub struct StageRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    input: InputQueue,
}

impl<G: Game> StageRunner<G> {
    /// Build the engine context from the game's config and run `init`.
    pub fn new(mut game: G) -> Self {
        let config = game.config();
        let mut ctx = EngineContext::from_config(&config);
        game.init(&mut ctx);
        Self {
            game,
            ctx,
            input: InputQueue::new(),
        }
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one frame: update game, step physics, drain input.
    pub fn tick(&mut self) {
        self.game.update(&mut self.ctx, &self.input);
        self.ctx.step_physics();
        self.input.drain();
    }

    /// Run `n` frames with no new input.
    pub fn run(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn ctx(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }
}
