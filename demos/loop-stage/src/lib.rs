//! A small level that runs the looping frame inside a headless game loop.

pub mod listeners;
pub mod runner;
pub mod stage;

pub use listeners::{Button, Fan, Goal};
pub use runner::StageRunner;
pub use stage::LoopStage;
