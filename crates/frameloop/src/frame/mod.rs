// frame/mod.rs
//
// The looping frame: a rectangle of the level that wraps bodies across its
// edges while active. Games create a FrameLoop next to their EngineContext and
// tick it once per fixed step from Game::update, ahead of the physics step.

pub mod boundary;
pub mod config;
pub mod ghost;
pub mod machine;
pub mod membership;
pub mod region;
pub mod sensors;

pub use boundary::BoundaryBuilder;
pub use config::FrameConfig;
pub use ghost::GhostProxies;
pub use machine::{ActorStatus, FrameListener, FrameLoop, FrameLoopBuilder};
pub use membership::{Crossing, GhostLayout, Membership, MembershipTable};
pub use region::{FrameBounds, Region};
pub use sensors::{Sensor, SensorLayout, SensorRig};
