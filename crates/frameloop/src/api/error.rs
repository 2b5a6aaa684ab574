use thiserror::Error;

use crate::api::types::EntityId;

/// Failures surfaced while wiring up a frame. Runtime inconsistencies are
/// resolved in place and never reach this type.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("no controlled actor was supplied to the frame builder")]
    MissingActor,
    #[error("controlled actor {0} is not spawned in the scene")]
    ActorNotSpawned(EntityId),
    #[error("frame size must be non-zero on both axes, got {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("invalid frame config: {0}")]
    Config(#[from] serde_json::Error),
}
