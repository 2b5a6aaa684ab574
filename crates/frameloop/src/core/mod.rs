pub mod hierarchy;
pub mod physics;
pub mod query;
pub mod scene;
