//! Shared data types for the icon-life simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for the engine and for any presentation layer.

pub mod event;
pub mod geometry;
pub mod kind;
pub mod snapshot;

pub use geometry::{Vec2, VecExt};
pub use kind::{ParseKindError, ServiceKind};

// Re-export event types
pub use event::*;

// Re-export snapshot types
pub use snapshot::{
    generate_snapshot_id, AgentSnapshot, ArenaSnapshot, MilestoneSnapshot, NotificationSnapshot,
    StatsSnapshot, WorldSnapshot,
};
