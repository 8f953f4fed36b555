//! Icon-life simulation engine.
//!
//! Cloud-service icons move around a 2D arena, each kind with its own small
//! state machine. Pairwise passes resolve overlaps, record interactions,
//! apply complementary effects and track dependency health; an achievement
//! ledger records the first time each relationship is observed.
//!
//! [`Simulation`] is the entry point for hosts.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod behavior;
pub mod components;
pub mod config;
pub mod events;
pub mod ledger;
pub mod output;
pub mod setup;
pub mod simulation;
pub mod systems;

pub use components::{AgentHandle, Arena};
pub use config::{Config, ConfigError};
pub use ledger::{AchievementLedger, Milestone, Notification};
pub use simulation::{AgentView, Simulation};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
