//! Motion Components

use bevy_ecs::prelude::*;
use iconlife_events::Vec2;

/// Centre of the icon in arena coordinates
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Position(pub Vec2);

/// Displacement per tick
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity(pub Vec2);

/// Per-component speed limit
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct MaxVelocity(pub f32);
