//! Request router
//!
//! Patrols along one axis, occasionally dashes to an unclaimed function,
//! then returns to where it left its patrol.

use bevy_ecs::prelude::*;
use iconlife_events::{ServiceKind, Vec2};
use rand::seq::SliceRandom;
use rand::rngs::SmallRng;
use rand::Rng;

use super::Steering;
use crate::components::Arena;

pub const PATROL_SPEED: f32 = 1.5;
/// Patrol bounds sit this far inside the arena edges
pub const PATROL_INSET: f32 = 100.0;
pub const CONNECT_CHANCE: f64 = 0.02;
pub const CONNECT_SPEED: f32 = 4.0;
pub const CONNECT_ARRIVAL: f32 = 30.0;
pub const RETURN_SPEED: f32 = 3.0;
pub const RETURN_ARRIVAL: f32 = 20.0;
pub const FLIP_CHANCE: f64 = 0.5;
pub const AXIS_SWITCH_CHANCE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatrolAxis {
    X,
    Y,
}

impl PatrolAxis {
    fn other(self) -> Self {
        match self {
            PatrolAxis::X => PatrolAxis::Y,
            PatrolAxis::Y => PatrolAxis::X,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterPhase {
    Patrolling,
    Connecting { target: Entity },
    Returning,
}

impl RouterPhase {
    pub fn tag(&self) -> &'static str {
        match self {
            RouterPhase::Patrolling => "patrolling",
            RouterPhase::Connecting { .. } => "connecting",
            RouterPhase::Returning => "returning",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouterState {
    pub phase: RouterPhase,
    pub axis: PatrolAxis,
    /// +1 or -1 along the axis
    pub direction: f32,
    /// Where the current excursion started
    pub origin: Vec2,
}

impl RouterState {
    pub fn new(position: Vec2, arena: &Arena, rng: &mut SmallRng) -> Self {
        Self {
            phase: RouterPhase::Patrolling,
            axis: if rng.gen_bool(0.5) { PatrolAxis::X } else { PatrolAxis::Y },
            direction: if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
            origin: arena.clamp(position),
        }
    }

    pub fn target(&self) -> Option<Entity> {
        match self.phase {
            RouterPhase::Connecting { target } => Some(target),
            _ => None,
        }
    }
}

/// Inclusive patrol bounds along `axis`.
pub fn patrol_range(arena: &Arena, axis: PatrolAxis) -> (f32, f32) {
    let extent = match axis {
        PatrolAxis::X => arena.width,
        PatrolAxis::Y => arena.height,
    };
    (PATROL_INSET, extent - PATROL_INSET)
}

pub fn steer(state: &mut RouterState, ctx: &mut Steering<'_>, velocity: &mut Vec2) {
    match state.phase {
        RouterPhase::Patrolling => patrol(state, ctx, velocity),
        RouterPhase::Connecting { target } => connect(state, ctx, velocity, target),
        RouterPhase::Returning => return_to_origin(state, ctx, velocity),
    }
}

fn patrol(state: &mut RouterState, ctx: &mut Steering<'_>, velocity: &mut Vec2) {
    let (low, high) = patrol_range(ctx.arena, state.axis);
    let coordinate = match state.axis {
        PatrolAxis::X => ctx.position.x,
        PatrolAxis::Y => ctx.position.y,
    };
    if (coordinate >= high && state.direction > 0.0) || (coordinate <= low && state.direction < 0.0) {
        state.direction = -state.direction;
    }
    *velocity = match state.axis {
        PatrolAxis::X => Vec2::new(PATROL_SPEED * state.direction, 0.0),
        PatrolAxis::Y => Vec2::new(0.0, PATROL_SPEED * state.direction),
    };

    if !ctx.chance(CONNECT_CHANCE) {
        return;
    }
    let entity = ctx.entity;
    let candidates: Vec<Entity> = ctx
        .neighbors
        .of_kind(ServiceKind::Function)
        .map(|n| n.entity)
        .filter(|f| !ctx.neighbors.is_targeted_by_router(*f, entity) && !ctx.outbox.claimed.contains(f))
        .collect();
    if let Some(&target) = candidates.choose(ctx.rng) {
        ctx.outbox.claimed.push(target);
        state.origin = ctx.position;
        state.phase = RouterPhase::Connecting { target };
        tracing::debug!(router = ?entity, function = ?target, "router connecting");
    }
}

fn connect(state: &mut RouterState, ctx: &mut Steering<'_>, velocity: &mut Vec2, target: Entity) {
    let Some(function) = ctx.neighbors.get(target).copied() else {
        // target is gone
        state.phase = RouterPhase::Patrolling;
        return;
    };
    let distance = ctx.position.distance(function.position);
    if distance > 0.0 {
        *velocity = ctx.direction_to(function.position) * CONNECT_SPEED;
    }
    if distance < CONNECT_ARRIVAL {
        ctx.outbox.contacts.push((ctx.entity, target));
        state.phase = RouterPhase::Returning;
    }
}

fn return_to_origin(state: &mut RouterState, ctx: &mut Steering<'_>, velocity: &mut Vec2) {
    let distance = ctx.position.distance(state.origin);
    if distance > 0.0 {
        *velocity = ctx.direction_to(state.origin) * RETURN_SPEED;
    }
    if distance < RETURN_ARRIVAL {
        state.phase = RouterPhase::Patrolling;
        if ctx.chance(FLIP_CHANCE) {
            state.direction = -state.direction;
        }
        if ctx.chance(AXIS_SWITCH_CHANCE) {
            state.axis = state.axis.other();
        }
    }
}
