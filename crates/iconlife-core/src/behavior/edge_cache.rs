//! Content-delivery edge
//!
//! Hangs around the nearest storage bucket, and now and then runs a
//! distribution tour through the arena's quadrants before returning.

use bevy_ecs::prelude::*;
use iconlife_events::{ServiceKind, Vec2};
use rand::seq::SliceRandom;
use rand::Rng;

use super::Steering;

pub const MAX_SPEED: f32 = 2.0;
pub const FAR: f32 = 300.0;
pub const NEAR: f32 = 150.0;
pub const FAR_PULL: f32 = 0.1;
pub const MID_PULL: f32 = 0.05;
pub const NEAR_PULL: f32 = 0.02;
pub const DISTRIBUTE_CHANCE: f64 = 0.01;
pub const DISTRIBUTION_SPEED: f32 = 3.0;
pub const WAYPOINT_ARRIVAL: f32 = 20.0;
pub const WAYPOINT_MARGIN: f32 = 50.0;
/// Distance from the storage at which a return trip ends
pub const HOME_RANGE: f32 = 100.0;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EdgeCachePhase {
    #[default]
    Normal,
    Distributing {
        waypoints: Vec<Vec2>,
        next: usize,
        storage: Entity,
    },
    Returning {
        storage: Entity,
    },
}

impl EdgeCachePhase {
    pub fn tag(&self) -> &'static str {
        match self {
            EdgeCachePhase::Normal => "normal",
            EdgeCachePhase::Distributing { .. } => "distributing",
            EdgeCachePhase::Returning { .. } => "returning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeCacheState {
    pub phase: EdgeCachePhase,
}

pub fn steer(state: &mut EdgeCacheState, ctx: &mut Steering<'_>, velocity: &mut Vec2) {
    state.phase = match std::mem::take(&mut state.phase) {
        EdgeCachePhase::Normal => normal(ctx, velocity),
        EdgeCachePhase::Distributing {
            waypoints,
            next,
            storage,
        } => distribute(ctx, velocity, waypoints, next, storage),
        EdgeCachePhase::Returning { storage } => return_home(ctx, velocity, storage),
    };
}

fn normal(ctx: &mut Steering<'_>, velocity: &mut Vec2) -> EdgeCachePhase {
    let mut phase = EdgeCachePhase::Normal;
    if let Some((storage, distance)) = ctx.nearest(ServiceKind::Storage) {
        let strength = if distance > FAR {
            FAR_PULL
        } else if distance > NEAR {
            MID_PULL
        } else {
            NEAR_PULL
        };
        ctx.pull_toward(velocity, storage.position, strength);

        if distance < NEAR && ctx.chance(DISTRIBUTE_CHANCE) {
            let waypoints = plan_waypoints(ctx);
            tracing::debug!(agent = ?ctx.entity, stops = waypoints.len(), "distribution started");
            phase = EdgeCachePhase::Distributing {
                waypoints,
                next: 0,
                storage: storage.entity,
            };
        }
    }
    *velocity = velocity.clamp_length_max(MAX_SPEED);
    phase
}

/// 3-5 waypoints cycling through the quadrants in shuffled order, so the first
/// four always land in distinct quadrants.
fn plan_waypoints(ctx: &mut Steering<'_>) -> Vec<Vec2> {
    let count = ctx.rng.gen_range(3..=5);
    let mut quadrants = [0usize, 1, 2, 3];
    quadrants.shuffle(ctx.rng);
    (0..count)
        .map(|i| {
            ctx.arena
                .random_point_in_quadrant(ctx.rng, quadrants[i % quadrants.len()], WAYPOINT_MARGIN)
        })
        .collect()
}

fn distribute(
    ctx: &mut Steering<'_>,
    velocity: &mut Vec2,
    waypoints: Vec<Vec2>,
    mut next: usize,
    storage: Entity,
) -> EdgeCachePhase {
    if let Some(&waypoint) = waypoints.get(next) {
        *velocity = ctx.direction_to(waypoint) * DISTRIBUTION_SPEED;
        if ctx.position.distance(waypoint) < WAYPOINT_ARRIVAL {
            next += 1;
        }
    }
    if next >= waypoints.len() {
        return EdgeCachePhase::Returning { storage };
    }
    EdgeCachePhase::Distributing {
        waypoints,
        next,
        storage,
    }
}

fn return_home(ctx: &mut Steering<'_>, velocity: &mut Vec2, storage: Entity) -> EdgeCachePhase {
    let Some(home) = ctx.neighbors.get(storage).copied() else {
        return EdgeCachePhase::Normal;
    };
    if ctx.position.distance(home.position) < HOME_RANGE {
        return EdgeCachePhase::Normal;
    }
    *velocity = ctx.direction_to(home.position) * DISTRIBUTION_SPEED;
    EdgeCachePhase::Returning { storage }
}
