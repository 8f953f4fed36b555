//! Auto-scaling controller
//!
//! Watches the compute fleet from near its centroid. A crowded fleet triggers
//! a scale-up (visit a few instances, icon grows); a sparse one triggers a
//! scale-down (back away, icon shrinks). Each episode is followed by a
//! cooldown before the next one can start.

use bevy_ecs::prelude::*;
use iconlife_events::{ServiceKind, Vec2};
use rand::seq::SliceRandom;
use rand::Rng;

use super::Steering;

pub const MONITOR_TURN_CHANCE: f64 = 0.03;
pub const IDLE_TURN_CHANCE: f64 = 0.05;
pub const CENTROID_PULL_CAP: f32 = 0.1;
pub const WATCH_RANGE: f32 = 150.0;
pub const EPISODE_CHANCE: f64 = 0.02;
/// More compute agents than this triggers a scale-up
pub const CROWDED: usize = 5;
/// Fewer compute agents than this triggers a scale-down
pub const SPARSE: usize = 3;
pub const UP_TARGETS: usize = 3;
pub const DOWN_TARGETS: usize = 2;
pub const RETARGET_TICKS: u32 = 30;
pub const UP_SPEED: f32 = 3.0;
pub const DOWN_SPEED: f32 = 2.0;
pub const SCALE_STEP: f32 = 0.01;
pub const SCALE_RELAX: f32 = 0.005;
pub const MAX_SCALE: f32 = 1.5;
pub const MIN_SCALE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScalingPhase {
    #[default]
    Monitoring,
    ScalingUp {
        remaining: u32,
        targets: Vec<Entity>,
        current: usize,
        retarget_in: u32,
    },
    ScalingDown {
        remaining: u32,
        targets: Vec<Entity>,
    },
}

impl ScalingPhase {
    pub fn tag(&self) -> &'static str {
        match self {
            ScalingPhase::Monitoring => "monitoring",
            ScalingPhase::ScalingUp { .. } => "scaling_up",
            ScalingPhase::ScalingDown { .. } => "scaling_down",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalingState {
    pub phase: ScalingPhase,
    /// Icon scale, 1.0 at rest
    pub scale: f32,
    /// Ticks before another episode may start
    pub cooldown: u32,
}

impl Default for ScalingState {
    fn default() -> Self {
        Self {
            phase: ScalingPhase::Monitoring,
            scale: 1.0,
            cooldown: 0,
        }
    }
}

pub fn steer(state: &mut ScalingState, ctx: &mut Steering<'_>, velocity: &mut Vec2) {
    let phase = std::mem::take(&mut state.phase);
    state.phase = match phase {
        ScalingPhase::Monitoring => monitor(state, ctx, velocity),
        ScalingPhase::ScalingUp {
            remaining,
            targets,
            current,
            retarget_in,
        } => scale_up(state, ctx, velocity, remaining, targets, current, retarget_in),
        ScalingPhase::ScalingDown { remaining, targets } => {
            scale_down(state, ctx, velocity, remaining, targets)
        }
    };
}

fn monitor(state: &mut ScalingState, ctx: &mut Steering<'_>, velocity: &mut Vec2) -> ScalingPhase {
    state.cooldown = state.cooldown.saturating_sub(1);
    state.scale = relax(state.scale);

    let Some((centroid, count)) = ctx.neighbors.centroid(ServiceKind::Compute) else {
        if ctx.chance(IDLE_TURN_CHANCE) {
            *velocity = ctx.random_velocity(1.0, 2.0);
        }
        return ScalingPhase::Monitoring;
    };

    if ctx.chance(MONITOR_TURN_CHANCE) {
        *velocity = ctx.random_velocity(1.5, 2.2);
    }
    let distance = ctx.position.distance(centroid);
    let strength = if distance > 0.0 {
        (30.0 / distance).min(CENTROID_PULL_CAP)
    } else {
        CENTROID_PULL_CAP
    };
    ctx.pull_toward(velocity, centroid, strength);

    if distance >= WATCH_RANGE || state.cooldown > 0 || !ctx.chance(EPISODE_CHANCE) {
        return ScalingPhase::Monitoring;
    }

    let fleet: Vec<Entity> = ctx.neighbors.of_kind(ServiceKind::Compute).map(|n| n.entity).collect();
    if count > CROWDED {
        let targets: Vec<Entity> = fleet.choose_multiple(ctx.rng, UP_TARGETS).copied().collect();
        tracing::debug!(agent = ?ctx.entity, fleet = count, "scaling up");
        ScalingPhase::ScalingUp {
            remaining: episode_length(ctx),
            targets,
            current: 0,
            retarget_in: RETARGET_TICKS,
        }
    } else if count < SPARSE {
        let targets: Vec<Entity> = fleet.choose_multiple(ctx.rng, DOWN_TARGETS).copied().collect();
        tracing::debug!(agent = ?ctx.entity, fleet = count, "scaling down");
        ScalingPhase::ScalingDown {
            remaining: episode_length(ctx),
            targets,
        }
    } else {
        ScalingPhase::Monitoring
    }
}

fn episode_length(ctx: &mut Steering<'_>) -> u32 {
    ctx.rng.gen_range(90..=150)
}

fn relax(scale: f32) -> f32 {
    if scale > 1.0 {
        (scale - SCALE_RELAX).max(1.0)
    } else {
        (scale + SCALE_RELAX).min(1.0)
    }
}

fn finish(state: &mut ScalingState, ctx: &mut Steering<'_>) -> ScalingPhase {
    state.cooldown = ctx.rng.gen_range(180..=300);
    ScalingPhase::Monitoring
}

fn scale_up(
    state: &mut ScalingState,
    ctx: &mut Steering<'_>,
    velocity: &mut Vec2,
    remaining: u32,
    mut targets: Vec<Entity>,
    mut current: usize,
    mut retarget_in: u32,
) -> ScalingPhase {
    state.scale = (state.scale + SCALE_STEP).min(MAX_SCALE);

    let remaining = remaining.saturating_sub(1);
    if remaining == 0 {
        return finish(state, ctx);
    }

    targets.retain(|t| ctx.neighbors.get(*t).is_some());
    if !targets.is_empty() {
        retarget_in = retarget_in.saturating_sub(1);
        if retarget_in == 0 {
            current += 1;
            retarget_in = RETARGET_TICKS;
        }
        current %= targets.len();
        if let Some(target) = ctx.neighbors.get(targets[current]).copied() {
            *velocity = ctx.direction_to(target.position) * UP_SPEED;
        }
    }

    ScalingPhase::ScalingUp {
        remaining,
        targets,
        current,
        retarget_in,
    }
}

fn scale_down(
    state: &mut ScalingState,
    ctx: &mut Steering<'_>,
    velocity: &mut Vec2,
    remaining: u32,
    mut targets: Vec<Entity>,
) -> ScalingPhase {
    state.scale = (state.scale - SCALE_STEP).max(MIN_SCALE);

    let remaining = remaining.saturating_sub(1);
    if remaining == 0 {
        return finish(state, ctx);
    }

    targets.retain(|t| ctx.neighbors.get(*t).is_some());
    let (sum, count) = targets
        .iter()
        .filter_map(|t| ctx.neighbors.get(*t))
        .fold((Vec2::ZERO, 0usize), |(sum, n), target| (sum + target.position, n + 1));
    if count > 0 {
        let centroid = sum / count as f32;
        *velocity = -ctx.direction_to(centroid) * DOWN_SPEED;
    }

    ScalingPhase::ScalingDown { remaining, targets }
}
