//! Stateless drift policies
//!
//! Compute, Storage, BlockVolume, NetworkBoundary and KeyValueTable keep no
//! state beyond what the agent already owns.

use iconlife_events::{ServiceKind, Vec2, VecExt};
use rand::Rng;
use std::f32::consts::FRAC_PI_2;

use super::{random_unit, Steering};
use crate::components::Halt;

/// Compute: heading change chance per tick
pub const COMPUTE_TURN_CHANCE: f64 = 0.02;
pub const COMPUTE_STRONG_PULL: f32 = 0.15;
pub const COMPUTE_WEAK_PULL: f32 = 0.08;
pub const COMPUTE_FAR: f32 = 300.0;
pub const COMPUTE_NEAR: f32 = 100.0;

pub const STORAGE_MAX_SPEED: f32 = 1.0;
pub const STORAGE_JITTER_CHANCE: f64 = 0.1;
pub const STORAGE_JITTER: f32 = 0.5;
pub const STORAGE_HALT_CHANCE: f64 = 0.01;

pub const BLOCK_MAX_SPEED: f32 = 1.2;
pub const BLOCK_PULL_CAP: f32 = 0.2;
pub const BLOCK_DRAFT_RANGE: f32 = 100.0;
/// Share of the compute velocity blended in while drafting
pub const BLOCK_DRAFT_BLEND: f32 = 0.2;

pub const BOUNDARY_MAX_SPEED: f32 = 0.8;
pub const BOUNDARY_SPIN: f32 = 0.02;
pub const BOUNDARY_CENTER_PULL: f32 = 0.02;
pub const BOUNDARY_CENTER_RANGE: f32 = 300.0;
pub const BOUNDARY_MIN_DRIFT: f32 = 0.4;

pub const KV_TURN_CHANCE: f64 = 0.15;
pub const KV_SPEED_CHANGE_CHANCE: f64 = 0.05;
pub const KV_EDGE_RANGE: f32 = 100.0;
pub const KV_EDGE_PULL: f32 = 0.05;
pub const KV_MIN_SPEED: f32 = 0.3;

/// Mostly straight cruising, pulled toward the nearest network boundary.
pub fn compute(ctx: &mut Steering<'_>, velocity: &mut Vec2) {
    if ctx.chance(COMPUTE_TURN_CHANCE) {
        let speed = velocity.length();
        let speed = if speed < 0.5 {
            ctx.rng.gen_range(1.0..=2.0)
        } else {
            speed
        };
        *velocity = random_unit(ctx.rng) * speed;
    }

    if let Some((boundary, distance)) = ctx.nearest(ServiceKind::NetworkBoundary) {
        let strength = if distance > COMPUTE_FAR {
            COMPUTE_STRONG_PULL
        } else if distance > COMPUTE_NEAR {
            COMPUTE_WEAK_PULL
        } else {
            0.0
        };
        if strength > 0.0 {
            ctx.pull_toward(velocity, boundary.position, strength);
        }
    }
}

/// Slow drift with small wobbles and the occasional rest.
pub fn storage(ctx: &mut Steering<'_>, velocity: &mut Vec2, halt: &mut Halt) {
    if halt.stopped {
        return;
    }

    if ctx.chance(STORAGE_HALT_CHANCE) {
        let ticks = ctx.rng.gen_range(30..=90);
        halt.start(ticks);
        *velocity = Vec2::ZERO;
        tracing::debug!(agent = ?ctx.entity, ticks, "storage paused");
        return;
    }

    if ctx.chance(STORAGE_JITTER_CHANCE) {
        let angle = ctx.rng.gen_range(-STORAGE_JITTER..=STORAGE_JITTER);
        *velocity = velocity.rotated(angle);
    }

    if velocity.length() < 0.1 {
        *velocity = ctx.random_velocity(0.3, STORAGE_MAX_SPEED);
    }
    *velocity = velocity.clamp_length_max(STORAGE_MAX_SPEED);
}

/// Seeks the nearest compute node and drafts behind it once close.
pub fn block_volume(ctx: &mut Steering<'_>, velocity: &mut Vec2) {
    if let Some((compute, distance)) = ctx.nearest(ServiceKind::Compute) {
        let strength = if distance > 0.0 {
            (20.0 / distance).min(BLOCK_PULL_CAP)
        } else {
            BLOCK_PULL_CAP
        };
        ctx.pull_toward(velocity, compute.position, strength);

        if distance < BLOCK_DRAFT_RANGE {
            *velocity = velocity.lerp(compute.velocity, BLOCK_DRAFT_BLEND);
        }
    }
    *velocity = velocity.clamp_length_max(BLOCK_MAX_SPEED);
}

/// Fixed-chirality spin: either `+BOUNDARY_SPIN` or `-BOUNDARY_SPIN`.
pub fn random_spin(rng: &mut impl Rng) -> f32 {
    if rng.gen_bool(0.5) {
        BOUNDARY_SPIN
    } else {
        -BOUNDARY_SPIN
    }
}

/// Slow circular drift that stays roughly central.
pub fn network_boundary(ctx: &mut Steering<'_>, velocity: &mut Vec2, spin: f32) {
    if velocity.length() < BOUNDARY_MIN_DRIFT / 2.0 {
        *velocity = random_unit(ctx.rng) * BOUNDARY_MIN_DRIFT;
    }
    *velocity = velocity.rotated(spin);

    let center = ctx.arena.center();
    if ctx.position.distance(center) > BOUNDARY_CENTER_RANGE {
        ctx.pull_toward(velocity, center, BOUNDARY_CENTER_PULL);
    }
    *velocity = velocity.clamp_length_max(BOUNDARY_MAX_SPEED);
}

/// Jittery random walk that shies away from the walls.
pub fn key_value_table(ctx: &mut Steering<'_>, velocity: &mut Vec2) {
    if ctx.chance(KV_TURN_CHANCE) {
        let angle = ctx.rng.gen_range(-FRAC_PI_2..=FRAC_PI_2);
        *velocity = velocity.rotated(angle);
    }
    if ctx.chance(KV_SPEED_CHANGE_CHANCE) {
        *velocity *= ctx.rng.gen_range(0.5..=2.0);
    }

    if ctx.arena.distance_to_edge(ctx.position) < KV_EDGE_RANGE {
        let center = ctx.arena.center();
        ctx.pull_toward(velocity, center, KV_EDGE_PULL);
    }

    let speed = velocity.length();
    if speed < KV_MIN_SPEED {
        *velocity = match velocity.try_normalize() {
            Some(heading) => heading * KV_MIN_SPEED,
            None => random_unit(ctx.rng) * KV_MIN_SPEED,
        };
    }
}
