//! Function runtime
//!
//! Idle -> Bursting -> Cooldown -> Idle, plus an Active phase entered near a
//! router. Uses the short burst tuning: 10-20 tick bursts followed by a 30-60
//! tick cooldown.

use iconlife_events::{ServiceKind, Vec2};
use rand::Rng;

use super::{random_unit, Steering};

pub const IDLE_MAX_SPEED: f32 = 1.0;
pub const IDLE_RETARGET_CHANCE: f64 = 0.1;
pub const BURST_CHANCE: f64 = 0.03;
/// Chance that a burst heads for the nearest identity role
pub const BURST_AT_IDENTITY_CHANCE: f64 = 0.4;
pub const BURST_ARRIVAL: f32 = 5.0;
pub const ROUTER_RANGE: f32 = 100.0;
pub const ACTIVATE_CHANCE: f64 = 0.05;
pub const ACTIVE_TICKS: u32 = 120;
pub const ACTIVE_TURN_CHANCE: f64 = 0.2;
pub const ACTIVE_MAX_SPEED: f32 = 2.5;
pub const COOLDOWN_DAMPING: f32 = 0.9;
pub const IDENTITY_PULL: f32 = 0.05;
pub const IDENTITY_RANGE: f32 = 250.0;

/// Function state machine phase
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FunctionPhase {
    #[default]
    Idle,
    /// Invoked by a nearby router: faster, twitchier
    Active { remaining: u32 },
    Bursting { target: Vec2, speed: f32, remaining: u32 },
    Cooldown { remaining: u32 },
}

impl FunctionPhase {
    pub fn tag(&self) -> &'static str {
        match self {
            FunctionPhase::Idle => "idle",
            FunctionPhase::Active { .. } => "active",
            FunctionPhase::Bursting { .. } => "bursting",
            FunctionPhase::Cooldown { .. } => "cooldown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionState {
    pub phase: FunctionPhase,
}

pub fn steer(state: &mut FunctionState, ctx: &mut Steering<'_>, velocity: &mut Vec2) {
    state.phase = match std::mem::take(&mut state.phase) {
        FunctionPhase::Idle => idle(ctx, velocity),
        FunctionPhase::Active { remaining } => active(ctx, velocity, remaining),
        FunctionPhase::Bursting {
            target,
            speed,
            remaining,
        } => bursting(ctx, velocity, target, speed, remaining),
        FunctionPhase::Cooldown { remaining } => cooldown(ctx, velocity, remaining),
    };

    if !matches!(state.phase, FunctionPhase::Bursting { .. }) {
        if let Some((identity, distance)) = ctx.nearest(ServiceKind::IdentityRole) {
            if distance > IDENTITY_RANGE {
                ctx.pull_toward(velocity, identity.position, IDENTITY_PULL);
            }
        }
    }
}

fn idle(ctx: &mut Steering<'_>, velocity: &mut Vec2) -> FunctionPhase {
    if ctx.chance(IDLE_RETARGET_CHANCE) {
        *velocity = ctx.random_velocity(0.5, 1.0);
    }
    *velocity = velocity.clamp_length_max(IDLE_MAX_SPEED);

    if let Some((_, distance)) = ctx.nearest(ServiceKind::Router) {
        if distance < ROUTER_RANGE && ctx.chance(ACTIVATE_CHANCE) {
            return FunctionPhase::Active {
                remaining: ACTIVE_TICKS,
            };
        }
    }

    if ctx.chance(BURST_CHANCE) {
        return start_burst(ctx, velocity);
    }
    FunctionPhase::Idle
}

fn start_burst(ctx: &mut Steering<'_>, velocity: &mut Vec2) -> FunctionPhase {
    let identity = if ctx.chance(BURST_AT_IDENTITY_CHANCE) {
        ctx.nearest(ServiceKind::IdentityRole).map(|(n, _)| n.position)
    } else {
        None
    };
    let target = match identity {
        Some(position) => position,
        None => ctx.arena.random_point(ctx.rng, 50.0),
    };
    let speed = ctx.rng.gen_range(3.0..=5.0);
    let remaining = ctx.rng.gen_range(10..=20);
    *velocity = ctx.direction_to(target) * speed;
    FunctionPhase::Bursting {
        target,
        speed,
        remaining,
    }
}

fn active(ctx: &mut Steering<'_>, velocity: &mut Vec2, remaining: u32) -> FunctionPhase {
    if ctx.chance(ACTIVE_TURN_CHANCE) {
        *velocity = ctx.random_velocity(1.5, ACTIVE_MAX_SPEED);
    }
    *velocity = velocity.clamp_length_max(ACTIVE_MAX_SPEED);

    match remaining.saturating_sub(1) {
        0 => FunctionPhase::Idle,
        remaining => FunctionPhase::Active { remaining },
    }
}

fn bursting(
    ctx: &mut Steering<'_>,
    velocity: &mut Vec2,
    target: Vec2,
    speed: f32,
    remaining: u32,
) -> FunctionPhase {
    let remaining = remaining.saturating_sub(1);
    if ctx.position.distance(target) < BURST_ARRIVAL || remaining == 0 {
        return FunctionPhase::Cooldown {
            remaining: ctx.rng.gen_range(30..=60),
        };
    }
    *velocity = ctx.direction_to(target) * speed;
    FunctionPhase::Bursting {
        target,
        speed,
        remaining,
    }
}

fn cooldown(ctx: &mut Steering<'_>, velocity: &mut Vec2, remaining: u32) -> FunctionPhase {
    *velocity *= COOLDOWN_DAMPING;
    match remaining.saturating_sub(1) {
        0 => {
            let speed = ctx.rng.gen_range(0.3..=0.8);
            *velocity = random_unit(ctx.rng) * speed;
            FunctionPhase::Idle
        }
        remaining => FunctionPhase::Cooldown { remaining },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::testing::Bench;

    #[test]
    fn test_burst_runs_then_cools_down() {
        let mut bench = Bench::new(21);
        let me = bench.add(0, ServiceKind::Function, Vec2::new(100.0, 100.0));
        let mut state = FunctionState {
            phase: FunctionPhase::Bursting {
                target: Vec2::new(500.0, 100.0),
                speed: 4.0,
                remaining: 3,
            },
        };
        let mut velocity = Vec2::ZERO;

        let mut ctx = bench.steering(me, Vec2::new(100.0, 100.0));
        steer(&mut state, &mut ctx, &mut velocity);
        assert!((velocity.x - 4.0).abs() < 1e-4);
        assert_eq!(state.phase.tag(), "bursting");

        steer(&mut state, &mut ctx, &mut velocity);
        steer(&mut state, &mut ctx, &mut velocity);
        match state.phase {
            FunctionPhase::Cooldown { remaining } => assert!((30..=60).contains(&remaining)),
            ref other => panic!("expected cooldown, got {other:?}"),
        }
    }

    #[test]
    fn test_burst_ends_on_arrival() {
        let mut bench = Bench::new(22);
        let me = bench.add(0, ServiceKind::Function, Vec2::new(100.0, 100.0));
        let mut state = FunctionState {
            phase: FunctionPhase::Bursting {
                target: Vec2::new(102.0, 100.0),
                speed: 4.0,
                remaining: 15,
            },
        };
        let mut velocity = Vec2::new(4.0, 0.0);
        let mut ctx = bench.steering(me, Vec2::new(100.0, 100.0));
        steer(&mut state, &mut ctx, &mut velocity);
        assert_eq!(state.phase.tag(), "cooldown");
    }

    #[test]
    fn test_cooldown_damps_and_returns_to_idle() {
        let mut bench = Bench::new(23);
        let me = bench.add(0, ServiceKind::Function, Vec2::new(300.0, 300.0));
        let mut state = FunctionState {
            phase: FunctionPhase::Cooldown { remaining: 3 },
        };
        let mut velocity = Vec2::new(4.0, 0.0);
        let mut ctx = bench.steering(me, Vec2::new(300.0, 300.0));

        steer(&mut state, &mut ctx, &mut velocity);
        assert!((velocity.x - 3.6).abs() < 1e-4);
        steer(&mut state, &mut ctx, &mut velocity);
        assert!((velocity.x - 3.24).abs() < 1e-4);
        steer(&mut state, &mut ctx, &mut velocity);
        assert_eq!(state.phase, FunctionPhase::Idle);
        let speed = velocity.length();
        assert!((0.3 - 1e-4..=0.8 + 1e-4).contains(&speed));
    }

    #[test]
    fn test_idle_eventually_bursts() {
        let mut bench = Bench::new(24);
        let me = bench.add(0, ServiceKind::Function, Vec2::new(300.0, 300.0));
        let mut state = FunctionState::default();
        let mut velocity = Vec2::ZERO;
        let mut seen_burst = false;
        for _ in 0..2000 {
            let mut ctx = bench.steering(me, Vec2::new(300.0, 300.0));
            steer(&mut state, &mut ctx, &mut velocity);
            if let FunctionPhase::Bursting { speed, .. } = state.phase {
                assert!((3.0..=5.0).contains(&speed));
                seen_burst = true;
            } else {
                // cooldown starts from burst speed and only decays
                assert!(velocity.length() <= 5.0 + 1e-4);
            }
        }
        assert!(seen_burst);
    }

    #[test]
    fn test_router_nearby_activates_for_fixed_span() {
        let mut bench = Bench::new(25);
        let me = bench.add(0, ServiceKind::Function, Vec2::new(300.0, 300.0));
        bench.add(1, ServiceKind::Router, Vec2::new(360.0, 300.0));
        let mut state = FunctionState::default();
        let mut velocity = Vec2::ZERO;

        let mut activated = false;
        for _ in 0..2000 {
            let mut ctx = bench.steering(me, Vec2::new(300.0, 300.0));
            steer(&mut state, &mut ctx, &mut velocity);
            if state.phase == (FunctionPhase::Active { remaining: ACTIVE_TICKS }) {
                activated = true;
                break;
            }
        }
        assert!(activated);

        for step in 1..ACTIVE_TICKS {
            let mut ctx = bench.steering(me, Vec2::new(300.0, 300.0));
            steer(&mut state, &mut ctx, &mut velocity);
            assert_eq!(state.phase, FunctionPhase::Active { remaining: ACTIVE_TICKS - step });
            assert!(velocity.length() <= ACTIVE_MAX_SPEED + 1e-4);
        }
        let mut ctx = bench.steering(me, Vec2::new(300.0, 300.0));
        steer(&mut state, &mut ctx, &mut velocity);
        assert_eq!(state.phase, FunctionPhase::Idle);
        assert!(velocity.length() <= ACTIVE_MAX_SPEED + 1e-4);
    }
}
