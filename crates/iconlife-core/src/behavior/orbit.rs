//! Orbiting kinds
//!
//! Databases circle the nearest network boundary (or the arena centre when
//! there is none); identity roles circle the arena centre. The orbit centre
//! eases toward its anchor, so the path drifts when the anchor moves.

use iconlife_events::{ServiceKind, Vec2};
use rand::rngs::SmallRng;
use rand::Rng;
use std::f32::consts::TAU;

use super::Steering;

/// Fraction of the gap to the anchor closed per tick
pub const CENTER_EASING: f32 = 0.01;
/// Velocity gain toward the point on the circle
pub const ORBIT_GAIN: f32 = 0.1;

pub const DATABASE_MAX_SPEED: f32 = 2.0;
pub const BACKUP_CHANCE: f64 = 0.005;
pub const BACKUP_TICKS: u32 = 120;
pub const BACKUP_DAMPING: f32 = 0.5;

pub const IDENTITY_MAX_SPEED: f32 = 1.5;
pub const IDENTITY_LEASH: f32 = 200.0;
pub const IDENTITY_CORRECTION: f32 = 0.3;

/// Circular path around a drifting centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub center: Vec2,
    pub angle: f32,
    pub radius: f32,
    /// Radians per tick; the sign fixes the direction of travel
    pub angular_speed: f32,
}

impl Orbit {
    fn random(center: Vec2, rng: &mut SmallRng, radius: (f32, f32), speed: (f32, f32)) -> Self {
        let magnitude = rng.gen_range(speed.0..=speed.1);
        Self {
            center,
            angle: rng.gen_range(0.0..TAU),
            radius: rng.gen_range(radius.0..=radius.1),
            angular_speed: if rng.gen_bool(0.5) { magnitude } else { -magnitude },
        }
    }

    /// Database orbit: radius 50-100, 0.01-0.02 rad per tick.
    pub fn database(center: Vec2, rng: &mut SmallRng) -> Self {
        Self::random(center, rng, (50.0, 100.0), (0.01, 0.02))
    }

    /// Identity role orbit: radius 30-80, 0.005-0.01 rad per tick.
    pub fn identity(center: Vec2, rng: &mut SmallRng) -> Self {
        Self::random(center, rng, (30.0, 80.0), (0.005, 0.01))
    }

    /// Eases the centre toward `anchor`, advances the angle and returns the
    /// point to head for.
    pub fn advance(&mut self, anchor: Vec2) -> Vec2 {
        self.center = self.center.lerp(anchor, CENTER_EASING);
        self.angle = (self.angle + self.angular_speed).rem_euclid(TAU);
        self.point()
    }

    pub fn point(&self) -> Vec2 {
        self.center + Vec2::from_angle(self.angle) * self.radius
    }

    /// Velocity toward the current orbit point.
    pub fn velocity_from(&self, position: Vec2, max_speed: f32) -> Option<Vec2> {
        let offset = self.point() - position;
        let distance = offset.length();
        offset
            .try_normalize()
            .map(|dir| dir * (distance * ORBIT_GAIN).min(max_speed))
    }
}

/// Database orbit plus the backup pause
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseState {
    pub orbit: Orbit,
    /// Ticks left in backup; `None` while orbiting
    pub backup: Option<u32>,
}

impl DatabaseState {
    pub fn new(position: Vec2, rng: &mut SmallRng) -> Self {
        Self {
            orbit: Orbit::database(position, rng),
            backup: None,
        }
    }

    pub fn tag(&self) -> &'static str {
        if self.backup.is_some() {
            "backup"
        } else {
            "orbiting"
        }
    }
}

pub fn database(state: &mut DatabaseState, ctx: &mut Steering<'_>, velocity: &mut Vec2) {
    if let Some(remaining) = state.backup {
        *velocity *= BACKUP_DAMPING;
        state.backup = remaining.checked_sub(1).filter(|r| *r > 0);
        return;
    }
    if ctx.chance(BACKUP_CHANCE) {
        tracing::debug!(agent = ?ctx.entity, "database backup started");
        state.backup = Some(BACKUP_TICKS);
        *velocity *= BACKUP_DAMPING;
        return;
    }

    let anchor = ctx
        .nearest(ServiceKind::NetworkBoundary)
        .map(|(boundary, _)| boundary.position)
        .unwrap_or_else(|| ctx.arena.center());
    state.orbit.advance(anchor);
    if let Some(v) = state.orbit.velocity_from(ctx.position, DATABASE_MAX_SPEED) {
        *velocity = v;
    }
}

pub fn identity_role(orbit: &mut Orbit, ctx: &mut Steering<'_>, velocity: &mut Vec2) {
    let center = ctx.arena.center();
    orbit.advance(center);
    if let Some(v) = orbit.velocity_from(ctx.position, IDENTITY_MAX_SPEED) {
        *velocity = v;
    }
    if ctx.position.distance(center) > IDENTITY_LEASH {
        ctx.pull_toward(velocity, center, IDENTITY_CORRECTION);
    }
}
