//! World Resources
//!
//! Arena geometry and the tick clock.

use bevy_ecs::prelude::*;
use iconlife_events::{ArenaSnapshot, Vec2};
use rand::Rng;

use crate::config::Config;

/// Distance kept from the arena edge when picking random points
pub const PLACEMENT_MARGIN: f32 = 50.0;

/// Rectangular arena. Icon centres are kept at least `radius` from each edge,
/// so a whole icon always stays visible.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub radius: f32,
}

impl Arena {
    /// The radius is capped at half the shorter side, so even an icon that
    /// does not fit leaves a (degenerate) range for its centre.
    pub fn new(width: f32, height: f32, icon_size: f32) -> Self {
        let radius = (icon_size / 2.0).min(width.min(height) / 2.0).max(0.0);
        Self {
            width,
            height,
            radius,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.arena.width, config.arena.height, config.arena.icon_size)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Lowest allowed icon centre.
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.radius, self.radius)
    }

    /// Highest allowed icon centre.
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.width - self.radius, self.height - self.radius)
    }

    pub fn clamp(&self, point: Vec2) -> Vec2 {
        if !point.is_finite() {
            return self.center();
        }
        let (min, max) = (self.min(), self.max());
        Vec2::new(point.x.max(min.x).min(max.x), point.y.max(min.y).min(max.y))
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// Shortest distance from `point` to any of the four walls.
    pub fn distance_to_edge(&self, point: Vec2) -> f32 {
        point
            .x
            .min(self.width - point.x)
            .min(point.y)
            .min(self.height - point.y)
    }

    /// Uniform point at least `margin` away from every edge.
    pub fn random_point(&self, rng: &mut impl Rng, margin: f32) -> Vec2 {
        let margin_x = margin.min(self.width / 2.0);
        let margin_y = margin.min(self.height / 2.0);
        Vec2::new(
            random_between(rng, margin_x, self.width - margin_x),
            random_between(rng, margin_y, self.height - margin_y),
        )
    }

    /// Random point inside quadrant `0..4` (row-major: top-left, top-right,
    /// bottom-left, bottom-right), `margin` away from its borders.
    pub fn random_point_in_quadrant(&self, rng: &mut impl Rng, quadrant: usize, margin: f32) -> Vec2 {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        let origin = Vec2::new(
            if quadrant % 2 == 1 { half_w } else { 0.0 },
            if quadrant >= 2 { half_h } else { 0.0 },
        );
        let margin_x = margin.min(half_w / 2.0);
        let margin_y = margin.min(half_h / 2.0);
        origin
            + Vec2::new(
                random_between(rng, margin_x, half_w - margin_x),
                random_between(rng, margin_y, half_h - margin_y),
            )
    }

    /// Quadrant index of a point, matching [`Arena::random_point_in_quadrant`].
    pub fn quadrant_of(&self, point: Vec2) -> usize {
        let right = usize::from(point.x >= self.width / 2.0);
        let bottom = usize::from(point.y >= self.height / 2.0);
        bottom * 2 + right
    }

    pub fn to_snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot {
            width: self.width,
            height: self.height,
            icon_size: self.radius * 2.0,
        }
    }
}

fn random_between(rng: &mut impl Rng, low: f32, high: f32) -> f32 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

/// Monotonic tick counter
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimClock {
    pub tick: u64,
}

impl SimClock {
    pub fn advance(&mut self) {
        self.tick += 1;
    }
}
