//! Contact Components
//!
//! Per-agent bookkeeping for sustained overlaps and the most recent
//! interaction partner. Both key other agents by entity, so entries for a
//! removed agent can be dropped with [`OverlapTracker::forget`] and
//! [`InteractionLink::forget`].

use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Consecutive deep-overlap frames per partner
#[derive(Component, Debug, Clone, Default)]
pub struct OverlapTracker {
    frames: HashMap<Entity, u32>,
    pub stuck: bool,
}

impl OverlapTracker {
    /// Records one more frame of deep overlap with `other`.
    ///
    /// The first frame counts as zero. Returns true when this frame pushed
    /// the agent into the stuck state.
    pub fn record(&mut self, other: Entity, stuck_threshold: u32) -> bool {
        let frames = self
            .frames
            .entry(other)
            .and_modify(|f| *f += 1)
            .or_insert(0);
        if *frames > stuck_threshold && !self.stuck {
            self.stuck = true;
            return true;
        }
        false
    }

    /// Ends tracking of `other`; clears `stuck` once nothing is tracked.
    pub fn release(&mut self, other: Entity) {
        self.frames.remove(&other);
        if self.frames.is_empty() {
            self.stuck = false;
        }
    }

    pub fn forget(&mut self, other: Entity) {
        if self.frames.contains_key(&other) {
            self.release(other);
        }
    }

    pub fn frames_with(&self, other: Entity) -> Option<u32> {
        self.frames.get(&other).copied()
    }

    pub fn tracked(&self) -> usize {
        self.frames.len()
    }
}

/// Most recent interaction partner, plus the complementary contacts that are
/// currently boosting this agent.
///
/// The partner is kept after the timer runs out; the timer only says whether
/// the link is still worth drawing.
#[derive(Component, Debug, Clone, Default)]
pub struct InteractionLink {
    pub partner: Option<Entity>,
    pub timer: u32,
    boosters: Vec<Entity>,
    /// Speed before the first of the ongoing boosts
    base_speed: f32,
}

impl InteractionLink {
    pub fn link(&mut self, partner: Entity, duration: u32) {
        self.partner = Some(partner);
        self.timer = duration;
    }

    pub fn tick_down(&mut self) {
        self.timer = self.timer.saturating_sub(1);
    }

    pub fn is_visible(&self) -> bool {
        self.partner.is_some() && self.timer > 0
    }

    pub fn is_linked_to(&self, other: Entity) -> bool {
        self.partner == Some(other)
    }

    /// Registers a boosting contact with `partner`. The base speed is taken
    /// only when no other boost is ongoing.
    pub fn begin_boost(&mut self, partner: Entity, speed: f32) {
        if self.boosters.is_empty() {
            self.base_speed = speed;
        }
        if !self.boosters.contains(&partner) {
            self.boosters.push(partner);
        }
    }

    pub fn end_boost(&mut self, partner: Entity) {
        self.boosters.retain(|&e| e != partner);
    }

    pub fn is_boosted_by(&self, partner: Entity) -> bool {
        self.boosters.contains(&partner)
    }

    pub fn forget(&mut self, other: Entity) {
        self.end_boost(other);
        if self.partner == Some(other) {
            self.partner = None;
            self.timer = 0;
        }
    }

    /// Upper bound for boosted speed: twice the speed before boosting began.
    pub fn boost_cap(&self) -> f32 {
        self.base_speed * 2.0
    }
}
