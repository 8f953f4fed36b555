//! Event Types
//!
//! The per-tick event stream emitted by the simulation, and the keys used by
//! the achievement ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ServiceKind, Vec2};

/// Relation recorded by a milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// First kind needs the second nearby
    Dependency,
    /// Unordered pair with a mutual contact bonus
    Complementary,
}

impl Relation {
    pub fn label(&self) -> &'static str {
        match self {
            Relation::Dependency => "Dependency",
            Relation::Complementary => "Complementary Relation",
        }
    }
}

/// Ledger key: ordered kind pair plus relation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MilestoneKey {
    pub relation: Relation,
    pub first: ServiceKind,
    pub second: ServiceKind,
}

impl MilestoneKey {
    pub const fn dependency(dependent: ServiceKind, required: ServiceKind) -> Self {
        Self {
            relation: Relation::Dependency,
            first: dependent,
            second: required,
        }
    }

    pub const fn complementary(first: ServiceKind, second: ServiceKind) -> Self {
        Self {
            relation: Relation::Complementary,
            first,
            second,
        }
    }

    /// Key label such as `Router-Function`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.first.label(), self.second.label())
    }

    /// True when `a`/`b` name this pair in either order.
    pub fn pairs_unordered(&self, a: ServiceKind, b: ServiceKind) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

impl fmt::Display for MilestoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first.label(), self.second.label())
    }
}

/// Primary event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Spawned,
    Died,
    Removed,
    Connected,
    Stuck,
    Milestone,
}

impl EventType {
    /// Returns all event type variants.
    pub fn all() -> &'static [EventType] {
        &[
            EventType::Spawned,
            EventType::Died,
            EventType::Removed,
            EventType::Connected,
            EventType::Stuck,
            EventType::Milestone,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            EventType::Spawned => "spawned",
            EventType::Died => "died",
            EventType::Removed => "removed",
            EventType::Connected => "connected",
            EventType::Stuck => "stuck",
            EventType::Milestone => "milestone",
        }
    }
}

/// A single thing that happened during a tick.
///
/// Agent identifiers are the stable 64-bit handle bits, so a removed agent's
/// id is never reused by a later agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    Spawned {
        tick: u64,
        agent: u64,
        kind: ServiceKind,
        position: Vec2,
    },
    /// Health reached zero and the agent was pruned
    Died {
        tick: u64,
        agent: u64,
        kind: ServiceKind,
    },
    /// Removed on request of the host
    Removed {
        tick: u64,
        agent: u64,
        kind: ServiceKind,
    },
    /// A router reached the function it was heading for
    Connected {
        tick: u64,
        router: u64,
        function: u64,
    },
    /// Sustained overlap pushed an agent into the stuck state
    Stuck {
        tick: u64,
        agent: u64,
        other: u64,
    },
    MilestoneAchieved {
        tick: u64,
        key: MilestoneKey,
        description: String,
    },
}

impl SimEvent {
    pub fn tick(&self) -> u64 {
        match self {
            SimEvent::Spawned { tick, .. }
            | SimEvent::Died { tick, .. }
            | SimEvent::Removed { tick, .. }
            | SimEvent::Connected { tick, .. }
            | SimEvent::Stuck { tick, .. }
            | SimEvent::MilestoneAchieved { tick, .. } => *tick,
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            SimEvent::Spawned { .. } => EventType::Spawned,
            SimEvent::Died { .. } => EventType::Died,
            SimEvent::Removed { .. } => EventType::Removed,
            SimEvent::Connected { .. } => EventType::Connected,
            SimEvent::Stuck { .. } => EventType::Stuck,
            SimEvent::MilestoneAchieved { .. } => EventType::Milestone,
        }
    }
}
