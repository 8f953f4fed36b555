//! Agent Components
//!
//! Components for individual agents: kind, health, dependencies, flags.

use bevy_ecs::prelude::*;
use iconlife_events::ServiceKind;
use serde::{Deserialize, Serialize};

use crate::behavior::Behavior;
use crate::components::contact::{InteractionLink, OverlapTracker};
use crate::components::motion::{MaxVelocity, Position, Velocity};

/// Stable handle to a live agent.
///
/// Wraps the entity id, whose generation changes when a slot is reused, so a
/// handle to a removed agent never resolves to a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentHandle(pub Entity);

impl AgentHandle {
    pub fn entity(&self) -> Entity {
        self.0
    }

    /// 64-bit id used in events and snapshots.
    pub fn id(&self) -> u64 {
        self.0.to_bits()
    }
}

impl From<Entity> for AgentHandle {
    fn from(entity: Entity) -> Self {
        Self(entity)
    }
}

/// Service kind of an agent, fixed at spawn
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Kind(pub ServiceKind);

/// Health in `[0, max]`
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Adds `delta` and clamps into range.
    pub fn adjust(&mut self, delta: f32) {
        self.set(self.current + delta);
    }

    pub fn set(&mut self, value: f32) {
        self.current = if value.is_finite() {
            value.clamp(0.0, self.max)
        } else {
            0.0
        };
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn fraction(&self) -> f32 {
        self.current / self.max
    }
}

/// Kinds this agent needs nearby, and whether one was found this tick
#[derive(Component, Debug, Clone, PartialEq, Default)]
pub struct Dependencies {
    pub kinds: Vec<ServiceKind>,
    pub satisfied: bool,
}

impl Dependencies {
    pub fn for_kind(kind: ServiceKind) -> Self {
        let kinds = dependency_kinds(kind).to_vec();
        Self {
            satisfied: kinds.is_empty(),
            kinds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn requires(&self, kind: ServiceKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// Static dependency table. No kind depends on itself and there are no cycles
/// of length two.
pub fn dependency_kinds(kind: ServiceKind) -> &'static [ServiceKind] {
    match kind {
        ServiceKind::Compute => &[ServiceKind::NetworkBoundary],
        ServiceKind::Function => &[ServiceKind::IdentityRole],
        ServiceKind::Database => &[ServiceKind::NetworkBoundary],
        ServiceKind::Router => &[ServiceKind::Function],
        ServiceKind::EdgeCache => &[ServiceKind::Storage],
        ServiceKind::BlockVolume => &[ServiceKind::Compute],
        ServiceKind::ScalingController => &[ServiceKind::Compute],
        ServiceKind::KeyValueTable => &[ServiceKind::Function],
        ServiceKind::Storage | ServiceKind::NetworkBoundary | ServiceKind::IdentityRole => &[],
    }
}

/// Temporary full stop; the agent keeps its place until `remaining` runs out
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Halt {
    pub stopped: bool,
    pub remaining: u32,
}

impl Halt {
    pub fn start(&mut self, ticks: u32) {
        self.stopped = ticks > 0;
        self.remaining = ticks;
    }

    /// Counts one tick down. Returns true on the tick the halt ends.
    pub fn tick_down(&mut self) -> bool {
        if !self.stopped {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.stopped = false;
            return true;
        }
        false
    }
}

/// UI selection flag; at most one agent is selected
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selected(pub bool);

/// Everything an agent is spawned with
#[derive(Bundle)]
pub struct AgentBundle {
    pub kind: Kind,
    pub position: Position,
    pub velocity: Velocity,
    pub max_velocity: MaxVelocity,
    pub health: Health,
    pub dependencies: Dependencies,
    pub halt: Halt,
    pub selected: Selected,
    pub overlap: OverlapTracker,
    pub link: InteractionLink,
    pub behavior: Behavior,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps() {
        let mut health = Health::full(100.0);
        health.adjust(5.0);
        assert_eq!(health.current, 100.0);
        health.adjust(-150.0);
        assert_eq!(health.current, 0.0);
        assert!(health.is_dead());
        health.set(f32::NAN);
        assert_eq!(health.current, 0.0);
    }

    #[test]
    fn test_dependency_table_has_no_self_or_mutual_edges() {
        for &kind in ServiceKind::all() {
            for &required in dependency_kinds(kind) {
                assert_ne!(kind, required);
                assert!(!dependency_kinds(required).contains(&kind));
            }
        }
        assert!(Dependencies::for_kind(ServiceKind::Storage).is_empty());
        assert!(Dependencies::for_kind(ServiceKind::Storage).satisfied);
        assert!(Dependencies::for_kind(ServiceKind::Router).requires(ServiceKind::Function));
    }

    #[test]
    fn test_halt_counts_down() {
        let mut halt = Halt::default();
        assert!(!halt.tick_down());

        halt.start(2);
        assert!(halt.stopped);
        assert!(!halt.tick_down());
        assert!(halt.tick_down());
        assert!(!halt.stopped);
    }
}
