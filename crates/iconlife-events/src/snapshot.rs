//! Snapshot Types
//!
//! Serialization structs for world snapshots and state output.
//!
//! A snapshot captures every per-agent accessor a presentation layer needs,
//! plus the ledger and notification queue, at a single tick.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{MilestoneKey, ServiceKind, Vec2};

/// Generates a snapshot ID with the given sequence number.
pub fn generate_snapshot_id(sequence: u64) -> String {
    format!("snap_{:06}", sequence)
}

/// Arena dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    pub width: f32,
    pub height: f32,
    pub icon_size: f32,
}

/// Agent state at snapshot time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: u64,
    pub kind: ServiceKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub health: f32,
    pub max_health: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ServiceKind>,
    pub satisfied: bool,
    pub stuck: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub stopped: bool,
    /// Behaviour-state tag, e.g. `patrolling` or `bursting`
    pub state: String,
    pub scale: f32,
    #[serde(default)]
    pub last_interaction: Option<u64>,
    #[serde(default)]
    pub interaction_timer: u32,
}

/// Ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneSnapshot {
    pub key: MilestoneKey,
    pub label: String,
    pub description: String,
    pub achieved: bool,
    #[serde(default)]
    pub achieved_at: Option<u64>,
}

/// Pending notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSnapshot {
    pub message: String,
    pub remaining: u32,
}

/// Population and achievement summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub population: usize,
    /// Live agents per kind, keyed by kind key
    pub kind_counts: BTreeMap<String, usize>,
    pub dependency_achieved: usize,
    pub dependency_total: usize,
    pub complementary_achieved: usize,
    pub complementary_total: usize,
}

impl StatsSnapshot {
    pub fn total_achieved(&self) -> usize {
        self.dependency_achieved + self.complementary_achieved
    }

    pub fn total_milestones(&self) -> usize {
        self.dependency_total + self.complementary_total
    }
}

/// Complete world snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub snapshot_id: String,
    pub tick: u64,
    pub triggered_by: String,
    pub arena: ArenaSnapshot,
    pub agents: Vec<AgentSnapshot>,
    pub milestones: Vec<MilestoneSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<NotificationSnapshot>,
    pub stats: StatsSnapshot,
}

impl WorldSnapshot {
    pub fn new(snapshot_id: &str, tick: u64, triggered_by: &str, arena: ArenaSnapshot) -> Self {
        Self {
            snapshot_id: snapshot_id.to_string(),
            tick,
            triggered_by: triggered_by.to_string(),
            arena,
            agents: Vec::new(),
            milestones: Vec::new(),
            notifications: Vec::new(),
            stats: StatsSnapshot::default(),
        }
    }

    /// Agents of a given kind.
    pub fn agents_of(&self, kind: ServiceKind) -> impl Iterator<Item = &AgentSnapshot> {
        self.agents.iter().filter(move |agent| agent.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_id_format() {
        assert_eq!(generate_snapshot_id(1), "snap_000001");
        assert_eq!(generate_snapshot_id(123456), "snap_123456");
    }

    #[test]
    fn test_stats_totals() {
        let stats = StatsSnapshot {
            population: 4,
            kind_counts: BTreeMap::new(),
            dependency_achieved: 2,
            dependency_total: 8,
            complementary_achieved: 1,
            complementary_total: 3,
        };
        assert_eq!(stats.total_achieved(), 3);
        assert_eq!(stats.total_milestones(), 11);
    }

    #[test]
    fn test_empty_notifications_are_omitted() {
        let arena = ArenaSnapshot {
            width: 600.0,
            height: 650.0,
            icon_size: 50.0,
        };
        let snapshot = WorldSnapshot::new("snap_000001", 0, "manual", arena);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("notifications"));
        assert!(json.contains("\"triggered_by\":\"manual\""));
    }
}
