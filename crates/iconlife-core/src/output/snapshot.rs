//! Snapshot Generation
//!
//! Builds [`WorldSnapshot`]s from the ECS world and writes them to disk.

use bevy_ecs::prelude::*;
use iconlife_events::{generate_snapshot_id, Relation, StatsSnapshot, WorldSnapshot};
use std::fs;
use std::path::{Path, PathBuf};

use crate::components::{Arena, SimClock};
use crate::ledger::{AchievementLedger, NotificationQueue};
use crate::simulation::collect_agents;

use super::OutputError;

/// Resource to track snapshot generation
#[derive(Resource, Debug, Clone)]
pub struct SnapshotGenerator {
    next_snapshot_id: u64,
    snapshot_interval: u64,
    last_snapshot_tick: Option<u64>,
}

impl SnapshotGenerator {
    pub fn new(snapshot_interval: u64) -> Self {
        Self {
            next_snapshot_id: 1,
            snapshot_interval,
            last_snapshot_tick: None,
        }
    }

    /// Tick 0 always gets a snapshot; after that every `snapshot_interval`
    /// ticks. An interval of 0 disables periodic snapshots.
    pub fn should_snapshot(&self, current_tick: u64) -> bool {
        if self.last_snapshot_tick == Some(current_tick) {
            return false;
        }
        current_tick == 0 || (self.snapshot_interval > 0 && current_tick % self.snapshot_interval == 0)
    }

    pub fn next_id(&mut self) -> String {
        let id = generate_snapshot_id(self.next_snapshot_id);
        self.next_snapshot_id += 1;
        id
    }

    pub fn mark_snapshot(&mut self, tick: u64) {
        self.last_snapshot_tick = Some(tick);
    }

    pub fn snapshot_count(&self) -> u64 {
        self.next_snapshot_id - 1
    }
}

impl Default for SnapshotGenerator {
    fn default() -> Self {
        Self::new(600)
    }
}

/// Generate a complete world snapshot
pub fn generate_snapshot(world: &mut World, triggered_by: &str) -> WorldSnapshot {
    let tick = world.resource::<SimClock>().tick;
    let arena = world.resource::<Arena>().to_snapshot();

    let snapshot_id = {
        let mut generator = world.get_resource_or_insert_with(SnapshotGenerator::default);
        generator.mark_snapshot(tick);
        generator.next_id()
    };

    let mut snapshot = WorldSnapshot::new(&snapshot_id, tick, triggered_by, arena);

    let agents = collect_agents(world);
    let mut stats = StatsSnapshot {
        population: agents.len(),
        ..StatsSnapshot::default()
    };
    for agent in &agents {
        *stats.kind_counts.entry(agent.kind.key().to_string()).or_insert(0) += 1;
    }
    snapshot.agents = agents.iter().map(|agent| agent.to_snapshot()).collect();

    let ledger = world.resource::<AchievementLedger>();
    snapshot.milestones = ledger.milestones().iter().map(|m| m.to_snapshot()).collect();
    (stats.dependency_achieved, stats.dependency_total) = ledger.progress(Relation::Dependency);
    (stats.complementary_achieved, stats.complementary_total) = ledger.progress(Relation::Complementary);
    snapshot.stats = stats;

    snapshot.notifications = world
        .resource::<NotificationQueue>()
        .iter()
        .map(|n| n.to_snapshot())
        .collect();

    snapshot
}

/// Write snapshot to file
pub fn write_snapshot(snapshot: &WorldSnapshot, path: impl AsRef<Path>) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    Ok(())
}

/// Write snapshot to `<dir>/snapshots/snap_<tick>.json`
pub fn write_snapshot_to_dir(snapshot: &WorldSnapshot, dir: impl AsRef<Path>) -> Result<PathBuf, OutputError> {
    let snapshots = dir.as_ref().join("snapshots");
    fs::create_dir_all(&snapshots)?;
    let path = snapshots.join(format!("snap_{:06}.json", snapshot.tick));
    write_snapshot(snapshot, &path)?;
    Ok(path)
}

/// Write current state (overwrites each time)
pub fn write_current_state(snapshot: &WorldSnapshot, dir: impl AsRef<Path>) -> Result<(), OutputError> {
    fs::create_dir_all(dir.as_ref())?;
    write_snapshot(snapshot, dir.as_ref().join("current_state.json"))
}
