//! Statistics Output
//!
//! Collects per-tick population and event counts for a run summary.

use iconlife_events::{EventType, SimEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::OutputError;

/// Summary of a tick for history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    pub tick: u64,
    pub population: usize,
    pub event_count: usize,
}

/// Overall simulation statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub total_ticks: u64,
    pub total_events: usize,
    pub events_by_type: BTreeMap<String, usize>,
    pub average_events_per_tick: f64,
    pub deaths: usize,
    pub contacts: usize,
    pub stuck_episodes: usize,
    pub milestones_achieved: usize,
    /// Tick of each milestone, keyed by milestone label
    pub milestone_ticks: BTreeMap<String, u64>,
    pub peak_population: usize,
    pub final_population: usize,
    pub final_kind_counts: BTreeMap<String, usize>,
    pub tick_history: Vec<TickSummary>,
}

/// Accumulates statistics during a run
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    pub total_events: usize,
    pub events_by_type: BTreeMap<String, usize>,
    pub milestone_ticks: BTreeMap<String, u64>,
    pub peak_population: usize,
    pub tick_history: Vec<TickSummary>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the events and population of one tick
    pub fn record_tick(&mut self, tick: u64, population: usize, events: &[SimEvent]) {
        for event in events {
            self.total_events += 1;
            *self
                .events_by_type
                .entry(event.event_type().key().to_string())
                .or_insert(0) += 1;
            if let SimEvent::MilestoneAchieved { tick, key, .. } = event {
                self.milestone_ticks.entry(key.label()).or_insert(*tick);
            }
        }
        self.peak_population = self.peak_population.max(population);
        self.tick_history.push(TickSummary {
            tick,
            population,
            event_count: events.len(),
        });
    }

    fn count(&self, event_type: EventType) -> usize {
        self.events_by_type.get(event_type.key()).copied().unwrap_or(0)
    }

    /// Generate final statistics
    pub fn generate_stats(&self, total_ticks: u64, final_kind_counts: BTreeMap<String, usize>) -> SimulationStats {
        let average_events_per_tick = if total_ticks > 0 {
            self.total_events as f64 / total_ticks as f64
        } else {
            0.0
        };

        SimulationStats {
            total_ticks,
            total_events: self.total_events,
            events_by_type: self.events_by_type.clone(),
            average_events_per_tick,
            deaths: self.count(EventType::Died),
            contacts: self.count(EventType::Connected),
            stuck_episodes: self.count(EventType::Stuck),
            milestones_achieved: self.count(EventType::Milestone),
            milestone_ticks: self.milestone_ticks.clone(),
            peak_population: self.peak_population,
            final_population: final_kind_counts.values().sum(),
            final_kind_counts,
            tick_history: self.tick_history.clone(),
        }
    }
}

/// Write statistics as pretty JSON, creating the parent directory
pub fn write_stats(stats: &SimulationStats, path: impl AsRef<Path>) -> Result<(), OutputError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(stats)?;
    fs::write(path, json)?;
    Ok(())
}
