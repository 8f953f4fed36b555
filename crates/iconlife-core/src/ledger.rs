//! Achievement Ledger
//!
//! Fixed table of dependency and complementary milestones. Entries only ever
//! go from not achieved to achieved; nothing in a run resets them.

use bevy_ecs::prelude::*;
use iconlife_events::{MilestoneKey, MilestoneSnapshot, NotificationSnapshot, Relation, ServiceKind};

use iconlife_events::ServiceKind::*;

/// Dependency milestones, as (key, description)
pub const DEPENDENCY_MILESTONES: [(MilestoneKey, &str); 8] = [
    (
        MilestoneKey::dependency(Compute, NetworkBoundary),
        "Compute runs inside a network boundary",
    ),
    (
        MilestoneKey::dependency(Function, IdentityRole),
        "Function has an identity role",
    ),
    (
        MilestoneKey::dependency(Database, NetworkBoundary),
        "Database runs inside a network boundary",
    ),
    (
        MilestoneKey::dependency(Router, Function),
        "Router connected to Function",
    ),
    (
        MilestoneKey::dependency(EdgeCache, Storage),
        "Edge cache connected to Storage",
    ),
    (
        MilestoneKey::dependency(BlockVolume, Compute),
        "Block volume attached to Compute",
    ),
    (
        MilestoneKey::dependency(ScalingController, Compute),
        "Scaling controller monitoring Compute",
    ),
    (
        MilestoneKey::dependency(KeyValueTable, Function),
        "Key-value table serving Function",
    ),
];

/// Complementary milestones, as (key, description)
pub const COMPLEMENTARY_MILESTONES: [(MilestoneKey, &str); 3] = [
    (
        MilestoneKey::complementary(Compute, BlockVolume),
        "Compute and block volume integration",
    ),
    (
        MilestoneKey::complementary(Function, KeyValueTable),
        "Function and key-value table integration",
    ),
    (
        MilestoneKey::complementary(Storage, EdgeCache),
        "Storage and edge cache integration",
    ),
];

/// The complementary pair formed by two kinds, in either order.
pub fn complementary_pair(a: ServiceKind, b: ServiceKind) -> Option<MilestoneKey> {
    COMPLEMENTARY_MILESTONES
        .iter()
        .map(|(key, _)| *key)
        .find(|key| key.pairs_unordered(a, b))
}

/// One ledger entry
#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub key: MilestoneKey,
    pub description: &'static str,
    pub achieved: bool,
    pub achieved_at: Option<u64>,
}

impl Milestone {
    fn new(key: MilestoneKey, description: &'static str) -> Self {
        Self {
            key,
            description,
            achieved: false,
            achieved_at: None,
        }
    }

    /// Notification text shown when the milestone fires.
    pub fn message(&self) -> String {
        format!("{} Achieved: {}", self.key.relation.label(), self.description)
    }

    pub fn to_snapshot(&self) -> MilestoneSnapshot {
        MilestoneSnapshot {
            key: self.key,
            label: self.key.label(),
            description: self.description.to_string(),
            achieved: self.achieved,
            achieved_at: self.achieved_at,
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct AchievementLedger {
    milestones: Vec<Milestone>,
}

impl Default for AchievementLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AchievementLedger {
    pub fn new() -> Self {
        let milestones = DEPENDENCY_MILESTONES
            .iter()
            .chain(COMPLEMENTARY_MILESTONES.iter())
            .map(|(key, description)| Milestone::new(*key, description))
            .collect();
        Self { milestones }
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn get(&self, key: &MilestoneKey) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.key == *key)
    }

    pub fn is_achieved(&self, key: &MilestoneKey) -> bool {
        self.get(key).is_some_and(|m| m.achieved)
    }

    /// Marks `key` achieved at `tick`. Returns true only the first time.
    pub fn mark(&mut self, key: &MilestoneKey, tick: u64) -> bool {
        match self.milestones.iter_mut().find(|m| m.key == *key) {
            Some(milestone) if !milestone.achieved => {
                milestone.achieved = true;
                milestone.achieved_at = Some(tick);
                true
            }
            _ => false,
        }
    }

    /// (achieved, total) for one relation type.
    pub fn progress(&self, relation: Relation) -> (usize, usize) {
        self.milestones
            .iter()
            .filter(|m| m.key.relation == relation)
            .fold((0, 0), |(achieved, total), m| (achieved + usize::from(m.achieved), total + 1))
    }

    pub fn dependency_rate(&self) -> f32 {
        rate(self.progress(Relation::Dependency))
    }

    pub fn complementary_rate(&self) -> f32 {
        rate(self.progress(Relation::Complementary))
    }

    pub fn total_rate(&self) -> f32 {
        let achieved = self.milestones.iter().filter(|m| m.achieved).count();
        rate((achieved, self.milestones.len()))
    }
}

fn rate((achieved, total): (usize, usize)) -> f32 {
    if total == 0 {
        0.0
    } else {
        achieved as f32 / total as f32
    }
}

/// Message waiting to be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub remaining: u32,
}

impl Notification {
    pub fn to_snapshot(&self) -> NotificationSnapshot {
        NotificationSnapshot {
            message: self.message.clone(),
            remaining: self.remaining,
        }
    }
}

/// Pending notifications, oldest first
#[derive(Resource, Debug, Clone, Default)]
pub struct NotificationQueue {
    pending: Vec<Notification>,
    duration: u32,
}

impl NotificationQueue {
    pub fn new(duration: u32) -> Self {
        Self {
            pending: Vec::new(),
            duration,
        }
    }

    /// Queues `message` unless an identical one is still showing.
    pub fn push(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        if self.pending.iter().any(|n| n.message == message) {
            return false;
        }
        self.pending.push(Notification {
            message,
            remaining: self.duration,
        });
        true
    }

    /// Counts every notification down one tick and drops expired ones.
    pub fn age(&mut self) {
        for notification in &mut self.pending {
            notification.remaining = notification.remaining.saturating_sub(1);
        }
        self.pending.retain(|n| n.remaining > 0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_table() {
        let ledger = AchievementLedger::new();
        assert_eq!(ledger.milestones().len(), 11);
        assert_eq!(ledger.progress(Relation::Dependency), (0, 8));
        assert_eq!(ledger.progress(Relation::Complementary), (0, 3));
        assert_eq!(ledger.total_rate(), 0.0);

        let router = MilestoneKey::dependency(Router, Function);
        assert_eq!(router.label(), "Router-Function");
        assert_eq!(ledger.get(&router).unwrap().description, "Router connected to Function");
    }

    #[test]
    fn test_every_dependency_has_a_milestone() {
        let ledger = AchievementLedger::new();
        for &kind in ServiceKind::all() {
            for &required in crate::components::dependency_kinds(kind) {
                assert!(ledger.get(&MilestoneKey::dependency(kind, required)).is_some());
            }
        }
    }

    #[test]
    fn test_mark_is_monotonic() {
        let mut ledger = AchievementLedger::new();
        let key = MilestoneKey::complementary(Storage, EdgeCache);
        assert!(ledger.mark(&key, 10));
        assert!(!ledger.mark(&key, 20));
        let milestone = ledger.get(&key).unwrap();
        assert!(milestone.achieved);
        assert_eq!(milestone.achieved_at, Some(10));
        assert!((ledger.complementary_rate() - 1.0 / 3.0).abs() < 1e-6);
        assert!((ledger.total_rate() - 1.0 / 11.0).abs() < 1e-6);
        assert_eq!(
            milestone.message(),
            "Complementary Relation Achieved: Storage and edge cache integration"
        );
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let mut ledger = AchievementLedger::new();
        let key = MilestoneKey::dependency(Storage, Compute);
        assert!(!ledger.mark(&key, 1));
        assert!(!ledger.is_achieved(&key));
    }

    #[test]
    fn test_complementary_pair_lookup() {
        assert_eq!(
            complementary_pair(BlockVolume, Compute),
            Some(MilestoneKey::complementary(Compute, BlockVolume))
        );
        assert_eq!(complementary_pair(Router, Function), None);
    }

    #[test]
    fn test_notifications_dedup_and_expire() {
        let mut queue = NotificationQueue::new(2);
        assert!(queue.push("Dependency Achieved: x"));
        assert!(!queue.push("Dependency Achieved: x"));
        assert!(queue.push("Dependency Achieved: y"));
        assert_eq!(queue.len(), 2);

        queue.age();
        assert_eq!(queue.iter().next().unwrap().remaining, 1);
        queue.age();
        assert!(queue.is_empty());
        assert!(queue.push("Dependency Achieved: x"));
    }
}
