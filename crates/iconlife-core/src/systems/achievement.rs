//! Achievement Scan
//!
//! Marks milestones the first time their condition is seen and queues a
//! notification for each new one.

use bevy_ecs::prelude::*;
use iconlife_events::{MilestoneKey, ServiceKind, SimEvent, Vec2};

use crate::components::{InteractionLink, Kind, Position, SimClock};
use crate::config::Config;
use crate::events::TickEvents;
use crate::ledger::{AchievementLedger, NotificationQueue, COMPLEMENTARY_MILESTONES, DEPENDENCY_MILESTONES};

pub fn age_notifications(mut notifications: ResMut<NotificationQueue>) {
    notifications.age();
}

pub fn scan_achievements(
    config: Res<Config>,
    clock: Res<SimClock>,
    mut ledger: ResMut<AchievementLedger>,
    mut notifications: ResMut<NotificationQueue>,
    mut events: ResMut<TickEvents>,
    query: Query<(Entity, &Kind, &Position, &InteractionLink)>,
) {
    let agents: Vec<(Entity, ServiceKind, Vec2, Option<Entity>)> = query
        .iter()
        .map(|(entity, kind, position, link)| (entity, kind.0, position.0, link.partner))
        .collect();
    let kind_of = |entity: Entity| agents.iter().find(|(e, ..)| *e == entity).map(|(_, kind, ..)| *kind);

    let radius = config.ledger.milestone_radius;
    let mut observed: Vec<MilestoneKey> = Vec::new();

    for (key, _) in DEPENDENCY_MILESTONES.iter() {
        if ledger.is_achieved(key) {
            continue;
        }
        let near = agents.iter().filter(|(_, kind, ..)| *kind == key.first).any(|(a, _, pos_a, _)| {
            agents
                .iter()
                .any(|(b, kind, pos_b, _)| b != a && *kind == key.second && pos_a.distance(*pos_b) <= radius)
        });
        if near {
            observed.push(*key);
        }
    }

    for (key, _) in COMPLEMENTARY_MILESTONES.iter() {
        if ledger.is_achieved(key) {
            continue;
        }
        let linked = agents.iter().any(|(_, kind, _, partner)| {
            let partner_kind = partner.and_then(kind_of);
            matches!(partner_kind, Some(other) if key.pairs_unordered(*kind, other) && *kind != other)
        });
        if linked {
            observed.push(*key);
        }
    }

    for key in observed {
        if !ledger.mark(&key, clock.tick) {
            continue;
        }
        let Some(milestone) = ledger.get(&key) else {
            continue;
        };
        tracing::info!(tick = clock.tick, milestone = %key, "{}", milestone.message());
        notifications.push(milestone.message());
        events.push(SimEvent::MilestoneAchieved {
            tick: clock.tick,
            key,
            description: milestone.description.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::testing;
    use iconlife_events::{Relation, ServiceKind::*};

    fn scan_schedule() -> Schedule {
        let mut schedule = Schedule::default();
        schedule.add_systems((age_notifications, scan_achievements).chain());
        schedule
    }

    #[test]
    fn test_dependency_milestone_fires_once() {
        let mut world = testing::world(1);
        let router = testing::spawn(&mut world, Router, Vec2::new(100.0, 100.0), Vec2::ZERO);
        testing::spawn(&mut world, Function, Vec2::new(200.0, 100.0), Vec2::ZERO);
        let mut schedule = scan_schedule();
        schedule.run(&mut world);

        let key = MilestoneKey::dependency(Router, Function);
        assert!(world.resource::<AchievementLedger>().is_achieved(&key));
        let notifications: Vec<_> = world
            .resource::<NotificationQueue>()
            .iter()
            .map(|n| n.message.clone())
            .collect();
        assert_eq!(notifications, vec!["Dependency Achieved: Router connected to Function".to_string()]);

        // moving apart never un-fires, and nothing fires twice
        world.get_mut::<Position>(router).unwrap().0 = Vec2::new(500.0, 600.0);
        schedule.run(&mut world);
        assert!(world.resource::<AchievementLedger>().is_achieved(&key));
        let fired = world
            .resource::<TickEvents>()
            .iter()
            .filter(|e| matches!(e, SimEvent::MilestoneAchieved { .. }))
            .count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_unrelated_kinds_do_not_fire() {
        let mut world = testing::world(1);
        testing::spawn(&mut world, Storage, Vec2::new(100.0, 100.0), Vec2::ZERO);
        testing::spawn(&mut world, Compute, Vec2::new(200.0, 100.0), Vec2::ZERO);
        scan_schedule().run(&mut world);
        assert_eq!(world.resource::<AchievementLedger>().progress(Relation::Dependency), (0, 8));
    }

    #[test]
    fn test_complementary_milestone_needs_a_link() {
        let mut world = testing::world(1);
        let compute = testing::spawn(&mut world, Compute, Vec2::new(100.0, 100.0), Vec2::ZERO);
        let volume = testing::spawn(&mut world, BlockVolume, Vec2::new(500.0, 500.0), Vec2::ZERO);
        let mut schedule = scan_schedule();
        schedule.run(&mut world);

        let key = MilestoneKey::complementary(Compute, BlockVolume);
        assert!(!world.resource::<AchievementLedger>().is_achieved(&key));

        world.get_mut::<InteractionLink>(volume).unwrap().link(compute, 30);
        schedule.run(&mut world);
        let ledger = world.resource::<AchievementLedger>();
        assert!(ledger.is_achieved(&key));
        assert_eq!(ledger.get(&key).unwrap().achieved_at, Some(0));
        assert!(world
            .resource::<NotificationQueue>()
            .iter()
            .any(|n| n.message == "Complementary Relation Achieved: Compute and block volume integration"));
    }

    #[test]
    fn test_notifications_expire() {
        let mut world = testing::world(1);
        world.resource_mut::<NotificationQueue>().push("hello");
        let mut schedule = Schedule::default();
        schedule.add_systems(age_notifications);
        for _ in 0..179 {
            schedule.run(&mut world);
        }
        assert_eq!(world.resource::<NotificationQueue>().len(), 1);
        schedule.run(&mut world);
        assert!(world.resource::<NotificationQueue>().is_empty());
    }
}
