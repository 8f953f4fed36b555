//! Dependency Health
//!
//! Agents with dependencies lose health while none of the kinds they need is
//! nearby and slowly recover once one is. Agents that reach zero health are
//! pruned at the end of the tick.

use bevy_ecs::prelude::*;
use iconlife_events::SimEvent;

use crate::components::{AgentHandle, Dependencies, Health, InteractionLink, Kind, OverlapTracker, Position, SimClock};
use crate::config::Config;
use crate::events::TickEvents;

pub fn update_dependency_health(
    config: Res<Config>,
    mut query: Query<(Entity, &Kind, &Position, &mut Dependencies, &mut Health)>,
) {
    let radius = config.health.dependency_radius;
    let agents: Vec<_> = query
        .iter()
        .map(|(entity, kind, position, ..)| (entity, kind.0, position.0))
        .collect();

    for (entity, kind, position, mut dependencies, mut health) in query.iter_mut() {
        if dependencies.is_empty() {
            dependencies.satisfied = true;
            continue;
        }
        let satisfied = agents.iter().any(|(other, other_kind, other_position)| {
            *other != entity
                && dependencies.requires(*other_kind)
                && position.0.distance(*other_position) <= radius
        });
        dependencies.satisfied = satisfied;
        if satisfied {
            health.adjust(config.health.recovery_rate);
        } else {
            health.adjust(-config.decay_rate_for(kind.0));
        }
    }
}

/// Despawns agents with no health left and drops every reference other
/// agents hold to them.
pub fn prune_dead(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut events: ResMut<TickEvents>,
    dead: Query<(Entity, &Kind, &Health)>,
    mut trackers: Query<(&mut OverlapTracker, &mut InteractionLink)>,
) {
    let mut removed: Vec<(Entity, &Kind)> = dead
        .iter()
        .filter(|(_, _, health)| health.is_dead())
        .map(|(entity, kind, _)| (entity, kind))
        .collect();
    removed.sort_by_key(|(entity, _)| *entity);

    for (entity, kind) in removed {
        tracing::debug!(agent = ?entity, kind = %kind.0, "agent died");
        events.push(SimEvent::Died {
            tick: clock.tick,
            agent: AgentHandle(entity).id(),
            kind: kind.0,
        });
        for (mut tracker, mut link) in trackers.iter_mut() {
            tracker.forget(entity);
            link.forget(entity);
        }
        commands.entity(entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::testing;
    use iconlife_events::{ServiceKind, Vec2};

    fn health_schedule() -> Schedule {
        let mut schedule = Schedule::default();
        schedule.add_systems((update_dependency_health, prune_dead).chain());
        schedule
    }

    #[test]
    fn test_unmet_dependency_decays() {
        let mut world = testing::world(1);
        let compute = testing::spawn(&mut world, ServiceKind::Compute, Vec2::new(100.0, 100.0), Vec2::ZERO);
        let mut schedule = health_schedule();
        let mut last = 100.0;
        for _ in 0..50 {
            schedule.run(&mut world);
            let health = world.get::<Health>(compute).unwrap().current;
            assert!(health < last);
            last = health;
        }
        assert!(!world.get::<Dependencies>(compute).unwrap().satisfied);
        assert!((last - 95.0).abs() < 1e-3);
    }

    #[test]
    fn test_met_dependency_recovers() {
        let mut world = testing::world(1);
        let compute = testing::spawn(&mut world, ServiceKind::Compute, Vec2::new(100.0, 100.0), Vec2::ZERO);
        testing::spawn(&mut world, ServiceKind::NetworkBoundary, Vec2::new(200.0, 100.0), Vec2::ZERO);
        world.get_mut::<Health>(compute).unwrap().current = 50.0;
        health_schedule().run(&mut world);
        assert!(world.get::<Dependencies>(compute).unwrap().satisfied);
        assert!((world.get::<Health>(compute).unwrap().current - 50.05).abs() < 1e-4);
    }

    #[test]
    fn test_no_dependencies_no_decay() {
        let mut world = testing::world(1);
        let storage = testing::spawn(&mut world, ServiceKind::Storage, Vec2::new(100.0, 100.0), Vec2::ZERO);
        world.get_mut::<Health>(storage).unwrap().current = 40.0;
        health_schedule().run(&mut world);
        assert_eq!(world.get::<Health>(storage).unwrap().current, 40.0);
        assert!(world.get::<Dependencies>(storage).unwrap().satisfied);
    }

    #[test]
    fn test_dead_agents_are_pruned_and_forgotten() {
        let mut world = testing::world(1);
        let doomed = testing::spawn(&mut world, ServiceKind::Router, Vec2::new(100.0, 100.0), Vec2::ZERO);
        let witness = testing::spawn(&mut world, ServiceKind::Storage, Vec2::new(120.0, 100.0), Vec2::ZERO);
        world.get_mut::<Health>(doomed).unwrap().current = 0.05;
        world.get_mut::<InteractionLink>(witness).unwrap().link(doomed, 30);
        world.get_mut::<OverlapTracker>(witness).unwrap().record(doomed, 60);

        health_schedule().run(&mut world);

        assert!(world.get_entity(doomed).is_none());
        let link = world.get::<InteractionLink>(witness).unwrap();
        assert!(link.partner.is_none());
        assert_eq!(world.get::<OverlapTracker>(witness).unwrap().tracked(), 0);
        let events = world.resource_mut::<TickEvents>().drain();
        assert!(matches!(events.as_slice(), [SimEvent::Died { kind: ServiceKind::Router, .. }]));
    }
}
