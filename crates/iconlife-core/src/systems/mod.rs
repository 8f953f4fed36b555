//! ECS Systems
//!
//! One system per tick phase, run in a fixed order on a single thread:
//! clock, neighbourhood snapshot, behaviours, motion, overlap resolution,
//! interactions, dependency health, invariants, notifications, achievements,
//! and finally pruning of dead agents.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;

pub mod achievement;
pub mod health;
pub mod interaction;
pub mod motion;
pub mod overlap;
pub mod steering;

pub use achievement::{age_notifications, scan_achievements};
pub use health::{prune_dead, update_dependency_health};
pub use interaction::track_interactions;
pub use motion::{advance_clock, enforce_invariants, integrate_motion};
pub use overlap::resolve_overlaps;
pub use steering::{apply_behaviors, build_neighborhood};

/// The per-tick schedule. Random rolls follow entity order, so a fixed seed
/// and spawn sequence always replays the same run.
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            advance_clock,
            build_neighborhood,
            apply_behaviors,
            integrate_motion,
            resolve_overlaps,
            track_interactions,
            update_dependency_health,
            enforce_invariants,
            age_notifications,
            scan_achievements,
            prune_dead,
        )
            .chain(),
    );
    schedule
}

/// Sorted entity list for deterministic pair passes.
pub(crate) fn sorted<T>(mut items: Vec<(Entity, T)>) -> Vec<(Entity, T)> {
    items.sort_by_key(|(entity, _)| *entity);
    items
}

#[cfg(test)]
pub(crate) mod testing {
    //! World setup shared by the system tests.

    use bevy_ecs::prelude::*;
    use iconlife_events::{ServiceKind, Vec2};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use crate::behavior::{Behavior, Neighborhood, SteerOutbox};
    use crate::components::*;
    use crate::config::Config;
    use crate::events::TickEvents;
    use crate::ledger::{AchievementLedger, NotificationQueue};
    use crate::SimRng;

    /// World with every resource the systems read, and no agents.
    pub fn world(seed: u64) -> World {
        let config = Config::default();
        let mut world = World::new();
        world.insert_resource(Arena::from_config(&config));
        world.insert_resource(NotificationQueue::new(config.ledger.notification_duration));
        world.insert_resource(config);
        world.insert_resource(SimRng(SmallRng::seed_from_u64(seed)));
        world.insert_resource(SimClock::default());
        world.insert_resource(Neighborhood::new());
        world.insert_resource(SteerOutbox::default());
        world.insert_resource(TickEvents::new());
        world.insert_resource(AchievementLedger::new());
        world
    }

    pub fn spawn(world: &mut World, kind: ServiceKind, position: Vec2, velocity: Vec2) -> Entity {
        let arena = *world.resource::<Arena>();
        let max_velocity = world.resource::<Config>().max_velocity_for(kind);
        let max_health = world.resource::<Config>().health.max_health;
        let behavior = {
            let mut rng = world.resource_mut::<SimRng>();
            Behavior::initial(kind, position, &arena, &mut rng.0)
        };
        world
            .spawn(AgentBundle {
                kind: Kind(kind),
                position: Position(position),
                velocity: Velocity(velocity),
                max_velocity: MaxVelocity(max_velocity),
                health: Health::full(max_health),
                dependencies: Dependencies::for_kind(kind),
                halt: Halt::default(),
                selected: Selected::default(),
                overlap: OverlapTracker::default(),
                link: InteractionLink::default(),
                behavior,
            })
            .id()
    }
}
