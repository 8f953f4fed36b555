//! World Resources Setup

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::behavior::{Neighborhood, SteerOutbox};
use crate::components::{Arena, SimClock};
use crate::config::Config;
use crate::events::TickEvents;
use crate::ledger::{AchievementLedger, NotificationQueue};
use crate::output::SnapshotGenerator;
use crate::SimRng;

/// Fresh world holding every resource the tick schedule reads, and no agents.
pub fn create_world(config: Config, seed: u64) -> World {
    let mut world = World::new();
    world.insert_resource(Arena::from_config(&config));
    world.insert_resource(SimClock::default());
    world.insert_resource(SimRng(SmallRng::seed_from_u64(seed)));
    world.insert_resource(Neighborhood::new());
    world.insert_resource(SteerOutbox::default());
    world.insert_resource(TickEvents::new());
    world.insert_resource(AchievementLedger::new());
    world.insert_resource(NotificationQueue::new(config.ledger.notification_duration));
    world.insert_resource(SnapshotGenerator::new(config.simulation.snapshot_interval));
    world.insert_resource(config);
    world
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_world_uses_config() {
        let mut config = Config::default();
        config.arena.width = 800.0;
        let world = create_world(config, 1);
        assert_eq!(world.resource::<Arena>().width, 800.0);
        assert_eq!(world.resource::<Arena>().radius, 25.0);
        assert_eq!(world.resource::<SimClock>().tick, 0);
        assert!(world.resource::<NotificationQueue>().is_empty());
    }
}
