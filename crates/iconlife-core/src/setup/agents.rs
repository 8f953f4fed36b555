//! Agent Spawning
//!
//! Builds agents with randomized initial velocity and behaviour state, and
//! places the initial population.

use bevy_ecs::prelude::*;
use iconlife_events::{ServiceKind, SimEvent, Vec2, VecExt};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

use crate::behavior::Behavior;
use crate::components::*;
use crate::config::Config;
use crate::events::TickEvents;
use crate::SimRng;

/// Random velocity with both components in `[-speed, speed]`.
pub fn random_spawn_velocity(rng: &mut impl Rng, speed: f32) -> Vec2 {
    if speed <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(rng.gen_range(-speed..=speed), rng.gen_range(-speed..=speed))
}

/// Spawns one agent. Out-of-range positions are clamped into the arena; a
/// missing velocity is drawn at random.
pub fn spawn_agent(world: &mut World, kind: ServiceKind, position: Vec2, velocity: Option<Vec2>) -> AgentHandle {
    let arena = *world.resource::<Arena>();
    let tick = world.resource::<SimClock>().tick;
    let (max_velocity, max_health, spawn_speed) = {
        let config = world.resource::<Config>();
        (
            config.max_velocity_for(kind),
            config.health.max_health,
            config.motion.spawn_speed,
        )
    };
    let position = arena.clamp(position);

    let (velocity, behavior) = {
        let mut rng = world.resource_mut::<SimRng>();
        let velocity = match velocity {
            Some(v) if v.is_finite() => v.clamp_components(max_velocity),
            Some(_) => Vec2::ZERO,
            None => random_spawn_velocity(&mut rng.0, spawn_speed),
        };
        (velocity, Behavior::initial(kind, position, &arena, &mut rng.0))
    };

    let entity = world
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
        .id();
    let handle = AgentHandle(entity);

    tracing::debug!(agent = ?entity, kind = %kind, x = position.x, y = position.y, "agent spawned");
    world.resource_mut::<TickEvents>().push(SimEvent::Spawned {
        tick,
        agent: handle.id(),
        kind,
        position,
    });
    handle
}

/// Spawns an agent of `kind` (or a random kind) at a random point away from
/// the walls.
pub fn spawn_random_agent(world: &mut World, kind: Option<ServiceKind>) -> AgentHandle {
    let arena = *world.resource::<Arena>();
    let (kind, position) = {
        let mut rng = world.resource_mut::<SimRng>();
        let kind = match kind {
            Some(kind) => kind,
            None => *ServiceKind::ALL.choose(&mut rng.0).unwrap_or(&ServiceKind::Compute),
        };
        (kind, arena.random_point(&mut rng.0, PLACEMENT_MARGIN))
    };
    spawn_agent(world, kind, position, None)
}

/// Places `per_kind` agents of every kind at random points.
pub fn spawn_all_agents(world: &mut World, per_kind: usize) -> Vec<AgentHandle> {
    let mut handles = Vec::with_capacity(per_kind * ServiceKind::ALL.len());
    for kind in ServiceKind::ALL {
        for _ in 0..per_kind {
            handles.push(spawn_random_agent(world, Some(kind)));
        }
    }
    handles
}

/// Summary of spawned agents
#[derive(Debug, Clone, Default)]
pub struct SpawnSummary {
    pub total_agents: usize,
    pub by_kind: BTreeMap<String, usize>,
}

/// Get a summary of the live population
pub fn get_spawn_summary(world: &mut World) -> SpawnSummary {
    let mut summary = SpawnSummary::default();
    let mut query = world.query::<&Kind>();
    for kind in query.iter(world) {
        summary.total_agents += 1;
        *summary.by_kind.entry(kind.0.key().to_string()).or_insert(0) += 1;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::create_world;

    #[test]
    fn test_spawn_clamps_into_arena() {
        let mut world = create_world(Config::default(), 1);
        let handle = spawn_agent(&mut world, ServiceKind::Storage, Vec2::new(-100.0, 1000.0), None);
        let position = world.get::<Position>(handle.entity()).unwrap().0;
        assert_eq!(position, Vec2::new(25.0, 625.0));

        let velocity = world.get::<Velocity>(handle.entity()).unwrap().0;
        assert!(velocity.x.abs() <= 2.0 && velocity.y.abs() <= 2.0);
        assert!(matches!(
            world.resource::<TickEvents>().iter().next(),
            Some(SimEvent::Spawned { kind: ServiceKind::Storage, .. })
        ));
    }

    #[test]
    fn test_spawn_all_agents() {
        let mut world = create_world(Config::default(), 9);
        let handles = spawn_all_agents(&mut world, 2);
        assert_eq!(handles.len(), 22);

        let summary = get_spawn_summary(&mut world);
        assert_eq!(summary.total_agents, 22);
        assert_eq!(summary.by_kind.len(), 11);
        assert!(summary.by_kind.values().all(|&n| n == 2));

        let mut query = world.query::<&Position>();
        for position in query.iter(&world) {
            assert!(position.0.x >= 50.0 && position.0.x <= 550.0);
            assert!(position.0.y >= 50.0 && position.0.y <= 600.0);
        }
    }

    #[test]
    fn test_explicit_velocity_is_clamped() {
        let mut world = create_world(Config::default(), 1);
        let handle = spawn_agent(
            &mut world,
            ServiceKind::Compute,
            Vec2::new(300.0, 300.0),
            Some(Vec2::new(10.0, f32::NAN)),
        );
        assert_eq!(world.get::<Velocity>(handle.entity()).unwrap().0, Vec2::ZERO);

        let handle = spawn_agent(&mut world, ServiceKind::Compute, Vec2::new(300.0, 300.0), Some(Vec2::new(10.0, -1.0)));
        assert_eq!(world.get::<Velocity>(handle.entity()).unwrap().0, Vec2::new(3.0, -1.0));
    }
}
