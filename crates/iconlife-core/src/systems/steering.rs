//! Steering Systems
//!
//! Captures the start-of-tick neighbourhood, then lets every agent's
//! behaviour adjust its own velocity against that snapshot.

use bevy_ecs::prelude::*;

use crate::behavior::{Behavior, Neighbor, Neighborhood, SteerOutbox, Steering};
use crate::components::{Arena, Halt, Kind, Position, Velocity};
use crate::SimRng;

/// Rebuilds the [`Neighborhood`] snapshot and clears last tick's outbox.
pub fn build_neighborhood(
    mut neighborhood: ResMut<Neighborhood>,
    mut outbox: ResMut<SteerOutbox>,
    query: Query<(Entity, &Kind, &Position, &Velocity, &Behavior)>,
) {
    outbox.clear();
    neighborhood.rebuild(query.iter().map(|(entity, kind, position, velocity, behavior)| Neighbor {
        entity,
        kind: kind.0,
        position: position.0,
        velocity: velocity.0,
        router_target: behavior.router_target(),
    }));
}

/// Runs each agent's policy in entity order.
pub fn apply_behaviors(
    neighborhood: Res<Neighborhood>,
    arena: Res<Arena>,
    mut rng: ResMut<SimRng>,
    mut outbox: ResMut<SteerOutbox>,
    mut query: Query<(&Position, &mut Velocity, &mut Behavior, &mut Halt)>,
) {
    for neighbor in neighborhood.iter() {
        let Ok((position, mut velocity, mut behavior, mut halt)) = query.get_mut(neighbor.entity) else {
            continue;
        };
        let mut ctx = Steering {
            entity: neighbor.entity,
            position: position.0,
            neighbors: &neighborhood,
            arena: &arena,
            rng: &mut rng.0,
            outbox: &mut outbox,
        };
        behavior.steer(&mut ctx, &mut velocity.0, &mut halt);
    }
}
