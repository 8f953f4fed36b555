//! Motion Systems
//!
//! Clock advance, integration with wall reflection, and the end-of-tick
//! clamp that keeps every agent inside its invariants.

use bevy_ecs::prelude::*;
use iconlife_events::{Vec2, VecExt};

use crate::behavior::random_velocity;
use crate::components::{Arena, Halt, Health, MaxVelocity, Position, SimClock, Velocity};
use crate::SimRng;

/// Speed range for an agent resuming after a halt
pub const RESUME_SPEED: (f32, f32) = (0.5, 1.5);

pub fn advance_clock(mut clock: ResMut<SimClock>) {
    clock.advance();
}

/// Counts down halts, clamps velocity, moves, and reflects off the walls.
pub fn integrate_motion(
    arena: Res<Arena>,
    mut rng: ResMut<SimRng>,
    mut query: Query<(Entity, &mut Position, &mut Velocity, &MaxVelocity, &mut Halt)>,
) {
    let mut agents: Vec<_> = query.iter_mut().collect();
    agents.sort_by_key(|(entity, ..)| *entity);

    for (entity, mut position, mut velocity, max_velocity, mut halt) in agents {
        if halt.stopped {
            if halt.tick_down() {
                velocity.0 = random_velocity(&mut rng.0, RESUME_SPEED.0, RESUME_SPEED.1);
                tracing::debug!(agent = ?entity, "resumed");
            } else {
                velocity.0 = Vec2::ZERO;
            }
        }

        velocity.0 = velocity.0.clamp_components(max_velocity.0);
        if !halt.stopped {
            position.0 += velocity.0;
        }
        reflect(&arena, &mut position.0, &mut velocity.0);
    }
}

/// Clamps `position` into the arena and points the crossed velocity
/// component back inside. Uses the sign rather than negation, so an agent
/// already heading inward is never turned around twice.
pub fn reflect(arena: &Arena, position: &mut Vec2, velocity: &mut Vec2) {
    let (min, max) = (arena.min(), arena.max());
    if position.x < min.x {
        position.x = min.x;
        velocity.x = velocity.x.abs();
    } else if position.x > max.x {
        position.x = max.x;
        velocity.x = -velocity.x.abs();
    }
    if position.y < min.y {
        position.y = min.y;
        velocity.y = velocity.y.abs();
    } else if position.y > max.y {
        position.y = max.y;
        velocity.y = -velocity.y.abs();
    }
}

/// Restores the health, velocity and position invariants after every other
/// phase has had its say.
pub fn enforce_invariants(
    arena: Res<Arena>,
    mut query: Query<(&mut Position, &mut Velocity, &MaxVelocity, &mut Health)>,
) {
    for (mut position, mut velocity, max_velocity, mut health) in query.iter_mut() {
        if !velocity.0.is_finite() {
            velocity.0 = Vec2::ZERO;
        }
        velocity.0 = velocity.0.clamp_components(max_velocity.0);
        position.0 = arena.clamp(position.0);
        let current = health.current;
        health.set(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::testing;
    use iconlife_events::ServiceKind;

    fn motion_schedule() -> Schedule {
        let mut schedule = Schedule::default();
        schedule.add_systems(integrate_motion);
        schedule
    }

    #[test]
    fn test_reflection_happens_once_per_contact() {
        let mut world = testing::world(1);
        let agent = testing::spawn(&mut world, ServiceKind::Compute, Vec2::new(570.0, 300.0), Vec2::new(3.0, 0.0));
        let mut schedule = motion_schedule();

        let mut flips = 0;
        let mut last = 3.0f32;
        for _ in 0..10 {
            schedule.run(&mut world);
            let vx = world.get::<Velocity>(agent).unwrap().0.x;
            if vx.signum() != last.signum() {
                flips += 1;
            }
            last = vx;
            let x = world.get::<Position>(agent).unwrap().0.x;
            assert!(x <= 575.0);
        }
        assert_eq!(flips, 1);
        assert_eq!(last, -3.0);
    }

    #[test]
    fn test_velocity_clamped_per_component() {
        let mut world = testing::world(1);
        let agent = testing::spawn(&mut world, ServiceKind::Storage, Vec2::new(300.0, 300.0), Vec2::new(9.0, -9.0));
        motion_schedule().run(&mut world);
        let velocity = world.get::<Velocity>(agent).unwrap().0;
        assert_eq!(velocity, Vec2::new(3.0, -3.0));
        assert_eq!(world.get::<Position>(agent).unwrap().0, Vec2::new(303.0, 297.0));
    }

    #[test]
    fn test_halted_agent_holds_then_resumes() {
        let mut world = testing::world(2);
        let agent = testing::spawn(&mut world, ServiceKind::Storage, Vec2::new(300.0, 300.0), Vec2::new(1.0, 0.0));
        world.get_mut::<Halt>(agent).unwrap().start(2);
        let mut schedule = motion_schedule();

        schedule.run(&mut world);
        assert_eq!(world.get::<Position>(agent).unwrap().0, Vec2::new(300.0, 300.0));
        assert_eq!(world.get::<Velocity>(agent).unwrap().0, Vec2::ZERO);

        schedule.run(&mut world);
        assert!(!world.get::<Halt>(agent).unwrap().stopped);
        let speed = world.get::<Velocity>(agent).unwrap().0.length();
        assert!((0.5 - 1e-4..=1.5 + 1e-4).contains(&speed));
    }

    #[test]
    fn test_invariants_repair_bad_values() {
        let mut world = testing::world(3);
        let agent = testing::spawn(&mut world, ServiceKind::Compute, Vec2::new(300.0, 300.0), Vec2::ZERO);
        world.get_mut::<Velocity>(agent).unwrap().0 = Vec2::new(f32::NAN, 1.0);
        world.get_mut::<Position>(agent).unwrap().0 = Vec2::new(-40.0, 9000.0);
        world.get_mut::<Health>(agent).unwrap().current = 250.0;

        let mut schedule = Schedule::default();
        schedule.add_systems(enforce_invariants);
        schedule.run(&mut world);

        assert_eq!(world.get::<Velocity>(agent).unwrap().0, Vec2::ZERO);
        assert_eq!(world.get::<Position>(agent).unwrap().0, Vec2::new(25.0, 625.0));
        assert_eq!(world.get::<Health>(agent).unwrap().current, 100.0);
    }
}
