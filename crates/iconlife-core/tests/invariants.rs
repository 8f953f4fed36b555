//! Properties that must hold on every tick of every run.

use bevy_ecs::prelude::*;
use iconlife_core::components::{Arena, OverlapTracker, Position, Velocity};
use iconlife_core::config::Config;
use iconlife_core::setup::{create_world, spawn_agent};
use iconlife_core::systems::motion::reflect;
use iconlife_core::systems::overlap::penetration;
use iconlife_core::systems::{integrate_motion, resolve_overlaps};
use iconlife_core::Simulation;
use iconlife_events::{ServiceKind, Vec2};
use std::collections::HashMap;

#[test]
fn test_health_velocity_and_position_stay_in_range() {
    let mut sim = Simulation::with_default_config(2024);
    sim.populate(3);
    let config = sim.config().clone();
    let arena = sim.arena();

    for tick in 0..1500 {
        sim.tick();
        for agent in sim.agents() {
            assert!(
                (0.0..=agent.max_health).contains(&agent.health),
                "tick {tick}: {:?} health {}",
                agent.kind,
                agent.health
            );
            let limit = config.max_velocity_for(agent.kind) + 1e-4;
            assert!(
                agent.velocity.x.abs() <= limit && agent.velocity.y.abs() <= limit,
                "tick {tick}: {:?} velocity {:?}",
                agent.kind,
                agent.velocity
            );
            let p = agent.position;
            assert!(
                p.x >= 0.0 && p.x <= arena.width && p.y >= 0.0 && p.y <= arena.height,
                "tick {tick}: {:?} position {:?}",
                agent.kind,
                p
            );
            assert!((0.7..=1.5).contains(&agent.scale));
        }
    }
}

#[test]
fn test_ledger_is_monotonic() {
    let mut sim = Simulation::with_default_config(99);
    sim.populate(2);
    let mut seen: HashMap<String, bool> = HashMap::new();

    for tick in 0..1200 {
        sim.tick();
        for milestone in sim.ledger() {
            let label = format!("{:?}:{}", milestone.key.relation, milestone.key.label());
            let was = seen.insert(label.clone(), milestone.achieved).unwrap_or(false);
            assert!(!was || milestone.achieved, "tick {tick}: {label} un-fired");
        }
        if tick == 600 {
            for agent in sim.agents() {
                sim.remove(agent.handle);
            }
        }
    }
}

#[test]
fn test_right_wall_reflects_once() {
    let arena = Arena::new(600.0, 650.0, 50.0);
    let mut position = Vec2::new(560.0, 300.0);
    let mut velocity = Vec2::new(3.0, 0.0);
    let mut flips = 0;
    for _ in 0..20 {
        let before = velocity.x;
        position += velocity;
        reflect(&arena, &mut position, &mut velocity);
        if velocity.x.signum() != before.signum() {
            flips += 1;
        }
        assert!(position.x <= arena.max().x);
    }
    assert_eq!(flips, 1);
    assert_eq!(velocity, Vec2::new(-3.0, 0.0));
}

#[test]
fn test_stationary_overlap_converges() {
    let mut world = create_world(Config::default(), 6);
    let a = spawn_agent(&mut world, ServiceKind::Compute, Vec2::new(280.0, 300.0), Some(Vec2::ZERO)).entity();
    let b = spawn_agent(&mut world, ServiceKind::Compute, Vec2::new(310.0, 300.0), Some(Vec2::ZERO)).entity();

    let mut schedule = Schedule::default();
    schedule.add_systems((resolve_overlaps, integrate_motion).chain());

    let depth = |world: &World| {
        let pa = world.get::<Position>(a).unwrap().0;
        let pb = world.get::<Position>(b).unwrap().0;
        penetration(pa.distance(pb), 25.0)
    };
    let mut previous = depth(&world);
    assert!(previous > 0.0);
    for _ in 0..40 {
        schedule.run(&mut world);
        let current = depth(&world);
        if previous > 0.0 {
            assert!(current < previous);
        } else {
            assert_eq!(current, 0.0);
        }
        previous = current;
    }
    assert_eq!(previous, 0.0);
}

#[test]
fn test_pinned_overlap_becomes_stuck_with_stronger_push() {
    let mut world = create_world(Config::default(), 6);
    let a = spawn_agent(&mut world, ServiceKind::Storage, Vec2::new(300.0, 300.0), Some(Vec2::ZERO)).entity();
    let b = spawn_agent(&mut world, ServiceKind::Storage, Vec2::new(305.0, 300.0), Some(Vec2::ZERO)).entity();
    let threshold = world.resource::<Config>().overlap.stuck_threshold;

    let mut schedule = Schedule::default();
    schedule.add_systems(resolve_overlaps);

    let mut early_push = 0.0;
    let mut late_push = 0.0;
    for tick in 0..threshold + 5 {
        world.get_mut::<Velocity>(a).unwrap().0 = Vec2::ZERO;
        world.get_mut::<Velocity>(b).unwrap().0 = Vec2::ZERO;
        schedule.run(&mut world);
        let push = world.get::<Velocity>(b).unwrap().0.x;
        if tick == 0 {
            early_push = push;
        }
        late_push = push;
    }

    let stuck_a = world.get::<OverlapTracker>(a).unwrap().stuck;
    let stuck_b = world.get::<OverlapTracker>(b).unwrap().stuck;
    assert!(stuck_a || stuck_b);
    // doubled push, give or take the jitter
    assert!(late_push > early_push * 1.5, "early {early_push}, late {late_push}");
}
