//! Interaction Tracker
//!
//! Records who last met whom, resolves icon-box collisions, and applies the
//! complementary-pair effects. Pairs that are not complementary swap
//! velocities on collision, with a small perturbation so two icons cannot
//! lock into a symmetric loop.

use bevy_ecs::prelude::*;
use iconlife_events::{ServiceKind, SimEvent, Vec2};
use rand::Rng;

use crate::behavior::{random_unit, SteerOutbox};
use crate::components::{AgentHandle, Arena, Health, InteractionLink, Kind, Position, SimClock, Velocity};
use crate::config::{Config, InteractionConfig};
use crate::events::TickEvents;
use crate::ledger::complementary_pair;
use crate::systems::sorted;
use crate::SimRng;

/// Compute and block volume both slow down while docked
pub const DOCK_DAMPING: f32 = 0.9;
/// Share of the compute velocity a docked block volume takes on
pub const DOCK_BLEND: f32 = 0.2;
pub const FUNCTION_KV_BOOST: f32 = 1.1;
pub const EDGE_CACHE_BOOST: f32 = 1.2;

/// One side of a pair, borrowed out of the query
pub struct Side<'a> {
    pub entity: Entity,
    pub kind: ServiceKind,
    pub position: &'a mut Vec2,
    pub velocity: &'a mut Vec2,
    pub health: &'a mut Health,
    pub link: &'a mut InteractionLink,
}

impl Side<'_> {
    /// Scales the velocity by `factor`, never beyond twice the speed held
    /// before boosting by `partner` began (or the present speed, if higher).
    fn boost(&mut self, partner: Entity, factor: f32) {
        self.link.begin_boost(partner, self.velocity.length());
        let cap = self.link.boost_cap().max(self.velocity.length());
        *self.velocity = (*self.velocity * factor).clamp_length_max(cap);
    }
}

/// Applies the complementary effect for `a`/`b`. Returns false when the kinds
/// are not a complementary pair.
pub fn apply_complementary<'a>(a: &mut Side<'a>, b: &mut Side<'a>, health_bonus: f32) -> bool {
    let Some(key) = complementary_pair(a.kind, b.kind) else {
        return false;
    };
    // order the pair as the ledger lists it
    let (first, second) = if a.kind == key.first { (a, b) } else { (b, a) };

    match (first.kind, second.kind) {
        (ServiceKind::Compute, ServiceKind::BlockVolume) => {
            *first.velocity *= DOCK_DAMPING;
            *second.velocity *= DOCK_DAMPING;
            *second.velocity = second.velocity.lerp(*first.velocity, DOCK_BLEND);
        }
        (ServiceKind::Function, ServiceKind::KeyValueTable) => {
            first.boost(second.entity, FUNCTION_KV_BOOST);
            second.boost(first.entity, FUNCTION_KV_BOOST);
        }
        (ServiceKind::Storage, ServiceKind::EdgeCache) => {
            second.boost(first.entity, EDGE_CACHE_BOOST);
        }
        _ => {}
    }
    first.health.adjust(health_bonus);
    second.health.adjust(health_bonus);
    true
}

/// Axis-aligned penetration of two icon boxes, or `None` when they do not
/// intersect.
pub fn box_penetration(offset: Vec2, size: f32) -> Option<f32> {
    let (dx, dy) = (offset.x.abs(), offset.y.abs());
    (dx < size && dy < size).then(|| (size - dx).min(size - dy))
}

pub fn track_interactions(
    config: Res<Config>,
    arena: Res<Arena>,
    clock: Res<SimClock>,
    outbox: Res<SteerOutbox>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<TickEvents>,
    mut query: Query<(Entity, &Kind, &mut Position, &mut Velocity, &mut Health, &mut InteractionLink)>,
) {
    let config = &config.interaction;

    for (.., mut link) in query.iter_mut() {
        link.tick_down();
    }

    for &(router, function) in &outbox.contacts {
        let Ok([(.., mut router_link), (.., mut function_link)]) =
            query.get_many_mut([router, function])
        else {
            continue;
        };
        router_link.link(function, config.link_duration);
        function_link.link(router, config.link_duration);
        events.push(SimEvent::Connected {
            tick: clock.tick,
            router: AgentHandle(router).id(),
            function: AgentHandle(function).id(),
        });
    }

    let agents = sorted(query.iter().map(|(entity, ..)| (entity, ())).collect());
    for (i, &(a, _)) in agents.iter().enumerate() {
        for &(b, _) in &agents[i + 1..] {
            let Ok(
                [(_, kind_a, mut pos_a, mut vel_a, mut health_a, mut link_a), (_, kind_b, mut pos_b, mut vel_b, mut health_b, mut link_b)],
            ) = query.get_many_mut([a, b])
            else {
                continue;
            };
            let mut side_a = Side {
                entity: a,
                kind: kind_a.0,
                position: &mut pos_a.0,
                velocity: &mut vel_a.0,
                health: &mut health_a,
                link: &mut link_a,
            };
            let mut side_b = Side {
                entity: b,
                kind: kind_b.0,
                position: &mut pos_b.0,
                velocity: &mut vel_b.0,
                health: &mut health_b,
                link: &mut link_b,
            };
            interact(config, &arena, &mut rng.0, &mut side_a, &mut side_b);
        }
    }
}

fn interact<'a>(
    config: &InteractionConfig,
    arena: &Arena,
    rng: &mut impl Rng,
    a: &mut Side<'a>,
    b: &mut Side<'a>,
) {
    let offset = *b.position - *a.position;
    if offset.length() < config.interaction_radius {
        a.link.link(b.entity, config.link_duration);
        b.link.link(a.entity, config.link_duration);
    }

    let Some(depth) = box_penetration(offset, arena.radius * 2.0) else {
        a.link.end_boost(b.entity);
        b.link.end_boost(a.entity);
        return;
    };
    let direction = offset.try_normalize().unwrap_or_else(|| random_unit(rng));
    let push = direction * (depth * config.collision_push * 0.5);
    *a.position = arena.clamp(*a.position - push);
    *b.position = arena.clamp(*b.position + push);

    if apply_complementary(a, b, config.complementary_health_bonus) {
        return;
    }

    std::mem::swap(a.velocity, b.velocity);
    *a.velocity += perturbation(rng, config.perturbation);
    *b.velocity += perturbation(rng, config.perturbation);
}

fn perturbation(rng: &mut impl Rng, amount: f32) -> Vec2 {
    if amount <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(rng.gen_range(-amount..=amount), rng.gen_range(-amount..=amount))
}
