//! Overlap Resolver
//!
//! Pushes intersecting icons apart with an impulse proportional to their
//! penetration. Deep overlaps (penetration above `overlap_threshold`) are
//! counted per partner; once a pair has been stuck together for more than
//! `stuck_threshold` frames the agent is flagged stuck, its push doubles and
//! both sides get a random nudge.

use bevy_ecs::prelude::*;
use iconlife_events::{SimEvent, Vec2};
use rand::Rng;

use crate::behavior::random_unit;
use crate::components::{AgentHandle, Arena, OverlapTracker, Position, SimClock, Velocity};
use crate::config::{Config, OverlapConfig};
use crate::events::TickEvents;
use crate::systems::sorted;
use crate::SimRng;

/// Penetration depth of two icons of radius `radius` whose centres are
/// `distance` apart.
pub fn penetration(distance: f32, radius: f32) -> f32 {
    (2.0 * radius - distance).max(0.0)
}

/// Impulse magnitude for one side of an overlapping pair.
pub fn separation_impulse(config: &OverlapConfig, penetration: f32, radius: f32, stuck: bool) -> f32 {
    let multiplier = if stuck { config.stuck_force_multiplier } else { 1.0 };
    config.separation_force * multiplier * penetration / radius
}

pub fn resolve_overlaps(
    config: Res<Config>,
    arena: Res<Arena>,
    clock: Res<SimClock>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<TickEvents>,
    mut query: Query<(Entity, &Position, &mut Velocity, &mut OverlapTracker)>,
) {
    let config = &config.overlap;
    let radius = arena.radius;
    let agents = sorted(query.iter().map(|(entity, position, ..)| (entity, position.0)).collect());

    for (i, &(a, pos_a)) in agents.iter().enumerate() {
        for &(b, pos_b) in &agents[i + 1..] {
            let Ok([(_, _, mut vel_a, mut track_a), (_, _, mut vel_b, mut track_b)]) = query.get_many_mut([a, b])
            else {
                continue;
            };

            let offset = pos_b - pos_a;
            let distance = offset.length();
            let depth = penetration(distance, radius);
            if depth <= config.overlap_threshold {
                track_a.release(b);
                track_b.release(a);
            } else {
                for (tracker, agent, other) in [(&mut track_a, a, b), (&mut track_b, b, a)] {
                    if tracker.record(other, config.stuck_threshold) {
                        tracing::debug!(agent = ?agent, other = ?other, "agent stuck");
                        events.push(SimEvent::Stuck {
                            tick: clock.tick,
                            agent: AgentHandle(agent).id(),
                            other: AgentHandle(other).id(),
                        });
                    }
                }
            }
            if depth <= 0.0 {
                continue;
            }

            // coincident centres get a random axis
            let direction = offset.try_normalize().unwrap_or_else(|| random_unit(&mut rng.0));
            vel_a.0 -= direction * separation_impulse(config, depth, radius, track_a.stuck);
            vel_b.0 += direction * separation_impulse(config, depth, radius, track_b.stuck);

            if track_a.stuck || track_b.stuck {
                vel_a.0 += jitter(&mut rng.0, config.stuck_jitter);
                vel_b.0 += jitter(&mut rng.0, config.stuck_jitter);
            }
        }
    }
}

fn jitter(rng: &mut impl Rng, amount: f32) -> Vec2 {
    if amount <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(rng.gen_range(-amount..=amount), rng.gen_range(-amount..=amount))
}
