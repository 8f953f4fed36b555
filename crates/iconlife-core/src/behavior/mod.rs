//! Behaviour Engine
//!
//! Per-kind movement policies. Each agent carries a [`Behavior`] component
//! holding its kind-specific state, fully initialised at spawn. Every tick the
//! policy reads a start-of-tick [`Neighborhood`] snapshot and adjusts only the
//! agent's own velocity.
//!
//! Ambient terms (attraction, jitter) add to the velocity; deliberate travel
//! (bursts, router legs, distribution runs) replaces it.

use bevy_ecs::prelude::*;
use iconlife_events::{ServiceKind, Vec2};
use rand::rngs::SmallRng;
use rand::Rng;
use std::f32::consts::TAU;

use crate::components::{Arena, Halt};

pub mod drift;
pub mod edge_cache;
pub mod function;
pub mod orbit;
pub mod router;
pub mod scaling;

pub use edge_cache::{EdgeCachePhase, EdgeCacheState};
pub use function::{FunctionPhase, FunctionState};
pub use orbit::{DatabaseState, Orbit};
pub use router::{PatrolAxis, RouterPhase, RouterState};
pub use scaling::{ScalingPhase, ScalingState};

/// Kind-specific behaviour state
#[derive(Component, Debug, Clone, PartialEq)]
pub enum Behavior {
    Compute,
    Storage,
    BlockVolume,
    /// Fixed spin applied to the heading every tick
    NetworkBoundary { spin: f32 },
    Function(FunctionState),
    Database(DatabaseState),
    IdentityRole(Orbit),
    Router(RouterState),
    EdgeCache(EdgeCacheState),
    KeyValueTable,
    ScalingController(ScalingState),
}

impl Behavior {
    /// Initial state for a freshly spawned agent.
    pub fn initial(kind: ServiceKind, position: Vec2, arena: &Arena, rng: &mut SmallRng) -> Self {
        match kind {
            ServiceKind::Compute => Behavior::Compute,
            ServiceKind::Storage => Behavior::Storage,
            ServiceKind::BlockVolume => Behavior::BlockVolume,
            ServiceKind::NetworkBoundary => Behavior::NetworkBoundary {
                spin: drift::random_spin(rng),
            },
            ServiceKind::Function => Behavior::Function(FunctionState::default()),
            ServiceKind::Database => Behavior::Database(DatabaseState::new(position, rng)),
            ServiceKind::IdentityRole => Behavior::IdentityRole(Orbit::identity(position, rng)),
            ServiceKind::Router => Behavior::Router(RouterState::new(position, arena, rng)),
            ServiceKind::EdgeCache => Behavior::EdgeCache(EdgeCacheState::default()),
            ServiceKind::KeyValueTable => Behavior::KeyValueTable,
            ServiceKind::ScalingController => Behavior::ScalingController(ScalingState::default()),
        }
    }

    /// Short state name for debugging overlays and snapshots.
    pub fn tag(&self) -> &'static str {
        match self {
            Behavior::Compute => "cruising",
            Behavior::Storage => "drifting",
            Behavior::BlockVolume => "drafting",
            Behavior::NetworkBoundary { .. } => "spinning",
            Behavior::Function(state) => state.phase.tag(),
            Behavior::Database(state) => state.tag(),
            Behavior::IdentityRole(_) => "orbiting",
            Behavior::Router(state) => state.phase.tag(),
            Behavior::EdgeCache(state) => state.phase.tag(),
            Behavior::KeyValueTable => "wandering",
            Behavior::ScalingController(state) => state.phase.tag(),
        }
    }

    /// Visual scale factor; only scaling controllers pulse.
    pub fn scale(&self) -> f32 {
        match self {
            Behavior::ScalingController(state) => state.scale,
            _ => 1.0,
        }
    }

    /// Function this agent is heading for, if it is a connecting router.
    pub fn router_target(&self) -> Option<Entity> {
        match self {
            Behavior::Router(state) => state.target(),
            _ => None,
        }
    }

    /// Runs one tick of the policy.
    pub fn steer(&mut self, ctx: &mut Steering<'_>, velocity: &mut Vec2, halt: &mut Halt) {
        match self {
            Behavior::Compute => drift::compute(ctx, velocity),
            Behavior::Storage => drift::storage(ctx, velocity, halt),
            Behavior::BlockVolume => drift::block_volume(ctx, velocity),
            Behavior::NetworkBoundary { spin } => drift::network_boundary(ctx, velocity, *spin),
            Behavior::Function(state) => function::steer(state, ctx, velocity),
            Behavior::Database(state) => orbit::database(state, ctx, velocity),
            Behavior::IdentityRole(orbit) => orbit::identity_role(orbit, ctx, velocity),
            Behavior::Router(state) => router::steer(state, ctx, velocity),
            Behavior::EdgeCache(state) => edge_cache::steer(state, ctx, velocity),
            Behavior::KeyValueTable => drift::key_value_table(ctx, velocity),
            Behavior::ScalingController(state) => scaling::steer(state, ctx, velocity),
        }
    }
}

/// Start-of-tick view of one agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub entity: Entity,
    pub kind: ServiceKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub router_target: Option<Entity>,
}

/// Positions and velocities of every agent, captured before any behaviour
/// runs so that reads do not depend on iteration order.
#[derive(Resource, Debug, Clone, Default)]
pub struct Neighborhood {
    agents: Vec<Neighbor>,
}

impl Neighborhood {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot, ordered by entity.
    pub fn rebuild(&mut self, agents: impl IntoIterator<Item = Neighbor>) {
        self.agents.clear();
        self.agents.extend(agents);
        self.agents.sort_by_key(|n| n.entity);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Neighbor> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn get(&self, entity: Entity) -> Option<&Neighbor> {
        self.agents
            .binary_search_by_key(&entity, |n| n.entity)
            .ok()
            .map(|i| &self.agents[i])
    }

    pub fn of_kind(&self, kind: ServiceKind) -> impl Iterator<Item = &Neighbor> {
        self.agents.iter().filter(move |n| n.kind == kind)
    }

    pub fn count(&self, kind: ServiceKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Nearest agent of `kind` other than `exclude`, with its distance.
    pub fn nearest(&self, from: Vec2, kind: ServiceKind, exclude: Entity) -> Option<(&Neighbor, f32)> {
        self.of_kind(kind)
            .filter(|n| n.entity != exclude)
            .map(|n| (n, n.position.distance(from)))
            .fold(None, |best, (n, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((n, d)),
            })
    }

    /// Mean position of all agents of `kind`, with their count.
    pub fn centroid(&self, kind: ServiceKind) -> Option<(Vec2, usize)> {
        let (sum, count) = self
            .of_kind(kind)
            .fold((Vec2::ZERO, 0usize), |(sum, count), n| (sum + n.position, count + 1));
        (count > 0).then(|| (sum / count as f32, count))
    }

    pub fn is_targeted_by_router(&self, entity: Entity, except: Entity) -> bool {
        self.agents
            .iter()
            .any(|n| n.entity != except && n.router_target == Some(entity))
    }
}

/// Side effects of steering that other systems act on
#[derive(Resource, Debug, Clone, Default)]
pub struct SteerOutbox {
    /// Functions claimed by a router earlier this tick
    pub claimed: Vec<Entity>,
    /// Router arrivals as `(router, function)`
    pub contacts: Vec<(Entity, Entity)>,
}

impl SteerOutbox {
    pub fn clear(&mut self) {
        self.claimed.clear();
        self.contacts.clear();
    }
}

/// Everything a policy may read while steering one agent
pub struct Steering<'a> {
    pub entity: Entity,
    pub position: Vec2,
    pub neighbors: &'a Neighborhood,
    pub arena: &'a Arena,
    pub rng: &'a mut SmallRng,
    pub outbox: &'a mut SteerOutbox,
}

impl Steering<'_> {
    pub fn nearest(&self, kind: ServiceKind) -> Option<(Neighbor, f32)> {
        self.neighbors
            .nearest(self.position, kind, self.entity)
            .map(|(n, d)| (*n, d))
    }

    /// Unit vector toward `target`, random when the two points coincide.
    pub fn direction_to(&mut self, target: Vec2) -> Vec2 {
        (target - self.position)
            .try_normalize()
            .unwrap_or_else(|| random_unit(self.rng))
    }

    /// Adds `strength` along the direction to `target`.
    pub fn pull_toward(&mut self, velocity: &mut Vec2, target: Vec2, strength: f32) {
        *velocity += self.direction_to(target) * strength;
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability)
    }

    pub fn random_velocity(&mut self, min_speed: f32, max_speed: f32) -> Vec2 {
        random_velocity(self.rng, min_speed, max_speed)
    }
}

/// Uniformly random unit vector.
pub fn random_unit(rng: &mut impl Rng) -> Vec2 {
    Vec2::from_angle(rng.gen_range(0.0..TAU))
}

/// Random heading with a speed drawn from `[min_speed, max_speed]`.
pub fn random_velocity(rng: &mut impl Rng, min_speed: f32, max_speed: f32) -> Vec2 {
    let speed = if max_speed > min_speed {
        rng.gen_range(min_speed..=max_speed)
    } else {
        min_speed
    };
    random_unit(rng) * speed
}
