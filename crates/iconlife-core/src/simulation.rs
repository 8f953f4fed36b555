//! Simulation Facade
//!
//! [`Simulation`] owns the ECS world and the tick schedule. It is the only
//! type a presentation layer needs: spawn and remove agents, step the clock,
//! and read back per-agent state, the achievement ledger and notifications.

use bevy_ecs::prelude::*;
use bevy_ecs::query::ROQueryItem;
use iconlife_events::{AgentSnapshot, Relation, ServiceKind, SimEvent, Vec2, WorldSnapshot};
use std::collections::BTreeMap;

use crate::behavior::Behavior;
use crate::components::*;
use crate::config::{Config, ConfigError};
use crate::events::TickEvents;
use crate::ledger::{AchievementLedger, Milestone, Notification, NotificationQueue};
use crate::output::generate_snapshot;
use crate::setup;
use crate::systems::build_schedule;

/// Read-only view of one agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentView {
    pub handle: AgentHandle,
    pub kind: ServiceKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub dependencies: Vec<ServiceKind>,
    pub satisfied: bool,
    pub stuck: bool,
    pub selected: bool,
    pub stopped: bool,
    /// Last interaction partner; kept after the display timer runs out
    pub last_interaction: Option<AgentHandle>,
    pub interaction_timer: u32,
    pub state: &'static str,
    pub scale: f32,
}

impl AgentView {
    /// True while the interaction line should be drawn.
    pub fn shows_interaction(&self) -> bool {
        self.last_interaction.is_some() && self.interaction_timer > 0
    }

    pub fn to_snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.handle.id(),
            kind: self.kind,
            position: self.position,
            velocity: self.velocity,
            health: self.health,
            max_health: self.max_health,
            dependencies: self.dependencies.clone(),
            satisfied: self.satisfied,
            stuck: self.stuck,
            selected: self.selected,
            stopped: self.stopped,
            state: self.state.to_string(),
            scale: self.scale,
            last_interaction: self.last_interaction.map(|h| h.id()),
            interaction_timer: self.interaction_timer,
        }
    }
}

type AgentQuery = (
    Entity,
    &'static Kind,
    &'static Position,
    &'static Velocity,
    &'static Health,
    &'static Dependencies,
    &'static Halt,
    &'static Selected,
    &'static OverlapTracker,
    &'static InteractionLink,
    &'static Behavior,
);

fn view(item: ROQueryItem<'_, AgentQuery>) -> AgentView {
    let (entity, kind, position, velocity, health, deps, halt, selected, overlap, link, behavior) = item;
    AgentView {
        handle: AgentHandle(entity),
        kind: kind.0,
        position: position.0,
        velocity: velocity.0,
        health: health.current,
        max_health: health.max,
        dependencies: deps.kinds.clone(),
        satisfied: deps.satisfied,
        stuck: overlap.stuck,
        selected: selected.0,
        stopped: halt.stopped,
        last_interaction: link.partner.map(AgentHandle),
        interaction_timer: link.timer,
        state: behavior.tag(),
        scale: behavior.scale(),
    }
}

/// Views of every live agent, ordered by handle.
pub fn collect_agents(world: &mut World) -> Vec<AgentView> {
    let mut query = world.query::<AgentQuery>();
    let mut agents: Vec<AgentView> = query.iter(world).map(view).collect();
    agents.sort_by_key(|a| a.handle);
    agents
}

/// The simulation: world state plus the per-tick schedule
pub struct Simulation {
    world: World,
    schedule: Schedule,
}

impl Simulation {
    /// Builds a simulation from a validated config.
    pub fn new(config: Config, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config, seed))
    }

    pub fn with_default_config(seed: u64) -> Self {
        Self::from_valid(Config::default(), seed)
    }

    fn from_valid(config: Config, seed: u64) -> Self {
        Self {
            world: setup::create_world(config, seed),
            schedule: build_schedule(),
        }
    }

    pub fn config(&self) -> &Config {
        self.world.resource::<Config>()
    }

    pub fn arena(&self) -> Arena {
        *self.world.resource::<Arena>()
    }

    pub fn tick_count(&self) -> u64 {
        self.world.resource::<SimClock>().tick
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Spawns an agent with a random initial velocity.
    pub fn spawn(&mut self, kind: ServiceKind, position: Vec2) -> AgentHandle {
        setup::spawn_agent(&mut self.world, kind, position, None)
    }

    pub fn spawn_with_velocity(&mut self, kind: ServiceKind, position: Vec2, velocity: Vec2) -> AgentHandle {
        setup::spawn_agent(&mut self.world, kind, position, Some(velocity))
    }

    /// Spawns an agent of `kind`, or of a random kind, at a random point.
    pub fn spawn_random(&mut self, kind: Option<ServiceKind>) -> AgentHandle {
        setup::spawn_random_agent(&mut self.world, kind)
    }

    /// Places `per_kind` agents of every kind.
    pub fn populate(&mut self, per_kind: usize) -> Vec<AgentHandle> {
        setup::spawn_all_agents(&mut self.world, per_kind)
    }

    /// Removes an agent. Returns false when the handle is stale.
    pub fn remove(&mut self, handle: AgentHandle) -> bool {
        let entity = handle.entity();
        let Some(kind) = self.world.get::<Kind>(entity).map(|k| k.0) else {
            return false;
        };
        let mut query = self.world.query::<(&mut OverlapTracker, &mut InteractionLink)>();
        for (mut tracker, mut link) in query.iter_mut(&mut self.world) {
            tracker.forget(entity);
            link.forget(entity);
        }
        self.world.despawn(entity);

        let tick = self.tick_count();
        tracing::debug!(agent = ?entity, kind = %kind, "agent removed");
        self.world.resource_mut::<TickEvents>().push(SimEvent::Removed {
            tick,
            agent: handle.id(),
            kind,
        });
        true
    }

    /// Advances the simulation by one tick.
    pub fn tick(&mut self) {
        self.schedule.run(&mut self.world);
    }

    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Teleports an agent, clamped into the arena. Velocity and state are
    /// left alone.
    pub fn move_agent(&mut self, handle: AgentHandle, position: Vec2) -> bool {
        let position = self.arena().clamp(position);
        match self.world.get_mut::<Position>(handle.entity()) {
            Some(mut current) => {
                current.0 = position;
                true
            }
            None => false,
        }
    }

    /// Selects or deselects an agent. Selecting one deselects every other.
    pub fn set_selected(&mut self, handle: AgentHandle, selected: bool) -> bool {
        if self.world.get::<Selected>(handle.entity()).is_none() {
            return false;
        }
        if selected {
            let mut query = self.world.query::<&mut Selected>();
            for mut flag in query.iter_mut(&mut self.world) {
                flag.0 = false;
            }
        }
        if let Some(mut flag) = self.world.get_mut::<Selected>(handle.entity()) {
            flag.0 = selected;
        }
        true
    }

    pub fn selected(&mut self) -> Option<AgentHandle> {
        let mut query = self.world.query::<(Entity, &Selected)>();
        query
            .iter(&self.world)
            .find(|(_, selected)| selected.0)
            .map(|(entity, _)| AgentHandle(entity))
    }

    pub fn agent(&mut self, handle: AgentHandle) -> Option<AgentView> {
        let mut query = self.world.query::<AgentQuery>();
        query.get(&self.world, handle.entity()).ok().map(view)
    }

    pub fn agents(&mut self) -> Vec<AgentView> {
        collect_agents(&mut self.world)
    }

    pub fn agent_count(&mut self) -> usize {
        self.world.query::<&Kind>().iter(&self.world).count()
    }

    pub fn is_alive(&self, handle: AgentHandle) -> bool {
        self.world.get::<Kind>(handle.entity()).is_some()
    }

    /// Live population per kind.
    pub fn kind_counts(&mut self) -> BTreeMap<ServiceKind, usize> {
        let mut counts = BTreeMap::new();
        for kind in self.world.query::<&Kind>().iter(&self.world) {
            *counts.entry(kind.0).or_insert(0) += 1;
        }
        counts
    }

    pub fn ledger(&self) -> &[Milestone] {
        self.world.resource::<AchievementLedger>().milestones()
    }

    /// `(achieved, total)` for one relation type.
    pub fn achievement_progress(&self, relation: Relation) -> (usize, usize) {
        self.world.resource::<AchievementLedger>().progress(relation)
    }

    /// Fraction of all milestones achieved.
    pub fn achievement_rate(&self) -> f32 {
        self.world.resource::<AchievementLedger>().total_rate()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.world.resource::<NotificationQueue>().iter().cloned().collect()
    }

    /// Events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.world.resource_mut::<TickEvents>().drain()
    }

    pub fn snapshot(&mut self, triggered_by: &str) -> WorldSnapshot {
        generate_snapshot(&mut self.world, triggered_by)
    }
}
