//! Event Collection
//!
//! Systems push [`SimEvent`]s into [`TickEvents`]; the facade drains them and
//! the runner hands them to an [`EventLogger`].

use bevy_ecs::prelude::*;
use iconlife_events::SimEvent;

pub mod logger;

pub use logger::EventLogger;

/// Events produced since the last drain
#[derive(Resource, Debug, Default)]
pub struct TickEvents {
    events: Vec<SimEvent>,
}

impl TickEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
