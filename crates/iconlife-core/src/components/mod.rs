//! ECS Components
//!
//! Per-agent components and the world resources they are simulated against.

pub mod agent;
pub mod contact;
pub mod motion;
pub mod world;

pub use agent::*;
pub use contact::*;
pub use motion::*;
pub use world::*;
