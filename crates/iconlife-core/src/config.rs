//! Configuration System
//!
//! Loads tuning parameters from tuning.toml for easy adjustment without recompiling.
//! Every section falls back to its defaults, so a partial file is valid.

use bevy_ecs::prelude::*;
use iconlife_events::ServiceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub arena: ArenaConfig,
    pub motion: MotionConfig,
    pub overlap: OverlapConfig,
    pub interaction: InteractionConfig,
    pub health: HealthConfig,
    pub ledger: LedgerConfig,
    pub spawn: SpawnConfig,
}

/// Run parameters for the headless runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub default_ticks: u64,
    pub snapshot_interval: u64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            default_ticks: 3600,
            snapshot_interval: 600,
            seed: 42,
        }
    }
}

/// Arena geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    /// Edge length of an icon; the collision radius is half of it
    pub icon_size: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 650.0,
            icon_size: 50.0,
        }
    }
}

/// Speed limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub default_max_velocity: f32,
    /// Per-kind overrides keyed by kind key (`function`, `router`, ...)
    pub max_velocity: BTreeMap<String, f32>,
    /// Initial velocity components are drawn from `[-spawn_speed, spawn_speed]`
    pub spawn_speed: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        let mut max_velocity = BTreeMap::new();
        max_velocity.insert(ServiceKind::Function.key().to_string(), 5.0);
        max_velocity.insert(ServiceKind::Router.key().to_string(), 4.0);
        Self {
            default_max_velocity: 3.0,
            max_velocity,
            spawn_speed: 2.0,
        }
    }
}

/// Overlap resolver parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapConfig {
    pub separation_force: f32,
    /// Penetration depth above which a pair counts as deeply overlapping
    pub overlap_threshold: f32,
    /// Consecutive deep-overlap ticks before an agent is stuck
    pub stuck_threshold: u32,
    pub stuck_force_multiplier: f32,
    /// Maximum jitter component added while stuck
    pub stuck_jitter: f32,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            separation_force: 0.5,
            overlap_threshold: 30.0,
            stuck_threshold: 60,
            stuck_force_multiplier: 2.0,
            stuck_jitter: 0.1,
        }
    }
}

/// Interaction tracker parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pairs closer than this record each other as last interaction
    pub interaction_radius: f32,
    /// Display timer set on both sides of a new link
    pub link_duration: u32,
    /// Fraction of box penetration resolved per collision
    pub collision_push: f32,
    /// Maximum velocity perturbation after a velocity swap
    pub perturbation: f32,
    pub complementary_health_bonus: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            interaction_radius: 80.0,
            link_duration: 30,
            collision_push: 0.5,
            perturbation: 0.1,
            complementary_health_bonus: 0.2,
        }
    }
}

/// Dependency health parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub max_health: f32,
    pub recovery_rate: f32,
    pub dependency_radius: f32,
    /// Per-tick decay while a dependency is unmet, keyed by kind key
    pub decay: BTreeMap<String, f32>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        let mut decay = BTreeMap::new();
        for (kind, rate) in [
            (ServiceKind::Compute, 0.1),
            (ServiceKind::Database, 0.1),
            (ServiceKind::Router, 0.1),
            (ServiceKind::EdgeCache, 0.1),
            (ServiceKind::Function, 0.05),
            (ServiceKind::BlockVolume, 0.05),
            (ServiceKind::ScalingController, 0.05),
            (ServiceKind::KeyValueTable, 0.05),
        ] {
            decay.insert(kind.key().to_string(), rate);
        }
        Self {
            max_health: 100.0,
            recovery_rate: 0.05,
            dependency_radius: 150.0,
            decay,
        }
    }
}

/// Achievement ledger parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub milestone_radius: f32,
    /// Ticks a notification stays visible
    pub notification_duration: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            milestone_radius: 150.0,
            notification_duration: 180,
        }
    }
}

/// Initial population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub per_kind: usize,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self { per_kind: 1 }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a path, or use defaults if it cannot be loaded
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "using default tuning");
            Self::default()
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let arena = &self.arena;
        if !(arena.width > 0.0 && arena.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "arena must have positive size, got {}x{}",
                arena.width, arena.height
            )));
        }
        if !(arena.icon_size > 0.0) {
            return Err(ConfigError::Invalid("icon_size must be positive".into()));
        }
        if arena.icon_size >= arena.width.min(arena.height) {
            return Err(ConfigError::Invalid(format!(
                "icon_size {} does not fit in the arena",
                arena.icon_size
            )));
        }
        if !(self.motion.default_max_velocity > 0.0) {
            return Err(ConfigError::Invalid(
                "default_max_velocity must be positive".into(),
            ));
        }
        if !(self.health.max_health > 0.0) {
            return Err(ConfigError::Invalid("max_health must be positive".into()));
        }

        for (name, value) in [
            ("separation_force", self.overlap.separation_force),
            ("overlap_threshold", self.overlap.overlap_threshold),
            ("stuck_force_multiplier", self.overlap.stuck_force_multiplier),
            ("stuck_jitter", self.overlap.stuck_jitter),
            ("interaction_radius", self.interaction.interaction_radius),
            ("collision_push", self.interaction.collision_push),
            ("perturbation", self.interaction.perturbation),
            (
                "complementary_health_bonus",
                self.interaction.complementary_health_bonus,
            ),
            ("recovery_rate", self.health.recovery_rate),
            ("dependency_radius", self.health.dependency_radius),
            ("milestone_radius", self.ledger.milestone_radius),
            ("spawn_speed", self.motion.spawn_speed),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }

        check_kind_map("motion.max_velocity", &self.motion.max_velocity, |v| v > 0.0)?;
        check_kind_map("health.decay", &self.health.decay, |v| v >= 0.0)?;
        Ok(())
    }

    /// Speed limit for a kind, honouring per-kind overrides.
    pub fn max_velocity_for(&self, kind: ServiceKind) -> f32 {
        self.motion
            .max_velocity
            .get(kind.key())
            .copied()
            .unwrap_or(self.motion.default_max_velocity)
    }

    /// Per-tick health loss while the kind's dependency is unmet.
    pub fn decay_rate_for(&self, kind: ServiceKind) -> f32 {
        self.health.decay.get(kind.key()).copied().unwrap_or(0.0)
    }

    /// Collision radius of an icon.
    pub fn icon_radius(&self) -> f32 {
        self.arena.icon_size / 2.0
    }
}

fn check_kind_map(
    section: &str,
    map: &BTreeMap<String, f32>,
    accept: impl Fn(f32) -> bool,
) -> Result<(), ConfigError> {
    for (key, value) in map {
        if key.parse::<ServiceKind>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "{section}: unknown service kind '{key}'"
            )));
        }
        if !accept(*value) {
            return Err(ConfigError::Invalid(format!(
                "{section}: value {value} for '{key}' is out of range"
            )));
        }
    }
    Ok(())
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.arena.width, 600.0);
        assert_eq!(config.arena.height, 650.0);
        assert_eq!(config.icon_radius(), 25.0);
        assert_eq!(config.overlap.stuck_threshold, 60);
        assert_eq!(config.max_velocity_for(ServiceKind::Function), 5.0);
        assert_eq!(config.max_velocity_for(ServiceKind::Storage), 3.0);
        assert_eq!(config.decay_rate_for(ServiceKind::Compute), 0.1);
        assert_eq!(config.decay_rate_for(ServiceKind::Storage), 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [arena]
            width = 800.0

            [overlap]
            stuck_threshold = 90
            "#,
        )
        .unwrap();
        assert_eq!(config.arena.width, 800.0);
        assert_eq!(config.arena.height, 650.0);
        assert_eq!(config.overlap.stuck_threshold, 90);
        assert_eq!(config.overlap.separation_force, 0.5);
        assert_eq!(config.ledger.notification_duration, 180);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Config::from_toml_str("[arena]\nwidth = -5.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = Config::from_toml_str("[health.decay]\nmainframe = 0.1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = Config::from_toml_str("[arena\nwidth = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_output_parses_back() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[arena]"));
        let parsed = Config::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Config::load_or_default("does/not/exist.toml");
        assert_eq!(config, Config::default());
        assert!(matches!(
            Config::load("does/not/exist.toml"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_shipped_tuning_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../tuning.toml");
        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
    }
}
