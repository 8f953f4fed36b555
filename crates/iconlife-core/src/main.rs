//! Headless icon-life runner
//!
//! Populates the arena, runs a fixed number of ticks and writes snapshots,
//! the event log and a statistics summary.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use iconlife_core::config::{Config, ConfigError, DEFAULT_TUNING_PATH};
use iconlife_core::events::EventLogger;
use iconlife_core::output::{self, OutputError, SnapshotGenerator, StatsCollector};
use iconlife_core::{setup, Simulation};

/// Command line arguments for the runner
#[derive(Parser, Debug)]
#[command(name = "iconlife")]
#[command(about = "Headless cloud-service icon simulation")]
struct Args {
    /// Random seed for reproducibility (defaults to the tuning file's seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,

    /// Tuning file; tuning.toml is used when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interval between world snapshots (in ticks)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Initial agents per service kind
    #[arg(long)]
    per_kind: Option<usize>,

    /// Directory for snapshots, events and stats
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Run without writing any files
    #[arg(long)]
    no_output: bool,

    /// Write the default tuning to the config path and exit
    #[arg(long)]
    write_default_config: bool,
}

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<Config, RunError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_TUNING_PATH).exists() => Config::load_or_default(DEFAULT_TUNING_PATH),
        None => Config::default(),
    };
    if let Some(interval) = args.snapshot_interval {
        config.simulation.snapshot_interval = interval;
    }
    if let Some(per_kind) = args.per_kind {
        config.spawn.per_kind = per_kind;
    }
    Ok(config)
}

fn write_default_config(args: &Args) -> Result<(), RunError> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TUNING_PATH));
    let toml = Config::default().to_toml()?;
    std::fs::write(&path, toml).map_err(OutputError::from)?;
    tracing::info!(path = %path.display(), "wrote default tuning");
    Ok(())
}

fn run(args: Args) -> Result<(), RunError> {
    if args.write_default_config {
        return write_default_config(&args);
    }

    let config = load_config(&args)?;
    let seed = args.seed.unwrap_or(config.simulation.seed);
    let ticks = args.ticks.unwrap_or(config.simulation.default_ticks);
    let per_kind = config.spawn.per_kind;
    let write_files = !args.no_output;
    let output_dir = args.output_dir;

    tracing::info!(seed, ticks, per_kind, "starting simulation");

    let mut logger = if write_files {
        std::fs::create_dir_all(&output_dir).map_err(OutputError::from)?;
        EventLogger::new(output_dir.join("events.jsonl")).map_err(OutputError::from)?
    } else {
        EventLogger::null()
    };

    let mut sim = Simulation::new(config, seed)?;
    sim.populate(per_kind);
    let summary = setup::get_spawn_summary(sim.world_mut());
    tracing::info!(agents = summary.total_agents, by_kind = ?summary.by_kind, "spawned initial population");

    let mut stats = StatsCollector::new();
    let initial_events = sim.drain_events();
    logger.log_batch(&initial_events).map_err(OutputError::from)?;

    let initial = sim.snapshot("simulation_start");
    if write_files {
        output::write_snapshot_to_dir(&initial, &output_dir)?;
        output::write_current_state(&initial, &output_dir)?;
    }

    for _ in 0..ticks {
        sim.tick();
        let tick = sim.tick_count();

        let events = sim.drain_events();
        logger.log_batch(&events).map_err(OutputError::from)?;
        let population = sim.agent_count();
        stats.record_tick(tick, population, &events);

        let due = sim.world().resource::<SnapshotGenerator>().should_snapshot(tick);
        if due {
            let snapshot = sim.snapshot("periodic");
            if write_files {
                output::write_snapshot_to_dir(&snapshot, &output_dir)?;
                output::write_current_state(&snapshot, &output_dir)?;
            }
        }

        if tick % 100 == 0 {
            tracing::info!(
                tick,
                population,
                achievement_rate = sim.achievement_rate(),
                "progress"
            );
        }
    }

    let last = sim.snapshot("simulation_end");
    let kind_counts = last.stats.kind_counts.clone();
    let summary = stats.generate_stats(ticks, kind_counts);
    if write_files {
        output::write_snapshot_to_dir(&last, &output_dir)?;
        output::write_current_state(&last, &output_dir)?;
        output::write_stats(&summary, output_dir.join("stats.json"))?;
        logger.flush().map_err(OutputError::from)?;
    }

    tracing::info!(
        ticks,
        events = logger.event_count(),
        population = summary.final_population,
        milestones = last.stats.total_achieved(),
        snapshots = sim.world().resource::<SnapshotGenerator>().snapshot_count(),
        "simulation complete"
    );
    Ok(())
}
