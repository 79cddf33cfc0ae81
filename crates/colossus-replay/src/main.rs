use std::path::PathBuf;

use clap::Parser;

use colossus_core::predict::Propagation;
use colossus_replay::config::{ReplayConfig, ResolvedOutputs};
use colossus_replay::logging::init_logging;
use colossus_replay::replay::ReplayRunner;

/// Replays a recorded Colossus game through the split predictor.
#[derive(Debug, Parser)]
#[command(
    name = "colossus-replay",
    author,
    version,
    about = "Replay a Colossus game log and report predicted legion contents"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "replay/replay.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the game log to replay.
    #[arg(long, value_name = "FILE")]
    events: Option<String>,

    /// Override the seed of the even-split coin.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override how far reveals propagate (single_level or cascade).
    #[arg(long, value_name = "MODE")]
    propagation: Option<Propagation>,

    /// Exit after validating the configuration (nothing is replayed).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ReplayConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(events) = cli.events {
        config.events = events;
    }

    if let Some(seed) = cli.seed {
        config.engine.seed = Some(seed);
    }

    if let Some(propagation) = cli.propagation {
        config.engine.propagation = propagation;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    println!(
        "Loaded configuration '{run_id}' replaying {} ({} propagation)",
        outputs.events.display(),
        config.engine.propagation
    );

    let _logging_guard = init_logging(&config, &outputs)?;
    let runner = ReplayRunner::new(config, outputs)?;

    if cli.validate_only {
        println!(
            "Validation-only mode: roster of {} creatures loaded, replay skipped.",
            runner.roster().len()
        );
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Replay complete for '{run_id}': {} events applied, {} rejected, {} legions at {}",
        summary.events_applied,
        summary.events_rejected,
        summary.legions_written,
        summary.guesses_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
