use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{Level, event};
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{ReplayConfig, ResolvedOutputs};

/// Targets logged at the configured level; all others log at warn.
const REPLAY_TARGETS: [&str; 3] = [
    "colossus_core::predict",
    "colossus_core::book",
    "colossus_replay",
];

pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Installs the JSON subscriber for one replay run. Returns `None` when
/// structured logging is disabled.
pub fn init_logging(
    config: &ReplayConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !config.logging.enable_structured {
        return Ok(None);
    }

    let telemetry_path = outputs.telemetry_jsonl.clone();
    if let Some(dir) = telemetry_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating telemetry directory at {}", dir.display()))?;
    }
    let file = File::create(&telemetry_path)
        .with_context(|| format!("creating telemetry file at {}", telemetry_path.display()))?;

    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let level = config.logging.level().unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // A global subscriber may already be installed, e.g. by a test harness.
    let _ = tracing::subscriber::set_global_default(subscriber);

    event!(
        target: "colossus_replay::replay",
        Level::INFO,
        run_id = %config.run_id,
        events = %outputs.events.display(),
        propagation = %config.engine.propagation,
        seed = ?config.engine.seed,
        "replay telemetry started"
    );

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}

fn filter_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        REPLAY_TARGETS
            .iter()
            .map(|target| format!("{target}={level}")),
    );
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_raises_only_replay_targets() {
        assert_eq!(
            filter_directives(Level::DEBUG),
            "warn,colossus_core::predict=debug,colossus_core::book=debug,colossus_replay=debug"
        );
    }
}
