use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use colossus_core::game::{GameEvent, PredictionBook};
use colossus_core::model::roster::CreatureRoster;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{ReplayConfig, ResolvedOutputs};
use crate::report::{EventTally, GuessRow, write_guess_rows, write_summary};

/// Drives a [`PredictionBook`] through a recorded game.
pub struct ReplayRunner {
    config: ReplayConfig,
    outputs: ResolvedOutputs,
    roster: CreatureRoster,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    pub events_applied: usize,
    pub events_rejected: usize,
    pub legions_written: usize,
    pub guesses_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
}

impl ReplayRunner {
    /// Build a runner from a validated configuration, loading the roster
    /// up front so a bad table fails before any event is read.
    pub fn new(config: ReplayConfig, outputs: ResolvedOutputs) -> Result<Self, ReplayError> {
        let roster = match outputs.roster.as_ref() {
            Some(path) => load_roster(path)?,
            None => CreatureRoster::default_titan(),
        };
        Ok(Self {
            config,
            outputs,
            roster,
        })
    }

    pub fn roster(&self) -> &CreatureRoster {
        &self.roster
    }

    pub fn run(&self) -> Result<RunSummary, ReplayError> {
        let events = read_events(&self.outputs.events)?;
        let mut book = PredictionBook::new(self.roster.clone(), self.config.engine.clone());
        let mut tally = EventTally::default();

        for (line, game_event) in &events {
            match book.apply(game_event) {
                Ok(()) => tally.applied(game_event.kind()),
                Err(err) => {
                    tally.rejected(game_event.kind());
                    event!(
                        target: "colossus_replay::replay",
                        Level::WARN,
                        run_id = %self.config.run_id,
                        line = *line,
                        kind = game_event.kind(),
                        player = game_event.player(),
                        error = %err,
                        "event rejected"
                    );
                }
            }
        }

        ensure_parent(self.outputs.guesses_jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        let rows = GuessRow::collect(&self.config.run_id, &book);
        write_guess_rows(&self.outputs.guesses_jsonl, &rows)?;
        write_summary(&self.outputs.summary_md, &self.config, &tally, &book)?;

        event!(
            target: "colossus_replay::replay",
            Level::INFO,
            run_id = %self.config.run_id,
            applied = tally.total_applied(),
            rejected = tally.total_rejected(),
            legions = rows.len(),
            "replay complete"
        );

        let telemetry_path = self
            .config
            .logging
            .enable_structured
            .then(|| self.outputs.telemetry_jsonl.clone());

        Ok(RunSummary {
            events_applied: tally.total_applied(),
            events_rejected: tally.total_rejected(),
            legions_written: rows.len(),
            guesses_path: self.outputs.guesses_jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
        })
    }
}

/// Reads a JSON-lines game log. Blank lines and `#` comments are skipped;
/// each event keeps its 1-based line number.
pub fn read_events(path: &Path) -> Result<Vec<(usize, GameEvent)>, ReplayError> {
    let file = File::open(path).map_err(|source| ReplayError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut events = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parsed = GameEvent::from_json(trimmed).map_err(|source| ReplayError::Event {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        events.push((index + 1, parsed));
    }
    Ok(events)
}

/// Loads a kill-value table; YAML maps and JSON objects both parse.
pub fn load_roster(path: &Path) -> Result<CreatureRoster, ReplayError> {
    let file = File::open(path).map_err(|source| ReplayError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let roster: CreatureRoster =
        serde_yaml::from_reader(BufReader::new(file)).map_err(|source| ReplayError::Roster {
            path: path.to_path_buf(),
            source,
        })?;
    if roster.is_empty() {
        return Err(ReplayError::EmptyRoster(path.to_path_buf()));
    }
    Ok(roster)
}

fn ensure_parent(path: Option<&Path>) -> Result<(), ReplayError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize guess row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed event at {path:?} line {line}: {source}")]
    Event {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse roster {path:?}: {source}")]
    Roster {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("roster {0:?} lists no creatures")]
    EmptyRoster(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use colossus_core::model::roster::KillValue;
    use std::io::Write;

    #[test]
    fn reads_events_skipping_blanks_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "# opening").unwrap();
        writeln!(
            file,
            r#"{{"event":"setup","player":"Red","marker":"Rd01","creatures":["Titan","Angel"]}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(
            file,
            r#"{{"event":"recruit","player":"Red","marker":"Rd01","creature":"Ogre"}}"#
        )
        .unwrap();
        drop(file);

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, 2);
        assert_eq!(events[1].0, 4);
        assert_eq!(events[1].1.kind(), "recruit");
    }

    #[test]
    fn malformed_event_reports_its_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        fs::write(&path, "{\"event\":\"setup\"\n").unwrap();
        let err = read_events(&path).unwrap_err();
        assert!(matches!(err, ReplayError::Event { line: 1, .. }));
    }

    #[test]
    fn roster_loads_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.yaml");
        fs::write(&path, "Ogre: 121\nTroll: 161\n").unwrap();
        let roster = load_roster(&path).unwrap();
        assert_eq!(roster.kill_value("Troll"), 161);
        assert_eq!(roster.kill_value("Lion"), 0);
    }

    #[test]
    fn empty_roster_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        fs::write(&path, "{}").unwrap();
        assert!(matches!(
            load_roster(&path).unwrap_err(),
            ReplayError::EmptyRoster(_)
        ));
    }
}
