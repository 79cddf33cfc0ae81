use std::fs;
use std::path::Path;

use colossus_replay::config::ReplayConfig;
use colossus_replay::replay::{ReplayError, ReplayRunner};
use tempfile::tempdir;

const SAMPLE_GAME: &str = include_str!("../../../replay/sample_game.jsonl");

fn load_config(dir: &Path, propagation: &str) -> ReplayConfig {
    let events = dir.join("events.jsonl");
    fs::write(&events, SAMPLE_GAME).expect("write events");
    let yaml = format!(
        r#"
run_id: "smoke"
events: "{events}"
engine:
  propagation: "{propagation}"
  seed: 7
outputs:
  guesses_jsonl: "{guesses}"
  summary_md: "{summary}"
logging:
  enable_structured: false
"#,
        events = events.display(),
        guesses = dir.join("out").join("{run_id}").join("guesses.jsonl").display(),
        summary = dir.join("out").join("{run_id}").join("summary.md").display(),
    );

    let mut cfg: ReplayConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

#[test]
fn sample_game_replays_with_expected_counts() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(dir.path(), "single_level");
    let outputs = config.resolved_outputs();

    let runner = ReplayRunner::new(config, outputs).expect("runner created");
    let summary = runner.run().expect("replay completes");

    assert_eq!(summary.events_applied, 10);
    assert_eq!(summary.events_rejected, 2);
    assert_eq!(summary.legions_written, 3);
    assert!(summary.telemetry_path.is_none());
    assert!(summary.guesses_path.ends_with("smoke/guesses.jsonl"));

    let guesses = fs::read_to_string(&summary.guesses_path).expect("guesses written");
    let rows: Vec<serde_json::Value> = guesses
        .lines()
        .map(|line| serde_json::from_str(line).expect("row is json"))
        .collect();
    assert_eq!(rows.len(), 3);

    let row = |marker: &str| {
        rows.iter()
            .find(|row| row["marker"] == marker)
            .unwrap_or_else(|| panic!("row for {marker}"))
    };
    assert_eq!(row("Rd01")["height"], 4);
    assert_eq!(row("Rd01")["certain"], 4);
    assert_eq!(row("Rd02")["height"], 4);
    assert_eq!(row("Rd02")["certain"], 4);
    assert_eq!(row("Bu01")["height"], 8);
    assert_eq!(row("Bu01")["player"], "Blue");
    assert_eq!(row("Rd02")["run_id"], "smoke");

    let markdown = fs::read_to_string(&summary.summary_path).expect("summary written");
    assert!(markdown.contains("# Split Prediction Summary"));
    assert!(markdown.contains("| total | 10 | 2 |"));
    assert!(markdown.contains("## Red"));
    assert!(markdown.contains("## Blue"));
    assert!(markdown.contains("Rd01(1): Titan Gargoyle Gargoyle Ogre"));
}

#[test]
fn cascade_mode_replays_the_same_game() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(dir.path(), "cascade");
    let outputs = config.resolved_outputs();
    let summary = ReplayRunner::new(config, outputs)
        .expect("runner created")
        .run()
        .expect("replay completes");
    assert_eq!(summary.events_applied, 10);
    assert_eq!(summary.legions_written, 3);
}

#[test]
fn structured_runs_report_a_per_run_telemetry_file() {
    let dir = tempdir().expect("temp dir");
    let mut config = load_config(dir.path(), "single_level");
    config.logging.enable_structured = true;
    let outputs = config.resolved_outputs();
    let summary = ReplayRunner::new(config, outputs)
        .expect("runner created")
        .run()
        .expect("replay completes");
    let telemetry = summary.telemetry_path.expect("telemetry path reported");
    assert_eq!(
        telemetry,
        dir.path().join("out").join("smoke").join("smoke.telemetry.jsonl")
    );
}

#[test]
fn missing_event_log_is_reported() {
    let dir = tempdir().expect("temp dir");
    let mut config = load_config(dir.path(), "single_level");
    config.events = dir.path().join("absent.jsonl").display().to_string();
    let outputs = config.resolved_outputs();
    let err = ReplayRunner::new(config, outputs)
        .expect("runner created")
        .run()
        .expect_err("no event log");
    assert!(matches!(err, ReplayError::Open { .. }));
}

#[test]
fn shipped_config_validates() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../replay/replay.yaml");
    let config = ReplayConfig::from_path(&path).expect("shipped config loads");
    assert_eq!(config.run_id, "sample_game");
    assert!(config.roster.is_none());
}
