use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use colossus_core::game::PredictionBook;
use colossus_core::model::creature::CreatureRecord;
use serde::Serialize;

use crate::config::ReplayConfig;
use crate::replay::ReplayError;

/// Accepted and rejected events per event kind.
#[derive(Debug, Default)]
pub struct EventTally {
    per_kind: BTreeMap<&'static str, (usize, usize)>,
}

impl EventTally {
    pub fn applied(&mut self, kind: &'static str) {
        self.per_kind.entry(kind).or_default().0 += 1;
    }

    pub fn rejected(&mut self, kind: &'static str) {
        self.per_kind.entry(kind).or_default().1 += 1;
    }

    pub fn total_applied(&self) -> usize {
        self.per_kind.values().map(|(applied, _)| applied).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.per_kind.values().map(|(_, rejected)| rejected).sum()
    }
}

/// One live legion's prediction at the end of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct GuessRow {
    pub run_id: String,
    pub player: String,
    pub marker: String,
    pub height: usize,
    pub certain: usize,
    pub creatures: Vec<CreatureRecord>,
}

impl GuessRow {
    pub fn collect(run_id: &str, book: &PredictionBook) -> Vec<Self> {
        book.snapshot()
            .into_iter()
            .map(|(player, marker, creatures)| GuessRow {
                run_id: run_id.to_string(),
                player,
                marker,
                height: creatures.len(),
                certain: creatures.iter().filter(|record| record.is_certain()).count(),
                creatures,
            })
            .collect()
    }

    fn rendered(&self) -> String {
        self.creatures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn write_guess_rows(path: &Path, rows: &[GuessRow]) -> Result<(), ReplayError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary(
    path: &Path,
    config: &ReplayConfig,
    tally: &EventTally,
    book: &PredictionBook,
) -> Result<(), ReplayError> {
    let mut out = String::new();
    out.push_str("# Split Prediction Summary\n\n");
    let _ = writeln!(out, "Run: `{}`", config.run_id);
    let _ = writeln!(
        out,
        "Propagation: {}, seed: {}\n",
        config.engine.propagation,
        config
            .engine
            .seed
            .map_or_else(|| "entropy".to_string(), |seed| seed.to_string())
    );

    out.push_str("| Event | Applied | Rejected |\n");
    out.push_str("|-------|---------|----------|\n");
    for (kind, (applied, rejected)) in &tally.per_kind {
        let _ = writeln!(out, "| {kind} | {applied} | {rejected} |");
    }
    let _ = writeln!(
        out,
        "| total | {} | {} |",
        tally.total_applied(),
        tally.total_rejected()
    );

    let rows = GuessRow::collect(&config.run_id, book);
    for player in book.players() {
        let _ = writeln!(out, "\n## {player}\n");
        out.push_str("| Marker | Height | Certain | Prediction |\n");
        out.push_str("|--------|--------|---------|------------|\n");
        for row in rows.iter().filter(|row| row.player == player) {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                row.marker,
                row.height,
                row.certain,
                row.rendered()
            );
        }

        if let Some(predictor) = book.predictor(player) {
            out.push_str("\n```text\n");
            for id in predictor.nodes() {
                let _ = writeln!(out, "{}", predictor.node(id));
            }
            out.push_str("```\n");
        }
    }

    fs::write(path, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_per_kind() {
        let mut tally = EventTally::default();
        tally.applied("split");
        tally.applied("split");
        tally.rejected("reveal");
        assert_eq!(tally.total_applied(), 2);
        assert_eq!(tally.total_rejected(), 1);
        assert_eq!(tally.per_kind["reveal"], (0, 1));
    }

    #[test]
    fn guess_row_renders_flags() {
        let row = GuessRow {
            run_id: "r".into(),
            player: "Red".into(),
            marker: "Rd01".into(),
            height: 2,
            certain: 1,
            creatures: vec![
                CreatureRecord::new("Titan", true, true),
                CreatureRecord::new("Ogre", false, false),
            ],
        };
        assert_eq!(row.rendered(), "Titan Ogre?*");
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"at_split\":false"));
    }
}
