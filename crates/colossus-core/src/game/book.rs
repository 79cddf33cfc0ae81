use super::events::GameEvent;
use crate::model::creature::CreatureRecord;
use crate::model::roster::CreatureRoster;
use crate::predict::{PredictError, PredictorConfig, SplitPredictor};
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    #[error("player {0} has no starting legion yet")]
    UnknownPlayer(String),
    #[error("player {0} was already set up")]
    DuplicatePlayer(String),
    #[error(transparent)]
    Predict(#[from] PredictError),
}

/// One [`SplitPredictor`] per opponent, fed from a stream of game events.
pub struct PredictionBook {
    roster: CreatureRoster,
    config: PredictorConfig,
    predictors: Vec<SplitPredictor>,
}

impl PredictionBook {
    pub fn new(roster: CreatureRoster, config: PredictorConfig) -> Self {
        Self {
            roster,
            config,
            predictors: Vec::new(),
        }
    }

    pub fn players(&self) -> impl Iterator<Item = &str> {
        self.predictors.iter().map(SplitPredictor::player)
    }

    pub fn predictor(&self, player: &str) -> Option<&SplitPredictor> {
        self.predictors
            .iter()
            .find(|predictor| predictor.player() == player)
    }

    fn predictor_mut(&mut self, player: &str) -> Result<&mut SplitPredictor, BookError> {
        self.predictors
            .iter_mut()
            .find(|predictor| predictor.player() == player)
            .ok_or_else(|| BookError::UnknownPlayer(player.to_string()))
    }

    pub fn apply(&mut self, event: &GameEvent) -> Result<(), BookError> {
        event!(
            target: "colossus_core::book",
            Level::TRACE,
            player = event.player(),
            kind = event.kind(),
            marker = event.marker(),
            "applying event"
        );
        match event {
            GameEvent::Setup {
                player,
                marker,
                creatures,
            } => {
                if self.predictor(player).is_some() {
                    return Err(BookError::DuplicatePlayer(player.clone()));
                }
                // Offset the seed so opponents do not share one coin.
                let mut config = self.config.clone();
                config.seed = config
                    .seed
                    .map(|seed| seed.wrapping_add(self.predictors.len() as u64));
                self.predictors.push(SplitPredictor::new(
                    player,
                    marker,
                    creatures,
                    self.roster.clone(),
                    config,
                ));
            }
            GameEvent::Split {
                player,
                parent,
                child,
                height,
                flipped,
                known,
            } => {
                let known: Vec<&str> = known.iter().map(String::as_str).collect();
                self.predictor_mut(player)?
                    .split(parent, *height, child, *flipped, &known)?;
            }
            GameEvent::Reveal {
                player,
                marker,
                creatures,
                complete,
            } => {
                let creatures: Vec<&str> = creatures.iter().map(String::as_str).collect();
                self.predictor_mut(player)?
                    .reveal(marker, &creatures, *complete)?;
            }
            GameEvent::Recruit {
                player,
                marker,
                creature,
            } => {
                self.predictor_mut(player)?.recruit(marker, creature)?;
            }
            GameEvent::Remove {
                player,
                marker,
                creatures,
            } => {
                let creatures: Vec<&str> = creatures.iter().map(String::as_str).collect();
                self.predictor_mut(player)?.remove(marker, &creatures)?;
            }
            GameEvent::Merge {
                player,
                marker,
                other,
            } => {
                self.predictor_mut(player)?.merge(marker, other)?;
            }
        }
        Ok(())
    }

    pub fn best_guess(&self, player: &str, marker: &str) -> Option<Vec<CreatureRecord>> {
        self.predictor(player)?.best_guess(marker)
    }

    /// Looks the marker up across every player. Markers are unique per
    /// player colour, so at most one live legion matches.
    pub fn best_guess_any(&self, marker: &str) -> Option<Vec<CreatureRecord>> {
        self.predictors
            .iter()
            .find_map(|predictor| predictor.best_guess(marker))
    }

    /// Live legions of every player as `(player, marker, guess)`, in setup
    /// order and then by marker.
    pub fn snapshot(&self) -> Vec<(String, String, Vec<CreatureRecord>)> {
        let mut rows = Vec::new();
        for predictor in &self.predictors {
            let mut markers: Vec<&str> = predictor
                .leaves()
                .into_iter()
                .map(|id| predictor.node(id).marker())
                .collect();
            markers.sort_unstable();
            for marker in markers {
                if let Some(guess) = predictor.best_guess(marker) {
                    rows.push((predictor.player().to_string(), marker.to_string(), guess));
                }
            }
        }
        rows
    }
}
