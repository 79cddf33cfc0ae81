use serde::{Deserialize, Serialize};

/// One observation about an opponent, as read from a JSON-lines game log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// A player's starting legion entered play.
    Setup {
        player: String,
        marker: String,
        creatures: Vec<String>,
    },
    Split {
        player: String,
        parent: String,
        child: String,
        height: usize,
        /// True when the new legion kept the stronger creatures.
        #[serde(default)]
        flipped: Option<bool>,
        /// Creatures seen moving into the new legion.
        #[serde(default)]
        known: Vec<String>,
    },
    Reveal {
        player: String,
        marker: String,
        creatures: Vec<String>,
        #[serde(default)]
        complete: bool,
    },
    Recruit {
        player: String,
        marker: String,
        creature: String,
    },
    Remove {
        player: String,
        marker: String,
        creatures: Vec<String>,
    },
    Merge {
        player: String,
        marker: String,
        other: String,
    },
}

impl GameEvent {
    pub fn player(&self) -> &str {
        match self {
            GameEvent::Setup { player, .. }
            | GameEvent::Split { player, .. }
            | GameEvent::Reveal { player, .. }
            | GameEvent::Recruit { player, .. }
            | GameEvent::Remove { player, .. }
            | GameEvent::Merge { player, .. } => player,
        }
    }

    /// The legion the event is about.
    pub fn marker(&self) -> &str {
        match self {
            GameEvent::Split { parent, .. } => parent,
            GameEvent::Setup { marker, .. }
            | GameEvent::Reveal { marker, .. }
            | GameEvent::Recruit { marker, .. }
            | GameEvent::Remove { marker, .. }
            | GameEvent::Merge { marker, .. } => marker,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            GameEvent::Setup { .. } => "setup",
            GameEvent::Split { .. } => "split",
            GameEvent::Reveal { .. } => "reveal",
            GameEvent::Recruit { .. } => "recruit",
            GameEvent::Remove { .. } => "remove",
            GameEvent::Merge { .. } => "merge",
        }
    }

    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
