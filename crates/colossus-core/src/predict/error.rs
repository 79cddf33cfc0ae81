use thiserror::Error;

/// Reasons an update to the prediction tree is rejected. A rejected update
/// leaves the tree as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    #[error("no live legion with marker {0}")]
    UnknownMarker(String),
    #[error("node {0} is not a live legion of this predictor")]
    NotALeaf(usize),
    #[error("marker {0} is already in use")]
    MarkerInUse(String),
    #[error("cannot split {child_height} creatures off {marker} of height {height}")]
    InvalidSplitHeight {
        marker: String,
        height: usize,
        child_height: usize,
    },
    #[error("legion {marker} holds {height} creatures, more than any legion can")]
    OverHeight { marker: String, height: usize },
    #[error("illegal initial split of {marker}: {reason}")]
    IllegalInitialSplit { marker: String, reason: &'static str },
    #[error("{known} known creatures do not fit a {size}-high half of {marker}")]
    TooManyKnown {
        marker: String,
        known: usize,
        size: usize,
    },
    #[error("known creatures {missing:?} are not in {marker}")]
    KnownNotInParent { marker: String, missing: Vec<String> },
    #[error("no legal split of {marker} matches the known creatures")]
    NoLegalSplit { marker: String },
    #[error("revealed {revealed} creatures for {marker} of height {height}")]
    HeightMismatch {
        marker: String,
        revealed: usize,
        height: usize,
    },
    #[error("certain creatures {missing:?} of {marker} are missing from the reveal")]
    CertaintyContradiction { marker: String, missing: Vec<String> },
    #[error("{needed} certain creatures do not fit in {marker} of height {height}")]
    CertaintyOverflow {
        marker: String,
        needed: usize,
        height: usize,
    },
    #[error("legion {0} is already at full height")]
    LegionFull(String),
    #[error("legions {0} and {1} did not come from one split or a split within it")]
    NotSiblings(String, String),
    #[error("neither {0} nor {1} carries their parent's marker")]
    ParentMarkerLost(String, String),
}
