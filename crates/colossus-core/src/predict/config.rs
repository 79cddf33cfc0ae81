use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// How far evidence from a revealed legion travels through the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    /// The parent absorbs the reveal and re-splits its two children.
    #[default]
    SingleLevel,
    /// Corrections keep climbing to the root and re-splits descend into
    /// every split child below the corrected node.
    Cascade,
}

impl Propagation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Propagation::SingleLevel => "single_level",
            Propagation::Cascade => "cascade",
        }
    }
}

impl fmt::Display for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Propagation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "single_level" | "single" => Ok(Propagation::SingleLevel),
            "cascade" => Ok(Propagation::Cascade),
            other => Err(format!("unknown propagation mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictorConfig {
    #[serde(default)]
    pub propagation: Propagation,
    /// Seeds the coin flip used when an even split gives no hint which
    /// half is the weaker one. Unseeded predictors draw from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl PredictorConfig {
    pub fn cascade() -> Self {
        Self {
            propagation: Propagation::Cascade,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
