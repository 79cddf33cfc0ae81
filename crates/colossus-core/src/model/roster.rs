use crate::model::creature::canonical_name;
use core::cmp::Ordering;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Relative strength of a creature type, used to guess which creatures a
/// player keeps and which ones are split off.
pub trait KillValue {
    fn kill_value(&self, name: &str) -> u32;
}

impl<F> KillValue for F
where
    F: Fn(&str) -> u32,
{
    fn kill_value(&self, name: &str) -> u32 {
        self(name)
    }
}

/// Strongest first; names break ties so the order is total.
pub fn rank_order(ranking: &dyn KillValue, a: &str, b: &str) -> Ordering {
    ranking
        .kill_value(b)
        .cmp(&ranking.kill_value(a))
        .then_with(|| a.cmp(b))
}

/// Kill values keyed by creature name. Unlisted creatures rank at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureRoster {
    values: BTreeMap<String, u32>,
}

impl CreatureRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill values of the standard Titan variant.
    pub fn default_titan() -> Self {
        [
            ("Titan", 1242),
            ("Angel", 248),
            ("Archangel", 366),
            ("Behemoth", 240),
            ("Centaur", 122),
            ("Colossus", 404),
            ("Cyclops", 181),
            ("Dragon", 299),
            ("Gargoyle", 124),
            ("Giant", 285),
            ("Gorgon", 189),
            ("Griffon", 208),
            ("Guardian", 245),
            ("Hydra", 309),
            ("Lion", 150),
            ("Minotaur", 165),
            ("Ogre", 121),
            ("Ranger", 169),
            ("Serpent", 361),
            ("Troll", 161),
            ("Unicorn", 244),
            ("Warbear", 180),
            ("Warlock", 213),
            ("Wyvern", 214),
        ]
        .into_iter()
        .collect()
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn insert(&mut self, name: &str, value: u32) {
        self.values.insert(canonical_name(name).to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(canonical_name(name))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, u32)> for CreatureRoster {
    fn from_iter<I: IntoIterator<Item = (&'a str, u32)>>(iter: I) -> Self {
        let mut roster = Self::new();
        for (name, value) in iter {
            roster.insert(name, value);
        }
        roster
    }
}

impl KillValue for CreatureRoster {
    fn kill_value(&self, name: &str) -> u32 {
        self.values
            .get(canonical_name(name))
            .copied()
            .unwrap_or(0)
    }
}
