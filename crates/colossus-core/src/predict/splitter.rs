//! Guessing how a legion divides its creatures.
//!
//! The player is assumed to keep the strongest creatures together and split
//! off the weakest ones, except where evidence pins a creature to one half.
//! Every legal division that agrees with the evidence is then enumerated
//! over the creatures the parent is known to hold, with its guessed slots
//! free to go either way, and whatever all divisions share becomes certain.

use core::ops::RangeInclusive;

use super::error::PredictError;
use super::multiset::CreatureMultiset;
use crate::model::creature::{
    ANGEL, CreatureRecord, INITIAL_LEGION_HEIGHT, TITAN, is_lord,
};
use crate::model::roster::{KillValue, rank_order};

pub(crate) struct SplitRequest<'a> {
    pub marker: &'a str,
    pub parent: &'a CreatureMultiset,
    pub weak_size: usize,
    /// Creatures known to sit in the weaker half.
    pub known_weak: &'a CreatureMultiset,
    /// Creatures known to sit in the stronger half.
    pub known_strong: &'a CreatureMultiset,
}

#[derive(Debug)]
pub(crate) struct SplitPlan {
    pub strong: CreatureMultiset,
    pub weak: CreatureMultiset,
}

pub(crate) fn plan_split(
    request: &SplitRequest<'_>,
    ranking: &dyn KillValue,
) -> Result<SplitPlan, PredictError> {
    let parent = request.parent;
    let height = parent.len();
    if height > INITIAL_LEGION_HEIGHT {
        return Err(PredictError::OverHeight {
            marker: request.marker.to_string(),
            height,
        });
    }
    if request.weak_size == 0 || request.weak_size >= height {
        return Err(PredictError::InvalidSplitHeight {
            marker: request.marker.to_string(),
            height,
            child_height: request.weak_size,
        });
    }
    let strong_size = height - request.weak_size;
    for (known, size) in [
        (request.known_weak, request.weak_size),
        (request.known_strong, strong_size),
    ] {
        if known.len() > size {
            return Err(PredictError::TooManyKnown {
                marker: request.marker.to_string(),
                known: known.len(),
                size,
            });
        }
    }

    let initial = height == INITIAL_LEGION_HEIGHT;
    if initial {
        check_initial_split(request)?;
    }

    let mut known_all = request.known_weak.clone();
    known_all.extend(request.known_strong.iter().cloned());
    if !parent.contains_all(&known_all) {
        return Err(PredictError::KnownNotInParent {
            marker: request.marker.to_string(),
            missing: known_all.difference(parent).names(),
        });
    }

    let mut rest = parent.difference(&known_all).names();
    rest.sort_by(|a, b| rank_order(ranking, a, b));
    let mut order = request.known_strong.names();
    let mut tail = request.known_weak.names();
    if initial {
        // Lords ignore kill value here: one leads the kept half, one the split.
        let (mut lords, others): (Vec<String>, Vec<String>) =
            rest.into_iter().partition(|name| is_lord(name));
        rest = others;
        if !tail.iter().any(|name| is_lord(name)) {
            let pinned = lords
                .iter()
                .position(|name| name == ANGEL)
                .or_else(|| lords.iter().position(|name| name == TITAN));
            if let Some(index) = pinned {
                tail.push(lords.remove(index));
            }
        }
        order.extend(lords);
    }
    order.extend(rest);
    order.extend(tail);
    let weak_names = order.split_off(strong_size);

    let (certain_strong, certain_weak) =
        deduce_certain(request, initial).ok_or_else(|| PredictError::NoLegalSplit {
            marker: request.marker.to_string(),
        })?;

    Ok(SplitPlan {
        strong: build_half(&order, certain_strong, ranking),
        weak: build_half(&weak_names, certain_weak, ranking),
    })
}

/// A starting legion splits 4/4 with exactly one lord in each half.
fn check_initial_split(request: &SplitRequest<'_>) -> Result<(), PredictError> {
    let reject = |reason| PredictError::IllegalInitialSplit {
        marker: request.marker.to_string(),
        reason,
    };
    if request.weak_size * 2 != INITIAL_LEGION_HEIGHT {
        return Err(reject("a starting legion splits 4/4"));
    }
    if request.parent.count(TITAN) == 0 || request.parent.count(ANGEL) == 0 {
        return Err(reject("a starting legion holds both a Titan and an Angel"));
    }
    for known in [request.known_weak, request.known_strong] {
        let lords = known.count(TITAN) + known.count(ANGEL);
        if lords > 1 {
            return Err(reject("each half takes exactly one lord"));
        }
        if lords == 0 && known.len() == request.weak_size {
            return Err(reject("a fully known half has no lord"));
        }
    }
    Ok(())
}

struct Kind {
    name: String,
    count: usize,
    min: usize,
    max: usize,
}

struct Search {
    kinds: Vec<Kind>,
    /// Guessed slots of the parent; each may land in either half.
    wildcards: usize,
    /// Lords the weak half may take from the settled creatures.
    lords: RangeInclusive<usize>,
    found: bool,
    min_weak: Vec<usize>,
    min_strong: Vec<usize>,
}

/// Creatures present in the same half under every legal division.
/// Returns `None` when no legal division agrees with the evidence.
fn deduce_certain(
    request: &SplitRequest<'_>,
    initial: bool,
) -> Option<(CreatureMultiset, CreatureMultiset)> {
    let mut known_all = request.known_weak.clone();
    known_all.extend(request.known_strong.iter().cloned());
    // Evidence settles a creature even where the parent only guessed it.
    let mut settled = request.parent.certain();
    let confirmed = known_all.difference(&settled);
    settled.extend(confirmed);

    let mut kinds: Vec<Kind> = Vec::new();
    for record in &settled {
        if kinds.iter().any(|kind| kind.name == record.name()) {
            continue;
        }
        let count = settled.count(record.name());
        kinds.push(Kind {
            name: record.name().to_string(),
            count,
            min: request.known_weak.count(record.name()),
            max: count.saturating_sub(request.known_strong.count(record.name())),
        });
    }

    let lord_count = |bag: &CreatureMultiset| {
        bag.iter()
            .filter(|record| is_lord(record.name()))
            .count()
    };
    let settled_lords = lord_count(&settled);
    let lords = if !initial {
        0..=usize::MAX
    } else if settled_lords == lord_count(request.parent) {
        1..=1
    } else {
        settled_lords.saturating_sub(1)..=1
    };

    let slots = kinds.len();
    let mut search = Search {
        kinds,
        wildcards: request.parent.len().saturating_sub(settled.len()),
        lords,
        found: false,
        min_weak: vec![usize::MAX; slots],
        min_strong: vec![usize::MAX; slots],
    };
    let mut chosen = Vec::with_capacity(slots);
    search.explore(request.weak_size, 0, &mut chosen);
    if !search.found {
        return None;
    }

    let mut strong = CreatureMultiset::new();
    let mut weak = CreatureMultiset::new();
    for (index, kind) in search.kinds.iter().enumerate() {
        for _ in 0..search.min_strong[index] {
            strong.push(CreatureRecord::new(&kind.name, true, true));
        }
        for _ in 0..search.min_weak[index] {
            weak.push(CreatureRecord::new(&kind.name, true, true));
        }
    }
    Some((strong, weak))
}

impl Search {
    fn explore(&mut self, remaining: usize, lords: usize, chosen: &mut Vec<usize>) {
        let index = chosen.len();
        if index == self.kinds.len() {
            if remaining <= self.wildcards && self.lords.contains(&lords) {
                self.found = true;
                for (slot, kind) in self.kinds.iter().enumerate() {
                    self.min_weak[slot] = self.min_weak[slot].min(chosen[slot]);
                    self.min_strong[slot] = self.min_strong[slot].min(kind.count - chosen[slot]);
                }
            }
            return;
        }

        let (min, max, lordly) = {
            let kind = &self.kinds[index];
            (kind.min, kind.max.min(remaining), is_lord(&kind.name))
        };
        if min > max {
            return;
        }
        for take in min..=max {
            let lords = if lordly { lords + take } else { lords };
            chosen.push(take);
            self.explore(remaining - take, lords, chosen);
            chosen.pop();
        }
    }
}

fn build_half(
    names: &[String],
    mut certain: CreatureMultiset,
    ranking: &dyn KillValue,
) -> CreatureMultiset {
    let mut half: CreatureMultiset = names
        .iter()
        .map(|name| {
            let known = certain.remove_one(name).is_some();
            CreatureRecord::new(name, known, true)
        })
        .collect();
    half.sort_by_rank(ranking);
    half
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::roster::CreatureRoster;

    fn known(names: &[&str]) -> CreatureMultiset {
        CreatureMultiset::from_names(names, true, true)
    }

    fn starting_legion() -> CreatureMultiset {
        known(&[
            "Titan", "Angel", "Centaur", "Centaur", "Gargoyle", "Gargoyle", "Ogre", "Ogre",
        ])
    }

    fn certain_names(half: &CreatureMultiset) -> Vec<String> {
        half.certain().names()
    }

    #[test]
    fn weakest_creatures_are_split_off() {
        let roster = CreatureRoster::default_titan();
        let parent = known(&["Troll", "Lion", "Lion", "Centaur", "Ogre"]);
        let none = CreatureMultiset::new();
        let plan = plan_split(
            &SplitRequest {
                marker: "Bk03",
                parent: &parent,
                weak_size: 2,
                known_weak: &none,
                known_strong: &none,
            },
            &roster,
        )
        .unwrap();
        assert_eq!(plan.weak, known(&["Centaur", "Ogre"]));
        assert_eq!(plan.strong, known(&["Troll", "Lion", "Lion"]));
        assert!(plan.weak.certain().is_empty());
        assert!(plan.strong.certain().is_empty());
    }

    #[test]
    fn initial_split_sends_angel_with_known_splitoffs() {
        let roster = CreatureRoster::default_titan();
        let parent = starting_legion();
        let splitoffs = known(&["Centaur", "Centaur"]);
        let none = CreatureMultiset::new();
        let plan = plan_split(
            &SplitRequest {
                marker: "Rd01",
                parent: &parent,
                weak_size: 4,
                known_weak: &splitoffs,
                known_strong: &none,
            },
            &roster,
        )
        .unwrap();
        assert_eq!(plan.weak, known(&["Angel", "Centaur", "Centaur", "Ogre"]));
        assert_eq!(plan.strong, known(&["Titan", "Gargoyle", "Gargoyle", "Ogre"]));
        assert_eq!(certain_names(&plan.weak), vec!["Centaur", "Centaur"]);
        assert_eq!(certain_names(&plan.strong), vec!["Gargoyle", "Ogre"]);
    }

    #[test]
    fn known_angel_in_kept_half_sends_titan_away() {
        let roster = CreatureRoster::default_titan();
        let parent = starting_legion();
        let kept = known(&["Angel"]);
        let none = CreatureMultiset::new();
        let plan = plan_split(
            &SplitRequest {
                marker: "Rd01",
                parent: &parent,
                weak_size: 4,
                known_weak: &none,
                known_strong: &kept,
            },
            &roster,
        )
        .unwrap();
        assert_eq!(plan.weak.count(TITAN), 1);
        assert_eq!(plan.strong.count(ANGEL), 1);
        assert!(plan.strong.find(ANGEL).unwrap().is_certain());
    }

    #[test]
    fn full_knowledge_of_one_half_settles_the_other() {
        let roster = CreatureRoster::default_titan();
        let parent = starting_legion();
        let weak = known(&["Angel", "Centaur", "Centaur", "Ogre"]);
        let none = CreatureMultiset::new();
        let plan = plan_split(
            &SplitRequest {
                marker: "Rd01",
                parent: &parent,
                weak_size: 4,
                known_weak: &weak,
                known_strong: &none,
            },
            &roster,
        )
        .unwrap();
        assert!(plan.strong.all_certain());
        assert_eq!(plan.strong, known(&["Titan", "Gargoyle", "Gargoyle", "Ogre"]));
    }

    #[test]
    fn uneven_initial_split_is_rejected() {
        let roster = CreatureRoster::default_titan();
        let parent = starting_legion();
        let none = CreatureMultiset::new();
        let err = plan_split(
            &SplitRequest {
                marker: "Rd01",
                parent: &parent,
                weak_size: 3,
                known_weak: &none,
                known_strong: &none,
            },
            &roster,
        )
        .unwrap_err();
        assert!(matches!(err, PredictError::IllegalInitialSplit { .. }));
    }

    #[test]
    fn lordless_known_half_is_rejected() {
        let roster = CreatureRoster::default_titan();
        let parent = starting_legion();
        let weak = known(&["Gargoyle", "Centaur", "Centaur", "Ogre"]);
        let none = CreatureMultiset::new();
        let err = plan_split(
            &SplitRequest {
                marker: "Rd01",
                parent: &parent,
                weak_size: 4,
                known_weak: &weak,
                known_strong: &none,
            },
            &roster,
        )
        .unwrap_err();
        assert!(matches!(err, PredictError::IllegalInitialSplit { .. }));
    }

    #[test]
    fn known_creatures_must_come_from_parent() {
        let roster = CreatureRoster::default_titan();
        let parent = known(&["Troll", "Ogre", "Ogre"]);
        let weak = known(&["Lion"]);
        let none = CreatureMultiset::new();
        let err = plan_split(
            &SplitRequest {
                marker: "Gr07",
                parent: &parent,
                weak_size: 1,
                known_weak: &weak,
                known_strong: &none,
            },
            &roster,
        )
        .unwrap_err();
        assert_eq!(
            err,
            PredictError::KnownNotInParent {
                marker: "Gr07".to_string(),
                missing: vec!["Lion".to_string()],
            }
        );
    }

    #[test]
    fn too_many_known_splitoffs_are_rejected() {
        let roster = CreatureRoster::default_titan();
        let parent = known(&["Troll", "Ogre", "Ogre"]);
        let weak = known(&["Ogre", "Ogre"]);
        let none = CreatureMultiset::new();
        let err = plan_split(
            &SplitRequest {
                marker: "Gr07",
                parent: &parent,
                weak_size: 1,
                known_weak: &weak,
                known_strong: &none,
            },
            &roster,
        )
        .unwrap_err();
        assert!(matches!(err, PredictError::TooManyKnown { known: 2, size: 1, .. }));
    }

    fn lords(half: &CreatureMultiset) -> usize {
        half.count(TITAN) + half.count(ANGEL)
    }

    #[test]
    fn initial_split_keeps_one_lord_per_half_under_any_ranking() {
        let flat = |_: &str| -> u32 { 0 };
        let titanless: CreatureRoster = [
            ("Angel", 248),
            ("Centaur", 122),
            ("Gargoyle", 124),
            ("Ogre", 121),
        ]
        .into_iter()
        .collect();
        let rankings: [&dyn KillValue; 2] = [&flat, &titanless];

        let parent = starting_legion();
        let none = CreatureMultiset::new();
        for ranking in rankings {
            let plan = plan_split(
                &SplitRequest {
                    marker: "Rd01",
                    parent: &parent,
                    weak_size: 4,
                    known_weak: &none,
                    known_strong: &none,
                },
                ranking,
            )
            .unwrap();
            assert_eq!(lords(&plan.strong), 1, "strong half {:?}", plan.strong.names());
            assert_eq!(lords(&plan.weak), 1, "weak half {:?}", plan.weak.names());
            assert_eq!(plan.weak.count(ANGEL), 1);
        }
    }

    #[test]
    fn guessed_slots_do_not_hide_what_must_stay() {
        let roster = CreatureRoster::default_titan();
        let mut parent = known(&["Ranger", "Ranger", "Ranger", "Troll"]);
        parent.push(CreatureRecord::new("Troll", false, true));
        let none = CreatureMultiset::new();
        let plan = plan_split(
            &SplitRequest {
                marker: "Bu01",
                parent: &parent,
                weak_size: 2,
                known_weak: &none,
                known_strong: &none,
            },
            &roster,
        )
        .unwrap();
        assert_eq!(plan.strong, known(&["Ranger", "Ranger", "Ranger"]));
        assert_eq!(certain_names(&plan.strong), vec!["Ranger"]);
        assert!(plan.weak.certain().is_empty());
    }

    #[test]
    fn uncertain_parent_only_trusts_evidence() {
        let roster = CreatureRoster::default_titan();
        let parent = CreatureMultiset::from_names(["Troll", "Troll", "Ogre"], false, true);
        let weak = known(&["Troll"]);
        let none = CreatureMultiset::new();
        let plan = plan_split(
            &SplitRequest {
                marker: "Gr07",
                parent: &parent,
                weak_size: 1,
                known_weak: &weak,
                known_strong: &none,
            },
            &roster,
        )
        .unwrap();
        assert_eq!(plan.weak, known(&["Troll"]));
        assert!(plan.weak.all_certain());
        assert!(plan.strong.certain().is_empty());
    }
}
