use crate::model::creature::{CreatureRecord, canonical_name};
use crate::model::roster::{KillValue, rank_order};
use serde::Serialize;

/// Unordered bag of creature records. Order is kept for display and for
/// picking which guess to drop first, but never affects equality.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CreatureMultiset {
    records: Vec<CreatureRecord>,
}

impl CreatureMultiset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I, certain: bool, at_split: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| CreatureRecord::new(name.as_ref(), certain, at_split))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CreatureRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[CreatureRecord] {
        &self.records
    }

    pub fn names(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|record| record.name().to_string())
            .collect()
    }

    pub fn push(&mut self, record: CreatureRecord) {
        self.records.push(record);
    }

    pub fn count(&self, name: &str) -> usize {
        let name = canonical_name(name);
        self.records
            .iter()
            .filter(|record| record.name() == name)
            .count()
    }

    pub fn find(&self, name: &str) -> Option<&CreatureRecord> {
        let name = canonical_name(name);
        self.records.iter().find(|record| record.name() == name)
    }

    fn filtered(&self, keep: impl Fn(&CreatureRecord) -> bool) -> Self {
        self.records.iter().filter(|record| keep(record)).cloned().collect()
    }

    pub fn certain(&self) -> Self {
        self.filtered(CreatureRecord::is_certain)
    }

    pub fn certain_at_split(&self) -> Self {
        self.filtered(|record| record.is_certain() && record.is_at_split())
    }

    /// Creatures that joined after the split that created the legion.
    pub fn after_split(&self) -> Self {
        self.filtered(|record| !record.is_at_split())
    }

    pub fn certain_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_certain()).count()
    }

    pub fn all_certain(&self) -> bool {
        self.records.iter().all(CreatureRecord::is_certain)
    }

    /// True when every creature of `other` appears here at least as often.
    pub fn contains_all(&self, other: &Self) -> bool {
        other
            .records
            .iter()
            .all(|record| self.count(record.name()) >= other.count(record.name()))
    }

    /// Multiset difference: drops one record of `self` per record of `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let mut rest = self.clone();
        for record in &other.records {
            rest.remove_one(record.name());
        }
        rest
    }

    /// Removes one record with this name, preferring a certain one.
    pub fn remove_one(&mut self, name: &str) -> Option<CreatureRecord> {
        let name = canonical_name(name);
        match self
            .records
            .iter()
            .position(|record| record.name() == name && record.is_certain())
        {
            Some(index) => Some(self.records.remove(index)),
            None => self.evict_uncertain(name),
        }
    }

    /// Drops the last uncertain record, the weakest guess once sorted.
    pub fn evict_one_uncertain(&mut self) -> Option<CreatureRecord> {
        let index = self.records.iter().rposition(|record| !record.is_certain())?;
        Some(self.records.remove(index))
    }

    /// Drops the last uncertain guess of this creature. Certain records
    /// with the same name stay.
    pub fn evict_uncertain(&mut self, name: &str) -> Option<CreatureRecord> {
        let name = canonical_name(name);
        let index = self
            .records
            .iter()
            .rposition(|record| !record.is_certain() && record.name() == name)?;
        Some(self.records.remove(index))
    }

    pub fn sort_by_rank(&mut self, ranking: &dyn KillValue) {
        self.records
            .sort_by(|a, b| rank_order(ranking, a.name(), b.name()));
    }

    /// Folds revealed creatures into this belief.
    ///
    /// Missing creatures are appended as certain, matching guesses become
    /// certain, and one uncertain guess is dropped per appended creature.
    /// Returns how many appended creatures found no guess to displace.
    pub(crate) fn merge_revealed(&mut self, observed: &Self, ranking: &dyn KillValue) -> usize {
        let mut appended = 0;
        let mut seen: Vec<&str> = Vec::new();
        for record in &observed.records {
            let name = record.name();
            if seen.contains(&name) {
                continue;
            }
            seen.push(name);
            let held = self.count(name);
            for _ in held..observed.count(name) {
                self.records.push(CreatureRecord::new(name, true, true));
                appended += 1;
            }
        }

        let pending = observed.difference(&self.certain());
        for record in &pending.records {
            if let Some(slot) = self
                .records
                .iter_mut()
                .find(|slot| !slot.is_certain() && slot.name() == record.name())
            {
                slot.mark_certain();
            }
        }

        self.sort_by_rank(ranking);
        let mut stranded = 0;
        for _ in 0..appended {
            if self.evict_one_uncertain().is_none() {
                stranded += 1;
            }
        }
        stranded
    }
}

impl PartialEq for CreatureMultiset {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.contains_all(other)
    }
}

impl Eq for CreatureMultiset {}

impl FromIterator<CreatureRecord> for CreatureMultiset {
    fn from_iter<I: IntoIterator<Item = CreatureRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl Extend<CreatureRecord> for CreatureMultiset {
    fn extend<I: IntoIterator<Item = CreatureRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}

impl IntoIterator for CreatureMultiset {
    type Item = CreatureRecord;
    type IntoIter = std::vec::IntoIter<CreatureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a CreatureMultiset {
    type Item = &'a CreatureRecord;
    type IntoIter = std::slice::Iter<'a, CreatureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
