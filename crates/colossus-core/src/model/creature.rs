use core::fmt;
use serde::Serialize;

pub const TITAN: &str = "Titan";
pub const ANGEL: &str = "Angel";
/// Placeholder used when a legion is taller than what we can name.
pub const UNKNOWN: &str = "Unknown";

/// Height of a player's starting legion; its split is the only one
/// bound by the one-lord-per-stack rule.
pub const INITIAL_LEGION_HEIGHT: usize = 8;
/// Tallest a legion may grow by recruiting.
pub const MAX_LEGION_HEIGHT: usize = 7;

/// Collapses per-player Titan variants ("Titan-3-Red") onto `Titan`.
pub fn canonical_name(raw: &str) -> &str {
    if raw.starts_with(TITAN) { TITAN } else { raw }
}

pub fn is_lord(name: &str) -> bool {
    let name = canonical_name(name);
    name == TITAN || name == ANGEL
}

/// One creature as believed to sit in a legion.
///
/// `certain` marks creatures we have evidence for. `at_split` is false for
/// creatures that joined after the legion was split off its parent.
/// Equality only compares names.
#[derive(Debug, Clone, Serialize)]
pub struct CreatureRecord {
    name: String,
    certain: bool,
    at_split: bool,
}

impl CreatureRecord {
    pub fn new(name: &str, certain: bool, at_split: bool) -> Self {
        Self {
            name: canonical_name(name).to_string(),
            certain,
            at_split,
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN, false, true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn is_certain(&self) -> bool {
        self.certain
    }

    pub const fn is_at_split(&self) -> bool {
        self.at_split
    }

    pub(crate) fn mark_certain(&mut self) {
        self.certain = true;
    }
}

impl PartialEq for CreatureRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CreatureRecord {}

impl fmt::Display for CreatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.certain {
            f.write_str("?")?;
        }
        if !self.at_split {
            f.write_str("*")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titan_variants_collapse_to_titan() {
        let plain = CreatureRecord::new("Titan", true, true);
        let variant = CreatureRecord::new("Titan-3-Red", false, false);
        assert_eq!(variant.name(), TITAN);
        assert_eq!(plain, variant);
        assert_eq!(canonical_name(canonical_name("Titan-3-Red")), TITAN);
    }

    #[test]
    fn equality_ignores_flags() {
        let guess = CreatureRecord::new("Ogre", false, true);
        let known = CreatureRecord::new("Ogre", true, false);
        assert_eq!(guess, known);
        assert_ne!(guess, CreatureRecord::new("Troll", false, true));
    }

    #[test]
    fn display_marks_guesses_and_recruits() {
        assert_eq!(CreatureRecord::new("Ogre", true, true).to_string(), "Ogre");
        assert_eq!(CreatureRecord::new("Ogre", false, true).to_string(), "Ogre?");
        assert_eq!(CreatureRecord::new("Ogre", true, false).to_string(), "Ogre*");
    }

    #[test]
    fn lords_are_titan_and_angel() {
        assert!(is_lord("Titan-1-Black"));
        assert!(is_lord(ANGEL));
        assert!(!is_lord("Archangel"));
    }
}
