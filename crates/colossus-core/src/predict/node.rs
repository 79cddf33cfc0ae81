use super::multiset::CreatureMultiset;
use core::fmt;

/// Index of a node in a predictor's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// The two legions a split produced. `child1` is the half we believe kept
/// the stronger creatures; sizes are the heights at the time of the split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitChildren {
    pub child1: NodeId,
    pub child2: NodeId,
    pub child_size1: usize,
    pub child_size2: usize,
}

/// One legion at one point of its history.
///
/// Leaves are live legions. A node that has split keeps the contents it
/// had when it split, and its children carry the story on.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) marker: String,
    pub(crate) generation: u32,
    pub(crate) height: usize,
    pub(crate) creatures: CreatureMultiset,
    pub(crate) removed: CreatureMultiset,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Option<SplitChildren>,
}

impl Node {
    pub(crate) fn new(
        marker: &str,
        generation: u32,
        creatures: CreatureMultiset,
        parent: Option<NodeId>,
    ) -> Self {
        Self {
            marker: marker.to_string(),
            generation,
            height: creatures.len(),
            creatures,
            removed: CreatureMultiset::new(),
            parent,
            children: None,
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Number of splits the player had made when this node appeared.
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub fn creatures(&self) -> &CreatureMultiset {
        &self.creatures
    }

    /// Creatures present at the split that have since left the legion.
    pub fn removed(&self) -> &CreatureMultiset {
        &self.removed
    }

    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub const fn children(&self) -> Option<SplitChildren> {
        self.children
    }

    pub const fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn all_certain(&self) -> bool {
        self.creatures.len() == self.height && self.creatures.all_certain()
    }

    /// What this legion proves about its contents at the moment it was
    /// split off: certain original members plus the ones since removed.
    pub(crate) fn known_at_split(&self) -> CreatureMultiset {
        let mut known = self.creatures.certain_at_split();
        known.extend(self.removed.iter().cloned());
        known
    }

    pub fn full_name(&self) -> String {
        format!("{}({})", self.marker, self.generation)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.full_name())?;
        for record in &self.creatures {
            write!(f, " {record}")?;
        }
        for record in &self.removed {
            write!(f, " {}-", record.name())?;
        }
        Ok(())
    }
}
