use super::config::{PredictorConfig, Propagation};
use super::error::PredictError;
use super::multiset::CreatureMultiset;
use super::node::{Node, NodeId, SplitChildren};
use super::splitter::{SplitRequest, plan_split};
use crate::model::creature::{CreatureRecord, MAX_LEGION_HEIGHT};
use crate::model::roster::KillValue;
use core::cmp::Ordering;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{Level, event};

const TARGET: &str = "colossus_core::predict";

/// Tracks what one opponent's legions contain from the splits, reveals and
/// losses we get to see.
///
/// Nodes live in an arena; a split appends two children and never moves
/// existing nodes, so [`NodeId`]s stay valid for the predictor's lifetime.
pub struct SplitPredictor<R = SmallRng> {
    player: String,
    nodes: Vec<Node>,
    root: NodeId,
    ranking: Box<dyn KillValue>,
    config: PredictorConfig,
    rng: R,
    generation: u32,
}

impl SplitPredictor<SmallRng> {
    pub fn new<I, S>(
        player: &str,
        marker: &str,
        creatures: I,
        ranking: impl KillValue + 'static,
        config: PredictorConfig,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self::with_rng(player, marker, creatures, ranking, config, rng)
    }
}

impl<R: Rng> SplitPredictor<R> {
    pub fn with_rng<I, S>(
        player: &str,
        marker: &str,
        creatures: I,
        ranking: impl KillValue + 'static,
        config: PredictorConfig,
        rng: R,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ranking: Box<dyn KillValue> = Box::new(ranking);
        let mut creatures = CreatureMultiset::from_names(creatures, true, true);
        creatures.sort_by_rank(ranking.as_ref());
        Self {
            player: player.to_string(),
            nodes: vec![Node::new(marker, 0, creatures, None)],
            root: NodeId::new(0),
            ranking,
            config,
            rng,
            generation: 0,
        }
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Every node still attached to the tree, parents before children.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(children) = self.node(id).children {
                stack.push(children.child2);
                stack.push(children.child1);
            }
        }
        out
    }

    /// Live legions: non-empty leaves, newest first when markers repeat.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut leaves: Vec<NodeId> = self
            .nodes()
            .into_iter()
            .filter(|&id| {
                let node = self.node(id);
                node.is_leaf() && node.height > 0
            })
            .collect();
        leaves.sort_by(|&a, &b| self.newer_first(a, b));
        let mut seen: Vec<&str> = Vec::new();
        leaves.retain(|&id| {
            let marker = self.node(id).marker();
            if seen.contains(&marker) {
                false
            } else {
                seen.push(marker);
                true
            }
        });
        leaves
    }

    fn newer_first(&self, a: NodeId, b: NodeId) -> Ordering {
        let (left, right) = (self.node(a), self.node(b));
        (right.generation, b).cmp(&(left.generation, a))
    }

    /// The live leaf carrying `marker`. A marker can come back into play
    /// after its legion died; the newest holder wins.
    pub fn leaf(&self, marker: &str) -> Option<NodeId> {
        self.leaves()
            .into_iter()
            .find(|&id| self.node(id).marker == marker)
    }

    fn require_leaf(&self, marker: &str) -> Result<NodeId, PredictError> {
        self.leaf(marker)
            .ok_or_else(|| PredictError::UnknownMarker(marker.to_string()))
    }

    /// Current guess for a live legion, strongest first, padded with
    /// `Unknown` up to the legion's height.
    pub fn best_guess(&self, marker: &str) -> Option<Vec<CreatureRecord>> {
        let node = self.node(self.leaf(marker)?);
        let mut guess: Vec<CreatureRecord> = node.creatures.iter().cloned().collect();
        guess.resize_with(node.height, CreatureRecord::unknown);
        Some(guess)
    }

    fn reject(&self, operation: &'static str, err: PredictError) -> PredictError {
        event!(
            target: TARGET,
            Level::ERROR,
            player = %self.player,
            operation,
            error = %err,
            "prediction update rejected"
        );
        err
    }

    /// Records that `parent_marker` split `child_height` creatures off into
    /// a new legion under `new_marker`.
    ///
    /// `flipped` says whether the new legion is the stronger half. Without a
    /// hint the smaller legion is taken as the weaker one, and an even split
    /// is settled by the predictor's coin. `known_splitoffs` are creatures
    /// seen entering the new legion.
    pub fn split(
        &mut self,
        parent_marker: &str,
        child_height: usize,
        new_marker: &str,
        flipped: Option<bool>,
        known_splitoffs: &[&str],
    ) -> Result<(), PredictError> {
        self.try_split(parent_marker, child_height, new_marker, flipped, known_splitoffs)
            .map_err(|err| self.reject("split", err))
    }

    fn try_split(
        &mut self,
        parent_marker: &str,
        child_height: usize,
        new_marker: &str,
        flipped: Option<bool>,
        known_splitoffs: &[&str],
    ) -> Result<(), PredictError> {
        let parent_id = self.require_leaf(parent_marker)?;
        if new_marker == parent_marker || self.leaf(new_marker).is_some() {
            return Err(PredictError::MarkerInUse(new_marker.to_string()));
        }
        let height = self.node(parent_id).height;
        if child_height == 0 || child_height >= height {
            return Err(PredictError::InvalidSplitHeight {
                marker: parent_marker.to_string(),
                height,
                child_height,
            });
        }
        let rest = height - child_height;
        let new_is_strong = match flipped {
            Some(flag) => flag,
            None => match child_height.cmp(&rest) {
                Ordering::Less => false,
                Ordering::Greater => true,
                Ordering::Equal => self.rng.gen_bool(0.5),
            },
        };

        let known = CreatureMultiset::from_names(known_splitoffs, true, true);
        let none = CreatureMultiset::new();
        let (weak_size, known_weak, known_strong) = if new_is_strong {
            (rest, &none, &known)
        } else {
            (child_height, &known, &none)
        };
        let parent = &self.nodes[parent_id.index()];
        let plan = plan_split(
            &SplitRequest {
                marker: parent_marker,
                parent: &parent.creatures,
                weak_size,
                known_weak,
                known_strong,
            },
            self.ranking.as_ref(),
        )?;

        let (strong_marker, weak_marker) = if new_is_strong {
            (new_marker, parent_marker)
        } else {
            (parent_marker, new_marker)
        };
        self.generation += 1;
        let strong = self.push_node(Node::new(
            strong_marker,
            self.generation,
            plan.strong,
            Some(parent_id),
        ));
        let weak = self.push_node(Node::new(
            weak_marker,
            self.generation,
            plan.weak,
            Some(parent_id),
        ));
        self.nodes[parent_id.index()].children = Some(SplitChildren {
            child1: strong,
            child2: weak,
            child_size1: height - weak_size,
            child_size2: weak_size,
        });
        event!(
            target: TARGET,
            Level::DEBUG,
            player = %self.player,
            strong = %self.node(strong),
            weak = %self.node(weak),
            "split predicted"
        );

        if !known.is_empty() {
            let told_by = if new_is_strong { strong } else { weak };
            self.tell_child_contents(parent_id, told_by);
        }
        Ok(())
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Dispatches to [`Self::reveal_all`] or [`Self::reveal_some`] for the
    /// live legion under `marker`.
    pub fn reveal(
        &mut self,
        marker: &str,
        creatures: &[&str],
        complete: bool,
    ) -> Result<(), PredictError> {
        let id = self
            .require_leaf(marker)
            .map_err(|err| self.reject("reveal", err))?;
        if complete {
            self.reveal_all(id, creatures)
        } else {
            self.reveal_some(id, creatures)
        }
    }

    fn require_live(&self, id: NodeId) -> Result<(), PredictError> {
        if self.leaves().contains(&id) {
            Ok(())
        } else {
            Err(PredictError::NotALeaf(id.index()))
        }
    }

    /// The node's full contents were shown. `id` must be a live leaf.
    pub fn reveal_all(&mut self, id: NodeId, creatures: &[&str]) -> Result<(), PredictError> {
        let observed = CreatureMultiset::from_names(creatures, true, true);
        self.require_live(id)
            .and_then(|()| self.try_reveal_all(id, &observed))
            .map_err(|err| self.reject("reveal_all", err))
    }

    fn try_reveal_all(&mut self, id: NodeId, observed: &CreatureMultiset) -> Result<(), PredictError> {
        let node = self.node(id);
        if observed.len() != node.height {
            return Err(PredictError::HeightMismatch {
                marker: node.marker.clone(),
                revealed: observed.len(),
                height: node.height,
            });
        }
        let missing = node.creatures.certain().difference(observed);
        if !missing.is_empty() {
            return Err(PredictError::CertaintyContradiction {
                marker: node.marker.clone(),
                missing: missing.names(),
            });
        }
        self.try_reveal_some(id, observed)
    }

    /// Some of the node's creatures were shown. `id` must be a live leaf.
    pub fn reveal_some(&mut self, id: NodeId, creatures: &[&str]) -> Result<(), PredictError> {
        let observed = CreatureMultiset::from_names(creatures, true, true);
        self.require_live(id)
            .and_then(|()| self.try_reveal_some(id, &observed))
            .map_err(|err| self.reject("reveal_some", err))
    }

    fn try_reveal_some(&mut self, id: NodeId, observed: &CreatureMultiset) -> Result<(), PredictError> {
        if self.absorb(id, observed)? {
            event!(
                target: TARGET,
                Level::DEBUG,
                player = %self.player,
                node = %self.node(id),
                "reveal absorbed"
            );
            if let Some(parent) = self.node(id).parent {
                self.tell_child_contents(parent, id);
            }
        }
        Ok(())
    }

    /// Makes `observed` certain in the node. Returns whether anything new
    /// was learned; fails without touching the node when the evidence
    /// cannot fit next to what is already certain.
    fn absorb(&mut self, id: NodeId, observed: &CreatureMultiset) -> Result<bool, PredictError> {
        let node = self.node(id);
        let certain = node.creatures.certain();
        let unexplained = observed.difference(&certain);
        let needed = certain.len() + unexplained.len();
        if needed > node.height {
            return Err(PredictError::CertaintyOverflow {
                marker: node.marker.clone(),
                needed,
                height: node.height,
            });
        }
        if unexplained.is_empty() {
            return Ok(false);
        }

        let ranking = self.ranking.as_ref();
        let node = &mut self.nodes[id.index()];
        let stranded = node.creatures.merge_revealed(observed, ranking);
        if stranded > 0 {
            event!(
                target: TARGET,
                Level::WARN,
                player = %self.player,
                node = %node,
                stranded,
                "revealed creatures displaced no guess"
            );
        }
        Ok(true)
    }

    /// Lets a parent learn from its children and re-divide its creatures
    /// between them.
    fn tell_child_contents(&mut self, parent_id: NodeId, child_id: NodeId) {
        let Some(children) = self.node(parent_id).children else {
            return;
        };
        let mut learned = self.node(children.child1).known_at_split();
        learned.extend(self.node(children.child2).known_at_split());

        match self.absorb(parent_id, &learned) {
            Ok(true) => {
                let grandparent = self.node(parent_id).parent;
                match (self.config.propagation, grandparent) {
                    (Propagation::Cascade, Some(grandparent)) => {
                        self.tell_child_contents(grandparent, parent_id);
                    }
                    (Propagation::SingleLevel, Some(_)) => {
                        event!(
                            target: TARGET,
                            Level::DEBUG,
                            player = %self.player,
                            node = %self.node(parent_id),
                            "parent corrected; older ancestors left as they were"
                        );
                    }
                    (_, None) => {}
                }
            }
            Ok(false) => {}
            Err(err) => {
                event!(
                    target: TARGET,
                    Level::WARN,
                    player = %self.player,
                    child = %self.node(child_id),
                    error = %err,
                    "parent cannot hold what its children revealed"
                );
                return;
            }
        }

        if let Err(err) = self.resplit(parent_id) {
            event!(
                target: TARGET,
                Level::WARN,
                player = %self.player,
                parent = %self.node(parent_id),
                error = %err,
                "children kept their previous prediction"
            );
        }
    }

    /// Recomputes an existing split from everything the children proved,
    /// then reapplies what happened to each child since.
    fn resplit(&mut self, parent_id: NodeId) -> Result<(), PredictError> {
        let parent = self.node(parent_id);
        let Some(children) = parent.children else {
            return Ok(());
        };
        let strong = self.node(children.child1);
        let weak = self.node(children.child2);
        let known_strong = strong.known_at_split();
        let known_weak = weak.known_at_split();
        let plan = plan_split(
            &SplitRequest {
                marker: &parent.marker,
                parent: &parent.creatures,
                weak_size: children.child_size2,
                known_weak: &known_weak,
                known_strong: &known_strong,
            },
            self.ranking.as_ref(),
        )?;
        let strong_now = self.replay_changes(plan.strong, children.child1);
        let weak_now = self.replay_changes(plan.weak, children.child2);
        self.nodes[children.child1.index()].creatures = strong_now;
        self.nodes[children.child2.index()].creatures = weak_now;

        if self.config.propagation == Propagation::Cascade {
            for child in [children.child1, children.child2] {
                if self.node(child).is_leaf() {
                    continue;
                }
                if let Err(err) = self.resplit(child) {
                    event!(
                        target: TARGET,
                        Level::WARN,
                        player = %self.player,
                        parent = %self.node(child),
                        error = %err,
                        "descendants kept their previous prediction"
                    );
                }
            }
        }
        Ok(())
    }

    fn replay_changes(&self, mut predicted: CreatureMultiset, child: NodeId) -> CreatureMultiset {
        let child = self.node(child);
        predicted.extend(child.creatures.after_split());
        for record in &child.removed {
            predicted.remove_one(record.name());
        }
        predicted.sort_by_rank(self.ranking.as_ref());
        predicted
    }

    /// A creature joined the legion.
    pub fn recruit(&mut self, marker: &str, creature: &str) -> Result<(), PredictError> {
        self.try_recruit(marker, creature)
            .map_err(|err| self.reject("recruit", err))
    }

    fn try_recruit(&mut self, marker: &str, creature: &str) -> Result<(), PredictError> {
        let id = self.require_leaf(marker)?;
        let ranking = self.ranking.as_ref();
        let node = &mut self.nodes[id.index()];
        if node.height >= MAX_LEGION_HEIGHT {
            return Err(PredictError::LegionFull(marker.to_string()));
        }
        node.creatures.push(CreatureRecord::new(creature, true, false));
        node.creatures.sort_by_rank(ranking);
        node.height += 1;
        Ok(())
    }

    /// Creatures left the legion, whether killed or moved elsewhere. They
    /// are revealed first, so the legion must have been able to hold them.
    pub fn remove(&mut self, marker: &str, creatures: &[&str]) -> Result<(), PredictError> {
        self.try_remove(marker, creatures)
            .map_err(|err| self.reject("remove", err))
    }

    fn try_remove(&mut self, marker: &str, creatures: &[&str]) -> Result<(), PredictError> {
        let id = self.require_leaf(marker)?;
        let observed = CreatureMultiset::from_names(creatures, true, true);
        self.try_reveal_some(id, &observed)?;

        let node = &mut self.nodes[id.index()];
        for record in &observed {
            if let Some(gone) = node.creatures.remove_one(record.name()) {
                if gone.is_at_split() {
                    node.removed.push(gone);
                }
                node.height -= 1;
            }
        }
        event!(
            target: TARGET,
            Level::DEBUG,
            player = %self.player,
            node = %self.node(id),
            "creatures removed"
        );
        Ok(())
    }

    /// Two legions rejoined, undoing a split.
    ///
    /// Siblings recombine into their parent, which one of them must still
    /// carry the marker of. A legion that split twice in one turn can also
    /// take back the nephew that left its sibling; the pair then becomes
    /// one legion and the third legion moves up beside it.
    pub fn merge(&mut self, marker: &str, other: &str) -> Result<(), PredictError> {
        self.try_merge(marker, other)
            .map_err(|err| self.reject("merge", err))
    }

    fn try_merge(&mut self, marker: &str, other: &str) -> Result<(), PredictError> {
        let first = self.require_leaf(marker)?;
        let second = self.require_leaf(other)?;
        let not_siblings = || PredictError::NotSiblings(marker.to_string(), other.to_string());
        let (Some(first_parent), Some(second_parent)) =
            (self.node(first).parent, self.node(second).parent)
        else {
            return Err(not_siblings());
        };
        if first == second {
            return Err(not_siblings());
        }

        if first_parent == second_parent {
            let parent_marker = self.node(first_parent).marker.as_str();
            if parent_marker != marker && parent_marker != other {
                return Err(PredictError::ParentMarkerLost(
                    marker.to_string(),
                    other.to_string(),
                ));
            }
            self.nodes[first_parent.index()].children = None;
            event!(
                target: TARGET,
                Level::DEBUG,
                player = %self.player,
                node = %self.node(first_parent),
                "legions merged"
            );
            return Ok(());
        }

        let (uncle, nephew) = if self.node(second_parent).parent == Some(first_parent) {
            (first, second)
        } else if self.node(first_parent).parent == Some(second_parent) {
            (second, first)
        } else {
            return Err(not_siblings());
        };
        self.merge_across_splits(uncle, nephew, marker);
        Ok(())
    }

    /// `origin` split into `uncle` and `father`, then `father` split into
    /// `nephew` and `third`. Folds `uncle` and `nephew` together so that
    /// `origin` reads as one split into the merged legion and `third`.
    fn merge_across_splits(&mut self, uncle: NodeId, nephew: NodeId, kept_marker: &str) {
        let (Some(origin), Some(father)) = (self.node(uncle).parent, self.node(nephew).parent) else {
            return;
        };
        let (Some(outer), Some(inner)) = (self.node(origin).children, self.node(father).children)
        else {
            return;
        };
        let uncle_size = if outer.child1 == uncle {
            outer.child_size1
        } else {
            outer.child_size2
        };
        let (third, third_size, nephew_size) = if inner.child1 == nephew {
            (inner.child2, inner.child_size2, inner.child_size1)
        } else {
            (inner.child1, inner.child_size1, inner.child_size2)
        };

        // The legion holding the origin's marker survives; otherwise the
        // legion named first does.
        let origin_marker = self.node(origin).marker.clone();
        let nephew_marker = self.node(nephew).marker.as_str();
        let nephew_survives = nephew_marker == origin_marker
            || (self.node(uncle).marker != origin_marker && nephew_marker == kept_marker);
        let (survivor, absorbed) = if nephew_survives {
            (nephew, uncle)
        } else {
            (uncle, nephew)
        };

        let moved = std::mem::take(&mut self.nodes[absorbed.index()].creatures);
        let lost = std::mem::take(&mut self.nodes[absorbed.index()].removed);
        let absorbed_height = self.node(absorbed).height;
        let ranking = self.ranking.as_ref();
        let merged = &mut self.nodes[survivor.index()];
        merged.creatures.extend(moved);
        merged.creatures.sort_by_rank(ranking);
        merged.removed.extend(lost);
        merged.height += absorbed_height;
        merged.parent = Some(origin);
        self.nodes[third.index()].parent = Some(origin);

        let merged_size = uncle_size + nephew_size;
        let third_keeps_marker = self.node(third).marker == origin_marker;
        self.nodes[origin.index()].children = Some(if third_keeps_marker {
            SplitChildren {
                child1: third,
                child2: survivor,
                child_size1: third_size,
                child_size2: merged_size,
            }
        } else {
            SplitChildren {
                child1: survivor,
                child2: third,
                child_size1: merged_size,
                child_size2: third_size,
            }
        });
        event!(
            target: TARGET,
            Level::DEBUG,
            player = %self.player,
            merged = %self.node(survivor),
            third = %self.node(third),
            "legions merged across two splits"
        );
    }
}
