//! Update algorithms: revelation, split prediction, merge, and unit changes.
//!
//! A change at one node can cascade: a revelation asks the parent to
//! re-derive its children, and every split re-splits the subtree below it.

use std::iter;

use legion_rules::{
    count_named, has_all_leaders, is_legal_initial_splitoff, is_superset, min_count, names,
    remove_last_uncertain, remove_named, subtract, UnitRecord, INITIAL_SPLIT_SIZE,
    MAX_LEGION_HEIGHT, RECRUIT_CEILING,
};
use tracing::{debug, trace};

use super::node::{Children, LegionNode, NodeId};
use super::BeliefTree;
use crate::combinatorics::combinations;
use crate::error::{PredictError, Result};

/// Passes allowed for a split to reconcile its node with the children's certainties.
const MAX_RECONCILE_PASSES: usize = MAX_LEGION_HEIGHT + 1;

impl BeliefTree {
    /// Check whether every node below `id` is fully certain.
    pub(crate) fn all_descendants_certain(&self, id: NodeId) -> bool {
        match self.node(id).children {
            None => true,
            Some(c) => [c.keep, c.split]
                .into_iter()
                .all(|child| self.node(child).all_certain() && self.all_descendants_certain(child)),
        }
    }

    /// Reconcile a node with creatures now known to be in it.
    pub(crate) fn reveal(&mut self, id: NodeId, revealed: &[String]) -> Result<()> {
        let node = self.node(id);
        let certain = node.certain_units();
        if revealed.is_empty()
            || (is_superset(&certain, revealed) && self.all_descendants_certain(id))
        {
            trace!(legion = %node.full_name(), "reveal adds nothing");
            return Ok(());
        }

        // Previously certain creatures must still fit beside the revealed ones.
        let mut pending = revealed.to_vec();
        let mut count = revealed.len();
        for unit in &certain {
            if !remove_named(&mut pending, &unit.name) {
                count += 1;
            }
        }
        if count > node.height() {
            return Err(PredictError::certainty(
                &node.full_name(),
                format!("{} certain creatures exceed height {}", count, node.height()),
            ));
        }

        let full_name = node.full_name();
        let parent = node.parent;
        let node = self.node_mut(id);

        let mut added = 0;
        for name in revealed {
            if count_named(&node.units, name) < count_named(revealed, name) {
                node.units.push(UnitRecord::known(name.clone()));
                added += 1;
            }
        }

        let mut uncovered = revealed.to_vec();
        for unit in node.units.iter().filter(|u| u.certain) {
            remove_named(&mut uncovered, &unit.name);
        }
        for name in &uncovered {
            if let Some(unit) = node.units.iter_mut().find(|u| !u.certain && u.name == *name) {
                unit.certain = true;
            }
        }

        // Each appended creature displaces the newest guess.
        for _ in 0..added {
            if !remove_last_uncertain(&mut node.units) {
                return Err(PredictError::certainty(
                    &full_name,
                    "no uncertain creature left to displace",
                ));
            }
        }

        match parent {
            Some(parent) => self.update_child_contents(parent),
            None => Ok(()),
        }
    }

    /// Fold the children's certainties into a parent and re-derive both children.
    pub(crate) fn update_child_contents(&mut self, id: NodeId) -> Result<()> {
        let children = self.children_of(id)?;
        let mut certain_names = names(&self.node(children.keep).certain_at_split_or_removed());
        certain_names.extend(names(&self.node(children.split).certain_at_split_or_removed()));
        self.reveal(id, &certain_names)?;

        let children = self.children_of(id)?;
        let other_marker = self.other_child_marker(id)?;
        self.split(id, children.split_size, &other_marker, None)
    }

    /// Predict (or re-predict, when `turn` is `None`) the division of a node.
    pub(crate) fn split(
        &mut self,
        id: NodeId,
        child_size: usize,
        other_marker: &str,
        turn: Option<u32>,
    ) -> Result<()> {
        // Re-splits nest once per generation of a lineage, plus one per reconcile pass.
        if self.depth >= self.nodes.len() + MAX_RECONCILE_PASSES {
            return Err(PredictError::structural(format!(
                "split of {} did not converge",
                self.node(id).full_name()
            )));
        }
        self.depth += 1;
        let result = self.split_nested(id, child_size, other_marker, turn);
        self.depth -= 1;
        result
    }

    fn split_nested(
        &mut self,
        id: NodeId,
        child_size: usize,
        other_marker: &str,
        turn: Option<u32>,
    ) -> Result<()> {
        let node = self.node(id);
        if node.height() > MAX_LEGION_HEIGHT {
            return Err(PredictError::CapacityViolation {
                marker: node.full_name(),
                height: node.height(),
                max: MAX_LEGION_HEIGHT,
            });
        }

        let turn = match turn {
            Some(turn) => {
                self.node_mut(id).turn_split = Some(turn);
                turn
            }
            None => node.turn_split.unwrap_or(node.turn_created),
        };

        let (mut known_keep, mut known_split) = match self.node(id).children {
            Some(c) => (
                self.node(c.keep).certain_at_split_or_removed(),
                self.node(c.split).certain_at_split_or_removed(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        let candidates = self.find_all_possible_splits(id, child_size, &known_keep, &known_split)?;
        let mut splitoff_names = names(&self.choose_splitoff(id, &candidates)?);

        let node = self.node(id);
        let full_name = node.full_name();
        let height = node.height();

        let (mut keep_names, mut split_names) = if node.all_certain() {
            // Only counts shared by every legal division are certain.
            let creature_names = names(&node.units);
            let split_lists: Vec<Vec<String>> = candidates.iter().map(|c| names(c)).collect();
            let keep_lists = split_lists
                .iter()
                .map(|s| subtract(&creature_names, s))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    PredictError::certainty(&full_name, "split-off is not part of the legion")
                })?;

            let mut keep_names: Vec<String> = Vec::new();
            let mut split_names: Vec<String> = Vec::new();
            for name in &creature_names {
                if !keep_names.contains(name) {
                    let n = min_count(&keep_lists, name);
                    keep_names.extend(iter::repeat(name.clone()).take(n));
                }
                if !split_names.contains(name) {
                    let n = min_count(&split_lists, name);
                    split_names.extend(iter::repeat(name.clone()).take(n));
                }
            }
            (keep_names, split_names)
        } else {
            // A side known in full leaves the parent's other certainties to its sibling.
            if known_split.len() == child_size {
                let certain = subtract(&node.certain_units(), &known_split).ok_or_else(|| {
                    PredictError::certainty(&full_name, "known split-offs are not certain here")
                })?;
                if !is_superset(&certain, &known_keep) {
                    return Err(PredictError::certainty(
                        &full_name,
                        "certain creatures do not cover the known keepers",
                    ));
                }
                known_keep = certain;
            } else if known_keep.len() == height.saturating_sub(child_size) {
                let certain = subtract(&node.certain_units(), &known_keep).ok_or_else(|| {
                    PredictError::certainty(&full_name, "known keepers are not certain here")
                })?;
                if !is_superset(&certain, &known_split) {
                    return Err(PredictError::certainty(
                        &full_name,
                        "certain creatures do not cover the known split-offs",
                    ));
                }
                known_split = certain;
            }
            (names(&known_keep), names(&known_split))
        };

        let mut keep_units = Vec::new();
        let mut split_units = Vec::new();
        for unit in &node.units {
            let mut fresh = UnitRecord::hypothesized(unit.name.clone());
            if remove_named(&mut splitoff_names, &unit.name) {
                fresh.certain = remove_named(&mut split_names, &unit.name);
                split_units.push(fresh);
            } else {
                fresh.certain = remove_named(&mut keep_names, &unit.name);
                keep_units.push(fresh);
            }
        }

        // Carry over whatever happened to existing children since the last split.
        let existing = node.children;
        if let Some(c) = existing {
            self.replay_history(c.keep, &mut keep_units)?;
            self.replay_history(c.split, &mut split_units)?;
        }

        let children = match existing {
            Some(c) => {
                self.node_mut(c.keep).units = keep_units;
                self.node_mut(c.split).units = split_units;
                c
            }
            None => {
                let marker = self.node(id).marker.clone();
                let keep_size = keep_units.len();
                let split_size = split_units.len();
                let keep = self.push_node(LegionNode::new(marker, turn, keep_units, Some(id)));
                let split =
                    self.push_node(LegionNode::new(other_marker, turn, split_units, Some(id)));
                let children = Children {
                    keep,
                    split,
                    keep_size,
                    split_size,
                };
                self.node_mut(id).children = Some(children);
                children
            }
        };

        self.resplit_descendants(children.keep)?;
        self.resplit_descendants(children.split)
    }

    /// Append a child's post-split additions and subtract its removals.
    fn replay_history(&self, child: NodeId, units: &mut Vec<UnitRecord>) -> Result<()> {
        let child = self.node(child);
        units.extend(child.after_split());
        for gone in &child.removed {
            if !remove_named(units, &gone.name) {
                return Err(PredictError::certainty(
                    &child.full_name(),
                    format!("removed {} is missing from the predicted contents", gone.name),
                ));
            }
        }
        Ok(())
    }

    fn resplit_descendants(&mut self, id: NodeId) -> Result<()> {
        match self.node(id).children {
            Some(c) => {
                let other_marker = self.other_child_marker(id)?;
                self.split(id, c.split_size, &other_marker, None)
            }
            None => Ok(()),
        }
    }

    /// Every legal split-off of `child_size` consistent with the known contents.
    fn find_all_possible_splits(
        &mut self,
        id: NodeId,
        child_size: usize,
        known_keep: &[UnitRecord],
        known_split: &[UnitRecord],
    ) -> Result<Vec<Vec<UnitRecord>>> {
        if known_split.len() > child_size {
            return Err(PredictError::certainty(
                &self.node(id).full_name(),
                format!(
                    "{} known split-offs exceed split-off size {}",
                    known_split.len(),
                    child_size
                ),
            ));
        }
        let known_combo: Vec<UnitRecord> =
            known_split.iter().chain(known_keep.iter()).cloned().collect();

        for _ in 0..MAX_RECONCILE_PASSES {
            let node = self.node(id);
            let height = node.height();
            if height > MAX_LEGION_HEIGHT {
                return Err(PredictError::CapacityViolation {
                    marker: node.full_name(),
                    height,
                    max: MAX_LEGION_HEIGHT,
                });
            }
            let full_height = height == MAX_LEGION_HEIGHT;
            if full_height {
                if child_size != INITIAL_SPLIT_SIZE {
                    return Err(PredictError::IllegalInitialSplit {
                        marker: node.full_name(),
                        reason: format!("split-off of {} from a full legion", child_size),
                    });
                }
                if !has_all_leaders(&self.catalog, &node.units) {
                    return Err(PredictError::IllegalInitialSplit {
                        marker: node.full_name(),
                        reason: "full legion is missing a leader".into(),
                    });
                }
            }

            if !is_superset(&node.units, &known_combo) {
                let combo_names = names(&known_combo);
                self.reveal(id, &combo_names)?;
                continue;
            }

            let unknowns = subtract(&node.units, &known_combo).unwrap_or_default();
            let needed = child_size - known_split.len();
            let candidates = combinations(&unknowns, needed)
                .map(|combo| {
                    let mut candidate = known_split.to_vec();
                    candidate.extend(combo);
                    candidate
                })
                .filter(|c| !full_height || is_legal_initial_splitoff(&self.catalog, c))
                .collect();
            return Ok(candidates);
        }

        Err(PredictError::structural(format!(
            "{} did not reconcile with its children",
            self.node(id).full_name()
        )))
    }

    /// Pick the split-off by kill value: the larger side moves out strong,
    /// a smaller one leaves weak. The first candidate wins ties.
    fn choose_splitoff(
        &self,
        id: NodeId,
        candidates: &[Vec<UnitRecord>],
    ) -> Result<Vec<UnitRecord>> {
        let node = self.node(id);
        let Some(first) = candidates.first() else {
            return Err(if node.height() == MAX_LEGION_HEIGHT {
                PredictError::IllegalInitialSplit {
                    marker: node.full_name(),
                    reason: "no legal split-off exists".into(),
                }
            } else {
                PredictError::certainty(&node.full_name(), "no split-off fits the known contents")
            });
        };

        let maximize = 2 * first.len() > node.height();
        let mut best = first;
        let mut best_value = self.catalog.total_kill_value(first);
        for candidate in &candidates[1..] {
            let value = self.catalog.total_kill_value(candidate);
            if (maximize && value > best_value) || (!maximize && value < best_value) {
                best = candidate;
                best_value = value;
            }
        }

        debug!(
            legion = %node.full_name(),
            candidates = candidates.len(),
            maximize,
            kill_value = best_value,
            splitoff = ?names(best),
            "chose split-off"
        );
        Ok(best.clone())
    }

    /// Recombine two sibling legions into their parent.
    pub(crate) fn merge(&mut self, id: NodeId, other: NodeId, turn: u32) -> Result<()> {
        let parent = self.node(id).parent.ok_or_else(|| {
            PredictError::structural(format!(
                "{} has no parent to merge into",
                self.node(id).full_name()
            ))
        })?;
        if self.other_child(parent, id)? != other {
            return Err(PredictError::NotAChild {
                parent: self.node(parent).full_name(),
                child: self.node(other).full_name(),
            });
        }

        let merged_height = self.node(id).height() + self.node(other).height();
        if merged_height > MAX_LEGION_HEIGHT {
            return Err(PredictError::CapacityViolation {
                marker: self.node(parent).full_name(),
                height: merged_height,
                max: MAX_LEGION_HEIGHT,
            });
        }

        let parent_marker = self.node(parent).marker.clone();
        let marker = self.node(id).marker.clone();
        let undoes_split = marker == parent_marker || self.node(other).marker == parent_marker;

        self.fold_children_into(parent)?;
        self.node_mut(parent).clear_children();
        if undoes_split {
            Ok(())
        } else {
            self.split(parent, merged_height, &marker, Some(turn))
        }
    }

    /// Rebuild a parent's units from its children's current contents, keeping
    /// the parent's own at-split flags so its ancestors stay consistent.
    fn fold_children_into(&mut self, parent: NodeId) -> Result<()> {
        let children = self.children_of(parent)?;
        let parent_node = self.node(parent);
        let mut pool = parent_node.units.clone();
        let mut merged = Vec::new();
        let mut newly_removed = Vec::new();
        let mut additions = Vec::new();

        for child in [children.keep, children.split] {
            let child = self.node(child);
            for unit in child.units.iter().filter(|u| u.at_split) {
                let mut taken = take_named(&mut pool, &unit.name)
                    .ok_or_else(|| missing_from(parent_node, &unit.name))?;
                taken.certain |= unit.certain;
                merged.push(taken);
            }
            for gone in &child.removed {
                let mut taken = take_named(&mut pool, &gone.name)
                    .ok_or_else(|| missing_from(parent_node, &gone.name))?;
                if taken.at_split {
                    taken.certain = true;
                    newly_removed.push(taken);
                }
            }
            additions.extend(child.after_split());
        }
        merged.extend(pool);
        merged.extend(additions);

        let node = self.node_mut(parent);
        node.units = merged;
        node.removed.extend(newly_removed);
        Ok(())
    }

    /// Add a creature that joined the legion after its last split.
    pub(crate) fn add_unit(&mut self, id: NodeId, name: &str) -> Result<()> {
        let node = self.node(id);
        if node.height() >= RECRUIT_CEILING && node.is_leaf() {
            return Err(PredictError::structural(format!(
                "{} is already {} high",
                node.full_name(),
                node.height()
            )));
        }
        self.node_mut(id).units.push(UnitRecord::recruited(name));
        Ok(())
    }

    /// Reveal a creature, then take it out of the legion.
    pub(crate) fn remove_unit(&mut self, id: NodeId, name: &str) -> Result<()> {
        // Public lookups never return an empty legion; this guards direct callers.
        if self.node(id).height() == 0 {
            return Err(PredictError::structural(format!(
                "cannot remove {} from empty legion {}",
                name,
                self.node(id).full_name()
            )));
        }
        self.reveal(id, &[name.to_string()])?;

        let node = self.node_mut(id);
        let idx = node
            .units
            .iter()
            .position(|u| u.certain && u.name == name)
            .or_else(|| node.units.iter().position(|u| u.name == name))
            .ok_or_else(|| {
                PredictError::certainty(&node.full_name(), format!("{} is not present", name))
            })?;
        let unit = node.units.remove(idx);
        if unit.at_split {
            node.removed.push(unit);
        }
        Ok(())
    }

    pub(crate) fn remove_units(&mut self, id: NodeId, removed: &[String]) -> Result<()> {
        self.reveal(id, removed)?;
        for name in removed {
            self.remove_unit(id, name)?;
        }
        Ok(())
    }

    pub(crate) fn children_of(&self, id: NodeId) -> Result<Children> {
        self.node(id).children.ok_or_else(|| {
            PredictError::structural(format!("{} has not split", self.node(id).full_name()))
        })
    }

    /// The sibling of `child` under `parent`.
    pub(crate) fn other_child(&self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        let not_a_child = || PredictError::NotAChild {
            parent: self.node(parent).full_name(),
            child: self.node(child).full_name(),
        };
        let c = self.node(parent).children.ok_or_else(not_a_child)?;
        if child == c.keep {
            Ok(c.split)
        } else if child == c.split {
            Ok(c.keep)
        } else {
            Err(not_a_child())
        }
    }

    /// Marker of whichever child does not carry the node's own marker.
    pub(crate) fn other_child_marker(&self, id: NodeId) -> Result<String> {
        let c = self.children_of(id)?;
        let keep = self.node(c.keep);
        if keep.marker != self.node(id).marker {
            Ok(keep.marker.clone())
        } else {
            Ok(self.node(c.split).marker.clone())
        }
    }
}

fn take_named(pool: &mut Vec<UnitRecord>, name: &str) -> Option<UnitRecord> {
    let idx = pool.iter().position(|u| u.name == name)?;
    Some(pool.remove(idx))
}

fn missing_from(node: &LegionNode, name: &str) -> PredictError {
    PredictError::certainty(
        &node.full_name(),
        format!("child holds {} the parent never had", name),
    )
}
