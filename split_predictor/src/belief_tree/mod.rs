//! Belief Tree - predicted contents of one player's legions.
//!
//! The tree starts from a fully known root legion and grows a node pair on
//! every split. Nodes live in an arena and refer to each other by [`NodeId`];
//! the parent link is a plain index, so ownership stays with the arena.
//!
//! Every public operation is transactional: if it fails, the tree is left
//! exactly as it was before the call.

mod inference;
mod node;

pub use node::NodeId;

use legion_rules::{CreatureCatalog, UnitRecord, MAX_LEGION_HEIGHT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{PredictError, Result};
use crate::events::LegionEvent;
use node::LegionNode;

/// Unique identifier for belief trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeId(pub Uuid);

impl TreeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TreeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TreeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live legion as the display collaborator sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafView {
    pub marker: String,
    pub turn_created: u32,
    pub units: Vec<UnitRecord>,
}

impl LeafView {
    pub fn height(&self) -> usize {
        self.units.len()
    }

    pub fn names(&self) -> Vec<String> {
        legion_rules::names(&self.units)
    }

    pub fn certain_names(&self) -> Vec<String> {
        self.units
            .iter()
            .filter(|u| u.certain)
            .map(|u| u.name.clone())
            .collect()
    }

    pub fn all_certain(&self) -> bool {
        self.units.iter().all(|u| u.certain)
    }
}

/// One node of the history tree, including its links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub marker: String,
    pub turn_created: u32,
    pub units: Vec<UnitRecord>,
    pub removed: Vec<UnitRecord>,
    pub parent: Option<NodeId>,
    /// Stronger child first.
    pub children: Option<[NodeId; 2]>,
    pub child_sizes: Option<[usize; 2]>,
    pub turn_split: Option<u32>,
}

impl NodeView {
    /// Reorder units by decreasing kill value for display.
    pub fn sort_units(&mut self, catalog: &CreatureCatalog) {
        self.units.sort_by(|a, b| catalog.compare(&a.name, &b.name));
    }
}

impl std::fmt::Display for NodeView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}):", self.marker, self.turn_created)?;
        for unit in &self.units {
            write!(f, " {}", unit)?;
        }
        for unit in &self.removed {
            write!(f, " {}-", unit)?;
        }
        Ok(())
    }
}

/// Split prediction state for one player.
#[derive(Debug, Clone)]
pub struct BeliefTree {
    id: TreeId,
    owner: String,
    catalog: Arc<CreatureCatalog>,
    nodes: Vec<LegionNode>,
    root: NodeId,
    /// Current nesting of split propagation.
    depth: usize,
}

impl BeliefTree {
    /// Create a tree whose root legion is fully known, using the standard catalog.
    pub fn new<S: AsRef<str>>(
        owner: impl Into<String>,
        root_marker: impl Into<String>,
        creatures: &[S],
    ) -> Result<Self> {
        Self::with_catalog(
            owner,
            root_marker,
            creatures,
            Arc::new(CreatureCatalog::default()),
        )
    }

    /// Create a tree that consults the given catalog.
    pub fn with_catalog<S: AsRef<str>>(
        owner: impl Into<String>,
        root_marker: impl Into<String>,
        creatures: &[S],
        catalog: Arc<CreatureCatalog>,
    ) -> Result<Self> {
        let root_marker = root_marker.into();
        if creatures.len() > MAX_LEGION_HEIGHT {
            return Err(PredictError::CapacityViolation {
                marker: root_marker,
                height: creatures.len(),
                max: MAX_LEGION_HEIGHT,
            });
        }
        let units = creatures
            .iter()
            .map(|c| UnitRecord::known(c.as_ref()))
            .collect();
        let tree = Self {
            id: TreeId::new(),
            owner: owner.into(),
            catalog,
            nodes: vec![LegionNode::new(root_marker, 0, units, None)],
            root: NodeId(0),
            depth: 0,
        };
        tree.check_known(creatures)?;
        Ok(tree)
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn catalog(&self) -> &CreatureCatalog {
        &self.catalog
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// A legion split `child_size` creatures off under `new_marker`.
    pub fn on_split(
        &mut self,
        marker: &str,
        child_size: usize,
        new_marker: &str,
        turn: u32,
    ) -> Result<()> {
        info!(tree = %self.id, marker, child_size, new_marker, turn, "split");
        self.transact("split", |tree| {
            let id = tree.find_leaf(marker)?;
            tree.split(id, child_size, new_marker, Some(turn))
        })
    }

    /// Two sibling legions recombined.
    pub fn on_merge(&mut self, marker: &str, other_marker: &str, turn: u32) -> Result<()> {
        info!(tree = %self.id, marker, other_marker, turn, "merge");
        self.transact("merge", |tree| {
            let id = tree.find_leaf(marker)?;
            let other = tree.find_leaf(other_marker)?;
            tree.merge(id, other, turn)
        })
    }

    /// Creatures in a legion were seen.
    pub fn on_reveal<S: AsRef<str>>(&mut self, marker: &str, creatures: &[S]) -> Result<()> {
        let creatures = legion_rules::names(creatures);
        info!(tree = %self.id, marker, creatures = ?creatures, "reveal");
        self.transact("reveal", |tree| {
            tree.check_known(&creatures)?;
            let id = tree.find_leaf(marker)?;
            tree.reveal(id, &creatures)
        })
    }

    /// A creature joined a legion.
    pub fn on_add(&mut self, marker: &str, creature: &str) -> Result<()> {
        info!(tree = %self.id, marker, creature, "add");
        self.transact("add", |tree| {
            tree.check_known(&[creature])?;
            let id = tree.find_leaf(marker)?;
            tree.add_unit(id, creature)
        })
    }

    /// A creature left a legion.
    pub fn on_remove(&mut self, marker: &str, creature: &str) -> Result<()> {
        info!(tree = %self.id, marker, creature, "remove");
        self.transact("remove", |tree| {
            tree.check_known(&[creature])?;
            let id = tree.find_leaf(marker)?;
            tree.remove_unit(id, creature)
        })
    }

    /// Several creatures left a legion at once.
    pub fn on_remove_all<S: AsRef<str>>(&mut self, marker: &str, creatures: &[S]) -> Result<()> {
        let creatures = legion_rules::names(creatures);
        info!(tree = %self.id, marker, creatures = ?creatures, "remove");
        self.transact("remove", |tree| {
            tree.check_known(&creatures)?;
            let id = tree.find_leaf(marker)?;
            tree.remove_units(id, &creatures)
        })
    }

    /// Apply one event from the game timeline.
    pub fn apply(&mut self, event: &LegionEvent) -> Result<()> {
        match event {
            LegionEvent::Split {
                marker,
                child_size,
                new_marker,
                turn,
            } => self.on_split(marker, *child_size, new_marker, *turn),
            LegionEvent::Merge {
                marker,
                other_marker,
                turn,
            } => self.on_merge(marker, other_marker, *turn),
            LegionEvent::Reveal { marker, creatures } => {
                self.on_reveal(marker, creatures.as_slice())
            }
            LegionEvent::Add { marker, creature } => self.on_add(marker, creature),
            LegionEvent::Remove { marker, creatures } => match creatures.as_slice() {
                [single] => self.on_remove(marker, single),
                _ => self.on_remove_all(marker, creatures.as_slice()),
            },
        }
    }

    /// All live, non-empty legions, depth-first with the stronger side first.
    pub fn leaves(&self) -> Result<Vec<LeafView>> {
        Ok(self
            .live_leaves()?
            .into_iter()
            .map(|id| {
                let node = self.node(id);
                LeafView {
                    marker: node.marker.clone(),
                    turn_created: node.turn_created,
                    units: node.units.clone(),
                }
            })
            .collect())
    }

    /// The live legion carrying `marker`.
    pub fn leaf(&self, marker: &str) -> Result<LeafView> {
        self.leaves()?
            .into_iter()
            .find(|leaf| leaf.marker == marker)
            .ok_or_else(|| no_live_legion(marker))
    }

    /// Every node reachable from the root, ordered by creation turn then marker.
    pub fn nodes(&self) -> Vec<NodeView> {
        let mut ids = Vec::new();
        self.collect_nodes(self.root, &mut ids);
        let mut views: Vec<NodeView> = ids
            .into_iter()
            .map(|id| {
                let node = self.node(id);
                NodeView {
                    id,
                    marker: node.marker.clone(),
                    turn_created: node.turn_created,
                    units: node.units.clone(),
                    removed: node.removed.clone(),
                    parent: node.parent,
                    children: node.children.map(|c| [c.keep, c.split]),
                    child_sizes: node.children.map(|c| [c.keep_size, c.split_size]),
                    turn_split: node.turn_split,
                }
            })
            .collect();
        views.sort_by(|a, b| {
            (a.turn_created, &a.marker).cmp(&(b.turn_created, &b.marker))
        });
        views
    }

    fn transact<T>(&mut self, op: &str, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let checkpoint = self.nodes.clone();
        let result = f(self);
        if let Err(err) = &result {
            warn!(tree = %self.id, op, error = %err, "rolling back");
            self.nodes = checkpoint;
            self.depth = 0;
        }
        result
    }

    fn check_known<S: AsRef<str>>(&self, creatures: &[S]) -> Result<()> {
        match creatures.iter().find(|c| !self.catalog.contains(c.as_ref())) {
            Some(unknown) => Err(PredictError::UnknownCreature(unknown.as_ref().to_string())),
            None => Ok(()),
        }
    }

    fn find_leaf(&self, marker: &str) -> Result<NodeId> {
        self.live_leaves()?
            .into_iter()
            .find(|&id| self.node(id).marker == marker)
            .ok_or_else(|| no_live_legion(marker))
    }

    /// Non-empty leaves with each marker resolved to its newest holder.
    fn live_leaves(&self) -> Result<Vec<NodeId>> {
        let mut candidates = Vec::new();
        self.collect_leaves(self.root, &mut candidates);

        let mut newest: HashMap<&str, NodeId> = HashMap::new();
        for &id in &candidates {
            let node = self.node(id);
            match newest.get(node.marker.as_str()) {
                None => {
                    newest.insert(&node.marker, id);
                }
                Some(&seen) => {
                    let seen_turn = self.node(seen).turn_created;
                    if seen_turn == node.turn_created {
                        return Err(PredictError::structural(format!(
                            "two live legions named {}",
                            node.full_name()
                        )));
                    }
                    if node.turn_created > seen_turn {
                        newest.insert(&node.marker, id);
                    }
                }
            }
        }

        Ok(candidates
            .into_iter()
            .filter(|&id| newest.get(self.node(id).marker.as_str()) == Some(&id))
            .collect())
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let node = self.node(id);
        match node.children {
            Some(c) => {
                self.collect_leaves(c.keep, out);
                self.collect_leaves(c.split, out);
            }
            None if node.height() > 0 => out.push(id),
            None => {}
        }
    }

    fn collect_nodes(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        if let Some(c) = self.node(id).children {
            self.collect_nodes(c.keep, out);
            self.collect_nodes(c.split, out);
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &LegionNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut LegionNode {
        &mut self.nodes[id.0]
    }

    pub(crate) fn push_node(&mut self, node: LegionNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }
}

fn no_live_legion(marker: &str) -> PredictError {
    PredictError::structural(format!("no live legion named {}", marker))
}
