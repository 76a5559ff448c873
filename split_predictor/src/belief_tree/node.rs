//! Legion nodes: the vertices of the belief tree, stored in an arena.

use legion_rules::UnitRecord;
use serde::{Deserialize, Serialize};

/// Stable handle of a node inside one tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two descendants of a split legion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Children {
    /// Presumed stronger side; always carries the parent's marker.
    pub keep: NodeId,
    pub split: NodeId,
    /// Heights fixed at the first split and reused on every re-split.
    pub keep_size: usize,
    pub split_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LegionNode {
    /// Not unique: markers return to the pool and get reused.
    pub marker: String,
    pub turn_created: u32,
    pub units: Vec<UnitRecord>,
    /// Units present at this node's split that have since left it.
    pub removed: Vec<UnitRecord>,
    pub parent: Option<NodeId>,
    pub children: Option<Children>,
    pub turn_split: Option<u32>,
}

impl LegionNode {
    pub fn new(
        marker: impl Into<String>,
        turn_created: u32,
        units: Vec<UnitRecord>,
        parent: Option<NodeId>,
    ) -> Self {
        Self {
            marker: marker.into(),
            turn_created,
            units,
            removed: Vec::new(),
            parent,
            children: None,
            turn_split: None,
        }
    }

    pub fn height(&self) -> usize {
        self.units.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// `marker(turn)`, the name used in logs and errors.
    pub fn full_name(&self) -> String {
        format!("{}({})", self.marker, self.turn_created)
    }

    pub fn certain_units(&self) -> Vec<UnitRecord> {
        self.units.iter().filter(|u| u.certain).cloned().collect()
    }

    pub fn all_certain(&self) -> bool {
        self.units.iter().all(|u| u.certain)
    }

    /// Units still here from the split, plus the removed ledger.
    pub fn at_split_or_removed(&self) -> Vec<UnitRecord> {
        self.units
            .iter()
            .filter(|u| u.at_split)
            .chain(self.removed.iter())
            .cloned()
            .collect()
    }

    /// Units that joined after the split.
    pub fn after_split(&self) -> Vec<UnitRecord> {
        self.units.iter().filter(|u| !u.at_split).cloned().collect()
    }

    /// Certain units still here from the split, plus the removed ledger.
    pub fn certain_at_split_or_removed(&self) -> Vec<UnitRecord> {
        self.units
            .iter()
            .filter(|u| u.certain && u.at_split)
            .chain(self.removed.iter())
            .cloned()
            .collect()
    }

    pub fn clear_children(&mut self) {
        self.children = None;
    }
}
