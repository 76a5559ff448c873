//! Game events fed to the belief tree by the game-rules collaborator.
//!
//! Events must be applied in the order they happened in the game.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LegionEvent {
    /// `marker` split `child_size` creatures off into a new legion.
    Split {
        marker: String,
        child_size: usize,
        new_marker: String,
        turn: u32,
    },

    /// Two sibling legions recombined because neither could move.
    Merge {
        marker: String,
        other_marker: String,
        turn: u32,
    },

    /// Creatures in a legion were shown to the observer.
    Reveal {
        marker: String,
        creatures: Vec<String>,
    },

    /// A creature was recruited or summoned into a legion.
    Add { marker: String, creature: String },

    /// Creatures died or left a legion.
    Remove {
        marker: String,
        creatures: Vec<String>,
    },
}

impl LegionEvent {
    /// Marker of the legion the event is addressed to.
    pub fn marker(&self) -> &str {
        match self {
            LegionEvent::Split { marker, .. }
            | LegionEvent::Merge { marker, .. }
            | LegionEvent::Reveal { marker, .. }
            | LegionEvent::Add { marker, .. }
            | LegionEvent::Remove { marker, .. } => marker,
        }
    }
}
