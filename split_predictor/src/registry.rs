//! Split predictor registry - one belief tree per observed player.

use legion_rules::CreatureCatalog;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::belief_tree::BeliefTree;
use crate::error::{PredictError, Result};
use crate::events::LegionEvent;

/// Owns the belief trees of every player, sharing one catalog between them.
#[derive(Debug, Clone)]
pub struct SplitPredictor {
    catalog: Arc<CreatureCatalog>,
    trees: HashMap<String, BeliefTree>,
}

impl Default for SplitPredictor {
    fn default() -> Self {
        Self::new(CreatureCatalog::default())
    }
}

impl SplitPredictor {
    pub fn new(catalog: CreatureCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            trees: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> &CreatureCatalog {
        &self.catalog
    }

    /// Start tracking a player from their fully known starting legion.
    ///
    /// Returns `false` without changes if the player is already tracked.
    pub fn init_player<S: AsRef<str>>(
        &mut self,
        owner: &str,
        root_marker: &str,
        creatures: &[S],
    ) -> Result<bool> {
        if self.trees.contains_key(owner) {
            return Ok(false);
        }
        let tree =
            BeliefTree::with_catalog(owner, root_marker, creatures, Arc::clone(&self.catalog))?;
        info!(owner, root_marker, tree = %tree.id(), "tracking player");
        self.trees.insert(owner.to_string(), tree);
        Ok(true)
    }

    pub fn tree(&self, owner: &str) -> Option<&BeliefTree> {
        self.trees.get(owner)
    }

    pub fn tree_mut(&mut self, owner: &str) -> Option<&mut BeliefTree> {
        self.trees.get_mut(owner)
    }

    /// Apply an event to one player's tree.
    pub fn apply(&mut self, owner: &str, event: &LegionEvent) -> Result<()> {
        self.trees
            .get_mut(owner)
            .ok_or_else(|| PredictError::structural(format!("player {} is not tracked", owner)))?
            .apply(event)
    }

    /// Stop tracking an eliminated player.
    pub fn remove_player(&mut self, owner: &str) -> Option<BeliefTree> {
        let removed = self.trees.remove(owner);
        if removed.is_some() {
            info!(owner, "player eliminated, dropping tree");
        }
        removed
    }

    /// Names of all tracked players, sorted.
    pub fn players(&self) -> Vec<&str> {
        let mut players: Vec<&str> = self.trees.keys().map(String::as_str).collect();
        players.sort_unstable();
        players
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: [&str; 8] = [
        "Titan", "Angel", "Ogre", "Ogre", "Centaur", "Centaur", "Gargoyle", "Gargoyle",
    ];

    #[test]
    fn test_init_player_once() {
        let mut predictor = SplitPredictor::default();
        assert!(predictor.init_player("red", "Rd01", &START).unwrap());
        assert!(!predictor.init_player("red", "Rd05", &START).unwrap());
        assert_eq!(predictor.tree("red").unwrap().leaves().unwrap()[0].marker, "Rd01");
    }

    #[test]
    fn test_trees_are_independent() {
        let mut predictor = SplitPredictor::default();
        predictor.init_player("red", "Rd01", &START).unwrap();
        predictor.init_player("blue", "Bu01", &START).unwrap();

        predictor
            .apply(
                "red",
                &LegionEvent::Split {
                    marker: "Rd01".into(),
                    child_size: 4,
                    new_marker: "Rd02".into(),
                    turn: 1,
                },
            )
            .unwrap();

        assert_eq!(predictor.tree("red").unwrap().leaves().unwrap().len(), 2);
        assert_eq!(predictor.tree("blue").unwrap().leaves().unwrap().len(), 1);
        assert_ne!(
            predictor.tree("red").unwrap().id(),
            predictor.tree("blue").unwrap().id()
        );
        assert_eq!(predictor.players(), vec!["blue", "red"]);
    }

    #[test]
    fn test_apply_to_unknown_player() {
        let mut predictor = SplitPredictor::default();
        let err = predictor
            .apply(
                "green",
                &LegionEvent::Add {
                    marker: "Gr01".into(),
                    creature: "Ogre".into(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, PredictError::StructuralViolation(_)));
    }

    #[test]
    fn test_remove_player() {
        let mut predictor = SplitPredictor::default();
        predictor.init_player("red", "Rd01", &START).unwrap();
        assert!(predictor.remove_player("red").is_some());
        assert!(predictor.remove_player("red").is_none());
        assert!(predictor.tree("red").is_none());
        assert!(predictor.players().is_empty());
    }

    #[test]
    fn test_shared_custom_catalog() {
        let catalog = CreatureCatalog::new(
            ["Titan", "Balrog"],
            [("Titan", 1242), ("Balrog", 400), ("Ogre", 121)],
        )
        .unwrap();
        let mut predictor = SplitPredictor::new(catalog);
        predictor
            .init_player("red", "Rd01", &["Titan", "Balrog", "Ogre"])
            .unwrap();
        assert_eq!(
            predictor.tree("red").unwrap().catalog().kill_value("Balrog"),
            Some(400)
        );
        let err = predictor
            .init_player("blue", "Bu01", &["Titan", "Angel"])
            .unwrap_err();
        assert_eq!(err, PredictError::UnknownCreature("Angel".into()));
    }
}
