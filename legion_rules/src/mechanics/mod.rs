//! Legion mechanics: height limits and the initial split rule.

use crate::creatures::CreatureCatalog;
use crate::units::count_named;

/// No legion may ever hold more than this many creatures.
pub const MAX_LEGION_HEIGHT: usize = 8;

/// A full starting legion must split into two halves of this size.
pub const INITIAL_SPLIT_SIZE: usize = 4;

/// A leaf at this height or above cannot take another creature.
pub const RECRUIT_CEILING: usize = 7;

/// Number of leader-type creatures among `names`.
pub fn leader_count<T: AsRef<str>>(catalog: &CreatureCatalog, names: &[T]) -> usize {
    catalog
        .leaders()
        .iter()
        .map(|leader| count_named(names, leader))
        .sum()
}

/// Check whether a full-height legion lists every leader type.
pub fn has_all_leaders<T: AsRef<str>>(catalog: &CreatureCatalog, names: &[T]) -> bool {
    catalog
        .leaders()
        .iter()
        .all(|leader| count_named(names, leader) > 0)
}

/// A legal half of an initial legion: four creatures with exactly one leader.
pub fn is_legal_initial_splitoff<T: AsRef<str>>(catalog: &CreatureCatalog, names: &[T]) -> bool {
    names.len() == INITIAL_SPLIT_SIZE && leader_count(catalog, names) == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_initial_splitoff() {
        let catalog = CreatureCatalog::default();
        assert!(is_legal_initial_splitoff(&catalog, &["Titan", "Ogre", "Ogre", "Centaur"]));
        assert!(is_legal_initial_splitoff(&catalog, &["Angel", "Gargoyle", "Ogre", "Centaur"]));
        assert!(!is_legal_initial_splitoff(&catalog, &["Titan", "Angel", "Ogre", "Centaur"]));
        assert!(!is_legal_initial_splitoff(&catalog, &["Gargoyle", "Ogre", "Ogre", "Centaur"]));
        assert!(!is_legal_initial_splitoff(&catalog, &["Titan", "Ogre", "Ogre"]));
    }

    #[test]
    fn test_has_all_leaders() {
        let catalog = CreatureCatalog::default();
        assert!(has_all_leaders(&catalog, &["Ogre", "Angel", "Titan"]));
        assert!(!has_all_leaders(&catalog, &["Ogre", "Titan"]));
    }
}
