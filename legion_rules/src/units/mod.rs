//! Unit records and the by-name multiset helpers built on them.
//!
//! Two records of the same creature type are interchangeable for membership,
//! so every helper here compares names explicitly rather than whole records.

use serde::{Deserialize, Serialize};

/// One creature slot in a legion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitRecord {
    pub name: String,

    /// Identity confirmed by observation rather than inferred.
    pub certain: bool,

    /// Already in the legion when its most recent split happened.
    pub at_split: bool,
}

impl UnitRecord {
    pub fn new(name: impl Into<String>, certain: bool, at_split: bool) -> Self {
        Self {
            name: name.into(),
            certain,
            at_split,
        }
    }

    /// A directly observed unit that was present at the last split.
    pub fn known(name: impl Into<String>) -> Self {
        Self::new(name, true, true)
    }

    /// A placeholder guessed to fill out a split side.
    pub fn hypothesized(name: impl Into<String>) -> Self {
        Self::new(name, false, true)
    }

    /// A unit that joined after the last split (recruited or summoned).
    pub fn recruited(name: impl Into<String>) -> Self {
        Self::new(name, true, false)
    }
}

impl AsRef<str> for UnitRecord {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for UnitRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.certain {
            write!(f, "?")?;
        }
        if !self.at_split {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// Names of the given units, in order.
pub fn names<T: AsRef<str>>(items: &[T]) -> Vec<String> {
    items.iter().map(|i| i.as_ref().to_string()).collect()
}

/// How many items carry the given name.
pub fn count_named<T: AsRef<str>>(items: &[T], name: &str) -> usize {
    items.iter().filter(|i| i.as_ref() == name).count()
}

/// Check that `big` holds at least as many of every name as `little` does.
pub fn is_superset<A: AsRef<str>, B: AsRef<str>>(big: &[A], little: &[B]) -> bool {
    little
        .iter()
        .all(|l| count_named(big, l.as_ref()) >= count_named(little, l.as_ref()))
}

/// Remove the first item with the given name. Returns whether one was found.
pub fn remove_named<T: AsRef<str>>(items: &mut Vec<T>, name: &str) -> bool {
    match items.iter().position(|i| i.as_ref() == name) {
        Some(idx) => {
            items.remove(idx);
            true
        }
        None => false,
    }
}

/// Multiset difference by name. Returns `None` unless `big` is a superset of `little`.
pub fn subtract<T: AsRef<str> + Clone, L: AsRef<str>>(big: &[T], little: &[L]) -> Option<Vec<T>> {
    let mut rest = big.to_vec();
    for l in little {
        if !remove_named(&mut rest, l.as_ref()) {
            return None;
        }
    }
    Some(rest)
}

/// Minimum number of times `name` appears across every list; zero when there are no lists.
pub fn min_count<T: AsRef<str>>(lists: &[Vec<T>], name: &str) -> usize {
    lists
        .iter()
        .map(|list| count_named(list, name))
        .min()
        .unwrap_or(0)
}

/// Remove the most recently appended uncertain unit. Returns whether one was found.
pub fn remove_last_uncertain(units: &mut Vec<UnitRecord>) -> bool {
    match units.iter().rposition(|u| !u.certain) {
        Some(idx) => {
            units.remove(idx);
            true
        }
        None => false,
    }
}
