//! Creature catalog: the kill values and leader types every prediction consults.
//!
//! The catalog is immutable configuration. The standard table ships as
//! [`CreatureCatalog::default`]; variants load their own from TOML or JSON.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Kill values of the standard creature set.
const STANDARD_KILL_VALUES: &[(&str, u32)] = &[
    ("Titan", 1242),
    ("Angel", 248),
    ("Archangel", 366),
    ("Behemoth", 240),
    ("Centaur", 122),
    ("Colossus", 404),
    ("Cyclops", 181),
    ("Dragon", 299),
    ("Gargoyle", 124),
    ("Giant", 285),
    ("Gorgon", 189),
    ("Griffon", 208),
    ("Guardian", 245),
    ("Hydra", 309),
    ("Lion", 150),
    ("Minotaur", 165),
    ("Ogre", 121),
    ("Ranger", 169),
    ("Serpent", 361),
    ("Troll", 161),
    ("Unicorn", 244),
    ("Warbear", 180),
    ("Warlock", 213),
    ("Wyvern", 214),
];

const STANDARD_LEADERS: [&str; 2] = ["Titan", "Angel"];

/// Errors raised while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid catalog: {0}")]
    Invalid(String),
}

/// Lookup from creature name to kill value, plus the designated leader types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureCatalog {
    /// Creature types of which an initial legion carries exactly one per half.
    leaders: Vec<String>,

    /// Heuristic strength of each creature type.
    kill_values: BTreeMap<String, u32>,
}

impl Default for CreatureCatalog {
    fn default() -> Self {
        Self {
            leaders: STANDARD_LEADERS.iter().map(|s| s.to_string()).collect(),
            kill_values: STANDARD_KILL_VALUES
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        }
    }
}

impl CreatureCatalog {
    /// Build and validate a catalog from its parts.
    pub fn new(
        leaders: impl IntoIterator<Item = impl Into<String>>,
        kill_values: impl IntoIterator<Item = (impl Into<String>, u32)>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            leaders: leaders.into_iter().map(Into::into).collect(),
            kill_values: kill_values
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a catalog from TOML text.
    ///
    /// ```toml
    /// leaders = ["Titan", "Angel"]
    ///
    /// [kill_values]
    /// Titan = 1242
    /// Angel = 248
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let catalog: Self = toml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a catalog from JSON text with the same shape as the TOML form.
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file. Files ending in `.json` are read as JSON, anything else as TOML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.kill_values.is_empty() {
            return Err(CatalogError::Invalid("no creatures listed".into()));
        }
        if self.leaders.is_empty() {
            return Err(CatalogError::Invalid("no leader types listed".into()));
        }
        if let Some(missing) = self.leaders.iter().find(|l| !self.kill_values.contains_key(*l)) {
            return Err(CatalogError::Invalid(format!(
                "leader {} has no kill value",
                missing
            )));
        }
        Ok(())
    }

    /// Kill value of a creature, if the catalog lists it.
    pub fn kill_value(&self, name: &str) -> Option<u32> {
        self.kill_values.get(name).copied()
    }

    /// Sum of kill values; unlisted names count as zero.
    pub fn total_kill_value<S: AsRef<str>>(&self, names: &[S]) -> u32 {
        names
            .iter()
            .map(|n| self.kill_value(n.as_ref()).unwrap_or(0))
            .sum()
    }

    /// Check whether the catalog lists a creature.
    pub fn contains(&self, name: &str) -> bool {
        self.kill_values.contains_key(name)
    }

    /// The designated leader types.
    pub fn leaders(&self) -> &[String] {
        &self.leaders
    }

    pub fn is_leader(&self, name: &str) -> bool {
        self.leaders.iter().any(|l| l == name)
    }

    /// All creature names, alphabetically.
    pub fn creature_names(&self) -> impl Iterator<Item = &str> {
        self.kill_values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.kill_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kill_values.is_empty()
    }

    /// Display order: decreasing kill value, identical creatures kept together by name.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let va = self.kill_value(a).unwrap_or(0);
        let vb = self.kill_value(b).unwrap_or(0);
        vb.cmp(&va).then_with(|| a.cmp(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog() {
        let catalog = CreatureCatalog::default();
        assert_eq!(catalog.len(), 24);
        assert_eq!(catalog.kill_value("Titan"), Some(1242));
        assert_eq!(catalog.kill_value("Ogre"), Some(121));
        assert_eq!(catalog.kill_value("Balrog"), None);
        assert!(catalog.is_leader("Angel"));
        assert!(!catalog.is_leader("Archangel"));
    }

    #[test]
    fn test_total_kill_value() {
        let catalog = CreatureCatalog::default();
        assert_eq!(catalog.total_kill_value(&["Angel", "Ogre", "Ogre", "Centaur"]), 612);
    }

    #[test]
    fn test_compare_orders_by_value_then_name() {
        let catalog = CreatureCatalog::default();
        let mut names = vec!["Ogre", "Titan", "Gargoyle", "Centaur", "Angel"];
        names.sort_by(|a, b| catalog.compare(a, b));
        assert_eq!(names, vec!["Titan", "Angel", "Gargoyle", "Centaur", "Ogre"]);
    }

    #[test]
    fn test_from_toml() {
        let text = r#"
            leaders = ["Titan", "Balrog"]

            [kill_values]
            Titan = 1242
            Balrog = 400
            Ogre = 121
        "#;
        let catalog = CreatureCatalog::from_toml_str(text).unwrap();
        assert_eq!(catalog.kill_value("Balrog"), Some(400));
        assert!(catalog.is_leader("Balrog"));
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_from_json() {
        let text = r#"{"leaders": ["Titan"], "kill_values": {"Titan": 1242, "Ogre": 121}}"#;
        let catalog = CreatureCatalog::from_json_str(text).unwrap();
        assert_eq!(catalog.leaders(), &["Titan".to_string()]);
    }

    #[test]
    fn test_rejects_leader_without_value() {
        let text = r#"
            leaders = ["Titan", "Angel"]

            [kill_values]
            Titan = 1242
        "#;
        let err = CreatureCatalog::from_toml_str(text).unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = CreatureCatalog::from_toml_str("leaders = [").unwrap_err();
        assert!(matches!(err, CatalogError::Toml(_)));
    }

    #[test]
    fn test_new_validates() {
        assert!(CreatureCatalog::new(Vec::<String>::new(), [("Ogre", 121)]).is_err());
        let catalog = CreatureCatalog::new(["Ogre"], [("Ogre", 121)]).unwrap();
        assert!(catalog.contains("Ogre"));
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let catalog = CreatureCatalog::default();
        let text = toml::to_string(&catalog).unwrap();
        assert_eq!(CreatureCatalog::from_toml_str(&text).unwrap(), catalog);
    }
}
