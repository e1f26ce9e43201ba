//! Rider repository loaded from TOML or YAML.

use std::collections::HashSet;
use std::path::Path;

use paceline_core::Rider;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A set of riders keyed by id.
///
/// ```
/// use paceline_config::Roster;
///
/// let roster = Roster::from_toml_str(r#"
///     [[riders]]
///     id = "58160"
///     name = "John"
///     weight_kg = 75.0
///     height_cm = 178.0
///     one_hour_curve = { coefficient = 530.0, exponent = -0.07 }
///     pull_curve = { coefficient = 600.0, exponent = -0.09 }
/// "#).unwrap();
///
/// assert!(roster.get("58160").is_some());
/// assert!(roster.get("missing").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Roster {
    pub riders: Vec<Rider>,
}

impl Roster {
    pub fn new(riders: Vec<Rider>) -> Self {
        Self { riders }
    }

    /// Loads a roster from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Looks up a rider by id.
    pub fn get(&self, id: &str) -> Option<&Rider> {
        self.riders.iter().find(|r| r.id == id)
    }

    /// Collects riders in the order given. `None` if any id is unknown.
    pub fn select(&self, ids: &[&str]) -> Option<Vec<Rider>> {
        ids.iter().map(|id| self.get(id).cloned()).collect()
    }

    /// Riders with both power curves fitted.
    pub fn searchable(&self) -> Vec<Rider> {
        self.riders
            .iter()
            .filter(|r| r.is_searchable())
            .cloned()
            .collect()
    }

    /// Rejects duplicate ids and riders that break physical invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for rider in &self.riders {
            if !seen.insert(rider.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate rider id {}",
                    rider.id
                )));
            }
            rider
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.riders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.riders.is_empty()
    }
}
