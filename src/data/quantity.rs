use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use crate::SimError;

/// A set of named quantities at one instant
///
/// Parameters, driver values, state variables and derived values all live in
/// a [QuantityMap]. Keys are unique and iteration is sorted by name, so any
/// output built from a map is reproducible.
///
/// # Example
///
/// ```
/// use biosim::*;
///
/// let mut q = QuantityMap::from([("mass", 10.0), ("spring_constant", 0.1)]);
/// q.set("mass", 12.0);
/// assert_eq!(q.get("mass").unwrap(), 12.0);
/// assert!(q.get("velocity").is_err());
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct QuantityMap {
    values: BTreeMap<String, f64>,
}

impl QuantityMap {
    /// Create a new empty map
    pub fn new() -> Self {
        QuantityMap {
            values: BTreeMap::new(),
        }
    }

    /// Get the value of a quantity
    ///
    /// Fails with [SimError::QuantityNotFound] if the name is absent.
    #[inline]
    pub fn get(&self, name: &str) -> Result<f64, SimError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| SimError::quantity_not_found(name))
    }

    /// Set a quantity, overwriting any previous value
    #[inline]
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Add `value` to an existing quantity
    ///
    /// Fails with [SimError::QuantityNotFound] if the name is absent, so
    /// accumulation never silently creates a quantity.
    #[inline]
    pub fn add(&mut self, name: &str, value: f64) -> Result<(), SimError> {
        match self.values.get_mut(name) {
            Some(current) => {
                *current += value;
                Ok(())
            }
            None => Err(SimError::quantity_not_found(name)),
        }
    }

    /// Check whether a quantity is defined
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Remove a quantity, returning its value if it was present
    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.values.remove(name)
    }

    /// Merge `other` into this map; entries of `other` win on collision
    pub fn merge(&mut self, other: &QuantityMap) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), *value);
        }
    }

    /// Build a map from layers, later layers overwriting earlier ones
    ///
    /// This is the order used for every system evaluation:
    /// parameters, then driver values, then the current state.
    pub fn layered<'a>(layers: impl IntoIterator<Item = &'a QuantityMap>) -> QuantityMap {
        let mut merged = QuantityMap::new();
        for layer in layers {
            merged.merge(layer);
        }
        merged
    }

    /// A map with the given names, all set to zero
    pub fn zeros<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> QuantityMap {
        names
            .into_iter()
            .map(|name| (name.as_ref().to_string(), 0.0))
            .collect()
    }

    /// Names of all quantities, in iteration order
    pub fn names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Values for the requested names, in the requested order
    pub fn values_of<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<f64>, SimError> {
        names.iter().map(|name| self.get(name.as_ref())).collect()
    }

    /// Iterate over `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for QuantityMap {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        QuantityMap {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}

impl<S: Into<String>, const N: usize> From<[(S, f64); N]> for QuantityMap {
    fn from(entries: [(S, f64); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a QuantityMap {
    type Item = (&'a String, &'a f64);
    type IntoIter = std::collections::btree_map::Iter<'a, String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for QuantityMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.values {
            writeln!(f, "{}: {}", name, value)?;
        }
        Ok(())
    }
}
