use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// Distinct keys seen and distinct keys ever classified HOT.
///
/// Purely observational: nothing here feeds back into scoring.
#[derive(Debug, Clone)]
pub struct ObservationTracker<K> {
    keys: HashSet<K>,
    hot_keys: HashSet<K>,
}

impl<K> Default for ObservationTracker<K> {
    fn default() -> Self {
        Self {
            keys: HashSet::new(),
            hot_keys: HashSet::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> ObservationTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time `key` is seen.
    pub fn record_key(&mut self, key: &K) -> bool {
        if self.keys.contains(key) {
            return false;
        }
        self.keys.insert(key.clone())
    }

    /// Returns true the first time `key` is classified HOT.
    pub fn record_hot(&mut self, key: &K) -> bool {
        if self.hot_keys.contains(key) {
            return false;
        }
        self.hot_keys.insert(key.clone())
    }

    pub fn is_tracked(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    pub fn was_hot(&self, key: &K) -> bool {
        self.hot_keys.contains(key)
    }

    pub fn unique_key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn unique_hot_key_count(&self) -> usize {
        self.hot_keys.len()
    }

    /// Share of observed keys that were ever HOT, in percent; 0 when nothing
    /// was observed yet.
    pub fn hot_percentage(&self) -> f64 {
        if self.keys.is_empty() {
            return 0.0;
        }
        100.0 * self.hot_keys.len() as f64 / self.keys.len() as f64
    }

    pub fn report(&self) -> HotnessReport {
        HotnessReport {
            unique_keys: self.unique_key_count(),
            unique_hot_keys: self.unique_hot_key_count(),
            hot_percentage: self.hot_percentage(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotnessReport {
    pub unique_keys: usize,
    pub unique_hot_keys: usize,
    pub hot_percentage: f64,
}

impl std::fmt::Display for HotnessReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Number of unique keys:     {}", self.unique_keys)?;
        writeln!(f, "Number of unique hot keys: {}", self.unique_hot_keys)?;
        write!(f, "Hot percent: {:.1}%", self.hot_percentage)
    }
}
