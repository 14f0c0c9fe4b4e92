//! DashMap-based strategy storage implementation.
//!
//! Provides lock-free concurrent access to the name -> strategy table.

use dashmap::DashMap;

use crate::types::StrategyInfo;

use super::traits::{StoredStrategy, StrategyStorage};

/// DashMap-based implementation of `StrategyStorage`.
pub struct DashMapStrategyStorage {
    strategies: DashMap<String, StoredStrategy>,
}

impl DashMapStrategyStorage {
    /// Create a new, empty storage instance.
    pub fn new() -> Self {
        Self {
            strategies: DashMap::new(),
        }
    }
}

impl Default for DashMapStrategyStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyStorage for DashMapStrategyStorage {
    fn insert(&self, name: String, strategy: StoredStrategy) -> Option<StoredStrategy> {
        self.strategies.insert(name, strategy)
    }

    fn get(&self, name: &str) -> Option<StoredStrategy> {
        self.strategies.get(name).map(|entry| entry.value().clone())
    }

    fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    fn names(&self) -> Vec<String> {
        self.strategies.iter().map(|e| e.key().clone()).collect()
    }

    fn list(&self) -> Vec<StrategyInfo> {
        self.strategies
            .iter()
            .map(|entry| entry.value().info(entry.key()))
            .collect()
    }

    fn len(&self) -> usize {
        self.strategies.len()
    }

    fn clear(&self) {
        self.strategies.clear();
    }
}
