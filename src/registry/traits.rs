//! Storage trait definition for the strategy table.
//!
//! The trait is the seam for dependency injection; the default
//! implementation uses `DashMap`.

use crate::strategy::StrategyType;
use crate::types::StrategyInfo;

/// A stored strategy: the type handle plus registration metadata.
#[derive(Debug, Clone)]
pub struct StoredStrategy {
    pub definition: StrategyType,
    /// Registration timestamp (RFC3339 format)
    pub registered_at: String,
}

impl StoredStrategy {
    pub fn new(definition: StrategyType) -> Self {
        Self {
            definition,
            registered_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Build the listing entry for this strategy under `name`.
    pub fn info(&self, name: &str) -> StrategyInfo {
        StrategyInfo {
            name: name.to_string(),
            type_name: self.definition.name().to_string(),
            ancestors: self
                .definition
                .ancestors()
                .into_iter()
                .map(|ancestor| ancestor.name)
                .collect(),
            registered_at: self.registered_at.clone(),
            revision: self.definition.revision(),
        }
    }
}

/// Trait for strategy table storage.
///
/// Implementations must be thread-safe (`Send + Sync`). Each call must be
/// atomic with respect to the entry it touches.
pub trait StrategyStorage: Send + Sync {
    /// Store a strategy, returning the entry it replaced.
    fn insert(&self, name: String, strategy: StoredStrategy) -> Option<StoredStrategy>;

    /// Get a strategy by name.
    fn get(&self, name: &str) -> Option<StoredStrategy>;

    /// Check if a strategy is stored under `name`.
    fn contains(&self, name: &str) -> bool;

    /// All stored names, in no particular order.
    fn names(&self) -> Vec<String>;

    /// Listing entries for every stored strategy.
    fn list(&self) -> Vec<StrategyInfo>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every stored strategy.
    fn clear(&self);
}
