//! The named strategy table.
//!
//! [`StrategyRegistry`] validates every strategy against the contract
//! before storing it. Registering with a base stores that very type, and
//! extensions are applied to stored types in place, so every holder of a
//! type handle observes them. A failed registration or extension is staged
//! and discarded without side effects.
//!
//! # Concurrency
//!
//! Lookups read the storage directly. `register`, `extend` and `clear` are
//! serialized by a registry-wide mutex, and type extensions are swapped in
//! atomically, so a lookup never observes a partially applied body.

mod storage;
mod traits;

use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::strategy::contract;
use crate::strategy::{Definition, Strategy, StrategyType};
use crate::types::{Params, StrategyInfo};

pub use storage::DashMapStrategyStorage;
pub use traits::{StoredStrategy, StrategyStorage};

/// Registry of named authentication strategies.
pub struct StrategyRegistry<S: StrategyStorage = DashMapStrategyStorage> {
    storage: S,
    config: RegistryConfig,
    mutation: Mutex<()>,
}

impl StrategyRegistry {
    /// Create an empty registry configured from the environment.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self::with_storage(DashMapStrategyStorage::new(), config)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StrategyStorage> StrategyRegistry<S> {
    pub fn with_storage(storage: S, config: RegistryConfig) -> Self {
        Self {
            storage,
            config,
            mutation: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a strategy under `name`.
    ///
    /// With a `base`, `body` is applied to `base` itself and `base` is stored,
    /// so every holder of that type observes later extensions. Without one, a
    /// fresh type deriving from the canonical base is created from `body`.
    /// The result replaces any previous registration of `name` and is returned.
    ///
    /// # Errors
    ///
    /// * `ContractViolation::InvalidBase` - `base` does not derive from the canonical base
    /// * `ContractViolation::MissingAuthenticate` - the resulting type lacks `authenticate`
    ///
    /// On error nothing is stored and `base` is left untouched.
    pub fn register<F>(
        &self,
        name: impl Into<String>,
        base: Option<&StrategyType>,
        body: F,
    ) -> RegistryResult<StrategyType>
    where
        F: FnOnce(&mut Definition<'_>),
    {
        let name = name.into();
        let result = match base {
            Some(base) => Self::reopen_base(&name, base, body),
            None => Self::build(&name, body),
        };
        self.store(name, result)
    }

    /// Register a strategy defined entirely by `body`.
    pub fn define<F>(&self, name: impl Into<String>, body: F) -> RegistryResult<StrategyType>
    where
        F: FnOnce(&mut Definition<'_>),
    {
        self.register(name, None, body)
    }

    /// Register a pre-built type as is.
    pub fn register_type(
        &self,
        name: impl Into<String>,
        base: &StrategyType,
    ) -> RegistryResult<StrategyType> {
        let name = name.into();
        let result = contract::ensure_strategy_base(&name, base)
            .and_then(|_| contract::ensure_contract(&name, base))
            .map(|_| base.clone())
            .map_err(RegistryError::from);
        self.store(name, result)
    }

    /// Apply `body` to the type stored under `name`, in place.
    ///
    /// Every handle to the stored type, including instances created from it,
    /// observes the change. When `revalidate_on_extend` is set, an extension
    /// that leaves the type without `authenticate` is rolled back.
    ///
    /// `body` must not call back into this registry's mutating operations.
    ///
    /// # Errors
    ///
    /// * `NotFound` - nothing is registered under `name`
    /// * `ContractViolation::MissingAuthenticate` - the extension removed `authenticate`
    pub fn extend<F>(&self, name: &str, body: F) -> RegistryResult<StrategyType>
    where
        F: FnOnce(&mut Definition<'_>),
    {
        let _guard = self.lock();
        let stored = self
            .storage
            .get(name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })?;
        let definition = stored.definition;

        let revalidate = self.config.revalidate_on_extend;
        let revision = definition
            .reopen_checked(body, |staged| {
                if revalidate {
                    contract::ensure_staged_contract(name, staged)
                } else {
                    Ok(())
                }
            })
            .map_err(|e| {
                warn!("Rejected extension of strategy {}: {}", name, e);
                RegistryError::from(e)
            })?;

        debug!("Extended strategy {} to revision {}", name, revision);
        Ok(definition)
    }

    /// The type currently registered under `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<StrategyType> {
        self.storage.get(name).map(|stored| stored.definition)
    }

    /// Remove every registration. Existing type handles and instances are unaffected.
    pub fn clear(&self) {
        let _guard = self.lock();
        let count = self.storage.len();
        self.storage.clear();
        debug!("Cleared {} strategies", count);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.storage.contains(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names = self.storage.names();
        names.sort();
        names
    }

    /// Listing entries for every registration, sorted by name.
    pub fn list(&self) -> Vec<StrategyInfo> {
        let mut infos = self.storage.list();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Create a per-request instance of the strategy registered under `name`.
    ///
    /// `scope` defaults to the configured default scope.
    pub fn instantiate(&self, name: &str, scope: Option<&str>, params: Params) -> Option<Strategy> {
        let definition = self.lookup(name)?;
        let scope = scope.unwrap_or(&self.config.default_scope);
        Some(definition.instantiate(name, scope, params))
    }

    fn store(
        &self,
        name: String,
        result: RegistryResult<StrategyType>,
    ) -> RegistryResult<StrategyType> {
        let definition = match result {
            Ok(definition) => definition,
            Err(e) => {
                warn!("Rejected strategy {}: {}", name, e);
                return Err(e);
            }
        };

        let _guard = self.lock();
        if let Some(previous) = self
            .storage
            .insert(name.clone(), StoredStrategy::new(definition.clone()))
        {
            debug!(
                "Replaced strategy {} (was {})",
                name,
                previous.definition.name()
            );
        }
        debug!("Registered strategy {} as {}", name, definition.name());
        Ok(definition)
    }

    fn build<F>(name: &str, body: F) -> RegistryResult<StrategyType>
    where
        F: FnOnce(&mut Definition<'_>),
    {
        let definition = contract::base().subclass(format!("Strategy[{}]", name), body);
        contract::ensure_contract(name, &definition)?;
        Ok(definition)
    }

    /// Apply `body` to `base` in place, committing only if the result keeps `authenticate`.
    fn reopen_base<F>(name: &str, base: &StrategyType, body: F) -> RegistryResult<StrategyType>
    where
        F: FnOnce(&mut Definition<'_>),
    {
        contract::ensure_strategy_base(name, base)?;
        base.reopen_checked(body, |staged| {
            contract::ensure_staged_contract(name, staged)
        })?;
        Ok(base.clone())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutation.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Global strategy registry instance.
pub static STRATEGIES: Lazy<StrategyRegistry> = Lazy::new(StrategyRegistry::new);
