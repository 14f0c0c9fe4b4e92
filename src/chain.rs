//! Ordered evaluation of registered strategies.

use tracing::debug;

use crate::error::{ChainError, RegistryError};
use crate::registry::{DashMapStrategyStorage, StrategyRegistry, StrategyStorage};
use crate::types::{Outcome, Params};

/// Strategy chain that tries registered strategies in order.
///
/// Strategies are tried in the order they were added. Strategies whose
/// `valid` predicate rejects the request are skipped. The first halting
/// outcome (success or failure) stops the chain.
///
/// # Example
///
/// ```ignore
/// let chain = StrategyChain::new(&registry)
///     .with("token")
///     .with("password");
///
/// if let Some(result) = chain.run(None, &params)? {
///     println!("{} -> {:?}", result.strategy, result.outcome);
/// }
/// ```
pub struct StrategyChain<'r, S: StrategyStorage = DashMapStrategyStorage> {
    registry: &'r StrategyRegistry<S>,
    names: Vec<String>,
}

/// The halting outcome of a chain and the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainResult {
    pub strategy: String,
    pub outcome: Outcome,
}

impl<'r, S: StrategyStorage> StrategyChain<'r, S> {
    /// Create a new empty chain over `registry`.
    pub fn new(registry: &'r StrategyRegistry<S>) -> Self {
        Self {
            registry,
            names: Vec::new(),
        }
    }

    /// Add a registered strategy name to the chain.
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Run the chain for one request.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(result))` - A strategy halted the chain
    /// * `Ok(None)` - Every strategy was skipped or passed
    /// * `Err(ChainError::Registry)` - A name in the chain is not registered
    /// * `Err(ChainError::Strategy)` - A strategy broke the contract
    pub fn run(
        &self,
        scope: Option<&str>,
        params: &Params,
    ) -> Result<Option<ChainResult>, ChainError> {
        for name in &self.names {
            let mut strategy = self
                .registry
                .instantiate(name, scope, params.clone())
                .ok_or_else(|| RegistryError::NotFound { name: name.clone() })?;

            if !strategy.is_valid() {
                debug!("Skipping strategy {}: not valid for request", name);
                continue;
            }

            debug!("Trying strategy: {}", name);
            let outcome = strategy.run()?;
            if outcome.halts() {
                debug!("Strategy {} halted the chain with {}", name, outcome.kind());
                return Ok(Some(ChainResult {
                    strategy: name.clone(),
                    outcome: outcome.clone(),
                }));
            }
        }

        debug!("No strategy halted the chain");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;

    fn registry() -> StrategyRegistry {
        let registry =
            StrategyRegistry::with_config(RegistryConfig::resolve(Some(true), Some("default")));
        registry
            .define("token", |def| {
                def.valid(|attempt| attempt.param("token").is_some());
                def.authenticate(|attempt| match attempt.param("token") {
                    Some("s3cret") => attempt.success("service"),
                    _ => attempt.fail("invalid token"),
                });
            })
            .unwrap();
        registry
            .define("password", |def| {
                def.valid(|attempt| attempt.param("username").is_some());
                def.authenticate(|attempt| match attempt.param("username") {
                    Some("alice") => attempt.success("alice"),
                    _ => attempt.pass(),
                });
            })
            .unwrap();
        registry
    }

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_chain_empty() {
        let registry = registry();
        let chain = StrategyChain::new(&registry);
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
        assert_eq!(chain.run(None, &Params::new()).unwrap(), None);
    }

    #[test]
    fn test_chain_preserves_order() {
        let registry = registry();
        let chain = StrategyChain::new(&registry)
            .with("password")
            .with("token")
            .with("password");
        assert_eq!(chain.names(), ["password", "token", "password"]);
    }

    #[test]
    fn test_invalid_strategies_are_skipped() {
        let registry = registry();
        let chain = StrategyChain::new(&registry).with("token").with("password");

        let result = chain
            .run(None, &params(&[("username", "alice")]))
            .unwrap()
            .unwrap();

        assert_eq!(result.strategy, "password");
        assert_eq!(result.outcome.identity(), Some("alice"));
    }

    #[test]
    fn test_failure_halts_chain() {
        let registry = registry();
        let chain = StrategyChain::new(&registry).with("token").with("password");

        let result = chain
            .run(None, &params(&[("token", "wrong"), ("username", "alice")]))
            .unwrap()
            .unwrap();

        assert_eq!(result.strategy, "token");
        assert_eq!(result.outcome.message(), Some("invalid token"));
    }

    #[test]
    fn test_pass_does_not_halt() {
        let registry = registry();
        let chain = StrategyChain::new(&registry).with("password");
        let result = chain.run(None, &params(&[("username", "bob")])).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_unknown_strategy_is_an_error() {
        let registry = registry();
        let chain = StrategyChain::new(&registry).with("ghost");
        let err = chain.run(None, &Params::new()).unwrap_err();
        assert_eq!(
            err,
            ChainError::Registry(RegistryError::NotFound {
                name: "ghost".to_string()
            })
        );
    }

    #[test]
    fn test_contract_errors_propagate() {
        let registry = registry();
        registry
            .define("silent", |def| {
                def.authenticate(|_| Ok(()));
            })
            .unwrap();
        let chain = StrategyChain::new(&registry).with("silent");
        assert!(matches!(
            chain.run(None, &Params::new()),
            Err(ChainError::Strategy(_))
        ));
    }

    #[test]
    fn test_chain_sees_extensions() {
        let registry = registry();
        let chain = StrategyChain::new(&registry).with("password");
        registry
            .extend("password", |def| {
                def.authenticate(|attempt| attempt.success("extended"));
            })
            .unwrap();

        let result = chain
            .run(Some("admin"), &params(&[("username", "bob")]))
            .unwrap()
            .unwrap();
        assert_eq!(result.outcome.identity(), Some("extended"));
    }
}
