#![deny(clippy::unwrap_used)]

//! Runtime registry of named authentication strategies.
//!
//! A strategy is a dynamically composed type exposing one required
//! capability, `authenticate`, which reports exactly one terminal outcome
//! per attempt. The registry stores strategies by name, enforces the
//! contract on every registration, and lets callers extend a registered
//! strategy in place.
//!
//! # Example
//!
//! ```ignore
//! use strategy_registry::{StrategyRegistry, Params};
//!
//! let registry = StrategyRegistry::new();
//! registry.define("basic", |def| {
//!     def.authenticate(|attempt| attempt.success("alice"));
//! })?;
//!
//! let mut strategy = registry.instantiate("basic", None, Params::new()).expect("registered");
//! let outcome = strategy.run()?;
//! assert_eq!(outcome.identity(), Some("alice"));
//! ```
//!
//! - `strategy`: the contract, the composable strategy types and instances
//! - `registry`: the named table and its storage
//! - `chain`: ordered evaluation of several registered strategies
//! - `config`: registry configuration with environment variable support
//! - `error`: error taxonomy
//! - `types`: serializable outcome and listing types

pub mod chain;
pub mod config;
pub mod error;
pub mod registry;
pub mod strategy;
pub mod types;

pub use chain::{ChainResult, StrategyChain};
pub use config::RegistryConfig;
pub use error::{ChainError, ContractViolation, RegistryError, RegistryResult, StrategyError};
pub use registry::{
    DashMapStrategyStorage, STRATEGIES, StoredStrategy, StrategyRegistry, StrategyStorage,
};
pub use strategy::{
    Attempt, Authenticate, CapabilityModule, Definition, Members, Strategy, StrategyType,
    satisfies_contract,
};
pub use types::{Ancestor, AncestorKind, Metadata, Outcome, OutcomeKind, Params, StrategyInfo};
