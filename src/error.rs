//! Error taxonomy for strategy registration and execution.
//!
//! Errors fall into three groups:
//!
//! 1. **Contract violations**: a type offered for registration does not
//!    expose `authenticate`, or a supplied base type does not derive from the
//!    canonical `Base`. Raised synchronously and never partially stored.
//!
//! 2. **Registry errors**: contract violations plus `NotFound` when extending
//!    a name that was never registered. Looking up an unknown name is not an
//!    error; `lookup` returns `None`.
//!
//! 3. **Strategy errors**: raised while running an attempt, e.g. when a
//!    strategy reports two terminal outcomes.

use thiserror::Error;

use crate::types::OutcomeKind;

/// A type does not satisfy the strategy contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("`authenticate` is not declared in the `{strategy}` strategy")]
    MissingAuthenticate { strategy: String },

    #[error("`{type_name}` is not a valid base for strategy `{strategy}`: it does not derive from `{base}`")]
    InvalidBase {
        strategy: String,
        type_name: String,
        base: String,
    },
}

/// Errors raised by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("contract violation: {0}")]
    ContractViolation(#[from] ContractViolation),

    #[error("unknown strategy `{name}`")]
    NotFound { name: String },
}

impl RegistryError {
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, RegistryError::ContractViolation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while running a single authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("strategy `{strategy}` reported {second} after it already reported {first}")]
    DuplicateTerminalReport {
        strategy: String,
        first: OutcomeKind,
        second: OutcomeKind,
    },

    #[error("strategy `{strategy}` returned without reporting an outcome")]
    MissingOutcome { strategy: String },

    #[error(transparent)]
    ContractViolation(#[from] ContractViolation),
}

/// Errors raised while evaluating a [`StrategyChain`](crate::StrategyChain).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_message() {
        let err = ContractViolation::InvalidBase {
            strategy: "legacy".to_string(),
            type_name: "LegacyAuth".to_string(),
            base: "Base".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "`LegacyAuth` is not a valid base for strategy `legacy`: it does not derive from `Base`"
        );
    }

    #[test]
    fn test_registry_error_wraps_contract_violation() {
        let err: RegistryError = ContractViolation::MissingAuthenticate {
            strategy: "broken".to_string(),
        }
        .into();
        assert!(err.is_contract_violation());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("`authenticate` is not declared"));
    }

    #[test]
    fn test_not_found() {
        let err = RegistryError::NotFound {
            name: "ghost".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "unknown strategy `ghost`");
    }

    #[test]
    fn test_duplicate_report_message() {
        let err = StrategyError::DuplicateTerminalReport {
            strategy: "basic".to_string(),
            first: OutcomeKind::Success,
            second: OutcomeKind::Failure,
        };
        assert_eq!(
            err.to_string(),
            "strategy `basic` reported failure after it already reported success"
        );
    }
}
