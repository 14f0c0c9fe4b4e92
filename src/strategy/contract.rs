//! The strategy contract and its canonical base.
//!
//! A type satisfies the contract when `authenticate` resolves anywhere in
//! its ancestry, whether it was defined on the type, inherited, or supplied
//! by an included module. Registration of a caller-supplied base type
//! additionally requires that the base derives from [`base`].

use once_cell::sync::Lazy;

use crate::error::ContractViolation;

use super::definition::{Staged, StrategyType};

/// Name of the canonical base type.
pub const BASE_NAME: &str = "Base";

// Every strategy applies to every request unless it says otherwise.
static BASE: Lazy<StrategyType> = Lazy::new(|| {
    StrategyType::build(BASE_NAME, None, |def| {
        def.valid(|_| true);
    })
});

/// The canonical base type.
pub fn base() -> StrategyType {
    BASE.clone()
}

/// Capability check: does `candidate` expose `authenticate`?
pub fn satisfies_contract(candidate: &StrategyType) -> bool {
    candidate.has_authenticate()
}

/// Ancestry check: is `candidate` the canonical base or a descendant of it?
pub fn derives_from_base(candidate: &StrategyType) -> bool {
    candidate.descends_from(&BASE)
}

pub(crate) fn ensure_strategy_base(
    strategy: &str,
    candidate: &StrategyType,
) -> Result<(), ContractViolation> {
    if derives_from_base(candidate) {
        Ok(())
    } else {
        Err(ContractViolation::InvalidBase {
            strategy: strategy.to_string(),
            type_name: candidate.name().to_string(),
            base: BASE_NAME.to_string(),
        })
    }
}

pub(crate) fn ensure_contract(
    strategy: &str,
    candidate: &StrategyType,
) -> Result<(), ContractViolation> {
    if satisfies_contract(candidate) {
        Ok(())
    } else {
        Err(missing_authenticate(strategy))
    }
}

pub(crate) fn ensure_staged_contract(
    strategy: &str,
    staged: &Staged<'_>,
) -> Result<(), ContractViolation> {
    if staged.has_authenticate() {
        Ok(())
    } else {
        Err(missing_authenticate(strategy))
    }
}

fn missing_authenticate(strategy: &str) -> ContractViolation {
    ContractViolation::MissingAuthenticate {
        strategy: strategy.to_string(),
    }
}
