//! Per-request strategy instances.

use tracing::debug;

use crate::error::{ContractViolation, StrategyError};
use crate::types::{Outcome, Params};

use super::attempt::Attempt;
use super::definition::StrategyType;

/// A strategy type bound to one request.
///
/// The instance runs its attempt at most once and caches the outcome until
/// [`reset`](Self::reset). Members are resolved through the type on every
/// call, so extensions applied after instantiation are observed.
pub struct Strategy {
    label: String,
    definition: StrategyType,
    scope: String,
    params: Params,
    outcome: Option<Outcome>,
}

impl Strategy {
    pub fn new(
        label: impl Into<String>,
        definition: StrategyType,
        scope: impl Into<String>,
        params: Params,
    ) -> Self {
        Self {
            label: label.into(),
            definition,
            scope: scope.into(),
            params,
            outcome: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn definition(&self) -> &StrategyType {
        &self.definition
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Whether the strategy applies to this request.
    ///
    /// Types with no `valid` predicate anywhere in their ancestry apply.
    pub fn is_valid(&self) -> bool {
        match self.definition.resolve_valid() {
            Some(valid) => valid(&self.attempt()),
            None => true,
        }
    }

    /// Run the attempt, or return the outcome of the previous run.
    pub fn run(&mut self) -> Result<&Outcome, StrategyError> {
        let outcome = match self.outcome.take() {
            Some(outcome) => outcome,
            None => self.perform()?,
        };
        let outcome: &Outcome = self.outcome.insert(outcome);
        Ok(outcome)
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_performed(&self) -> bool {
        self.outcome.is_some()
    }

    /// Whether the recorded outcome stops further strategies.
    pub fn is_halted(&self) -> bool {
        self.outcome.as_ref().is_some_and(Outcome::halts)
    }

    /// Forget the recorded outcome so the instance can run again.
    pub fn reset(&mut self) {
        self.outcome = None;
    }

    fn perform(&self) -> Result<Outcome, StrategyError> {
        let authenticate = self.definition.resolve_authenticate().ok_or_else(|| {
            ContractViolation::MissingAuthenticate {
                strategy: self.label.clone(),
            }
        })?;

        let mut attempt = self.attempt();
        authenticate.authenticate(&mut attempt)?;

        let outcome = attempt
            .finish()?
            .ok_or_else(|| StrategyError::MissingOutcome {
                strategy: self.label.clone(),
            })?;
        debug!("Strategy {} concluded with {}", self.label, outcome.kind());
        Ok(outcome)
    }

    fn attempt(&self) -> Attempt<'_> {
        Attempt::new(&self.label, &self.scope, &self.params, &self.definition)
    }
}
