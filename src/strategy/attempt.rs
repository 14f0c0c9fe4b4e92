//! Per-call scaffold handed to `authenticate`.

use serde_json::Value;

use crate::error::StrategyError;
use crate::types::{Metadata, Outcome, Params};

use super::definition::StrategyType;

/// One authentication attempt of one strategy.
///
/// Carries the request parameters and the terminal report primitives.
/// Exactly one of [`success`](Self::success), [`success_with`](Self::success_with),
/// [`fail`](Self::fail) or [`pass`](Self::pass) may be called; a second call
/// returns [`StrategyError::DuplicateTerminalReport`], leaves the first
/// report in place and marks the attempt as violated. A violated attempt
/// fails the run even if the error was discarded.
pub struct Attempt<'a> {
    strategy: &'a str,
    scope: &'a str,
    params: &'a Params,
    definition: &'a StrategyType,
    outcome: Option<Outcome>,
    violation: Option<StrategyError>,
}

impl<'a> Attempt<'a> {
    pub(crate) fn new(
        strategy: &'a str,
        scope: &'a str,
        params: &'a Params,
        definition: &'a StrategyType,
    ) -> Self {
        Self {
            strategy,
            scope,
            params,
            definition,
            outcome: None,
            violation: None,
        }
    }

    /// Label the strategy was instantiated under.
    pub fn strategy(&self) -> &'a str {
        self.strategy
    }

    pub fn scope(&self) -> &'a str {
        self.scope
    }

    pub fn params(&self) -> &'a Params {
        self.params
    }

    pub fn param(&self, key: &str) -> Option<&'a str> {
        self.params.get(key).map(String::as_str)
    }

    /// Resolve an auxiliary configuration value through the strategy's ancestry.
    pub fn config(&self, key: &str) -> Option<Value> {
        self.definition.config(key)
    }

    /// Report success for `identity` with no metadata.
    pub fn success(&mut self, identity: impl Into<String>) -> Result<(), StrategyError> {
        self.success_with(identity, Metadata::new())
    }

    /// Report success for `identity`.
    pub fn success_with(
        &mut self,
        identity: impl Into<String>,
        metadata: Metadata,
    ) -> Result<(), StrategyError> {
        self.report(Outcome::Success {
            identity: identity.into(),
            metadata,
        })
    }

    /// Report a failure with a message for the caller.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), StrategyError> {
        self.report(Outcome::Failure {
            message: message.into(),
        })
    }

    /// Report that this strategy does not decide the request.
    pub fn pass(&mut self) -> Result<(), StrategyError> {
        self.report(Outcome::Skip)
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_concluded(&self) -> bool {
        self.outcome.is_some()
    }

    /// The first contract violation recorded by a report primitive.
    pub fn violation(&self) -> Option<&StrategyError> {
        self.violation.as_ref()
    }

    /// Conclude the attempt: the recorded violation if any, else the outcome.
    pub(crate) fn finish(self) -> Result<Option<Outcome>, StrategyError> {
        match self.violation {
            Some(violation) => Err(violation),
            None => Ok(self.outcome),
        }
    }

    fn report(&mut self, outcome: Outcome) -> Result<(), StrategyError> {
        if let Some(first) = &self.outcome {
            let err = StrategyError::DuplicateTerminalReport {
                strategy: self.strategy.to_string(),
                first: first.kind(),
                second: outcome.kind(),
            };
            self.violation.get_or_insert_with(|| err.clone());
            return Err(err);
        }
        self.outcome = Some(outcome);
        Ok(())
    }
}
