//! Serializable types shared by strategies and the registry.
//!
//! Outcomes and registry listings implement `Serialize`, `Deserialize`, and
//! `JsonSchema` so the surrounding pipeline can report them as-is.

use std::collections::HashMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request parameters visible to a strategy during an attempt.
pub type Params = HashMap<String, String>;

/// Free-form metadata attached to a successful authentication.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Terminal outcome of a single authentication attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The request proved an identity
    Success {
        identity: String,
        #[serde(default, skip_serializing_if = "Metadata::is_empty")]
        metadata: Metadata,
    },
    /// The request was rejected
    Failure { message: String },
    /// The strategy declined to decide; the next strategy may try
    Skip,
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success { .. } => OutcomeKind::Success,
            Outcome::Failure { .. } => OutcomeKind::Failure,
            Outcome::Skip => OutcomeKind::Skip,
        }
    }

    /// Whether this outcome stops evaluation of further strategies.
    pub fn halts(&self) -> bool {
        !matches!(self, Outcome::Skip)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn identity(&self) -> Option<&str> {
        match self {
            Outcome::Success { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Failure { message } => Some(message),
            _ => None,
        }
    }
}

/// Discriminant of an [`Outcome`], used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Failure,
    Skip,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Failure => "failure",
            OutcomeKind::Skip => "skip",
        };
        f.write_str(label)
    }
}

/// Kind of layer that appears in a strategy type's ancestry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AncestorKind {
    Type,
    Module,
}

/// One layer of a strategy type's ancestry, in resolution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ancestor {
    pub id: Uuid,
    pub name: String,
    pub kind: AncestorKind,
}

/// Registry listing entry for one named strategy
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StrategyInfo {
    pub name: String,
    /// Name of the stored type
    pub type_name: String,
    /// Ancestor names in resolution order, starting with the type itself
    pub ancestors: Vec<String>,
    /// Registration timestamp (RFC3339 format)
    pub registered_at: String,
    /// Number of in-place extensions applied since registration
    pub revision: u64,
}
