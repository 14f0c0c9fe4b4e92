//! Authentication strategies.
//!
//! A strategy is a [`StrategyType`] whose ancestry exposes the single
//! required capability, [`Authenticate`]. Types are composed at runtime
//! from a parent, a body of member definitions and any number of
//! [`CapabilityModule`]s, and can be reopened in place later.
//!
//! # Example
//!
//! ```ignore
//! use strategy_registry::strategy::StrategyType;
//!
//! let token = StrategyType::new("Token", |def| {
//!     def.valid(|attempt| attempt.param("token").is_some());
//!     def.authenticate(|attempt| match attempt.param("token") {
//!         Some("s3cret") => attempt.success("service"),
//!         _ => attempt.fail("invalid token"),
//!     });
//! });
//! ```

mod attempt;
pub mod contract;
mod definition;
mod instance;
mod traits;

pub use attempt::Attempt;
pub use contract::satisfies_contract;
pub use definition::{CapabilityModule, Definition, Members, StrategyType};
pub use instance::Strategy;
pub use traits::Authenticate;
