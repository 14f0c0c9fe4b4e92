//! Authentication capability trait definition.
//!
//! Defines the single operation every registered strategy must expose.

use crate::error::StrategyError;

use super::attempt::Attempt;

/// Trait for the authenticate-attempt capability.
///
/// Implementations must be thread-safe (`Send + Sync`) because a strategy
/// type is shared by every instance created from it. Closures with the
/// matching signature implement this trait, so most strategies are defined
/// inline through [`Members::authenticate`](super::Members::authenticate).
pub trait Authenticate: Send + Sync {
    /// Attempt to authenticate the request carried by `attempt`.
    ///
    /// Every path that returns `Ok(())` must report exactly one terminal
    /// outcome through [`Attempt::success`], [`Attempt::fail`] or
    /// [`Attempt::pass`].
    ///
    /// # Returns
    ///
    /// * `Ok(())` - An outcome was reported (or none, which the runner rejects)
    /// * `Err(error)` - The attempt broke the contract, e.g. reported twice
    fn authenticate(&self, attempt: &mut Attempt<'_>) -> Result<(), StrategyError>;
}

impl<F> Authenticate for F
where
    F: Fn(&mut Attempt<'_>) -> Result<(), StrategyError> + Send + Sync,
{
    fn authenticate(&self, attempt: &mut Attempt<'_>) -> Result<(), StrategyError> {
        self(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyType;
    use crate::types::{Outcome, Params};

    struct AlwaysDeny;

    impl Authenticate for AlwaysDeny {
        fn authenticate(&self, attempt: &mut Attempt<'_>) -> Result<(), StrategyError> {
            attempt.fail("denied")
        }
    }

    #[test]
    fn test_struct_implements_authenticate() {
        let definition = StrategyType::base();
        let params = Params::new();
        let mut attempt = Attempt::new("deny", "default", &params, &definition);
        AlwaysDeny.authenticate(&mut attempt).unwrap();
        assert_eq!(
            attempt.finish(),
            Ok(Some(Outcome::Failure {
                message: "denied".to_string()
            }))
        );
    }

    #[test]
    fn test_function_implements_authenticate() {
        fn pass_through(attempt: &mut Attempt<'_>) -> Result<(), StrategyError> {
            attempt.pass()
        }
        fn requires_authenticate(_: &dyn Authenticate) {}
        requires_authenticate(&pass_through);
    }

    #[test]
    fn test_authenticate_is_object_safe_and_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn Authenticate>();
    }
}
