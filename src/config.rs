//! Configuration resolution for the strategy registry.
//!
//! Values follow a three-tier priority system:
//!
//! 1. **Parameter** - Explicitly provided value (highest priority)
//! 2. **Environment Variable** - Value from environment variable
//! 3. **Default** - Built-in default value (lowest priority)
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `STRATEGY_REVALIDATE_ON_EXTEND` | true | Re-run the contract check after `extend` |
//! | `STRATEGY_DEFAULT_SCOPE` | default | Scope used when instantiating without one |

use std::env;

/// Default for re-running the contract check after an extension
pub(crate) const DEFAULT_REVALIDATE_ON_EXTEND: bool = true;

/// Default scope for strategy instances
pub(crate) const DEFAULT_SCOPE: &str = "default";

/// Environment variable name for extension revalidation
pub(crate) const REVALIDATE_ON_EXTEND_ENV_VAR: &str = "STRATEGY_REVALIDATE_ON_EXTEND";

/// Environment variable name for the default scope
pub(crate) const DEFAULT_SCOPE_ENV_VAR: &str = "STRATEGY_DEFAULT_SCOPE";

/// Resolve extension revalidation with priority: parameter -> env var -> default
pub(crate) fn resolve_revalidate_on_extend(param: Option<bool>) -> bool {
    // Priority 1: Use parameter if provided
    if let Some(revalidate) = param {
        return revalidate;
    }

    // Priority 2: Use environment variable if set
    if let Ok(env_revalidate) = env::var(REVALIDATE_ON_EXTEND_ENV_VAR) {
        return env_revalidate.eq_ignore_ascii_case("true") || env_revalidate == "1";
    }

    // Priority 3: Default value
    DEFAULT_REVALIDATE_ON_EXTEND
}

/// Resolve the default scope with priority: parameter -> env var -> default
pub(crate) fn resolve_default_scope(param: Option<&str>) -> String {
    if let Some(scope) = param {
        return scope.to_string();
    }

    if let Ok(env_scope) = env::var(DEFAULT_SCOPE_ENV_VAR)
        && !env_scope.trim().is_empty()
    {
        return env_scope.trim().to_string();
    }

    DEFAULT_SCOPE.to_string()
}

/// Resolved registry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Re-run the capability check after `extend` and roll back on failure
    pub revalidate_on_extend: bool,
    /// Scope given to instances created without an explicit scope
    pub default_scope: String,
}

impl RegistryConfig {
    /// Resolve every setting, preferring the given parameters.
    pub fn resolve(revalidate_on_extend: Option<bool>, default_scope: Option<&str>) -> Self {
        Self {
            revalidate_on_extend: resolve_revalidate_on_extend(revalidate_on_extend),
            default_scope: resolve_default_scope(default_scope),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::resolve(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    // Use a mutex to serialize env var tests to avoid race conditions
    static ENV_TEST_MUTEX: once_cell::sync::Lazy<StdMutex<()>> =
        once_cell::sync::Lazy::new(|| StdMutex::new(()));

    /// SAFETY: Must be called while holding ENV_TEST_MUTEX to prevent data races.
    unsafe fn set_env(key: &str, value: &str) {
        // SAFETY: Caller ensures ENV_TEST_MUTEX is held
        unsafe { env::set_var(key, value) };
    }

    /// SAFETY: Must be called while holding ENV_TEST_MUTEX to prevent data races.
    unsafe fn remove_env(key: &str) {
        // SAFETY: Caller ensures ENV_TEST_MUTEX is held
        unsafe { env::remove_var(key) };
    }

    mod revalidate_on_extend {
        use super::*;

        #[test]
        fn test_uses_param_when_provided() {
            assert!(!resolve_revalidate_on_extend(Some(false)));
            assert!(resolve_revalidate_on_extend(Some(true)));
        }

        #[test]
        fn test_param_takes_priority_over_env() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(REVALIDATE_ON_EXTEND_ENV_VAR, "false");
            }
            let result = resolve_revalidate_on_extend(Some(true));
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(REVALIDATE_ON_EXTEND_ENV_VAR);
            }
            assert!(result);
        }

        #[test]
        fn test_uses_env_var_when_no_param() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(REVALIDATE_ON_EXTEND_ENV_VAR, "0");
            }
            let result = resolve_revalidate_on_extend(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(REVALIDATE_ON_EXTEND_ENV_VAR);
            }
            assert!(!result);
        }

        #[test]
        fn test_env_var_is_case_insensitive() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(REVALIDATE_ON_EXTEND_ENV_VAR, "TRUE");
            }
            let result = resolve_revalidate_on_extend(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(REVALIDATE_ON_EXTEND_ENV_VAR);
            }
            assert!(result);
        }

        #[test]
        fn test_uses_default_when_no_param_or_env() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(REVALIDATE_ON_EXTEND_ENV_VAR);
            }
            assert_eq!(
                resolve_revalidate_on_extend(None),
                DEFAULT_REVALIDATE_ON_EXTEND
            );
        }
    }

    mod default_scope {
        use super::*;

        #[test]
        fn test_uses_param_when_provided() {
            assert_eq!(resolve_default_scope(Some("admin")), "admin");
        }

        #[test]
        fn test_uses_env_var_when_no_param() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(DEFAULT_SCOPE_ENV_VAR, " api ");
            }
            let result = resolve_default_scope(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(DEFAULT_SCOPE_ENV_VAR);
            }
            assert_eq!(result, "api");
        }

        #[test]
        fn test_ignores_blank_env_var() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(DEFAULT_SCOPE_ENV_VAR, "   ");
            }
            let result = resolve_default_scope(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(DEFAULT_SCOPE_ENV_VAR);
            }
            assert_eq!(result, DEFAULT_SCOPE);
        }
    }

    #[test]
    fn test_resolve_prefers_params() {
        let config = RegistryConfig::resolve(Some(false), Some("user"));
        assert_eq!(
            config,
            RegistryConfig {
                revalidate_on_extend: false,
                default_scope: "user".to_string(),
            }
        );
    }
}
