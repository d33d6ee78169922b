//! Environment variable parsing helpers for build configuration.
//!
//! # Example
//!
//! ```
//! use forge_types::env_utils::{env_bool_or, env_var_or};
//!
//! let version: u8 = env_var_or("APP_FORGE_PROGRAM_VERSION", 8);
//! let scratch = env_bool_or("APP_FORGE_OPTIMIZE_SCRATCH", true);
//! # let _ = (version, scratch);
//! ```

use std::str::FromStr;

/// Parse an environment variable into any `FromStr` type.
///
/// Returns `None` if the variable is unset or does not parse.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse an environment variable, falling back to `default`.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// Read a boolean flag: "1", "true", "yes" and "on" are true, any other set
/// value is false, and an unset variable yields `default`.
pub fn env_bool_or(key: &str, default: bool) -> bool {
    match std::env::var(key).ok() {
        Some(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_parsing() {
        std::env::set_var("FORGE_TEST_U8", " 7 ");
        let val: Option<u8> = env_var("FORGE_TEST_U8");
        assert_eq!(val, Some(7));

        let missing: Option<u8> = env_var("FORGE_NONEXISTENT_VAR_1");
        assert_eq!(missing, None);

        std::env::remove_var("FORGE_TEST_U8");
    }

    #[test]
    fn test_env_var_or_unparseable_falls_back() {
        std::env::set_var("FORGE_TEST_BAD", "eight");
        let val: u8 = env_var_or("FORGE_TEST_BAD", 8);
        assert_eq!(val, 8);
        std::env::remove_var("FORGE_TEST_BAD");
    }

    #[test]
    fn test_env_bool_or() {
        std::env::set_var("FORGE_TEST_BOOL_ON", "ON");
        std::env::set_var("FORGE_TEST_BOOL_OFF", "0");

        assert!(env_bool_or("FORGE_TEST_BOOL_ON", false));
        assert!(!env_bool_or("FORGE_TEST_BOOL_OFF", true));
        assert!(env_bool_or("FORGE_NONEXISTENT_VAR_2", true));

        std::env::remove_var("FORGE_TEST_BOOL_ON");
        std::env::remove_var("FORGE_TEST_BOOL_OFF");
    }
}
