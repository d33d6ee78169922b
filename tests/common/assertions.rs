//! Custom assertion utilities for tests.

use app_forge::{ErrorClass, ForgeError};

/// Assert that a result is Ok and return the inner value.
#[allow(dead_code)]
pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("{} failed: {:?}", context, e),
    }
}

/// Assert that a result is Err and return the error.
#[allow(dead_code)]
pub fn assert_err<T, E>(result: Result<T, E>, context: &str) -> E {
    match result {
        Ok(_) => panic!("{} should have failed", context),
        Err(e) => e,
    }
}

/// Assert that an error message contains expected text.
#[allow(dead_code)]
pub fn assert_error_contains(error: &anyhow::Error, expected_text: &str, context: &str) {
    let message = format!("{:#}", error);
    assert!(
        message.contains(expected_text),
        "{}: expected error containing '{}', got: {}",
        context,
        expected_text,
        message
    );
}

/// Assert that an `anyhow::Error` wraps a [`ForgeError`] of the given class
/// and return it.
#[allow(dead_code)]
pub fn assert_forge_error<'a>(error: &'a anyhow::Error, class: ErrorClass, context: &str) -> &'a ForgeError {
    let forge = error
        .downcast_ref::<ForgeError>()
        .unwrap_or_else(|| panic!("{}: expected a ForgeError, got: {:#}", context, error));
    assert_eq!(forge.class(), class, "{}: wrong error class for {}", context, forge);
    forge
}
