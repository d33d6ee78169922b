#![allow(unused_imports)]
//! Shared test utilities for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: Example applications and manifest paths
//! - `mocks`: Compiler and compiler-connection doubles that count calls
//! - `assertions`: Error assertions with readable failure messages

pub mod assertions;
pub mod fixtures;
pub mod mocks;

pub use assertions::{assert_err, assert_error_contains, assert_forge_error, assert_ok};
pub use fixtures::{demo_manifest_path, state_example, state_example_builder};
pub use mocks::{CountingCompiler, CountingConnection, FailingCompiler, FailingConnection};
