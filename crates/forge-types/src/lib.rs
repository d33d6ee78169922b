//! Shared types for the app-forge workspace.
//!
//! This crate is the leaf vocabulary every other crate builds on:
//! - [`expr`]: the program expression tree handed to compiler backends
//! - [`abi`]: ABI argument types, method signatures and selectors
//! - [`actions`]: on-completion actions, call configs and lifecycle hooks
//! - [`contract`]: the structural contract description document
//! - [`env_utils`]: environment variable helpers used by build configuration

pub mod abi;
pub mod actions;
pub mod contract;
pub mod env_utils;
pub mod expr;

pub use abi::{AbiType, MethodArg, MethodSignature, SELECTOR_LEN};
pub use actions::{CallConfig, LifecycleHook, MethodConfig, OnCompletionAction};
pub use contract::{ContractDescription, ContractMethodJson};
pub use expr::{Bytes, Expr, ValueType};
