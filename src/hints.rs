//! Per-method auxiliary metadata published in the specification document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a client should fetch an argument's value when the caller omits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "data", rename_all = "kebab-case")]
pub enum DefaultArgument {
    /// A literal value.
    Constant(serde_json::Value),
    /// The value stored under this shared-state key.
    GlobalState(String),
    /// The value stored under this per-caller-state key.
    LocalState(String),
    /// The result of calling this read-only method.
    AbiMethod(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodHints {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_arguments: BTreeMap<String, DefaultArgument>,
}

impl MethodHints {
    pub fn is_empty(&self) -> bool {
        !self.read_only && self.default_arguments.is_empty()
    }
}
