//! The application specification document.
//!
//! ```json
//! {
//!   "hints": {"get_value": {"read_only": true}},
//!   "source": {"approval": "<base64>", "clear": "<base64>"},
//!   "schema": {"local": {...}, "global": {...}},
//!   "contract": {"name": "...", "methods": [...], "networks": {}}
//! }
//! ```
//!
//! Maps are ordered and `hints` is omitted when no method has any, so the
//! document is byte-stable for a given application and compiler.

use crate::assembler::CompiledArtifact;
use crate::hints::MethodHints;
use base64::{engine::general_purpose::STANDARD, Engine};
use forge_state::{StateRegistry, StateSchemaEntry};
use forge_types::ContractDescription;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSourceDoc {
    pub approval: String,
    pub clear: String,
}

impl ProgramSourceDoc {
    pub fn decode_approval(&self) -> Result<String, anyhow::Error> {
        Ok(String::from_utf8(STANDARD.decode(&self.approval)?)?)
    }

    pub fn decode_clear(&self) -> Result<String, anyhow::Error> {
        Ok(String::from_utf8(STANDARD.decode(&self.clear)?)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDoc {
    pub local: BTreeMap<String, StateSchemaEntry>,
    pub global: BTreeMap<String, StateSchemaEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSpec {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hints: BTreeMap<String, MethodHints>,
    pub source: ProgramSourceDoc,
    pub schema: SchemaDoc,
    pub contract: ContractDescription,
}

impl ApplicationSpec {
    pub fn new(artifact: &CompiledArtifact, state: &StateRegistry, hints: BTreeMap<String, MethodHints>) -> Self {
        Self {
            hints: hints.into_iter().filter(|(_, h)| !h.is_empty()).collect(),
            source: ProgramSourceDoc {
                approval: STANDARD.encode(artifact.approval.as_bytes()),
                clear: STANDARD.encode(artifact.clear.as_bytes()),
            },
            schema: SchemaDoc {
                local: state.per_caller.schema_document(),
                global: state.shared.schema_document(),
            },
            contract: artifact.contract.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
