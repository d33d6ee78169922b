//! Per-caller and shared state tables.

use crate::cell::StateCell;
use crate::error::StateError;
use crate::value::{StateScope, StateSlot};
use forge_types::{Expr, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Most keys a per-caller table may occupy.
pub const MAX_PER_CALLER_KEYS: u64 = 16;

/// Most keys a shared table may occupy.
pub const MAX_SHARED_KEYS: u64 = 64;

/// Key counts by value type, as needed when deploying an application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSchema {
    pub num_uints: u64,
    pub num_byte_slices: u64,
}

impl StateSchema {
    pub fn total(&self) -> u64 {
        self.num_uints + self.num_byte_slices
    }
}

/// Schema document entry for one named state member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSchemaEntry {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_keys: Option<u64>,
    #[serde(default, rename = "static", skip_serializing_if = "std::ops::Not::not")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
}

/// One named slot in a table.
#[derive(Debug, Clone)]
pub struct StateEntry {
    pub name: String,
    pub slot: StateSlot,
}

impl StateEntry {
    /// Cell for a declared entry.
    pub fn cell(&self, scope: StateScope) -> Result<StateCell, StateError> {
        match &self.slot {
            StateSlot::Declared(v) => {
                let key = v.key.clone().ok_or_else(|| StateError::MissingKey {
                    name: self.name.clone(),
                })?;
                Ok(StateCell::new(scope, Expr::Bytes(key), v.value_type, v.is_static))
            }
            StateSlot::Reserved(_) => Err(StateError::ReservedNeedsSeed {
                name: self.name.clone(),
            }),
        }
    }

    /// Cell for one key of a reserved entry.
    pub fn at(&self, scope: StateScope, seed: Expr) -> Result<StateCell, StateError> {
        match &self.slot {
            StateSlot::Reserved(r) => Ok(StateCell::new(scope, r.key_for(seed), r.value_type, false)),
            StateSlot::Declared(_) => Err(StateError::NotReserved {
                name: self.name.clone(),
            }),
        }
    }

    fn schema_entry(&self) -> StateSchemaEntry {
        match &self.slot {
            StateSlot::Declared(v) => StateSchemaEntry {
                value_type: v.value_type,
                key: v.key.as_ref().map(|k| k.display_string()),
                max_keys: None,
                is_static: v.is_static,
                descr: v.descr.clone(),
            },
            StateSlot::Reserved(r) => StateSchemaEntry {
                value_type: r.value_type,
                key: None,
                max_keys: Some(r.max_keys),
                is_static: false,
                descr: r.descr.clone(),
            },
        }
    }
}

/// Ordered table of one scope's entries.
#[derive(Debug, Clone)]
pub struct StateTable {
    scope: StateScope,
    entries: Vec<StateEntry>,
}

impl StateTable {
    pub fn new(scope: StateScope) -> Self {
        Self {
            scope,
            entries: Vec::new(),
        }
    }

    pub fn scope(&self) -> StateScope {
        self.scope
    }

    /// Add an entry. Declared values must already carry their key.
    pub fn insert(&mut self, name: &str, slot: StateSlot) -> Result<(), StateError> {
        if self.get(name).is_some() {
            return Err(StateError::DuplicateEntry {
                scope: self.scope,
                name: name.to_string(),
            });
        }
        match &slot {
            StateSlot::Declared(v) if v.key.is_none() => {
                return Err(StateError::MissingKey {
                    name: name.to_string(),
                })
            }
            StateSlot::Reserved(r) if r.max_keys == 0 => {
                return Err(StateError::ZeroMaxKeys {
                    name: name.to_string(),
                })
            }
            _ => {}
        }
        self.entries.push(StateEntry {
            name: name.to_string(),
            slot,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&StateEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entries(&self) -> &[StateEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cell(&self, name: &str) -> Result<StateCell, StateError> {
        self.lookup(name)?.cell(self.scope)
    }

    pub fn reserved_cell(&self, name: &str, seed: Expr) -> Result<StateCell, StateError> {
        self.lookup(name)?.at(self.scope, seed)
    }

    pub fn schema(&self) -> StateSchema {
        let mut schema = StateSchema::default();
        for entry in &self.entries {
            let count = entry.slot.key_count();
            match entry.slot.value_type() {
                ValueType::Uint64 => schema.num_uints += count,
                ValueType::Bytes => schema.num_byte_slices += count,
            }
        }
        schema
    }

    pub fn key_limit(&self) -> u64 {
        match self.scope {
            StateScope::PerCaller => MAX_PER_CALLER_KEYS,
            StateScope::Shared => MAX_SHARED_KEYS,
        }
    }

    pub fn validate_limits(&self) -> Result<(), StateError> {
        let used = self.schema().total();
        let limit = self.key_limit();
        if used > limit {
            return Err(StateError::SchemaOverflow {
                scope: self.scope,
                used,
                limit,
            });
        }
        Ok(())
    }

    /// Set every declared value that has a default, in declaration order.
    ///
    /// Returns an empty sequence when nothing declares a default. For
    /// per-caller tables `account` selects whose state is written (sender
    /// when `None`).
    pub fn initialize(&self, account: Option<Expr>) -> Result<Expr, StateError> {
        let mut ops = Vec::new();
        for entry in &self.entries {
            let StateSlot::Declared(value) = &entry.slot else {
                continue;
            };
            let Some(default) = &value.default else {
                continue;
            };
            let mut cell = entry.cell(self.scope)?;
            if let (StateScope::PerCaller, Some(account)) = (self.scope, account.as_ref()) {
                cell = cell.for_account(account.clone())?;
            }
            ops.push(cell.set(default.clone()));
        }
        Ok(Expr::Seq(ops))
    }

    /// Name -> entry description, keyed by member name.
    pub fn schema_document(&self) -> BTreeMap<String, StateSchemaEntry> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.schema_entry()))
            .collect()
    }

    fn lookup(&self, name: &str) -> Result<&StateEntry, StateError> {
        self.get(name).ok_or_else(|| StateError::UnknownEntry {
            scope: self.scope,
            name: name.to_string(),
        })
    }
}

/// Both state partitions of an application.
#[derive(Debug, Clone)]
pub struct StateRegistry {
    pub per_caller: StateTable,
    pub shared: StateTable,
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StateRegistry {
    pub fn new() -> Self {
        Self {
            per_caller: StateTable::new(StateScope::PerCaller),
            shared: StateTable::new(StateScope::Shared),
        }
    }

    pub fn table(&self, scope: StateScope) -> &StateTable {
        match scope {
            StateScope::PerCaller => &self.per_caller,
            StateScope::Shared => &self.shared,
        }
    }

    pub fn register(&mut self, name: &str, scope: StateScope, slot: StateSlot) -> Result<(), StateError> {
        match scope {
            StateScope::PerCaller => self.per_caller.insert(name, slot),
            StateScope::Shared => self.shared.insert(name, slot),
        }
    }

    pub fn validate_limits(&self) -> Result<(), StateError> {
        self.per_caller.validate_limits()?;
        self.shared.validate_limits()
    }

    pub fn initialize_shared(&self) -> Result<Expr, StateError> {
        self.shared.initialize(None)
    }

    pub fn initialize_per_caller(&self, account: Option<Expr>) -> Result<Expr, StateError> {
        self.per_caller.initialize(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ReservedStateValue, StateValue};

    fn declared(value: StateValue, name: &str) -> StateSlot {
        let mut value = value;
        value.assign_default_key(name);
        StateSlot::Declared(value)
    }

    #[test]
    fn test_insert_rejects_duplicates_and_missing_keys() {
        let mut table = StateTable::new(StateScope::Shared);
        table.insert("a", declared(StateValue::uint64(), "a")).unwrap();

        let dup = table.insert("a", declared(StateValue::uint64(), "a")).unwrap_err();
        assert!(matches!(dup, StateError::DuplicateEntry { .. }));

        let keyless = table
            .insert("b", StateSlot::Declared(StateValue::uint64()))
            .unwrap_err();
        assert_eq!(keyless, StateError::MissingKey { name: "b".to_string() });

        let zero = table
            .insert("c", StateSlot::Reserved(ReservedStateValue::new(ValueType::Bytes, 0)))
            .unwrap_err();
        assert_eq!(zero, StateError::ZeroMaxKeys { name: "c".to_string() });
    }

    #[test]
    fn test_schema_counts_reserved_keys() {
        let mut table = StateTable::new(StateScope::PerCaller);
        table.insert("n", declared(StateValue::uint64(), "n")).unwrap();
        table
            .insert("d", StateSlot::Reserved(ReservedStateValue::new(ValueType::Bytes, 8)))
            .unwrap();
        assert_eq!(
            table.schema(),
            StateSchema {
                num_uints: 1,
                num_byte_slices: 8
            }
        );
        assert!(table.validate_limits().is_ok());
    }

    #[test]
    fn test_per_caller_limit() {
        let mut table = StateTable::new(StateScope::PerCaller);
        table
            .insert("d", StateSlot::Reserved(ReservedStateValue::new(ValueType::Bytes, 16)))
            .unwrap();
        table.insert("x", declared(StateValue::uint64(), "x")).unwrap();
        let err = table.validate_limits().unwrap_err();
        assert_eq!(
            err,
            StateError::SchemaOverflow {
                scope: StateScope::PerCaller,
                used: 17,
                limit: MAX_PER_CALLER_KEYS
            }
        );
    }

    #[test]
    fn test_initialize_without_defaults_is_noop() {
        let mut table = StateTable::new(StateScope::Shared);
        table.insert("a", declared(StateValue::uint64(), "a")).unwrap();
        assert!(table.initialize(None).unwrap().is_noop());
    }

    #[test]
    fn test_initialize_in_declaration_order() {
        let mut table = StateTable::new(StateScope::Shared);
        table
            .insert("second", declared(StateValue::uint64().with_default(Expr::int(2)), "second"))
            .unwrap();
        table.insert("skipped", declared(StateValue::uint64(), "skipped")).unwrap();
        table
            .insert("first", declared(StateValue::uint64().with_default(Expr::int(1)), "first"))
            .unwrap();

        let Expr::Seq(ops) = table.initialize(None).unwrap() else {
            panic!("expected a sequence");
        };
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[0],
            Expr::GlobalPut {
                key: Box::new(Expr::bytes("second")),
                value: Box::new(Expr::int(2)),
            }
        );
        assert_eq!(
            ops[1],
            Expr::GlobalPut {
                key: Box::new(Expr::bytes("first")),
                value: Box::new(Expr::int(1)),
            }
        );
    }

    #[test]
    fn test_initialize_per_caller_for_account() {
        let mut registry = StateRegistry::new();
        registry
            .register(
                "n",
                StateScope::PerCaller,
                declared(StateValue::uint64().with_default(Expr::int(1)), "n"),
            )
            .unwrap();
        let Expr::Seq(ops) = registry.initialize_per_caller(Some(Expr::arg("acct"))).unwrap() else {
            panic!("expected a sequence");
        };
        assert_eq!(
            ops[0],
            Expr::LocalPut {
                account: Box::new(Expr::arg("acct")),
                key: Box::new(Expr::bytes("n")),
                value: Box::new(Expr::int(1)),
            }
        );
    }

    #[test]
    fn test_schema_document_shape() {
        let mut table = StateTable::new(StateScope::Shared);
        table
            .insert(
                "v",
                declared(StateValue::bytes().static_value().describe("write once"), "v"),
            )
            .unwrap();
        table
            .insert("d", StateSlot::Reserved(ReservedStateValue::new(ValueType::Uint64, 63)))
            .unwrap();

        let doc = serde_json::to_value(table.schema_document()).unwrap();
        assert_eq!(
            doc,
            serde_json::json!({
                "d": {"type": "uint64", "max_keys": 63},
                "v": {"type": "bytes", "key": "v", "static": true, "descr": "write once"},
            })
        );
    }

    #[test]
    fn test_schema_keys_distinguish_hex_looking_text() {
        let mut table = StateTable::new(StateScope::Shared);
        table
            .insert("text", StateSlot::Declared(StateValue::uint64().with_key("0xab")))
            .unwrap();
        table
            .insert("raw", StateSlot::Declared(StateValue::uint64().with_key(vec![0xab_u8])))
            .unwrap();

        let doc = table.schema_document();
        assert_eq!(doc["raw"].key.as_deref(), Some("0xab"));
        assert_eq!(doc["text"].key.as_deref(), Some("0x30786162"));
    }

    #[test]
    fn test_cell_lookup_errors() {
        let mut table = StateTable::new(StateScope::Shared);
        table
            .insert("d", StateSlot::Reserved(ReservedStateValue::new(ValueType::Uint64, 2)))
            .unwrap();
        assert!(matches!(table.cell("d"), Err(StateError::ReservedNeedsSeed { .. })));
        assert!(matches!(table.cell("nope"), Err(StateError::UnknownEntry { .. })));
        assert!(table.reserved_cell("d", Expr::bytes("k")).is_ok());
    }
}
