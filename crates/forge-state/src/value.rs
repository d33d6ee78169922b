//! State value declarations.

use forge_types::{Bytes, Expr, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which partition a value lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateScope {
    /// Replicated for every account that opted in.
    PerCaller,
    /// Single copy for the whole application.
    Shared,
}

impl StateScope {
    /// Name used in schema documents.
    pub fn schema_label(&self) -> &'static str {
        match self {
            StateScope::PerCaller => "local",
            StateScope::Shared => "global",
        }
    }
}

impl fmt::Display for StateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateScope::PerCaller => f.write_str("per-caller"),
            StateScope::Shared => f.write_str("shared"),
        }
    }
}

/// A single named value at a fixed key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateValue {
    pub value_type: ValueType,
    /// Storage key; filled from the member name at classification when unset.
    pub key: Option<Bytes>,
    pub default: Option<Expr>,
    /// Write-once: `set` asserts the key is absent. Storage itself does not enforce this.
    pub is_static: bool,
    pub descr: Option<String>,
}

impl StateValue {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            key: None,
            default: None,
            is_static: false,
            descr: None,
        }
    }

    pub fn uint64() -> Self {
        Self::new(ValueType::Uint64)
    }

    pub fn bytes() -> Self {
        Self::new(ValueType::Bytes)
    }

    pub fn with_key(mut self, key: impl Into<Bytes>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }

    pub fn static_value(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn describe(mut self, descr: impl Into<String>) -> Self {
        self.descr = Some(descr.into());
        self
    }

    /// Use `name` as the storage key if none was set. Returns whether it did.
    pub fn assign_default_key(&mut self, name: &str) -> bool {
        if self.key.is_some() {
            return false;
        }
        self.key = Some(Bytes::from(name));
        true
    }
}

/// Maps a key seed expression to a storage key expression.
pub type KeyGen = Arc<dyn Fn(Expr) -> Expr + Send + Sync>;

/// A bounded family of dynamically-keyed values.
#[derive(Clone)]
pub struct ReservedStateValue {
    pub value_type: ValueType,
    pub max_keys: u64,
    pub prefix: Option<Bytes>,
    pub key_gen: Option<KeyGen>,
    pub descr: Option<String>,
}

impl ReservedStateValue {
    pub fn new(value_type: ValueType, max_keys: u64) -> Self {
        Self {
            value_type,
            max_keys,
            prefix: None,
            key_gen: None,
            descr: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<Bytes>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_key_gen(mut self, key_gen: impl Fn(Expr) -> Expr + Send + Sync + 'static) -> Self {
        self.key_gen = Some(Arc::new(key_gen));
        self
    }

    pub fn describe(mut self, descr: impl Into<String>) -> Self {
        self.descr = Some(descr.into());
        self
    }

    /// Storage key for a bytes-typed seed.
    ///
    /// A custom key generator wins; otherwise the prefix (if any) is
    /// concatenated in front of the seed.
    pub fn key_for(&self, seed: Expr) -> Expr {
        if let Some(key_gen) = &self.key_gen {
            return key_gen(seed);
        }
        match &self.prefix {
            Some(prefix) => Expr::concat(Expr::Bytes(prefix.clone()), seed),
            None => seed,
        }
    }

    /// Storage key for a uint64 index.
    pub fn key_for_index(&self, index: Expr) -> Expr {
        self.key_for(Expr::itob(index))
    }
}

impl fmt::Debug for ReservedStateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReservedStateValue")
            .field("value_type", &self.value_type)
            .field("max_keys", &self.max_keys)
            .field("prefix", &self.prefix)
            .field("key_gen", &self.key_gen.as_ref().map(|_| "<fn>"))
            .field("descr", &self.descr)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum StateSlot {
    Declared(StateValue),
    Reserved(ReservedStateValue),
}

impl StateSlot {
    pub fn value_type(&self) -> ValueType {
        match self {
            StateSlot::Declared(v) => v.value_type,
            StateSlot::Reserved(r) => r.value_type,
        }
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, StateSlot::Reserved(_))
    }

    /// Number of storage keys this slot can occupy.
    pub fn key_count(&self) -> u64 {
        match self {
            StateSlot::Declared(_) => 1,
            StateSlot::Reserved(r) => r.max_keys,
        }
    }
}

/// A state slot plus the partition it belongs to.
#[derive(Debug, Clone)]
pub struct StateDecl {
    pub scope: StateScope,
    pub slot: StateSlot,
}

impl StateDecl {
    pub fn shared(value: StateValue) -> Self {
        Self {
            scope: StateScope::Shared,
            slot: StateSlot::Declared(value),
        }
    }

    pub fn per_caller(value: StateValue) -> Self {
        Self {
            scope: StateScope::PerCaller,
            slot: StateSlot::Declared(value),
        }
    }

    pub fn reserved_shared(value: ReservedStateValue) -> Self {
        Self {
            scope: StateScope::Shared,
            slot: StateSlot::Reserved(value),
        }
    }

    pub fn reserved_per_caller(value: ReservedStateValue) -> Self {
        Self {
            scope: StateScope::PerCaller,
            slot: StateSlot::Reserved(value),
        }
    }
}
