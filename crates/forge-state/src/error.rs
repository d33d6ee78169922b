//! State declaration and access errors.

use crate::value::StateScope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Two entries with the same name in one table.
    DuplicateEntry { scope: StateScope, name: String },
    /// A declared value reached the registry without a storage key.
    MissingKey { name: String },
    /// Reserved values must allow at least one key.
    ZeroMaxKeys { name: String },
    /// No entry with this name in the table.
    UnknownEntry { scope: StateScope, name: String },
    /// A reserved entry was accessed without a key seed.
    ReservedNeedsSeed { name: String },
    /// A key seed was given for a declared entry.
    NotReserved { name: String },
    /// Arithmetic on a bytes-typed value.
    NotUint64 { key: String },
    /// Account override on shared state.
    AccountOnShared { key: String },
    /// Table needs more keys than the scope allows.
    SchemaOverflow { scope: StateScope, used: u64, limit: u64 },
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateError::DuplicateEntry { scope, name } => {
                write!(f, "duplicate {} state entry `{}`", scope, name)
            }
            StateError::MissingKey { name } => {
                write!(f, "state entry `{}` has no storage key", name)
            }
            StateError::ZeroMaxKeys { name } => {
                write!(f, "reserved state entry `{}` must allow at least one key", name)
            }
            StateError::UnknownEntry { scope, name } => {
                write!(f, "no {} state entry named `{}`", scope, name)
            }
            StateError::ReservedNeedsSeed { name } => {
                write!(f, "reserved state entry `{}` needs a key seed", name)
            }
            StateError::NotReserved { name } => {
                write!(f, "state entry `{}` is not reserved; access it without a key seed", name)
            }
            StateError::NotUint64 { key } => {
                write!(f, "state value `{}` is not uint64; cannot do arithmetic on it", key)
            }
            StateError::AccountOnShared { key } => {
                write!(f, "shared state value `{}` is not stored per account", key)
            }
            StateError::SchemaOverflow { scope, used, limit } => write!(
                f,
                "{} state needs {} keys but at most {} are allowed",
                scope, used, limit
            ),
        }
    }
}

impl std::error::Error for StateError {}
