//! Accessor expressions for one storage key.

use crate::error::StateError;
use crate::value::StateScope;
use forge_types::{Expr, ValueType};

/// A resolved storage location: scope, key expression and (per-caller only)
/// the account whose state is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCell {
    scope: StateScope,
    key: Expr,
    value_type: ValueType,
    is_static: bool,
    account: Expr,
}

impl StateCell {
    pub fn new(scope: StateScope, key: Expr, value_type: ValueType, is_static: bool) -> Self {
        Self {
            scope,
            key,
            value_type,
            is_static,
            account: Expr::Sender,
        }
    }

    pub fn scope(&self) -> StateScope {
        self.scope
    }

    pub fn key(&self) -> &Expr {
        &self.key
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Address another account's per-caller state instead of the sender's.
    pub fn for_account(mut self, account: Expr) -> Result<Self, StateError> {
        if self.scope == StateScope::Shared {
            return Err(StateError::AccountOnShared {
                key: self.key_label(),
            });
        }
        self.account = account;
        Ok(self)
    }

    pub fn get(&self) -> Expr {
        match self.scope {
            StateScope::Shared => Expr::GlobalGet(Box::new(self.key.clone())),
            StateScope::PerCaller => Expr::LocalGet {
                account: Box::new(self.account.clone()),
                key: Box::new(self.key.clone()),
            },
        }
    }

    pub fn exists(&self) -> Expr {
        match self.scope {
            StateScope::Shared => Expr::GlobalExists(Box::new(self.key.clone())),
            StateScope::PerCaller => Expr::LocalExists {
                account: Box::new(self.account.clone()),
                key: Box::new(self.key.clone()),
            },
        }
    }

    /// Store `value`. Static cells first assert that nothing is stored yet.
    pub fn set(&self, value: Expr) -> Expr {
        let put = self.put(value);
        if self.is_static {
            Expr::seq([Expr::assert(Expr::not(self.exists())), put])
        } else {
            put
        }
    }

    pub fn increment(&self, by: Expr) -> Result<Expr, StateError> {
        self.require_uint()?;
        Ok(self.set(Expr::add(self.get(), by)))
    }

    pub fn decrement(&self, by: Expr) -> Result<Expr, StateError> {
        self.require_uint()?;
        Ok(self.set(Expr::sub(self.get(), by)))
    }

    pub fn delete(&self) -> Expr {
        match self.scope {
            StateScope::Shared => Expr::GlobalDel(Box::new(self.key.clone())),
            StateScope::PerCaller => Expr::LocalDel {
                account: Box::new(self.account.clone()),
                key: Box::new(self.key.clone()),
            },
        }
    }

    fn put(&self, value: Expr) -> Expr {
        match self.scope {
            StateScope::Shared => Expr::GlobalPut {
                key: Box::new(self.key.clone()),
                value: Box::new(value),
            },
            StateScope::PerCaller => Expr::LocalPut {
                account: Box::new(self.account.clone()),
                key: Box::new(self.key.clone()),
                value: Box::new(value),
            },
        }
    }

    fn require_uint(&self) -> Result<(), StateError> {
        if self.value_type != ValueType::Uint64 {
            return Err(StateError::NotUint64 {
                key: self.key_label(),
            });
        }
        Ok(())
    }

    fn key_label(&self) -> String {
        match &self.key {
            Expr::Bytes(b) => b.display_string(),
            other => format!("{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(is_static: bool) -> StateCell {
        StateCell::new(StateScope::Shared, Expr::bytes("v"), ValueType::Uint64, is_static)
    }

    #[test]
    fn test_plain_set_is_single_put() {
        let cell = shared(false);
        assert_eq!(
            cell.set(Expr::int(1)),
            Expr::GlobalPut {
                key: Box::new(Expr::bytes("v")),
                value: Box::new(Expr::int(1)),
            }
        );
    }

    #[test]
    fn test_static_set_asserts_absent() {
        let cell = shared(true);
        match cell.set(Expr::int(1)) {
            Expr::Seq(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(
                    items[0],
                    Expr::assert(Expr::not(Expr::GlobalExists(Box::new(Expr::bytes("v")))))
                );
            }
            other => panic!("expected sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_per_caller_defaults_to_sender() {
        let cell = StateCell::new(StateScope::PerCaller, Expr::bytes("n"), ValueType::Uint64, false);
        assert_eq!(
            cell.get(),
            Expr::LocalGet {
                account: Box::new(Expr::Sender),
                key: Box::new(Expr::bytes("n")),
            }
        );

        let other = cell.for_account(Expr::arg("who")).unwrap();
        assert_eq!(
            other.delete(),
            Expr::LocalDel {
                account: Box::new(Expr::arg("who")),
                key: Box::new(Expr::bytes("n")),
            }
        );
    }

    #[test]
    fn test_increment_requires_uint() {
        let cell = StateCell::new(StateScope::Shared, Expr::bytes("b"), ValueType::Bytes, false);
        let err = cell.increment(Expr::int(1)).unwrap_err();
        assert_eq!(err, StateError::NotUint64 { key: "b".to_string() });

        assert!(shared(false).increment(Expr::int(1)).is_ok());
    }

    #[test]
    fn test_account_override_rejected_on_shared() {
        let err = shared(false).for_account(Expr::Sender).unwrap_err();
        assert!(matches!(err, StateError::AccountOnShared { .. }));
    }
}
