//! State declarations for app-forge applications.
//!
//! An application owns two independent key-value partitions: per-caller
//! state (one copy per opted-in account) and shared state (one copy for the
//! application). This crate provides:
//!
//! - [`StateValue`] / [`ReservedStateValue`]: declared single values and
//!   bounded families of dynamically keyed values
//! - [`StateRegistry`]: the two ordered tables, schema summaries, schema
//!   documents and initialization expressions
//! - [`StateCell`]: get/set/increment/delete expressions for one key
//!
//! # Example
//!
//! ```
//! use forge_state::{StateRegistry, StateScope, StateSlot, StateValue};
//! use forge_types::Expr;
//!
//! let mut registry = StateRegistry::new();
//! let mut counter = StateValue::uint64().with_default(Expr::int(0));
//! counter.assign_default_key("counter");
//! registry.register("counter", StateScope::Shared, StateSlot::Declared(counter)).unwrap();
//!
//! let init = registry.initialize_shared().unwrap();
//! assert!(!init.is_noop());
//! ```

pub mod cell;
pub mod error;
pub mod registry;
pub mod value;

pub use cell::StateCell;
pub use error::StateError;
pub use registry::{
    StateEntry, StateRegistry, StateSchema, StateSchemaEntry, StateTable, MAX_PER_CALLER_KEYS,
    MAX_SHARED_KEYS,
};
pub use value::{KeyGen, ReservedStateValue, StateDecl, StateScope, StateSlot, StateValue};
