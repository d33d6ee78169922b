//! Execution context passed explicitly to handler bodies.

use crate::errors::ForgeError;
use crate::precompile::{SubArtifact, SubArtifactResolver};
use anyhow::{anyhow, bail, Result};
use forge_state::{StateCell, StateRegistry, StateScope};
use forge_types::Expr;
use std::collections::BTreeMap;

/// Everything a handler body may reference while it is rendered into an
/// expression: the application's state tables, its resolved sub-artifacts,
/// the internal routines it can call and its own parameter names.
pub struct HandlerContext<'a> {
    state: &'a StateRegistry,
    sub_artifacts: &'a SubArtifactResolver,
    routines: &'a BTreeMap<String, Vec<String>>,
    params: Vec<String>,
}

impl<'a> HandlerContext<'a> {
    pub fn new(
        state: &'a StateRegistry,
        sub_artifacts: &'a SubArtifactResolver,
        routines: &'a BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            state,
            sub_artifacts,
            routines,
            params: Vec::new(),
        }
    }

    /// Same context, scoped to a handler with the given parameters.
    pub fn with_params(&self, params: Vec<String>) -> Self {
        Self {
            state: self.state,
            sub_artifacts: self.sub_artifacts,
            routines: self.routines,
            params,
        }
    }

    pub fn state(&self) -> &StateRegistry {
        self.state
    }

    pub fn global(&self, name: &str) -> Result<StateCell> {
        Ok(self.state.table(StateScope::Shared).cell(name)?)
    }

    pub fn local(&self, name: &str) -> Result<StateCell> {
        Ok(self.state.table(StateScope::PerCaller).cell(name)?)
    }

    pub fn reserved_global(&self, name: &str, seed: Expr) -> Result<StateCell> {
        Ok(self.state.table(StateScope::Shared).reserved_cell(name, seed)?)
    }

    pub fn reserved_local(&self, name: &str, seed: Expr) -> Result<StateCell> {
        Ok(self.state.table(StateScope::PerCaller).reserved_cell(name, seed)?)
    }

    /// Reference one of the handler's declared parameters.
    pub fn arg(&self, name: &str) -> Result<Expr> {
        if !self.params.iter().any(|p| p == name) {
            bail!(
                "unknown argument `{}` (declared: {})",
                name,
                self.params.join(", ")
            );
        }
        Ok(Expr::arg(name))
    }

    pub fn output(&self, value: Expr) -> Expr {
        Expr::output(value)
    }

    /// Call an internal routine, checking its arity.
    pub fn call(&self, routine: &str, args: Vec<Expr>) -> Result<Expr> {
        let params = self
            .routines
            .get(routine)
            .ok_or_else(|| anyhow!("unknown internal routine `{}`", routine))?;
        if params.len() != args.len() {
            bail!(
                "internal routine `{}` takes {} argument(s), got {}",
                routine,
                params.len(),
                args.len()
            );
        }
        Ok(Expr::call(routine, args))
    }

    pub fn precompiled(&self, name: &str) -> Result<&'a SubArtifact, ForgeError> {
        self.sub_artifacts.resolved(name)
    }

    /// Set every shared value that declares a default.
    pub fn initialize_shared_state(&self) -> Result<Expr> {
        Ok(self.state.initialize_shared()?)
    }

    /// Set every per-caller value that declares a default, for `account`
    /// (the sender when `None`).
    pub fn initialize_per_caller_state(&self, account: Option<Expr>) -> Result<Expr> {
        Ok(self.state.initialize_per_caller(account)?)
    }
}
