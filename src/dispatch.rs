//! Dispatch table: bare handlers by action, external methods in declaration
//! order, lifecycle-hook claims and internal routines.

use crate::errors::ForgeError;
use crate::handler::{Handler, HandlerConfig};
use crate::hints::MethodHints;
use crate::member::{Declaration, Member, Role};
use forge_types::{
    CallConfig, LifecycleHook, MethodConfig, MethodSignature, OnCompletionAction, SELECTOR_LEN,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct BareHandlerEntry {
    pub member: String,
    pub call: CallConfig,
    pub handler: Handler,
}

#[derive(Debug, Clone)]
pub struct ExternalMethodEntry {
    pub member: String,
    pub signature: MethodSignature,
    pub config: MethodConfig,
    pub hints: MethodHints,
    pub handler: Handler,
}

#[derive(Debug, Clone)]
pub struct InternalRoutineEntry {
    pub name: String,
    pub params: Vec<String>,
    pub handler: Handler,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    bare_handlers: BTreeMap<OnCompletionAction, BareHandlerEntry>,
    external_methods: Vec<ExternalMethodEntry>,
    hooks: BTreeMap<LifecycleHook, String>,
    internal_routines: Vec<InternalRoutineEntry>,
    selectors: HashMap<[u8; SELECTOR_LEN], String>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from classified members, in member order.
    pub fn from_members(members: &[Member]) -> Result<Self, ForgeError> {
        let mut table = Self::new();
        for member in members {
            let Declaration::Handler { config, body } = &member.declaration else {
                continue;
            };
            match &member.role {
                Role::LifecycleHandler { .. } => table.add_bare(&member.name, config, body.clone())?,
                Role::ExternalMethod { .. } => table.add_external(&member.name, config, body.clone())?,
                Role::InternalRoutine => table.add_internal(&member.name, config, body.clone()),
                _ => {}
            }
        }
        Ok(table)
    }

    /// Claim every action of a bare handler. A claimed action is never overwritten.
    pub fn add_bare(&mut self, member: &str, config: &HandlerConfig, handler: Handler) -> Result<(), ForgeError> {
        for action in config.bare_actions.keys() {
            if let Some(existing) = self.bare_handlers.get(action) {
                return Err(ForgeError::DuplicateBareHandler {
                    action: *action,
                    existing: existing.member.clone(),
                    member: member.to_string(),
                });
            }
        }
        for (action, call) in &config.bare_actions {
            debug!(member, action = %action, "claimed bare action");
            self.bare_handlers.insert(
                *action,
                BareHandlerEntry {
                    member: member.to_string(),
                    call: *call,
                    handler: handler.clone(),
                },
            );
        }
        Ok(())
    }

    /// Append an external method and claim its lifecycle hooks, checked in
    /// create, update, delete, opt-in, close-out, clear-state order.
    pub fn add_external(&mut self, member: &str, config: &HandlerConfig, handler: Handler) -> Result<(), ForgeError> {
        let Some(method) = &config.method else {
            return Ok(());
        };
        let signature = method.signature(member);

        let selector = signature.selector();
        if self.selectors.contains_key(&selector) {
            return Err(ForgeError::DuplicateSelector {
                signature: signature.signature(),
                member: member.to_string(),
            });
        }

        let hooks = config.hooks();
        for hook in &hooks {
            if let Some(existing) = self.hooks.get(hook) {
                return Err(ForgeError::MultipleHookMethods {
                    hook: *hook,
                    existing: existing.clone(),
                    member: member.to_string(),
                });
            }
        }
        for hook in hooks {
            debug!(member, hook = %hook, "claimed lifecycle hook");
            self.hooks.insert(hook, member.to_string());
        }

        self.selectors.insert(selector, member.to_string());
        self.external_methods.push(ExternalMethodEntry {
            member: member.to_string(),
            signature,
            config: method.config.clone(),
            hints: method.hints(),
            handler,
        });
        Ok(())
    }

    pub fn add_internal(&mut self, member: &str, config: &HandlerConfig, handler: Handler) {
        self.internal_routines.push(InternalRoutineEntry {
            name: member.to_string(),
            params: config.params(),
            handler,
        });
    }

    pub fn bare_handlers(&self) -> &BTreeMap<OnCompletionAction, BareHandlerEntry> {
        &self.bare_handlers
    }

    pub fn bare_handler(&self, action: OnCompletionAction) -> Option<&BareHandlerEntry> {
        self.bare_handlers.get(&action)
    }

    pub fn external_methods(&self) -> &[ExternalMethodEntry] {
        &self.external_methods
    }

    pub fn external_method(&self, member: &str) -> Option<&ExternalMethodEntry> {
        self.external_methods.iter().find(|m| m.member == member)
    }

    /// Member claiming a lifecycle hook through an external method.
    pub fn hook(&self, hook: LifecycleHook) -> Option<&str> {
        self.hooks.get(&hook).map(String::as_str)
    }

    pub fn internal_routines(&self) -> &[InternalRoutineEntry] {
        &self.internal_routines
    }

    /// Internal routine name -> parameter names.
    pub fn routine_params(&self) -> BTreeMap<String, Vec<String>> {
        self.internal_routines
            .iter()
            .map(|r| (r.name.clone(), r.params.clone()))
            .collect()
    }

    /// Non-empty hints keyed by member name.
    pub fn hints(&self) -> BTreeMap<String, MethodHints> {
        self.external_methods
            .iter()
            .filter(|m| !m.hints.is_empty())
            .map(|m| (m.member.clone(), m.hints.clone()))
            .collect()
    }
}
