//! On-completion actions, call configs and lifecycle hooks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Action requested by an application call, independent of any method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnCompletionAction {
    NoOp,
    OptIn,
    CloseOut,
    ClearState,
    UpdateApplication,
    DeleteApplication,
}

impl OnCompletionAction {
    pub const ALL: [OnCompletionAction; 6] = [
        OnCompletionAction::NoOp,
        OnCompletionAction::OptIn,
        OnCompletionAction::CloseOut,
        OnCompletionAction::ClearState,
        OnCompletionAction::UpdateApplication,
        OnCompletionAction::DeleteApplication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OnCompletionAction::NoOp => "no_op",
            OnCompletionAction::OptIn => "opt_in",
            OnCompletionAction::CloseOut => "close_out",
            OnCompletionAction::ClearState => "clear_state",
            OnCompletionAction::UpdateApplication => "update_application",
            OnCompletionAction::DeleteApplication => "delete_application",
        }
    }
}

impl fmt::Display for OnCompletionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a handler accepts calls, creates, both, or neither for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallConfig {
    #[default]
    Never,
    Call,
    Create,
    All,
}

impl CallConfig {
    pub fn allows_create(&self) -> bool {
        matches!(self, CallConfig::Create | CallConfig::All)
    }

    pub fn allows_call(&self) -> bool {
        matches!(self, CallConfig::Call | CallConfig::All)
    }
}

/// Lifecycle hooks; at most one external method may claim each.
///
/// `ALL` lists them in the order the dispatch table checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleHook {
    Create,
    Update,
    Delete,
    OptIn,
    CloseOut,
    ClearState,
}

impl LifecycleHook {
    pub const ALL: [LifecycleHook; 6] = [
        LifecycleHook::Create,
        LifecycleHook::Update,
        LifecycleHook::Delete,
        LifecycleHook::OptIn,
        LifecycleHook::CloseOut,
        LifecycleHook::ClearState,
    ];

    /// Human label used in error messages ("multiple opt in methods").
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleHook::Create => "create",
            LifecycleHook::Update => "update",
            LifecycleHook::Delete => "delete",
            LifecycleHook::OptIn => "opt in",
            LifecycleHook::CloseOut => "close out",
            LifecycleHook::ClearState => "clear state",
        }
    }

    /// The on-completion action and call config a bare handler for this hook answers.
    pub fn bare_action(&self) -> (OnCompletionAction, CallConfig) {
        match self {
            LifecycleHook::Create => (OnCompletionAction::NoOp, CallConfig::Create),
            LifecycleHook::Update => (OnCompletionAction::UpdateApplication, CallConfig::Call),
            LifecycleHook::Delete => (OnCompletionAction::DeleteApplication, CallConfig::Call),
            LifecycleHook::OptIn => (OnCompletionAction::OptIn, CallConfig::Call),
            LifecycleHook::CloseOut => (OnCompletionAction::CloseOut, CallConfig::Call),
            LifecycleHook::ClearState => (OnCompletionAction::ClearState, CallConfig::Call),
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-action call configuration of an external method.
///
/// Actions absent from the map are `CallConfig::Never`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodConfig {
    actions: BTreeMap<OnCompletionAction, CallConfig>,
}

impl Default for MethodConfig {
    /// Plain no-op call.
    fn default() -> Self {
        Self::empty().with(OnCompletionAction::NoOp, CallConfig::Call)
    }
}

impl MethodConfig {
    pub fn empty() -> Self {
        Self {
            actions: BTreeMap::new(),
        }
    }

    /// Config for a method registered under a lifecycle hook.
    pub fn for_hook(hook: LifecycleHook) -> Self {
        let (action, call) = hook.bare_action();
        Self::empty().with(action, call)
    }

    pub fn with(mut self, action: OnCompletionAction, call: CallConfig) -> Self {
        if call == CallConfig::Never {
            self.actions.remove(&action);
        } else {
            self.actions.insert(action, call);
        }
        self
    }

    pub fn get(&self, action: OnCompletionAction) -> CallConfig {
        self.actions.get(&action).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OnCompletionAction, CallConfig)> + '_ {
        self.actions.iter().map(|(a, c)| (*a, *c))
    }

    pub fn is_never(&self) -> bool {
        self.actions.is_empty()
    }

    /// Whether this config marks the method as the given lifecycle hook.
    ///
    /// A method is a create hook if any action allows creation; the other
    /// hooks follow from their matching action being anything but never.
    pub fn is_hook(&self, hook: LifecycleHook) -> bool {
        match hook {
            LifecycleHook::Create => self.actions.values().any(|c| c.allows_create()),
            LifecycleHook::Update => self.get(OnCompletionAction::UpdateApplication) != CallConfig::Never,
            LifecycleHook::Delete => self.get(OnCompletionAction::DeleteApplication) != CallConfig::Never,
            LifecycleHook::OptIn => self.get(OnCompletionAction::OptIn) != CallConfig::Never,
            LifecycleHook::CloseOut => self.get(OnCompletionAction::CloseOut) != CallConfig::Never,
            LifecycleHook::ClearState => self.get(OnCompletionAction::ClearState) != CallConfig::Never,
        }
    }

    pub fn hooks(&self) -> Vec<LifecycleHook> {
        LifecycleHook::ALL
            .into_iter()
            .filter(|h| self.is_hook(*h))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_method_config_is_plain_call() {
        let cfg = MethodConfig::default();
        assert_eq!(cfg.get(OnCompletionAction::NoOp), CallConfig::Call);
        assert!(cfg.hooks().is_empty());
    }

    #[test]
    fn test_create_hook_from_any_action() {
        let cfg = MethodConfig::empty().with(OnCompletionAction::OptIn, CallConfig::All);
        assert!(cfg.is_hook(LifecycleHook::Create));
        assert!(cfg.is_hook(LifecycleHook::OptIn));
        assert_eq!(cfg.hooks(), vec![LifecycleHook::Create, LifecycleHook::OptIn]);
    }

    #[test]
    fn test_with_never_removes_action() {
        let cfg = MethodConfig::default().with(OnCompletionAction::NoOp, CallConfig::Never);
        assert!(cfg.is_never());
    }

    #[test]
    fn test_for_hook_round_trips_hook() {
        for hook in LifecycleHook::ALL {
            assert!(MethodConfig::for_hook(hook).is_hook(hook), "hook {}", hook);
        }
    }
}
