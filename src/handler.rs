//! Handler bodies and the metadata that decides their role.
//!
//! A handler body is either a fixed expression or a function of an explicit
//! [`HandlerContext`]. [`HandlerConfig`] records how the member was declared:
//! as a bare handler keyed by on-completion actions, as an external method
//! with a typed signature, or as an internal routine.

use crate::context::HandlerContext;
use crate::hints::{DefaultArgument, MethodHints};
use anyhow::Result;
use forge_types::{
    AbiType, CallConfig, Expr, LifecycleHook, MethodArg, MethodConfig, MethodSignature,
    OnCompletionAction,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub type ContextFn = Arc<dyn Fn(&HandlerContext<'_>) -> Result<Expr> + Send + Sync>;

#[derive(Clone)]
pub enum Handler {
    /// Body that needs no context.
    Fixed(Expr),
    /// Body rendered against the application's context.
    Contextual(ContextFn),
}

impl Handler {
    pub fn fixed(body: Expr) -> Self {
        Handler::Fixed(body)
    }

    pub fn contextual(f: impl Fn(&HandlerContext<'_>) -> Result<Expr> + Send + Sync + 'static) -> Self {
        Handler::Contextual(Arc::new(f))
    }

    pub fn takes_context(&self) -> bool {
        matches!(self, Handler::Contextual(_))
    }

    pub fn render(&self, ctx: &HandlerContext<'_>) -> Result<Expr> {
        match self {
            Handler::Fixed(body) => Ok(body.clone()),
            Handler::Contextual(f) => f(ctx),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Fixed(body) => f.debug_tuple("Fixed").field(body).finish(),
            Handler::Contextual(_) => f.write_str("Contextual(<fn>)"),
        }
    }
}

/// Typed signature metadata for an external method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSpec {
    /// Routed name; the member name when unset.
    pub name: Option<String>,
    pub args: Vec<MethodArg>,
    pub returns: Option<AbiType>,
    pub desc: Option<String>,
    pub config: MethodConfig,
    pub read_only: bool,
    pub default_arguments: BTreeMap<String, DefaultArgument>,
}

impl MethodSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn arg(mut self, name: impl Into<String>, ty: AbiType) -> Self {
        self.args.push(MethodArg::new(name, ty));
        self
    }

    pub fn returns(mut self, ty: AbiType) -> Self {
        self.returns = Some(ty);
        self
    }

    pub fn describe(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn config(mut self, config: MethodConfig) -> Self {
        self.config = config;
        self
    }

    /// Route this method for a lifecycle hook instead of plain calls.
    pub fn on(self, hook: LifecycleHook) -> Self {
        self.config(MethodConfig::for_hook(hook))
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn default_argument(mut self, arg: impl Into<String>, source: DefaultArgument) -> Self {
        self.default_arguments.insert(arg.into(), source);
        self
    }

    pub fn signature(&self, member: &str) -> MethodSignature {
        MethodSignature {
            name: self.name.clone().unwrap_or_else(|| member.to_string()),
            args: self.args.clone(),
            returns: self.returns.clone(),
            desc: self.desc.clone(),
        }
    }

    pub fn hints(&self) -> MethodHints {
        MethodHints {
            read_only: self.read_only,
            default_arguments: self.default_arguments.clone(),
        }
    }
}

/// Declared role metadata of one handler member.
///
/// Exactly one of `bare_actions` (non-empty), `method` and `internal` is
/// expected; the classifier rejects anything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Lifecycle hook a bare handler was declared for.
    pub hook: Option<LifecycleHook>,
    pub bare_actions: BTreeMap<OnCompletionAction, CallConfig>,
    pub method: Option<MethodSpec>,
    /// Parameter names of an internal routine.
    pub internal: Option<Vec<String>>,
    /// The body expects a [`HandlerContext`].
    pub references_context: bool,
}

impl HandlerConfig {
    /// Bare handler answering the given actions.
    pub fn bare(actions: impl IntoIterator<Item = (OnCompletionAction, CallConfig)>) -> Self {
        Self {
            bare_actions: actions
                .into_iter()
                .filter(|(_, call)| *call != CallConfig::Never)
                .collect(),
            ..Default::default()
        }
    }

    /// Bare handler for a lifecycle hook, e.g. a parameterless `create`.
    pub fn lifecycle(hook: LifecycleHook) -> Self {
        let mut config = Self::bare([hook.bare_action()]);
        config.hook = Some(hook);
        config
    }

    pub fn external(method: MethodSpec) -> Self {
        Self {
            method: Some(method),
            ..Default::default()
        }
    }

    pub fn internal(params: Vec<String>) -> Self {
        Self {
            internal: Some(params),
            ..Default::default()
        }
    }

    pub fn with_context(mut self) -> Self {
        self.references_context = true;
        self
    }

    pub fn is_bare(&self) -> bool {
        !self.bare_actions.is_empty()
    }

    /// Number of distinct roles this config claims.
    pub fn role_count(&self) -> usize {
        [self.is_bare(), self.method.is_some(), self.internal.is_some()]
            .iter()
            .filter(|claimed| **claimed)
            .count()
    }

    /// Lifecycle hooks claimed by this member, in check order.
    pub fn hooks(&self) -> Vec<LifecycleHook> {
        match (&self.method, self.hook) {
            (Some(method), _) => method.config.hooks(),
            (None, Some(hook)) => vec![hook],
            (None, None) => Vec::new(),
        }
    }

    /// Parameters visible to the body.
    pub fn params(&self) -> Vec<String> {
        if let Some(method) = &self.method {
            return method.args.iter().map(|a| a.name.clone()).collect();
        }
        self.internal.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precompile::SubArtifactResolver;
    use forge_state::StateRegistry;

    #[test]
    fn test_lifecycle_config() {
        let config = HandlerConfig::lifecycle(LifecycleHook::OptIn);
        assert!(config.is_bare());
        assert_eq!(config.role_count(), 1);
        assert_eq!(config.hooks(), vec![LifecycleHook::OptIn]);
        assert_eq!(
            config.bare_actions.get(&OnCompletionAction::OptIn),
            Some(&CallConfig::Call)
        );
    }

    #[test]
    fn test_bare_drops_never_actions() {
        let config = HandlerConfig::bare([
            (OnCompletionAction::NoOp, CallConfig::Never),
            (OnCompletionAction::CloseOut, CallConfig::Call),
        ]);
        assert_eq!(config.bare_actions.len(), 1);
        assert!(HandlerConfig::bare([(OnCompletionAction::NoOp, CallConfig::Never)]).role_count() == 0);
    }

    #[test]
    fn test_external_hooks_follow_config() {
        let spec = MethodSpec::new()
            .arg("v", AbiType::Uint64)
            .config(
                MethodConfig::empty()
                    .with(OnCompletionAction::NoOp, CallConfig::Create)
                    .with(OnCompletionAction::OptIn, CallConfig::Call),
            );
        let config = HandlerConfig::external(spec);
        assert_eq!(config.hooks(), vec![LifecycleHook::Create, LifecycleHook::OptIn]);
        assert_eq!(config.params(), vec!["v".to_string()]);
    }

    #[test]
    fn test_signature_name_override() {
        let spec = MethodSpec::new().named("renamed").returns(AbiType::String);
        assert_eq!(spec.signature("member").signature(), "renamed()string");
        assert_eq!(MethodSpec::new().signature("member").name, "member");
    }

    #[test]
    fn test_render() {
        let state = StateRegistry::new();
        let subs = SubArtifactResolver::new();
        let routines = BTreeMap::new();
        let ctx = HandlerContext::new(&state, &subs, &routines);

        assert_eq!(Handler::fixed(Expr::Approve).render(&ctx).unwrap(), Expr::Approve);
        let contextual = Handler::contextual(|ctx| Ok(ctx.output(Expr::int(1))));
        assert!(contextual.takes_context());
        assert_eq!(contextual.render(&ctx).unwrap(), Expr::output(Expr::int(1)));
    }
}
