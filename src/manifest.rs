//! Declarative JSON manifests.
//!
//! A manifest lists members with an explicit `kind` tag, in registration
//! order:
//!
//! ```json
//! {
//!   "name": "Counter",
//!   "members": [
//!     {"name": "counter", "kind": "state", "scope": "shared", "type": "uint64", "default": {"int": 0}},
//!     {"name": "create", "kind": "bare", "hook": "create", "body": {"sequence": ["initialize_shared_state", {"expr": "approve"}]}},
//!     {"name": "read", "kind": "external", "returns": "uint64", "read_only": true,
//!      "body": {"get": {"scope": "shared", "name": "counter"}}}
//!   ]
//! }
//! ```
//!
//! Member kinds: `state`, `reserved_state`, `bare`, `external`, `internal`,
//! `logic_signature`, `contract`, `attribute`.
//!
//! Handler bodies are [`BodyTemplate`]s. A body made only of `expr` nodes
//! becomes a fixed handler; any state, initialization or routine-call node
//! makes it contextual.

use crate::application::ApplicationBuilder;
use crate::config::BuildConfig;
use crate::context::HandlerContext;
use crate::handler::{Handler, HandlerConfig, MethodSpec};
use crate::hints::DefaultArgument;
use crate::member::Declaration;
use crate::precompile::{ProgramSource, SubArtifact};
use anyhow::{Context, Result};
use forge_state::{ReservedStateValue, StateDecl, StateScope, StateSlot, StateValue};
use forge_types::{
    AbiType, Bytes, CallConfig, Expr, LifecycleHook, MethodArg, MethodConfig, OnCompletionAction,
    ValueType,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyTemplate {
    Expr(Expr),
    Sequence(Vec<BodyTemplate>),
    InitializeSharedState,
    InitializePerCallerState,
    Get {
        scope: StateScope,
        name: String,
    },
    Set {
        scope: StateScope,
        name: String,
        value: Expr,
    },
    GetReserved {
        scope: StateScope,
        name: String,
        seed: Expr,
    },
    SetReserved {
        scope: StateScope,
        name: String,
        seed: Expr,
        value: Expr,
    },
    Call {
        routine: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
}

impl BodyTemplate {
    pub fn needs_context(&self) -> bool {
        match self {
            BodyTemplate::Expr(_) => false,
            BodyTemplate::Sequence(items) => items.iter().any(BodyTemplate::needs_context),
            _ => true,
        }
    }

    pub fn render(&self, ctx: &HandlerContext<'_>) -> Result<Expr> {
        Ok(match self {
            BodyTemplate::Expr(e) => e.clone(),
            BodyTemplate::Sequence(items) => Expr::Seq(
                items
                    .iter()
                    .map(|item| item.render(ctx))
                    .collect::<Result<Vec<_>>>()?,
            ),
            BodyTemplate::InitializeSharedState => ctx.initialize_shared_state()?,
            BodyTemplate::InitializePerCallerState => ctx.initialize_per_caller_state(None)?,
            BodyTemplate::Get { scope, name } => ctx.output(cell(ctx, *scope, name)?.get()),
            BodyTemplate::Set { scope, name, value } => cell(ctx, *scope, name)?.set(value.clone()),
            BodyTemplate::GetReserved { scope, name, seed } => {
                ctx.output(reserved_cell(ctx, *scope, name, seed.clone())?.get())
            }
            BodyTemplate::SetReserved {
                scope,
                name,
                seed,
                value,
            } => reserved_cell(ctx, *scope, name, seed.clone())?.set(value.clone()),
            BodyTemplate::Call { routine, args } => ctx.call(routine, args.clone())?,
        })
    }

    pub fn into_handler(self) -> Handler {
        match self {
            BodyTemplate::Expr(e) => Handler::fixed(e),
            template if !template.needs_context() => Handler::fixed(flatten_fixed(template)),
            template => Handler::contextual(move |ctx| template.render(ctx)),
        }
    }
}

fn flatten_fixed(template: BodyTemplate) -> Expr {
    match template {
        BodyTemplate::Expr(e) => e,
        BodyTemplate::Sequence(items) => Expr::Seq(items.into_iter().map(flatten_fixed).collect()),
        _ => Expr::noop(),
    }
}

fn cell(ctx: &HandlerContext<'_>, scope: StateScope, name: &str) -> Result<forge_state::StateCell> {
    match scope {
        StateScope::Shared => ctx.global(name),
        StateScope::PerCaller => ctx.local(name),
    }
}

fn reserved_cell(ctx: &HandlerContext<'_>, scope: StateScope, name: &str, seed: Expr) -> Result<forge_state::StateCell> {
    match scope {
        StateScope::Shared => ctx.reserved_global(name, seed),
        StateScope::PerCaller => ctx.reserved_local(name, seed),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ManifestDecl {
    State {
        scope: StateScope,
        #[serde(rename = "type")]
        value_type: ValueType,
        #[serde(default)]
        key: Option<Bytes>,
        #[serde(default)]
        default: Option<Expr>,
        #[serde(default, rename = "static")]
        is_static: bool,
        #[serde(default)]
        descr: Option<String>,
    },
    ReservedState {
        scope: StateScope,
        #[serde(rename = "type")]
        value_type: ValueType,
        max_keys: u64,
        #[serde(default)]
        prefix: Option<Bytes>,
        #[serde(default)]
        descr: Option<String>,
    },
    Bare {
        #[serde(default)]
        hook: Option<LifecycleHook>,
        #[serde(default)]
        actions: BTreeMap<OnCompletionAction, CallConfig>,
        body: BodyTemplate,
        #[serde(default)]
        references_context: bool,
    },
    External {
        #[serde(default)]
        method_name: Option<String>,
        #[serde(default)]
        args: Vec<MethodArg>,
        #[serde(default)]
        returns: Option<AbiType>,
        #[serde(default)]
        desc: Option<String>,
        #[serde(default)]
        hook: Option<LifecycleHook>,
        #[serde(default)]
        config: Option<MethodConfig>,
        #[serde(default)]
        read_only: bool,
        #[serde(default)]
        default_arguments: BTreeMap<String, DefaultArgument>,
        body: BodyTemplate,
        #[serde(default)]
        references_context: bool,
    },
    Internal {
        #[serde(default)]
        params: Vec<String>,
        body: BodyTemplate,
        #[serde(default)]
        references_context: bool,
    },
    LogicSignature {
        program: ProgramSource,
    },
    Contract {
        approval: ProgramSource,
        clear: ProgramSource,
    },
    Attribute {
        value: serde_json::Value,
    },
}

impl ManifestDecl {
    pub fn into_declaration(self) -> Declaration {
        match self {
            ManifestDecl::State {
                scope,
                value_type,
                key,
                default,
                is_static,
                descr,
            } => Declaration::State(StateDecl {
                scope,
                slot: StateSlot::Declared(StateValue {
                    value_type,
                    key,
                    default,
                    is_static,
                    descr,
                }),
            }),
            ManifestDecl::ReservedState {
                scope,
                value_type,
                max_keys,
                prefix,
                descr,
            } => {
                let mut value = ReservedStateValue::new(value_type, max_keys);
                value.prefix = prefix;
                value.descr = descr;
                Declaration::State(StateDecl {
                    scope,
                    slot: StateSlot::Reserved(value),
                })
            }
            ManifestDecl::Bare {
                hook,
                actions,
                body,
                references_context,
            } => {
                let mut config = match hook {
                    Some(hook) => HandlerConfig::lifecycle(hook),
                    None => HandlerConfig::default(),
                };
                config.bare_actions.extend(actions.into_iter().filter(|(_, c)| *c != CallConfig::Never));
                handler(config, body, references_context)
            }
            ManifestDecl::External {
                method_name,
                args,
                returns,
                desc,
                hook,
                config,
                read_only,
                default_arguments,
                body,
                references_context,
            } => {
                let method_config = match (config, hook) {
                    (Some(config), _) => config,
                    (None, Some(hook)) => MethodConfig::for_hook(hook),
                    (None, None) => MethodConfig::default(),
                };
                let spec = MethodSpec {
                    name: method_name,
                    args,
                    returns,
                    desc,
                    config: method_config,
                    read_only,
                    default_arguments,
                };
                handler(HandlerConfig::external(spec), body, references_context)
            }
            ManifestDecl::Internal {
                params,
                body,
                references_context,
            } => handler(HandlerConfig::internal(params), body, references_context),
            ManifestDecl::LogicSignature { program } => Declaration::SubArtifact(SubArtifact::logic_signature(program)),
            ManifestDecl::Contract { approval, clear } => {
                Declaration::SubArtifact(SubArtifact::contract(approval, clear))
            }
            ManifestDecl::Attribute { value } => Declaration::Attribute(value),
        }
    }
}

fn handler(mut config: HandlerConfig, body: BodyTemplate, references_context: bool) -> Declaration {
    config.references_context = references_context;
    Declaration::Handler {
        config,
        body: body.into_handler(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestMember {
    pub name: String,
    #[serde(flatten)]
    pub decl: ManifestDecl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub program_version: Option<u64>,
    #[serde(default)]
    pub members: Vec<ManifestMember>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid application manifest")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    /// Builder with every member registered in manifest order.
    ///
    /// The build config starts from the environment; a `program_version` in
    /// the manifest overrides it.
    pub fn into_builder(self) -> ApplicationBuilder {
        let mut config = BuildConfig::from_env();
        if let Some(version) = self.program_version {
            config.program_version = version;
        }
        let mut builder = ApplicationBuilder::new(self.name).config(config);
        if let Some(desc) = self.desc {
            builder = builder.describe(desc);
        }
        for member in self.members {
            builder = builder.member(member.name, member.decl.into_declaration());
        }
        builder
    }
}
