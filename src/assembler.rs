//! Program assembly.
//!
//! The assembler turns the dispatch table into a [`RoutingStructure`] with
//! every handler body rendered against the application's context, hands it
//! to a low-level [`Compiler`] once per program target, and caches the
//! resulting [`CompiledArtifact`]. Once an artifact exists, further
//! `assemble` calls return it without touching the compiler or the
//! sub-artifact connection.

use crate::config::BuildConfig;
use crate::context::HandlerContext;
use crate::dispatch::DispatchTable;
use crate::errors::ForgeError;
use crate::precompile::{CompilerConnection, SubArtifactResolver};
use anyhow::Result;
use forge_state::{StateRegistry, StateSchema};
use forge_types::{CallConfig, ContractDescription, Expr, MethodConfig, MethodSignature, OnCompletionAction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramTarget {
    /// Main program: routes every call.
    Approval,
    /// Teardown program: runs when an account clears its state.
    Clear,
}

impl fmt::Display for ProgramTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramTarget::Approval => f.write_str("approval"),
            ProgramTarget::Clear => f.write_str("clear"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BareRoute {
    pub action: OnCompletionAction,
    pub call: CallConfig,
    pub member: String,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRoute {
    pub member: String,
    pub signature: MethodSignature,
    pub selector: String,
    pub config: MethodConfig,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubroutineRoute {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
}

/// Input to the low-level compiler.
///
/// Bare calls are ordered by action, methods keep declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingStructure {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub bare_calls: Vec<BareRoute>,
    pub methods: Vec<MethodRoute>,
    pub subroutines: Vec<SubroutineRoute>,
}

impl RoutingStructure {
    /// Render every handler in `table` against `ctx`.
    pub fn build(
        name: &str,
        desc: Option<&str>,
        table: &DispatchTable,
        ctx: &HandlerContext<'_>,
    ) -> Result<Self> {
        let mut bare_calls = Vec::new();
        for (action, entry) in table.bare_handlers() {
            bare_calls.push(BareRoute {
                action: *action,
                call: entry.call,
                member: entry.member.clone(),
                body: entry.handler.render(ctx)?,
            });
        }

        let mut methods = Vec::new();
        for entry in table.external_methods() {
            let scoped = ctx.with_params(entry.signature.arg_names());
            methods.push(MethodRoute {
                member: entry.member.clone(),
                signature: entry.signature.clone(),
                selector: entry.signature.selector_hex(),
                config: entry.config.clone(),
                body: entry.handler.render(&scoped)?,
            });
        }

        let mut subroutines = Vec::new();
        for routine in table.internal_routines() {
            let scoped = ctx.with_params(routine.params.clone());
            subroutines.push(SubroutineRoute {
                name: routine.name.clone(),
                params: routine.params.clone(),
                body: routine.handler.render(&scoped)?,
            });
        }

        Ok(Self {
            name: name.to_string(),
            desc: desc.map(str::to_string),
            bare_calls,
            methods,
            subroutines,
        })
    }

    /// Contract description with methods in routing order.
    pub fn contract(&self) -> ContractDescription {
        ContractDescription::from_signatures(
            &self.name,
            self.desc.as_deref(),
            self.methods.iter().map(|m| &m.signature),
        )
    }
}

/// The low-level program compiler.
///
/// Errors are returned to callers untouched, so implementations should put
/// everything a user needs into them.
pub trait Compiler: Send + Sync {
    fn compile_program(
        &self,
        target: ProgramTarget,
        routing: &RoutingStructure,
        config: &BuildConfig,
    ) -> Result<String>;

    fn describe(&self, routing: &RoutingStructure) -> Result<ContractDescription> {
        Ok(routing.contract())
    }
}

/// Built programs plus their interface and state schema summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledArtifact {
    pub approval: String,
    pub clear: String,
    pub contract: ContractDescription,
    pub local_schema: StateSchema,
    pub global_schema: StateSchema,
}

pub struct ProgramAssembler {
    name: String,
    desc: Option<String>,
    compiler: Arc<dyn Compiler>,
    config: BuildConfig,
    artifact: Option<CompiledArtifact>,
}

impl ProgramAssembler {
    pub fn new(name: &str, desc: Option<&str>, compiler: Arc<dyn Compiler>, config: BuildConfig) -> Self {
        Self {
            name: name.to_string(),
            desc: desc.map(str::to_string),
            compiler,
            config,
            artifact: None,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn artifact(&self) -> Option<&CompiledArtifact> {
        self.artifact.as_ref()
    }

    pub fn is_built(&self) -> bool {
        self.artifact.is_some()
    }

    /// Build the programs, or return the ones already built.
    pub fn assemble(
        &mut self,
        state: &StateRegistry,
        table: &DispatchTable,
        sub_artifacts: &mut SubArtifactResolver,
        connection: Option<&dyn CompilerConnection>,
    ) -> Result<&CompiledArtifact> {
        if self.artifact.is_none() {
            sub_artifacts.resolve_all(connection)?;
            let artifact = self.compile(state, table, sub_artifacts)?;
            self.artifact = Some(artifact);
        } else {
            debug!(app = %self.name, "programs already built; returning cached artifact");
        }
        self.artifact.as_ref().ok_or_else(|| {
            ForgeError::NotBuilt {
                what: "approval or clear program".to_string(),
            }
            .into()
        })
    }

    fn compile(
        &self,
        state: &StateRegistry,
        table: &DispatchTable,
        sub_artifacts: &SubArtifactResolver,
    ) -> Result<CompiledArtifact> {
        self.config.validate()?;
        let routines = table.routine_params();
        let ctx = HandlerContext::new(state, sub_artifacts, &routines);
        let routing = RoutingStructure::build(&self.name, self.desc.as_deref(), table, &ctx)?;

        info!(
            app = %self.name,
            program_version = self.config.program_version,
            methods = routing.methods.len(),
            bare_calls = routing.bare_calls.len(),
            "compiling programs"
        );
        let approval = self
            .compiler
            .compile_program(ProgramTarget::Approval, &routing, &self.config)?;
        let clear = self
            .compiler
            .compile_program(ProgramTarget::Clear, &routing, &self.config)?;
        let contract = self.compiler.describe(&routing)?;

        Ok(CompiledArtifact {
            approval,
            clear,
            contract,
            local_schema: state.per_caller.schema(),
            global_schema: state.shared.schema(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Handler, HandlerConfig, MethodSpec};
    use forge_types::{AbiType, LifecycleHook};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
    }

    impl Compiler for Counting {
        fn compile_program(&self, target: ProgramTarget, routing: &RoutingStructure, config: &BuildConfig) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("#pragma version {}\n// {} {}", config.program_version, routing.name, target))
        }
    }

    fn table() -> DispatchTable {
        let mut table = DispatchTable::new();
        table
            .add_bare("create", &HandlerConfig::lifecycle(LifecycleHook::Create), Handler::fixed(Expr::Approve))
            .unwrap();
        for name in ["zeta", "alpha", "mid"] {
            table
                .add_external(
                    name,
                    &HandlerConfig::external(MethodSpec::new().arg("v", AbiType::Uint64)),
                    Handler::contextual(|ctx| Ok(ctx.output(ctx.arg("v")?))),
                )
                .unwrap();
        }
        table
    }

    #[test]
    fn test_routing_keeps_method_order() {
        let state = StateRegistry::new();
        let subs = SubArtifactResolver::new();
        let routines = BTreeMap::new();
        let ctx = HandlerContext::new(&state, &subs, &routines);
        let routing = RoutingStructure::build("App", None, &table(), &ctx).unwrap();

        let names: Vec<&str> = routing.methods.iter().map(|m| m.member.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(routing.methods[0].body, Expr::output(Expr::arg("v")));
        assert_eq!(routing.bare_calls[0].action, OnCompletionAction::NoOp);
        assert_eq!(routing.contract().methods.len(), 3);
    }

    #[test]
    fn test_assemble_is_idempotent() {
        let compiler = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let mut assembler = ProgramAssembler::new("App", None, compiler.clone(), BuildConfig::default());
        let state = StateRegistry::new();
        let table = table();
        let mut subs = SubArtifactResolver::new();

        let first = assembler.assemble(&state, &table, &mut subs, None).unwrap().clone();
        let second = assembler.assemble(&state, &table, &mut subs, None).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 2);
        assert!(first.approval.contains("approval"));
        assert!(first.clear.contains("clear"));
    }

    #[test]
    fn test_invalid_version_rejected_before_compiling() {
        let compiler = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let config = BuildConfig::default().with_program_version(99);
        let mut assembler = ProgramAssembler::new("App", None, compiler.clone(), config);
        let mut subs = SubArtifactResolver::new();
        let err = assembler
            .assemble(&StateRegistry::new(), &table(), &mut subs, None)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ForgeError>(),
            Some(ForgeError::InvalidConfig { .. })
        ));
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 0);
        assert!(!assembler.is_built());
    }
}
