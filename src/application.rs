//! Application builder and the built application.
//!
//! ```
//! use app_forge::{ApplicationBuilder, Handler, ListingCompiler, MethodSpec};
//! use app_forge::forge_state::{StateDecl, StateValue};
//! use app_forge::forge_types::{AbiType, Expr};
//! use std::sync::Arc;
//!
//! let app = ApplicationBuilder::new("Counter")
//!     .state("counter", StateDecl::shared(StateValue::uint64().with_default(Expr::int(0))))
//!     .external(
//!         "increment",
//!         MethodSpec::new().returns(AbiType::Uint64),
//!         Handler::contextual(|ctx| {
//!             let counter = ctx.global("counter")?;
//!             Ok(Expr::seq([counter.increment(Expr::int(1))?, ctx.output(counter.get())]))
//!         }),
//!     )
//!     .build(Arc::new(ListingCompiler::new()))
//!     .unwrap();
//!
//! assert!(app.is_built());
//! let spec = app.application_spec().unwrap();
//! assert!(spec.schema.global.contains_key("counter"));
//! ```

use crate::assembler::{CompiledArtifact, Compiler, ProgramAssembler};
use crate::config::BuildConfig;
use crate::dispatch::DispatchTable;
use crate::errors::ForgeError;
use crate::exporter::{ArtifactExporter, ArtifactStore, ExportBundle, FsArtifactStore};
use crate::handler::{Handler, HandlerConfig, MethodSpec};
use crate::member::{Blueprint, Declaration, Member, MemberClassifier, Role};
use crate::precompile::{CompilerConnection, SubArtifact, SubArtifactResolver};
use crate::spec_document::ApplicationSpec;
use anyhow::Result;
use forge_state::{StateDecl, StateRegistry};
use forge_types::{CallConfig, Expr, LifecycleHook, OnCompletionAction};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Registers members in order, then classifies and builds them.
pub struct ApplicationBuilder {
    blueprint: Blueprint,
    bases: Vec<Blueprint>,
    config: BuildConfig,
}

impl ApplicationBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            blueprint: Blueprint::new(name),
            bases: Vec::new(),
            config: BuildConfig::default(),
        }
    }

    /// Start from an existing blueprint as the most-derived level.
    pub fn from_blueprint(blueprint: Blueprint) -> Self {
        Self {
            blueprint,
            bases: Vec::new(),
            config: BuildConfig::default(),
        }
    }

    pub fn describe(mut self, desc: impl Into<String>) -> Self {
        self.blueprint.desc = Some(desc.into());
        self
    }

    pub fn config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build_config(&self) -> BuildConfig {
        self.config
    }

    /// Inherit from `base`. Earlier bases take precedence over later ones;
    /// the default base with its `create` handler always comes last.
    pub fn extends(mut self, base: Blueprint) -> Self {
        self.bases.push(base);
        self
    }

    pub fn member(mut self, name: impl Into<String>, declaration: Declaration) -> Self {
        self.blueprint.push(name, declaration);
        self
    }

    pub fn state(self, name: impl Into<String>, decl: StateDecl) -> Self {
        self.member(name, Declaration::State(decl))
    }

    /// Bare handler answering the given on-completion actions.
    pub fn bare(
        self,
        name: impl Into<String>,
        actions: impl IntoIterator<Item = (OnCompletionAction, CallConfig)>,
        body: Handler,
    ) -> Self {
        self.member(
            name,
            Declaration::Handler {
                config: HandlerConfig::bare(actions),
                body,
            },
        )
    }

    /// Bare handler for one lifecycle hook.
    pub fn lifecycle(self, name: impl Into<String>, hook: LifecycleHook, body: Handler) -> Self {
        self.member(
            name,
            Declaration::Handler {
                config: HandlerConfig::lifecycle(hook),
                body,
            },
        )
    }

    pub fn external(self, name: impl Into<String>, method: MethodSpec, body: Handler) -> Self {
        self.member(
            name,
            Declaration::Handler {
                config: HandlerConfig::external(method),
                body,
            },
        )
    }

    pub fn internal(self, name: impl Into<String>, params: Vec<String>, body: Handler) -> Self {
        self.member(
            name,
            Declaration::Handler {
                config: HandlerConfig::internal(params),
                body,
            },
        )
    }

    pub fn sub_artifact(self, name: impl Into<String>, artifact: SubArtifact) -> Self {
        self.member(name, Declaration::SubArtifact(artifact))
    }

    pub fn attribute(self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.member(name, Declaration::Attribute(value))
    }

    /// Classify members and build the tables.
    ///
    /// When nothing needs the compiler connection the programs are built
    /// right away; otherwise call [`Application::assemble`] with one.
    pub fn build(self, compiler: Arc<dyn Compiler>) -> Result<Application> {
        self.config.validate()?;

        let name = self.blueprint.name.clone();
        let desc = self.blueprint.desc.clone();
        let mut levels = Vec::with_capacity(self.bases.len() + 2);
        levels.push(self.blueprint);
        levels.extend(self.bases);
        levels.push(Blueprint::base());

        let members = MemberClassifier::classify(&levels)?;

        let mut state = StateRegistry::new();
        let mut sub_artifacts = SubArtifactResolver::new();
        for member in &members {
            match &member.declaration {
                Declaration::State(decl) => state
                    .register(&member.name, decl.scope, decl.slot.clone())
                    .map_err(ForgeError::from)?,
                Declaration::SubArtifact(artifact) => sub_artifacts.register(&member.name, artifact.clone())?,
                _ => {}
            }
        }
        state.validate_limits().map_err(ForgeError::from)?;

        let table = DispatchTable::from_members(&members)?;
        let assembler = ProgramAssembler::new(&name, desc.as_deref(), compiler, self.config);

        let mut app = Application {
            name,
            desc,
            members,
            state,
            table,
            sub_artifacts,
            assembler,
        };
        info!(
            app = %app.name,
            members = app.members.len(),
            methods = app.table.external_methods().len(),
            bare_actions = app.table.bare_handlers().len(),
            pending_sub_artifacts = app.sub_artifacts.pending().len(),
            "classified application"
        );

        if !app.sub_artifacts.has_pending() {
            app.assemble(None)?;
        }
        Ok(app)
    }
}

/// A classified application and, once assembled, its programs.
///
/// Owned by one builder thread; callers sharing it across threads must
/// serialize access themselves.
pub struct Application {
    name: String,
    desc: Option<String>,
    members: Vec<Member>,
    state: StateRegistry,
    table: DispatchTable,
    sub_artifacts: SubArtifactResolver,
    assembler: ProgramAssembler,
}

impl Application {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Names of members that received no role.
    pub fn unclassified(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter(|m| m.role == Role::Unclassified)
            .map(|m| m.name.as_str())
            .collect()
    }

    pub fn state(&self) -> &StateRegistry {
        &self.state
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.table
    }

    pub fn sub_artifacts(&self) -> &SubArtifactResolver {
        &self.sub_artifacts
    }

    pub fn config(&self) -> &BuildConfig {
        self.assembler.config()
    }

    pub fn is_built(&self) -> bool {
        self.assembler.is_built()
    }

    pub fn artifact(&self) -> Option<&CompiledArtifact> {
        self.assembler.artifact()
    }

    pub fn approval_program(&self) -> Option<&str> {
        self.artifact().map(|a| a.approval.as_str())
    }

    pub fn clear_program(&self) -> Option<&str> {
        self.artifact().map(|a| a.clear.as_str())
    }

    /// Build the programs, resolving deferred sub-artifacts through
    /// `connection`. Returns the cached artifact when already built.
    pub fn assemble(&mut self, connection: Option<&dyn CompilerConnection>) -> Result<&CompiledArtifact> {
        self.assembler
            .assemble(&self.state, &self.table, &mut self.sub_artifacts, connection)
    }

    pub fn application_spec(&self) -> Result<ApplicationSpec> {
        let artifact = self.built()?;
        Ok(ApplicationSpec::new(artifact, &self.state, self.table.hints()))
    }

    /// Write the programs and documents to `dir`, building first if needed.
    pub fn dump(&mut self, dir: impl AsRef<Path>, connection: Option<&dyn CompilerConnection>) -> Result<ExportBundle> {
        let store = FsArtifactStore::new(dir.as_ref());
        self.export_to(&store, connection)
    }

    pub fn export_to(&mut self, store: &dyn ArtifactStore, connection: Option<&dyn CompilerConnection>) -> Result<ExportBundle> {
        self.assemble(connection)?;
        let spec = self.application_spec()?;
        let artifact = self.built()?;
        ArtifactExporter::export(artifact, &spec, store)
    }

    pub fn initialize_shared_state(&self) -> Result<Expr> {
        Ok(self.state.initialize_shared()?)
    }

    pub fn initialize_per_caller_state(&self, account: Option<Expr>) -> Result<Expr> {
        Ok(self.state.initialize_per_caller(account)?)
    }

    fn built(&self) -> Result<&CompiledArtifact, ForgeError> {
        self.assembler.artifact().ok_or_else(|| ForgeError::NotBuilt {
            what: "approval or clear program".to_string(),
        })
    }
}
