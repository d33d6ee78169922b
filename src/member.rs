//! Member declarations and role classification.
//!
//! Applications are described by [`Blueprint`]s: explicit, ordered lists of
//! named declarations. A blueprint may sit on top of base blueprints; the
//! classifier flattens the stack most-derived first, drops names a more
//! derived level already declared, and assigns each surviving member exactly
//! one [`Role`].
//!
//! Classification precedence:
//!
//! | Declaration | Role |
//! |-------------|------|
//! | state value | `StateSlot` (never inspected for handler config) |
//! | sub-artifact | `SubArtifact` |
//! | handler, bare actions | `LifecycleHandler` |
//! | handler, method spec | `ExternalMethod` |
//! | handler, internal params | `InternalRoutine` |
//! | handler without role config, attribute | `Unclassified` (ignored) |

use crate::errors::ForgeError;
use crate::handler::{Handler, HandlerConfig};
use crate::precompile::{SubArtifact, SubArtifactKind};
use forge_state::{StateDecl, StateScope, StateSlot};
use forge_types::{Expr, LifecycleHook, MethodConfig, MethodSignature, OnCompletionAction};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// What a member was declared as, before classification.
#[derive(Debug, Clone)]
pub enum Declaration {
    State(StateDecl),
    Handler { config: HandlerConfig, body: Handler },
    SubArtifact(SubArtifact),
    /// Plain data carried on the description; never routed.
    Attribute(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    StateSlot {
        scope: StateScope,
        reserved: bool,
    },
    LifecycleHandler {
        hook: Option<LifecycleHook>,
        actions: BTreeSet<OnCompletionAction>,
    },
    ExternalMethod {
        signature: MethodSignature,
        config: MethodConfig,
    },
    InternalRoutine,
    SubArtifact {
        kind: SubArtifactKind,
    },
    Unclassified,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::StateSlot { .. } => "state slot",
            Role::LifecycleHandler { .. } => "bare handler",
            Role::ExternalMethod { .. } => "external method",
            Role::InternalRoutine => "internal routine",
            Role::SubArtifact { .. } => "sub-artifact",
            Role::Unclassified => "unclassified",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub role: Role,
    pub declaration: Declaration,
}

/// One level of an application description.
#[derive(Debug, Clone)]
pub struct Blueprint {
    pub name: String,
    pub desc: Option<String>,
    members: Vec<(String, Declaration)>,
}

impl Blueprint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: None,
            members: Vec::new(),
        }
    }

    /// The level every application inherits from: a bare `create` handler
    /// that approves application creation.
    pub fn base() -> Self {
        Self::new("Application").member(
            "create",
            Declaration::Handler {
                config: HandlerConfig::lifecycle(LifecycleHook::Create),
                body: Handler::fixed(Expr::Approve),
            },
        )
    }

    pub fn describe(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn member(mut self, name: impl Into<String>, declaration: Declaration) -> Self {
        self.push(name, declaration);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, declaration: Declaration) {
        self.members.push((name.into(), declaration));
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Declaration)> {
        self.members.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

pub struct MemberClassifier;

impl MemberClassifier {
    /// Flatten `levels` (most-derived first) and classify every member.
    pub fn classify(levels: &[Blueprint]) -> Result<Vec<Member>, ForgeError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut members = Vec::new();

        for level in levels {
            let mut level_names: HashSet<&str> = HashSet::new();
            for (name, declaration) in level.members() {
                if !level_names.insert(name) {
                    return Err(ForgeError::DuplicateMember {
                        name: name.to_string(),
                    });
                }
                if seen.contains(name) {
                    debug!(member = name, level = %level.name, "overridden by derived declaration");
                    continue;
                }
                seen.insert(name.to_string());
                members.push(Self::classify_member(name, declaration.clone())?);
            }
        }
        Ok(members)
    }

    /// Classify one declaration, taking ownership of it.
    ///
    /// Declared state values without a storage key get the member name.
    pub fn classify_member(name: &str, declaration: Declaration) -> Result<Member, ForgeError> {
        let (role, declaration) = match declaration {
            Declaration::State(mut decl) => {
                if let StateSlot::Declared(value) = &mut decl.slot {
                    if value.assign_default_key(name) {
                        debug!(member = name, "assigned default storage key");
                    }
                }
                let role = Role::StateSlot {
                    scope: decl.scope,
                    reserved: decl.slot.is_reserved(),
                };
                (role, Declaration::State(decl))
            }
            Declaration::SubArtifact(artifact) => (
                Role::SubArtifact {
                    kind: artifact.kind(),
                },
                Declaration::SubArtifact(artifact),
            ),
            Declaration::Attribute(value) => (Role::Unclassified, Declaration::Attribute(value)),
            Declaration::Handler { mut config, body } => {
                if config.references_context && !body.takes_context() {
                    return Err(ForgeError::InconsistentForms {
                        member: name.to_string(),
                    });
                }
                config.references_context = body.takes_context();
                let role = Self::handler_role(name, &config)?;
                (role, Declaration::Handler { config, body })
            }
        };

        if role == Role::Unclassified {
            if matches!(declaration, Declaration::Handler { .. }) {
                warn!(member = name, "handler declares no role; ignoring it");
            }
        } else {
            debug!(member = name, role = role.label(), "classified member");
        }
        Ok(Member {
            name: name.to_string(),
            role,
            declaration,
        })
    }

    fn handler_role(name: &str, config: &HandlerConfig) -> Result<Role, ForgeError> {
        if config.role_count() > 1 {
            return Err(ForgeError::ConflictingRoles {
                member: name.to_string(),
            });
        }
        if config.is_bare() {
            return Ok(Role::LifecycleHandler {
                hook: config.hook,
                actions: config.bare_actions.keys().copied().collect(),
            });
        }
        if let Some(method) = &config.method {
            return Ok(Role::ExternalMethod {
                signature: method.signature(name),
                config: method.config.clone(),
            });
        }
        if config.internal.is_some() {
            return Ok(Role::InternalRoutine);
        }
        Ok(Role::Unclassified)
    }
}
