//! Nested, separately compiled programs referenced by an application.
//!
//! # Two-phase resolution
//!
//! 1. **Registration**: programs supplied as compiled bytes resolve
//!    immediately. Nothing else needs to happen for them.
//! 2. **Deferred**: programs supplied as source descriptors need a
//!    [`CompilerConnection`]. They resolve when the application is assembled
//!    with a connection. Results are cached on the reference, so later
//!    assemblies never ask the connection again.
//!
//! A resolved program carries its bytes and the derived program address,
//! the hex SHA-512/256 digest of `"Program" || bytes`.

use crate::assembler::CompiledArtifact;
use crate::errors::ForgeError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};
use std::fmt;
use tracing::{debug, info};

const PROGRAM_DOMAIN: &[u8] = b"Program";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubArtifactKind {
    /// An application with approval and clear programs.
    Contract,
    /// A single stateless signature program.
    LogicSignature,
}

impl fmt::Display for SubArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubArtifactKind::Contract => f.write_str("contract"),
            SubArtifactKind::LogicSignature => f.write_str("logic signature"),
        }
    }
}

/// What the compiler connection receives for a deferred program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDescriptor {
    /// `<member>.<program>`, e.g. `child.approval`.
    pub name: String,
    pub source: String,
}

/// Compiles program source to bytes, typically over the network.
///
/// Timeouts and retries are the implementor's business; a call either
/// returns the bytes or fails.
pub trait CompilerConnection {
    fn compile_subartifact(&self, descriptor: &ProgramDescriptor) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramSource {
    Compiled(Vec<u8>),
    Pending { source: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProgram {
    pub bytes: Vec<u8>,
    pub address: String,
}

impl ResolvedProgram {
    pub fn new(bytes: Vec<u8>) -> Self {
        let address = program_address(&bytes);
        Self { bytes, address }
    }
}

/// Hex SHA-512/256 of the domain-separated program bytes.
pub fn program_address(bytes: &[u8]) -> String {
    let mut hasher = Sha512_256::new();
    hasher.update(PROGRAM_DOMAIN);
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone)]
struct ProgramSlot {
    label: &'static str,
    source: ProgramSource,
    resolved: Option<ResolvedProgram>,
}

impl ProgramSlot {
    fn new(label: &'static str, source: ProgramSource) -> Self {
        let resolved = match &source {
            ProgramSource::Compiled(bytes) => Some(ResolvedProgram::new(bytes.clone())),
            ProgramSource::Pending { .. } => None,
        };
        Self {
            label,
            source,
            resolved,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubArtifact {
    kind: SubArtifactKind,
    programs: Vec<ProgramSlot>,
}

impl SubArtifact {
    pub fn logic_signature(program: ProgramSource) -> Self {
        Self {
            kind: SubArtifactKind::LogicSignature,
            programs: vec![ProgramSlot::new("logic", program)],
        }
    }

    pub fn contract(approval: ProgramSource, clear: ProgramSource) -> Self {
        Self {
            kind: SubArtifactKind::Contract,
            programs: vec![
                ProgramSlot::new("approval", approval),
                ProgramSlot::new("clear", clear),
            ],
        }
    }

    /// A contract sub-artifact from another application's built programs.
    ///
    /// The program texts still need compiling to bytes, so both programs are
    /// deferred.
    pub fn from_artifact(artifact: &CompiledArtifact) -> Self {
        Self::contract(
            ProgramSource::Pending {
                source: artifact.approval.clone(),
            },
            ProgramSource::Pending {
                source: artifact.clear.clone(),
            },
        )
    }

    pub fn kind(&self) -> SubArtifactKind {
        self.kind
    }

    pub fn is_resolved(&self) -> bool {
        self.programs.iter().all(|p| p.resolved.is_some())
    }

    /// Resolve deferred programs through `connection`. Already-resolved
    /// programs are left alone. Returns how many programs were compiled.
    pub fn resolve(&mut self, name: &str, connection: &dyn CompilerConnection) -> Result<usize> {
        let mut compiled = 0;
        for slot in self.programs.iter_mut() {
            if slot.resolved.is_some() {
                continue;
            }
            let ProgramSource::Pending { source } = &slot.source else {
                continue;
            };
            let descriptor = ProgramDescriptor {
                name: format!("{}.{}", name, slot.label),
                source: source.clone(),
            };
            let bytes = connection
                .compile_subartifact(&descriptor)
                .with_context(|| format!("failed to compile sub-artifact `{}`", descriptor.name))?;
            debug!(program = %descriptor.name, len = bytes.len(), "resolved deferred program");
            slot.resolved = Some(ResolvedProgram::new(bytes));
            compiled += 1;
        }
        Ok(compiled)
    }

    fn program(&self, label: &str) -> Option<&ResolvedProgram> {
        self.programs
            .iter()
            .find(|p| p.label == label)
            .and_then(|p| p.resolved.as_ref())
    }

    pub fn approval(&self) -> Option<&ResolvedProgram> {
        self.program("approval")
    }

    pub fn clear(&self) -> Option<&ResolvedProgram> {
        self.program("clear")
    }

    pub fn logic(&self) -> Option<&ResolvedProgram> {
        self.program("logic")
    }

    /// Address of a resolved logic signature.
    pub fn address(&self) -> Option<&str> {
        self.logic().map(|p| p.address.as_str())
    }
}

/// Ordered set of named sub-artifacts and their resolution state.
#[derive(Debug, Clone, Default)]
pub struct SubArtifactResolver {
    entries: Vec<(String, SubArtifact)>,
}

impl SubArtifactResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sub-artifact. Compiled programs are resolved on the spot.
    pub fn register(&mut self, name: &str, artifact: SubArtifact) -> Result<(), ForgeError> {
        if self.get(name).is_some() {
            return Err(ForgeError::DuplicateMember {
                name: name.to_string(),
            });
        }
        debug!(
            name,
            kind = %artifact.kind(),
            resolved = artifact.is_resolved(),
            "registered sub-artifact"
        );
        self.entries.push((name.to_string(), artifact));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SubArtifact> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    /// A resolved sub-artifact, for handlers that embed its bytes or address.
    pub fn resolved(&self, name: &str) -> Result<&SubArtifact, ForgeError> {
        match self.get(name) {
            Some(a) if a.is_resolved() => Ok(a),
            _ => Err(ForgeError::UnresolvedSubArtifact {
                name: name.to_string(),
            }),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of sub-artifacts still waiting on the connection.
    pub fn pending(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, a)| !a.is_resolved())
            .map(|(n, _)| n.clone())
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(|(_, a)| !a.is_resolved())
    }

    /// Resolve every deferred program.
    ///
    /// Fails with [`ForgeError::MissingCompilerConnection`] when something is
    /// pending and no connection was given. Connection failures keep their
    /// original error, with the program name attached as context.
    pub fn resolve_all(&mut self, connection: Option<&dyn CompilerConnection>) -> Result<()> {
        let pending = self.pending();
        if pending.is_empty() {
            return Ok(());
        }
        let Some(connection) = connection else {
            return Err(ForgeError::MissingCompilerConnection { pending }.into());
        };
        let mut compiled = 0;
        for (name, artifact) in self.entries.iter_mut() {
            compiled += artifact.resolve(name, connection)?;
        }
        info!(artifacts = pending.len(), programs = compiled, "resolved deferred sub-artifacts");
        Ok(())
    }
}
