//! app-forge: build orchestration for on-chain applications.
//!
//! Turns a declarative application description into routed programs:
//!
//! - **Classification**: every registered member gets exactly one role
//!   ([`member`])
//! - **Dispatch**: bare handlers by on-completion action, external methods in
//!   declaration order, one method per lifecycle hook ([`dispatch`])
//! - **State**: per-caller and shared tables with default keys and
//!   initialization expressions ([`forge_state`])
//! - **Sub-artifacts**: nested programs resolved in two phases, the second
//!   through a compiler connection ([`precompile`])
//! - **Assembly**: approval and clear programs from a pluggable low-level
//!   compiler, cached after the first build ([`assembler`])
//! - **Export**: programs, contract description and specification document
//!   written to disk ([`exporter`], [`spec_document`])
//!
//! See [`application`] for the builder and [`manifest`] for the JSON
//! registration format used by the CLI.

#![allow(clippy::type_complexity)]

pub mod application;
pub mod assembler;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod errors;
pub mod exporter;
pub mod handler;
pub mod hints;
pub mod listing;
pub mod manifest;
pub mod member;
pub mod precompile;
pub mod spec_document;

pub use forge_state;
pub use forge_types;

pub use application::{Application, ApplicationBuilder};
pub use assembler::{CompiledArtifact, Compiler, ProgramAssembler, ProgramTarget, RoutingStructure};
pub use config::{BuildConfig, OptimizeOptions, MAX_PROGRAM_VERSION, MIN_PROGRAM_VERSION};
pub use context::HandlerContext;
pub use dispatch::DispatchTable;
pub use errors::{ErrorClass, ForgeError};
pub use exporter::{ArtifactExporter, ArtifactStore, ExportBundle, FsArtifactStore};
pub use handler::{Handler, HandlerConfig, MethodSpec};
pub use hints::{DefaultArgument, MethodHints};
pub use listing::ListingCompiler;
pub use manifest::Manifest;
pub use member::{Blueprint, Declaration, Member, MemberClassifier, Role};
pub use precompile::{
    CompilerConnection, ProgramDescriptor, ProgramSource, SubArtifact, SubArtifactKind, SubArtifactResolver,
};
pub use spec_document::ApplicationSpec;
