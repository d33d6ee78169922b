//! CLI subcommand implementations for app-forge

pub mod build;
pub mod routes;
pub mod spec;

use anyhow::{Context, Result};
use app_forge::{Application, ListingCompiler, Manifest};
use std::path::Path;
use std::sync::Arc;

/// Flags shared by every subcommand.
pub struct CliOptions {
    pub program_version: Option<u64>,
    pub json: bool,
}

/// Load a manifest and build it with the listing backend.
pub fn load_application(manifest: &Path, options: &CliOptions) -> Result<Application> {
    let manifest_doc = Manifest::load(manifest)?;
    let mut builder = manifest_doc.into_builder();
    if let Some(version) = options.program_version {
        let config = builder.build_config().with_program_version(version);
        builder = builder.config(config);
    }
    builder
        .build(Arc::new(ListingCompiler::new()))
        .with_context(|| format!("failed to build {}", manifest.display()))
}
