//! Compiler doubles.
//!
//! `CountingCompiler` wraps the listing backend and counts program
//! compilations; `CountingConnection` "compiles" sub-artifact source by
//! returning its bytes and counts calls. The failing variants return a
//! fixed error.

use anyhow::{bail, Result};
use app_forge::{
    BuildConfig, Compiler, CompilerConnection, ListingCompiler, ProgramDescriptor, ProgramTarget,
    RoutingStructure,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct CountingCompiler {
    inner: ListingCompiler,
    programs: AtomicUsize,
}

#[allow(dead_code)]
impl CountingCompiler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn programs_compiled(&self) -> usize {
        self.programs.load(Ordering::SeqCst)
    }
}

impl Compiler for CountingCompiler {
    fn compile_program(&self, target: ProgramTarget, routing: &RoutingStructure, config: &BuildConfig) -> Result<String> {
        self.programs.fetch_add(1, Ordering::SeqCst);
        self.inner.compile_program(target, routing, config)
    }
}

/// Always fails with `message`.
pub struct FailingCompiler {
    pub message: &'static str,
}

impl Compiler for FailingCompiler {
    fn compile_program(&self, _target: ProgramTarget, _routing: &RoutingStructure, _config: &BuildConfig) -> Result<String> {
        bail!("{}", self.message)
    }
}

#[derive(Default)]
pub struct CountingConnection {
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl CountingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Descriptor names in the order they were compiled.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl CompilerConnection for CountingConnection {
    fn compile_subartifact(&self, descriptor: &ProgramDescriptor) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(descriptor.name.clone());
        }
        Ok(descriptor.source.as_bytes().to_vec())
    }
}

pub struct FailingConnection;

impl CompilerConnection for FailingConnection {
    fn compile_subartifact(&self, descriptor: &ProgramDescriptor) -> Result<Vec<u8>> {
        bail!("compiler endpoint unreachable while compiling {}", descriptor.name)
    }
}
