//! Build configuration handed to the low-level compiler.
//!
//! Defaults pin the target version and the deterministic-layout options, so
//! two builds of the same application produce identical programs.
//!
//! Environment overrides:
//! - `APP_FORGE_PROGRAM_VERSION`: target program version
//! - `APP_FORGE_OPTIMIZE_SCRATCH`: scratch-slot optimization (`true`/`false`)

use crate::errors::ForgeError;
use forge_types::env_utils::{env_bool_or, env_var_or};
use serde::{Deserialize, Serialize};

/// Oldest program version the router can target.
pub const MIN_PROGRAM_VERSION: u64 = 6;

/// Newest program version the router can target.
pub const MAX_PROGRAM_VERSION: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeOptions {
    pub scratch_slots: bool,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self { scratch_slots: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub program_version: u64,
    pub assemble_constants: bool,
    pub optimize: OptimizeOptions,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            program_version: MAX_PROGRAM_VERSION,
            assemble_constants: true,
            optimize: OptimizeOptions::default(),
        }
    }
}

impl BuildConfig {
    /// Defaults, overridden by `APP_FORGE_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            program_version: env_var_or("APP_FORGE_PROGRAM_VERSION", defaults.program_version),
            assemble_constants: defaults.assemble_constants,
            optimize: OptimizeOptions {
                scratch_slots: env_bool_or(
                    "APP_FORGE_OPTIMIZE_SCRATCH",
                    defaults.optimize.scratch_slots,
                ),
            },
        }
    }

    pub fn with_program_version(mut self, version: u64) -> Self {
        self.program_version = version;
        self
    }

    pub fn validate(&self) -> Result<(), ForgeError> {
        if !(MIN_PROGRAM_VERSION..=MAX_PROGRAM_VERSION).contains(&self.program_version) {
            return Err(ForgeError::InvalidConfig {
                message: format!(
                    "program version {} outside supported range {}..={}",
                    self.program_version, MIN_PROGRAM_VERSION, MAX_PROGRAM_VERSION
                ),
            });
        }
        Ok(())
    }
}
