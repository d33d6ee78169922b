//! Writing built artifacts to persistent storage.
//!
//! An export is all-or-nothing: every document is serialized before the
//! first byte is written, all files are staged next to their targets, and
//! only once every stage succeeded are they renamed into place. A failed
//! rename rolls back the files already moved and restores what they replaced.
//!
//! Directory layout:
//! ```text
//! <dir>/
//!   approval.teal
//!   clear.teal
//!   contract.json
//!   application.json
//! ```

use crate::assembler::CompiledArtifact;
use crate::spec_document::ApplicationSpec;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const APPROVAL_FILE: &str = "approval.teal";
pub const CLEAR_FILE: &str = "clear.teal";
pub const CONTRACT_FILE: &str = "contract.json";
pub const APPLICATION_FILE: &str = "application.json";

/// The four serialized documents of one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    pub approval: String,
    pub clear: String,
    pub contract_json: String,
    pub application_json: String,
}

impl ExportBundle {
    pub fn new(artifact: &CompiledArtifact, spec: &ApplicationSpec) -> Result<Self> {
        Ok(Self {
            approval: artifact.approval.clone(),
            clear: artifact.clear.clone(),
            contract_json: serde_json::to_string_pretty(&artifact.contract)
                .map_err(|e| anyhow!("Failed to serialize contract: {}", e))?,
            application_json: spec
                .to_json()
                .map_err(|e| anyhow!("Failed to serialize application spec: {}", e))?,
        })
    }

    /// File name -> contents, in write order.
    pub fn files(&self) -> [(&'static str, &str); 4] {
        [
            (APPROVAL_FILE, self.approval.as_str()),
            (CLEAR_FILE, self.clear.as_str()),
            (CONTRACT_FILE, self.contract_json.as_str()),
            (APPLICATION_FILE, self.application_json.as_str()),
        ]
    }
}

/// Persistence for export bundles.
pub trait ArtifactStore {
    fn store(&self, bundle: &ExportBundle) -> Result<()>;
}

/// Stores bundles as files in one directory, creating it when absent.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactStore for FsArtifactStore {
    fn store(&self, bundle: &ExportBundle) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| anyhow!("Failed to create directory {}: {}", self.dir.display(), e))?;

        let files = bundle.files();
        let mut staged: Vec<StagedFile> = Vec::with_capacity(files.len());
        for (name, contents) in files {
            match StagedFile::stage(&self.dir.join(name), contents.as_bytes()) {
                Ok(file) => staged.push(file),
                Err(e) => {
                    discard(&staged);
                    return Err(e);
                }
            }
        }

        for (i, file) in staged.iter().enumerate() {
            if let Err(e) = file.commit() {
                rollback(&staged[..i]);
                discard(&staged[i..]);
                return Err(e);
            }
        }
        for file in &staged {
            file.finish();
        }

        info!(dir = %self.dir.display(), "wrote application artifacts");
        Ok(())
    }
}

/// A file written to a temporary path beside its target, not yet visible.
struct StagedFile {
    target: PathBuf,
    tmp: PathBuf,
    backup: PathBuf,
}

impl StagedFile {
    fn stage(target: &Path, contents: &[u8]) -> Result<Self> {
        if target.exists() && !target.is_file() {
            return Err(anyhow!("Cannot write {}: path exists and is not a file", target.display()));
        }
        let file = Self {
            target: target.to_path_buf(),
            tmp: with_suffix(target, "tmp"),
            backup: with_suffix(target, "bak"),
        };
        std::fs::write(&file.tmp, contents)
            .map_err(|e| anyhow!("Failed to write temp file {}: {}", file.tmp.display(), e))?;
        Ok(file)
    }

    /// Move any existing target aside, then rename the staged file into place.
    fn commit(&self) -> Result<()> {
        if self.target.is_file() {
            std::fs::rename(&self.target, &self.backup)
                .map_err(|e| anyhow!("Failed to back up {}: {}", self.target.display(), e))?;
        }
        std::fs::rename(&self.tmp, &self.target).map_err(|e| {
            self.restore();
            anyhow!(
                "Failed to rename {} to {}: {}",
                self.tmp.display(),
                self.target.display(),
                e
            )
        })
    }

    fn restore(&self) {
        if self.backup.exists() {
            if let Err(e) = std::fs::rename(&self.backup, &self.target) {
                warn!(file = %self.target.display(), error = %e, "failed to restore previous file");
            }
        }
    }

    fn finish(&self) {
        if self.backup.exists() {
            let _ = std::fs::remove_file(&self.backup);
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn discard(staged: &[StagedFile]) {
    for file in staged {
        let _ = std::fs::remove_file(&file.tmp);
    }
}

fn rollback(committed: &[StagedFile]) {
    for file in committed {
        let _ = std::fs::remove_file(&file.target);
        file.restore();
    }
}

pub struct ArtifactExporter;

impl ArtifactExporter {
    /// Serialize everything, then hand the bundle to `store`.
    pub fn export(artifact: &CompiledArtifact, spec: &ApplicationSpec, store: &dyn ArtifactStore) -> Result<ExportBundle> {
        let bundle = ExportBundle::new(artifact, spec)?;
        store.store(&bundle)?;
        Ok(bundle)
    }
}
