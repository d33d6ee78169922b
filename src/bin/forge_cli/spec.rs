//! Spec command - print the application specification document

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use super::{load_application, CliOptions};

#[derive(Parser, Debug)]
pub struct SpecCmd {
    /// Path to the application manifest (JSON)
    pub manifest: PathBuf,

    /// Print the decoded approval and clear programs instead of the document
    #[arg(long)]
    pub programs: bool,
}

impl SpecCmd {
    pub fn execute(&self, options: &CliOptions) -> Result<()> {
        let mut app = load_application(&self.manifest, options)?;
        app.assemble(None)?;
        let spec = app.application_spec()?;

        if self.programs {
            println!("{}", spec.source.decode_approval()?);
            println!("{}", spec.source.decode_clear()?);
        } else {
            println!("{}", spec.to_json()?);
        }
        Ok(())
    }
}
