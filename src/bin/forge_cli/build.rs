//! Build command - assemble an application and write its artifacts

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use super::{load_application, CliOptions};

#[derive(Parser, Debug)]
pub struct BuildCmd {
    /// Path to the application manifest (JSON)
    pub manifest: PathBuf,

    /// Directory to write approval.teal, clear.teal, contract.json and application.json
    #[arg(long, short, default_value = "artifacts")]
    pub out: PathBuf,
}

#[derive(Serialize)]
struct BuildSummary<'a> {
    name: &'a str,
    out_dir: String,
    files: Vec<&'static str>,
    methods: usize,
    bare_actions: usize,
}

impl BuildCmd {
    pub fn execute(&self, options: &CliOptions) -> Result<()> {
        let mut app = load_application(&self.manifest, options)?;
        let bundle = app.dump(&self.out, None)?;

        let summary = BuildSummary {
            name: app.name(),
            out_dir: self.out.display().to_string(),
            files: bundle.files().iter().map(|(name, _)| *name).collect(),
            methods: app.dispatch_table().external_methods().len(),
            bare_actions: app.dispatch_table().bare_handlers().len(),
        };

        if options.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("Built {} into {}", summary.name, summary.out_dir);
            for file in &summary.files {
                println!("  {}", file);
            }
            println!(
                "{} method(s), {} bare action(s)",
                summary.methods, summary.bare_actions
            );
        }
        Ok(())
    }
}
