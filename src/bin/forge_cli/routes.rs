//! Routes command - show how calls are dispatched

use anyhow::Result;
use app_forge::forge_types::{CallConfig, OnCompletionAction};
use app_forge::DispatchTable;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use super::{load_application, CliOptions};

#[derive(Parser, Debug)]
pub struct RoutesCmd {
    /// Path to the application manifest (JSON)
    pub manifest: PathBuf,
}

#[derive(Serialize)]
struct BareRouteInfo {
    action: OnCompletionAction,
    call: CallConfig,
    member: String,
}

#[derive(Serialize)]
struct MethodRouteInfo {
    selector: String,
    signature: String,
    member: String,
    actions: Vec<(OnCompletionAction, CallConfig)>,
}

#[derive(Serialize)]
struct RoutesInfo {
    bare: Vec<BareRouteInfo>,
    methods: Vec<MethodRouteInfo>,
    routines: Vec<String>,
}

impl RoutesInfo {
    fn from_table(table: &DispatchTable) -> Self {
        Self {
            bare: table
                .bare_handlers()
                .iter()
                .map(|(action, entry)| BareRouteInfo {
                    action: *action,
                    call: entry.call,
                    member: entry.member.clone(),
                })
                .collect(),
            methods: table
                .external_methods()
                .iter()
                .map(|entry| MethodRouteInfo {
                    selector: entry.signature.selector_hex(),
                    signature: entry.signature.signature(),
                    member: entry.member.clone(),
                    actions: entry.config.iter().collect(),
                })
                .collect(),
            routines: table
                .internal_routines()
                .iter()
                .map(|r| format!("{}({})", r.name, r.params.join(", ")))
                .collect(),
        }
    }
}

impl RoutesCmd {
    pub fn execute(&self, options: &CliOptions) -> Result<()> {
        let app = load_application(&self.manifest, options)?;
        let routes = RoutesInfo::from_table(app.dispatch_table());

        if options.json {
            println!("{}", serde_json::to_string_pretty(&routes)?);
            return Ok(());
        }

        println!("\x1b[1mBare calls:\x1b[0m");
        if routes.bare.is_empty() {
            println!("  (none)");
        }
        for bare in &routes.bare {
            println!("  {:<20} {:<8} -> {}", bare.action.as_str(), format!("{:?}", bare.call).to_lowercase(), bare.member);
        }

        println!("\x1b[1mMethods:\x1b[0m");
        if routes.methods.is_empty() {
            println!("  (none)");
        }
        for method in &routes.methods {
            let actions: Vec<String> = method
                .actions
                .iter()
                .map(|(action, call)| format!("{}={}", action, format!("{:?}", call).to_lowercase()))
                .collect();
            println!(
                "  \x1b[36m{}\x1b[0m {} [{}] -> {}",
                method.selector,
                method.signature,
                actions.join(","),
                method.member
            );
        }

        if !routes.routines.is_empty() {
            println!("\x1b[1mInternal routines:\x1b[0m");
            for routine in &routes.routines {
                println!("  {}", routine);
            }
        }
        Ok(())
    }
}
