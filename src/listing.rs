//! Reference compiler backend that renders the routing structure as a
//! readable listing.
//!
//! The listing is deterministic: the same routing structure and config give
//! byte-identical output. It performs the structural checks a real backend
//! would (every routine call resolves with the right arity, every method is
//! reachable) but selects no instructions.

use crate::assembler::{Compiler, ProgramTarget, RoutingStructure};
use crate::config::BuildConfig;
use anyhow::{bail, Result};
use forge_types::{CallConfig, Expr, OnCompletionAction};
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone, Default)]
pub struct ListingCompiler;

impl ListingCompiler {
    pub fn new() -> Self {
        Self
    }

    fn check(&self, routing: &RoutingStructure) -> Result<()> {
        let routines: BTreeMap<&str, usize> = routing
            .subroutines
            .iter()
            .map(|s| (s.name.as_str(), s.params.len()))
            .collect();

        for method in &routing.methods {
            if method.config.is_never() {
                bail!(
                    "unreachable method `{}`: no on-completion action routes to it",
                    method.signature.signature()
                );
            }
        }

        let bodies = routing
            .bare_calls
            .iter()
            .map(|b| (b.member.as_str(), &b.body))
            .chain(routing.methods.iter().map(|m| (m.member.as_str(), &m.body)))
            .chain(routing.subroutines.iter().map(|s| (s.name.as_str(), &s.body)));
        for (owner, body) in bodies {
            let mut failure = None;
            body.visit(&mut |e| {
                if let Expr::Call { name, args } = e {
                    match routines.get(name.as_str()) {
                        None => failure = Some(format!("`{}` calls unknown routine `{}`", owner, name)),
                        Some(arity) if *arity != args.len() => {
                            failure = Some(format!(
                                "`{}` calls `{}` with {} argument(s), expected {}",
                                owner,
                                name,
                                args.len(),
                                arity
                            ))
                        }
                        Some(_) => {}
                    }
                }
            });
            if let Some(message) = failure {
                bail!(message);
            }
        }
        Ok(())
    }
}

impl Compiler for ListingCompiler {
    fn compile_program(&self, target: ProgramTarget, routing: &RoutingStructure, config: &BuildConfig) -> Result<String> {
        self.check(routing)?;

        let mut out = String::new();
        writeln!(out, "#pragma version {}", config.program_version)?;
        writeln!(out, "// {} program of {}", target, routing.name)?;
        writeln!(
            out,
            "// assemble_constants={} scratch_slots={}",
            config.assemble_constants, config.optimize.scratch_slots
        )?;

        match target {
            ProgramTarget::Approval => render_approval(&mut out, routing)?,
            ProgramTarget::Clear => render_clear(&mut out, routing)?,
        }
        Ok(out)
    }
}

fn render_approval(out: &mut String, routing: &RoutingStructure) -> Result<()> {
    for bare in &routing.bare_calls {
        if bare.action == OnCompletionAction::ClearState {
            continue;
        }
        writeln!(
            out,
            "bare {} {} -> {}",
            bare.action,
            call_label(bare.call),
            bare.member
        )?;
        render_body(out, &bare.body, 1)?;
    }
    for method in &routing.methods {
        let actions: Vec<String> = method
            .config
            .iter()
            .filter(|(action, _)| *action != OnCompletionAction::ClearState)
            .map(|(action, call)| format!("{}={}", action, call_label(call)))
            .collect();
        if actions.is_empty() {
            continue;
        }
        writeln!(
            out,
            "method {} {} [{}] -> {}",
            method.selector,
            method.signature.signature(),
            actions.join(","),
            method.member
        )?;
        render_body(out, &method.body, 1)?;
    }
    writeln!(out, "reject")?;
    for routine in &routing.subroutines {
        writeln!(out, "sub {}({})", routine.name, routine.params.join(", "))?;
        render_body(out, &routine.body, 1)?;
        writeln!(out, "  retsub")?;
    }
    Ok(())
}

fn render_clear(out: &mut String, routing: &RoutingStructure) -> Result<()> {
    let mut routed = false;
    if let Some(bare) = routing
        .bare_calls
        .iter()
        .find(|b| b.action == OnCompletionAction::ClearState)
    {
        writeln!(out, "bare clear_state -> {}", bare.member)?;
        render_body(out, &bare.body, 1)?;
        routed = true;
    }
    for method in &routing.methods {
        if method.config.get(OnCompletionAction::ClearState) == CallConfig::Never {
            continue;
        }
        writeln!(out, "method {} {} -> {}", method.selector, method.signature.signature(), method.member)?;
        render_body(out, &method.body, 1)?;
        routed = true;
    }
    if !routed {
        writeln!(out, "approve")?;
    }
    Ok(())
}

fn call_label(call: CallConfig) -> &'static str {
    match call {
        CallConfig::Never => "never",
        CallConfig::Call => "call",
        CallConfig::Create => "create",
        CallConfig::All => "all",
    }
}

fn render_body(out: &mut String, body: &Expr, depth: usize) -> Result<()> {
    let indent = "  ".repeat(depth);
    match body {
        Expr::Seq(items) if items.is_empty() => writeln!(out, "{}nop", indent)?,
        Expr::Seq(items) => {
            for item in items {
                render_body(out, item, depth)?;
            }
        }
        other => writeln!(out, "{}{}", indent, render_expr(other))?,
    }
    Ok(())
}

fn render_expr(expr: &Expr) -> String {
    let r = |e: &Expr| render_expr(e);
    match expr {
        Expr::Int(n) => n.to_string(),
        Expr::Bytes(b) => format!("{:?}", b.display_string()),
        Expr::Seq(items) => {
            let parts: Vec<String> = items.iter().map(render_expr).collect();
            format!("seq({})", parts.join("; "))
        }
        Expr::Approve => "approve".to_string(),
        Expr::Reject => "reject".to_string(),
        Expr::Sender => "sender".to_string(),
        Expr::CurrentAppAddress => "current_app_address".to_string(),
        Expr::CurrentAppId => "current_app_id".to_string(),
        Expr::Arg(name) => format!("arg:{}", name),
        Expr::Output(v) => format!("output({})", r(v)),
        Expr::GlobalGet(k) => format!("global_get({})", r(k)),
        Expr::GlobalExists(k) => format!("global_exists({})", r(k)),
        Expr::GlobalPut { key, value } => format!("global_put({}, {})", r(key), r(value)),
        Expr::GlobalDel(k) => format!("global_del({})", r(k)),
        Expr::LocalGet { account, key } => format!("local_get({}, {})", r(account), r(key)),
        Expr::LocalExists { account, key } => format!("local_exists({}, {})", r(account), r(key)),
        Expr::LocalPut { account, key, value } => {
            format!("local_put({}, {}, {})", r(account), r(key), r(value))
        }
        Expr::LocalDel { account, key } => format!("local_del({}, {})", r(account), r(key)),
        Expr::Concat(a, b) => format!("concat({}, {})", r(a), r(b)),
        Expr::Itob(v) => format!("itob({})", r(v)),
        Expr::Add(a, b) => format!("add({}, {})", r(a), r(b)),
        Expr::Sub(a, b) => format!("sub({}, {})", r(a), r(b)),
        Expr::Not(v) => format!("not({})", r(v)),
        Expr::Assert(v) => format!("assert({})", r(v)),
        Expr::Call { name, args } => {
            let parts: Vec<String> = args.iter().map(render_expr).collect();
            format!("callsub {}({})", name, parts.join(", "))
        }
        Expr::Op { op, args } => {
            let parts: Vec<String> = args.iter().map(render_expr).collect();
            format!("{}({})", op, parts.join(", "))
        }
    }
}
