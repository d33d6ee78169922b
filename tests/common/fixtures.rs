//! Example applications shared by the integration tests.

use app_forge::forge_state::{ReservedStateValue, StateDecl, StateValue};
use app_forge::forge_types::{AbiType, Expr, LifecycleHook, ValueType};
use app_forge::{Application, ApplicationBuilder, Handler, ListingCompiler, MethodSpec};
use std::path::PathBuf;
use std::sync::Arc;

/// Path of the bundled state example manifest.
#[allow(dead_code)]
pub fn demo_manifest_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/state_example.json")
}

/// Declared and reserved state in both scopes, with setters and read-only
/// getters. Mirrors `demos/state_example.json`.
#[allow(dead_code)]
pub fn state_example_builder() -> ApplicationBuilder {
    ApplicationBuilder::new("StateExample")
        .state(
            "declared_app_value",
            StateDecl::shared(
                StateValue::bytes()
                    .static_value()
                    .with_default(Expr::bytes("A declared state value that is protected with the `static` flag")),
            ),
        )
        .state(
            "reserved_app_value",
            StateDecl::reserved_shared(ReservedStateValue::new(ValueType::Uint64, 63)),
        )
        .state(
            "declared_account_value",
            StateDecl::per_caller(StateValue::uint64().with_default(Expr::int(1))),
        )
        .state(
            "reserved_account_value",
            StateDecl::reserved_per_caller(ReservedStateValue::new(ValueType::Bytes, 8)),
        )
        .lifecycle(
            "create",
            LifecycleHook::Create,
            Handler::contextual(|ctx| ctx.initialize_shared_state()),
        )
        .lifecycle(
            "opt_in",
            LifecycleHook::OptIn,
            Handler::contextual(|ctx| ctx.initialize_per_caller_state(None)),
        )
        .external(
            "set_app_state_val",
            MethodSpec::new().arg("v", AbiType::String),
            Handler::contextual(|ctx| Ok(ctx.global("declared_app_value")?.set(ctx.arg("v")?))),
        )
        .external(
            "get_app_state_val",
            MethodSpec::new().returns(AbiType::String).read_only(),
            Handler::contextual(|ctx| Ok(ctx.output(ctx.global("declared_app_value")?.get()))),
        )
        .external(
            "set_reserved_app_state_val",
            MethodSpec::new().arg("k", AbiType::Uint8).arg("v", AbiType::Uint64),
            Handler::contextual(|ctx| {
                let cell = ctx.reserved_global("reserved_app_value", Expr::itob(ctx.arg("k")?))?;
                Ok(cell.set(ctx.arg("v")?))
            }),
        )
        .external(
            "get_account_state_val",
            MethodSpec::new().returns(AbiType::Uint64).read_only(),
            Handler::contextual(|ctx| Ok(ctx.output(ctx.local("declared_account_value")?.get()))),
        )
}

#[allow(dead_code)]
pub fn state_example() -> Application {
    state_example_builder()
        .build(Arc::new(ListingCompiler::new()))
        .expect("state example builds")
}
