//! Writing built applications to disk.

mod common;

use app_forge::exporter::{APPLICATION_FILE, APPROVAL_FILE, CLEAR_FILE, CONTRACT_FILE};
use app_forge::{
    ApplicationBuilder, ApplicationSpec, ArtifactStore, ErrorClass, ExportBundle, ListingCompiler,
    ProgramSource, SubArtifact,
};
use common::*;
use std::cell::RefCell;
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Default)]
struct MemoryStore {
    bundles: RefCell<Vec<ExportBundle>>,
}

impl ArtifactStore for MemoryStore {
    fn store(&self, bundle: &ExportBundle) -> anyhow::Result<()> {
        self.bundles.borrow_mut().push(bundle.clone());
        Ok(())
    }
}

#[test]
fn test_dump_writes_four_files() {
    let mut app = state_example();
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("nested/out");

    let bundle = assert_ok(app.dump(&out, None), "dump");

    for name in [APPROVAL_FILE, CLEAR_FILE, CONTRACT_FILE, APPLICATION_FILE] {
        assert!(out.join(name).exists(), "{} missing", name);
    }
    let approval = std::fs::read_to_string(out.join(APPROVAL_FILE)).unwrap();
    assert_eq!(approval, bundle.approval);
    assert_eq!(Some(approval.as_str()), app.approval_program());

    let spec: ApplicationSpec =
        serde_json::from_str(&std::fs::read_to_string(out.join(APPLICATION_FILE)).unwrap()).unwrap();
    assert_eq!(spec, app.application_spec().unwrap());
    assert_eq!(spec.source.decode_approval().unwrap(), approval);

    let contract: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join(CONTRACT_FILE)).unwrap()).unwrap();
    assert_eq!(contract["name"], "StateExample");
}

#[test]
fn test_application_document_keys() {
    let mut app = state_example();
    let temp_dir = TempDir::new().unwrap();
    assert_ok(app.dump(temp_dir.path(), None), "dump");

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(temp_dir.path().join(APPLICATION_FILE)).unwrap())
            .unwrap();
    let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
    for key in ["hints", "source", "schema", "contract"] {
        assert!(keys.contains(&key), "missing {}", key);
    }
    assert_eq!(doc["hints"]["get_app_state_val"]["read_only"], true);
    assert!(doc["hints"].get("set_app_state_val").is_none());
    assert_eq!(doc["schema"]["global"]["declared_app_value"]["static"], true);
    assert_eq!(doc["schema"]["local"]["reserved_account_value"]["max_keys"], 8);
}

#[test]
fn test_dump_is_repeatable() {
    let mut app = state_example();
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let a = assert_ok(app.dump(first.path(), None), "first dump");
    let b = assert_ok(app.dump(second.path(), None), "second dump");
    assert_eq!(a, b);
}

#[test]
fn test_dump_with_pending_needs_connection() {
    let mut app = assert_ok(
        ApplicationBuilder::new("Host")
            .sub_artifact(
                "lsig",
                SubArtifact::logic_signature(ProgramSource::Pending {
                    source: "int 1".to_string(),
                }),
            )
            .build(Arc::new(ListingCompiler::new())),
        "build",
    );
    let temp_dir = TempDir::new().unwrap();

    let err = assert_err(app.dump(temp_dir.path(), None), "dump without connection");
    let forge = assert_forge_error(&err, ErrorClass::Resolution, "missing connection");
    assert!(forge.class().is_retryable());
    assert_error_contains(&err, "missing compiler connection", "missing connection");
    assert!(!temp_dir.path().join(APPROVAL_FILE).exists());

    let connection = CountingConnection::new();
    assert_ok(app.dump(temp_dir.path(), Some(&connection)), "dump with connection");
    assert!(temp_dir.path().join(APPROVAL_FILE).exists());
}

#[test]
fn test_failed_dump_writes_nothing() {
    let mut app = state_example();
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    std::fs::create_dir_all(out.join(APPLICATION_FILE)).unwrap();
    std::fs::write(out.join(APPLICATION_FILE).join("keep"), "x").unwrap();

    assert_err(app.dump(&out, None), "dump over a blocked application.json");

    for name in [APPROVAL_FILE, CLEAR_FILE, CONTRACT_FILE] {
        assert!(!out.join(name).exists(), "{} should not be written", name);
    }
    let stray: Vec<_> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".tmp"))
        .collect();
    assert!(stray.is_empty(), "staged files left behind: {:?}", stray);
    assert!(out.join(APPLICATION_FILE).join("keep").exists());
}

#[test]
fn test_export_to_custom_store() {
    let mut app = state_example();
    let store = MemoryStore::default();
    let bundle = assert_ok(app.export_to(&store, None), "export");
    let stored = store.bundles.borrow();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], bundle);
    assert_eq!(bundle.files().len(), 4);
}
