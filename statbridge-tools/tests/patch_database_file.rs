use std::fs;
use std::sync::Arc;

use serde_json::{Value, json};
use statbridge_config::{BridgeConfig, SharedSettings};
use statbridge_core::{DispatchError, ToolRegistry};
use statbridge_tools::{
    DocumentStore, LocalDocumentStore, PatchDatabaseFileTool, names, register_default_tools,
};
use tempfile::{TempDir, tempdir};

async fn registry_with_root() -> (ToolRegistry, TempDir) {
    let dir = tempdir().unwrap();
    let mut config = BridgeConfig::default();
    config.database.root = Some(dir.path().to_path_buf());

    let registry = ToolRegistry::new(SharedSettings::default());
    let enabled = register_default_tools(&registry, &config).await.unwrap();
    assert_eq!(enabled, names::ALL.len());
    (registry, dir)
}

fn foo_bar_to_baz(dry_run: bool) -> Value {
    json!({
        "filename": "doc.txt",
        "diffContent": [[0, "foo "], [-1, "bar"], [1, "baz"]],
        "dryRun": dry_run
    })
}

#[tokio::test]
async fn dry_run_previews_without_writing() {
    let (registry, dir) = registry_with_root().await;
    fs::write(dir.path().join("doc.txt"), "foo bar").unwrap();

    let value = registry
        .dispatch(names::PATCH_DATABASE_FILE, foo_bar_to_baz(true))
        .await
        .unwrap();

    assert_eq!(value["applied"], json!(false));
    assert_eq!(value["dryRun"], json!(true));
    assert_eq!(value["resultDocument"], json!("foo baz"));
    assert_eq!(
        value["preview"],
        json!([
            {"kind": 0, "text": "foo ", "contextOffset": 0},
            {"kind": -1, "text": "bar", "contextOffset": 4},
            {"kind": 1, "text": "baz", "contextOffset": 7}
        ])
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("doc.txt")).unwrap(),
        "foo bar"
    );
}

#[tokio::test]
async fn real_run_persists_result() {
    let (registry, dir) = registry_with_root().await;
    fs::write(dir.path().join("doc.txt"), "foo bar").unwrap();

    let value = registry
        .dispatch(names::PATCH_DATABASE_FILE, foo_bar_to_baz(false))
        .await
        .unwrap();

    assert_eq!(value["applied"], json!(true));
    assert_eq!(value["filename"], json!("doc.txt"));
    assert!(value.get("preview").is_none());
    assert_eq!(
        fs::read_to_string(dir.path().join("doc.txt")).unwrap(),
        "foo baz"
    );
}

#[tokio::test]
async fn mismatch_leaves_document_untouched() {
    let (registry, dir) = registry_with_root().await;
    fs::write(dir.path().join("doc.txt"), "hellx").unwrap();

    let value = registry
        .dispatch_text(
            names::PATCH_DATABASE_FILE,
            json!({"filename": "doc.txt", "diffContent": [[0, "hello"]]}),
        )
        .await;

    let text = value.as_str().unwrap();
    assert!(text.starts_with("Error patching database file: "), "{text}");
    assert!(text.contains("does not match"), "{text}");
    assert_eq!(
        fs::read_to_string(dir.path().join("doc.txt")).unwrap(),
        "hellx"
    );
}

#[tokio::test]
async fn traversal_is_rejected() {
    let (registry, _dir) = registry_with_root().await;

    let err = registry
        .dispatch(
            names::PATCH_DATABASE_FILE,
            json!({"filename": "../outside.txt", "diffContent": [[1, "x"]]}),
        )
        .await
        .unwrap_err();
    match err {
        DispatchError::Action { message, .. } => {
            assert!(message.contains("invalid document path"), "{message}")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn bad_op_kind_fails_schema_validation() {
    let (registry, dir) = registry_with_root().await;
    fs::write(dir.path().join("doc.txt"), "x").unwrap();

    let err = registry
        .dispatch(
            names::PATCH_DATABASE_FILE,
            json!({"filename": "doc.txt", "diffContent": [[2, "x"]]}),
        )
        .await
        .unwrap_err();
    match err {
        DispatchError::InvalidArguments { path, .. } => assert_eq!(path, "/diffContent/0/0"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_appends_are_serialized() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("log.txt"), "").unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(LocalDocumentStore::new(dir.path()));

    let registry = ToolRegistry::new(SharedSettings::default());
    registry
        .register(Arc::new(PatchDatabaseFileTool::new(Some(store.clone()))))
        .await;

    // Each append is built against the document it expects to find, so
    // every task retries until it sees its predecessor's write.
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let registry = registry.clone();
            let store = store.clone();
            tokio::spawn(async move {
                loop {
                    let current = store.read("log.txt").await.unwrap();
                    if current.len() != n {
                        tokio::task::yield_now().await;
                        continue;
                    }
                    let ops = if current.is_empty() {
                        json!([[1, n.to_string()]])
                    } else {
                        json!([[0, current], [1, n.to_string()]])
                    };
                    registry
                        .dispatch(
                            names::PATCH_DATABASE_FILE,
                            json!({"filename": "log.txt", "diffContent": ops}),
                        )
                        .await
                        .unwrap();
                    break;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(store.read("log.txt").await.unwrap(), "0123");
}
