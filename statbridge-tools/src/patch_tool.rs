//! `patchDatabaseFile`: replay an edit script against a stored document.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Value, json};
use statbridge_core::Tool;
use statbridge_core::patch::{self, PatchRequest};
use tracing::info;

use crate::names;
use crate::store::DocumentStore;

pub struct PatchDatabaseFileTool {
    store: Option<Arc<dyn DocumentStore>>,
}

impl PatchDatabaseFileTool {
    /// With no store the tool stays registered-but-disabled.
    pub fn new(store: Option<Arc<dyn DocumentStore>>) -> Self {
        Self { store }
    }

    fn request(args: &Value) -> anyhow::Result<PatchRequest> {
        let target_id = args["filename"]
            .as_str()
            .context("filename must be a string")?
            .to_string();
        let ops = patch::parse_ops(&args["diffContent"])?;
        let dry_run = args["dryRun"].as_bool().unwrap_or(false);
        Ok(PatchRequest {
            target_id,
            ops,
            dry_run,
        })
    }
}

#[async_trait]
impl Tool for PatchDatabaseFileTool {
    fn name(&self) -> &str {
        names::PATCH_DATABASE_FILE
    }

    fn display_name(&self) -> &str {
        "Patch Database File"
    }

    fn description(&self) -> &str {
        "Apply a diff-match-patch style edit script to a file in the database directory."
    }

    fn parameters(&self) -> Value {
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "description": "Apply an edit script to a database file",
            "properties": {
                "filename": {
                    "type": "string",
                    "description": "Name of the database file to patch (e.g. 'data.txt')"
                },
                "diffContent": {
                    "type": "array",
                    "description": "Array of diff tuples in format [[-1, \"text to remove\"], [1, \"text to add\"], [0, \"unchanged text\"]] where -1 indicates removal, 1 indicates addition, and 0 indicates unchanged text",
                    "items": {
                        "type": "array",
                        "prefixItems": [
                            { "type": "integer", "enum": [-1, 0, 1] },
                            { "type": "string" }
                        ],
                        "items": false,
                        "minItems": 2,
                        "maxItems": 2
                    }
                },
                "dryRun": {
                    "type": "boolean",
                    "description": "If true, shows what changes would be made without applying them",
                    "default": false
                }
            },
            "required": ["filename", "diffContent"]
        })
    }

    fn format_message(&self, args: &Value) -> String {
        let prefix = if args["dryRun"].as_bool().unwrap_or(false) {
            "Dry run: "
        } else {
            ""
        };
        format!(
            "{prefix}Patching database file: {}",
            args["filename"].as_str().unwrap_or_default()
        )
    }

    fn should_register(&self) -> bool {
        self.store.is_some()
    }

    fn error_context(&self) -> String {
        "patching database file".to_string()
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let store = self
            .store
            .as_ref()
            .context("no database root is configured")?;
        let request = Self::request(&args)?;

        // Dry runs never write, so they skip the per-document lock.
        let _guard = if request.dry_run {
            None
        } else {
            Some(store.lock(&request.target_id).await?)
        };

        let base = store.read(&request.target_id).await?;
        let mut result = request.apply_to(&base)?;
        if !request.dry_run {
            store
                .write(&request.target_id, &result.result_document)
                .await?;
            result = result.mark_applied();
            info!(filename = %request.target_id, ops = request.ops.len(), "Patched database file");
        }

        let mut output = json!({
            "filename": request.target_id,
            "dryRun": request.dry_run,
        });
        if let (Some(fields), Value::Object(result)) =
            (output.as_object_mut(), serde_json::to_value(&result)?)
        {
            fields.extend(result);
        }
        Ok(output)
    }
}
