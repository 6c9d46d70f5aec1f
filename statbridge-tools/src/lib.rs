//! Function tools published by statbridge.
//!
//! Most tools proxy a single endpoint of the statistics backend through
//! [`HttpTool`]. Two are served locally: [`LocalKpmLogTool`] reads the KPM
//! log file directly when configured to, and [`PatchDatabaseFileTool`]
//! replays edit scripts against a [`LocalDocumentStore`].

pub mod catalog;
pub mod http_tool;
pub mod kpm_file;
pub mod names;
pub mod patch_tool;
pub mod store;

use std::sync::Arc;

use anyhow::Context;
use statbridge_client::BackendClient;
use statbridge_config::{BridgeConfig, KpmSource};
use statbridge_core::{Tool, ToolRegistry};
use tracing::{info, warn};

pub use http_tool::{HttpTool, HttpToolBuilder};
pub use kpm_file::LocalKpmLogTool;
pub use patch_tool::PatchDatabaseFileTool;
pub use store::{DocumentLock, DocumentStore, LocalDocumentStore, StoreError};

/// Register the full tool catalog for `config`. Returns how many tools are
/// enabled.
///
/// `patchDatabaseFile` is always registered so that calling it without a
/// database root reports it as unavailable rather than unknown.
pub async fn register_default_tools(
    registry: &ToolRegistry,
    config: &BridgeConfig,
) -> anyhow::Result<usize> {
    let client = BackendClient::from_config(&config.backend, registry.settings().clone())
        .context("failed to build backend client")?;

    let mut tools: Vec<Arc<dyn Tool>> = Vec::with_capacity(names::ALL.len());
    tools.push(kpm_tool(config, &client));
    tools.extend(
        catalog::backend_tools(&client)
            .into_iter()
            .map(|tool| Arc::new(tool) as Arc<dyn Tool>),
    );

    let mut enabled = 0;
    for tool in tools {
        if registry.register_enabled(tool).await {
            enabled += 1;
        }
    }

    let store = config
        .database
        .root
        .as_ref()
        .map(|root| Arc::new(LocalDocumentStore::new(root)) as Arc<dyn DocumentStore>);
    let patch_tool = PatchDatabaseFileTool::new(store);
    if patch_tool.should_register() {
        enabled += 1;
    }
    registry.register(Arc::new(patch_tool)).await;

    info!(enabled, "Registered default tools");
    Ok(enabled)
}

fn kpm_tool(config: &BridgeConfig, client: &BackendClient) -> Arc<dyn Tool> {
    match config.kpm.source {
        KpmSource::Backend => Arc::new(catalog::kpm_logs_tool(client)),
        KpmSource::File => match config.kpm.resolved_log_path() {
            Some(path) => Arc::new(LocalKpmLogTool::new(path)),
            None => {
                warn!("No home directory for the KPM log; falling back to the backend");
                Arc::new(catalog::kpm_logs_tool(client))
            }
        },
    }
}
