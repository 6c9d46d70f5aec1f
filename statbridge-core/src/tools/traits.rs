//! Core trait implemented by every function tool

use async_trait::async_trait;
use serde_json::Value;

/// A function tool the host's model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique registry key, e.g. `getGarminSteps`.
    fn name(&self) -> &str;

    /// Human readable label shown by the host.
    fn display_name(&self) -> &str {
        self.name()
    }

    fn description(&self) -> &str;

    /// JSON-Schema object describing the accepted arguments.
    fn parameters(&self) -> Value;

    /// Status line shown while the tool runs.
    fn format_message(&self, _args: &Value) -> String {
        format!("Running {}", self.name())
    }

    /// Whether the tool is currently enabled. Checked at startup and again on
    /// every dispatch.
    fn should_register(&self) -> bool {
        true
    }

    /// Phrase describing what failed, used as `Error {context}: {message}`.
    fn error_context(&self) -> String {
        format!("running {}", self.name())
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value>;
}
