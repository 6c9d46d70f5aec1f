//! Tool registry and dispatch

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use statbridge_config::{ConfigError, Settings, SharedSettings};
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};

use super::error::DispatchError;
use super::schema::ArgumentValidator;
use super::traits::Tool;

/// Published description of a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Clone)]
struct RegisteredTool {
    tool: Arc<dyn Tool>,
    /// `None` when the tool's schema failed to compile.
    validator: Option<Arc<ArgumentValidator>>,
}

/// Name-keyed set of tools plus the settings they run against.
///
/// Cloning is cheap and clones share the same tools.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, RegisteredTool>>>,
    settings: SharedSettings,
}

impl ToolRegistry {
    pub fn new(settings: SharedSettings) -> Self {
        Self {
            tools: Arc::new(RwLock::new(HashMap::new())),
            settings,
        }
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Re-read settings from their backing store.
    pub fn reload(&self) -> Result<Settings, ConfigError> {
        let settings = self.settings.reload()?;
        info!(
            api_port = settings.api_port,
            refresh_interval = settings.refresh_interval,
            "Tool settings reloaded"
        );
        Ok(settings)
    }

    /// Register a tool, replacing any tool with the same name.
    pub async fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        let validator = match ArgumentValidator::compile(&tool.parameters()) {
            Ok(validator) => Some(Arc::new(validator)),
            Err(error) => {
                warn!(
                    tool = %name,
                    error = %error,
                    "Parameter schema does not compile; arguments will not be validated"
                );
                None
            }
        };

        let previous = self
            .tools
            .write()
            .await
            .insert(name.clone(), RegisteredTool { tool, validator });
        if previous.is_some() {
            debug!(tool = %name, "Replaced previously registered tool");
        } else {
            trace!(tool = %name, "Registered tool");
        }
    }

    /// Register `tool` only if it currently wants to be registered.
    pub async fn register_enabled(&self, tool: Arc<dyn Tool>) -> bool {
        if !tool.should_register() {
            debug!(tool = tool.name(), "Tool disabled; skipping registration");
            return false;
        }
        self.register(tool).await;
        true
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.tools.read().await.contains_key(name)
    }

    pub async fn count(&self) -> usize {
        self.tools.read().await.len()
    }

    /// Definitions of the currently enabled tools, sorted by name.
    pub async fn definitions(&self) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        let mut definitions: Vec<ToolDefinition> = tools
            .values()
            .filter(|entry| entry.tool.should_register())
            .map(|entry| ToolDefinition {
                name: entry.tool.name().to_string(),
                display_name: entry.tool.display_name().to_string(),
                description: entry.tool.description().to_string(),
                parameters: entry.tool.parameters(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Progress line for a pending call. Never fails: an unknown tool or a
    /// panicking formatter yields `Running {name}`.
    pub async fn format_message(&self, name: &str, args: &Value) -> String {
        let fallback = || format!("Running {name}");
        let Some(entry) = self.lookup(name).await else {
            return fallback();
        };
        let args = normalize_args(args.clone());
        std::panic::catch_unwind(AssertUnwindSafe(|| entry.tool.format_message(&args)))
            .unwrap_or_else(|_| fallback())
    }

    /// Validate `args` and run the named tool.
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<Value, DispatchError> {
        self.dispatch_with_progress(name, args, |_| {}).await
    }

    /// Like [`dispatch`](Self::dispatch), calling `on_progress` with the
    /// tool's status line right before the action starts.
    pub async fn dispatch_with_progress<F>(
        &self,
        name: &str,
        args: Value,
        on_progress: F,
    ) -> Result<Value, DispatchError>
    where
        F: FnOnce(&str) + Send,
    {
        let entry = self
            .lookup(name)
            .await
            .ok_or_else(|| DispatchError::NotFound {
                name: name.to_string(),
            })?;

        if !entry.tool.should_register() {
            return Err(DispatchError::Unavailable {
                name: name.to_string(),
            });
        }

        let args = normalize_args(args);
        if let Some(validator) = &entry.validator {
            validator
                .check(&args)
                .map_err(|violation| DispatchError::InvalidArguments {
                    tool: name.to_string(),
                    path: violation.path,
                    message: violation.message,
                })?;
        }

        let message = std::panic::catch_unwind(AssertUnwindSafe(|| {
            entry.tool.format_message(&args)
        }))
        .unwrap_or_else(|_| format!("Running {name}"));
        on_progress(&message);
        debug!(tool = name, status = %message, "Executing tool");

        let outcome = AssertUnwindSafe(entry.tool.execute(args))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(value)) => {
                trace!(tool = name, "Tool succeeded");
                return Ok(value);
            }
            Ok(Err(error)) => format!("{error:#}"),
            Err(payload) => format!("tool panicked: {}", panic_message(payload.as_ref())),
        };

        warn!(tool = name, error = %failure, "Tool failed");
        Err(DispatchError::Action {
            tool: name.to_string(),
            context: entry.tool.error_context(),
            message: failure,
        })
    }

    /// Host-facing dispatch: failures come back as their rendered message
    /// instead of an error.
    pub async fn dispatch_text(&self, name: &str, args: Value) -> Value {
        match self.dispatch(name, args).await {
            Ok(value) => value,
            Err(error) => Value::String(error.to_string()),
        }
    }

    async fn lookup(&self, name: &str) -> Option<RegisteredTool> {
        self.tools.read().await.get(name).cloned()
    }
}

/// Hosts send `null` for tools without parameters.
fn normalize_args(args: Value) -> Value {
    match args {
        Value::Null => Value::Object(Map::new()),
        other => other,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use statbridge_config::SettingsStore;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct EchoTool {
        calls: AtomicUsize,
        enabled: AtomicBool,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                enabled: AtomicBool::new(true),
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the text argument"
        }

        fn parameters(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            })
        }

        fn format_message(&self, args: &Value) -> String {
            format!("Echoing {}", args["text"].as_str().unwrap_or_default())
        }

        fn should_register(&self) -> bool {
            self.enabled.load(Ordering::SeqCst)
        }

        async fn execute(&self, args: Value) -> anyhow::Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(args["text"].clone())
        }
    }

    struct PanickyFormatter;

    #[async_trait]
    impl Tool for PanickyFormatter {
        fn name(&self) -> &str {
            "panicky"
        }

        fn description(&self) -> &str {
            "Formatter panics"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        fn format_message(&self, _args: &Value) -> String {
            panic!("formatter exploded")
        }

        async fn execute(&self, _args: Value) -> anyhow::Result<Value> {
            Ok(json!("ok"))
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new(SharedSettings::new(Settings::default()))
    }

    #[tokio::test]
    async fn dispatch_returns_action_result() {
        let registry = registry();
        registry.register(Arc::new(EchoTool::new())).await;

        let value = registry
            .dispatch("echo", json!({"text": "hi"}))
            .await
            .unwrap();
        assert_eq!(value, json!("hi"));
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let err = registry().dispatch("missing", json!({})).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::NotFound {
                name: "missing".to_string()
            }
        );
    }

    #[tokio::test]
    async fn disabled_tool_is_unavailable_and_not_run() {
        let registry = registry();
        let tool = Arc::new(EchoTool::new());
        registry.register(tool.clone()).await;
        tool.enabled.store(false, Ordering::SeqCst);

        let err = registry
            .dispatch("echo", json!({"text": "hi"}))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Unavailable { .. }));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
        assert!(registry.definitions().await.is_empty());
        assert!(registry.contains("echo").await);
    }

    #[tokio::test]
    async fn register_enabled_skips_disabled_tools() {
        let registry = registry();
        let tool = EchoTool::new();
        tool.enabled.store(false, Ordering::SeqCst);

        assert!(!registry.register_enabled(Arc::new(tool)).await);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn missing_argument_never_reaches_action() {
        let registry = registry();
        let tool = Arc::new(EchoTool::new());
        registry.register(tool.clone()).await;

        let err = registry.dispatch("echo", json!({})).await.unwrap_err();
        match err {
            DispatchError::InvalidArguments { path, .. } => assert_eq!(path, "/text"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reregistration_overwrites() {
        let registry = registry();
        registry.register(Arc::new(EchoTool::new())).await;
        registry.register(Arc::new(EchoTool::new())).await;
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn format_message_degrades_gracefully() {
        let registry = registry();
        registry.register(Arc::new(EchoTool::new())).await;
        registry.register(Arc::new(PanickyFormatter)).await;

        assert_eq!(
            registry.format_message("echo", &json!({"text": "x"})).await,
            "Echoing x"
        );
        assert_eq!(
            registry.format_message("panicky", &json!({})).await,
            "Running panicky"
        );
        assert_eq!(
            registry.format_message("nope", &json!({})).await,
            "Running nope"
        );
    }

    #[tokio::test]
    async fn reload_picks_up_settings_written_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = SharedSettings::with_store(SettingsStore::new(&path)).unwrap();
        let registry = ToolRegistry::new(settings);
        assert_eq!(registry.settings().api_port(), 8000);

        SettingsStore::new(&path)
            .save(&Settings {
                api_port: 8421,
                refresh_interval: 30,
            })
            .unwrap();
        assert_eq!(registry.settings().api_port(), 8000);

        let reloaded = registry.reload().unwrap();
        assert_eq!(reloaded.api_port, 8421);
        assert_eq!(registry.settings().api_port(), 8421);
        assert_eq!(registry.settings().get().refresh_interval, 30);
    }

    #[tokio::test]
    async fn progress_is_reported_before_execution() {
        let registry = registry();
        registry.register(Arc::new(EchoTool::new())).await;

        let mut seen = None;
        registry
            .dispatch_with_progress("echo", json!({"text": "yo"}), |message| {
                seen = Some(message.to_string());
            })
            .await
            .unwrap();
        assert_eq!(seen.as_deref(), Some("Echoing yo"));
    }

    #[tokio::test]
    async fn null_arguments_are_treated_as_empty_object() {
        let registry = registry();
        registry.register(Arc::new(PanickyFormatter)).await;
        let value = registry.dispatch("panicky", Value::Null).await.unwrap();
        assert_eq!(value, json!("ok"));
    }
}
