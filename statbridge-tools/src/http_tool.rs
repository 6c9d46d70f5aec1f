//! Generic tool that proxies a call to one backend endpoint.
//!
//! Every backend tool differs only in endpoint, argument mapping and wording,
//! so they are all instances of [`HttpTool`] built through
//! [`HttpToolBuilder`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use statbridge_client::{BackendClient, Method, ResponseFormat};
use statbridge_core::Tool;
use tracing::trace;

/// Turns tool arguments into the request body; `None` sends no body.
pub type RequestMapper = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Post-processes a decoded response.
pub type ResponseMapper = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Renders the in-progress status line.
pub type MessageFormatter = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Tool backed by a single backend endpoint
pub struct HttpTool {
    name: String,
    display_name: String,
    description: String,
    parameters: Value,
    method: Method,
    path: String,
    format: ResponseFormat,
    request: RequestMapper,
    response: ResponseMapper,
    message: MessageFormatter,
    error_context: String,
    client: BackendClient,
}

impl HttpTool {
    /// Start building a tool that POSTs to `path` with no body and parses
    /// the response as JSON.
    pub fn builder(name: impl Into<String>, path: impl Into<String>) -> HttpToolBuilder {
        HttpToolBuilder::new(name.into(), path.into())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Request body this tool would send for `args`.
    pub fn request_body(&self, args: &Value) -> Option<Value> {
        (self.request)(args)
    }
}

#[async_trait]
impl Tool for HttpTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    fn format_message(&self, args: &Value) -> String {
        (self.message)(args)
    }

    fn error_context(&self) -> String {
        self.error_context.clone()
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let body = (self.request)(&args);
        trace!(tool = %self.name, path = %self.path, has_body = body.is_some(), "Proxying tool call");

        let value = self
            .client
            .send(self.method.clone(), &self.path, body.as_ref(), self.format)
            .await?;
        Ok((self.response)(value))
    }
}

/// Builder for [`HttpTool`]
pub struct HttpToolBuilder {
    name: String,
    display_name: Option<String>,
    description: String,
    parameters: Value,
    method: Method,
    path: String,
    format: ResponseFormat,
    request: RequestMapper,
    response: ResponseMapper,
    message: Option<MessageFormatter>,
    error_context: Option<String>,
}

impl HttpToolBuilder {
    fn new(name: String, path: String) -> Self {
        Self {
            name,
            display_name: None,
            description: String::new(),
            parameters: json!({"type": "object", "properties": {}}),
            method: Method::POST,
            path,
            format: ResponseFormat::Json,
            request: Arc::new(|_| None),
            response: Arc::new(|value| value),
            message: None,
            error_context: None,
        }
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    pub fn request<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.request = Arc::new(mapper);
        self
    }

    /// Send the arguments as the body with camelCase keys renamed to
    /// snake_case.
    pub fn snake_case_body(self) -> Self {
        self.request(|args| Some(snake_case_fields(args)))
    }

    pub fn response<F>(mut self, mapper: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.response = Arc::new(mapper);
        self
    }

    pub fn message<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.message = Some(Arc::new(formatter));
        self
    }

    /// Phrase completing `Error {context}: ...`, e.g. `fetching Garmin steps data`.
    pub fn error_context(mut self, context: impl Into<String>) -> Self {
        self.error_context = Some(context.into());
        self
    }

    pub fn build(self, client: BackendClient) -> HttpTool {
        let running = format!("Running {}", self.name);
        HttpTool {
            display_name: self.display_name.unwrap_or_else(|| self.name.clone()),
            error_context: self
                .error_context
                .unwrap_or_else(|| format!("calling {}", self.name)),
            message: self
                .message
                .unwrap_or_else(|| Arc::new(move |_| running.clone())),
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            method: self.method,
            path: self.path,
            format: self.format,
            request: self.request,
            response: self.response,
            client,
        }
    }
}

/// Copy the top-level fields of `args` with camelCase keys renamed to
/// snake_case. Null fields are dropped, matching how an absent optional
/// argument is omitted from the request.
pub fn snake_case_fields(args: &Value) -> Value {
    let Some(fields) = args.as_object() else {
        return Value::Object(Map::new());
    };

    let renamed = fields
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (to_snake_case(key), value.clone()))
        .collect();
    Value::Object(renamed)
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
