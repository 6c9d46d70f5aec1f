//! HTTP client for the statistics backend

use crate::error::{BackendError, BackendResult};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client as HttpClient, Method};
use serde_json::Value;
use statbridge_config::{BackendConfig, SharedSettings};
use std::time::Duration;
use tracing::{debug, trace};

/// How a response body is handed back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Raw body as a JSON string value
    Text,

    /// Body parsed as JSON; an empty body becomes `null`
    Json,
}

/// Client for the local statistics backend
///
/// The port is read from the shared settings on every request, so a settings
/// reload takes effect without rebuilding the client.
#[derive(Clone)]
pub struct BackendClient {
    /// HTTP client for requests
    http_client: HttpClient,

    /// Backend host name
    host: String,

    /// Settings providing the backend port
    settings: SharedSettings,

    /// Request timeout
    timeout: Duration,
}

/// Builder for the backend client
pub struct BackendClientBuilder {
    host: String,
    timeout: Duration,
    settings: SharedSettings,
}

impl BackendClientBuilder {
    /// Create a new builder
    pub fn new(settings: SharedSettings) -> Self {
        Self {
            host: "localhost".to_string(),
            timeout: Duration::from_secs(30),
            settings,
        }
    }

    /// Set backend host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client
    pub fn build(self) -> BackendResult<BackendClient> {
        if self.host.trim().is_empty() {
            return Err(BackendError::Config("backend host is empty".to_string()));
        }

        let http_client = HttpClient::builder().timeout(self.timeout).build()?;

        Ok(BackendClient {
            http_client,
            host: self.host,
            settings: self.settings,
            timeout: self.timeout,
        })
    }
}

impl BackendClient {
    /// Create a client from the `[backend]` config section
    pub fn from_config(config: &BackendConfig, settings: SharedSettings) -> BackendResult<Self> {
        BackendClientBuilder::new(settings)
            .with_host(config.host.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .build()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Base URL using the currently configured port
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.settings.api_port())
    }

    /// Send a request and decode the response
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        format: ResponseFormat,
    ) -> BackendResult<Value> {
        let url = format!("{}/{}", self.base_url(), path.trim_start_matches('/'));

        debug!(method = %method, url = %url, "Sending backend request");

        let mut request = self
            .http_client
            .request(method, &url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        trace!(
            status = %status,
            body_len = body.len(),
            "Received backend response"
        );

        match format {
            ResponseFormat::Text => Ok(Value::String(body)),
            ResponseFormat::Json if body.trim().is_empty() => Ok(Value::Null),
            ResponseFormat::Json => serde_json::from_str(&body).map_err(|e| {
                BackendError::Serialization(format!("Failed to parse response: {}: {}", e, body))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use statbridge_config::Settings;

    fn client_for(server: &mockito::Server) -> BackendClient {
        let port = server
            .host_with_port()
            .rsplit(':')
            .next()
            .and_then(|port| port.parse().ok())
            .unwrap();
        let settings = SharedSettings::new(Settings {
            api_port: port,
            refresh_interval: 60,
        });
        BackendClientBuilder::new(settings)
            .with_host("127.0.0.1")
            .build()
            .unwrap()
    }

    #[test]
    fn base_url_follows_settings() {
        let settings = SharedSettings::default();
        let client = BackendClientBuilder::new(settings.clone())
            .with_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.timeout(), Duration::from_secs(5));

        settings.update(|s| s.api_port = 8111).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8111");
    }

    #[test]
    fn empty_host_is_rejected() {
        let result = BackendClientBuilder::new(SharedSettings::default())
            .with_host(" ")
            .build();
        assert!(matches!(result, Err(BackendError::Config(_))));
    }

    #[tokio::test]
    async fn posts_json_body_and_parses_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/garmin/body-battery")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"start_date": "2024-03-01"})))
            .with_status(200)
            .with_body(r#"{"charged": 42}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let value = client
            .send(
                Method::POST,
                "/garmin/body-battery",
                Some(&json!({"start_date": "2024-03-01"})),
                ResponseFormat::Json,
            )
            .await
            .unwrap();

        assert_eq!(value, json!({"charged": 42}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn text_format_keeps_raw_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/read-logs")
            .with_status(200)
            .with_body("ts,keys\n1,40\n")
            .create_async()
            .await;

        let value = client_for(&server)
            .send(Method::POST, "/read-logs", None, ResponseFormat::Text)
            .await
            .unwrap();
        assert_eq!(value, json!("ts,keys\n1,40\n"));
    }

    #[tokio::test]
    async fn non_success_status_carries_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/database/get-index")
            .with_status(503)
            .with_body("garmin session expired")
            .create_async()
            .await;

        let err = client_for(&server)
            .send(Method::GET, "/database/get-index", None, ResponseFormat::Json)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "HTTP error! status: 503, message: garmin session expired"
        );
    }

    #[tokio::test]
    async fn malformed_json_is_serialization_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/garmin/steps")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let err = client_for(&server)
            .send(Method::POST, "/garmin/steps", None, ResponseFormat::Json)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Serialization(_)));
    }
}
