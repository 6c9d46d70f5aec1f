//! `readKpmLogs` served straight from the local log file.

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use statbridge_core::Tool;
use tokio::fs;
use tracing::trace;

use crate::catalog::{KPM_LOG_DESCRIPTION, kpm_log_message, kpm_log_parameters};
use crate::names;

pub struct LocalKpmLogTool {
    path: PathBuf,
}

impl LocalKpmLogTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Tool for LocalKpmLogTool {
    fn name(&self) -> &str {
        names::READ_KPM_LOGS
    }

    fn display_name(&self) -> &str {
        "Read KPM Logs"
    }

    fn description(&self) -> &str {
        KPM_LOG_DESCRIPTION
    }

    fn parameters(&self) -> Value {
        kpm_log_parameters()
    }

    fn format_message(&self, args: &Value) -> String {
        kpm_log_message(args)
    }

    fn error_context(&self) -> String {
        "reading KPM logs".to_string()
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;

        // Absent, zero or negative limits return the whole file.
        let limit = args["maxLines"]
            .as_i64()
            .filter(|lines| *lines > 0)
            .and_then(|lines| usize::try_from(lines).ok());
        trace!(path = %self.path.display(), ?limit, "Reading KPM log file");

        Ok(Value::String(tail_lines(&content, limit)))
    }
}

/// Last `limit` lines of `content`, joined with `\n`.
fn tail_lines(content: &str, limit: Option<usize>) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = limit.map_or(0, |limit| lines.len().saturating_sub(limit));
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use serde_json::json;

    #[test]
    fn tail_keeps_last_lines() {
        let content = "ts,kpm\n1,10\n2,20\n3,30\n";
        assert_eq!(tail_lines(content, Some(2)), "2,20\n3,30");
        assert_eq!(tail_lines(content, Some(100)), "ts,kpm\n1,10\n2,20\n3,30");
        assert_eq!(tail_lines(content, None), "ts,kpm\n1,10\n2,20\n3,30");
        assert_eq!(tail_lines("", Some(3)), "");
    }

    #[tokio::test]
    async fn reads_limited_tail_from_file() {
        let dir = TempDir::new().unwrap();
        let log = dir.child("kpm_log.csv");
        log.write_str("ts,kpm\n1,10\n2,20\n").unwrap();

        let tool = LocalKpmLogTool::new(log.path());
        assert_eq!(
            tool.execute(json!({"maxLines": 1})).await.unwrap(),
            json!("2,20")
        );
        assert_eq!(
            tool.execute(json!({"maxLines": -4})).await.unwrap(),
            json!("ts,kpm\n1,10\n2,20")
        );
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let tool = LocalKpmLogTool::new(dir.path().join("absent.csv"));
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(err.to_string().contains("absent.csv"), "{err}");
    }
}
