//! Backend-proxied tools offered to the host.

use serde_json::{Value, json};
use statbridge_client::{BackendClient, Method, ResponseFormat};

use crate::http_tool::HttpTool;
use crate::names;

const DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";
const DATE_PATTERN: &str = "^\\d{4}-\\d{2}-\\d{2}$";

fn no_parameters(description: &str) -> Value {
    json!({
        "$schema": DRAFT_04,
        "type": "object",
        "description": description,
        "properties": {}
    })
}

fn date_range_parameters(description: &str) -> Value {
    json!({
        "$schema": DRAFT_04,
        "type": "object",
        "description": description,
        "properties": {
            "startDate": {
                "type": "string",
                "description": "Start date in YYYY-MM-DD format",
                "pattern": DATE_PATTERN
            },
            "endDate": {
                "type": "string",
                "description": "End date in YYYY-MM-DD format (optional)",
                "pattern": DATE_PATTERN
            }
        },
        "required": ["startDate"]
    })
}

fn date_range_message(prefix: &'static str) -> impl Fn(&Value) -> String + Send + Sync {
    move |args| {
        let start = args["startDate"].as_str().unwrap_or_default();
        match args["endDate"].as_str() {
            Some(end) if !end.is_empty() => format!("{prefix} from {start} to {end}"),
            _ => format!("{prefix} from {start}"),
        }
    }
}

/// Parameters shared by both `readKpmLogs` variants.
pub fn kpm_log_parameters() -> Value {
    json!({
        "$schema": DRAFT_04,
        "type": "object",
        "description": "Read the contents of the KPM logs file",
        "properties": {
            "maxLines": {
                "type": "integer",
                "description": "Maximum number of lines to read from the end of the file. Returns all lines if not specified."
            }
        }
    })
}

pub const KPM_LOG_DESCRIPTION: &str = "Read the contents of the KPM logs file (~/.kpm_log.csv). Use this when you need to access keyboard activity statistics.";

pub fn kpm_log_message(args: &Value) -> String {
    match args["maxLines"].as_i64() {
        Some(lines) if lines != 0 => format!("Reading KPM logs (last {lines} lines)"),
        _ => "Reading KPM logs".to_string(),
    }
}

/// `readKpmLogs` served by the backend's `/read-logs` endpoint.
pub fn kpm_logs_tool(client: &BackendClient) -> HttpTool {
    HttpTool::builder(names::READ_KPM_LOGS, "/read-logs")
        .display_name("Read KPM Logs")
        .description(KPM_LOG_DESCRIPTION)
        .parameters(kpm_log_parameters())
        .snake_case_body()
        .response_format(ResponseFormat::Text)
        .message(kpm_log_message)
        .error_context("reading KPM logs")
        .build(client.clone())
}

/// Garmin and database tools, all proxied to the backend.
pub fn backend_tools(client: &BackendClient) -> Vec<HttpTool> {
    vec![
        HttpTool::builder(names::GARMIN_USER_SUMMARY, "/garmin/user-summary")
            .display_name("Get Garmin User Summary")
            .description("Get today's activity summary from Garmin Connect")
            .parameters(no_parameters(
                "No parameters required - returns today's activity summary",
            ))
            .message(|_| "Fetching Garmin user summary".to_string())
            .error_context("fetching Garmin user summary")
            .build(client.clone()),
        HttpTool::builder(names::GARMIN_STEPS, "/garmin/steps")
            .display_name("Get Garmin Steps")
            .description("Get today's step data from Garmin Connect")
            .parameters(no_parameters("Get today's step data from Garmin Connect"))
            .message(|_| "Fetching Garmin steps data".to_string())
            .error_context("fetching Garmin steps data")
            .build(client.clone()),
        HttpTool::builder(names::GARMIN_HEART_RATE, "/garmin/heart-rate")
            .display_name("Get Garmin Heart Rate")
            .description("Get today's heart rate data from Garmin Connect")
            .parameters(no_parameters(
                "No parameters required - returns today's heart rate data",
            ))
            .message(|_| "Fetching Garmin heart rate data".to_string())
            .error_context("fetching Garmin heart rate data")
            .build(client.clone()),
        HttpTool::builder(names::GARMIN_SLEEP, "/garmin/sleep")
            .display_name("Get Garmin Sleep")
            .description(
                "Get today's sleep data from Garmin Connect (filtered to remove detailed metrics)",
            )
            .parameters(no_parameters(
                "No parameters required - returns today's sleep data",
            ))
            .message(|_| "Fetching Garmin sleep data".to_string())
            .error_context("fetching Garmin sleep data")
            .build(client.clone()),
        HttpTool::builder(names::GARMIN_BODY_BATTERY, "/garmin/body-battery")
            .display_name("Get Garmin Body Battery")
            .description("Get body battery data for a date range from Garmin Connect")
            .parameters(date_range_parameters(
                "Get body battery data for a date range from Garmin Connect",
            ))
            .snake_case_body()
            .message(date_range_message("Fetching Garmin body battery data"))
            .error_context("fetching Garmin body battery data")
            .build(client.clone()),
        HttpTool::builder(
            names::GARMIN_HEART_RATE_RANGE,
            "/garmin/heart-rate-within-date-range",
        )
        .display_name("Get Garmin Heart Rate Range")
        .description("Get heart rate data for a date range from Garmin Connect")
        .parameters(date_range_parameters(
            "Get heart rate data for a date range from Garmin Connect",
        ))
        .snake_case_body()
        .message(date_range_message("Fetching Garmin heart rate data"))
        .error_context("fetching Garmin heart rate range data")
        .build(client.clone()),
        HttpTool::builder(names::LIST_DATABASE_FILES, "/database/get-index")
            .display_name("List Database Files")
            .description(
                "List all files in the database directory so that you can find out what to access",
            )
            .parameters(no_parameters(
                "List all files in the database directory recursively",
            ))
            .method(Method::GET)
            .message(|_| "Listing database files".to_string())
            .error_context("listing database files")
            .build(client.clone()),
        HttpTool::builder(names::READ_DATABASE_FILE, "/database/read-file")
            .display_name("Read Database File")
            .description(
                "Read a file from the database directory. Use the 'list database files' function to get a list of available files.",
            )
            .parameters(json!({
                "$schema": DRAFT_04,
                "type": "object",
                "description": "Read contents of a specific database file. Use the \"list database files\" function to get a list of available files.",
                "properties": {
                    "filename": {
                        "type": "string",
                        "description": "Name of the file to read (must be within the database directory)"
                    }
                },
                "required": ["filename"]
            }))
            .snake_case_body()
            .response_format(ResponseFormat::Text)
            .message(|args| {
                format!(
                    "Reading database file: {}",
                    args["filename"].as_str().unwrap_or_default()
                )
            })
            .error_context("reading database file")
            .build(client.clone()),
        HttpTool::builder(names::CREATE_DATABASE_FILE, "/database/create-file")
            .display_name("Create Database File")
            .description(
                "Create a new file in the database directory. Can only create files within existing directories.",
            )
            .parameters(json!({
                "$schema": DRAFT_04,
                "type": "object",
                "description": "Create a new file in the database directory. Parent directory must exist.",
                "properties": {
                    "filename": {
                        "type": "string",
                        "description": "Name for the new file (must be within the database and parent directory must exist)"
                    },
                    "content": {
                        "type": "string",
                        "description": "Content to write to the file"
                    }
                },
                "required": ["filename", "content"]
            }))
            .snake_case_body()
            .message(|args| {
                format!(
                    "Creating database file: {}",
                    args["filename"].as_str().unwrap_or_default()
                )
            })
            .error_context("creating database file")
            .build(client.clone()),
    ]
}
