//! Canonical tool names as published to the host.

pub const READ_KPM_LOGS: &str = "readKpmLogs";
pub const GARMIN_USER_SUMMARY: &str = "getGarminUserSummary";
pub const GARMIN_STEPS: &str = "getGarminSteps";
pub const GARMIN_HEART_RATE: &str = "getGarminHeartRate";
pub const GARMIN_SLEEP: &str = "getGarminSleep";
pub const GARMIN_BODY_BATTERY: &str = "getGarminBodyBattery";
pub const GARMIN_HEART_RATE_RANGE: &str = "getGarminHeartRateRange";
pub const LIST_DATABASE_FILES: &str = "listDatabaseFiles";
pub const READ_DATABASE_FILE: &str = "readDatabaseFile";
pub const CREATE_DATABASE_FILE: &str = "createDatabaseFile";
pub const PATCH_DATABASE_FILE: &str = "patchDatabaseFile";

/// Every tool name, in registration order.
pub const ALL: &[&str] = &[
    READ_KPM_LOGS,
    GARMIN_USER_SUMMARY,
    GARMIN_STEPS,
    GARMIN_HEART_RATE,
    GARMIN_SLEEP,
    GARMIN_BODY_BATTERY,
    GARMIN_HEART_RATE_RANGE,
    LIST_DATABASE_FILES,
    READ_DATABASE_FILE,
    CREATE_DATABASE_FILE,
    PATCH_DATABASE_FILE,
];
