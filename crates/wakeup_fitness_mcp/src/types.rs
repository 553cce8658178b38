//! Parameter and result shapes shared by the MCP tools and the HTTP routes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct RangeParams {
    /// Window start (YYYY-MM-DD or RFC 3339). Defaults to the trailing window before `end`.
    pub start: Option<String>,
    /// Window end (YYYY-MM-DD or RFC 3339). Defaults to now.
    pub end: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct DaysParams {
    /// Number of trailing days, at least 1. Defaults to the configured window (7).
    pub days: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AccessResult {
    pub has_session: bool,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct StepsTotalResult {
    pub start: String,
    pub end: String,
    pub total_steps: u64,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SleepTotalResult {
    pub start: String,
    pub end: String,
    pub total_sleep_hours: f64,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct StepsAverageResult {
    pub days: u32,
    pub average_daily_steps: u64,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SleepAverageResult {
    pub days: u32,
    pub average_sleep_hours: f64,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SummaryResult {
    pub start: String,
    pub end: String,
    pub days: u32,
    pub total_steps: u64,
    pub average_daily_steps: u64,
    pub total_sleep_hours: f64,
    pub average_sleep_hours: f64,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct WeeklyReviewParams {
    /// Number of trailing days to review. Defaults to 7.
    pub days: Option<u32>,
}
