use std::sync::Arc;

use rmcp::Json;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{GetPromptRequestParams, GetPromptResult, ListPromptsResult, PaginatedRequestParams};
use rmcp::service::RequestContext;
use rmcp::RoleServer;
use rmcp::{prompt, prompt_handler, prompt_router, tool, tool_handler, tool_router};

use wakeup_fitness_client::HealthDataSource;

pub mod error;
pub mod http;
pub mod middleware;
mod prompts;
pub mod queries;
pub mod services;
mod test_utils;
pub mod types;

pub use error::{McpError, McpResult};
pub use middleware::LoggingSource;
pub use services::FitnessService;

use types::{
    AccessResult, DaysParams, RangeParams, SleepAverageResult, SleepTotalResult,
    StepsAverageResult, StepsTotalResult, SummaryResult, WeeklyReviewParams,
};

/// Directives appended to every filter to keep rmcp internals quiet.
pub const QUIET_RMCP: &str = "rmcp=warn,serve_inner=warn";

/// Log filter for the binaries: `level` (`WAKEUP_FITNESS_LOG_LEVEL`), else
/// `rust_log` (`RUST_LOG`), else `info`, with [`QUIET_RMCP`] appended.
///
/// An unparsable filter falls back to `info`.
pub fn log_filter(level: Option<String>, rust_log: Option<String>) -> String {
    let base = [level, rust_log]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "info".to_string());
    let combined = format!("{base},{QUIET_RMCP}");
    match tracing_subscriber::EnvFilter::try_new(&combined) {
        Ok(_) => combined,
        Err(_) => format!("info,{QUIET_RMCP}"),
    }
}

#[derive(Clone)]
pub struct WakeupFitnessHandler {
    service: FitnessService,
    tool_router: rmcp::handler::server::tool::ToolRouter<WakeupFitnessHandler>,
    prompt_router: rmcp::handler::server::router::prompt::PromptRouter<WakeupFitnessHandler>,
}

impl WakeupFitnessHandler {
    /// Handler over `source` with the default seven-day window.
    pub fn from_source(source: Arc<dyn HealthDataSource>) -> Self {
        Self::new(FitnessService::new(source))
    }

    pub fn service(&self) -> &FitnessService {
        &self.service
    }
}

#[tool_router]
#[prompt_router]
impl WakeupFitnessHandler {
    pub fn new(service: FitnessService) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    pub fn tool_count(&self) -> usize {
        self.tool_router.list_all().len()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompt_router.list_all().len()
    }

    #[tool(
        name = "check_fitness_access",
        description = "Report whether an authenticated health-data session is available"
    )]
    async fn check_fitness_access(&self) -> Result<Json<AccessResult>, String> {
        Ok(Json(self.service.access()))
    }

    #[tool(
        name = "get_total_steps",
        description = "Total steps between start and end (defaults to the trailing 7 days)"
    )]
    async fn get_total_steps(
        &self,
        params: Parameters<RangeParams>,
    ) -> Result<Json<StepsTotalResult>, String> {
        Ok(Json(self.service.total_steps(&params.0).await?))
    }

    #[tool(
        name = "get_total_sleep_hours",
        description = "Hours spent asleep between start and end; awake and out-of-bed time is excluded"
    )]
    async fn get_total_sleep_hours(
        &self,
        params: Parameters<RangeParams>,
    ) -> Result<Json<SleepTotalResult>, String> {
        Ok(Json(self.service.total_sleep_hours(&params.0).await?))
    }

    #[tool(
        name = "get_average_daily_steps",
        description = "Average steps per day over the trailing window, rounded down"
    )]
    async fn get_average_daily_steps(
        &self,
        params: Parameters<DaysParams>,
    ) -> Result<Json<StepsAverageResult>, String> {
        Ok(Json(self.service.average_daily_steps(&params.0).await?))
    }

    #[tool(
        name = "get_average_sleep_hours",
        description = "Average hours asleep per day over the trailing window"
    )]
    async fn get_average_sleep_hours(
        &self,
        params: Parameters<DaysParams>,
    ) -> Result<Json<SleepAverageResult>, String> {
        Ok(Json(self.service.average_sleep_hours(&params.0).await?))
    }

    #[tool(
        name = "get_activity_summary",
        description = "Step and sleep totals with daily averages for the trailing window"
    )]
    async fn get_activity_summary(
        &self,
        params: Parameters<DaysParams>,
    ) -> Result<Json<SummaryResult>, String> {
        Ok(Json(self.service.summary(&params.0).await?))
    }

    /// Guided review of recent sleep and activity
    #[prompt(
        name = "weekly-sleep-activity-review",
        description = "Review recent sleep and step totals and averages"
    )]
    async fn weekly_sleep_activity_review(
        &self,
        params: Parameters<WeeklyReviewParams>,
    ) -> GetPromptResult {
        let days = params
            .0
            .days
            .filter(|d| *d > 0)
            .unwrap_or(self.service.window_days().get());
        prompts::weekly_review_prompt(days)
    }
}

#[tool_handler]
#[prompt_handler(router = self.prompt_router)]
impl rmcp::ServerHandler for WakeupFitnessHandler {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo::new(
            rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
        )
        .with_instructions(
            "Wakeup fitness MCP server - step and sleep totals and daily averages \
             from the connected health-data platform.",
        )
    }
}
