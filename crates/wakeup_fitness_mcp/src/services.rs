use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use wakeup_fitness_client::observability::Health;
use wakeup_fitness_client::{DEFAULT_WINDOW, FitnessAggregator, HealthDataSource, TimeRange};

use crate::queries::{parse_days, parse_range};
use crate::types::{
    AccessResult, DaysParams, RangeParams, SleepAverageResult, SleepTotalResult,
    StepsAverageResult, StepsTotalResult, SummaryResult,
};
use crate::McpResult;

/// The fitness operations in the shapes the tool and HTTP surfaces return.
#[derive(Clone)]
pub struct FitnessService {
    source: Arc<dyn HealthDataSource>,
    aggregator: FitnessAggregator,
    window_days: NonZeroU32,
}

impl std::fmt::Debug for FitnessService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FitnessService")
            .field("aggregator", &self.aggregator)
            .field("window_days", &self.window_days)
            .finish_non_exhaustive()
    }
}

impl FitnessService {
    pub fn new(source: Arc<dyn HealthDataSource>) -> Self {
        Self {
            aggregator: FitnessAggregator::new(source.clone()),
            source,
            window_days: DEFAULT_WINDOW,
        }
    }

    pub fn with_window_days(mut self, days: NonZeroU32) -> Self {
        self.window_days = days;
        self
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.aggregator = self.aggregator.with_clock(clock);
        self
    }

    pub fn window_days(&self) -> NonZeroU32 {
        self.window_days
    }

    pub fn health(&self) -> Health {
        Health::probe(self.source.as_ref())
    }

    pub fn access(&self) -> AccessResult {
        AccessResult {
            has_session: self.aggregator.has_access(),
        }
    }

    pub async fn total_steps(&self, params: &RangeParams) -> McpResult<StepsTotalResult> {
        let range = self.range(params)?;
        let total_steps = self.aggregator.total_steps(range).await?;
        Ok(StepsTotalResult {
            start: range.start().to_rfc3339(),
            end: range.end().to_rfc3339(),
            total_steps,
        })
    }

    pub async fn total_sleep_hours(&self, params: &RangeParams) -> McpResult<SleepTotalResult> {
        let range = self.range(params)?;
        let total_sleep_hours = self.aggregator.total_sleep_hours(range).await?;
        Ok(SleepTotalResult {
            start: range.start().to_rfc3339(),
            end: range.end().to_rfc3339(),
            total_sleep_hours,
        })
    }

    pub async fn average_daily_steps(&self, params: &DaysParams) -> McpResult<StepsAverageResult> {
        let days = parse_days(params.days, self.window_days)?;
        let average_daily_steps = self.aggregator.average_daily_steps(days).await?;
        Ok(StepsAverageResult {
            days: days.get(),
            average_daily_steps,
        })
    }

    pub async fn average_sleep_hours(&self, params: &DaysParams) -> McpResult<SleepAverageResult> {
        let days = parse_days(params.days, self.window_days)?;
        let average_sleep_hours = self.aggregator.average_sleep_hours(days).await?;
        Ok(SleepAverageResult {
            days: days.get(),
            average_sleep_hours,
        })
    }

    pub async fn summary(&self, params: &DaysParams) -> McpResult<SummaryResult> {
        let days = parse_days(params.days, self.window_days)?;
        let s = self.aggregator.summary(days).await?;
        Ok(SummaryResult {
            start: s.range.start().to_rfc3339(),
            end: s.range.end().to_rfc3339(),
            days: s.days,
            total_steps: s.total_steps,
            average_daily_steps: s.average_daily_steps,
            total_sleep_hours: s.total_sleep_hours,
            average_sleep_hours: s.average_sleep_hours,
        })
    }

    fn range(&self, params: &RangeParams) -> McpResult<TimeRange> {
        parse_range(
            params.start.as_deref(),
            params.end.as_deref(),
            self.window_days,
            self.aggregator.now(),
        )
    }
}
