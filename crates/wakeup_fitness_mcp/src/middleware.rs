//! Timing and latency metrics around a [`HealthDataSource`].

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;
use wakeup_fitness_client::{
    Granularity, HealthDataError, HealthDataSource, SegmentType, SleepSegment, StepBucket,
    TimeRange,
};

/// Histogram of platform round trips, labelled by `query`.
pub const SOURCE_LATENCY_SECONDS: &str = "wakeup_fitness_source_latency_seconds";

/// Wraps a source so every platform query is logged and timed.
#[derive(Clone)]
pub struct LoggingSource<S: HealthDataSource> {
    inner: Arc<S>,
}

impl<S: HealthDataSource> LoggingSource<S> {
    pub fn new(source: S) -> Self {
        Self {
            inner: Arc::new(source),
        }
    }

    async fn timed<F, Fut, T>(&self, name: &'static str, operation: F) -> Result<T, HealthDataError>
    where
        F: FnOnce(Arc<S>) -> Fut,
        Fut: std::future::Future<Output = Result<T, HealthDataError>>,
    {
        let start = Instant::now();
        debug!(query = name, "starting source query");

        let result = operation(self.inner.clone()).await;

        let elapsed = start.elapsed();
        metrics::histogram!(SOURCE_LATENCY_SECONDS, "query" => name).record(elapsed.as_secs_f64());
        match &result {
            Ok(_) => debug!(query = name, ?elapsed, "source query completed"),
            Err(e) => debug!(query = name, ?elapsed, error = %e, "source query failed"),
        }
        result
    }
}

#[async_trait]
impl<S: HealthDataSource> HealthDataSource for LoggingSource<S> {
    fn has_session(&self) -> bool {
        self.inner.has_session()
    }

    async fn query_buckets(
        &self,
        range: TimeRange,
        granularity: Granularity,
    ) -> Result<Vec<StepBucket>, HealthDataError> {
        self.timed("steps", |s| async move { s.query_buckets(range, granularity).await })
            .await
    }

    async fn query_segments(
        &self,
        range: TimeRange,
        segment_type: SegmentType,
    ) -> Result<Vec<SleepSegment>, HealthDataError> {
        self.timed("sleep", |s| async move { s.query_segments(range, segment_type).await })
            .await
    }
}
