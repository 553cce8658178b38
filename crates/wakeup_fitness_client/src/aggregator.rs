//! Step and sleep reductions over a [`HealthDataSource`].
//!
//! Every operation issues exactly one query per figure and keeps no state
//! between calls. Any failure (no session, a rejected or failed request, data
//! that cannot be reduced) is logged and reported as [`Unavailable`].

use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::observability::{self, QueryKind};
use crate::{
    Granularity, HealthDataError, HealthDataSource, SegmentType, SleepSegment, StepBucket,
    TimeRange, utils,
};

/// The single outcome callers see when a figure cannot be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("fitness data unavailable")]
pub struct Unavailable;

/// Totals and per-day averages over one trailing window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub range: TimeRange,
    pub days: u32,
    pub total_steps: u64,
    pub average_daily_steps: u64,
    pub total_sleep_hours: f64,
    pub average_sleep_hours: f64,
}

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct FitnessAggregator {
    source: Arc<dyn HealthDataSource>,
    clock: Clock,
}

impl std::fmt::Debug for FitnessAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FitnessAggregator")
            .field("session", &self.source.has_session())
            .finish_non_exhaustive()
    }
}

impl FitnessAggregator {
    pub fn new(source: Arc<dyn HealthDataSource>) -> Self {
        Self {
            source,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock used to anchor trailing windows.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn has_access(&self) -> bool {
        self.source.has_session()
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// The `days`-day window ending now.
    pub fn trailing_window(&self, days: NonZeroU32) -> TimeRange {
        TimeRange::trailing_days(days.get(), self.now())
    }

    /// The trailing seven days ending now.
    pub fn default_window(&self) -> TimeRange {
        TimeRange::trailing_week(self.now())
    }

    pub async fn total_steps(&self, range: TimeRange) -> Result<u64, Unavailable> {
        let result = self.fetch_total_steps(range).await;
        observability::record_query(QueryKind::Steps, result.is_ok());
        result.map_err(|e| {
            tracing::error!(error = %e, "error getting step count");
            Unavailable
        })
    }

    pub async fn total_sleep_hours(&self, range: TimeRange) -> Result<f64, Unavailable> {
        let result = self.fetch_total_sleep_hours(range).await;
        observability::record_query(QueryKind::Sleep, result.is_ok());
        result.map_err(|e| {
            tracing::error!(error = %e, "error getting sleep duration");
            Unavailable
        })
    }

    /// Total steps over the trailing `days` window, divided by `days`.
    ///
    /// The division truncates.
    pub async fn average_daily_steps(&self, days: NonZeroU32) -> Result<u64, Unavailable> {
        let total = self.total_steps(self.trailing_window(days)).await?;
        Ok(total / u64::from(days.get()))
    }

    pub async fn average_sleep_hours(&self, days: NonZeroU32) -> Result<f64, Unavailable> {
        let total = self.total_sleep_hours(self.trailing_window(days)).await?;
        Ok(total / f64::from(days.get()))
    }

    /// Step and sleep totals with their averages over a single trailing window.
    pub async fn summary(&self, days: NonZeroU32) -> Result<ActivitySummary, Unavailable> {
        let range = self.trailing_window(days);
        let total_steps = self.total_steps(range).await?;
        let total_sleep_hours = self.total_sleep_hours(range).await?;
        let d = days.get();
        Ok(ActivitySummary {
            range,
            days: d,
            total_steps,
            average_daily_steps: total_steps / u64::from(d),
            total_sleep_hours,
            average_sleep_hours: total_sleep_hours / f64::from(d),
        })
    }

    fn ensure_session(&self) -> Result<(), HealthDataError> {
        if self.source.has_session() {
            Ok(())
        } else {
            Err(HealthDataError::NoSession)
        }
    }

    async fn fetch_total_steps(&self, range: TimeRange) -> Result<u64, HealthDataError> {
        self.ensure_session()?;
        let buckets = self
            .source
            .query_buckets(range, Granularity::Daily)
            .await?;
        let total = sum_steps(&buckets)
            .ok_or_else(|| HealthDataError::Decode("step total overflowed".into()))?;
        tracing::info!(total_steps = total, "total steps");
        Ok(total)
    }

    async fn fetch_total_sleep_hours(&self, range: TimeRange) -> Result<f64, HealthDataError> {
        self.ensure_session()?;
        let segments = self
            .source
            .query_segments(range, SegmentType::Sleep)
            .await?;
        let millis = asleep_millis(&segments)
            .ok_or_else(|| HealthDataError::Decode("sleep total overflowed".into()))?;
        let hours = utils::millis_to_hours(millis);
        tracing::info!(total_sleep_hours = hours, "total sleep");
        Ok(hours)
    }
}

/// Sum of every data point in every bucket; `None` on overflow.
pub fn sum_steps(buckets: &[StepBucket]) -> Option<u64> {
    let mut total: u64 = 0;
    for point in buckets.iter().flat_map(|b| &b.points) {
        tracing::debug!(
            steps = point.steps,
            start_millis = point.start_time_millis,
            "steps"
        );
        total = total.checked_add(point.steps)?;
    }
    Some(total)
}

/// Summed duration of the segments whose stage counts as sleep; `None` on overflow.
pub fn asleep_millis(segments: &[SleepSegment]) -> Option<u64> {
    segments
        .iter()
        .filter(|s| s.stage.is_asleep())
        .try_fold(0u64, |acc, s| acc.checked_add(s.duration_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SleepStage, StepPoint};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeSource {
        session: bool,
        fail: bool,
        buckets: Vec<StepBucket>,
        segments: Vec<SleepSegment>,
        calls: AtomicUsize,
        ranges: Mutex<Vec<TimeRange>>,
    }

    impl FakeSource {
        fn with_session() -> Self {
            Self {
                session: true,
                ..Default::default()
            }
        }

        fn steps(counts: &[u64]) -> Self {
            let buckets = counts
                .iter()
                .enumerate()
                .map(|(i, &c)| {
                    let start = i as i64 * 86_400_000;
                    StepBucket::single(start, start + 86_400_000, c)
                })
                .collect();
            Self {
                buckets,
                ..Self::with_session()
            }
        }

        fn sleep(segments: Vec<SleepSegment>) -> Self {
            Self {
                segments,
                ..Self::with_session()
            }
        }

        fn record(&self, range: TimeRange) -> Result<(), HealthDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.ranges.lock().unwrap().push(range);
            if self.fail {
                Err(HealthDataError::Auth("denied".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl HealthDataSource for FakeSource {
        fn has_session(&self) -> bool {
            self.session
        }

        async fn query_buckets(
            &self,
            range: TimeRange,
            granularity: Granularity,
        ) -> Result<Vec<StepBucket>, HealthDataError> {
            assert_eq!(granularity, Granularity::Daily);
            self.record(range)?;
            Ok(self.buckets.clone())
        }

        async fn query_segments(
            &self,
            range: TimeRange,
            segment_type: SegmentType,
        ) -> Result<Vec<SleepSegment>, HealthDataError> {
            assert_eq!(segment_type, SegmentType::Sleep);
            self.record(range)?;
            Ok(self.segments.clone())
        }
    }

    fn segment(start: i64, end: i64, code: i64) -> SleepSegment {
        SleepSegment {
            start_time_millis: start,
            end_time_millis: end,
            stage: SleepStage::from_code(code),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap()
    }

    fn aggregator(source: Arc<FakeSource>) -> FitnessAggregator {
        FitnessAggregator::new(source).with_clock(fixed_now)
    }

    fn days(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[tokio::test]
    async fn total_steps_sums_every_bucket() {
        let agg = aggregator(Arc::new(FakeSource::steps(&[120, 0, 340])));
        let total = agg.total_steps(agg.default_window()).await;
        assert_eq!(total, Ok(460));
    }

    #[tokio::test]
    async fn total_steps_sums_every_point_inside_a_bucket() {
        let bucket = StepBucket {
            start_time_millis: 0,
            end_time_millis: 86_400_000,
            points: vec![
                StepPoint {
                    start_time_millis: 0,
                    end_time_millis: 1_000,
                    steps: 10,
                },
                StepPoint {
                    start_time_millis: 1_000,
                    end_time_millis: 2_000,
                    steps: 32,
                },
            ],
        };
        let source = FakeSource {
            buckets: vec![bucket, StepBucket::single(86_400_000, 172_800_000, 8)],
            ..FakeSource::with_session()
        };
        let agg = aggregator(Arc::new(source));
        assert_eq!(agg.total_steps(agg.default_window()).await, Ok(50));
    }

    #[tokio::test]
    async fn empty_history_totals_zero() {
        let agg = aggregator(Arc::new(FakeSource::with_session()));
        assert_eq!(agg.total_steps(agg.default_window()).await, Ok(0));
        assert_eq!(agg.total_sleep_hours(agg.default_window()).await, Ok(0.0));
    }

    #[tokio::test]
    async fn awake_segment_contributes_nothing() {
        let ten_hours = 10 * 3_600_000;
        let agg = aggregator(Arc::new(FakeSource::sleep(vec![
            segment(0, ten_hours, 1),
            segment(ten_hours, 2 * ten_hours, 3),
            segment(2 * ten_hours, 3 * ten_hours, 0),
        ])));
        assert_eq!(agg.total_sleep_hours(agg.default_window()).await, Ok(0.0));
    }

    #[tokio::test]
    async fn asleep_hour_plus_awake_half_hour_is_one_hour() {
        let agg = aggregator(Arc::new(FakeSource::sleep(vec![
            segment(0, 3_600_000, 4),
            segment(3_600_000, 5_400_000, 1),
        ])));
        assert_eq!(agg.total_sleep_hours(agg.default_window()).await, Ok(1.0));
    }

    #[tokio::test]
    async fn every_asleep_stage_counts() {
        let hour = 3_600_000;
        let agg = aggregator(Arc::new(FakeSource::sleep(vec![
            segment(0, hour, 2),
            segment(hour, 2 * hour, 4),
            segment(2 * hour, 3 * hour, 5),
            segment(3 * hour, 4 * hour, 6),
        ])));
        assert_eq!(agg.total_sleep_hours(agg.default_window()).await, Ok(4.0));
    }

    #[tokio::test]
    async fn average_daily_steps_truncates() {
        let agg = aggregator(Arc::new(FakeSource::steps(&[700])));
        assert_eq!(agg.average_daily_steps(days(7)).await, Ok(100));

        let agg = aggregator(Arc::new(FakeSource::steps(&[705])));
        assert_eq!(agg.average_daily_steps(days(7)).await, Ok(100));
    }

    #[tokio::test]
    async fn average_sleep_hours_divides_total() {
        let agg = aggregator(Arc::new(FakeSource::sleep(vec![segment(
            0,
            14 * 3_600_000,
            2,
        )])));
        assert_eq!(agg.average_sleep_hours(days(7)).await, Ok(2.0));
    }

    #[tokio::test]
    async fn averages_query_the_trailing_window() {
        let source = Arc::new(FakeSource::steps(&[1]));
        let agg = aggregator(source.clone());
        agg.average_daily_steps(days(3)).await.expect("average");

        let ranges = source.ranges.lock().unwrap().clone();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].end(), fixed_now());
        assert_eq!(
            ranges[0].start(),
            Utc.with_ymd_and_hms(2025, 6, 12, 9, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn no_session_makes_every_operation_unavailable() {
        let source = Arc::new(FakeSource {
            session: false,
            segments: vec![segment(0, 3_600_000, 4)],
            ..FakeSource::steps(&[500])
        });
        let agg = aggregator(source.clone());
        let range = agg.default_window();

        assert!(!agg.has_access());
        assert_eq!(agg.total_steps(range).await, Err(Unavailable));
        assert_eq!(agg.total_sleep_hours(range).await, Err(Unavailable));
        assert_eq!(agg.average_daily_steps(days(7)).await, Err(Unavailable));
        assert_eq!(agg.average_sleep_hours(days(7)).await, Err(Unavailable));
        assert_eq!(agg.summary(days(7)).await, Err(Unavailable));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn source_failure_is_reported_once_without_retry() {
        let source = Arc::new(FakeSource {
            fail: true,
            ..FakeSource::steps(&[10])
        });
        let agg = aggregator(source.clone());
        assert_eq!(agg.total_steps(agg.default_window()).await, Err(Unavailable));
        assert_eq!(agg.average_sleep_hours(days(7)).await, Err(Unavailable));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn overflowing_step_total_is_unavailable() {
        let agg = aggregator(Arc::new(FakeSource::steps(&[u64::MAX, 1])));
        assert_eq!(agg.total_steps(agg.default_window()).await, Err(Unavailable));
    }

    #[tokio::test]
    async fn repeated_calls_yield_the_same_total() {
        let agg = aggregator(Arc::new(FakeSource::steps(&[120, 0, 340])));
        let range = agg.default_window();
        let first = agg.total_steps(range).await;
        let second = agg.total_steps(range).await;
        assert_eq!(first, Ok(460));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn summary_combines_totals_and_averages() {
        let source = FakeSource {
            segments: vec![segment(0, 21 * 3_600_000, 5)],
            ..FakeSource::steps(&[3_000, 4_000])
        };
        let agg = aggregator(Arc::new(source));
        let s = agg.summary(days(7)).await.expect("summary");
        assert_eq!(s.days, 7);
        assert_eq!(s.total_steps, 7_000);
        assert_eq!(s.average_daily_steps, 1_000);
        assert_eq!(s.total_sleep_hours, 21.0);
        assert_eq!(s.average_sleep_hours, 3.0);
        assert_eq!(s.range.end(), fixed_now());
    }

    #[test]
    fn asleep_millis_skips_non_sleep_stages() {
        let segs = vec![segment(0, 1_000, 2), segment(0, 5_000, 1), segment(0, 500, 6)];
        assert_eq!(asleep_millis(&segs), Some(1_500));
    }
}
