//! In-memory [`HealthDataSource`] shared by the unit tests.
#![cfg(test)]

use async_trait::async_trait;
use wakeup_fitness_client::{
    Granularity, HealthDataError, HealthDataSource, SegmentType, SleepSegment, SleepStage,
    StepBucket, TimeRange,
};

const HOUR_MILLIS: i64 = 3_600_000;

/// Serves fixed buckets and segments regardless of the requested window.
pub struct FakeSource {
    pub session: bool,
    pub buckets: Vec<StepBucket>,
    pub segments: Vec<SleepSegment>,
}

impl FakeSource {
    /// Seven daily buckets totalling 460 steps, one asleep hour and one awake hour.
    pub fn week() -> Self {
        let day = 86_400_000;
        let buckets = [100, 50, 80, 0, 70, 90, 70]
            .iter()
            .enumerate()
            .map(|(i, &steps)| StepBucket::single(i as i64 * day, (i as i64 + 1) * day, steps))
            .collect();
        Self {
            session: true,
            buckets,
            segments: vec![
                SleepSegment {
                    start_time_millis: 0,
                    end_time_millis: HOUR_MILLIS,
                    stage: SleepStage::Deep,
                },
                SleepSegment {
                    start_time_millis: HOUR_MILLIS,
                    end_time_millis: 2 * HOUR_MILLIS,
                    stage: SleepStage::Awake,
                },
            ],
        }
    }

    pub fn sessionless() -> Self {
        Self {
            session: false,
            ..Self::week()
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
        _range: TimeRange,
        _granularity: Granularity,
    ) -> Result<Vec<StepBucket>, HealthDataError> {
        if !self.session {
            return Err(HealthDataError::NoSession);
        }
        Ok(self.buckets.clone())
    }

    async fn query_segments(
        &self,
        _range: TimeRange,
        _segment_type: SegmentType,
    ) -> Result<Vec<SleepSegment>, HealthDataError> {
        if !self.session {
            return Err(HealthDataError::NoSession);
        }
        Ok(self.segments.clone())
    }
}
