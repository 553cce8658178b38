//! Step-count and sleep-segment history from a health-data platform, reduced to
//! totals and per-day averages.
//!
//! [`HealthDataSource`] is the seam to the platform. [`http_client`] implements it
//! against the Google Fit REST API and [`aggregator`] performs the reductions.

use std::num::NonZeroU32;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod aggregator;
pub mod config;
pub mod http_client;
pub mod observability;
pub mod utils;

pub use aggregator::{ActivitySummary, FitnessAggregator, Unavailable};

/// Trailing window used when the caller does not supply one.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// [`DEFAULT_WINDOW_DAYS`] in the form the averaging operations accept.
pub const DEFAULT_WINDOW: NonZeroU32 = match NonZeroU32::new(DEFAULT_WINDOW_DAYS) {
    Some(days) => days,
    None => panic!("default window must be non-zero"),
};

#[derive(Debug, Error)]
pub enum HealthDataError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no authenticated session")]
    NoSession,
    #[error("access denied: {0}")]
    Auth(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("decoding response: {0}")]
    Decode(String),
    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("configuration error: {0}")]
    Config(String),
}

/// A closed time window, `start <= end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, HealthDataError> {
        if start > end {
            return Err(HealthDataError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days`-day window ending at `now`.
    pub fn trailing_days(days: u32, now: DateTime<Utc>) -> Self {
        let start = now
            .checked_sub_signed(TimeDelta::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end: now }
    }

    pub fn trailing_week(now: DateTime<Utc>) -> Self {
        Self::trailing_days(DEFAULT_WINDOW_DAYS, now)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }

    pub fn start_nanos(&self) -> i64 {
        utils::millis_to_nanos(self.start_millis())
    }

    pub fn end_nanos(&self) -> i64 {
        utils::millis_to_nanos(self.end_millis())
    }
}

/// Bucket width for aggregated queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Custom(std::time::Duration),
}

impl Granularity {
    pub fn as_millis(&self) -> u64 {
        match self {
            Granularity::Daily => 86_400_000,
            Granularity::Custom(d) => u64::try_from(d.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// One step-count data point inside a bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPoint {
    pub start_time_millis: i64,
    pub end_time_millis: i64,
    pub steps: u64,
}

/// A time bucket of step-count data points, as returned by an aggregate query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepBucket {
    pub start_time_millis: i64,
    pub end_time_millis: i64,
    pub points: Vec<StepPoint>,
}

impl StepBucket {
    /// A bucket holding a single point that spans the whole bucket.
    pub fn single(start_time_millis: i64, end_time_millis: i64, steps: u64) -> Self {
        Self {
            start_time_millis,
            end_time_millis,
            points: vec![StepPoint {
                start_time_millis,
                end_time_millis,
                steps,
            }],
        }
    }
}

/// Stage codes of the Google Fit `com.google.sleep.segment` data type
/// (`FIELD_SLEEP_SEGMENT_TYPE`).
///
/// The platform owns this enumeration and may extend it between versions. Codes
/// not listed here decode to [`SleepStage::Unknown`] and never count as sleep.
pub mod stage_codes {
    pub const AWAKE: i64 = 1;
    pub const SLEEPING: i64 = 2;
    pub const OUT_OF_BED: i64 = 3;
    pub const LIGHT: i64 = 4;
    pub const DEEP: i64 = 5;
    pub const REM: i64 = 6;
}

/// Stage codes that count toward sleep duration.
pub const ASLEEP_STAGE_CODES: [i64; 4] = [
    stage_codes::SLEEPING,
    stage_codes::LIGHT,
    stage_codes::DEEP,
    stage_codes::REM,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum SleepStage {
    /// Awake during the sleep cycle.
    Awake,
    /// Asleep, stage not reported.
    Sleeping,
    OutOfBed,
    Light,
    Deep,
    Rem,
    Unknown(i64),
}

impl SleepStage {
    pub fn from_code(code: i64) -> Self {
        match code {
            stage_codes::AWAKE => SleepStage::Awake,
            stage_codes::SLEEPING => SleepStage::Sleeping,
            stage_codes::OUT_OF_BED => SleepStage::OutOfBed,
            stage_codes::LIGHT => SleepStage::Light,
            stage_codes::DEEP => SleepStage::Deep,
            stage_codes::REM => SleepStage::Rem,
            other => SleepStage::Unknown(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            SleepStage::Awake => stage_codes::AWAKE,
            SleepStage::Sleeping => stage_codes::SLEEPING,
            SleepStage::OutOfBed => stage_codes::OUT_OF_BED,
            SleepStage::Light => stage_codes::LIGHT,
            SleepStage::Deep => stage_codes::DEEP,
            SleepStage::Rem => stage_codes::REM,
            SleepStage::Unknown(code) => code,
        }
    }

    pub fn is_asleep(self) -> bool {
        matches!(
            self,
            SleepStage::Sleeping | SleepStage::Light | SleepStage::Deep | SleepStage::Rem
        )
    }
}

impl From<i64> for SleepStage {
    fn from(code: i64) -> Self {
        SleepStage::from_code(code)
    }
}

impl From<SleepStage> for i64 {
    fn from(stage: SleepStage) -> Self {
        stage.code()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepSegment {
    pub start_time_millis: i64,
    pub end_time_millis: i64,
    pub stage: SleepStage,
}

impl SleepSegment {
    /// `end - start`, or zero when the segment is inverted.
    pub fn duration_millis(&self) -> u64 {
        u64::try_from(self.end_time_millis.saturating_sub(self.start_time_millis)).unwrap_or(0)
    }
}

/// Segment families that can be requested from [`HealthDataSource::query_segments`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentType {
    Sleep,
}

impl SegmentType {
    pub fn data_type_name(&self) -> &'static str {
        match self {
            SegmentType::Sleep => "com.google.sleep.segment",
        }
    }
}

/// Read access to a health-data platform.
///
/// Session and account resolution belong to the implementor; callers only ask
/// whether a usable session exists.
#[async_trait]
pub trait HealthDataSource: Send + Sync + 'static {
    fn has_session(&self) -> bool;

    /// Step-count buckets of width `granularity` covering `range`.
    async fn query_buckets(
        &self,
        range: TimeRange,
        granularity: Granularity,
    ) -> Result<Vec<StepBucket>, HealthDataError>;

    /// Every segment of `segment_type` intersecting `range`, unbucketed.
    async fn query_segments(
        &self,
        range: TimeRange,
        segment_type: SegmentType,
    ) -> Result<Vec<SleepSegment>, HealthDataError>;
}
