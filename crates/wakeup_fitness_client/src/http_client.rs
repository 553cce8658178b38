//! HTTP data source for the Google Fit REST API.
//!
//! This module provides a reqwest-based implementation of the
//! [`HealthDataSource`](crate::HealthDataSource) trait.

use crate::config::{
    Config, DEFAULT_BASE_URL, DEFAULT_SLEEP_SOURCE, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_ID,
};
use crate::{
    Granularity, HealthDataError, HealthDataSource, SegmentType, SleepSegment, SleepStage,
    StepBucket, StepPoint, TimeRange, utils,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

const STEP_COUNT_DELTA: &str = "com.google.step_count.delta";

/// Google Fit data source using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestHealthDataSource {
    base_url: String,
    user_id: String,
    sleep_source_id: String,
    access_token: Option<SecretString>,
    timeout: Duration,
    client: reqwest::Client,
}

impl ReqwestHealthDataSource {
    /// Create a new data source.
    ///
    /// # Arguments
    /// * `base_url` - API root (e.g., "https://www.googleapis.com/fitness/v1")
    /// * `access_token` - OAuth bearer token; `None` leaves the source without a session
    pub fn new(base_url: &str, access_token: Option<SecretString>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            sleep_source_id: DEFAULT_SLEEP_SOURCE.to_string(),
            access_token,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.base_url, cfg.access_token.clone())
            .with_user_id(cfg.user_id.clone())
            .with_sleep_source(cfg.sleep_source_id.clone())
            .with_timeout(cfg.timeout)
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_sleep_source(mut self, data_source_id: impl Into<String>) -> Self {
        self.sleep_source_id = data_source_id.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn token(&self) -> Result<&SecretString, HealthDataError> {
        self.access_token.as_ref().ok_or(HealthDataError::NoSession)
    }

    /// Attach the bearer token and timeout.
    fn authorized(
        &self,
        request: reqwest::RequestBuilder,
        token: &SecretString,
    ) -> reqwest::RequestBuilder {
        request
            .bearer_auth(token.expose_secret())
            .timeout(self.timeout)
    }

    /// Execute a request and decode the JSON body.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, HealthDataError> {
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        // Read body as text first so decode errors can carry a snippet of it.
        let text = resp.text().await?;
        serde_json::from_str::<T>(&text).map_err(|e| {
            let body_snippet: String = text.chars().take(256).collect();
            HealthDataError::Decode(format!("{e} - body: {body_snippet}"))
        })
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> HealthDataError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();

        match status {
            401 | 403 => HealthDataError::Auth(body_snippet),
            _ => HealthDataError::Status {
                status,
                body: body_snippet,
            },
        }
    }
}

#[async_trait]
impl HealthDataSource for ReqwestHealthDataSource {
    fn has_session(&self) -> bool {
        self.access_token.is_some()
    }

    async fn query_buckets(
        &self,
        range: TimeRange,
        granularity: Granularity,
    ) -> Result<Vec<StepBucket>, HealthDataError> {
        let token = self.token()?;
        let url = format!(
            "{}/users/{}/dataset:aggregate",
            self.base_url, self.user_id
        );
        let body = serde_json::json!({
            "aggregateBy": [{ "dataTypeName": STEP_COUNT_DELTA }],
            "bucketByTime": { "durationMillis": granularity.as_millis() },
            "startTimeMillis": range.start_millis(),
            "endTimeMillis": range.end_millis(),
        });

        let payload: AggregateResponse = self
            .execute_json(self.authorized(self.client.post(&url), token).json(&body))
            .await?;
        let buckets = payload
            .bucket
            .into_iter()
            .map(WireBucket::into_step_bucket)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            start_millis = range.start_millis(),
            end_millis = range.end_millis(),
            buckets = buckets.len(),
            "fetched step buckets"
        );
        Ok(buckets)
    }

    async fn query_segments(
        &self,
        range: TimeRange,
        segment_type: SegmentType,
    ) -> Result<Vec<SleepSegment>, HealthDataError> {
        let token = self.token()?;
        let data_source_id = match segment_type {
            SegmentType::Sleep => &self.sleep_source_id,
        };
        let url = format!(
            "{}/users/{}/dataSources/{}/datasets/{}-{}",
            self.base_url,
            self.user_id,
            data_source_id,
            range.start_nanos(),
            range.end_nanos()
        );

        let payload: DatasetResponse = self
            .execute_json(self.authorized(self.client.get(&url), token))
            .await?;
        let segments = payload
            .point
            .into_iter()
            .map(WirePoint::into_sleep_segment)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            data_type = segment_type.data_type_name(),
            segments = segments.len(),
            "fetched sleep segments"
        );
        Ok(segments)
    }
}

#[derive(Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    bucket: Vec<WireBucket>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBucket {
    #[serde(deserialize_with = "deserialize_int64")]
    start_time_millis: i64,
    #[serde(deserialize_with = "deserialize_int64")]
    end_time_millis: i64,
    #[serde(default)]
    dataset: Vec<WireDataset>,
}

#[derive(Deserialize)]
struct WireDataset {
    #[serde(default)]
    point: Vec<WirePoint>,
}

#[derive(Deserialize)]
struct DatasetResponse {
    #[serde(default)]
    point: Vec<WirePoint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePoint {
    #[serde(deserialize_with = "deserialize_int64")]
    start_time_nanos: i64,
    #[serde(deserialize_with = "deserialize_int64")]
    end_time_nanos: i64,
    #[serde(default)]
    value: Vec<WireValue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireValue {
    int_val: Option<i64>,
}

impl WirePoint {
    fn int_value(&self) -> Result<i64, HealthDataError> {
        self.value
            .first()
            .and_then(|v| v.int_val)
            .ok_or_else(|| HealthDataError::Decode("data point without intVal".into()))
    }

    fn into_step_point(self) -> Result<StepPoint, HealthDataError> {
        let raw = self.int_value()?;
        let steps = u64::try_from(raw)
            .map_err(|_| HealthDataError::Decode(format!("negative step count: {raw}")))?;
        Ok(StepPoint {
            start_time_millis: utils::nanos_to_millis(self.start_time_nanos),
            end_time_millis: utils::nanos_to_millis(self.end_time_nanos),
            steps,
        })
    }

    fn into_sleep_segment(self) -> Result<SleepSegment, HealthDataError> {
        let stage = SleepStage::from_code(self.int_value()?);
        Ok(SleepSegment {
            start_time_millis: utils::nanos_to_millis(self.start_time_nanos),
            end_time_millis: utils::nanos_to_millis(self.end_time_nanos),
            stage,
        })
    }
}

impl WireBucket {
    fn into_step_bucket(self) -> Result<StepBucket, HealthDataError> {
        let points = self
            .dataset
            .into_iter()
            .flat_map(|ds| ds.point)
            .map(WirePoint::into_step_point)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StepBucket {
            start_time_millis: self.start_time_millis,
            end_time_millis: self.end_time_millis,
            points,
        })
    }
}

/// The API encodes int64 fields as JSON strings; accept plain numbers too.
fn deserialize_int64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| D::Error::custom(format!("expected int64, got {n}"))),
        serde_json::Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("expected int64, got {s:?}"))),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
