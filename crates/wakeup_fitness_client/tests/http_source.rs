use chrono::{TimeZone, Utc};
use secrecy::SecretString;
use serde_json::json;
use wakeup_fitness_client::config::DEFAULT_SLEEP_SOURCE;
use wakeup_fitness_client::http_client::ReqwestHealthDataSource;
use wakeup_fitness_client::{
    Granularity, HealthDataError, HealthDataSource, SegmentType, SleepStage, TimeRange,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn week() -> TimeRange {
    let start = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    let end = Utc.timestamp_millis_opt(1_700_604_800_000).unwrap();
    TimeRange::new(start, end).expect("range")
}

fn source(server: &MockServer) -> ReqwestHealthDataSource {
    ReqwestHealthDataSource::new(&server.uri(), Some(SecretString::new("tok".into())))
}

#[tokio::test]
async fn query_buckets_posts_daily_aggregate_with_bearer_token() {
    let server = MockServer::start().await;
    let body = json!({
        "bucket": [
            {
                "startTimeMillis": "1700000000000",
                "endTimeMillis": "1700086400000",
                "dataset": [{
                    "dataSourceId": "derived:com.google.step_count.delta:com.google.android.gms:aggregated",
                    "point": [{
                        "startTimeNanos": "1700000000000000000",
                        "endTimeNanos": "1700086400000000000",
                        "dataTypeName": "com.google.step_count.delta",
                        "value": [{ "intVal": 4200, "mapVal": [] }]
                    }]
                }]
            },
            {
                "startTimeMillis": "1700086400000",
                "endTimeMillis": "1700172800000",
                "dataset": [{ "point": [] }]
            }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/users/me/dataset:aggregate"))
        .and(header("authorization", "Bearer tok"))
        .and(body_partial_json(json!({
            "aggregateBy": [{ "dataTypeName": "com.google.step_count.delta" }],
            "bucketByTime": { "durationMillis": 86400000u64 },
            "startTimeMillis": 1_700_000_000_000i64,
            "endTimeMillis": 1_700_604_800_000i64
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let buckets = source(&server)
        .query_buckets(week(), Granularity::Daily)
        .await
        .expect("buckets");
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].points.len(), 1);
    assert_eq!(buckets[0].points[0].steps, 4200);
    assert!(buckets[1].points.is_empty());
}

#[tokio::test]
async fn query_segments_reads_sleep_dataset_by_nanos() {
    let server = MockServer::start().await;
    let dataset_path = format!(
        "/users/me/dataSources/{}/datasets/{}-{}",
        DEFAULT_SLEEP_SOURCE, 1_700_000_000_000_000_000i64, 1_700_604_800_000_000_000i64
    );
    let body = json!({
        "minStartTimeNs": "1700000000000000000",
        "maxEndTimeNs": "1700604800000000000",
        "dataSourceId": DEFAULT_SLEEP_SOURCE,
        "point": [
            { "startTimeNanos": "1700010000000000000", "endTimeNanos": "1700013600000000000", "value": [{ "intVal": 4 }] },
            { "startTimeNanos": "1700013600000000000", "endTimeNanos": "1700015400000000000", "value": [{ "intVal": 1 }] },
            { "startTimeNanos": "1700015400000000000", "endTimeNanos": "1700017200000000000", "value": [{ "intVal": 9 }] }
        ]
    });
    Mock::given(method("GET"))
        .and(path(dataset_path))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let segments = source(&server)
        .query_segments(week(), SegmentType::Sleep)
        .await
        .expect("segments");
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].stage, SleepStage::Light);
    assert_eq!(segments[0].duration_millis(), 3_600_000);
    assert_eq!(segments[1].stage, SleepStage::Awake);
    assert_eq!(segments[2].stage, SleepStage::Unknown(9));
}

#[tokio::test]
async fn missing_token_fails_without_network_io() {
    let server = MockServer::start().await;
    let source = ReqwestHealthDataSource::new(&server.uri(), None);

    let res = source.query_buckets(week(), Granularity::Daily).await;
    assert!(matches!(res, Err(HealthDataError::NoSession)));
    let res = source.query_segments(week(), SegmentType::Sleep).await;
    assert!(matches!(res, Err(HealthDataError::NoSession)));

    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty());
}

#[tokio::test]
async fn forbidden_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/me/dataset:aggregate"))
        .respond_with(ResponseTemplate::new(403).set_body_string("insufficient scopes"))
        .mount(&server)
        .await;

    let res = source(&server)
        .query_buckets(week(), Granularity::Daily)
        .await;
    match res {
        Err(HealthDataError::Auth(body)) => assert!(body.contains("insufficient")),
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/me/dataset:aggregate"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend down"))
        .expect(1)
        .mount(&server)
        .await;

    let res = source(&server)
        .query_buckets(week(), Granularity::Daily)
        .await;
    assert!(matches!(res, Err(HealthDataError::Status { status: 503, .. })));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/me/dataset:aggregate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"bucket\": 12}"))
        .mount(&server)
        .await;

    let res = source(&server)
        .query_buckets(week(), Granularity::Daily)
        .await;
    match res {
        Err(HealthDataError::Decode(msg)) => assert!(msg.contains("body:")),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn custom_user_and_sleep_source_shape_the_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/users/user-7/dataSources/raw:sleep/datasets/{}-{}",
            1_700_000_000_000_000_000i64, 1_700_604_800_000_000_000i64
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "point": [] })))
        .mount(&server)
        .await;

    let segments = source(&server)
        .with_user_id("user-7")
        .with_sleep_source("raw:sleep")
        .query_segments(week(), SegmentType::Sleep)
        .await
        .expect("segments");
    assert!(segments.is_empty());
}
