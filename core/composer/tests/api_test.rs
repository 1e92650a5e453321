use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use health_insight_composer::{router, AppState, Composer};
use health_insight_ingestion::{JsonDayStore, JsonEventLog, SnapshotFile};
use health_insight_patterns::Thresholds;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn app(dir: &TempDir) -> Router {
    let store = JsonDayStore::open(dir.path()).unwrap();
    let events = JsonEventLog::open(dir.path());
    let composer = Composer::new(store, events, Thresholds::default())
        .with_snapshot(SnapshotFile::open(dir.path()));
    router(AppState::new(composer))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    });
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(&app(&dir), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_merge_then_read_day() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, _) = send(
        &app,
        "POST",
        "/days/2024-01-01/device",
        Some(json!({ "sleep": { "summary": { "totalMinutesAsleep": 300 } } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, record) = send(
        &app,
        "POST",
        "/days/2024-01-01/manual",
        Some(json!({ "stress": 8, "sleep_hours": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["device"]["sleep_hours"], json!(5.0));
    assert_eq!(record["manual"]["stress"], json!(8));

    let (status, flags) = send(&app, "GET", "/days/2024-01-01/flags", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flags["active"], json!(["short_sleep", "high_stress"]));

    let (_, days) = send(&app, "GET", "/days", None).await;
    assert_eq!(days["days"], json!(["2024-01-01"]));
    assert!(dir.path().join("daily").join("2024-01-01.json").exists());
}

#[tokio::test]
async fn test_error_statuses() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, _) = send(&app, "GET", "/days/not-a-date", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/days/2024-01-01", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/days/2024-01-01/similar", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/days/2024-01-01/manual", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/events",
        Some(json!({ "date": "2024-01-01", "body": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_similar_days_ranked() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    for (date, body) in [
        ("2024-01-01", json!({ "sleep_hours": 4, "hrv": 20 })),
        ("2024-01-02", json!({ "sleep_hours": 8, "hrv": 60 })),
        ("2024-01-03", json!({ "sleep_hours": 5 })),
        ("2024-01-04", json!({ "sleep_hours": 5, "hrv": 30 })),
    ] {
        send(&app, "POST", &format!("/days/{}/manual", date), Some(body)).await;
    }

    let (status, body) = send(&app, "GET", "/days/2024-01-01/similar", None).await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = body["similar"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-01-04", "2024-01-03"]);
    assert_eq!(body["similar"][0]["score"], json!(2));

    let (_, body) = send(&app, "GET", "/days/2024-01-01/similar?limit=1", None).await;
    assert_eq!(body["count"], json!(1));
}

#[tokio::test]
async fn test_events_and_briefing() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    send(&app, "POST", "/days/2024-02-01/manual", Some(json!({ "stress": 9 }))).await;
    let (status, event) = send(
        &app,
        "POST",
        "/events",
        Some(json!({ "date": "2024-02-01", "body": "Argument at work", "tags": ["Work"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(event["tags"], json!(["work"]));

    let (_, events) = send(&app, "GET", "/events/2024-02-01", None).await;
    assert_eq!(events["events"].as_array().unwrap().len(), 1);

    let (status, briefing) = send(&app, "GET", "/briefing/2024-02-01?style=detailed", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(briefing["style"], "detailed");
    assert!(briefing["text"].as_str().unwrap().contains("Argument at work"));

    let (status, _) = send(&app, "GET", "/briefing/2024-02-01?style=verbose", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_global_patterns_persisted() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    send(&app, "POST", "/days/2024-01-01/manual", Some(json!({ "sleep_hours": 6 }))).await;
    send(&app, "POST", "/days/2024-01-02/manual", Some(json!({ "sleep_hours": 8 }))).await;
    send(&app, "POST", "/days/2024-01-03/manual", Some(json!({ "hrv": 45 }))).await;

    let (status, snapshot) = send(&app, "GET", "/patterns/global", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["summary"]["day_count"], json!(3));
    assert_eq!(snapshot["summary"]["averages"]["sleep_hours"]["value"], json!(7.0));
    assert_eq!(
        snapshot["summary"]["averages"]["steps"]["status"],
        json!("insufficient_data")
    );

    let saved = SnapshotFile::open(dir.path()).load().unwrap().unwrap();
    assert_eq!(saved.summary.day_count, 3);
}
