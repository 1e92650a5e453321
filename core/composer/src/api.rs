use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use health_insight_ingestion::{normalize_device_bundle, JsonDayStore, JsonEventLog};
use health_insight_patterns::SimilarityMatcher;
use health_insight_schemas::{BriefingStyle, DailyRecord, DayKey, Fields, RecordSource};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::composer::Composer;
use crate::error::ComposerError;

pub type ServiceComposer = Composer<JsonDayStore, JsonEventLog>;

type ApiResult<T> = Result<T, (StatusCode, String)>;

#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<Mutex<ServiceComposer>>,
}

impl AppState {
    pub fn new(composer: ServiceComposer) -> Self {
        Self {
            composer: Arc::new(Mutex::new(composer)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/days", get(list_days))
        .route("/days/:date", get(get_day))
        .route("/days/:date/flags", get(get_flags))
        .route("/days/:date/manual", post(post_manual))
        .route("/days/:date/device", post(post_device))
        .route("/days/:date/similar", get(get_similar))
        .route("/events", post(post_event))
        .route("/events/:date", get(get_events))
        .route("/patterns/global", get(get_global_patterns))
        .route("/briefing/:date", get(get_briefing))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn parse_day(raw: &str) -> ApiResult<DayKey> {
    DayKey::parse(raw).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("invalid date {:?}: {}", raw, e),
        )
    })
}

fn reject(context: &str, err: ComposerError) -> (StatusCode, String) {
    match err {
        ComposerError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        ComposerError::Store(_) => {
            error!("Failed to {}: {}", context, err);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "health-insight",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn list_days(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let composer = state.composer.lock().await;
    let days = composer.list_days().map_err(|e| reject("list days", e))?;

    Ok(Json(serde_json::json!({
        "days": days,
        "count": days.len()
    })))
}

async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let date = parse_day(&date)?;
    let composer = state.composer.lock().await;
    let record = composer.record(&date).map_err(|e| reject("load record", e))?;
    Ok(Json(record))
}

async fn get_flags(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let date = parse_day(&date)?;
    let mut composer = state.composer.lock().await;
    let flags = composer.flags(&date).map_err(|e| reject("summarize day", e))?;

    Ok(Json(serde_json::json!({
        "date": date,
        "flags": flags,
        "active": flags.active().collect::<Vec<_>>()
    })))
}

async fn post_manual(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let date = parse_day(&date)?;
    let fields: Fields = serde_json::from_value(body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("expected a JSON object of fields: {}", e),
        )
    })?;

    info!("Manual entry for {}: {} fields", date, fields.len());
    merge_into(&state, &date, RecordSource::Manual, fields).await
}

async fn post_device(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let date = parse_day(&date)?;
    if !body.is_object() {
        return Err((
            StatusCode::BAD_REQUEST,
            "expected a device bundle object".to_string(),
        ));
    }

    let fields = normalize_device_bundle(&body);
    info!("Device sync for {}: {} fields", date, fields.len());
    merge_into(&state, &date, RecordSource::Device, fields).await
}

async fn merge_into(
    state: &AppState,
    date: &DayKey,
    source: RecordSource,
    fields: Fields,
) -> ApiResult<Json<DailyRecord>> {
    let mut composer = state.composer.lock().await;
    let record = composer
        .record_fragment(date, source, fields)
        .map_err(|e| reject("merge fragment", e))?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct SimilarQuery {
    limit: Option<usize>,
}

async fn get_similar(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Query(query): Query<SimilarQuery>,
) -> ApiResult<impl IntoResponse> {
    let date = parse_day(&date)?;
    let limit = query.limit.unwrap_or(SimilarityMatcher::DEFAULT_LIMIT);

    let mut composer = state.composer.lock().await;
    let similar = composer
        .similar(&date, limit)
        .map_err(|e| reject("find similar days", e))?;

    Ok(Json(serde_json::json!({
        "date": date,
        "count": similar.len(),
        "similar": similar
    })))
}

#[derive(Debug, Deserialize)]
struct EventRequest {
    date: String,
    body: String,
    #[serde(default)]
    tags: Vec<String>,
}

async fn post_event(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let request: EventRequest = serde_json::from_value(body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid event: {}", e)))?;
    let date = parse_day(&request.date)?;
    if request.body.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "event body is empty".to_string()));
    }

    let mut composer = state.composer.lock().await;
    let event = composer
        .log_event(&date, request.tags, &request.body)
        .map_err(|e| reject("append event", e))?;

    info!("Logged event {} for {}", event.id, date);
    Ok((StatusCode::CREATED, Json(event)))
}

async fn get_events(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let date = parse_day(&date)?;
    let composer = state.composer.lock().await;
    let events = composer
        .events_for(&date)
        .map_err(|e| reject("load events", e))?;

    Ok(Json(serde_json::json!({
        "date": date,
        "events": events
    })))
}

async fn get_global_patterns(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let mut composer = state.composer.lock().await;
    let snapshot = composer
        .refresh_patterns()
        .map_err(|e| reject("aggregate patterns", e))?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
struct BriefingQuery {
    style: Option<String>,
}

async fn get_briefing(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Query(query): Query<BriefingQuery>,
) -> ApiResult<impl IntoResponse> {
    let date = parse_day(&date)?;
    let style = match query.style.as_deref() {
        None => BriefingStyle::Standard,
        Some(raw) => raw
            .parse::<BriefingStyle>()
            .map_err(|e| (StatusCode::BAD_REQUEST, e))?,
    };

    let mut composer = state.composer.lock().await;
    let briefing = composer
        .compose(&date, style)
        .map_err(|e| reject("compose briefing", e))?;

    Ok(Json(briefing))
}
