//! HTTP interface.
//!
//! # Endpoints
//!
//! - `GET /health`: status, version, catalog sizes
//! - `GET /events`: known event names
//! - `GET /events/{event}/`: posterior variables, or samples when `variable` is given
//! - `GET /injections`: known injection sets
//! - `GET /injections/{set}/`: injection variables, or found injections when `variable` is given
//!
//! Sampling queries accept `variable` (repeatable), `n_samples` (default -1
//! for all), `seed`, plus `model` for events and `ifar_threshold` for
//! injections.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::compression::predicate::SizeAbove;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::archive::ParquetArchive;
use crate::catalog::Catalog;
use crate::core::Samples;
use crate::error::Error;
use crate::injections::{find_injection_variables, load_injections, SignificanceFilter};
use crate::posterior::{find_variables, load_posterior};
use crate::selection::SampleCount;

pub const DEFAULT_MODEL: &str = "C01:IMRPhenomXPHM";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Model used for event queries that do not name one.
    pub default_model: String,
    /// Responses smaller than this many bytes are sent uncompressed.
    pub compression_min_size: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            compression_min_size: 1000,
        }
    }
}

/// Shared state available to all request handlers.
pub struct AppState {
    pub catalog: Catalog,
    pub config: ServerConfig,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(catalog: Catalog, config: ServerConfig) -> Self {
        Self {
            catalog,
            config,
            started_at: Instant::now(),
        }
    }
}

pub type SharedState = Arc<AppState>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: SharedState) -> Router {
    let compression =
        CompressionLayer::new().compress_when(SizeAbove::new(state.config.compression_min_size));
    Router::new()
        .route("/health", get(health_handler))
        .route("/events", get(list_events))
        .route("/events/:event", get(event_handler))
        .route("/events/:event/", get(event_handler))
        .route("/injections", get(list_injections))
        .route("/injections/:set", get(injection_handler))
        .route("/injections/:set/", get(injection_handler))
        .layer(compression)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Parameters shared by the sampling endpoints.
///
/// Parsed by hand from the raw query string because `variable` may repeat.
#[derive(Debug, Clone, PartialEq)]
struct SampleQuery {
    variables: Option<Vec<String>>,
    n_samples: i64,
    seed: Option<u64>,
    model: Option<String>,
    ifar_threshold: f64,
}

impl Default for SampleQuery {
    fn default() -> Self {
        Self {
            variables: None,
            n_samples: -1,
            seed: None,
            model: None,
            ifar_threshold: SignificanceFilter::default().threshold,
        }
    }
}

fn parse_param<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value
        .parse()
        .map_err(|_| AppError::bad_request(format!("invalid value for {key}: {value:?}")))
}

impl SampleQuery {
    fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw.unwrap_or(""))
            .map_err(|e| AppError::bad_request(format!("invalid query string: {e}")))?;

        let mut query = SampleQuery::default();
        for (key, value) in pairs {
            match key.as_str() {
                "variable" => query.variables.get_or_insert_with(Vec::new).push(value),
                "n_samples" => query.n_samples = parse_param(&key, &value)?,
                "seed" => query.seed = Some(parse_param(&key, &value)?),
                "model" => query.model = Some(value),
                "ifar_threshold" => query.ifar_threshold = parse_param(&key, &value)?,
                _ => {}
            }
        }
        Ok(query)
    }
}

/// Either a discovery answer or a sampling answer.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum QueryResponse {
    Variables(Vec<String>),
    Samples(Samples),
}

/// Runs blocking archive I/O off the async runtime.
async fn run_blocking<F>(f: F) -> Result<QueryResponse, AppError>
where
    F: FnOnce() -> Result<QueryResponse, Error> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::internal(format!("task panicked: {e}")))?
        .map_err(AppError::from)
}

// ---------------------------------------------------------------------------
// GET /events, /events/{event}/
// ---------------------------------------------------------------------------

async fn list_events(State(state): State<SharedState>) -> Json<Vec<String>> {
    Json(state.catalog.events())
}

async fn event_handler(
    State(state): State<SharedState>,
    Path(event): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<Json<QueryResponse>, AppError> {
    let query = SampleQuery::parse(raw.as_deref())?;
    let path: PathBuf = state
        .catalog
        .event_path(&event)
        .ok_or_else(|| {
            AppError::not_found(format!(
                "Sample file for {event} not found. Available values are {}",
                state.catalog.events().join(", ")
            ))
        })?
        .to_path_buf();
    let model = query
        .model
        .clone()
        .unwrap_or_else(|| state.config.default_model.clone());

    let response = run_blocking(move || {
        let archive = ParquetArchive::open(&path)?;
        match query.variables {
            None => find_variables(&archive, &model).map(QueryResponse::Variables),
            Some(variables) => {
                let count = SampleCount::from_request(query.n_samples)?;
                load_posterior(&archive, &model, &variables, count, query.seed)
                    .map(QueryResponse::Samples)
            }
        }
    })
    .await?;
    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// GET /injections, /injections/{set}/
// ---------------------------------------------------------------------------

async fn list_injections(State(state): State<SharedState>) -> Json<Vec<String>> {
    Json(state.catalog.injection_sets())
}

async fn injection_handler(
    State(state): State<SharedState>,
    Path(set): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<Json<QueryResponse>, AppError> {
    let query = SampleQuery::parse(raw.as_deref())?;
    let path: PathBuf = state
        .catalog
        .injection_path(&set)
        .ok_or_else(|| {
            AppError::not_found(format!(
                "Injection file for {set} not found. Available values are {}",
                state.catalog.injection_sets().join(", ")
            ))
        })?
        .to_path_buf();

    let response = run_blocking(move || {
        let archive = ParquetArchive::open(&path)?;
        match query.variables {
            None => find_injection_variables(&archive).map(QueryResponse::Variables),
            Some(variables) => {
                let count = SampleCount::from_request(query.n_samples)?;
                let filter = SignificanceFilter::new(query.ifar_threshold);
                load_injections(&archive, &variables, count, &filter, query.seed)
                    .map(QueryResponse::Samples)
            }
        }
    })
    .await?;
    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_s: f64,
    events: usize,
    injection_sets: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_s: state.started_at.elapsed().as_secs_f64(),
        events: state.catalog.events().len(),
        injection_sets: state.catalog.injection_sets().len(),
    })
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Structured JSON error response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(msg: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg,
        }
    }

    fn not_found(msg: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg,
        }
    }

    fn internal(msg: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg,
        }
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        if err.is_not_found() {
            AppError::not_found(err.to_string())
        } else if matches!(err, Error::InvalidRequest(_)) {
            AppError::bad_request(err.to_string())
        } else {
            tracing::error!(error = %err, "retrieval failed");
            AppError::internal(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}
