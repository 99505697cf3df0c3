//! JSON HTTP API.
//!
//! Serves search, ranking, and single-record lookups over the imported
//! catalog. Records are read through a [`CachedSource`], so repeated
//! searches are answered from memory until `POST /cache/revalidate` is
//! called (typically right after an import).
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/search` | Filter, page, and optionally rank records |
//! | `GET`  | `/characters/{no}` | One record with its metrics |
//! | `GET`  | `/metrics/keys` | The metric keys accepted by `sort` |
//! | `POST` | `/cache/revalidate` | Drop the record cache |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "Unknown metric key: 'kp'" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unauthorized` (401), `not_found` (404),
//! `internal` (500).

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cache::{CachedSource, CACHE_TAG};
use crate::config::Config;
use crate::get::{get_character, CharacterResponse};
use crate::metrics::MetricKey;
use crate::search::{search_source, SearchResponse};
use crate::store::sqlite::SqliteStore;

/// Header carrying the revalidation secret.
pub const REVALIDATE_SECRET_HEADER: &str = "x-revalidate-secret";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: SqliteStore,
    cache: Arc<CachedSource>,
}

/// Starts the HTTP server on `[server].bind`.
///
/// Runs until the process is terminated. Returns an error if the database
/// cannot be opened or the address cannot be bound.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let store = SqliteStore::open(&config.db).await?;
    let app = router(config, store);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "server listening");
    println!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the router over an open store.
pub fn router(config: &Config, store: SqliteStore) -> Router {
    let state = AppState {
        config: Arc::new(config.clone()),
        cache: Arc::new(CachedSource::new(Arc::new(store.clone()))),
        store,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/search", post(handle_search))
        .route("/characters/{no}", get(handle_get_character))
        .route("/metrics/keys", get(handle_metric_keys))
        .route("/cache/revalidate", post(handle_revalidate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn unauthorized(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    tracing::error!(error = %err, "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: err.to_string(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /search ============

/// Request body for `POST /search`. Every field is optional.
#[derive(Deserialize, Default)]
#[serde(default)]
struct SearchRequest {
    query: String,
    /// Any JSON value; see [`page_from_value`].
    page: serde_json::Value,
    sort: Option<String>,
}

/// Interpret a loosely typed page value.
///
/// Missing or `null` is page 1, numbers pass through, numeric strings are
/// parsed, anything else is treated as non-finite (which the search clamps
/// to page 1).
fn page_from_value(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Null => 1.0,
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let sort = req
        .sort
        .as_deref()
        .map(str::parse::<MetricKey>)
        .transpose()
        .map_err(|e| bad_request(e.to_string()))?;

    let response = search_source(
        state.cache.as_ref(),
        &state.config.search,
        &req.query,
        page_from_value(&req.page),
        sort,
    )
    .await
    .map_err(internal)?;

    Ok(Json(response))
}

// ============ GET /characters/{no} ============

async fn handle_get_character(
    State(state): State<AppState>,
    Path(no): Path<String>,
) -> Result<Json<CharacterResponse>, AppError> {
    let character_no: i64 = no
        .parse()
        .map_err(|_| bad_request(format!("invalid character number: {}", no)))?;

    match get_character(&state.store, character_no).await {
        Ok(resp) => Ok(Json(resp)),
        Err(e) if e.to_string().contains("not found") => Err(not_found(e.to_string())),
        Err(e) => Err(internal(e)),
    }
}

// ============ GET /metrics/keys ============

#[derive(Serialize)]
struct MetricKeysResponse {
    keys: Vec<MetricKey>,
}

async fn handle_metric_keys() -> Json<MetricKeysResponse> {
    Json(MetricKeysResponse {
        keys: MetricKey::ALL.to_vec(),
    })
}

// ============ POST /cache/revalidate ============

#[derive(Serialize)]
struct RevalidateResponse {
    message: String,
    tag: String,
    dropped: usize,
}

async fn handle_revalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RevalidateResponse>, AppError> {
    if let Some(secret) = state.config.server.revalidate_secret.as_deref() {
        let provided = headers
            .get(REVALIDATE_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(secret) {
            return Err(unauthorized("invalid revalidation secret"));
        }
    }

    let dropped = state.cache.invalidate().map_err(internal)?;
    Ok(Json(RevalidateResponse {
        message: "cache revalidated".to_string(),
        tag: CACHE_TAG.to_string(),
        dropped,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_from_value() {
        assert_eq!(page_from_value(&json!(null)), 1.0);
        assert_eq!(page_from_value(&json!(3)), 3.0);
        assert_eq!(page_from_value(&json!(2.5)), 2.5);
        assert_eq!(page_from_value(&json!(" 4 ")), 4.0);
        assert!(page_from_value(&json!("abc")).is_nan());
        assert!(page_from_value(&json!([1])).is_nan());
        assert!(page_from_value(&json!({"p": 1})).is_nan());
    }

    #[test]
    fn test_search_request_defaults() {
        let req: SearchRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.query.is_empty());
        assert!(req.page.is_null());
        assert!(req.sort.is_none());
    }
}
