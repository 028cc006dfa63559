//! HTTP query server.
//!
//! Exposes the [`QueryService`] as a read-only JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/{keyword}?filter=` | Resolve a catalog keyword, optional single filter |
//! | `GET`  | `/api/{folder}?filter=` | Read a storage folder by literal name |
//! | `GET`  | `/api/query?question=` | Parse a free-text question and apply every derived filter |
//! | `GET`  | `/search?filter_keyword=` | Filter every record under the data root |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! `filter` and `filter_keyword` are accepted on every filtering route. When
//! both are given, the route's own name wins and the other is the fallback.
//! A malformed query string (for example a repeated parameter) is a
//! `bad_request`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "unresolvable_category", "message": "no dataset category matches 'xyz'" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unresolvable_category` (400),
//! `category_not_found` (404), `no_results` (404), `internal` (500).

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::dataset::{DatasetReader, FsDatasetReader};
use crate::error::QueryError;
use crate::service::{FolderResponse, LookupResponse, QueryService, QuestionResponse, SearchResponse};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    service: Arc<QueryService>,
}

/// Starts the query server with the filesystem reader from `config`.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let reader = FsDatasetReader::from_config(config)?;
    tracing::info!(root = %reader.root().display(), "serving datasets");
    run_server_with_reader(config, Arc::new(reader)).await
}

/// Starts the query server with a custom [`DatasetReader`].
///
/// # Example
///
/// ```rust,no_run
/// use dataset_query::dataset::FsDatasetReader;
/// use dataset_query::server::run_server_with_reader;
/// use std::sync::Arc;
///
/// # async fn example(config: &dataset_query::config::Config) -> anyhow::Result<()> {
/// let reader = FsDatasetReader::new("/srv/backup-data", &["**/*.json".to_string()])?;
/// run_server_with_reader(config, Arc::new(reader)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_reader(
    config: &Config,
    reader: Arc<dyn DatasetReader>,
) -> anyhow::Result<()> {
    let catalog = Arc::new(config.catalog()?);
    let service = Arc::new(QueryService::new(catalog, reader)?);
    let app = router(service.clone());

    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        reader = service.reader_name(),
        "query server listening on http://{}",
        bind_addr
    );
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the router for `service`.
pub fn router(service: Arc<QueryService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/search", get(handle_search))
        .route("/api/query", get(handle_question))
        .route("/api/{folder}", get(handle_folder))
        .route("/{keyword}", get(handle_keyword))
        .layer(cors)
        .with_state(AppState { service })
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

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            tracing::error!(error = %err, "query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ Query parameters ============

#[derive(Debug, Deserialize)]
struct FilterParams {
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    filter_keyword: Option<String>,
}

impl FilterParams {
    /// `filter`, falling back to `filter_keyword`.
    fn filter(&self) -> Option<&str> {
        first_non_empty(&self.filter, &self.filter_keyword)
    }

    /// `filter_keyword`, falling back to `filter`.
    fn filter_keyword(&self) -> Option<&str> {
        first_non_empty(&self.filter_keyword, &self.filter)
    }
}

fn first_non_empty<'a>(primary: &'a Option<String>, fallback: &'a Option<String>) -> Option<&'a str> {
    [primary, fallback]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .find(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct QuestionParams {
    #[serde(default)]
    question: Option<String>,
}

/// Unwraps query parameters, reporting a malformed query string in the
/// JSON error contract instead of axum's plain-text rejection.
fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params
        .map(|Query(p)| p)
        .map_err(|rejection| bad_request(rejection.body_text()))
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

// ============ GET /{keyword} ============

async fn handle_keyword(
    State(state): State<AppState>,
    Path(keyword): Path<String>,
    params: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Json<LookupResponse>, AppError> {
    let params = query_params(params)?;
    tracing::info!(keyword = %keyword, filter = ?params.filter(), "GET /{{keyword}}");
    let resp = state.service.lookup(&keyword, params.filter()).await?;
    Ok(Json(resp))
}

// ============ GET /api/{folder} ============

async fn handle_folder(
    State(state): State<AppState>,
    Path(folder): Path<String>,
    params: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Json<FolderResponse>, AppError> {
    let params = query_params(params)?;
    tracing::info!(folder = %folder, filter = ?params.filter(), "GET /api/{{folder}}");
    let resp = state.service.lookup_folder(&folder, params.filter()).await?;
    Ok(Json(resp))
}

// ============ GET /api/query ============

async fn handle_question(
    State(state): State<AppState>,
    params: Result<Query<QuestionParams>, QueryRejection>,
) -> Result<Json<QuestionResponse>, AppError> {
    let question = query_params(params)?
        .question
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| bad_request("question must not be empty"))?;
    tracing::info!(question = %question, "GET /api/query");
    let resp = state.service.ask(&question).await?;
    Ok(Json(resp))
}

// ============ GET /search ============

async fn handle_search(
    State(state): State<AppState>,
    params: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let params = query_params(params)?;
    let term = params
        .filter_keyword()
        .ok_or_else(|| bad_request("filter_keyword must not be empty"))?;
    tracing::info!(filter_keyword = %term, "GET /search");
    let resp = state.service.search_all(term).await?;
    Ok(Json(resp))
}
