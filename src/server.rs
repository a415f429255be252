//! HTTP grading server.
//!
//! Exposes the grader and the report store as a JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `POST`   | `/grade/steps` | Grade a step-by-step solution |
//! | `POST`   | `/solve` | Solve one equation for a variable |
//! | `GET`    | `/reports` | Most recent stored reports |
//! | `GET`    | `/reports/{id}` | One stored report |
//! | `DELETE` | `/reports/{id}` | Remove a stored report |
//!
//! Grading requests that do not fit the configured limits are rejected with
//! `400`. Grading runs on the blocking pool and is cut off after
//! `[grading].timeout_ms`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "correct_answer is required" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `timeout` (408),
//! `internal` (500).
//!
//! A submission whose correct answer cannot be understood is not an HTTP
//! error: it answers `200` with `{"success": false, "error": ...}`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use stepcheck_core::grader::Grader;
use stepcheck_core::models::{GradeOutcome, GradeRequest, SolveSummary};
use stepcheck_core::store::{ReportStore, ReportSummary, StoredReport};

use crate::config::Config;
use crate::grade::{check_limits, open_store, outcome_json};

const DEFAULT_RECENT_LIMIT: usize = 20;
const MAX_RECENT_LIMIT: usize = 500;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    grader: Arc<Grader>,
    /// `None` when the config has no `[db]` section.
    store: Option<Arc<dyn ReportStore>>,
}

impl AppState {
    pub fn new(config: Config, store: Option<Arc<dyn ReportStore>>) -> anyhow::Result<Self> {
        let grader = config.grader()?;
        Ok(Self {
            config: Arc::new(config),
            grader: Arc::new(grader),
            store,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.grading.timeout_ms)
    }

    fn store(&self) -> Result<&Arc<dyn ReportStore>, AppError> {
        self.store
            .as_ref()
            .ok_or_else(|| not_found("report storage is not configured"))
    }
}

/// Build the router with every endpoint mounted.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/grade/steps", post(handle_grade))
        .route("/solve", post(handle_solve))
        .route("/reports", get(handle_recent))
        .route("/reports/{id}", get(handle_get_report).delete(handle_delete_report))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server.
///
/// Binds to `[server].bind`. When `[db]` is configured the schema is created
/// if needed and every successful grading is stored.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let store: Option<Arc<dyn ReportStore>> = match &config.db {
        Some(_) => Some(Arc::new(open_store(config, "serve").await?)),
        None => None,
    };
    let persist = store.is_some();
    let app = router(AppState::new(config.clone(), store)?);

    tracing::info!(bind = %bind_addr, persist, "starting server");
    println!("stepcheck server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
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
#[derive(Debug)]
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

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn timeout_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::REQUEST_TIMEOUT,
        code: "timeout".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %err, "request failed");
        internal(err.to_string())
    }
}

/// Run `f` on the blocking pool, giving up after the configured timeout.
async fn run_bounded<T, F>(state: &AppState, what: &str, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&Grader) -> T + Send + 'static,
{
    let grader = state.grader.clone();
    let limit = state.timeout();
    let task = tokio::task::spawn_blocking(move || f(&grader));

    match tokio::time::timeout(limit, task).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join)) => Err(internal(format!("{} failed: {}", what, join))),
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "{} timed out", what);
            Err(timeout_error(format!(
                "{} timed out after {} ms",
                what,
                limit.as_millis()
            )))
        }
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

// ============ POST /grade/steps ============

/// Decode a JSON request body of any content type.
///
/// Syntax errors and shape errors both answer `400 bad_request` in the
/// JSON error format.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| bad_request(format!("invalid request: {}", e)))
}

/// Handler for `POST /grade/steps`.
async fn handle_grade(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let req: GradeRequest = decode_body(&body)?;
    if req.correct_answer.trim().is_empty() {
        return Err(bad_request("correct_answer is required"));
    }
    check_limits(&state.config.grading, &req).map_err(|e| bad_request(e.to_string()))?;

    let steps = req.student_steps.clone();
    let outcome = run_bounded(&state, "grading", move |grader| grader.grade_request(&req)).await?;

    let report_id = match (&outcome, &state.store) {
        (GradeOutcome::Report(report), Some(store)) => {
            let record = StoredReport::new(report.clone(), &steps);
            Some(store.put(&record).await?)
        }
        _ => None,
    };

    tracing::info!(
        steps = steps.len(),
        success = outcome.is_success(),
        stored = report_id.is_some(),
        "graded submission"
    );

    Ok(Json(outcome_json(&outcome, report_id.as_deref())?))
}

// ============ POST /solve ============

#[derive(Deserialize)]
struct SolveParams {
    equation: String,
    #[serde(default)]
    variable: Option<String>,
}

async fn handle_solve(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SolveSummary>, AppError> {
    let params: SolveParams = decode_body(&body)?;
    if params.equation.chars().count() > state.config.grading.max_step_chars {
        return Err(bad_request(format!(
            "equation too long: at most {} characters allowed",
            state.config.grading.max_step_chars
        )));
    }

    let variable = match params.variable.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(v) => {
            let mut chars = v.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => return Err(bad_request("variable must be a single letter")),
            }
        }
    };

    let equation = params.equation;
    let summary = run_bounded(&state, "solving", move |grader| {
        grader.solve(&equation, variable)
    })
    .await?
    .map_err(|e| bad_request(e.to_string()))?;

    Ok(Json(summary))
}

// ============ /reports ============

#[derive(Deserialize)]
struct RecentParams {
    limit: Option<usize>,
}

async fn handle_recent(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<ReportSummary>>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);
    let recent = state.store()?.recent(limit).await?;
    Ok(Json(recent))
}

async fn handle_get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredReport>, AppError> {
    match state.store()?.get(&id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(not_found(format!("report not found: {}", id))),
    }
}

async fn handle_delete_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if state.store()?.delete(&id).await? {
        tracing::info!(%id, "deleted report");
        Ok(Json(serde_json::json!({ "deleted": true })))
    } else {
        Err(not_found(format!("report not found: {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepcheck_core::store::memory::InMemoryReportStore;

    fn state_with_store() -> AppState {
        let store: Arc<dyn ReportStore> = Arc::new(InMemoryReportStore::new());
        AppState::new(Config::default(), Some(store)).unwrap()
    }

    fn json_body(value: serde_json::Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    #[tokio::test]
    async fn test_grade_stores_report() {
        let state = state_with_store();
        let body = serde_json::json!({
            "correct_answer": "x = 2",
            "student_steps": ["2x + 3 = 7", "2x = 4", "x = 2"]
        });
        let Json(value) = handle_grade(State(state.clone()), json_body(body)).await.unwrap();
        assert_eq!(value["score"], 100.0);

        let id = value["report_id"].as_str().unwrap().to_string();
        let Json(record) = handle_get_report(State(state.clone()), Path(id.clone()))
            .await
            .unwrap();
        assert_eq!(record.report.variable, "x");

        handle_delete_report(State(state.clone()), Path(id.clone()))
            .await
            .unwrap();
        let err = handle_get_report(State(state), Path(id)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_grade_rejects_bad_bodies() {
        let state = state_with_store();
        let err = handle_grade(State(state.clone()), json_body(serde_json::json!({"student_steps": 3})))
            .await
            .unwrap_err();
        assert_eq!(err.code, "bad_request");

        let err = handle_grade(
            State(state),
            json_body(serde_json::json!({"correct_answer": "  ", "student_steps": []})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "correct_answer is required");
    }

    #[tokio::test]
    async fn test_malformed_json_gets_error_contract() {
        let state = state_with_store();
        let err = handle_grade(State(state.clone()), Bytes::from_static(b"{not json"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "bad_request");
        assert!(err.message.starts_with("invalid request"));

        let response = handle_solve(State(state), Bytes::new())
            .await
            .unwrap_err()
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unparseable_answer_is_not_http_error() {
        let state = state_with_store();
        let body = serde_json::json!({"correct_answer": "banana", "student_steps": ["x = 2"]});
        let Json(value) = handle_grade(State(state.clone()), json_body(body)).await.unwrap();
        assert_eq!(value["success"], false);
        assert!(value.get("report_id").is_none());

        let Json(recent) = handle_recent(State(state), Query(RecentParams { limit: None }))
            .await
            .unwrap();
        assert!(recent.is_empty());
    }

    #[tokio::test]
    async fn test_solve_variable_checks() {
        let state = state_with_store();
        let Json(summary) = handle_solve(
            State(state.clone()),
            json_body(serde_json::json!({"equation": "x^2 = 4"})),
        )
        .await
        .unwrap();
        assert_eq!(summary.solutions, vec!["-2", "2"]);

        let err = handle_solve(
            State(state),
            json_body(serde_json::json!({"equation": "x = 1", "variable": "xy"})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reports_without_store() {
        let state = AppState::new(Config::default(), None).unwrap();
        let err = handle_get_report(State(state), Path("abc".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
