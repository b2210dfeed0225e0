//! Request handlers for the REST API.
//!
//! Engine calls touch SQLite and the manifest directory, so each one runs on
//! the blocking pool.

use std::sync::Arc;

use awsrt_core::api::{
    BeliefPreviewRequest, EnvRow, ErrorResponse, FireRow, HealthResponse, InitRunRequest,
    InitRunResponse, LatestResponse, ManifestListing, NewEnvironment, NewEnvironmentResponse,
    NewFire, NewFireResponse, RunMeta, StepResponse,
};
use awsrt_core::{CoreError, CoreResult, FieldImageParams, RunEngine};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::state::AppState;

pub type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

// --- Error mapping ---

fn error_response(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            detail: Some(detail.into()),
        }),
    )
}

pub(crate) fn core_error(err: CoreError) -> ApiError {
    let status = match &err {
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CoreError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    } else {
        tracing::debug!(error = %err, status = status.as_u16(), "Request rejected");
    }
    error_response(status, err.to_string())
}

/// Run `f` against the engine on the blocking pool.
async fn blocking<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&RunEngine) -> CoreResult<T> + Send + 'static,
{
    let engine: Arc<RunEngine> = state.engine();
    tokio::task::spawn_blocking(move || f(&engine))
        .await
        .map_err(|e| {
            tracing::error!("Engine task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "engine task failed")
        })?
        .map_err(core_error)
}

/// Encoded PNG body.
pub struct Png(pub Vec<u8>);

impl IntoResponse for Png {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            self.0,
        )
            .into_response()
    }
}

// --- Request types ---

#[derive(Debug, Deserialize)]
pub struct AdvanceQuery {
    #[serde(default)]
    pub n: Option<i64>,
}

// --- Service ---

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// --- Manifests ---

pub async fn create_environment(
    State(state): State<AppState>,
    Json(req): Json<NewEnvironment>,
) -> ApiResult<Json<NewEnvironmentResponse>> {
    blocking(&state, move |engine| engine.create_environment(req))
        .await
        .map(Json)
}

pub async fn list_environments(State(state): State<AppState>) -> ApiResult<Json<Vec<EnvRow>>> {
    blocking(&state, |engine| engine.list_environments())
        .await
        .map(Json)
}

pub async fn create_fire(
    State(state): State<AppState>,
    Json(req): Json<NewFire>,
) -> ApiResult<Json<NewFireResponse>> {
    blocking(&state, move |engine| engine.create_fire(req))
        .await
        .map(Json)
}

pub async fn list_fires(State(state): State<AppState>) -> ApiResult<Json<Vec<FireRow>>> {
    blocking(&state, |engine| engine.list_fires()).await.map(Json)
}

pub async fn list_manifests(State(state): State<AppState>) -> ApiResult<Json<ManifestListing>> {
    blocking(&state, |engine| engine.list_manifests())
        .await
        .map(Json)
}

// --- Runs ---

pub async fn init_run(
    State(state): State<AppState>,
    Json(req): Json<InitRunRequest>,
) -> ApiResult<Json<InitRunResponse>> {
    blocking(&state, move |engine| engine.init_run(&req))
        .await
        .map(Json)
}

pub async fn step(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Json<StepResponse>> {
    blocking(&state, move |engine| engine.step(&run_id))
        .await
        .map(Json)
}

pub async fn advance(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Query(query): Query<AdvanceQuery>,
) -> ApiResult<Json<StepResponse>> {
    let n = query.n.unwrap_or(1);
    let n = u32::try_from(n)
        .ok()
        .filter(|&n| n >= 1)
        .ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                format!("n must be a positive integer, got {}", n),
            )
        })?;
    blocking(&state, move |engine| engine.advance(&run_id, n))
        .await
        .map(Json)
}

pub async fn latest(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Json<LatestResponse>> {
    blocking(&state, move |engine| engine.latest(&run_id))
        .await
        .map(Json)
}

pub async fn meta(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Json<RunMeta>> {
    blocking(&state, move |engine| engine.meta(&run_id))
        .await
        .map(Json)
}

pub async fn list_runs(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    blocking(&state, |engine| engine.list_runs()).await.map(Json)
}

// --- Frames ---

pub async fn state_png(
    State(state): State<AppState>,
    Path((run_id, t)): Path<(String, i64)>,
) -> ApiResult<Png> {
    blocking(&state, move |engine| engine.state_png(&run_id, t))
        .await
        .map(Png)
}

pub async fn belief_png(
    State(state): State<AppState>,
    Path((run_id, t)): Path<(String, i64)>,
    Query(params): Query<FieldImageParams>,
) -> ApiResult<Png> {
    blocking(&state, move |engine| engine.belief_png(&run_id, t, &params))
        .await
        .map(Png)
}

pub async fn legend_belief_png(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Query(params): Query<FieldImageParams>,
) -> ApiResult<Png> {
    blocking(&state, move |engine| engine.legend_png(&run_id, &params))
        .await
        .map(Png)
}

pub async fn preview_belief_png(
    State(state): State<AppState>,
    Json(req): Json<BeliefPreviewRequest>,
) -> ApiResult<Png> {
    blocking(&state, move |engine| engine.preview_belief(&req))
        .await
        .map(Png)
}
