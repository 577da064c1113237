use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::{Json, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::{future::Future, sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::{
    error::NotetakerError,
    models::{
        AnalysisType, AnalyzeRequest, ApiResponse, Conversation, ErrorResponse, FullAnalysis,
        QuickAnalysis, QuickAnalyzeRequest,
    },
    pipeline::NoteTaker,
};

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn bad_request_error(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

fn processing_error(err: &NotetakerError) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(format!("Processing error: {err}"))),
    )
}

fn to_api_error(err: NotetakerError) -> ApiError {
    if let NotetakerError::Timeout(_) = err {
        error!(error = %err, "analysis timed out");
        return (
            StatusCode::GATEWAY_TIMEOUT,
            Json(ErrorResponse::new(err.to_string())),
        );
    }
    if err.is_client_error() {
        warn!(error = %err, "rejected request");
        bad_request_error(err.to_string())
    } else {
        error!(error = %err, "analysis failed");
        processing_error(&err)
    }
}

fn invalid_json(rejection: JsonRejection) -> ApiError {
    warn!(error = %rejection, "request body is not valid JSON");
    bad_request_error("Invalid JSON format")
}

#[derive(Clone)]
pub struct AppState {
    pub notetaker: Arc<NoteTaker>,
    /// Upper bound on one analysis, completion calls included
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(notetaker: NoteTaker, request_timeout: Duration) -> Self {
        Self {
            notetaker: Arc::new(notetaker),
            request_timeout,
        }
    }

    async fn within_timeout<T>(
        &self,
        analysis: impl Future<Output = crate::error::Result<T>>,
    ) -> Result<T, ApiError> {
        tokio::time::timeout(self.request_timeout, analysis)
            .await
            .unwrap_or(Err(NotetakerError::Timeout(self.request_timeout)))
            .map_err(to_api_error)
    }
}

/// Tag each request with a fresh correlation id and run it inside a span carrying it
async fn correlation_id_middleware(mut request: Request<axum::body::Body>, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = header.clone() {
        request.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api", post(analyze))
        .route("/api/", post(analyze))
        .route("/api/quick", post(quick_analyze))
        .route("/api/quick/", post(quick_analyze))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(correlation_id_middleware))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Physician Notetaker",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Medical entity extraction, patient sentiment and SOAP notes from physician-patient conversations",
        "endpoints": {
            "POST /api": "Full analysis: entities, sentiment and SOAP note",
            "POST /api/quick": "Run selected pipelines (type: ner, sentiment, soap or all)",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<FullAnalysis> {
    let Json(request) = payload.map_err(invalid_json)?;
    let conversation = Conversation::new(request.conversation).map_err(to_api_error)?;

    info!(chars = conversation.len(), "full analysis requested");

    let analysis = state
        .within_timeout(state.notetaker.full_analysis(&conversation))
        .await?;

    Ok(Json(ApiResponse::ok(analysis)))
}

async fn quick_analyze(
    State(state): State<AppState>,
    payload: Result<Json<QuickAnalyzeRequest>, JsonRejection>,
) -> ApiResult<QuickAnalysis> {
    let Json(request) = payload.map_err(invalid_json)?;
    let conversation = Conversation::new(request.conversation).map_err(to_api_error)?;
    let analysis_type = match request.analysis_type.as_deref() {
        Some(value) => value.parse::<AnalysisType>().map_err(to_api_error)?,
        None => AnalysisType::default(),
    };

    info!(chars = conversation.len(), analysis_type = %analysis_type, "quick analysis requested");

    let analysis = state
        .within_timeout(state.notetaker.quick_analysis(&conversation, analysis_type))
        .await?;

    Ok(Json(ApiResponse::ok(analysis)))
}
