//! Axum Handlers for the REST API
//!
//! Two endpoints share the same request body: one answers with the whole
//! learning path at once, the other streams finished modules as NDJSON.
//! `utoipa` doc comments feed the OpenAPI document.

use axum::{
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use futures_util::StreamExt;
use learnpath_core::{
    course::LearningPath, delivery::course_stream, error::PipelineError, topic::Topic,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    models::{ErrorResponse, LearningRequest},
    state::AppState,
};

/// Media type of the streaming response.
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    ServiceUnavailable(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { detail })).into_response()
            }
            ApiError::NotFound(detail) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { detail })).into_response()
            }
            ApiError::ServiceUnavailable(detail) => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse { detail })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let detail = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { detail }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

impl ApiError {
    fn from_pipeline(err: PipelineError) -> Self {
        match err {
            PipelineError::ModuleGeneration(_) => ApiError::ServiceUnavailable(err.to_string()),
            PipelineError::EmptyPath => ApiError::NotFound(err.to_string()),
        }
    }
}

fn parse_topic(payload: LearningRequest) -> Result<Topic, ApiError> {
    Topic::parse(payload.topic).map_err(|e| {
        warn!(error = %e, "Rejected topic");
        ApiError::BadRequest(e.to_string())
    })
}

/// Generate a complete learning path in one response.
#[utoipa::path(
    post,
    path = "/generate-learning-path",
    request_body = LearningRequest,
    responses(
        (status = 200, description = "Learning path generated", body = LearningPath),
        (status = 400, description = "Topic too short", body = ErrorResponse),
        (status = 404, description = "No module could be generated", body = ErrorResponse),
        (status = 503, description = "Module generation failed", body = ErrorResponse)
    )
)]
pub async fn generate_learning_path(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LearningRequest>,
) -> Result<Json<LearningPath>, ApiError> {
    let topic = parse_topic(payload)?;
    info!(topic = %topic, "Batch request received");

    let path = state
        .pipeline
        .build_path(&topic)
        .await
        .map_err(ApiError::from_pipeline)?;
    Ok(Json(path))
}

/// Stream the learning path one module per line (NDJSON).
///
/// Each line is either a module object or, if the module list could not be
/// generated, a single `{"error": "..."}` object that ends the stream.
#[utoipa::path(
    post,
    path = "/generate-learning-path-stream",
    request_body = LearningRequest,
    responses(
        (status = 200, description = "Stream of modules, one JSON object per line",
            content_type = "application/x-ndjson", body = learnpath_core::course::Module),
        (status = 400, description = "Topic too short", body = ErrorResponse)
    )
)]
pub async fn generate_learning_path_stream(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LearningRequest>,
) -> Result<Response, ApiError> {
    let topic = parse_topic(payload)?;
    info!(topic = %topic, "Stream request received");

    let lines = course_stream(
        state.pipeline.clone(),
        state.cache.clone(),
        topic,
        state.stream_pacing,
    )
    .map(|chunk| chunk.to_ndjson_line());

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)
        .body(Body::from_stream(lines))?;
    Ok(response)
}
