//! HTTP adapter over the pipeline.
//!
//! - `POST /predict` prices one JSON object
//! - `POST /predict/batch` runs a batch from a CSV body
//! - `GET /health`

use crate::error::PipelineError;
use crate::pipeline::{Pipeline, SinglePrediction};
use appraisal_protocol::BatchId;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Largest accepted batch upload.
const MAX_BATCH_BYTES: usize = 64 * 1024 * 1024;

pub type SharedPipeline = Arc<Pipeline>;

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub batch_id: BatchId,
    pub num_predictions: usize,
    pub timestamp: DateTime<Utc>,
}

/// Error body `{"error": message}` with a 4xx or 5xx status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), "Request failed: {}", self.message);
        } else {
            warn!(status = self.status.as_u16(), "Request rejected: {}", self.message);
        }
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

/// Build the axum Router.
pub fn router(pipeline: SharedPipeline) -> Router {
    Router::new()
        .route("/predict", post(predict_single_handler))
        .route(
            "/predict/batch",
            post(predict_batch_handler).layer(DefaultBodyLimit::max(MAX_BATCH_BYTES)),
        )
        .route("/health", get(health_handler))
        .with_state(pipeline)
}

async fn predict_single_handler(
    State(pipeline): State<SharedPipeline>,
    body: Bytes,
) -> Result<Json<SinglePrediction>, ApiError> {
    let data: serde_json::Value = serde_json::from_slice(&body).unwrap_or_default();
    if !data.as_object().is_some_and(|o| !o.is_empty()) {
        return Err(ApiError::bad_request("No data provided"));
    }

    let prediction = pipeline.predict_single(&data).await?;
    Ok(Json(prediction))
}

async fn predict_batch_handler(
    State(pipeline): State<SharedPipeline>,
    body: Bytes,
) -> Result<Json<BatchResponse>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request("No file provided"));
    }

    let outcome = pipeline.run_csv(&body).await?;
    Ok(Json(BatchResponse {
        batch_id: outcome.batch_id,
        num_predictions: outcome.predictions,
        timestamp: Utc::now(),
    }))
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Serve the router on `bind` until Ctrl-C.
pub async fn serve(pipeline: SharedPipeline, bind: &str) -> std::io::Result<()> {
    let app = router(pipeline);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "HTTP adapter listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let client = ApiError::from(PipelineError::EmptyInput);
        assert_eq!(client.status, StatusCode::BAD_REQUEST);

        let server = ApiError::from(PipelineError::Io(std::io::Error::other("disk full")));
        assert_eq!(server.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(server.message, "IO error: disk full");
    }
}
