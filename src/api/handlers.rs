use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{debug, error};

use crate::api::state::AppState;
use crate::api::types::{ApiError, HealthResponse, ModelInfo, PredictResponse};
use crate::schema::{PatientSample, FEATURE_COUNT};

/// POST /predict
///
/// A rejected body (missing field, wrong type, unknown field, bad JSON) is a
/// client error and never reaches the model.
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PatientSample>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(sample) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let features = sample.to_features();
    let risk = state.model.predict(&features).map_err(|e| {
        error!("Inference failed: {}", e);
        ApiError::Internal("inference failed".to_string())
    })?;

    debug!("Scored sample: risk {:.4}", risk);
    Ok(Json(PredictResponse { risk }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime_seconds(),
        model: ModelInfo {
            trained_at: state.model.metadata.trained_at,
            test_accuracy: state.model.metadata.test_accuracy,
            feature_count: FEATURE_COUNT,
        },
    })
}
