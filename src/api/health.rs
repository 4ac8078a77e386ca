use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::time::Instant;

use crate::{
    api::response::ApiResponse,
    domain::Species,
    ml::{InferenceStats, ModelMetadata},
    state::AppState,
};
use strum::IntoEnumIterator;

/// GET /healthz - Liveness probe
pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub metadata: ModelMetadata,
    pub species: Vec<Species>,
    pub stats: InferenceStats,
}

/// GET /model - Loaded model metadata and serving counters
pub async fn model_info(State(st): State<AppState>) -> ApiResponse<ModelInfo> {
    let start = Instant::now();

    let info = ModelInfo {
        metadata: st.engine.metadata().clone(),
        species: Species::iter().collect(),
        stats: st.engine.stats(),
    };

    ApiResponse::success(info).with_duration(start.elapsed().as_millis() as u64)
}
