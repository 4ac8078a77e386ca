use axum::{extract::FromRequest, extract::State, Json};

use crate::{
    api::error::ApiError,
    domain::{PenguinMeasurements, PredictionResponse},
    state::AppState,
};

/// `Json` extractor whose rejections are reported as `ApiError`, so that
/// schema failures come back as 422 with a JSON body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// POST /predict - Classify one penguin
///
/// Runs parse -> schema validation (including the enum vocabularies) ->
/// inference -> serialization. Numeric magnitudes are not range-checked.
pub async fn predict(
    State(st): State<AppState>,
    AppJson(sample): AppJson<PenguinMeasurements>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let species = st.engine.predict(&sample)?;

    tracing::debug!(
        %species,
        island = %sample.island,
        sex = %sample.sex,
        year = sample.year,
        "prediction served"
    );

    Ok(Json(species.into()))
}
