pub mod error;
pub mod health;
pub mod predict;
pub mod response;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, Uri},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{api::error::ApiError, state::AppState};

pub fn router(state: AppState) -> Router {
    let server = state.cfg.server.clone();

    let mut router = Router::new()
        .route("/predict", post(predict::predict))
        .route("/healthz", get(health::healthz))
        .route("/model", get(health::model_info))
        .fallback(not_found)
        .with_state(state);

    if server.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(server.body_limit_bytes))
                .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs))),
        )
        .layer(TraceLayer::new_for_http())
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
