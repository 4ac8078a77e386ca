use anyhow::Result;
use penguin_predictor::{api, config::Config, state::AppState, telemetry};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing(telemetry::SERVER_LOG_FILTER);

    let cfg = Config::load()?;
    let app_state = AppState::new(cfg.clone())?;
    let app = api::router(app_state);

    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!("Server binding to 0.0.0.0 - service will be accessible from the network");
    }

    info!(%addr, "starting penguin prediction API");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
