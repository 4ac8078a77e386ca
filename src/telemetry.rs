use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used by the API server when `RUST_LOG` is unset
pub const SERVER_LOG_FILTER: &str = "info,hyper=warn,tower_http=info";
/// Filter used by the load generator when `RUST_LOG` is unset
pub const LOADGEN_LOG_FILTER: &str = "info,hyper=warn,reqwest=warn";

pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "ctrl_c", "shutdown signal received"),
        _ = terminate => info!(signal = "sigterm", "shutdown signal received"),
    }
}
