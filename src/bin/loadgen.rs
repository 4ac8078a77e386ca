use anyhow::Result;
use penguin_predictor::{config::Config, loadgen::LoadTestRunner, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing(telemetry::LOADGEN_LOG_FILTER);

    let cfg = Config::load()?;
    let runner = LoadTestRunner::new(cfg.loadgen)?;
    let report = runner.run_until(telemetry::shutdown_signal()).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
