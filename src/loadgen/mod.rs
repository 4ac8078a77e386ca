//! Traffic generator for `POST /predict`
//!
//! Each simulated user is its own tokio task that sleeps a random
//! [`WaitTime`] and then sends the fixed sample payload. Outcomes are only
//! counted in [`LoadStats`]; transport errors and non-2xx answers never stop
//! the run.

pub mod stats;
pub mod user;
pub mod wait;

pub use stats::{LoadReport, LoadStats, RequestFailure};
pub use user::PenguinUser;
pub use wait::WaitTime;

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};
use validator::Validate;

use crate::config::LoadGenConfig;

#[derive(Debug)]
pub struct LoadTestRunner {
    config: LoadGenConfig,
    wait: WaitTime,
}

impl LoadTestRunner {
    pub fn new(config: LoadGenConfig) -> Result<Self> {
        config.validate()?;
        let wait = WaitTime::between(config.min_wait_secs, config.max_wait_secs)?;
        Ok(Self { config, wait })
    }

    /// Run for the configured time, or forever when `run_time_secs` is zero.
    pub async fn run(&self) -> Result<LoadReport> {
        self.run_until(std::future::pending()).await
    }

    /// Run until the configured time elapses or `shutdown` resolves,
    /// whichever comes first.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<LoadReport>
    where
        F: Future<Output = ()>,
    {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .build()?;
        let stats = Arc::new(LoadStats::new()?);
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut users = JoinSet::new();

        info!(
            target_url = %self.config.base_url,
            users = self.config.users,
            spawn_rate = self.config.spawn_rate,
            min_wait_secs = self.config.min_wait_secs,
            max_wait_secs = self.config.max_wait_secs,
            run_time_secs = self.config.run_time_secs,
            "load test starting"
        );

        let started = Instant::now();
        {
            let spawn_interval = Duration::from_secs_f64(1.0 / self.config.spawn_rate);
            let spawner = async {
                for id in 0..self.config.users {
                    if id > 0 {
                        tokio::time::sleep(spawn_interval).await;
                    }
                    let user = PenguinUser::new(
                        id,
                        client.clone(),
                        &self.config.base_url,
                        self.wait,
                        self.user_rng(id),
                        Arc::clone(&stats),
                    );
                    users.spawn(user.run(stop_rx.clone()));
                }
                info!(users = self.config.users, "all users spawned");
                std::future::pending::<()>().await
            };

            let run_time = self.config.run_time_secs;
            let deadline = async move {
                if run_time > 0 {
                    tokio::time::sleep(Duration::from_secs(run_time)).await;
                } else {
                    std::future::pending::<()>().await;
                }
            };

            tokio::select! {
                _ = spawner => {}
                _ = deadline => info!("run time elapsed"),
                _ = shutdown => info!("shutdown requested"),
            }
        }

        let _ = stop_tx.send(true);
        while let Some(result) = users.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "user task ended abnormally");
            }
        }

        let report = stats.report(started.elapsed());
        info!(
            total_requests = report.total_requests,
            failed_requests = report.failed_requests,
            rps = report.rps_achieved,
            p50_ms = report.latency_p50_ms,
            p95_ms = report.latency_p95_ms,
            p99_ms = report.latency_p99_ms,
            error_rate = report.error_rate,
            "load test finished"
        );
        Ok(report)
    }

    fn user_rng(&self, id: usize) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_rejects_invalid_config() {
        let config = LoadGenConfig {
            min_wait_secs: 3.0,
            max_wait_secs: 1.0,
            ..Default::default()
        };
        assert!(LoadTestRunner::new(config).is_err());

        let config = LoadGenConfig {
            spawn_rate: 0.0,
            ..Default::default()
        };
        assert!(LoadTestRunner::new(config).is_err());
    }

    #[test]
    fn test_seeded_users_get_distinct_streams() {
        use rand::Rng;
        let runner = LoadTestRunner::new(LoadGenConfig {
            seed: Some(9),
            ..Default::default()
        })
        .unwrap();
        let a: u64 = runner.user_rng(0).gen();
        let b: u64 = runner.user_rng(1).gen();
        let a_again: u64 = runner.user_rng(0).gen();
        assert_ne!(a, b);
        assert_eq!(a, a_again);
    }

    #[tokio::test]
    async fn test_unreachable_target_is_not_fatal() {
        let runner = LoadTestRunner::new(LoadGenConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            users: 2,
            spawn_rate: 100.0,
            min_wait_secs: 0.01,
            max_wait_secs: 0.02,
            run_time_secs: 0,
            request_timeout_secs: 1,
            seed: Some(1),
        })
        .unwrap();

        let report = runner
            .run_until(tokio::time::sleep(Duration::from_millis(400)))
            .await
            .unwrap();

        assert!(report.total_requests > 0);
        assert_eq!(report.successful_requests, 0);
        assert_eq!(report.failed_requests, report.total_requests);
        assert_eq!(report.error_rate, 1.0);
    }
}
