use rand::rngs::StdRng;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, trace};

use super::{
    stats::{LoadStats, RequestFailure},
    wait::WaitTime,
};
use crate::domain::PenguinMeasurements;

/// One simulated client: wait, then classify the same penguin, forever.
pub struct PenguinUser {
    id: usize,
    client: reqwest::Client,
    endpoint: String,
    payload: PenguinMeasurements,
    wait: WaitTime,
    rng: StdRng,
    stats: Arc<LoadStats>,
}

impl PenguinUser {
    pub fn new(
        id: usize,
        client: reqwest::Client,
        base_url: &str,
        wait: WaitTime,
        rng: StdRng,
        stats: Arc<LoadStats>,
    ) -> Self {
        Self {
            id,
            client,
            endpoint: format!("{}/predict", base_url.trim_end_matches('/')),
            payload: PenguinMeasurements::sample(),
            wait,
            rng,
            stats,
        }
    }

    /// Loop until `stop` flips to true or its sender goes away.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        debug!(user = self.id, "user started");
        while !*stop.borrow() {
            let pause = self.wait.sample(&mut self.rng);
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = stop.changed() => break,
            }
            self.predict().await;
        }
        debug!(user = self.id, "user stopped");
    }

    /// Fire one request and record its outcome. Never fails the run.
    pub async fn predict(&self) {
        let start = Instant::now();
        match self.send().await {
            Ok(()) => self.stats.record_success(start.elapsed()),
            Err(failure) => {
                trace!(user = self.id, %failure, "request failed");
                self.stats.record_failure(&failure, start.elapsed());
            }
        }
    }

    async fn send(&self) -> Result<(), RequestFailure> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&self.payload)
            .send()
            .await?;
        let status = resp.status();
        // drain so the connection goes back to the pool
        resp.bytes().await?;
        if !status.is_success() {
            return Err(RequestFailure::Status(status.as_u16()));
        }
        Ok(())
    }
}
