use anyhow::Result;
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Why a load-test request did not count as a success
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestFailure {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed")]
    Connect,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Other(String),
}

impl RequestFailure {
    /// Bucket name used in reports
    pub fn kind(&self) -> String {
        match self {
            RequestFailure::Timeout => "timeout".to_string(),
            RequestFailure::Connect => "connect".to_string(),
            RequestFailure::Status(code) => format!("http_{code}"),
            RequestFailure::Other(_) => "other".to_string(),
        }
    }
}

impl From<reqwest::Error> for RequestFailure {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            RequestFailure::Timeout
        } else if error.is_connect() {
            RequestFailure::Connect
        } else if let Some(status) = error.status() {
            RequestFailure::Status(status.as_u16())
        } else {
            RequestFailure::Other(error.to_string())
        }
    }
}

/// Counters shared by every simulated user of one run.
///
/// Latencies go into an auto-resizing HdrHistogram in microseconds, so memory
/// stays bounded however long the run lasts.
pub struct LoadStats {
    total: AtomicU64,
    successes: AtomicU64,
    failures: Mutex<BTreeMap<String, u64>>,
    latencies_us: Mutex<Histogram<u64>>,
}

impl LoadStats {
    pub fn new() -> Result<Self> {
        let mut latencies_us = Histogram::<u64>::new(3)?;
        latencies_us.auto(true);
        Ok(Self {
            total: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: Mutex::new(BTreeMap::new()),
            latencies_us: Mutex::new(latencies_us),
        })
    }

    pub fn record_success(&self, latency: Duration) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);
    }

    pub fn record_failure(&self, failure: &RequestFailure, latency: Duration) {
        self.total.fetch_add(1, Ordering::Relaxed);
        *self.failures.lock().entry(failure.kind()).or_insert(0) += 1;
        self.record_latency(latency);
    }

    fn record_latency(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latencies_us.lock().saturating_record(micros);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Summarise everything recorded so far over a run of length `elapsed`
    pub fn report(&self, elapsed: Duration) -> LoadReport {
        let total_requests = self.total();
        let successful_requests = self.successes.load(Ordering::Relaxed);
        let failures_by_kind = self.failures.lock().clone();
        let failed_requests: u64 = failures_by_kind.values().sum();

        let (p50, p95, p99, max) = {
            let hist = self.latencies_us.lock();
            (
                hist.value_at_quantile(0.50),
                hist.value_at_quantile(0.95),
                hist.value_at_quantile(0.99),
                hist.max(),
            )
        };

        let duration_secs = elapsed.as_secs_f64();
        let rps_achieved = if duration_secs > 0.0 {
            total_requests as f64 / duration_secs
        } else {
            0.0
        };
        let error_rate = if total_requests > 0 {
            failed_requests as f64 / total_requests as f64
        } else {
            0.0
        };

        LoadReport {
            total_requests,
            successful_requests,
            failed_requests,
            failures_by_kind,
            rps_achieved,
            latency_p50_ms: micros_to_ms(p50),
            latency_p95_ms: micros_to_ms(p95),
            latency_p99_ms: micros_to_ms(p99),
            latency_max_ms: micros_to_ms(max),
            duration_secs,
            error_rate,
        }
    }
}

fn micros_to_ms(micros: u64) -> f64 {
    micros as f64 / 1000.0
}

/// Results from a load test run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub failures_by_kind: BTreeMap<String, u64>,
    /// Requests per second (achieved)
    pub rps_achieved: f64,
    pub latency_p50_ms: f64,
    pub latency_p95_ms: f64,
    pub latency_p99_ms: f64,
    pub latency_max_ms: f64,
    pub duration_secs: f64,
    /// Error rate (0.0-1.0)
    pub error_rate: f64,
}
